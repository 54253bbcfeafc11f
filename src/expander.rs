//! Growing a sheet so a write beyond its last row succeeds.

use crate::client::{SpreadsheetBackend, get_sheet_metadata};
use crate::error::ConnectorResult;

/// Rows that must be appended for `target_row` to exist.
pub fn compute_rows_to_append(target_row: u32, current_row_count: u32) -> u32 {
    target_row.saturating_sub(current_row_count)
}

/// Append rows to `sheet_name` until it reaches `target_row`. Returns the
/// number of rows appended.
pub async fn expand_row_limits(
    backend: &dyn SpreadsheetBackend,
    spreadsheet_id: &str,
    sheet_name: &str,
    target_row: u32,
) -> ConnectorResult<u32> {
    let sheet = get_sheet_metadata(backend, spreadsheet_id, sheet_name).await?;
    let missing = compute_rows_to_append(target_row, sheet.row_count);
    if missing > 0 {
        tracing::debug!(
            spreadsheet_id,
            sheet_name,
            current = sheet.row_count,
            target_row,
            missing,
            "appending rows"
        );
        backend
            .append_rows(spreadsheet_id, sheet.sheet_id, missing)
            .await?;
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::InMemoryBackend;
    use crate::error::ConnectorError;
    use assert_matches::assert_matches;

    #[test]
    fn computes_missing_rows() {
        assert_eq!(compute_rows_to_append(50, 30), 20);
        assert_eq!(compute_rows_to_append(10, 30), 0);
        assert_eq!(compute_rows_to_append(30, 30), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn appends_only_when_needed() -> anyhow::Result<()> {
        let backend = InMemoryBackend::new();
        let id = backend.seed_spreadsheet("Book", &[("Data", 10)]);

        assert_eq!(expand_row_limits(&backend, &id, "Data", 4).await?, 0);
        assert_eq!(expand_row_limits(&backend, &id, "Data", 25).await?, 15);
        let sheet = get_sheet_metadata(&backend, &id, "Data").await?;
        assert_eq!(sheet.row_count, 25);
        Ok(())
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_sheet_is_reported() {
        let backend = InMemoryBackend::new();
        let id = backend.seed_spreadsheet("Book", &[("Data", 10)]);
        let err = expand_row_limits(&backend, &id, "Other", 4).await.unwrap_err();
        assert_matches!(err, ConnectorError::SheetNotFound { .. });
    }
}
