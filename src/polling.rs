//! New-row detection across polling cycles.
//!
//! Memory is owned by the caller and passed back in every cycle. A cycle
//! either returns a fresh memory value or an error; the input memory is
//! never modified, so a failed fetch leaves the caller's state intact.

use crate::address::{SheetRange, ensure_sheet_name};
use crate::client::{SpreadsheetBackend, get_sheet_metadata};
use crate::error::{ConnectorError, ConnectorResult};
use crate::grid::ValueGrid;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PollingMemory {
    pub last_row_count: u32,
    pub last_polling_time: DateTime<Utc>,
    pub triggered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NewRow {
    /// 1-based row number in the sheet
    pub row_index: u32,
    pub row_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NewRowsEvent {
    pub new_rows: Vec<NewRow>,
}

/// State reached by a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    /// First cycle for a target; existing rows were recorded, none reported
    Baseline,
    Steady,
    Triggered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PollOutcome {
    pub memory: PollingMemory,
    pub phase: PollPhase,
    pub event: Option<NewRowsEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct PollTarget {
    pub spreadsheet_id: String,
    pub sheet_name: String,
}

impl PollTarget {
    pub fn new(spreadsheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
        }
    }

    pub fn validate(&self) -> ConnectorResult<()> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(ConnectorError::misconfiguration("spreadsheet id must not be empty"));
        }
        ensure_sheet_name(&self.sheet_name)
    }
}

/// Compare a freshly fetched grid against the previous cycle.
pub fn detect_new_rows(
    memory: Option<&PollingMemory>,
    grid: &ValueGrid,
    now: DateTime<Utc>,
) -> PollOutcome {
    let current = grid.len() as u32;

    let Some(previous) = memory else {
        return PollOutcome {
            memory: PollingMemory {
                last_row_count: current,
                last_polling_time: now,
                triggered: false,
            },
            phase: PollPhase::Baseline,
            event: None,
        };
    };

    if current <= previous.last_row_count {
        return PollOutcome {
            memory: PollingMemory {
                last_row_count: previous.last_row_count,
                last_polling_time: now,
                triggered: false,
            },
            phase: PollPhase::Steady,
            event: None,
        };
    }

    let new_rows = grid
        .iter()
        .enumerate()
        .skip(previous.last_row_count as usize)
        .map(|(idx, values)| NewRow {
            row_index: idx as u32 + 1,
            row_values: values.clone(),
        })
        .collect();

    PollOutcome {
        memory: PollingMemory {
            last_row_count: current,
            last_polling_time: now,
            triggered: true,
        },
        phase: PollPhase::Triggered,
        event: Some(NewRowsEvent { new_rows }),
    }
}

/// Run one polling cycle against the live sheet.
pub async fn poll_new_rows(
    backend: &dyn SpreadsheetBackend,
    target: &PollTarget,
    memory: Option<&PollingMemory>,
    now: DateTime<Utc>,
) -> ConnectorResult<PollOutcome> {
    target.validate()?;
    get_sheet_metadata(backend, &target.spreadsheet_id, &target.sheet_name).await?;
    let range = SheetRange::whole_sheet(&target.sheet_name).to_string();
    let grid = backend.get_values(&target.spreadsheet_id, &range).await?;

    let outcome = detect_new_rows(memory, &grid, now);
    tracing::debug!(
        spreadsheet_id = %target.spreadsheet_id,
        sheet_name = %target.sheet_name,
        rows = grid.len(),
        phase = ?outcome.phase,
        new_rows = outcome.event.as_ref().map_or(0, |e| e.new_rows.len()),
        "polling cycle completed"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rows(n: usize) -> ValueGrid {
        (0..n).map(|i| vec![format!("r{}", i + 1), String::new()]).collect()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn first_cycle_records_baseline() {
        let outcome = detect_new_rows(None, &rows(5), at(0));
        assert_eq!(outcome.phase, PollPhase::Baseline);
        assert!(outcome.event.is_none());
        assert_eq!(outcome.memory.last_row_count, 5);
        assert!(!outcome.memory.triggered);
    }

    #[test]
    fn growth_reports_only_new_rows() {
        let baseline = detect_new_rows(None, &rows(5), at(0)).memory;
        let outcome = detect_new_rows(Some(&baseline), &rows(7), at(60));

        assert_eq!(outcome.phase, PollPhase::Triggered);
        let event = outcome.event.unwrap();
        let indices: Vec<u32> = event.new_rows.iter().map(|r| r.row_index).collect();
        assert_eq!(indices, vec![6, 7]);
        assert_eq!(event.new_rows[0].row_values, vec!["r6", ""]);
        assert_eq!(outcome.memory.last_row_count, 7);
        assert_eq!(outcome.memory.last_polling_time, at(60));
        assert!(outcome.memory.triggered);
    }

    #[test]
    fn shrink_keeps_last_count() {
        let memory = PollingMemory {
            last_row_count: 7,
            last_polling_time: at(0),
            triggered: true,
        };
        let outcome = detect_new_rows(Some(&memory), &rows(4), at(30));
        assert_eq!(outcome.phase, PollPhase::Steady);
        assert!(outcome.event.is_none());
        assert_eq!(outcome.memory.last_row_count, 7);
        assert_eq!(outcome.memory.last_polling_time, at(30));
        assert!(!outcome.memory.triggered);
    }

    #[test]
    fn empty_sheet_is_steady() {
        let memory = PollingMemory {
            last_row_count: 0,
            last_polling_time: at(0),
            triggered: false,
        };
        let outcome = detect_new_rows(Some(&memory), &Vec::new(), at(5));
        assert_eq!(outcome.phase, PollPhase::Steady);
        assert!(outcome.event.is_none());
    }

    #[test]
    fn blank_target_is_rejected() {
        assert!(PollTarget::new("", "Sheet1").validate().is_err());
        assert!(PollTarget::new("abc", " ").validate().is_err());
        assert!(PollTarget::new("abc", "Sheet1").validate().is_ok());
    }
}
