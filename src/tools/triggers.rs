use crate::polling::{PollOutcome, PollTarget, PollingMemory, poll_new_rows};
use crate::state::AppState;
use anyhow::Result;
use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OnNewRowsAddedParams {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Memory returned by the previous cycle; omit on the first call
    #[serde(default)]
    pub memory: Option<PollingMemory>,
}

/// One polling cycle. The caller stores the returned memory and passes it
/// back on the next call.
pub async fn on_new_rows_added(
    state: Arc<AppState>,
    params: OnNewRowsAddedParams,
) -> Result<PollOutcome> {
    let target = PollTarget::new(params.spreadsheet_id.trim(), params.sheet_name);
    let outcome = poll_new_rows(state.backend(), &target, params.memory.as_ref(), Utc::now()).await?;
    Ok(outcome)
}
