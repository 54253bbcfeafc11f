//! Error handling for the Google Sheets connector
//!
//! This module provides:
//! - `ConnectorError`, the typed error raised by address parsing, the glossary
//!   codec, the poller and the remote API client
//! - Configuration vs application classification of every failure
//! - MCP error codes (JSON-RPC standard + custom codes)
//! - Error telemetry counters
//! - Conversion into `rmcp::ErrorData` at the protocol boundary

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

pub type ConnectorResult<T> = Result<T, ConnectorError>;

// =============================================================================
// CONNECTOR ERRORS
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectorError {
    /// Malformed column letters or cell address text
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// Non-numeric or non-positive row text
    #[error("invalid row: {0}")]
    InvalidRow(String),
    /// The operation ran but found no usable data
    #[error("{0}")]
    EmptyData(String),
    /// Caller input that cannot be acted on
    #[error("{0}")]
    Misconfiguration(String),
    #[error("sheet '{sheet_name}' was not found in spreadsheet '{spreadsheet_id}'")]
    SheetNotFound {
        spreadsheet_id: String,
        sheet_name: String,
    },
    /// The remote spreadsheet/drive service answered with an error status
    #[error("remote service error: status {status}, {message}")]
    Remote { status: u16, message: String },
    /// The request never produced a usable response (network, retries exhausted)
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{0}")]
    Application(String),
}

/// How a failure is surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller can fix it by changing inputs
    Configuration,
    /// The action ran and failed for reasons outside the inputs
    Application,
}

impl ConnectorError {
    pub fn misconfiguration(message: impl Into<String>) -> Self {
        Self::Misconfiguration(message.into())
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::Application(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectorError::InvalidAddress(_)
            | ConnectorError::InvalidRow(_)
            | ConnectorError::Misconfiguration(_)
            | ConnectorError::SheetNotFound { .. } => ErrorKind::Configuration,
            ConnectorError::Remote { status, .. } if (400..500).contains(status) && *status != 429 => {
                ErrorKind::Configuration
            }
            ConnectorError::Remote { .. }
            | ConnectorError::EmptyData(_)
            | ConnectorError::Transport(_)
            | ConnectorError::Application(_) => ErrorKind::Application,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ConnectorError::InvalidAddress(_) => ErrorCode::InvalidAddress,
            ConnectorError::InvalidRow(_) => ErrorCode::InvalidRow,
            ConnectorError::EmptyData(_) => ErrorCode::EmptyData,
            ConnectorError::Misconfiguration(_) => ErrorCode::InvalidParams,
            ConnectorError::SheetNotFound { .. } => ErrorCode::SheetNotFound,
            ConnectorError::Remote { status: 429, .. } => ErrorCode::RateLimited,
            ConnectorError::Remote { status: 403, .. } => ErrorCode::PermissionDenied,
            ConnectorError::Remote { status: 404, .. } => ErrorCode::ResourceNotFound,
            ConnectorError::Remote { .. } => ErrorCode::RemoteServiceError,
            ConnectorError::Transport(_) => ErrorCode::TransportError,
            ConnectorError::Application(_) => ErrorCode::InternalError,
        }
    }

    /// Message shown to the caller, with a hint for input errors.
    pub fn user_message(&self) -> String {
        match self {
            ConnectorError::Remote { .. } if self.kind() == ErrorKind::Configuration => {
                format!("{self}. Please check your inputs and try again")
            }
            _ => self.to_string(),
        }
    }
}

// =============================================================================
// MCP ERROR CODES
// =============================================================================

/// MCP error codes following JSON-RPC 2.0 specification plus custom codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    // Standard JSON-RPC errors (-32700 to -32603)
    /// The JSON sent is not a valid Request object
    InvalidRequest = -32600,
    /// Invalid method parameter(s)
    InvalidParams = -32602,
    /// Internal JSON-RPC error
    InternalError = -32603,

    // Custom application errors (-32000 to -32099)
    /// Column letters or cell address could not be parsed
    InvalidAddress = -32001,
    /// Row text is not a positive integer
    InvalidRow = -32002,
    /// Sheet or glossary contained no usable rows
    EmptyData = -32003,
    /// Sheet title not present in the spreadsheet
    SheetNotFound = -32004,
    /// Remote service rejected the request
    RemoteServiceError = -32005,
    /// Remote service kept answering 429 after all retries
    RateLimited = -32006,
    /// Remote object (spreadsheet, file, folder) does not exist
    ResourceNotFound = -32007,
    /// Token lacks access to the remote object
    PermissionDenied = -32008,
    /// Network failure talking to the remote service
    TransportError = -32009,
    /// Tool disabled by configuration
    ToolDisabled = -32010,
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::InternalError | ErrorCode::RateLimited | ErrorCode::TransportError
        )
    }

    /// Get the error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest | ErrorCode::InvalidParams => "client_error",
            ErrorCode::InvalidAddress | ErrorCode::InvalidRow => "validation_error",
            ErrorCode::EmptyData => "empty_data",
            ErrorCode::SheetNotFound | ErrorCode::ResourceNotFound => "resource_not_found",
            ErrorCode::RemoteServiceError | ErrorCode::RateLimited | ErrorCode::TransportError => {
                "remote_error"
            }
            ErrorCode::PermissionDenied => "permission_error",
            ErrorCode::ToolDisabled => "not_found",
            ErrorCode::InternalError => "server_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

// =============================================================================
// ERROR TELEMETRY
// =============================================================================

/// Error metrics for telemetry
#[derive(Debug)]
pub struct ErrorMetrics {
    error_counts: RwLock<HashMap<ErrorCode, AtomicU64>>,
    tool_errors: RwLock<HashMap<String, AtomicU64>>,
    category_counts: RwLock<HashMap<String, AtomicU64>>,
}

impl ErrorMetrics {
    pub fn new() -> Self {
        Self {
            error_counts: RwLock::new(HashMap::new()),
            tool_errors: RwLock::new(HashMap::new()),
            category_counts: RwLock::new(HashMap::new()),
        }
    }

    /// Record an error occurrence
    pub fn record_error(&self, code: &ErrorCode, tool: Option<&str>) {
        increment(&self.error_counts, code, |code| *code);
        if let Some(tool_name) = tool {
            increment(&self.tool_errors, tool_name, |name| name.to_string());
        }
        let category = code.category();
        increment(&self.category_counts, category, |name| name.to_string());

        tracing::debug!(
            error_code = %code,
            tool = tool,
            category = category,
            "error recorded"
        );
    }

    pub fn get_error_count(&self, code: &ErrorCode) -> u64 {
        self.error_counts
            .read()
            .get(code)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn get_tool_error_count(&self, tool: &str) -> u64 {
        self.tool_errors
            .read()
            .get(tool)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn get_category_count(&self, category: &str) -> u64 {
        self.category_counts
            .read()
            .get(category)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn reset(&self) {
        self.error_counts.write().clear();
        self.tool_errors.write().clear();
        self.category_counts.write().clear();
    }
}

impl Default for ErrorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn increment<K, Q>(map: &RwLock<HashMap<K, AtomicU64>>, key: &Q, to_owned: impl Fn(&Q) -> K)
where
    K: std::hash::Hash + Eq + std::borrow::Borrow<Q>,
    Q: std::hash::Hash + Eq + ?Sized,
{
    {
        let read = map.read();
        if let Some(counter) = read.get(key) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
    }
    map.write()
        .entry(to_owned(key))
        .or_insert_with(|| AtomicU64::new(0))
        .fetch_add(1, Ordering::Relaxed);
}

/// Global error metrics instance
pub static ERROR_METRICS: once_cell::sync::Lazy<ErrorMetrics> =
    once_cell::sync::Lazy::new(ErrorMetrics::new);

// =============================================================================
// PROTOCOL BOUNDARY
// =============================================================================

/// Payload attached to every error returned over MCP.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: i32,
    pub code_name: String,
    pub kind: ErrorKind,
    pub retryable: bool,
    pub tool: String,
}

/// Convert a tool failure into `rmcp::ErrorData`, recording it in telemetry.
///
/// Errors that carry a `ConnectorError` keep their classification; anything
/// else is reported as an application error.
pub fn to_rmcp_error(error: anyhow::Error, tool: &str) -> rmcp::ErrorData {
    let (code, kind, message) = match error.downcast_ref::<ConnectorError>() {
        Some(connector) => (connector.code(), connector.kind(), connector.user_message()),
        None => (ErrorCode::InternalError, ErrorKind::Application, format!("{error:#}")),
    };
    ERROR_METRICS.record_error(&code, Some(tool));

    let payload = ErrorPayload {
        code: code.code(),
        code_name: format!("{code:?}"),
        kind,
        retryable: code.is_retryable(),
        tool: tool.to_string(),
    };
    let data = serde_json::to_value(&payload).ok();

    match kind {
        ErrorKind::Configuration => rmcp::ErrorData::invalid_params(message, data),
        ErrorKind::Application => rmcp::ErrorData::internal_error(message, data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(ErrorCode::InvalidParams.code(), -32602);
        assert_eq!(ErrorCode::InternalError.code(), -32603);
        assert_eq!(ErrorCode::InvalidAddress.code(), -32001);
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            ConnectorError::InvalidAddress("A-1".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ConnectorError::InvalidRow("x".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ConnectorError::EmptyData("no rows".into()).kind(),
            ErrorKind::Application
        );
        let not_found = ConnectorError::Remote {
            status: 404,
            message: "Requested entity was not found.".into(),
        };
        assert_eq!(not_found.kind(), ErrorKind::Configuration);
        assert_eq!(not_found.code(), ErrorCode::ResourceNotFound);

        let throttled = ConnectorError::Remote {
            status: 429,
            message: "quota".into(),
        };
        assert_eq!(throttled.kind(), ErrorKind::Application);
        assert!(throttled.code().is_retryable());

        let server = ConnectorError::Remote {
            status: 503,
            message: "backend".into(),
        };
        assert_eq!(server.kind(), ErrorKind::Application);
    }

    #[test]
    fn test_error_metrics() {
        let metrics = ErrorMetrics::new();

        metrics.record_error(&ErrorCode::InvalidRow, Some("get_cell"));
        metrics.record_error(&ErrorCode::InvalidRow, Some("get_cell"));
        metrics.record_error(&ErrorCode::SheetNotFound, Some("delete_sheet"));

        assert_eq!(metrics.get_error_count(&ErrorCode::InvalidRow), 2);
        assert_eq!(metrics.get_error_count(&ErrorCode::SheetNotFound), 1);
        assert_eq!(metrics.get_tool_error_count("get_cell"), 2);
        assert_eq!(metrics.get_category_count("validation_error"), 2);

        metrics.reset();
        assert_eq!(metrics.get_error_count(&ErrorCode::InvalidRow), 0);
    }

    #[test]
    fn test_rmcp_conversion_keeps_classification() {
        let err = anyhow::Error::new(ConnectorError::InvalidRow("row must be positive".into()));
        let data = to_rmcp_error(err, "get_cell");
        assert_eq!(data.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert!(data.message.contains("row must be positive"));

        let err = anyhow::anyhow!("something unexpected");
        let data = to_rmcp_error(err, "get_cell");
        assert_eq!(data.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
    }

    #[test]
    fn test_remote_user_message_has_hint() {
        let err = ConnectorError::Remote {
            status: 400,
            message: "Unable to parse range".into(),
        };
        assert!(err.user_message().ends_with("Please check your inputs and try again"));
    }
}
