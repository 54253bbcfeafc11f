/// Prometheus metrics for the connector.
///
/// Tool invocations and calls against the remote Sheets/Drive APIs are
/// counted and timed; the registry is served at `/metrics` under HTTP transport.
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global metrics registry instance
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    /// Tool name (e.g., "get_cell", "import_csv")
    pub tool: String,
    /// "success" or "error"
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ToolLabels {
    pub tool: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ErrorLabels {
    pub tool: String,
    pub error_type: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RemoteCallLabels {
    /// Backend operation (e.g., "values.get", "files.list")
    pub operation: String,
    /// HTTP status class ("2xx", "4xx", "429", ...) or "transport" when no response arrived
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OperationLabels {
    pub operation: String,
}

pub struct MetricsCollector {
    registry: RwLock<Registry>,

    /// Tool requests by tool and status
    pub mcp_requests_total: Family<RequestLabels, Counter>,
    pub mcp_request_duration_seconds: Family<ToolLabels, Histogram>,
    pub mcp_active_requests: Family<ToolLabels, Gauge>,
    pub mcp_errors_total: Family<ErrorLabels, Counter>,

    /// Remote API calls by operation and status
    pub remote_calls_total: Family<RemoteCallLabels, Counter>,
    pub remote_call_duration_seconds: Family<OperationLabels, Histogram>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let mcp_requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "mcp_requests_total",
            "Total number of MCP tool requests",
            mcp_requests_total.clone(),
        );

        let mcp_request_duration_seconds =
            Family::<ToolLabels, Histogram>::new_with_constructor(|| {
                // 10ms .. ~38s
                Histogram::new(exponential_buckets(0.01, 2.5, 10))
            });
        registry.register(
            "mcp_request_duration_seconds",
            "Tool request latency histogram in seconds",
            mcp_request_duration_seconds.clone(),
        );

        let mcp_active_requests = Family::<ToolLabels, Gauge>::default();
        registry.register(
            "mcp_active_requests",
            "Number of tool requests currently being processed",
            mcp_active_requests.clone(),
        );

        let mcp_errors_total = Family::<ErrorLabels, Counter>::default();
        registry.register(
            "mcp_errors_total",
            "Total number of tool errors by tool and error type",
            mcp_errors_total.clone(),
        );

        let remote_calls_total = Family::<RemoteCallLabels, Counter>::default();
        registry.register(
            "remote_calls_total",
            "Total number of Sheets/Drive API calls by operation and status",
            remote_calls_total.clone(),
        );

        let remote_call_duration_seconds =
            Family::<OperationLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.05, 2.0, 12))
            });
        registry.register(
            "remote_call_duration_seconds",
            "Sheets/Drive API call latency histogram in seconds",
            remote_call_duration_seconds.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            mcp_requests_total,
            mcp_request_duration_seconds,
            mcp_active_requests,
            mcp_errors_total,
            remote_calls_total,
            remote_call_duration_seconds,
        }
    }

    /// Encode metrics in Prometheus text format
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        let registry = self.registry.read();
        if let Err(error) = encode(&mut buffer, &registry) {
            tracing::warn!(%error, "failed to encode metrics");
        }
        buffer
    }

    pub fn record_request_success(&self, tool: &str, duration: Duration) {
        self.record_request(tool, "success", duration);
    }

    pub fn record_request_error(&self, tool: &str, duration: Duration, error_type: &str) {
        self.record_request(tool, "error", duration);
        self.mcp_errors_total
            .get_or_create(&ErrorLabels {
                tool: tool.to_string(),
                error_type: error_type.to_string(),
            })
            .inc();
    }

    fn record_request(&self, tool: &str, status: &str, duration: Duration) {
        self.mcp_requests_total
            .get_or_create(&RequestLabels {
                tool: tool.to_string(),
                status: status.to_string(),
            })
            .inc();
        self.mcp_request_duration_seconds
            .get_or_create(&ToolLabels {
                tool: tool.to_string(),
            })
            .observe(duration.as_secs_f64());
    }

    /// Record one remote API attempt. `status` is 0 when the request never got a response.
    pub fn record_remote_call(&self, operation: &str, status: u16, duration: Duration) {
        self.remote_calls_total
            .get_or_create(&RemoteCallLabels {
                operation: operation.to_string(),
                status: status_label(status),
            })
            .inc();
        self.remote_call_duration_seconds
            .get_or_create(&OperationLabels {
                operation: operation.to_string(),
            })
            .observe(duration.as_secs_f64());
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn status_label(status: u16) -> String {
    match status {
        0 => "transport".to_string(),
        429 => "429".to_string(),
        100..=599 => format!("{}xx", status / 100),
        _ => "other".to_string(),
    }
}

/// RAII guard timing one tool request.
///
/// A guard dropped without `success` or `error` is recorded as an error of
/// type "cancelled", which is what happens when the client abandons the call.
pub struct RequestMetrics {
    tool: String,
    start: Instant,
    completed: bool,
}

impl RequestMetrics {
    pub fn new(tool: &str) -> Self {
        METRICS
            .mcp_active_requests
            .get_or_create(&ToolLabels {
                tool: tool.to_string(),
            })
            .inc();

        Self {
            tool: tool.to_string(),
            start: Instant::now(),
            completed: false,
        }
    }

    pub fn success(mut self) {
        METRICS.record_request_success(&self.tool, self.start.elapsed());
        self.finish();
    }

    pub fn error(mut self, error_type: &str) {
        METRICS.record_request_error(&self.tool, self.start.elapsed(), error_type);
        self.finish();
    }

    fn finish(&mut self) {
        self.completed = true;
        METRICS
            .mcp_active_requests
            .get_or_create(&ToolLabels {
                tool: self.tool.clone(),
            })
            .dec();
    }
}

impl Drop for RequestMetrics {
    fn drop(&mut self) {
        if !self.completed {
            METRICS.record_request_error(&self.tool, self.start.elapsed(), "cancelled");
            self.finish();
        }
    }
}
