use clap::Parser;
use google_sheets_mcp::{
    CliArgs, LoggingConfig, ServerConfig, TransportKind, init_logging, run_server,
    shutdown_telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = ServerConfig::from_args(cli)?;

    // stdout carries the protocol under stdio, so logs go to stderr
    let mut logging_config = LoggingConfig::from_env();
    if config.transport == TransportKind::Stdio {
        logging_config = logging_config.for_stdio_transport();
    }
    let _guard = init_logging(logging_config)?;

    // Validate configuration before server startup (fail-fast)
    config.validate()?;

    let result = run_server(config).await;

    // Ensure traces are flushed before exit
    shutdown_telemetry();

    result
}
