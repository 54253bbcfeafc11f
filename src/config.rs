use crate::client::http::{ClientSettings, DEFAULT_DRIVE_BASE_URL, DEFAULT_SHEETS_BASE_URL};
use crate::client::rate_limit::{DEFAULT_MAX_RETRIES, RateLimitPolicy};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8079";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[value(alias = "stream-http", alias = "stream_http")]
    #[serde(alias = "stream-http", alias = "stream_http")]
    Http,
    Stdio,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Http => write!(f, "http"),
            TransportKind::Stdio => write!(f, "stdio"),
        }
    }
}

/// OAuth access token; never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("AccessToken(<empty>)")
        } else {
            f.write_str("AccessToken(<redacted>)")
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub access_token: AccessToken,
    pub sheets_api_base: String,
    pub drive_api_base: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub enabled_tools: Option<HashSet<String>>,
    pub transport: TransportKind,
    pub http_bind_address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            access_token: AccessToken::default(),
            sheets_api_base: DEFAULT_SHEETS_BASE_URL.to_string(),
            drive_api_base: DEFAULT_DRIVE_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            enabled_tools: None,
            transport: TransportKind::Stdio,
            http_bind_address: default_http_bind(),
        }
    }
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            access_token: cli_access_token,
            sheets_api_base: cli_sheets_api_base,
            drive_api_base: cli_drive_api_base,
            timeout_secs: cli_timeout_secs,
            max_retries: cli_max_retries,
            enabled_tools: cli_enabled_tools,
            transport: cli_transport,
            http_bind: cli_http_bind,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            access_token: file_access_token,
            sheets_api_base: file_sheets_api_base,
            drive_api_base: file_drive_api_base,
            timeout_secs: file_timeout_secs,
            max_retries: file_max_retries,
            enabled_tools: file_enabled_tools,
            transport: file_transport,
            http_bind: file_http_bind,
        } = file_config;

        let access_token = AccessToken::new(
            cli_access_token
                .or(file_access_token)
                .unwrap_or_default()
                .trim(),
        );

        let sheets_api_base = cli_sheets_api_base
            .or(file_sheets_api_base)
            .unwrap_or_else(|| DEFAULT_SHEETS_BASE_URL.to_string());
        let drive_api_base = cli_drive_api_base
            .or(file_drive_api_base)
            .unwrap_or_else(|| DEFAULT_DRIVE_BASE_URL.to_string());

        let request_timeout = Duration::from_secs(
            cli_timeout_secs
                .or(file_timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );
        let max_retries = cli_max_retries
            .or(file_max_retries)
            .unwrap_or(DEFAULT_MAX_RETRIES);

        let enabled_tools = cli_enabled_tools
            .or(file_enabled_tools)
            .map(|tools| {
                tools
                    .into_iter()
                    .map(|tool| tool.trim().to_ascii_lowercase())
                    .filter(|tool| !tool.is_empty())
                    .collect::<HashSet<_>>()
            })
            .filter(|set| !set.is_empty());

        let transport = cli_transport
            .or(file_transport)
            .unwrap_or(TransportKind::Stdio);

        let http_bind_address = cli_http_bind
            .or(file_http_bind)
            .unwrap_or_else(default_http_bind);

        Ok(Self {
            access_token,
            sheets_api_base,
            drive_api_base,
            request_timeout,
            max_retries,
            enabled_tools,
            transport,
            http_bind_address,
        })
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.access_token.is_empty(),
            "an access token is required (set GOOGLE_SHEETS_MCP_ACCESS_TOKEN)"
        );
        anyhow::ensure!(
            !self.request_timeout.is_zero(),
            "request timeout must be greater than zero"
        );
        for (name, raw) in [
            ("sheets API base", &self.sheets_api_base),
            ("drive API base", &self.drive_api_base),
        ] {
            let url = reqwest::Url::parse(raw)
                .with_context(|| format!("{name} URL {raw:?} is not a valid URL"))?;
            anyhow::ensure!(
                matches!(url.scheme(), "http" | "https"),
                "{name} URL {raw:?} must use http or https"
            );
        }
        Ok(())
    }

    pub fn is_tool_enabled(&self, tool: &str) -> bool {
        match &self.enabled_tools {
            Some(set) => set.contains(&tool.to_ascii_lowercase()),
            None => true,
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            access_token: self.access_token.expose().to_string(),
            sheets_base_url: self.sheets_api_base.clone(),
            drive_base_url: self.drive_api_base.clone(),
            timeout: self.request_timeout,
            rate_limit: RateLimitPolicy::with_max_retries(self.max_retries),
        }
    }
}

fn default_http_bind() -> SocketAddr {
    DEFAULT_HTTP_BIND
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8079)))
}

#[derive(Parser, Debug, Default, Clone)]
#[command(
    name = "google-sheets-mcp",
    about = "Google Sheets MCP server",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "GOOGLE_SHEETS_MCP_ACCESS_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        help = "OAuth access token with Sheets and Drive scopes"
    )]
    pub access_token: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_SHEETS_MCP_SHEETS_API_BASE",
        value_name = "URL",
        help = "Base URL of the Sheets v4 API"
    )]
    pub sheets_api_base: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_SHEETS_MCP_DRIVE_API_BASE",
        value_name = "URL",
        help = "Base URL of the Drive v3 API"
    )]
    pub drive_api_base: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_SHEETS_MCP_TIMEOUT_SECS",
        value_name = "SECS",
        help = "Timeout for a single remote request, including retries of its body",
        value_parser = clap::value_parser!(u64)
    )]
    pub timeout_secs: Option<u64>,

    #[arg(
        long,
        env = "GOOGLE_SHEETS_MCP_MAX_RETRIES",
        value_name = "N",
        help = "Retries for requests rejected with HTTP 429",
        value_parser = clap::value_parser!(u32)
    )]
    pub max_retries: Option<u32>,

    #[arg(
        long,
        env = "GOOGLE_SHEETS_MCP_ENABLED_TOOLS",
        value_name = "TOOL",
        value_delimiter = ',',
        help = "Restrict execution to the provided tool names"
    )]
    pub enabled_tools: Option<Vec<String>>,

    #[arg(
        long,
        env = "GOOGLE_SHEETS_MCP_TRANSPORT",
        value_enum,
        value_name = "TRANSPORT",
        help = "Transport to expose (http or stdio)"
    )]
    pub transport: Option<TransportKind>,

    #[arg(
        long,
        env = "GOOGLE_SHEETS_MCP_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address when using http transport"
    )]
    pub http_bind: Option<SocketAddr>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    access_token: Option<String>,
    sheets_api_base: Option<String>,
    drive_api_base: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    enabled_tools: Option<Vec<String>>,
    transport: Option<TransportKind>,
    http_bind: Option<SocketAddr>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
