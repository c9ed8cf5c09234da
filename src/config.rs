//! Client configuration.
//!
//! Every knob of the workflow lives in [`ClientConfig`], built through
//! [`ClientConfigBuilder`]. The defaults match the web form this client
//! replaces: a local server, a 4-second success toast, and no upper bound on
//! how long a preview image may take to load.

use crate::error::WorkflowError;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

/// Default server origin.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// How long the success toast stays visible.
pub const DEFAULT_TOAST_MS: u64 = 4000;

/// Configuration for a [`crate::workflow::Workflow`].
///
/// # Example
/// ```rust
/// use aadhaar_gen_client::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .server_url("https://cards.example.org")
///     .request_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.origin(), "https://cards.example.org");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server the three endpoints are resolved against. Only its origin is
    /// used; any path component is ignored. Default: `http://localhost:3000`.
    pub server_url: Url,

    /// Per-request timeout in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Upper bound on a single preview load. Default: `None` (unbounded).
    pub asset_load_timeout_secs: Option<u64>,

    /// Success toast lifetime in milliseconds. Default: 4000.
    pub toast_duration_ms: u64,

    /// Directory the PDF export lands in. Default: current directory.
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: Url::parse(DEFAULT_SERVER_URL).expect("default server URL is valid"),
            request_timeout_secs: 120,
            asset_load_timeout_secs: None,
            toast_duration_ms: DEFAULT_TOAST_MS,
            output_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
            server_url: None,
        }
    }

    /// `scheme://host[:port]` of the server, with no trailing slash.
    pub fn origin(&self) -> String {
        self.server_url.origin().ascii_serialization()
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn asset_load_timeout(&self) -> Option<Duration> {
        self.asset_load_timeout_secs.map(Duration::from_secs)
    }

    /// Absolute URL of one of the server's endpoints.
    pub fn endpoint(&self, path: &str) -> Result<Url, WorkflowError> {
        self.server_url
            .join(path)
            .map_err(|e| WorkflowError::InvalidUrl {
                url: path.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
    server_url: Option<String>,
}

impl ClientConfigBuilder {
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn asset_load_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.asset_load_timeout_secs = secs;
        self
    }

    pub fn toast_duration_ms(mut self, ms: u64) -> Self {
        self.config.toast_duration_ms = ms;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ClientConfig, WorkflowError> {
        if let Some(raw) = self.server_url.take() {
            let url = Url::parse(raw.trim()).map_err(|e| {
                WorkflowError::InvalidConfig(format!("server URL '{raw}' is invalid: {e}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return Err(WorkflowError::InvalidConfig(format!(
                    "server URL must be http(s)://host, got '{raw}'"
                )));
            }
            self.config.server_url = url;
        }
        if self.config.request_timeout_secs == 0 {
            return Err(WorkflowError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        if self.config.asset_load_timeout_secs == Some(0) {
            return Err(WorkflowError::InvalidConfig(
                "asset load timeout must be ≥ 1 second when set".into(),
            ));
        }
        Ok(self.config)
    }
}
