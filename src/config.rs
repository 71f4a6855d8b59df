//! Configuration types for the analysis workflow.
//!
//! Everything the controller and the HTTP client need to know lives in
//! [`ClientConfig`], built via its [`ClientConfigBuilder`]. One struct keeps
//! the knobs easy to log and easy to diff between two runs.

use crate::error::PackDimError;
use crate::validation::ValidationPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default backend base URL when neither the builder nor the environment set one.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Configuration for an analysis workflow.
///
/// Built via [`ClientConfig::builder()`], [`ClientConfig::from_env()`] or
/// [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use packdim::{AnalysisPipeline, ClientConfig};
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:8000")
///     .pipeline(AnalysisPipeline::TwoPhase)
///     .poll_interval_ms(500)
///     .build()
///     .unwrap();
/// assert_eq!(config.pipeline, AnalysisPipeline::TwoPhase);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL without trailing slash. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Which analysis pipeline the controller drives. Default: [`AnalysisPipeline::Polling`].
    pub pipeline: AnalysisPipeline,

    /// Interval between job-status polls in milliseconds. Default: 2000.
    ///
    /// The first poll fires one full interval after the job is created.
    pub poll_interval_ms: u64,

    /// Per-request timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Uploads above this many bytes are rejected locally. Default: 10 MiB.
    pub max_upload_bytes: u64,

    /// Uploads above this many bytes get an advisory warning. Default: 5 MiB.
    pub large_file_warning_bytes: u64,

    /// Optional `User-Agent` override for the HTTP client.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let policy = ValidationPolicy::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pipeline: AnalysisPipeline::default(),
            poll_interval_ms: 2000,
            request_timeout_secs: 30,
            max_upload_bytes: policy.max_bytes,
            large_file_warning_bytes: policy.warn_bytes,
            user_agent: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("pipeline", &self.pipeline)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("large_file_warning_bytes", &self.large_file_warning_bytes)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from `PACKDIM_API_BASE`, `PACKDIM_PIPELINE`,
    /// `PACKDIM_POLL_MS` and `PACKDIM_TIMEOUT`, falling back to defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self, PackDimError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PackDimError> {
        let mut builder = Self::builder();
        if let Some(base) = lookup("PACKDIM_API_BASE") {
            if !base.trim().is_empty() {
                builder = builder.base_url(base);
            }
        }
        if let Some(pipeline) = lookup("PACKDIM_PIPELINE") {
            builder = builder.pipeline(pipeline.parse()?);
        }
        if let Some(ms) = lookup("PACKDIM_POLL_MS") {
            builder = builder.poll_interval_ms(env_number("PACKDIM_POLL_MS", &ms)?);
        }
        if let Some(secs) = lookup("PACKDIM_TIMEOUT") {
            builder = builder.request_timeout_secs(env_number("PACKDIM_TIMEOUT", &secs)?);
        }
        builder.build()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The validation thresholds this config implies.
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            max_bytes: self.max_upload_bytes,
            warn_bytes: self.large_file_warning_bytes,
        }
    }

    /// Join `path` onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn pipeline(mut self, pipeline: AnalysisPipeline) -> Self {
        self.config.pipeline = pipeline;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn large_file_warning_bytes(mut self, bytes: u64) -> Self {
        self.config.large_file_warning_bytes = bytes;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = Some(ua.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, PackDimError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(PackDimError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.poll_interval_ms == 0 {
            return Err(PackDimError::InvalidConfig(
                "poll interval must be ≥ 1 ms".into(),
            ));
        }
        if c.request_timeout_secs == 0 {
            return Err(PackDimError::InvalidConfig(
                "request timeout must be ≥ 1 s".into(),
            ));
        }
        if c.large_file_warning_bytes > c.max_upload_bytes {
            return Err(PackDimError::InvalidConfig(format!(
                "warning threshold ({} bytes) exceeds upload limit ({} bytes)",
                c.large_file_warning_bytes, c.max_upload_bytes
            )));
        }
        Ok(self.config)
    }
}

fn env_number(name: &str, value: &str) -> Result<u64, PackDimError> {
    let message = format!("{name} is not a number: '{value}'");
    value
        .trim()
        .parse()
        .map_err(|_| PackDimError::InvalidConfig(message))
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The two analysis pipelines sharing one landing/validation shell.
///
/// | Pipeline | Remote calls | Result |
/// |----------|--------------|--------|
/// | `Polling`  | create job, poll status, fetch result, update | width/height/depth |
/// | `TwoPhase` | OCR extract, then dimension mapping | OCR items + mapped dimension items |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisPipeline {
    /// Single asynchronous job tracked by polling. (default)
    #[default]
    Polling,
    /// Synchronous OCR extraction followed by dimension mapping.
    TwoPhase,
}

impl fmt::Display for AnalysisPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisPipeline::Polling => f.write_str("polling"),
            AnalysisPipeline::TwoPhase => f.write_str("two-phase"),
        }
    }
}

impl FromStr for AnalysisPipeline {
    type Err = PackDimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "polling" | "poll" | "job" => Ok(AnalysisPipeline::Polling),
            "two-phase" | "twophase" | "two_phase" | "ocr" => Ok(AnalysisPipeline::TwoPhase),
            other => Err(PackDimError::InvalidConfig(format!(
                "unknown pipeline '{other}' (expected 'polling' or 'two-phase')"
            ))),
        }
    }
}
