// ABOUTME: Environment configuration for the fee client: backend URL, timeouts, refresh mode
// ABOUTME: Parses environment variables into a validated ClientConfig
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! Environment-based configuration

use crate::constants::{defaults, env_vars};
use crate::guard::RefreshMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::info;
use url::Url;

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development against `runserver`
    #[default]
    Development,
    /// Production backend
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// HTTP client timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Total request timeout in seconds
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::HTTP_TIMEOUT_SECS,
            connect_timeout_secs: defaults::CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Everything the guarded client needs at startup
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `http://localhost:8000/api`
    pub base_url: Url,
    /// HTTP timeouts
    pub http: HttpClientConfig,
    /// How concurrent 401s are handled
    pub refresh_mode: RefreshMode,
    /// Token file override for the CLI
    pub session_file: Option<PathBuf>,
    /// Deployment environment
    pub environment: Environment,
}

impl ClientConfig {
    /// Defaults for everything except the backend URL
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            http: HttpClientConfig::default(),
            refresh_mode: RefreshMode::default(),
            session_file: None,
            environment: Environment::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value or the
    /// resulting configuration fails [`validate`](Self::validate)
    pub fn from_env() -> Result<Self> {
        info!("Loading client configuration from environment variables");

        let base_url = env::var(env_vars::BASE_URL)
            .or_else(|_| env::var(env_vars::LEGACY_BASE_URL))
            .unwrap_or_else(|_| defaults::BASE_URL.to_owned());

        let config = Self {
            base_url: Url::parse(base_url.trim())
                .with_context(|| format!("Invalid {} value '{base_url}'", env_vars::BASE_URL))?,
            http: HttpClientConfig {
                timeout_secs: env_var_or(
                    env_vars::HTTP_TIMEOUT_SECS,
                    &defaults::HTTP_TIMEOUT_SECS.to_string(),
                )
                .parse()
                .context("Invalid FEE_HTTP_TIMEOUT_SECS value")?,
                connect_timeout_secs: env_var_or(
                    env_vars::CONNECT_TIMEOUT_SECS,
                    &defaults::CONNECT_TIMEOUT_SECS.to_string(),
                )
                .parse()
                .context("Invalid FEE_CONNECT_TIMEOUT_SECS value")?,
            },
            refresh_mode: env_var_or(env_vars::REFRESH_MODE, RefreshMode::default().as_str())
                .parse()
                .context("Invalid FEE_REFRESH_MODE value")?,
            session_file: env::var(env_vars::SESSION_FILE)
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            environment: Environment::from_str_or_default(&env_var_or(
                env_vars::ENVIRONMENT,
                "development",
            )),
        };

        config.validate()?;
        info!("Client configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s) or a timeout is zero
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!(
                "{} must be an http(s) URL, got '{}'",
                env_vars::BASE_URL,
                self.base_url
            ));
        }
        if self.base_url.cannot_be_a_base() {
            return Err(anyhow::anyhow!("{} cannot be a base URL", self.base_url));
        }
        if self.http.timeout_secs == 0 || self.http.connect_timeout_secs == 0 {
            return Err(anyhow::anyhow!("HTTP timeouts must be greater than zero"));
        }
        if self.http.connect_timeout_secs > self.http.timeout_secs {
            return Err(anyhow::anyhow!(
                "connect timeout ({}s) exceeds request timeout ({}s)",
                self.http.connect_timeout_secs,
                self.http.timeout_secs
            ));
        }
        if self.environment.is_production() && self.base_url.scheme() != "https" {
            return Err(anyhow::anyhow!(
                "production backend must use https, got '{}'",
                self.base_url
            ));
        }
        Ok(())
    }

    /// Resolved token file: override, else `<config dir>/college-fee-client/session.json`
    #[must_use]
    pub fn session_file_path(&self) -> Option<PathBuf> {
        self.session_file.clone().or_else(|| {
            dirs::config_dir().map(|dir| {
                dir.join(defaults::CONFIG_DIR_NAME)
                    .join(defaults::SESSION_FILE_NAME)
            })
        })
    }

    /// Get a summary of the configuration for logging
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "College Fee Client Configuration:\n\
             - Backend: {}\n\
             - Environment: {}\n\
             - Timeouts: {}s request / {}s connect\n\
             - Refresh Mode: {}\n\
             - Session File: {}",
            self.base_url,
            self.environment,
            self.http.timeout_secs,
            self.http.connect_timeout_secs,
            self.refresh_mode,
            self.session_file_path()
                .map_or_else(|| "none".to_owned(), |p| p.display().to_string()),
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
