//! HTTP client for the document script service

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::Value;

use super::error::RemoteError;
use super::models::{ScriptRequest, ScriptResponse};
use crate::config::RemoteConfig;

/// Anything that can run a named script function with positional parameters.
///
/// Returns `Ok(None)` when the function ran but returned nothing.
#[async_trait]
pub trait ScriptService: Send + Sync {
    async fn call(&self, function: &str, parameters: Vec<Value>) -> Result<Option<Value>, RemoteError>;
}

/// Calls the script execution endpoint over HTTPS
pub struct ScriptClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
    dev_mode: bool,
    timeout: Duration,
}

impl ScriptClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, timeout: Duration, dev_mode: bool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            token: token.into(),
            dev_mode,
            timeout,
        })
    }

    /// Build a client from settings, reading the access token from the
    /// environment or the token file
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            bail!("remote.endpoint is not set");
        }
        let token = resolve_token(config)?;
        Self::new(
            config.endpoint.clone(),
            token,
            Duration::from_secs(config.timeout_secs),
            config.dev_mode,
        )
    }
}

#[async_trait]
impl ScriptService for ScriptClient {
    async fn call(&self, function: &str, parameters: Vec<Value>) -> Result<Option<Value>, RemoteError> {
        let request = ScriptRequest {
            function,
            parameters: &parameters,
            dev_mode: self.dev_mode,
        };

        let start = Instant::now();
        log::debug!("Calling {} with {} parameters", function, parameters.len());

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(function, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Http {
                function: function.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(function, e))?;
        let parsed: ScriptResponse = serde_json::from_str(&body).map_err(|e| RemoteError::Decode {
            function: function.to_string(),
            message: e.to_string(),
        })?;

        log::debug!("{} returned in {:.2}s", function, start.elapsed().as_secs_f64());
        parsed.into_result(function)
    }
}

impl ScriptClient {
    fn transport_error(&self, function: &str, error: reqwest::Error) -> RemoteError {
        if error.is_timeout() {
            RemoteError::Timeout {
                function: function.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            RemoteError::Transport {
                function: function.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Default token file under the user's config directory
fn default_token_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("awards-cli").join("token"))
}

/// Bearer token from `token_env`, else the first line of the token file
pub fn resolve_token(config: &RemoteConfig) -> Result<String> {
    if let Ok(token) = std::env::var(&config.token_env) {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let Some(path) = config.token_file.clone().or_else(default_token_file) else {
        bail!(
            "No access token: set {} or configure remote.token_file",
            config.token_env
        );
    };

    let text = std::fs::read_to_string(&path).with_context(|| {
        format!(
            "No access token: {} is unset and {} could not be read",
            config.token_env,
            path.display()
        )
    })?;

    match text.lines().map(str::trim).find(|line| !line.is_empty()) {
        Some(token) => Ok(token.to_string()),
        None => bail!("Token file {} is empty", path.display()),
    }
}
