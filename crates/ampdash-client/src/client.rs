//! HTTP client for the campaign bridge.
//!
//! Every named call is a `POST {base_url}/api/{callName}` with the call's
//! parameters as the JSON body. The bridge answers with the raw upstream
//! payload; a JSON object carrying a string `error` field (or
//! `"success": false`) signals a remote failure even under a 2xx status.

use std::future::Future;
use std::time::Duration;

use ampdash_core::AppConfig;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::call::ApiCall;
use crate::error::ClientError;
use crate::retry::retry_with_backoff;

/// Anything that can answer a named remote call with raw JSON.
///
/// Implementations return the source-shaped payload untouched; decoding into
/// canonical entities happens in [`crate::normalize`].
pub trait Upstream {
    /// Issues `call` and returns its raw payload.
    fn call(&self, call: &ApiCall) -> impl Future<Output = Result<Value, ClientError>> + Send;
}

/// [`Upstream`] backed by the HTTP bridge.
///
/// Use [`HttpUpstream::from_config`] in production or
/// [`HttpUpstream::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HttpUpstream {
    /// Builds a client from the loaded application config.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`ClientError::InvalidBaseUrl`] for a bad base URL.
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Ok(Self::with_base_url(
            &config.api_base_url,
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .with_retry(config.max_retries, config.retry_backoff_base_ms))
    }

    /// Creates a client for `base_url` with retries disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`ClientError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so `join("api/...")` appends to the
        // path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Enables retries of transient failures.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoint URL for a call name.
    fn call_url(&self, name: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(&format!("api/{name}"))
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Sends one POST, maps the HTTP status, and parses the body.
    async fn post_once(
        &self,
        name: &str,
        url: &Url,
        params: &Value,
    ) -> Result<Value, ClientError> {
        let response = self.client.post(url.clone()).json(params).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ClientError::RateLimited {
                call: name.to_owned(),
                retry_after_secs,
            });
        }

        let body = response.text().await?;

        if !status.is_success() {
            // Prefer the bridge's own message when it sent one.
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| remote_error(&v));
            return Err(match message {
                Some(message) if status.is_client_error() => ClientError::Api {
                    call: name.to_owned(),
                    message,
                },
                _ => ClientError::UnexpectedStatus {
                    call: name.to_owned(),
                    status: status.as_u16(),
                },
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        let payload: Value =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: format!("{name} response"),
                source: e,
            })?;
        unwrap_envelope(name, payload)
    }
}

impl Upstream for HttpUpstream {
    async fn call(&self, call: &ApiCall) -> Result<Value, ClientError> {
        let name = call.name();
        let url = self.call_url(name)?;
        let params = call.params();
        tracing::debug!(call = name, %url, "upstream call");

        retry_with_backoff(name, self.max_retries, self.backoff_base_ms, || {
            self.post_once(name, &url, &params)
        })
        .await
    }
}

/// Extracts the remote error message from an error-shaped body.
fn remote_error(body: &Value) -> Option<String> {
    let obj = body.as_object()?;
    if let Some(message) = obj.get("error").and_then(Value::as_str) {
        return Some(message.to_owned());
    }
    if obj.get("success").and_then(Value::as_bool) == Some(false) {
        return Some(
            obj.get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_owned(),
        );
    }
    None
}

/// Turns a 2xx body into the payload, surfacing embedded error indicators and
/// unwrapping a `{"data": ...}` envelope.
fn unwrap_envelope(name: &str, payload: Value) -> Result<Value, ClientError> {
    if let Some(message) = remote_error(&payload) {
        return Err(ClientError::Api {
            call: name.to_owned(),
            message,
        });
    }
    match payload {
        Value::Object(mut map) if map.contains_key("data") => {
            Ok(map.remove("data").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
