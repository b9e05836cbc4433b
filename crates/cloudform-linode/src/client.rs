//! Linode REST API client
//!
//! Every failed call is classified into a [`RemoteError`] here, once, from
//! its HTTP status. Transient failures are retried with exponential backoff
//! before they are handed to the caller.

use crate::config::{ClientConfig, RetryConfig};
use crate::error::Result as ConfigResult;
use cloudform_core::{RemoteError, Result};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Shared handle to the Linode API.
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Clone)]
pub struct LinodeClient {
    http: reqwest::Client,
    inner: Arc<Inner>,
}

struct Inner {
    base_url: String,
    token: String,
    retry: RetryConfig,
}

impl std::fmt::Debug for LinodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinodeClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl LinodeClient {
    pub fn new(config: ClientConfig) -> ConfigResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            inner: Arc::new(Inner {
                base_url: config.base_url(),
                token: config.token,
                retry: config.retry,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Full URL of an API path such as `/domains/42`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.send(Method::GET, path, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let value = self.send(Method::POST, path, Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let value = self.send(Method::PUT, path, Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.endpoint(path);
        let retry = &self.inner.retry;
        let mut attempt = 1;

        loop {
            tracing::debug!(%method, %url, attempt, "linode request");
            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&self.inner.token);
            if let Some(body) = &body {
                request = request.json(body);
            }

            let (error, retryable) = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let text = match response.text().await {
                        Ok(text) => text,
                        Err(err) => {
                            return Err(RemoteError::classify(Some(status.as_u16()), err.to_string())
                                .into());
                        }
                    };
                    if status.is_success() {
                        return parse_body(&text);
                    }
                    let error = RemoteError::classify(
                        Some(status.as_u16()),
                        api_error_message(&text, status.canonical_reason()),
                    );
                    let retryable = error.is_transient();
                    (error, retryable)
                }
                Err(err) => {
                    let retryable = err.is_timeout() || err.is_connect();
                    (RemoteError::classify(None, err.to_string()), retryable)
                }
            };

            if retryable && attempt < retry.max_attempts {
                let delay = retry.delay_for(attempt);
                tracing::warn!(
                    %method,
                    %url,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            tracing::debug!(%method, %url, error = %error, "linode request failed");
            return Err(error.into());
        }
    }
}

fn parse_body(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_str(text)?)
}

/// Human readable message from a Linode error body.
///
/// The API answers failures with `{"errors": [{"reason": ..., "field": ...}]}`.
pub(crate) fn api_error_message(body: &str, fallback: Option<&str>) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        errors: Vec<ApiError>,
    }

    #[derive(serde::Deserialize)]
    struct ApiError {
        reason: String,
        field: Option<String>,
    }

    let messages: Vec<String> = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| {
            parsed
                .errors
                .into_iter()
                .map(|e| match e.field {
                    Some(field) => format!("[{}] {}", field, e.reason),
                    None => e.reason,
                })
                .collect()
        })
        .unwrap_or_default();

    if !messages.is_empty() {
        return messages.join("; ");
    }
    if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    fallback.unwrap_or("Unknown error").to_string()
}
