//! HTTP dispatch client with configurable timeouts.
//!
//! One envelope, one POST. An absent sink short-circuits to a no-op
//! (the intended disabled state); any transport failure or non-2xx
//! response surfaces as a `DeliveryError`. No retries.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info_span, Instrument};

use ormcast_core::EventEnvelope;

use crate::error::{DeliveryError, Result};
use crate::wire;

/// Configuration for the dispatch client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Maximum number of redirects to follow.
    pub max_redirects: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECONDS),
            user_agent: concat!("ormcast/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 3,
        }
    }
}

/// Outcome of a dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No sink configured; nothing was sent.
    Skipped,
    /// The sink accepted the envelope.
    Delivered(DispatchReceipt),
}

/// Details of an accepted delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    /// HTTP status code returned by the sink.
    pub status_code: u16,
    /// Total duration of the request.
    pub duration: Duration,
}

/// HTTP client performing one POST per envelope.
#[derive(Debug, Clone)]
pub struct DispatchClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl DispatchClient {
    /// Creates a dispatch client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the HTTP client cannot
    /// be built with the provided settings.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects as usize))
            .build()
            .map_err(|e| {
                DeliveryError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Creates a dispatch client with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Dispatches one envelope to the sink.
    ///
    /// An absent or empty sink is the disabled state: returns
    /// `DispatchOutcome::Skipped` without touching the network.
    ///
    /// # Errors
    ///
    /// - `Network` for connection failures
    /// - `Timeout` when the configured timeout elapses
    /// - `ClientError` for 4xx responses
    /// - `ServerError` for 5xx responses
    pub async fn dispatch(
        &self,
        envelope: &EventEnvelope,
        sink: Option<&str>,
    ) -> Result<DispatchOutcome> {
        let Some(sink) = sink.filter(|s| !s.is_empty()) else {
            tracing::debug!(event_id = %envelope.id, "no sink configured, skipping dispatch");
            return Ok(DispatchOutcome::Skipped);
        };

        let span = info_span!(
            "event_dispatch",
            event_id = %envelope.id,
            event_type = %envelope.event_type,
            sink = %sink,
        );

        async move {
            let (headers, body) = wire::encode(envelope)?;
            let start = std::time::Instant::now();

            let response = match self.client.post(sink).headers(headers).body(body).send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(duration_ms = start.elapsed().as_millis(), "request failed: {e}");
                    if e.is_timeout() {
                        return Err(DeliveryError::timeout(self.config.timeout.as_secs()));
                    }
                    if e.is_connect() {
                        return Err(DeliveryError::network(format!("connection failed: {e}")));
                    }
                    return Err(DeliveryError::network(e.to_string()));
                },
            };

            let duration = start.elapsed();
            let status_code = response.status().as_u16();

            if response.status().is_success() {
                tracing::info!(status = status_code, duration_ms = duration.as_millis(), "event delivered");
                return Ok(DispatchOutcome::Delivered(DispatchReceipt { status_code, duration }));
            }

            let body = read_error_body(response).await;
            tracing::warn!(status = status_code, "sink rejected event");
            match status_code {
                500..=599 => Err(DeliveryError::server_error(status_code, body)),
                _ => Err(DeliveryError::client_error(status_code, body)),
            }
        }
        .instrument(span)
        .await
    }
}

/// Reads a failure response body for error context, truncated so a
/// misbehaving sink cannot bloat the error.
async fn read_error_body(response: reqwest::Response) -> String {
    const MAX_ERROR_BODY: usize = 1024;

    match response.bytes().await {
        Ok(bytes) if bytes.len() > MAX_ERROR_BODY => {
            let suffix = "... (truncated)";
            let truncated = String::from_utf8_lossy(&bytes[..MAX_ERROR_BODY - suffix.len()]);
            format!("{truncated}{suffix}")
        },
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => format!("[failed to read response body: {e}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_generous_timeout() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("ormcast/"));
    }

    #[tokio::test]
    async fn empty_sink_is_the_disabled_state() {
        let client = DispatchClient::with_defaults().unwrap();
        let envelope = ormcast_core::EnvelopeBuilder::default()
            .build(
                &ormcast_core::SenderDescriptor::new("app", "widget", "app_widget"),
                ormcast_core::NotificationKind::PostInit,
                ormcast_core::SignalArgs::new(),
            )
            .unwrap();

        assert_eq!(client.dispatch(&envelope, None).await.unwrap(), DispatchOutcome::Skipped);
        assert_eq!(client.dispatch(&envelope, Some("")).await.unwrap(), DispatchOutcome::Skipped);
    }
}
