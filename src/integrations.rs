//! Outbound delivery to admin-registered integration endpoints.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Integration;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("could not build HTTP client: {0}")]
    Client(String),
    #[error("endpoint unreachable: {0}")]
    Transport(String),
}

/// Body POSTed to an endpoint by `ping`.
#[derive(Debug, Clone, Serialize)]
pub struct PingPayload {
    pub event: &'static str,
    pub integration_id: Uuid,
    pub sent_at: DateTime<Utc>,
}

impl PingPayload {
    pub fn for_integration(id: Uuid) -> Self {
        Self {
            event: "ping",
            integration_id: id,
            sent_at: Utc::now(),
        }
    }
}

/// ProbeOutcome
///
/// What came back from the endpoint. Any HTTP status counts as a delivery;
/// only transport failures are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status_code: u16,
    pub latency_ms: u64,
}

impl ProbeOutcome {
    pub fn success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[async_trait]
pub trait IntegrationProbe: Send + Sync {
    async fn ping(&self, integration: &Integration) -> Result<ProbeOutcome, ProbeError>;
}

/// HttpIntegrationProbe
///
/// `reqwest` client with a fixed per-request timeout.
#[derive(Clone)]
pub struct HttpIntegrationProbe {
    client: reqwest::Client,
}

impl HttpIntegrationProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("community-platform/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl IntegrationProbe for HttpIntegrationProbe {
    async fn ping(&self, integration: &Integration) -> Result<ProbeOutcome, ProbeError> {
        let started = Instant::now();
        let response = self
            .client
            .post(&integration.endpoint_url)
            .json(&PingPayload::for_integration(integration.id))
            .send()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        let outcome = ProbeOutcome {
            status_code: response.status().as_u16(),
            latency_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            integration_id = %integration.id,
            kind = ?integration.kind,
            status = outcome.status_code,
            latency_ms = outcome.latency_ms,
            "integration pinged"
        );
        Ok(outcome)
    }
}

/// MockIntegrationProbe
///
/// Answers every ping with a fixed status, or fails like an unreachable host.
/// Records the ids it was asked to ping.
#[derive(Default)]
pub struct MockIntegrationProbe {
    status_code: u16,
    unreachable: bool,
    pinged: Mutex<Vec<Uuid>>,
}

impl MockIntegrationProbe {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn pinged(&self) -> Vec<Uuid> {
        self.pinged
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl IntegrationProbe for MockIntegrationProbe {
    async fn ping(&self, integration: &Integration) -> Result<ProbeOutcome, ProbeError> {
        if let Ok(mut ids) = self.pinged.lock() {
            ids.push(integration.id);
        }
        if self.unreachable {
            return Err(ProbeError::Transport("connection refused".to_string()));
        }
        Ok(ProbeOutcome {
            status_code: self.status_code,
            latency_ms: 1,
        })
    }
}

pub type ProbeState = Arc<dyn IntegrationProbe>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_2xx_counts_as_success() {
        let ok = ProbeOutcome {
            status_code: 204,
            latency_ms: 3,
        };
        let rejected = ProbeOutcome {
            status_code: 410,
            latency_ms: 3,
        };
        assert!(ok.success());
        assert!(!rejected.success());
    }

    #[test]
    fn ping_payload_shape() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(PingPayload::for_integration(id)).unwrap();
        assert_eq!(json["event"], "ping");
        assert_eq!(json["integration_id"], id.to_string());
        assert!(json["sent_at"].is_string());
    }
}
