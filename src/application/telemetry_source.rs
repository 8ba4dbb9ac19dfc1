// Source trait for remote telemetry access
use crate::domain::snapshot::Endpoint;
use crate::domain::telemetry::{Anomaly, DeviceStatus, TelemetryReading};
use async_trait::async_trait;
use thiserror::Error;

/// Why a fetch from the remote API produced nothing usable.
///
/// Both variants mean the same thing to the poller: the endpoint failed
/// for this cycle.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("{endpoint}: network failure: {message}")]
    Network { endpoint: Endpoint, message: String },

    #[error("{endpoint}: protocol failure: {message}")]
    Protocol { endpoint: Endpoint, message: String },
}

impl FetchError {
    pub fn network(endpoint: Endpoint, message: impl Into<String>) -> Self {
        Self::Network {
            endpoint,
            message: message.into(),
        }
    }

    pub fn protocol(endpoint: Endpoint, message: impl Into<String>) -> Self {
        Self::Protocol {
            endpoint,
            message: message.into(),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Network { endpoint, .. } | Self::Protocol { endpoint, .. } => *endpoint,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Most recent reading
    async fn fetch_latest(&self) -> FetchResult<TelemetryReading>;

    /// Recent readings in ascending time order
    async fn fetch_history(&self) -> FetchResult<Vec<TelemetryReading>>;

    /// Anomalies as listed by the server, oldest first
    async fn fetch_anomalies(&self) -> FetchResult<Vec<Anomaly>>;

    async fn fetch_device_status(&self) -> FetchResult<DeviceStatus>;
}
