// Published view of the monitor state
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::bounded::BoundedSequence;
use super::telemetry::{Anomaly, DeviceStatus, TelemetryReading};

/// Remote endpoints the monitor reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Latest,
    History,
    Anomalies,
    DeviceStatus,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Latest => "latest",
            Endpoint::History => "history",
            Endpoint::Anomalies => "anomalies",
            Endpoint::DeviceStatus => "device_status",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fetch that failed while building a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchFailure {
    pub endpoint: Endpoint,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Per-field freshness. A flag is set while the last fetch for that field
/// failed; the field then still holds the last good value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Staleness {
    pub latest: bool,
    pub anomalies: bool,
    pub device_status: bool,
}

impl Staleness {
    pub fn any(&self) -> bool {
        self.latest || self.anomalies || self.device_status
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub history: BoundedSequence<TelemetryReading>,
    pub latest: Option<TelemetryReading>,
    pub anomalies: BoundedSequence<Anomaly>,
    pub device_status: Option<DeviceStatus>,
    pub loading: bool,
    /// Number of fetch cycles published so far
    pub sequence: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub stale: Staleness,
    pub errors: Vec<FetchFailure>,
}

impl Snapshot {
    /// The state before the first cycle completes
    pub fn empty(history_capacity: usize, anomaly_capacity: usize) -> Self {
        Self {
            history: BoundedSequence::new(history_capacity),
            latest: None,
            anomalies: BoundedSequence::new(anomaly_capacity),
            device_status: None,
            loading: true,
            sequence: 0,
            published_at: None,
            stale: Staleness::default(),
            errors: Vec::new(),
        }
    }
}
