// HTTP implementation of the telemetry source
use crate::application::telemetry_source::{FetchError, FetchResult, TelemetrySource};
use crate::domain::snapshot::Endpoint;
use crate::domain::telemetry::{Anomaly, DeviceStatus, TelemetryReading};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const LATEST_PATH: &str = "/api/iot/data/latest";
const HISTORY_PATH: &str = "/api/iot/data";
const ANOMALIES_PATH: &str = "/api/iot/anomalies";
const STATUS_PATH: &str = "/api/iot/status";

#[derive(Debug, Clone)]
pub struct HttpTelemetrySource {
    base_url: String,
    client: reqwest::Client,
}

/// Response bodies share a `success` flag; the payload key differs per endpoint.
trait Envelope: DeserializeOwned {
    type Payload;

    fn success(&self) -> bool;
    fn into_payload(self) -> Option<Self::Payload>;
}

#[derive(Debug, Deserialize)]
struct ReadingResponse {
    success: bool,
    data: Option<TelemetryReading>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    success: bool,
    data: Option<Vec<TelemetryReading>>,
}

#[derive(Debug, Deserialize)]
struct AnomaliesResponse {
    success: bool,
    anomalies: Option<Vec<Anomaly>>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    success: bool,
    device_status: Option<DeviceStatus>,
}

macro_rules! envelope {
    ($response:ty, $field:ident, $payload:ty) => {
        impl Envelope for $response {
            type Payload = $payload;

            fn success(&self) -> bool {
                self.success
            }

            fn into_payload(self) -> Option<Self::Payload> {
                self.$field
            }
        }
    };
}

envelope!(ReadingResponse, data, TelemetryReading);
envelope!(HistoryResponse, data, Vec<TelemetryReading>);
envelope!(AnomaliesResponse, anomalies, Vec<Anomaly>);
envelope!(StatusResponse, device_status, DeviceStatus);

impl HttpTelemetrySource {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<E: Envelope>(&self, endpoint: Endpoint, path: &str) -> FetchResult<E::Payload> {
        let url = self.url(path);
        tracing::debug!(%endpoint, %url, "Fetching telemetry");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::network(endpoint, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::protocol(
                endpoint,
                format!("unexpected status {}", status),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(endpoint, e.to_string()))?;

        let envelope: E = serde_json::from_slice(&body)
            .map_err(|e| FetchError::protocol(endpoint, format!("malformed body: {}", e)))?;

        if !envelope.success() {
            return Err(FetchError::protocol(endpoint, "server reported success: false"));
        }

        envelope
            .into_payload()
            .ok_or_else(|| FetchError::protocol(endpoint, "response has no payload"))
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    async fn fetch_latest(&self) -> FetchResult<TelemetryReading> {
        self.get::<ReadingResponse>(Endpoint::Latest, LATEST_PATH).await
    }

    async fn fetch_history(&self) -> FetchResult<Vec<TelemetryReading>> {
        self.get::<HistoryResponse>(Endpoint::History, HISTORY_PATH).await
    }

    async fn fetch_anomalies(&self) -> FetchResult<Vec<Anomaly>> {
        self.get::<AnomaliesResponse>(Endpoint::Anomalies, ANOMALIES_PATH)
            .await
    }

    async fn fetch_device_status(&self) -> FetchResult<DeviceStatus> {
        self.get::<StatusResponse>(Endpoint::DeviceStatus, STATUS_PATH)
            .await
    }
}
