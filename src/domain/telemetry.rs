// Telemetry data domain models
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::classifier::{classify_heart_rate, classify_temperature, ClassifyError, VitalStatus};

/// A single vital-sign sample reported by the collar device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    #[serde(rename(deserialize = "temperatura_celsius"))]
    pub temperature: f64,
    #[serde(rename(deserialize = "frecuencia_cardiaca_lpm"))]
    pub heart_rate: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl TelemetryReading {
    pub fn new(temperature: f64, heart_rate: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            temperature,
            heart_rate,
            timestamp,
        }
    }

    /// Classify both vital signs of this reading
    pub fn vitals(&self) -> Result<Vitals, ClassifyError> {
        Ok(Vitals {
            temperature: classify_temperature(self.temperature)?,
            heart_rate: classify_heart_rate(self.heart_rate)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vitals {
    pub temperature: VitalStatus,
    pub heart_rate: VitalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename(deserialize = "type"))]
    pub kind: String,
    pub subtype: String,
    pub value: f64,
    pub normal_range: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_id: String,
    pub online: bool,
    #[serde(deserialize_with = "deserialize_battery_level")]
    pub battery_level: u8,
    pub signal_strength: String,
}

/// Battery charge is a percentage
fn deserialize_battery_level<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let level = u8::deserialize(deserializer)?;
    if level > 100 {
        return Err(serde::de::Error::custom(format!(
            "battery_level out of range 0-100: {}",
            level
        )));
    }
    Ok(level)
}

/// Accept RFC 3339 timestamps as well as offset-less ISO 8601 ones,
/// which are taken to be UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid timestamp: {}", raw))
    })
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}
