// Health-status bands for vital signs
use serde::Serialize;
use thiserror::Error;

pub const TEMPERATURE_LOW_C: f64 = 37.5;
pub const TEMPERATURE_HIGH_C: f64 = 39.2;
pub const HEART_RATE_LOW_BPM: f64 = 70.0;
pub const HEART_RATE_HIGH_BPM: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VitalStatus {
    pub label: &'static str,
    pub severity: Severity,
}

impl VitalStatus {
    fn new(label: &'static str, severity: Severity) -> Self {
        Self { label, severity }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ClassifyError {
    #[error("{sign} value {value} is not a finite number")]
    NonFinite { sign: &'static str, value: f64 },
}

/// Classify a body temperature in °C. `[37.5, 39.2]` is normal.
pub fn classify_temperature(value: f64) -> Result<VitalStatus, ClassifyError> {
    classify(
        "temperature",
        value,
        (TEMPERATURE_LOW_C, TEMPERATURE_HIGH_C),
        ("Hypothermia", "Fever"),
    )
}

/// Classify a heart rate in beats/min. `[70, 120]` is normal.
pub fn classify_heart_rate(value: f64) -> Result<VitalStatus, ClassifyError> {
    classify(
        "heart rate",
        value,
        (HEART_RATE_LOW_BPM, HEART_RATE_HIGH_BPM),
        ("Bradycardia", "Tachycardia"),
    )
}

fn classify(
    sign: &'static str,
    value: f64,
    (low, high): (f64, f64),
    (low_label, high_label): (&'static str, &'static str),
) -> Result<VitalStatus, ClassifyError> {
    if !value.is_finite() {
        return Err(ClassifyError::NonFinite { sign, value });
    }

    let status = if value < low {
        VitalStatus::new(low_label, Severity::Low)
    } else if value > high {
        VitalStatus::new(high_label, Severity::High)
    } else {
        VitalStatus::new("Normal", Severity::Normal)
    };

    Ok(status)
}
