// Holder for the last known device status
use crate::domain::telemetry::DeviceStatus;

/// Keeps the most recently fetched [`DeviceStatus`], no history.
#[derive(Debug, Clone, Default)]
pub struct DeviceStatusTracker {
    current: Option<DeviceStatus>,
}

impl DeviceStatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held status wholesale
    pub fn update(&mut self, status: DeviceStatus) {
        if let Some(previous) = &self.current {
            if previous.online != status.online {
                tracing::info!(
                    device_id = %status.device_id,
                    online = status.online,
                    "Device connectivity changed"
                );
            }
        }
        self.current = Some(status);
    }

    /// `None` until the first successful fetch
    pub fn current(&self) -> Option<&DeviceStatus> {
        self.current.as_ref()
    }
}
