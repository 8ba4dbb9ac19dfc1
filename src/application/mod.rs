// Application layer - Synchronization engine and its ports
pub mod device_tracker;
pub mod poller;
pub mod telemetry_source;
