// Domain layer - Monitor data and pure rules
pub mod bounded;
pub mod classifier;
pub mod snapshot;
pub mod telemetry;
