// Telemetry poller - Keeps the monitor state in sync with the remote API
use crate::application::device_tracker::DeviceStatusTracker;
use crate::application::telemetry_source::{FetchError, FetchResult, TelemetrySource};
use crate::domain::bounded::BoundedSequence;
use crate::domain::snapshot::{FetchFailure, Snapshot, Staleness};
use crate::domain::telemetry::{Anomaly, DeviceStatus, TelemetryReading};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;
pub const DEFAULT_ANOMALY_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Period between fetch cycles
    pub interval: Duration,
    pub history_capacity: usize,
    pub anomaly_capacity: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            anomaly_capacity: DEFAULT_ANOMALY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollerPhase {
    Bootstrapping,
    Idle,
    FetchingCycle,
    Stopped,
}

/// Owns the monitor state and refreshes it from a [`TelemetrySource`].
///
/// The poller first fills the history window from the source, runs one
/// fetch cycle, then repeats a cycle every `interval`. Each completed cycle
/// publishes a new [`Snapshot`] through the paired [`PollerHandle`].
///
/// Cycles run one at a time: a tick that comes due while a cycle is still
/// in flight is skipped rather than queued.
pub struct TelemetryPoller {
    source: Arc<dyn TelemetrySource>,
    config: PollerConfig,
    history: BoundedSequence<TelemetryReading>,
    latest: Option<TelemetryReading>,
    anomalies: BoundedSequence<Anomaly>,
    device: DeviceStatusTracker,
    stale: Staleness,
    /// Failures seen outside a cycle, reported with the next snapshot
    pending_failures: Vec<FetchFailure>,
    sequence: u64,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    phase_tx: watch::Sender<PollerPhase>,
    cancel: CancellationToken,
}

/// Read side of a running poller. Cheap to clone.
#[derive(Clone)]
pub struct PollerHandle {
    snapshots: watch::Receiver<Arc<Snapshot>>,
    phase: watch::Receiver<PollerPhase>,
    cancel: CancellationToken,
}

impl PollerHandle {
    /// The most recently published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified once a snapshot newer than the current one is published
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        let mut rx = self.snapshots.clone();
        rx.mark_unchanged();
        rx
    }

    /// Stream of the current snapshot followed by each published one.
    /// A slow consumer skips straight to the newest.
    pub fn updates(&self) -> WatchStream<Arc<Snapshot>> {
        WatchStream::new(self.snapshots.clone())
    }

    pub fn phase(&self) -> PollerPhase {
        *self.phase.borrow()
    }

    /// Cancel the schedule. Results of a cycle still in flight are dropped.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl TelemetryPoller {
    pub fn new(source: Arc<dyn TelemetrySource>, config: PollerConfig) -> (Self, PollerHandle) {
        let initial = Snapshot::empty(config.history_capacity, config.anomaly_capacity);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(initial));
        let (phase_tx, phase_rx) = watch::channel(PollerPhase::Bootstrapping);
        let cancel = CancellationToken::new();

        let poller = Self {
            source,
            history: BoundedSequence::new(config.history_capacity),
            latest: None,
            anomalies: BoundedSequence::new(config.anomaly_capacity),
            device: DeviceStatusTracker::new(),
            stale: Staleness::default(),
            pending_failures: Vec::new(),
            sequence: 0,
            snapshot_tx,
            phase_tx,
            cancel: cancel.clone(),
            config,
        };

        let handle = PollerHandle {
            snapshots: snapshot_rx,
            phase: phase_rx,
            cancel,
        };

        (poller, handle)
    }

    /// Start the poller as a background task on the current runtime
    pub fn spawn(
        source: Arc<dyn TelemetrySource>,
        config: PollerConfig,
    ) -> (PollerHandle, JoinHandle<()>) {
        let (poller, handle) = Self::new(source, config);
        let task = tokio::spawn(poller.run());
        (handle, task)
    }

    pub async fn run(mut self) {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            history_capacity = self.config.history_capacity,
            anomaly_capacity = self.config.anomaly_capacity,
            "Starting telemetry poller"
        );

        self.bootstrap().await;
        if !self.cancel.is_cancelled() {
            self.run_cycle().await;
        }

        // interval_at panics on a zero period
        let period = self.config.interval.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let cancel = self.cancel.clone();

        while !cancel.is_cancelled() {
            self.set_phase(PollerPhase::Idle);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.run_cycle().await,
            }
        }

        self.set_phase(PollerPhase::Stopped);
        info!(cycles = self.sequence, "Telemetry poller stopped");
    }

    /// Fill the history window once. A failure leaves it empty.
    async fn bootstrap(&mut self) {
        self.set_phase(PollerPhase::Bootstrapping);

        let result = self.source.fetch_history().await;
        if self.cancel.is_cancelled() {
            return;
        }

        match result {
            Ok(readings) => {
                let received = readings.len();
                for reading in readings {
                    self.history.append(reading);
                }
                info!(
                    received,
                    retained = self.history.len(),
                    "Bootstrapped reading history"
                );
            }
            Err(e) => {
                warn!(error = %e, "Failed to bootstrap reading history, starting empty");
                self.pending_failures.push(failure_record(&e));
            }
        }
    }

    /// Fetch the three steady-state endpoints concurrently, apply whatever
    /// succeeded, and publish one snapshot.
    async fn run_cycle(&mut self) {
        self.set_phase(PollerPhase::FetchingCycle);

        let source = Arc::clone(&self.source);
        let (latest, anomalies, status) = tokio::join!(
            source.fetch_latest(),
            source.fetch_anomalies(),
            source.fetch_device_status()
        );

        if self.cancel.is_cancelled() {
            debug!("Poller stopped during fetch cycle, discarding results");
            return;
        }

        let mut failures = std::mem::take(&mut self.pending_failures);
        self.apply_latest(latest, &mut failures);
        self.apply_anomalies(anomalies, &mut failures);
        self.apply_device_status(status, &mut failures);
        self.publish(failures);
    }

    fn apply_latest(
        &mut self,
        result: FetchResult<TelemetryReading>,
        failures: &mut Vec<FetchFailure>,
    ) {
        match result {
            Ok(reading) => {
                self.latest = Some(reading.clone());
                self.history.append(reading);
                self.stale.latest = false;
            }
            Err(e) => {
                self.stale.latest = true;
                failures.push(absorb(e));
            }
        }
    }

    fn apply_anomalies(
        &mut self,
        result: FetchResult<Vec<Anomaly>>,
        failures: &mut Vec<FetchFailure>,
    ) {
        match result {
            // The server decides which anomalies are recent; mirror its tail
            Ok(list) => {
                self.anomalies.replace_with(list);
                self.stale.anomalies = false;
            }
            Err(e) => {
                self.stale.anomalies = true;
                failures.push(absorb(e));
            }
        }
    }

    fn apply_device_status(
        &mut self,
        result: FetchResult<DeviceStatus>,
        failures: &mut Vec<FetchFailure>,
    ) {
        match result {
            Ok(status) => {
                self.device.update(status);
                self.stale.device_status = false;
            }
            Err(e) => {
                self.stale.device_status = true;
                failures.push(absorb(e));
            }
        }
    }

    fn publish(&mut self, errors: Vec<FetchFailure>) {
        self.sequence += 1;

        debug!(
            sequence = self.sequence,
            history = self.history.len(),
            anomalies = self.anomalies.len(),
            failures = errors.len(),
            stale = self.stale.any(),
            "Publishing snapshot"
        );

        let snapshot = Snapshot {
            history: self.history.clone(),
            latest: self.latest.clone(),
            anomalies: self.anomalies.clone(),
            device_status: self.device.current().cloned(),
            loading: false,
            sequence: self.sequence,
            published_at: Some(Utc::now()),
            stale: self.stale,
            errors,
        };

        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }

    fn set_phase(&self, phase: PollerPhase) {
        let changed = self.phase_tx.send_if_modified(|current| {
            if *current == phase {
                return false;
            }
            *current = phase;
            true
        });

        if changed {
            debug!(phase = ?phase, "Poller phase changed");
        }
    }
}

fn absorb(error: FetchError) -> FetchFailure {
    warn!(endpoint = %error.endpoint(), error = %error, "Fetch failed, keeping last known value");
    failure_record(&error)
}

fn failure_record(error: &FetchError) -> FetchFailure {
    FetchFailure {
        endpoint: error.endpoint(),
        message: error.to_string(),
        at: Utc::now(),
    }
}
