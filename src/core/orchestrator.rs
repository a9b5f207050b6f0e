use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::error::ScanError;
use crate::core::model::{parse_scan_response, ScanReport, ScanRequest};
use crate::http::{ApiRequest, Gateway, SCAN_PATH};
use crate::SinkRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Scanning,
    Reported,
    Failed,
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanPhase::Idle => write!(f, "Idle"),
            ScanPhase::Scanning => write!(f, "Scanning"),
            ScanPhase::Reported => write!(f, "Reported"),
            ScanPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Terminal result of one scan attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Success(Arc<ScanReport>),
    Failure(ScanError),
}

/// Lifecycle state with its outcome attached.
///
/// The outcome lives inside the variant, so `Scanning` can never be seen with a
/// result and `Reported`/`Failed` can never be seen without one.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    Idle,
    Scanning,
    Reported(Arc<ScanReport>),
    Failed(ScanError),
}

impl ScanState {
    pub fn phase(&self) -> ScanPhase {
        match self {
            ScanState::Idle => ScanPhase::Idle,
            ScanState::Scanning => ScanPhase::Scanning,
            ScanState::Reported(_) => ScanPhase::Reported,
            ScanState::Failed(_) => ScanPhase::Failed,
        }
    }

    pub fn outcome(&self) -> Option<ScanOutcome> {
        match self {
            ScanState::Idle | ScanState::Scanning => None,
            ScanState::Reported(report) => Some(ScanOutcome::Success(Arc::clone(report))),
            ScanState::Failed(err) => Some(ScanOutcome::Failure(err.clone())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("A target URL is required.")]
    EmptyTarget,
    #[error("A scan is already running.")]
    Busy,
}

/// Handle for the scan started by [`ScanOrchestrator::submit`].
///
/// Carries the generation it was issued under; resolving it after a reset or
/// a newer submission is a no-op.
#[derive(Debug)]
pub struct ScanTicket {
    generation: u64,
    request: Result<ScanRequest, ScanError>,
}

impl ScanTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct Inner {
    state: ScanState,
    generation: u64,
}

/// Owns the single `(state, outcome)` pair and drives it through
/// `Idle → Scanning → Reported | Failed → Idle`.
///
/// Sinks are called in transition order and must not call back into the
/// orchestrator from `on_state`.
pub struct ScanOrchestrator<G: Gateway> {
    gateway: G,
    inner: Mutex<Inner>,
    sinks: Mutex<Vec<SinkRef>>,
    /// Held from a state change until its notification is delivered.
    delivery: Mutex<()>,
}

impl<G: Gateway> ScanOrchestrator<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            inner: Mutex::new(Inner {
                state: ScanState::Idle,
                generation: 0,
            }),
            sinks: Mutex::new(Vec::new()),
            delivery: Mutex::new(()),
        }
    }

    /// Registers a sink notified after every transition.
    pub fn subscribe(&self, sink: SinkRef) {
        lock(&self.sinks).push(sink);
    }

    pub fn state(&self) -> ScanState {
        lock(&self.inner).state.clone()
    }

    pub fn phase(&self) -> ScanPhase {
        lock(&self.inner).state.phase()
    }

    /// Moves to `Scanning` immediately and returns the ticket to [`run`](Self::run).
    ///
    /// A target that is not an absolute URL still starts the scan; the ticket
    /// then resolves to `RequestInvalid` without touching the network.
    pub fn submit(
        &self,
        target_url: &str,
        options: Map<String, Value>,
    ) -> Result<ScanTicket, SubmitRejected> {
        if target_url.trim().is_empty() {
            return Err(SubmitRejected::EmptyTarget);
        }

        let _delivery = lock(&self.delivery);
        let (ticket, snapshot) = {
            let mut inner = lock(&self.inner);
            if inner.state.phase() == ScanPhase::Scanning {
                warn!("Scan for {} ignored: another scan is in flight", target_url);
                return Err(SubmitRejected::Busy);
            }
            inner.generation += 1;
            inner.state = ScanState::Scanning;

            let ticket = ScanTicket {
                generation: inner.generation,
                request: ScanRequest::new(target_url, options),
            };
            (ticket, inner.state.clone())
        };

        info!("Scan #{} started for {}", ticket.generation, target_url.trim());
        self.notify(&snapshot);
        Ok(ticket)
    }

    /// Awaits the gateway for `ticket` and records the outcome if the ticket
    /// is still current. Returns the state observed afterwards.
    pub async fn run(&self, ticket: ScanTicket) -> ScanState {
        let ScanTicket { generation, request } = ticket;

        let outcome = match request {
            Ok(request) => self
                .gateway
                .send(ApiRequest::post(SCAN_PATH, request.to_body()))
                .await
                .and_then(parse_scan_response),
            Err(e) => Err(e),
        };

        self.resolve(generation, outcome);
        self.state()
    }

    /// `submit` followed by `run`.
    pub async fn scan(
        &self,
        target_url: &str,
        options: Map<String, Value>,
    ) -> Result<ScanState, SubmitRejected> {
        let ticket = self.submit(target_url, options)?;
        Ok(self.run(ticket).await)
    }

    /// Back to `Idle` from anywhere. Any scan still in flight is abandoned,
    /// not aborted; its response will be dropped.
    pub fn reset(&self) {
        let _delivery = lock(&self.delivery);
        let snapshot = {
            let mut inner = lock(&self.inner);
            inner.generation += 1;
            inner.state = ScanState::Idle;
            inner.state.clone()
        };
        debug!("Orchestrator reset");
        self.notify(&snapshot);
    }

    fn resolve(&self, generation: u64, outcome: Result<ScanReport, ScanError>) -> bool {
        let _delivery = lock(&self.delivery);
        let snapshot = {
            let mut inner = lock(&self.inner);
            if inner.generation != generation || inner.state.phase() != ScanPhase::Scanning {
                debug!(
                    "Dropping stale response for scan #{} (current #{}, {})",
                    generation,
                    inner.generation,
                    inner.state.phase()
                );
                return false;
            }

            inner.state = match outcome {
                Ok(report) => {
                    info!(
                        "Scan #{} reported {} finding(s)",
                        generation,
                        report.vulnerabilities.len()
                    );
                    ScanState::Reported(Arc::new(report))
                }
                Err(err) => {
                    warn!("Scan #{} failed: {}", generation, err);
                    ScanState::Failed(err)
                }
            };
            inner.state.clone()
        };

        self.notify(&snapshot);
        true
    }

    fn notify(&self, snapshot: &ScanState) {
        let sinks = lock(&self.sinks).clone();
        for sink in sinks {
            sink.on_state(snapshot);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
