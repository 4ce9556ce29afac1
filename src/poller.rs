//! Periodic refresh of the dashboard snapshot.
//!
//! [`Poller::start`] fetches once immediately and then once per period. Each
//! tick's fetch runs as its own task, so a slow backend never delays the
//! schedule; results land in a `watch` channel in completion order. Stopping
//! only cancels future ticks, in-flight fetches still report back.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ApiError, DashboardSource};
use crate::model::DashboardSnapshot;

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(10);

/// What consumers of the poller observe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    /// `None` until the first fetch completes, successfully or not.
    pub snapshot: Option<Arc<DashboardSnapshot>>,
    pub loading: bool,
    pub error: Option<String>,
    pub(crate) in_flight: usize,
}

impl FeedState {
    pub fn begin_fetch(&mut self) {
        self.in_flight += 1;
        self.loading = true;
    }

    /// Success replaces the snapshot and clears the error. Failure keeps the
    /// last good snapshot, or installs [`DashboardSnapshot::fallback`] when
    /// there is none yet.
    pub fn apply(&mut self, outcome: Result<DashboardSnapshot, ApiError>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.loading = self.in_flight > 0;
        match outcome {
            Ok(snapshot) => {
                self.snapshot = Some(Arc::new(snapshot));
                self.error = None;
            }
            Err(err) => {
                if self.snapshot.is_none() {
                    self.snapshot = Some(Arc::new(DashboardSnapshot::fallback()));
                }
                self.error = Some(err.user_message());
            }
        }
    }
}

pub struct Poller {
    source: Arc<dyn DashboardSource>,
    period: Duration,
}

impl Poller {
    /// A zero `period` is raised to one millisecond.
    pub fn new(source: Arc<dyn DashboardSource>, period: Duration) -> Self {
        Self {
            source,
            period: period.max(Duration::from_millis(1)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Must be called inside a tokio runtime.
    pub fn start(self) -> PollerHandle {
        let (tx, rx) = watch::channel(FeedState::default());
        let cancel = CancellationToken::new();
        info!(period_ms = self.period.as_millis() as u64, "starting poller");
        let task = tokio::spawn(run_schedule(
            self.source,
            self.period,
            Arc::new(tx),
            cancel.clone(),
        ));
        PollerHandle {
            state: rx,
            cancel,
            task: Some(task),
        }
    }
}

async fn run_schedule(
    source: Arc<dyn DashboardSource>,
    period: Duration,
    state: Arc<watch::Sender<FeedState>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("poller stopped");
                break;
            }
            _ = ticker.tick() => {
                state.send_modify(FeedState::begin_fetch);
                let source = Arc::clone(&source);
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let outcome = source.fetch_dashboard().await;
                    match &outcome {
                        Ok(_) => debug!("dashboard refreshed"),
                        Err(err) => warn!(%err, "dashboard fetch failed"),
                    }
                    state.send_modify(|s| s.apply(outcome));
                });
            }
        }
    }
}

/// Owner of a running schedule. Dropping the handle stops the schedule.
pub struct PollerHandle {
    state: watch::Receiver<FeedState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// The channel closes once the schedule has stopped and every in-flight
    /// fetch has reported.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    /// Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop and wait for the schedule task to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(%err, "poller task ended abnormally");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
