use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::model::DashboardSnapshot;
use crate::notify::{NotificationRecord, NotificationStore};
use crate::poller::FeedState;
use crate::threshold::CrossingDetector;

/// Owns the alert state of one running client. Created at startup, dropped
/// at teardown; everything that needs notifications borrows it from here.
#[derive(Debug)]
pub struct Session {
    notifications: NotificationStore,
    detector: CrossingDetector,
    last_seen: Option<Arc<DashboardSnapshot>>,
    last_error: Option<String>,
}

impl Session {
    pub fn new(critical_percent: f64) -> Self {
        Self {
            notifications: NotificationStore::new(),
            detector: CrossingDetector::new(critical_percent),
            last_seen: None,
            last_error: None,
        }
    }

    pub fn notifications(&self) -> &NotificationStore {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationStore {
        &mut self.notifications
    }

    pub fn detector(&self) -> &CrossingDetector {
        &self.detector
    }

    /// Run the detector over `snapshot`, recording one alert per crossing.
    /// Returns copies of the new records, oldest first.
    pub fn ingest(&mut self, snapshot: &DashboardSnapshot) -> Vec<NotificationRecord> {
        self.detector
            .observe_snapshot(snapshot)
            .into_iter()
            .map(|c| {
                self.notifications
                    .record_alert(c.category, c.fill_percent)
                    .clone()
            })
            .collect()
    }

    /// Ingest the feed's snapshot unless it is the one already seen.
    pub fn observe_feed(&mut self, state: &FeedState) -> Vec<NotificationRecord> {
        if state.error != self.last_error {
            match &state.error {
                Some(err) => warn!(error = %err, "dashboard data is stale"),
                None if self.last_error.is_some() => info!("dashboard data recovered"),
                None => {}
            }
            self.last_error = state.error.clone();
        }

        let Some(snapshot) = &state.snapshot else {
            return Vec::new();
        };
        if self
            .last_seen
            .as_ref()
            .is_some_and(|seen| Arc::ptr_eq(seen, snapshot))
        {
            return Vec::new();
        }
        self.last_seen = Some(Arc::clone(snapshot));
        self.ingest(snapshot)
    }

    /// Follow a poller feed until it closes or `shutdown` resolves.
    ///
    /// A `watch` feed only holds its latest value. When overlapping fetches
    /// complete back to back, the detector sees only the last of them, so a
    /// dip below the critical level between two critical readings can go
    /// unobserved and the latch stays set. This is the same completion-order
    /// race [`crate::poller`] documents for the snapshot itself.
    #[instrument(skip_all)]
    pub async fn run<F>(&mut self, mut feed: watch::Receiver<FeedState>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let state = feed.borrow_and_update().clone();
            for record in self.observe_feed(&state) {
                warn!(
                    id = %record.id(),
                    category = %record.category(),
                    fill = record.fill_percent_at_trigger(),
                    unread = self.notifications.unread_count(),
                    "bin reached critical fill level"
                );
            }
            tokio::select! {
                _ = &mut shutdown => break,
                changed = feed.changed() => {
                    if changed.is_err() {
                        info!("feed closed");
                        break;
                    }
                }
            }
        }
    }
}
