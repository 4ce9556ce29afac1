#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use binwatch::api::{ApiError, DashboardSource};
use binwatch::model::{BinCategory, BinSnapshot, DashboardSnapshot};
use chrono::Utc;
use reqwest::StatusCode;
use tokio::sync::Mutex;

/// Source that replays queued outcomes, then keeps returning `fallthrough`.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    responses: Arc<Mutex<VecDeque<Result<DashboardSnapshot, ApiError>>>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn with_responses(responses: Vec<Result<DashboardSnapshot, ApiError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Default::default()
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DashboardSource for ScriptedSource {
    async fn fetch_dashboard(&self) -> Result<DashboardSnapshot, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().await.pop_front();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next.unwrap_or_else(|| Ok(wet_at(10.0)))
    }
}

pub fn wet_at(level: f64) -> DashboardSnapshot {
    DashboardSnapshot::from_bins(
        [BinSnapshot::new(BinCategory::Wet, "Wet Waste", level, 100.0, 3.0, 2.0)],
        None,
        Utc::now(),
    )
}

pub fn server_error(message: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::SERVICE_UNAVAILABLE,
        message: message.to_string(),
    }
}
