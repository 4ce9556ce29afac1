use std::collections::HashMap;

use crate::model::{BinCategory, DashboardSnapshot};

pub const DEFAULT_CRITICAL_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatchState {
    #[default]
    Below,
    Notified,
}

/// A level that just went critical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub category: BinCategory,
    pub fill_percent: f64,
}

/// Per-bin one-shot latch: fires once when a bin reaches the critical level,
/// then stays quiet until the bin drops back below it.
#[derive(Debug, Clone)]
pub struct CrossingDetector {
    critical_percent: f64,
    latches: HashMap<BinCategory, LatchState>,
}

impl Default for CrossingDetector {
    fn default() -> Self {
        Self::new(DEFAULT_CRITICAL_PERCENT)
    }
}

impl CrossingDetector {
    pub fn new(critical_percent: f64) -> Self {
        Self {
            critical_percent,
            latches: HashMap::new(),
        }
    }

    pub fn critical_percent(&self) -> f64 {
        self.critical_percent
    }

    pub fn state(&self, category: BinCategory) -> LatchState {
        self.latches.get(&category).copied().unwrap_or_default()
    }

    pub fn observe(&mut self, category: BinCategory, fill_percent: f64) -> Option<Crossing> {
        let critical = fill_percent >= self.critical_percent;
        let latch = self.latches.entry(category).or_default();
        match (*latch, critical) {
            (LatchState::Below, true) => {
                *latch = LatchState::Notified;
                Some(Crossing {
                    category,
                    fill_percent,
                })
            }
            (LatchState::Notified, false) => {
                *latch = LatchState::Below;
                None
            }
            _ => None,
        }
    }

    pub fn observe_snapshot(&mut self, snapshot: &DashboardSnapshot) -> Vec<Crossing> {
        snapshot
            .bins()
            .iter()
            .filter_map(|bin| self.observe(bin.category(), bin.fill_level_percent()))
            .collect()
    }
}
