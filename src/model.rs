use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum BinCategory {
    Wet,
    Reject,
    Recyclable,
    Hazardous,
}

impl BinCategory {
    /// Canonical order; snapshots keep their bins in this order.
    pub const ALL: [BinCategory; 4] = [
        BinCategory::Wet,
        BinCategory::Reject,
        BinCategory::Recyclable,
        BinCategory::Hazardous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BinCategory::Wet => "wet",
            BinCategory::Reject => "reject",
            BinCategory::Recyclable => "recyclable",
            BinCategory::Hazardous => "hazardous",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BinCategory::Wet => "Wet Waste",
            BinCategory::Reject => "Reject Waste",
            BinCategory::Recyclable => "Recyclable",
            BinCategory::Hazardous => "Hazardous",
        }
    }
}

impl fmt::Display for BinCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown bin category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for BinCategory {
    type Err = UnknownCategory;

    /// Accepts the backend's aliases: `recycle` and `dry`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wet" => Ok(BinCategory::Wet),
            "reject" | "dry" => Ok(BinCategory::Reject),
            "recyclable" | "recycle" => Ok(BinCategory::Recyclable),
            "hazardous" => Ok(BinCategory::Hazardous),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// One bin's observed state at a point in time.
///
/// Fields are private so every instance goes through [`BinSnapshot::new`],
/// which clamps the fill level to `[0, 100]` and the counters to `>= 0`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BinSnapshot {
    category: BinCategory,
    display_name: String,
    fill_level_percent: f64,
    total_capacity: f64,
    today_count: f64,
    yesterday_count: f64,
}

impl BinSnapshot {
    pub fn new(
        category: BinCategory,
        display_name: impl Into<String>,
        fill_level_percent: f64,
        total_capacity: f64,
        today_count: f64,
        yesterday_count: f64,
    ) -> Self {
        let display_name = display_name.into();
        let display_name = if display_name.trim().is_empty() {
            category.display_name().to_string()
        } else {
            display_name
        };
        Self {
            category,
            display_name,
            fill_level_percent: finite_or_zero(fill_level_percent).clamp(0.0, 100.0),
            total_capacity: non_negative(total_capacity),
            today_count: non_negative(today_count),
            yesterday_count: non_negative(yesterday_count),
        }
    }

    /// Placeholder for a category the backend said nothing about.
    pub fn empty(category: BinCategory) -> Self {
        Self::new(category, category.display_name(), 0.0, 0.0, 0.0, 0.0)
    }

    pub fn category(&self) -> BinCategory {
        self.category
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn fill_level_percent(&self) -> f64 {
        self.fill_level_percent
    }

    pub fn total_capacity(&self) -> f64 {
        self.total_capacity
    }

    pub fn today_count(&self) -> f64 {
        self.today_count
    }

    pub fn yesterday_count(&self) -> f64 {
        self.yesterday_count
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn non_negative(v: f64) -> f64 {
    finite_or_zero(v).max(0.0)
}

/// Aggregate fetched from the dashboard resource. Always holds exactly one
/// bin per category, in [`BinCategory::ALL`] order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardSnapshot {
    bins: Vec<BinSnapshot>,
    total: f64,
    fetched_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// Builds a snapshot from any collection of bins. The first entry per
    /// category wins; absent categories get [`BinSnapshot::empty`]. When
    /// `total` is `None` it is the sum of today counts.
    pub fn from_bins(
        bins: impl IntoIterator<Item = BinSnapshot>,
        total: Option<f64>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let mut slots: [Option<BinSnapshot>; 4] = [None, None, None, None];
        for bin in bins {
            let slot = &mut slots[slot_index(bin.category)];
            if slot.is_none() {
                *slot = Some(bin);
            }
        }
        let bins: Vec<BinSnapshot> = BinCategory::ALL
            .iter()
            .zip(slots)
            .map(|(cat, slot)| slot.unwrap_or_else(|| BinSnapshot::empty(*cat)))
            .collect();
        let total = match total {
            Some(t) => non_negative(t),
            None => bins.iter().map(BinSnapshot::today_count).sum(),
        };
        Self {
            bins,
            total,
            fetched_at,
        }
    }

    /// Built-in snapshot shown when the backend has never answered.
    pub fn fallback() -> Self {
        let bins = [
            (BinCategory::Wet, 65.0, 100.0, 45.0, 38.0),
            (BinCategory::Reject, 42.0, 100.0, 28.0, 31.0),
            (BinCategory::Recyclable, 78.0, 100.0, 52.0, 47.0),
            (BinCategory::Hazardous, 23.0, 50.0, 8.0, 12.0),
        ]
        .into_iter()
        .map(|(cat, fill, cap, today, yesterday)| {
            BinSnapshot::new(cat, cat.display_name(), fill, cap, today, yesterday)
        });
        Self::from_bins(bins, None, DateTime::<Utc>::default())
    }

    pub fn bins(&self) -> &[BinSnapshot] {
        &self.bins
    }

    pub fn bin(&self, category: BinCategory) -> &BinSnapshot {
        &self.bins[slot_index(category)]
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Sum of rounded today counts, the dashboard's "Total Items" figure.
    pub fn total_items_today(&self) -> u64 {
        self.bins
            .iter()
            .map(|b| b.today_count().round() as u64)
            .sum()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

fn slot_index(category: BinCategory) -> usize {
    match category {
        BinCategory::Wet => 0,
        BinCategory::Reject => 1,
        BinCategory::Recyclable => 2,
        BinCategory::Hazardous => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_aliases() {
        assert_eq!("recycle".parse::<BinCategory>().unwrap(), BinCategory::Recyclable);
        assert_eq!("dry".parse::<BinCategory>().unwrap(), BinCategory::Reject);
        assert_eq!(" Hazardous ".parse::<BinCategory>().unwrap(), BinCategory::Hazardous);
        assert!("plastic".parse::<BinCategory>().is_err());
    }

    #[test]
    fn bin_snapshot_clamps_values() {
        let bin = BinSnapshot::new(BinCategory::Wet, "", 130.0, -5.0, f64::NAN, 3.0);
        assert_eq!(bin.fill_level_percent(), 100.0);
        assert_eq!(bin.total_capacity(), 0.0);
        assert_eq!(bin.today_count(), 0.0);
        assert_eq!(bin.yesterday_count(), 3.0);
        assert_eq!(bin.display_name(), "Wet Waste");

        let bin = BinSnapshot::new(BinCategory::Reject, "R", -1.0, 0.0, 0.0, 0.0);
        assert_eq!(bin.fill_level_percent(), 0.0);
    }

    #[test]
    fn from_bins_keeps_first_and_fills_gaps() {
        let bins = vec![
            BinSnapshot::new(BinCategory::Hazardous, "H", 91.0, 50.0, 4.0, 2.0),
            BinSnapshot::new(BinCategory::Wet, "W", 10.0, 100.0, 6.0, 1.0),
            BinSnapshot::new(BinCategory::Hazardous, "H2", 12.0, 50.0, 1.0, 1.0),
        ];
        let snap = DashboardSnapshot::from_bins(bins, None, Utc::now());
        let cats: Vec<_> = snap.bins().iter().map(|b| b.category()).collect();
        assert_eq!(cats, BinCategory::ALL.to_vec());
        assert_eq!(snap.bin(BinCategory::Hazardous).display_name(), "H");
        assert_eq!(snap.bin(BinCategory::Reject).fill_level_percent(), 0.0);
        assert_eq!(snap.total(), 10.0);
    }

    #[test]
    fn fallback_has_preset_values() {
        let snap = DashboardSnapshot::fallback();
        assert_eq!(snap.bins().len(), 4);
        assert_eq!(snap.bin(BinCategory::Wet).fill_level_percent(), 65.0);
        assert_eq!(snap.bin(BinCategory::Recyclable).today_count(), 52.0);
        assert_eq!(snap.bin(BinCategory::Hazardous).total_capacity(), 50.0);
        assert_eq!(snap.total_items_today(), 45 + 28 + 52 + 8);
    }
}
