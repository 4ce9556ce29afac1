//! Wire shapes returned by the backend and their normalization into
//! [`DashboardSnapshot`]. Nothing outside this module sees the raw shapes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{BinCategory, BinSnapshot, DashboardSnapshot};

/// One bin record as served by `bins/` and embedded in `dashboard_data`.
/// Absent and `null` values both read as zero.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RawBin {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub fill_level: Option<f64>,
    #[serde(default)]
    pub total_capacity: Option<f64>,
    #[serde(default)]
    pub today_collection: Option<f64>,
    #[serde(default)]
    pub yesterday_collection: Option<f64>,
}

impl RawBin {
    /// `None` for a category outside the fixed set.
    pub fn into_snapshot(self) -> Option<BinSnapshot> {
        match self.kind.parse::<BinCategory>() {
            Ok(category) => Some(BinSnapshot::new(
                category,
                self.label.unwrap_or_default(),
                self.fill_level.unwrap_or(0.0),
                self.total_capacity.unwrap_or(0.0),
                self.today_collection.unwrap_or(0.0),
                self.yesterday_collection.unwrap_or(0.0),
            )),
            Err(err) => {
                warn!(%err, "skipping bin with unknown category");
                None
            }
        }
    }
}

/// Body of `GET dashboard_data`. Either `bins` is populated, or only the
/// scalar counters are.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct DashboardPayload {
    #[serde(default)]
    pub bins: Option<Vec<RawBin>>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub wet: Option<f64>,
    #[serde(default)]
    pub reject: Option<f64>,
    /// Older backends report the reject bin as `dry`; `reject` wins when both
    /// are present.
    #[serde(default)]
    pub dry: Option<f64>,
    #[serde(default)]
    pub recycle: Option<f64>,
    #[serde(default)]
    pub hazardous: Option<f64>,
}

/// Scalar counters of the aggregate-only dashboard shape.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregateCounts {
    pub wet: Option<f64>,
    pub reject: Option<f64>,
    pub recycle: Option<f64>,
    pub hazardous: Option<f64>,
}

/// `Detailed` only ever holds bins of a known category, and at least one.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardShape {
    Detailed(Vec<BinSnapshot>),
    Aggregate(AggregateCounts),
}

impl DashboardPayload {
    /// A bins list with nothing usable in it falls back to the counters.
    pub fn shape(self) -> (DashboardShape, Option<f64>) {
        let bins: Vec<BinSnapshot> = self
            .bins
            .unwrap_or_default()
            .into_iter()
            .filter_map(RawBin::into_snapshot)
            .collect();
        let shape = if bins.is_empty() {
            DashboardShape::Aggregate(AggregateCounts {
                wet: self.wet,
                reject: self.reject.or(self.dry),
                recycle: self.recycle,
                hazardous: self.hazardous,
            })
        } else {
            DashboardShape::Detailed(bins)
        };
        (shape, self.total)
    }

    pub fn normalize(self, fetched_at: DateTime<Utc>) -> DashboardSnapshot {
        let (shape, total) = self.shape();
        shape.normalize(total, fetched_at)
    }
}

impl DashboardShape {
    pub fn normalize(self, total: Option<f64>, fetched_at: DateTime<Utc>) -> DashboardSnapshot {
        match self {
            DashboardShape::Detailed(bins) => {
                for (i, bin) in bins.iter().enumerate() {
                    if bins[..i].iter().any(|b| b.category() == bin.category()) {
                        warn!(category = %bin.category(), "duplicate bin in response; keeping first");
                    }
                }
                DashboardSnapshot::from_bins(bins, total, fetched_at)
            }
            DashboardShape::Aggregate(counts) => {
                let bins = [
                    (BinCategory::Wet, counts.wet),
                    (BinCategory::Reject, counts.reject),
                    (BinCategory::Recyclable, counts.recycle),
                    (BinCategory::Hazardous, counts.hazardous),
                ]
                .into_iter()
                .map(|(cat, today)| {
                    BinSnapshot::new(cat, cat.display_name(), 0.0, 0.0, today.unwrap_or(0.0), 0.0)
                });
                DashboardSnapshot::from_bins(bins, total, fetched_at)
            }
        }
    }
}

/// Row of `GET history/`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CollectionHistory {
    pub id: i64,
    pub bin_type: String,
    pub date: String,
    pub total_collected: f64,
    pub classification_count: i64,
}

/// Body of `PATCH bins/<type>/`. Unset fields are left alone by the backend.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct BinUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today_collection: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yesterday_collection: Option<f64>,
}

/// One image classification made by a bin's camera.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Classification {
    pub id: i64,
    #[serde(default)]
    pub image: Option<String>,
    pub waste_type: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub esp32_device_id: Option<String>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Filters for `GET classifications/`; unset filters are not sent.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl ClassificationQuery {
    pub fn is_empty(&self) -> bool {
        self.waste_type.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }
}

/// Row of `GET waste_logs`, one per sorted item.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct WasteLog {
    pub waste_type: String,
    pub bin_type: String,
    #[serde(default)]
    pub recyclable: Option<bool>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Body of `POST auth/register/`.
#[derive(Serialize, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub message: String,
    pub user: User,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub authenticated: bool,
    pub user: Option<User>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct MessageResponse {
    pub message: String,
}

/// Error body; the backend uses either key.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub detail: Option<String>,
}
