//! Session-scoped store of fill-level alerts.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::BinCategory;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationRecord {
    id: NotificationId,
    category: BinCategory,
    fill_percent_at_trigger: f64,
    created_at: DateTime<Utc>,
    is_read: bool,
}

impl NotificationRecord {
    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub fn category(&self) -> BinCategory {
        self.category
    }

    pub fn fill_percent_at_trigger(&self) -> f64 {
        self.fill_percent_at_trigger
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }
}

/// Newest record is always first. Nothing is deduplicated here; callers that
/// need one alert per episode use [`crate::threshold::CrossingDetector`].
#[derive(Debug, Default)]
pub struct NotificationStore {
    records: VecDeque<NotificationRecord>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_alert(
        &mut self,
        category: BinCategory,
        fill_percent_at_trigger: f64,
    ) -> &NotificationRecord {
        self.records.push_front(NotificationRecord {
            id: NotificationId::new(),
            category,
            fill_percent_at_trigger,
            created_at: Utc::now(),
            is_read: false,
        });
        &self.records[0]
    }

    /// Returns `false` when no record has this id.
    pub fn mark_read(&mut self, id: NotificationId) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.is_read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for record in &mut self.records {
            record.is_read = true;
        }
    }

    pub fn clear_all(&mut self) {
        self.records.clear();
    }

    pub fn unread_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_read).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: NotificationId) -> Option<&NotificationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_unread(store: &NotificationStore) {
        let expected = store.iter().filter(|r| !r.is_read()).count();
        assert_eq!(store.unread_count(), expected);
    }

    #[test]
    fn newest_alert_comes_first() {
        let mut store = NotificationStore::new();
        let a = store.record_alert(BinCategory::Wet, 81.0).id();
        let b = store.record_alert(BinCategory::Reject, 90.0).id();
        let ids: Vec<_> = store.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn same_category_twice_gives_two_records() {
        let mut store = NotificationStore::new();
        let a = store.record_alert(BinCategory::Wet, 81.0).id();
        let b = store.record_alert(BinCategory::Wet, 81.0).id();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.unread_count(), 2);
    }

    #[test]
    fn unread_count_tracks_every_mutation() {
        let mut store = NotificationStore::new();
        check_unread(&store);
        let a = store.record_alert(BinCategory::Wet, 80.0).id();
        check_unread(&store);
        let b = store.record_alert(BinCategory::Hazardous, 95.0).id();
        store.record_alert(BinCategory::Recyclable, 88.0);
        check_unread(&store);
        assert_eq!(store.unread_count(), 3);

        assert!(store.mark_read(a));
        check_unread(&store);
        assert_eq!(store.unread_count(), 2);

        // marking twice changes nothing
        assert!(store.mark_read(a));
        assert_eq!(store.unread_count(), 2);

        assert!(store.get(b).map(|r| !r.is_read()).unwrap());
        store.mark_all_read();
        check_unread(&store);
        assert_eq!(store.unread_count(), 0);

        store.record_alert(BinCategory::Reject, 82.0);
        check_unread(&store);
        assert_eq!(store.unread_count(), 1);

        store.clear_all();
        check_unread(&store);
        assert!(store.is_empty());
    }

    #[test]
    fn mark_read_unknown_id_is_noop() {
        let mut store = NotificationStore::new();
        store.record_alert(BinCategory::Wet, 85.0);
        let mut other = NotificationStore::new();
        let foreign = other.record_alert(BinCategory::Wet, 85.0).id();
        assert!(!store.mark_read(foreign));
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn clear_then_record_yields_single_unread() {
        let mut store = NotificationStore::new();
        store.record_alert(BinCategory::Wet, 85.0);
        store.record_alert(BinCategory::Reject, 91.0);
        store.clear_all();
        let rec = store.record_alert(BinCategory::Hazardous, 92.0).clone();
        assert_eq!(store.len(), 1);
        assert!(!rec.is_read());
        assert_eq!(rec.category(), BinCategory::Hazardous);
        assert_eq!(rec.fill_percent_at_trigger(), 92.0);
        assert_eq!(store.unread_count(), 1);
    }
}
