//! Per-entity history store.
//!
//! Keeps one bounded [`Ringbuffer`] per [`EntityId`] plus the last value seen
//! before the current cycle. Entries are created lazily on first sighting
//! and live until [`HistoryStore::clear`].

use crate::model::{finite_reading, EntityId};
use crate::ringbuffer::Ringbuffer;
use ahash::AHashMap;
use serde::Serialize;

/// Statistics about the history store.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryStats {
    pub capacity_per_entity: usize,
    pub tracked_entities: usize,
    pub buffered_readings: usize,
}

#[derive(Debug, Clone)]
struct EntityHistory {
    buffer: Ringbuffer,
    last_seen: Option<f64>,
    before_latest: Option<f64>,
}

/// Bounded reading history for every monitored entity of one facility.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: AHashMap<EntityId, EntityHistory>,
    capacity: usize,
}

impl HistoryStore {
    /// Creates an empty store keeping `capacity` readings per entity.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: AHashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Records a reading.
    ///
    /// Absent and non-finite readings are a no-op: they neither extend the
    /// buffer nor touch the last seen value. Returns whether the reading was
    /// stored.
    pub fn record(&mut self, entity: &EntityId, value: Option<f64>) -> bool {
        let Some(value) = finite_reading(value) else {
            return false;
        };

        let capacity = self.capacity;
        let history = self
            .entries
            .entry(entity.clone())
            .or_insert_with(|| EntityHistory {
                buffer: Ringbuffer::new(capacity),
                last_seen: None,
                before_latest: None,
            });

        history.before_latest = history.last_seen;
        history.last_seen = Some(value);
        history.buffer.push(value);
        true
    }

    /// Last stored reading. Read before [`record`](Self::record) it is the
    /// previous value for the cycle about to run.
    pub fn last_seen_value(&self, entity: &EntityId) -> Option<f64> {
        self.entries.get(entity).and_then(|h| h.last_seen)
    }

    /// Reading stored right before the latest one.
    pub fn value_before_latest(&self, entity: &EntityId) -> Option<f64> {
        self.entries.get(entity).and_then(|h| h.before_latest)
    }

    /// Buffered readings, oldest to newest. Empty for unknown entities.
    pub fn history(&self, entity: &EntityId) -> Vec<f64> {
        self.entries
            .get(entity)
            .map(|h| h.buffer.get_history())
            .unwrap_or_default()
    }

    pub fn buffer(&self, entity: &EntityId) -> Option<&Ringbuffer> {
        self.entries.get(entity).map(|h| &h.buffer)
    }

    pub fn contains(&self, entity: &EntityId) -> bool {
        self.entries.contains_key(entity)
    }

    /// All tracked entities in a stable order.
    pub fn entities(&self) -> Vec<EntityId> {
        let mut entities: Vec<EntityId> = self.entries.keys().cloned().collect();
        entities.sort();
        entities
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get_stats(&self) -> HistoryStats {
        HistoryStats {
            capacity_per_entity: self.capacity,
            tracked_entities: self.entries.len(),
            buffered_readings: self.entries.values().map(|h| h.buffer.len()).sum(),
        }
    }

    /// Drops every entity.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radar() -> EntityId {
        EntityId::radar("Port", "B1", "R1")
    }

    #[test]
    fn test_record_creates_entity_lazily() {
        let mut store = HistoryStore::new(5);
        assert!(!store.contains(&radar()));
        assert!(store.record(&radar(), Some(3.0)));
        assert!(store.contains(&radar()));
        assert_eq!(store.history(&radar()), vec![3.0]);
    }

    #[test]
    fn test_absent_reading_is_noop() {
        let mut store = HistoryStore::new(5);
        assert!(!store.record(&radar(), None));
        assert!(!store.contains(&radar()));

        store.record(&radar(), Some(1.0));
        assert!(!store.record(&radar(), Some(f64::NAN)));
        assert_eq!(store.history(&radar()), vec![1.0]);
        assert_eq!(store.last_seen_value(&radar()), Some(1.0));
    }

    #[test]
    fn test_last_seen_and_before_latest() {
        let mut store = HistoryStore::new(5);
        store.record(&radar(), Some(1.0));
        assert_eq!(store.value_before_latest(&radar()), None);
        store.record(&radar(), Some(2.0));
        assert_eq!(store.last_seen_value(&radar()), Some(2.0));
        assert_eq!(store.value_before_latest(&radar()), Some(1.0));
    }

    #[test]
    fn test_stats_and_clear() {
        let mut store = HistoryStore::new(2);
        let hook = EntityId::hook("Port", "B1", "BL1", "H1");
        for v in [1.0, 2.0, 3.0] {
            store.record(&radar(), Some(v));
        }
        store.record(&hook, Some(4.0));

        let stats = store.get_stats();
        assert_eq!(stats.capacity_per_entity, 2);
        assert_eq!(stats.tracked_entities, 2);
        assert_eq!(stats.buffered_readings, 3);
        assert_eq!(store.entities(), vec![radar(), hook]);

        store.clear();
        assert!(store.is_empty());
    }
}
