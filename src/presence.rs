//! Drift alert presence tracking.
//!
//! A newly qualifying drift alert is held back for a fixed delay before it
//! is announced; once announced it shows immediately on every following
//! cycle until it stops qualifying. Breach alerts never pass through here.
//!
//! Per entity:
//!
//! ```text
//! Unseen --qualifies--> PendingAnnounce --delay elapsed--> Announced
//!    ^                        |                               |
//!    +------ stops qualifying / disappears -------------------+
//! ```
//!
//! Time only advances through the `now` arguments, so tests drive the
//! tracker with a fake clock.

use crate::model::{EntityId, InstrumentKind};
use ahash::{AHashMap, AHashSet};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Suffix appended to the entity key to form a drift alert key.
pub const DRIFT_KEY_SUFFIX: &str = "consecutive";

/// Stable identity of one drift alert, e.g. `B1::RADAR::R1::consecutive`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AlertKey(String);

impl AlertKey {
    pub fn drift(entity: &EntityId) -> Self {
        Self(format!("{}::{}", entity, DRIFT_KEY_SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    Unseen,
    PendingAnnounce,
    Announced,
}

/// Debounce state for the drift alerts of one facility.
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    delay: Duration,
    known: AHashSet<EntityId>,
    pending: AHashMap<EntityId, Instant>,
    qualifying: AHashSet<EntityId>,
    present: AHashSet<EntityId>,
}

impl PresenceTracker {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            known: AHashSet::new(),
            pending: AHashMap::new(),
            qualifying: AHashSet::new(),
            present: AHashSet::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Starts a new evaluation cycle. Qualification is per cycle.
    pub fn begin_cycle(&mut self) {
        self.qualifying.clear();
        self.present.clear();
    }

    /// Records that an entity is monitored in the current cycle.
    pub fn note_present(&mut self, entity: &EntityId) {
        self.present.insert(entity.clone());
    }

    /// Records that an entity qualifies for a drift alert in the current
    /// cycle and returns its state.
    ///
    /// An entity already pending keeps its original due time.
    pub fn observe(&mut self, entity: &EntityId, now: Instant) -> PresenceState {
        self.present.insert(entity.clone());
        self.qualifying.insert(entity.clone());

        if self.known.contains(entity) {
            return PresenceState::Announced;
        }
        if self.pending.contains_key(entity) {
            return PresenceState::PendingAnnounce;
        }
        if self.delay.is_zero() {
            self.known.insert(entity.clone());
            return PresenceState::Announced;
        }

        self.pending.insert(entity.clone(), now + self.delay);
        PresenceState::PendingAnnounce
    }

    pub fn is_known(&self, entity: &EntityId) -> bool {
        self.known.contains(entity)
    }

    pub fn is_known_key(&self, key: &AlertKey) -> bool {
        self.known.iter().any(|e| AlertKey::drift(e) == *key)
    }

    pub fn state(&self, entity: &EntityId) -> PresenceState {
        if self.known.contains(entity) {
            PresenceState::Announced
        } else if self.pending.contains_key(entity) {
            PresenceState::PendingAnnounce
        } else {
            PresenceState::Unseen
        }
    }

    /// Marks entities as announced, cancelling any pending announce.
    pub fn mark_known<'a, I>(&mut self, entities: I)
    where
        I: IntoIterator<Item = &'a EntityId>,
    {
        for entity in entities {
            self.pending.remove(entity);
            self.known.insert(entity.clone());
        }
    }

    /// Drops announced alerts of `kind` that no longer qualify and cancels
    /// pending announces of `kind` whose entity vanished from the snapshot.
    ///
    /// A pending announce for an entity that is still present but no longer
    /// qualifies is kept; [`tick`](Self::tick) re-checks it when due.
    pub fn prune_unknown_of(&mut self, kind: InstrumentKind) -> Vec<EntityId> {
        let mut removed: Vec<EntityId> = self
            .known
            .iter()
            .filter(|e| e.kind == kind && !self.qualifying.contains(*e))
            .cloned()
            .collect();
        for entity in &removed {
            self.known.remove(entity);
        }

        let present = &self.present;
        self.pending
            .retain(|e, _| e.kind != kind || present.contains(e));

        removed.sort();
        removed
    }

    /// Fires every pending announce due at `now`.
    ///
    /// An entity that stopped qualifying since it was scheduled is dropped
    /// silently. Returns the newly announced entities.
    pub fn tick(&mut self, now: Instant) -> Vec<EntityId> {
        let due: Vec<EntityId> = self
            .pending
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(e, _)| e.clone())
            .collect();

        let mut announced = Vec::new();
        for entity in due {
            self.pending.remove(&entity);
            if self.qualifying.contains(&entity) {
                self.known.insert(entity.clone());
                announced.push(entity);
            }
        }
        announced.sort();
        announced
    }

    /// Earliest pending due time.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Announced alert keys in a stable order.
    pub fn known_keys(&self) -> Vec<AlertKey> {
        let mut keys: Vec<AlertKey> = self.known.iter().map(AlertKey::drift).collect();
        keys.sort();
        keys
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.known.clear();
        self.pending.clear();
        self.qualifying.clear();
        self.present.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radar() -> EntityId {
        EntityId::radar("Port", "B1", "R1")
    }

    #[test]
    fn test_alert_key_format() {
        assert_eq!(AlertKey::drift(&radar()).as_str(), "B1::RADAR::R1::consecutive");
    }

    #[test]
    fn test_zero_delay_announces_immediately() {
        let mut tracker = PresenceTracker::new(Duration::ZERO);
        tracker.begin_cycle();
        assert_eq!(
            tracker.observe(&radar(), Instant::now()),
            PresenceState::Announced
        );
        assert!(tracker.is_known(&radar()));
        assert!(tracker.is_known_key(&AlertKey::drift(&radar())));
    }

    #[test]
    fn test_mark_known_cancels_pending() {
        let t0 = Instant::now();
        let mut tracker = PresenceTracker::new(Duration::from_millis(100));
        tracker.begin_cycle();
        tracker.observe(&radar(), t0);
        tracker.mark_known([&radar()]);
        assert_eq!(tracker.pending_count(), 0);
        assert_eq!(tracker.state(&radar()), PresenceState::Announced);
    }
}
