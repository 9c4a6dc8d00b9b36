//! Per-event unit of work around the pure engine.
//!
//! Storage stays with the embedder behind [`SnapshotStore`]. [`with_event`]
//! holds the event's lock from load to save, so two callers completing heats
//! of the same event cannot overwrite each other's snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;

use crate::error::EngineError;
use crate::event::Event;
use crate::progression::{finalize_event, FinalizedEvent};
use crate::racer::Racer;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("event {0} not found")]
    EventNotFound(String),

    #[error("storage backend failed: {0}")]
    Backend(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Whole-document persistence of events and racers.
pub trait SnapshotStore {
    fn load_event(&self, event_id: &str) -> Result<Event, StoreError>;

    fn save_event(&self, event: &Event) -> Result<(), StoreError>;

    fn load_racers(&self) -> Result<Vec<Racer>, StoreError>;

    fn save_racers(&self, racers: &[Racer]) -> Result<(), StoreError>;

    /// Persist a finalized event and the racers it updated as one write.
    ///
    /// Either both documents are stored or neither is. A half-applied write
    /// would leave the event open with its points already in the season
    /// totals, and a retry would count them again.
    fn save_finalized(&self, event: &Event, racers: &[Racer]) -> Result<(), StoreError>;
}

/// One mutex per event id, created on first use.
#[derive(Debug, Default)]
pub struct EventLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EventLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, event_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(event_id.to_string()).or_default().clone()
    }

    /// Hand back a lock from [`lock_for`](Self::lock_for).
    ///
    /// The entry is dropped once no other caller holds or waits on it.
    pub fn release(&self, event_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = locks
            .get(event_id)
            .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(held) == 2);
        if idle {
            locks.remove(event_id);
        }
    }

    /// Number of event ids with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run `op` while holding the lock for `event_id`.
fn locked<T>(locks: &EventLocks, event_id: &str, op: impl FnOnce() -> T) -> T {
    let lock = locks.lock_for(event_id);
    let result = {
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        op()
    };
    locks.release(event_id, lock);
    result
}

/// Load an event, run one engine operation on it, and save the result.
///
/// Nothing is saved when `op` fails.
pub fn with_event<S, F>(store: &S, locks: &EventLocks, event_id: &str, op: F) -> Result<Event, StoreError>
where
    S: SnapshotStore + ?Sized,
    F: FnOnce(&Event) -> Result<Event, EngineError>,
{
    locked(locks, event_id, || {
        let event = store.load_event(event_id)?;
        let next = op(&event)?;
        store.save_event(&next)?;
        debug!(event = event_id, "event snapshot saved");
        Ok(next)
    })
}

/// Finalize a stored event and persist the updated season totals.
///
/// The marked event and the new season totals go through
/// [`SnapshotStore::save_finalized`], so a failed save can be retried
/// without counting the event twice.
pub fn finalize_stored_event<S>(store: &S, locks: &EventLocks, event_id: &str) -> Result<FinalizedEvent, StoreError>
where
    S: SnapshotStore + ?Sized,
{
    locked(locks, event_id, || {
        let event = store.load_event(event_id)?;
        let racers = store.load_racers()?;
        let finalized = finalize_event(&event, &racers)?;

        store.save_finalized(&finalized.event, &finalized.racers)?;
        debug!(event = event_id, "finalized event saved");
        Ok(finalized)
    })
}

/// Store that keeps snapshots in memory.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<String, Event>>,
    racers: RwLock<Vec<Racer>>,
}

impl InMemoryEventStore {
    pub fn new(racers: Vec<Racer>) -> Self {
        InMemoryEventStore {
            events: RwLock::new(HashMap::new()),
            racers: RwLock::new(racers),
        }
    }
}

impl SnapshotStore for InMemoryEventStore {
    fn load_event(&self, event_id: &str) -> Result<Event, StoreError> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        events
            .get(event_id)
            .cloned()
            .ok_or_else(|| StoreError::EventNotFound(event_id.to_string()))
    }

    fn save_event(&self, event: &Event) -> Result<(), StoreError> {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        events.insert(event.id.clone(), event.clone());
        Ok(())
    }

    fn load_racers(&self) -> Result<Vec<Racer>, StoreError> {
        Ok(self.racers.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save_racers(&self, racers: &[Racer]) -> Result<(), StoreError> {
        *self.racers.write().unwrap_or_else(PoisonError::into_inner) = racers.to_vec();
        Ok(())
    }

    fn save_finalized(&self, event: &Event, racers: &[Racer]) -> Result<(), StoreError> {
        // Lock order events -> racers, held together for the whole write
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        let mut stored_racers = self.racers.write().unwrap_or_else(PoisonError::into_inner);
        events.insert(event.id.clone(), event.clone());
        *stored_racers = racers.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::rng_from_seed;
    use crate::error::ValidationError;
    use crate::event::EventConfig;
    use crate::progression::{complete_heat, start_round};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn setup() -> (InMemoryEventStore, EventLocks) {
        let racers: Vec<Racer> = (0..8).map(|i| Racer::new(format!("R{}", i), format!("Racer {}", i))).collect();
        let ids = racers.iter().map(|r| r.id.clone()).collect();
        let config = EventConfig {
            total_rounds: 1,
            racers_per_heat: 2,
        };
        let event = Event::new("e1", "Night Race", "2024-07-07", config, ids).unwrap();

        let store = InMemoryEventStore::new(racers);
        store.save_event(&event).unwrap();
        (store, EventLocks::new())
    }

    /// Fails the first finalized write, then behaves like the inner store.
    struct FlakyStore {
        inner: InMemoryEventStore,
        failed: AtomicBool,
    }

    impl SnapshotStore for FlakyStore {
        fn load_event(&self, event_id: &str) -> Result<Event, StoreError> {
            self.inner.load_event(event_id)
        }

        fn save_event(&self, event: &Event) -> Result<(), StoreError> {
            self.inner.save_event(event)
        }

        fn load_racers(&self) -> Result<Vec<Racer>, StoreError> {
            self.inner.load_racers()
        }

        fn save_racers(&self, racers: &[Racer]) -> Result<(), StoreError> {
            self.inner.save_racers(racers)
        }

        fn save_finalized(&self, event: &Event, racers: &[Racer]) -> Result<(), StoreError> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(StoreError::Backend("disk full".to_string()));
            }
            self.inner.save_finalized(event, racers)
        }
    }

    fn run_event<S: SnapshotStore>(store: &S, locks: &EventLocks, seed: u64) {
        let mut rng = rng_from_seed(Some(seed));
        let started = with_event(store, locks, "e1", |e| start_round(e, &mut rng)).unwrap();
        for heat in &started.rounds[0].heats {
            with_event(store, locks, "e1", |e| complete_heat(e, &heat.id, &heat.racer_ids)).unwrap();
        }
    }

    fn season_total<S: SnapshotStore>(store: &S) -> u32 {
        store.load_racers().unwrap().iter().map(|r| r.season_points).sum()
    }

    #[test]
    fn test_missing_event() {
        let (store, locks) = setup();
        let err = with_event(&store, &locks, "nope", |e| Ok(e.clone())).unwrap_err();
        assert!(matches!(err, StoreError::EventNotFound(_)));
    }

    #[test]
    fn test_failed_op_not_saved() {
        let (store, locks) = setup();
        let err = with_event(&store, &locks, "e1", |e| complete_heat(e, "h", &[])).unwrap_err();
        assert!(matches!(err, StoreError::Engine(_)));
        assert!(store.load_event("e1").unwrap().rounds.is_empty());
    }

    #[test]
    fn test_concurrent_heat_completion_keeps_all_results() {
        let (store, locks) = setup();
        let mut rng = rng_from_seed(Some(1));
        let started = with_event(&store, &locks, "e1", |e| start_round(e, &mut rng)).unwrap();

        let heats: Vec<_> = started.rounds[0]
            .heats
            .iter()
            .map(|h| (h.id.clone(), h.racer_ids.clone()))
            .collect();

        thread::scope(|s| {
            for (heat_id, order) in &heats {
                let (store, locks) = (&store, &locks);
                s.spawn(move || {
                    with_event(store, locks, "e1", |e| complete_heat(e, heat_id, order)).unwrap();
                });
            }
        });

        let event = store.load_event("e1").unwrap();
        assert!(event.is_complete());
    }

    #[test]
    fn test_finalize_stored_event_once() {
        let (store, locks) = setup();
        run_event(&store, &locks, 2);

        finalize_stored_event(&store, &locks, "e1").unwrap();
        // Four heats of two racers, 3 points each
        assert_eq!(season_total(&store), 12);

        let err = finalize_stored_event(&store, &locks, "e1").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Engine(EngineError::Validation(ValidationError::SeasonPointsAlreadyApplied(_)))
        ));
        assert_eq!(season_total(&store), 12);
    }

    #[test]
    fn test_finalize_retry_after_failed_save_counts_once() {
        let (inner, locks) = setup();
        let store = FlakyStore {
            inner,
            failed: AtomicBool::new(false),
        };
        run_event(&store, &locks, 3);

        let err = finalize_stored_event(&store, &locks, "e1").unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(season_total(&store), 0);
        assert!(!store.load_event("e1").unwrap().season_points_applied);

        finalize_stored_event(&store, &locks, "e1").unwrap();
        assert_eq!(season_total(&store), 12);
        assert!(store.load_event("e1").unwrap().season_points_applied);
    }

    #[test]
    fn test_idle_locks_are_dropped() {
        let (store, locks) = setup();
        with_event(&store, &locks, "e1", |e| Ok(e.clone())).unwrap();
        let _ = with_event(&store, &locks, "nope", |e| Ok(e.clone()));
        assert!(locks.is_empty());

        // A lock someone still holds stays in the map
        let held = locks.lock_for("e1");
        with_event(&store, &locks, "e1", |e| Ok(e.clone())).unwrap();
        assert_eq!(locks.len(), 1);

        locks.release("e1", held);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_concurrent_events_leave_no_locks() {
        let (store, locks) = setup();
        thread::scope(|s| {
            for _ in 0..8 {
                let (store, locks) = (&store, &locks);
                s.spawn(move || {
                    for _ in 0..50 {
                        with_event(store, locks, "e1", |e| Ok(e.clone())).unwrap();
                    }
                });
            }
        });
        assert!(locks.is_empty());
    }
}
