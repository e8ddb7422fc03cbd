//! Optimistic reorder controller
//!
//! Drives the per-sibling-set protocol
//! `Stable -> Speculative -> Stable (confirmed | rolled back)`:
//! - [`MutationController::begin`] reindexes the store immediately and hands
//!   out a [`PendingReorder`] ticket
//! - [`MutationController::settle`] consumes the ticket, so each request
//!   settles exactly once, as either a confirmation or a rollback
//! - A newer intent for the same sibling set cancels the older ticket; the
//!   older request's settlement is then discarded
//!
//! The controller does no I/O. The coordinator owns the network call and
//! races it against the ticket's cancellation token.

use super::intent::ReorderIntent;
use crate::error::Result;
use crate::model::SiblingKey;
use crate::ordering::{OrderingSnapshot, OrderingStore};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Mutation phase of one sibling set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    /// No reorder in flight; the store mirrors the last known server state
    Stable,
    /// A reorder is applied locally and awaiting the service
    Speculative { generation: u64 },
}

/// How a settled request affected the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Service accepted; speculative state is now confirmed
    Confirmed,
    /// Service rejected; store restored to the pre-reorder snapshot
    RolledBack,
    /// A newer intent owns the sibling set; store untouched
    Superseded,
}

/// Ticket for one in-flight reorder
///
/// Deliberately not `Clone`: settling consumes it.
#[derive(Debug)]
#[must_use = "a pending reorder must be settled"]
pub struct PendingReorder {
    key: SiblingKey,
    generation: u64,
    token: CancellationToken,
}

impl PendingReorder {
    pub fn key(&self) -> &SiblingKey {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token cancelled when a newer intent supersedes this one
    pub fn cancellation(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_superseded(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    token: CancellationToken,
    /// Last confirmed state of the sibling set
    baseline: OrderingSnapshot,
}

/// Tracks at most one in-flight reorder per sibling set
#[derive(Debug, Default)]
pub struct MutationController {
    next_generation: u64,
    in_flight: HashMap<SiblingKey, InFlight>,
    /// Generation of the most recent `begin` per sibling set
    last_begun: HashMap<SiblingKey, u64>,
    /// Floor raised by `cancel_all`
    reset_generation: u64,
}

impl MutationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `intent` speculatively to `store`
    ///
    /// If an older reorder of the same sibling set is still in flight it is
    /// cancelled, and its baseline carries over: a later rollback returns to
    /// the last confirmed state, never to another unconfirmed one. If the
    /// intent does not reindex cleanly nothing changes, including the older
    /// in-flight reorder.
    pub fn begin(
        &mut self,
        intent: &ReorderIntent,
        store: &mut OrderingStore,
    ) -> Result<PendingReorder> {
        intent.validate()?;
        let key = intent.key();

        let baseline = match self.in_flight.get(&key) {
            Some(previous) => previous.baseline.clone(),
            None => store.snapshot(),
        };

        store.reindex(intent.sequence().as_slice())?;

        if let Some(previous) = self.in_flight.remove(&key) {
            previous.token.cancel();
            debug!(
                sibling_set = %key,
                generation = previous.generation,
                "Superseded in-flight reorder"
            );
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let token = CancellationToken::new();

        self.last_begun.insert(key.clone(), generation);
        self.in_flight.insert(
            key.clone(),
            InFlight {
                generation,
                token: token.clone(),
                baseline,
            },
        );

        debug!(sibling_set = %key, generation, "Applied speculative reorder");

        Ok(PendingReorder {
            key,
            generation,
            token,
        })
    }

    /// Settle a ticket with the service's answer
    pub fn settle(
        &mut self,
        pending: PendingReorder,
        persisted: bool,
        store: &mut OrderingStore,
    ) -> Settlement {
        let current = self
            .in_flight
            .get(&pending.key)
            .map(|f| f.generation == pending.generation)
            .unwrap_or(false);

        if !current || pending.is_superseded() {
            debug!(
                sibling_set = %pending.key,
                generation = pending.generation,
                persisted,
                "Discarding late response for superseded reorder"
            );
            return Settlement::Superseded;
        }

        // Checked above: the entry exists and belongs to this ticket
        let Some(in_flight) = self.in_flight.remove(&pending.key) else {
            return Settlement::Superseded;
        };

        if persisted {
            info!(
                sibling_set = %pending.key,
                generation = pending.generation,
                "Reorder confirmed"
            );
            Settlement::Confirmed
        } else {
            store.restore(in_flight.baseline);
            warn!(
                sibling_set = %pending.key,
                generation = pending.generation,
                "Reorder rejected, rolled back"
            );
            Settlement::RolledBack
        }
    }

    pub fn phase(&self, key: &SiblingKey) -> MutationPhase {
        match self.in_flight.get(key) {
            Some(f) => MutationPhase::Speculative {
                generation: f.generation,
            },
            None => MutationPhase::Stable,
        }
    }

    pub fn is_stable(&self, key: &SiblingKey) -> bool {
        !self.in_flight.contains_key(key)
    }

    /// Changes whenever a reorder of `key` begins or the controller is reset
    ///
    /// A fetch of the sibling set may only be applied if the revision it was
    /// issued under is still current.
    pub fn revision(&self, key: &SiblingKey) -> u64 {
        self.last_begun
            .get(key)
            .copied()
            .unwrap_or(0)
            .max(self.reset_generation)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Cancel the in-flight reorder of `key`, if any, without touching its store
    ///
    /// Used when the sibling set itself disappears.
    pub fn abandon(&mut self, key: &SiblingKey) {
        if let Some(in_flight) = self.in_flight.remove(key) {
            in_flight.token.cancel();
            debug!(sibling_set = %key, generation = in_flight.generation, "Abandoned reorder");
        }
    }

    /// Cancel every in-flight reorder without touching any store
    ///
    /// Used when a fresh hierarchy load replaces the working state.
    pub fn cancel_all(&mut self) {
        for (key, in_flight) in self.in_flight.drain() {
            in_flight.token.cancel();
            debug!(sibling_set = %key, generation = in_flight.generation, "Cancelled reorder");
        }
        self.next_generation += 1;
        self.reset_generation = self.next_generation;
        self.last_begun.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdkError;
    use crate::model::{OrderEntry, SiblingScope};
    use crate::ordering::OrderedEntity;

    fn store() -> OrderingStore {
        OrderingStore::from_entities(vec![
            OrderedEntity::new("l1", 0),
            OrderedEntity::new("l2", 1),
            OrderedEntity::new("l3", 2),
        ])
        .unwrap()
    }

    #[test]
    fn test_begin_applies_speculative_state() {
        let mut controller = MutationController::new();
        let mut store = store();

        let pending = controller
            .begin(&ReorderIntent::lessons("m1", ["l2", "l1", "l3"]), &mut store)
            .unwrap();

        assert_eq!(store.ids(), vec!["l2", "l1", "l3"]);
        assert_eq!(
            controller.phase(&SiblingKey::lessons("m1")),
            MutationPhase::Speculative {
                generation: pending.generation()
            }
        );

        assert_eq!(controller.settle(pending, true, &mut store), Settlement::Confirmed);
        assert_eq!(store.ids(), vec!["l2", "l1", "l3"]);
        assert!(controller.is_stable(&SiblingKey::lessons("m1")));
    }

    #[test]
    fn test_failure_restores_exact_snapshot() {
        let mut controller = MutationController::new();
        let mut store = store();
        let before = store.clone();

        let pending = controller
            .begin(&ReorderIntent::lessons("m1", ["l2", "l1", "l3"]), &mut store)
            .unwrap();

        assert_eq!(controller.settle(pending, false, &mut store), Settlement::RolledBack);
        assert_eq!(store, before);
        assert_eq!(controller.in_flight_count(), 0);
    }

    #[test]
    fn test_newer_intent_supersedes_older() {
        let mut controller = MutationController::new();
        let mut store = store();

        let a = controller
            .begin(&ReorderIntent::lessons("m1", ["l2", "l1", "l3"]), &mut store)
            .unwrap();
        let b = controller
            .begin(&ReorderIntent::lessons("m1", ["l3", "l2", "l1"]), &mut store)
            .unwrap();

        assert!(a.is_superseded());
        assert!(!b.is_superseded());

        // A's late failure must not roll back B's speculative state
        assert_eq!(controller.settle(a, false, &mut store), Settlement::Superseded);
        assert_eq!(store.ids(), vec!["l3", "l2", "l1"]);

        assert_eq!(controller.settle(b, true, &mut store), Settlement::Confirmed);
        assert_eq!(store.ids(), vec!["l3", "l2", "l1"]);
    }

    #[test]
    fn test_superseding_rollback_returns_to_confirmed_state() {
        let mut controller = MutationController::new();
        let mut store = store();

        let a = controller
            .begin(&ReorderIntent::lessons("m1", ["l2", "l1", "l3"]), &mut store)
            .unwrap();
        let b = controller
            .begin(&ReorderIntent::lessons("m1", ["l3", "l2", "l1"]), &mut store)
            .unwrap();

        assert_eq!(controller.settle(b, false, &mut store), Settlement::RolledBack);
        assert_eq!(store.ids(), vec!["l1", "l2", "l3"]);
        assert_eq!(controller.settle(a, true, &mut store), Settlement::Superseded);
        assert_eq!(store.ids(), vec!["l1", "l2", "l3"]);
    }

    #[test]
    fn test_invalid_intent_keeps_older_reorder_alive() {
        let mut controller = MutationController::new();
        let mut store = store();

        let a = controller
            .begin(&ReorderIntent::lessons("m1", ["l2", "l1", "l3"]), &mut store)
            .unwrap();

        let result = controller.begin(&ReorderIntent::lessons("m1", ["l2", "lx", "l3"]), &mut store);
        assert!(matches!(result, Err(SdkError::UnknownEntity(_))));
        assert!(!a.is_superseded());
        assert_eq!(store.ids(), vec!["l2", "l1", "l3"]);

        assert_eq!(controller.settle(a, true, &mut store), Settlement::Confirmed);
    }

    #[test]
    fn test_ambiguous_intent_leaves_store_untouched() {
        let mut controller = MutationController::new();
        let mut store = store();
        let intent = ReorderIntent {
            scope: SiblingScope::Lessons,
            parent_id: "m1".to_string(),
            entries: vec![
                OrderEntry::new("l3", 0),
                OrderEntry::new("l1", 0),
                OrderEntry::new("l2", 1),
            ],
        };

        let result = controller.begin(&intent, &mut store);

        assert!(matches!(result, Err(SdkError::InvalidPermutation { .. })));
        assert_eq!(store.ids(), vec!["l1", "l2", "l3"]);
        assert!(controller.is_stable(&SiblingKey::lessons("m1")));
    }

    #[test]
    fn test_scopes_are_independent() {
        let mut controller = MutationController::new();
        let mut lessons = store();
        let mut modules = OrderingStore::from_entities(vec![
            OrderedEntity::new("m1", 0),
            OrderedEntity::new("m2", 1),
        ])
        .unwrap();

        let a = controller
            .begin(&ReorderIntent::lessons("m1", ["l3", "l1", "l2"]), &mut lessons)
            .unwrap();
        let b = controller
            .begin(&ReorderIntent::modules("c1", ["m2", "m1"]), &mut modules)
            .unwrap();

        assert!(!a.is_superseded());
        assert_eq!(controller.in_flight_count(), 2);
        assert_eq!(controller.settle(b, false, &mut modules), Settlement::RolledBack);
        assert_eq!(controller.settle(a, true, &mut lessons), Settlement::Confirmed);
        assert_eq!(modules.ids(), vec!["m1", "m2"]);
        assert_eq!(lessons.ids(), vec!["l3", "l1", "l2"]);
    }

    #[test]
    fn test_revision_moves_on_begin_and_reset() {
        let mut controller = MutationController::new();
        let mut lessons = store();
        let key = SiblingKey::lessons("m1");
        let other = SiblingKey::modules("c1");

        let initial = controller.revision(&key);
        let pending = controller
            .begin(&ReorderIntent::lessons("m1", ["l2", "l1", "l3"]), &mut lessons)
            .unwrap();
        let begun = controller.revision(&key);
        assert_ne!(begun, initial);
        assert_eq!(controller.revision(&other), initial);

        // Settling does not move the revision; only a newer begin does
        assert_eq!(controller.settle(pending, true, &mut lessons), Settlement::Confirmed);
        assert_eq!(controller.revision(&key), begun);

        controller.cancel_all();
        assert_ne!(controller.revision(&key), begun);
        assert_ne!(controller.revision(&other), initial);
    }

    #[test]
    fn test_cancel_all_discards_pending_settlements() {
        let mut controller = MutationController::new();
        let mut store = store();

        let a = controller
            .begin(&ReorderIntent::lessons("m1", ["l2", "l1", "l3"]), &mut store)
            .unwrap();
        controller.cancel_all();

        assert!(a.is_superseded());
        assert_eq!(controller.settle(a, false, &mut store), Settlement::Superseded);
    }
}
