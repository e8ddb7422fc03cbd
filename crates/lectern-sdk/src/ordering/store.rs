//! Ordered sibling collection with snapshot/restore
//!
//! Holds one sibling set (the modules of a course, or the lessons of a
//! module) sorted by `order`. After any successful [`OrderingStore::reindex`]
//! the orders are exactly `0..len`.

use crate::error::{Result, SdkError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// An entity's identity and its position among its siblings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderedEntity {
    pub id: String,
    pub order: u32,
}

impl OrderedEntity {
    pub fn new(id: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            order,
        }
    }
}

/// Independent copy of a store's contents, used for rollback
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderingSnapshot {
    entries: Vec<OrderedEntity>,
}

impl OrderingSnapshot {
    pub fn entries(&self) -> &[OrderedEntity] {
        &self.entries
    }
}

/// In-memory ordering of one sibling set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderingStore {
    /// Sorted ascending by `order`
    entries: Vec<OrderedEntity>,
}

impl OrderingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from server-provided entities
    pub fn from_entities(entities: Vec<OrderedEntity>) -> Result<Self> {
        let mut store = Self::new();
        store.load(entities)?;
        Ok(store)
    }

    /// Replace the held sequence, sorted ascending by `order`
    ///
    /// Duplicate orders or ids indicate an upstream integrity problem and are
    /// reported as [`SdkError::MalformedOrder`]; the store is left unchanged.
    pub fn load(&mut self, mut entities: Vec<OrderedEntity>) -> Result<()> {
        let mut ids = HashSet::with_capacity(entities.len());
        for entity in &entities {
            if !ids.insert(entity.id.as_str()) {
                return Err(SdkError::MalformedOrder(format!(
                    "id {} appears more than once",
                    entity.id
                )));
            }
        }

        entities.sort_by_key(|e| e.order);
        if let Some(pair) = entities.windows(2).find(|w| w[0].order == w[1].order) {
            return Err(SdkError::MalformedOrder(format!(
                "{} and {} share order {}",
                pair[0].id, pair[1].id, pair[0].order
            )));
        }

        self.entries = entities;
        Ok(())
    }

    /// Assign `order = position` following `sequence`
    ///
    /// `sequence` must be a permutation of the ids currently held. Nothing is
    /// changed unless the whole sequence validates.
    pub fn reindex<S: AsRef<str>>(&mut self, sequence: &[S]) -> Result<()> {
        let known: HashMap<&str, usize> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.as_str(), i))
            .collect();

        let mut seen = HashSet::with_capacity(sequence.len());
        for id in sequence {
            let id = id.as_ref();
            if !known.contains_key(id) {
                return Err(SdkError::UnknownEntity(id.to_string()));
            }
            seen.insert(id);
        }

        if seen.len() != self.entries.len() || sequence.len() != self.entries.len() {
            return Err(SdkError::InvalidPermutation {
                expected: self.entries.len(),
                actual: seen.len(),
            });
        }

        self.entries = sequence
            .iter()
            .enumerate()
            .map(|(position, id)| OrderedEntity::new(id.as_ref(), position as u32))
            .collect();
        Ok(())
    }

    /// Deep copy of the current contents
    pub fn snapshot(&self) -> OrderingSnapshot {
        OrderingSnapshot {
            entries: self.entries.clone(),
        }
    }

    /// Replace the contents with a previously taken snapshot
    pub fn restore(&mut self, snapshot: OrderingSnapshot) {
        self.entries = snapshot.entries;
    }

    /// Entities in order
    pub fn entries(&self) -> &[OrderedEntity] {
        &self.entries
    }

    /// Ids in order
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn order_of(&self, id: &str) -> Option<u32> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.order)
    }

    /// Zero-based rank of `id` in the sequence, independent of order gaps
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
