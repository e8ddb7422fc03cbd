//! Reorder intents

use crate::error::{Result, SdkError};
use crate::model::{OrderEntry, SiblingKey, SiblingScope};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The full target ordering for one sibling set
///
/// Always a complete ordering, never a delta: `entries` names every sibling
/// exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderIntent {
    pub scope: SiblingScope,
    pub parent_id: String,
    pub entries: Vec<OrderEntry>,
}

impl ReorderIntent {
    /// Build an intent from ids in their desired order
    pub fn from_sequence<I, S>(scope: SiblingScope, parent_id: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = ids
            .into_iter()
            .enumerate()
            .map(|(position, id)| OrderEntry::new(id, position as u32))
            .collect();

        Self {
            scope,
            parent_id: parent_id.into(),
            entries,
        }
    }

    /// Reorder the modules of a course
    pub fn modules<I, S>(course_id: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_sequence(SiblingScope::Modules, course_id, ids)
    }

    /// Reorder the lessons of a module
    pub fn lessons<I, S>(module_id: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_sequence(SiblingScope::Lessons, module_id, ids)
    }

    pub fn key(&self) -> SiblingKey {
        SiblingKey {
            scope: self.scope,
            parent_id: self.parent_id.clone(),
        }
    }

    /// Reject intents whose entries share an `order` value
    ///
    /// Such an intent has no single target sequence.
    pub fn validate(&self) -> Result<()> {
        let distinct: HashSet<u32> = self.entries.iter().map(|e| e.order).collect();
        if distinct.len() != self.entries.len() {
            return Err(SdkError::InvalidPermutation {
                expected: self.entries.len(),
                actual: distinct.len(),
            });
        }
        Ok(())
    }

    /// Ids sorted by their target order
    pub fn sequence(&self) -> Vec<&str> {
        let mut entries: Vec<&OrderEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.order);
        entries.into_iter().map(|e| e.id.as_str()).collect()
    }

    /// Entries renumbered `0..n` in target order, as sent to the service
    pub fn normalized_entries(&self) -> Vec<OrderEntry> {
        self.sequence()
            .into_iter()
            .enumerate()
            .map(|(position, id)| OrderEntry::new(id, position as u32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sequence_numbers_positions() {
        let intent = ReorderIntent::lessons("m1", ["l2", "l1", "l3"]);

        assert_eq!(intent.key(), SiblingKey::lessons("m1"));
        assert_eq!(intent.entries[0], OrderEntry::new("l2", 0));
        assert_eq!(intent.entries[2], OrderEntry::new("l3", 2));
    }

    #[test]
    fn test_sequence_follows_entry_order_not_vec_order() {
        let intent = ReorderIntent {
            scope: SiblingScope::Modules,
            parent_id: "c1".to_string(),
            entries: vec![
                OrderEntry::new("m3", 5),
                OrderEntry::new("m1", 1),
                OrderEntry::new("m2", 3),
            ],
        };

        assert_eq!(intent.sequence(), vec!["m1", "m2", "m3"]);
        assert_eq!(intent.normalized_entries()[2], OrderEntry::new("m3", 2));
        assert!(intent.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_shared_orders() {
        let intent = ReorderIntent {
            scope: SiblingScope::Lessons,
            parent_id: "m1".to_string(),
            entries: vec![
                OrderEntry::new("l1", 0),
                OrderEntry::new("l2", 1),
                OrderEntry::new("l3", 1),
            ],
        };

        assert!(matches!(
            intent.validate(),
            Err(SdkError::InvalidPermutation { expected: 3, actual: 2 })
        ));
    }
}
