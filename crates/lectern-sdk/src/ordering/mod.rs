//! Ordering primitives for sibling sets
//!
//! One [`OrderingStore`] exists per sibling set. Stores are mutated only by
//! the mutation controller and by hierarchy loads; everything else reads.

mod store;

pub use store::{OrderedEntity, OrderingSnapshot, OrderingStore};
