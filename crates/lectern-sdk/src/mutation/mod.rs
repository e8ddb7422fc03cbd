//! Optimistic reorder of sibling sets
//!
//! Reorders are applied to the local ordering store before the service
//! confirms them, with exact rollback on rejection.

mod controller;
mod intent;

pub use controller::{MutationController, MutationPhase, PendingReorder, Settlement};
pub use intent::ReorderIntent;
