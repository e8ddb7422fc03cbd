//! Course hierarchy coordination

mod coordinator;
mod state;

pub use coordinator::{ContentCoordinator, QuizOutcome, ReorderOutcome};
