//! Lectern SDK - course content ordering and progression core
//!
//! Client-side core for a course player and its authoring views.
//!
//! # Architecture
//!
//! - **Ordering**: one [`OrderingStore`] per sibling set (the modules of a
//!   course, the lessons of a module), with snapshot/restore
//! - **Mutation**: optimistic reorders with exact rollback and at most one
//!   request in flight per sibling set
//! - **Progression**: sequential gating of lessons and quizzes for a learner
//! - **Hierarchy**: [`ContentCoordinator`] ties the three together over a
//!   [`ContentService`]
//!
//! The content service stays authoritative for ordering and for gating;
//! everything evaluated here is a preview the service may overrule.
//!
//! # Example
//!
//! ```rust,ignore
//! use lectern_sdk::{ContentClient, ContentCoordinator, LecternConfig};
//! use std::sync::Arc;
//!
//! let config = LecternConfig::load("lectern.toml")?;
//! let client = Arc::new(ContentClient::new(config.service.clone())?);
//! let coordinator = ContentCoordinator::with_config(client, config.coordinator);
//!
//! coordinator.load_hierarchy("course-1").await?;
//! coordinator.reorder_lessons("module-1", ["l2", "l1", "l3"]).await?;
//!
//! let progress = coordinator.annotate_progression("user-1").await?;
//! ```

// Configuration
pub mod config;

// Error types
pub mod error;

// Domain model
pub mod model;

// Sibling-set ordering
pub mod ordering;

// Optimistic reorders
pub mod mutation;

// Sequential gating
pub mod progression;

// Hierarchy coordinator
pub mod hierarchy;

// Content service seam
pub mod service;

pub use config::{CoordinatorConfig, LecternConfig};
pub use error::{Result, SdkError};
pub use hierarchy::{ContentCoordinator, QuizOutcome, ReorderOutcome};
pub use model::{CourseOutline, Lesson, Module, ModuleOutline, Quiz, SiblingKey, SiblingScope};
pub use mutation::{MutationController, MutationPhase, PendingReorder, ReorderIntent, Settlement};
pub use ordering::{OrderedEntity, OrderingSnapshot, OrderingStore};
pub use progression::{evaluate, CompletionLedger, NodeRef, NodeState, ProgressionView};
pub use service::{ContentService, MockContentService, ReorderBehavior};

// Re-export from the client crate
pub use lectern_client::{ClientConfig, ClientError, CompletionRecord, ContentClient, QuizAnswer};
