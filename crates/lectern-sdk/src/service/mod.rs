//! Content service abstraction layer.
//!
//! Provides a trait-based interface over the remote content service:
//! - HTTP (`lectern_client::ContentClient`)
//! - In-memory mock for testing

pub mod http;
pub mod mock;
pub mod traits;

pub use mock::{MockContentService, ReorderBehavior};
pub use traits::ContentService;
