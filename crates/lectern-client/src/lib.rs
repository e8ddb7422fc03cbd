//! Rust client for the Lectern content service REST API
//!
//! Covers the endpoints the course ordering and progression core needs:
//! module/lesson/quiz listing, sibling reorders, completion records and
//! quiz submission.
//!
//! # Example
//!
//! ```rust,no_run
//! use lectern_client::{ClientConfig, ContentClient, OrderEntry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ContentClient::new(ClientConfig {
//!     base_url: "http://localhost:5000/api".into(),
//!     api_key: Some("session-token".into()),
//!     ..Default::default()
//! })?;
//!
//! client
//!     .reorder_lessons("module-1", &[OrderEntry::new("l2", 0), OrderEntry::new("l1", 1)])
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod types;

// Re-export main types
pub use client::ContentClient;
pub use error::{ClientError, Result};
pub use types::*;
