//! # taskhive-core
//!
//! Core types, traits, and abstractions for the taskhive backend.
//!
//! This crate provides the foundational data structures, the permission
//! evaluator, and the trait definitions that other taskhive crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod permissions;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use pagination::Pagination;
pub use permissions::{can_edit, can_view, is_owner};
pub use traits::*;
