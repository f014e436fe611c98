//! # dms-core
//!
//! Core types, traits, and abstractions for metadata-template (MDT) driven
//! document indexing and search.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the form, search and storage crates depend on.

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod search;
pub mod temporal;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::DmsConfig;
pub use error::{Error, Result};
pub use models::*;
pub use search::{FieldPredicate, SearchPredicateSet};
pub use temporal::DateRange;
pub use traits::*;
