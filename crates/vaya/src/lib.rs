//! `vaya` - A family memory keeper
//!
//! This library provides the core functionality for building a family tree,
//! importing and exporting it as spreadsheets, and capturing and
//! transcribing recorded voice memories.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod tree;
pub mod workbook;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use storage::{Store, StoreStats};
pub use tree::{FamilyTree, Member, MemberId, Relationship, RelationshipId, RelationshipKind};
