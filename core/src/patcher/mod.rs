#![deny(missing_docs)]

//! # Code Patching
//!
//! Positional text edits applied to files as one atomic operation.
//!
//! - **tree**: the file tree abstraction (disk, memory, dry-run overlay).
//! - **transaction**: insertions, change sets, and scoped update transactions.

/// File tree implementations.
pub mod tree;

/// Insertions and update transactions.
pub mod transaction;

pub use transaction::{ChangeSet, TextInsertion, UpdateTransaction};
pub use tree::{DiskTree, MemoryTree, OverlayTree, Tree};
