#![deny(missing_docs)]

//! # modreg Core
//!
//! Registers generated units (components, directives, pipes) with the
//! `@NgModule` descriptor that owns them, by parsing the descriptor and
//! patching it in place.

/// Shared error types.
pub mod error;

/// Path and naming helpers.
pub mod paths;

/// Module descriptor parsing.
pub mod descriptor;

/// Module lookup and insertion points.
pub mod locator;

/// Text insertions, transactions and file trees.
pub mod patcher;

/// Registration options and their schema.
pub mod options;

/// Registration orchestration.
pub mod registration;

pub use descriptor::ModuleDescriptor;
pub use error::{AppError, AppResult};
pub use locator::{
    find_collection_insertion_point, locate_module_file, resolve_module_option, InsertionPoint,
};
pub use options::{options_schema, OptionSchema, RegistrationOptions};
pub use patcher::{ChangeSet, DiskTree, MemoryTree, OverlayTree, TextInsertion, Tree};
pub use paths::{canonicalize_type_name, compute_relative_path};
pub use registration::{
    add_unit_to_module, plan_registration, register_unit, RegistrationOutcome,
    RegistrationRequest, RegistrationStatus,
};
