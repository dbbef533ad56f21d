#![deny(missing_docs)]

//! # Registration Orchestrator
//!
//! Registers a generated unit with its module descriptor: adds the import,
//! the `declarations` entry and, on request, the `exports` entry.
//!
//! Each collection is updated in its own transaction together with the
//! import it needs, so a failure never leaves an import without its entry.

use crate::descriptor::ModuleDescriptor;
use crate::error::{AppError, AppResult};
use crate::locator::{
    find_collection_insertion_point, import_insertion, locate_module_file, resolve_module_option,
};
use crate::options::RegistrationOptions;
use crate::patcher::Tree;
use crate::paths::{
    canonicalize_type_name, compute_relative_path, dasherize, join_path, parse_name,
};
use std::fmt::Display;

/// Metadata key listing the units a module declares.
pub const DECLARATIONS: &str = "declarations";

/// Metadata key listing the units a module makes visible to importers.
pub const EXPORTS: &str = "exports";

/// A fully resolved registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    /// Absolute path of the module descriptor to patch.
    pub target_file_path: String,
    /// Raw unit name (`side-menu`).
    pub unit_name: String,
    /// Unit type (`component`), appended to the class name.
    pub unit_kind: String,
    /// Absolute path of the unit's source file, without extension.
    pub unit_source_location: String,
    /// The collection to register with first.
    pub collection_name: String,
    /// Whether to also add the unit to `exports`.
    pub export: bool,
}

impl RegistrationRequest {
    /// The class name the unit is registered under (`SideMenuComponent`).
    pub fn symbol(&self) -> String {
        format!(
            "{}{}",
            canonicalize_type_name(&self.unit_name),
            canonicalize_type_name(&self.unit_kind)
        )
    }
}

/// What happened to one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    /// The entry was added.
    Registered,
    /// The entry was already listed; nothing was written.
    AlreadyPresent,
}

/// The result of registering with one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    /// Collection key.
    pub collection: String,
    /// Registered class name.
    pub symbol: String,
    /// Descriptor path.
    pub module_path: String,
    /// Outcome.
    pub status: RegistrationStatus,
}

impl Display for RegistrationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            RegistrationStatus::Registered => write!(
                f,
                "Added {} to {} in {}",
                self.symbol, self.collection, self.module_path
            ),
            RegistrationStatus::AlreadyPresent => write!(
                f,
                "{} is already listed in {} of {}",
                self.symbol, self.collection, self.module_path
            ),
        }
    }
}

/// Registers a unit with the request's collection and, if asked, with `exports`.
///
/// # Arguments
///
/// * `tree` - The file tree holding the descriptor.
/// * `request` - The resolved registration.
///
/// # Returns
///
/// * One outcome per collection touched, in order.
pub fn register_unit(
    tree: &mut impl Tree,
    request: &RegistrationRequest,
) -> AppResult<Vec<RegistrationOutcome>> {
    let mut outcomes = vec![register_in_collection(
        tree,
        request,
        &request.collection_name,
    )?];

    if request.export && request.collection_name != EXPORTS {
        // Re-reads the file, so offsets reflect the first commit.
        outcomes.push(register_in_collection(tree, request, EXPORTS)?);
    }

    Ok(outcomes)
}

fn register_in_collection(
    tree: &mut impl Tree,
    request: &RegistrationRequest,
    collection: &str,
) -> AppResult<RegistrationOutcome> {
    let target = request.target_file_path.as_str();
    if !tree.exists(target) {
        return Err(AppError::FileNotFound(target.to_string()));
    }

    let symbol = request.symbol();
    let specifier = compute_relative_path(target, &request.unit_source_location)?;

    let mut tx = tree.begin_update(target)?;
    let descriptor = ModuleDescriptor::parse(tx.original())?;

    let listed = descriptor
        .collection(collection)?
        .is_some_and(|list| list.contains_symbol(&symbol));
    let point = find_collection_insertion_point(&descriptor, collection)?;

    if let Some(import) = import_insertion(&descriptor, &symbol, &specifier) {
        tx.insert(import.offset, import.text);
    }

    if listed {
        tracing::debug!(symbol = %symbol, collection, "Entry already present");
    } else {
        let entry = point.insertion(&symbol);
        tx.insert(entry.offset, entry.text);
    }

    tx.commit()?;

    Ok(RegistrationOutcome {
        collection: collection.to_string(),
        symbol,
        module_path: target.to_string(),
        status: if listed {
            RegistrationStatus::AlreadyPresent
        } else {
            RegistrationStatus::Registered
        },
    })
}

/// Turns caller options into a resolved request.
///
/// Returns `None` when `skip_import` is set.
pub fn plan_registration(
    tree: &impl Tree,
    options: &RegistrationOptions,
) -> AppResult<Option<RegistrationRequest>> {
    options.validate()?;
    if options.skip_import {
        return Ok(None);
    }

    let base = join_path(&options.source_directory, &options.path)?;
    let location = parse_name(&base, &options.name)?;

    let file_stem = dasherize(&location.name);
    let kind = dasherize(&options.kind);
    let unit_dir = if options.flat {
        location.path.clone()
    } else {
        join_path(&location.path, &file_stem)?
    };
    let unit_source_location = format!(
        "{}/{}.{}",
        unit_dir.trim_end_matches('/'),
        file_stem,
        kind
    );

    let target_file_path = match &options.module {
        Some(module) => resolve_module_option(tree, &location.path, module)?,
        None => locate_module_file(tree, &unit_dir)?,
    };

    tracing::debug!(
        unit = %unit_source_location,
        module = %target_file_path,
        "Planned registration"
    );

    Ok(Some(RegistrationRequest {
        target_file_path,
        unit_name: location.name,
        unit_kind: kind,
        unit_source_location,
        collection_name: DECLARATIONS.to_string(),
        export: options.export,
    }))
}

/// Plans and performs a registration in one step.
///
/// # Examples
/// ```
/// use modreg_core::patcher::{MemoryTree, Tree};
/// use modreg_core::{add_unit_to_module, RegistrationOptions};
///
/// let mut tree = MemoryTree::new().with_file(
///     "/src/app/app.module.ts",
///     "@NgModule({ declarations: [] }) export class AppModule {}",
/// );
/// let mut options = RegistrationOptions::new("side-menu", "/src");
/// options.path = "app".into();
///
/// add_unit_to_module(&mut tree, &options).unwrap();
/// let out = tree.read("/src/app/app.module.ts").unwrap();
/// assert!(out.contains("declarations: [SideMenuComponent]"));
/// ```
pub fn add_unit_to_module(
    tree: &mut impl Tree,
    options: &RegistrationOptions,
) -> AppResult<Vec<RegistrationOutcome>> {
    match plan_registration(&*tree, options)? {
        Some(request) => register_unit(tree, &request),
        None => {
            tracing::info!(name = %options.name, "Skipping module registration");
            Ok(Vec::new())
        }
    }
}
