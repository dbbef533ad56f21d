#![deny(missing_docs)]

//! # Register Command
//!
//! Adds a generated unit to its module descriptor.
//!
//! This command:
//! 1. Builds `RegistrationOptions` from an optional options file plus flags.
//! 2. Locates (or resolves) the target module descriptor.
//! 3. Patches the import, `declarations` and optionally `exports`.
//! 4. With `--dry-run`, prints the patched files instead of writing them.

use crate::error::{CliError, CliResult};
use modreg_core::paths::normalize_path;
use modreg_core::patcher::{DiskTree, OverlayTree, Tree};
use modreg_core::{add_unit_to_module, RegistrationOptions, RegistrationOutcome};
use std::path::{Path, PathBuf};

/// Arguments for the register command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RegisterArgs {
    /// Name of the unit (e.g. `side-menu` or `admin/side-menu`).
    #[clap(long)]
    pub name: Option<String>,

    /// Directory of the unit, relative to the source directory.
    #[clap(long)]
    pub path: Option<String>,

    /// Project source directory. Relative paths resolve against the working directory.
    #[clap(long, env = "MODREG_SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,

    /// Module descriptor to register with. Auto-located when omitted.
    #[clap(short = 'm', long)]
    pub module: Option<String>,

    /// Also add the unit to the module's `exports`.
    #[clap(long)]
    pub export: bool,

    /// The unit's files live directly in `--path`.
    #[clap(long)]
    pub flat: bool,

    /// Do not touch any module descriptor.
    #[clap(long)]
    pub skip_import: bool,

    /// Unit type (component, directive, pipe, ...).
    #[clap(long = "type")]
    pub kind: Option<String>,

    /// JSON or YAML file with registration options. Flags override its values.
    #[clap(long)]
    pub options: Option<PathBuf>,

    /// Print the patched files instead of writing them.
    #[clap(long)]
    pub dry_run: bool,
}

impl RegisterArgs {
    /// Merges the options file (if any) with the command-line flags.
    pub fn to_options(&self, cwd: &Path) -> CliResult<RegistrationOptions> {
        let mut options = match &self.options {
            Some(file) => RegistrationOptions::from_file(file)?,
            None => {
                let name = self
                    .name
                    .clone()
                    .ok_or_else(|| CliError::Usage("--name is required".into()))?;
                let source_dir = self.source_dir.as_ref().ok_or_else(|| {
                    CliError::Usage("--source-dir is required".into())
                })?;
                RegistrationOptions::new(name, absolute(cwd, source_dir)?)
            }
        };

        if let Some(name) = &self.name {
            options.name = name.clone();
        }
        if let Some(source_dir) = &self.source_dir {
            options.source_directory = absolute(cwd, source_dir)?;
        }
        if let Some(path) = &self.path {
            options.path = path.clone();
        }
        if let Some(module) = &self.module {
            options.module = Some(module.clone());
        }
        if let Some(kind) = &self.kind {
            options.kind = kind.clone();
        }
        options.export |= self.export;
        options.flat |= self.flat;
        options.skip_import |= self.skip_import;

        options.validate()?;
        Ok(options)
    }
}

fn absolute(cwd: &Path, dir: &Path) -> CliResult<String> {
    let joined = cwd.join(dir);
    Ok(normalize_path(&joined.to_string_lossy())?)
}

/// Executes the registration.
///
/// # Arguments
///
/// * `args` - Command arguments.
pub fn execute(args: &RegisterArgs) -> CliResult<()> {
    let cwd = std::env::current_dir()?;
    let options = args.to_options(&cwd)?;
    tracing::debug!(?options, dry_run = args.dry_run, "Resolved registration options");

    if args.dry_run {
        let mut tree = OverlayTree::new(DiskTree);
        let outcomes = add_unit_to_module(&mut tree, &options)?;
        report(&outcomes);
        print_changes(&tree);
    } else {
        let outcomes = add_unit_to_module(&mut DiskTree, &options)?;
        report(&outcomes);
    }

    Ok(())
}

fn report(outcomes: &[RegistrationOutcome]) {
    if outcomes.is_empty() {
        println!("Module registration skipped.");
    }
    for outcome in outcomes {
        println!("  -> {}", outcome);
    }
}

fn print_changes<T: Tree>(tree: &OverlayTree<T>) {
    for (path, content) in tree.changes() {
        println!("--- {} (dry run) ---", path);
        println!("{}", content);
    }
}
