#![deny(missing_docs)]

//! # Insertion-Point Locator
//!
//! Finds the module descriptor a new unit belongs to, and the byte offsets
//! at which a descriptor's collections and imports can be extended.

use crate::descriptor::ast::ArrayLit;
use crate::descriptor::ModuleDescriptor;
use crate::error::{AppError, AppResult};
use crate::patcher::{TextInsertion, Tree};
use crate::paths::{basename, dirname, join_path, normalize_path};
use regex::Regex;
use std::sync::OnceLock;

fn module_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.module\.ts$").expect("Invalid regex constant"))
}

fn routing_module_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-routing\.module\.ts$").expect("Invalid regex constant"))
}

/// True for `*.module.ts` files that are not `*-routing.module.ts`.
pub fn is_module_file(name: &str) -> bool {
    module_file_re().is_match(name) && !routing_module_re().is_match(name)
}

/// Searches `start_directory` and then each parent for a module descriptor.
///
/// The nearest directory holding exactly one candidate wins.
///
/// # Arguments
///
/// * `tree` - The file tree to search.
/// * `start_directory` - Absolute directory to start from. It need not exist yet.
///
/// # Returns
///
/// * `AppResult<String>` - The absolute path of the descriptor.
pub fn locate_module_file(tree: &impl Tree, start_directory: &str) -> AppResult<String> {
    let mut dir = Some(normalize_path(start_directory)?);

    while let Some(current) = dir {
        let candidates: Vec<String> = tree
            .list_dir(&current)?
            .into_iter()
            .filter(|name| is_module_file(name))
            .collect();

        match candidates.as_slice() {
            [] => {}
            [only] => {
                let found = join_path(&current, only)?;
                tracing::debug!(module = %found, "Located module descriptor");
                return Ok(found);
            }
            _ => return Err(AppError::MultipleModules(current)),
        }

        dir = dirname(&current)?;
    }

    Err(AppError::ModuleNotFound(start_directory.to_string()))
}

/// Resolves an explicit `module` option against `base_directory`.
///
/// Tries, in order: the path itself, with `.ts`, with `.module.ts`, and
/// `<path>/<basename>.module.ts`.
pub fn resolve_module_option(
    tree: &impl Tree,
    base_directory: &str,
    module: &str,
) -> AppResult<String> {
    let module_path = join_path(base_directory, module)?;
    let name = basename(&module_path).to_string();

    let candidates = [
        module_path.clone(),
        format!("{}.ts", module_path),
        format!("{}.module.ts", module_path),
        format!("{}/{}.module.ts", module_path, name),
    ];

    candidates
        .into_iter()
        .find(|candidate| tree.exists(candidate))
        .ok_or_else(|| AppError::FileNotFound(module_path))
}

/// How an [`InsertionPoint`] must render its entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertionKind {
    /// Inside an empty list, right after `[`.
    EmptyList,
    /// After the last element of a non-empty list.
    AfterElement {
        /// The list already ends with a comma; the offset is just past it.
        trailing_comma: bool,
        /// Element indentation when the list spans several lines.
        indent: Option<String>,
    },
    /// A new `key: [entry]` property right after the metadata `{`.
    NewProperty {
        /// Property key to create.
        key: String,
        /// Property indentation when the object spans several lines.
        indent: Option<String>,
        /// Whether other properties follow.
        has_siblings: bool,
    },
}

/// Where and how to extend a collection literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionPoint {
    /// Byte offset into the descriptor text.
    pub offset: usize,
    /// True when the collection property does not exist and must be created.
    pub needs_creation: bool,
    /// Layout information for rendering.
    pub kind: InsertionKind,
}

impl InsertionPoint {
    /// Renders the text that adds `entry` at this point.
    pub fn render(&self, entry: &str) -> String {
        match &self.kind {
            InsertionKind::EmptyList => entry.to_string(),
            InsertionKind::AfterElement {
                trailing_comma: false,
                indent: None,
            } => format!(", {}", entry),
            InsertionKind::AfterElement {
                trailing_comma: false,
                indent: Some(indent),
            } => format!(",\n{}{}", indent, entry),
            InsertionKind::AfterElement {
                trailing_comma: true,
                indent: None,
            } => format!(" {},", entry),
            InsertionKind::AfterElement {
                trailing_comma: true,
                indent: Some(indent),
            } => format!("\n{}{},", indent, entry),
            InsertionKind::NewProperty {
                key,
                indent: Some(indent),
                ..
            } => format!("\n{}{}: [{}],", indent, key, entry),
            InsertionKind::NewProperty {
                key,
                indent: None,
                has_siblings: true,
            } => format!(" {}: [{}],", key, entry),
            InsertionKind::NewProperty {
                key,
                indent: None,
                has_siblings: false,
            } => format!(" {}: [{}] ", key, entry),
        }
    }

    /// Convenience for building the insertion directly.
    pub fn insertion(&self, entry: &str) -> TextInsertion {
        TextInsertion::new(self.offset, self.render(entry))
    }
}

/// Returns the indentation of the line `offset` sits on, if the text between
/// `open` and `offset` contains a line break.
fn detect_indent(source: &str, open: usize, offset: usize) -> Option<String> {
    let between = &source[open..offset];
    let line_start = between.rfind('\n')? + 1;
    let indent: String = between[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();
    Some(indent)
}

fn list_insertion_point(source: &str, list: &ArrayLit) -> InsertionPoint {
    let Some(first) = list.elements.first() else {
        return InsertionPoint {
            offset: list.open() + 1,
            needs_creation: false,
            kind: InsertionKind::EmptyList,
        };
    };

    let indent = detect_indent(source, list.open(), first.span().start);
    let (offset, trailing_comma) = match list.trailing_comma {
        Some(after_comma) => (after_comma, true),
        None => match list.elements.last() {
            Some(last) => (last.span().end, false),
            None => (list.open() + 1, false),
        },
    };

    InsertionPoint {
        offset,
        needs_creation: false,
        kind: InsertionKind::AfterElement {
            trailing_comma,
            indent,
        },
    }
}

/// Finds where to extend the metadata collection named `collection_name`.
///
/// If the property is missing, the point sits right after the metadata `{`
/// and `needs_creation` is set.
///
/// # Arguments
///
/// * `descriptor` - The parsed module descriptor.
/// * `collection_name` - Metadata key such as `declarations` or `exports`.
///
/// # Examples
/// ```
/// use modreg_core::descriptor::ModuleDescriptor;
/// use modreg_core::locator::find_collection_insertion_point;
///
/// let src = "@NgModule({ declarations: [A] }) export class M {}";
/// let d = ModuleDescriptor::parse(src).unwrap();
/// let point = find_collection_insertion_point(&d, "declarations").unwrap();
///
/// let mut out = src.to_string();
/// out.insert_str(point.offset, &point.render("B"));
/// assert!(out.contains("declarations: [A, B]"));
/// ```
pub fn find_collection_insertion_point(
    descriptor: &ModuleDescriptor,
    collection_name: &str,
) -> AppResult<InsertionPoint> {
    let source = descriptor.source();

    if let Some(list) = descriptor.collection(collection_name)? {
        let point = list_insertion_point(source, list);
        tracing::debug!(
            collection = collection_name,
            offset = point.offset,
            "Found collection"
        );
        return Ok(point);
    }

    let metadata = descriptor.metadata();
    let open = metadata.open();
    let indent = metadata
        .properties
        .first()
        .and_then(|p| detect_indent(source, open, p.span.start))
        .or_else(|| {
            // Empty object spanning several lines: `{\n}`
            let inner = &source[open + 1..metadata.close()];
            (metadata.properties.is_empty() && inner.contains('\n')).then(|| "  ".to_string())
        });

    tracing::debug!(
        collection = collection_name,
        offset = open + 1,
        "Collection missing; it will be created"
    );

    Ok(InsertionPoint {
        offset: open + 1,
        needs_creation: true,
        kind: InsertionKind::NewProperty {
            key: collection_name.to_string(),
            indent,
            has_siblings: !metadata.properties.is_empty(),
        },
    })
}

/// Builds the insertion that imports `symbol` from `specifier`.
///
/// Returns `None` when `symbol` is already imported. An existing named import
/// from the same specifier is extended; otherwise a new statement is placed
/// after the last top-level import (or at the top of the file).
pub fn import_insertion(
    descriptor: &ModuleDescriptor,
    symbol: &str,
    specifier: &str,
) -> Option<TextInsertion> {
    if descriptor.imports_symbol(symbol) {
        return None;
    }

    let imports = descriptor.imports();

    if let Some(end) = imports
        .iter()
        .filter(|i| i.specifier == specifier && !i.type_only)
        .find_map(|i| i.named_last_end)
    {
        return Some(TextInsertion::new(end, format!(", {}", symbol)));
    }

    let quote = imports.last().map_or('\'', |i| i.quote);
    let statement = format!(
        "import {{ {} }} from {q}{}{q};",
        symbol,
        specifier,
        q = quote
    );

    Some(match imports.last() {
        Some(last) => TextInsertion::new(last.span.end, format!("\n{}", statement)),
        None => TextInsertion::new(0, format!("{}\n", statement)),
    })
}
