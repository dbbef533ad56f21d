#![deny(missing_docs)]

//! # Path Resolver
//!
//! Path and naming helpers shared by the locator and the orchestrator.
//!
//! All paths handled here are `/`-separated strings. Backslashes are accepted on
//! input and normalized away, so a Windows path such as `C:\src\app` becomes
//! `C:/src/app`.

use crate::error::{AppError, AppResult};
use heck::ToKebabCase;

/// Script extensions removed from import specifiers.
const SCRIPT_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".mjs"];

/// A unit name split from the directory it should be generated in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// The bare unit name (no directory part).
    pub name: String,
    /// The normalized absolute directory.
    pub path: String,
}

/// Returns true when the path is absolute (`/...` or a drive prefix like `C:/...`).
pub fn is_absolute(path: &str) -> bool {
    let path = path.replace('\\', "/");
    path.starts_with('/') || drive_prefix(&path).is_some()
}

fn drive_prefix(path: &str) -> Option<&str> {
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
    {
        Some(&path[..3])
    } else {
        None
    }
}

/// Splits an absolute path into its root prefix and its resolved segments.
fn split_absolute(path: &str) -> AppResult<(String, Vec<String>)> {
    let unified = path.replace('\\', "/");
    let (prefix, rest) = if unified.starts_with('/') {
        ("/".to_string(), &unified[1..])
    } else if let Some(drive) = drive_prefix(&unified) {
        (drive.to_string(), &unified[3..])
    } else {
        return Err(AppError::InvalidPath(format!(
            "'{}' is not an absolute path",
            path
        )));
    };

    let mut segments: Vec<String> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(AppError::InvalidPath(format!(
                        "'{}' escapes the filesystem root",
                        path
                    )));
                }
            }
            other => segments.push(other.to_string()),
        }
    }

    Ok((prefix, segments))
}

fn assemble(prefix: &str, segments: &[String]) -> String {
    format!("{}{}", prefix, segments.join("/"))
}

/// Normalizes an absolute path: unifies separators and resolves `.` / `..`.
///
/// # Examples
/// ```
/// use modreg_core::paths::normalize_path;
///
/// assert_eq!(normalize_path("/src/./app/../lib/").unwrap(), "/src/lib");
/// assert_eq!(normalize_path("C:\\src\\app").unwrap(), "C:/src/app");
/// ```
pub fn normalize_path(path: &str) -> AppResult<String> {
    let (prefix, segments) = split_absolute(path)?;
    Ok(assemble(&prefix, &segments))
}

/// Joins `child` onto the absolute `base` and normalizes the result.
///
/// An absolute `child` replaces `base` entirely.
pub fn join_path(base: &str, child: &str) -> AppResult<String> {
    if is_absolute(child) {
        return normalize_path(child);
    }
    normalize_path(&format!("{}/{}", base.replace('\\', "/"), child))
}

/// Returns the parent directory of an absolute path, or `None` at the root.
pub fn dirname(path: &str) -> AppResult<Option<String>> {
    let (prefix, mut segments) = split_absolute(path)?;
    if segments.pop().is_none() {
        return Ok(None);
    }
    Ok(Some(assemble(&prefix, &segments)))
}

/// Returns the last segment of a path.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Removes a trailing script extension (`.ts`, `.tsx`, `.js`, `.mjs`).
pub fn strip_script_extension(path: &str) -> &str {
    SCRIPT_EXTENSIONS
        .iter()
        .find_map(|ext| path.strip_suffix(ext))
        .unwrap_or(path)
}

/// Computes the import specifier pointing from `from_file` to `to_file`.
///
/// Both inputs must be absolute. The result is relative to the directory of
/// `from_file`, always starts with `./` or `../`, and carries no script extension.
///
/// # Arguments
///
/// * `from_file` - The file that will contain the import (e.g. the module descriptor).
/// * `to_file` - The file being imported.
///
/// # Examples
/// ```
/// use modreg_core::paths::compute_relative_path;
///
/// let rel = compute_relative_path(
///     "/src/app/core/core.module.ts",
///     "/src/app/core/side-menu/side-menu.component.ts",
/// ).unwrap();
/// assert_eq!(rel, "./side-menu/side-menu.component");
/// ```
pub fn compute_relative_path(from_file: &str, to_file: &str) -> AppResult<String> {
    let (from_prefix, mut from_dir) = split_absolute(from_file)?;
    let (to_prefix, to_segments) = split_absolute(to_file)?;

    if !from_prefix.eq_ignore_ascii_case(&to_prefix) {
        return Err(AppError::InvalidPath(format!(
            "'{}' and '{}' do not share a root",
            from_file, to_file
        )));
    }

    // The import is resolved against the directory holding `from_file`.
    from_dir.pop();

    let common = from_dir
        .iter()
        .zip(to_segments.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let ups = from_dir.len() - common;
    let mut parts: Vec<&str> = std::iter::repeat("..").take(ups).collect();
    parts.extend(to_segments[common..].iter().map(String::as_str));

    let joined = parts.join("/");
    let relative = if ups > 0 {
        joined
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        format!("./{}", joined)
    };

    Ok(strip_script_extension(&relative).to_string())
}

/// Converts an identifier into its canonical type-name form.
///
/// Separators (`-`, `_`, `.`, whitespace) are removed and every segment is
/// capitalized. Applying it twice yields the same result as applying it once.
///
/// # Examples
/// ```
/// use modreg_core::paths::canonicalize_type_name;
///
/// assert_eq!(canonicalize_type_name("side-menu"), "SideMenu");
/// assert_eq!(canonicalize_type_name("SideMenu"), "SideMenu");
/// ```
pub fn canonicalize_type_name(raw: &str) -> String {
    // Unlike `heck`'s camel case, inner capitals are kept as written
    // (`HTTPClient` stays `HTTPClient`), which keeps the conversion idempotent.
    raw.split(|c: char| c == '-' || c == '_' || c == '.' || c.is_whitespace())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Converts an identifier into its dashed file-name form (`SideMenu` -> `side-menu`).
pub fn dasherize(raw: &str) -> String {
    raw.to_kebab_case()
}

/// Splits a possibly nested unit name (`admin/side-menu`) from its directory.
///
/// The directory part of the name is appended to `path`, which must be absolute.
pub fn parse_name(path: &str, name: &str) -> AppResult<Location> {
    let full = join_path(path, name.trim_start_matches(['/', '\\']))?;
    let bare = basename(&full).to_string();
    if bare.is_empty() {
        return Err(AppError::InvalidPath(format!(
            "'{}' does not name a unit",
            name
        )));
    }
    let dir = dirname(&full)?.unwrap_or_else(|| full.clone());
    Ok(Location {
        name: bare,
        path: dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_resolves_dots() {
        assert_eq!(normalize_path("/a/b/../c/./d").unwrap(), "/a/c/d");
        assert_eq!(normalize_path("/").unwrap(), "/");
        assert_eq!(normalize_path("//a//b/").unwrap(), "/a/b");
    }

    #[test]
    fn test_normalize_rejects_relative_and_escape() {
        assert!(matches!(
            normalize_path("src/app"),
            Err(AppError::InvalidPath(_))
        ));
        assert!(matches!(
            normalize_path("/a/../../b"),
            Err(AppError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_relative_same_directory() {
        let rel = compute_relative_path("/src/app/app.module.ts", "/src/app/app.component.ts")
            .unwrap();
        assert_eq!(rel, "./app.component");
    }

    #[test]
    fn test_relative_ancestor_directory() {
        let rel = compute_relative_path(
            "/src/app/core/core.module.ts",
            "/src/app/shared/button/button.component",
        )
        .unwrap();
        assert_eq!(rel, "../shared/button/button.component");

        let rel = compute_relative_path("/src/app/a/b/c.module.ts", "/src/x.ts").unwrap();
        assert_eq!(rel, "../../../x");
    }

    #[test]
    fn test_relative_normalizes_separators() {
        let rel = compute_relative_path(
            "C:\\work\\src\\app\\app.module.ts",
            "C:/work/src/app/menu/menu.component.ts",
        )
        .unwrap();
        assert_eq!(rel, "./menu/menu.component");
    }

    #[test]
    fn test_relative_rejects_non_absolute() {
        let err = compute_relative_path("src/app.module.ts", "/src/a.ts").unwrap_err();
        assert!(matches!(err, AppError::InvalidPath(_)));
        let err = compute_relative_path("/src/app.module.ts", "a.ts").unwrap_err();
        assert!(matches!(err, AppError::InvalidPath(_)));
    }

    #[test]
    fn test_relative_round_trip() {
        let pairs = [
            ("/src/app/app.module.ts", "/src/app/menu/menu.component"),
            ("/src/app/core/core.module.ts", "/src/app/core.service"),
            ("/src/app/a/b/c.module.ts", "/lib/shared/util"),
            ("/m.module.ts", "/deep/er/file"),
            ("/src/app/x.module.ts", "/src/app/y"),
        ];
        for (from, to) in pairs {
            let rel = compute_relative_path(from, to).unwrap();
            let dir = dirname(from).unwrap().unwrap();
            assert_eq!(join_path(&dir, &rel).unwrap(), to, "{} -> {}", from, to);
        }
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        for raw in ["side-menu", "user_profile", "a.b.c", "HTTPClient", "menu2", "x"] {
            let once = canonicalize_type_name(raw);
            assert_eq!(canonicalize_type_name(&once), once, "input {}", raw);
        }
        assert_eq!(canonicalize_type_name("user_profile"), "UserProfile");
        assert_eq!(canonicalize_type_name("a.b.c"), "ABC");
        assert_eq!(canonicalize_type_name("HTTPClient"), "HTTPClient");
    }

    #[test]
    fn test_dasherize() {
        assert_eq!(dasherize("SideMenu"), "side-menu");
        assert_eq!(dasherize("side_menu"), "side-menu");
        assert_eq!(dasherize("side-menu"), "side-menu");
    }

    #[test]
    fn test_parse_name_moves_directory() {
        let loc = parse_name("/src/app", "admin/side-menu").unwrap();
        assert_eq!(loc.name, "side-menu");
        assert_eq!(loc.path, "/src/app/admin");

        let loc = parse_name("/src/app", "side-menu").unwrap();
        assert_eq!(loc.path, "/src/app");
    }

    #[test]
    fn test_strip_script_extension() {
        assert_eq!(strip_script_extension("./a.component.ts"), "./a.component");
        assert_eq!(strip_script_extension("./a.component"), "./a.component");
    }
}
