use crate::error::{AppError, AppResult};
use crate::patcher::transaction::UpdateTransaction;
use crate::paths::{basename, dirname, normalize_path};
use indexmap::IndexMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The file tree the engine reads descriptors from and writes them back to.
///
/// Paths are absolute, `/`-separated strings.
pub trait Tree {
    /// True if `path` names an existing file.
    fn exists(&self, path: &str) -> bool;

    /// Reads a whole file as UTF-8.
    fn read(&self, path: &str) -> AppResult<String>;

    /// Replaces the content of `path`. Either the whole content is written or
    /// the previous content is kept.
    fn overwrite(&mut self, path: &str, content: &str) -> AppResult<()>;

    /// Names of the files directly inside `dir`, sorted.
    ///
    /// A directory that does not exist yields an empty list.
    fn list_dir(&self, dir: &str) -> AppResult<Vec<String>>;

    /// Opens an update transaction over `path`.
    fn begin_update(&mut self, path: &str) -> AppResult<UpdateTransaction<'_, Self>>
    where
        Self: Sized,
    {
        UpdateTransaction::begin(self, path)
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskTree;

impl Tree for DiskTree {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn read(&self, path: &str) -> AppResult<String> {
        fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::FileNotFound(path.to_string()),
            _ => AppError::Io(e),
        })
    }

    fn overwrite(&mut self, path: &str, content: &str) -> AppResult<()> {
        // Symlinks are written through, not replaced.
        let target = fs::canonicalize(path).unwrap_or_else(|_| PathBuf::from(path));
        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Write next to the target, then rename over it.
        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        staged.write_all(content.as_bytes())?;
        if let Ok(metadata) = fs::metadata(&target) {
            staged.as_file().set_permissions(metadata.permissions())?;
        }
        staged.as_file().sync_all()?;
        staged.persist(&target).map_err(|e| AppError::Io(e.error))?;
        Ok(())
    }

    fn list_dir(&self, dir: &str) -> AppResult<Vec<String>> {
        if !Path::new(dir).is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in WalkDir::new(dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1) {
            let entry = entry.map_err(|e| {
                AppError::General(format!("Failed to list directory '{}': {}", dir, e))
            })?;
            if entry.file_type().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn tree_key(path: &str) -> String {
    normalize_path(path).unwrap_or_else(|_| path.to_string())
}

fn files_in<'a>(keys: impl Iterator<Item = &'a String>, dir: &str) -> Vec<String> {
    let dir = tree_key(dir);
    keys.filter(|key| dirname(key).ok().flatten().as_deref() == Some(dir.as_str()))
        .map(|key| basename(key).to_string())
        .collect()
}

/// An in-memory tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTree {
    files: IndexMap<String, String>,
}

impl MemoryTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.insert(path, content);
        self
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: &str, content: &str) {
        self.files.insert(tree_key(path), content.to_string());
    }

    /// Returns a file's content.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(&tree_key(path)).map(String::as_str)
    }

}

impl Tree for MemoryTree {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(&tree_key(path))
    }

    fn read(&self, path: &str) -> AppResult<String> {
        self.get(path)
            .map(str::to_string)
            .ok_or_else(|| AppError::FileNotFound(path.to_string()))
    }

    fn overwrite(&mut self, path: &str, content: &str) -> AppResult<()> {
        self.insert(path, content);
        Ok(())
    }

    fn list_dir(&self, dir: &str) -> AppResult<Vec<String>> {
        let mut names = files_in(self.files.keys(), dir);
        names.sort();
        Ok(names)
    }
}

/// Reads through to a base tree while keeping every write in memory.
///
/// Used for dry runs: the base tree is never modified.
#[derive(Debug, Clone, Default)]
pub struct OverlayTree<T: Tree> {
    base: T,
    changes: IndexMap<String, String>,
}

impl<T: Tree> OverlayTree<T> {
    /// Wraps `base`.
    pub fn new(base: T) -> Self {
        Self {
            base,
            changes: IndexMap::new(),
        }
    }

    /// Files written through the overlay, with their new content.
    pub fn changes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.changes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The wrapped tree.
    pub fn base(&self) -> &T {
        &self.base
    }
}

impl<T: Tree> Tree for OverlayTree<T> {
    fn exists(&self, path: &str) -> bool {
        self.changes.contains_key(&tree_key(path)) || self.base.exists(path)
    }

    fn read(&self, path: &str) -> AppResult<String> {
        match self.changes.get(&tree_key(path)) {
            Some(content) => Ok(content.clone()),
            None => self.base.read(path),
        }
    }

    fn overwrite(&mut self, path: &str, content: &str) -> AppResult<()> {
        self.changes.insert(tree_key(path), content.to_string());
        Ok(())
    }

    fn list_dir(&self, dir: &str) -> AppResult<Vec<String>> {
        let mut names = self.base.list_dir(dir)?;
        for name in files_in(self.changes.keys(), dir) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
