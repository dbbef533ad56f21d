use crate::error::{AppError, AppResult};
use crate::patcher::tree::Tree;

/// A pending insertion of `text` at byte `offset` of the original content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInsertion {
    /// Byte offset into the unmodified text.
    pub offset: usize,
    /// Text to splice in.
    pub text: String,
}

impl TextInsertion {
    /// Creates an insertion.
    pub fn new(offset: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: text.into(),
        }
    }
}

/// An ordered batch of insertions against one original text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    insertions: Vec<TextInsertion>,
}

impl ChangeSet {
    /// Creates an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an insertion.
    pub fn push(&mut self, insertion: TextInsertion) {
        self.insertions.push(insertion);
    }

    /// Number of recorded insertions.
    pub fn len(&self) -> usize {
        self.insertions.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty()
    }

    /// Applies every insertion to `original` and returns the new text.
    ///
    /// All offsets are validated before anything is built, so an invalid
    /// insertion fails the whole batch. The output is assembled in one
    /// ascending pass, which keeps every offset relative to `original`.
    /// Insertions sharing an offset land in recording order.
    ///
    /// # Examples
    /// ```
    /// use modreg_core::patcher::{ChangeSet, TextInsertion};
    ///
    /// let mut changes = ChangeSet::new();
    /// changes.push(TextInsertion::new(2, ", B"));
    /// changes.push(TextInsertion::new(0, "x = "));
    /// assert_eq!(changes.apply("[A]").unwrap(), "x = [A, B]");
    /// assert!(changes.apply("").is_err());
    /// ```
    pub fn apply(&self, original: &str) -> AppResult<String> {
        for insertion in &self.insertions {
            if insertion.offset > original.len() || !original.is_char_boundary(insertion.offset)
            {
                return Err(AppError::General(format!(
                    "Insertion offset {} is not a valid position in a {}-byte text",
                    insertion.offset,
                    original.len()
                )));
            }
        }

        let mut ordered: Vec<&TextInsertion> = self.insertions.iter().collect();
        // Stable: equal offsets keep their recording order.
        ordered.sort_by_key(|i| i.offset);

        let extra: usize = ordered.iter().map(|i| i.text.len()).sum();
        let mut out = String::with_capacity(original.len() + extra);
        let mut cursor = 0;
        for insertion in ordered {
            out.push_str(&original[cursor..insertion.offset]);
            out.push_str(&insertion.text);
            cursor = insertion.offset;
        }
        out.push_str(&original[cursor..]);

        Ok(out)
    }
}

/// A scoped edit of one file.
///
/// Insertions are only recorded; the file is rewritten by [`commit`](Self::commit)
/// in a single write. Dropping the transaction discards it.
pub struct UpdateTransaction<'t, T: Tree> {
    tree: &'t mut T,
    path: String,
    original: String,
    changes: ChangeSet,
    finished: bool,
}

impl<'t, T: Tree> UpdateTransaction<'t, T> {
    /// Reads `path` from `tree` and opens a transaction over its content.
    pub fn begin(tree: &'t mut T, path: &str) -> AppResult<Self> {
        if !tree.exists(path) {
            return Err(AppError::FileNotFound(path.to_string()));
        }
        let original = tree.read(path)?;
        Ok(Self {
            tree,
            path: path.to_string(),
            original,
            changes: ChangeSet::new(),
            finished: false,
        })
    }

    /// The content as it was when the transaction began.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Records an insertion at `offset` of the original content.
    pub fn insert(&mut self, offset: usize, text: impl Into<String>) -> &mut Self {
        self.changes.push(TextInsertion::new(offset, text));
        self
    }

    /// Materializes the recorded insertions and writes the file back.
    ///
    /// Returns `false` without touching the file when nothing was recorded.
    /// On error the file is left exactly as it was.
    pub fn commit(mut self) -> AppResult<bool> {
        self.finished = true;
        if self.changes.is_empty() {
            return Ok(false);
        }
        let updated = self.changes.apply(&self.original)?;
        self.tree.overwrite(&self.path, &updated)?;
        tracing::info!(
            path = %self.path,
            insertions = self.changes.len(),
            "Committed update"
        );
        Ok(true)
    }

    /// Drops all recorded insertions without writing.
    pub fn discard(mut self) {
        self.finished = true;
    }
}

impl<T: Tree> Drop for UpdateTransaction<'_, T> {
    fn drop(&mut self) {
        if !self.finished && !self.changes.is_empty() {
            tracing::debug!(
                path = %self.path,
                insertions = self.changes.len(),
                "Discarding uncommitted update"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patcher::tree::MemoryTree;

    struct FailingTree {
        inner: MemoryTree,
    }

    impl Tree for FailingTree {
        fn exists(&self, path: &str) -> bool {
            self.inner.exists(path)
        }

        fn read(&self, path: &str) -> AppResult<String> {
            self.inner.read(path)
        }

        fn overwrite(&mut self, _path: &str, _content: &str) -> AppResult<()> {
            Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }

        fn list_dir(&self, dir: &str) -> AppResult<Vec<String>> {
            self.inner.list_dir(dir)
        }
    }

    #[test]
    fn test_apply_is_offset_stable() {
        let original = "import A;\n@M({ declarations: [] })";
        let list_open = original.find('[').unwrap() + 1;

        let mut changes = ChangeSet::new();
        // Recorded out of order on purpose.
        changes.push(TextInsertion::new(list_open, "B"));
        changes.push(TextInsertion::new(9, "\nimport B;"));

        let out = changes.apply(original).unwrap();
        assert_eq!(out, "import A;\nimport B;\n@M({ declarations: [B] })");
    }

    #[test]
    fn test_apply_same_offset_keeps_order() {
        let mut changes = ChangeSet::new();
        changes.push(TextInsertion::new(1, "a"));
        changes.push(TextInsertion::new(1, "b"));
        assert_eq!(changes.apply("[]").unwrap(), "[ab]");
    }

    #[test]
    fn test_apply_rejects_bad_offsets() {
        let mut changes = ChangeSet::new();
        changes.push(TextInsertion::new(100, "x"));
        assert!(changes.apply("short").is_err());

        let mut changes = ChangeSet::new();
        changes.push(TextInsertion::new(1, "x"));
        assert!(changes.apply("é").is_err());
    }

    #[test]
    fn test_commit_writes_once() {
        let mut tree = MemoryTree::new().with_file("/a.ts", "[]");
        let mut tx = UpdateTransaction::begin(&mut tree, "/a.ts").unwrap();
        tx.insert(1, "A");
        assert!(tx.commit().unwrap());
        assert_eq!(tree.read("/a.ts").unwrap(), "[A]");
    }

    #[test]
    fn test_empty_commit_does_not_write() {
        let mut tree = FailingTree {
            inner: MemoryTree::new().with_file("/a.ts", "[]"),
        };
        let tx = UpdateTransaction::begin(&mut tree, "/a.ts").unwrap();
        assert!(!tx.commit().unwrap());
    }

    #[test]
    fn test_failed_materialization_leaves_file_untouched() {
        let original = "@NgModule({ declarations: [] })";
        let mut tree = MemoryTree::new().with_file("/m.ts", original);

        let mut tx = UpdateTransaction::begin(&mut tree, "/m.ts").unwrap();
        tx.insert(0, "import { A } from './a';\n");
        tx.insert(original.len() + 10, "A");
        assert!(tx.commit().is_err());

        assert_eq!(tree.read("/m.ts").unwrap(), original);
    }

    #[test]
    fn test_failed_write_leaves_file_untouched() {
        let original = "[]";
        let mut tree = FailingTree {
            inner: MemoryTree::new().with_file("/m.ts", original),
        };
        let mut tx = UpdateTransaction::begin(&mut tree, "/m.ts").unwrap();
        tx.insert(1, "A");
        assert!(matches!(tx.commit(), Err(AppError::Io(_))));
        assert_eq!(tree.read("/m.ts").unwrap(), original);
    }

    #[test]
    fn test_drop_discards() {
        let mut tree = MemoryTree::new().with_file("/a.ts", "[]");
        {
            let mut tx = UpdateTransaction::begin(&mut tree, "/a.ts").unwrap();
            tx.insert(1, "A");
        }
        assert_eq!(tree.read("/a.ts").unwrap(), "[]");

        let mut tx = UpdateTransaction::begin(&mut tree, "/a.ts").unwrap();
        tx.insert(1, "B");
        tx.discard();
        assert_eq!(tree.read("/a.ts").unwrap(), "[]");
    }

    #[test]
    fn test_begin_missing_file() {
        let mut tree = MemoryTree::new();
        let err = UpdateTransaction::begin(&mut tree, "/nope.ts").err().unwrap();
        assert!(matches!(err, AppError::FileNotFound(_)));
    }
}
