//! Module entries.

use std::sync::Arc;

/// A file inside a bundle module.
///
/// Entries are immutable; identity is by path. Content is shared between
/// copies so moving an entry into several candidate splits is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    path: String,
    content: Arc<[u8]>,
    force_uncompressed: bool,
}

impl ModuleEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: Arc::from(content.into()),
            force_uncompressed: false,
        }
    }

    /// Path relative to the module root (e.g. `lib/x86/libfoo.so`).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw entry content.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Whether the serializer must store this entry uncompressed.
    #[must_use]
    pub fn force_uncompressed(&self) -> bool {
        self.force_uncompressed
    }

    /// Copy of this entry with the compression hint set.
    #[must_use]
    pub fn with_force_uncompressed(&self, force_uncompressed: bool) -> Self {
        Self {
            force_uncompressed,
            ..self.clone()
        }
    }

    /// Copy of this entry under a different path.
    #[must_use]
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }

    /// Whether the entry lives under `dir` (at any depth).
    #[must_use]
    pub fn is_under(&self, dir: &str) -> bool {
        self.path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Directory part of the path, or `""` for top-level entries.
    #[must_use]
    pub fn parent(&self) -> &str {
        self.path.rsplit_once('/').map_or("", |(dir, _)| dir)
    }
}
