//! Resources pinned to the master split.

use std::collections::BTreeSet;

use crate::resources::{EntryRef, ResourceId};

/// Resources that stay complete in the master split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinnedResources {
    ids: BTreeSet<ResourceId>,
    names: BTreeSet<String>,
}

impl PinnedResources {
    #[must_use]
    pub fn new(ids: BTreeSet<ResourceId>, names: BTreeSet<String>) -> Self {
        Self { ids, names }
    }

    #[must_use]
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = ResourceId>) -> Self {
        self.ids.extend(ids);
        self
    }

    /// Matches by id, by entry name or by `type/name`.
    #[must_use]
    pub fn is_pinned(&self, entry: EntryRef<'_>) -> bool {
        self.ids.contains(&entry.id)
            || self.names.contains(&entry.entry.name)
            || (!self.names.is_empty() && self.names.contains(&entry.qualified_name()))
    }
}
