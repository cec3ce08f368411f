//! Language splitting of resource tables.

use std::collections::{BTreeSet, HashSet};

use super::module_split::ModuleSplit;
use super::pinning::PinnedResources;
use super::splitter::{ensure_untargeted, ModuleSplitSplitter};
use crate::error::Result;
use crate::model::ModuleEntry;
use crate::resources::ResourceTable;
use crate::targeting::{ApkTargeting, Dimension, DimensionTargeting};

/// Splits resource values by the language of their configuration.
///
/// Values without language and pinned entries stay in the input split,
/// together with every entry that is not a language-specific resource file.
#[derive(Debug, Default)]
pub struct LanguageResourcesSplitter {
    pinned: PinnedResources,
    observed: BTreeSet<String>,
}

impl LanguageResourcesSplitter {
    #[must_use]
    pub fn new(pinned: PinnedResources) -> Self {
        Self {
            pinned,
            observed: BTreeSet::new(),
        }
    }

    /// Languages observed elsewhere in the module, added to the alternatives.
    #[must_use]
    pub fn with_observed_languages(mut self, languages: impl IntoIterator<Item = String>) -> Self {
        self.observed.extend(languages);
        self
    }

    /// Languages of the unpinned values in `table`.
    #[must_use]
    pub fn languages(&self, table: &ResourceTable) -> BTreeSet<String> {
        table
            .entries()
            .filter(|e| !self.pinned.is_pinned(*e))
            .flat_map(|e| e.entry.values.iter().map(|cv| cv.config.language()))
            .filter(|language| !language.is_empty())
            .collect()
    }
}

impl ModuleSplitSplitter for LanguageResourcesSplitter {
    fn name(&self) -> &'static str {
        "language"
    }

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>> {
        ensure_untargeted(&split, Dimension::Language)?;
        let Some(table) = split.resource_table.clone() else {
            return Ok(vec![split]);
        };

        let languages = self.languages(&table);
        let observed: BTreeSet<String> = languages.union(&self.observed).cloned().collect();
        let default_table = table.select_values(|entry| {
            if self.pinned.is_pinned(entry) {
                entry.entry.values.clone()
            } else {
                entry
                    .entry
                    .values
                    .iter()
                    .filter(|cv| cv.config.language().is_empty())
                    .cloned()
                    .collect()
            }
        });

        let mut claimed: HashSet<String> = default_table.referenced_files().into_iter().collect();
        let mut out = Vec::with_capacity(languages.len() + 1);
        let mut moved: HashSet<String> = HashSet::new();

        for language in &languages {
            let language_table = table.select_values(|entry| {
                if self.pinned.is_pinned(entry) {
                    return Vec::new();
                }
                entry
                    .entry
                    .values
                    .iter()
                    .filter(|cv| cv.config.language() == *language)
                    .cloned()
                    .collect()
            });
            let files = language_table.referenced_files();
            let entries: Vec<ModuleEntry> = split
                .entries
                .iter()
                .filter(|e| files.contains(e.path()) && !claimed.contains(e.path()))
                .cloned()
                .collect();
            for entry in &entries {
                claimed.insert(entry.path().to_string());
                moved.insert(entry.path().to_string());
            }

            let targeting = split.apk_targeting.merge(&ApkTargeting {
                language: Some(DimensionTargeting::with_observed(
                    BTreeSet::from([language.clone()]),
                    &observed,
                )),
                ..Default::default()
            });
            let mut language_split = split.derive(entries, targeting);
            language_split.resource_table = Some(language_table);
            out.push(language_split);
        }

        let remaining: Vec<ModuleEntry> = split
            .entries
            .iter()
            .filter(|e| !moved.contains(e.path()))
            .cloned()
            .collect();
        let mut rest = split.with_entries(remaining);
        rest.resource_table = Some(default_table);
        if split.is_master || !rest.is_empty() {
            out.push(rest);
        }

        tracing::debug!(
            module = %split.module_name,
            languages = languages.len(),
            "Resources split by language"
        );
        Ok(out)
    }
}
