//! A partial split of a module.

use std::collections::BTreeSet;

use crate::model::{
    AndroidManifest, ApexImages, AssetsConfig, BundleModule, ModuleEntry, NativeLibraries,
};
use crate::resources::ResourceTable;
use crate::targeting::{ApkTargeting, VariantTargeting};

/// Kind of package a split is built for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SplitType {
    #[default]
    Regular,
    Standalone,
    Instant,
    System,
}

/// A manifest edit queued by a splitter for the master split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestMutator {
    /// The app must not run without its config splits.
    SplitsRequired,
    /// Set `extractNativeLibs`.
    ExtractNativeLibs(bool),
}

impl ManifestMutator {
    pub fn apply(self, manifest: &mut AndroidManifest) {
        match self {
            Self::SplitsRequired => manifest.set_splits_required(),
            Self::ExtractNativeLibs(extract) => manifest.set_extract_native_libs(extract),
        }
    }
}

/// A set of module entries with the targeting they are served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSplit {
    pub module_name: String,
    pub entries: Vec<ModuleEntry>,
    pub apk_targeting: ApkTargeting,
    pub variant_targeting: VariantTargeting,
    pub manifest: AndroidManifest,
    /// Edits applied to the manifest once this split is known to be master.
    pub master_manifest_mutators: Vec<ManifestMutator>,
    pub resource_table: Option<ResourceTable>,
    pub native_config: Option<NativeLibraries>,
    pub assets_config: Option<AssetsConfig>,
    pub apex_config: Option<ApexImages>,
    pub is_master: bool,
    pub split_type: SplitType,
    /// Resolved split name suffix; empty until suffixes are assigned.
    pub suffix: String,
}

impl ModuleSplit {
    /// Master split of `module` for `variant` holding `entries`.
    #[must_use]
    pub fn for_entries(
        module: &BundleModule,
        variant: &VariantTargeting,
        entries: Vec<ModuleEntry>,
        split_type: SplitType,
    ) -> Self {
        Self {
            module_name: module.name.clone(),
            entries,
            apk_targeting: ApkTargeting::default(),
            variant_targeting: variant.clone(),
            manifest: module.manifest.clone(),
            master_manifest_mutators: Vec::new(),
            resource_table: None,
            native_config: None,
            assets_config: None,
            apex_config: None,
            is_master: true,
            split_type,
            suffix: String::new(),
        }
    }

    /// Copy of this split with other entries and targeting, no longer master.
    ///
    /// Configs are cleared; callers set the subsets that apply.
    #[must_use]
    pub fn derive(&self, entries: Vec<ModuleEntry>, apk_targeting: ApkTargeting) -> Self {
        Self {
            entries,
            apk_targeting,
            is_master: false,
            resource_table: None,
            native_config: None,
            assets_config: None,
            apex_config: None,
            ..self.clone()
        }
    }

    /// Copy of this split holding only `entries`, with targeting unchanged.
    #[must_use]
    pub fn with_entries(&self, entries: Vec<ModuleEntry>) -> Self {
        Self {
            entries,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_master_manifest_mutator(mut self, mutator: ManifestMutator) -> Self {
        if !self.master_manifest_mutators.contains(&mutator) {
            self.master_manifest_mutators.push(mutator);
        }
        self
    }

    /// Whether the split has no dimension targeting.
    #[must_use]
    pub fn is_default_targeting(&self) -> bool {
        self.apk_targeting.is_default()
    }

    /// Paths of all entries.
    #[must_use]
    pub fn entry_paths(&self) -> BTreeSet<&str> {
        self.entries.iter().map(ModuleEntry::path).collect()
    }

    /// Whether the split carries nothing to install.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self
                .resource_table
                .as_ref()
                .map_or(true, ResourceTable::is_empty)
    }

    /// Split id written into the manifest: empty for the base master,
    /// `<module>` for feature masters, `config.<suffix>` or
    /// `<module>.config.<suffix>` for config splits.
    #[must_use]
    pub fn split_id(&self, is_base: bool) -> String {
        match (self.is_master, is_base) {
            (true, true) => String::new(),
            (true, false) => self.module_name.clone(),
            (false, true) => format!("config.{}", self.suffix),
            (false, false) => format!("{}.config.{}", self.module_name, self.suffix),
        }
    }
}
