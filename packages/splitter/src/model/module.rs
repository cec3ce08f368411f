//! Bundle modules and the bundle itself.

use std::collections::BTreeSet;

use crate::error::{Result, SplitterError};
use crate::resources::ResourceTable;

use super::configs::{ApexImages, AssetsConfig, NativeLibraries};
use super::entry::ModuleEntry;
use super::manifest::AndroidManifest;

/// Name of the base module.
pub const BASE_MODULE_NAME: &str = "base";

/// Delivery kind of a module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ModuleType {
    #[default]
    Feature,
    AssetOnly,
}

/// A named unit of an app bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleModule {
    pub name: String,
    pub manifest: AndroidManifest,
    pub entries: Vec<ModuleEntry>,
    pub resource_table: Option<ResourceTable>,
    pub native_config: Option<NativeLibraries>,
    pub assets_config: Option<AssetsConfig>,
    pub apex_config: Option<ApexImages>,
    pub module_type: ModuleType,
    /// Package names of runtime-enabled SDKs this module depends on.
    pub runtime_enabled_sdks: BTreeSet<String>,
}

impl BundleModule {
    /// Create an empty module.
    #[must_use]
    pub fn new(name: impl Into<String>, manifest: AndroidManifest) -> Self {
        Self {
            name: name.into(),
            manifest,
            entries: Vec::new(),
            resource_table: None,
            native_config: None,
            assets_config: None,
            apex_config: None,
            module_type: ModuleType::default(),
            runtime_enabled_sdks: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_entry(mut self, entry: ModuleEntry) -> Self {
        self.entries.push(entry);
        self
    }

    #[must_use]
    pub fn with_entries(mut self, entries: impl IntoIterator<Item = ModuleEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    #[must_use]
    pub fn with_resource_table(mut self, table: ResourceTable) -> Self {
        self.resource_table = Some(table);
        self
    }

    #[must_use]
    pub fn with_native_config(mut self, config: NativeLibraries) -> Self {
        self.native_config = Some(config);
        self
    }

    #[must_use]
    pub fn with_assets_config(mut self, config: AssetsConfig) -> Self {
        self.assets_config = Some(config);
        self
    }

    #[must_use]
    pub fn with_apex_config(mut self, config: ApexImages) -> Self {
        self.apex_config = Some(config);
        self
    }

    #[must_use]
    pub fn with_module_type(mut self, module_type: ModuleType) -> Self {
        self.module_type = module_type;
        self
    }

    #[must_use]
    pub fn with_runtime_enabled_sdk(mut self, package: impl Into<String>) -> Self {
        self.runtime_enabled_sdks.insert(package.into());
        self
    }

    /// Fill in any missing native, assets and APEX config from the entries.
    pub fn with_derived_configs(mut self) -> Result<Self> {
        if self.native_config.is_none() {
            self.native_config = NativeLibraries::from_entries(&self.entries);
        }
        if self.assets_config.is_none() {
            self.assets_config = AssetsConfig::from_entries(&self.entries)?;
        }
        if self.apex_config.is_none() {
            self.apex_config = ApexImages::from_entries(&self.entries)?;
        }
        Ok(self)
    }

    #[must_use]
    pub fn is_base(&self) -> bool {
        self.name == BASE_MODULE_NAME
    }

    /// Look up an entry by path.
    #[must_use]
    pub fn entry(&self, path: &str) -> Option<&ModuleEntry> {
        self.entries.iter().find(|e| e.path() == path)
    }

    /// Entries located under `dir`.
    pub fn entries_under<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a ModuleEntry> + 'a {
        self.entries.iter().filter(move |e| e.is_under(dir))
    }
}

/// An app bundle: a set of modules, one of which is `base`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppBundle {
    pub modules: Vec<BundleModule>,
}

impl AppBundle {
    #[must_use]
    pub fn new(modules: Vec<BundleModule>) -> Self {
        Self { modules }
    }

    /// Look up a module by name.
    pub fn module(&self, name: &str) -> Result<&BundleModule> {
        self.modules
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| SplitterError::ModuleNotFound(name.to_string()))
    }

    pub fn base_module(&self) -> Result<&BundleModule> {
        self.module(BASE_MODULE_NAME)
    }

    /// Whether any module depends on a runtime-enabled SDK.
    #[must_use]
    pub fn has_runtime_enabled_sdk_deps(&self) -> bool {
        self.modules.iter().any(|m| !m.runtime_enabled_sdks.is_empty())
    }
}
