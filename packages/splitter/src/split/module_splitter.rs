//! Splitting of one module for one variant.

use std::collections::BTreeSet;

use super::abi::{AbiNativeLibrariesSplitter, ApexImagesSplitter};
use super::assets::{assets_splitters, strip_targeted_suffixes};
use super::compression::{DexCompressionSplitter, NativeLibrariesCompressionSplitter};
use super::density::ScreenDensityResourcesSplitter;
use super::language::LanguageResourcesSplitter;
use super::merger::merge_same_targeting;
use super::module_split::{ModuleSplit, SplitType};
use super::pinning::PinnedResources;
use super::splitter::SplittingPipeline;
use super::suffix::SuffixManager;
use crate::config::{
    GenerationConfig, OptimizationDimension, DEFAULT_DENSITY_BUCKETS, PLACEHOLDER_LIBRARY_NAME,
};
use crate::error::{Result, SplitterError};
use crate::model::{
    AndroidManifest, BundleModule, ModuleEntry, NativeLibraries, APEX_DIR, ASSETS_DIR, DEX_DIR,
    LIB_DIR,
};
use crate::resources::{ResourceId, ScreenDensitySelector};
use crate::targeting::{Dimension, ScreenDensity, VariantTargeting};
use crate::validation::validate_module;
use crate::variants::native_libraries_min_sdk;

const RES_DIR: &str = "res";

/// Entries of a module sorted into the pipeline that handles them.
#[derive(Debug, Default)]
struct EntryPartition {
    resources: Vec<ModuleEntry>,
    native: Vec<ModuleEntry>,
    assets: Vec<ModuleEntry>,
    dex: Vec<ModuleEntry>,
    root: Vec<ModuleEntry>,
}

impl EntryPartition {
    fn of(entries: &[ModuleEntry]) -> Self {
        let mut partition = Self::default();
        for entry in entries {
            let bucket = if entry.is_under(RES_DIR) {
                &mut partition.resources
            } else if entry.is_under(LIB_DIR) || entry.is_under(APEX_DIR) {
                &mut partition.native
            } else if entry.is_under(ASSETS_DIR) {
                &mut partition.assets
            } else if entry.is_under(DEX_DIR) {
                &mut partition.dex
            } else {
                &mut partition.root
            };
            bucket.push(entry.clone());
        }
        partition
    }
}

/// Produces the splits of one module for one variant.
pub struct ModuleSplitter<'a> {
    module: &'a BundleModule,
    config: &'a GenerationConfig,
    variant: VariantTargeting,
    suffixes: &'a SuffixManager,
    pinned_ids: BTreeSet<ResourceId>,
}

impl<'a> ModuleSplitter<'a> {
    #[must_use]
    pub fn new(
        module: &'a BundleModule,
        config: &'a GenerationConfig,
        variant: VariantTargeting,
        suffixes: &'a SuffixManager,
    ) -> Self {
        Self {
            module,
            config,
            variant,
            suffixes,
            pinned_ids: BTreeSet::new(),
        }
    }

    /// Pin resources to the master split in addition to configured ones.
    #[must_use]
    pub fn with_pinned_resource_ids(mut self, ids: impl IntoIterator<Item = ResourceId>) -> Self {
        self.pinned_ids.extend(ids);
        self
    }

    /// Split the module.
    ///
    /// The result holds exactly one master split with default targeting,
    /// followed by the config splits ordered by suffix.
    pub fn split_module(&self) -> Result<Vec<ModuleSplit>> {
        validate_module(self.module)?;
        let split_type = if self.config.instant {
            SplitType::Instant
        } else {
            SplitType::Regular
        };

        let partition = EntryPartition::of(&self.module.entries);
        let mut splits = Vec::new();
        splits.extend(self.split_resources(partition.resources, split_type)?);
        splits.extend(self.split_native(partition.native, split_type)?);
        splits.extend(self.split_assets(partition.assets, split_type)?);
        splits.extend(self.split_dex(partition.dex, split_type)?);
        splits.push(self.initial_split(partition.root, split_type));

        let mut splits = merge_same_targeting(splits)?;
        self.apply_master_mutators(&mut splits)?;
        self.finalize(&mut splits);

        tracing::debug!(
            module = %self.module.name,
            min_sdk = self.variant.min_sdk(),
            splits = splits.len(),
            "Module split"
        );
        Ok(splits)
    }

    fn initial_split(&self, entries: Vec<ModuleEntry>, split_type: SplitType) -> ModuleSplit {
        ModuleSplit::for_entries(self.module, &self.variant, entries, split_type)
    }

    fn pinned(&self) -> PinnedResources {
        let ids = self
            .config
            .master_pinned_resource_ids
            .iter()
            .chain(&self.pinned_ids)
            .copied()
            .collect();
        PinnedResources::new(ids, self.config.master_pinned_resource_names.clone())
    }

    /// Languages of the module's unpinned resources and language-targeted
    /// asset directories.
    fn observed_languages(&self) -> BTreeSet<String> {
        let mut languages = self
            .module
            .resource_table
            .as_ref()
            .map(|table| LanguageResourcesSplitter::new(self.pinned()).languages(table))
            .unwrap_or_default();
        if let Some(assets) = &self.module.assets_config {
            languages.extend(
                assets
                    .directories
                    .iter()
                    .filter_map(|d| d.targeting.language.as_ref())
                    .flat_map(|t| t.value.iter().cloned()),
            );
        }
        languages
    }

    fn split_resources(
        &self,
        entries: Vec<ModuleEntry>,
        split_type: SplitType,
    ) -> Result<Vec<ModuleSplit>> {
        let mut initial = self.initial_split(entries, split_type);
        initial.resource_table = self.module.resource_table.clone();

        let mut pipeline = SplittingPipeline::new();
        if self.config.is_enabled(OptimizationDimension::ScreenDensity) {
            pipeline = pipeline.with(ScreenDensityResourcesSplitter::new(
                ScreenDensitySelector::for_tool_version(&self.config.density_tool_version),
                DEFAULT_DENSITY_BUCKETS.map(ScreenDensity::from),
                self.pinned(),
            ));
        }
        if self.config.is_enabled(OptimizationDimension::Language) {
            pipeline = pipeline.with(
                LanguageResourcesSplitter::new(self.pinned())
                    .with_observed_languages(self.observed_languages()),
            );
        }
        pipeline.split(initial)
    }

    fn split_native(
        &self,
        mut entries: Vec<ModuleEntry>,
        split_type: SplitType,
    ) -> Result<Vec<ModuleSplit>> {
        let mut native_config = self.module.native_config.clone();
        if native_config.is_none() && !self.config.placeholder_abis.is_empty() {
            entries.extend(self.config.placeholder_abis.iter().map(|abi| {
                ModuleEntry::new(
                    format!("{LIB_DIR}/{}/{PLACEHOLDER_LIBRARY_NAME}", abi.dir_name()),
                    Vec::<u8>::new(),
                )
            }));
            native_config = NativeLibraries::from_entries(&entries);
        }

        let mut initial = self.initial_split(entries, split_type);
        initial.native_config = native_config;
        initial.apex_config = self.module.apex_config.clone();

        let mut pipeline = SplittingPipeline::new();
        if self.config.is_enabled(OptimizationDimension::Abi) {
            pipeline = pipeline
                .with(AbiNativeLibrariesSplitter)
                .with(ApexImagesSplitter);
        }
        if self.config.enable_uncompressed_native_libraries {
            pipeline = pipeline.with(NativeLibrariesCompressionSplitter::new(
                native_libraries_min_sdk(&self.module.manifest),
            ));
        }
        pipeline.split(initial)
    }

    fn split_assets(
        &self,
        entries: Vec<ModuleEntry>,
        split_type: SplitType,
    ) -> Result<Vec<ModuleSplit>> {
        let mut initial = self.initial_split(entries, split_type);
        initial.assets_config = self.module.assets_config.clone();
        let splits = SplittingPipeline::new()
            .with_all(assets_splitters(self.config, &self.observed_languages()))
            .split(initial)?;

        let stripped: Vec<Dimension> = self
            .config
            .optimization_dimensions
            .iter()
            .copied()
            .filter(|d| self.config.strips_suffix(*d))
            .map(OptimizationDimension::dimension)
            .collect();
        strip_targeted_suffixes(splits, &stripped)
    }

    fn split_dex(
        &self,
        entries: Vec<ModuleEntry>,
        split_type: SplitType,
    ) -> Result<Vec<ModuleSplit>> {
        let min_sdk = self
            .config
            .enable_dex_compression_splitter
            .then(|| self.config.dex_compression_target_sdk.min_sdk());
        SplittingPipeline::new()
            .with(DexCompressionSplitter::new(min_sdk))
            .split(self.initial_split(entries, split_type))
    }

    /// Apply queued mutators to the master manifest, then check the master
    /// split is unique.
    fn apply_master_mutators(&self, splits: &mut [ModuleSplit]) -> Result<()> {
        let defaults: Vec<usize> = splits
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_default_targeting())
            .map(|(i, _)| i)
            .collect();
        let masters = splits.iter().filter(|s| s.is_master).count();
        let &[master] = defaults.as_slice() else {
            return Err(self.inconsistent(format!(
                "{} splits with default targeting",
                defaults.len()
            )));
        };
        if !splits[master].is_master || masters != 1 {
            return Err(self.inconsistent(format!(
                "{masters} master splits, default targeting split is master: {}",
                splits[master].is_master
            )));
        }

        let mut mutators = Vec::new();
        for split in splits.iter_mut() {
            for mutator in split.master_manifest_mutators.drain(..) {
                if !mutators.contains(&mutator) {
                    mutators.push(mutator);
                }
            }
        }
        for mutator in mutators {
            mutator.apply(&mut splits[master].manifest);
        }
        Ok(())
    }

    /// Resolve suffixes, write split manifests and order the splits.
    fn finalize(&self, splits: &mut [ModuleSplit]) {
        let is_base = self.module.is_base();
        let package = self.module.manifest.package().unwrap_or_default();
        let version_code = self.module.manifest.version_code();

        for split in splits.iter_mut() {
            if split.is_master {
                if !is_base {
                    split.manifest.set_split_id(&self.module.name);
                }
                continue;
            }
            split.suffix = self.suffixes.resolve(
                &self.module.name,
                &self.variant,
                &split.apk_targeting.suffix(),
            );
            let feature = (!is_base).then_some(self.module.name.as_str());
            split.manifest = AndroidManifest::for_config_split(
                package,
                version_code,
                &split.split_id(is_base),
                feature,
            );
        }
        splits.sort_by(|a, b| {
            (!a.is_master, &a.suffix, &a.apk_targeting).cmp(&(
                !b.is_master,
                &b.suffix,
                &b.apk_targeting,
            ))
        });
    }

    fn inconsistent(&self, reason: String) -> SplitterError {
        SplitterError::InternalConsistency(format!(
            "module '{}' for SDK {}: {reason}",
            self.module.name,
            self.variant.min_sdk()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SDK_L, SDK_M};
    use crate::resources::test_support::{string, table};
    use crate::resources::Configuration;
    use crate::targeting::Abi;
    use pretty_assertions::assert_eq;

    fn base_module() -> BundleModule {
        let manifest = AndroidManifest::parse(
            r#"<manifest package="com.example.app" versionCode="7"><application/></manifest>"#,
        )
        .unwrap();
        BundleModule::new("base", manifest)
            .with_entries([
                ModuleEntry::new("dex/classes.dex", "dex"),
                ModuleEntry::new("lib/x86/libnative.so", "x86"),
                ModuleEntry::new("lib/arm64-v8a/libnative.so", "arm"),
                ModuleEntry::new("res/raw/data.bin", "raw"),
                ModuleEntry::new("root/extra.txt", "txt"),
            ])
            .with_resource_table(table(vec![(
                1,
                "string",
                0,
                "title",
                vec![
                    string(Configuration::default(), "Title"),
                    string(Configuration::locale("fr"), "Titre"),
                ],
            )]))
            .with_derived_configs()
            .unwrap()
    }

    fn split(module: &BundleModule, config: &GenerationConfig, min_sdk: u32) -> Vec<ModuleSplit> {
        let suffixes = SuffixManager::new();
        ModuleSplitter::new(module, config, VariantTargeting::sdk(min_sdk, []), &suffixes)
            .split_module()
            .unwrap()
    }

    #[test]
    fn test_single_master_with_config_splits() {
        let module = base_module();
        let splits = split(&module, &GenerationConfig::default(), SDK_L);

        let suffixes: Vec<&str> = splits.iter().map(|s| s.suffix.as_str()).collect();
        assert_eq!(suffixes, vec!["", "arm64_v8a", "fr", "x86"]);
        assert!(splits[0].is_master);
        assert!(splits[0].is_default_targeting());
        assert_eq!(splits.iter().filter(|s| s.is_master).count(), 1);

        let master_paths = splits[0].entry_paths();
        assert_eq!(
            master_paths,
            BTreeSet::from(["dex/classes.dex", "res/raw/data.bin", "root/extra.txt"])
        );
    }

    #[test]
    fn test_every_entry_lands_in_one_split() {
        let module = base_module();
        let splits = split(&module, &GenerationConfig::default(), SDK_L);
        let mut paths: Vec<&str> = splits.iter().flat_map(|s| s.entry_paths()).collect();
        paths.sort_unstable();
        let mut expected: Vec<&str> = module.entries.iter().map(ModuleEntry::path).collect();
        expected.sort_unstable();
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_config_split_manifests() {
        let module = base_module();
        let splits = split(&module, &GenerationConfig::default(), SDK_L);
        let x86 = splits.iter().find(|s| s.suffix == "x86").unwrap();
        assert_eq!(x86.manifest.split_id(), Some("config.x86"));
        assert_eq!(x86.manifest.package(), Some("com.example.app"));
        assert_eq!(x86.manifest.version_code(), Some(7));
        assert!(!x86.manifest.has_code());
        assert_eq!(splits[0].manifest.split_id(), None);
    }

    #[test]
    fn test_feature_module_split_ids() {
        let module = BundleModule::new("camera", AndroidManifest::new("com.example.app"))
            .with_entry(ModuleEntry::new("lib/x86/libcam.so", "x"))
            .with_derived_configs()
            .unwrap();
        let splits = split(&module, &GenerationConfig::default(), SDK_L);
        assert_eq!(splits[0].manifest.split_id(), Some("camera"));
        assert_eq!(splits[1].manifest.split_id(), Some("camera.config.x86"));
        assert_eq!(
            splits[1].manifest.root().attribute_value("configForSplit"),
            Some("camera")
        );
    }

    #[test]
    fn test_native_libraries_uncompressed_from_threshold() {
        let module = base_module();
        let config = GenerationConfig::default();

        let l = split(&module, &config, SDK_L);
        assert!(l.iter().flat_map(|s| &s.entries).all(|e| !e.force_uncompressed()));
        assert_eq!(l[0].manifest.extract_native_libs(), None);

        let m = split(&module, &config, SDK_M);
        let x86 = m.iter().find(|s| s.suffix == "x86").unwrap();
        assert!(x86.entries.iter().all(ModuleEntry::force_uncompressed));
        assert_eq!(m[0].manifest.extract_native_libs(), Some(false));
    }

    #[test]
    fn test_tcf_assets_mark_splits_required() {
        let module = BundleModule::new("base", AndroidManifest::new("p"))
            .with_entries([
                ModuleEntry::new("assets/textures#tcf_atc/a.dat", "atc"),
                ModuleEntry::new("assets/textures#tcf_pvrtc/a.dat", "pvrtc"),
                ModuleEntry::new("assets/readme.txt", "txt"),
            ])
            .with_derived_configs()
            .unwrap();
        let config = GenerationConfig::default()
            .with_optimization_dimensions([OptimizationDimension::TextureCompressionFormat]);
        let splits = split(&module, &config, SDK_L);
        assert_eq!(splits.len(), 3);
        assert!(splits[0].manifest.splits_required());
        assert_eq!(splits[0].entry_paths(), BTreeSet::from(["assets/readme.txt"]));
    }

    #[test]
    fn test_placeholder_libraries_for_code_free_module() {
        let module = BundleModule::new("base", AndroidManifest::new("p"));
        let config = GenerationConfig::default().with_placeholder_abis([Abi::X86, Abi::Arm64V8a]);
        let splits = split(&module, &config, SDK_L);
        let suffixes: Vec<&str> = splits.iter().map(|s| s.suffix.as_str()).collect();
        assert_eq!(suffixes, vec!["", "arm64_v8a", "x86"]);
        assert_eq!(
            splits[2].entry_paths(),
            BTreeSet::from(["lib/x86/libplaceholder.so"])
        );
    }

    #[test]
    fn test_instant_split_type() {
        let module = base_module();
        let config = GenerationConfig::default().with_instant(true);
        let splits = split(&module, &config, SDK_L);
        assert!(splits.iter().all(|s| s.split_type == SplitType::Instant));
    }

    #[test]
    fn test_max_sdk_below_split_minimum_is_rejected() {
        let manifest = AndroidManifest::parse(
            r#"<manifest package="p"><uses-sdk maxSdkVersion="20"/></manifest>"#,
        )
        .unwrap();
        let module = BundleModule::new("base", manifest);
        let config = GenerationConfig::default();
        let suffixes = SuffixManager::new();
        let err = ModuleSplitter::new(&module, &config, VariantTargeting::sdk(SDK_L, []), &suffixes)
            .split_module()
            .unwrap_err();
        assert!(matches!(err, SplitterError::MaxSdkTooLow { max_sdk: 20, .. }));
    }
}
