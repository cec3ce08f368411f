//! Bundle-wide splitting: variant aggregation and per-module splitting on a
//! worker pool.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::config::{GenerationConfig, MAX_SDK_VERSION};
use crate::error::Result;
use crate::model::{AppBundle, BundleModule, ModuleType};
use crate::resources::{ResourceAnalyzer, ResourceId};
use crate::split::{ModuleSplit, ModuleSplitter, SuffixManager};
use crate::targeting::VariantTargeting;
use crate::variants::{
    crop, default_generators, generate_all_variant_targetings, generate_module_variants,
    sdk_runtime_variants, VariantGenerator,
};

/// Splits every module of a bundle for every variant of the app.
pub struct BundleSplitter<'a> {
    bundle: &'a AppBundle,
    config: &'a GenerationConfig,
    generators: Vec<Box<dyn VariantGenerator>>,
}

impl<'a> BundleSplitter<'a> {
    #[must_use]
    pub fn new(bundle: &'a AppBundle, config: &'a GenerationConfig) -> Self {
        Self {
            bundle,
            config,
            generators: default_generators(),
        }
    }

    /// Add a variant generator run for every module.
    #[must_use]
    pub fn with_generator(mut self, generator: impl VariantGenerator + 'static) -> Self {
        self.generators.push(Box::new(generator));
        self
    }

    /// Variants of the app, ordered by SDK-runtime flag then minimum SDK.
    ///
    /// Asset-only modules do not contribute variants.
    pub fn variants(&self) -> Result<Vec<VariantTargeting>> {
        let base = self.bundle.base_module()?;
        let generated = self
            .bundle
            .modules
            .iter()
            .filter(|m| m.module_type != ModuleType::AssetOnly)
            .flat_map(|m| generate_module_variants(m, self.config, &self.generators));
        let partition = generate_all_variant_targetings(generated);

        let max_sdk = base.manifest.max_sdk().unwrap_or(MAX_SDK_VERSION);
        let mut variants = crop(&partition, base.manifest.min_sdk(), max_sdk);
        if self.bundle.has_runtime_enabled_sdk_deps() {
            variants = sdk_runtime_variants(&variants);
        }

        tracing::debug!(
            variants = variants.len(),
            min_sdk = base.manifest.min_sdk(),
            max_sdk,
            "Variants generated"
        );
        Ok(variants)
    }

    /// Resources of the base module pinned to master splits.
    fn pinned_resource_ids(&self) -> Result<BTreeSet<ResourceId>> {
        if !self.config.pin_manifest_reachable_resources {
            return Ok(BTreeSet::new());
        }
        let base = self.bundle.base_module()?;
        let Some(analyzer) = ResourceAnalyzer::for_module(base) else {
            return Ok(BTreeSet::new());
        };
        Ok(analyzer.find_manifest_reachable(&base.manifest)?.reachable)
    }

    /// Split all modules for all variants.
    ///
    /// Output is ordered by variant, then base before feature modules by
    /// name, then as returned by [`ModuleSplitter::split_module`].
    pub fn split(&self) -> Result<Vec<ModuleSplit>> {
        let variants = self.variants()?;
        let pinned = self.pinned_resource_ids()?;
        let suffixes = SuffixManager::new();

        let jobs: Vec<(&BundleModule, &VariantTargeting)> = variants
            .iter()
            .flat_map(|variant| self.bundle.modules.iter().map(move |m| (m, variant)))
            .collect();

        let per_job: Vec<Vec<ModuleSplit>> = jobs
            .par_iter()
            .map(|(module, variant)| {
                ModuleSplitter::new(module, self.config, (*variant).clone(), &suffixes)
                    .with_pinned_resource_ids(pinned.iter().copied())
                    .split_module()
            })
            .collect::<Result<_>>()?;

        let mut splits: Vec<ModuleSplit> = per_job.into_iter().flatten().collect();
        splits.sort_by(|a, b| {
            (&a.variant_targeting, !is_base(a), &a.module_name).cmp(&(
                &b.variant_targeting,
                !is_base(b),
                &b.module_name,
            ))
        });

        tracing::debug!(
            modules = self.bundle.modules.len(),
            variants = variants.len(),
            splits = splits.len(),
            "Bundle split"
        );
        Ok(splits)
    }
}

fn is_base(split: &ModuleSplit) -> bool {
    split.module_name == crate::model::BASE_MODULE_NAME
}
