//! Assets splitting along targeted directory dimensions.
//!
//! One generic algorithm serves every assets dimension. Each dimension is a
//! row of [`AssetsDimension`]: how to read its value from a directory's
//! targeting, and how to express that value as split targeting.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Debug;

use super::module_split::{ManifestMutator, ModuleSplit};
use super::splitter::{ensure_untargeted, ModuleSplitSplitter};
use crate::config::{GenerationConfig, OptimizationDimension};
use crate::error::Result;
use crate::model::{ModuleEntry, TargetedAssetsDirectory};
use crate::targeting::directory::strip_dimension_from_path;
use crate::targeting::{
    ApkTargeting, AssetsDirectoryTargeting, Dimension, DimensionTargeting,
    TextureCompressionFormat,
};

/// Descriptor of one assets dimension.
pub struct AssetsDimension<T: Ord> {
    pub name: &'static str,
    /// Dimension that must not be targeted yet when splitting.
    pub dimension: Dimension,
    pub extract: fn(&AssetsDirectoryTargeting) -> Option<T>,
    pub to_targeting: fn(DimensionTargeting<T>) -> ApkTargeting,
}

fn first<T: Ord + Clone>(slot: &Option<DimensionTargeting<T>>) -> Option<T> {
    slot.as_ref().and_then(|t| t.value.first().cloned())
}

pub fn language() -> AssetsDimension<String> {
    AssetsDimension {
        name: "assets_language",
        dimension: Dimension::Language,
        extract: |t| first(&t.language),
        to_targeting: |language| ApkTargeting {
            language: Some(language),
            ..Default::default()
        },
    }
}

pub fn texture_compression_format() -> AssetsDimension<TextureCompressionFormat> {
    AssetsDimension {
        name: "texture_compression_format",
        dimension: Dimension::TextureCompressionFormat,
        extract: |t| first(&t.texture_compression_format),
        to_targeting: |tcf| ApkTargeting {
            texture_compression_format: Some(tcf),
            ..Default::default()
        },
    }
}

pub fn device_tier() -> AssetsDimension<i32> {
    AssetsDimension {
        name: "device_tier",
        dimension: Dimension::DeviceTier,
        extract: |t| first(&t.device_tier),
        to_targeting: |tier| ApkTargeting {
            device_tier: Some(tier),
            ..Default::default()
        },
    }
}

pub fn country_set() -> AssetsDimension<String> {
    AssetsDimension {
        name: "country_set",
        dimension: Dimension::CountrySet,
        extract: |t| first(&t.country_set),
        to_targeting: |countries| ApkTargeting {
            country_set: Some(countries),
            ..Default::default()
        },
    }
}

pub fn device_group() -> AssetsDimension<String> {
    AssetsDimension {
        name: "device_group",
        dimension: Dimension::DeviceGroup,
        extract: |t| first(&t.device_group),
        to_targeting: |group| ApkTargeting {
            device_group: Some(group),
            ..Default::default()
        },
    }
}

/// Assets splitters for the dimensions enabled in `config`, in pipeline order.
///
/// `languages` are the languages observed anywhere in the module, resources
/// included, so asset and resource language splits share their alternatives.
#[must_use]
pub fn assets_splitters(
    config: &GenerationConfig,
    languages: &BTreeSet<String>,
) -> Vec<Box<dyn ModuleSplitSplitter>> {
    let mut splitters: Vec<Box<dyn ModuleSplitSplitter>> = Vec::new();
    if config.is_enabled(OptimizationDimension::Language) {
        splitters.push(Box::new(
            AssetsDimensionSplitter::new(language()).with_observed_values(languages.clone()),
        ));
    }
    if config.is_enabled(OptimizationDimension::TextureCompressionFormat) {
        splitters.push(Box::new(AssetsDimensionSplitter::new(
            texture_compression_format(),
        )));
    }
    if config.is_enabled(OptimizationDimension::DeviceTier) {
        splitters.push(Box::new(AssetsDimensionSplitter::new(device_tier())));
    }
    if config.is_enabled(OptimizationDimension::CountrySet) {
        splitters.push(Box::new(AssetsDimensionSplitter::new(country_set())));
    }
    if config.is_enabled(OptimizationDimension::DeviceGroup) {
        splitters.push(Box::new(AssetsDimensionSplitter::new(device_group())));
    }
    splitters
}

/// Splits assets by the values of one dimension.
///
/// Entry paths keep their `#key_value` markers, so later dimensions in the
/// same pipeline still match the module's targeted directories.
pub struct AssetsDimensionSplitter<T: Ord> {
    descriptor: AssetsDimension<T>,
    observed: BTreeSet<T>,
}

impl<T: Ord> AssetsDimensionSplitter<T> {
    #[must_use]
    pub fn new(descriptor: AssetsDimension<T>) -> Self {
        Self {
            descriptor,
            observed: BTreeSet::new(),
        }
    }

    /// Values observed outside the assets, added to the alternatives.
    #[must_use]
    pub fn with_observed_values(mut self, values: impl IntoIterator<Item = T>) -> Self {
        self.observed.extend(values);
        self
    }

    fn entries_under(
        split: &ModuleSplit,
        directories: &[&TargetedAssetsDirectory],
        claimed: &HashSet<String>,
    ) -> Vec<ModuleEntry> {
        split
            .entries
            .iter()
            .filter(|e| {
                !claimed.contains(e.path()) && directories.iter().any(|d| e.is_under(&d.path))
            })
            .cloned()
            .collect()
    }
}

impl<T> ModuleSplitSplitter for AssetsDimensionSplitter<T>
where
    T: Ord + Clone + Debug + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.descriptor.name
    }

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>> {
        ensure_untargeted(&split, self.descriptor.dimension)?;
        let Some(config) = split.assets_config.clone() else {
            return Ok(vec![split]);
        };

        let mut groups: BTreeMap<T, Vec<&TargetedAssetsDirectory>> = BTreeMap::new();
        for directory in &config.directories {
            if let Some(value) = (self.descriptor.extract)(&directory.targeting) {
                groups.entry(value).or_default().push(directory);
            }
        }
        if groups.is_empty() {
            return Ok(vec![split]);
        }
        let mut observed: BTreeSet<T> = groups.keys().cloned().collect();
        observed.extend(self.observed.iter().cloned());

        let mut claimed: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(groups.len() + 1);
        for (value, directories) in &groups {
            let entries = Self::entries_under(&split, directories, &claimed);
            if entries.is_empty() {
                continue;
            }
            claimed.extend(entries.iter().map(|e| e.path().to_string()));

            let dimension_targeting =
                DimensionTargeting::with_observed(BTreeSet::from([value.clone()]), &observed);
            let targeting = split
                .apk_targeting
                .merge(&(self.descriptor.to_targeting)(dimension_targeting));
            let mut assets_split = split
                .derive(entries, targeting)
                .with_master_manifest_mutator(ManifestMutator::SplitsRequired);
            assets_split.assets_config = split.assets_config.clone();
            out.push(assets_split);
        }

        let remaining: Vec<ModuleEntry> = split
            .entries
            .iter()
            .filter(|e| !claimed.contains(e.path()))
            .cloned()
            .collect();
        tracing::debug!(
            module = %split.module_name,
            dimension = self.descriptor.name,
            values = ?observed,
            "Assets split"
        );
        let rest = split.with_entries(remaining);
        if rest.is_master || !rest.entries.is_empty() {
            out.push(rest);
        }
        Ok(out)
    }
}

/// Remove the markers of `dimensions` from the paths of split entries that
/// target them.
///
/// Runs once the assets pipeline is complete: only then does every split
/// carry its full targeting.
pub fn strip_targeted_suffixes(
    splits: Vec<ModuleSplit>,
    dimensions: &[Dimension],
) -> Result<Vec<ModuleSplit>> {
    splits
        .into_iter()
        .map(|split| -> Result<ModuleSplit> {
            let stripped: Vec<Dimension> = dimensions
                .iter()
                .copied()
                .filter(|d| split.apk_targeting.targets(*d))
                .collect();
            if stripped.is_empty() {
                return Ok(split);
            }
            let entries = split
                .entries
                .iter()
                .map(|entry| -> Result<ModuleEntry> {
                    let mut path = entry.path().to_string();
                    for dimension in &stripped {
                        path = strip_dimension_from_path(&path, *dimension)?;
                    }
                    Ok(entry.with_path(path))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(split.with_entries(entries))
        })
        .collect()
}
