//! Targeting model.
//!
//! A [`DimensionTargeting`] carries the value(s) chosen for one configuration
//! dimension together with the alternatives known to exist elsewhere. An
//! [`ApkTargeting`] aggregates one optional slot per dimension and describes
//! which devices a split is for; a [`VariantTargeting`] does the same at the
//! coarser SDK-version granularity.

pub mod directory;
mod values;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use directory::{AssetsDirectoryTargeting, TargetedDirectory, TargetedDirectorySegment};
pub use values::{Abi, DensityAlias, GraphicsApi, MultiAbi, ScreenDensity, TextureCompressionFormat};

/// Targeting of a single dimension: the chosen values plus alternatives.
///
/// An instance with no values means "untargeted on this dimension".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DimensionTargeting<T: Ord> {
    pub value: BTreeSet<T>,
    #[serde(default = "BTreeSet::new", skip_serializing_if = "BTreeSet::is_empty")]
    pub alternatives: BTreeSet<T>,
}

impl<T: Ord> Default for DimensionTargeting<T> {
    fn default() -> Self {
        Self {
            value: BTreeSet::new(),
            alternatives: BTreeSet::new(),
        }
    }
}

impl<T: Ord + Clone> DimensionTargeting<T> {
    /// Targeting a single value with no alternatives.
    #[must_use]
    pub fn of(value: T) -> Self {
        Self {
            value: BTreeSet::from([value]),
            alternatives: BTreeSet::new(),
        }
    }

    /// Targeting a set of values with no alternatives.
    #[must_use]
    pub fn of_values(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            value: values.into_iter().collect(),
            alternatives: BTreeSet::new(),
        }
    }

    /// Replace the alternatives.
    #[must_use]
    pub fn with_alternatives(mut self, alternatives: impl IntoIterator<Item = T>) -> Self {
        self.alternatives = alternatives.into_iter().collect();
        self
    }

    /// Whether no value is targeted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.alternatives.is_empty()
    }

    /// Field-wise union of values and alternatives.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            value: self.value.union(&other.value).cloned().collect(),
            alternatives: self
                .alternatives
                .union(&other.alternatives)
                .cloned()
                .collect(),
        }
    }

    /// Build targeting for `value` with every other observed value as alternative.
    #[must_use]
    pub fn with_observed(value: BTreeSet<T>, observed: &BTreeSet<T>) -> Self {
        let alternatives = observed.difference(&value).cloned().collect();
        Self {
            value,
            alternatives,
        }
    }
}

fn union_slot<T: Ord + Clone>(
    left: &Option<DimensionTargeting<T>>,
    right: &Option<DimensionTargeting<T>>,
) -> Option<DimensionTargeting<T>> {
    match (left, right) {
        (Some(l), Some(r)) => Some(l.union(r)),
        (Some(t), None) | (None, Some(t)) => Some(t.clone()),
        (None, None) => None,
    }
}

/// The recognised split-level dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Abi,
    MultiAbi,
    ScreenDensity,
    Language,
    TextureCompressionFormat,
    DeviceTier,
    CountrySet,
    GraphicsApi,
    DeviceGroup,
}

/// Targeting of a single split APK, one optional slot per dimension.
///
/// Equality is structural; the default value is the master split targeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ApkTargeting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abi: Option<DimensionTargeting<Abi>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_abi: Option<DimensionTargeting<MultiAbi>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_density: Option<DimensionTargeting<ScreenDensity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<DimensionTargeting<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture_compression_format: Option<DimensionTargeting<TextureCompressionFormat>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_tier: Option<DimensionTargeting<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_set: Option<DimensionTargeting<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphics_api: Option<DimensionTargeting<GraphicsApi>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_group: Option<DimensionTargeting<String>>,
}

impl ApkTargeting {
    /// Whether this is the untargeted (master) targeting.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Field-wise union of two targetings.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            abi: union_slot(&self.abi, &other.abi),
            multi_abi: union_slot(&self.multi_abi, &other.multi_abi),
            screen_density: union_slot(&self.screen_density, &other.screen_density),
            language: union_slot(&self.language, &other.language),
            texture_compression_format: union_slot(
                &self.texture_compression_format,
                &other.texture_compression_format,
            ),
            device_tier: union_slot(&self.device_tier, &other.device_tier),
            country_set: union_slot(&self.country_set, &other.country_set),
            graphics_api: union_slot(&self.graphics_api, &other.graphics_api),
            device_group: union_slot(&self.device_group, &other.device_group),
        }
    }

    /// Whether the given dimension already carries targeting.
    #[must_use]
    pub fn targets(&self, dimension: Dimension) -> bool {
        fn set<T: Ord>(slot: &Option<DimensionTargeting<T>>) -> bool {
            slot.as_ref().is_some_and(|t| !t.value.is_empty())
        }
        match dimension {
            Dimension::Abi => set(&self.abi),
            Dimension::MultiAbi => set(&self.multi_abi),
            Dimension::ScreenDensity => set(&self.screen_density),
            Dimension::Language => set(&self.language),
            Dimension::TextureCompressionFormat => set(&self.texture_compression_format),
            Dimension::DeviceTier => set(&self.device_tier),
            Dimension::CountrySet => set(&self.country_set),
            Dimension::GraphicsApi => set(&self.graphics_api),
            Dimension::DeviceGroup => set(&self.device_group),
        }
    }

    /// Proposed split name suffix derived from the targeted values.
    ///
    /// Empty for the default targeting.
    #[must_use]
    pub fn suffix(&self) -> String {
        fn join<T: Ord>(
            slot: &Option<DimensionTargeting<T>>,
            render: impl Fn(&T) -> String,
        ) -> Option<String> {
            let targeting = slot.as_ref()?;
            if targeting.value.is_empty() {
                return None;
            }
            Some(targeting.value.iter().map(render).collect::<Vec<_>>().join("_"))
        }

        [
            join(&self.abi, Abi::suffix),
            join(&self.multi_abi, MultiAbi::suffix),
            join(&self.screen_density, ScreenDensity::suffix),
            join(&self.language, Clone::clone),
            join(&self.texture_compression_format, |tcf| tcf.key().to_string()),
            join(&self.device_tier, |tier| format!("tier_{tier}")),
            join(&self.country_set, |set| format!("countries_{set}")),
            join(&self.graphics_api, GraphicsApi::suffix),
            join(&self.device_group, |group| format!("group_{group}")),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("_")
    }
}

/// Targeting at variant granularity: an SDK version range plus the
/// SDK-runtime flag.
///
/// The range is implied by `sdk_version`: it starts at the targeted minimum
/// and extends up to (not including) the next higher alternative.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantTargeting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<DimensionTargeting<u32>>,
    pub sdk_runtime_required: bool,
}

impl VariantTargeting {
    /// Variant targeting `min_sdk` with the given alternative minimums.
    #[must_use]
    pub fn sdk(min_sdk: u32, alternatives: impl IntoIterator<Item = u32>) -> Self {
        Self {
            sdk_version: Some(DimensionTargeting::of(min_sdk).with_alternatives(alternatives)),
            sdk_runtime_required: false,
        }
    }

    /// Same targeting with the SDK-runtime flag set.
    #[must_use]
    pub fn with_sdk_runtime(mut self) -> Self {
        self.sdk_runtime_required = true;
        self
    }

    /// Minimum SDK version covered by this variant (1 when untargeted).
    #[must_use]
    pub fn min_sdk(&self) -> u32 {
        self.sdk_version
            .as_ref()
            .and_then(|t| t.value.first().copied())
            .unwrap_or(1)
    }

    /// Alternative minimum SDK values.
    #[must_use]
    pub fn sdk_alternatives(&self) -> BTreeSet<u32> {
        self.sdk_version
            .as_ref()
            .map(|t| t.alternatives.clone())
            .unwrap_or_default()
    }
}
