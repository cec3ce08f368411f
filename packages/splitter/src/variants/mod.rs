//! Variant generation.
//!
//! Every module contributes SDK thresholds through a list of
//! [`VariantGenerator`]s. The thresholds of all modules are turned into a
//! disjoint partition of SDK ranges by [`generate_all_variant_targetings`] and
//! cropped to the range the app supports with [`crop`].

mod generators;
mod sdk_runtime;

use std::collections::BTreeSet;

use crate::config::GenerationConfig;
use crate::model::BundleModule;
use crate::targeting::VariantTargeting;

pub use generators::{
    default_generators, native_libraries_min_sdk, BaselineVariantGenerator,
    DexCompressionVariantGenerator, NativeLibrariesVariantGenerator,
    SigningRotationVariantGenerator,
};
pub use sdk_runtime::sdk_runtime_variants;

/// Contributes the variants one optimization needs for a module.
pub trait VariantGenerator: Send + Sync {
    fn generate(&self, module: &BundleModule, config: &GenerationConfig) -> Vec<VariantTargeting>;
}

/// Union of the variants produced by `generators` for `module`.
pub fn generate_module_variants(
    module: &BundleModule,
    config: &GenerationConfig,
    generators: &[Box<dyn VariantGenerator>],
) -> Vec<VariantTargeting> {
    generators
        .iter()
        .flat_map(|generator| generator.generate(module, config))
        .collect()
}

/// Turn possibly overlapping variants into a disjoint partition.
///
/// One variant is produced per distinct minimum SDK, listing every other
/// minimum as alternative. Output is ordered by minimum SDK.
pub fn generate_all_variant_targetings(
    variants: impl IntoIterator<Item = VariantTargeting>,
) -> Vec<VariantTargeting> {
    let thresholds: BTreeSet<u32> = variants.into_iter().map(|v| v.min_sdk()).collect();
    partition(&thresholds)
}

fn partition(thresholds: &BTreeSet<u32>) -> Vec<VariantTargeting> {
    thresholds
        .iter()
        .map(|min| {
            VariantTargeting::sdk(*min, thresholds.iter().copied().filter(|other| other != min))
        })
        .collect()
}

/// Crop a partition to the SDK range `[min_sdk, max_sdk]`.
///
/// A variant covers its minimum up to the next higher threshold. Variants
/// ending at or below `min_sdk` or starting above `max_sdk` are dropped;
/// the lowest surviving variant is raised to `min_sdk`. Alternatives are
/// recomputed from the survivors.
pub fn crop(variants: &[VariantTargeting], min_sdk: u32, max_sdk: u32) -> Vec<VariantTargeting> {
    let thresholds: BTreeSet<u32> = variants.iter().map(VariantTargeting::min_sdk).collect();
    let cropped: BTreeSet<u32> = thresholds
        .iter()
        .filter_map(|min| {
            let end = thresholds.range(min + 1..).next().copied();
            if end.is_some_and(|end| end <= min_sdk) || *min > max_sdk {
                None
            } else {
                Some((*min).max(min_sdk))
            }
        })
        .collect();

    let dropped = thresholds.len() - cropped.len();
    if dropped > 0 {
        tracing::debug!(min_sdk, max_sdk, dropped, "Variants cropped to SDK range");
    }
    partition(&cropped)
}
