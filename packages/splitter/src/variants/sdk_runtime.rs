use std::collections::BTreeSet;

use super::partition;
use crate::config::SDK_RUNTIME_MIN_SDK;
use crate::targeting::VariantTargeting;

/// Add SDK-runtime variants next to `variants`.
///
/// One runtime variant starts at the SDK-runtime support level; every
/// existing variant above that level gets a runtime twin with the same
/// minimum. Runtime variants list each other as alternatives and are kept
/// separate from the input variants, which are returned unchanged.
#[must_use]
pub fn sdk_runtime_variants(variants: &[VariantTargeting]) -> Vec<VariantTargeting> {
    let thresholds: BTreeSet<u32> = std::iter::once(SDK_RUNTIME_MIN_SDK)
        .chain(
            variants
                .iter()
                .map(VariantTargeting::min_sdk)
                .filter(|min| *min > SDK_RUNTIME_MIN_SDK),
        )
        .collect();

    let runtime: Vec<VariantTargeting> = partition(&thresholds)
        .into_iter()
        .map(VariantTargeting::with_sdk_runtime)
        .collect();
    tracing::debug!(runtime_variants = runtime.len(), "SDK runtime variants added");

    variants.iter().cloned().chain(runtime).collect()
}
