use super::VariantGenerator;
use crate::config::{GenerationConfig, SDK_M, SDK_N, SDK_P, SPLIT_APKS_MIN_SDK};
use crate::model::{AndroidManifest, BundleModule, DEX_DIR, LIB_DIR};
use crate::targeting::VariantTargeting;

/// Minimum SDK from which native libraries of an app with `manifest` can be
/// served uncompressed.
///
/// Apps installable on external storage need P, apps with a native activity
/// need N, all others M.
#[must_use]
pub fn native_libraries_min_sdk(manifest: &AndroidManifest) -> u32 {
    if manifest.is_installable_on_external_storage() {
        SDK_P
    } else if manifest.has_native_activity() {
        SDK_N
    } else {
        SDK_M
    }
}

/// Every module gets the split APK baseline.
#[derive(Debug, Default)]
pub struct BaselineVariantGenerator;

impl VariantGenerator for BaselineVariantGenerator {
    fn generate(
        &self,
        _module: &BundleModule,
        _config: &GenerationConfig,
    ) -> Vec<VariantTargeting> {
        vec![VariantTargeting::sdk(SPLIT_APKS_MIN_SDK, [])]
    }
}

#[derive(Debug, Default)]
pub struct NativeLibrariesVariantGenerator;

impl VariantGenerator for NativeLibrariesVariantGenerator {
    fn generate(&self, module: &BundleModule, config: &GenerationConfig) -> Vec<VariantTargeting> {
        let has_native =
            module.native_config.is_some() || module.entries_under(LIB_DIR).next().is_some();
        if !config.enable_uncompressed_native_libraries || !has_native {
            return Vec::new();
        }
        vec![VariantTargeting::sdk(native_libraries_min_sdk(&module.manifest), [])]
    }
}

#[derive(Debug, Default)]
pub struct DexCompressionVariantGenerator;

impl VariantGenerator for DexCompressionVariantGenerator {
    fn generate(&self, module: &BundleModule, config: &GenerationConfig) -> Vec<VariantTargeting> {
        let has_dex = module.entries_under(DEX_DIR).next().is_some();
        if !config.enable_dex_compression_splitter || !has_dex {
            return Vec::new();
        }
        vec![VariantTargeting::sdk(config.dex_compression_target_sdk.min_sdk(), [])]
    }
}

#[derive(Debug, Default)]
pub struct SigningRotationVariantGenerator;

impl VariantGenerator for SigningRotationVariantGenerator {
    fn generate(&self, _module: &BundleModule, config: &GenerationConfig) -> Vec<VariantTargeting> {
        config
            .min_sdk_for_signing_rotation
            .map(|sdk| VariantTargeting::sdk(sdk, []))
            .into_iter()
            .collect()
    }
}

/// The generators applied to every module.
#[must_use]
pub fn default_generators() -> Vec<Box<dyn VariantGenerator>> {
    vec![
        Box::new(BaselineVariantGenerator),
        Box::new(NativeLibrariesVariantGenerator),
        Box::new(DexCompressionVariantGenerator),
        Box::new(SigningRotationVariantGenerator),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{UncompressedDexTargetSdk, SDK_L, SDK_Q, SDK_S};
    use crate::model::ModuleEntry;
    use crate::variants::generate_module_variants;
    use pretty_assertions::assert_eq;

    fn manifest(application_attrs: &str, activity: &str) -> AndroidManifest {
        AndroidManifest::parse(&format!(
            r#"<manifest package="p" {application_attrs}><application>{activity}</application></manifest>"#
        ))
        .unwrap()
    }

    fn native_module(manifest: AndroidManifest) -> BundleModule {
        BundleModule::new("base", manifest)
            .with_entry(ModuleEntry::new("lib/x86/liba.so", "x"))
            .with_derived_configs()
            .unwrap()
    }

    fn min_sdks(variants: Vec<VariantTargeting>) -> Vec<u32> {
        variants.iter().map(VariantTargeting::min_sdk).collect()
    }

    #[test]
    fn test_native_threshold_by_manifest() {
        assert_eq!(native_libraries_min_sdk(&manifest("", "")), SDK_M);
        assert_eq!(
            native_libraries_min_sdk(&manifest(
                "",
                r#"<activity name="android.app.NativeActivity"/>"#
            )),
            SDK_N
        );
        assert_eq!(
            native_libraries_min_sdk(&manifest(r#"installLocation="auto""#, "")),
            SDK_P
        );
    }

    #[test]
    fn test_native_generator_requires_native_code() {
        let config = GenerationConfig::default();
        let plain = BundleModule::new("base", AndroidManifest::new("p"));
        assert!(NativeLibrariesVariantGenerator.generate(&plain, &config).is_empty());

        let module = native_module(manifest("", ""));
        assert_eq!(
            min_sdks(NativeLibrariesVariantGenerator.generate(&module, &config)),
            vec![SDK_M]
        );
        let disabled = config.with_uncompressed_native_libraries(false);
        assert!(NativeLibrariesVariantGenerator.generate(&module, &disabled).is_empty());
    }

    #[test]
    fn test_dex_generator_uses_target_sdk() {
        let module = BundleModule::new("base", AndroidManifest::new("p"))
            .with_entry(ModuleEntry::new("dex/classes.dex", "x"));
        let config = GenerationConfig::default();
        assert!(DexCompressionVariantGenerator.generate(&module, &config).is_empty());

        let q = config.clone().with_dex_compression(UncompressedDexTargetSdk::Unspecified);
        assert_eq!(min_sdks(DexCompressionVariantGenerator.generate(&module, &q)), vec![SDK_Q]);
        let s = config.with_dex_compression(UncompressedDexTargetSdk::Sdk31);
        assert_eq!(min_sdks(DexCompressionVariantGenerator.generate(&module, &s)), vec![SDK_S]);
    }

    #[test]
    fn test_default_generators_union() {
        let module = native_module(manifest("", ""));
        let config = GenerationConfig::default().with_signing_rotation_min_sdk(28);
        let variants = generate_module_variants(&module, &config, &default_generators());
        assert_eq!(min_sdks(variants), vec![SDK_L, SDK_M, 28]);
    }
}
