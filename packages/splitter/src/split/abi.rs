//! ABI splitters for native libraries and APEX images.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::module_split::ModuleSplit;
use super::splitter::{ensure_untargeted, ModuleSplitSplitter};
use crate::error::Result;
use crate::model::{ApexImages, ModuleEntry, TargetedNativeDirectory};
use crate::targeting::{Abi, ApkTargeting, Dimension, DimensionTargeting, MultiAbi};

/// Splits `lib/<abi>/` directories into one split per ABI.
#[derive(Debug, Default)]
pub struct AbiNativeLibrariesSplitter;

impl ModuleSplitSplitter for AbiNativeLibrariesSplitter {
    fn name(&self) -> &'static str {
        "abi"
    }

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>> {
        ensure_untargeted(&split, Dimension::Abi)?;
        let Some(native) = split.native_config.clone() else {
            return Ok(vec![split]);
        };

        let mut groups: BTreeMap<Abi, Vec<&TargetedNativeDirectory>> = BTreeMap::new();
        for directory in &native.directories {
            if let Some(abi) = directory.abi {
                groups.entry(abi).or_default().push(directory);
            }
        }
        let observed: BTreeSet<Abi> = groups.keys().copied().collect();

        let mut claimed: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(groups.len() + 1);
        for (abi, directories) in &groups {
            let entries: Vec<ModuleEntry> = split
                .entries
                .iter()
                .filter(|e| directories.iter().any(|d| e.is_under(&d.path)))
                .cloned()
                .collect();
            claimed.extend(entries.iter().map(|e| e.path().to_string()));

            let targeting = split.apk_targeting.merge(&ApkTargeting {
                abi: Some(DimensionTargeting::with_observed(
                    BTreeSet::from([*abi]),
                    &observed,
                )),
                ..Default::default()
            });
            let mut abi_split = split.derive(entries, targeting);
            abi_split.native_config = Some(native.filtered(|d| d.abi == Some(*abi)));
            out.push(abi_split);
        }

        let leftover: Vec<ModuleEntry> = split
            .entries
            .iter()
            .filter(|e| !claimed.contains(e.path()))
            .cloned()
            .collect();
        tracing::debug!(
            module = %split.module_name,
            abis = groups.len(),
            unclaimed = leftover.len(),
            "Native libraries split by ABI"
        );
        let mut rest = split.with_entries(leftover);
        rest.native_config = None;
        out.push(rest);
        Ok(out)
    }
}

/// Splits APEX images into one split per ABI combination.
///
/// The image and its build info file always travel together.
#[derive(Debug, Default)]
pub struct ApexImagesSplitter;

impl ModuleSplitSplitter for ApexImagesSplitter {
    fn name(&self) -> &'static str {
        "apex"
    }

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>> {
        ensure_untargeted(&split, Dimension::MultiAbi)?;
        let Some(apex) = split.apex_config.clone() else {
            return Ok(vec![split]);
        };

        let observed: BTreeSet<MultiAbi> =
            apex.images.iter().map(|i| i.targeting.clone()).collect();
        let mut claimed: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(apex.images.len() + 1);

        for targeting_value in &observed {
            let images: Vec<_> = apex
                .images
                .iter()
                .filter(|i| i.targeting == *targeting_value)
                .cloned()
                .collect();
            let paths: HashSet<&str> = images
                .iter()
                .flat_map(|i| std::iter::once(i.path.as_str()).chain(i.build_info_path.as_deref()))
                .collect();
            let entries: Vec<ModuleEntry> = split
                .entries
                .iter()
                .filter(|e| paths.contains(e.path()))
                .cloned()
                .collect();
            claimed.extend(paths.into_iter().map(str::to_string));

            let targeting = split.apk_targeting.merge(&ApkTargeting {
                multi_abi: Some(DimensionTargeting::with_observed(
                    BTreeSet::from([targeting_value.clone()]),
                    &observed,
                )),
                ..Default::default()
            });
            let mut apex_split = split.derive(entries, targeting);
            apex_split.apex_config = Some(ApexImages { images });
            out.push(apex_split);
        }

        let leftover: Vec<ModuleEntry> = split
            .entries
            .iter()
            .filter(|e| !claimed.contains(e.path()))
            .cloned()
            .collect();
        let mut rest = split.with_entries(leftover);
        rest.apex_config = None;
        out.push(rest);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AndroidManifest, BundleModule};
    use crate::split::module_split::SplitType;
    use crate::targeting::VariantTargeting;
    use pretty_assertions::assert_eq;

    fn native_split(paths: &[&str]) -> ModuleSplit {
        let module = BundleModule::new("base", AndroidManifest::new("p"))
            .with_entries(paths.iter().map(|p| ModuleEntry::new(*p, "x")))
            .with_derived_configs()
            .unwrap();
        let mut split = ModuleSplit::for_entries(
            &module,
            &VariantTargeting::sdk(21, []),
            module.entries.clone(),
            SplitType::Regular,
        );
        split.native_config = module.native_config.clone();
        split.apex_config = module.apex_config.clone();
        split
    }

    #[test]
    fn test_split_by_abi_with_alternatives() {
        let split = native_split(&[
            "lib/x86/liba.so",
            "lib/x86/libb.so",
            "lib/arm64-v8a/liba.so",
        ]);
        let splits = AbiNativeLibrariesSplitter.split(split).unwrap();
        assert_eq!(splits.len(), 3);

        let x86 = splits
            .iter()
            .find(|s| s.apk_targeting.abi.as_ref().is_some_and(|t| t.value.contains(&Abi::X86)))
            .unwrap();
        assert_eq!(x86.entries.len(), 2);
        assert_eq!(
            x86.apk_targeting.abi,
            Some(DimensionTargeting::of(Abi::X86).with_alternatives([Abi::Arm64V8a]))
        );
        assert!(!x86.is_master);

        let rest = splits.last().unwrap();
        assert!(rest.is_default_targeting());
        assert!(rest.entries.is_empty());
        assert!(rest.is_master);
    }

    #[test]
    fn test_abi_splitter_rejects_targeted_split() {
        let mut split = native_split(&["lib/x86/liba.so"]);
        split.apk_targeting.abi = Some(DimensionTargeting::of(Abi::X86));
        assert!(AbiNativeLibrariesSplitter.split(split).is_err());
    }

    #[test]
    fn test_apex_images_keep_build_info() {
        let split = native_split(&[
            "apex/x86_64.x86.img",
            "apex/x86_64.x86.build_info.pb",
            "apex/arm64-v8a.img",
            "apex_manifest.pb",
        ]);
        let splits = ApexImagesSplitter.split(split).unwrap();
        assert_eq!(splits.len(), 3);

        let x86 = splits
            .iter()
            .find(|s| s.entry_paths().contains("apex/x86_64.x86.img"))
            .unwrap();
        assert_eq!(
            x86.entry_paths(),
            BTreeSet::from(["apex/x86_64.x86.build_info.pb", "apex/x86_64.x86.img"])
        );
        assert_eq!(
            x86.apk_targeting.multi_abi,
            Some(
                DimensionTargeting::of(MultiAbi::new([Abi::X86, Abi::X86_64]))
                    .with_alternatives([MultiAbi::new([Abi::Arm64V8a])])
            )
        );
        assert_eq!(
            splits.last().unwrap().entry_paths(),
            BTreeSet::from(["apex_manifest.pb"])
        );
    }

    #[test]
    fn test_no_native_config_is_passthrough() {
        let mut split = native_split(&["lib/x86/liba.so"]);
        split.native_config = None;
        let splits = AbiNativeLibrariesSplitter.split(split.clone()).unwrap();
        assert_eq!(splits, vec![split]);
    }
}
