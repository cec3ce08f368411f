//! Merging of splits with identical targeting.

use std::collections::BTreeMap;

use super::module_split::ModuleSplit;
use crate::error::{Result, SplitterError};
use crate::targeting::{ApkTargeting, VariantTargeting};

/// Merge splits that share variant and APK targeting.
///
/// Entries are concatenated and the master flag is or-ed. Manifests must be
/// equal; a config present on both sides must be equal too. Output order is
/// by targeting.
pub fn merge_same_targeting(splits: Vec<ModuleSplit>) -> Result<Vec<ModuleSplit>> {
    let mut merged: BTreeMap<(VariantTargeting, ApkTargeting), ModuleSplit> = BTreeMap::new();
    for split in splits {
        let key = (split.variant_targeting.clone(), split.apk_targeting.clone());
        match merged.remove(&key) {
            Some(existing) => {
                merged.insert(key, merge_pair(existing, split)?);
            }
            None => {
                merged.insert(key, split);
            }
        }
    }
    Ok(merged.into_values().collect())
}

fn merge_pair(mut left: ModuleSplit, right: ModuleSplit) -> Result<ModuleSplit> {
    if left.manifest != right.manifest {
        return Err(inconsistent(&left, "manifests differ"));
    }
    if left.split_type != right.split_type {
        return Err(inconsistent(&left, "split types differ"));
    }
    let table = left.resource_table.take();
    left.resource_table = merge_slot(&left, table, right.resource_table, "resource table")?;
    let native = left.native_config.take();
    left.native_config = merge_slot(&left, native, right.native_config, "native config")?;
    let assets = left.assets_config.take();
    left.assets_config = merge_slot(&left, assets, right.assets_config, "assets config")?;
    let apex = left.apex_config.take();
    left.apex_config = merge_slot(&left, apex, right.apex_config, "APEX config")?;

    left.entries.extend(right.entries);
    left.is_master |= right.is_master;
    for mutator in right.master_manifest_mutators {
        if !left.master_manifest_mutators.contains(&mutator) {
            left.master_manifest_mutators.push(mutator);
        }
    }
    Ok(left)
}

fn merge_slot<T: PartialEq>(
    split: &ModuleSplit,
    left: Option<T>,
    right: Option<T>,
    what: &str,
) -> Result<Option<T>> {
    match (left, right) {
        (Some(l), Some(r)) if l != r => Err(inconsistent(split, &format!("{what}s differ"))),
        (Some(l), _) => Ok(Some(l)),
        (None, r) => Ok(r),
    }
}

fn inconsistent(split: &ModuleSplit, reason: &str) -> SplitterError {
    SplitterError::InternalConsistency(format!(
        "cannot merge splits of module '{}' targeting '{}': {reason}",
        split.module_name,
        split.apk_targeting.suffix()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AndroidManifest, BundleModule, ModuleEntry};
    use crate::resources::ResourceTable;
    use crate::split::module_split::{ManifestMutator, SplitType};
    use crate::targeting::{Abi, DimensionTargeting};
    use pretty_assertions::assert_eq;

    fn split(paths: &[&str], master: bool) -> ModuleSplit {
        let module = BundleModule::new("base", AndroidManifest::new("p"));
        let mut split = ModuleSplit::for_entries(
            &module,
            &VariantTargeting::sdk(21, []),
            paths.iter().map(|p| ModuleEntry::new(*p, "x")).collect(),
            SplitType::Regular,
        );
        split.is_master = master;
        split
    }

    #[test]
    fn test_merges_default_targeting() {
        let resources = split(&["res/a.png"], true);
        let mut code = split(&["dex/classes.dex"], false);
        code.master_manifest_mutators.push(ManifestMutator::SplitsRequired);
        let mut x86 = split(&["lib/x86/a.so"], false);
        x86.apk_targeting.abi = Some(DimensionTargeting::of(Abi::X86));

        let merged = merge_same_targeting(vec![resources, x86, code]).unwrap();
        assert_eq!(merged.len(), 2);
        let master = merged.iter().find(|s| s.is_master).unwrap();
        assert_eq!(master.entries.len(), 2);
        assert_eq!(
            master.master_manifest_mutators,
            vec![ManifestMutator::SplitsRequired]
        );
    }

    #[test]
    fn test_conflicting_resource_tables_fail() {
        let mut left = split(&[], true);
        left.resource_table = Some(ResourceTable::default());
        let mut right = split(&[], false);
        right.resource_table = Some(crate::resources::test_support::table(vec![(
            1,
            "string",
            0,
            "a",
            vec![],
        )]));
        let err = merge_same_targeting(vec![left, right]).unwrap_err();
        assert!(matches!(err, SplitterError::InternalConsistency(_)));
    }

    #[test]
    fn test_one_sided_config_is_kept() {
        let left = split(&[], true);
        let mut right = split(&[], false);
        right.resource_table = Some(ResourceTable::default());
        let merged = merge_same_targeting(vec![left, right]).unwrap();
        assert_eq!(merged[0].resource_table, Some(ResourceTable::default()));
    }
}
