//! Screen density splitting of resource tables.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::module_split::ModuleSplit;
use super::pinning::PinnedResources;
use super::splitter::{ensure_untargeted, ModuleSplitSplitter};
use crate::error::Result;
use crate::model::ModuleEntry;
use crate::resources::{
    ConfigValue, Configuration, EntryRef, ScreenDensitySelector, DENSITY_ANY, DENSITY_DEFAULT,
    DENSITY_NONE,
};
use crate::targeting::{ApkTargeting, Dimension, DimensionTargeting, ScreenDensity};

/// Splits density-specific resource values into one split per density bucket.
///
/// Values of an entry are grouped by their configuration without density.
/// A group holding only unqualified values, or any `anydpi`/`nodpi` value,
/// stays in the input split. Other groups are distributed over the buckets
/// with [`ScreenDensitySelector::select_all_matching`]; a value may land in
/// more than one bucket.
#[derive(Debug)]
pub struct ScreenDensityResourcesSplitter {
    selector: ScreenDensitySelector,
    buckets: Vec<ScreenDensity>,
    pinned: PinnedResources,
}

impl ScreenDensityResourcesSplitter {
    #[must_use]
    pub fn new(
        selector: ScreenDensitySelector,
        buckets: impl IntoIterator<Item = ScreenDensity>,
        pinned: PinnedResources,
    ) -> Self {
        Self {
            selector,
            buckets: buckets.into_iter().collect(),
            pinned,
        }
    }

    /// Values of one entry grouped by configuration without density.
    fn groups(entry: EntryRef<'_>) -> BTreeMap<Configuration, Vec<ConfigValue>> {
        let mut groups: BTreeMap<Configuration, Vec<ConfigValue>> = BTreeMap::new();
        for value in &entry.entry.values {
            groups
                .entry(value.config.without_density())
                .or_default()
                .push(value.clone());
        }
        groups
    }

    fn stays_in_master(group: &[ConfigValue]) -> bool {
        group.iter().all(|cv| cv.config.density == DENSITY_DEFAULT)
            || group
                .iter()
                .any(|cv| matches!(cv.config.density, DENSITY_ANY | DENSITY_NONE))
    }

    fn master_values(&self, entry: EntryRef<'_>) -> Vec<ConfigValue> {
        if self.pinned.is_pinned(entry) {
            return entry.entry.values.clone();
        }
        Self::groups(entry)
            .into_values()
            .filter(|group| Self::stays_in_master(group))
            .flatten()
            .collect()
    }

    fn bucket_values(
        &self,
        entry: EntryRef<'_>,
        bucket: ScreenDensity,
        alternatives: &BTreeSet<ScreenDensity>,
    ) -> Vec<ConfigValue> {
        if self.pinned.is_pinned(entry) {
            return Vec::new();
        }
        Self::groups(entry)
            .into_values()
            .filter(|group| !Self::stays_in_master(group))
            .flat_map(|group| {
                self.selector
                    .select_all_matching(&group, bucket, alternatives)
                    .into_iter()
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl ModuleSplitSplitter for ScreenDensityResourcesSplitter {
    fn name(&self) -> &'static str {
        "screen_density"
    }

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>> {
        ensure_untargeted(&split, Dimension::ScreenDensity)?;
        let Some(table) = split.resource_table.clone() else {
            return Ok(vec![split]);
        };

        let all_buckets: BTreeSet<ScreenDensity> = self.buckets.iter().copied().collect();
        let mut bucket_tables = Vec::new();
        for bucket in &all_buckets {
            let alternatives: BTreeSet<ScreenDensity> =
                all_buckets.iter().filter(|b| *b != bucket).copied().collect();
            let bucket_table =
                table.select_values(|entry| self.bucket_values(entry, *bucket, &alternatives));
            if !bucket_table.is_empty() {
                bucket_tables.push((*bucket, bucket_table));
            }
        }

        let observed: BTreeSet<ScreenDensity> = bucket_tables.iter().map(|(b, _)| *b).collect();
        let master_table = table.select_values(|entry| self.master_values(entry));
        let master_files = master_table.referenced_files();

        let mut moved: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(bucket_tables.len() + 1);
        for (bucket, bucket_table) in bucket_tables {
            let files = bucket_table.referenced_files();
            let entries: Vec<ModuleEntry> = split
                .entries
                .iter()
                .filter(|e| files.contains(e.path()) && !master_files.contains(e.path()))
                .cloned()
                .collect();
            moved.extend(entries.iter().map(|e| e.path().to_string()));

            let targeting = split.apk_targeting.merge(&ApkTargeting {
                screen_density: Some(DimensionTargeting::with_observed(
                    BTreeSet::from([bucket]),
                    &observed,
                )),
                ..Default::default()
            });
            let mut density_split = split.derive(entries, targeting);
            density_split.resource_table = Some(bucket_table);
            out.push(density_split);
        }

        let remaining: Vec<ModuleEntry> = split
            .entries
            .iter()
            .filter(|e| !moved.contains(e.path()))
            .cloned()
            .collect();
        let mut rest = split.with_entries(remaining);
        rest.resource_table = Some(master_table);
        if split.is_master || !rest.is_empty() {
            out.push(rest);
        }

        tracing::debug!(
            module = %split.module_name,
            buckets = observed.len(),
            "Resources split by screen density"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DENSITY_BUCKETS;
    use crate::model::{AndroidManifest, BundleModule};
    use crate::resources::test_support::{file, string, table};
    use crate::resources::{resource_id, DensityMatchingPolicy, ResourceTable};
    use crate::split::module_split::SplitType;
    use crate::targeting::{DensityAlias, VariantTargeting};
    use pretty_assertions::assert_eq;

    fn splitter(pinned: PinnedResources) -> ScreenDensityResourcesSplitter {
        ScreenDensityResourcesSplitter::new(
            ScreenDensitySelector::new(DensityMatchingPolicy::PreferExplicit),
            DEFAULT_DENSITY_BUCKETS.map(ScreenDensity::from),
            pinned,
        )
    }

    fn resources_split(table: ResourceTable) -> ModuleSplit {
        let module = BundleModule::new("base", AndroidManifest::new("p"));
        let entries = table
            .referenced_files()
            .into_iter()
            .map(|p| ModuleEntry::new(p, "x"))
            .collect();
        let mut split = ModuleSplit::for_entries(
            &module,
            &VariantTargeting::sdk(21, []),
            entries,
            SplitType::Regular,
        );
        split.resource_table = Some(table);
        split
    }

    fn icons() -> ResourceTable {
        table(vec![
            (
                1,
                "drawable",
                0,
                "icon",
                vec![
                    file(Configuration::density(160), "res/drawable-mdpi/icon.png"),
                    file(Configuration::density(320), "res/drawable-xhdpi/icon.png"),
                ],
            ),
            (
                1,
                "drawable",
                1,
                "vector",
                vec![file(Configuration::density(DENSITY_ANY), "res/drawable-anydpi/vector.xml")],
            ),
            (
                2,
                "string",
                0,
                "title",
                vec![string(Configuration::default(), "Title")],
            ),
        ])
    }

    fn bucket_of(split: &ModuleSplit) -> Option<ScreenDensity> {
        split
            .apk_targeting
            .screen_density
            .as_ref()
            .and_then(|t| t.value.first().copied())
    }

    #[test]
    fn test_split_by_density() {
        let splits = splitter(PinnedResources::default())
            .split(resources_split(icons()))
            .unwrap();
        // Seven buckets plus master.
        assert_eq!(splits.len(), 8);

        let xhdpi = splits
            .iter()
            .find(|s| bucket_of(s) == Some(DensityAlias::Xhdpi.into()))
            .unwrap();
        assert_eq!(
            xhdpi.entry_paths(),
            BTreeSet::from(["res/drawable-xhdpi/icon.png"])
        );
        let alternatives = &xhdpi.apk_targeting.screen_density.as_ref().unwrap().alternatives;
        assert_eq!(alternatives.len(), 6);

        let ldpi = splits
            .iter()
            .find(|s| bucket_of(s) == Some(DensityAlias::Ldpi.into()))
            .unwrap();
        assert_eq!(
            ldpi.entry_paths(),
            BTreeSet::from(["res/drawable-mdpi/icon.png"])
        );

        let master = splits.iter().find(|s| s.is_master).unwrap();
        assert_eq!(
            master.entry_paths(),
            BTreeSet::from(["res/drawable-anydpi/vector.xml"])
        );
        let master_table = master.resource_table.as_ref().unwrap();
        assert!(master_table.entry(resource_id(0x7f, 1, 0)).is_none());
        assert!(master_table.entry(resource_id(0x7f, 1, 1)).is_some());
        assert!(master_table.entry(resource_id(0x7f, 2, 0)).is_some());
    }

    #[test]
    fn test_pinned_entry_is_not_split() {
        let pinned = PinnedResources::default().with_ids([resource_id(0x7f, 1, 0)]);
        let splits = splitter(pinned).split(resources_split(icons())).unwrap();
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].entries.len(), 3);
    }

    #[test]
    fn test_density_splitter_rejects_targeted_split() {
        let mut split = resources_split(icons());
        split.apk_targeting.screen_density =
            Some(DimensionTargeting::of(DensityAlias::Hdpi.into()));
        assert!(splitter(PinnedResources::default()).split(split).is_err());
    }
}
