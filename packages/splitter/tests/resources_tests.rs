//! Density selection, reachability and resource pinning through the public API.

mod common;

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use semver::Version;

use bundlesplit_splitter::resources::{
    resource_id, CompoundValue, ConfigValue, Configuration, DensityMatchingPolicy, Item,
    ReachabilityReport, ResourceAnalyzer, ScreenDensitySelector, StyleItem, Value, DENSITY_ANY,
    DENSITY_DEFAULT,
};
use bundlesplit_splitter::targeting::{DensityAlias, ScreenDensity};
use bundlesplit_splitter::{AppBundle, BundleSplitter, GenerationConfig, ModuleEntry, SplitterError};

use common::{file, module, reference, table};

fn densities(dpis: &[u32]) -> Vec<ConfigValue> {
    dpis.iter()
        .map(|dpi| file(Configuration::density(*dpi), &format!("res/drawable-{dpi}/icon.png")))
        .collect()
}

fn selected_dpi(candidates: &[ConfigValue], desired: DensityAlias) -> Option<u32> {
    ScreenDensitySelector::default()
        .select_best(candidates, desired.into())
        .map(|cv| cv.config.density)
}

#[test]
fn test_density_exact_match() {
    let candidates = densities(&[120, 160, 213, 240]);
    assert_eq!(selected_dpi(&candidates, DensityAlias::Hdpi), Some(240));
}

#[test]
fn test_density_bracket_prefers_lower_when_inequality_holds() {
    let candidates = densities(&[213, 320]);
    assert_eq!(selected_dpi(&candidates, DensityAlias::Hdpi), Some(213));
}

#[test]
fn test_density_any_always_wins() {
    let mut candidates = densities(&[240]);
    candidates.push(file(Configuration::density(DENSITY_ANY), "res/drawable-anydpi/icon.xml"));
    assert_eq!(selected_dpi(&candidates, DensityAlias::Hdpi), Some(DENSITY_ANY));
    assert_eq!(selected_dpi(&candidates, DensityAlias::Ldpi), Some(DENSITY_ANY));
}

#[test]
fn test_density_policy_depends_on_tool_version() {
    let candidates = vec![
        file(Configuration::density(DENSITY_DEFAULT), "res/drawable/icon.png"),
        file(Configuration::density(160), "res/drawable-mdpi/icon.png"),
    ];
    let old = ScreenDensitySelector::for_tool_version(&Version::new(0, 9, 0));
    let new = ScreenDensitySelector::for_tool_version(&Version::new(0, 9, 1));
    let pick = |selector: ScreenDensitySelector| {
        selector
            .select_best(&candidates, ScreenDensity::from(DensityAlias::Mdpi))
            .and_then(|cv| cv.value.file_path().map(str::to_string))
    };
    assert_eq!(pick(old), Some("res/drawable/icon.png".to_string()));
    assert_eq!(pick(new), Some("res/drawable-mdpi/icon.png".to_string()));
    assert_eq!(
        DensityMatchingPolicy::for_version(&Version::new(0, 8, 0)),
        DensityMatchingPolicy::PreferUnqualified
    );
}

#[test]
fn test_select_all_matching_serves_neighbour_range() {
    let candidates = densities(&[120, 213, 280, 640]);
    let alternatives = BTreeSet::from([
        ScreenDensity::from(DensityAlias::Mdpi),
        ScreenDensity::from(DensityAlias::Xhdpi),
    ]);
    let selected: Vec<u32> = ScreenDensitySelector::default()
        .select_all_matching(&candidates, DensityAlias::Hdpi.into(), &alternatives)
        .into_iter()
        .map(|cv| cv.config.density)
        .collect();
    assert_eq!(selected, vec![213, 280]);
}

fn reachability_module() -> bundlesplit_splitter::BundleModule {
    let a = resource_id(0x7f, 1, 0);
    let b = resource_id(0x7f, 1, 1);
    let c = resource_id(0x7f, 1, 2);
    let style = resource_id(0x7f, 3, 0);
    let mut module = module("base", &[]).with_entry(ModuleEntry::new(
        "res/layout/main.xml",
        format!(r#"<LinearLayout background="@{style:#010x}"/>"#),
    ));
    module.resource_table = Some(table(vec![
        (1, "drawable", 0, "a", vec![reference(b)]),
        (1, "drawable", 1, "b", vec![reference(c), reference(0)]),
        (1, "drawable", 2, "c", vec![reference(b)]),
        (1, "drawable", 3, "unused", vec![reference(a)]),
        (
            2,
            "layout",
            0,
            "main",
            vec![file(Configuration::default(), "res/layout/main.xml")],
        ),
        (
            3,
            "style",
            0,
            "Theme",
            vec![ConfigValue::new(
                Configuration::default(),
                Value::Compound(CompoundValue::Style {
                    parent: Some(resource_id(0x7f, 3, 1)),
                    items: vec![StyleItem {
                        key: resource_id(0x7f, 4, 0),
                        item: Item::Reference(a),
                    }],
                }),
            )],
        ),
        (
            4,
            "attr",
            0,
            "accent",
            vec![ConfigValue::new(
                Configuration::default(),
                Value::Compound(CompoundValue::Attr { symbols: vec![] }),
            )],
        ),
    ]));
    module
}

#[test]
fn test_reachability_follows_chains_and_cycles() {
    let module = reachability_module();
    let analyzer = ResourceAnalyzer::for_module(&module).unwrap();
    let a = resource_id(0x7f, 1, 0);
    let report = analyzer.find_reachable([a]).unwrap();
    assert_eq!(
        report,
        ReachabilityReport {
            reachable: BTreeSet::from([a, resource_id(0x7f, 1, 1), resource_id(0x7f, 1, 2)]),
            dangling: BTreeSet::new(),
        }
    );
}

#[test]
fn test_reachability_through_layout_and_style() {
    let module = reachability_module();
    let analyzer = ResourceAnalyzer::for_module(&module).unwrap();
    let report = analyzer.find_reachable([resource_id(0x7f, 2, 0)]).unwrap();
    assert!(report.reachable.contains(&resource_id(0x7f, 3, 0)));
    assert!(report.reachable.contains(&resource_id(0x7f, 4, 0)));
    assert!(report.reachable.contains(&resource_id(0x7f, 1, 2)));
    assert!(!report.reachable.contains(&resource_id(0x7f, 1, 3)));
    // The parent style is not part of this table.
    assert_eq!(report.dangling, BTreeSet::from([resource_id(0x7f, 3, 1)]));
}

#[test]
fn test_reachability_reports_unreadable_xml() {
    let mut module = reachability_module();
    module.entries.retain(|e| e.path() != "res/layout/main.xml");
    let analyzer = ResourceAnalyzer::for_module(&module).unwrap();
    let err = analyzer.find_reachable([resource_id(0x7f, 2, 0)]).unwrap_err();
    assert!(matches!(
        err,
        SplitterError::ResourceFileRead { path, .. } if path == "res/layout/main.xml"
    ));
}

#[test]
fn test_manifest_reachable_resources_stay_in_master() {
    let icon = vec![
        file(Configuration::density(240), "res/drawable-hdpi/icon.png"),
        file(Configuration::density(480), "res/drawable-xxhdpi/icon.png"),
    ];
    let mut base = module(
        "base",
        &["res/drawable-hdpi/icon.png", "res/drawable-xxhdpi/icon.png"],
    );
    base.resource_table = Some(table(vec![(1, "drawable", 0, "icon", icon)]));
    let bundle = AppBundle::new(vec![base]);

    let unpinned = GenerationConfig::default();
    let splits = BundleSplitter::new(&bundle, &unpinned).split().unwrap();
    assert!(splits.len() > 1);
    assert!(splits[0].entries.is_empty());

    let pinned = GenerationConfig {
        pin_manifest_reachable_resources: true,
        ..Default::default()
    };
    let splits = BundleSplitter::new(&bundle, &pinned).split().unwrap();
    assert_eq!(splits.len(), 1);
    assert_eq!(splits[0].entries.len(), 2);
}
