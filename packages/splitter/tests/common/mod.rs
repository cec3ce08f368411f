#![allow(dead_code)]

use std::collections::BTreeSet;

use bundlesplit_splitter::model::AndroidManifest;
use bundlesplit_splitter::resources::{
    ConfigValue, Configuration, Entry, Item, Package, ResourceTable, ResourceType, Value,
};
use bundlesplit_splitter::{BundleModule, ModuleEntry, ModuleSplit};

/// Route library logs to the test output; `RUST_LOG=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn manifest(package: &str, min_sdk: u32) -> AndroidManifest {
    AndroidManifest::parse(&format!(
        r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
                package="{package}" android:versionCode="1">
            <uses-sdk android:minSdkVersion="{min_sdk}"/>
            <application android:icon="@0x7f010000"/>
        </manifest>"#
    ))
    .unwrap()
}

/// Module with one entry per path and configs derived from the paths.
pub fn module(name: &str, paths: &[&str]) -> BundleModule {
    BundleModule::new(name, manifest("com.example.app", 21))
        .with_entries(paths.iter().map(|p| ModuleEntry::new(*p, p.as_bytes())))
        .with_derived_configs()
        .unwrap()
}

/// Table of package 0x7f: `(type_id, type_name, entry_id, entry_name, values)`.
pub fn table(entries: Vec<(u8, &str, u16, &str, Vec<ConfigValue>)>) -> ResourceTable {
    let mut types: Vec<ResourceType> = Vec::new();
    for (type_id, type_name, entry_id, entry_name, values) in entries {
        let entry = Entry {
            id: entry_id,
            name: entry_name.to_string(),
            values,
        };
        match types.iter_mut().find(|t| t.id == type_id) {
            Some(ty) => ty.entries.push(entry),
            None => types.push(ResourceType {
                id: type_id,
                name: type_name.to_string(),
                entries: vec![entry],
            }),
        }
    }
    ResourceTable {
        packages: vec![Package {
            id: 0x7f,
            name: "com.example.app".to_string(),
            types,
        }],
    }
}

pub fn file(config: Configuration, path: &str) -> ConfigValue {
    ConfigValue::new(config, Value::Item(Item::File(path.to_string())))
}

pub fn reference(id: u32) -> ConfigValue {
    ConfigValue::new(Configuration::default(), Value::Item(Item::Reference(id)))
}

pub fn text(locale: &str, value: &str) -> ConfigValue {
    ConfigValue::new(
        Configuration::locale(locale),
        Value::Item(Item::String(value.to_string())),
    )
}

/// All entry paths across `splits`, sorted, duplicates kept.
pub fn all_paths(splits: &[ModuleSplit]) -> Vec<String> {
    let mut paths: Vec<String> = splits
        .iter()
        .flat_map(|s| s.entries.iter().map(|e| e.path().to_string()))
        .collect();
    paths.sort();
    paths
}

pub fn suffixes(splits: &[ModuleSplit]) -> BTreeSet<&str> {
    splits.iter().map(|s| s.suffix.as_str()).collect()
}
