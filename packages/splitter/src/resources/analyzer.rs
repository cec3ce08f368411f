//! Resource reachability.
//!
//! Computes the set of resources transitively referenced from a manifest.
//! References are followed through direct item references, compiled XML
//! files, attribute symbols and style parents and items.

use std::collections::{BTreeSet, VecDeque};

use super::table::{CompoundValue, Item, ResourceId, ResourceTable, Value};
use crate::error::{Result, SplitterError, XmlReadError};
use crate::model::{AndroidManifest, BundleModule, XmlNode};

/// Reads a compiled XML resource file referenced from the resource table.
pub trait XmlResourceReader {
    fn read(&self, path: &str) -> std::result::Result<XmlNode, XmlReadError>;
}

/// Reads XML resources from a module's entries.
pub struct ModuleXmlReader<'a> {
    module: &'a BundleModule,
}

impl<'a> ModuleXmlReader<'a> {
    #[must_use]
    pub fn new(module: &'a BundleModule) -> Self {
        Self { module }
    }
}

impl XmlResourceReader for ModuleXmlReader<'_> {
    fn read(&self, path: &str) -> std::result::Result<XmlNode, XmlReadError> {
        let entry = self.module.entry(path).ok_or(XmlReadError::MissingEntry)?;
        let text = std::str::from_utf8(entry.content())?;
        XmlNode::parse(text)
    }
}

/// Outcome of a reachability analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachabilityReport {
    /// Resources present in the table and reachable from the roots.
    pub reachable: BTreeSet<ResourceId>,
    /// Non-zero ids that were referenced but are missing from the table.
    pub dangling: BTreeSet<ResourceId>,
}

/// Breadth-first closure over the resource reference graph.
pub struct ResourceAnalyzer<'a, R: XmlResourceReader> {
    module_name: &'a str,
    table: &'a ResourceTable,
    reader: R,
}

impl<'a> ResourceAnalyzer<'a, ModuleXmlReader<'a>> {
    /// Analyzer over a module's own resource table and entries.
    ///
    /// Returns `None` when the module has no resource table.
    #[must_use]
    pub fn for_module(module: &'a BundleModule) -> Option<Self> {
        let table = module.resource_table.as_ref()?;
        Some(Self::new(&module.name, table, ModuleXmlReader::new(module)))
    }
}

impl<'a, R: XmlResourceReader> ResourceAnalyzer<'a, R> {
    #[must_use]
    pub fn new(module_name: &'a str, table: &'a ResourceTable, reader: R) -> Self {
        Self {
            module_name,
            table,
            reader,
        }
    }

    /// Resources reachable from the manifest's compiled attribute values.
    pub fn find_manifest_reachable(
        &self,
        manifest: &AndroidManifest,
    ) -> Result<ReachabilityReport> {
        self.find_reachable(manifest.resource_references())
    }

    /// Resources reachable from the given roots.
    pub fn find_reachable(
        &self,
        roots: impl IntoIterator<Item = ResourceId>,
    ) -> Result<ReachabilityReport> {
        let mut report = ReachabilityReport::default();
        let mut queue: VecDeque<ResourceId> = roots.into_iter().collect();

        while let Some(id) = queue.pop_front() {
            if id == 0 || report.reachable.contains(&id) || report.dangling.contains(&id) {
                continue;
            }
            let Some(entry) = self.table.entry(id) else {
                tracing::warn!(
                    module = %self.module_name,
                    resource_id = %format!("{id:#010x}"),
                    "Referenced resource is missing from the resource table"
                );
                report.dangling.insert(id);
                continue;
            };
            report.reachable.insert(id);

            for config_value in &entry.values {
                self.references(&config_value.value, &mut queue)?;
            }
        }

        tracing::debug!(
            module = %self.module_name,
            reachable = report.reachable.len(),
            dangling = report.dangling.len(),
            "Resource reachability computed"
        );
        Ok(report)
    }

    fn references(&self, value: &Value, queue: &mut VecDeque<ResourceId>) -> Result<()> {
        match value {
            Value::Item(item) => self.item_references(item, queue)?,
            Value::Compound(CompoundValue::Attr { symbols }) => queue.extend(symbols),
            Value::Compound(CompoundValue::Style { parent, items }) => {
                queue.extend(parent);
                for style_item in items {
                    queue.push_back(style_item.key);
                    self.item_references(&style_item.item, queue)?;
                }
            }
            Value::Compound(CompoundValue::Array { elements }) => {
                for item in elements {
                    self.item_references(item, queue)?;
                }
            }
            Value::Compound(CompoundValue::Plural { items }) => {
                for item in items {
                    self.item_references(item, queue)?;
                }
            }
        }
        Ok(())
    }

    fn item_references(&self, item: &Item, queue: &mut VecDeque<ResourceId>) -> Result<()> {
        match item {
            Item::Reference(id) => queue.push_back(*id),
            Item::File(path) if path.ends_with(".xml") => {
                let node = self
                    .reader
                    .read(path)
                    .map_err(|source| SplitterError::ResourceFileRead {
                        module: self.module_name.to_string(),
                        path: path.clone(),
                        source,
                    })?;
                queue.extend(node.compiled_references());
            }
            Item::File(_) | Item::String(_) | Item::Primitive(_) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::resources::table::test_support::{file, table};
    use crate::resources::table::{resource_id, ConfigValue, Configuration, StyleItem};
    use pretty_assertions::assert_eq;

    struct MapReader(HashMap<String, String>);

    impl XmlResourceReader for MapReader {
        fn read(&self, path: &str) -> std::result::Result<XmlNode, XmlReadError> {
            let text = self.0.get(path).ok_or(XmlReadError::MissingEntry)?;
            XmlNode::parse(text)
        }
    }

    fn reference(id: ResourceId) -> ConfigValue {
        ConfigValue::new(Configuration::default(), Value::Item(Item::Reference(id)))
    }

    fn id(entry: u16) -> ResourceId {
        resource_id(0x7f, 1, entry)
    }

    fn no_files() -> MapReader {
        MapReader(HashMap::new())
    }

    #[test]
    fn test_chain_of_references() {
        let table = table(vec![
            (1, "string", 0, "a", vec![reference(id(1))]),
            (1, "string", 1, "b", vec![reference(id(2))]),
            (1, "string", 2, "c", vec![]),
            (1, "string", 3, "unused", vec![]),
        ]);
        let analyzer = ResourceAnalyzer::new("base", &table, no_files());
        let report = analyzer.find_reachable([id(0)]).unwrap();
        assert_eq!(report.reachable, BTreeSet::from([id(0), id(1), id(2)]));
        assert!(report.dangling.is_empty());
    }

    #[test]
    fn test_zero_id_contributes_nothing() {
        let table = table(vec![(1, "string", 0, "a", vec![reference(0)])]);
        let analyzer = ResourceAnalyzer::new("base", &table, no_files());
        let report = analyzer.find_reachable([id(0)]).unwrap();
        assert_eq!(report.reachable, BTreeSet::from([id(0)]));
        assert!(report.dangling.is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let table = table(vec![
            (1, "string", 0, "a", vec![reference(id(1))]),
            (1, "string", 1, "b", vec![reference(id(0))]),
        ]);
        let analyzer = ResourceAnalyzer::new("base", &table, no_files());
        let report = analyzer.find_reachable([id(0)]).unwrap();
        assert_eq!(report.reachable, BTreeSet::from([id(0), id(1)]));
    }

    #[test]
    fn test_dangling_reference_is_reported() {
        let table = table(vec![(1, "string", 0, "a", vec![reference(id(9))])]);
        let analyzer = ResourceAnalyzer::new("base", &table, no_files());
        let report = analyzer.find_reachable([id(0)]).unwrap();
        assert_eq!(report.reachable, BTreeSet::from([id(0)]));
        assert_eq!(report.dangling, BTreeSet::from([id(9)]));
    }

    #[test]
    fn test_style_and_attr_references() {
        let attr = resource_id(0x7f, 2, 0);
        let symbol = resource_id(0x7f, 2, 1);
        let parent = resource_id(0x7f, 3, 1);
        let style = ConfigValue::new(
            Configuration::default(),
            Value::Compound(CompoundValue::Style {
                parent: Some(parent),
                items: vec![StyleItem {
                    key: attr,
                    item: Item::Reference(id(0)),
                }],
            }),
        );
        let table = table(vec![
            (1, "string", 0, "a", vec![]),
            (
                2,
                "attr",
                0,
                "mode",
                vec![ConfigValue::new(
                    Configuration::default(),
                    Value::Compound(CompoundValue::Attr {
                        symbols: vec![symbol],
                    }),
                )],
            ),
            (2, "attr", 1, "mode_on", vec![]),
            (3, "style", 0, "Theme", vec![style]),
            (3, "style", 1, "Theme.Base", vec![]),
        ]);
        let analyzer = ResourceAnalyzer::new("base", &table, no_files());
        let report = analyzer.find_reachable([resource_id(0x7f, 3, 0)]).unwrap();
        assert_eq!(
            report.reachable,
            BTreeSet::from([resource_id(0x7f, 3, 0), parent, attr, symbol, id(0)])
        );
    }

    #[test]
    fn test_xml_file_references_are_followed() {
        let layout = resource_id(0x7f, 4, 0);
        let table = table(vec![
            (1, "string", 0, "title", vec![]),
            (
                4,
                "layout",
                0,
                "main",
                vec![file(Configuration::default(), "res/layout/main.xml")],
            ),
        ]);
        let reader = MapReader(HashMap::from([(
            "res/layout/main.xml".to_string(),
            r#"<LinearLayout><TextView text="@0x7f010000"/></LinearLayout>"#.to_string(),
        )]));
        let analyzer = ResourceAnalyzer::new("base", &table, reader);
        let report = analyzer.find_reachable([layout]).unwrap();
        assert_eq!(report.reachable, BTreeSet::from([layout, id(0)]));
    }

    #[test]
    fn test_unreadable_xml_file_fails() {
        let table = table(vec![(
            4,
            "layout",
            0,
            "main",
            vec![file(Configuration::default(), "res/layout/main.xml")],
        )]);
        let analyzer = ResourceAnalyzer::new("feature", &table, no_files());
        let err = analyzer
            .find_reachable([resource_id(0x7f, 4, 0)])
            .unwrap_err();
        match err {
            SplitterError::ResourceFileRead { module, path, .. } => {
                assert_eq!(module, "feature");
                assert_eq!(path, "res/layout/main.xml");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_manifest_roots() {
        let table = table(vec![(1, "string", 0, "app_name", vec![])]);
        let manifest = AndroidManifest::parse(
            r#"<manifest package="p"><application label="@0x7f010000"/></manifest>"#,
        )
        .unwrap();
        let analyzer = ResourceAnalyzer::new("base", &table, no_files());
        let report = analyzer.find_manifest_reachable(&manifest).unwrap();
        assert_eq!(report.reachable, BTreeSet::from([id(0)]));
    }
}
