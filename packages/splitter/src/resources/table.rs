//! Parsed resource table.
//!
//! The table is consumed as an already-decoded structure:
//! package → type → entry → per-configuration values.

use std::collections::BTreeSet;

/// Numeric resource id: `0xPPTTEEEE` (package, type, entry).
pub type ResourceId = u32;

/// Build a resource id from its parts.
#[must_use]
pub fn resource_id(package: u8, type_id: u8, entry: u16) -> ResourceId {
    (u32::from(package) << 24) | (u32::from(type_id) << 16) | u32::from(entry)
}

/// Density of a configuration without density qualifier.
pub const DENSITY_DEFAULT: u32 = 0;
/// `anydpi`: usable at any density, always preferred.
pub const DENSITY_ANY: u32 = 0xfffe;
/// `nodpi`: never scaled.
pub const DENSITY_NONE: u32 = 0xffff;

/// A simple value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Item {
    /// Reference to another resource. Id 0 marks a static-library resource
    /// resolved at runtime.
    Reference(ResourceId),
    /// File inside the module (e.g. `res/drawable-hdpi/icon.png`).
    File(String),
    String(String),
    Primitive(u32),
}

/// A style attribute/value pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleItem {
    /// Attribute id being styled.
    pub key: ResourceId,
    pub item: Item,
}

/// A compound value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompoundValue {
    /// Attribute definition with enum/flag symbols.
    Attr { symbols: Vec<ResourceId> },
    Style {
        parent: Option<ResourceId>,
        items: Vec<StyleItem>,
    },
    Array { elements: Vec<Item> },
    Plural { items: Vec<Item> },
}

/// Value of a resource for one configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Item(Item),
    Compound(CompoundValue),
}

impl Value {
    /// Path of the file this value points at, if any.
    #[must_use]
    pub fn file_path(&self) -> Option<&str> {
        match self {
            Value::Item(Item::File(path)) => Some(path),
            _ => None,
        }
    }
}

/// Device configuration a value applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Configuration {
    /// BCP-47-ish locale as in resource qualifiers (`fr`, `fr-rCA`, `b+sr+Latn`).
    pub locale: String,
    /// Density in dpi, or one of the `DENSITY_*` markers.
    pub density: u32,
    /// Remaining qualifiers, opaque (`land-v21`).
    pub qualifiers: String,
}

impl Configuration {
    /// Configuration for a locale.
    #[must_use]
    pub fn locale(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            ..Default::default()
        }
    }

    /// Configuration for a density.
    #[must_use]
    pub fn density(density: u32) -> Self {
        Self {
            density,
            ..Default::default()
        }
    }

    /// Language subtag of the locale, empty when not language specific.
    #[must_use]
    pub fn language(&self) -> String {
        let locale = self.locale.as_str();
        let language = match locale.strip_prefix("b+") {
            Some(tag) => tag.split('+').next().unwrap_or_default(),
            None => locale.split('-').next().unwrap_or_default(),
        };
        language.to_ascii_lowercase()
    }

    /// The same configuration with the density qualifier cleared.
    #[must_use]
    pub fn without_density(&self) -> Self {
        Self {
            density: DENSITY_DEFAULT,
            ..self.clone()
        }
    }
}

/// A value bound to a configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigValue {
    pub config: Configuration,
    pub value: Value,
}

impl ConfigValue {
    #[must_use]
    pub fn new(config: Configuration, value: Value) -> Self {
        Self { config, value }
    }
}

/// A resource entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: u16,
    pub name: String,
    pub values: Vec<ConfigValue>,
}

/// A resource type (`drawable`, `string`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceType {
    pub id: u8,
    pub name: String,
    pub entries: Vec<Entry>,
}

/// A resource package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: u8,
    pub name: String,
    pub types: Vec<ResourceType>,
}

/// A resource table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTable {
    pub packages: Vec<Package>,
}

/// Borrowed view of an entry with its location in the table.
#[derive(Debug, Clone, Copy)]
pub struct EntryRef<'a> {
    pub id: ResourceId,
    pub type_name: &'a str,
    pub entry: &'a Entry,
}

impl EntryRef<'_> {
    /// `type/name`, e.g. `string/app_name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.type_name, self.entry.name)
    }
}

impl ResourceTable {
    /// Whether the table holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// All entries in table order.
    pub fn entries(&self) -> impl Iterator<Item = EntryRef<'_>> {
        self.packages.iter().flat_map(|package| {
            package.types.iter().flat_map(move |ty| {
                ty.entries.iter().map(move |entry| EntryRef {
                    id: resource_id(package.id, ty.id, entry.id),
                    type_name: &ty.name,
                    entry,
                })
            })
        })
    }

    /// Look up an entry by id.
    #[must_use]
    pub fn entry(&self, id: ResourceId) -> Option<&Entry> {
        self.entries().find(|e| e.id == id).map(|e| e.entry)
    }

    /// Rebuild the table keeping, per entry, the values returned by `select`.
    ///
    /// Entries, types and packages left without values are dropped.
    #[must_use]
    pub fn select_values<F>(&self, mut select: F) -> ResourceTable
    where
        F: FnMut(EntryRef<'_>) -> Vec<ConfigValue>,
    {
        let packages = self
            .packages
            .iter()
            .filter_map(|package| {
                let types: Vec<ResourceType> = package
                    .types
                    .iter()
                    .filter_map(|ty| {
                        let entries: Vec<Entry> = ty
                            .entries
                            .iter()
                            .filter_map(|entry| {
                                let values = select(EntryRef {
                                    id: resource_id(package.id, ty.id, entry.id),
                                    type_name: &ty.name,
                                    entry,
                                });
                                (!values.is_empty()).then(|| Entry {
                                    id: entry.id,
                                    name: entry.name.clone(),
                                    values,
                                })
                            })
                            .collect();
                        (!entries.is_empty()).then(|| ResourceType {
                            id: ty.id,
                            name: ty.name.clone(),
                            entries,
                        })
                    })
                    .collect();
                (!types.is_empty()).then(|| Package {
                    id: package.id,
                    name: package.name.clone(),
                    types,
                })
            })
            .collect();
        ResourceTable { packages }
    }

    /// Keep only values matching `keep`.
    #[must_use]
    pub fn filter_values<F>(&self, keep: F) -> ResourceTable
    where
        F: Fn(EntryRef<'_>, &ConfigValue) -> bool,
    {
        self.select_values(|entry| {
            entry
                .entry
                .values
                .iter()
                .filter(|value| keep(entry, value))
                .cloned()
                .collect()
        })
    }

    /// Keep only the entries whose id is in `ids`.
    #[must_use]
    pub fn retain_ids(&self, ids: &BTreeSet<ResourceId>) -> ResourceTable {
        self.filter_values(|entry, _| ids.contains(&entry.id))
    }

    /// Paths of all files referenced by values in the table.
    #[must_use]
    pub fn referenced_files(&self) -> BTreeSet<String> {
        self.entries()
            .flat_map(|e| e.entry.values.iter())
            .filter_map(|cv| cv.value.file_path().map(str::to_string))
            .collect()
    }

    /// Union of two tables. Duplicate values are kept once.
    #[must_use]
    pub fn merge(&self, other: &ResourceTable) -> ResourceTable {
        let mut merged = self.clone();
        for package in &other.packages {
            let target_package = match merged.packages.iter().position(|p| p.id == package.id) {
                Some(index) => &mut merged.packages[index],
                None => {
                    merged.packages.push(Package {
                        id: package.id,
                        name: package.name.clone(),
                        types: Vec::new(),
                    });
                    let last = merged.packages.len() - 1;
                    &mut merged.packages[last]
                }
            };
            for ty in &package.types {
                let target_type = match target_package.types.iter().position(|t| t.id == ty.id) {
                    Some(index) => &mut target_package.types[index],
                    None => {
                        target_package.types.push(ResourceType {
                            id: ty.id,
                            name: ty.name.clone(),
                            entries: Vec::new(),
                        });
                        let last = target_package.types.len() - 1;
                        &mut target_package.types[last]
                    }
                };
                for entry in &ty.entries {
                    match target_type.entries.iter_mut().find(|e| e.id == entry.id) {
                        Some(existing) => {
                            for value in &entry.values {
                                if !existing.values.contains(value) {
                                    existing.values.push(value.clone());
                                }
                            }
                        }
                        None => target_type.entries.push(entry.clone()),
                    }
                }
                target_type.entries.sort_by_key(|e| e.id);
            }
            target_package.types.sort_by_key(|t| t.id);
        }
        merged.packages.sort_by_key(|p| p.id);
        merged
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Single-package table builder:
    /// `(type_id, type_name, entry_id, entry_name, values)`.
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

    pub fn string(config: Configuration, text: &str) -> ConfigValue {
        ConfigValue::new(config, Value::Item(Item::String(text.to_string())))
    }
}
