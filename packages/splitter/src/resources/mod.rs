//! Resource table model, density matching and reachability analysis.

mod analyzer;
mod density;
mod table;

pub use analyzer::{ModuleXmlReader, ReachabilityReport, ResourceAnalyzer, XmlResourceReader};
pub use density::{lower_wins, DensityMatchingPolicy, ScreenDensitySelector};
pub use table::{
    resource_id, CompoundValue, ConfigValue, Configuration, Entry, EntryRef, Item, Package,
    ResourceId, ResourceTable, ResourceType, StyleItem, Value, DENSITY_ANY, DENSITY_DEFAULT,
    DENSITY_NONE,
};

#[cfg(test)]
pub(crate) use table::test_support;
