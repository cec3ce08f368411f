//! Bundle model: modules, entries, manifests and targeting configs.

mod configs;
mod entry;
mod manifest;
mod module;
pub mod xml;

pub use configs::{
    ApexImages, AssetsConfig, NativeLibraries, TargetedApexImage, TargetedAssetsDirectory,
    TargetedNativeDirectory, APEX_DIR, ASSETS_DIR, DEX_DIR, LIB_DIR,
};
pub use entry::ModuleEntry;
pub use manifest::AndroidManifest;
pub use module::{AppBundle, BundleModule, ModuleType, BASE_MODULE_NAME};
pub use xml::{XmlAttribute, XmlNode};
