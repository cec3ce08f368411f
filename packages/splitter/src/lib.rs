//! Bundlesplit Splitter - Partition app bundle modules into device-targeted
//! split APKs.
//!
//! Given the modules of an app bundle and a [`GenerationConfig`], this crate
//! decides which SDK-version variants the app is served as and, for every
//! module and variant, which files go into which split. Each split carries
//! the targeting (ABI, screen density, language, texture compression format,
//! device tier, ...) a device must match to receive it, plus the alternatives
//! observed for that dimension.
//!
//! # Example
//!
//! ```
//! use bundlesplit_splitter::{
//!     AndroidManifest, AppBundle, BundleModule, BundleSplitter, GenerationConfig, ModuleEntry,
//! };
//!
//! let base = BundleModule::new("base", AndroidManifest::new("com.example.app"))
//!     .with_entry(ModuleEntry::new("lib/x86/libgame.so", "x86"))
//!     .with_entry(ModuleEntry::new("lib/arm64-v8a/libgame.so", "arm64"))
//!     .with_derived_configs()
//!     .unwrap();
//! let bundle = AppBundle::new(vec![base]);
//! let config = GenerationConfig::default();
//!
//! let splits = BundleSplitter::new(&bundle, &config).split().unwrap();
//! assert!(splits.iter().any(|s| s.suffix == "x86"));
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Platform constants, generation options and validation
//! - [`error`]: Error types and Result alias
//! - [`targeting`]: Targeting model and targeted directory names
//! - [`model`]: Modules, entries, manifests and targeting configs
//! - [`resources`]: Resource tables, density matching and reachability
//! - [`validation`]: Module layout checks run before splitting
//! - [`split`]: Splitters, pipelines and per-module orchestration
//! - [`variants`]: SDK variant generation
//! - [`bundle_splitter`]: Bundle-wide splitting on a worker pool

pub mod bundle_splitter;
pub mod config;
pub mod error;
pub mod model;
pub mod resources;
pub mod split;
pub mod targeting;
pub mod validation;
pub mod variants;

// Re-export main entry points
pub use bundle_splitter::BundleSplitter;
pub use split::{ModuleSplit, ModuleSplitter, SuffixManager};

// Re-export commonly used items
pub use config::{GenerationConfig, OptimizationDimension};
pub use error::{Result, SplitterError};
pub use model::{AndroidManifest, AppBundle, BundleModule, ModuleEntry};
pub use targeting::{ApkTargeting, VariantTargeting};
