//! Module splitting.
//!
//! A module is split by running its entries through independent pipelines
//! of [`ModuleSplitSplitter`]s (resources, native code, assets, dex), merging
//! the results by targeting and naming the resulting config splits.

mod abi;
mod assets;
mod compression;
mod density;
mod language;
mod merger;
mod module_split;
mod module_splitter;
mod pinning;
mod splitter;
mod suffix;

pub use abi::{AbiNativeLibrariesSplitter, ApexImagesSplitter};
pub use assets::{
    assets_splitters, country_set, device_group, device_tier, language, strip_targeted_suffixes,
    texture_compression_format, AssetsDimension, AssetsDimensionSplitter,
};
pub use compression::{DexCompressionSplitter, NativeLibrariesCompressionSplitter};
pub use density::ScreenDensityResourcesSplitter;
pub use language::LanguageResourcesSplitter;
pub use merger::merge_same_targeting;
pub use module_split::{ManifestMutator, ModuleSplit, SplitType};
pub use module_splitter::ModuleSplitter;
pub use pinning::PinnedResources;
pub use splitter::{ModuleSplitSplitter, SplittingPipeline};
pub use suffix::SuffixManager;
