//! Compression hints for native libraries and dex files.
//!
//! Neither splitter partitions entries; they mark entries to be stored
//! uncompressed in variants whose minimum SDK loads them in place.

use super::module_split::{ManifestMutator, ModuleSplit};
use super::splitter::ModuleSplitSplitter;
use crate::error::Result;
use crate::model::{ModuleEntry, DEX_DIR, LIB_DIR};

fn mark_uncompressed(entries: &[ModuleEntry], dir: &str) -> Vec<ModuleEntry> {
    entries
        .iter()
        .map(|e| {
            if e.is_under(dir) {
                e.with_force_uncompressed(true)
            } else {
                e.clone()
            }
        })
        .collect()
}

/// Stores native libraries uncompressed from `min_sdk` on and disables their
/// extraction in the master manifest.
#[derive(Debug)]
pub struct NativeLibrariesCompressionSplitter {
    min_sdk: u32,
}

impl NativeLibrariesCompressionSplitter {
    #[must_use]
    pub fn new(min_sdk: u32) -> Self {
        Self { min_sdk }
    }
}

impl ModuleSplitSplitter for NativeLibrariesCompressionSplitter {
    fn name(&self) -> &'static str {
        "native_compression"
    }

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>> {
        let has_native = split.entries.iter().any(|e| e.is_under(LIB_DIR));
        if !has_native || split.variant_targeting.min_sdk() < self.min_sdk {
            return Ok(vec![split]);
        }
        let entries = mark_uncompressed(&split.entries, LIB_DIR);
        Ok(vec![split
            .with_entries(entries)
            .with_master_manifest_mutator(ManifestMutator::ExtractNativeLibs(false))])
    }
}

/// Stores dex files uncompressed from `min_sdk` on.
#[derive(Debug)]
pub struct DexCompressionSplitter {
    min_sdk: Option<u32>,
}

impl DexCompressionSplitter {
    /// `None` disables the splitter.
    #[must_use]
    pub fn new(min_sdk: Option<u32>) -> Self {
        Self { min_sdk }
    }
}

impl ModuleSplitSplitter for DexCompressionSplitter {
    fn name(&self) -> &'static str {
        "dex_compression"
    }

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>> {
        match self.min_sdk {
            Some(min_sdk) if split.variant_targeting.min_sdk() >= min_sdk => {
                let entries = mark_uncompressed(&split.entries, DEX_DIR);
                Ok(vec![split.with_entries(entries)])
            }
            _ => Ok(vec![split]),
        }
    }
}
