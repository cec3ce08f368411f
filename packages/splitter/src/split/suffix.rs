//! Collision-free split name suffixes.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::targeting::VariantTargeting;

/// Hands out unique suffixes per module and variant.
///
/// One instance is shared by every module splitting call of a bundle run.
/// The first request for a suffix gets it unchanged; later requests for the
/// same suffix get `_2`, `_3`, ... appended.
#[derive(Debug, Default)]
pub struct SuffixManager {
    used: Mutex<HashMap<(String, VariantTargeting), HashSet<String>>>,
}

impl SuffixManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a suffix based on `proposed`.
    pub fn resolve(&self, module: &str, variant: &VariantTargeting, proposed: &str) -> String {
        // Each insert is a single call, so a poisoned map is still consistent.
        let mut used = self
            .used
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let taken = used
            .entry((module.to_string(), variant.clone()))
            .or_default();

        let mut suffix = proposed.to_string();
        let mut serial = 1;
        while taken.contains(&suffix) {
            serial += 1;
            suffix = format!("{proposed}_{serial}");
        }
        if serial > 1 {
            tracing::debug!(
                module = %module,
                proposed = %proposed,
                resolved = %suffix,
                "Split suffix collision resolved"
            );
        }
        taken.insert(suffix.clone());
        suffix
    }
}
