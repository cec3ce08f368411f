//! Screen density matching.
//!
//! Reproduces the platform's nearest-density rule: between a lower candidate
//! `L` and a higher candidate `H` bracketing the desired density `d`, `L` is
//! chosen iff `(2L - d) * H > d * d`. This is not midpoint rounding; scaling
//! down a higher density asset is preferred over scaling up a lower one.

use std::collections::BTreeSet;

use semver::Version;

use super::table::{ConfigValue, DENSITY_ANY, DENSITY_DEFAULT, DENSITY_NONE};
use crate::config::DENSITY_EXPLICIT_MDPI_VERSION;
use crate::targeting::{DensityAlias, ScreenDensity};

/// How to break the tie between a value without density qualifier and an
/// explicit value at the default density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityMatchingPolicy {
    /// The unqualified value wins.
    PreferUnqualified,
    /// The explicit value wins.
    PreferExplicit,
}

impl DensityMatchingPolicy {
    /// Policy in effect for the given tool version.
    #[must_use]
    pub fn for_version(version: &Version) -> Self {
        if *version < DENSITY_EXPLICIT_MDPI_VERSION {
            Self::PreferUnqualified
        } else {
            Self::PreferExplicit
        }
    }
}

/// Selects density-specific resource values.
#[derive(Debug, Clone, Copy)]
pub struct ScreenDensitySelector {
    policy: DensityMatchingPolicy,
}

impl ScreenDensitySelector {
    #[must_use]
    pub fn new(policy: DensityMatchingPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn for_tool_version(version: &Version) -> Self {
        Self::new(DensityMatchingPolicy::for_version(version))
    }

    /// The value a device of `desired` density would load.
    ///
    /// `candidates` are the values of one entry that differ only in density.
    #[must_use]
    pub fn select_best<'a>(
        &self,
        candidates: &'a [ConfigValue],
        desired: ScreenDensity,
    ) -> Option<&'a ConfigValue> {
        if let Some(any) = candidates.iter().find(|c| c.config.density == DENSITY_ANY) {
            return Some(any);
        }
        let scalable = scalable(candidates);
        if scalable.is_empty() {
            return candidates.first();
        }
        self.best_for_dpi(&scalable, desired_dpi(desired))
    }

    /// Every value a device served by the `desired` split could load.
    ///
    /// `alternatives` are the other densities that get their own split. The
    /// desired split serves every device dpi between the cutoffs to its
    /// neighbouring alternatives; the result holds the candidates inside that
    /// range plus the best match at either end.
    #[must_use]
    pub fn select_all_matching<'a>(
        &self,
        candidates: &'a [ConfigValue],
        desired: ScreenDensity,
        alternatives: &BTreeSet<ScreenDensity>,
    ) -> Vec<&'a ConfigValue> {
        let any: Vec<&ConfigValue> = candidates
            .iter()
            .filter(|c| c.config.density == DENSITY_ANY)
            .collect();
        if !any.is_empty() {
            return any;
        }
        let scalable = scalable(candidates);
        if scalable.is_empty() {
            return candidates.iter().collect();
        }

        let (low, high) = serving_range(desired, alternatives);
        let best_low = self.best_for_dpi(&scalable, low);
        let best_high = self.best_for_dpi(&scalable, high);

        scalable
            .into_iter()
            .filter(|c| {
                let dpi = effective_dpi(c.config.density);
                (low..=high).contains(&dpi)
                    || best_low.is_some_and(|b| std::ptr::eq(b, *c))
                    || best_high.is_some_and(|b| std::ptr::eq(b, *c))
            })
            .collect()
    }

    fn best_for_dpi<'a>(
        &self,
        candidates: &[&'a ConfigValue],
        dpi: u32,
    ) -> Option<&'a ConfigValue> {
        let densities = || candidates.iter().map(|c| effective_dpi(c.config.density));
        let target = if densities().any(|d| d == dpi) {
            dpi
        } else {
            let below = densities().filter(|d| *d < dpi).max();
            let above = densities().filter(|d| *d > dpi).min();
            match (below, above) {
                (Some(low), Some(high)) => {
                    if lower_wins(low, high, dpi) {
                        low
                    } else {
                        high
                    }
                }
                (Some(low), None) => low,
                (None, Some(high)) => high,
                (None, None) => return None,
            }
        };
        self.pick_at(candidates, target)
    }

    fn pick_at<'a>(&self, candidates: &[&'a ConfigValue], dpi: u32) -> Option<&'a ConfigValue> {
        let mut matching = candidates
            .iter()
            .copied()
            .filter(|c| effective_dpi(c.config.density) == dpi);
        let first = matching.next()?;
        let Some(second) = matching.next() else {
            return Some(first);
        };
        let prefer_unqualified = self.policy == DensityMatchingPolicy::PreferUnqualified;
        let preferred = [first, second]
            .into_iter()
            .chain(matching)
            .find(|c| (c.config.density == DENSITY_DEFAULT) == prefer_unqualified);
        Some(preferred.unwrap_or(first))
    }
}

impl Default for ScreenDensitySelector {
    fn default() -> Self {
        Self::new(DensityMatchingPolicy::PreferExplicit)
    }
}

/// Whether `low` beats `high` for a device of density `desired`.
#[must_use]
pub fn lower_wins(low: u32, high: u32, desired: u32) -> bool {
    let (low, high, desired) = (i64::from(low), i64::from(high), i64::from(desired));
    (2 * low - desired) * high > desired * desired
}

/// Inclusive range of device dpi for which `desired` beats its neighbours.
fn serving_range(desired: ScreenDensity, alternatives: &BTreeSet<ScreenDensity>) -> (u32, u32) {
    let dpi = desired_dpi(desired);
    let lower = alternatives.iter().map(ScreenDensity::dpi).filter(|a| *a < dpi).max();
    let upper = alternatives.iter().map(ScreenDensity::dpi).filter(|a| *a > dpi).min();

    let low = match lower {
        Some(lower) => (lower + 1..=dpi)
            .find(|x| !lower_wins(lower, dpi, *x))
            .unwrap_or(dpi),
        None => 0,
    };
    let high = match upper {
        Some(upper) => (dpi..upper)
            .take_while(|x| lower_wins(dpi, upper, *x))
            .last()
            .unwrap_or(dpi),
        None => DENSITY_ANY - 1,
    };
    (low, high)
}

fn desired_dpi(desired: ScreenDensity) -> u32 {
    match desired {
        ScreenDensity::Alias(DensityAlias::Default) => DensityAlias::Mdpi.dpi(),
        other => other.dpi(),
    }
}

fn effective_dpi(density: u32) -> u32 {
    if density == DENSITY_DEFAULT {
        DensityAlias::Mdpi.dpi()
    } else {
        density
    }
}

fn scalable(candidates: &[ConfigValue]) -> Vec<&ConfigValue> {
    candidates
        .iter()
        .filter(|c| c.config.density != DENSITY_NONE)
        .collect()
}
