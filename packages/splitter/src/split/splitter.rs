//! Splitter trait and pipeline composition.

use super::module_split::ModuleSplit;
use crate::error::{Result, SplitterError};
use crate::targeting::Dimension;

/// Partitions one split into more narrowly targeted splits.
///
/// Implementations never lose entries: every entry of the input ends up in
/// exactly one output split.
pub trait ModuleSplitSplitter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>>;
}

/// Fail if `split` already carries targeting for `dimension`.
pub(crate) fn ensure_untargeted(split: &ModuleSplit, dimension: Dimension) -> Result<()> {
    if split.apk_targeting.targets(dimension) {
        return Err(SplitterError::PreconditionFailed(format!(
            "split of module '{}' is already targeted on {dimension:?}",
            split.module_name
        )));
    }
    Ok(())
}

/// An ordered list of splitters, each applied to every output of the previous.
#[derive(Default)]
pub struct SplittingPipeline {
    splitters: Vec<Box<dyn ModuleSplitSplitter>>,
}

impl SplittingPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a splitter.
    #[must_use]
    pub fn with(mut self, splitter: impl ModuleSplitSplitter + 'static) -> Self {
        self.splitters.push(Box::new(splitter));
        self
    }

    /// Append already boxed splitters in order.
    #[must_use]
    pub fn with_all(
        mut self,
        splitters: impl IntoIterator<Item = Box<dyn ModuleSplitSplitter>>,
    ) -> Self {
        self.splitters.extend(splitters);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.splitters.is_empty()
    }

    /// Run all stages.
    pub fn split(&self, initial: ModuleSplit) -> Result<Vec<ModuleSplit>> {
        let mut splits = vec![initial];
        for splitter in &self.splitters {
            let mut next = Vec::with_capacity(splits.len());
            for split in splits {
                next.extend(splitter.split(split)?);
            }
            tracing::debug!(
                splitter = splitter.name(),
                splits = next.len(),
                "Pipeline stage applied"
            );
            splits = next;
        }
        Ok(splits)
    }
}
