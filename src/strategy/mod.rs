pub mod external;
pub mod normal;
pub mod paging;
pub mod parallel;

use std::{sync::Arc, time::Duration};

use clap::ValueEnum;
use serde::Deserialize;
use tracing::warn;

pub use self::{
    external::ExternalStrategy,
    normal::NormalStrategy,
    paging::{InMemoryTokenStore, LoadError, MemoryGauge, SimulatedMemory, SystemMemory, TokenStore},
    parallel::ParallelStrategy,
};
use crate::{
    algorithm::{ComparisonError, GreedyStringTiling},
    comparison::{Comparison, SimilarityMetric},
    error::Error,
    result::{ComparisonResult, SkippedComparison},
    submission::{SubmissionId, SubmissionSet},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonMode {
    /// Compare every pair on the calling thread.
    #[default]
    Normal,
    /// Spread the pairs over a pool of worker threads.
    Parallel,
    /// Page token sequences in and out in blocks, for corpora that don't fit in memory.
    External,
}

/// Runs all pairwise comparisons of a submission set.
pub trait ComparisonStrategy {
    fn compare_submissions(&self, set: &mut SubmissionSet) -> Result<ComparisonResult, Error>;
}

#[derive(Clone, Copy, Debug)]
pub struct StrategyOptions {
    pub metric: SimilarityMetric,
    /// Comparisons less similar than this are left out of the result.
    pub similarity_threshold: f64,
}

impl Default for StrategyOptions {
    fn default() -> StrategyOptions {
        StrategyOptions {
            metric: SimilarityMetric::Average,
            similarity_threshold: 0.0,
        }
    }
}

pub(crate) enum Outcome {
    Compared(Comparison),
    BelowThreshold,
    Skipped(SkippedComparison),
}

pub(crate) fn check_enough_submissions(set: &SubmissionSet) -> Result<(), Error> {
    let found = set.number_of_valid_submissions();
    if found < 2 {
        return Err(Error::NotEnoughSubmissions { found });
    }
    Ok(())
}

pub(crate) fn valid_ids(set: &SubmissionSet) -> Vec<SubmissionId> {
    set.ids().filter(|&id| set[id].is_valid()).collect()
}

/// Every unordered pair of `ids`, the lower position first.
pub(crate) fn pairs(ids: &[SubmissionId]) -> Vec<(SubmissionId, SubmissionId)> {
    let mut pairs = Vec::with_capacity(ids.len() * ids.len().saturating_sub(1) / 2);
    for (i, &first) in ids.iter().enumerate() {
        for &second in &ids[i + 1..] {
            pairs.push((first, second));
        }
    }
    pairs
}

pub(crate) fn compare_pair(
    gst: &GreedyStringTiling,
    set: &SubmissionSet,
    first: SubmissionId,
    second: SubmissionId,
    options: &StrategyOptions,
) -> Outcome {
    match gst.compare(set, first, second) {
        Ok(comparison) if comparison.similarity(options.metric) < options.similarity_threshold => {
            Outcome::BelowThreshold
        }
        Ok(comparison) => Outcome::Compared(comparison),
        Err(err) => {
            warn!(first = set[first].name(), second = set[second].name(), "skipping comparison: {err}");
            let submissions = if first <= second { [first, second] } else { [second, first] };
            Outcome::Skipped(SkippedComparison {
                submissions,
                names: submissions.map(|id| set[id].shared_name()),
                reason: err.to_string(),
            })
        }
    }
}

/// Loaded submissions that were not tiled against the base code yet.
pub(crate) fn missing_base_code_marks(gst: &GreedyStringTiling, set: &SubmissionSet) -> Vec<SubmissionId> {
    if !gst.has_base_code() {
        return vec![];
    }
    set.ids()
        .filter(|&id| set[id].is_loaded() && set[id].base_code_marks().is_none())
        .collect()
}

pub(crate) fn store_base_code_marks(
    set: &mut SubmissionSet,
    id: SubmissionId,
    marks: Result<Arc<[bool]>, ComparisonError>,
) {
    match marks {
        Ok(marks) => set.get_mut(id).set_base_code_marks(marks),
        // Left unmarked, every comparison of this submission is then skipped.
        Err(err) => warn!(name = set[id].name(), "base code comparison failed: {err}"),
    }
}

#[derive(Default)]
pub(crate) struct Collector {
    comparisons: Vec<Comparison>,
    skipped: Vec<SkippedComparison>,
    below_threshold: usize,
}

impl Collector {
    pub fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Compared(comparison) => self.comparisons.push(comparison),
            Outcome::BelowThreshold => self.below_threshold += 1,
            Outcome::Skipped(skipped) => self.skipped.push(skipped),
        }
    }

    pub fn below_threshold(&self) -> usize {
        self.below_threshold
    }

    pub fn finish(self, duration: Duration, set: &SubmissionSet, options: &StrategyOptions) -> ComparisonResult {
        ComparisonResult::new(self.comparisons, self.skipped, duration, set.len(), options.metric)
    }
}
