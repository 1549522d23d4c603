use std::time::Instant;

use tracing::{debug, info, warn};

use super::{
    check_enough_submissions, compare_pair, missing_base_code_marks, paging::LoadError, store_base_code_marks,
    valid_ids, Collector, ComparisonStrategy, MemoryGauge, StrategyOptions, TokenStore,
};
use crate::{
    algorithm::GreedyStringTiling,
    error::Error,
    result::ComparisonResult,
    submission::{SubmissionId, SubmissionSet},
};

pub const DEFAULT_MEMORY_PRESSURE_FACTOR: u64 = 2;

/// Compares corpora whose token sequences don't fit in memory at once.
///
/// Submissions are loaded in blocks sized by the free memory. Block A is compared with itself, then
/// the submissions after it are streamed through one block B at a time, each compared with all of A
/// and evicted right after. Once the corpus end is reached A is evicted and the next A starts where the
/// old one ended. Every unordered pair is compared exactly once.
pub struct ExternalStrategy<'a, S, G> {
    gst: &'a GreedyStringTiling,
    options: StrategyOptions,
    store: S,
    gauge: G,
    memory_pressure_factor: u64,
}

impl<'a, S: TokenStore, G: MemoryGauge> ExternalStrategy<'a, S, G> {
    pub fn new(gst: &'a GreedyStringTiling, options: StrategyOptions, store: S, gauge: G) -> ExternalStrategy<'a, S, G> {
        ExternalStrategy {
            gst,
            options,
            store,
            gauge,
            memory_pressure_factor: DEFAULT_MEMORY_PRESSURE_FACTOR,
        }
    }

    /// A fill stops once free memory falls below `1 / factor` of what was free before it.
    /// A fill starting without free memory keeps a single submission.
    pub fn with_memory_pressure_factor(mut self, factor: u64) -> ExternalStrategy<'a, S, G> {
        self.memory_pressure_factor = factor.max(1);
        self
    }

    /// Loads `ids[from..]` until memory runs short and returns the position of the last one kept.
    ///
    /// At least `ids[from]` is attempted. A submission that failed with `OutOfMemory` after it is
    /// left for a later fill, one that failed otherwise stays absent and its pairs are skipped.
    pub(crate) fn fill_memory(&self, set: &mut SubmissionSet, ids: &[SubmissionId], from: usize) -> usize {
        let free_before = self.gauge.free_capacity(set);
        // With nothing free to begin with, only `ids[from]` may be loaded.
        let under_pressure =
            |free: u64| free_before == 0 || free.saturating_mul(self.memory_pressure_factor) < free_before;

        let mut last = from;
        for (position, &id) in ids.iter().enumerate().skip(from) {
            last = position;
            if set[id].is_loaded() {
                continue;
            }
            match self.store.load(&set[id]) {
                Ok(tokens) => set.get_mut(id).set_tokens(tokens),
                Err(LoadError::OutOfMemory { name }) => {
                    debug!(name = %name, "out of memory while loading");
                    if position > from {
                        last = position - 1;
                    }
                    break;
                }
                Err(err) => warn!("{err}"),
            }
            if under_pressure(self.gauge.free_capacity(set)) {
                break;
            }
        }

        let mut free_after = self.gauge.free_capacity(set);
        while last > from && under_pressure(free_after) {
            set.get_mut(ids[last]).evict();
            last -= 1;
            free_after = self.gauge.free_capacity(set);
        }
        debug!(from, last, free_before, free_after, "filled memory");

        for id in missing_base_code_marks(self.gst, set) {
            let marks = self.gst.compare_with_base_code(&set[id]);
            store_base_code_marks(set, id, marks);
        }
        last
    }
}

impl<S: TokenStore, G: MemoryGauge> ComparisonStrategy for ExternalStrategy<'_, S, G> {
    fn compare_submissions(&self, set: &mut SubmissionSet) -> Result<ComparisonResult, Error> {
        check_enough_submissions(set)?;
        let started = Instant::now();
        set.evict_all();

        let ids = valid_ids(set);
        let n = ids.len();
        info!(submissions = n, "comparing submissions in blocks");
        let mut collector = Collector::default();

        let mut start_a = 0;
        while start_a < n {
            let loaded_end = self.fill_memory(set, &ids, start_a);
            let end_a = if loaded_end == n - 1 {
                loaded_end
            } else {
                start_a + (loaded_end - start_a) / 2
            };
            debug!(start_a, end_a, "comparing block");
            for first in start_a..=end_a {
                for second in first + 1..=end_a {
                    collector.add(compare_pair(self.gst, set, ids[first], ids[second], &self.options));
                }
            }

            let mut start_b = end_a + 1;
            let mut end_b = loaded_end;
            while start_b < n {
                if start_b > end_b {
                    end_b = self.fill_memory(set, &ids, start_b);
                }
                debug!(start_a, end_a, start_b, end_b, "streaming block");
                for second in start_b..=end_b {
                    for first in start_a..=end_a {
                        collector.add(compare_pair(self.gst, set, ids[first], ids[second], &self.options));
                    }
                    set.get_mut(ids[second]).evict();
                }
                start_b = end_b + 1;
            }

            for &id in &ids[start_a..=end_a] {
                set.get_mut(id).evict();
            }
            start_a = end_a + 1;
        }

        let duration = started.elapsed();
        info!(
            below_threshold = collector.below_threshold(),
            duration_ms = duration.as_millis() as u64,
            "comparisons finished"
        );
        Ok(collector.finish(duration, set, &self.options))
    }
}
