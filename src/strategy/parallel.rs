use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use super::{
    check_enough_submissions, compare_pair, missing_base_code_marks, pairs, store_base_code_marks, valid_ids,
    Collector, ComparisonStrategy, Outcome, StrategyOptions,
};
use crate::{algorithm::GreedyStringTiling, error::Error, result::ComparisonResult, submission::SubmissionSet};

/// Compares pairs on a dedicated rayon pool.
///
/// Workers share the matcher and the submission set read-only, each tiling call owns its marks.
pub struct ParallelStrategy<'a> {
    gst: &'a GreedyStringTiling,
    options: StrategyOptions,
    worker_count: Option<usize>,
}

impl<'a> ParallelStrategy<'a> {
    /// Without a worker count, the pool gets one thread per logical CPU.
    pub fn new(gst: &'a GreedyStringTiling, options: StrategyOptions, worker_count: Option<usize>) -> ParallelStrategy<'a> {
        ParallelStrategy {
            gst,
            options,
            worker_count,
        }
    }
}

impl ComparisonStrategy for ParallelStrategy<'_> {
    fn compare_submissions(&self, set: &mut SubmissionSet) -> Result<ComparisonResult, Error> {
        check_enough_submissions(set)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_count.unwrap_or(0))
            .thread_name(|index| format!("tokensim-worker-{index}"))
            .build()?;
        let started = Instant::now();

        let unmarked = missing_base_code_marks(self.gst, set);
        if !unmarked.is_empty() {
            let shared: &SubmissionSet = set;
            let marks: Vec<_> = pool.install(|| {
                unmarked
                    .par_iter()
                    .map(|&id| (id, self.gst.compare_with_base_code(&shared[id])))
                    .collect()
            });
            debug!(submissions = marks.len(), "compared against base code");
            for (id, marks) in marks {
                store_base_code_marks(set, id, marks);
            }
        }

        let pairs = pairs(&valid_ids(set));
        info!(
            pairs = pairs.len(),
            workers = pool.current_num_threads(),
            "comparing submissions"
        );
        let shared: &SubmissionSet = set;
        let outcomes: Vec<Outcome> = pool.install(|| {
            pairs
                .par_iter()
                .map(|&(first, second)| compare_pair(self.gst, shared, first, second, &self.options))
                .collect()
        });

        let mut collector = Collector::default();
        for outcome in outcomes {
            collector.add(outcome);
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
