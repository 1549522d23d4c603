use std::time::Instant;

use tracing::info;

use super::{
    check_enough_submissions, compare_pair, missing_base_code_marks, pairs, store_base_code_marks, valid_ids,
    Collector, ComparisonStrategy, StrategyOptions,
};
use crate::{algorithm::GreedyStringTiling, error::Error, result::ComparisonResult, submission::SubmissionSet};

/// Compares all pairs one after another on the calling thread.
pub struct NormalStrategy<'a> {
    gst: &'a GreedyStringTiling,
    options: StrategyOptions,
}

impl<'a> NormalStrategy<'a> {
    pub fn new(gst: &'a GreedyStringTiling, options: StrategyOptions) -> NormalStrategy<'a> {
        NormalStrategy { gst, options }
    }
}

impl ComparisonStrategy for NormalStrategy<'_> {
    fn compare_submissions(&self, set: &mut SubmissionSet) -> Result<ComparisonResult, Error> {
        check_enough_submissions(set)?;
        let started = Instant::now();

        for id in missing_base_code_marks(self.gst, set) {
            let marks = self.gst.compare_with_base_code(&set[id]);
            store_base_code_marks(set, id, marks);
        }

        let pairs = pairs(&valid_ids(set));
        info!(pairs = pairs.len(), "comparing submissions");
        let mut collector = Collector::default();
        for (first, second) in pairs {
            collector.add(compare_pair(self.gst, set, first, second, &self.options));
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

#[cfg(test)]
mod test {
    use super::NormalStrategy;
    use crate::{
        algorithm::GreedyStringTiling,
        strategy::{ComparisonStrategy, StrategyOptions},
        submission::{Submission, SubmissionSet},
        token::Token,
    };

    #[test]
    fn compares_every_valid_pair() {
        let mut set = SubmissionSet::new(
            vec![
                Submission::new("a", Token::sequence_of(&[2, 3, 4, 5, 2])),
                Submission::new("b", Token::sequence_of(&[2, 3, 4, 5])),
                Submission::invalid("c"),
                Submission::new("d", Token::sequence_of(&[9, 9, 9])),
            ],
            None,
        );
        let gst = GreedyStringTiling::new(2).unwrap();
        let result = NormalStrategy::new(&gst, StrategyOptions::default())
            .compare_submissions(&mut set)
            .unwrap();
        assert_eq!(result.comparisons().len(), 3);
        assert_eq!(result.number_of_submissions(), 4);
        assert_eq!(result.comparisons()[0].names(), ["a", "b"]);
        assert!((result.comparisons()[0].average_similarity() - 8.0 / 9.0).abs() < 1e-9);
        assert!(result.skipped_comparisons().is_empty());
    }

    #[test]
    fn base_code_is_marked_before_comparing() {
        let base = Submission::new("base", Token::sequence_of(&[7, 7, 8, 8]));
        let mut set = SubmissionSet::new(
            vec![
                Submission::new("a", Token::sequence_of(&[7, 7, 8, 8, 2, 3, 4])),
                Submission::new("b", Token::sequence_of(&[2, 3, 4, 7, 7, 8, 8])),
            ],
            Some(base),
        );
        let mut gst = GreedyStringTiling::new(2).unwrap();
        gst.register_base_code(set.base_code().unwrap()).unwrap();
        let result = NormalStrategy::new(&gst, StrategyOptions::default())
            .compare_submissions(&mut set)
            .unwrap();
        let comparison = &result.comparisons()[0];
        assert_eq!(comparison.matched_tokens(), 3);
        assert_eq!(comparison.lengths(), [3, 3]);
    }
}
