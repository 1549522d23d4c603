use std::{fmt, sync::Arc, time::Duration};

use float_ord::FloatOrd;

use crate::{
    comparison::{Comparison, SimilarityMetric},
    submission::SubmissionId,
};

/// A pair whose comparison failed. It is listed in the result instead of being dropped.
#[derive(Clone, Debug)]
pub struct SkippedComparison {
    pub submissions: [SubmissionId; 2],
    pub names: [Arc<str>; 2],
    pub reason: String,
}

/// Outcome of one comparison run.
///
/// Comparisons are sorted by descending similarity; equal similarities keep the order of
/// submission ids, so every strategy yields the same list.
#[derive(Debug)]
pub struct ComparisonResult {
    comparisons: Vec<Comparison>,
    skipped: Vec<SkippedComparison>,
    // Fixed at construction, dropping comparisons later doesn't touch it.
    similarity_distribution: [usize; 10],
    duration: Duration,
    number_of_submissions: usize,
    metric: SimilarityMetric,
}

impl ComparisonResult {
    pub fn new(
        mut comparisons: Vec<Comparison>,
        mut skipped: Vec<SkippedComparison>,
        duration: Duration,
        number_of_submissions: usize,
        metric: SimilarityMetric,
    ) -> ComparisonResult {
        let similarity_distribution = similarity_distribution(&comparisons, metric);
        comparisons.sort_by(|a, b| {
            FloatOrd(b.similarity(metric))
                .cmp(&FloatOrd(a.similarity(metric)))
                .then_with(|| a.submissions().cmp(&b.submissions()))
        });
        skipped.sort_by_key(|skipped| skipped.submissions);
        ComparisonResult {
            comparisons,
            skipped,
            similarity_distribution,
            duration,
            number_of_submissions,
            metric,
        }
    }

    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    /// The `count` most similar comparisons, or all of them if there are fewer.
    pub fn top_comparisons(&self, count: usize) -> &[Comparison] {
        &self.comparisons[..count.min(self.comparisons.len())]
    }

    /// Keeps only the `limit` most similar comparisons to free memory.
    /// The similarity distribution still describes every comparison of the run.
    pub fn drop_comparisons(&mut self, limit: usize) {
        self.comparisons.truncate(limit);
    }

    pub fn skipped_comparisons(&self) -> &[SkippedComparison] {
        &self.skipped
    }

    /// Bucket `i` counts comparisons with similarity in `[10i %, 10(i + 1) %)`, the last bucket includes 100 %.
    pub fn similarity_distribution(&self) -> [usize; 10] {
        self.similarity_distribution
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn number_of_submissions(&self) -> usize {
        self.number_of_submissions
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ComparisonResult {{ comparisons: {}, duration: {} ms, submissions: {} }}",
            self.comparisons.len(),
            self.duration.as_millis(),
            self.number_of_submissions
        )
    }
}

fn similarity_distribution(comparisons: &[Comparison], metric: SimilarityMetric) -> [usize; 10] {
    let mut distribution = [0; 10];
    for comparison in comparisons {
        let bucket = (comparison.similarity(metric) * 10.0) as usize;
        distribution[bucket.min(9)] += 1;
    }
    distribution
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use super::ComparisonResult;
    use crate::{
        comparison::{Comparison, Match, SimilarityMetric},
        submission::SubmissionId,
    };

    fn comparison(first: usize, second: usize, matched: usize) -> Comparison {
        Comparison::new(
            [SubmissionId::new(first), SubmissionId::new(second)],
            [Arc::from(format!("s{first}")), Arc::from(format!("s{second}"))],
            if matched > 0 { vec![Match::new(0, 0, matched)] } else { vec![] },
            [10, 10],
        )
    }

    fn result() -> ComparisonResult {
        ComparisonResult::new(
            vec![
                comparison(0, 1, 2),
                comparison(0, 2, 10),
                comparison(1, 2, 5),
                comparison(0, 3, 5),
                comparison(2, 3, 0),
            ],
            vec![],
            Duration::from_millis(42),
            4,
            SimilarityMetric::Average,
        )
    }

    #[test]
    fn sorted_descending_with_stable_ties() {
        let result = result();
        let order: Vec<[usize; 2]> = result
            .comparisons()
            .iter()
            .map(|comparison| comparison.submissions().map(|id| id.raw()))
            .collect();
        assert_eq!(order, vec![[0, 2], [0, 3], [1, 2], [0, 1], [2, 3]]);
    }

    #[test]
    fn distribution() {
        let result = result();
        assert_eq!(result.similarity_distribution(), [1, 0, 1, 0, 0, 2, 0, 0, 0, 1]);
        assert_eq!(result.similarity_distribution().iter().sum::<usize>(), result.comparisons().len());
    }

    #[test]
    fn dropping_keeps_distribution() {
        let mut result = result();
        result.drop_comparisons(1);
        assert_eq!(result.comparisons().len(), 1);
        assert_eq!(result.comparisons()[0].average_similarity(), 1.0);
        assert_eq!(result.similarity_distribution().iter().sum::<usize>(), 5);
    }

    #[test]
    fn top() {
        let result = result();
        assert_eq!(result.top_comparisons(2).len(), 2);
        assert_eq!(result.top_comparisons(100).len(), 5);
        assert_eq!(
            result.to_string(),
            "ComparisonResult { comparisons: 5, duration: 42 ms, submissions: 4 }"
        );
    }
}
