use std::{ops::Range, sync::Arc};

use clap::ValueEnum;
use serde::Deserialize;

use crate::submission::SubmissionId;

/// A tile: `length` type-equal tokens starting at `starts[0]` in the first and `starts[1]` in the second sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Match {
    pub starts: [usize; 2],
    pub length: usize,
}

impl Match {
    pub fn new(start_of_first: usize, start_of_second: usize, length: usize) -> Match {
        Match {
            starts: [start_of_first, start_of_second],
            length,
        }
    }

    pub fn range(&self, side: usize) -> Range<usize> {
        self.starts[side]..self.starts[side] + self.length
    }

    pub fn swapped(self) -> Match {
        Match::new(self.starts[1], self.starts[0], self.length)
    }

    /// Whether both tiles claim a common token on either side.
    pub fn overlaps(&self, other: &Match) -> bool {
        (0..2).any(|side| {
            let [mine, theirs] = [self.range(side), other.range(side)];
            mine.start < theirs.end && theirs.start < mine.end
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityMetric {
    /// Matched tokens relative to the mean length of both submissions.
    #[default]
    Average,
    /// Matched tokens relative to the shorter submission.
    Maximum,
    /// Matched tokens relative to the longer submission.
    Minimum,
}

/// The tiles found for one pair of submissions.
#[derive(Clone, Debug)]
pub struct Comparison {
    submissions: [SubmissionId; 2],
    names: [Arc<str>; 2],
    matches: Vec<Match>,
    lengths: [usize; 2],
}

impl Comparison {
    /// `lengths` are the comparable token counts, with reserved tokens and base code already removed.
    pub fn new(
        submissions: [SubmissionId; 2],
        names: [Arc<str>; 2],
        matches: Vec<Match>,
        lengths: [usize; 2],
    ) -> Comparison {
        Comparison {
            submissions,
            names,
            matches,
            lengths,
        }
    }

    pub fn submissions(&self) -> [SubmissionId; 2] {
        self.submissions
    }

    pub fn names(&self) -> [&str; 2] {
        [&self.names[0], &self.names[1]]
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn lengths(&self) -> [usize; 2] {
        self.lengths
    }

    pub fn matched_tokens(&self) -> usize {
        self.matches.iter().map(|tile| tile.length).sum()
    }

    pub fn average_similarity(&self) -> f64 {
        self.ratio(self.lengths[0] + self.lengths[1], 2)
    }

    pub fn maximum_similarity(&self) -> f64 {
        self.ratio(self.lengths[0].min(self.lengths[1]), 1)
    }

    pub fn minimum_similarity(&self) -> f64 {
        self.ratio(self.lengths[0].max(self.lengths[1]), 1)
    }

    pub fn similarity(&self, metric: SimilarityMetric) -> f64 {
        match metric {
            SimilarityMetric::Average => self.average_similarity(),
            SimilarityMetric::Maximum => self.maximum_similarity(),
            SimilarityMetric::Minimum => self.minimum_similarity(),
        }
    }

    fn ratio(&self, divisor: usize, factor: usize) -> f64 {
        if self.lengths[0] == 0 || self.lengths[1] == 0 {
            return 0.0;
        }
        let value = (factor * self.matched_tokens()) as f64 / divisor as f64;
        value.clamp(0.0, 1.0)
    }
}
