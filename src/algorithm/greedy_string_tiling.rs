use std::{cmp::Ordering, sync::Arc};

use tracing::debug;

use super::hashing::{window_hashes, HashFunctionParams, TokenHashes};
use crate::{
    comparison::{Comparison, Match},
    error::Error,
    submission::{Submission, SubmissionId, SubmissionSet},
    token::Token,
};

/// Failure of a single pairwise comparison. The run goes on, the pair is reported as skipped.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum ComparisonError {
    #[error("submission {name} has no token sequence")]
    MissingTokens { name: String },

    #[error("submission {name} has {marks} base code marks for {tokens} tokens")]
    CorruptMarks { name: String, marks: usize, tokens: usize },

    #[error("submission {name} was not compared against the base code")]
    MissingBaseCodeMarks { name: String },
}

struct BaseCode {
    tokens: Arc<[Token]>,
    marks: Vec<bool>,
    hashes: TokenHashes,
}

/// Greedy string tiling over token types.
///
/// The matcher holds no per-comparison state, so one instance can be shared by any number of threads.
/// Tiling marks live in buffers owned by each call.
pub struct GreedyStringTiling {
    minimum_match_length: usize,
    hash_function: HashFunctionParams,
    base_code: Option<BaseCode>,
}

impl GreedyStringTiling {
    pub fn new(minimum_match_length: usize) -> Result<GreedyStringTiling, Error> {
        if minimum_match_length == 0 {
            return Err(Error::Config("minimum match length must be positive".to_owned()));
        }
        Ok(GreedyStringTiling {
            minimum_match_length,
            hash_function: HashFunctionParams::random(),
            base_code: None,
        })
    }

    /// Hashes every window of minimum match length that contains no marked token.
    pub fn create_hashes(&self, tokens: &[Token], marks: &[bool]) -> TokenHashes {
        let hashes = window_hashes(tokens, marks, self.minimum_match_length, &self.hash_function);
        TokenHashes::build(&hashes)
    }

    /// Hashes the base code once, so that every submission can later be tiled against it cheaply.
    pub fn register_base_code(&mut self, base_code: &Submission) -> Result<(), ComparisonError> {
        let tokens = base_code.shared_tokens().ok_or_else(|| ComparisonError::MissingTokens {
            name: base_code.name().to_owned(),
        })?;
        let marks = initial_marks(&tokens);
        let hashes = self.create_hashes(&tokens, &marks);
        debug!(name = base_code.name(), tokens = tokens.len(), "hashed base code");
        self.base_code = Some(BaseCode { tokens, marks, hashes });
        Ok(())
    }

    pub fn has_base_code(&self) -> bool {
        self.base_code.is_some()
    }

    /// Tiles two bare token sequences.
    pub fn tile(&self, first: &[Token], second: &[Token]) -> Vec<Match> {
        self.tile_symmetric(first, initial_marks(first), second, initial_marks(second))
    }

    /// Compares two submissions of a set. The comparison always lists the lower id first.
    pub fn compare(
        &self,
        set: &SubmissionSet,
        first: SubmissionId,
        second: SubmissionId,
    ) -> Result<Comparison, ComparisonError> {
        let ids = if first <= second { [first, second] } else { [second, first] };
        let submissions = ids.map(|id| &set[id]);

        let mut tokens: [&[Token]; 2] = [&[], &[]];
        let mut marks = [vec![], vec![]];
        for side in 0..2 {
            let submission = submissions[side];
            tokens[side] = submission.tokens().ok_or_else(|| ComparisonError::MissingTokens {
                name: submission.name().to_owned(),
            })?;
            marks[side] = initial_marks(tokens[side]);
            match submission.base_code_marks() {
                Some(base_code_marks) => {
                    if base_code_marks.len() != tokens[side].len() {
                        return Err(ComparisonError::CorruptMarks {
                            name: submission.name().to_owned(),
                            marks: base_code_marks.len(),
                            tokens: tokens[side].len(),
                        });
                    }
                    for (mark, &base_code_mark) in marks[side].iter_mut().zip(base_code_marks) {
                        *mark |= base_code_mark;
                    }
                }
                None if self.has_base_code() => {
                    return Err(ComparisonError::MissingBaseCodeMarks {
                        name: submission.name().to_owned(),
                    })
                }
                None => {}
            }
        }

        let [first_marks, second_marks] = marks;
        let matches = self.tile_symmetric(tokens[0], first_marks, tokens[1], second_marks);
        Ok(Comparison::new(
            ids,
            submissions.map(Submission::shared_name),
            matches,
            submissions.map(Submission::comparable_length),
        ))
    }

    /// Tiles a submission against the registered base code.
    ///
    /// Returns one flag per token of the submission, set where the token is covered by base code.
    pub fn compare_with_base_code(&self, submission: &Submission) -> Result<Arc<[bool]>, ComparisonError> {
        let tokens = submission.tokens().ok_or_else(|| ComparisonError::MissingTokens {
            name: submission.name().to_owned(),
        })?;
        let Some(base_code) = &self.base_code else {
            return Ok(Arc::from(vec![false; tokens.len()]));
        };

        let mut submission_marks = initial_marks(tokens);
        let mut base_code_marks = base_code.marks.clone();
        let matches = self.tile_marked(
            tokens,
            &mut submission_marks,
            &base_code.tokens,
            &mut base_code_marks,
            &base_code.hashes,
        );

        let mut covered = vec![false; tokens.len()];
        for tile in &matches {
            covered[tile.range(0)].fill(true);
        }
        Ok(Arc::from(covered))
    }

    fn tile_symmetric(
        &self,
        first: &[Token],
        mut first_marks: Vec<bool>,
        second: &[Token],
        mut second_marks: Vec<bool>,
    ) -> Vec<Match> {
        // Both argument orders must produce the same tiles, so the scan always runs over the
        // smaller (then lexicographically smaller) sequence.
        if canonical_order(first, second) == Ordering::Greater {
            let second_hashes = self.create_hashes(first, &first_marks);
            let matches = self.tile_marked(second, &mut second_marks, first, &mut first_marks, &second_hashes);
            return matches.into_iter().map(Match::swapped).collect();
        }
        let second_hashes = self.create_hashes(second, &second_marks);
        self.tile_marked(first, &mut first_marks, second, &mut second_marks, &second_hashes)
    }

    /// The tiling loop. `second_hashes` must have been built from `second` with its current marks.
    ///
    /// Every pass collects the longest unmarked common runs in scan order (earliest in `first`,
    /// then earliest in `second`), skipping the ones overlapping a run picked earlier in the pass,
    /// and marks them.
    fn tile_marked(
        &self,
        first: &[Token],
        first_marks: &mut [bool],
        second: &[Token],
        second_marks: &mut [bool],
        second_hashes: &TokenHashes,
    ) -> Vec<Match> {
        let minimum = self.minimum_match_length;
        let mut tiles = vec![];
        if first.len() < minimum || second.len() < minimum {
            return tiles;
        }
        let first_hashes = window_hashes(first, first_marks, minimum, &self.hash_function);

        loop {
            let mut max_length = minimum;
            let mut pass: Vec<Match> = vec![];

            for x in 0..first_hashes.len() {
                if x + max_length > first.len() {
                    break;
                }
                let Some(hash) = first_hashes[x] else {
                    continue;
                };
                if first_marks[x] {
                    continue;
                }
                'candidates: for y in second_hashes.starts(hash) {
                    if y + max_length > second.len() || second_marks[y] {
                        continue;
                    }
                    for j in (0..max_length).rev() {
                        if first[x + j].token_type != second[y + j].token_type
                            || first_marks[x + j]
                            || second_marks[y + j]
                        {
                            continue 'candidates;
                        }
                    }
                    let mut length = max_length;
                    while x + length < first.len()
                        && y + length < second.len()
                        && first[x + length].token_type == second[y + length].token_type
                        && !first_marks[x + length]
                        && !second_marks[y + length]
                    {
                        length += 1;
                    }
                    if length > max_length {
                        pass.clear();
                        max_length = length;
                    }
                    let candidate = Match::new(x, y, length);
                    if !pass.iter().any(|tile| tile.overlaps(&candidate)) {
                        pass.push(candidate);
                    }
                }
            }

            if pass.is_empty() {
                break;
            }
            for tile in &pass {
                first_marks[tile.range(0)].fill(true);
                second_marks[tile.range(1)].fill(true);
            }
            tiles.extend(pass);
            if max_length == minimum {
                break;
            }
        }
        tiles
    }
}

/// Reserved tokens start out marked so no tile can cover them.
fn initial_marks(tokens: &[Token]) -> Vec<bool> {
    tokens.iter().map(|token| token.token_type.is_reserved()).collect()
}

fn canonical_order(first: &[Token], second: &[Token]) -> Ordering {
    first.len().cmp(&second.len()).then_with(|| {
        first
            .iter()
            .map(|token| token.token_type)
            .cmp(second.iter().map(|token| token.token_type))
    })
}

#[cfg(test)]
mod test {
    use super::{ComparisonError, GreedyStringTiling};
    use crate::{
        comparison::Match,
        submission::{Submission, SubmissionId, SubmissionSet},
        token::Token,
    };

    const FOR: u32 = 2;
    const ASSIGN: u32 = 3;
    const IF: u32 = 4;
    const CALL: u32 = 5;
    const RETURN: u32 = 6;

    #[test]
    fn rejects_zero_minimum() {
        assert!(GreedyStringTiling::new(0).is_err());
    }

    #[test]
    fn prefix_is_one_tile() {
        let gst = GreedyStringTiling::new(2).unwrap();
        let a = Token::sequence_of(&[FOR, ASSIGN, IF, ASSIGN, FOR]);
        let b = Token::sequence_of(&[FOR, ASSIGN, IF, ASSIGN]);
        assert_eq!(gst.tile(&a, &b), vec![Match::new(0, 0, 4)]);
    }

    #[test]
    fn empty_side() {
        let gst = GreedyStringTiling::new(1).unwrap();
        let a = Token::sequence_of(&[FOR, ASSIGN]);
        assert!(gst.tile(&a, &[]).is_empty());
        assert!(gst.tile(&[], &a).is_empty());
    }

    #[test]
    fn short_runs_are_ignored() {
        let gst = GreedyStringTiling::new(3).unwrap();
        let a = Token::sequence_of(&[FOR, ASSIGN, IF, CALL]);
        let b = Token::sequence_of(&[IF, CALL, FOR, ASSIGN]);
        assert!(gst.tile(&a, &b).is_empty());

        let gst = GreedyStringTiling::new(2).unwrap();
        let mut matches = gst.tile(&a, &b);
        matches.sort_by_key(|tile| tile.starts);
        assert_eq!(matches, vec![Match::new(0, 2, 2), Match::new(2, 0, 2)]);
    }

    #[test]
    fn longest_tile_wins() {
        // The long run is taken first even though a short run starts earlier.
        let gst = GreedyStringTiling::new(2).unwrap();
        let a = Token::sequence_of(&[IF, CALL, FOR, ASSIGN, RETURN, IF, CALL]);
        let b = Token::sequence_of(&[FOR, ASSIGN, RETURN, IF, CALL]);
        assert_eq!(gst.tile(&a, &b), vec![Match::new(2, 0, 5)]);
    }

    #[test]
    fn ties_take_earliest_position() {
        let gst = GreedyStringTiling::new(2).unwrap();
        let a = Token::sequence_of(&[FOR, ASSIGN]);
        let b = Token::sequence_of(&[FOR, ASSIGN, IF, FOR, ASSIGN]);
        assert_eq!(gst.tile(&a, &b), vec![Match::new(0, 0, 2)]);
    }

    #[test]
    fn reserved_tokens_split_tiles() {
        let gst = GreedyStringTiling::new(2).unwrap();
        let mut a = Token::sequence_of(&[FOR, ASSIGN]);
        a.push(Token::file_end(0));
        a.extend(Token::sequence_of(&[IF, CALL]));
        let mut b = a.clone();
        b[2] = Token::file_end(0);
        let matches = gst.tile(&a, &b);
        assert_eq!(matches, vec![Match::new(0, 0, 2), Match::new(3, 3, 2)]);
    }

    #[test]
    fn tiling_is_symmetric() {
        let gst = GreedyStringTiling::new(2).unwrap();
        let a = Token::sequence_of(&[FOR, ASSIGN, FOR, ASSIGN, IF, CALL, FOR, ASSIGN]);
        let b = Token::sequence_of(&[IF, CALL, FOR, ASSIGN, RETURN, FOR, ASSIGN, FOR]);
        let forward = gst.tile(&a, &b);
        let mut backward: Vec<Match> = gst.tile(&b, &a).into_iter().map(Match::swapped).collect();
        let mut forward_sorted = forward.clone();
        forward_sorted.sort_by_key(|tile| tile.starts);
        backward.sort_by_key(|tile| tile.starts);
        assert_eq!(forward_sorted, backward);
    }

    fn set_with_base_code() -> SubmissionSet {
        let base = Submission::new("base", Token::sequence_of(&[RETURN, RETURN, CALL, CALL, RETURN]));
        let a = Submission::new("a", Token::sequence_of(&[FOR, ASSIGN, IF, RETURN, RETURN, CALL, CALL]));
        let b = Submission::new("b", Token::sequence_of(&[RETURN, RETURN, CALL, CALL, FOR, ASSIGN, IF]));
        SubmissionSet::new(vec![a, b], Some(base))
    }

    #[test]
    fn base_code_is_excluded() {
        let mut set = set_with_base_code();
        let mut gst = GreedyStringTiling::new(2).unwrap();
        gst.register_base_code(set.base_code().unwrap()).unwrap();

        let ids: Vec<SubmissionId> = set.ids().collect();
        for &id in &ids {
            let marks = gst.compare_with_base_code(&set[id]).unwrap();
            set.get_mut(id).set_base_code_marks(marks);
        }
        assert_eq!(set[ids[0]].base_code_marks().unwrap(), &[false, false, false, true, true, true, true]);

        let comparison = gst.compare(&set, ids[0], ids[1]).unwrap();
        assert_eq!(comparison.matches(), &[Match::new(0, 4, 3)]);
        assert_eq!(comparison.lengths(), [3, 3]);
        assert_eq!(comparison.average_similarity(), 1.0);
    }

    #[test]
    fn base_code_marks_are_required_once_registered() {
        let set = set_with_base_code();
        let mut gst = GreedyStringTiling::new(2).unwrap();
        gst.register_base_code(set.base_code().unwrap()).unwrap();
        let ids: Vec<SubmissionId> = set.ids().collect();
        assert_eq!(
            gst.compare(&set, ids[0], ids[1]).unwrap_err(),
            ComparisonError::MissingBaseCodeMarks { name: "a".to_owned() }
        );
    }

    #[test]
    fn compare_orders_ids() {
        let set = SubmissionSet::new(
            vec![
                Submission::new("a", Token::sequence_of(&[FOR, ASSIGN, IF])),
                Submission::new("b", Token::sequence_of(&[FOR, ASSIGN, IF])),
            ],
            None,
        );
        let gst = GreedyStringTiling::new(2).unwrap();
        let comparison = gst.compare(&set, SubmissionId::new(1), SubmissionId::new(0)).unwrap();
        assert_eq!(comparison.submissions(), [SubmissionId::new(0), SubmissionId::new(1)]);
        assert_eq!(comparison.matched_tokens(), 3);
    }

    #[test]
    fn missing_tokens() {
        let set = SubmissionSet::new(
            vec![Submission::new("a", Token::sequence_of(&[FOR])), Submission::invalid("b")],
            None,
        );
        let gst = GreedyStringTiling::new(1).unwrap();
        assert!(matches!(
            gst.compare(&set, SubmissionId::new(0), SubmissionId::new(1)),
            Err(ComparisonError::MissingTokens { .. })
        ));
    }

    #[test]
    fn corrupt_marks() {
        let mut set = SubmissionSet::new(
            vec![
                Submission::new("a", Token::sequence_of(&[FOR, IF])),
                Submission::new("b", Token::sequence_of(&[FOR, IF])),
            ],
            None,
        );
        set.get_mut(SubmissionId::new(0)).set_base_code_marks(vec![false].into());
        let gst = GreedyStringTiling::new(1).unwrap();
        assert!(matches!(
            gst.compare(&set, SubmissionId::new(0), SubmissionId::new(1)),
            Err(ComparisonError::CorruptMarks { marks: 1, tokens: 2, .. })
        ));
    }
}
