#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokensim::{
    submission::{Submission, SubmissionSet},
    token::{Token, TokenType},
};

pub const FOR: u32 = TokenType::FIRST_FREE;
pub const ASSIGN: u32 = TokenType::FIRST_FREE + 1;
pub const IF: u32 = TokenType::FIRST_FREE + 2;
pub const CALL: u32 = TokenType::FIRST_FREE + 3;
pub const RETURN: u32 = TokenType::FIRST_FREE + 4;

/// Random tags drawn from `kinds` token kinds.
pub fn random_tags(rng: &mut ChaCha8Rng, length: usize, kinds: u32) -> Vec<u32> {
    (0..length)
        .map(|_| TokenType::FIRST_FREE + rng.gen_range(0..kinds))
        .collect()
}

/// A copy of `original` with a few tags replaced, inserted or removed.
pub fn mutate(rng: &mut ChaCha8Rng, original: &[u32], edits: usize, kinds: u32) -> Vec<u32> {
    let mut tags = original.to_vec();
    for _ in 0..edits {
        let position = rng.gen_range(0..=tags.len());
        let tag = TokenType::FIRST_FREE + rng.gen_range(0..kinds);
        match rng.gen_range(0..3) {
            0 if position < tags.len() => tags[position] = tag,
            1 if position < tags.len() => {
                tags.remove(position);
            }
            _ => tags.insert(position, tag),
        }
    }
    tags
}

/// Tokens of one or more files, each file closed with `FILE_END`.
pub fn tokens_of_files(files: &[Vec<u32>]) -> Vec<Token> {
    let mut tokens = vec![];
    for (index, tags) in files.iter().enumerate() {
        tokens.extend(Token::sequence_of(tags).into_iter().map(|token| Token {
            file: index as u32,
            ..token
        }));
        tokens.push(Token::file_end(index as u32));
    }
    tokens
}

/// A corpus where every other submission is an edited copy of its predecessor.
pub fn corpus(seed: u64, count: usize, length: usize) -> SubmissionSet {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut submissions = vec![];
    let mut previous = vec![];
    for i in 0..count {
        let tags = if i % 2 == 1 {
            mutate(&mut rng, &previous, length / 10, 6)
        } else {
            random_tags(&mut rng, length, 6)
        };
        submissions.push(Submission::new(&format!("submission-{i:03}"), tokens_of_files(&[tags.clone()])));
        previous = tags;
    }
    SubmissionSet::new(submissions, None)
}

/// Like `corpus`, but every submission starts with a shared template file that is also the base code.
pub fn corpus_with_base_code(seed: u64, count: usize, length: usize, template_length: usize) -> SubmissionSet {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let template = random_tags(&mut rng, template_length, 6);
    let base_code = Submission::new("template", tokens_of_files(&[template.clone()]));
    let submissions = corpus(seed, count, length)
        .iter()
        .map(|submission| {
            let tags: Vec<u32> = submission
                .tokens()
                .unwrap_or_default()
                .iter()
                .filter(|token| !token.token_type.is_reserved())
                .map(|token| token.token_type.0)
                .collect();
            Submission::new(submission.name(), tokens_of_files(&[template.clone(), tags]))
        })
        .collect();
    SubmissionSet::new(submissions, Some(base_code))
}
