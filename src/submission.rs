use std::{ops::Index, path::PathBuf, sync::Arc};

use index_vec::IndexVec;

use crate::token::{comparable_length, Token};

index_vec::define_index_type! {
    pub struct SubmissionId = usize;
}

/// One candidate's code, reduced to tokens.
///
/// The token sequence is absent when tokenization failed (the submission is then invalid)
/// or while the external strategy has it paged out.
#[derive(Clone, Debug)]
pub struct Submission {
    name: Arc<str>,
    files: Vec<PathBuf>,
    valid: bool,
    tokens: Option<Arc<[Token]>>,
    base_code_marks: Option<Arc<[bool]>>,
}

impl Submission {
    pub fn new(name: &str, tokens: Vec<Token>) -> Submission {
        Submission {
            name: Arc::from(name),
            files: vec![],
            valid: true,
            tokens: Some(Arc::from(tokens)),
            base_code_marks: None,
        }
    }

    pub fn invalid(name: &str) -> Submission {
        Submission {
            name: Arc::from(name),
            files: vec![],
            valid: false,
            tokens: None,
            base_code_marks: None,
        }
    }

    pub fn with_files(mut self, files: Vec<PathBuf>) -> Submission {
        self.files = files;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_loaded(&self) -> bool {
        self.tokens.is_some()
    }

    pub fn tokens(&self) -> Option<&[Token]> {
        self.tokens.as_deref()
    }

    pub fn shared_tokens(&self) -> Option<Arc<[Token]>> {
        self.tokens.clone()
    }

    pub fn set_tokens(&mut self, tokens: Vec<Token>) {
        self.tokens = Some(Arc::from(tokens));
    }

    /// Drops the token sequence. Base-code marks stay, they are reused when the tokens come back.
    pub fn evict(&mut self) {
        self.tokens = None;
    }

    pub fn base_code_marks(&self) -> Option<&[bool]> {
        self.base_code_marks.as_deref()
    }

    pub fn set_base_code_marks(&mut self, marks: Arc<[bool]>) {
        self.base_code_marks = Some(marks);
    }

    pub fn base_code_token_count(&self) -> usize {
        self.base_code_marks
            .as_deref()
            .map_or(0, |marks| marks.iter().filter(|&&marked| marked).count())
    }

    /// Tokens that can still match a peer: everything except reserved tokens and base code.
    pub fn comparable_length(&self) -> usize {
        self.tokens()
            .map_or(0, comparable_length)
            .saturating_sub(self.base_code_token_count())
    }
}

/// All submissions of one run, plus the optional base code kept apart from them.
#[derive(Clone, Debug, Default)]
pub struct SubmissionSet {
    submissions: IndexVec<SubmissionId, Submission>,
    base_code: Option<Submission>,
}

impl SubmissionSet {
    pub fn new(submissions: Vec<Submission>, base_code: Option<Submission>) -> SubmissionSet {
        SubmissionSet {
            submissions: IndexVec::from_vec(submissions),
            base_code,
        }
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = SubmissionId> {
        self.submissions.indices()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Submission> {
        self.submissions.iter()
    }

    pub fn get_mut(&mut self, id: SubmissionId) -> &mut Submission {
        &mut self.submissions[id]
    }

    pub fn base_code(&self) -> Option<&Submission> {
        self.base_code.as_ref()
    }

    pub fn has_base_code(&self) -> bool {
        self.base_code.is_some()
    }

    pub fn number_of_valid_submissions(&self) -> usize {
        self.submissions.iter().filter(|submission| submission.is_valid()).count()
    }

    pub fn loaded_token_count(&self) -> usize {
        self.submissions
            .iter()
            .filter_map(Submission::tokens)
            .map(<[Token]>::len)
            .sum()
    }

    pub fn evict_all(&mut self) {
        for submission in self.submissions.iter_mut() {
            submission.evict();
        }
    }
}

impl Index<SubmissionId> for SubmissionSet {
    type Output = Submission;

    fn index(&self, id: SubmissionId) -> &Submission {
        &self.submissions[id]
    }
}
