use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use regex::Regex;
use tracing::{info, warn};

use crate::{
    error::Error,
    language::{Language, SourceFile, TokenizeError},
    strategy::{LoadError, TokenStore},
    submission::{Submission, SubmissionSet},
    token::{comparable_length, Token},
};

pub struct ReadOptions {
    pub minimum_match_length: usize,
    /// Entry of the root directory (or any other path) holding the base code.
    pub base_code: Option<String>,
    /// Files whose name matches are ignored.
    pub exclude: Option<Regex>,
    /// Whether token sequences stay in memory after reading. Without them a `TokenizingStore`
    /// reads and tokenizes the files again on demand.
    pub keep_tokens: bool,
}

/// Reads every entry of `root` as one submission: a directory with all its source files, or a single file.
///
/// A submission that can't be read or tokenized, or that is too short to ever match, is kept as invalid.
pub fn read_submission_set(root: &Path, language: &dyn Language, options: &ReadOptions) -> Result<SubmissionSet, Error> {
    let mut entries = vec![];
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            entries.push((name, entry.path()));
        }
    }
    entries.sort();

    let mut submissions = vec![];
    let mut base_code = None;
    for (name, path) in entries {
        let submission = read_submission(&name, &path, language, options)?;
        if options.base_code.as_deref() == Some(name.as_str()) {
            base_code = Some(submission);
            continue;
        }
        submissions.push(if options.keep_tokens {
            submission
        } else {
            evicted(submission)
        });
    }

    if let Some(base_code_name) = &options.base_code {
        if base_code.is_none() {
            let path = Path::new(base_code_name);
            if !path.exists() {
                return Err(Error::Config(format!("base code {base_code_name} not found")));
            }
            base_code = Some(read_submission(base_code_name, path, language, options)?);
        }
    }
    if let Some(base_code) = &base_code {
        if !base_code.is_valid() {
            return Err(Error::Config(format!("base code {} has no usable tokens", base_code.name())));
        }
    }

    let set = SubmissionSet::new(submissions, base_code);
    info!(
        submissions = set.len(),
        valid = set.number_of_valid_submissions(),
        base_code = set.has_base_code(),
        "read submissions"
    );
    Ok(set)
}

fn evicted(mut submission: Submission) -> Submission {
    submission.evict();
    submission
}

fn read_submission(name: &str, path: &Path, language: &dyn Language, options: &ReadOptions) -> Result<Submission, Error> {
    let mut files = vec![];
    collect_files(path, language, options.exclude.as_ref(), &mut files)?;

    let tokens = match tokenize_files(&files, language) {
        Ok(tokens) => tokens,
        Err(err) => {
            warn!("invalid submission: {err}");
            return Ok(Submission::invalid(name).with_files(files));
        }
    };
    let length = comparable_length(&tokens);
    if length < options.minimum_match_length {
        warn!(
            name,
            tokens = length,
            minimum = options.minimum_match_length,
            "invalid submission: too few tokens"
        );
        return Ok(Submission::invalid(name).with_files(files));
    }
    Ok(Submission::new(name, tokens).with_files(files))
}

/// Source files under `path` in name order.
fn collect_files(path: &Path, language: &dyn Language, exclude: Option<&Regex>, files: &mut Vec<PathBuf>) -> Result<(), Error> {
    if path.is_file() {
        if is_source_file(path, language, exclude) {
            files.push(path.to_owned());
        }
        return Ok(());
    }

    let mut children = vec![];
    for entry in fs::read_dir(path)? {
        children.push(entry?.path());
    }
    children.sort();
    for child in children {
        if child.file_name().map_or(false, |name| name.to_string_lossy().starts_with('.')) {
            continue;
        }
        collect_files(&child, language, exclude, files)?;
    }
    Ok(())
}

fn is_source_file(path: &Path, language: &dyn Language, exclude: Option<&Regex>) -> bool {
    let Some(file_name) = path.file_name().map(|name| name.to_string_lossy()) else {
        return false;
    };
    if exclude.map_or(false, |exclude| exclude.is_match(&file_name)) {
        return false;
    }
    let extension = path.extension().map(|extension| extension.to_string_lossy());
    extension.map_or(false, |extension| language.suffixes().contains(&extension.as_ref()))
}

#[derive(Debug, thiserror::Error)]
enum ReadError {
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
}

fn tokenize_files(files: &[PathBuf], language: &dyn Language) -> Result<Vec<Token>, ReadError> {
    let mut sources = vec![];
    for path in files {
        let content = fs::read_to_string(path).map_err(|source| ReadError::Io {
            path: path.clone(),
            source,
        })?;
        sources.push(SourceFile {
            path: path.clone(),
            content,
        });
    }
    Ok(language.tokenize(&sources)?)
}

/// Reads and tokenizes a submission's files again when the external strategy pages it in.
pub struct TokenizingStore {
    language: Arc<dyn Language>,
}

impl TokenizingStore {
    pub fn new(language: Arc<dyn Language>) -> TokenizingStore {
        TokenizingStore { language }
    }
}

impl TokenStore for TokenizingStore {
    fn load(&self, submission: &Submission) -> Result<Vec<Token>, LoadError> {
        let name = submission.name().to_owned();
        tokenize_files(submission.files(), self.language.as_ref()).map_err(|err| match err {
            ReadError::Io { source, .. } => LoadError::Io { name, source },
            ReadError::Tokenize(source) => LoadError::Tokenize { name, source },
        })
    }
}
