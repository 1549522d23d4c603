//! Language frontends turn source files into token sequences.

pub mod chars;
pub mod text;

use std::{collections::BTreeMap, path::PathBuf};

use crate::{error::Error, token::Token};

pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    #[error("{}: position does not fit into a token", path.display())]
    PositionOverflow { path: PathBuf },

    #[error("too many files ({count})")]
    TooManyFiles { count: usize },

    #[error("{}: {message}", path.display())]
    Frontend { path: PathBuf, message: String },
}

/// A tokenizer for one kind of source.
///
/// Frontends emit one `FILE_END` token after the tokens of every file and never use the reserved tags
/// for anything else.
pub trait Language: Send + Sync {
    fn name(&self) -> &'static str;

    /// File name suffixes this frontend reads, without the dot.
    fn suffixes(&self) -> &[&'static str];

    fn default_minimum_match_length(&self) -> usize;

    fn tokenize(&self, files: &[SourceFile]) -> Result<Vec<Token>, TokenizeError>;
}

pub type LanguageFactory = fn() -> Box<dyn Language>;

/// Frontends available by name. Iteration order is alphabetical.
#[derive(Default)]
pub struct LanguageRegistry {
    factories: BTreeMap<&'static str, LanguageFactory>,
}

impl LanguageRegistry {
    pub fn new() -> LanguageRegistry {
        LanguageRegistry::default()
    }

    pub fn with_builtin_languages() -> LanguageRegistry {
        let mut registry = LanguageRegistry::new();
        registry.register("char", chars::CharLanguage::create);
        registry.register("text", text::TextLanguage::create);
        registry
    }

    /// Replaces an earlier frontend with the same name.
    pub fn register(&mut self, name: &'static str, factory: LanguageFactory) {
        self.factories.insert(name, factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Language>, Error> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(Error::UnknownLanguage {
                name: name.to_owned(),
                available: self.names().collect::<Vec<_>>().join(", "),
            }),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

/// Converts a zero-based index into a token position.
pub(crate) fn position(value: usize, file: &SourceFile) -> Result<u32, TokenizeError> {
    u32::try_from(value).map_err(|_| TokenizeError::PositionOverflow {
        path: file.path.clone(),
    })
}
