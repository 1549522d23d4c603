use std::sync::{Mutex, PoisonError};

use string_interner::{backend::StringBackend, symbol::SymbolU32, StringInterner, Symbol as _};
use unicode_segmentation::UnicodeSegmentation as _;

use super::{position, Language, SourceFile, TokenizeError};
use crate::token::{Token, TokenType};

/// One token per word or punctuation mark.
///
/// Equal words get equal tags across all submissions tokenized by the same instance.
pub struct TextLanguage {
    interner: Mutex<StringInterner<StringBackend<SymbolU32>>>,
}

impl TextLanguage {
    pub fn new() -> TextLanguage {
        TextLanguage {
            interner: Mutex::new(StringInterner::new()),
        }
    }

    pub fn create() -> Box<dyn Language> {
        Box::new(TextLanguage::new())
    }
}

impl Default for TextLanguage {
    fn default() -> TextLanguage {
        TextLanguage::new()
    }
}

impl Language for TextLanguage {
    fn name(&self) -> &'static str {
        "text"
    }

    fn suffixes(&self) -> &[&'static str] {
        &["txt", "asc", "text", "md"]
    }

    fn default_minimum_match_length(&self) -> usize {
        5
    }

    fn tokenize(&self, files: &[SourceFile]) -> Result<Vec<Token>, TokenizeError> {
        let mut interner = self.interner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut tokens = vec![];
        for (file_index, file) in files.iter().enumerate() {
            let file_index =
                u32::try_from(file_index).map_err(|_| TokenizeError::TooManyFiles { count: files.len() })?;
            for (line_index, line) in file.content.lines().enumerate() {
                let line_number = position(line_index + 1, file)?;
                let mut column = 1;
                for word in line.split_word_bounds() {
                    let width = word.chars().count();
                    if !word.trim().is_empty() {
                        let symbol = interner.get_or_intern(word).to_usize();
                        let tag = u32::try_from(symbol)
                            .ok()
                            .and_then(|symbol| symbol.checked_add(TokenType::FIRST_FREE))
                            .ok_or_else(|| TokenizeError::Frontend {
                                path: file.path.clone(),
                                message: "too many distinct words".to_owned(),
                            })?;
                        tokens.push(Token::new(
                            TokenType(tag),
                            file_index,
                            line_number,
                            position(column, file)?,
                            position(width, file)?,
                        ));
                    }
                    column += width;
                }
            }
            tokens.push(Token::file_end(file_index));
        }
        Ok(tokens)
    }
}
