use super::{position, Language, SourceFile, TokenizeError};
use crate::token::{Token, TokenType};

/// One token per non-whitespace character, the tag derived from the code point.
pub struct CharLanguage;

impl CharLanguage {
    pub fn create() -> Box<dyn Language> {
        Box::new(CharLanguage)
    }
}

impl Language for CharLanguage {
    fn name(&self) -> &'static str {
        "char"
    }

    fn suffixes(&self) -> &[&'static str] {
        &["txt", "asc", "text"]
    }

    fn default_minimum_match_length(&self) -> usize {
        10
    }

    fn tokenize(&self, files: &[SourceFile]) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = vec![];
        for (file_index, file) in files.iter().enumerate() {
            let file_index =
                u32::try_from(file_index).map_err(|_| TokenizeError::TooManyFiles { count: files.len() })?;
            for (line_index, line) in file.content.lines().enumerate() {
                let line_number = position(line_index + 1, file)?;
                for (column_index, c) in line.chars().enumerate() {
                    if c.is_whitespace() {
                        continue;
                    }
                    let tag = TokenType(TokenType::FIRST_FREE + u32::from(c));
                    tokens.push(Token::new(tag, file_index, line_number, position(column_index + 1, file)?, 1));
                }
            }
            tokens.push(Token::file_end(file_index));
        }
        Ok(tokens)
    }
}
