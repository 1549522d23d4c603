/// Tag assigned to a token by a language frontend.
///
/// The tiling core never looks inside a tag, two tokens match exactly when their tags are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenType(pub u32);

impl TokenType {
    /// Emitted by frontends after the last token of every file.
    pub const FILE_END: TokenType = TokenType(0);
    pub const SEPARATOR: TokenType = TokenType(1);
    /// Smallest tag a frontend may use for its own token kinds.
    pub const FIRST_FREE: u32 = 2;

    /// Reserved tokens never take part in a match and don't count towards a submission's length.
    pub fn is_reserved(self) -> bool {
        self == TokenType::FILE_END || self == TokenType::SEPARATOR
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    /// Index into the file list of the owning submission.
    pub file: u32,
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

impl Token {
    pub fn new(token_type: TokenType, file: u32, line: u32, column: u32, length: u32) -> Token {
        Token {
            token_type,
            file,
            line,
            column,
            length,
        }
    }

    pub fn file_end(file: u32) -> Token {
        Token::new(TokenType::FILE_END, file, 0, 0, 0)
    }

    /// Builds a single-line token sequence out of bare tags, one column per token.
    pub fn sequence_of(types: &[u32]) -> Vec<Token> {
        types
            .iter()
            .enumerate()
            .map(|(column, &tag)| Token::new(TokenType(tag), 0, 1, column as u32 + 1, 1))
            .collect()
    }
}

/// Number of tokens that can take part in a match.
pub fn comparable_length(tokens: &[Token]) -> usize {
    tokens.iter().filter(|token| !token.token_type.is_reserved()).count()
}

#[cfg(test)]
mod test {
    use super::{comparable_length, Token, TokenType};

    #[test]
    fn reserved_tokens_are_not_comparable() {
        let mut tokens = Token::sequence_of(&[5, 6, 7]);
        tokens.push(Token::file_end(0));
        tokens.insert(1, Token::new(TokenType::SEPARATOR, 0, 1, 2, 0));
        assert_eq!(tokens.len(), 5);
        assert_eq!(comparable_length(&tokens), 3);
    }

    #[test]
    fn sequence_positions() {
        let tokens = Token::sequence_of(&[4, 4]);
        assert_eq!(tokens[1].column, 2);
        assert_eq!(tokens[1].token_type, TokenType(4));
    }
}
