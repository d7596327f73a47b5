//! Token kinds of the CCL language and the tokens the tokenizer emits.

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::symbols::DataType;

/// Token kind produced by the tokenizer. Each variant corresponds to a
/// distinct terminal of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TokenKind {
    // Keywords
    Global,
    Function,
    Integer,
    Decimal,
    Boolean,
    Character,
    If,
    Else,
    While,
    Return,

    // Literals and names
    IntegerLiteral,
    DecimalLiteral,
    BooleanLiteral,
    CharacterLiteral,
    Identifier,

    // Operators
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulus,
    Exponent,
    Assign,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    // Delimiters
    #[cfg_attr(feature = "serde", serde(rename = "LPAREN"))]
    LParen,
    #[cfg_attr(feature = "serde", serde(rename = "RPAREN"))]
    RParen,
    #[cfg_attr(feature = "serde", serde(rename = "LBRACE"))]
    LBrace,
    #[cfg_attr(feature = "serde", serde(rename = "RBRACE"))]
    RBrace,
    Semicolon,
    Comma,

    // Trivia
    Whitespace,
    SingleLineComment,
    MultiLineComment,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Every kind, in declaration order.
    pub const ALL: [TokenKind; 38] = [
        TokenKind::Global,
        TokenKind::Function,
        TokenKind::Integer,
        TokenKind::Decimal,
        TokenKind::Boolean,
        TokenKind::Character,
        TokenKind::If,
        TokenKind::Else,
        TokenKind::While,
        TokenKind::Return,
        TokenKind::IntegerLiteral,
        TokenKind::DecimalLiteral,
        TokenKind::BooleanLiteral,
        TokenKind::CharacterLiteral,
        TokenKind::Identifier,
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Multiply,
        TokenKind::Divide,
        TokenKind::Modulus,
        TokenKind::Exponent,
        TokenKind::Assign,
        TokenKind::Equal,
        TokenKind::NotEqual,
        TokenKind::Less,
        TokenKind::Greater,
        TokenKind::LessEqual,
        TokenKind::GreaterEqual,
        TokenKind::LParen,
        TokenKind::RParen,
        TokenKind::LBrace,
        TokenKind::RBrace,
        TokenKind::Semicolon,
        TokenKind::Comma,
        TokenKind::Whitespace,
        TokenKind::SingleLineComment,
        TokenKind::MultiLineComment,
        TokenKind::Eof,
    ];

    /// Upper-case name used in listings and pattern files.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Global => "GLOBAL",
            TokenKind::Function => "FUNCTION",
            TokenKind::Integer => "INTEGER",
            TokenKind::Decimal => "DECIMAL",
            TokenKind::Boolean => "BOOLEAN",
            TokenKind::Character => "CHARACTER",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::Return => "RETURN",
            TokenKind::IntegerLiteral => "INTEGER_LITERAL",
            TokenKind::DecimalLiteral => "DECIMAL_LITERAL",
            TokenKind::BooleanLiteral => "BOOLEAN_LITERAL",
            TokenKind::CharacterLiteral => "CHARACTER_LITERAL",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Multiply => "MULTIPLY",
            TokenKind::Divide => "DIVIDE",
            TokenKind::Modulus => "MODULUS",
            TokenKind::Exponent => "EXPONENT",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Equal => "EQUAL",
            TokenKind::NotEqual => "NOT_EQUAL",
            TokenKind::Less => "LESS",
            TokenKind::Greater => "GREATER",
            TokenKind::LessEqual => "LESS_EQUAL",
            TokenKind::GreaterEqual => "GREATER_EQUAL",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Comma => "COMMA",
            TokenKind::Whitespace => "WHITESPACE",
            TokenKind::SingleLineComment => "SINGLE_LINE_COMMENT",
            TokenKind::MultiLineComment => "MULTI_LINE_COMMENT",
            TokenKind::Eof => "EOF",
        }
    }

    /// Inverse of [`TokenKind::name`].
    pub fn from_name(name: &str) -> Option<TokenKind> {
        TokenKind::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Whitespace and comments: consumed, never emitted.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::SingleLineComment | TokenKind::MultiLineComment
        )
    }

    /// The type named by a type keyword (`integer`, `decimal`, ...).
    pub fn declared_type(self) -> Option<DataType> {
        match self {
            TokenKind::Integer => Some(DataType::Integer),
            TokenKind::Decimal => Some(DataType::Decimal),
            TokenKind::Boolean => Some(DataType::Boolean),
            TokenKind::Character => Some(DataType::Character),
            _ => None,
        }
    }

    /// The type of value a literal kind spells.
    pub fn literal_type(self) -> Option<DataType> {
        match self {
            TokenKind::IntegerLiteral => Some(DataType::Integer),
            TokenKind::DecimalLiteral => Some(DataType::Decimal),
            TokenKind::BooleanLiteral => Some(DataType::Boolean),
            TokenKind::CharacterLiteral => Some(DataType::Character),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A token: kind, exact source text, and 1-based position of its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lexeme.is_empty() {
            write!(f, "{} at {}:{}", self.kind, self.line, self.column)
        } else {
            write!(f, "{}({:?}) at {}:{}", self.kind, self.lexeme, self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in TokenKind::ALL {
            assert_eq!(TokenKind::from_name(kind.name()), Some(kind), "kind {:?}", kind);
        }
        assert_eq!(TokenKind::from_name("integer_literal"), None);
    }

    #[test]
    fn test_trivia_kinds() {
        let trivia: Vec<TokenKind> = TokenKind::ALL.into_iter().filter(|k| k.is_trivia()).collect();
        assert_eq!(
            trivia,
            vec![
                TokenKind::Whitespace,
                TokenKind::SingleLineComment,
                TokenKind::MultiLineComment
            ]
        );
    }

    #[test]
    fn test_type_keywords_and_literals() {
        assert_eq!(TokenKind::Decimal.declared_type(), Some(DataType::Decimal));
        assert_eq!(TokenKind::Function.declared_type(), None);
        assert_eq!(TokenKind::CharacterLiteral.literal_type(), Some(DataType::Character));
        assert_eq!(TokenKind::Identifier.literal_type(), None);
    }

    #[test]
    fn test_token_display() {
        assert_eq!(
            Token::new(TokenKind::Identifier, "max", 1, 16).to_string(),
            "IDENTIFIER(\"max\") at 1:16"
        );
        assert_eq!(Token::new(TokenKind::Eof, "", 2, 1).to_string(), "EOF at 2:1");
    }
}
