//! Built-in token patterns for the CCL language.
//!
//! Order is priority: on equal-length matches the earlier entry wins, so
//! keywords precede the identifier pattern and `true|false` precedes it too.
//! Multi-character operators are listed before their one-character prefixes
//! for readability only; longest match already separates them.

use crate::token::TokenKind;

/// Source file extension used by CCL programs.
pub const SOURCE_EXTENSION: &str = "ccl";

/// Default `(kind, pattern)` table, in registration order.
pub const DEFAULT_PATTERNS: &[(TokenKind, &str)] = &[
    // Trivia
    (TokenKind::Whitespace, r"[ \t\r\n]+"),
    (TokenKind::SingleLineComment, r"\/\/[^\n]*"),
    (TokenKind::MultiLineComment, r"\/\*([^*]|\*+[^*\/])*\*+\/"),
    // Keywords
    (TokenKind::Global, "global"),
    (TokenKind::Function, "function"),
    (TokenKind::Integer, "integer"),
    (TokenKind::Decimal, "decimal"),
    (TokenKind::Boolean, "boolean"),
    (TokenKind::Character, "character"),
    (TokenKind::If, "if"),
    (TokenKind::Else, "else"),
    (TokenKind::While, "while"),
    (TokenKind::Return, "return"),
    // Literals and names
    (TokenKind::BooleanLiteral, "true|false"),
    (TokenKind::Identifier, "[a-z]+"),
    (TokenKind::DecimalLiteral, r"[0-9]+\.[0-9]+"),
    (TokenKind::IntegerLiteral, "[0-9]+"),
    (TokenKind::CharacterLiteral, r"'[^'\n]'"),
    // Operators
    (TokenKind::Equal, "=="),
    (TokenKind::NotEqual, "!="),
    (TokenKind::LessEqual, "<="),
    (TokenKind::GreaterEqual, ">="),
    (TokenKind::Less, "<"),
    (TokenKind::Greater, ">"),
    (TokenKind::Assign, "="),
    (TokenKind::Plus, r"\+"),
    (TokenKind::Minus, "-"),
    (TokenKind::Multiply, r"\*"),
    (TokenKind::Divide, r"\/"),
    (TokenKind::Modulus, "%"),
    (TokenKind::Exponent, r"\^"),
    // Delimiters
    (TokenKind::LParen, r"\("),
    (TokenKind::RParen, r"\)"),
    (TokenKind::LBrace, r"\{"),
    (TokenKind::RBrace, r"\}"),
    (TokenKind::Semicolon, ";"),
    (TokenKind::Comma, ","),
];

/// Keyword spellings, for display.
pub fn keywords() -> impl Iterator<Item = &'static str> {
    DEFAULT_PATTERNS
        .iter()
        .filter(|(kind, _)| {
            matches!(
                kind,
                TokenKind::Global
                    | TokenKind::Function
                    | TokenKind::If
                    | TokenKind::Else
                    | TokenKind::While
                    | TokenKind::Return
            ) || kind.declared_type().is_some()
        })
        .map(|(_, pattern)| *pattern)
}
