//! Language configuration and the token-pattern file format.
//!
//! A pattern file lists one production per token kind, in priority order:
//!
//! ```text
//! (* comment, supports nesting and \-escapes *)
//! <IDENTIFIER> = /[a-z]+/ (* optional comment *) ;
//! ```
//!
//! The name is a [`TokenKind`] name. Inside `/.../` every `\x` pair is kept
//! verbatim, so a literal `/` is written `\/`.

use crate::automata::validate;
use crate::error::ConfigError;
use crate::language::DEFAULT_PATTERNS;
use crate::symbols::DEFAULT_MAX_DECIMAL_PLACES;
use crate::token::TokenKind;

/// The built-in pattern set in pattern-file form.
pub const DEFAULT_PATTERNS_EBNF: &str = include_str!("../token_patterns.ebnf");

/// One token kind and the pattern that recognises it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDef {
    pub kind: TokenKind,
    pub pattern: String,
}

impl PatternDef {
    pub fn new(kind: TokenKind, pattern: impl Into<String>) -> Self {
        PatternDef {
            kind,
            pattern: pattern.into(),
        }
    }
}

/// Everything that varies between front-end runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Token patterns in registration (priority) order.
    pub patterns: Vec<PatternDef>,
    /// Maximum fraction digits accepted in a decimal value.
    pub max_decimal_places: usize,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        LanguageConfig {
            patterns: DEFAULT_PATTERNS
                .iter()
                .map(|&(kind, pattern)| PatternDef::new(kind, pattern))
                .collect(),
            max_decimal_places: DEFAULT_MAX_DECIMAL_PLACES,
        }
    }
}

impl LanguageConfig {
    /// Configuration whose patterns come from a pattern file.
    pub fn from_ebnf(content: &str) -> Result<Self, ConfigError> {
        Ok(LanguageConfig {
            patterns: parse_token_patterns(content)?,
            ..Self::default()
        })
    }

    pub fn with_max_decimal_places(mut self, places: usize) -> Self {
        self.max_decimal_places = places;
        self
    }
}

/// Skip an EBNF comment `(* ... *)` supporting nesting and backslash escapes.
///
/// `pos` must point at the opening `(` of `(*`. On success, `pos` is advanced
/// past the matching `*)`.
fn skip_ebnf_comment(bytes: &[u8], pos: &mut usize) -> Result<(), ConfigError> {
    let comment_start = *pos;
    *pos += 2; /* skip opening '(*' */
    let mut depth: u32 = 1;
    let len = bytes.len();
    while *pos < len {
        match bytes[*pos] {
            b'\\' if *pos + 1 < len => {
                *pos += 2;
            },
            b'(' if *pos + 1 < len && bytes[*pos + 1] == b'*' => {
                depth += 1;
                *pos += 2;
            },
            b'*' if *pos + 1 < len && bytes[*pos + 1] == b')' => {
                depth -= 1;
                *pos += 2;
                if depth == 0 {
                    return Ok(());
                }
            },
            _ => {
                *pos += 1;
            },
        }
    }
    Err(ConfigError::new(
        comment_start,
        format!("unclosed EBNF comment (nesting depth {} at end of input)", depth),
    ))
}

fn skip_ws(input: &[u8], pos: &mut usize) {
    while *pos < input.len() && input[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
}

fn starts_comment(bytes: &[u8], pos: usize) -> bool {
    pos + 1 < bytes.len() && bytes[pos] == b'(' && bytes[pos + 1] == b'*'
}

/// Parse pattern-file content into pattern definitions, in file order.
///
/// Every pattern is compiled once for validation.
///
/// # Errors
///
/// `ConfigError` on malformed syntax, unknown or duplicate token names, the
/// reserved `EOF` name, or an invalid pattern.
pub fn parse_token_patterns(content: &str) -> Result<Vec<PatternDef>, ConfigError> {
    let mut defs: Vec<PatternDef> = Vec::new();
    let bytes = content.as_bytes();
    let len = bytes.len();
    let mut pos: usize = 0;

    loop {
        skip_ws(bytes, &mut pos);
        if pos >= len {
            break;
        }

        if starts_comment(bytes, pos) {
            skip_ebnf_comment(bytes, &mut pos)?;
            continue;
        }

        /* Parse production: <NAME> = /regex/ (* comment *) ; */
        if bytes[pos] != b'<' {
            return Err(ConfigError::new(
                pos,
                format!("expected '<' at start of production, found '{}'", bytes[pos] as char),
            ));
        }
        pos += 1;

        let name_start = pos;
        while pos < len && bytes[pos] != b'>' {
            pos += 1;
        }
        if pos >= len {
            return Err(ConfigError::new(name_start, "unclosed '<name>'"));
        }
        let name = content[name_start..pos].trim();
        pos += 1; /* skip '>' */

        let kind = match TokenKind::from_name(name) {
            Some(TokenKind::Eof) => {
                return Err(ConfigError::new(name_start, "<EOF> is produced implicitly and takes no pattern"));
            },
            Some(kind) => kind,
            None => {
                return Err(ConfigError::new(name_start, format!("unknown token name '{}'", name)));
            },
        };
        if defs.iter().any(|d| d.kind == kind) {
            return Err(ConfigError::new(name_start, format!("duplicate definition for <{}>", name)));
        }

        skip_ws(bytes, &mut pos);
        if pos >= len || bytes[pos] != b'=' {
            return Err(ConfigError::new(pos, "expected '=' after <name>"));
        }
        pos += 1;

        skip_ws(bytes, &mut pos);
        if pos >= len || bytes[pos] != b'/' {
            return Err(ConfigError::new(pos, "expected '/' to start regex"));
        }
        pos += 1;

        /* Read regex until unescaped '/' */
        let regex_start = pos;
        while pos < len {
            if bytes[pos] == b'\\' && pos + 1 < len {
                pos += 2;
            } else if bytes[pos] == b'/' {
                break;
            } else {
                pos += 1;
            }
        }
        if pos >= len {
            return Err(ConfigError::new(regex_start, "unclosed regex delimiter '/'"));
        }
        let pattern = content
            .get(regex_start..pos)
            .ok_or_else(|| ConfigError::new(regex_start, "invalid UTF-8 in regex"))?
            .to_string();
        pos += 1; /* skip closing '/' */

        validate(&pattern).map_err(|e| {
            ConfigError::new(
                regex_start + e.position,
                format!("in pattern for <{}>: {}", name, e.kind),
            )
        })?;

        /* Skip to ';', stepping over comments */
        loop {
            skip_ws(bytes, &mut pos);
            if pos >= len {
                return Err(ConfigError::new(pos, format!("expected ';' after <{}> production", name)));
            }
            if bytes[pos] == b';' {
                break;
            }
            if starts_comment(bytes, pos) {
                skip_ebnf_comment(bytes, &mut pos)?;
            } else {
                return Err(ConfigError::new(
                    pos,
                    format!("unexpected '{}' after <{}> pattern", bytes[pos] as char, name),
                ));
            }
        }
        pos += 1; /* skip ';' */

        defs.push(PatternDef { kind, pattern });
    }

    Ok(defs)
}
