//! Longest-match, multi-pattern tokenizer.
//!
//! Each registered token kind owns a DFA built by the automata pipeline:
//! `Pattern -> NFA (Thompson) -> DFA (subset construction)`.
//!
//! At every offset all DFAs are walked over the remaining input. The longest
//! accepted prefix wins; on equal lengths the earliest registered kind wins.
//! If nothing matches, one character is reported and skipped, so a run
//! always reaches the end of the input.

use tracing::{debug, trace, warn};

use crate::automata::{compile, determinize, Dfa};
use crate::config::{LanguageConfig, PatternDef};
use crate::declare::DeclarationTracker;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::PatternSyntaxError;
use crate::symbols::{SymbolTable, DEFAULT_MAX_DECIMAL_PLACES};
use crate::token::{Token, TokenKind};

/// A registered token kind with its compiled automaton.
#[derive(Debug, Clone)]
pub struct TokenRule {
    pub kind: TokenKind,
    pub pattern: String,
    pub dfa: Dfa,
    pub stats: PatternStats,
}

/// Statistics for one compiled pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternStats {
    pub num_nfa_states: usize,
    pub num_dfa_states: usize,
    pub num_dfa_transitions: usize,
}

/// A slice of source consumed in one tokenizer step.
///
/// `kind` is `None` for a character no pattern accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub kind: Option<TokenKind>,
    pub text: &'a str,
    pub line: usize,
    pub column: usize,
}

/// Tokens, final symbol table and diagnostics of one run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub tokens: Vec<Token>,
    pub symbols: SymbolTable,
    pub diagnostics: Diagnostics,
}

/// Ordered set of token rules plus the settings the symbol table needs.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    rules: Vec<TokenRule>,
    max_decimal_places: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// A tokenizer with no rules.
    pub fn new() -> Self {
        Tokenizer {
            rules: Vec::new(),
            max_decimal_places: DEFAULT_MAX_DECIMAL_PLACES,
        }
    }

    pub fn with_max_decimal_places(mut self, places: usize) -> Self {
        self.max_decimal_places = places;
        self
    }

    /// Register every definition in order. Failures are logged and recorded
    /// as pattern diagnostics; the remaining definitions are still registered.
    pub fn with_patterns(defs: &[PatternDef], diagnostics: &mut Diagnostics) -> Self {
        let mut tokenizer = Tokenizer::new();
        for def in defs {
            if let Err(error) = tokenizer.register(def.kind, &def.pattern) {
                warn!(kind = %def.kind, %error, "skipping token pattern");
                diagnostics.pattern(&error);
            }
        }
        tokenizer
    }

    pub fn from_config(config: &LanguageConfig, diagnostics: &mut Diagnostics) -> Self {
        Self::with_patterns(&config.patterns, diagnostics).with_max_decimal_places(config.max_decimal_places)
    }

    /// Compile `pattern` and append it as the lowest-priority rule.
    ///
    /// # Errors
    ///
    /// Returns the `PatternSyntaxError` unchanged; the tokenizer is untouched.
    pub fn register(&mut self, kind: TokenKind, pattern: &str) -> Result<(), PatternSyntaxError> {
        let nfa = compile(pattern)?;
        let dfa = determinize(&nfa);
        let stats = PatternStats {
            num_nfa_states: nfa.num_states(),
            num_dfa_states: dfa.num_states(),
            num_dfa_transitions: dfa.num_transitions(),
        };
        debug!(
            %kind,
            pattern,
            nfa_states = stats.num_nfa_states,
            dfa_states = stats.num_dfa_states,
            dfa_transitions = stats.num_dfa_transitions,
            "registered token pattern"
        );
        self.rules.push(TokenRule {
            kind,
            pattern: pattern.to_string(),
            dfa,
            stats,
        });
        Ok(())
    }

    pub fn rules(&self) -> &[TokenRule] {
        &self.rules
    }

    /// The winning rule index and match length at the start of `input`.
    pub fn longest_match(&self, input: &[u8]) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(len) = rule.dfa.longest_prefix(input) {
                /* Strictly longer only: earlier rules keep ties */
                if best.map_or(true, |(_, best_len)| len > best_len) {
                    best = Some((index, len));
                }
            }
        }
        best
    }

    /// Every consumed slice of `source`, trivia and unmatched characters included.
    pub fn lexemes<'a>(&'a self, source: &'a str) -> Lexemes<'a> {
        Lexemes {
            tokenizer: self,
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize `source`, tracking declarations into a fresh symbol table.
    pub fn analyze(&self, source: &str) -> Analysis {
        let mut symbols = SymbolTable::with_max_decimal_places(self.max_decimal_places);
        let mut diagnostics = Diagnostics::new();
        let mut tracker = DeclarationTracker::new();
        let mut tokens: Vec<Token> = Vec::new();

        let mut lexemes = self.lexemes(source);
        for lexeme in lexemes.by_ref() {
            let Some(kind) = lexeme.kind else {
                diagnostics.lexical(
                    lexeme.line,
                    lexeme.column,
                    format!("unexpected character {:?}", lexeme.text),
                );
                continue;
            };
            if kind.is_trivia() {
                continue;
            }
            let token = Token::new(kind, lexeme.text, lexeme.line, lexeme.column);
            trace!(%token, "token");
            tracker.observe(&token, &mut symbols, &mut diagnostics);
            tokens.push(token);
        }

        let (line, column) = lexemes.position();
        tokens.push(Token::new(TokenKind::Eof, "", line, column));

        debug!(
            tokens = tokens.len(),
            symbols = symbols.len(),
            diagnostics = diagnostics.len(),
            "analysis finished"
        );
        Analysis {
            tokens,
            symbols,
            diagnostics,
        }
    }

    /// Tokenize `source`. The token vector always ends with one `EOF` token.
    pub fn tokenize(&self, source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
        let analysis = self.analyze(source);
        (analysis.tokens, analysis.diagnostics.into_vec())
    }
}

/// Iterator returned by [`Tokenizer::lexemes`].
#[derive(Debug, Clone)]
pub struct Lexemes<'a> {
    tokenizer: &'a Tokenizer,
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexemes<'a> {
    /// Line and column of the next unconsumed character.
    pub fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset += text.len();
    }
}

impl<'a> Iterator for Lexemes<'a> {
    type Item = Lexeme<'a>;

    fn next(&mut self) -> Option<Lexeme<'a>> {
        let rest = &self.source[self.offset..];
        let first = rest.chars().next()?;
        let (line, column) = (self.line, self.column);

        /* Automata are ASCII-only, so every match ends on a char boundary */
        let (kind, len) = match self.tokenizer.longest_match(rest.as_bytes()) {
            Some((index, len)) => (Some(self.tokenizer.rules[index].kind), len),
            None => (None, first.len_utf8()),
        };
        let text = &rest[..len];
        self.advance(text);

        Some(Lexeme {
            kind,
            text,
            line,
            column,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer(rules: &[(TokenKind, &str)]) -> Tokenizer {
        let mut t = Tokenizer::new();
        for (kind, pattern) in rules {
            t.register(*kind, pattern).expect("valid pattern");
        }
        t
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_register_reports_stats() {
        let mut t = Tokenizer::new();
        t.register(TokenKind::Identifier, "[a-z]+").unwrap();
        assert_eq!(t.rules().len(), 1);
        let stats = t.rules()[0].stats;
        assert_eq!(stats.num_nfa_states, 4);
        assert_eq!(stats.num_dfa_states, 2);
        assert_eq!(stats.num_dfa_transitions, 52);
        assert_eq!(t.rules()[0].pattern, "[a-z]+");
    }

    #[test]
    fn test_register_failure_leaves_rules_untouched() {
        let mut t = Tokenizer::new();
        assert!(t.register(TokenKind::Plus, "+").is_err());
        assert!(t.rules().is_empty());
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let t = tokenizer(&[(TokenKind::If, "if"), (TokenKind::Identifier, "[a-z]+")]);
        let (tokens, _) = t.tokenize("if");
        assert_eq!(kinds(&tokens), vec![TokenKind::If, TokenKind::Eof]);

        let t = tokenizer(&[(TokenKind::Identifier, "[a-z]+"), (TokenKind::If, "if")]);
        let (tokens, _) = t.tokenize("if");
        assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn test_longer_match_beats_priority() {
        let t = tokenizer(&[(TokenKind::If, "if"), (TokenKind::Identifier, "[a-z]+")]);
        let (tokens, _) = t.tokenize("iffy");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "iffy");
    }

    #[test]
    fn test_unmatched_character_is_skipped() {
        let t = tokenizer(&[(TokenKind::Identifier, "[a-z]+")]);
        let (tokens, diags) = t.tokenize("ab@cd");
        assert_eq!(
            tokens.iter().map(|t| t.lexeme.as_str()).collect::<Vec<_>>(),
            vec!["ab", "cd", ""]
        );
        assert_eq!(diags.len(), 1);
        assert_eq!((diags[0].line, diags[0].column), (1, 3));
    }

    #[test]
    fn test_non_ascii_skipped_as_one_character() {
        let t = tokenizer(&[(TokenKind::Identifier, "[a-z]+")]);
        let (tokens, diags) = t.tokenize("aé b");
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].column, 2);
        assert_eq!(diags[1].column, 3);
        assert_eq!(tokens[1].lexeme, "b");
        assert_eq!(tokens[1].column, 4);
    }

    #[test]
    fn test_empty_tokenizer_reports_every_character() {
        let (tokens, diags) = Tokenizer::new().tokenize("ab");
        assert_eq!(kinds(&tokens), vec![TokenKind::Eof]);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_eof_position() {
        let t = tokenizer(&[(TokenKind::Whitespace, "[ \\n]+"), (TokenKind::Identifier, "[a-z]+")]);
        let (tokens, _) = t.tokenize("ab\ncd ");
        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!((eof.line, eof.column), (2, 4));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 1));

        let (tokens, _) = t.tokenize("");
        assert_eq!(tokens, vec![Token::new(TokenKind::Eof, "", 1, 1)]);
    }

    #[test]
    fn test_lexemes_include_trivia() {
        let t = tokenizer(&[(TokenKind::Whitespace, " +"), (TokenKind::Identifier, "[a-z]+")]);
        let lexemes: Vec<Lexeme> = t.lexemes("a  b?").collect();
        assert_eq!(
            lexemes.iter().map(|l| (l.kind, l.text)).collect::<Vec<_>>(),
            vec![
                (Some(TokenKind::Identifier), "a"),
                (Some(TokenKind::Whitespace), "  "),
                (Some(TokenKind::Identifier), "b"),
                (None, "?"),
            ]
        );
    }

    #[test]
    fn test_with_patterns_records_failures_and_continues() {
        let defs = vec![
            PatternDef::new(TokenKind::LParen, "("),
            PatternDef::new(TokenKind::Identifier, "[a-z]+"),
        ];
        let mut diags = Diagnostics::new();
        let t = Tokenizer::with_patterns(&defs, &mut diags);
        assert_eq!(t.rules().len(), 1);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().kind, crate::diagnostics::DiagnosticKind::Pattern);
    }
}
