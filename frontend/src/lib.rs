//! # ccl-frontend: compiler front end for the CCL toy language
//!
//! Turns regular-expression token patterns into finite automata, then uses
//! those automata to tokenize source text in one pass while keeping a
//! scope-aware symbol table in step with the declarations it sees.
//!
//! ## Architecture
//!
//! ```text
//!  token patterns (LanguageConfig / token_patterns.ebnf)
//!        │
//!        ▼
//!  ┌──────────────────────────────┐
//!  │ automata                     │
//!  │   regex:  pattern → postfix  │
//!  │           → NFA (Thompson)   │
//!  │   subset: NFA → DFA          │
//!  └──────────────────────────────┘
//!        │ one DFA per token kind
//!        ▼
//!  ┌──────────────────────────────┐      ┌─────────────────────────┐
//!  │ lexer::Tokenizer             │─────▶│ declare                 │
//!  │   longest match, first-      │token │   DeclarationTracker    │
//!  │   registered wins ties       │      │   → symbols::SymbolTable│
//!  └──────────────────────────────┘      └─────────────────────────┘
//!        │                                        │
//!        └──────────────► Diagnostics ◄───────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use ccl_frontend::{Diagnostics, LanguageConfig, TokenKind, Tokenizer};
//!
//! let mut diagnostics = Diagnostics::new();
//! let tokenizer = Tokenizer::from_config(&LanguageConfig::default(), &mut diagnostics);
//! let analysis = tokenizer.analyze("global integer max = 100");
//!
//! let kinds: Vec<TokenKind> = analysis.tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(kinds.last(), Some(&TokenKind::Eof));
//! assert_eq!(analysis.symbols.lookup("max").map(|s| s.scope), Some(0));
//! ```

pub mod automata;
pub mod config;
pub mod declare;
pub mod diagnostics;
pub mod error;
pub mod language;
pub mod lexer;
pub mod symbols;
pub mod token;

#[cfg(test)]
mod tests;

pub use config::{parse_token_patterns, LanguageConfig, PatternDef};
pub use declare::DeclarationTracker;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{ConfigError, PatternErrorKind, PatternSyntaxError, SemanticError};
pub use lexer::{Analysis, Lexeme, Tokenizer};
pub use symbols::{DataType, ScopeId, Symbol, SymbolTable, Value, GLOBAL_SCOPE};
pub use token::{Token, TokenKind};
