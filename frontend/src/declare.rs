//! Declaration tracking over the token stream.
//!
//! [`DeclarationTracker`] is fed every non-trivia token in order and keeps
//! the symbol table in step with the declarations, references, assignments
//! and braces it sees. Problems become semantic diagnostics positioned at the
//! offending token; the tracker itself never fails.
//!
//! Function headers get special treatment: after `function <name>`, typed
//! parameter names are held back until the body's `{` opens the function
//! scope, then declared inside it. Elsewhere, a `,` right after a declared
//! name or its initializer declares the next name with the same type.

use tracing::trace;

use crate::diagnostics::Diagnostics;
use crate::error::SemanticError;
use crate::symbols::{DataType, SymbolTable};
use crate::token::{Token, TokenKind};

/// Where the tracker is inside the current statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum DeclState {
    /// No declaration or assignment in progress.
    #[default]
    Idle,
    /// Saw `global`, a type keyword, or `function`; the next identifier is
    /// declared if a type is known.
    AwaitingIdentifier {
        data_type: Option<DataType>,
        is_global: bool,
    },
    /// Saw `<name> =`; the next literal is stored into `target`.
    AwaitingValue { target: String, negative: bool },
}

/// A parameter seen in a function header, waiting for the body scope.
#[derive(Debug, Clone, PartialEq)]
struct StagedParam {
    name: String,
    data_type: DataType,
    line: usize,
    column: usize,
}

/// Token-driven state machine that updates a [`SymbolTable`].
#[derive(Debug, Clone, Default)]
pub struct DeclarationTracker {
    state: DeclState,
    last_identifier: Option<String>,
    /// `Some` between a function's name and its opening brace.
    function_params: Option<Vec<StagedParam>>,
    /// Type and scope of the declaration list a `,` continues.
    declaration_list: Option<(DataType, bool)>,
}

impl DeclarationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the state machine by one non-trivia token.
    pub fn observe(&mut self, token: &Token, symbols: &mut SymbolTable, diagnostics: &mut Diagnostics) {
        trace!(kind = %token.kind, lexeme = %token.lexeme, state = ?self.state, "declaration tracker");

        let mut report = |error: SemanticError| diagnostics.semantic(token.line, token.column, &error);
        let declaration_list = self.declaration_list.take();

        match token.kind {
            TokenKind::Global => {
                let data_type = self.pending_type();
                self.state = DeclState::AwaitingIdentifier { data_type, is_global: true };
            },
            TokenKind::Function => {
                self.state = DeclState::AwaitingIdentifier {
                    data_type: Some(DataType::Function),
                    is_global: self.pending_global(),
                };
            },
            kind if kind.declared_type().is_some() => {
                /* A type keyword right after `function` is the return type */
                if self.pending_type() != Some(DataType::Function) {
                    self.state = DeclState::AwaitingIdentifier {
                        data_type: kind.declared_type(),
                        is_global: self.pending_global(),
                    };
                }
            },
            TokenKind::Identifier => {
                let name = token.lexeme.clone();
                self.last_identifier = match std::mem::take(&mut self.state) {
                    DeclState::AwaitingIdentifier { data_type: Some(data_type), is_global } => {
                        /* A rejected declaration takes no initializer */
                        self.declare(&name, data_type, is_global, token, symbols, &mut report)
                            .then_some(name)
                    },
                    _ => {
                        if symbols.lookup(&name).is_none() {
                            report(SemanticError::Undefined { name: name.clone() });
                        }
                        Some(name)
                    },
                };
            },
            TokenKind::Assign => {
                self.state = match self.last_identifier.take() {
                    Some(target) => DeclState::AwaitingValue { target, negative: false },
                    None => DeclState::Idle,
                };
                self.declaration_list = declaration_list;
            },
            TokenKind::Minus => {
                self.state = match std::mem::take(&mut self.state) {
                    DeclState::AwaitingValue { target, negative } => {
                        self.declaration_list = declaration_list;
                        DeclState::AwaitingValue { target, negative: !negative }
                    },
                    _ => DeclState::Idle,
                };
            },
            kind if kind.literal_type().is_some() => {
                if let DeclState::AwaitingValue { target, negative } = std::mem::take(&mut self.state) {
                    /* Undefined targets were already reported at the reference */
                    if symbols.lookup(&target).is_some() {
                        let text = if negative {
                            format!("-{}", token.lexeme)
                        } else {
                            token.lexeme.clone()
                        };
                        if let Err(error) = symbols.assign_literal(&target, &text) {
                            report(error);
                            /* The target stays pending until a literal fits */
                            self.state = DeclState::AwaitingValue { target, negative: false };
                        }
                    }
                }
                self.declaration_list = declaration_list;
            },
            TokenKind::Comma => {
                self.state = match declaration_list {
                    Some((data_type, is_global)) => DeclState::AwaitingIdentifier {
                        data_type: Some(data_type),
                        is_global,
                    },
                    None => DeclState::Idle,
                };
            },
            TokenKind::LBrace => {
                symbols.enter_scope();
                if let Some(params) = self.function_params.take() {
                    for param in params {
                        if let Err(error) = symbols.add(&param.name, param.data_type, false, None) {
                            diagnostics.semantic(param.line, param.column, &error);
                        }
                    }
                }
                self.reset();
            },
            TokenKind::RBrace => {
                if symbols.exit_scope().is_none() {
                    report(SemanticError::UnbalancedScope);
                }
                self.function_params = None;
                self.reset();
            },
            TokenKind::Semicolon => {
                /* A header ended by `;` is a prototype: no body scope follows */
                self.function_params = None;
                self.reset();
            },
            _ => {
                self.state = DeclState::Idle;
            },
        }
    }

    /// Declare or stage `name`; returns whether the declaration was accepted.
    fn declare(
        &mut self,
        name: &str,
        data_type: DataType,
        is_global: bool,
        token: &Token,
        symbols: &mut SymbolTable,
        report: &mut impl FnMut(SemanticError),
    ) -> bool {
        if let Some(params) = self.function_params.as_mut() {
            if data_type != DataType::Function {
                params.push(StagedParam {
                    name: name.to_string(),
                    data_type,
                    line: token.line,
                    column: token.column,
                });
                return true;
            }
        }

        if data_type == DataType::Function {
            self.function_params = Some(Vec::new());
        } else {
            self.declaration_list = Some((data_type, is_global));
        }
        match symbols.add(name, data_type, is_global, None) {
            Ok(()) => true,
            Err(error) => {
                report(error);
                false
            },
        }
    }

    fn pending_type(&self) -> Option<DataType> {
        match &self.state {
            DeclState::AwaitingIdentifier { data_type, .. } => *data_type,
            _ => None,
        }
    }

    fn pending_global(&self) -> bool {
        matches!(self.state, DeclState::AwaitingIdentifier { is_global: true, .. })
    }

    fn reset(&mut self) {
        self.state = DeclState::Idle;
        self.last_identifier = None;
        self.declaration_list = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{Value, GLOBAL_SCOPE};

    fn tok(kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, 1, 1)
    }

    fn run(tokens: &[Token]) -> (SymbolTable, Diagnostics) {
        let mut tracker = DeclarationTracker::new();
        let mut symbols = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        for t in tokens {
            tracker.observe(t, &mut symbols, &mut diagnostics);
        }
        (symbols, diagnostics)
    }

    #[test]
    fn test_global_declaration_with_value() {
        let (symbols, diags) = run(&[
            tok(TokenKind::Global, "global"),
            tok(TokenKind::Integer, "integer"),
            tok(TokenKind::Identifier, "max"),
            tok(TokenKind::Assign, "="),
            tok(TokenKind::IntegerLiteral, "100"),
        ]);
        assert!(diags.is_empty());
        let sym = symbols.lookup("max").unwrap();
        assert_eq!(sym.scope, GLOBAL_SCOPE);
        assert!(sym.is_global);
        assert_eq!(sym.value, Some(Value::Integer(100)));
    }

    #[test]
    fn test_negative_literal() {
        let (symbols, diags) = run(&[
            tok(TokenKind::Decimal, "decimal"),
            tok(TokenKind::Identifier, "d"),
            tok(TokenKind::Assign, "="),
            tok(TokenKind::Minus, "-"),
            tok(TokenKind::DecimalLiteral, "2.5"),
        ]);
        assert!(diags.is_empty());
        assert_eq!(symbols.lookup("d").unwrap().value, Some(Value::Decimal(-2.5)));
    }

    #[test]
    fn test_mismatched_literal_keeps_target_pending() {
        let (symbols, diags) = run(&[
            tok(TokenKind::Boolean, "boolean"),
            tok(TokenKind::Identifier, "b"),
            tok(TokenKind::Assign, "="),
            tok(TokenKind::IntegerLiteral, "1"),
            tok(TokenKind::BooleanLiteral, "true"),
        ]);
        assert_eq!(diags.len(), 1);
        assert_eq!(symbols.lookup("b").unwrap().value, Some(Value::Boolean(true)));
    }

    #[test]
    fn test_rejected_declaration_discards_initializer() {
        let (symbols, diags) = run(&[
            tok(TokenKind::Integer, "integer"),
            tok(TokenKind::Identifier, "x"),
            tok(TokenKind::Assign, "="),
            tok(TokenKind::IntegerLiteral, "1"),
            tok(TokenKind::Semicolon, ";"),
            tok(TokenKind::Integer, "integer"),
            tok(TokenKind::Identifier, "x"),
            tok(TokenKind::Assign, "="),
            tok(TokenKind::IntegerLiteral, "2"),
        ]);
        assert_eq!(diags.len(), 1);
        assert_eq!(symbols.lookup("x").unwrap().value, Some(Value::Integer(1)));
    }

    #[test]
    fn test_comma_continues_declaration_list() {
        let (symbols, diags) = run(&[
            tok(TokenKind::Global, "global"),
            tok(TokenKind::Decimal, "decimal"),
            tok(TokenKind::Identifier, "a"),
            tok(TokenKind::Assign, "="),
            tok(TokenKind::Minus, "-"),
            tok(TokenKind::DecimalLiteral, "1.5"),
            tok(TokenKind::Comma, ","),
            tok(TokenKind::Identifier, "b"),
            tok(TokenKind::Semicolon, ";"),
            tok(TokenKind::Comma, ","),
            tok(TokenKind::Identifier, "c"),
        ]);
        assert_eq!(diags.len(), 1, "only the stray `c` is undefined");
        assert_eq!(symbols.lookup("a").unwrap().value, Some(Value::Decimal(-1.5)));
        let b = symbols.lookup("b").unwrap();
        assert_eq!(b.data_type, DataType::Decimal);
        assert!(b.is_global);
        assert!(symbols.lookup("c").is_none());
    }

    #[test]
    fn test_non_literal_expression_cancels_assignment() {
        let (symbols, diags) = run(&[
            tok(TokenKind::Integer, "integer"),
            tok(TokenKind::Identifier, "x"),
            tok(TokenKind::Assign, "="),
            tok(TokenKind::LParen, "("),
            tok(TokenKind::IntegerLiteral, "1"),
        ]);
        assert!(diags.is_empty());
        assert_eq!(symbols.lookup("x").unwrap().value, None);
    }

    #[test]
    fn test_undefined_reference_reported_once() {
        let (_, diags) = run(&[
            tok(TokenKind::Identifier, "ghost"),
            tok(TokenKind::Assign, "="),
            tok(TokenKind::IntegerLiteral, "3"),
        ]);
        assert_eq!(diags.len(), 1);
        assert!(diags.iter().next().unwrap().message.contains("undefined symbol"));
    }

    #[test]
    fn test_function_parameters_live_in_function_scope() {
        let mut tracker = DeclarationTracker::new();
        let mut symbols = SymbolTable::new();
        let mut diags = Diagnostics::new();
        let header = [
            tok(TokenKind::Function, "function"),
            tok(TokenKind::Integer, "integer"),
            tok(TokenKind::Identifier, "add"),
            tok(TokenKind::LParen, "("),
            tok(TokenKind::Integer, "integer"),
            tok(TokenKind::Identifier, "a"),
            tok(TokenKind::Comma, ","),
            tok(TokenKind::Integer, "integer"),
            tok(TokenKind::Identifier, "b"),
            tok(TokenKind::RParen, ")"),
        ];
        for t in &header {
            tracker.observe(t, &mut symbols, &mut diags);
        }
        assert!(tracker.function_params.is_some());
        assert!(symbols.lookup("a").is_none());
        assert_eq!(symbols.lookup("add").unwrap().data_type, DataType::Function);

        tracker.observe(&tok(TokenKind::LBrace, "{"), &mut symbols, &mut diags);
        assert!(tracker.function_params.is_none());
        assert_eq!(symbols.lookup("a").unwrap().scope, 1);
        assert_eq!(symbols.lookup("b").unwrap().data_type, DataType::Integer);

        tracker.observe(&tok(TokenKind::RBrace, "}"), &mut symbols, &mut diags);
        assert!(symbols.lookup("a").is_none());
        assert!(symbols.lookup("add").is_some());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_prototype_discards_parameters() {
        let (symbols, diags) = run(&[
            tok(TokenKind::Function, "function"),
            tok(TokenKind::Identifier, "f"),
            tok(TokenKind::LParen, "("),
            tok(TokenKind::Integer, "integer"),
            tok(TokenKind::Identifier, "p"),
            tok(TokenKind::RParen, ")"),
            tok(TokenKind::Semicolon, ";"),
            tok(TokenKind::LBrace, "{"),
        ]);
        assert!(diags.is_empty());
        assert!(symbols.lookup("p").is_none());
        assert_eq!(symbols.current_scope(), 1);
    }

    #[test]
    fn test_global_inside_function_goes_to_scope_zero() {
        let (symbols, diags) = run(&[
            tok(TokenKind::Function, "function"),
            tok(TokenKind::Identifier, "f"),
            tok(TokenKind::LParen, "("),
            tok(TokenKind::RParen, ")"),
            tok(TokenKind::LBrace, "{"),
            tok(TokenKind::Global, "global"),
            tok(TokenKind::Character, "character"),
            tok(TokenKind::Identifier, "c"),
            tok(TokenKind::RBrace, "}"),
        ]);
        assert!(diags.is_empty());
        let sym = symbols.lookup("c").unwrap();
        assert_eq!(sym.scope, GLOBAL_SCOPE);
        assert!(sym.is_global);
    }

    #[test]
    fn test_unbalanced_close_brace() {
        let (symbols, diags) = run(&[tok(TokenKind::RBrace, "}")]);
        assert_eq!(diags.len(), 1);
        assert!(diags.iter().next().unwrap().message.contains("unbalanced"));
        assert_eq!(symbols.current_scope(), GLOBAL_SCOPE);
    }

    #[test]
    fn test_semicolon_resets_pending_declaration() {
        let mut tracker = DeclarationTracker::new();
        let mut symbols = SymbolTable::new();
        let mut diags = Diagnostics::new();
        tracker.observe(&tok(TokenKind::Integer, "integer"), &mut symbols, &mut diags);
        assert!(matches!(tracker.state, DeclState::AwaitingIdentifier { .. }));
        tracker.observe(&tok(TokenKind::Semicolon, ";"), &mut symbols, &mut diags);
        assert_eq!(&tracker.state, &DeclState::Idle);
        assert_eq!(tracker.last_identifier, None);
    }
}
