//! Scope-aware symbol table.
//!
//! Symbols are grouped by name in an `IndexMap` so iteration follows first
//! declaration order. Each name maps to the stack of its live declarations,
//! one per scope at most. Scope 0 is the global scope and is never popped.

use std::fmt;

use indexmap::IndexMap;
#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::debug;

use crate::error::SemanticError;

/// Identifier for a lexical scope.
pub type ScopeId = u32;

/// The global scope.
pub const GLOBAL_SCOPE: ScopeId = 0;

/// Decimal literals may carry at most this many fraction digits by default.
pub const DEFAULT_MAX_DECIMAL_PLACES: usize = 5;

/// Declared type of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "lowercase"))]
pub enum DataType {
    Integer,
    Decimal,
    Boolean,
    Character,
    Function,
}

impl DataType {
    pub fn name(self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::Decimal => "decimal",
            DataType::Boolean => "boolean",
            DataType::Character => "character",
            DataType::Function => "function",
        }
    }

    /// Parse literal text as a value of this type.
    ///
    /// - integer: optional `-`, then digits only
    /// - decimal: optional `-`, then digits `.` digits
    /// - boolean: `true` or `false`
    /// - character: one character between single quotes
    ///
    /// Functions never hold values.
    pub fn parse_literal(self, text: &str) -> Option<Value> {
        match self {
            DataType::Integer => {
                let digits = text.strip_prefix('-').unwrap_or(text);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                text.parse().ok().map(Value::Integer)
            },
            DataType::Decimal => {
                let unsigned = text.strip_prefix('-').unwrap_or(text);
                let (whole, fraction) = unsigned.split_once('.')?;
                let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
                if !all_digits(whole) || !all_digits(fraction) {
                    return None;
                }
                text.parse().ok().map(Value::Decimal)
            },
            DataType::Boolean => match text {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            },
            DataType::Character => {
                let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
                let mut chars = inner.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Character(c)),
                    _ => None,
                }
            },
            DataType::Function => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed value held by a symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(untagged))]
pub enum Value {
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Character(char),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Decimal(_) => DataType::Decimal,
            Value::Boolean(_) => DataType::Boolean,
            Value::Character(_) => DataType::Character,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Character(c) => write!(f, "'{}'", c),
        }
    }
}

/// A declared name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Symbol {
    pub name: String,
    pub data_type: DataType,
    pub is_global: bool,
    /// Owning scope, fixed at declaration.
    pub scope: ScopeId,
    pub value: Option<Value>,
}

/// Symbol table with a stack of nested scopes.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    /// Live declarations per name, oldest first.
    entries: IndexMap<String, Vec<Symbol>>,
    /// Open scopes, outermost (global) first.
    scopes: Vec<ScopeId>,
    /// Highest scope id ever allocated; ids are never reused.
    max_scope: ScopeId,
    max_decimal_places: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_max_decimal_places(DEFAULT_MAX_DECIMAL_PLACES)
    }

    pub fn with_max_decimal_places(max_decimal_places: usize) -> Self {
        SymbolTable {
            entries: IndexMap::new(),
            scopes: vec![GLOBAL_SCOPE],
            max_scope: GLOBAL_SCOPE,
            max_decimal_places,
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.scopes.last().copied().unwrap_or(GLOBAL_SCOPE)
    }

    /// Nesting depth; 0 at global level.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn max_decimal_places(&self) -> usize {
        self.max_decimal_places
    }

    /// Open a new scope and return its id.
    pub fn enter_scope(&mut self) -> ScopeId {
        self.max_scope += 1;
        self.scopes.push(self.max_scope);
        debug!(scope = self.max_scope, depth = self.depth(), "entered scope");
        self.max_scope
    }

    /// Close the innermost scope, discarding every symbol it owns.
    ///
    /// Returns the closed scope id, or `None` at global level.
    pub fn exit_scope(&mut self) -> Option<ScopeId> {
        if self.scopes.len() <= 1 {
            return None;
        }
        let closed = self.scopes.pop()?;
        let mut discarded = 0usize;
        self.entries.retain(|_, stack| {
            let before = stack.len();
            stack.retain(|s| s.scope != closed);
            discarded += before - stack.len();
            !stack.is_empty()
        });
        debug!(scope = closed, discarded, "exited scope");
        Some(closed)
    }

    /// Declare `name` in scope 0 if `is_global`, else in the current scope.
    ///
    /// # Errors
    ///
    /// `AlreadyDefined` if the target scope already declares `name` (the
    /// existing declaration is kept); `TypeMismatch` if `initial_value` does
    /// not fit `data_type`.
    pub fn add(
        &mut self,
        name: &str,
        data_type: DataType,
        is_global: bool,
        initial_value: Option<Value>,
    ) -> Result<(), SemanticError> {
        let scope = if is_global { GLOBAL_SCOPE } else { self.current_scope() };

        if let Some(value) = initial_value {
            check_type(name, data_type, value)?;
        }

        let stack = self.entries.entry(name.to_string()).or_default();
        if stack.iter().any(|s| s.scope == scope) {
            return Err(SemanticError::AlreadyDefined {
                name: name.to_string(),
                scope,
            });
        }
        stack.push(Symbol {
            name: name.to_string(),
            data_type,
            is_global: scope == GLOBAL_SCOPE,
            scope,
            value: initial_value,
        });
        debug!(name, %data_type, scope, "declared symbol");
        Ok(())
    }

    /// Find the visible declaration of `name`, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let stack = self.entries.get(name)?;
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| stack.iter().find(|s| s.scope == *scope))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let stack = self.entries.get_mut(name)?;
        let scope = self
            .scopes
            .iter()
            .rev()
            .copied()
            .find(|scope| stack.iter().any(|s| s.scope == *scope))?;
        stack.iter_mut().find(|s| s.scope == scope)
    }

    /// Store `value` into the visible declaration of `name`.
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<(), SemanticError> {
        let symbol = self.lookup_mut(name).ok_or_else(|| SemanticError::Undefined {
            name: name.to_string(),
        })?;
        check_type(name, symbol.data_type, value)?;
        symbol.value = Some(value);
        Ok(())
    }

    /// Validate literal text against the declared type of `name`, then store it.
    ///
    /// Decimal literals are also limited to the configured number of
    /// fraction digits.
    pub fn assign_literal(&mut self, name: &str, text: &str) -> Result<(), SemanticError> {
        let max_places = self.max_decimal_places;
        let symbol = self.lookup_mut(name).ok_or_else(|| SemanticError::Undefined {
            name: name.to_string(),
        })?;

        let value = symbol.data_type.parse_literal(text).ok_or_else(|| {
            SemanticError::InvalidValue {
                name: name.to_string(),
                data_type: symbol.data_type,
                value: text.to_string(),
            }
        })?;

        if symbol.data_type == DataType::Decimal {
            let places = text.split_once('.').map_or(0, |(_, fraction)| fraction.len());
            if places > max_places {
                return Err(SemanticError::TooManyDecimalPlaces {
                    name: name.to_string(),
                    value: text.to_string(),
                    max: max_places,
                });
            }
        }

        symbol.value = Some(value);
        Ok(())
    }

    /// Every live symbol, in first-declaration order of names.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn check_type(name: &str, expected: DataType, value: Value) -> Result<(), SemanticError> {
    let found = value.data_type();
    if found == expected {
        Ok(())
    } else {
        Err(SemanticError::TypeMismatch {
            name: name.to_string(),
            expected,
            found,
        })
    }
}
