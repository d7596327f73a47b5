//! Symbol table behaviour, both directly and through `Tokenizer::analyze`.

use proptest::prelude::*;

use crate::config::LanguageConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::SemanticError;
use crate::lexer::{Analysis, Tokenizer};
use crate::symbols::{DataType, ScopeId, SymbolTable, Value, GLOBAL_SCOPE};

fn analyze_with(config: &LanguageConfig, source: &str) -> Analysis {
    let mut diagnostics = Diagnostics::new();
    let tokenizer = Tokenizer::from_config(config, &mut diagnostics);
    assert!(diagnostics.is_empty());
    tokenizer.analyze(source)
}

fn analyze(source: &str) -> Analysis {
    analyze_with(&LanguageConfig::default(), source)
}

fn semantic(analysis: &Analysis) -> Vec<&Diagnostic> {
    analysis
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::Semantic)
        .collect()
}

/* ── Declarations through the tokenizer ────────────────────────────────── */

#[test]
fn test_global_declaration_records_value() {
    let analysis = analyze("global integer max = 100");
    assert!(analysis.diagnostics.is_empty());
    let sym = analysis.symbols.lookup("max").expect("max declared");
    assert_eq!(sym.scope, GLOBAL_SCOPE);
    assert!(sym.is_global);
    assert_eq!(sym.data_type, DataType::Integer);
    assert_eq!(sym.value, Some(Value::Integer(100)));
}

#[test]
fn test_block_scope_symbol() {
    let analysis = analyze("{ integer x = 10");
    let sym = analysis.symbols.lookup("x").expect("x visible inside the block");
    assert_eq!(sym.scope, 1);
    assert!(!sym.is_global);
    assert_eq!(sym.value, Some(Value::Integer(10)));
}

#[test]
fn test_symbol_dies_with_its_block() {
    let analysis = analyze("{ integer x = 10 }\nx");
    assert!(analysis.symbols.lookup("x").is_none());
    let errors = semantic(&analysis);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "undefined symbol 'x'");
    assert_eq!((errors[0].line, errors[0].column), (2, 1));
}

#[test]
fn test_duplicate_in_same_scope_keeps_first() {
    let analysis = analyze("integer a; decimal a;");
    let errors = semantic(&analysis);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "symbol 'a' is already defined in scope 0");
    assert_eq!(errors[0].column, 20);
    assert_eq!(analysis.symbols.lookup("a").map(|s| s.data_type), Some(DataType::Integer));
    assert_eq!(analysis.symbols.len(), 1);
}

#[test]
fn test_redeclaration_initializer_is_discarded() {
    for source in ["integer x = 1; integer x = 2;", "integer x = 1; decimal x = 2.5;"] {
        let analysis = analyze(source);
        let errors = semantic(&analysis);
        assert_eq!(errors.len(), 1, "{source}: {errors:?}");
        assert_eq!(errors[0].message, "symbol 'x' is already defined in scope 0");
        let sym = analysis.symbols.lookup("x").expect("first x kept");
        assert_eq!(sym.data_type, DataType::Integer);
        assert_eq!(sym.value, Some(Value::Integer(1)), "{source}");
    }
}

#[test]
fn test_mismatched_literal_leaves_target_pending() {
    let analysis = analyze("boolean b = 1 true");
    let errors = semantic(&analysis);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "invalid boolean value '1' for symbol 'b'");
    assert_eq!(
        analysis.symbols.lookup("b").and_then(|s| s.value),
        Some(Value::Boolean(true))
    );
}

#[test]
fn test_comma_separated_declarations() {
    let analysis = analyze("integer a, b = 2, c; { character d, e }");
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    for name in ["a", "b", "c"] {
        let sym = analysis.symbols.lookup(name).expect("declared by the list");
        assert_eq!(sym.data_type, DataType::Integer);
    }
    assert_eq!(analysis.symbols.lookup("b").and_then(|s| s.value), Some(Value::Integer(2)));
    assert!(analysis.symbols.lookup("e").is_none());

    let analysis = analyze("integer a; a, z");
    let errors = semantic(&analysis);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "undefined symbol 'z'");
}

#[test]
fn test_inner_declaration_shadows_outer() {
    let analysis = analyze("integer x = 1 { decimal x = 2.5 }");
    assert!(analysis.diagnostics.is_empty());
    let sym = analysis.symbols.lookup("x").expect("outer x survives");
    assert_eq!(sym.value, Some(Value::Integer(1)));
}

#[test]
fn test_literal_of_each_type() {
    let analysis = analyze("character c = 'z'; boolean flag = false; integer n = -42; decimal d = -0.5");
    assert!(analysis.diagnostics.is_empty());
    let value = |name: &str| analysis.symbols.lookup(name).and_then(|s| s.value);
    assert_eq!(value("c"), Some(Value::Character('z')));
    assert_eq!(value("flag"), Some(Value::Boolean(false)));
    assert_eq!(value("n"), Some(Value::Integer(-42)));
    assert_eq!(value("d"), Some(Value::Decimal(-0.5)));
}

#[test]
fn test_wrong_literal_kind_is_invalid_value() {
    let analysis = analyze("decimal d = 3");
    let errors = semantic(&analysis);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "invalid decimal value '3' for symbol 'd'");
    assert_eq!(analysis.symbols.lookup("d").and_then(|s| s.value), None);
}

#[test]
fn test_decimal_place_limit_is_configurable() {
    let analysis = analyze("decimal ratio = 1.234567");
    let errors = semantic(&analysis);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("exceeds 5 decimal places"));

    let relaxed = LanguageConfig::default().with_max_decimal_places(6);
    let analysis = analyze_with(&relaxed, "decimal ratio = 1.234567");
    assert!(analysis.diagnostics.is_empty());
    assert_eq!(
        analysis.symbols.lookup("ratio").and_then(|s| s.value),
        Some(Value::Decimal(1.234567))
    );
}

#[test]
fn test_function_parameters_scoped_to_body() {
    let analysis = analyze("function integer add(integer a, integer b) { a = 1; } a");
    let add = analysis.symbols.lookup("add").expect("function declared");
    assert_eq!(add.data_type, DataType::Function);
    assert_eq!(add.scope, GLOBAL_SCOPE);

    let errors = semantic(&analysis);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "undefined symbol 'a'");
    assert_eq!(errors[0].column, 55);
}

#[test]
fn test_unbalanced_close_brace_is_reported() {
    let analysis = analyze("integer a }");
    let errors = semantic(&analysis);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, SemanticError::UnbalancedScope.to_string());
    assert!(analysis.symbols.lookup("a").is_some());
}

#[test]
fn test_iteration_follows_declaration_order() {
    let analysis = analyze("integer b; boolean a; { character b }");
    let names: Vec<(&str, ScopeId)> = analysis
        .symbols
        .iter()
        .map(|s| (s.name.as_str(), s.scope))
        .collect();
    assert_eq!(names, vec![("b", 0), ("a", 0)]);
}

/* ── Direct table operations ───────────────────────────────────────────── */

#[test]
fn test_set_value_checks_type() {
    let mut table = SymbolTable::new();
    table.add("x", DataType::Integer, false, None).unwrap();
    assert_eq!(
        table.set_value("x", Value::Boolean(true)),
        Err(SemanticError::TypeMismatch {
            name: "x".to_string(),
            expected: DataType::Integer,
            found: DataType::Boolean,
        })
    );
    assert_eq!(table.set_value("x", Value::Integer(7)), Ok(()));
    assert_eq!(
        table.set_value("y", Value::Integer(7)),
        Err(SemanticError::Undefined { name: "y".to_string() })
    );
}

#[test]
fn test_add_rejects_mistyped_initial_value() {
    let mut table = SymbolTable::new();
    let err = table
        .add("c", DataType::Character, false, Some(Value::Integer(1)))
        .unwrap_err();
    assert!(matches!(err, SemanticError::TypeMismatch { .. }));
    assert!(table.is_empty());
}

/* ── Model-based property tests ────────────────────────────────────────── */

#[derive(Debug, Clone)]
enum Op {
    Enter,
    Exit,
    Add { name: usize, is_global: bool },
}

const NAMES: [&str; 4] = ["a", "b", "c", "d"];

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        2 => Just(Op::Enter),
        2 => Just(Op::Exit),
        5 => (0..NAMES.len(), prop::bool::weighted(0.2)).prop_map(|(name, is_global)| Op::Add { name, is_global }),
    ];
    prop::collection::vec(op, 0..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Replays random operations against a plain list of live (name, scope)
    /// pairs and checks lookups, duplicates and scope exits after each step.
    #[test]
    fn prop_table_matches_scope_model(ops in arb_ops()) {
        let mut table = SymbolTable::new();
        let mut open: Vec<ScopeId> = vec![GLOBAL_SCOPE];
        let mut live: Vec<(usize, ScopeId)> = Vec::new();
        let mut next_id: ScopeId = 1;

        for op in ops {
            match op {
                Op::Enter => {
                    prop_assert_eq!(table.enter_scope(), next_id);
                    open.push(next_id);
                    next_id += 1;
                },
                Op::Exit => {
                    let expected = if open.len() > 1 { open.pop() } else { None };
                    prop_assert_eq!(table.exit_scope(), expected);
                    if let Some(closed) = expected {
                        live.retain(|(_, scope)| *scope != closed);
                    }
                },
                Op::Add { name, is_global } => {
                    let target = if is_global { GLOBAL_SCOPE } else { open[open.len() - 1] };
                    let result = table.add(NAMES[name], DataType::Integer, is_global, None);
                    if live.contains(&(name, target)) {
                        let is_duplicate = matches!(
                            result,
                            Err(SemanticError::AlreadyDefined { scope, .. }) if scope == target
                        );
                        prop_assert!(is_duplicate);
                    } else {
                        prop_assert!(result.is_ok());
                        live.push((name, target));
                    }
                },
            }

            prop_assert_eq!(table.current_scope(), open[open.len() - 1]);
            prop_assert_eq!(table.len(), live.len());
            for (index, name) in NAMES.iter().enumerate() {
                let expected = open.iter().rev().copied().find(|s| live.contains(&(index, *s)));
                prop_assert_eq!(table.lookup(name).map(|s| s.scope), expected);
            }
            for symbol in table.iter() {
                prop_assert!(open.contains(&symbol.scope));
            }
        }
    }
}
