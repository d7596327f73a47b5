//! Plain-text rendering for tokens, symbols, diagnostics and automata.

use colored::Colorize;

use ccl_frontend::automata::{Dfa, Nfa, StateId};
use ccl_frontend::lexer::TokenRule;
use ccl_frontend::{Diagnostic, DiagnosticKind, Symbol, Token};

/// Format a diagnostic with the offending source line and a caret under its
/// column. Pattern diagnostics (line 0) have no source line and are returned
/// as a single line.
pub fn format_diagnostic_with_context(source: &str, diagnostic: &Diagnostic) -> String {
    let label = match diagnostic.kind {
        DiagnosticKind::Pattern => diagnostic.kind.to_string().magenta().bold(),
        DiagnosticKind::Lexical => diagnostic.kind.to_string().red().bold(),
        DiagnosticKind::Semantic => diagnostic.kind.to_string().yellow().bold(),
    };
    let header = format!(
        "{} at line {}, column {}: {}",
        label, diagnostic.line, diagnostic.column, diagnostic.message
    );

    let Some(source_line) = diagnostic
        .line
        .checked_sub(1)
        .and_then(|index| source.lines().nth(index))
    else {
        return header;
    };

    let mut result = header;
    result.push('\n');
    let gutter = format!("{:>4} | ", diagnostic.line);
    result.push_str(&gutter.dimmed().to_string());
    result.push_str(source_line);
    result.push('\n');
    /* Columns count characters, so pad by characters too */
    let caret_pos = diagnostic
        .column
        .saturating_sub(1)
        .min(source_line.chars().count());
    result.push_str(&" ".repeat(gutter.len() + caret_pos));
    result.push_str(&"^".red().to_string());
    result
}

pub fn format_tokens(tokens: &[Token]) -> String {
    let mut out = format!("{:<8} {:<20} {}\n", "POS", "KIND", "LEXEME").bold().to_string();
    for token in tokens {
        let pos = format!("{}:{}", token.line, token.column);
        let kind = format!("{:<20}", token.kind.name());
        out.push_str(&format!("{:<8} {} {}\n", pos, kind.cyan(), token.lexeme));
    }
    out
}

pub fn format_symbols<'a>(symbols: impl Iterator<Item = &'a Symbol>) -> String {
    let mut out = format!(
        "{:<16} {:<10} {:<6} {:<7} {}\n",
        "NAME", "TYPE", "SCOPE", "GLOBAL", "VALUE"
    )
    .bold()
    .to_string();
    for symbol in symbols {
        let value = symbol.value.map_or_else(|| "-".to_string(), |v| v.to_string());
        let name = format!("{:<16}", symbol.name);
        out.push_str(&format!(
            "{} {:<10} {:<6} {:<7} {}\n",
            name.green(),
            symbol.data_type.name(),
            symbol.scope,
            symbol.is_global,
            value
        ));
    }
    out
}

/// Registered rules in priority order with their automaton sizes.
pub fn format_rules(rules: &[TokenRule]) -> String {
    let mut out = format!(
        "{:<4} {:<20} {:>5} {:>5} {:>6}  {}\n",
        "#", "KIND", "NFA", "DFA", "EDGES", "PATTERN"
    )
    .bold()
    .to_string();
    for (index, rule) in rules.iter().enumerate() {
        let kind = format!("{:<20}", rule.kind.name());
        out.push_str(&format!(
            "{:<4} {} {:>5} {:>5} {:>6}  {}\n",
            index,
            kind.cyan(),
            rule.stats.num_nfa_states,
            rule.stats.num_dfa_states,
            rule.stats.num_dfa_transitions,
            rule.pattern
        ));
    }
    out
}

/// NFA transition table: one row per state, epsilon edges listed separately.
pub fn format_nfa(nfa: &Nfa) -> String {
    let mut out = format!(
        "NFA: {} states, {} edges, start {}\n",
        nfa.num_states(),
        nfa.num_edges(),
        nfa.start
    );
    for (id, state) in nfa.states.iter().enumerate() {
        let mut edges = format_edges(state.transitions.iter().copied());
        if !state.epsilon.is_empty() {
            let targets: Vec<String> = state.epsilon.iter().map(ToString::to_string).collect();
            edges.push(format!("ε→{{{}}}", targets.join(",")));
        }
        out.push_str(&state_row(id, state.accepting, &edges));
    }
    out
}

/// DFA transition table, each row annotated with the NFA subset it stands for.
pub fn format_dfa(dfa: &Dfa) -> String {
    let mut out = format!(
        "DFA: {} states, {} transitions, start {}\n",
        dfa.num_states(),
        dfa.num_transitions(),
        dfa.start
    );
    for (id, state) in dfa.states.iter().enumerate() {
        let mut edges = format_edges(state.transitions.iter().map(|(&b, &t)| (b, t)));
        let subset: Vec<String> = state.nfa_states.iter().map(ToString::to_string).collect();
        edges.push(format!("{{{}}}", subset.join(",")).dimmed().to_string());
        out.push_str(&state_row(id, state.accepting, &edges));
    }
    out
}

fn state_row(id: usize, accepting: bool, edges: &[String]) -> String {
    let marker = if accepting { "*".green().bold() } else { " ".normal() };
    format!("  {}{:<4} {}\n", marker, id, edges.join("  "))
}

/// Collapse runs of consecutive bytes with the same target into ranges.
fn format_edges(edges: impl Iterator<Item = (u8, StateId)>) -> Vec<String> {
    let mut sorted: Vec<(u8, StateId)> = edges.collect();
    sorted.sort_unstable_by_key(|&(byte, target)| (target, byte));

    let mut runs: Vec<(u8, u8, StateId)> = Vec::new();
    for (byte, target) in sorted {
        match runs.last_mut() {
            Some((_, hi, t)) if *t == target && hi.checked_add(1) == Some(byte) => *hi = byte,
            _ => runs.push((byte, byte, target)),
        }
    }
    runs.sort_unstable_by_key(|&(lo, _, _)| lo);

    runs.into_iter()
        .map(|(lo, hi, target)| {
            if lo == hi {
                format!("{}→{}", display_byte(lo), target)
            } else {
                format!("{}-{}→{}", display_byte(lo), display_byte(hi), target)
            }
        })
        .collect()
}

fn display_byte(byte: u8) -> String {
    match byte {
        b'\n' => "\\n".to_string(),
        b'\t' => "\\t".to_string(),
        b'\r' => "\\r".to_string(),
        b' ' => "' '".to_string(),
        0x21..=0x7e => (byte as char).to_string(),
        _ => format!("\\x{:02x}", byte),
    }
}
