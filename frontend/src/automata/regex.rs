//! Token-pattern compiler: pattern → postfix → Thompson NFA.
//!
//! Compilation runs in three passes:
//!
//! 1. **Scan**: the pattern is split into pattern tokens. A character class,
//!    shorthand class, escape or literal becomes one opaque symbol token whose
//!    byte set is already expanded (negation included) against `[0, 127]`.
//!    An explicit concatenation token is then inserted wherever two operands
//!    meet.
//! 2. **Postfix**: shunting-yard with precedence union (1) < concatenation (2)
//!    < postfix quantifiers (3).
//! 3. **Thompson's construction** over the postfix stream, one fragment per
//!    operand or operator.
//!
//! ## Supported syntax
//!
//! | Feature | Syntax | Example |
//! |---------|--------|---------|
//! | Literal char | `a`, `1`, `_` | ASCII byte-level |
//! | Escaped metachar | `\.` `\\` `\[` `\]` `\(` `\)` `\|` `\+` `\*` `\?` `\^` `\{` `\}` `\/` `\'` `\"` `\-` | |
//! | Escape sequences | `\n` `\r` `\t` | Common whitespace |
//! | Shorthand classes | `\d` `\w` `\s` `\D` `\W` `\S` | POSIX-like |
//! | Character class | `[abc]` `[a-z]` `[a-zA-Z0-9_]` | Ranges within `[]` |
//! | Negated class | `[^abc]` `[^']` | Complement over `[0, 127]` |
//! | Dot | `.` | Any byte except `\n` |
//! | Grouping | `(...)` | Non-capturing |
//! | Alternation | <code>a&#124;b</code> | |
//! | Quantifiers | `*` `+` `?` | |
//! | Bounded repetition | `{n}` `{n,}` `{n,m}` | Count-bounded |

use std::collections::HashMap;

use super::{Nfa, NfaFragment, StateId, ALPHABET_MAX};
use crate::error::{PatternErrorKind, PatternSyntaxError};

/// Largest count accepted in `{n,m}`.
const MAX_REPEAT: u32 = 255;

/// Byte offset plus cause; turned into a `PatternSyntaxError` at the API edge.
type Failure = (usize, PatternErrorKind);

/// Inclusive, sorted, non-overlapping byte ranges.
type Ranges = Vec<(u8, u8)>;

// ══════════════════════════════════════════════════════════════════════════════
// Pattern tokens
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
enum Quantifier {
    Star,
    Plus,
    Optional,
    Repeat { min: u32, max: Option<u32> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternToken {
    /// A literal, escape, dot or character class.
    Symbol(Ranges),
    Union,
    /// Explicit concatenation marker. Never produced from pattern text.
    Concat,
    Quantify(Quantifier),
    Open,
    Close,
}

impl PatternToken {
    fn precedence(&self) -> u8 {
        match self {
            PatternToken::Union => 1,
            PatternToken::Concat => 2,
            PatternToken::Quantify(_) => 3,
            _ => 0,
        }
    }

    /// Display character used in "missing operand" errors.
    fn operator_char(&self) -> char {
        match self {
            PatternToken::Union => '|',
            PatternToken::Quantify(Quantifier::Star) => '*',
            PatternToken::Quantify(Quantifier::Plus) => '+',
            PatternToken::Quantify(Quantifier::Optional) => '?',
            PatternToken::Quantify(Quantifier::Repeat { .. }) => '{',
            _ => '·',
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: PatternToken,
    position: usize,
}

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// Compile a pattern into an NFA with a single accepting state.
///
/// # Errors
///
/// Returns `PatternSyntaxError` naming the pattern and byte offset if the
/// pattern is empty, has unbalanced parentheses or brackets, or has an
/// operator without an operand.
pub fn compile(pattern: &str) -> Result<Nfa, PatternSyntaxError> {
    let fail = |(position, kind): Failure| PatternSyntaxError::new(pattern, position, kind);

    if pattern.is_empty() {
        return Err(fail((0, PatternErrorKind::Empty)));
    }

    let tokens = scan(pattern.as_bytes()).map_err(fail)?;
    let postfix = to_postfix(insert_concat(tokens)).map_err(fail)?;
    build_nfa(&postfix).map_err(fail)
}

/// Check that a pattern compiles, discarding the automaton.
pub fn validate(pattern: &str) -> Result<(), PatternSyntaxError> {
    compile(pattern).map(|_| ())
}

// ══════════════════════════════════════════════════════════════════════════════
// Scanning
// ══════════════════════════════════════════════════════════════════════════════

fn scan(input: &[u8]) -> Result<Vec<Spanned>, Failure> {
    let mut tokens: Vec<Spanned> = Vec::with_capacity(input.len());
    let mut pos: usize = 0;

    while pos < input.len() {
        let b = input[pos];
        if !b.is_ascii() {
            return Err((pos, PatternErrorKind::NonAscii(b)));
        }
        let (token, next) = match b {
            b'(' => (PatternToken::Open, pos + 1),
            b')' => (PatternToken::Close, pos + 1),
            b'|' => (PatternToken::Union, pos + 1),
            b'*' => (PatternToken::Quantify(Quantifier::Star), pos + 1),
            b'+' => (PatternToken::Quantify(Quantifier::Plus), pos + 1),
            b'?' => (PatternToken::Quantify(Quantifier::Optional), pos + 1),
            b'{' => {
                let (quantifier, next) = parse_bounded_quantifier(input, pos)?;
                (PatternToken::Quantify(quantifier), next)
            },
            b'[' => {
                let (ranges, next) = parse_char_class(input, pos)?;
                (PatternToken::Symbol(ranges), next)
            },
            b'\\' => {
                let (ranges, next) = parse_escape(input, pos)?;
                (PatternToken::Symbol(ranges), next)
            },
            b'.' => (PatternToken::Symbol(complement_ranges(&[(b'\n', b'\n')])), pos + 1),
            _ => (PatternToken::Symbol(vec![(b, b)]), pos + 1),
        };
        tokens.push(Spanned { token, position: pos });
        pos = next;
    }

    Ok(tokens)
}

/// Insert `Concat` between an operand end (symbol, `)`, quantifier) and an
/// operand start (symbol, `(`).
fn insert_concat(tokens: Vec<Spanned>) -> Vec<Spanned> {
    let mut out: Vec<Spanned> = Vec::with_capacity(tokens.len() * 2);
    for tok in tokens {
        let ends_operand = out.last().is_some_and(|prev| {
            matches!(
                prev.token,
                PatternToken::Symbol(_) | PatternToken::Close | PatternToken::Quantify(_)
            )
        });
        let begins_operand = matches!(tok.token, PatternToken::Symbol(_) | PatternToken::Open);
        if ends_operand && begins_operand {
            out.push(Spanned { token: PatternToken::Concat, position: tok.position });
        }
        out.push(tok);
    }
    out
}

/// Decode the byte named by `\<esc>` for escapes that stand for one byte.
fn escaped_byte(esc: u8) -> Option<u8> {
    match esc {
        b'n' => Some(b'\n'),
        b'r' => Some(b'\r'),
        b't' => Some(b'\t'),
        b'.' | b'\\' | b'[' | b']' | b'(' | b')' | b'|' | b'+' | b'*' | b'?' | b'^' | b'{'
        | b'}' | b'/' | b'\'' | b'"' | b'-' => Some(esc),
        _ => None,
    }
}

/// Byte set for the shorthand classes `\d \w \s` and their negations.
fn shorthand_class(esc: u8) -> Option<Ranges> {
    const DIGIT: &[(u8, u8)] = &[(b'0', b'9')];
    const WORD: &[(u8, u8)] = &[(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')];
    const SPACE: &[(u8, u8)] = &[(b'\t', b'\n'), (b'\r', b'\r'), (b' ', b' ')];

    match esc {
        b'd' => Some(DIGIT.to_vec()),
        b'D' => Some(complement_ranges(DIGIT)),
        b'w' => Some(WORD.to_vec()),
        b'W' => Some(complement_ranges(WORD)),
        b's' => Some(SPACE.to_vec()),
        b'S' => Some(complement_ranges(SPACE)),
        _ => None,
    }
}

fn parse_escape(input: &[u8], pos: usize) -> Result<(Ranges, usize), Failure> {
    if pos + 1 >= input.len() {
        return Err((pos, PatternErrorKind::TrailingBackslash));
    }
    let esc = input[pos + 1];
    if !esc.is_ascii() {
        return Err((pos + 1, PatternErrorKind::NonAscii(esc)));
    }
    if let Some(ranges) = shorthand_class(esc) {
        return Ok((ranges, pos + 2));
    }
    match escaped_byte(esc) {
        Some(b) => Ok((vec![(b, b)], pos + 2)),
        None => Err((pos, PatternErrorKind::InvalidEscape(esc as char))),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Character class parsing
// ══════════════════════════════════════════════════════════════════════════════

enum ClassItem {
    Byte(u8),
    Set(Ranges),
}

/// Read one class member at `*i`, advancing past it.
fn read_class_item(input: &[u8], i: &mut usize) -> Result<ClassItem, Failure> {
    let b = input[*i];
    if !b.is_ascii() {
        return Err((*i, PatternErrorKind::NonAscii(b)));
    }
    if b != b'\\' {
        *i += 1;
        return Ok(ClassItem::Byte(b));
    }
    if *i + 1 >= input.len() {
        return Err((*i, PatternErrorKind::TrailingBackslash));
    }
    let at = *i;
    let esc = input[at + 1];
    *i += 2;
    if let Some(set) = shorthand_class(esc) {
        return Ok(ClassItem::Set(set));
    }
    escaped_byte(esc)
        .map(ClassItem::Byte)
        .ok_or((at, PatternErrorKind::InvalidEscape(esc as char)))
}

/// Parse a `[...]` character class starting at `pos`.
fn parse_char_class(input: &[u8], pos: usize) -> Result<(Ranges, usize), Failure> {
    let len = input.len();
    let mut i = pos + 1;

    let negated = i < len && input[i] == b'^';
    if negated {
        i += 1;
    }

    let mut ranges: Ranges = Vec::with_capacity(8);

    /* ']' as first member is literal */
    if i < len && input[i] == b']' {
        ranges.push((b']', b']'));
        i += 1;
    }

    while i < len && input[i] != b']' {
        let lo = match read_class_item(input, &mut i)? {
            ClassItem::Byte(b) => b,
            ClassItem::Set(set) => {
                ranges.extend(set);
                continue;
            },
        };

        /* Range: a-z */
        if i + 1 < len && input[i] == b'-' && input[i + 1] != b']' {
            i += 1;
            let hi_at = i;
            let hi = match read_class_item(input, &mut i)? {
                ClassItem::Byte(b) => b,
                ClassItem::Set(_) => {
                    return Err((
                        hi_at,
                        PatternErrorKind::InvalidEscape(input[hi_at + 1] as char),
                    ));
                },
            };
            if lo > hi {
                return Err((
                    pos,
                    PatternErrorKind::RangeOutOfOrder { lo: lo as char, hi: hi as char },
                ));
            }
            ranges.push((lo, hi));
        } else {
            ranges.push((lo, lo));
        }
    }

    if i >= len {
        return Err((pos, PatternErrorKind::UnclosedClass));
    }
    i += 1; /* skip ']' */

    let merged = if negated {
        complement_ranges(&ranges)
    } else {
        sort_and_merge_ranges(&ranges)
    };
    if merged.is_empty() {
        return Err((pos, PatternErrorKind::EmptyClass));
    }

    Ok((merged, i))
}

/// Sort ranges by start, then merge overlapping/adjacent ranges.
fn sort_and_merge_ranges(ranges: &[(u8, u8)]) -> Ranges {
    let mut sorted = ranges.to_vec();
    sorted.sort_unstable();

    let mut merged: Ranges = Vec::with_capacity(sorted.len());
    for (lo, hi) in sorted {
        match merged.last_mut() {
            Some((_, cur_hi)) if lo <= cur_hi.saturating_add(1) => {
                *cur_hi = (*cur_hi).max(hi);
            },
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

/// Compute the complement of a set of ranges over `[0, 127]`.
fn complement_ranges(ranges: &[(u8, u8)]) -> Ranges {
    let merged = sort_and_merge_ranges(ranges);
    let mut complement: Ranges = Vec::with_capacity(merged.len() + 1);
    let mut lo: u8 = 0;
    for &(range_lo, range_hi) in &merged {
        if range_lo > lo {
            complement.push((lo, range_lo - 1));
        }
        if range_hi >= ALPHABET_MAX {
            return complement;
        }
        lo = range_hi + 1;
    }
    complement.push((lo, ALPHABET_MAX));
    complement
}

// ══════════════════════════════════════════════════════════════════════════════
// Quantifier parsing
// ══════════════════════════════════════════════════════════════════════════════

fn bad_repetition(position: usize, message: &str) -> Failure {
    (position, PatternErrorKind::InvalidRepetition(message.to_string()))
}

/// Parse the decimal count in `input[start..end]` (all ASCII digits).
fn parse_count(input: &[u8], start: usize, end: usize) -> Result<u32, Failure> {
    input[start..end]
        .iter()
        .try_fold(0u32, |acc, &d| acc.checked_mul(10)?.checked_add(u32::from(d - b'0')))
        .filter(|&n| n <= MAX_REPEAT)
        .ok_or_else(|| bad_repetition(start, &format!("count exceeds {}", MAX_REPEAT)))
}

/// Parse `{n}`, `{n,}`, or `{n,m}` starting at the `{`.
fn parse_bounded_quantifier(input: &[u8], pos: usize) -> Result<(Quantifier, usize), Failure> {
    let len = input.len();
    let mut i = pos + 1;

    let min_start = i;
    while i < len && input[i].is_ascii_digit() {
        i += 1;
    }
    if i == min_start || i >= len {
        return Err(bad_repetition(pos, "expected digit after '{'"));
    }
    let min = parse_count(input, min_start, i)?;

    if input[i] == b'}' {
        return Ok((Quantifier::Repeat { min, max: Some(min) }, i + 1));
    }
    if input[i] != b',' {
        return Err(bad_repetition(i, "expected ',' or '}'"));
    }
    i += 1; /* skip ',' */

    if i >= len {
        return Err(bad_repetition(i, "unclosed bounded repetition"));
    }
    if input[i] == b'}' {
        return Ok((Quantifier::Repeat { min, max: None }, i + 1));
    }

    let max_start = i;
    while i < len && input[i].is_ascii_digit() {
        i += 1;
    }
    if i == max_start || i >= len || input[i] != b'}' {
        return Err(bad_repetition(pos, "expected digit and '}'"));
    }
    let max = parse_count(input, max_start, i)?;

    if max < min {
        return Err(bad_repetition(pos, &format!("max ({}) < min ({})", max, min)));
    }

    Ok((Quantifier::Repeat { min, max: Some(max) }, i + 1))
}

// ══════════════════════════════════════════════════════════════════════════════
// Infix → postfix (shunting-yard)
// ══════════════════════════════════════════════════════════════════════════════

fn to_postfix(tokens: Vec<Spanned>) -> Result<Vec<Spanned>, Failure> {
    let mut output: Vec<Spanned> = Vec::with_capacity(tokens.len());
    let mut operators: Vec<Spanned> = Vec::new();
    let mut after_open = false;

    for tok in tokens {
        let is_open = tok.token == PatternToken::Open;
        match tok.token {
            /* Quantifiers are postfix and bind tightest: emit immediately */
            PatternToken::Symbol(_) | PatternToken::Quantify(_) => output.push(tok),
            PatternToken::Open => operators.push(tok),
            PatternToken::Close => {
                if after_open {
                    return Err((tok.position, PatternErrorKind::EmptyGroup));
                }
                loop {
                    match operators.pop() {
                        Some(Spanned { token: PatternToken::Open, .. }) => break,
                        Some(op) => output.push(op),
                        None => return Err((tok.position, PatternErrorKind::UnmatchedClose)),
                    }
                }
            },
            PatternToken::Union | PatternToken::Concat => {
                let precedence = tok.token.precedence();
                while operators.last().is_some_and(|top| {
                    top.token != PatternToken::Open && top.token.precedence() >= precedence
                }) {
                    if let Some(top) = operators.pop() {
                        output.push(top);
                    }
                }
                operators.push(tok);
            },
        }
        after_open = is_open;
    }

    while let Some(op) = operators.pop() {
        if op.token == PatternToken::Open {
            return Err((op.position, PatternErrorKind::UnclosedGroup));
        }
        output.push(op);
    }

    Ok(output)
}

// ══════════════════════════════════════════════════════════════════════════════
// Thompson's construction
// ══════════════════════════════════════════════════════════════════════════════

fn build_nfa(postfix: &[Spanned]) -> Result<Nfa, Failure> {
    let mut nfa = Nfa::new();
    let mut stack: Vec<NfaFragment> = Vec::with_capacity(postfix.len());

    for item in postfix {
        let missing = || (item.position, PatternErrorKind::MissingOperand(item.token.operator_char()));
        match &item.token {
            PatternToken::Symbol(ranges) => {
                stack.push(symbol_fragment(&mut nfa, ranges));
            },
            PatternToken::Concat => {
                let right = stack.pop().ok_or_else(missing)?;
                let left = stack.pop().ok_or_else(missing)?;
                stack.push(concat(&mut nfa, left, right));
            },
            PatternToken::Union => {
                let right = stack.pop().ok_or_else(missing)?;
                let left = stack.pop().ok_or_else(missing)?;
                stack.push(union(&mut nfa, left, right));
            },
            PatternToken::Quantify(quantifier) => {
                let inner = stack.pop().ok_or_else(missing)?;
                stack.push(apply_quantifier(&mut nfa, inner, quantifier));
            },
            PatternToken::Open | PatternToken::Close => {},
        }
    }

    let result = stack.pop().ok_or((0, PatternErrorKind::Empty))?;
    debug_assert!(stack.is_empty(), "postfix evaluation left dangling fragments");

    nfa.start = result.start;
    nfa.set_accepting(result.accept);
    Ok(nfa)
}

/// Two states joined by one transition per member byte.
fn symbol_fragment(nfa: &mut Nfa, ranges: &[(u8, u8)]) -> NfaFragment {
    let start = nfa.add_state();
    let accept = nfa.add_state();
    for &(lo, hi) in ranges {
        for b in lo..=hi {
            nfa.add_transition(start, accept, b);
        }
    }
    NfaFragment { start, accept }
}

/// A single state that is both start and accept (matches the empty string).
fn empty_fragment(nfa: &mut Nfa) -> NfaFragment {
    let s = nfa.add_state();
    NfaFragment { start: s, accept: s }
}

fn concat(nfa: &mut Nfa, left: NfaFragment, right: NfaFragment) -> NfaFragment {
    nfa.add_epsilon(left.accept, right.start);
    NfaFragment { start: left.start, accept: right.accept }
}

fn union(nfa: &mut Nfa, left: NfaFragment, right: NfaFragment) -> NfaFragment {
    let start = nfa.add_state();
    let accept = nfa.add_state();
    nfa.add_epsilon(start, left.start);
    nfa.add_epsilon(start, right.start);
    nfa.add_epsilon(left.accept, accept);
    nfa.add_epsilon(right.accept, accept);
    NfaFragment { start, accept }
}

fn apply_quantifier(nfa: &mut Nfa, frag: NfaFragment, quantifier: &Quantifier) -> NfaFragment {
    match quantifier {
        Quantifier::Star => {
            /* a* : new_start -> frag.start, new_start -> new_accept, frag.accept -> frag.start, frag.accept -> new_accept */
            let new_start = nfa.add_state();
            let new_accept = nfa.add_state();
            nfa.add_epsilon(new_start, new_accept);
            nfa.add_epsilon(new_start, frag.start);
            nfa.add_epsilon(frag.accept, frag.start);
            nfa.add_epsilon(frag.accept, new_accept);
            NfaFragment { start: new_start, accept: new_accept }
        },
        Quantifier::Plus => {
            /* a+ : a* without new_start -> new_accept */
            let new_start = nfa.add_state();
            let new_accept = nfa.add_state();
            nfa.add_epsilon(new_start, frag.start);
            nfa.add_epsilon(frag.accept, frag.start);
            nfa.add_epsilon(frag.accept, new_accept);
            NfaFragment { start: new_start, accept: new_accept }
        },
        Quantifier::Optional => {
            let empty = empty_fragment(nfa);
            union(nfa, frag, empty)
        },
        Quantifier::Repeat { min, max } => apply_bounded_repeat(nfa, frag, *min, *max),
    }
}

/// Expand `{min,max}` into concatenated copies of `frag`.
///
/// - `min` mandatory copies linked in sequence
/// - `max - min` optional copies after them
/// - for `{min,}`, one starred copy after them
fn apply_bounded_repeat(nfa: &mut Nfa, frag: NfaFragment, min: u32, max: Option<u32>) -> NfaFragment {
    let extra = max.map_or(1, |m| m - min);
    let needed = (min + extra) as usize;
    if needed == 0 {
        return empty_fragment(nfa);
    }

    /* Clone before linking so every copy starts from the pristine fragment */
    let mut copies: Vec<NfaFragment> = (1..needed).map(|_| clone_fragment(nfa, &frag)).collect();
    copies.push(frag);

    let mut linked: Option<NfaFragment> = None;
    for (i, copy) in copies.into_iter().enumerate() {
        let piece = if (i as u32) < min {
            copy
        } else if max.is_none() {
            apply_quantifier(nfa, copy, &Quantifier::Star)
        } else {
            apply_quantifier(nfa, copy, &Quantifier::Optional)
        };
        linked = Some(match linked {
            Some(prev) => concat(nfa, prev, piece),
            None => piece,
        });
    }

    linked.unwrap_or(frag)
}

/// Clone an NFA fragment by creating fresh states with the same transitions.
fn clone_fragment(nfa: &mut Nfa, frag: &NfaFragment) -> NfaFragment {
    /* Collect all states reachable from frag.start */
    let mut order: Vec<StateId> = Vec::new();
    let mut mapping: HashMap<StateId, StateId> = HashMap::new();
    let mut stack: Vec<StateId> = vec![frag.start];
    mapping.insert(frag.start, nfa.add_state());

    while let Some(state) = stack.pop() {
        order.push(state);
        let s = &nfa.states[state as usize];
        let targets: Vec<StateId> = s
            .transitions
            .iter()
            .map(|&(_, t)| t)
            .chain(s.epsilon.iter().copied())
            .collect();
        for target in targets {
            if !mapping.contains_key(&target) {
                let fresh = nfa.add_state();
                mapping.insert(target, fresh);
                stack.push(target);
            }
        }
    }

    for old_id in order {
        let transitions = nfa.states[old_id as usize].transitions.clone();
        let epsilons = nfa.states[old_id as usize].epsilon.clone();
        let new_id = mapping[&old_id];
        for (byte, target) in transitions {
            nfa.add_transition(new_id, mapping[&target], byte);
        }
        for target in epsilons {
            nfa.add_epsilon(new_id, mapping[&target]);
        }
    }

    NfaFragment {
        start: mapping[&frag.start],
        accept: mapping.get(&frag.accept).copied().unwrap_or(mapping[&frag.start]),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════════════════════
