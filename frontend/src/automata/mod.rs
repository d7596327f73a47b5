//! Automata infrastructure for token recognition.
//!
//! Provides the arena-backed NFA/DFA types and the construction pipeline:
//! `Pattern -> Postfix -> NFA (Thompson) -> DFA (subset construction)`
//!
//! States live in a `Vec` and are addressed by [`StateId`]; fragments built
//! during Thompson's construction only ever hold ids, so merging fragments
//! never aliases state data and epsilon cycles are plain index lists.

pub mod nfa;
pub mod regex;
pub mod subset;

use std::collections::{BTreeMap, BTreeSet};

pub use regex::{compile, validate};
pub use subset::determinize;

/// Identifier for an automaton state.
pub type StateId = u32;

/// Upper bound of the recognised alphabet (inclusive). Only ASCII is supported.
pub const ALPHABET_MAX: u8 = 127;

/// NFA state with labeled and epsilon transitions.
#[derive(Debug, Clone, Default)]
pub struct NfaState {
    /// Labeled transitions: (input byte, target state).
    pub transitions: Vec<(u8, StateId)>,
    /// Epsilon transitions: target states reachable without consuming input.
    pub epsilon: Vec<StateId>,
    /// Whether reaching this state means the pattern matched.
    pub accepting: bool,
}

impl NfaState {
    /// Create a new non-accepting NFA state with no transitions.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Nondeterministic finite automaton.
///
/// Immutable once returned from [`compile`]: the builder methods are only
/// used while Thompson's construction is running.
#[derive(Debug, Clone, Default)]
pub struct Nfa {
    /// All states, indexed by `StateId`.
    pub states: Vec<NfaState>,
    /// The start state.
    pub start: StateId,
    /// Ids of every accepting state.
    pub accepting: BTreeSet<StateId>,
    /// Bytes that label at least one transition (epsilon excluded).
    pub alphabet: BTreeSet<u8>,
}

impl Nfa {
    /// Create an empty NFA. `start` is meaningless until a state is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new state and return its ID.
    pub fn add_state(&mut self) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(NfaState::new());
        id
    }

    /// Add an epsilon transition between two states.
    pub fn add_epsilon(&mut self, from: StateId, to: StateId) {
        self.states[from as usize].epsilon.push(to);
    }

    /// Add a labeled transition between two states.
    pub fn add_transition(&mut self, from: StateId, to: StateId, byte: u8) {
        self.states[from as usize].transitions.push((byte, to));
        self.alphabet.insert(byte);
    }

    /// Mark a state as accepting.
    pub fn set_accepting(&mut self, state: StateId) {
        self.states[state as usize].accepting = true;
        self.accepting.insert(state);
    }

    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.contains(&state)
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Total number of labeled plus epsilon edges.
    pub fn num_edges(&self) -> usize {
        self.states
            .iter()
            .map(|s| s.transitions.len() + s.epsilon.len())
            .sum()
    }
}

/// A fragment of an NFA under construction (start and accept states).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NfaFragment {
    pub start: StateId,
    pub accept: StateId,
}

/// DFA state with a partial, byte-indexed transition map.
#[derive(Debug, Clone, Default)]
pub struct DfaState {
    /// Outgoing transitions; a missing byte means "no move".
    pub transitions: BTreeMap<u8, StateId>,
    /// Whether this state accepts.
    pub accepting: bool,
    /// The sorted set of NFA states this DFA state stands for.
    pub nfa_states: Vec<StateId>,
}

/// Deterministic finite automaton produced by subset construction.
#[derive(Debug, Clone, Default)]
pub struct Dfa {
    /// All states, indexed by `StateId`.
    pub states: Vec<DfaState>,
    /// The start state (always 0 for a non-empty DFA).
    pub start: StateId,
    /// Ids of every accepting state.
    pub accepting: BTreeSet<StateId>,
}

impl Dfa {
    /// Create an empty DFA.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state representing `nfa_states` and return its ID.
    pub fn add_state(&mut self, nfa_states: Vec<StateId>, accepting: bool) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(DfaState {
            transitions: BTreeMap::new(),
            accepting,
            nfa_states,
        });
        if accepting {
            self.accepting.insert(id);
        }
        id
    }

    /// Record `from --byte--> to`. Overwrites any previous target for `byte`.
    pub fn set_transition(&mut self, from: StateId, byte: u8, to: StateId) {
        self.states[from as usize].transitions.insert(byte, to);
    }

    /// Follow the transition on `byte`, if one exists.
    #[inline]
    pub fn step(&self, state: StateId, byte: u8) -> Option<StateId> {
        self.states
            .get(state as usize)
            .and_then(|s| s.transitions.get(&byte).copied())
    }

    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.contains(&state)
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_transitions(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }

    /// Every byte that labels some transition.
    pub fn alphabet(&self) -> BTreeSet<u8> {
        self.states
            .iter()
            .flat_map(|s| s.transitions.keys().copied())
            .collect()
    }

    /// Whether the DFA accepts the whole of `input`.
    pub fn full_match(&self, input: &str) -> bool {
        if self.states.is_empty() {
            return false;
        }
        let mut state = self.start;
        for &b in input.as_bytes() {
            match self.step(state, b) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.is_accepting(state)
    }

    /// Length of the longest non-empty prefix of `input` the DFA accepts.
    ///
    /// Walks from the start state while transitions exist, remembering the
    /// end of the last accepting step.
    pub fn longest_prefix(&self, input: &[u8]) -> Option<usize> {
        if self.states.is_empty() {
            return None;
        }
        let mut state = self.start;
        let mut best = None;
        for (i, &b) in input.iter().enumerate() {
            match self.step(state, b) {
                Some(next) => {
                    state = next;
                    if self.is_accepting(state) {
                        best = Some(i + 1);
                    }
                },
                None => break,
            }
        }
        best
    }
}
