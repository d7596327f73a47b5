//! NFA traversal: epsilon-closure, `move`, and direct simulation.
//!
//! The simulation here walks sets of NFA states without determinizing. It is
//! the reference the DFA is checked against and is not used on the hot path.

use super::{Nfa, StateId};

/// Compute the epsilon-closure of a set of NFA states.
///
/// Returns a sorted, deduplicated vector usable as a canonical set key.
pub fn epsilon_closure(nfa: &Nfa, states: &[StateId]) -> Vec<StateId> {
    let mut closure: Vec<StateId> = Vec::with_capacity(states.len());
    let mut stack: Vec<StateId> = Vec::with_capacity(states.len());
    let mut visited = vec![false; nfa.states.len()];

    for &s in states {
        if !visited[s as usize] {
            visited[s as usize] = true;
            closure.push(s);
            stack.push(s);
        }
    }

    while let Some(state) = stack.pop() {
        for &target in &nfa.states[state as usize].epsilon {
            if !visited[target as usize] {
                visited[target as usize] = true;
                closure.push(target);
                stack.push(target);
            }
        }
    }

    closure.sort_unstable();
    closure
}

/// States reachable from `states` by consuming exactly `byte` (no closure).
pub fn move_set(nfa: &Nfa, states: &[StateId], byte: u8) -> Vec<StateId> {
    let mut targets: Vec<StateId> = states
        .iter()
        .flat_map(|&s| nfa.states[s as usize].transitions.iter())
        .filter(|&&(b, _)| b == byte)
        .map(|&(_, target)| target)
        .collect();
    targets.sort_unstable();
    targets.dedup();
    targets
}

impl Nfa {
    /// Simulate the NFA on `input` and report whether it ends in an
    /// accepting state.
    pub fn full_match(&self, input: &str) -> bool {
        if self.states.is_empty() {
            return false;
        }
        let mut current = epsilon_closure(self, &[self.start]);
        for &b in input.as_bytes() {
            let moved = move_set(self, &current, b);
            if moved.is_empty() {
                return false;
            }
            current = epsilon_closure(self, &moved);
        }
        current.iter().any(|s| self.is_accepting(*s))
    }
}
