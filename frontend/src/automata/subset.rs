//! Subset construction: NFA → DFA conversion.
//!
//! Implements the standard powerset construction algorithm:
//! 1. Epsilon-closure of the NFA start state → DFA start state
//! 2. For each unprocessed DFA state and each byte of the NFA alphabet,
//!    `epsilon_closure(move(set, byte))` is looked up or created
//! 3. A DFA state accepts iff its NFA set contains an accepting state
//!
//! Sets are keyed by their sorted representation, so no two DFA states share
//! an NFA set and every DFA state is reachable from the start. No Hopcroft
//! minimization is performed.

use std::collections::{HashMap, VecDeque};

use super::{
    nfa::{epsilon_closure, move_set},
    Dfa, Nfa, StateId,
};

/// Convert an NFA to an equivalent DFA.
pub fn determinize(nfa: &Nfa) -> Dfa {
    let mut dfa = Dfa::new();
    if nfa.states.is_empty() {
        return dfa;
    }

    // Map from sorted set of NFA states → DFA state ID
    let mut state_map: HashMap<Vec<StateId>, StateId> = HashMap::new();
    // FIFO of sets still to expand
    let mut worklist: VecDeque<Vec<StateId>> = VecDeque::new();

    let start_set = epsilon_closure(nfa, &[nfa.start]);
    let start_accepts = contains_accepting(nfa, &start_set);
    dfa.start = dfa.add_state(start_set.clone(), start_accepts);
    state_map.insert(start_set.clone(), dfa.start);
    worklist.push_back(start_set);

    while let Some(current_set) = worklist.pop_front() {
        let Some(&current) = state_map.get(&current_set) else {
            continue;
        };

        for &byte in &nfa.alphabet {
            let moved = move_set(nfa, &current_set, byte);
            if moved.is_empty() {
                continue;
            }
            let next_set = epsilon_closure(nfa, &moved);

            let target = match state_map.get(&next_set) {
                Some(&existing) => existing,
                None => {
                    let accepts = contains_accepting(nfa, &next_set);
                    let id = dfa.add_state(next_set.clone(), accepts);
                    state_map.insert(next_set.clone(), id);
                    worklist.push_back(next_set);
                    id
                },
            };

            dfa.set_transition(current, byte, target);
        }
    }

    dfa
}

fn contains_accepting(nfa: &Nfa, states: &[StateId]) -> bool {
    states.iter().any(|s| nfa.is_accepting(*s))
}
