// SPDX-License-Identifier: Apache-2.0

//! Behaviour-preserving reordering of rule tables.
//!
//! Two rules must keep their relative order only when they compete for a key
//! and disagree on the answer. Everything else is free to move; we use that
//! freedom to bring specific rules to the front and general ones to the back,
//! which clusters equally-masked rules for the merger.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::table::Rule;

/// Whether `earlier` must stay ahead of `later`.
fn must_precede(earlier: &Rule, later: &Rule) -> bool {
    !earlier.route_equal(later) && earlier.keymask.intersects(&later.keymask)
}

/// Reorders `table`, most specific masks first, without changing the
/// forwarding decision for any key.
///
/// This is a topological sort of the "must precede" relation in which the
/// ready rule with the smallest `(generality, original index)` is emitted
/// next. Normalizing an already normalized table returns it unchanged.
pub fn normalize(table: &[Rule]) -> Vec<Rule> {
    let n = table.len();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut pending: Vec<usize> = vec![0; n];
    for i in 0..n {
        for j in i + 1..n {
            if must_precede(&table[i], &table[j]) {
                successors[i].push(j);
                pending[j] += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<(u32, usize)>> = (0..n)
        .filter(|&i| pending[i] == 0)
        .map(|i| Reverse((table[i].keymask.generality(), i)))
        .collect();
    let mut result = Vec::with_capacity(n);
    while let Some(Reverse((_, i))) = ready.pop() {
        result.push(table[i]);
        for &j in &successors[i] {
            pending[j] -= 1;
            if pending[j] == 0 {
                ready.push(Reverse((table[j].keymask.generality(), j)));
            }
        }
    }
    assert_eq!(result.len(), n, "precedence relation must be acyclic");
    log::trace!("normalized table of {} rules", n);
    result
}
