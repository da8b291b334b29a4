// SPDX-License-Identifier: Apache-2.0

//! Exact, symbolic reasoning about first-match forwarding.
//!
//! Key sets are tracked as lists of disjoint keymasks ("pieces"); a rule is
//! applied to the pieces by splitting off the part it matches. This decides
//! questions over the full 32-bit key space without enumerating keys.

use crate::keymask::{subtract_all, Keymask};
use crate::table::Rule;

/// Upper bound on the number of pieces tracked while checking a single merge.
/// Past this point the merge is rejected as undecided rather than explored.
pub const MAX_PIECES: usize = 4096;

/// Outcome of checking a candidate merge against the rest of its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeVerdict {
    Safe,
    /// Keys in `region` currently reach `rule_index` (whose route differs)
    /// but would be captured by the merged rule.
    Conflict { rule_index: usize, region: Keymask },
    /// Keys in `region` match no rule today but would match the merged rule.
    Uncovered { region: Keymask },
    /// The key space fragmented beyond `MAX_PIECES`.
    Undecided,
}

impl MergeVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, MergeVerdict::Safe)
    }

    /// The key region responsible for an unsafe verdict, if any.
    pub fn conflict_region(&self) -> Option<Keymask> {
        match self {
            MergeVerdict::Conflict { region, .. } | MergeVerdict::Uncovered { region } => {
                Some(*region)
            }
            _ => None,
        }
    }
}

/// Decides whether replacing `table[a]` and `table[b]` with `merged`, placed
/// at `min(a, b)`, leaves the forwarding decision of every key unchanged.
///
/// Only keys of `merged` can change. For each of them the old decision is
/// that of the first matching rule in `table`:
/// - a rule above the insertion point still wins after the merge;
/// - a route-equal rule at or below it gives the same answer as `merged`;
/// - any other rule, or no rule at all, means the merge is unsafe.
pub fn check_merge(table: &[Rule], a: usize, b: usize, merged: &Rule) -> MergeVerdict {
    assert_ne!(a, b, "a merge needs two distinct rules");
    assert!(
        merged.keymask.covers(&table[a].keymask) && merged.keymask.covers(&table[b].keymask),
        "merged keymask {} does not cover its sources",
        merged.keymask
    );
    let insert_at = a.min(b);
    let mut unresolved = vec![merged.keymask.canonical()];
    for (i, rule) in table.iter().enumerate() {
        if unresolved.is_empty() {
            break;
        }
        let hit = unresolved
            .iter()
            .find_map(|piece| piece.intersection(&rule.keymask));
        let region = match hit {
            Some(region) => region,
            None => continue,
        };
        if i >= insert_at && !rule.route_equal(merged) {
            return MergeVerdict::Conflict {
                rule_index: i,
                region,
            };
        }
        unresolved = subtract_all(&unresolved, &rule.keymask);
        if unresolved.len() > MAX_PIECES {
            return MergeVerdict::Undecided;
        }
    }
    match unresolved.first() {
        Some(region) => MergeVerdict::Uncovered { region: *region },
        None => MergeVerdict::Safe,
    }
}

/// Checks that every key matched by `lhs` is forwarded identically by `rhs`.
fn check_refines(lhs: &[Rule], rhs: &[Rule]) -> Result<(), Keymask> {
    for (i, rule) in lhs.iter().enumerate() {
        // Keys for which `rule` is the first match in `lhs`.
        let mut region = vec![rule.keymask.canonical()];
        for earlier in &lhs[..i] {
            if region.is_empty() {
                break;
            }
            region = subtract_all(&region, &earlier.keymask);
        }
        for other in rhs {
            if region.is_empty() {
                break;
            }
            if let Some(hit) = region.iter().find_map(|p| p.intersection(&other.keymask)) {
                if !other.route_equal(rule) {
                    return Err(hit);
                }
                region = subtract_all(&region, &other.keymask);
            }
        }
        if let Some(missed) = region.first() {
            return Err(*missed);
        }
    }
    Ok(())
}

/// Decides whether two tables forward every 32-bit key identically,
/// including agreement on which keys match nothing.
///
/// On failure returns a keymask of keys on which the tables disagree.
pub fn check_tables_equivalent(a: &[Rule], b: &[Rule]) -> Result<(), Keymask> {
    check_refines(a, b)?;
    check_refines(b, a)
}
