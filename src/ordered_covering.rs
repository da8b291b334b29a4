// SPDX-License-Identifier: Apache-2.0

//! Ordered Covering: greedy pairwise merging of route-equal rules, with every
//! merge proven order-safe before it is committed.

use std::collections::HashMap;

use crate::equiv::check_merge;
use crate::keymask::Keymask;
use crate::normalize::normalize;
use crate::route::RouteSet;
use crate::table::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderedCoveringOptions {
    /// Largest number of significant key bits two rules may differ on and
    /// still be considered for a merge.
    pub max_key_distance: u32,
}

impl Default for OrderedCoveringOptions {
    fn default() -> Self {
        OrderedCoveringOptions {
            max_key_distance: 4,
        }
    }
}

/// Working state for one merge pass.
///
/// Rules carry stable ids so that rejected pairs can be remembered across
/// commits even though indices shift.
struct Merger<'a> {
    table: Vec<Rule>,
    ids: Vec<u64>,
    next_id: u64,
    /// Rejected pairs, keyed by rule ids, with the covering keymask that was
    /// rejected. A verdict only depends on rules intersecting that keymask.
    rejected: HashMap<(u64, u64), Keymask>,
    options: &'a OrderedCoveringOptions,
}

impl<'a> Merger<'a> {
    fn new(table: Vec<Rule>, options: &'a OrderedCoveringOptions) -> Self {
        let n = table.len() as u64;
        Merger {
            table,
            ids: (0..n).collect(),
            next_id: n,
            rejected: HashMap::new(),
            options,
        }
    }

    /// Returns the first safe, size-reducing merge.
    ///
    /// Route-equal pairs where one rule covers the other are tried first: a
    /// later rule inside an earlier one never matches and is simply dropped.
    /// Equal-mask pairs follow in increasing key distance, so that all
    /// distance-1 pairs are tried before any distance-2 pair. Within a tier,
    /// pairs are visited in increasing `(i, j)` order.
    fn find_safe_merge(&mut self) -> Option<(usize, usize, Rule)> {
        let mut by_route: HashMap<RouteSet, Vec<usize>> = HashMap::new();
        let mut by_route_and_mask: HashMap<(RouteSet, u32), Vec<usize>> = HashMap::new();
        for (i, rule) in self.table.iter().enumerate() {
            by_route.entry(rule.route).or_default().push(i);
            by_route_and_mask
                .entry((rule.route, rule.mask()))
                .or_default()
                .push(i);
        }

        for i in 0..self.table.len() {
            let a = self.table[i];
            for &j in by_route[&a.route].iter().filter(|&&j| j > i) {
                let b = self.table[j];
                if a.keymask.covers(&b.keymask) {
                    let merged = Rule {
                        keymask: a.keymask,
                        route: a.route,
                        sources: a.sources.union(b.sources),
                    };
                    debug_assert!(check_merge(&self.table, i, j, &merged).is_safe());
                    return Some((i, j, merged));
                }
                if b.keymask.covers(&a.keymask) {
                    if let Some(found) = self.try_merge(i, j, b.keymask) {
                        return Some(found);
                    }
                }
            }
        }

        for distance in 1..=self.options.max_key_distance {
            for i in 0..self.table.len() {
                let a = self.table[i];
                for &j in by_route_and_mask[&(a.route, a.mask())]
                    .iter()
                    .filter(|&&j| j > i)
                {
                    let b = self.table[j];
                    if a.keymask.key_distance(&b.keymask) != distance {
                        continue;
                    }
                    let keymask = match a.keymask.merge_candidate(&b.keymask) {
                        Some(keymask) => keymask,
                        None => continue,
                    };
                    if let Some(found) = self.try_merge(i, j, keymask) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Checks merging rules `i < j` into `keymask` at position `i`,
    /// remembering the pair if it is rejected.
    fn try_merge(&mut self, i: usize, j: usize, keymask: Keymask) -> Option<(usize, usize, Rule)> {
        let pair = (self.ids[i], self.ids[j]);
        if self.rejected.contains_key(&pair) {
            return None;
        }
        let (a, b) = (&self.table[i], &self.table[j]);
        let merged = Rule {
            keymask,
            route: a.route,
            sources: a.sources.union(b.sources),
        };
        let verdict = check_merge(&self.table, i, j, &merged);
        if verdict.is_safe() {
            return Some((i, j, merged));
        }
        log::trace!(
            "rejected merge of rules {} and {} into {}: {:?}",
            i,
            j,
            keymask,
            verdict
        );
        self.rejected.insert(pair, keymask);
        None
    }

    fn commit(&mut self, i: usize, j: usize, merged: Rule) {
        debug_assert!(i < j);
        let before = self.table.len();
        log::debug!(
            "merging rules {} and {} into {} -> {}",
            i,
            j,
            merged.keymask,
            merged.route
        );
        self.table[i] = merged;
        self.table.remove(j);
        self.ids[i] = self.next_id;
        self.next_id += 1;
        self.ids.remove(j);
        assert_eq!(self.table.len() + 1, before, "a merge must shrink the table");
        self.rejected
            .retain(|_, cover| !cover.intersects(&merged.keymask));
    }
}

fn fits(len: usize, target_length: Option<u32>) -> bool {
    matches!(target_length, Some(t) if len <= t as usize)
}

/// Commits safe merges, first-fit, until none remain or the table fits in
/// `target_length`. Returns the new table and the number of merges made.
pub fn merge_pass(
    table: Vec<Rule>,
    target_length: Option<u32>,
    options: &OrderedCoveringOptions,
) -> (Vec<Rule>, usize) {
    let mut merger = Merger::new(table, options);
    let mut commits = 0;
    while !fits(merger.table.len(), target_length) {
        match merger.find_safe_merge() {
            Some((i, j, merged)) => {
                merger.commit(i, j, merged);
                commits += 1;
            }
            None => break,
        }
    }
    (merger.table, commits)
}

/// Runs normalize and merge passes alternately until a pass commits nothing
/// or the table fits in `target_length`.
///
/// Without a target the result is a fixpoint of both steps, so minimising it
/// again returns it unchanged.
pub fn ordered_covering(
    table: &[Rule],
    target_length: Option<u32>,
    options: &OrderedCoveringOptions,
) -> Vec<Rule> {
    let mut current = normalize(table);
    let mut passes = 0;
    loop {
        let (merged, commits) = merge_pass(current, target_length, options);
        passes += 1;
        current = normalize(&merged);
        if commits == 0 || fits(current.len(), target_length) {
            break;
        }
    }
    log::debug!(
        "ordered covering: {} -> {} rules in {} passes",
        table.len(),
        current.len(),
        passes
    );
    current
}
