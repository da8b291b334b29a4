// SPDX-License-Identifier: Apache-2.0

//! m-Trie minimisation (Ahmad & Mahapatra, "An efficient approach to on-chip
//! logic minimization", IEEE TVLSI 15(9), 2007).
//!
//! Each route's rules are inserted into a ternary trie over the key bits, MSB
//! first. After an insertion the path is re-examined bottom-up and sibling
//! paths that differ only at one node are folded into that node's `X` child.
//! The strategy only merges keymasks and never reorders across routes, so it
//! is only sound for orthogonal tables.

use crate::keymask::Keymask;
use crate::route::{RouteSet, SourceSet};
use crate::table::{is_orthogonal, Rule};

const ZERO: usize = 0;
const ONE: usize = 1;
const X: usize = 2;

#[derive(Debug, Clone)]
enum Node {
    /// End of a complete 32-bit path.
    Leaf,
    /// Decision on `bit`; children are indexed by `ZERO`, `ONE` and `X`.
    Branch {
        bit: u32,
        children: [Option<Box<Node>>; 3],
    },
}

fn child_index(bit: u32, key: u32, mask: u32) -> usize {
    debug_assert!(key & !mask == 0, "key bits outside mask must be cleared");
    if mask & bit == 0 {
        X
    } else if key & bit == 0 {
        ZERO
    } else {
        ONE
    }
}

impl Node {
    fn new(bit: u32) -> Node {
        if bit == 0 {
            Node::Leaf
        } else {
            Node::Branch {
                bit,
                children: [None, None, None],
            }
        }
    }

    fn count(&self) -> usize {
        match self {
            Node::Leaf => 1,
            Node::Branch { children, .. } => children.iter().flatten().map(|c| c.count()).sum(),
        }
    }

    fn path_exists(&self, key: u32, mask: u32) -> bool {
        match self {
            Node::Leaf => true,
            Node::Branch { bit, children } => match &children[child_index(*bit, key, mask)] {
                Some(child) => child.path_exists(key, mask),
                None => false,
            },
        }
    }

    /// Adds the path for `key`/`mask` without attempting any merges.
    fn traverse(&mut self, key: u32, mask: u32) {
        if let Node::Branch { bit, children } = self {
            let bit = *bit;
            children[child_index(bit, key, mask)]
                .get_or_insert_with(|| Box::new(Node::new(bit >> 1)))
                .traverse(key, mask);
        }
    }

    /// Removes the path for `key`/`mask`, pruning branches left empty.
    /// Returns true if this node itself is now empty.
    fn untraverse(&mut self, key: u32, mask: u32) -> bool {
        match self {
            Node::Leaf => true,
            Node::Branch { bit, children } => {
                let index = child_index(*bit, key, mask);
                if let Some(child) = children[index].as_mut() {
                    if child.untraverse(key, mask) {
                        children[index] = None;
                    }
                }
                children.iter().all(Option::is_none)
            }
        }
    }

    /// Inserts a path and, on the way back up, merges it with sibling paths.
    /// `key` and `mask` are widened as merges make bits don't-care.
    fn insert(&mut self, key: &mut u32, mask: &mut u32) {
        let (bit, children) = match self {
            Node::Leaf => return,
            Node::Branch { bit, children } => (*bit, children),
        };
        children[child_index(bit, *key, *mask)]
            .get_or_insert_with(|| Box::new(Node::new(bit >> 1)))
            .insert(key, mask);

        let has = |c: &Option<Box<Node>>| c.as_ref().map_or(false, |n| n.path_exists(*key, *mask));
        let (in_zero, in_one, in_x) = (has(&children[ZERO]), has(&children[ONE]), has(&children[X]));

        let fold_out: &[usize] = if in_zero && in_one {
            children[X]
                .get_or_insert_with(|| Box::new(Node::new(bit >> 1)))
                .traverse(*key, *mask);
            &[ZERO, ONE]
        } else if in_x && in_zero {
            &[ZERO]
        } else if in_x && in_one {
            &[ONE]
        } else {
            return;
        };
        for &index in fold_out {
            if let Some(child) = children[index].as_mut() {
                if child.untraverse(*key, *mask) {
                    children[index] = None;
                }
            }
        }
        *key &= !bit;
        *mask &= !bit;
    }

    fn collect(&self, key: u32, mask: u32, out: &mut Vec<Keymask>) {
        match self {
            Node::Leaf => out.push(Keymask::new(key, mask)),
            Node::Branch { bit, children } => {
                let b = *bit;
                if let Some(c) = &children[ZERO] {
                    c.collect(key, mask | b, out);
                }
                if let Some(c) = &children[ONE] {
                    c.collect(key | b, mask | b, out);
                }
                if let Some(c) = &children[X] {
                    c.collect(key, mask, out);
                }
            }
        }
    }
}

/// A ternary trie holding a set of keymasks which all share one route.
#[derive(Debug, Clone)]
pub struct MTrie {
    root: Node,
}

impl Default for MTrie {
    fn default() -> Self {
        MTrie {
            root: Node::new(1 << 31),
        }
    }
}

impl MTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, keymask: Keymask) {
        let canonical = keymask.canonical();
        let (mut key, mut mask) = (canonical.key, canonical.mask);
        self.root.insert(&mut key, &mut mask);
    }

    /// Number of distinct entries stored.
    pub fn count(&self) -> usize {
        self.root.count()
    }

    /// Entries in trie order: at every bit the `0` subtree, then `1`, then `X`.
    pub fn entries(&self) -> Vec<Keymask> {
        let mut out = Vec::with_capacity(self.count());
        self.root.collect(0, 0, &mut out);
        out
    }
}

/// Minimises an orthogonal table with one m-Trie per distinct route.
///
/// Routes are emitted in order of first appearance. Each output rule carries
/// the union of the sources of the input rules it overlaps.
///
/// # Panics
///
/// Panics if `table` is not orthogonal.
pub fn mtrie(table: &[Rule]) -> Vec<Rule> {
    assert!(
        is_orthogonal(table),
        "m-Trie minimisation requires an orthogonal table"
    );
    let mut routes: Vec<RouteSet> = Vec::new();
    for rule in table {
        if !routes.contains(&rule.route) {
            routes.push(rule.route);
        }
    }

    let mut result = Vec::with_capacity(table.len());
    for route in routes {
        let group: Vec<&Rule> = table.iter().filter(|r| r.route == route).collect();
        let mut trie = MTrie::new();
        for rule in &group {
            trie.insert(rule.keymask);
        }
        for keymask in trie.entries() {
            let sources = group
                .iter()
                .filter(|r| r.keymask.intersects(&keymask))
                .fold(SourceSet::empty(), |acc, r| acc.union(r.sources));
            result.push(Rule {
                keymask,
                route,
                sources,
            });
        }
    }
    log::debug!("m-Trie: {} -> {} rules", table.len(), result.len());
    result
}
