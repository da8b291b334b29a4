// SPDX-License-Identifier: Apache-2.0

//! Routing rules and first-match forwarding over ordered rule tables.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::keymask::Keymask;
use crate::route::{Route, RouteSet, SourceSet};

/// A single router table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub keymask: Keymask,
    pub route: RouteSet,
    /// Directions traffic matching this rule may have arrived from. Provenance
    /// only; never consulted when forwarding.
    pub sources: SourceSet,
}

impl Rule {
    pub fn new<I: IntoIterator<Item = Route>>(route: I, key: u32, mask: u32) -> Self {
        Rule {
            keymask: Keymask::new(key, mask),
            route: RouteSet::from_routes(route),
            sources: SourceSet::empty(),
        }
    }

    pub fn with_sources(mut self, sources: SourceSet) -> Self {
        self.sources = sources;
        self
    }

    pub fn key(&self) -> u32 {
        self.keymask.key
    }

    pub fn mask(&self) -> u32 {
        self.keymask.mask
    }

    /// Two rules are route-equal if they forward to exactly the same set of
    /// directions.
    pub fn route_equal(&self, other: &Rule) -> bool {
        self.route == other.route
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} -> {}", self.sources, self.keymask, self.route)
    }
}

/// The routing table of a single chip, identified by its mesh coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipTable {
    pub x: u8,
    pub y: u8,
    pub rules: Vec<Rule>,
}

impl ChipTable {
    pub fn new(x: u8, y: u8, rules: Vec<Rule>) -> Self {
        ChipTable { x, y, rules }
    }

    pub fn chip(&self) -> (u8, u8) {
        (self.x, self.y)
    }
}

/// Route of the first rule whose keymask contains `key`.
pub fn forward(table: &[Rule], key: u32) -> Option<RouteSet> {
    table
        .iter()
        .find(|rule| rule.keymask.contains(key))
        .map(|rule| rule.route)
}

/// A table is orthogonal when no two rules with different routes match a
/// common key, so its forwarding function does not depend on rule order.
pub fn is_orthogonal(table: &[Rule]) -> bool {
    for (i, a) in table.iter().enumerate() {
        for b in &table[i + 1..] {
            if !a.route_equal(b) && a.keymask.intersects(&b.keymask) {
                return false;
            }
        }
    }
    true
}

/// Multi-line dump, one rule per line, as used by the driver and in test
/// failure messages.
pub fn table_to_string(table: &[Rule]) -> String {
    let mut s = String::new();
    for (i, rule) in table.iter().enumerate() {
        s.push_str(&format!("{:4}: {}\n", i, rule));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Route::*;

    #[test]
    fn test_forward_first_match_wins() {
        let table = vec![
            Rule::new([North], 0b0000, 0b1111),
            Rule::new([South], 0b0000, 0b1100),
            Rule::new([East], 0x0, 0x0),
        ];
        assert_eq!(forward(&table, 0b0000), Some(RouteSet::from_routes([North])));
        assert_eq!(forward(&table, 0b0011), Some(RouteSet::from_routes([South])));
        assert_eq!(forward(&table, 0b1011), Some(RouteSet::from_routes([East])));
        assert_eq!(forward(&table[..2], 0b1011), None);
    }

    #[test]
    fn test_is_orthogonal() {
        let disjoint = vec![
            Rule::new([North], 0x4, 0xc),
            Rule::new([NorthEast], 0x2, 0xe),
            Rule::new([East], 0x0, 0xf),
        ];
        assert!(is_orthogonal(&disjoint));

        let same_route_overlap = vec![Rule::new([North], 0x0, 0xf), Rule::new([North], 0x0, 0x0)];
        assert!(is_orthogonal(&same_route_overlap));

        let conflicting = vec![Rule::new([North], 0x0, 0xf), Rule::new([South], 0x0, 0x0)];
        assert!(!is_orthogonal(&conflicting));
    }

    #[test]
    fn test_rule_display() {
        let rule = Rule::new([North], 0x1, 0xffff_ffff).with_sources(SourceSet::from_routes([South]));
        assert_eq!(
            rule.to_string(),
            "{S} -> 00000000000000000000000000000001 -> {N}"
        );
    }
}
