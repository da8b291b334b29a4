// SPDX-License-Identifier: Apache-2.0
use arbitrary::Arbitrary;
use rtmin::{Keymask, Rule, RouteSet, SourceSet};

#[derive(Debug, Clone, Arbitrary)]
pub struct FuzzRule {
    pub key: u8,
    pub mask: u8,
    /// Index into a small palette so that route-equal rules are common.
    pub route: u8,
    pub source: u8,
}

#[derive(Debug, Clone, Arbitrary)]
pub struct FuzzTable {
    pub rules: Vec<FuzzRule>,
    pub target_length: Option<u8>,
}

/// Number of low key bits the fuzzer varies; higher bits are always fixed to
/// zero.
pub const KEY_BITS: u32 = 8;

pub fn build_table(sample: &FuzzTable) -> Vec<Rule> {
    sample
        .rules
        .iter()
        .take(48)
        .map(|r| {
            let mask = !0xffu32 | r.mask as u32;
            Rule {
                keymask: Keymask::new(r.key as u32 & mask, mask),
                route: RouteSet(1 << (r.route % 4)),
                sources: SourceSet(1 << (r.source % 6)),
            }
        })
        .collect()
}
