// SPDX-License-Identifier: Apache-2.0

//! Seeded random tables and brute-force oracles shared by tests, benches and
//! fuzzing.

use rand::Rng;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::keymask::Keymask;
use crate::route::{Route, RouteSet, SourceSet, NUM_LINKS};
use crate::table::{forward, Rule};

#[derive(Debug, Clone)]
pub struct RandomTableOptions {
    /// Only the low `key_bits` bits vary; all higher bits are fixed to zero.
    pub key_bits: u32,
    pub len: usize,
    /// Probability that a low bit is a wildcard.
    pub wildcard_probability: f64,
    /// Routes are drawn from this many distinct single-direction routes.
    pub distinct_routes: u32,
    /// Leave random key bits set under wildcard mask bits. They never affect
    /// matching.
    pub stray_key_bits: bool,
}

impl Default for RandomTableOptions {
    fn default() -> Self {
        RandomTableOptions {
            key_bits: 6,
            len: 24,
            wildcard_probability: 0.2,
            distinct_routes: 3,
            stray_key_bits: false,
        }
    }
}

pub fn seeded_rng(seed: u64) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

pub fn arbitrary_keymask<R: Rng>(rng: &mut R, options: &RandomTableOptions) -> Keymask {
    let low = low_bits(options.key_bits);
    let mut mask = !low;
    for bit in 0..options.key_bits {
        if !rng.gen_bool(options.wildcard_probability) {
            mask |= 1 << bit;
        }
    }
    let key = rng.gen::<u32>() & low;
    if options.stray_key_bits {
        Keymask::new(key, mask)
    } else {
        Keymask::new(key & mask, mask)
    }
}

pub fn arbitrary_route<R: Rng>(rng: &mut R, options: &RandomTableOptions) -> RouteSet {
    let index = rng.gen_range(0..options.distinct_routes.max(1));
    match Route::from_bit_index(index) {
        Some(route) => RouteSet::from_routes([route]),
        None => RouteSet(1 << (index % 24)),
    }
}

/// A single link source, occasionally unknown.
pub fn arbitrary_sources<R: Rng>(rng: &mut R) -> SourceSet {
    if rng.gen_bool(0.1) {
        SourceSet::unknown()
    } else {
        SourceSet(1 << rng.gen_range(0..NUM_LINKS))
    }
}

/// An arbitrary, possibly overlapping, ordered table.
pub fn random_table<R: Rng>(rng: &mut R, options: &RandomTableOptions) -> Vec<Rule> {
    (0..options.len)
        .map(|_| Rule {
            keymask: arbitrary_keymask(rng, options),
            route: arbitrary_route(rng, options),
            sources: arbitrary_sources(rng),
        })
        .collect()
}

/// A table in which no two rules with different routes overlap. Candidates
/// that would conflict are discarded, so the result may be shorter than
/// requested.
pub fn random_orthogonal_table<R: Rng>(rng: &mut R, options: &RandomTableOptions) -> Vec<Rule> {
    let mut table: Vec<Rule> = Vec::with_capacity(options.len);
    for _ in 0..options.len * 4 {
        if table.len() == options.len {
            break;
        }
        let rule = Rule {
            keymask: arbitrary_keymask(rng, options),
            route: arbitrary_route(rng, options),
            sources: arbitrary_sources(rng),
        };
        let conflicts = table
            .iter()
            .any(|r| !r.route_equal(&rule) && r.keymask.intersects(&rule.keymask));
        if !conflicts {
            table.push(rule);
        }
    }
    table
}

fn low_bits(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

/// Compares forwarding of every key whose bits above `key_bits` are zero,
/// plus one key with a high bit set. Returns the first disagreeing key.
pub fn first_forwarding_difference(a: &[Rule], b: &[Rule], key_bits: u32) -> Option<u32> {
    let high = if key_bits < 32 { 1u32 << key_bits } else { 0 };
    (0..=low_bits(key_bits))
        .chain(std::iter::once(high))
        .find(|&key| forward(a, key) != forward(b, key))
}
