// SPDX-License-Identifier: Apache-2.0

//! Ternary key/mask patterns over 32-bit routing keys.
//!
//! A `Keymask` denotes the set of keys `v` with `(v & mask) == (key & mask)`.
//! Mask bits set to 1 are fixed, mask bits set to 0 are wildcards ("X"). Key
//! bits outside the mask are preserved for round-tripping but ignored by every
//! set operation in this module.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Keymask {
    pub key: u32,
    pub mask: u32,
}

impl Keymask {
    pub const fn new(key: u32, mask: u32) -> Self {
        Keymask { key, mask }
    }

    /// Keymask matching every key.
    pub const fn wildcard() -> Self {
        Keymask { key: 0, mask: 0 }
    }

    /// Key bits that are actually significant, i.e. `key & mask`.
    #[inline]
    pub fn fixed_key(&self) -> u32 {
        self.key & self.mask
    }

    /// Returns the same set with any key bits outside the mask cleared.
    pub fn canonical(&self) -> Keymask {
        Keymask::new(self.fixed_key(), self.mask)
    }

    /// Bits which are wildcards in this keymask.
    #[inline]
    pub fn xs(&self) -> u32 {
        !self.mask
    }

    /// Number of wildcard bits; larger is more general.
    #[inline]
    pub fn generality(&self) -> u32 {
        self.mask.count_zeros()
    }

    /// Number of keys matched, saturating at `u64` range (max is 2^32).
    pub fn size(&self) -> u64 {
        1u64 << self.generality()
    }

    #[inline]
    pub fn contains(&self, key: u32) -> bool {
        (key & self.mask) == self.fixed_key()
    }

    /// Whether the two matched key sets overlap.
    #[inline]
    pub fn intersects(&self, other: &Keymask) -> bool {
        ((self.key ^ other.key) & self.mask & other.mask) == 0
    }

    /// Whether every key matched by `other` is also matched by `self`.
    pub fn covers(&self, other: &Keymask) -> bool {
        // Every bit we fix must also be fixed, to the same value, in `other`.
        (self.mask & !other.mask) == 0 && ((self.key ^ other.key) & self.mask) == 0
    }

    /// Keymask matching exactly the keys matched by both operands.
    pub fn intersection(&self, other: &Keymask) -> Option<Keymask> {
        if !self.intersects(other) {
            return None;
        }
        let mask = self.mask | other.mask;
        let key = self.fixed_key() | other.fixed_key();
        Some(Keymask::new(key, mask))
    }

    /// Smallest keymask covering both operands.
    ///
    /// Bitwise: `X|_ -> X`, `0|1 -> X`, `0|0 -> 0`, `1|1 -> 1`.
    pub fn covering(&self, other: &Keymask) -> Keymask {
        let agree = !(self.fixed_key() ^ other.fixed_key());
        let mask = self.mask & other.mask & agree;
        Keymask::new(self.key & mask, mask)
    }

    /// Returns the covering keymask if `self` and `other` form a merge
    /// candidate: identical masks and keys which differ on at least one
    /// significant bit. The differing bits become wildcards.
    pub fn merge_candidate(&self, other: &Keymask) -> Option<Keymask> {
        if self.mask != other.mask {
            return None;
        }
        let differing = (self.key ^ other.key) & self.mask;
        if differing == 0 {
            return None;
        }
        let merged = self.covering(other);
        debug_assert_eq!(merged.mask, self.mask & !differing);
        Some(merged)
    }

    /// Number of significant bits on which the keys of two equally-masked
    /// keymasks differ.
    pub fn key_distance(&self, other: &Keymask) -> u32 {
        ((self.key ^ other.key) & self.mask & other.mask).count_ones()
    }

    /// Splits `self \ other` into disjoint keymasks.
    ///
    /// Walks the bits fixed in `other` but free in `self`, peeling off the
    /// half-space that disagrees with `other` at each such bit.
    pub fn subtract(&self, other: &Keymask) -> Vec<Keymask> {
        if !self.intersects(other) {
            return vec![self.canonical()];
        }
        let mut pieces = Vec::new();
        let mut rest = self.canonical();
        let mut splittable = other.mask & !self.mask;
        while splittable != 0 {
            let bit = splittable & splittable.wrapping_neg();
            splittable &= !bit;
            let other_bit = other.key & bit;
            pieces.push(Keymask::new(rest.key | (other_bit ^ bit), rest.mask | bit));
            rest = Keymask::new(rest.key | other_bit, rest.mask | bit);
        }
        // What remains lies entirely inside `other`.
        debug_assert!(other.covers(&rest));
        pieces
    }
}

impl fmt::Display for Keymask {
    /// Renders MSB first as `0`, `1`, `X` (wildcard) or `!` (key bit set
    /// outside the mask).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..32).rev() {
            let bit = 1u32 << i;
            let c = match (self.key & bit != 0, self.mask & bit != 0) {
                (false, false) => 'X',
                (true, false) => '!',
                (false, true) => '0',
                (true, true) => '1',
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Subtracts `cut` from every piece of `region`, returning the remainder.
pub fn subtract_all(region: &[Keymask], cut: &Keymask) -> Vec<Keymask> {
    let mut out = Vec::with_capacity(region.len());
    for piece in region {
        out.extend(piece.subtract(cut));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_generality_counts_wildcards() {
        assert_eq!(Keymask::new(0x0, 0x0).generality(), 32);
        assert_eq!(Keymask::new(0x0, 0xffff_ffff).generality(), 0);
        assert_eq!(Keymask::new(0x0, 0x7fff_ffff).generality(), 1);
        assert_eq!(Keymask::new(0x0, 0xffff_fffe).generality(), 1);
        assert_eq!(Keymask::new(0x0, 0x7fff_ffff).xs(), 0x8000_0000);
    }

    #[test]
    fn test_intersects() {
        let all_x = Keymask::new(0x0, 0x0);
        assert!(all_x.intersects(&all_x));
        let all_0 = Keymask::new(0x0, 0xffff_ffff);
        assert!(all_0.intersects(&all_x));
        let all_1 = Keymask::new(0xffff_ffff, 0xffff_ffff);
        assert!(all_1.intersects(&all_x));
        assert!(!all_1.intersects(&all_0));

        // 10XX... vs 0XXX...
        let a = Keymask::new(0x8000_0000, 0xc000_0000);
        let b = Keymask::new(0x0000_0000, 0x8000_0000);
        assert!(!a.intersects(&b));
        // 10XX... vs 1XXX...
        let b = Keymask::new(0x8000_0000, 0x8000_0000);
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_covering_truth_table() {
        let a = Keymask::new(0x0000_0000, 0xffff_ffff);
        let b = Keymask::new(0xffff_ffff, 0xffff_ffff);
        assert_eq!(a.covering(&b), Keymask::new(0, 0));
        assert_eq!(b.covering(&a), Keymask::new(0, 0));

        // X01XX0011 | XXX010110 -> XXXXX0X1X
        let a = Keymask::new(0b001000011, 0b011001111);
        let b = Keymask::new(0b000010110, 0b000111111);
        assert_eq!(a.covering(&b), Keymask::new(0b000000010, 0b000001010));
    }

    #[test_case(0x0, 0xf, 0x1, 0xf, Some((0x0, 0xe)); "single bit")]
    #[test_case(0x0, 0xf, 0x3, 0xf, Some((0x0, 0xc)); "two bits")]
    #[test_case(0x0, 0xf, 0x0, 0xf, None; "identical")]
    #[test_case(0x0, 0xf, 0x1, 0xe, None; "different masks")]
    #[test_case(0x10, 0xf, 0x1, 0xf, Some((0x0, 0xe)); "unmasked key bits ignored")]
    fn test_merge_candidate(k1: u32, m1: u32, k2: u32, m2: u32, want: Option<(u32, u32)>) {
        let got = Keymask::new(k1, m1).merge_candidate(&Keymask::new(k2, m2));
        assert_eq!(got, want.map(|(k, m)| Keymask::new(k, m)));
    }

    #[test]
    fn test_covers_and_contains() {
        let general = Keymask::new(0b0100, 0b1100);
        assert!(general.covers(&Keymask::new(0b0110, 0b1111)));
        assert!(!general.covers(&Keymask::new(0b1110, 0b1111)));
        assert!(!Keymask::new(0b0110, 0b1111).covers(&general));
        assert!(general.contains(0b0111));
        assert!(!general.contains(0b1111));
    }

    #[test]
    fn test_subtract_partitions_difference() {
        let a = Keymask::new(0x0, 0xfffffff0); // 16 keys
        let b = Keymask::new(0x5, 0xfffffff5); // ...X1X1 -> 4 keys of a
        let pieces = a.subtract(&b);
        let total: u64 = pieces.iter().map(|p| p.size()).sum();
        assert_eq!(total, 12);
        for k in 0..16u32 {
            let in_pieces = pieces.iter().filter(|p| p.contains(k)).count();
            let want = if b.contains(k) { 0 } else { 1 };
            assert_eq!(in_pieces, want, "key {:#x}", k);
        }
    }

    #[test]
    fn test_subtract_disjoint_and_covered() {
        let a = Keymask::new(0x0, 0xf);
        assert_eq!(a.subtract(&Keymask::new(0x1, 0xf)), vec![a]);
        assert!(a.subtract(&Keymask::wildcard()).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Keymask::new(0b0010, 0xffff_fffe).to_string(),
            "0000000000000000000000000000001X"
        );
        assert_eq!(
            Keymask::new(0x8000_0001, 0x0000_0001).to_string(),
            "!XXXXXXXXXXXXXXXXXXXXXXXXXXXXXX1"
        );
    }
}
