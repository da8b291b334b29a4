// SPDX-License-Identifier: Apache-2.0

//! Router directions and the fixed-width bitsets used for routes and sources.
//!
//! Bit positions match the persisted table format: links occupy bits 0..6,
//! processor cores bits 6..24, and bit 31 of a source set records that some
//! packets may arrive from an unknown source.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const NUM_LINKS: u32 = 6;
pub const NUM_CORES: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Route {
    East,
    NorthEast,
    North,
    West,
    SouthWest,
    South,
    Core(u8),
}

impl Route {
    pub fn links() -> impl Iterator<Item = Route> {
        (0..NUM_LINKS).filter_map(Route::from_bit_index)
    }

    pub fn from_bit_index(index: u32) -> Option<Route> {
        match index {
            0 => Some(Route::East),
            1 => Some(Route::NorthEast),
            2 => Some(Route::North),
            3 => Some(Route::West),
            4 => Some(Route::SouthWest),
            5 => Some(Route::South),
            i if i < NUM_LINKS + NUM_CORES => Some(Route::Core((i - NUM_LINKS) as u8)),
            _ => None,
        }
    }

    pub fn bit_index(&self) -> u32 {
        match self {
            Route::East => 0,
            Route::NorthEast => 1,
            Route::North => 2,
            Route::West => 3,
            Route::SouthWest => 4,
            Route::South => 5,
            Route::Core(n) => {
                assert!((*n as u32) < NUM_CORES, "core index {} out of range", n);
                NUM_LINKS + *n as u32
            }
        }
    }

    pub fn is_link(&self) -> bool {
        !matches!(self, Route::Core(_))
    }

    /// The link facing the opposite way, e.g. `North` for `South`.
    pub fn opposite(&self) -> Option<Route> {
        if self.is_link() {
            Route::from_bit_index((self.bit_index() + NUM_LINKS / 2) % NUM_LINKS)
        } else {
            None
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::East => write!(f, "E"),
            Route::NorthEast => write!(f, "NE"),
            Route::North => write!(f, "N"),
            Route::West => write!(f, "W"),
            Route::SouthWest => write!(f, "SW"),
            Route::South => write!(f, "S"),
            Route::Core(n) => write!(f, "C{}", n),
        }
    }
}

/// Set of output directions, stored as the raw router bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct RouteSet(pub u32);

impl RouteSet {
    pub const fn empty() -> Self {
        RouteSet(0)
    }

    pub fn from_routes<I: IntoIterator<Item = Route>>(routes: I) -> Self {
        routes
            .into_iter()
            .fold(RouteSet(0), |acc, r| RouteSet(acc.0 | (1 << r.bit_index())))
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, route: Route) -> bool {
        self.0 & (1 << route.bit_index()) != 0
    }

    pub fn len(&self) -> u32 {
        self.iter().count() as u32
    }

    /// Directions encoded in this set, in bit order. Bits beyond the known
    /// enumeration are retained in `bits()` but not yielded here.
    pub fn iter(&self) -> impl Iterator<Item = Route> + '_ {
        (0..NUM_LINKS + NUM_CORES)
            .filter(move |i| self.0 & (1u32 << *i) != 0)
            .filter_map(Route::from_bit_index)
    }
}

impl fmt::Display for RouteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|r| r.to_string()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Set of incoming directions, plus an "unknown" sentinel at bit 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SourceSet(pub u32);

impl SourceSet {
    pub const UNKNOWN_BIT: u32 = 1 << 31;

    pub const fn empty() -> Self {
        SourceSet(0)
    }

    pub const fn unknown() -> Self {
        SourceSet(Self::UNKNOWN_BIT)
    }

    pub fn from_routes<I: IntoIterator<Item = Route>>(routes: I) -> Self {
        SourceSet(RouteSet::from_routes(routes).0)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn has_unknown(&self) -> bool {
        self.0 & Self::UNKNOWN_BIT != 0
    }

    pub fn with_unknown(self) -> Self {
        SourceSet(self.0 | Self::UNKNOWN_BIT)
    }

    pub fn union(self, other: SourceSet) -> SourceSet {
        SourceSet(self.0 | other.0)
    }

    /// Known directions only.
    pub fn routes(&self) -> RouteSet {
        RouteSet(self.0 & !Self::UNKNOWN_BIT)
    }
}

impl fmt::Display for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.routes().iter().map(|r| r.to_string()).collect();
        if self.has_unknown() {
            names.push("?".to_string());
        }
        write!(f, "{{{}}}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_indices_roundtrip() {
        for i in 0..NUM_LINKS + NUM_CORES {
            let r = Route::from_bit_index(i).unwrap();
            assert_eq!(r.bit_index(), i);
        }
        assert_eq!(Route::from_bit_index(24), None);
        assert_eq!(Route::Core(0).bit_index(), 6);
        assert_eq!(Route::Core(17).bit_index(), 23);
    }

    #[test]
    fn test_opposites() {
        assert_eq!(Route::East.opposite(), Some(Route::West));
        assert_eq!(Route::NorthEast.opposite(), Some(Route::SouthWest));
        assert_eq!(Route::North.opposite(), Some(Route::South));
        assert_eq!(Route::South.opposite(), Some(Route::North));
        assert_eq!(Route::Core(3).opposite(), None);
        for link in Route::links() {
            assert_eq!(link.opposite().and_then(|o| o.opposite()), Some(link));
        }
    }

    #[test]
    fn test_route_set_bits() {
        let s = RouteSet::from_routes([Route::South, Route::SouthWest]);
        assert_eq!(s.bits(), 0b110000);
        assert_eq!(s.len(), 2);
        assert!(s.contains(Route::South));
        assert!(!s.contains(Route::North));
        assert_eq!(s.to_string(), "{SW, S}");
    }

    #[test]
    fn test_source_set_unknown() {
        let s = SourceSet::from_routes([Route::North]).with_unknown();
        assert_eq!(s.bits(), 0x8000_0004);
        assert!(s.has_unknown());
        assert_eq!(s.routes(), RouteSet::from_routes([Route::North]));
        assert_eq!(s.to_string(), "{N, ?}");
    }
}
