// SPDX-License-Identifier: Apache-2.0

//! Minimisation of ordered, first-match multicast router tables.
//!
//! Two interchangeable strategies are provided: m-Trie ([`minimise`]) for
//! orthogonal tables and Ordered Covering ([`minimise_ordered_covering`]),
//! which exploits rule order and accepts any table.

pub mod equiv;
pub mod keymask;
pub mod minimise;
pub mod mtrie;
pub mod normalize;
pub mod ordered_covering;
pub mod remove_default_routes;
pub mod route;
pub mod table;
pub mod table_serdes;
pub mod test_utils;

pub use keymask::Keymask;
pub use minimise::{
    minimise, minimise_ordered_covering, minimise_table, minimise_tables, MinimisationFailed,
    Strategy, TargetLengths,
};
pub use ordered_covering::OrderedCoveringOptions;
pub use route::{Route, RouteSet, SourceSet};
pub use table::{forward, ChipTable, Rule};
pub use table_serdes::{read_tables, write_tables, TableFormatError};
