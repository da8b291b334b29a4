// SPDX-License-Identifier: Apache-2.0

//! Removal of entries the router's default routing would reproduce.
//!
//! A packet that matches no entry leaves through the link opposite the one it
//! arrived on. An entry whose only source is a link and whose only route is
//! the opposite link therefore does nothing, provided that dropping it does
//! not expose its keys to some later entry.

use crate::minimise::{ensure_fits, MinimisationFailed};
use crate::route::Route;
use crate::table::Rule;

/// The link encoded by `bits` if exactly one bit is set and it names a link.
fn sole_link(bits: u32) -> Option<Route> {
    if bits.count_ones() != 1 {
        return None;
    }
    Route::from_bit_index(bits.trailing_zeros()).filter(Route::is_link)
}

/// Whether default routing alone would forward this rule's traffic the same
/// way. Rules with an unknown source never qualify.
pub fn is_default_routable(rule: &Rule) -> bool {
    match (sole_link(rule.sources.bits()), sole_link(rule.route.bits())) {
        (Some(source), Some(route)) => source.opposite() == Some(route),
        _ => false,
    }
}

/// Drops every default-routable rule that no later rule intersects.
pub fn remove_default_routes(table: &[Rule]) -> Vec<Rule> {
    let kept: Vec<Rule> = table
        .iter()
        .enumerate()
        .filter(|(i, rule)| {
            !is_default_routable(rule)
                || table[i + 1..]
                    .iter()
                    .any(|later| later.keymask.intersects(&rule.keymask))
        })
        .map(|(_, rule)| *rule)
        .collect();
    log::debug!(
        "removed {} default-routable rules",
        table.len() - kept.len()
    );
    kept
}

/// Removes default routes, failing if the result is longer than
/// `target_length`.
pub fn minimise(
    table: &[Rule],
    target_length: Option<u32>,
) -> Result<Vec<Rule>, MinimisationFailed> {
    ensure_fits(remove_default_routes(table), target_length)
}
