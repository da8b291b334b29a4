// SPDX-License-Identifier: Apache-2.0

use clap::ArgMatches;
use rtmin::mtrie::mtrie;
use rtmin::table::is_orthogonal;

use crate::common::{minimise_file, verify_equivalent, warn_if_too_long};
use crate::minimise_config::{get_check_equivalence, get_target_length, RtminConfig};

/// m-Trie only. Default routes are kept so that forwarding is unchanged.
pub fn handle_mtrie(matches: &ArgMatches, config: &Option<RtminConfig>) -> anyhow::Result<()> {
    let target_length = get_target_length(matches, config);
    let check_equivalence = get_check_equivalence(matches, config);
    minimise_file(matches, |table| {
        if !is_orthogonal(&table.rules) {
            anyhow::bail!(
                "routing table for chip ({}, {}) is not orthogonal; the m-Trie needs entries with different routes to be disjoint",
                table.x,
                table.y
            );
        }
        let minimised = mtrie(&table.rules);
        warn_if_too_long(table, minimised.len(), target_length);
        if check_equivalence {
            verify_equivalent(table, &minimised)?;
        }
        Ok(minimised)
    })
}
