// SPDX-License-Identifier: Apache-2.0

use clap::ArgMatches;
use rtmin::minimise::minimise_ordered_covering_with;

use crate::common::{minimise_file, verify_equivalent, warn_if_too_long};
use crate::minimise_config::{
    get_check_equivalence, get_ordered_covering_options, get_target_length, RtminConfig,
};

/// Ordered Covering, stopping early once a table fits. Tables that cannot be
/// made to fit are written anyway.
pub fn handle_ordered_covering(
    matches: &ArgMatches,
    config: &Option<RtminConfig>,
) -> anyhow::Result<()> {
    let target_length = get_target_length(matches, config);
    let check_equivalence = get_check_equivalence(matches, config);
    let options = get_ordered_covering_options(matches, config);
    log::info!(
        "ordered covering: target length {:?}, max key distance {}",
        target_length,
        options.max_key_distance
    );
    minimise_file(matches, |table| {
        let minimised =
            minimise_ordered_covering_with(&table.rules, target_length, true, &options)?;
        warn_if_too_long(table, minimised.len(), target_length);
        if check_equivalence {
            verify_equivalent(table, &minimised)?;
        }
        Ok(minimised)
    })
}
