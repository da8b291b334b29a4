// SPDX-License-Identifier: Apache-2.0

use clap::ArgMatches;
use rtmin::remove_default_routes::remove_default_routes;

use crate::common::{minimise_file, warn_if_too_long};
use crate::minimise_config::{get_target_length, RtminConfig};

pub fn handle_remove_default_routes(
    matches: &ArgMatches,
    config: &Option<RtminConfig>,
) -> anyhow::Result<()> {
    let target_length = get_target_length(matches, config);
    minimise_file(matches, |table| {
        let minimised = remove_default_routes(&table.rules);
        warn_if_too_long(table, minimised.len(), target_length);
        Ok(minimised)
    })
}
