// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use anyhow::Context;
use clap::ArgMatches;
use rtmin::{minimise_tables, TargetLengths};

use crate::common::{print_chip_summary, read_tables_from_path, write_tables_to_path};
use crate::minimise_config::{
    get_methods, get_ordered_covering_options, get_target_length, RtminConfig,
};

/// Tries each configured strategy per chip, in parallel, and fails if any
/// chip cannot be made to fit. Chips left with no entries are not written.
pub fn handle_minimise(matches: &ArgMatches, config: &Option<RtminConfig>) -> anyhow::Result<()> {
    let in_path = Path::new(
        matches
            .get_one::<String>("in_file")
            .context("missing input file")?,
    );
    let out_path = Path::new(
        matches
            .get_one::<String>("out_file")
            .context("missing output file")?,
    );
    let targets = TargetLengths::from(get_target_length(matches, config));
    let methods = get_methods(matches, config);
    let options = get_ordered_covering_options(matches, config);
    log::info!(
        "minimise: methods [{}], targets {:?}",
        methods
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        targets
    );

    let tables = read_tables_from_path(in_path)?;
    let minimised = minimise_tables(&tables, &targets, &methods, &options)?;
    for table in &tables {
        let minimised_len = minimised
            .iter()
            .find(|m| m.chip() == table.chip())
            .map_or(0, |m| m.rules.len());
        print_chip_summary(table.chip(), table.rules.len(), minimised_len);
    }
    write_tables_to_path(out_path, &minimised)
}
