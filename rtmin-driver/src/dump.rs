// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use anyhow::Context;
use clap::ArgMatches;
use rtmin::table::table_to_string;

use crate::common::read_tables_from_path;

pub fn handle_dump(matches: &ArgMatches) -> anyhow::Result<()> {
    let in_path = Path::new(
        matches
            .get_one::<String>("in_file")
            .context("missing input file")?,
    );
    let tables = read_tables_from_path(in_path)?;
    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&tables)?);
        return Ok(());
    }
    for table in &tables {
        println!(
            "chip ({}, {}): {} entries",
            table.x,
            table.y,
            table.rules.len()
        );
        print!("{}", table_to_string(&table.rules));
    }
    Ok(())
}
