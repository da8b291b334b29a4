// SPDX-License-Identifier: Apache-2.0

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;
use clap::ArgMatches;
use rtmin::equiv::check_tables_equivalent;
use rtmin::{read_tables, write_tables, ChipTable, Rule};

pub fn read_tables_from_path(path: &Path) -> anyhow::Result<Vec<ChipTable>> {
    let file = File::open(path)
        .with_context(|| format!("could not open input file {}", path.display()))?;
    read_tables(BufReader::new(file))
        .with_context(|| format!("could not read routing tables from {}", path.display()))
}

pub fn write_tables_to_path(path: &Path, tables: &[ChipTable]) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("could not create output file {}", path.display()))?;
    write_tables(BufWriter::new(file), tables)
        .with_context(|| format!("could not write routing tables to {}", path.display()))
}

/// One line per chip: coordinates, original length, minimised length.
pub fn print_chip_summary(chip: (u8, u8), original_len: usize, minimised_len: usize) {
    println!(
        "({:3}, {:3})\t{:4}\t{}",
        chip.0, chip.1, original_len, minimised_len
    );
}

/// Best-effort minimisers still hand back a table that is too long; say so.
pub fn warn_if_too_long(table: &ChipTable, minimised_len: usize, target_length: Option<u32>) {
    if let Some(target) = target_length {
        if minimised_len > target as usize {
            log::warn!(
                "chip ({}, {}): {} entries do not fit target length {}",
                table.x,
                table.y,
                minimised_len,
                target
            );
        }
    }
}

pub fn verify_equivalent(table: &ChipTable, minimised: &[Rule]) -> anyhow::Result<()> {
    check_tables_equivalent(&table.rules, minimised).map_err(|region| {
        anyhow::anyhow!(
            "minimised table for chip ({}, {}) forwards keys in {} differently",
            table.x,
            table.y,
            region
        )
    })
}

/// Reads the input file, minimises each chip with `minimise_chip`, prints a
/// summary line per chip and writes the results to the output file.
pub fn minimise_file<F>(matches: &ArgMatches, mut minimise_chip: F) -> anyhow::Result<()>
where
    F: FnMut(&ChipTable) -> anyhow::Result<Vec<Rule>>,
{
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
    let tables = read_tables_from_path(in_path)?;
    log::info!("read {} tables from {}", tables.len(), in_path.display());

    let mut minimised = Vec::with_capacity(tables.len());
    for table in &tables {
        let rules = minimise_chip(table)?;
        print_chip_summary(table.chip(), table.rules.len(), rules.len());
        minimised.push(ChipTable::new(table.x, table.y, rules));
    }
    write_tables_to_path(out_path, &minimised)
}
