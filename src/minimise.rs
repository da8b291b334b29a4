// SPDX-License-Identifier: Apache-2.0

//! Strategy selection and the target-length contract.

use std::collections::BTreeMap;
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::mtrie::mtrie;
use crate::ordered_covering::{ordered_covering, OrderedCoveringOptions};
use crate::remove_default_routes::remove_default_routes;
use crate::table::{is_orthogonal, ChipTable, Rule};

/// A table could not be made to fit in the requested number of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimisationFailed {
    pub target_length: u32,
    pub final_length: u32,
    pub chip: Option<(u8, u8)>,
}

impl MinimisationFailed {
    pub fn new(target_length: u32, final_length: u32) -> Self {
        MinimisationFailed {
            target_length,
            final_length,
            chip: None,
        }
    }

    pub fn with_chip(mut self, chip: (u8, u8)) -> Self {
        self.chip = Some(chip);
        self
    }
}

impl fmt::Display for MinimisationFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not minimise routing table to fit {} entries; best managed was {} entries",
            self.target_length, self.final_length
        )?;
        if let Some((x, y)) = self.chip {
            write!(f, " (chip ({}, {}))", x, y)?;
        }
        Ok(())
    }
}

impl std::error::Error for MinimisationFailed {}

/// Returns `table` unchanged if it fits in `target_length`.
pub fn ensure_fits(
    table: Vec<Rule>,
    target_length: Option<u32>,
) -> Result<Vec<Rule>, MinimisationFailed> {
    match target_length {
        Some(target) if table.len() > target as usize => {
            Err(MinimisationFailed::new(target, table.len() as u32))
        }
        _ => Ok(table),
    }
}

/// m-Trie followed by default-route removal.
///
/// # Panics
///
/// Panics if `table` is not orthogonal (see [`crate::table::is_orthogonal`]).
/// [`Strategy::MTrie`] checks this first and skips such tables instead.
pub fn minimise(
    table: &[Rule],
    target_length: Option<u32>,
) -> Result<Vec<Rule>, MinimisationFailed> {
    ensure_fits(remove_default_routes(&mtrie(table)), target_length)
}

/// Ordered Covering with default options.
///
/// With `suppress_error` set the best table found is returned even when it
/// does not fit.
pub fn minimise_ordered_covering(
    table: &[Rule],
    target_length: Option<u32>,
    suppress_error: bool,
) -> Result<Vec<Rule>, MinimisationFailed> {
    minimise_ordered_covering_with(
        table,
        target_length,
        suppress_error,
        &OrderedCoveringOptions::default(),
    )
}

pub fn minimise_ordered_covering_with(
    table: &[Rule],
    target_length: Option<u32>,
    suppress_error: bool,
    options: &OrderedCoveringOptions,
) -> Result<Vec<Rule>, MinimisationFailed> {
    let result = ordered_covering(table, target_length, options);
    if suppress_error {
        Ok(result)
    } else {
        ensure_fits(result, target_length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Identity,
    RemoveDefaultRoutes,
    #[serde(rename = "mtrie")]
    MTrie,
    OrderedCovering,
}

impl Strategy {
    /// Strategies tried by [`minimise_table`] when none are given.
    pub fn default_methods() -> Vec<Strategy> {
        vec![Strategy::RemoveDefaultRoutes, Strategy::OrderedCovering]
    }

    /// Runs the strategy without enforcing the target. Returns `None` when
    /// the strategy cannot be applied to this table.
    pub fn apply(
        &self,
        table: &[Rule],
        target_length: Option<u32>,
        options: &OrderedCoveringOptions,
    ) -> Option<Vec<Rule>> {
        match self {
            Strategy::Identity => Some(table.to_vec()),
            Strategy::RemoveDefaultRoutes => Some(remove_default_routes(table)),
            Strategy::MTrie => {
                if is_orthogonal(table) {
                    Some(remove_default_routes(&mtrie(table)))
                } else {
                    log::warn!("skipping m-Trie: table is not orthogonal");
                    None
                }
            }
            Strategy::OrderedCovering => Some(ordered_covering(table, target_length, options)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Identity => "identity",
            Strategy::RemoveDefaultRoutes => "remove-default-routes",
            Strategy::MTrie => "mtrie",
            Strategy::OrderedCovering => "ordered-covering",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" => Ok(Strategy::Identity),
            "remove-default-routes" => Ok(Strategy::RemoveDefaultRoutes),
            "mtrie" => Ok(Strategy::MTrie),
            "ordered-covering" => Ok(Strategy::OrderedCovering),
            _ => Err(format!("unknown minimisation strategy: {}", s)),
        }
    }
}

/// Tries the identity and then each of `methods` in turn.
///
/// With a target, returns the first result that fits, or fails with the
/// shortest length any of them reached. Without one, returns the shortest
/// result, preferring earlier strategies on ties.
pub fn minimise_table(
    table: &[Rule],
    target_length: Option<u32>,
    methods: &[Strategy],
    options: &OrderedCoveringOptions,
) -> Result<Vec<Rule>, MinimisationFailed> {
    let mut best: Vec<Rule> = table.to_vec();
    if let Some(target) = target_length {
        if best.len() <= target as usize {
            return Ok(best);
        }
    }
    for method in methods {
        let candidate = match method.apply(table, target_length, options) {
            Some(candidate) => candidate,
            None => continue,
        };
        log::debug!(
            "{}: {} -> {} rules",
            method,
            table.len(),
            candidate.len()
        );
        if candidate.len() < best.len() {
            best = candidate;
        }
        if let Some(target) = target_length {
            if best.len() <= target as usize {
                return Ok(best);
            }
        }
    }
    ensure_fits(best, target_length)
}

/// Per-chip bound on table length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetLengths {
    #[default]
    Unbounded,
    Global(u32),
    /// Chips missing from the map are unbounded.
    PerChip(BTreeMap<(u8, u8), u32>),
}

impl TargetLengths {
    pub fn for_chip(&self, chip: (u8, u8)) -> Option<u32> {
        match self {
            TargetLengths::Unbounded => None,
            TargetLengths::Global(target) => Some(*target),
            TargetLengths::PerChip(targets) => targets.get(&chip).copied(),
        }
    }
}

impl From<Option<u32>> for TargetLengths {
    fn from(target: Option<u32>) -> Self {
        target.map_or(TargetLengths::Unbounded, TargetLengths::Global)
    }
}

/// Minimises every chip's table with [`minimise_table`], one chip per rayon
/// task.
///
/// Chips whose minimised table is empty are omitted from the result. On
/// failure the first failing chip, in input order, is reported.
pub fn minimise_tables(
    tables: &[ChipTable],
    targets: &TargetLengths,
    methods: &[Strategy],
    options: &OrderedCoveringOptions,
) -> Result<Vec<ChipTable>, MinimisationFailed> {
    let minimised: Vec<Result<ChipTable, MinimisationFailed>> = tables
        .par_iter()
        .map(|table| {
            let chip = table.chip();
            let rules = minimise_table(&table.rules, targets.for_chip(chip), methods, options)
                .map_err(|e| e.with_chip(chip))?;
            log::info!(
                "chip ({}, {}): {} -> {} rules",
                table.x,
                table.y,
                table.rules.len(),
                rules.len()
            );
            Ok(ChipTable::new(table.x, table.y, rules))
        })
        .collect();

    let mut result = Vec::with_capacity(minimised.len());
    for table in minimised {
        let table = table?;
        if !table.rules.is_empty() {
            result.push(table);
        }
    }
    Ok(result)
}
