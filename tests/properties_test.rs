// SPDX-License-Identifier: Apache-2.0

//! Randomized checks of the minimisation contract over seeded tables.

use pretty_assertions::assert_eq;
use test_case::test_case;

use rtmin::equiv::check_tables_equivalent;
use rtmin::mtrie::mtrie;
use rtmin::normalize::normalize;
use rtmin::remove_default_routes::is_default_routable;
use rtmin::table::table_to_string;
use rtmin::table_serdes::{read_tables, write_tables};
use rtmin::route::Route::{East, North};
use rtmin::test_utils::{
    first_forwarding_difference, random_orthogonal_table, random_table, seeded_rng,
    RandomTableOptions,
};
use rtmin::{minimise, minimise_ordered_covering, ChipTable, Rule};

const SEEDS: u64 = 64;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_equivalent(original: &[Rule], minimised: &[Rule], key_bits: u32) {
    if let Err(region) = check_tables_equivalent(original, minimised) {
        panic!(
            "tables disagree on {}\noriginal:\n{}minimised:\n{}",
            region,
            table_to_string(original),
            table_to_string(minimised)
        );
    }
    assert_eq!(
        first_forwarding_difference(original, minimised, key_bits),
        None
    );
}

/// Panics if a rule can never match because an earlier rule with the same
/// route already matches all of its keys.
fn assert_no_redundant_rules(table: &[Rule]) {
    for (j, later) in table.iter().enumerate() {
        if let Some(i) = table[..j]
            .iter()
            .position(|earlier| earlier.route_equal(later) && earlier.keymask.covers(&later.keymask))
        {
            panic!(
                "rule {} is shadowed by rule {}:\n{}",
                j,
                i,
                table_to_string(table)
            );
        }
    }
}

#[test_case(RandomTableOptions::default(); "default")]
#[test_case(RandomTableOptions { wildcard_probability: 0.5, ..Default::default() }; "many wildcards")]
#[test_case(RandomTableOptions { wildcard_probability: 0.4, stray_key_bits: true, ..Default::default() }; "stray key bits")]
#[test_case(RandomTableOptions { distinct_routes: 1, len: 40, ..Default::default() }; "single route")]
#[test_case(RandomTableOptions { key_bits: 8, len: 64, wildcard_probability: 0.05, ..Default::default() }; "mostly exact")]
fn test_ordered_covering_preserves_forwarding(options: RandomTableOptions) {
    init_logger();
    for seed in 0..SEEDS {
        let table = random_table(&mut seeded_rng(seed), &options);
        let got = minimise_ordered_covering(&table, None, false).unwrap();
        assert!(got.len() <= table.len(), "seed {}", seed);
        assert_equivalent(&table, &got, options.key_bits);
        assert_no_redundant_rules(&got);
    }
}

#[test]
fn test_single_exception_leaves_no_shadowed_rules() {
    init_logger();
    let table: Vec<Rule> = (0..256u32)
        .map(|k| {
            let route = if k == 5 { East } else { North };
            Rule::new([route], k, 0xffff_ffff)
        })
        .collect();
    let got = minimise_ordered_covering(&table, None, false).unwrap();
    assert_equivalent(&table, &got, 8);
    assert_no_redundant_rules(&got);
    assert!(got.len() < table.len() / 4, "{}", table_to_string(&got));
}

#[test]
fn test_ordered_covering_is_idempotent() {
    init_logger();
    let options = RandomTableOptions::default();
    for seed in 0..SEEDS {
        let table = random_table(&mut seeded_rng(seed), &options);
        let once = minimise_ordered_covering(&table, None, false).unwrap();
        let twice = minimise_ordered_covering(&once, None, false).unwrap();
        assert_eq!(twice, once, "seed {}", seed);
    }
}

#[test]
fn test_target_enforcement() {
    init_logger();
    let options = RandomTableOptions {
        distinct_routes: 2,
        ..Default::default()
    };
    for seed in 0..SEEDS {
        let table = random_table(&mut seeded_rng(seed), &options);
        let best = minimise_ordered_covering(&table, None, false).unwrap().len() as u32;

        let fits = minimise_ordered_covering(&table, Some(best), false).unwrap();
        assert!(fits.len() as u32 <= best);
        assert_equivalent(&table, &fits, options.key_bits);

        if best > 0 {
            let err = minimise_ordered_covering(&table, Some(best - 1), false).unwrap_err();
            assert_eq!(err.target_length, best - 1);
            assert_eq!(err.final_length, best);
            assert_eq!(err.chip, None);
        }
    }
}

#[test]
fn test_early_stop_still_preserves_forwarding() {
    init_logger();
    let options = RandomTableOptions {
        distinct_routes: 1,
        len: 32,
        ..Default::default()
    };
    for seed in 0..SEEDS {
        let table = random_table(&mut seeded_rng(seed), &options);
        let target = (table.len() as u32 * 3) / 4;
        if let Ok(got) = minimise_ordered_covering(&table, Some(target), false) {
            assert!(got.len() as u32 <= target);
            assert_equivalent(&table, &got, options.key_bits);
        }
    }
}

#[test_case(false; "canonical keys")]
#[test_case(true; "stray key bits")]
fn test_normalize_preserves_forwarding(stray_key_bits: bool) {
    let options = RandomTableOptions {
        wildcard_probability: 0.4,
        stray_key_bits,
        ..Default::default()
    };
    for seed in 0..SEEDS {
        let table = random_table(&mut seeded_rng(seed), &options);
        let normalized = normalize(&table);
        assert_eq!(normalized.len(), table.len());
        assert_equivalent(&table, &normalized, options.key_bits);
        assert_eq!(normalize(&normalized), normalized, "seed {}", seed);
    }
}

#[test]
fn test_mtrie_preserves_forwarding_of_orthogonal_tables() {
    init_logger();
    let options = RandomTableOptions::default();
    for seed in 0..SEEDS {
        let table = random_orthogonal_table(&mut seeded_rng(seed), &options);
        let got = mtrie(&table);
        assert!(got.len() <= table.len());
        assert_equivalent(&table, &got, options.key_bits);
    }
}

#[test]
fn test_mtrie_minimise_only_drops_default_routed_keys() {
    init_logger();
    let options = RandomTableOptions::default();
    for seed in 0..SEEDS {
        let table = random_orthogonal_table(&mut seeded_rng(seed), &options);
        let got = minimise(&table, None).unwrap();
        let folded = mtrie(&table);
        for key in 0..(1u32 << options.key_bits) {
            let before = table.iter().find(|r| r.keymask.contains(key));
            let after = got.iter().find(|r| r.keymask.contains(key));
            match (before, after) {
                (Some(b), Some(a)) => assert_eq!(a.route, b.route, "seed {} key {}", seed, key),
                (None, None) => {}
                (Some(_), None) => {
                    // The entry for this key must have been removed as one the
                    // router's default routing reproduces.
                    assert!(
                        folded
                            .iter()
                            .any(|r| r.keymask.contains(key) && is_default_routable(r)),
                        "seed {} key {}",
                        seed,
                        key
                    );
                }
                (None, Some(_)) => panic!("seed {} key {} gained a route", seed, key),
            }
        }
    }
}

#[test]
fn test_serialized_tables_keep_stray_key_bits() {
    let options = RandomTableOptions {
        stray_key_bits: true,
        wildcard_probability: 0.5,
        ..Default::default()
    };
    for seed in 0..8 {
        let mut rng = seeded_rng(seed);
        let tables: Vec<ChipTable> = (0..4u8)
            .map(|x| ChipTable::new(x, seed as u8, random_table(&mut rng, &options)))
            .collect();
        let mut bytes = Vec::new();
        write_tables(&mut bytes, &tables).unwrap();
        assert_eq!(read_tables(bytes.as_slice()).unwrap(), tables);
    }
}
