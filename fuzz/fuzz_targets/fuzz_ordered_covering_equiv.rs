// SPDX-License-Identifier: Apache-2.0
#![no_main]
use libfuzzer_sys::fuzz_target;
use rtmin::equiv::check_tables_equivalent;
use rtmin::test_utils::first_forwarding_difference;
use rtmin::{minimise_ordered_covering, MinimisationFailed};
use rtmin_fuzz::{build_table, FuzzTable, KEY_BITS};

fuzz_target!(|sample: FuzzTable| {
    let _ = env_logger::builder().is_test(true).try_init();
    let table = build_table(&sample);
    let target = sample.target_length.map(u32::from);
    let unbounded = minimise_ordered_covering(&table, None, false).unwrap();
    assert!(unbounded.len() <= table.len());
    assert_eq!(check_tables_equivalent(&table, &unbounded), Ok(()));
    assert_eq!(first_forwarding_difference(&table, &unbounded, KEY_BITS), None);

    match minimise_ordered_covering(&table, target, false) {
        Ok(got) => {
            if let Some(t) = target {
                assert!(got.len() <= t as usize);
            }
            assert_eq!(check_tables_equivalent(&table, &got), Ok(()));
        }
        Err(MinimisationFailed {
            target_length,
            final_length,
            chip,
        }) => {
            assert_eq!(Some(target_length), target);
            assert_eq!(final_length as usize, unbounded.len());
            assert_eq!(chip, None);
        }
    }
});
