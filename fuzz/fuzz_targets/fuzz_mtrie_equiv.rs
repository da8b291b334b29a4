// SPDX-License-Identifier: Apache-2.0
#![no_main]
use libfuzzer_sys::fuzz_target;
use rtmin::equiv::check_tables_equivalent;
use rtmin::mtrie::mtrie;
use rtmin::table::is_orthogonal;
use rtmin_fuzz::{build_table, FuzzTable};

fuzz_target!(|sample: FuzzTable| {
    let _ = env_logger::builder().is_test(true).try_init();
    let table = build_table(&sample);
    if !is_orthogonal(&table) {
        return;
    }
    let got = mtrie(&table);
    assert!(got.len() <= table.len());
    assert_eq!(check_tables_equivalent(&table, &got), Ok(()));
});
