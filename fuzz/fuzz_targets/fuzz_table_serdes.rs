// SPDX-License-Identifier: Apache-2.0
#![no_main]
use libfuzzer_sys::fuzz_target;
use rtmin::{read_tables, write_tables};

// A stream either parses completely or is rejected; whatever parses
// must re-serialize to exactly the input bytes.
fuzz_target!(|data: &[u8]| {
    let _ = env_logger::builder().is_test(true).try_init();
    let tables = match read_tables(data) {
        Ok(tables) => tables,
        Err(_) => return,
    };
    let mut bytes = Vec::new();
    write_tables(&mut bytes, &tables).unwrap();
    assert_eq!(bytes.as_slice(), data);
});
