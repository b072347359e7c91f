#![no_main]
use std::io::Cursor;

use drpm::{DeltaRpm, ReadOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let opts = ReadOptions {
        max_string_len: 4096,
        max_block_len: 1 << 20,
        max_pairs: 1 << 16,
    };
    if let Ok(delta) = DeltaRpm::from_reader(Cursor::new(data), "fuzz.drpm", &opts) {
        assert!((1..=3).contains(&delta.version()));
        assert_eq!(delta.tgt_md5().len(), 32);
        delta.close();
    }
});
