//! Fuzz target for mode-string parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str;

use slirc_client::mode::{parse_channel_modes, parse_user_modes};
use slirc_client::PrefixSpec;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        if input.len() > 512 {
            return;
        }

        let pieces: Vec<&str> = input.split(' ').collect();
        let table = PrefixSpec::default_table();

        // Neither parser may panic, whatever the input shape
        let _ = parse_channel_modes(&pieces, &table);
        let _ = parse_user_modes(&pieces);
    }
});
