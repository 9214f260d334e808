//! Fuzz target for message source (prefix) parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        if input.len() > 512 {
            return;
        }

        // Lenient parse never panics
        let parsed = slirc_client::SourceRef::parse(input);
        let owned = parsed.to_owned();
        let _ = owned.to_string();

        // Validating parse rejects cleanly
        let _ = slirc_client::Source::try_from_str(input);
    }
});
