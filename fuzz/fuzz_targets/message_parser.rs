//! Fuzz target for IRC message parsing
//!
//! This fuzzer tests the robustness of the IRC line parser by feeding it
//! randomly generated input data and ensuring it doesn't panic or crash.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str;

fuzz_target!(|data: &[u8]| {
    // Only fuzz valid UTF-8 strings to focus on protocol-level issues
    if let Ok(input) = str::from_utf8(data) {
        // Skip empty inputs and very long inputs (over 512 bytes is unusual for IRC)
        if input.is_empty() || input.len() > 512 {
            return;
        }

        // Borrowed and owned parsing - should never panic
        let _ = slirc_client::MessageRef::parse(input);
        if let Ok(msg) = input.parse::<slirc_client::Message>() {
            // A parsed message must either serialize or report a clean error
            let _ = msg.to_wire();
        }
    }
});
