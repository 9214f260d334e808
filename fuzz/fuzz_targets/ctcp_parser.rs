//! Fuzz target for CTCP extraction and quoting.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str;

use slirc_client::ctcp::quote::{ctcp_dequote, ctcp_quote, low_level_dequote, low_level_quote};
use slirc_client::Ctcp;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        if input.len() > 1024 {
            return;
        }

        // Extraction should never panic, tagged or not
        if let Some(ctcp) = Ctcp::extract(input) {
            let _ = ctcp.encode();
        }

        // Dequoting arbitrary input should never panic
        let _ = ctcp_dequote(input);
        let _ = low_level_dequote(input);

        // Quoting then dequoting is the identity
        let round = ctcp_dequote(&ctcp_quote(input));
        assert_eq!(round, input);
        let round = low_level_dequote(&low_level_quote(input));
        assert_eq!(round, input);
    }
});
