//! Fuzz target: `Recommendation::parse`
//!
//! Feeds arbitrary provider answers to the parser.  It must never panic,
//! and a malformed answer must carry the trimmed raw text back.
//!
//! cargo fuzz run fuzz_recommendation

#![no_main]

use biobin::advisory::{AdvisoryError, Recommendation};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    match Recommendation::parse(text) {
        Ok(rec) => {
            let _ = rec.activates_any();
        }
        Err(AdvisoryError::Malformed { raw }) => assert_eq!(raw, text.trim()),
        Err(other) => panic!("parse produced a non-parse error: {other}"),
    }
});
