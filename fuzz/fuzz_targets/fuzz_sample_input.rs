//! Fuzz target: ingestion payload decode and validation
//!
//! Arbitrary JSON is decoded as a sample payload and validated.  Neither
//! step may panic; a rejected payload always names at least one field.
//!
//! cargo fuzz run fuzz_sample_input

#![no_main]

use biobin::sample::SampleInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = serde_json::from_slice::<SampleInput>(data) else {
        return;
    };
    match input.validate() {
        Ok(reading) => {
            assert!(reading.temperature.is_finite());
            assert!(reading.humidity.is_finite());
        }
        Err(e) => assert!(!e.is_empty()),
    }
});
