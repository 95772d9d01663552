#![no_main]

use libfuzzer_sys::fuzz_target;
use sift_log_pipeline::parser::EventParser;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        let parser = EventParser::new();
        let _ = parser.parse("Fuzz.Type", line);
    }
});
