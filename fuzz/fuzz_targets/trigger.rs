#![no_main]

use libfuzzer_sys::fuzz_target;
use sift_log_pipeline::trigger::{parse_batch, GroupedReferences, Invocation};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    if let Ok(Invocation::Batch(trigger)) = Invocation::from_value(value) {
        if let Ok(refs) = parse_batch(&trigger) {
            let grouped: GroupedReferences = refs.into_iter().collect();
            assert_eq!(grouped.reference_count(), trigger.records.len());
        }
    }
});
