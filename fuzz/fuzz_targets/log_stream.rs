#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use sift_core::types::StorageLocator;
use sift_log_pipeline::stream::LogStream;

fuzz_target!(|data: &[u8]| {
    // 임의 바이트를 gzip 스트림으로 취급, 라인 길이는 작게 제한
    let stream = LogStream::new(
        Box::new(Cursor::new(data.to_vec())),
        StorageLocator::new("fuzz", "input.json.gz"),
        4096,
    );
    for item in stream.take(10_000) {
        let _ = item;
    }
});
