//! 이벤트 파싱 모듈 -- newline-delimited JSON 라인을 [`DecodedEvent`]로 변환
//!
//! 로그 타입별 스키마 해석은 하지 않습니다. 최상위가 JSON 객체이면
//! 그대로 이벤트가 되고, 그 외의 입력은 종류가 분류된 파싱 에러가 됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use sift_log_pipeline::parser::EventParser;
//!
//! let parser = EventParser::default();
//! let event = parser.parse("AWS.CloudTrail", r#"{"eventName":"ConsoleLogin"}"#)?;
//! assert_eq!(event.log_type, "AWS.CloudTrail");
//! ```
//!
//! [`DecodedEvent`]: sift_core::types::DecodedEvent

pub mod json;

pub use json::EventParser;
