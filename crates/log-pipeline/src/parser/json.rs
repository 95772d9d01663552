//! JSON 이벤트 파서
//!
//! 한 줄의 JSON 텍스트를 파싱하여 로그 타입이 태깅된 [`DecodedEvent`]를 만듭니다.
//!
//! 에러 메시지에는 입력 내용이 절대 포함되지 않습니다. 종류, 위치, serde_json
//! 에러 분류만 담기므로 민감한 로그 데이터가 로그로 새어나가지 않습니다.

use serde_json::error::Category;
use serde_json::{Map, Value};
use sift_core::types::DecodedEvent;

use crate::error::{LogPipelineError, ParseErrorKind};

/// 기본 최대 입력 크기 (1MB)
const DEFAULT_MAX_INPUT_SIZE: usize = 1024 * 1024;

/// JSON 이벤트 파서
#[derive(Debug, Clone)]
pub struct EventParser {
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl EventParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// JSON 라인을 파싱합니다.
    pub fn parse(&self, log_type: &str, line: &str) -> Result<DecodedEvent, LogPipelineError> {
        if line.len() > self.max_input_size {
            return Err(parse_error(
                ParseErrorKind::TooLarge,
                0,
                format!(
                    "input too large: {} bytes (max: {})",
                    line.len(),
                    self.max_input_size
                ),
            ));
        }

        let value: Value = serde_json::from_str(line).map_err(|e| {
            let kind = match e.classify() {
                Category::Eof => ParseErrorKind::Eof,
                Category::Data => ParseErrorKind::Data,
                Category::Syntax | Category::Io => ParseErrorKind::Syntax,
            };
            parse_error(
                kind,
                e.column(),
                format!("{kind} error at line {} column {}", e.line(), e.column()),
            )
        })?;

        self.parse_value(log_type, value)
    }

    /// 이미 디코딩된 JSON 값에서 이벤트를 생성합니다.
    ///
    /// 최상위가 객체가 아니면 `NotObject` 에러를 반환합니다.
    pub fn parse_value(
        &self,
        log_type: &str,
        value: Value,
    ) -> Result<DecodedEvent, LogPipelineError> {
        let data = into_object(value)?;
        Ok(DecodedEvent::new(log_type, data))
    }
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new()
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>, LogPipelineError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(parse_error(
            ParseErrorKind::NotObject,
            0,
            format!("expected JSON object at top level, found {}", type_name(&other)),
        )),
    }
}

/// 에러 메시지용 JSON 값 종류 이름
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_error(kind: ParseErrorKind, offset: usize, reason: String) -> LogPipelineError {
    LogPipelineError::Parse {
        kind,
        format: "json".to_owned(),
        offset,
        reason,
    }
}
