//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for SiftError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 배치 실행 관점에서 에러는 두 부류로 나뉩니다.
//! [`LogPipelineError::Parse`]는 라인 단위로 기록 후 계속 진행하고,
//! 나머지는 모두 실행 전체를 중단시킵니다 ([`LogPipelineError::is_recoverable`]).

use std::fmt;

use sift_core::error::{ConfigError, DispatchError, PipelineError, SiftError, StorageError};

/// 라인 디코딩 실패 종류
///
/// 로그와 메트릭 레이블에 그대로 사용되므로 원본 내용은 담지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// JSON 문법 오류
    Syntax,
    /// 입력이 중간에 끝남
    Eof,
    /// 타입 불일치 등 데이터 오류
    Data,
    /// 최상위 값이 객체가 아님
    NotObject,
    /// 라인 길이 제한 초과
    TooLarge,
    /// UTF-8 디코딩 실패
    Utf8,
}

impl ParseErrorKind {
    /// 레이블용 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Eof => "eof",
            Self::Data => "data",
            Self::NotObject => "not_object",
            Self::TooLarge => "too_large",
            Self::Utf8 => "utf8",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 로그 파이프라인 도메인 에러
///
/// 트리거 해석, 스토리지 읽기, 압축 해제, 파싱, 룰 디스패치,
/// 하류 전송, 결과 영속화 등 파이프라인 내부의 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 라인 파싱 실패
    #[error("parse error ({kind}): {format} at offset {offset}: {reason}")]
    Parse {
        /// 실패 종류
        kind: ParseErrorKind,
        /// 파서 형식 (json)
        format: String,
        /// 실패 위치 (라인 내 컬럼 또는 바이트 오프셋)
        offset: usize,
        /// 실패 사유 (원본 내용 미포함)
        reason: String,
    },

    /// 트리거 메시지 해석 실패
    #[error("malformed trigger: {0}")]
    Trigger(String),

    /// 오브젝트 스토리지 에러
    #[error("storage error: {locator}: {reason}")]
    Storage {
        /// 오브젝트 위치 (bucket/key)
        locator: String,
        /// 에러 사유
        reason: String,
    },

    /// 압축 해제 실패
    #[error("decompress error: {locator}: {reason}")]
    Decompress {
        /// 오브젝트 위치 (bucket/key)
        locator: String,
        /// 에러 사유
        reason: String,
    },

    /// 규칙 엔진 디스패치 실패
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// 하류 큐 전송 실패
    #[error("forward error: {0}")]
    Forward(String),

    /// 결과 영속화 실패
    #[error("sink error: {0}")]
    Sink(String),

    /// 룰 파일 로딩 실패
    #[error("rule load error: {path}: {reason}")]
    RuleLoad {
        /// 룰 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 룰 유효성 검증 실패
    #[error("rule validation error: rule '{rule_id}': {reason}")]
    RuleValidation {
        /// 문제가 된 룰 ID
        rule_id: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 직접 평가 요청의 규칙 수 위반
    #[error("exactly one rule expected, found {found}")]
    RuleCount {
        /// 요청에 포함된 규칙 수
        found: usize,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogPipelineError {
    /// 라인 단위로 기록하고 계속 진행할 수 있는 에러인지 확인합니다.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// 파싱 에러의 종류를 반환합니다.
    pub fn parse_kind(&self) -> Option<ParseErrorKind> {
        match self {
            Self::Parse { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<LogPipelineError> for SiftError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Trigger(reason) => {
                SiftError::Pipeline(PipelineError::MalformedTrigger(reason))
            }
            LogPipelineError::Storage { locator, reason } => {
                SiftError::Storage(StorageError::Read(format!("{locator}: {reason}")))
            }
            LogPipelineError::Decompress { locator, reason } => {
                SiftError::Storage(StorageError::Decompress(format!("{locator}: {reason}")))
            }
            LogPipelineError::Dispatch(reason) => {
                SiftError::Dispatch(DispatchError::Engine(reason))
            }
            LogPipelineError::RuleCount { found } => {
                SiftError::Dispatch(DispatchError::RuleCount { found })
            }
            LogPipelineError::Forward(reason) => {
                SiftError::Pipeline(PipelineError::ForwardFailed(reason))
            }
            LogPipelineError::Sink(reason) => {
                SiftError::Pipeline(PipelineError::FlushFailed(reason))
            }
            LogPipelineError::Config { field, reason } => {
                SiftError::Config(ConfigError::InvalidValue { field, reason })
            }
            LogPipelineError::Io(e) => SiftError::Io(e),
            other => SiftError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}
