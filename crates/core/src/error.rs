//! 에러 타입 -- 도메인별 에러 정의

/// sift 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 오브젝트 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// 규칙 디스패치 에러
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 트리거 메시지 해석 실패
    #[error("malformed trigger: {0}")]
    MalformedTrigger(String),

    /// 하류 큐 전송 실패
    #[error("forward failed: {0}")]
    ForwardFailed(String),

    /// 결과 영속화 실패
    #[error("flush failed: {0}")]
    FlushFailed(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),
}

/// 규칙 디스패치 에러
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// 규칙 엔진 호출 실패 (결과 채널 밖에서 발생한 실패)
    #[error("rule engine failure: {0}")]
    Engine(String),

    /// 규칙 정의 에러
    #[error("rule error: {0}")]
    Rule(String),

    /// 직접 평가 요청의 규칙 수 위반
    #[error("exactly one rule expected, found {found}")]
    RuleCount { found: usize },
}

/// 스토리지 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 오브젝트 읽기 실패
    #[error("read failed: {0}")]
    Read(String),

    /// 압축 해제 실패
    #[error("decompression failed: {0}")]
    Decompress(String),
}
