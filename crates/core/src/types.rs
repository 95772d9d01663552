//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 트리거 메시지, 배치 참조, 디코딩된 이벤트, 분석 결과와
//! 직접 평가(direct evaluation) 요청/응답 구조를 정의합니다.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 트리거 배치 메시지
///
/// 큐에서 전달된 메시지 묶음입니다. 각 레코드의 `body`는 JSON 문자열입니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// 메시지 레코드 목록
    #[serde(rename = "Records", default)]
    pub records: Vec<TriggerRecord>,
}

/// 트리거 메시지 레코드
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRecord {
    /// 큐 메시지 ID (선택)
    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// JSON 인코딩된 본문
    pub body: String,
}

/// 오브젝트 스토리지 위치
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageLocator {
    /// 버킷 이름
    pub bucket: String,
    /// 오브젝트 키
    pub key: String,
}

impl StorageLocator {
    /// 새 위치를 생성합니다.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for StorageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// 배치 참조 -- 단일 로그 타입의 압축 오브젝트 하나를 가리킵니다.
///
/// 트리거 메시지에서 생성되며 실행 1회에 한 번 소비됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReference {
    /// 로그 타입 식별자
    pub log_type: String,
    /// 오브젝트 위치
    pub locator: StorageLocator,
}

impl BatchReference {
    /// 새 배치 참조를 생성합니다.
    pub fn new(log_type: impl Into<String>, locator: StorageLocator) -> Self {
        Self {
            log_type: log_type.into(),
            locator,
        }
    }
}

/// 디코딩된 이벤트
///
/// JSON 객체 한 줄을 파싱한 결과이며, 로그 타입으로 태깅됩니다.
/// 생성 후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedEvent {
    /// 로그 타입 식별자
    pub log_type: String,
    /// 이벤트 필드
    pub data: Map<String, Value>,
}

impl DecodedEvent {
    /// 새 이벤트를 생성합니다.
    pub fn new(log_type: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            log_type: log_type.into(),
            data,
        }
    }

    /// dot notation 경로로 필드 값을 조회합니다 (예: "actor.user.name").
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.data, path)
    }
}

/// JSON 객체에서 dot notation 경로의 값을 조회합니다.
///
/// 경로 전체가 최상위 키로 존재하면 그 값을 우선합니다.
pub fn lookup_path<'a>(data: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = data.get(path) {
        return Some(value);
    }

    let mut parts = path.split('.');
    let mut current = data.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}

/// 규칙 하나를 이벤트 하나에 실행한 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleRun {
    /// 매칭 여부
    pub matched: bool,
    /// 실행 중 발생한 에러 메시지
    pub error: Option<String>,
}

impl RuleRun {
    /// 매칭 결과를 생성합니다.
    pub fn matched(matched: bool) -> Self {
        Self {
            matched,
            error: None,
        }
    }

    /// 실행 실패 결과를 생성합니다.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            matched: false,
            error: Some(message.into()),
        }
    }
}

/// 분석 결과 -- 이벤트 하나를 규칙 엔진에 디스패치한 결과 중 규칙 하나에 대한 항목
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// 규칙 ID
    pub rule_id: String,
    /// 로그 타입
    pub log_type: String,
    /// 규칙 심각도
    pub severity: Severity,
    /// 규칙 표시 제목 (제목이 없으면 규칙 ID)
    pub rule_title: String,
    /// 규칙 분류 태그
    pub rule_tags: Vec<String>,
    /// 하류 알림 중복 제거 기간 (분)
    pub dedup_period_mins: u64,
    /// 매칭 여부
    pub matched: bool,
    /// 평가 에러 (있다면)
    pub error: Option<String>,
    /// 평가 대상 이벤트
    pub event: Arc<DecodedEvent>,
}

impl AnalysisResult {
    /// 에러 없이 매칭되었는지 확인합니다.
    pub fn is_match(&self) -> bool {
        self.matched && self.error.is_none()
    }

    /// 평가 에러가 있는지 확인합니다.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// 직접 평가 요청의 규칙 정의
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    /// 규칙 ID
    pub id: String,
    /// 규칙 본문
    pub body: String,
}

/// 직접 평가 요청의 이벤트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectEvent {
    /// 이벤트 ID
    pub id: String,
    /// 이벤트 데이터
    pub data: Value,
}

/// 직접 평가 요청 -- 규칙 하나를 고정된 이벤트 목록에 실행합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectTestCase {
    /// 규칙 목록 (정확히 하나여야 함)
    pub rules: Vec<RuleSpec>,
    /// 평가할 이벤트 목록
    #[serde(default)]
    pub events: Vec<DirectEvent>,
}

/// 직접 평가에서 규칙 실행 에러 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleError {
    /// 규칙 ID
    pub id: String,
    /// 에러 메시지
    pub message: String,
}

/// 이벤트 하나에 대한 직접 평가 판정
///
/// `matched`, `not_matched`, `errored` 중 정확히 하나만 비어있지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectTestResult {
    /// 이벤트 ID
    pub id: String,
    /// 매칭된 규칙 ID
    pub matched: Vec<String>,
    /// 매칭되지 않은 규칙 ID
    pub not_matched: Vec<String>,
    /// 실행 에러
    pub errored: Vec<RuleError>,
}

impl DirectTestResult {
    /// 매칭 판정을 생성합니다.
    pub fn matched(id: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            matched: vec![rule_id.into()],
            not_matched: Vec::new(),
            errored: Vec::new(),
        }
    }

    /// 미매칭 판정을 생성합니다.
    pub fn not_matched(id: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            matched: Vec::new(),
            not_matched: vec![rule_id.into()],
            errored: Vec::new(),
        }
    }

    /// 에러 판정을 생성합니다.
    pub fn errored(
        id: impl Into<String>,
        rule_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            matched: Vec::new(),
            not_matched: Vec::new(),
            errored: vec![RuleError {
                id: rule_id.into(),
                message: message.into(),
            }],
        }
    }
}

/// 직접 평가 응답
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectResponse {
    /// 이벤트별 판정 (요청 순서 유지)
    pub events: Vec<DirectTestResult>,
}

/// 심각도 레벨
///
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Info < Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// 정보성 이벤트
    #[default]
    Info,
    /// 낮은 심각도
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도
    High,
    /// 치명적 -- 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "informational" => Some(Self::Info),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }

    /// 직렬화용 대문자 이름을 반환합니다.
    pub fn as_upper_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "Info"),
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}
