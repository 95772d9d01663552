//! 탐지 규칙 데이터 타입
//!
//! YAML 규칙 파일에서 역직렬화되는 구조체들을 정의합니다.

use serde::{Deserialize, Deserializer, Serialize};
use sift_core::types::Severity;

use crate::error::LogPipelineError;

/// 규칙 ID 최대 길이
const MAX_RULE_ID_LEN: usize = 256;

/// 기본 중복 제거 기간 (분)
const DEFAULT_DEDUP_PERIOD_MINS: u64 = 60;

/// 탐지 규칙 -- 하나의 YAML 규칙 파일에 대응합니다.
///
/// # YAML 스키마
/// ```yaml
/// id: aws_console_root_login
/// title: Root Console Login
/// description: Root user signed in to the console
/// severity: high
/// status: enabled
/// log_types:
///   - AWS.CloudTrail
/// detection:
///   conditions:
///     - field: eventName
///       value: ConsoleLogin
///     - field: userIdentity.type
///       modifier: exact
///       value: Root
/// tags:
///   - authentication
/// dedup_period_mins: 60
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRule {
    /// 규칙 고유 ID
    pub id: String,
    /// 규칙 제목
    #[serde(default)]
    pub title: Option<String>,
    /// 규칙 설명
    #[serde(default)]
    pub description: String,
    /// 심각도
    #[serde(default, deserialize_with = "deserialize_severity")]
    pub severity: Severity,
    /// 규칙 상태
    #[serde(default)]
    pub status: RuleStatus,
    /// 적용 대상 로그 타입 (비어있으면 모든 로그 타입)
    #[serde(default)]
    pub log_types: Vec<String>,
    /// 탐지 조건
    #[serde(default)]
    pub detection: DetectionCondition,
    /// 분류 태그
    #[serde(default)]
    pub tags: Vec<String>,
    /// 하류 알림 중복 제거 기간 (분)
    #[serde(default = "default_dedup_period_mins")]
    pub dedup_period_mins: u64,
}

impl DetectionRule {
    /// 규칙의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        if self.id.trim().is_empty() {
            return Err(LogPipelineError::RuleValidation {
                rule_id: "(empty)".to_owned(),
                reason: "rule id must not be empty".to_owned(),
            });
        }

        if self.id.len() > MAX_RULE_ID_LEN {
            return Err(LogPipelineError::RuleValidation {
                rule_id: self.id.chars().take(32).collect(),
                reason: format!("rule id must not exceed {MAX_RULE_ID_LEN} characters"),
            });
        }

        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err(LogPipelineError::RuleValidation {
                rule_id: self.id.clone(),
                reason: "rule title must not be blank when present".to_owned(),
            });
        }

        for (idx, condition) in self.detection.conditions.iter().enumerate() {
            if condition.field.is_empty() {
                return Err(LogPipelineError::RuleValidation {
                    rule_id: self.id.clone(),
                    reason: format!("condition[{idx}] field must not be empty"),
                });
            }
        }

        Ok(())
    }

    /// 표시용 제목 (제목이 없으면 ID)
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// 규칙 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    /// 활성화 (기본값)
    #[default]
    Enabled,
    /// 비활성화
    Disabled,
    /// 테스트 모드 (평가는 수행하지만 배치 실행에서 매칭을 만들지 않음)
    Test,
}

/// 탐지 조건
///
/// `conditions`는 AND 로직으로 결합됩니다.
/// 모든 조건이 만족해야 규칙이 매칭됩니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionCondition {
    /// 필드 매칭 조건 목록 (AND 결합)
    #[serde(default)]
    pub conditions: Vec<FieldCondition>,
}

/// 필드 매칭 조건
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldCondition {
    /// 대상 필드 경로 (dot notation, 예: "userIdentity.type")
    pub field: String,
    /// 매칭 수정자
    #[serde(default)]
    pub modifier: ConditionModifier,
    /// 매칭할 값. 숫자/불리언 스칼라는 문자열로 정규화됩니다.
    #[serde(deserialize_with = "deserialize_scalar")]
    pub value: String,
}

/// 조건 수정자 -- 매칭 방식을 결정합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionModifier {
    /// 정확히 일치
    #[default]
    Exact,
    /// 부분 문자열 포함
    Contains,
    /// 접두사 일치
    StartsWith,
    /// 접미사 일치
    EndsWith,
    /// 정규식 매칭
    Regex,
}

fn default_dedup_period_mins() -> u64 {
    DEFAULT_DEDUP_PERIOD_MINS
}

/// `high`, `HIGH`, `High` 모두 허용
fn deserialize_severity<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Severity::from_str_loose(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown severity '{raw}'")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

fn deserialize_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Str(s) => s,
    })
}
