//! 규칙 매칭 로직 -- 조건 평가 및 정규식 사전 컴파일
//!
//! [`CompiledRule`]은 검증된 [`DetectionRule`]과 미리 컴파일된 정규식을 묶어
//! core의 [`Rule`] trait을 구현합니다. 정규식은 규칙 로딩 시 한 번만 컴파일합니다.

use regex::Regex;
use serde_json::{Map, Value};
use sift_core::pipeline::Rule;
use sift_core::types::{RuleRun, Severity, lookup_path};

use super::types::{ConditionModifier, DetectionRule, FieldCondition, RuleStatus};
use crate::error::LogPipelineError;

/// 실행 가능한 탐지 규칙
pub struct CompiledRule {
    rule: DetectionRule,
    /// 조건별 정규식 (Regex 수정자가 아닌 조건은 None)
    regexes: Vec<Option<Regex>>,
}

impl CompiledRule {
    /// 규칙을 검증하고 정규식 조건을 컴파일합니다.
    ///
    /// 잘못된 정규식이 하나라도 있으면 규칙 전체가 거부됩니다.
    pub fn compile(rule: DetectionRule) -> Result<Self, LogPipelineError> {
        rule.validate()?;

        let mut regexes = Vec::with_capacity(rule.detection.conditions.len());
        for (idx, condition) in rule.detection.conditions.iter().enumerate() {
            if condition.modifier == ConditionModifier::Regex {
                let regex =
                    Regex::new(&condition.value).map_err(|e| LogPipelineError::RuleValidation {
                        rule_id: rule.id.clone(),
                        reason: format!(
                            "invalid regex in condition[{idx}] for field '{}': {e}",
                            condition.field
                        ),
                    })?;
                regexes.push(Some(regex));
            } else {
                regexes.push(None);
            }
        }

        Ok(Self { rule, regexes })
    }

    /// 원본 규칙 정의
    pub fn definition(&self) -> &DetectionRule {
        &self.rule
    }

    /// 규칙 상태
    pub fn status(&self) -> RuleStatus {
        self.rule.status
    }

    fn evaluate_condition(
        &self,
        idx: usize,
        condition: &FieldCondition,
        field_value: &str,
    ) -> bool {
        match condition.modifier {
            ConditionModifier::Exact => field_value == condition.value,

            ConditionModifier::Contains => field_value.contains(&condition.value),

            ConditionModifier::StartsWith => field_value.starts_with(&condition.value),

            ConditionModifier::EndsWith => field_value.ends_with(&condition.value),

            ConditionModifier::Regex => self
                .regexes
                .get(idx)
                .and_then(Option::as_ref)
                .is_some_and(|regex| regex.is_match(field_value)),
        }
    }
}

impl Rule for CompiledRule {
    fn id(&self) -> &str {
        &self.rule.id
    }

    fn log_types(&self) -> &[String] {
        &self.rule.log_types
    }

    fn severity(&self) -> Severity {
        self.rule.severity
    }

    /// 모든 조건이 AND 결합이므로, 하나라도 실패하면 미매칭입니다.
    /// 조건이 비어있으면 모든 이벤트에 매칭됩니다.
    fn run(&self, event: &Map<String, Value>) -> RuleRun {
        for (idx, condition) in self.rule.detection.conditions.iter().enumerate() {
            let field_value = match lookup_path(event, &condition.field) {
                None | Some(Value::Null) => return RuleRun::matched(false),
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                Some(Value::Object(_) | Value::Array(_)) => {
                    return RuleRun::failed(format!(
                        "field '{}' is not a scalar",
                        condition.field
                    ));
                }
            };

            if !self.evaluate_condition(idx, condition, &field_value) {
                return RuleRun::matched(false);
            }
        }

        RuleRun::matched(true)
    }
}

impl std::fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRule")
            .field("id", &self.rule.id)
            .field("status", &self.rule.status)
            .field("conditions", &self.rule.detection.conditions.len())
            .finish()
    }
}
