//! 직접 평가용 규칙 컴파일러
//!
//! 요청 본문에 담긴 YAML 규칙을 [`CompiledRule`]로 컴파일합니다.
//! 요청의 규칙 ID가 본문의 `id`보다 우선합니다.

use sift_core::error::{DispatchError, SiftError};
use sift_core::pipeline::RuleCompiler;

use super::matcher::CompiledRule;
use super::types::DetectionRule;

/// YAML 규칙 컴파일러
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlRuleCompiler;

impl YamlRuleCompiler {
    /// 새 컴파일러를 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

impl RuleCompiler for YamlRuleCompiler {
    type Rule = CompiledRule;

    fn compile(&self, id: &str, body: &str) -> Result<CompiledRule, SiftError> {
        let mut value: serde_yaml::Value = serde_yaml::from_str(body)
            .map_err(|e| rule_error(format!("YAML parse error: {e}")))?;

        let serde_yaml::Value::Mapping(mapping) = &mut value else {
            return Err(rule_error("rule body must be a YAML mapping".to_owned()));
        };
        mapping.insert(
            serde_yaml::Value::String("id".to_owned()),
            serde_yaml::Value::String(id.to_owned()),
        );

        let rule: DetectionRule = serde_yaml::from_value(value)
            .map_err(|e| rule_error(format!("invalid rule definition: {e}")))?;

        CompiledRule::compile(rule).map_err(|e| rule_error(e.to_string()))
    }
}

fn rule_error(reason: String) -> SiftError {
    SiftError::Dispatch(DispatchError::Rule(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};
    use sift_core::pipeline::Rule;

    fn event(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn compile_overrides_body_id() {
        let body = r#"
id: from_body
detection:
  conditions:
    - field: user
      value: root
"#;
        let rule = YamlRuleCompiler::new().compile("from_request", body).unwrap();
        assert_eq!(rule.id(), "from_request");
        assert!(rule.run(&event(json!({"user": "root"}))).matched);
    }

    #[test]
    fn compile_without_body_id() {
        let rule = YamlRuleCompiler::new()
            .compile("r1", "severity: low\n")
            .unwrap();
        assert_eq!(rule.id(), "r1");
        assert!(rule.run(&Map::new()).matched);
    }

    #[test]
    fn compile_rejects_non_mapping_body() {
        let err = YamlRuleCompiler::new()
            .compile("r1", "- just\n- a list\n")
            .unwrap_err();
        assert!(matches!(err, SiftError::Dispatch(DispatchError::Rule(_))));
    }

    #[test]
    fn compile_rejects_bad_regex() {
        let body = r#"
detection:
  conditions:
    - field: a
      modifier: regex
      value: "(unclosed"
"#;
        let err = YamlRuleCompiler::new().compile("r1", body).unwrap_err();
        assert!(err.to_string().contains("invalid regex"));
    }

    #[test]
    fn compile_rejects_malformed_yaml() {
        assert!(YamlRuleCompiler::new().compile("r1", "{{{").is_err());
    }
}
