//! 규칙 파일 로더 -- YAML 규칙 파일을 디스크에서 로드합니다.
//!
//! 규칙 디렉토리 내의 `.yml`/`.yaml` 파일을 스캔하고 파싱합니다.
//! 개별 파일 파싱 실패는 경고 로그를 남기고 건너뜁니다.
//!
//! `log_types`는 트리거 라우팅 키이자 결과 출력 경로의 세그먼트이므로,
//! 로더는 영문자/숫자/`.`/`_`/`-`로만 이루어진 이름만 받아들입니다.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::LogPipelineError;

use super::types::DetectionRule;

/// 규칙 파일 로더 설정
const MAX_RULE_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
const MAX_RULES_COUNT: usize = 10_000;
const MAX_LOG_TYPES_PER_RULE: usize = 64;
const MAX_LOG_TYPE_LEN: usize = 128;

/// 규칙 파일 로더
pub struct RuleLoader;

impl RuleLoader {
    /// 디렉토리에서 모든 YAML 규칙 파일을 로드합니다.
    ///
    /// `.yml` 또는 `.yaml` 확장자를 가진 파일만 파일명 순서로 처리합니다.
    /// 개별 파일 로딩 실패는 경고 로그를 남기고 건너뜁니다.
    ///
    /// # Errors
    /// - 디렉토리를 읽을 수 없는 경우
    /// - 규칙 수가 `MAX_RULES_COUNT`를 초과하는 경우
    pub async fn load_directory(
        dir: impl AsRef<Path>,
    ) -> Result<Vec<DetectionRule>, LogPipelineError> {
        let dir = dir.as_ref();
        let paths = Self::yaml_files(dir).await?;

        let mut rules = Vec::new();
        let mut seen_ids = HashSet::new();

        for path in paths {
            match Self::load_file(&path).await {
                Ok(rule) => {
                    // 중복 ID 검사
                    if seen_ids.contains(&rule.id) {
                        tracing::warn!(
                            rule_id = %rule.id,
                            path = %path.display(),
                            "duplicate rule id, skipping"
                        );
                        continue;
                    }
                    seen_ids.insert(rule.id.clone());
                    rules.push(rule);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load rule file, skipping"
                    );
                }
            }

            if rules.len() > MAX_RULES_COUNT {
                return Err(LogPipelineError::RuleLoad {
                    path: dir.display().to_string(),
                    reason: format!("too many rules: max {MAX_RULES_COUNT}"),
                });
            }
        }

        tracing::info!(
            dir = %dir.display(),
            count = rules.len(),
            "loaded detection rules"
        );

        Ok(rules)
    }

    async fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>, LogPipelineError> {
        let mut entries =
            tokio::fs::read_dir(dir)
                .await
                .map_err(|e| LogPipelineError::RuleLoad {
                    path: dir.display().to_string(),
                    reason: format!("failed to read directory: {e}"),
                })?;

        let mut paths = Vec::new();
        while let Some(entry) =
            entries
                .next_entry()
                .await
                .map_err(|e| LogPipelineError::RuleLoad {
                    path: dir.display().to_string(),
                    reason: format!("failed to read directory entry: {e}"),
                })?
        {
            let path = entry.path();

            // .yml / .yaml 확장자만 처리
            let is_yaml = path
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml");

            if is_yaml {
                paths.push(path);
            }
        }

        paths.sort();
        Ok(paths)
    }

    /// 단일 YAML 파일에서 규칙을 로드합니다.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<DetectionRule, LogPipelineError> {
        let path = path.as_ref();

        // 파일 크기 검증
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| LogPipelineError::RuleLoad {
                path: path.display().to_string(),
                reason: format!("failed to read file metadata: {e}"),
            })?;

        if metadata.len() > MAX_RULE_FILE_SIZE {
            return Err(LogPipelineError::RuleLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_RULE_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| LogPipelineError::RuleLoad {
                    path: path.display().to_string(),
                    reason: format!("failed to read file: {e}"),
                })?;

        Self::parse_yaml(&content, &path.display().to_string())
    }

    /// YAML 문자열을 파싱하여 규칙을 생성합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<DetectionRule, LogPipelineError> {
        let rule: DetectionRule =
            serde_yaml::from_str(yaml_str).map_err(|e| LogPipelineError::RuleLoad {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        // 유효성 검증
        rule.validate()?;
        Self::validate_log_types(&rule)?;

        Ok(rule)
    }

    /// 규칙의 `log_types`가 라우팅 키로 쓸 수 있는 이름인지 검증합니다.
    fn validate_log_types(rule: &DetectionRule) -> Result<(), LogPipelineError> {
        let invalid = |reason: String| LogPipelineError::RuleValidation {
            rule_id: rule.id.clone(),
            reason,
        };

        if rule.log_types.len() > MAX_LOG_TYPES_PER_RULE {
            return Err(invalid(format!(
                "too many log types: {} (max: {MAX_LOG_TYPES_PER_RULE})",
                rule.log_types.len()
            )));
        }

        let mut seen = HashSet::new();
        for log_type in &rule.log_types {
            let well_formed = !log_type.is_empty()
                && log_type.len() <= MAX_LOG_TYPE_LEN
                && !log_type.starts_with('.')
                && log_type
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
            if !well_formed {
                return Err(invalid(format!("invalid log type name '{log_type}'")));
            }
            if !seen.insert(log_type.as_str()) {
                return Err(invalid(format!("log type '{log_type}' listed twice")));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::types::Severity;

    const VALID_RULE: &str = r#"
id: root_login
title: Root Console Login
severity: high
log_types: [AWS.CloudTrail]
detection:
  conditions:
    - field: userIdentity.type
      value: Root
"#;

    #[test]
    fn parse_valid_yaml() {
        let rule = RuleLoader::parse_yaml(VALID_RULE, "test.yml").unwrap();
        assert_eq!(rule.id, "root_login");
        assert_eq!(rule.severity, Severity::High);
        assert_eq!(rule.log_types, vec!["AWS.CloudTrail".to_owned()]);
    }

    #[test]
    fn parse_invalid_yaml_returns_error() {
        let yaml = "not: [valid: yaml: {{{";
        let result = RuleLoader::parse_yaml(yaml, "bad.yml");
        assert!(matches!(result, Err(LogPipelineError::RuleLoad { .. })));
    }

    #[test]
    fn parse_yaml_with_empty_id() {
        let yaml = r#"
id: ""
detection:
  conditions: []
"#;
        let result = RuleLoader::parse_yaml(yaml, "empty_id.yml");
        assert!(matches!(
            result,
            Err(LogPipelineError::RuleValidation { .. })
        ));
    }

    #[test]
    fn malformed_log_type_names_are_rejected() {
        for bad in ["\"\"", "AWS/CloudTrail", "\"AWS CloudTrail\"", "..", ".hidden"] {
            let yaml = format!("id: r\nlog_types: [{bad}]\n");
            let err = RuleLoader::parse_yaml(&yaml, "bad_type.yml").unwrap_err();
            assert!(
                err.to_string().contains("invalid log type name"),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn repeated_log_type_is_rejected() {
        let yaml = "id: r\nlog_types: [Okta.SystemLog, Okta.SystemLog]\n";
        let err = RuleLoader::parse_yaml(yaml, "dup_type.yml").unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn too_many_log_types_are_rejected() {
        let types: Vec<String> = (0..=MAX_LOG_TYPES_PER_RULE)
            .map(|i| format!("Custom.Type{i}"))
            .collect();
        let yaml = format!("id: r\nlog_types: [{}]\n", types.join(", "));
        assert!(RuleLoader::parse_yaml(&yaml, "wide.yml").is_err());
    }

    #[tokio::test]
    async fn load_directory_skips_rules_with_bad_log_types() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.yml"), VALID_RULE).unwrap();
        std::fs::write(
            dir.path().join("b.yml"),
            "id: traversal\nlog_types: [\"../escape\"]\n",
        )
        .unwrap();

        let rules = RuleLoader::load_directory(dir.path()).await.unwrap();
        let ids: Vec<_> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["root_login"]);
    }

    #[tokio::test]
    async fn load_nonexistent_directory_returns_error() {
        let result = RuleLoader::load_directory("/nonexistent/path/rules").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn load_directory_skips_bad_files_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.yml"), VALID_RULE).unwrap();
        // 같은 ID -> 건너뜀
        std::fs::write(dir.path().join("b.yaml"), VALID_RULE).unwrap();
        std::fs::write(dir.path().join("c.yml"), "id: [broken").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "id: ignored").unwrap();
        std::fs::write(
            dir.path().join("d.yml"),
            "id: other\nstatus: disabled\n",
        )
        .unwrap();

        let rules = RuleLoader::load_directory(dir.path()).await.unwrap();
        let ids: Vec<_> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["root_login", "other"]);
    }
}
