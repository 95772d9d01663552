//! 설정 관리 -- sift.toml 파싱 및 런타임 설정
//!
//! [`SiftConfig`]는 모든 컴포넌트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SIFT_INGEST_RULE_DIR=/etc/sift/rules` 형식)
//! 3. 설정 파일 (`sift.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), sift_core::error::SiftError> {
//! use sift_core::config::SiftConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SiftConfig::load("sift.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SiftConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SiftError};

/// 한 라인의 최대 허용 크기 상한 (바이트)
const MAX_LINE_BYTES_LIMIT: usize = 64 * 1024 * 1024;

/// sift 통합 설정
///
/// `sift.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 컴포넌트는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiftConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 수집(ingest) 설정
    #[serde(default)]
    pub ingest: IngestConfig,
    /// 오브젝트 스토리지 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 하류 큐 설정
    #[serde(default)]
    pub queue: QueueConfig,
    /// 분석 결과 출력 설정
    #[serde(default)]
    pub output: OutputConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl SiftConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SiftError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SiftError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SiftError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SiftError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SiftError> {
        toml::from_str(toml_str).map_err(|e| {
            SiftError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SIFT_{SECTION}_{FIELD}`
    /// 예: `SIFT_STORAGE_ROOT=/data/logs`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SIFT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SIFT_GENERAL_LOG_FORMAT");

        // Ingest
        override_string(&mut self.ingest.rule_dir, "SIFT_INGEST_RULE_DIR");
        override_usize(
            &mut self.ingest.max_line_bytes,
            "SIFT_INGEST_MAX_LINE_BYTES",
        );

        // Storage
        override_string(&mut self.storage.root, "SIFT_STORAGE_ROOT");

        // Queue
        override_string(&mut self.queue.spool_dir, "SIFT_QUEUE_SPOOL_DIR");

        // Output
        override_string(&mut self.output.dir, "SIFT_OUTPUT_DIR");

        // Metrics
        override_bool(&mut self.metrics.enabled, "SIFT_METRICS_ENABLED");
        override_string(
            &mut self.metrics.textfile_path,
            "SIFT_METRICS_TEXTFILE_PATH",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SiftError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.ingest.max_line_bytes == 0 || self.ingest.max_line_bytes > MAX_LINE_BYTES_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "ingest.max_line_bytes".to_owned(),
                reason: format!("must be 1-{MAX_LINE_BYTES_LIMIT}"),
            }
            .into());
        }

        let required_paths = [
            ("ingest.rule_dir", &self.ingest.rule_dir),
            ("storage.root", &self.storage.root),
            ("queue.spool_dir", &self.queue.spool_dir),
            ("output.dir", &self.output.dir),
        ];
        for (field, value) in required_paths {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "path must not be empty".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 수집 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// 탐지 규칙 디렉토리
    pub rule_dir: String,
    /// 한 라인의 최대 크기 (바이트). 초과 라인은 파싱 실패로 처리
    pub max_line_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            rule_dir: "/etc/sift/rules".to_owned(),
            max_line_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// 오브젝트 스토리지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 버킷 디렉토리들이 위치한 루트 경로
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "/var/lib/sift/buckets".to_owned(),
        }
    }
}

/// 하류 큐 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// 매칭 배치 스풀 디렉토리
    pub spool_dir: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            spool_dir: "/var/spool/sift/matches".to_owned(),
        }
    }
}

/// 분석 결과 출력 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// 결과 오브젝트 출력 디렉토리
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "/var/lib/sift/output".to_owned(),
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 메트릭 레코더 활성화 여부
    pub enabled: bool,
    /// 실행 종료 시 Prometheus 텍스트 형식으로 기록할 파일 경로 (비어있으면 기록하지 않음)
    pub textfile_path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            textfile_path: String::new(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = SiftConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.ingest.max_line_bytes, 1024 * 1024);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        SiftConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = SiftConfig::parse("").unwrap();
        assert_eq!(config.ingest.rule_dir, "/etc/sift/rules");
        assert_eq!(config.storage.root, "/var/lib/sift/buckets");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml_str = r#"
[ingest]
rule_dir = "/opt/rules"

[metrics]
enabled = true
"#;
        let config = SiftConfig::parse(toml_str).unwrap();
        assert_eq!(config.ingest.rule_dir, "/opt/rules");
        // 지정하지 않은 필드는 기본값
        assert_eq!(config.ingest.max_line_bytes, 1024 * 1024);
        assert!(config.metrics.enabled);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = SiftConfig::parse("[general\nlog_level = ");
        assert!(matches!(
            result,
            Err(SiftError::Config(ConfigError::ParseFailed { .. }))
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = SiftConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = SiftConfig::default();
        config.general.log_format = "xml".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_line_bytes() {
        let mut config = SiftConfig::default();
        config.ingest.max_line_bytes = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_line_bytes"));
    }

    #[test]
    fn validate_rejects_empty_paths() {
        let mut config = SiftConfig::default();
        config.output.dir = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.dir"));
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_SIFT_STR", "overridden") };
        override_string(&mut val, "TEST_SIFT_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_SIFT_STR") };
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_SIFT_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_SIFT_BOOL_BAD");
        assert!(!val); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_SIFT_BOOL_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_usize() {
        let mut val = 10usize;
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_SIFT_USIZE", "4096") };
        override_usize(&mut val, "TEST_SIFT_USIZE");
        assert_eq!(val, 4096);
        unsafe { std::env::remove_var("TEST_SIFT_USIZE") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_SIFT_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = SiftConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = SiftConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.ingest.rule_dir, parsed.ingest.rule_dir);
        assert_eq!(config.queue.spool_dir, parsed.queue.spool_dir);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = SiftConfig::from_file("/nonexistent/path/sift.toml").await;
        assert!(matches!(
            result,
            Err(SiftError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
