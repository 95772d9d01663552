//! sift.toml 통합 설정 테스트
//!
//! - sift.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use sift_core::config::SiftConfig;
use sift_core::error::{ConfigError, SiftError};

// =============================================================================
// sift.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../sift.toml.example");
    let config = SiftConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.ingest.rule_dir, "/etc/sift/rules");
    assert_eq!(config.ingest.max_line_bytes, 1_048_576);
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../sift.toml.example");
    let config = SiftConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../sift.toml.example");
    let from_file = SiftConfig::parse(content).expect("should parse");
    let from_code = SiftConfig::default();

    // 모든 기본값이 코드 Default 구현과 일치하는지 확인
    assert_eq!(from_file.general.log_level, from_code.general.log_level);
    assert_eq!(from_file.general.log_format, from_code.general.log_format);
    assert_eq!(from_file.ingest.rule_dir, from_code.ingest.rule_dir);
    assert_eq!(
        from_file.ingest.max_line_bytes,
        from_code.ingest.max_line_bytes
    );
    assert_eq!(from_file.storage.root, from_code.storage.root);
    assert_eq!(from_file.queue.spool_dir, from_code.queue.spool_dir);
    assert_eq!(from_file.output.dir, from_code.output.dir);
    assert_eq!(from_file.metrics.enabled, from_code.metrics.enabled);
    assert_eq!(
        from_file.metrics.textfile_path,
        from_code.metrics.textfile_path
    );
}

// =============================================================================
// 부분 설정 로딩 테스트
// =============================================================================

#[test]
fn partial_config_general_only() {
    let toml = r#"
[general]
log_level = "debug"
log_format = "pretty"
"#;
    let config = SiftConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.log_format, "pretty");
    // 나머지 섹션은 기본값
    assert_eq!(config.storage.root, "/var/lib/sift/buckets");
    assert!(!config.metrics.enabled);
}

#[test]
fn partial_config_two_sections() {
    let toml = r#"
[storage]
root = "/data/buckets"

[queue]
spool_dir = "/data/spool"
"#;
    let config = SiftConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.storage.root, "/data/buckets");
    assert_eq!(config.queue.spool_dir, "/data/spool");
    assert_eq!(config.output.dir, "/var/lib/sift/output");
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[general]
log_level = "debug"
"#;

    let original = std::env::var("SIFT_GENERAL_LOG_LEVEL").ok();
    // SAFETY: serial로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SIFT_GENERAL_LOG_LEVEL", "error");
    }

    let mut config = SiftConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.general.log_level.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SIFT_GENERAL_LOG_LEVEL", val),
            None => std::env::remove_var("SIFT_GENERAL_LOG_LEVEL"),
        }
    }

    assert_eq!(result, "error");
}

#[test]
#[serial_test::serial]
fn env_override_numeric_field() {
    let original = std::env::var("SIFT_INGEST_MAX_LINE_BYTES").ok();
    // SAFETY: serial로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SIFT_INGEST_MAX_LINE_BYTES", "2048");
    }

    let mut config = SiftConfig::default();
    config.apply_env_overrides();
    let result = config.ingest.max_line_bytes;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SIFT_INGEST_MAX_LINE_BYTES", val),
            None => std::env::remove_var("SIFT_INGEST_MAX_LINE_BYTES"),
        }
    }

    assert_eq!(result, 2048);
}

#[test]
#[serial_test::serial]
fn env_override_invalid_numeric_keeps_toml_value() {
    let toml = r#"
[ingest]
max_line_bytes = 4096
"#;

    let original = std::env::var("SIFT_INGEST_MAX_LINE_BYTES").ok();
    // SAFETY: serial로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SIFT_INGEST_MAX_LINE_BYTES", "lots");
    }

    let mut config = SiftConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.ingest.max_line_bytes;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SIFT_INGEST_MAX_LINE_BYTES", val),
            None => std::env::remove_var("SIFT_INGEST_MAX_LINE_BYTES"),
        }
    }

    assert_eq!(result, 4096);
}

#[test]
#[serial_test::serial]
fn env_override_bool_field() {
    let original = std::env::var("SIFT_METRICS_ENABLED").ok();
    // SAFETY: serial로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SIFT_METRICS_ENABLED", "true");
    }

    let mut config = SiftConfig::default();
    config.apply_env_overrides();
    let result = config.metrics.enabled;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SIFT_METRICS_ENABLED", val),
            None => std::env::remove_var("SIFT_METRICS_ENABLED"),
        }
    }

    assert!(result);
}

// =============================================================================
// 빈 파일 / 잘못된 형식 에러 테스트
// =============================================================================

#[test]
fn empty_string_parses_with_defaults() {
    let config = SiftConfig::parse("").expect("empty string should parse");
    config.validate().expect("should validate");
    assert_eq!(config.general.log_level, "info");
}

#[test]
fn comments_only_parses_with_defaults() {
    let toml = r#"
# 이것은 주석입니다
# 모든 줄이 주석입니다
"#;
    let config = SiftConfig::parse(toml).expect("comments-only should parse");
    config.validate().expect("should validate");
    assert_eq!(config.general.log_level, "info");
}

#[test]
fn malformed_toml_returns_parse_error() {
    let result = SiftConfig::parse("[invalid toml");
    assert!(matches!(
        result,
        Err(SiftError::Config(ConfigError::ParseFailed { .. }))
    ));
}

#[test]
fn wrong_type_for_numeric_field() {
    let toml = r#"
[ingest]
max_line_bytes = "big"
"#;
    assert!(SiftConfig::parse(toml).is_err());
}

#[test]
fn unknown_section_is_ignored() {
    let toml = r#"
[general]
log_level = "warn"

[unknown_section]
foo = "bar"
"#;
    let config = SiftConfig::parse(toml).expect("unknown sections should be ignored");
    assert_eq!(config.general.log_level, "warn");
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn from_file_nonexistent_returns_file_not_found() {
    let result = SiftConfig::from_file("/nonexistent/sift.toml").await;
    assert!(matches!(
        result,
        Err(SiftError::Config(ConfigError::FileNotFound { .. }))
    ));
}

#[tokio::test]
#[serial_test::serial]
async fn load_config_from_disk() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("sift.toml");
    std::fs::write(
        &path,
        "[ingest]\nrule_dir = \"/srv/rules\"\n[output]\ndir = \"/srv/out\"\n",
    )
    .expect("failed to write config");

    let config = SiftConfig::load(&path).await.expect("should load");
    assert_eq!(config.ingest.rule_dir, "/srv/rules");
    assert_eq!(config.output.dir, "/srv/out");
}
