//! 로그 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`SiftConfig`](sift_core::config::SiftConfig)를
//! 기반으로 파이프라인 구성요소가 사용하는 설정을 한 곳에 모읍니다.
//!
//! # 사용 예시
//! ```ignore
//! use sift_core::config::SiftConfig;
//! use sift_log_pipeline::config::PipelineConfig;
//!
//! let core_config = SiftConfig::default();
//! let config = PipelineConfig::from_core(&core_config);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::LogPipelineError;

/// 라인 길이 상한 (64MB)
const MAX_LINE_BYTES_LIMIT: usize = 64 * 1024 * 1024;

/// 로그 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 탐지 룰 디렉토리 경로
    pub rule_dir: String,
    /// 라인 하나의 최대 바이트 수
    pub max_line_bytes: usize,
    /// 오브젝트 스토리지 루트 디렉토리
    pub storage_root: String,
    /// 매칭 페이로드 스풀 디렉토리
    pub spool_dir: String,
    /// 분석 결과 출력 디렉토리
    pub output_dir: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rule_dir: "/etc/sift/rules".to_owned(),
            max_line_bytes: 1024 * 1024,
            storage_root: "/var/lib/sift/buckets".to_owned(),
            spool_dir: "/var/spool/sift/matches".to_owned(),
            output_dir: "/var/lib/sift/output".to_owned(),
        }
    }
}

impl PipelineConfig {
    /// core의 `SiftConfig`에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &sift_core::config::SiftConfig) -> Self {
        Self {
            rule_dir: core.ingest.rule_dir.clone(),
            max_line_bytes: core.ingest.max_line_bytes,
            storage_root: core.storage.root.clone(),
            spool_dir: core.queue.spool_dir.clone(),
            output_dir: core.output.dir.clone(),
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        if self.max_line_bytes == 0 || self.max_line_bytes > MAX_LINE_BYTES_LIMIT {
            return Err(LogPipelineError::Config {
                field: "max_line_bytes".to_owned(),
                reason: format!("must be 1-{MAX_LINE_BYTES_LIMIT}"),
            });
        }

        let paths = [
            ("rule_dir", &self.rule_dir),
            ("storage_root", &self.storage_root),
            ("spool_dir", &self.spool_dir),
            ("output_dir", &self.output_dir),
        ];
        for (field, value) in paths {
            if value.trim().is_empty() {
                return Err(LogPipelineError::Config {
                    field: field.to_owned(),
                    reason: "must not be empty".to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 룰 디렉토리를 설정합니다.
    pub fn rule_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.rule_dir = dir.into();
        self
    }

    /// 라인 최대 바이트 수를 설정합니다.
    pub fn max_line_bytes(mut self, bytes: usize) -> Self {
        self.config.max_line_bytes = bytes;
        self
    }

    /// 스토리지 루트를 설정합니다.
    pub fn storage_root(mut self, root: impl Into<String>) -> Self {
        self.config.storage_root = root.into();
        self
    }

    /// 스풀 디렉토리를 설정합니다.
    pub fn spool_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.spool_dir = dir.into();
        self
    }

    /// 결과 출력 디렉토리를 설정합니다.
    pub fn output_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
