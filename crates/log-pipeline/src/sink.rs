//! 로컬 결과 싱크 -- gzip JSON-lines 오브젝트로 분석 결과 영속화
//!
//! 그룹 하나당 오브젝트 하나를 다음 경로에 작성합니다.
//!
//! ```text
//! <output_dir>/rules/<log_type>/rule_id=<rule_id>/<UTC 타임스탬프>-<uuid>.json.gz
//! ```
//!
//! 각 라인은 원본 이벤트에 규칙 메타데이터(`p_rule_id`, `p_rule_title`,
//! `p_rule_tags`, `p_dedup_period_mins`, `p_severity`)와 `p_log_type`,
//! `p_alert_creation_time` 필드를 더한 JSON 객체이며,
//! 에러 결과에는 `p_rule_error`가 추가됩니다. 중복 제거 자체는 하류 알림 단계의 몫입니다.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::Value;
use sift_core::types::AnalysisResult;

use crate::buffer::{FlushReport, ResultBatch, ResultGroup, ResultSink};
use crate::error::LogPipelineError;

/// 로컬 디렉토리 결과 싱크
#[derive(Debug, Clone)]
pub struct LocalResultSink {
    output_dir: PathBuf,
}

impl LocalResultSink {
    /// 출력 디렉토리를 지정하여 싱크를 생성합니다.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 출력 디렉토리
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn object_path(&self, group: &ResultGroup, now: &DateTime<Utc>) -> PathBuf {
        self.output_dir
            .join("rules")
            .join(sanitize_segment(&group.log_type))
            .join(format!("rule_id={}", sanitize_segment(&group.rule_id)))
            .join(format!(
                "{}-{}.json.gz",
                now.format("%Y%m%dT%H%M%S%.3fZ"),
                uuid::Uuid::new_v4()
            ))
    }

    async fn write_group(
        &self,
        group: &ResultGroup,
        now: &DateTime<Utc>,
    ) -> Result<PathBuf, LogPipelineError> {
        let path = self.object_path(group, now);
        let created_at = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        for result in &group.results {
            let line = serde_json::to_vec(&enrich(result, &created_at))
                .map_err(|e| LogPipelineError::Sink(format!("serialize result: {e}")))?;
            encoder.write_all(&line)?;
            encoder.write_all(b"\n")?;
        }
        let compressed = encoder.finish()?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                LogPipelineError::Sink(format!("create {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&path, compressed)
            .await
            .map_err(|e| LogPipelineError::Sink(format!("write {}: {e}", path.display())))?;

        Ok(path)
    }
}

impl ResultSink for LocalResultSink {
    async fn persist(&self, batch: ResultBatch) -> Result<FlushReport, LogPipelineError> {
        if batch.is_empty() {
            tracing::info!("no results to persist");
            return Ok(FlushReport::default());
        }

        let now = Utc::now();
        let mut report = FlushReport::default();

        for group in batch.groups.iter().filter(|g| !g.results.is_empty()) {
            let path = self.write_group(group, &now).await?;
            tracing::debug!(
                rule_id = %group.rule_id,
                log_type = %group.log_type,
                results = group.results.len(),
                path = %path.display(),
                "result object written"
            );
            report.objects_written += 1;
            report.results_persisted += group.results.len();
        }

        tracing::info!(
            objects = report.objects_written,
            results = report.results_persisted,
            "results persisted"
        );

        Ok(report)
    }
}

/// 이벤트에 결과 메타데이터 필드를 추가합니다.
fn enrich(result: &AnalysisResult, created_at: &str) -> Value {
    let mut data = result.event.data.clone();
    data.insert("p_rule_id".to_owned(), Value::String(result.rule_id.clone()));
    data.insert(
        "p_rule_title".to_owned(),
        Value::String(result.rule_title.clone()),
    );
    data.insert(
        "p_rule_tags".to_owned(),
        Value::Array(result.rule_tags.iter().cloned().map(Value::String).collect()),
    );
    data.insert(
        "p_dedup_period_mins".to_owned(),
        Value::from(result.dedup_period_mins),
    );
    data.insert(
        "p_log_type".to_owned(),
        Value::String(result.log_type.clone()),
    );
    data.insert(
        "p_severity".to_owned(),
        Value::String(result.severity.as_upper_str().to_owned()),
    );
    data.insert(
        "p_alert_creation_time".to_owned(),
        Value::String(created_at.to_owned()),
    );
    if let Some(error) = &result.error {
        data.insert("p_rule_error".to_owned(), Value::String(error.clone()));
    }
    Value::Object(data)
}

/// 경로 세그먼트로 안전한 문자열로 변환합니다.
fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_owned(),
        _ => cleaned,
    }
}
