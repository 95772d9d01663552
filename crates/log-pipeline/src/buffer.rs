//! 분석 결과 버퍼링 -- 인메모리 누적 및 단일 플러시
//!
//! [`OutputBuffer`]는 배치 실행 동안 규칙 엔진이 돌려준 결과를 모아두었다가,
//! 실행 마지막에 한 번 [`ResultSink`]로 넘깁니다.
//!
//! 결과는 `(rule_id, log_type)` 단위로 그룹화되며 그룹 순서와 그룹 내 순서는
//! 추가된 순서를 따릅니다. `flush`는 버퍼를 소비하므로 한 버퍼는 정확히 한 번만
//! 플러시됩니다.

use std::collections::HashMap;
use std::future::Future;
use std::io;

use sift_core::metrics as m;
use sift_core::types::AnalysisResult;

use crate::error::LogPipelineError;

/// 같은 규칙/로그 타입의 결과 묶음
#[derive(Debug, Clone)]
pub struct ResultGroup {
    /// 규칙 ID
    pub rule_id: String,
    /// 로그 타입
    pub log_type: String,
    /// 추가 순서대로 보관된 결과
    pub results: Vec<AnalysisResult>,
}

/// 싱크로 전달되는 결과 묶음 전체
#[derive(Debug, Clone, Default)]
pub struct ResultBatch {
    /// 그룹 목록 (처음 등장한 순서)
    pub groups: Vec<ResultGroup>,
}

impl ResultBatch {
    /// 결과가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.results.is_empty())
    }

    /// 전체 결과 수
    pub fn result_count(&self) -> usize {
        self.groups.iter().map(|g| g.results.len()).sum()
    }
}

/// 영속화 결과 요약
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// 작성된 오브젝트 수
    pub objects_written: usize,
    /// 영속화된 결과 수
    pub results_persisted: usize,
}

/// 결과 영속화 대상
pub trait ResultSink: Send + Sync + 'static {
    /// 결과 묶음을 영속화합니다. 빈 묶음도 전달될 수 있습니다.
    fn persist(
        &self,
        batch: ResultBatch,
    ) -> impl Future<Output = Result<FlushReport, LogPipelineError>> + Send;
}

/// 분석 결과 인메모리 버퍼
#[derive(Debug, Default)]
pub struct OutputBuffer {
    groups: Vec<ResultGroup>,
    /// (rule_id, log_type) -> groups 인덱스
    index: HashMap<(String, String), usize>,
    matched: usize,
    errored: usize,
    approx_bytes: usize,
}

impl OutputBuffer {
    /// 빈 버퍼를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 결과를 추가합니다.
    pub fn add_result(&mut self, result: AnalysisResult) {
        if result.is_error() {
            self.errored += 1;
        } else if result.is_match() {
            self.matched += 1;
        }
        self.approx_bytes += estimate_size(&result);

        let key = (result.rule_id.clone(), result.log_type.clone());
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.groups.len();
                self.groups.push(ResultGroup {
                    rule_id: key.0.clone(),
                    log_type: key.1.clone(),
                    results: Vec::new(),
                });
                self.index.insert(key, idx);
                idx
            }
        };
        self.groups[idx].results.push(result);
    }

    /// 버퍼에 담긴 결과 수
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.results.len()).sum()
    }

    /// 버퍼가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 그룹 수
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// 매칭 결과 수
    pub fn matched_count(&self) -> usize {
        self.matched
    }

    /// 에러 결과 수
    pub fn errored_count(&self) -> usize {
        self.errored
    }

    /// 직렬화 기준 대략적인 크기 (바이트)
    pub fn approx_bytes(&self) -> usize {
        self.approx_bytes
    }

    /// 모든 결과를 싱크에 넘깁니다.
    ///
    /// 버퍼가 비어있어도 싱크는 정확히 한 번 호출됩니다.
    pub async fn flush<S: ResultSink>(self, sink: &S) -> Result<FlushReport, LogPipelineError> {
        tracing::debug!(
            groups = self.groups.len(),
            matched = self.matched,
            errored = self.errored,
            approx_bytes = self.approx_bytes,
            "flushing output buffer"
        );

        let report = sink
            .persist(ResultBatch {
                groups: self.groups,
            })
            .await?;

        metrics::counter!(m::OUTPUT_FLUSHES_TOTAL).increment(1);
        metrics::counter!(m::OUTPUT_RESULTS_PERSISTED_TOTAL)
            .increment(report.results_persisted as u64);
        metrics::counter!(m::OUTPUT_OBJECTS_WRITTEN_TOTAL)
            .increment(report.objects_written as u64);

        Ok(report)
    }
}

/// 직렬화 바이트 수를 세는 writer
struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn estimate_size(result: &AnalysisResult) -> usize {
    let mut counter = ByteCounter(0);
    // 카운터 writer는 실패하지 않음
    let _ = serde_json::to_writer(&mut counter, &result.event.data);
    counter.0
        + result.rule_id.len()
        + result.log_type.len()
        + result.rule_title.len()
        + result.rule_tags.iter().map(String::len).sum::<usize>()
        + result.error.as_ref().map_or(0, String::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use serde_json::Map;
    use sift_core::types::{DecodedEvent, Severity};

    /// 전달된 배치를 기록하는 테스트용 싱크
    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<ResultBatch>>,
    }

    impl ResultSink for RecordingSink {
        async fn persist(&self, batch: ResultBatch) -> Result<FlushReport, LogPipelineError> {
            let report = FlushReport {
                objects_written: batch.groups.len(),
                results_persisted: batch.result_count(),
            };
            self.batches.lock().unwrap().push(batch);
            Ok(report)
        }
    }

    fn result(rule_id: &str, log_type: &str, matched: bool, error: Option<&str>) -> AnalysisResult {
        AnalysisResult {
            rule_id: rule_id.to_owned(),
            log_type: log_type.to_owned(),
            severity: Severity::Low,
            rule_title: rule_id.to_owned(),
            rule_tags: Vec::new(),
            dedup_period_mins: 60,
            matched,
            error: error.map(str::to_owned),
            event: Arc::new(DecodedEvent::new(log_type, Map::new())),
        }
    }

    #[test]
    fn groups_by_rule_and_log_type_in_insertion_order() {
        let mut buf = OutputBuffer::new();
        buf.add_result(result("r2", "T1", true, None));
        buf.add_result(result("r1", "T1", true, None));
        buf.add_result(result("r2", "T1", true, None));
        buf.add_result(result("r2", "T2", false, Some("boom")));

        assert_eq!(buf.len(), 4);
        assert_eq!(buf.group_count(), 3);
        assert_eq!(buf.matched_count(), 3);
        assert_eq!(buf.errored_count(), 1);
        assert!(buf.approx_bytes() > 0);

        let keys: Vec<_> = buf
            .groups
            .iter()
            .map(|g| (g.rule_id.as_str(), g.log_type.as_str(), g.results.len()))
            .collect();
        assert_eq!(keys, vec![("r2", "T1", 2), ("r1", "T1", 1), ("r2", "T2", 1)]);
    }

    #[tokio::test]
    async fn flush_empty_buffer_still_calls_sink() {
        let sink = RecordingSink::default();
        let report = OutputBuffer::new().flush(&sink).await.unwrap();
        assert_eq!(report, FlushReport::default());

        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_empty());
    }

    #[tokio::test]
    async fn flush_hands_over_everything_once() {
        let sink = RecordingSink::default();
        let mut buf = OutputBuffer::new();
        buf.add_result(result("r1", "T", true, None));
        buf.add_result(result("r1", "T", true, None));

        let report = buf.flush(&sink).await.unwrap();
        assert_eq!(report.results_persisted, 2);
        assert_eq!(sink.batches.lock().unwrap()[0].result_count(), 2);
    }
}
