//! 배치 수집 오케스트레이션 -- 트리거부터 플러시까지의 전체 흐름을 관리합니다.
//!
//! [`IngestionPipeline`]은 트리거 메시지 하나를 받아 참조된 오브젝트를 순서대로
//! 스트리밍하고, 각 라인을 파싱하여 규칙 엔진에 디스패치한 뒤,
//! 매칭된 원본 라인을 하류로 한 번에 전달하고 결과 버퍼를 플러시합니다.
//!
//! # 처리 흐름
//! ```text
//! TriggerEvent -> parse_batch -> GroupedReferences
//!     -> ObjectStore -> LogStream -> EventParser -> RuleDispatcher
//!     -> OutputBuffer (모든 결과) + matched payloads (매칭된 라인)
//!     -> MatchForwarder::send (매칭이 있을 때만) -> OutputBuffer::flush (항상)
//! ```
//!
//! # 에러 정책
//! - 파싱 실패 (라인 단위): 종류와 위치만 기록하고 다음 라인으로 진행
//! - 규칙 단위 실패: 결과의 `error` 필드로 버퍼에 기록
//! - 그 외 (스토리지, 압축 해제, 디스패처, 전송, 싱크, 트리거): 실행 전체 중단.
//!   중단 시점까지 버퍼에 쌓인 결과는 플러시되지 않습니다.
//!
//! 하류 전송은 실행 마지막에 한 번 일어나므로, 같은 트리거가 재전달되면
//! 같은 페이로드가 다시 전송됩니다. 파이프라인은 중복 제거를 하지 않습니다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sift_core::metrics as m;
use sift_core::types::{DecodedEvent, StorageLocator, TriggerEvent};

use crate::buffer::{OutputBuffer, ResultSink};
use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::forward::MatchForwarder;
use crate::parser::EventParser;
use crate::rule::RuleDispatcher;
use crate::storage::ObjectStore;
use crate::stream::{RawLine, open_log_stream};
use crate::trigger::{GroupedReferences, parse_batch};

/// 블로킹 스레드에서 한 번에 읽는 최대 라인 수
const LINES_PER_CHUNK: usize = 512;

/// 블로킹 스레드에서 한 번에 읽는 라인 내용의 바이트 상한
const CHUNK_BYTES: usize = 4 * 1024 * 1024;

/// 배치 실행 요약
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 열린 오브젝트 수
    pub objects_read: usize,
    /// 읽은 라인 수 (빈 라인 포함)
    pub lines_read: usize,
    /// 규칙 엔진에 디스패치된 이벤트 수
    pub events_dispatched: usize,
    /// 파싱 실패 라인 수
    pub parse_errors: usize,
    /// 버퍼에 추가된 결과 수
    pub results_buffered: usize,
    /// 규칙 평가 에러 수
    pub rule_errors: usize,
    /// 매칭되어 하류로 전달된 페이로드 수
    pub matched_payloads: usize,
    /// 하류 전송 여부
    pub forwarded: bool,
    /// 실행 소요 시간
    pub elapsed: Duration,
}

/// 한 번의 실행 동안만 유지되는 상태
#[derive(Default)]
struct RunState {
    buffer: OutputBuffer,
    matched: Vec<String>,
    summary: RunSummary,
}

/// 배치 수집 파이프라인
///
/// 실행 간에 공유되는 가변 상태가 없으므로 하나의 값을 여러 번 순차 실행할 수 있습니다.
/// 각 실행은 자신만의 버퍼와 매칭 목록을 만듭니다.
///
/// # 사용 예시
/// ```ignore
/// let pipeline = IngestionPipelineBuilder::new()
///     .config(config)
///     .store(Arc::new(LocalObjectStore::new("/var/lib/sift/buckets")))
///     .dispatcher(Arc::new(engine))
///     .forwarder(Arc::new(JsonLinesForwarder::new("/var/spool/sift/matches")))
///     .sink(Arc::new(LocalResultSink::new("/var/lib/sift/output")))
///     .build()?;
///
/// let summary = pipeline.run(&trigger).await?;
/// ```
pub struct IngestionPipeline<S, D, F, K> {
    store: Arc<S>,
    dispatcher: Arc<D>,
    forwarder: Arc<F>,
    sink: Arc<K>,
    parser: EventParser,
    max_line_bytes: usize,
}

impl<S, D, F, K> IngestionPipeline<S, D, F, K>
where
    S: ObjectStore,
    D: RuleDispatcher,
    F: MatchForwarder,
    K: ResultSink,
{
    /// 트리거 메시지 하나를 처리합니다.
    pub async fn run(&self, trigger: &TriggerEvent) -> Result<RunSummary, LogPipelineError> {
        let start = Instant::now();
        metrics::counter!(m::INGEST_RUNS_TOTAL).increment(1);

        let result = self.run_inner(trigger, start).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "batch run aborted, nothing flushed");
        }
        result
    }

    async fn run_inner(
        &self,
        trigger: &TriggerEvent,
        start: Instant,
    ) -> Result<RunSummary, LogPipelineError> {
        let grouped: GroupedReferences = parse_batch(trigger)?.into_iter().collect();
        tracing::info!(
            log_types = grouped.log_type_count(),
            objects = grouped.reference_count(),
            "batch run started"
        );

        let mut state = RunState::default();

        for (log_type, locators) in grouped.iter() {
            for locator in locators {
                self.process_object(log_type, locator, &mut state).await?;
            }
        }

        let RunState {
            buffer,
            matched,
            mut summary,
        } = state;

        summary.matched_payloads = matched.len();
        summary.results_buffered = buffer.len();

        if matched.is_empty() {
            tracing::info!("no matches found");
        } else {
            tracing::info!("sending {} matches", matched.len());
            self.forwarder.send(matched).await?;
            summary.forwarded = true;
            metrics::counter!(m::INGEST_FORWARDS_TOTAL).increment(1);
            metrics::counter!(m::INGEST_MATCHED_PAYLOADS_TOTAL)
                .increment(summary.matched_payloads as u64);
        }

        buffer.flush(self.sink.as_ref()).await?;

        summary.elapsed = start.elapsed();
        metrics::histogram!(m::INGEST_RUN_DURATION_SECONDS).record(summary.elapsed.as_secs_f64());

        tracing::info!(
            objects = summary.objects_read,
            lines = summary.lines_read,
            dispatched = summary.events_dispatched,
            parse_errors = summary.parse_errors,
            rule_errors = summary.rule_errors,
            "matched {} events in {:.3} seconds",
            summary.matched_payloads,
            summary.elapsed.as_secs_f64()
        );

        Ok(summary)
    }

    async fn process_object(
        &self,
        log_type: &str,
        locator: &StorageLocator,
        state: &mut RunState,
    ) -> Result<(), LogPipelineError> {
        tracing::debug!(
            bucket = %locator.bucket,
            key = %locator.key,
            log_type,
            "loading object"
        );

        let mut stream = open_log_stream(self.store.as_ref(), locator, self.max_line_bytes).await?;
        state.summary.objects_read += 1;
        metrics::counter!(m::INGEST_OBJECTS_OPENED_TOTAL).increment(1);

        loop {
            let (next, chunk) = stream
                .read_chunk(LINES_PER_CHUNK, CHUNK_BYTES)
                .await?;
            stream = next;
            if chunk.is_empty() {
                break;
            }

            for (number, item) in chunk {
                state.summary.lines_read += 1;
                metrics::counter!(m::INGEST_LINES_READ_TOTAL).increment(1);

                let line = match item {
                    Ok(line) => line,
                    Err(e) if e.is_recoverable() => {
                        record_parse_error(&e, log_type, locator, number, state);
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                if line.is_blank() {
                    continue;
                }

                let event = match self.parser.parse(log_type, &line.text) {
                    Ok(event) => event,
                    Err(e) => {
                        record_parse_error(&e, log_type, locator, line.number, state);
                        continue;
                    }
                };

                self.dispatch(log_type, event, line, state).await?;
            }
        }

        Ok(())
    }

    async fn dispatch(
        &self,
        log_type: &str,
        event: DecodedEvent,
        line: RawLine,
        state: &mut RunState,
    ) -> Result<(), LogPipelineError> {
        let results = self.dispatcher.analyze(log_type, Arc::new(event)).await?;
        state.summary.events_dispatched += 1;
        metrics::counter!(m::INGEST_EVENTS_DISPATCHED_TOTAL, m::LABEL_LOG_TYPE => log_type.to_owned())
            .increment(1);

        let mut any_match = false;
        for result in results {
            if result.is_error() {
                state.summary.rule_errors += 1;
                metrics::counter!(m::INGEST_RULE_ERRORS_TOTAL).increment(1);
                tracing::warn!(
                    rule_id = %result.rule_id,
                    log_type,
                    line = line.number,
                    "rule evaluation failed"
                );
            } else if result.is_match() {
                any_match = true;
                metrics::counter!(m::INGEST_RULE_MATCHES_TOTAL).increment(1);
            }
            state.buffer.add_result(result);
        }

        // 여러 규칙이 매칭되어도 라인은 한 번만 추가
        if any_match {
            state.matched.push(line.text);
        }
        Ok(())
    }
}

fn record_parse_error(
    err: &LogPipelineError,
    log_type: &str,
    locator: &StorageLocator,
    line: usize,
    state: &mut RunState,
) {
    let kind = err.parse_kind().map_or("unknown", |k| k.as_str());
    // 원본 내용은 절대 기록하지 않음
    tracing::error!(
        kind,
        log_type,
        bucket = %locator.bucket,
        key = %locator.key,
        line,
        error = %err,
        "data is not valid JSON"
    );
    state.summary.parse_errors += 1;
    metrics::counter!(m::INGEST_PARSE_ERRORS_TOTAL, m::LABEL_PARSE_KIND => kind).increment(1);
}

/// 수집 파이프라인 빌더
///
/// 스토리지, 디스패처, 전송기, 싱크는 필수입니다.
pub struct IngestionPipelineBuilder<S, D, F, K> {
    config: PipelineConfig,
    store: Option<Arc<S>>,
    dispatcher: Option<Arc<D>>,
    forwarder: Option<Arc<F>>,
    sink: Option<Arc<K>>,
}

impl<S, D, F, K> IngestionPipelineBuilder<S, D, F, K>
where
    S: ObjectStore,
    D: RuleDispatcher,
    F: MatchForwarder,
    K: ResultSink,
{
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            store: None,
            dispatcher: None,
            forwarder: None,
            sink: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 오브젝트 스토리지를 지정합니다.
    pub fn store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    /// 규칙 디스패처를 지정합니다.
    pub fn dispatcher(mut self, dispatcher: Arc<D>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// 하류 전송기를 지정합니다.
    pub fn forwarder(mut self, forwarder: Arc<F>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    /// 결과 싱크를 지정합니다.
    pub fn sink(mut self, sink: Arc<K>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 파이프라인을 빌드합니다.
    pub fn build(self) -> Result<IngestionPipeline<S, D, F, K>, LogPipelineError> {
        self.config.validate()?;

        Ok(IngestionPipeline {
            store: self.store.ok_or_else(|| missing("store"))?,
            dispatcher: self.dispatcher.ok_or_else(|| missing("dispatcher"))?,
            forwarder: self.forwarder.ok_or_else(|| missing("forwarder"))?,
            sink: self.sink.ok_or_else(|| missing("sink"))?,
            parser: EventParser::new().with_max_input_size(self.config.max_line_bytes),
            max_line_bytes: self.config.max_line_bytes,
        })
    }
}

impl<S, D, F, K> Default for IngestionPipelineBuilder<S, D, F, K>
where
    S: ObjectStore,
    D: RuleDispatcher,
    F: MatchForwarder,
    K: ResultSink,
{
    fn default() -> Self {
        Self::new()
    }
}

fn missing(component: &str) -> LogPipelineError {
    LogPipelineError::Config {
        field: component.to_owned(),
        reason: "required component not set".to_owned(),
    }
}
