//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `sift_`
//! - 모듈명: `ingest_`, `output_`, `direct_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(sift_core::metrics::INGEST_LINES_READ_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 로그 타입 레이블 키
pub const LABEL_LOG_TYPE: &str = "log_type";

/// 파싱 에러 종류 레이블 키 (syntax, eof, data, not_object, too_large, utf8)
pub const LABEL_PARSE_KIND: &str = "kind";

/// 결과 레이블 키 (matched, not_matched, errored)
pub const LABEL_RESULT: &str = "result";

// ─── Ingest 메트릭 ──────────────────────────────────────────────────

/// Ingest: 처리 시작한 배치 실행 수 (counter)
pub const INGEST_RUNS_TOTAL: &str = "sift_ingest_runs_total";

/// Ingest: 열린 오브젝트 수 (counter)
pub const INGEST_OBJECTS_OPENED_TOTAL: &str = "sift_ingest_objects_opened_total";

/// Ingest: 읽은 라인 수 (counter)
pub const INGEST_LINES_READ_TOTAL: &str = "sift_ingest_lines_read_total";

/// Ingest: 파싱 에러 수 (counter, label: kind)
pub const INGEST_PARSE_ERRORS_TOTAL: &str = "sift_ingest_parse_errors_total";

/// Ingest: 규칙 엔진에 디스패치된 이벤트 수 (counter, label: log_type)
pub const INGEST_EVENTS_DISPATCHED_TOTAL: &str = "sift_ingest_events_dispatched_total";

/// Ingest: 규칙 매칭 수 (counter)
pub const INGEST_RULE_MATCHES_TOTAL: &str = "sift_ingest_rule_matches_total";

/// Ingest: 규칙 평가 에러 수 (counter)
pub const INGEST_RULE_ERRORS_TOTAL: &str = "sift_ingest_rule_errors_total";

/// Ingest: 하류로 전달된 매칭 페이로드 수 (counter)
pub const INGEST_MATCHED_PAYLOADS_TOTAL: &str = "sift_ingest_matched_payloads_total";

/// Ingest: 하류 전송 호출 수 (counter)
pub const INGEST_FORWARDS_TOTAL: &str = "sift_ingest_forwards_total";

/// Ingest: 배치 실행 소요 시간 (histogram, 초)
pub const INGEST_RUN_DURATION_SECONDS: &str = "sift_ingest_run_duration_seconds";

// ─── Output 메트릭 ──────────────────────────────────────────────────

/// Output: 버퍼 플러시 수 (counter)
pub const OUTPUT_FLUSHES_TOTAL: &str = "sift_output_flushes_total";

/// Output: 영속화된 결과 수 (counter)
pub const OUTPUT_RESULTS_PERSISTED_TOTAL: &str = "sift_output_results_persisted_total";

/// Output: 작성된 결과 오브젝트 수 (counter)
pub const OUTPUT_OBJECTS_WRITTEN_TOTAL: &str = "sift_output_objects_written_total";

// ─── Direct 메트릭 ──────────────────────────────────────────────────

/// Direct: 평가된 이벤트 수 (counter, label: result)
pub const DIRECT_EVENTS_EVALUATED_TOTAL: &str = "sift_direct_events_evaluated_total";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 배치 실행 소요 시간 히스토그램 버킷 (초)
///
/// 10ms ~ 900s 범위 (호스팅 런타임의 실행 제한 시간까지)
pub const RUN_DURATION_BUCKETS: [f64; 10] =
    [0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 60.0, 300.0, 900.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(INGEST_RUNS_TOTAL, "Total number of batch ingestion runs");
    describe_counter!(
        INGEST_OBJECTS_OPENED_TOTAL,
        "Total number of compressed log objects opened from storage"
    );
    describe_counter!(
        INGEST_LINES_READ_TOTAL,
        "Total number of lines read from decompressed log streams"
    );
    describe_counter!(
        INGEST_PARSE_ERRORS_TOTAL,
        "Total number of lines that failed to decode as JSON events"
    );
    describe_counter!(
        INGEST_EVENTS_DISPATCHED_TOTAL,
        "Total number of events dispatched to the rule engine"
    );
    describe_counter!(
        INGEST_RULE_MATCHES_TOTAL,
        "Total number of positive rule results"
    );
    describe_counter!(
        INGEST_RULE_ERRORS_TOTAL,
        "Total number of rule evaluation errors reported by the engine"
    );
    describe_counter!(
        INGEST_MATCHED_PAYLOADS_TOTAL,
        "Total number of matched raw payloads forwarded downstream"
    );
    describe_counter!(
        INGEST_FORWARDS_TOTAL,
        "Total number of downstream forward calls"
    );
    describe_histogram!(
        INGEST_RUN_DURATION_SECONDS,
        "Wall-clock time of a single batch ingestion run in seconds"
    );

    describe_counter!(OUTPUT_FLUSHES_TOTAL, "Total number of output buffer flushes");
    describe_counter!(
        OUTPUT_RESULTS_PERSISTED_TOTAL,
        "Total number of analysis results persisted"
    );
    describe_counter!(
        OUTPUT_OBJECTS_WRITTEN_TOTAL,
        "Total number of result objects written by the sink"
    );

    describe_counter!(
        DIRECT_EVENTS_EVALUATED_TOTAL,
        "Total number of events evaluated through direct rule testing"
    );
}
