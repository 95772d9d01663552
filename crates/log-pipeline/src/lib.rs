#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`trigger`]: 트리거 메시지 해석, 로그 타입별 그룹화, 요청 종류 판별
//! - [`storage`]: 오브젝트 스토리지 추상화 (로컬 디렉토리 구현)
//! - [`stream`]: gzip 오브젝트의 지연 라인 스트림
//! - [`parser`]: JSON 이벤트 파서
//! - [`rule`]: YAML 기반 탐지 규칙 엔진과 규칙 디스패치
//! - [`buffer`]: 분석 결과 인메모리 버퍼링 및 단일 플러시
//! - [`sink`]: 분석 결과 영속화 (gzip JSON-lines)
//! - [`forward`]: 매칭 페이로드 하류 전송
//! - [`pipeline`]: 배치 수집 오케스트레이션
//! - [`direct`]: 규칙 하나에 대한 직접 평가
//! - [`config`]: 파이프라인 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! Trigger -> ObjectStore -> LogStream -> EventParser -> RuleDispatcher
//!                                                          |
//!                                   OutputBuffer <---------+---------> matched payloads
//!                                        |                                  |
//!                                  ResultSink (flush)              MatchForwarder (send)
//! ```

pub mod buffer;
pub mod config;
pub mod direct;
pub mod error;
pub mod forward;
pub mod pipeline;
pub mod sink;
pub mod storage;
pub mod stream;
pub mod trigger;

pub mod parser;
pub mod rule;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{IngestionPipeline, IngestionPipelineBuilder, RunSummary};

// 직접 평가
pub use direct::DirectEvaluator;

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::{LogPipelineError, ParseErrorKind};

// 파서
pub use parser::EventParser;

// 규칙 엔진
pub use rule::{DetectionRule, RuleDispatcher, RuleEngine, YamlRuleCompiler};

// 트리거
pub use trigger::{GroupedReferences, Invocation, parse_batch};

// 스토리지 / 스트림
pub use storage::{LocalObjectStore, ObjectStore};
pub use stream::{LogStream, RawLine, open_log_stream};

// 버퍼 / 싱크 / 전송
pub use buffer::{FlushReport, OutputBuffer, ResultBatch, ResultGroup, ResultSink};
pub use forward::{ChannelForwarder, JsonLinesForwarder, MatchForwarder};
pub use sink::LocalResultSink;
