//! 규칙 실행 trait -- 규칙 엔진 확장 포인트 정의

use serde_json::{Map, Value};

use crate::error::SiftError;
use crate::types::{RuleRun, Severity};

/// 컴파일된 탐지 규칙
///
/// 새로운 규칙 실행 방식을 지원하려면 이 trait을 구현합니다.
/// `run`은 실패를 반환값([`RuleRun::error`])으로 보고하며 패닉하지 않아야 합니다.
pub trait Rule: Send + Sync {
    /// 규칙 ID
    fn id(&self) -> &str;

    /// 규칙이 적용되는 로그 타입 목록 (비어있으면 모든 로그 타입)
    fn log_types(&self) -> &[String];

    /// 규칙 심각도
    fn severity(&self) -> Severity {
        Severity::Info
    }

    /// 이벤트에 대해 규칙을 실행
    fn run(&self, event: &Map<String, Value>) -> RuleRun;

    /// 주어진 로그 타입에 적용되는지 확인
    fn applies_to(&self, log_type: &str) -> bool {
        let log_types = self.log_types();
        log_types.is_empty() || log_types.iter().any(|t| t == log_type)
    }
}

/// 규칙 본문을 실행 가능한 규칙으로 컴파일하는 trait
pub trait RuleCompiler: Send + Sync {
    /// 컴파일 결과 규칙 타입
    type Rule: Rule;

    /// 규칙 본문을 컴파일
    fn compile(&self, id: &str, body: &str) -> Result<Self::Rule, SiftError>;
}
