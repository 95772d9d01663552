//! 탐지 규칙 엔진 -- YAML 기반 이벤트 매칭과 규칙 디스패치
//!
//! 간소화된 YAML 규칙을 로드하여 [`DecodedEvent`]에 대한 필드 매칭을 수행합니다.
//!
//! # 규칙 형식
//! ```yaml
//! id: okta_admin_grant
//! title: Okta Admin Privilege Granted
//! severity: high
//! status: enabled
//! log_types: [Okta.SystemLog]
//! detection:
//!   conditions:
//!     - field: eventType
//!       value: user.account.privilege.grant
//!     - field: outcome.result
//!       modifier: exact
//!       value: SUCCESS
//! ```
//!
//! # 아키텍처
//! - [`RuleDispatcher`]: 파이프라인이 규칙 평가를 요청하는 trait
//! - [`RuleEngine`]: 로그 타입별로 색인된 규칙 집합 (기본 구현)
//! - [`loader`]: YAML 파일 로딩 및 유효성 검증
//! - [`matcher`]: 조건 매칭 로직 (exact, contains, regex 등)
//! - [`compiler`]: 직접 평가 요청의 규칙 본문 컴파일
//! - [`types`]: 규칙 데이터 구조 정의

pub mod compiler;
pub mod loader;
pub mod matcher;
pub mod types;

pub use compiler::YamlRuleCompiler;
pub use loader::RuleLoader;
pub use matcher::CompiledRule;
pub use types::{
    ConditionModifier, DetectionCondition, DetectionRule, FieldCondition, RuleStatus,
};

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use sift_core::pipeline::Rule;
use sift_core::types::{AnalysisResult, DecodedEvent};

use crate::error::LogPipelineError;

/// 규칙 평가 디스패처
///
/// 이벤트 하나를 해당 로그 타입에 등록된 규칙들에 실행합니다.
/// 반환값은 매칭되었거나 에러가 난 규칙마다 하나의 결과입니다.
/// 규칙 단위의 실패는 결과의 `error`로 보고되며, `Err`는 디스패치 자체의 실패입니다.
pub trait RuleDispatcher: Send + Sync + 'static {
    /// 이벤트를 규칙 엔진에 제출합니다.
    fn analyze(
        &self,
        log_type: &str,
        event: Arc<DecodedEvent>,
    ) -> impl Future<Output = Result<Vec<AnalysisResult>, LogPipelineError>> + Send;
}

/// 규칙 엔진 -- 탐지 규칙 관리 및 매칭 코디네이터
///
/// 규칙은 추가 순서대로 평가됩니다.
/// `log_types`가 빈 규칙은 모든 로그 타입에 적용됩니다.
///
/// # 사용 예시
/// ```ignore
/// let mut engine = RuleEngine::new();
/// engine.load_rules_from_dir("/etc/sift/rules").await?;
///
/// let results = engine.analyze("AWS.CloudTrail", Arc::new(event)).await?;
/// ```
pub struct RuleEngine {
    /// 등록 순서대로 보관된 규칙
    rules: Vec<CompiledRule>,
    /// 로그 타입 -> 규칙 인덱스
    by_log_type: HashMap<String, Vec<usize>>,
    /// 모든 로그 타입에 적용되는 규칙 인덱스
    global: Vec<usize>,
    /// 등록된 규칙 ID
    ids: HashSet<String>,
}

impl RuleEngine {
    /// 새 규칙 엔진을 생성합니다.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            by_log_type: HashMap::new(),
            global: Vec::new(),
            ids: HashSet::new(),
        }
    }

    /// 디렉토리에서 YAML 규칙 파일을 로드합니다.
    ///
    /// 컴파일에 실패한 규칙은 경고 로그를 남기고 건너뜁니다.
    /// 실제로 등록된 규칙 수를 반환합니다.
    pub async fn load_rules_from_dir(
        &mut self,
        dir: impl AsRef<std::path::Path>,
    ) -> Result<usize, LogPipelineError> {
        let rules = RuleLoader::load_directory(dir).await?;
        let mut added = 0;
        for rule in rules {
            let rule_id = rule.id.clone();
            match self.add_rule(rule) {
                Ok(()) => added += 1,
                Err(e) => {
                    tracing::warn!(
                        rule_id = %rule_id,
                        error = %e,
                        "failed to compile rule, skipping"
                    );
                }
            }
        }
        Ok(added)
    }

    /// 단일 규칙을 추가합니다.
    ///
    /// 비활성화된 규칙은 컴파일만 검증하고 등록하지 않습니다.
    pub fn add_rule(&mut self, rule: DetectionRule) -> Result<(), LogPipelineError> {
        if self.ids.contains(&rule.id) {
            return Err(LogPipelineError::RuleValidation {
                rule_id: rule.id,
                reason: "duplicate rule id".to_owned(),
            });
        }

        let compiled = CompiledRule::compile(rule)?;
        if compiled.status() == RuleStatus::Disabled {
            tracing::debug!(rule_id = %compiled.id(), "rule disabled, not registered");
            return Ok(());
        }

        let idx = self.rules.len();
        if compiled.log_types().is_empty() {
            self.global.push(idx);
        } else {
            for log_type in compiled.log_types() {
                let indices = self.by_log_type.entry(log_type.clone()).or_default();
                if indices.last() != Some(&idx) {
                    indices.push(idx);
                }
            }
        }
        self.ids.insert(compiled.id().to_owned());
        self.rules.push(compiled);
        Ok(())
    }

    /// 현재 등록된 규칙 수를 반환합니다.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// 로그 타입에 적용되는 규칙을 등록 순서대로 반환합니다.
    pub fn rules_for(&self, log_type: &str) -> Vec<&CompiledRule> {
        let mut indices: Vec<usize> = self.global.clone();
        if let Some(typed) = self.by_log_type.get(log_type) {
            indices.extend_from_slice(typed);
        }
        indices.sort_unstable();
        indices.into_iter().map(|idx| &self.rules[idx]).collect()
    }

    /// 이벤트를 평가합니다 (동기 버전).
    pub fn evaluate(&self, log_type: &str, event: &Arc<DecodedEvent>) -> Vec<AnalysisResult> {
        let mut results = Vec::new();

        for rule in self.rules_for(log_type) {
            let run = rule.run(&event.data);

            let matched = if rule.status() == RuleStatus::Test {
                if run.matched {
                    tracing::debug!(
                        rule_id = %rule.id(),
                        log_type,
                        "test rule matched, suppressed"
                    );
                }
                false
            } else {
                run.matched
            };

            if !matched && run.error.is_none() {
                continue;
            }

            let definition = rule.definition();
            results.push(AnalysisResult {
                rule_id: rule.id().to_owned(),
                log_type: log_type.to_owned(),
                severity: rule.severity(),
                rule_title: definition.display_title().to_owned(),
                rule_tags: definition.tags.clone(),
                dedup_period_mins: definition.dedup_period_mins,
                matched: matched && run.error.is_none(),
                error: run.error,
                event: Arc::clone(event),
            });
        }

        results
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleDispatcher for RuleEngine {
    async fn analyze(
        &self,
        log_type: &str,
        event: Arc<DecodedEvent>,
    ) -> Result<Vec<AnalysisResult>, LogPipelineError> {
        Ok(self.evaluate(log_type, &event))
    }
}
