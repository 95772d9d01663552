//! 직접 평가 -- 규칙 하나를 고정된 이벤트 목록에 실행
//!
//! 규칙 작성 중 테스트 용도로 사용됩니다. 배치 수집과 달리 스토리지나 큐를
//! 거치지 않고, 이벤트마다 정확히 하나의 판정을 돌려줍니다.
//!
//! 규칙이 정확히 하나가 아니면 어떤 이벤트도 평가하지 않고 실패합니다.
//! 에러 판정에는 메시지만 담기며 이벤트 데이터는 포함하지 않습니다.

use serde_json::Value;
use sift_core::metrics as m;
use sift_core::pipeline::{Rule, RuleCompiler};
use sift_core::types::{DirectResponse, DirectTestCase, DirectTestResult};

use crate::error::LogPipelineError;
use crate::parser::json::type_name;

/// 직접 평가기
#[derive(Debug, Clone, Default)]
pub struct DirectEvaluator<C> {
    compiler: C,
}

impl<C: RuleCompiler> DirectEvaluator<C> {
    /// 규칙 컴파일러를 지정하여 평가기를 생성합니다.
    pub fn new(compiler: C) -> Self {
        Self { compiler }
    }

    /// 테스트 케이스를 평가합니다.
    ///
    /// 응답의 이벤트 순서는 요청 순서와 같습니다.
    pub fn run(&self, case: &DirectTestCase) -> Result<DirectResponse, LogPipelineError> {
        let [definition] = case.rules.as_slice() else {
            return Err(LogPipelineError::RuleCount {
                found: case.rules.len(),
            });
        };

        tracing::debug!(
            rule_id = %definition.id,
            events = case.events.len(),
            "direct evaluation started"
        );

        let rule = match self.compiler.compile(&definition.id, &definition.body) {
            Ok(rule) => rule,
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(rule_id = %definition.id, error = %message, "rule failed to compile");
                let events = case
                    .events
                    .iter()
                    .map(|event| {
                        record("errored");
                        DirectTestResult::errored(&event.id, &definition.id, &message)
                    })
                    .collect();
                return Ok(DirectResponse { events });
            }
        };

        let events = case
            .events
            .iter()
            .map(|event| {
                let verdict = match &event.data {
                    Value::Object(data) => {
                        let run = rule.run(data);
                        let rule_id = &definition.id;
                        match run.error {
                            Some(message) => DirectTestResult::errored(&event.id, rule_id, message),
                            None if run.matched => DirectTestResult::matched(&event.id, rule_id),
                            None => DirectTestResult::not_matched(&event.id, rule_id),
                        }
                    }
                    other => DirectTestResult::errored(
                        &event.id,
                        &definition.id,
                        format!("event data must be a JSON object, found {}", type_name(other)),
                    ),
                };
                record(verdict_label(&verdict));
                verdict
            })
            .collect();

        Ok(DirectResponse { events })
    }
}

fn verdict_label(verdict: &DirectTestResult) -> &'static str {
    if !verdict.errored.is_empty() {
        "errored"
    } else if !verdict.matched.is_empty() {
        "matched"
    } else {
        "not_matched"
    }
}

fn record(result: &'static str) {
    metrics::counter!(m::DIRECT_EVENTS_EVALUATED_TOTAL, m::LABEL_RESULT => result).increment(1);
}
