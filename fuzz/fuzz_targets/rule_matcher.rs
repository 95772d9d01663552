#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value};

use sift_core::pipeline::Rule;
use sift_core::types::Severity;
use sift_log_pipeline::rule::matcher::CompiledRule;
use sift_log_pipeline::rule::types::{
    ConditionModifier, DetectionCondition, DetectionRule, FieldCondition, RuleStatus,
};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 규칙 조건 목록 (최대 8개로 제한)
    conditions: Vec<FuzzCondition>,
    /// 매칭 대상 이벤트 필드값
    event_name: String,
    user_name: String,
    source_ip: Option<String>,
    nested_array: bool,
}

#[derive(Arbitrary, Debug)]
struct FuzzCondition {
    field: FuzzField,
    modifier: FuzzModifier,
    value: String,
}

#[derive(Arbitrary, Debug)]
enum FuzzField {
    EventName,
    UserName,
    SourceIp,
    Tags,
    Missing,
}

#[derive(Arbitrary, Debug)]
enum FuzzModifier {
    Exact,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
}

impl FuzzField {
    fn as_str(&self) -> &str {
        match self {
            FuzzField::EventName => "eventName",
            FuzzField::UserName => "userIdentity.userName",
            FuzzField::SourceIp => "sourceIPAddress",
            FuzzField::Tags => "tags",
            FuzzField::Missing => "does.not.exist",
        }
    }
}

impl FuzzModifier {
    fn to_condition_modifier(&self) -> ConditionModifier {
        match self {
            FuzzModifier::Exact => ConditionModifier::Exact,
            FuzzModifier::Contains => ConditionModifier::Contains,
            FuzzModifier::StartsWith => ConditionModifier::StartsWith,
            FuzzModifier::EndsWith => ConditionModifier::EndsWith,
            FuzzModifier::Regex => ConditionModifier::Regex,
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    // 조건 수 제한 (성능)
    let conditions: Vec<FieldCondition> = input
        .conditions
        .iter()
        .take(8)
        .map(|c| FieldCondition {
            field: c.field.as_str().to_owned(),
            modifier: c.modifier.to_condition_modifier(),
            value: c.value.clone(),
        })
        .collect();

    let rule = DetectionRule {
        id: "fuzz_rule".to_owned(),
        title: None,
        description: String::new(),
        severity: Severity::Info,
        status: RuleStatus::Enabled,
        log_types: Vec::new(),
        detection: DetectionCondition { conditions },
        tags: Vec::new(),
        dedup_period_mins: 60,
    };

    // 컴파일이 실패해도 크래시는 안 됨
    let Ok(compiled) = CompiledRule::compile(rule) else {
        return;
    };

    let mut user = Map::new();
    user.insert("userName".to_owned(), Value::String(input.user_name));

    let mut event = Map::new();
    event.insert("eventName".to_owned(), Value::String(input.event_name));
    event.insert("userIdentity".to_owned(), Value::Object(user));
    if let Some(ip) = input.source_ip {
        event.insert("sourceIPAddress".to_owned(), Value::String(ip));
    }
    if input.nested_array {
        event.insert("tags".to_owned(), Value::Array(vec![Value::Bool(true)]));
    }

    // 매칭과 에러가 동시에 참일 수 없음
    let run = compiled.run(&event);
    assert!(!(run.matched && run.error.is_some()));
});
