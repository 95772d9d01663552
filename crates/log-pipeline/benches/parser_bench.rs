//! 이벤트 파서 벤치마크
//!
//! 짧은/중첩 JSON 라인의 파싱 처리량과 잘못된 입력의 거절 비용을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sift_log_pipeline::parser::EventParser;

/// 짧은 이벤트
const JSON_SHORT: &str = r#"{"eventTime":"2024-01-15T12:00:00Z","eventName":"ConsoleLogin","sourceIPAddress":"192.168.1.100","userIdentity":{"type":"Root"}}"#;

/// 긴 이벤트 (중첩 객체 포함)
const JSON_LONG: &str = r#"{"eventVersion":"1.08","eventTime":"2024-01-15T12:00:00.123456Z","eventSource":"signin.amazonaws.com","eventName":"ConsoleLogin","awsRegion":"us-east-1","sourceIPAddress":"203.0.113.45","userAgent":"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36","userIdentity":{"type":"IAMUser","principalId":"AIDAEXAMPLE","arn":"arn:aws:iam::123456789012:user/alice","accountId":"123456789012","userName":"alice"},"responseElements":{"ConsoleLogin":"Success"},"additionalEventData":{"LoginTo":"https://console.aws.amazon.com/","MobileVersion":"No","MFAUsed":"Yes"},"eventID":"550e8400-e29b-41d4-a716-446655440000","readOnly":false,"eventType":"AwsConsoleSignIn","managementEvent":true,"recipientAccountId":"123456789012"}"#;

/// 문법 오류 라인
const JSON_BROKEN: &str = r#"{"eventName":"ConsoleLogin","sourceIPAddress":"#;

fn bench_event_parser(c: &mut Criterion) {
    let parser = EventParser::new();

    let mut group = c.benchmark_group("event_parser");

    // 짧은 이벤트
    group.throughput(Throughput::Elements(1));
    group.bench_function("short", |b| {
        b.iter(|| parser.parse("AWS.CloudTrail", black_box(JSON_SHORT)).unwrap())
    });

    // 긴 이벤트 (중첩 객체)
    group.bench_function("long_nested", |b| {
        b.iter(|| parser.parse("AWS.CloudTrail", black_box(JSON_LONG)).unwrap())
    });

    // 잘못된 입력 거절
    group.bench_function("reject_broken", |b| {
        b.iter(|| parser.parse("AWS.CloudTrail", black_box(JSON_BROKEN)).unwrap_err())
    });

    // 1000건 반복 처리량
    group.throughput(Throughput::Elements(1000));
    group.bench_function("throughput_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                parser.parse("AWS.CloudTrail", black_box(JSON_SHORT)).unwrap();
            }
        })
    });

    group.finish();
}

fn bench_input_size(c: &mut Criterion) {
    let parser = EventParser::new();

    let mut group = c.benchmark_group("event_parser_size");

    for fields in [10usize, 100, 1000] {
        let mut line = String::from("{");
        for i in 0..fields {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&format!(r#""field_{i}":"value_{i}""#));
        }
        line.push('}');

        group.throughput(Throughput::Bytes(line.len() as u64));
        group.bench_with_input(BenchmarkId::new("fields", fields), &line, |b, line| {
            b.iter(|| parser.parse("Custom.Wide", black_box(line)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_event_parser, bench_input_size);
criterion_main!(benches);
