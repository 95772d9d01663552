//! 트리거 메시지 해석
//!
//! 큐에서 전달된 [`TriggerEvent`]의 각 레코드 본문을 [`BatchReference`]로 변환하고,
//! 로그 타입별로 묶습니다. 본문 형식:
//!
//! ```json
//! {"s3Bucket": "logs", "s3ObjectKey": "cloudtrail/2024/01/15/a.json.gz", "id": "AWS.CloudTrail"}
//! ```
//!
//! `storageBucket`/`storageKey`도 같은 의미로 허용됩니다.
//! 해석할 수 없는 본문은 실행 전체를 중단시킵니다.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use sift_core::types::{BatchReference, DirectTestCase, StorageLocator, TriggerEvent};

use crate::error::LogPipelineError;

/// 레코드 본문
#[derive(Debug, Deserialize)]
struct RecordBody {
    #[serde(rename = "s3Bucket", alias = "storageBucket")]
    bucket: String,
    #[serde(rename = "s3ObjectKey", alias = "storageKey")]
    key: String,
    #[serde(rename = "id")]
    log_type: String,
}

/// 트리거 메시지를 배치 참조 목록으로 변환합니다.
///
/// 레코드 순서를 유지합니다. 하나라도 해석에 실패하면 전체가 실패합니다.
pub fn parse_batch(event: &TriggerEvent) -> Result<Vec<BatchReference>, LogPipelineError> {
    event
        .records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let body: RecordBody = serde_json::from_str(&record.body).map_err(|e| {
                LogPipelineError::Trigger(format!(
                    "record {idx}{}: {e}",
                    record
                        .message_id
                        .as_deref()
                        .map(|id| format!(" ({id})"))
                        .unwrap_or_default()
                ))
            })?;

            if body.log_type.trim().is_empty() {
                return Err(LogPipelineError::Trigger(format!(
                    "record {idx}: log type id is empty"
                )));
            }

            tracing::debug!(
                bucket = %body.bucket,
                key = %body.key,
                log_type = %body.log_type,
                "batch reference parsed"
            );

            Ok(BatchReference::new(
                body.log_type,
                StorageLocator::new(body.bucket, body.key),
            ))
        })
        .collect()
}

/// 로그 타입별로 묶인 배치 참조
///
/// 로그 타입은 처음 등장한 순서를, 같은 타입 안의 참조는 추가된 순서를 유지합니다.
#[derive(Debug, Clone, Default)]
pub struct GroupedReferences {
    groups: Vec<(String, Vec<StorageLocator>)>,
    index: HashMap<String, usize>,
}

impl GroupedReferences {
    /// 빈 묶음을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 참조 하나를 추가합니다.
    pub fn push(&mut self, reference: BatchReference) {
        let BatchReference { log_type, locator } = reference;
        match self.index.get(&log_type) {
            Some(&idx) => self.groups[idx].1.push(locator),
            None => {
                self.index.insert(log_type.clone(), self.groups.len());
                self.groups.push((log_type, vec![locator]));
            }
        }
    }

    /// 로그 타입 수
    pub fn log_type_count(&self) -> usize {
        self.groups.len()
    }

    /// 전체 참조 수
    pub fn reference_count(&self) -> usize {
        self.groups.iter().map(|(_, locators)| locators.len()).sum()
    }

    /// 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 로그 타입과 해당 오브젝트 목록을 순서대로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[StorageLocator])> {
        self.groups
            .iter()
            .map(|(log_type, locators)| (log_type.as_str(), locators.as_slice()))
    }
}

impl FromIterator<BatchReference> for GroupedReferences {
    fn from_iter<I: IntoIterator<Item = BatchReference>>(iter: I) -> Self {
        let mut grouped = Self::new();
        for reference in iter {
            grouped.push(reference);
        }
        grouped
    }
}

/// 실행 요청 종류
#[derive(Debug, Clone)]
pub enum Invocation {
    /// 규칙 하나를 고정된 이벤트 목록에 직접 평가
    Direct(DirectTestCase),
    /// 오브젝트 배치 수집
    Batch(TriggerEvent),
}

impl Invocation {
    /// JSON 페이로드에서 요청 종류를 판별합니다.
    ///
    /// 최상위에 `rules` 키가 있으면 직접 평가, 그 외에는 배치 트리거입니다.
    pub fn from_value(value: Value) -> Result<Self, LogPipelineError> {
        let is_direct = value.get("rules").is_some();
        if is_direct {
            serde_json::from_value(value)
                .map(Self::Direct)
                .map_err(|e| LogPipelineError::Trigger(format!("invalid direct request: {e}")))
        } else {
            serde_json::from_value(value)
                .map(Self::Batch)
                .map_err(|e| LogPipelineError::Trigger(format!("invalid batch trigger: {e}")))
        }
    }

    /// 요청 종류 이름 (로그용)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Direct(_) => "direct",
            Self::Batch(_) => "batch",
        }
    }
}
