//! 하류 전송 -- 매칭된 원본 페이로드를 알림 큐로 전달
//!
//! [`MatchForwarder`]는 배치 실행 마지막에 한 번 호출되며, 매칭된 라인의
//! 원본 텍스트를 순서대로 전달합니다.
//!
//! - [`ChannelForwarder`]: 같은 프로세스 안의 소비자에게 `mpsc` 채널로 전달
//! - [`JsonLinesForwarder`]: 스풀 디렉토리에 호출당 파일 하나를 작성
//!
//! 전송은 멱등하지 않습니다. 같은 배치를 다시 실행하면 같은 페이로드가 다시 전송됩니다.

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::error::LogPipelineError;

/// 매칭 페이로드 전송 trait
pub trait MatchForwarder: Send + Sync + 'static {
    /// 페이로드 목록을 한 번에 전송합니다.
    fn send(
        &self,
        payloads: Vec<String>,
    ) -> impl Future<Output = Result<(), LogPipelineError>> + Send;
}

/// 채널 기반 전송기
#[derive(Debug, Clone)]
pub struct ChannelForwarder {
    tx: mpsc::Sender<Vec<String>>,
}

impl ChannelForwarder {
    /// 송신 채널로 전송기를 생성합니다.
    pub fn new(tx: mpsc::Sender<Vec<String>>) -> Self {
        Self { tx }
    }
}

impl MatchForwarder for ChannelForwarder {
    async fn send(&self, payloads: Vec<String>) -> Result<(), LogPipelineError> {
        self.tx
            .send(payloads)
            .await
            .map_err(|e| LogPipelineError::Forward(format!("match receiver dropped: {e}")))
    }
}

/// 스풀 디렉토리 기반 JSON-lines 전송기
///
/// 호출마다 `<spool_dir>/<UTC 타임스탬프>-<uuid>.jsonl` 파일 하나를 작성합니다.
/// 임시 파일에 쓴 뒤 이름을 바꾸므로 소비자는 완성된 파일만 보게 됩니다.
#[derive(Debug, Clone)]
pub struct JsonLinesForwarder {
    spool_dir: PathBuf,
}

impl JsonLinesForwarder {
    /// 스풀 디렉토리를 지정하여 전송기를 생성합니다.
    pub fn new(spool_dir: impl Into<PathBuf>) -> Self {
        Self {
            spool_dir: spool_dir.into(),
        }
    }

    /// 스풀 디렉토리
    pub fn spool_dir(&self) -> &Path {
        &self.spool_dir
    }
}

impl MatchForwarder for JsonLinesForwarder {
    async fn send(&self, payloads: Vec<String>) -> Result<(), LogPipelineError> {
        if payloads.is_empty() {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.spool_dir)
            .await
            .map_err(|e| {
                LogPipelineError::Forward(format!("create {}: {e}", self.spool_dir.display()))
            })?;

        let name = format!(
            "{}-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ"),
            uuid::Uuid::new_v4()
        );
        let tmp_path = self.spool_dir.join(format!(".{name}.tmp"));
        let final_path = self.spool_dir.join(format!("{name}.jsonl"));

        let mut body = String::with_capacity(payloads.iter().map(|p| p.len() + 1).sum());
        for payload in &payloads {
            body.push_str(payload);
            body.push('\n');
        }

        tokio::fs::write(&tmp_path, body)
            .await
            .map_err(|e| LogPipelineError::Forward(format!("write {}: {e}", tmp_path.display())))?;
        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|e| {
                LogPipelineError::Forward(format!("rename {}: {e}", final_path.display()))
            })?;

        tracing::debug!(
            path = %final_path.display(),
            count = payloads.len(),
            "matches spooled"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_forwarder_delivers_batch() {
        let (tx, mut rx) = mpsc::channel(4);
        let forwarder = ChannelForwarder::new(tx);
        forwarder
            .send(vec!["{\"a\":1}".to_owned(), "{\"b\":2}".to_owned()])
            .await
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[tokio::test]
    async fn channel_forwarder_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let forwarder = ChannelForwarder::new(tx);
        let err = forwarder.send(vec!["x".to_owned()]).await.unwrap_err();
        assert!(matches!(err, LogPipelineError::Forward(_)));
    }

    #[tokio::test]
    async fn json_lines_forwarder_writes_one_file_per_send() {
        let dir = tempfile::tempdir().unwrap();
        let spool = dir.path().join("spool");
        let forwarder = JsonLinesForwarder::new(&spool);

        forwarder
            .send(vec!["{\"a\":1}".to_owned(), "{\"b\":2}".to_owned()])
            .await
            .unwrap();
        forwarder.send(vec!["{\"c\":3}".to_owned()]).await.unwrap();

        let mut files: Vec<_> = std::fs::read_dir(&spool)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.extension().is_some_and(|e| e == "jsonl")));

        let mut contents: Vec<_> = files
            .iter()
            .map(|p| std::fs::read_to_string(p).unwrap())
            .collect();
        contents.sort();
        assert!(contents.contains(&"{\"a\":1}\n{\"b\":2}\n".to_owned()));
        assert!(contents.contains(&"{\"c\":3}\n".to_owned()));
    }

    #[tokio::test]
    async fn json_lines_forwarder_skips_empty_send() {
        let dir = tempfile::tempdir().unwrap();
        let spool = dir.path().join("spool");
        JsonLinesForwarder::new(&spool).send(Vec::new()).await.unwrap();
        assert!(!spool.exists());
    }
}
