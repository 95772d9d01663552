//! 압축 로그 오브젝트 스트리밍
//!
//! [`LogStream`]은 gzip 압축된 오브젝트를 한 줄씩 읽는 순방향 이터레이터입니다.
//! 오브젝트 전체를 메모리에 올리지 않으며, 한 줄의 버퍼도 `max_line_bytes`를
//! 넘지 않습니다.
//!
//! # 에러 처리
//!
//! - 손상된 gzip 스트림, 읽기 실패: 치명적 에러를 한 번 반환한 뒤 종료 (fused)
//! - 잘못된 UTF-8, 길이 초과 라인: 해당 라인만 [`LogPipelineError::Parse`]로 보고하고 계속 진행
//!
//! 길이 제한은 개행 문자(`\n`, `\r\n`)를 제외한 라인 내용에 적용됩니다.
//!
//! 압축 해제와 파일 읽기는 동기 작업이므로, 비동기 코드에서는
//! [`LogStream::read_chunk`]로 블로킹 스레드에서 라인 묶음을 읽습니다.

use std::io::{BufRead, BufReader, ErrorKind, Read};

use flate2::read::MultiGzDecoder;
use sift_core::types::StorageLocator;

use crate::error::{LogPipelineError, ParseErrorKind};
use crate::storage::ObjectStore;

/// 압축 해제 버퍼 크기
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// 블로킹 스레드에서 한 번에 읽은 스트림 항목 (라인 번호, 결과)
pub type LineChunk = Vec<(usize, Result<RawLine, LogPipelineError>)>;

/// 스트림에서 읽은 라인
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// 1부터 시작하는 라인 번호
    pub number: usize,
    /// 라인 내용 (개행 문자 제외)
    pub text: String,
}

impl RawLine {
    /// 공백만으로 이루어진 라인인지 확인합니다.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// 오브젝트를 열어 라인 스트림을 생성합니다.
///
/// 오브젝트 열기 실패는 즉시 에러로 반환되고, 압축 해제 실패는
/// 첫 번째 `next()` 호출에서 보고됩니다.
pub async fn open_log_stream<S: ObjectStore>(
    store: &S,
    locator: &StorageLocator,
    max_line_bytes: usize,
) -> Result<LogStream, LogPipelineError> {
    let reader = store.get_object(locator).await?;
    Ok(LogStream::new(reader, locator.clone(), max_line_bytes))
}

/// gzip 압축 JSON-lines 오브젝트의 라인 이터레이터
pub struct LogStream {
    reader: BufReader<MultiGzDecoder<Box<dyn Read + Send>>>,
    locator: StorageLocator,
    max_line_bytes: usize,
    line_number: usize,
    done: bool,
}

impl LogStream {
    /// 압축된 바이트 리더로부터 스트림을 생성합니다.
    pub fn new(
        reader: Box<dyn Read + Send>,
        locator: StorageLocator,
        max_line_bytes: usize,
    ) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, MultiGzDecoder::new(reader)),
            locator,
            max_line_bytes,
            line_number: 0,
            done: false,
        }
    }

    /// 지금까지 읽은 라인 수 (마지막으로 반환한 라인의 번호)
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// 블로킹 스레드에서 라인 묶음을 읽습니다.
    ///
    /// 항목이 `max_lines`개가 되거나 라인 내용이 `max_bytes`에 도달하면 멈추므로,
    /// 묶음 하나의 크기는 `max_bytes + max_line_bytes`를 넘지 않습니다.
    /// 스트림은 작업 스레드로 이동했다가 결과와 함께 돌려받습니다.
    /// 반환된 묶음이 비어 있으면 스트림이 끝난 것입니다.
    pub async fn read_chunk(
        mut self,
        max_lines: usize,
        max_bytes: usize,
    ) -> Result<(Self, LineChunk), LogPipelineError> {
        let locator = self.locator.to_string();
        tokio::task::spawn_blocking(move || {
            let mut chunk = Vec::new();
            let mut bytes = 0;
            while chunk.len() < max_lines && bytes < max_bytes {
                match self.next() {
                    Some(item) => {
                        if let Ok(line) = &item {
                            bytes += line.text.len();
                        }
                        chunk.push((self.line_number, item));
                    }
                    None => break,
                }
            }
            (self, chunk)
        })
        .await
        .map_err(|e| LogPipelineError::Storage {
            locator,
            reason: format!("spawn_blocking failed: {e}"),
        })
    }

    fn fatal(&mut self, err: std::io::Error) -> LogPipelineError {
        self.done = true;
        let locator = self.locator.to_string();
        match err.kind() {
            ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::UnexpectedEof => {
                LogPipelineError::Decompress {
                    locator,
                    reason: err.to_string(),
                }
            }
            _ => LogPipelineError::Storage {
                locator,
                reason: err.to_string(),
            },
        }
    }

    /// 다음 라인의 바이트를 읽습니다. EOF이면 `None`.
    ///
    /// 반환값의 두 번째 요소는 길이 초과 여부이며, 초과 시 버퍼는 비어 있습니다.
    fn read_line_bytes(&mut self) -> Result<Option<(Vec<u8>, bool)>, std::io::Error> {
        let mut buf = Vec::new();
        let mut overflow = false;
        let mut seen_any = false;

        loop {
            let available = match self.reader.fill_buf() {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if available.is_empty() {
                if !seen_any {
                    return Ok(None);
                }
                break;
            }
            seen_any = true;

            let newline = available.iter().position(|&b| b == b'\n');
            let take = newline.unwrap_or(available.len());

            // 뒤따르는 '\r' 한 바이트는 제한 검사 전에 제거되므로 여유를 둠
            if !overflow {
                if buf.len() + take > self.max_line_bytes.saturating_add(1) {
                    overflow = true;
                    buf = Vec::new();
                } else {
                    buf.extend_from_slice(&available[..take]);
                }
            }

            let consumed = newline.map_or(available.len(), |pos| pos + 1);
            self.reader.consume(consumed);

            if newline.is_some() {
                break;
            }
        }

        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        if buf.len() > self.max_line_bytes {
            overflow = true;
            buf = Vec::new();
        }
        Ok(Some((buf, overflow)))
    }
}

impl Iterator for LogStream {
    type Item = Result<RawLine, LogPipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let (bytes, overflow) = match self.read_line_bytes() {
            Ok(Some(line)) => line,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => return Some(Err(self.fatal(e))),
        };
        self.line_number += 1;

        if overflow {
            return Some(Err(LogPipelineError::Parse {
                kind: ParseErrorKind::TooLarge,
                format: "json".to_owned(),
                offset: self.max_line_bytes,
                reason: format!("line exceeds {} bytes", self.max_line_bytes),
            }));
        }

        match String::from_utf8(bytes) {
            Ok(text) => Some(Ok(RawLine {
                number: self.line_number,
                text,
            })),
            Err(e) => Some(Err(LogPipelineError::Parse {
                kind: ParseErrorKind::Utf8,
                format: "json".to_owned(),
                offset: e.utf8_error().valid_up_to(),
                reason: "invalid utf-8 sequence".to_owned(),
            })),
        }
    }
}

impl std::iter::FusedIterator for LogStream {}
