//! Upload streaming
//!
//! Bridges multipart body chunks (async side) to a blocking `Read` the
//! evaluation engine consumes on the blocking pool. The channel is bounded,
//! so at most `UPLOAD_CHANNEL_DEPTH` body chunks are buffered at once.

use std::io::{self, Read};

use axum::body::Bytes;
use axum::extract::multipart::Field;
use tokio::sync::mpsc;

/// Body chunks in flight between the request and the evaluation task
pub const UPLOAD_CHANNEL_DEPTH: usize = 8;

pub type UploadSender = mpsc::Sender<io::Result<Bytes>>;

pub fn upload_channel() -> (UploadSender, UploadReader) {
    let (tx, rx) = mpsc::channel(UPLOAD_CHANNEL_DEPTH);
    (tx, UploadReader { rx, current: Bytes::new() })
}

/// Blocking reader over the receiving half. Must not be read from an
/// async context.
pub struct UploadReader {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    current: Bytes,
}

impl Read for UploadReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.current.is_empty() {
            match self.rx.blocking_recv() {
                Some(Ok(bytes)) => self.current = bytes,
                Some(Err(e)) => return Err(e),
                // Sender dropped: end of upload
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.current.len());
        let chunk = self.current.split_to(n);
        buf[..n].copy_from_slice(&chunk);
        Ok(n)
    }
}

/// How forwarding a multipart field ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarded {
    /// Every chunk was handed to the reader
    Complete,
    /// The body failed mid-field; the reader received the error
    ReadFailed,
    /// The reader hung up early (the evaluation already stopped)
    ReaderClosed,
}

/// Pump a field's chunks into the channel, honoring backpressure
pub async fn forward_field(field: &mut Field<'_>, tx: &UploadSender) -> Forwarded {
    loop {
        match field.chunk().await {
            Ok(Some(bytes)) => {
                if tx.send(Ok(bytes)).await.is_err() {
                    return Forwarded::ReaderClosed;
                }
            }
            Ok(None) => return Forwarded::Complete,
            Err(e) => {
                let err = io::Error::new(io::ErrorKind::UnexpectedEof, format!("Upload read failed: {}", e));
                return match tx.send(Err(err)).await {
                    Ok(()) => Forwarded::ReadFailed,
                    Err(_) => Forwarded::ReaderClosed,
                };
            }
        }
    }
}
