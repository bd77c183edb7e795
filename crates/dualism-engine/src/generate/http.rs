//! HTTP client for a remote generation service.
//!
//! POSTs the request as JSON and reads the response body as NDJSON: each
//! line is one cumulative snapshot, stream close marks the final value. A
//! reader task forwards parsed chunks into the stream channel; the consumer
//! never touches the socket.
//!
//! Timeouts come in two grains: the request timeout caps the whole exchange,
//! the chunk timeout caps the wait between consecutive body reads so a
//! stalled connection cannot pin a block in its generating state forever.

use std::time::Duration;

use async_trait::async_trait;
use dualism_core::GenField;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::Result;

use super::stream::{GenerationFailure, GenerationStream, StreamUpdate};
use super::wire::{parse_chunk, GenerationRequest, LineBuffer};
use super::GenerationService;

/// [`GenerationService`] over HTTP NDJSON.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: reqwest::Client,
    endpoint: String,
    request_timeout: Duration,
    chunk_timeout: Duration,
}

impl HttpGenerator {
    /// A generator for the given endpoint with default timeouts.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            request_timeout: EngineConfig::default().request_timeout(),
            chunk_timeout: EngineConfig::default().chunk_timeout(),
        }
    }

    /// A generator configured from an [`EngineConfig`].
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.endpoint)
            .with_request_timeout(config.request_timeout())
            .with_chunk_timeout(config.chunk_timeout())
    }

    /// Set the whole-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the between-reads timeout.
    pub fn with_chunk_timeout(mut self, timeout: Duration) -> Self {
        self.chunk_timeout = timeout;
        self
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationService for HttpGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationStream> {
        let field = request.produces();
        tracing::debug!(endpoint = %self.endpoint, %field, "generation request");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%status, endpoint = %self.endpoint, "generation request rejected");
            return Err(EngineError::Status {
                status: status.as_u16(),
            });
        }

        let (tx, stream) = GenerationStream::channel();
        let chunk_timeout = self.chunk_timeout;
        tokio::spawn(read_body(resp, field, chunk_timeout, tx));
        Ok(stream)
    }
}

/// Drain the response body, forwarding one update per NDJSON line.
///
/// Always ends the channel with a terminal update. Send failures are
/// ignored: a dropped receiver means the consumer lost interest.
async fn read_body(
    resp: reqwest::Response,
    field: GenField,
    chunk_timeout: Duration,
    tx: mpsc::Sender<StreamUpdate>,
) {
    let body = resp.bytes_stream();
    let mut body = std::pin::pin!(body);
    let mut lines = LineBuffer::new();

    loop {
        let bytes = match timeout(chunk_timeout, body.next()).await {
            Ok(Some(Ok(bytes))) => bytes,
            Ok(Some(Err(err))) => {
                let _ = tx
                    .send(StreamUpdate::Failed(GenerationFailure::Transport(
                        err.to_string(),
                    )))
                    .await;
                return;
            }
            Ok(None) => break,
            Err(_) => {
                let _ = tx
                    .send(StreamUpdate::Failed(GenerationFailure::Transport(format!(
                        "no data for {}s",
                        chunk_timeout.as_secs()
                    ))))
                    .await;
                return;
            }
        };

        for line in lines.push(&bytes) {
            if !forward_line(&line, field, &tx).await {
                return;
            }
        }
    }

    // Stream closed cleanly; a single-object response may still be sitting
    // in the buffer without its newline.
    if let Some(line) = lines.finish() {
        if !forward_line(&line, field, &tx).await {
            return;
        }
    }
    let _ = tx.send(StreamUpdate::Done).await;
}

/// Parse and forward one line. Returns false when the stream must stop.
async fn forward_line(line: &str, field: GenField, tx: &mpsc::Sender<StreamUpdate>) -> bool {
    match parse_chunk(line) {
        Ok(chunk) if chunk.field() == field => tx.send(StreamUpdate::Chunk(chunk)).await.is_ok(),
        Ok(chunk) => {
            let _ = tx
                .send(StreamUpdate::Failed(GenerationFailure::Malformed(format!(
                    "chunk for {} while generating {}",
                    chunk.field(),
                    field
                ))))
                .await;
            false
        }
        Err(err) => {
            let _ = tx
                .send(StreamUpdate::Failed(GenerationFailure::Malformed(
                    err.to_string(),
                )))
                .await;
            false
        }
    }
}
