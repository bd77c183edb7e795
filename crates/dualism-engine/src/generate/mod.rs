//! Generation service abstraction.
//!
//! One seam, three implementations:
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │ HttpGenerator    │   │ LocalGenerator   │   │ test doubles     │
//! │ (remote NDJSON)  │   │ (TextCompletion) │   │ (scripted)       │
//! └────────┬─────────┘   └────────┬─────────┘   └────────┬─────────┘
//!          │                      │                      │
//!          ▼                      ▼                      ▼
//!          ┌──────────────────────────────────────────────┐
//!          │  GenerationService::generate(request)        │
//!          │     -> GenerationStream of StreamUpdate      │
//!          └──────────────────────────────────────────────┘
//! ```
//!
//! The session driver consumes the stream and folds it into reducer events:
//! every `Chunk` becomes a `ReceivePartial`, the `Done` promotes the last
//! chunk to a `Complete`, and a `Failed` completes with placeholder text.

pub mod clean;
pub mod http;
pub mod local;
pub mod prompt;
pub mod stream;
pub mod wire;

pub use http::HttpGenerator;
pub use local::{CompletionPrompt, LocalGenerator, TextCompletion, TextDeltaStream};
pub use stream::{GenerationFailure, GenerationStream, StreamUpdate};
pub use wire::{GenerationChunk, GenerationRequest};

use async_trait::async_trait;

use crate::Result;

/// A generation backend: turn one request into a stream of updates.
///
/// `generate` returns once the request is accepted; updates arrive on the
/// stream. Implementations must end every stream with a terminal update
/// (`Done` or `Failed`) on every path they control; a consumer treats a
/// stream that just stops as a transport failure.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationStream>;
}
