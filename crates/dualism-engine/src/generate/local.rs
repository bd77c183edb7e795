//! In-process generation over a local text-completion backend.
//!
//! [`LocalGenerator`] adapts anything that can stream raw completion text
//! (an embedded model, a subprocess, a test script) into a
//! [`GenerationService`](super::GenerationService). The two directions
//! behave differently on purpose:
//!
//! * code: every delta re-emits the cleaned cumulative text, so a watcher
//!   sees fences and shebangs strip away as they complete
//! * prose: deltas accumulate silently and one final chunk carries the
//!   whole comment, since half a sentence is not useful prose
//!
//! Both end with `Done`; backend failures surface as transport failures.

use std::sync::Arc;

use async_trait::async_trait;
use dualism_core::GenField;
use tokio::sync::mpsc;

use crate::Result;

use super::clean::clean_code;
use super::prompt;
use super::stream::{GenerationFailure, GenerationStream, StreamUpdate};
use super::wire::{GenerationChunk, GenerationRequest};
use super::GenerationService;

const DELTA_CHANNEL_CAPACITY: usize = 64;

/// Default completion budget for one generated field.
const DEFAULT_MAX_TOKENS: u32 = 1000;

// ============================================================================
// Backend trait
// ============================================================================

/// A backend that streams completion text for a system/user prompt pair.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Start a completion, returning its delta stream.
    async fn complete(&self, prompt: CompletionPrompt) -> Result<TextDeltaStream>;
}

/// Prompt and sampling parameters for one completion.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionPrompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionPrompt {
    /// A prompt with default sampling (deterministic, 1000-token budget).
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
        }
    }

    /// Set the completion token budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Raw text deltas from a backend. Channel close marks the end; an `Err`
/// item aborts the completion.
pub struct TextDeltaStream {
    rx: mpsc::Receiver<Result<String>>,
}

impl TextDeltaStream {
    /// Wrap a delta receiver.
    pub fn new(rx: mpsc::Receiver<Result<String>>) -> Self {
        Self { rx }
    }

    /// A fresh producer/consumer pair.
    pub fn channel() -> (mpsc::Sender<Result<String>>, TextDeltaStream) {
        let (tx, rx) = mpsc::channel(DELTA_CHANNEL_CAPACITY);
        (tx, TextDeltaStream::new(rx))
    }

    /// Next delta, or `None` once the backend is done.
    pub async fn next_delta(&mut self) -> Option<Result<String>> {
        self.rx.recv().await
    }
}

impl std::fmt::Debug for TextDeltaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDeltaStream").finish()
    }
}

// ============================================================================
// Generator
// ============================================================================

/// [`GenerationService`](super::GenerationService) backed by a local
/// [`TextCompletion`].
#[derive(Clone)]
pub struct LocalGenerator {
    backend: Arc<dyn TextCompletion>,
}

impl LocalGenerator {
    /// Wrap a backend.
    pub fn new(backend: impl TextCompletion + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Wrap an already-shared backend.
    pub fn from_arc(backend: Arc<dyn TextCompletion>) -> Self {
        Self { backend }
    }
}

impl std::fmt::Debug for LocalGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalGenerator").finish()
    }
}

#[async_trait]
impl GenerationService for LocalGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationStream> {
        let field = request.produces();
        tracing::debug!(%field, lang = %request.lang, "local generation");

        let deltas = self.backend.complete(prompt_for(&request)).await?;
        let (tx, stream) = GenerationStream::channel();
        match field {
            GenField::Code => {
                tokio::spawn(stream_code(deltas, tx));
            }
            GenField::Prose => {
                tokio::spawn(collect_prose(deltas, tx));
            }
        }
        Ok(stream)
    }
}

/// Build the prompt pair for a request's direction.
fn prompt_for(request: &GenerationRequest) -> CompletionPrompt {
    match request.produces() {
        GenField::Code => CompletionPrompt::new(
            prompt::code_system(request.lang),
            prompt::code_user(request.input_text()),
        ),
        GenField::Prose => CompletionPrompt::new(
            prompt::prose_system(request.lang),
            prompt::prose_user(request.input_text()),
        ),
    }
}

/// Forward code deltas as cleaned cumulative snapshots.
async fn stream_code(mut deltas: TextDeltaStream, tx: mpsc::Sender<StreamUpdate>) {
    let mut accumulated = String::new();
    while let Some(delta) = deltas.next_delta().await {
        let delta = match delta {
            Ok(delta) => delta,
            Err(err) => {
                let _ = tx
                    .send(StreamUpdate::Failed(GenerationFailure::Transport(
                        err.to_string(),
                    )))
                    .await;
                return;
            }
        };
        accumulated.push_str(&delta);
        let snapshot = GenerationChunk::new(GenField::Code, clean_code(&accumulated));
        if tx.send(StreamUpdate::Chunk(snapshot)).await.is_err() {
            return;
        }
    }
    // One settled snapshot always precedes Done, zero-delta completions
    // included.
    let snapshot = GenerationChunk::new(GenField::Code, clean_code(&accumulated));
    if tx.send(StreamUpdate::Chunk(snapshot)).await.is_err() {
        return;
    }
    let _ = tx.send(StreamUpdate::Done).await;
}

/// Accumulate prose deltas and emit one final chunk.
async fn collect_prose(mut deltas: TextDeltaStream, tx: mpsc::Sender<StreamUpdate>) {
    let mut accumulated = String::new();
    while let Some(delta) = deltas.next_delta().await {
        match delta {
            Ok(delta) => accumulated.push_str(&delta),
            Err(err) => {
                let _ = tx
                    .send(StreamUpdate::Failed(GenerationFailure::Transport(
                        err.to_string(),
                    )))
                    .await;
                return;
            }
        }
    }
    let chunk = GenerationChunk::new(GenField::Prose, accumulated);
    if tx.send(StreamUpdate::Chunk(chunk)).await.is_err() {
        return;
    }
    let _ = tx.send(StreamUpdate::Done).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use dualism_core::Language;
    use std::sync::Mutex;

    /// Backend that replays a fixed delta script and records the prompt.
    struct ScriptedBackend {
        deltas: Vec<&'static str>,
        fail_at_end: bool,
        seen: Mutex<Option<CompletionPrompt>>,
    }

    impl ScriptedBackend {
        fn new(deltas: Vec<&'static str>) -> Self {
            Self {
                deltas,
                fail_at_end: false,
                seen: Mutex::new(None),
            }
        }

        fn failing(deltas: Vec<&'static str>) -> Self {
            Self {
                fail_at_end: true,
                ..Self::new(deltas)
            }
        }
    }

    #[async_trait]
    impl TextCompletion for ScriptedBackend {
        async fn complete(&self, prompt: CompletionPrompt) -> Result<TextDeltaStream> {
            *self.seen.lock().unwrap() = Some(prompt);
            let (tx, stream) = TextDeltaStream::channel();
            let deltas: Vec<String> = self.deltas.iter().map(|d| d.to_string()).collect();
            let fail_at_end = self.fail_at_end;
            tokio::spawn(async move {
                for delta in deltas {
                    if tx.send(Ok(delta)).await.is_err() {
                        return;
                    }
                }
                if fail_at_end {
                    let _ = tx.send(Err(EngineError::Status { status: 500 })).await;
                }
            });
            Ok(stream)
        }
    }

    async fn collect(mut stream: GenerationStream) -> Vec<StreamUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = stream.next_update().await {
            updates.push(update);
        }
        updates
    }

    fn texts(updates: &[StreamUpdate]) -> Vec<&str> {
        updates
            .iter()
            .filter_map(|u| match u {
                StreamUpdate::Chunk(c) => Some(c.text()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_code_deltas_stream_cleaned_snapshots() {
        let backend = ScriptedBackend::new(vec!["```python\n", "x = 1", "\n```"]);
        let generator = LocalGenerator::new(backend);
        let stream = generator
            .generate(GenerationRequest::code_from_prose("set x", Language::Python))
            .await
            .unwrap();

        let updates = collect(stream).await;
        assert_eq!(updates.last(), Some(&StreamUpdate::Done));
        // Fences dissolve as they complete; the settled value repeats last.
        assert_eq!(texts(&updates), vec!["", "x = 1", "x = 1", "x = 1"]);
    }

    #[tokio::test]
    async fn test_prose_arrives_as_single_chunk() {
        let backend = ScriptedBackend::new(vec!["Prints ", "a greeting."]);
        let generator = LocalGenerator::new(backend);
        let stream = generator
            .generate(GenerationRequest::prose_from_code(
                "print('hi')",
                Language::Python,
            ))
            .await
            .unwrap();

        let updates = collect(stream).await;
        assert_eq!(updates.len(), 2);
        assert_eq!(texts(&updates), vec!["Prints a greeting."]);
        assert_eq!(updates[1], StreamUpdate::Done);
    }

    #[tokio::test]
    async fn test_empty_completion_settles_empty() {
        let backend = ScriptedBackend::new(vec![]);
        let generator = LocalGenerator::new(backend);
        let stream = generator
            .generate(GenerationRequest::code_from_prose("", Language::Bash))
            .await
            .unwrap();

        let updates = collect(stream).await;
        assert_eq!(texts(&updates), vec![""]);
        assert_eq!(updates.last(), Some(&StreamUpdate::Done));
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_transport_failure() {
        let backend = ScriptedBackend::failing(vec!["x ="]);
        let generator = LocalGenerator::new(backend);
        let stream = generator
            .generate(GenerationRequest::code_from_prose("set x", Language::Python))
            .await
            .unwrap();

        let updates = collect(stream).await;
        assert!(matches!(
            updates.last(),
            Some(StreamUpdate::Failed(GenerationFailure::Transport(_)))
        ));
    }

    #[tokio::test]
    async fn test_prompts_follow_direction() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let generator = LocalGenerator::from_arc(backend.clone());

        let stream = generator
            .generate(GenerationRequest::code_from_prose(
                "sum a list",
                Language::TypeScript,
            ))
            .await
            .unwrap();
        drop(stream);
        let prompt = backend.seen.lock().unwrap().clone().unwrap();
        assert!(prompt.system.contains("TypeScript"));
        assert!(prompt.user.contains("sum a list"));
        assert_eq!(prompt.max_tokens, 1000);
        assert_eq!(prompt.temperature, 0.0);

        let stream = generator
            .generate(GenerationRequest::prose_from_code("ls -la", Language::Bash))
            .await
            .unwrap();
        drop(stream);
        let prompt = backend.seen.lock().unwrap().clone().unwrap();
        assert!(prompt.system.contains("Bash"));
        assert!(prompt.user.contains("ls -la"));
    }

    #[test]
    fn test_prompt_builders() {
        let prompt = CompletionPrompt::new("sys", "usr")
            .with_max_tokens(64)
            .with_temperature(0.7);
        assert_eq!(prompt.max_tokens, 64);
        assert_eq!(prompt.temperature, 0.7);
    }
}
