//! Channel-backed generation streams.
//!
//! Every [`GenerationService`](super::GenerationService) implementation
//! produces updates the same way: a spawned task pushes [`StreamUpdate`]s
//! into an mpsc channel and the consumer pulls them off a
//! [`GenerationStream`]. The stream is single-use; after a terminal update
//! (or a producer that vanished without one) it only yields `None`.

use tokio::sync::mpsc;

use super::wire::GenerationChunk;

/// Channel capacity between a stream producer task and its consumer.
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// One update from an in-flight generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamUpdate {
    /// A cumulative snapshot of the generated field.
    Chunk(GenerationChunk),
    /// Clean end of stream. The last chunk before this is the final value;
    /// with no chunks at all the generation produced empty text.
    Done,
    /// The stream broke; no further updates follow.
    Failed(GenerationFailure),
}

impl StreamUpdate {
    /// Check if this update ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

/// The two caller-recovered failure classes.
///
/// The session turns each into a synthesized `Complete` carrying that
/// class's placeholder text; the block still settles to `Inert`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationFailure {
    /// Network or service failure (connect error, bad status, dropped body).
    Transport(String),
    /// The stream delivered a line that is not a generation chunk.
    Malformed(String),
}

impl GenerationFailure {
    /// Placeholder text standing in for the never-delivered result.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Transport(_) => "(generation failed: connection error)",
            Self::Malformed(_) => "(generation failed: unreadable response)",
        }
    }

    /// The underlying detail message.
    pub fn detail(&self) -> &str {
        match self {
            Self::Transport(msg) | Self::Malformed(msg) => msg,
        }
    }
}

impl std::fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Malformed(msg) => write!(f, "malformed: {msg}"),
        }
    }
}

/// Consumer half of a generation stream.
pub struct GenerationStream {
    rx: mpsc::Receiver<StreamUpdate>,
    finished: bool,
}

impl GenerationStream {
    /// Wrap an update receiver.
    pub fn new(rx: mpsc::Receiver<StreamUpdate>) -> Self {
        Self {
            rx,
            finished: false,
        }
    }

    /// A fresh producer/consumer pair.
    pub fn channel() -> (mpsc::Sender<StreamUpdate>, GenerationStream) {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        (tx, GenerationStream::new(rx))
    }

    /// Next update, or `None` once the stream is exhausted.
    ///
    /// `None` without a preceding terminal update means the producer went
    /// away mid-stream; callers treat that as a transport failure.
    pub async fn next_update(&mut self) -> Option<StreamUpdate> {
        if self.finished {
            return None;
        }
        let update = self.rx.recv().await;
        match &update {
            Some(u) if u.is_terminal() => self.finished = true,
            None => self.finished = true,
            _ => {}
        }
        update
    }
}

impl std::fmt::Debug for GenerationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationStream")
            .field("finished", &self.finished)
            .finish()
    }
}
