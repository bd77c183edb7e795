//! Async driver for one live notebook.
//!
//! The reducer is pure; this module is the impure caller the lifecycle
//! contract keeps talking about. One spawned task owns the [`Notebook`],
//! receives every command over a single mpsc queue, and is the only place
//! reducer events are applied. That single queue is what makes per-block
//! delivery serialized:
//!
//! ```text
//! SessionHandle ──── dispatch / snapshot / export ───┐
//!                                                    ▼
//! forwarder task ── {id, seq, StreamUpdate} ──► NotebookSession ──► broadcast
//! forwarder task ── {id, seq, StreamUpdate} ──►  (owns Notebook)    SessionEvent
//!        ▲                                           │
//!        └───────── GenerationService::generate ◄────┘  on Submit*
//! ```
//!
//! Generations run concurrently, one forwarder task per service call. Each
//! carries the sequence number its block had when it started; the driver
//! drops any update whose number no longer matches. Sequence numbers are
//! monotonic per block and never reset, so a hung stream from three
//! submissions ago can never impersonate the current one (the reducer's
//! state precondition alone cannot tell two generations of the same field
//! apart).
//!
//! The driver runs until a shutdown lands or the last handle drops; an
//! in-flight forwarder keeps it alive only long enough to drain its terminal
//! update.

use std::collections::HashMap;
use std::sync::Arc;

use dualism_core::{export_source, reducer, BlockId, GenField, Notebook, NotebookEvent};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::EngineError;
use crate::generate::{GenerationFailure, GenerationRequest, GenerationService, StreamUpdate};
use crate::Result;

/// Command queue depth; dispatches and stream updates share it.
const SESSION_CHANNEL_CAPACITY: usize = 256;

/// Broadcast buffer per subscriber before lag kicks in.
const SESSION_EVENT_CAPACITY: usize = 64;

// ============================================================================
// Observation surface
// ============================================================================

/// What a subscriber sees happen inside a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The notebook changed; re-read it via `snapshot`.
    DocumentChanged,
    /// A block entered a generating state and a service call is in flight.
    GenerationStarted {
        id: BlockId,
        field: GenField,
        seq: u64,
    },
    /// That generation delivered its terminal update (success or failure).
    GenerationFinished {
        id: BlockId,
        field: GenField,
        seq: u64,
    },
}

enum SessionCommand {
    Dispatch(NotebookEvent),
    Update {
        id: BlockId,
        field: GenField,
        seq: u64,
        update: StreamUpdate,
    },
    Snapshot(oneshot::Sender<Notebook>),
    Export(oneshot::Sender<String>),
    Shutdown(oneshot::Sender<()>),
}

// ============================================================================
// Handle
// ============================================================================

/// Clonable front door to a running session.
///
/// Every method goes through the driver's command queue; once the driver has
/// stopped they all fail with [`EngineError::Shutdown`].
#[derive(Clone, Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Queue one notebook event.
    pub async fn dispatch(&self, event: NotebookEvent) -> Result<()> {
        self.commands
            .send(SessionCommand::Dispatch(event))
            .await
            .map_err(|_| EngineError::Shutdown)
    }

    /// The current notebook, as of every command queued so far.
    pub async fn snapshot(&self) -> Result<Notebook> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Snapshot(tx))
            .await
            .map_err(|_| EngineError::Shutdown)?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// The notebook rendered as commented source.
    pub async fn export(&self) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Export(tx))
            .await
            .map_err(|_| EngineError::Shutdown)?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// Subscribe to session events. Only events published after the call are
    /// delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Stop the driver. Resolves once the command queue is closed, so any
    /// call after this returns [`EngineError::Shutdown`].
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Shutdown(tx))
            .await
            .map_err(|_| EngineError::Shutdown)?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }
}

// ============================================================================
// Driver
// ============================================================================

/// The driver task state: one notebook, one service, per-block sequence
/// counters.
///
/// Holds only a weak sender to its own queue: the strong ones live in the
/// handles and in active forwarder tasks, so the driver stops once the last
/// handle is gone and any in-flight generation has drained its terminal
/// update.
pub struct NotebookSession {
    doc: Notebook,
    service: Arc<dyn GenerationService>,
    seqs: HashMap<BlockId, u64>,
    commands: mpsc::WeakSender<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
}

impl NotebookSession {
    /// Spawn a driver for `notebook` and return its handle.
    pub fn spawn(service: Arc<dyn GenerationService>, notebook: Notebook) -> SessionHandle {
        let (commands, rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        let session = NotebookSession {
            doc: notebook,
            service,
            seqs: HashMap::new(),
            commands: commands.downgrade(),
            events: events.clone(),
        };
        tokio::spawn(session.run(rx));
        SessionHandle { commands, events }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<SessionCommand>) {
        let mut ack = None;
        while let Some(command) = rx.recv().await {
            match command {
                SessionCommand::Dispatch(event) => self.handle_dispatch(event),
                SessionCommand::Update {
                    id,
                    field,
                    seq,
                    update,
                } => self.handle_update(id, field, seq, update),
                SessionCommand::Snapshot(reply) => {
                    let _ = reply.send(self.doc.clone());
                }
                SessionCommand::Export(reply) => {
                    let _ = reply.send(export_source(&self.doc));
                }
                SessionCommand::Shutdown(reply) => {
                    ack = Some(reply);
                    break;
                }
            }
        }
        // Close the queue before acknowledging, so a post-shutdown caller
        // can't slip a command into a queue nobody will drain.
        drop(rx);
        if let Some(ack) = ack {
            let _ = ack.send(());
        }
        tracing::debug!("notebook session stopped");
    }

    fn handle_dispatch(&mut self, event: NotebookEvent) {
        tracing::debug!(kind = event.kind(), "dispatch");
        let target = event.block_id().cloned();
        let before = target.as_ref().and_then(|id| self.doc.get(id)).map(|b| b.state);
        self.apply_event(&event);
        let after = target.as_ref().and_then(|id| self.doc.get(id)).map(|b| b.state);

        // A submit that passed its precondition moved the block into a
        // generating state; that edge, not the event itself, starts the call.
        if before != after {
            if let (Some(id), Some(field)) = (target, after.and_then(|s| s.generating_field())) {
                self.start_generation(id, field);
            }
        }

        if matches!(event, NotebookEvent::SwitchLanguage { .. }) {
            self.resubmit_prose_blocks();
        }
    }

    /// The language-switch cascade: regenerate code for every block that has
    /// prose to regenerate it from. Blocks mid-generation or mid-edit fail
    /// the submit precondition and keep their current activity.
    fn resubmit_prose_blocks(&mut self) {
        let ids: Vec<BlockId> = self
            .doc
            .iter()
            .filter(|b| !b.prose.is_empty())
            .map(|b| b.id.clone())
            .collect();
        for id in ids {
            self.handle_dispatch(NotebookEvent::SubmitProse { id });
        }
    }

    fn start_generation(&mut self, id: BlockId, field: GenField) {
        let Some(block) = self.doc.get(&id) else {
            return;
        };
        let request = match field {
            GenField::Code => {
                GenerationRequest::code_from_prose(block.prose.clone(), self.doc.lang)
            }
            GenField::Prose => {
                GenerationRequest::prose_from_code(block.code.clone(), self.doc.lang)
            }
        };

        // Upgrade fails only when every handle is gone; the forwarder would
        // have nobody to report to and the driver is about to stop anyway.
        let Some(commands) = self.commands.upgrade() else {
            return;
        };

        let seq = self.seqs.entry(id.clone()).or_default();
        *seq += 1;
        let seq = *seq;
        tracing::debug!(%id, %field, seq, "starting generation");

        tokio::spawn(forward_generation(
            Arc::clone(&self.service),
            request,
            id.clone(),
            field,
            seq,
            commands,
        ));
        let _ = self.events.send(SessionEvent::GenerationStarted { id, field, seq });
    }

    fn handle_update(&mut self, id: BlockId, field: GenField, seq: u64, update: StreamUpdate) {
        if self.seqs.get(&id).copied() != Some(seq) {
            tracing::debug!(%id, seq, "dropping update from a superseded generation");
            return;
        }
        match update {
            StreamUpdate::Chunk(chunk) => {
                self.apply_event(&NotebookEvent::ReceivePartial {
                    id,
                    field,
                    text: chunk.into_text(),
                });
            }
            StreamUpdate::Done => {
                // The chunks were cumulative; whatever the field holds now is
                // the final value. No chunks at all settles the field empty.
                let text = self
                    .doc
                    .get(&id)
                    .map(|b| b.field(field).to_string())
                    .unwrap_or_default();
                self.finish_generation(id, field, seq, text);
            }
            StreamUpdate::Failed(failure) => {
                tracing::warn!(%id, %failure, "generation failed");
                self.finish_generation(id, field, seq, failure.placeholder().to_string());
            }
        }
    }

    fn finish_generation(&mut self, id: BlockId, field: GenField, seq: u64, text: String) {
        self.apply_event(&NotebookEvent::Complete {
            id: id.clone(),
            field,
            text,
        });
        let _ = self
            .events
            .send(SessionEvent::GenerationFinished { id, field, seq });
    }

    fn apply_event(&mut self, event: &NotebookEvent) {
        let next = reducer::apply(self.doc.clone(), event);
        if next != self.doc {
            self.doc = next;
            let _ = self.events.send(SessionEvent::DocumentChanged);
        }
    }
}

/// Run one generation and feed its updates back into the command queue.
///
/// Exactly one terminal update reaches the driver per call: a service error
/// or a stream that dies mid-flight is turned into a transport failure.
async fn forward_generation(
    service: Arc<dyn GenerationService>,
    request: GenerationRequest,
    id: BlockId,
    field: GenField,
    seq: u64,
    commands: mpsc::Sender<SessionCommand>,
) {
    let mut stream = match service.generate(request).await {
        Ok(stream) => stream,
        Err(err) => {
            let update = StreamUpdate::Failed(GenerationFailure::Transport(err.to_string()));
            let _ = commands
                .send(SessionCommand::Update {
                    id,
                    field,
                    seq,
                    update,
                })
                .await;
            return;
        }
    };

    while let Some(update) = stream.next_update().await {
        let terminal = update.is_terminal();
        let sent = commands
            .send(SessionCommand::Update {
                id: id.clone(),
                field,
                seq,
                update,
            })
            .await;
        if sent.is_err() || terminal {
            return;
        }
    }

    // The producer vanished without settling the stream.
    let update = StreamUpdate::Failed(GenerationFailure::Transport(
        "stream ended without a result".into(),
    ));
    let _ = commands
        .send(SessionCommand::Update {
            id,
            field,
            seq,
            update,
        })
        .await;
}
