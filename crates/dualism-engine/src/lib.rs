//! Generation engine and async session driver for Dualism notebooks.
//!
//! `dualism-core` is the pure half: documents, events, and the lifecycle
//! reducer. This crate is the impure half the reducer's contract calls "the
//! caller":
//!
//! | module     | role                                                  |
//! |------------|-------------------------------------------------------|
//! | `generate` | service seam, wire protocol, HTTP and local backends  |
//! | `session`  | driver task owning one live notebook and its queue    |
//! | `config`   | endpoint and timeout settings, TOML loading           |
//! | `error`    | engine error taxonomy                                 |
//!
//! A minimal embedding:
//!
//! ```no_run
//! use std::sync::Arc;
//! use dualism_core::{Notebook, NotebookEvent};
//! use dualism_engine::{EngineConfig, HttpGenerator, NotebookSession};
//!
//! # async fn demo() -> dualism_engine::Result<()> {
//! let config = EngineConfig::default();
//! let service = Arc::new(HttpGenerator::from_config(&config));
//! let handle = NotebookSession::spawn(service, Notebook::new(config.default_lang));
//!
//! let notebook = handle.snapshot().await?;
//! let id = notebook.blocks[0].id.clone();
//! handle
//!     .dispatch(NotebookEvent::EditProse {
//!         id: id.clone(),
//!         text: "list files".into(),
//!     })
//!     .await?;
//! handle.dispatch(NotebookEvent::SubmitProse { id }).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod generate;
pub mod session;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use generate::{
    CompletionPrompt, GenerationChunk, GenerationFailure, GenerationRequest, GenerationService,
    GenerationStream, HttpGenerator, LocalGenerator, StreamUpdate, TextCompletion, TextDeltaStream,
};
pub use session::{NotebookSession, SessionEvent, SessionHandle};
