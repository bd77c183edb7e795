//! Core document model and lifecycle reducer for Dualism.
//!
//! A Dualism notebook is an ordered list of blocks, each pairing a
//! natural-language prompt (`prose`) with a generated source fragment
//! (`code`) in the notebook's target language. Either side regenerates the
//! other; this crate holds the pure half of that loop.
//!
//! ```text
//!                ┌───────────────────────────────────────────┐
//!                │                 Notebook                  │
//!                │  lang: Language                           │
//!                │  blocks: [Block, Block, …]  (ordered)     │
//!                └───────────────────────────────────────────┘
//!                                    ▲
//!                                    │ apply(doc, event) -> doc'
//!                                    │
//!   NotebookEvent ───────────────────┘
//!   (edit / submit / receive-partial / complete / …)
//! ```
//!
//! Per block, two symmetric cycles and no terminal state:
//!
//! ```text
//!   Inert → EditingProse → GeneratingCode  → Inert   (prose drives code)
//!   Inert → EditingCode  → GeneratingProse → Inert   (code drives prose)
//! ```
//!
//! # Modules
//!
//! | Module     | Holds                                                |
//! |------------|------------------------------------------------------|
//! | [`lang`]   | `Language` enum and comment prefixes                 |
//! | [`block`]  | `BlockId`, `BlockState`, `GenField`, `Block`         |
//! | [`notebook`] | the `Notebook` container and the example document  |
//! | [`event`]  | the `NotebookEvent` vocabulary                       |
//! | [`reducer`]| the pure transition function                         |
//! | [`export`] | notebook to flat source                              |
//!
//! Everything here is synchronous and I/O-free. Generation requests, stream
//! handling, and event serialization per document live in `dualism-engine`,
//! which owns a live `Notebook` and feeds events through [`reducer::apply`].

pub mod block;
pub mod event;
pub mod export;
pub mod lang;
pub mod notebook;
pub mod reducer;

pub use block::{Block, BlockId, BlockState, GenField};
pub use event::NotebookEvent;
pub use export::export_source;
pub use lang::Language;
pub use notebook::Notebook;
pub use reducer::apply;
