//! Event vocabulary for the lifecycle reducer.
//!
//! Every mutation of a [`Notebook`](crate::Notebook) is one of these tagged
//! variants passed through [`crate::reducer::apply`]. The serde form is
//! internally tagged (`"type"`, kebab-case) so a dispatched event reads as
//! `{"type": "edit-prose", "id": "b_…", "text": "…"}` in logs and bridges.

use serde::{Deserialize, Serialize};

use crate::block::{BlockId, GenField};
use crate::lang::Language;

/// One notebook mutation.
///
/// `ReceivePartial` and `Complete` are produced by the session driver while a
/// generation streams; everything else is a user intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NotebookEvent {
    /// Select a new target language. The session re-submits every block with
    /// non-empty prose afterwards; the reducer itself only records the switch.
    SwitchLanguage { lang: Language },
    /// Append a fresh inert block.
    AddBlock,
    /// Replace an untouched notebook with the built-in example blocks.
    LoadExamples,
    /// User typed in the prose side.
    EditProse { id: BlockId, text: String },
    /// User typed in the code side.
    EditCode { id: BlockId, text: String },
    /// Prose is ready; clear the code side and start generating it.
    SubmitProse { id: BlockId },
    /// Code is ready; clear the prose side and start generating it.
    SubmitCode { id: BlockId },
    /// A streaming generation delivered a cumulative snapshot of one field.
    ReceivePartial {
        id: BlockId,
        field: GenField,
        text: String,
    },
    /// A generation finished; the block settles with the final field value.
    Complete {
        id: BlockId,
        field: GenField,
        text: String,
    },
}

impl NotebookEvent {
    /// The kebab-case tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            NotebookEvent::SwitchLanguage { .. } => "switch-language",
            NotebookEvent::AddBlock => "add-block",
            NotebookEvent::LoadExamples => "load-examples",
            NotebookEvent::EditProse { .. } => "edit-prose",
            NotebookEvent::EditCode { .. } => "edit-code",
            NotebookEvent::SubmitProse { .. } => "submit-prose",
            NotebookEvent::SubmitCode { .. } => "submit-code",
            NotebookEvent::ReceivePartial { .. } => "receive-partial",
            NotebookEvent::Complete { .. } => "complete",
        }
    }

    /// The block this event targets, if it targets one.
    pub fn block_id(&self) -> Option<&BlockId> {
        match self {
            NotebookEvent::EditProse { id, .. }
            | NotebookEvent::EditCode { id, .. }
            | NotebookEvent::SubmitProse { id }
            | NotebookEvent::SubmitCode { id }
            | NotebookEvent::ReceivePartial { id, .. }
            | NotebookEvent::Complete { id, .. } => Some(id),
            NotebookEvent::SwitchLanguage { .. }
            | NotebookEvent::AddBlock
            | NotebookEvent::LoadExamples => None,
        }
    }
}
