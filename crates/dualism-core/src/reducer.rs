//! The lifecycle reducer: `(Notebook, NotebookEvent) -> Notebook`.
//!
//! Single point of truth for legal state transitions and for how streamed
//! partial results fold into a block. Pure: no I/O, no channels, no clocks.
//! The session driver owns the live notebook and replaces it with the value
//! returned here; nothing else mutates a block.
//!
//! Illegal events (unknown id, precondition mismatch) return the notebook
//! unchanged. They are logged at debug level and are never errors: a racing
//! duplicate `Complete` or a stale stream chunk must not corrupt state. The
//! precondition check on `ReceivePartial`/`Complete` (block must currently be
//! generating that exact field) is the mechanism that drops stale streams
//! after a mid-generation user edit.
//!
//! The one structural side effect lives in `Complete`: when the completing
//! block is the last block and settles with both fields non-empty, one fresh
//! inert block is appended. The rule keys on the Generating -> Inert edge,
//! not on the field values, so re-delivered completions can never append
//! twice.

use crate::block::BlockState;
use crate::event::NotebookEvent;
use crate::notebook::Notebook;

/// Apply one event to the notebook, returning the next notebook.
///
/// Deterministic modulo the fresh ids of appended blocks. Events for a given
/// block must arrive in stream order; the caller serializes delivery.
pub fn apply(mut doc: Notebook, event: &NotebookEvent) -> Notebook {
    match event {
        NotebookEvent::SwitchLanguage { lang } => {
            doc.lang = *lang;
            doc
        }

        NotebookEvent::AddBlock => {
            doc.push_fresh();
            doc
        }

        NotebookEvent::LoadExamples => {
            if doc.has_content() {
                tracing::debug!("load-examples dropped: notebook already has content");
                return doc;
            }
            Notebook::example()
        }

        NotebookEvent::EditProse { id, text } => {
            let Some(block) = doc.get_mut(id) else {
                tracing::debug!(%id, "edit-prose dropped: unknown block");
                return doc;
            };
            block.prose = text.clone();
            block.state = BlockState::EditingProse;
            doc
        }

        NotebookEvent::EditCode { id, text } => {
            let Some(block) = doc.get_mut(id) else {
                tracing::debug!(%id, "edit-code dropped: unknown block");
                return doc;
            };
            block.code = text.clone();
            block.state = BlockState::EditingCode;
            doc
        }

        NotebookEvent::SubmitProse { id } => {
            let Some(block) = doc.get_mut(id) else {
                tracing::debug!(%id, "submit-prose dropped: unknown block");
                return doc;
            };
            // Legal from EditingProse or Inert (re-submission, and the path
            // the language-switch cascade takes through settled blocks).
            if !matches!(block.state, BlockState::Inert | BlockState::EditingProse) {
                tracing::debug!(%id, state = %block.state, "submit-prose dropped");
                return doc;
            }
            // Clearing the old code signals "no result yet": stale content is
            // never shown as if it were fresh.
            block.code.clear();
            block.state = BlockState::GeneratingCode;
            doc
        }

        NotebookEvent::SubmitCode { id } => {
            let Some(block) = doc.get_mut(id) else {
                tracing::debug!(%id, "submit-code dropped: unknown block");
                return doc;
            };
            if !matches!(block.state, BlockState::Inert | BlockState::EditingCode) {
                tracing::debug!(%id, state = %block.state, "submit-code dropped");
                return doc;
            }
            block.prose.clear();
            block.state = BlockState::GeneratingProse;
            doc
        }

        NotebookEvent::ReceivePartial { id, field, text } => {
            let Some(block) = doc.get_mut(id) else {
                tracing::debug!(%id, "partial dropped: unknown block");
                return doc;
            };
            if block.state.generating_field() != Some(*field) {
                tracing::debug!(%id, %field, state = %block.state, "stale partial dropped");
                return doc;
            }
            block.set_field(*field, text.clone());
            doc
        }

        NotebookEvent::Complete { id, field, text } => {
            let Some(block) = doc.get_mut(id) else {
                tracing::debug!(%id, "completion dropped: unknown block");
                return doc;
            };
            if block.state.generating_field() != Some(*field) {
                tracing::debug!(%id, %field, state = %block.state, "stale completion dropped");
                return doc;
            }
            block.set_field(*field, text.clone());
            block.state = BlockState::Inert;
            let settled_full = !block.prose.is_empty() && !block.code.is_empty();
            if settled_full && doc.is_last(id) {
                doc.push_fresh();
            }
            doc
        }
    }
}
