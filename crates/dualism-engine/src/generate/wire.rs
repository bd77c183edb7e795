//! Generation service wire types and NDJSON framing.
//!
//! The service accepts one JSON request naming the input side plus a `lang`
//! tag, and answers with either a single JSON object or a newline-delimited
//! sequence of them, each carrying a cumulative snapshot of the generated
//! field:
//!
//! ```text
//! -> {"prose": "print a greeting", "lang": "Python"}
//! <- {"code": "print"}
//! <- {"code": "print('hi')"}
//!    (stream close: last object is the final value)
//! ```

use dualism_core::{GenField, Language};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// How much of a bad line to keep in error messages.
const ERROR_LINE_PREVIEW: usize = 120;

// ============================================================================
// Request
// ============================================================================

/// One generation request: exactly one input side plus the target language.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Prompt text, when generating code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prose: Option<String>,
    /// Code text, when generating prose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Target language for the code side.
    pub lang: Language,
}

impl GenerationRequest {
    /// Request code generated from prose.
    pub fn code_from_prose(prose: impl Into<String>, lang: Language) -> Self {
        Self {
            prose: Some(prose.into()),
            code: None,
            lang,
        }
    }

    /// Request prose generated from code.
    pub fn prose_from_code(code: impl Into<String>, lang: Language) -> Self {
        Self {
            prose: None,
            code: Some(code.into()),
            lang,
        }
    }

    /// The field this request produces.
    pub fn produces(&self) -> GenField {
        if self.prose.is_some() {
            GenField::Code
        } else {
            GenField::Prose
        }
    }

    /// The input text the generation reads from.
    pub fn input_text(&self) -> &str {
        match (&self.prose, &self.code) {
            (Some(prose), _) => prose,
            (None, Some(code)) => code,
            (None, None) => "",
        }
    }
}

// ============================================================================
// Chunk
// ============================================================================

/// One parsed stream object: a cumulative snapshot of the generated field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationChunk {
    /// Snapshot of generated code.
    Code { code: String },
    /// Snapshot of generated prose.
    Prose { prose: String },
}

impl GenerationChunk {
    /// Build a chunk for the given field.
    pub fn new(field: GenField, text: impl Into<String>) -> Self {
        match field {
            GenField::Code => Self::Code { code: text.into() },
            GenField::Prose => Self::Prose { prose: text.into() },
        }
    }

    /// Which field this chunk snapshots.
    pub fn field(&self) -> GenField {
        match self {
            Self::Code { .. } => GenField::Code,
            Self::Prose { .. } => GenField::Prose,
        }
    }

    /// The snapshot text.
    pub fn text(&self) -> &str {
        match self {
            Self::Code { code } => code,
            Self::Prose { prose } => prose,
        }
    }

    /// Consume into the snapshot text.
    pub fn into_text(self) -> String {
        match self {
            Self::Code { code } => code,
            Self::Prose { prose } => prose,
        }
    }
}

/// Parse one NDJSON line into a chunk.
pub fn parse_chunk(line: &str) -> crate::Result<GenerationChunk> {
    serde_json::from_str(line).map_err(|_| EngineError::Malformed {
        line: preview(line),
    })
}

fn preview(line: &str) -> String {
    if line.chars().count() > ERROR_LINE_PREVIEW {
        let head: String = line.chars().take(ERROR_LINE_PREVIEW).collect();
        format!("{head}…")
    } else {
        line.to_string()
    }
}

// ============================================================================
// NDJSON framing
// ============================================================================

/// Reassembles NDJSON lines from arbitrary byte chunks.
///
/// A line may arrive split across reads, including mid-codepoint; bytes are
/// buffered until a newline lands. Blank lines are dropped. A final
/// unterminated line is recovered by [`LineBuffer::finish`], which is how the
/// single-object response shape (no trailing newline) comes through.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// A new empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every line completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.trim_end_matches('\r').trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
        lines
    }

    /// Flush the trailing unterminated line, if any.
    pub fn finish(self) -> Option<String> {
        let tail = String::from_utf8_lossy(&self.buf);
        let tail = tail.trim();
        (!tail.is_empty()).then(|| tail.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Request ─────────────────────────────────────────────────────────

    #[test]
    fn test_request_serialization_shape() {
        let req = GenerationRequest::code_from_prose("say hi", Language::Python);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"prose":"say hi","lang":"Python"}"#);

        let req = GenerationRequest::prose_from_code("ls", Language::Bash);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"code":"ls","lang":"Bash"}"#);
    }

    #[test]
    fn test_request_produces_and_input() {
        let req = GenerationRequest::code_from_prose("say hi", Language::Python);
        assert_eq!(req.produces(), GenField::Code);
        assert_eq!(req.input_text(), "say hi");

        let req = GenerationRequest::prose_from_code("ls", Language::Bash);
        assert_eq!(req.produces(), GenField::Prose);
        assert_eq!(req.input_text(), "ls");
    }

    // ── Chunk ───────────────────────────────────────────────────────────

    #[test]
    fn test_parse_code_chunk() {
        let chunk = parse_chunk(r#"{"code": "print('hi')"}"#).unwrap();
        assert_eq!(chunk.field(), GenField::Code);
        assert_eq!(chunk.text(), "print('hi')");
    }

    #[test]
    fn test_parse_prose_chunk() {
        let chunk = parse_chunk(r#"{"prose": "Prints a greeting."}"#).unwrap();
        assert_eq!(chunk.field(), GenField::Prose);
        assert_eq!(chunk.text(), "Prints a greeting.");
    }

    #[test]
    fn test_parse_rejects_junk() {
        assert!(parse_chunk("not json").is_err());
        assert!(parse_chunk(r#"{"error": "boom"}"#).is_err());
        assert!(parse_chunk(r#"{"text": "wrong shape"}"#).is_err());
    }

    #[test]
    fn test_parse_error_previews_line() {
        let long = format!("{}{}", "x".repeat(300), "!");
        let err = parse_chunk(&long).unwrap_err();
        let msg = err.to_string();
        assert!(msg.len() < 300);
        assert!(msg.contains("malformed stream line"));
    }

    #[test]
    fn test_chunk_roundtrip() {
        let chunk = GenerationChunk::new(GenField::Code, "x = 1");
        let json = serde_json::to_string(&chunk).unwrap();
        assert_eq!(json, r#"{"code":"x = 1"}"#);
        assert_eq!(parse_chunk(&json).unwrap(), chunk);
    }

    // ── Line framing ────────────────────────────────────────────────────

    #[test]
    fn test_lines_in_one_chunk() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"{\"code\": \"a\"}\n{\"code\": \"ab\"}\n");
        assert_eq!(lines, vec![r#"{"code": "a"}"#, r#"{"code": "ab"}"#]);
        assert_eq!(buf.finish(), None);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"{\"code\": ").is_empty());
        let lines = buf.push(b"\"a\"}\n");
        assert_eq!(lines, vec![r#"{"code": "a"}"#]);
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let mut buf = LineBuffer::new();
        let line = "{\"code\": \"é\"}\n".as_bytes();
        // Split inside the two-byte é.
        let mid = line.iter().position(|&b| b > 0x7f).unwrap() + 1;
        assert!(buf.push(&line[..mid]).is_empty());
        let lines = buf.push(&line[mid..]);
        assert_eq!(lines, vec!["{\"code\": \"é\"}"]);
    }

    #[test]
    fn test_blank_lines_dropped() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"\n\n{\"code\": \"a\"}\n\r\n");
        assert_eq!(lines, vec![r#"{"code": "a"}"#]);
    }

    #[test]
    fn test_crlf_tolerated() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"{\"code\": \"a\"}\r\n");
        assert_eq!(lines, vec![r#"{"code": "a"}"#]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        // Single-object response with no trailing newline.
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"{\"prose\": \"one shot\"}").is_empty());
        assert_eq!(buf.finish(), Some(r#"{"prose": "one shot"}"#.to_string()));
    }
}
