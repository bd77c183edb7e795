//! Block identity, lifecycle state, and content.
//!
//! A block pairs a natural-language prompt (`prose`) with a generated source
//! fragment (`code`). The single `state` tag is the whole concurrency story:
//! a block is editing one side, generating one side, or inert — never two of
//! those at once. Transitions live in [`crate::reducer`]; this module only
//! defines the data and the field-by-tag primitive the streaming merge uses.

use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Alphabet for block id tokens. Unambiguous: no `I`, `O`, `0`, or `1`.
const ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz23456789";

/// Token length after the role prefix. 12 symbols over 58 is far past any
/// realistic collision horizon for a single session.
const ID_TOKEN_LEN: usize = 12;

// ============================================================================
// BlockId
// ============================================================================

/// Opaque unique block identifier.
///
/// Assigned at creation, stable for the block's lifetime, never reused.
/// Format: `"b_"` role prefix plus a random 12-symbol token, e.g.
/// `b_XkR2mwq7TacV`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Generate a fresh random id.
    pub fn fresh() -> Self {
        let mut rng = rand::thread_rng();
        let mut token = String::with_capacity(2 + ID_TOKEN_LEN);
        token.push_str("b_");
        for _ in 0..ID_TOKEN_LEN {
            let idx = rng.gen_range(0..ID_ALPHABET.len());
            token.push(ID_ALPHABET[idx] as char);
        }
        Self(token)
    }

    /// The full id string, prefix included.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

// ============================================================================
// GenField
// ============================================================================

/// Which side of a block a generation produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum GenField {
    /// The generated source fragment.
    Code,
    /// The natural-language prompt.
    Prose,
}

impl GenField {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            GenField::Code => "code",
            GenField::Prose => "prose",
        }
    }

    /// The other side: the field a generation reads its input from.
    pub fn opposite(&self) -> GenField {
        match self {
            GenField::Code => GenField::Prose,
            GenField::Prose => GenField::Code,
        }
    }
}

impl std::fmt::Display for GenField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// BlockState
// ============================================================================

/// Per-block lifecycle state.
///
/// Two symmetric cycles, no terminal state:
///
/// ```text
/// Inert ──EditProse──▶ EditingProse ──SubmitProse──▶ GeneratingCode ──Complete──▶ Inert
/// Inert ──EditCode───▶ EditingCode ──SubmitCode───▶ GeneratingProse ──Complete──▶ Inert
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum BlockState {
    /// Settled: nothing being edited, nothing in flight.
    #[default]
    Inert,
    /// The user is typing in the prose side.
    #[strum(serialize = "editing-prose")]
    EditingProse,
    /// The user is typing in the code side.
    #[strum(serialize = "editing-code")]
    EditingCode,
    /// A code generation for this block is in flight; `code` holds the most
    /// recent partial result.
    #[strum(serialize = "generating-code")]
    GeneratingCode,
    /// A prose generation for this block is in flight; `prose` holds the most
    /// recent partial result.
    #[strum(serialize = "generating-prose")]
    GeneratingProse,
}

impl BlockState {
    /// Parse from string (case-insensitive kebab form).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockState::Inert => "inert",
            BlockState::EditingProse => "editing-prose",
            BlockState::EditingCode => "editing-code",
            BlockState::GeneratingCode => "generating-code",
            BlockState::GeneratingProse => "generating-prose",
        }
    }

    /// Check if the block is settled.
    pub fn is_inert(&self) -> bool {
        matches!(self, BlockState::Inert)
    }

    /// Check if the user is editing either side.
    pub fn is_editing(&self) -> bool {
        matches!(self, BlockState::EditingProse | BlockState::EditingCode)
    }

    /// Check if a generation is in flight for either side.
    pub fn is_generating(&self) -> bool {
        matches!(self, BlockState::GeneratingCode | BlockState::GeneratingProse)
    }

    /// The field the in-flight generation is producing, if any.
    ///
    /// This is the precondition check for `ReceivePartial` and `Complete`:
    /// a stream update lands only while the block is generating its field.
    pub fn generating_field(&self) -> Option<GenField> {
        match self {
            BlockState::GeneratingCode => Some(GenField::Code),
            BlockState::GeneratingProse => Some(GenField::Prose),
            _ => None,
        }
    }
}

impl std::fmt::Display for BlockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Block
// ============================================================================

/// One prompt/code pair with lifecycle state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Stable identity, assigned at creation.
    pub id: BlockId,
    /// Natural-language prompt (possibly empty).
    pub prose: String,
    /// Source fragment in the document's target language (possibly empty).
    pub code: String,
    /// Lifecycle state.
    pub state: BlockState,
}

impl Block {
    /// Create an empty inert block with a fresh id.
    pub fn fresh() -> Self {
        Self {
            id: BlockId::fresh(),
            prose: String::new(),
            code: String::new(),
            state: BlockState::Inert,
        }
    }

    /// Create an inert block with preset content and a fresh id.
    pub fn with_content(prose: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: BlockId::fresh(),
            prose: prose.into(),
            code: code.into(),
            state: BlockState::Inert,
        }
    }

    /// Check whether both sides are empty.
    pub fn is_empty(&self) -> bool {
        self.prose.is_empty() && self.code.is_empty()
    }

    /// Read one side by tag.
    pub fn field(&self, field: GenField) -> &str {
        match field {
            GenField::Code => &self.code,
            GenField::Prose => &self.prose,
        }
    }

    /// Overwrite one side by tag. The streaming-merge primitive: every
    /// partial snapshot replaces the field wholesale rather than appending.
    pub fn set_field(&mut self, field: GenField, text: String) {
        match field {
            GenField::Code => self.code = text,
            GenField::Prose => self.prose = text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    // ── BlockId ─────────────────────────────────────────────────────────

    #[test]
    fn test_fresh_id_format() {
        let id = BlockId::fresh();
        let s = id.as_str();
        assert!(s.starts_with("b_"), "missing role prefix: {s}");
        assert_eq!(s.len(), 2 + ID_TOKEN_LEN);
        for c in s[2..].chars() {
            assert!(
                ID_ALPHABET.contains(&(c as u8)),
                "character {c:?} outside the id alphabet"
            );
        }
    }

    #[test]
    fn test_fresh_ids_unique() {
        let ids: HashSet<String> = (0..200)
            .map(|_| BlockId::fresh().as_str().to_owned())
            .collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = BlockId::fresh();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_str()));
        let back: BlockId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_id_debug_display() {
        let id = BlockId::fresh();
        assert_eq!(format!("{id}"), id.as_str());
        assert_eq!(format!("{id:?}"), format!("BlockId({})", id.as_str()));
    }

    // ── GenField ────────────────────────────────────────────────────────

    #[test]
    fn test_gen_field_roundtrip() {
        assert_eq!(GenField::from_str("code"), Some(GenField::Code));
        assert_eq!(GenField::from_str("PROSE"), Some(GenField::Prose));
        assert_eq!(GenField::from_str("both"), None);
        assert_eq!(GenField::Code.as_str(), "code");
    }

    #[test]
    fn test_gen_field_opposite() {
        assert_eq!(GenField::Code.opposite(), GenField::Prose);
        assert_eq!(GenField::Prose.opposite(), GenField::Code);
    }

    // ── BlockState ──────────────────────────────────────────────────────

    #[test]
    fn test_state_string_forms() {
        assert_eq!(BlockState::Inert.as_str(), "inert");
        assert_eq!(BlockState::EditingProse.as_str(), "editing-prose");
        assert_eq!(BlockState::GeneratingCode.as_str(), "generating-code");
        assert_eq!(
            BlockState::from_str("generating-prose"),
            Some(BlockState::GeneratingProse)
        );
        assert_eq!(BlockState::from_str("busy"), None);
    }

    #[test]
    fn test_state_serde_kebab() {
        assert_eq!(
            serde_json::to_string(&BlockState::EditingCode).unwrap(),
            "\"editing-code\""
        );
        let parsed: BlockState = serde_json::from_str("\"generating-code\"").unwrap();
        assert_eq!(parsed, BlockState::GeneratingCode);
    }

    #[test]
    fn test_state_predicates() {
        assert!(BlockState::Inert.is_inert());
        assert!(BlockState::EditingProse.is_editing());
        assert!(BlockState::EditingCode.is_editing());
        assert!(BlockState::GeneratingCode.is_generating());
        assert!(BlockState::GeneratingProse.is_generating());
        assert!(!BlockState::Inert.is_generating());
        assert!(!BlockState::GeneratingCode.is_editing());
    }

    #[test]
    fn test_generating_field() {
        assert_eq!(
            BlockState::GeneratingCode.generating_field(),
            Some(GenField::Code)
        );
        assert_eq!(
            BlockState::GeneratingProse.generating_field(),
            Some(GenField::Prose)
        );
        assert_eq!(BlockState::EditingProse.generating_field(), None);
        assert_eq!(BlockState::Inert.generating_field(), None);
    }

    // ── Block ───────────────────────────────────────────────────────────

    #[test]
    fn test_fresh_block() {
        let block = Block::fresh();
        assert!(block.prose.is_empty());
        assert!(block.code.is_empty());
        assert_eq!(block.state, BlockState::Inert);
        assert!(block.is_empty());
    }

    #[test]
    fn test_with_content() {
        let block = Block::with_content("say hi", "echo hi");
        assert_eq!(block.prose, "say hi");
        assert_eq!(block.code, "echo hi");
        assert_eq!(block.state, BlockState::Inert);
        assert!(!block.is_empty());
    }

    #[test]
    fn test_field_access_by_tag() {
        let mut block = Block::fresh();
        block.set_field(GenField::Prose, "print a greeting".into());
        block.set_field(GenField::Code, "print('hi')".into());
        assert_eq!(block.field(GenField::Prose), "print a greeting");
        assert_eq!(block.field(GenField::Code), "print('hi')");

        // Snapshots replace, never append.
        block.set_field(GenField::Code, "print('hello')".into());
        assert_eq!(block.field(GenField::Code), "print('hello')");
    }

    #[test]
    fn test_half_empty_block_is_not_empty() {
        let mut block = Block::fresh();
        block.prose = "only prose".into();
        assert!(!block.is_empty());
    }
}
