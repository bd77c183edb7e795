//! Target language enumeration.
//!
//! A fixed closed set shared by three consumers: the lifecycle reducer
//! (`SwitchLanguage`), the generation wire (the `lang` tag on every request),
//! and the export transform (comment prefixes). The wire form is the exact
//! variant name (`"Bash"`, `"TypeScript"`) so a serialized document stays
//! readable.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Target language for the code side of every block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Language {
    /// Bourne-again shell.
    #[strum(serialize = "bash", serialize = "sh", serialize = "shell")]
    Bash,
    /// Python 3.
    #[strum(serialize = "python", serialize = "py")]
    Python,
    /// TypeScript.
    #[default]
    #[strum(serialize = "typescript", serialize = "ts")]
    TypeScript,
    /// JavaScript.
    #[strum(serialize = "javascript", serialize = "js")]
    JavaScript,
}

impl Language {
    /// Every supported language, in display order.
    pub const ALL: &'static [Language] = &[
        Language::Bash,
        Language::Python,
        Language::TypeScript,
        Language::JavaScript,
    ];

    /// Parse from string (case-insensitive).
    ///
    /// Supports short aliases: "sh"/"shell" -> Bash, "py" -> Python,
    /// "ts" -> TypeScript, "js" -> JavaScript.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation (the wire form).
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Bash => "Bash",
            Language::Python => "Python",
            Language::TypeScript => "TypeScript",
            Language::JavaScript => "JavaScript",
        }
    }

    /// Line-comment token for this language, trailing space included.
    ///
    /// Used by the export transform to turn a block's prose into a comment
    /// ahead of its code.
    pub fn comment_prefix(&self) -> &'static str {
        match self {
            Language::Bash | Language::Python => "# ",
            Language::TypeScript | Language::JavaScript => "// ",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_roundtrip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_str(lang.as_str()), Some(*lang));
        }
    }

    #[test]
    fn test_language_aliases() {
        assert_eq!(Language::from_str("sh"), Some(Language::Bash));
        assert_eq!(Language::from_str("shell"), Some(Language::Bash));
        assert_eq!(Language::from_str("py"), Some(Language::Python));
        assert_eq!(Language::from_str("ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_str("js"), Some(Language::JavaScript));
        // Case-insensitive
        assert_eq!(Language::from_str("PYTHON"), Some(Language::Python));
        assert_eq!(Language::from_str("typescript"), Some(Language::TypeScript));
        // Unknown
        assert_eq!(Language::from_str("cobol"), None);
    }

    #[test]
    fn test_comment_prefixes() {
        assert_eq!(Language::Bash.comment_prefix(), "# ");
        assert_eq!(Language::Python.comment_prefix(), "# ");
        assert_eq!(Language::TypeScript.comment_prefix(), "// ");
        assert_eq!(Language::JavaScript.comment_prefix(), "// ");
    }

    #[test]
    fn test_serde_wire_form() {
        // Wire form is the exact variant name.
        assert_eq!(
            serde_json::to_string(&Language::TypeScript).unwrap(),
            "\"TypeScript\""
        );
        let parsed: Language = serde_json::from_str("\"Bash\"").unwrap();
        assert_eq!(parsed, Language::Bash);
    }

    #[test]
    fn test_default_language() {
        assert_eq!(Language::default(), Language::TypeScript);
    }
}
