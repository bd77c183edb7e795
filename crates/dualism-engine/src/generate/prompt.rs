//! Instruction templates for the completion backend.
//!
//! Two directions, each a system instruction plus a user message wrapping the
//! block's input text. The completion model sees nothing else: no
//! conversation history, no other blocks.

use dualism_core::Language;

/// System instruction for prose -> code generation.
pub fn code_system(lang: Language) -> String {
    format!(
        "Respond with a fragment of {lang} code following best practices. \
         Respond only with code, without preamble or explanation. \
         Do not include usage examples."
    )
}

/// User message for prose -> code generation.
pub fn code_user(prose: &str) -> String {
    format!("Write code that does the following: {prose}")
}

/// System instruction for code -> prose generation.
pub fn prose_system(lang: Language) -> String {
    format!(
        "Respond with prose that would be a useful, concise comment to add \
         before this {lang} code. Respond with only the text content of the \
         comment, no explanation or syntax."
    )
}

/// User message for code -> prose generation.
pub fn prose_user(code: &str) -> String {
    format!("Write prose describing the following code: {code}")
}
