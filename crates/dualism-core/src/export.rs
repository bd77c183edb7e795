//! Flat-source export.
//!
//! Turns a notebook into one source string: each block becomes its prose as a
//! line comment followed by its code, blocks separated by a blank line.
//! Blocks with both sides empty are skipped. Pure and stateless.

use crate::notebook::Notebook;

/// Render the notebook as flat source in its target language.
///
/// Only the first prose line is comment-prefixed; the prose of exported
/// blocks is expected to be a single line.
pub fn export_source(doc: &Notebook) -> String {
    let prefix = doc.lang.comment_prefix();
    doc.iter()
        .filter(|b| !b.is_empty())
        .map(|b| format!("{prefix}{}\n{}", b.prose, b.code))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::lang::Language;

    #[test]
    fn test_single_block_bash() {
        let doc = Notebook::with_blocks(Language::Bash, vec![Block::with_content("a", "b")]);
        assert_eq!(export_source(&doc), "# a\nb");
    }

    #[test]
    fn test_slash_comment_languages() {
        let doc = Notebook::with_blocks(
            Language::JavaScript,
            vec![Block::with_content("greet", "console.log('hi')")],
        );
        assert_eq!(export_source(&doc), "// greet\nconsole.log('hi')");
    }

    #[test]
    fn test_blocks_joined_by_blank_line() {
        let doc = Notebook::with_blocks(
            Language::Python,
            vec![
                Block::with_content("one", "x = 1"),
                Block::with_content("two", "y = 2"),
            ],
        );
        assert_eq!(export_source(&doc), "# one\nx = 1\n\n# two\ny = 2");
    }

    #[test]
    fn test_empty_blocks_skipped() {
        let doc = Notebook::with_blocks(
            Language::Python,
            vec![
                Block::with_content("one", "x = 1"),
                Block::fresh(),
                Block::with_content("two", "y = 2"),
            ],
        );
        assert_eq!(export_source(&doc), "# one\nx = 1\n\n# two\ny = 2");
    }

    #[test]
    fn test_half_empty_block_still_exported() {
        let doc = Notebook::with_blocks(Language::Bash, vec![Block::with_content("note only", "")]);
        assert_eq!(export_source(&doc), "# note only\n");
    }

    #[test]
    fn test_empty_notebook_exports_empty() {
        let doc = Notebook::with_blocks(Language::Bash, vec![Block::fresh()]);
        assert_eq!(export_source(&doc), "");
    }
}
