//! Ordered block container with a target language.
//!
//! The [`Notebook`] is the unit the reducer transforms: an append-only list of
//! blocks (display order = vector order) plus the selected target language.
//! There is exactly one live notebook per editing session and no undo history.
//! Structural edits (append, replace-with-examples) live here; transition
//! legality lives in [`crate::reducer`].

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId};
use crate::lang::Language;

/// Ordered sequence of blocks plus a selected target language.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    /// Target language for every code side.
    pub lang: Language,
    /// Blocks in display order. Append-only; blocks are never deleted.
    pub blocks: Vec<Block>,
}

impl Notebook {
    /// A new notebook with a single fresh inert block.
    pub fn new(lang: Language) -> Self {
        Self {
            lang,
            blocks: vec![Block::fresh()],
        }
    }

    /// A notebook with preset blocks. Used by [`Notebook::example`] and tests.
    pub fn with_blocks(lang: Language, blocks: Vec<Block>) -> Self {
        Self { lang, blocks }
    }

    /// The built-in example notebook: two settled TypeScript pairs a first-run
    /// user can regenerate or export straight away.
    pub fn example() -> Self {
        Self::with_blocks(
            Language::TypeScript,
            vec![
                Block::with_content("Hello world", "console.log('Hello')"),
                Block::with_content(
                    r#"Function to generate a random id with a string prefix. For example, makeID("b") -> "b_abc234"."#,
                    r#"function makeID(prefix: string): string {
  const characters =
    "ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz23456789";
  let result = "";
  const charactersLength = characters.length;
  for (let i = 0; i < 12; i++) {
    result += characters.charAt(Math.floor(Math.random() * charactersLength));
  }
  return `${prefix}_${result}`;
}"#,
                ),
            ],
        )
    }

    /// Look up a block by id.
    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    /// Look up a block by id, mutably.
    pub fn get_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| &b.id == id)
    }

    /// The last block, if any.
    pub fn last(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Check whether `id` names the last block.
    pub fn is_last(&self, id: &BlockId) -> bool {
        self.blocks.last().is_some_and(|b| &b.id == id)
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check whether the notebook has no blocks at all.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Check whether any block carries content in either field.
    pub fn has_content(&self) -> bool {
        self.blocks.iter().any(|b| !b.is_empty())
    }

    /// Append a fresh inert block and return its id.
    pub fn push_fresh(&mut self) -> BlockId {
        let block = Block::fresh();
        let id = block.id.clone();
        self.blocks.push(block);
        id
    }

    /// Iterate blocks in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}
