//! Capability surface of the rich text document engine.
//!
//! The slash palette only observes the document through this trait and only mutates it
//! through `apply_mutation`. It never edits document content directly.

mod block_document;

pub use block_document::{BlockDocument, LayoutMetrics};

use crate::models::{BlockType, CaretRect, ContentChange, Mutation, Position, Range};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("position {position} is outside the document (length {len})")]
    OutOfBounds { position: Position, len: usize },

    #[error("range {}..{} is not a valid span", .0.from, .0.to)]
    InvalidRange(Range),

    #[error("{0} is not supported here")]
    Unsupported(&'static str),

    #[error("mutation rejected: {0}")]
    Rejected(String),
}

/// Current caret/selection as reported by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
}

impl Selection {
    pub fn caret(at: Position) -> Self {
        Self {
            anchor: at,
            head: at,
        }
    }

    /// The position the user is typing at.
    pub fn position(&self) -> Position {
        self.head
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }
}

/// Fired after every committed mutation, including user typing and pastes.
pub type ContentListener = Box<dyn FnMut(&ContentChange)>;

pub trait DocumentEngine {
    /// Up to `max_len` chars immediately preceding `position`.
    fn text_before(&self, position: Position, max_len: usize) -> Result<String, EngineError>;

    fn current_selection(&self) -> Selection;

    fn coordinates_at(&self, position: Position) -> Result<CaretRect, EngineError>;

    fn apply_mutation(&mut self, mutation: Mutation) -> Result<(), EngineError>;

    fn on_content_changed(&mut self, listener: ContentListener);

    fn enclosing_block_type(&self, position: Position) -> Result<BlockType, EngineError>;

    fn focus(&mut self);
}
