use super::{ContentListener, DocumentEngine, EngineError, Selection};
use crate::models::{BlockType, CaretRect, ContentChange, Mutation, NodeKind, Position, Range};

/// Synthetic monospace layout used to derive caret coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutMetrics {
    pub origin_top: f64,
    pub origin_left: f64,
    pub line_height: f64,
    pub char_width: f64,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            origin_top: 0.0,
            origin_left: 0.0,
            line_height: 20.0,
            char_width: 8.0,
        }
    }
}

/// In-memory block document.
///
/// The text is stored flat with one `'\n'` between blocks; `blocks[i]` is the type of line `i`.
pub struct BlockDocument {
    text: String,
    blocks: Vec<BlockType>,
    selection: Selection,
    focused: bool,
    pub metrics: LayoutMetrics,
    listeners: Vec<ContentListener>,
    #[cfg(test)]
    fail_next: Option<&'static str>,
}

fn char_to_byte(s: &str, pos: Position) -> usize {
    s.char_indices().nth(pos).map(|(i, _)| i).unwrap_or(s.len())
}

impl BlockDocument {
    pub fn new(text: &str) -> Self {
        let lines = text.split('\n').count();
        let len = text.chars().count();
        Self {
            text: text.to_string(),
            blocks: vec![BlockType::Paragraph; lines],
            selection: Selection::caret(len),
            focused: true,
            metrics: LayoutMetrics::default(),
            listeners: vec![],
            #[cfg(test)]
            fail_next: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// `(block type, block text)` pairs in document order.
    pub fn blocks(&self) -> Vec<(BlockType, String)> {
        self.blocks
            .iter()
            .copied()
            .zip(self.text.split('\n').map(str::to_string))
            .collect()
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn set_caret(&mut self, at: Position) {
        self.selection = Selection::caret(at.min(self.len()));
    }

    pub fn set_block_type(&mut self, line: usize, block: BlockType) {
        if let Some(b) = self.blocks.get_mut(line) {
            *b = block;
        }
    }

    /// Types `s` at the caret, as the user would.
    pub fn type_text(&mut self, s: &str) -> Result<(), EngineError> {
        let at = self.selection.position();
        self.replace(Range::collapsed(at), s)
    }

    /// Removes the char before the caret.
    pub fn backspace(&mut self) -> Result<(), EngineError> {
        let at = self.selection.position();
        if at == 0 {
            return Ok(());
        }
        self.replace(Range::new(at - 1, at), "")
    }

    /// Replaces `range` with `inserted` and leaves the caret after the inserted text.
    pub fn replace(&mut self, range: Range, inserted: &str) -> Result<(), EngineError> {
        self.check_range(range)?;

        let first_line = self.line_of(range.from);
        let start = char_to_byte(&self.text, range.from);
        let end = char_to_byte(&self.text, range.to);
        let removed_lines = self.text[start..end].matches('\n').count();
        let added_lines = inserted.matches('\n').count();

        self.text.replace_range(start..end, inserted);
        for _ in 0..removed_lines {
            self.blocks.remove(first_line + 1);
        }
        for _ in 0..added_lines {
            self.blocks.insert(first_line + 1, BlockType::Paragraph);
        }

        let inserted_len = inserted.chars().count();
        self.selection = Selection::caret(range.from + inserted_len);
        self.emit(ContentChange {
            from: range.from,
            removed: range.len(),
            inserted: inserted_len,
        });
        Ok(())
    }

    /// Reconciles the document with text edited outside of it (e.g. a textarea),
    /// committing the difference as one change.
    pub fn sync_text(&mut self, next: &str, caret: Position) -> Result<(), EngineError> {
        if next == self.text {
            self.set_caret(caret);
            return Ok(());
        }

        let old: Vec<char> = self.text.chars().collect();
        let new: Vec<char> = next.chars().collect();
        let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
        let max_suffix = old.len().min(new.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let inserted: String = new[prefix..new.len() - suffix].iter().collect();
        self.replace(Range::new(prefix, old.len() - suffix), &inserted)?;
        self.set_caret(caret);
        Ok(())
    }

    fn line_of(&self, position: Position) -> usize {
        self.text.chars().take(position).filter(|c| *c == '\n').count()
    }

    fn line_start(&self, line: usize) -> Position {
        if line == 0 {
            return 0;
        }
        let mut seen = 0;
        for (i, c) in self.text.chars().enumerate() {
            if c == '\n' {
                seen += 1;
                if seen == line {
                    return i + 1;
                }
            }
        }
        self.len()
    }

    fn line_end(&self, line: usize) -> Position {
        let start = self.line_start(line);
        start
            + self
                .text
                .chars()
                .skip(start)
                .take_while(|c| *c != '\n')
                .count()
    }

    fn check_position(&self, position: Position) -> Result<(), EngineError> {
        let len = self.len();
        if position > len {
            return Err(EngineError::OutOfBounds { position, len });
        }
        Ok(())
    }

    fn check_range(&self, range: Range) -> Result<(), EngineError> {
        if range.from > range.to {
            return Err(EngineError::InvalidRange(range));
        }
        self.check_position(range.to)
    }

    fn emit(&mut self, change: ContentChange) {
        for listener in self.listeners.iter_mut() {
            listener(&change);
        }
    }

    fn insert_node(&mut self, at: Position, node: NodeKind) -> Result<(), EngineError> {
        let line = self.line_of(at);
        let line_is_empty = self.line_start(line) == self.line_end(line);

        if line_is_empty {
            // Reuse the empty block and open a paragraph below it for further typing.
            self.blocks[line] = node.block();
            let end = self.line_end(line);
            self.replace(Range::collapsed(end), "\n")?;
        } else {
            let end = self.line_end(line);
            self.replace(Range::collapsed(end), "\n\n")?;
            self.blocks[line + 1] = node.block();
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn fail_next_mutation(&mut self, kind: &'static str) {
        self.fail_next = Some(kind);
    }

    #[cfg(test)]
    fn take_injected_failure(&mut self, mutation: &Mutation) -> Result<(), EngineError> {
        if self.fail_next == Some(mutation.kind()) {
            self.fail_next = None;
            return Err(EngineError::Rejected(mutation.kind().to_string()));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn take_injected_failure(&mut self, _mutation: &Mutation) -> Result<(), EngineError> {
        Ok(())
    }
}

impl DocumentEngine for BlockDocument {
    fn text_before(&self, position: Position, max_len: usize) -> Result<String, EngineError> {
        self.check_position(position)?;
        let start = position.saturating_sub(max_len);
        Ok(self
            .text
            .chars()
            .skip(start)
            .take(position - start)
            .collect())
    }

    fn current_selection(&self) -> Selection {
        self.selection
    }

    fn coordinates_at(&self, position: Position) -> Result<CaretRect, EngineError> {
        self.check_position(position)?;
        let line = self.line_of(position);
        let col = position - self.line_start(line);
        let m = self.metrics;
        let top = m.origin_top + line as f64 * m.line_height;
        Ok(CaretRect {
            top,
            left: m.origin_left + col as f64 * m.char_width,
            bottom: top + m.line_height,
        })
    }

    fn apply_mutation(&mut self, mutation: Mutation) -> Result<(), EngineError> {
        self.take_injected_failure(&mutation)?;

        match mutation {
            Mutation::DeleteRange(range) => self.replace(range, ""),
            Mutation::SetBlockType { at, block } => {
                self.check_position(at)?;
                let line = self.line_of(at);
                self.blocks[line] = block;
                self.emit(ContentChange {
                    from: at,
                    removed: 0,
                    inserted: 0,
                });
                Ok(())
            }
            Mutation::WrapInList { at, list } => {
                self.check_position(at)?;
                let line = self.line_of(at);
                if self.blocks[line] == BlockType::CodeBlock {
                    return Err(EngineError::Unsupported("wrapping a code block in a list"));
                }
                self.blocks[line] = list.item_block();
                self.emit(ContentChange {
                    from: at,
                    removed: 0,
                    inserted: 0,
                });
                Ok(())
            }
            Mutation::InsertNode { at, node } => {
                self.check_position(at)?;
                self.insert_node(at, node)
            }
        }
    }

    fn on_content_changed(&mut self, listener: ContentListener) {
        self.listeners.push(listener);
    }

    fn enclosing_block_type(&self, position: Position) -> Result<BlockType, EngineError> {
        self.check_position(position)?;
        Ok(self.blocks[self.line_of(position)])
    }

    fn focus(&mut self) {
        self.focused = true;
    }
}
