use serde::{Deserialize, Serialize};

/// Document position, counted in `char`s from the start of the document.
///
/// Block boundaries are a single `'\n'`, so positions stay stable across block type changes.
pub type Position = usize;

/// Half-open span `[from, to)` of document positions.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    pub from: Position,
    pub to: Position,
}

impl Range {
    pub fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }

    pub fn collapsed(at: Position) -> Self {
        Self { from: at, to: at }
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    /// True when `other` overlaps this span or sits directly against one of its edges.
    pub fn touches(&self, other: &Range) -> bool {
        other.from <= self.to && other.to >= self.from
    }
}

/// Caret rectangle as reported by the document engine (`coordinatesAt`).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct CaretRect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
}

/// Screen-space anchor used to place the menu near the caret.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Coordinates {
    pub top: f64,
    pub left: f64,
    pub height: f64,
}

impl From<CaretRect> for Coordinates {
    fn from(rect: CaretRect) -> Self {
        Self {
            top: rect.top,
            left: rect.left,
            height: (rect.bottom - rect.top).max(0.0),
        }
    }
}

/// Output of the trigger detector for one content-change event. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerMatch {
    pub query: String,
    /// Trigger character plus query; leading boundary whitespace is not included.
    pub range: Range,
    /// Full matched text, including the leading boundary character when there is one.
    pub matched_text: String,
    pub anchor: Coordinates,
}

#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum BlockType {
    #[default]
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    BulletListItem,
    NumberedListItem,
    TaskListItem,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    Table,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ListKind {
    Bullet,
    Numbered,
    Task,
}

impl ListKind {
    pub fn item_block(self) -> BlockType {
        match self {
            ListKind::Bullet => BlockType::BulletListItem,
            ListKind::Numbered => BlockType::NumberedListItem,
            ListKind::Task => BlockType::TaskListItem,
        }
    }
}

/// Standalone nodes that are inserted as their own block.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum NodeKind {
    HorizontalRule,
    Table,
}

impl NodeKind {
    pub fn block(self) -> BlockType {
        match self {
            NodeKind::HorizontalRule => BlockType::HorizontalRule,
            NodeKind::Table => BlockType::Table,
        }
    }
}

/// Mutations accepted by `DocumentEngine::apply_mutation`.
#[derive(Clone, Debug, PartialEq, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Mutation {
    DeleteRange(Range),
    SetBlockType { at: Position, block: BlockType },
    InsertNode { at: Position, node: NodeKind },
    WrapInList { at: Position, list: ListKind },
}

impl Mutation {
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// A committed edit, described by where it happened in the pre-edit document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentChange {
    pub from: Position,
    pub removed: usize,
    pub inserted: usize,
}

impl ContentChange {
    /// Span of the pre-edit document that was replaced.
    pub fn replaced(&self) -> Range {
        Range::new(self.from, self.from + self.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_range_touches_adjacent_and_overlapping() {
        let r = Range::new(5, 9);
        assert!(r.touches(&Range::collapsed(9)));
        assert!(r.touches(&Range::new(3, 5)));
        assert!(r.touches(&Range::new(6, 7)));
        assert!(!r.touches(&Range::new(0, 4)));
        assert!(!r.touches(&Range::collapsed(10)));
    }

    #[test]
    fn test_block_type_names_are_camel_case() {
        assert_eq!(BlockType::CodeBlock.to_string(), "codeBlock");
        assert_eq!(BlockType::from_str("heading1").ok(), Some(BlockType::Heading1));
        let json = serde_json::to_string(&BlockType::TaskListItem).expect("should serialize");
        assert_eq!(json, "\"taskListItem\"");
    }

    #[test]
    fn test_mutation_kind_names() {
        assert_eq!(Mutation::DeleteRange(Range::new(0, 1)).kind(), "delete-range");
        assert_eq!(
            Mutation::WrapInList {
                at: 0,
                list: ListKind::Bullet
            }
            .kind(),
            "wrap-in-list"
        );
    }

    #[test]
    fn test_coordinates_from_caret_rect() {
        let c = Coordinates::from(CaretRect {
            top: 10.0,
            left: 4.0,
            bottom: 28.0,
        });
        assert_eq!(c.height, 18.0);
        assert_eq!(c.left, 4.0);
    }
}
