use crate::engine::{DocumentEngine, EngineError};
use crate::models::{BlockType, ListKind, Mutation, NodeKind, Position, Range};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Hard cap on filtered results; the menu renders a bounded list.
pub const MAX_CANDIDATES: usize = 10;

pub type CustomApplyFn = dyn Fn(&mut dyn DocumentEngine, Position) -> Result<(), EngineError>;

/// Command mutation supplied as code rather than data.
#[derive(Clone)]
pub struct CustomApply(pub Rc<CustomApplyFn>);

impl fmt::Debug for CustomApply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomApply(..)")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub enum CommandAction {
    SetBlockType(BlockType),
    WrapInList(ListKind),
    InsertNode(NodeKind),
    #[serde(skip)]
    Custom(CustomApply),
}

/// Immutable registry entry. Registry order is the default order of filtered results.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CommandDescriptor {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub action: CommandAction,
}

impl CommandDescriptor {
    pub fn new(id: &str, title: &str, aliases: &[&str], action: CommandAction) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            description: None,
            action,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn custom(
        id: &str,
        title: &str,
        apply: impl Fn(&mut dyn DocumentEngine, Position) -> Result<(), EngineError> + 'static,
    ) -> Self {
        Self::new(id, title, &[], CommandAction::Custom(CustomApply(Rc::new(apply))))
    }

    /// Case-insensitive substring match against the title or any alias.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.title.to_lowercase().contains(&q)
            || self.aliases.iter().any(|a| a.to_lowercase().contains(&q))
    }

    /// Transform the document at the (collapsed) `range`.
    pub fn apply(&self, engine: &mut dyn DocumentEngine, range: Range) -> Result<(), EngineError> {
        let at = range.from;
        match &self.action {
            CommandAction::SetBlockType(block) => {
                engine.apply_mutation(Mutation::SetBlockType { at, block: *block })
            }
            CommandAction::WrapInList(list) => {
                engine.apply_mutation(Mutation::WrapInList { at, list: *list })
            }
            CommandAction::InsertNode(node) => {
                engine.apply_mutation(Mutation::InsertNode { at, node: *node })
            }
            CommandAction::Custom(CustomApply(f)) => f(engine, at),
        }
    }
}

/// Matching descriptors in registry order, capped at `MAX_CANDIDATES`. An empty query matches all.
pub fn filter(registry: &[Rc<CommandDescriptor>], query: &str) -> Vec<Rc<CommandDescriptor>> {
    registry
        .iter()
        .filter(|d| query.is_empty() || d.matches(query))
        .take(MAX_CANDIDATES)
        .cloned()
        .collect()
}

pub fn builtin_commands() -> Vec<CommandDescriptor> {
    use CommandAction::*;

    vec![
        CommandDescriptor::new("heading1", "Heading 1", &["h1"], SetBlockType(BlockType::Heading1))
            .with_description("Big section heading"),
        CommandDescriptor::new("heading2", "Heading 2", &["h2"], SetBlockType(BlockType::Heading2))
            .with_description("Medium section heading"),
        CommandDescriptor::new("heading3", "Heading 3", &["h3"], SetBlockType(BlockType::Heading3))
            .with_description("Small section heading"),
        CommandDescriptor::new("bulletList", "Bullet List", &["ul", "unordered"], WrapInList(ListKind::Bullet))
            .with_description("Create a simple bulleted list"),
        CommandDescriptor::new("numberedList", "Numbered List", &["ol", "ordered"], WrapInList(ListKind::Numbered))
            .with_description("Create a list with numbering"),
        CommandDescriptor::new("taskList", "Task List", &["todo", "checkbox"], WrapInList(ListKind::Task))
            .with_description("Track tasks with a to-do list"),
        CommandDescriptor::new("blockquote", "Blockquote", &["quote"], SetBlockType(BlockType::Blockquote))
            .with_description("Capture a quotation"),
        CommandDescriptor::new("codeBlock", "Code Block", &["code"], SetBlockType(BlockType::CodeBlock))
            .with_description("Capture a code snippet"),
        CommandDescriptor::new("horizontalRule", "Divider", &["hr", "rule"], InsertNode(NodeKind::HorizontalRule))
            .with_description("Visually divide blocks"),
        CommandDescriptor::new("table", "Table", &["grid"], InsertNode(NodeKind::Table))
            .with_description("Insert a table"),
        CommandDescriptor::new("paragraph", "Text", &["p", "paragraph"], SetBlockType(BlockType::Paragraph))
            .with_description("Just start typing with plain text"),
    ]
}

/// Built-in commands followed by `extra`, shared by reference with the menu.
pub fn build_registry(extra: &[CommandDescriptor]) -> Vec<Rc<CommandDescriptor>> {
    builtin_commands()
        .into_iter()
        .chain(extra.iter().cloned())
        .map(Rc::new)
        .collect()
}
