use crate::engine::{DocumentEngine, EngineError};
use crate::menu::{CloseReason, MenuController};
use crate::models::{Mutation, Position, Range};
use crate::registry::CommandDescriptor;
use crate::trigger::is_word_char;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlashError {
    /// The stored range no longer points at the trigger text. Benign race with another edit.
    #[error("trigger range {}..{} no longer matches the document", .range.from, .range.to)]
    StaleRange {
        range: Range,
        #[source]
        source: Option<EngineError>,
    },

    /// The selected command failed after the trigger text was already deleted.
    #[error("command `{command}` failed to apply")]
    MutationApply {
        command: String,
        #[source]
        source: EngineError,
    },
}

#[derive(Debug)]
pub enum ExecutionOutcome {
    Applied { at: Position },
    /// Nothing was mutated.
    Aborted(SlashError),
    /// The trigger text is gone but the command did not apply.
    Failed(SlashError),
}

impl ExecutionOutcome {
    pub fn error(&self) -> Option<&SlashError> {
        match self {
            ExecutionOutcome::Applied { .. } => None,
            ExecutionOutcome::Aborted(e) | ExecutionOutcome::Failed(e) => Some(e),
        }
    }
}

fn stale(range: Range, source: Option<EngineError>) -> SlashError {
    SlashError::StaleRange { range, source }
}

/// Check `range` against the live document and return the span to delete.
///
/// The span must start with the trigger character. When the trigger sits immediately before
/// `range.from` instead, the span is widened left by one so the whole `/query` goes. The end is
/// then extended over any query chars between `range.to` and the caret.
pub(crate) fn revalidate_range<E: DocumentEngine + ?Sized>(
    engine: &E,
    range: Range,
    trigger: char,
) -> Result<Range, SlashError> {
    if range.is_empty() {
        return Err(stale(range, None));
    }

    let text = engine
        .text_before(range.to, range.len())
        .map_err(|e| stale(range, Some(e)))?;
    if text.chars().count() != range.len() {
        return Err(stale(range, None));
    }
    if text.starts_with(trigger) {
        return extend_to_caret(engine, range);
    }

    if range.from > 0 {
        let before = engine
            .text_before(range.from, 1)
            .map_err(|e| stale(range, Some(e)))?;
        if before.starts_with(trigger) {
            return extend_to_caret(engine, Range::new(range.from - 1, range.to));
        }
    }

    Err(stale(range, None))
}

/// Grow `range.to` over the word chars that follow it, stopping at the caret.
fn extend_to_caret<E: DocumentEngine + ?Sized>(
    engine: &E,
    range: Range,
) -> Result<Range, SlashError> {
    let caret = engine.current_selection().position();
    if caret <= range.to {
        return Ok(range);
    }

    let tail = engine
        .text_before(caret, caret - range.to)
        .map_err(|e| stale(range, Some(e)))?;
    let extra = tail.chars().take_while(|c| is_word_char(*c)).count();
    Ok(Range::new(range.from, range.to + extra))
}

fn run<E: DocumentEngine>(
    engine: &mut E,
    descriptor: &CommandDescriptor,
    range: Range,
    trigger: char,
) -> ExecutionOutcome {
    let range = match revalidate_range(engine, range, trigger) {
        Ok(r) => r,
        Err(e) => return ExecutionOutcome::Aborted(e),
    };

    if let Err(e) = engine.apply_mutation(Mutation::DeleteRange(range)) {
        return ExecutionOutcome::Aborted(stale(range, Some(e)));
    }

    let at = Range::collapsed(range.from);
    match descriptor.apply(engine, at) {
        Ok(()) => ExecutionOutcome::Applied { at: range.from },
        Err(source) => ExecutionOutcome::Failed(SlashError::MutationApply {
            command: descriptor.id.clone(),
            source,
        }),
    }
}

/// Replace the trigger text with `descriptor`'s effect.
///
/// Whatever happens, the menu ends up closed and focus is back in the document.
/// Errors are reported through the returned outcome, never propagated.
pub fn execute<E: DocumentEngine>(
    engine: &mut E,
    controller: &mut MenuController,
    descriptor: &CommandDescriptor,
    trigger: char,
) -> ExecutionOutcome {
    let outcome = match controller.state().as_open() {
        Some(menu) => run(engine, descriptor, menu.range, trigger),
        None => ExecutionOutcome::Aborted(stale(Range::collapsed(0), None)),
    };

    match &outcome {
        ExecutionOutcome::Applied { at } => {
            tracing::debug!(command = %descriptor.id, at, "slash command applied")
        }
        ExecutionOutcome::Aborted(e) => tracing::debug!(error = %e, "slash command aborted"),
        ExecutionOutcome::Failed(e) => {
            tracing::warn!(command = %descriptor.id, error = %e, "slash command failed")
        }
    }

    controller.close(CloseReason::Executed);
    engine.focus();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BlockDocument;
    use crate::models::{BlockType, Coordinates, TriggerMatch};
    use crate::registry::build_registry;
    use std::rc::Rc;

    fn controller_open_at(range: Range) -> (MenuController, Rc<CommandDescriptor>) {
        let registry = build_registry(&[]);
        let heading1 = registry[0].clone();
        let mut c = MenuController::new(registry);
        c.activate(&TriggerMatch {
            query: String::new(),
            range,
            matched_text: "/".to_string(),
            anchor: Coordinates::default(),
        });
        assert!(c.is_open());
        (c, heading1)
    }

    #[test]
    fn test_execute_replaces_trigger_with_heading() {
        let mut doc = BlockDocument::new("Todo /xyz");
        doc.blur();
        let (mut c, heading1) = controller_open_at(Range::new(5, 9));

        let outcome = execute(&mut doc, &mut c, &heading1, '/');
        assert!(matches!(outcome, ExecutionOutcome::Applied { at: 5 }));
        assert_eq!(doc.text(), "Todo ");
        assert_eq!(doc.enclosing_block_type(5).expect("in bounds"), BlockType::Heading1);
        assert!(!c.is_open());
        assert!(doc.has_focus());
    }

    #[test]
    fn test_execute_widens_range_missing_the_trigger() {
        let mut doc = BlockDocument::new("Todo /xyz");
        let (mut c, heading1) = controller_open_at(Range::new(6, 9));

        let outcome = execute(&mut doc, &mut c, &heading1, '/');
        assert!(outcome.error().is_none());
        assert_eq!(doc.text(), "Todo ");
    }

    #[test]
    fn test_execute_short_range_still_removes_whole_query() {
        let mut doc = BlockDocument::new("Todo /xyz");
        let (mut c, heading1) = controller_open_at(Range::new(5, 8));

        let outcome = execute(&mut doc, &mut c, &heading1, '/');
        assert!(matches!(outcome, ExecutionOutcome::Applied { at: 5 }));
        assert_eq!(doc.text(), "Todo ");
        assert_eq!(doc.enclosing_block_type(5).expect("in bounds"), BlockType::Heading1);
    }

    #[test]
    fn test_revalidate_extension_stops_at_caret_and_non_word_chars() {
        let mut doc = BlockDocument::new("a /xy z");
        assert_eq!(
            revalidate_range(&doc, Range::new(2, 3), '/').expect("valid range"),
            Range::new(2, 5)
        );

        doc.set_caret(4);
        assert_eq!(
            revalidate_range(&doc, Range::new(2, 3), '/').expect("valid range"),
            Range::new(2, 4)
        );
    }

    #[test]
    fn test_revalidate_keeps_exact_range() {
        let doc = BlockDocument::new("/h1");
        let r = revalidate_range(&doc, Range::new(0, 3), '/').expect("valid range");
        assert_eq!(r, Range::new(0, 3));
    }

    #[test]
    fn test_revalidate_rejects_range_without_trigger() {
        let doc = BlockDocument::new("Todo xyz");
        let err = revalidate_range(&doc, Range::new(5, 8), '/').expect_err("no trigger");
        assert!(matches!(err, SlashError::StaleRange { .. }));
    }

    #[test]
    fn test_stale_range_aborts_without_mutation() {
        let mut doc = BlockDocument::new("/h");
        let (mut c, heading1) = controller_open_at(Range::new(0, 9));

        let outcome = execute(&mut doc, &mut c, &heading1, '/');
        assert!(matches!(
            outcome,
            ExecutionOutcome::Aborted(SlashError::StaleRange { .. })
        ));
        assert_eq!(doc.text(), "/h");
        assert_eq!(doc.enclosing_block_type(0).expect("in bounds"), BlockType::Paragraph);
        assert!(!c.is_open());
    }

    #[test]
    fn test_failed_delete_is_treated_as_stale() {
        let mut doc = BlockDocument::new("/h");
        doc.fail_next_mutation("delete-range");
        let (mut c, heading1) = controller_open_at(Range::new(0, 2));

        let outcome = execute(&mut doc, &mut c, &heading1, '/');
        assert!(matches!(outcome, ExecutionOutcome::Aborted(_)));
        assert_eq!(doc.text(), "/h");
        assert!(!c.is_open());
    }

    #[test]
    fn test_failed_apply_still_closes_and_leaves_trigger_deleted() {
        let mut doc = BlockDocument::new("a /h");
        doc.blur();
        doc.fail_next_mutation("set-block-type");
        let (mut c, heading1) = controller_open_at(Range::new(2, 4));

        let outcome = execute(&mut doc, &mut c, &heading1, '/');
        let err = outcome.error().expect("should report failure");
        assert!(matches!(err, SlashError::MutationApply { command, .. } if command == "heading1"));
        assert_eq!(doc.text(), "a ");
        assert!(!c.is_open());
        assert!(doc.has_focus());
    }
}
