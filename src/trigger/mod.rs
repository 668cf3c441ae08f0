use crate::engine::{DocumentEngine, EngineError};
use crate::models::{Position, Range, TriggerMatch};
use crate::SlashConfig;

/// Text part of a trigger match; the caller attaches anchor coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TriggerHit {
    pub query: String,
    pub range: Range,
    pub matched_text: String,
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Recognize `<boundary><trigger><word chars>` ending exactly at the caret.
///
/// `window` is the text immediately before `caret`. The start of the window only counts as a
/// boundary when `window_is_complete`, i.e. it is the start of the document content.
pub(crate) fn detect(
    window: &str,
    caret: Position,
    trigger: char,
    window_is_complete: bool,
) -> Option<TriggerHit> {
    let chars: Vec<char> = window.chars().collect();

    let query_len = chars.iter().rev().take_while(|c| is_word_char(**c)).count();
    let query_start = chars.len() - query_len;
    if query_start == 0 {
        return None;
    }

    let trigger_idx = query_start - 1;
    if chars[trigger_idx] != trigger {
        return None;
    }

    let match_start = if trigger_idx == 0 {
        if !window_is_complete {
            return None;
        }
        0
    } else if chars[trigger_idx - 1].is_whitespace() {
        trigger_idx - 1
    } else {
        // Mid-word or escaped trigger.
        return None;
    };

    let span = chars.len() - trigger_idx;
    Some(TriggerHit {
        query: chars[query_start..].iter().collect(),
        range: Range::new(caret.checked_sub(span)?, caret),
        matched_text: chars[match_start..].iter().collect(),
    })
}

/// Run the detector against the live document at the caret.
///
/// Returns `Ok(None)` (deactivation) when the selection is not collapsed, when the caret sits in
/// a block type that suppresses commands, or when no trigger pattern ends at the caret.
pub(crate) fn scan<E: DocumentEngine + ?Sized>(
    engine: &E,
    config: &SlashConfig,
) -> Result<Option<TriggerMatch>, EngineError> {
    let selection = engine.current_selection();
    if !selection.is_collapsed() {
        return Ok(None);
    }

    let caret = selection.position();
    let block = engine.enclosing_block_type(caret)?;
    if config.suppressed_blocks.contains(&block) {
        return Ok(None);
    }

    let window = engine.text_before(caret, config.text_window)?;
    let window_is_complete = caret <= config.text_window;
    let Some(hit) = detect(&window, caret, config.trigger, window_is_complete) else {
        return Ok(None);
    };

    let anchor = engine.coordinates_at(caret)?.into();
    Ok(Some(TriggerMatch {
        query: hit.query,
        range: hit.range,
        matched_text: hit.matched_text,
        anchor,
    }))
}
