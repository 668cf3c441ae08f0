use crate::engine::DocumentEngine;
use crate::execute::{execute, ExecutionOutcome, SlashError};
use crate::keyboard::{route, CaptureHook, KeyInput, KeyRoute, KeyboardRouter, NoCapture};
use crate::menu::{CloseReason, MenuController, MenuSnapshot, MenuState};
use crate::models::ContentChange;
use crate::registry::build_registry;
use crate::trigger::scan;
use crate::SlashConfig;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Receives failed command executions so the embedding app can report them.
pub type DiagnosticSink = Box<dyn FnMut(&SlashError)>;

/// The slash palette bound to one document engine.
///
/// This is the embedding UI's entry point: it renders `snapshot()`, forwards keys to
/// `handle_key_down`, clicks to `select_candidate`, and calls `process_content_changes`
/// after handing any input event to the engine.
pub struct SlashSession<E: DocumentEngine, H: CaptureHook = NoCapture> {
    engine: E,
    controller: MenuController,
    router: KeyboardRouter<H>,
    config: SlashConfig,
    pending: Rc<RefCell<VecDeque<ContentChange>>>,
    diagnostics: Vec<DiagnosticSink>,
}

impl<E: DocumentEngine> SlashSession<E, NoCapture> {
    pub fn new(engine: E, config: SlashConfig) -> Self {
        Self::with_capture(engine, config, NoCapture)
    }
}

impl<E: DocumentEngine, H: CaptureHook> SlashSession<E, H> {
    pub fn with_capture(mut engine: E, config: SlashConfig, hook: H) -> Self {
        let pending: Rc<RefCell<VecDeque<ContentChange>>> = Rc::new(RefCell::new(VecDeque::new()));
        let queue = pending.clone();
        engine.on_content_changed(Box::new(move |change| {
            queue.borrow_mut().push_back(*change);
        }));

        Self {
            engine,
            controller: MenuController::new(build_registry(&config.extra_commands)),
            router: KeyboardRouter::new(hook),
            config,
            pending,
            diagnostics: vec![],
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn state(&self) -> &MenuState {
        self.controller.state()
    }

    pub fn snapshot(&self) -> MenuSnapshot {
        self.controller.snapshot()
    }

    pub fn is_capture_attached(&self) -> bool {
        self.router.is_attached()
    }

    pub fn on_diagnostic(&mut self, sink: DiagnosticSink) {
        self.diagnostics.push(sink);
    }

    /// Drain queued content changes and re-run trigger detection.
    pub fn process_content_changes(&mut self) {
        let changes: Vec<ContentChange> = self.pending.borrow_mut().drain(..).collect();
        if changes.is_empty() {
            return;
        }

        if let Some(menu) = self.controller.state().as_open() {
            let range = menu.range;
            if changes.iter().any(|c| !range.touches(&c.replaced())) {
                self.controller.close(CloseReason::StaleRange);
                self.router.sync(false);
                return;
            }
        }

        let found = match scan(&self.engine, &self.config) {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(error = %e, "trigger scan failed");
                None
            }
        };
        self.controller.on_trigger(found.as_ref());
        self.router.sync(self.controller.is_open());
    }

    /// Returns true when the key was consumed and must not reach the document engine.
    pub fn handle_key_down(&mut self, input: &KeyInput) -> bool {
        let decision = route(self.controller.state(), input);
        match decision {
            KeyRoute::MoveSelection(delta) => self.controller.move_selection(delta),
            KeyRoute::Execute(index) => {
                self.select_candidate(index);
            }
            KeyRoute::Close => self.controller.dismiss(),
            KeyRoute::PassThrough => {}
        }
        self.router.sync(self.controller.is_open());
        decision.is_consumed()
    }

    /// Execute the candidate at `index`. Returns `None` when there is nothing to execute.
    pub fn select_candidate(&mut self, index: usize) -> Option<ExecutionOutcome> {
        let descriptor = self
            .controller
            .state()
            .as_open()
            .and_then(|menu| menu.candidates.get(index).cloned())?;

        let outcome = execute(
            &mut self.engine,
            &mut self.controller,
            &descriptor,
            self.config.trigger,
        );

        // Our own edits are not user input.
        self.pending.borrow_mut().clear();
        self.router.sync(false);

        if let ExecutionOutcome::Failed(e) = &outcome {
            for sink in self.diagnostics.iter_mut() {
                sink(e);
            }
        }
        Some(outcome)
    }

    pub fn hover_candidate(&mut self, index: usize) {
        self.controller.hover(index);
    }

    pub fn request_close(&mut self) {
        self.controller.dismiss();
        self.router.sync(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BlockDocument;
    use crate::keyboard::Key;
    use crate::models::{BlockType, Range};
    use std::cell::Cell;

    fn session(text: &str) -> SlashSession<BlockDocument> {
        SlashSession::new(BlockDocument::new(text), SlashConfig::default())
    }

    fn type_text(s: &mut SlashSession<BlockDocument>, text: &str) {
        for ch in text.chars() {
            s.engine_mut()
                .type_text(&ch.to_string())
                .expect("typing should succeed");
            s.process_content_changes();
        }
    }

    fn key(s: &mut SlashSession<BlockDocument>, k: Key) -> bool {
        s.handle_key_down(&KeyInput::new(k))
    }

    fn titles(s: &SlashSession<BlockDocument>) -> Vec<String> {
        s.snapshot().candidates.into_iter().map(|c| c.title).collect()
    }

    #[test]
    fn test_typing_trigger_opens_full_menu() {
        let mut s = session("Intro ");
        type_text(&mut s, "/");
        let snap = s.snapshot();
        assert!(snap.is_open);
        assert_eq!(snap.candidates.len(), 10);
        assert_eq!(snap.selected_index, 0);
        assert_eq!(snap.anchor.map(|a| a.left), Some(56.0));
    }

    #[test]
    fn test_alias_query_then_enter_applies_command() {
        let mut s = session("");
        type_text(&mut s, "/h1");
        assert_eq!(titles(&s), vec!["Heading 1"]);

        assert!(key(&mut s, Key::Enter));
        assert!(!s.snapshot().is_open);
        assert_eq!(s.engine().text(), "");
        assert_eq!(s.engine().enclosing_block_type(0).expect("in bounds"), BlockType::Heading1);
    }

    #[test]
    fn test_query_without_matches_closes_and_backspace_reopens() {
        let mut s = session("");
        type_text(&mut s, "/x");
        assert_eq!(titles(&s), vec!["Task List", "Text"]);
        type_text(&mut s, "yz");
        assert!(!s.snapshot().is_open);

        s.engine_mut().backspace().expect("should delete");
        s.process_content_changes();
        s.engine_mut().backspace().expect("should delete");
        s.process_content_changes();
        assert!(s.snapshot().is_open);
    }

    #[test]
    fn test_arrow_keys_wrap_and_enter_uses_selection() {
        let mut s = session("");
        type_text(&mut s, "/list");
        assert_eq!(titles(&s), vec!["Bullet List", "Numbered List", "Task List"]);

        assert!(key(&mut s, Key::ArrowUp));
        assert_eq!(s.snapshot().selected_index, 2);
        assert!(key(&mut s, Key::ArrowDown));
        assert!(key(&mut s, Key::ArrowDown));
        assert_eq!(s.snapshot().selected_index, 1);

        assert!(key(&mut s, Key::Enter));
        assert_eq!(
            s.engine().enclosing_block_type(0).expect("in bounds"),
            BlockType::NumberedListItem
        );
    }

    #[test]
    fn test_other_keys_fall_through() {
        let mut s = session("");
        type_text(&mut s, "/");
        assert!(!key(&mut s, Key::from_dom("a")));
        assert!(s.snapshot().is_open);
    }

    #[test]
    fn test_keys_pass_through_when_closed() {
        let mut s = session("plain");
        assert!(!key(&mut s, Key::Enter));
        assert!(!key(&mut s, Key::ArrowDown));
    }

    #[test]
    fn test_escape_dismisses_until_trigger_is_removed() {
        let mut s = session("");
        type_text(&mut s, "/he");
        assert!(key(&mut s, Key::Escape));
        assert!(!s.snapshot().is_open);

        type_text(&mut s, "a");
        assert!(!s.snapshot().is_open);

        for _ in 0..4 {
            s.engine_mut().backspace().expect("should delete");
            s.process_content_changes();
        }
        type_text(&mut s, "/");
        assert!(s.snapshot().is_open);
    }

    #[test]
    fn test_request_close_and_select_when_closed() {
        let mut s = session("");
        type_text(&mut s, "/");
        s.request_close();
        assert_eq!(s.snapshot(), MenuSnapshot::default());
        assert!(s.select_candidate(0).is_none());
    }

    #[test]
    fn test_click_selects_candidate_by_index() {
        let mut s = session("Todo ");
        type_text(&mut s, "/");
        s.hover_candidate(6);
        assert_eq!(s.snapshot().selected_index, 6);

        let outcome = s.select_candidate(6).expect("menu is open");
        assert!(outcome.error().is_none());
        assert_eq!(s.engine().text(), "Todo ");
        assert_eq!(s.engine().enclosing_block_type(5).expect("in bounds"), BlockType::Blockquote);
    }

    #[test]
    fn test_external_edit_outside_trigger_closes_menu() {
        let mut s = session("intro\n");
        type_text(&mut s, "/he");
        assert!(s.snapshot().is_open);

        s.engine_mut()
            .replace(Range::collapsed(0), "X")
            .expect("insert should apply");
        s.engine_mut().set_caret(10);
        s.process_content_changes();
        assert!(!s.snapshot().is_open);
        assert!(!s.is_capture_attached());

        // Continuing to type at the trigger reopens it.
        type_text(&mut s, "a");
        assert!(s.snapshot().is_open);
        assert_eq!(s.snapshot().query, "hea");
    }

    #[test]
    fn test_no_activation_inside_code_block() {
        let mut s = session("");
        s.engine_mut().set_block_type(0, BlockType::CodeBlock);
        type_text(&mut s, "/");
        assert!(!s.snapshot().is_open);
    }

    #[test]
    fn test_failed_command_reports_diagnostic_and_closes() {
        let mut s = session("a ");
        let reports = Rc::new(Cell::new(0));
        let reports2 = reports.clone();
        s.on_diagnostic(Box::new(move |e| {
            assert!(matches!(e, SlashError::MutationApply { .. }));
            reports2.set(reports2.get() + 1);
        }));

        type_text(&mut s, "/h2");
        s.engine_mut().blur();
        s.engine_mut().fail_next_mutation("set-block-type");
        assert!(key(&mut s, Key::Enter));

        assert_eq!(reports.get(), 1);
        assert!(!s.snapshot().is_open);
        assert!(s.engine().has_focus());
        assert_eq!(s.engine().text(), "a ");
    }

    #[test]
    fn test_own_edits_do_not_reopen_menu() {
        let mut s = session("");
        type_text(&mut s, "/hr");
        assert!(key(&mut s, Key::Enter));
        s.process_content_changes();
        assert!(!s.snapshot().is_open);
        assert_eq!(s.engine().enclosing_block_type(0).expect("in bounds"), BlockType::HorizontalRule);
    }

    struct CountingHook(Rc<Cell<i32>>);

    impl CaptureHook for CountingHook {
        fn attach(&mut self) {
            self.0.set(self.0.get() + 1);
        }
        fn detach(&mut self) {
            self.0.set(self.0.get() - 1);
        }
    }

    #[test]
    fn test_capture_listener_follows_open_state() {
        let live = Rc::new(Cell::new(0));
        let mut s = SlashSession::with_capture(
            BlockDocument::new(""),
            SlashConfig::default(),
            CountingHook(live.clone()),
        );
        for ch in "/h".chars() {
            s.engine_mut().type_text(&ch.to_string()).expect("typing should succeed");
            s.process_content_changes();
        }
        assert_eq!(live.get(), 1);
        assert!(s.is_capture_attached());

        s.handle_key_down(&KeyInput::new(Key::Escape));
        assert_eq!(live.get(), 0);
        assert!(!s.is_capture_attached());
    }
}
