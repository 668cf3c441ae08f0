//! Browser embedding: a textarea-backed document engine with the slash palette attached.

use crate::components::ui::{BlockPreview, SlashMenu};
use crate::engine::{
    BlockDocument, ContentListener, DocumentEngine, EngineError, LayoutMetrics, Selection,
};
use crate::keyboard::{CaptureHook, Key, KeyInput};
use crate::menu::MenuSnapshot;
use crate::models::{BlockType, CaretRect, Mutation, Position};
use crate::session::SlashSession;
use crate::SlashConfig;
use leptos::html;
use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Matches the textarea's `p-3` padding.
const TEXTAREA_PADDING_PX: f64 = 12.0;

/// Matches `font-mono text-sm leading-5`.
const TEXTAREA_METRICS: LayoutMetrics = LayoutMetrics {
    origin_top: 0.0,
    origin_left: 0.0,
    line_height: 20.0,
    char_width: 8.4,
};

/// UTF-16 offset (DOM selection units) to char position.
pub(crate) fn utf16_to_char_pos(s: &str, pos_utf16: u32) -> Position {
    let mut acc: u32 = 0;
    for (i, ch) in s.chars().enumerate() {
        if acc >= pos_utf16 {
            return i;
        }
        acc += ch.len_utf16() as u32;
    }
    s.chars().count()
}

pub(crate) fn char_pos_to_utf16(s: &str, pos: Position) -> u32 {
    s.chars().take(pos).map(|c| c.len_utf16() as u32).sum()
}

/// `BlockDocument` model rendered through a `<textarea>`.
pub(crate) struct TextareaEngine {
    doc: BlockDocument,
    textarea: NodeRef<html::Textarea>,
}

impl TextareaEngine {
    pub fn new(text: &str, textarea: NodeRef<html::Textarea>) -> Self {
        let mut doc = BlockDocument::new(text);
        doc.metrics = TEXTAREA_METRICS;
        Self { doc, textarea }
    }

    pub fn blocks(&self) -> Vec<(BlockType, String)> {
        self.doc.blocks()
    }

    /// Pull the textarea's value and caret into the model after user input.
    pub fn sync_from_view(&mut self) -> Result<(), EngineError> {
        let Some(el) = self.textarea.get_untracked() else {
            return Ok(());
        };
        let value = el.value();
        let caret_utf16 = el
            .selection_start()
            .ok()
            .flatten()
            .unwrap_or(value.encode_utf16().count() as u32);
        let caret = utf16_to_char_pos(&value, caret_utf16);
        self.doc.sync_text(&value, caret)
    }

    fn push_to_view(&self) {
        let Some(el) = self.textarea.get_untracked() else {
            return;
        };
        let text = self.doc.text();
        if el.value() != text {
            el.set_value(text);
        }
        let caret = char_pos_to_utf16(text, self.doc.current_selection().position());
        let _ = el.set_selection_range(caret, caret);
    }
}

impl DocumentEngine for TextareaEngine {
    fn text_before(&self, position: Position, max_len: usize) -> Result<String, EngineError> {
        self.doc.text_before(position, max_len)
    }

    fn current_selection(&self) -> Selection {
        self.doc.current_selection()
    }

    /// Viewport coordinates. Soft-wrapped lines are not accounted for.
    fn coordinates_at(&self, position: Position) -> Result<CaretRect, EngineError> {
        let local = self.doc.coordinates_at(position)?;
        let Some(el) = self.textarea.get_untracked() else {
            return Ok(local);
        };
        let rect = el.get_bounding_client_rect();
        let dy = rect.top() + TEXTAREA_PADDING_PX - el.scroll_top() as f64;
        let dx = rect.left() + TEXTAREA_PADDING_PX - el.scroll_left() as f64;
        Ok(CaretRect {
            top: local.top + dy,
            left: local.left + dx,
            bottom: local.bottom + dy,
        })
    }

    fn apply_mutation(&mut self, mutation: Mutation) -> Result<(), EngineError> {
        self.doc.apply_mutation(mutation)?;
        self.push_to_view();
        Ok(())
    }

    fn on_content_changed(&mut self, listener: ContentListener) {
        self.doc.on_content_changed(listener);
    }

    fn enclosing_block_type(&self, position: Position) -> Result<BlockType, EngineError> {
        self.doc.enclosing_block_type(position)
    }

    fn focus(&mut self) {
        self.doc.focus();
        if let Some(el) = self.textarea.get_untracked() {
            let _ = el.focus();
            self.push_to_view();
        }
    }
}

/// Document-level keydown listener in the capture phase, so it runs before the textarea.
pub(crate) struct DocumentCapture {
    target: Option<web_sys::Document>,
    callback: js_sys::Function,
}

impl DocumentCapture {
    pub fn new(callback: js_sys::Function) -> Self {
        Self {
            target: web_sys::window().and_then(|w| w.document()),
            callback,
        }
    }
}

impl CaptureHook for DocumentCapture {
    fn attach(&mut self) {
        if let Some(doc) = &self.target {
            let _ = doc.add_event_listener_with_callback_and_bool("keydown", &self.callback, true);
        }
    }

    fn detach(&mut self) {
        if let Some(doc) = &self.target {
            let _ =
                doc.remove_event_listener_with_callback_and_bool("keydown", &self.callback, true);
        }
    }
}

type EditorSession = SlashSession<TextareaEngine, DocumentCapture>;

#[component]
pub fn SlashEditor(#[prop(into, optional)] initial: String) -> impl IntoView {
    let textarea_ref: NodeRef<html::Textarea> = NodeRef::new();

    let menu: RwSignal<MenuSnapshot> = RwSignal::new(MenuSnapshot::default());
    let blocks: RwSignal<Vec<(BlockType, String)>> = RwSignal::new(vec![]);
    let last_error: RwSignal<Option<String>> = RwSignal::new(None);

    // The session is not Send; keep it in local arena storage.
    let session_sv = StoredValue::new_local(None::<EditorSession>);

    // Run `f` against the session and republish what the UI renders.
    let with_session = move |f: &mut dyn FnMut(&mut EditorSession) -> bool| -> bool {
        session_sv
            .try_update_value(|s| {
                let s = s.as_mut()?;
                let out = f(s);
                menu.set(s.snapshot());
                blocks.set(s.engine().blocks());
                Some(out)
            })
            .flatten()
            .unwrap_or(false)
    };

    let on_capture_key = Closure::<dyn FnMut(web_sys::KeyboardEvent)>::new(
        move |ev: web_sys::KeyboardEvent| {
            let input = KeyInput {
                key: Key::from_dom(&ev.key()),
                composing: ev.is_composing(),
            };
            let consumed = with_session(&mut |s| s.handle_key_down(&input));
            if consumed {
                ev.prevent_default();
                ev.stop_propagation();
            }
        },
    );
    let capture = DocumentCapture::new(on_capture_key.into_js_value().unchecked_into());

    let mut session = SlashSession::with_capture(
        TextareaEngine::new(&initial, textarea_ref),
        SlashConfig::new(),
        capture,
    );
    session.on_diagnostic(Box::new(move |e| {
        leptos::logging::warn!("slash command failed: {e}");
        last_error.set(Some(e.to_string()));
    }));
    blocks.set(session.engine().blocks());
    session_sv.set_value(Some(session));

    let on_input = move |_ev: web_sys::Event| {
        last_error.set(None);
        with_session(&mut |s| {
            if let Err(e) = s.engine_mut().sync_from_view() {
                leptos::logging::warn!("editor out of sync: {e}");
            }
            s.process_content_changes();
            false
        });
    };

    let on_blur = move |_ev: web_sys::FocusEvent| {
        with_session(&mut |s| {
            s.request_close();
            false
        });
    };

    let on_select = Callback::new(move |index: usize| {
        with_session(&mut |s| {
            s.select_candidate(index);
            false
        });
    });

    let on_hover = Callback::new(move |index: usize| {
        with_session(&mut |s| {
            s.hover_candidate(index);
            false
        });
    });

    view! {
        <div class="grid gap-4 md:grid-cols-2">
            <div class="relative">
                <textarea
                    node_ref=textarea_ref
                    class="h-96 w-full resize-none rounded-md border border-input bg-transparent p-3 font-mono text-sm leading-5 shadow-xs outline-none focus-visible:border-ring focus-visible:ring-2 focus-visible:ring-ring/50"
                    placeholder="Type / for commands"
                    prop:value=initial
                    on:input=on_input
                    on:blur=on_blur
                />
                <SlashMenu menu=menu on_select=on_select on_hover=on_hover />
                {move || last_error.get().map(|e| view! {
                    <div class="mt-2 text-xs text-destructive">{e}</div>
                })}
            </div>
            <BlockPreview blocks=blocks />
        </div>
    }
}
