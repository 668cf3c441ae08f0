//! Keyboard arbitration between the open menu and the document engine.
//!
//! While the menu is open the router sees keys before the engine (capture phase) and decides
//! which ones it consumes. The capture listener exists only while the menu is open.

use crate::menu::MenuState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
    Other(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "Enter" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            other => Key::Other(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    /// IME composition in progress; such keys always belong to the engine.
    pub composing: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            composing: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyRoute {
    MoveSelection(i32),
    Execute(usize),
    Close,
    PassThrough,
}

impl KeyRoute {
    /// Consumed keys get `preventDefault` + `stopPropagation`; the engine never sees them.
    pub fn is_consumed(self) -> bool {
        !matches!(self, KeyRoute::PassThrough)
    }
}

pub fn route(state: &MenuState, input: &KeyInput) -> KeyRoute {
    let MenuState::Open(menu) = state else {
        return KeyRoute::PassThrough;
    };
    if input.composing {
        return KeyRoute::PassThrough;
    }

    match input.key {
        Key::ArrowUp => KeyRoute::MoveSelection(-1),
        Key::ArrowDown => KeyRoute::MoveSelection(1),
        Key::Enter => match menu.selected() {
            Some(_) => KeyRoute::Execute(menu.selected_index),
            None => KeyRoute::Close,
        },
        Key::Escape => KeyRoute::Close,
        Key::Other(_) => KeyRoute::PassThrough,
    }
}

/// Installs/removes the host's capture-phase key listener.
pub trait CaptureHook {
    fn attach(&mut self);
    fn detach(&mut self);
}

/// For hosts that feed keys to the session directly.
#[derive(Debug, Default)]
pub struct NoCapture;

impl CaptureHook for NoCapture {
    fn attach(&mut self) {}
    fn detach(&mut self) {}
}

/// Ties the capture listener's lifetime to the menu's open state.
pub struct KeyboardRouter<H: CaptureHook> {
    hook: H,
    attached: bool,
}

impl<H: CaptureHook> KeyboardRouter<H> {
    pub fn new(hook: H) -> Self {
        Self {
            hook,
            attached: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Call after every menu state transition.
    pub fn sync(&mut self, open: bool) {
        match (open, self.attached) {
            (true, false) => {
                self.hook.attach();
                self.attached = true;
                tracing::trace!("key capture attached");
            }
            (false, true) => {
                self.hook.detach();
                self.attached = false;
                tracing::trace!("key capture detached");
            }
            _ => {}
        }
    }
}

impl<H: CaptureHook> Drop for KeyboardRouter<H> {
    fn drop(&mut self) {
        if self.attached {
            self.hook.detach();
        }
    }
}
