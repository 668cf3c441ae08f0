//! Menu state controller: the single owner of the palette's open/closed state.

mod placement;

pub use placement::{place_menu, MenuPlacement, Side, Size};

use crate::models::{Coordinates, Position, Range, TriggerMatch};
use crate::registry::{filter, CommandDescriptor};
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct OpenMenu {
    pub query: String,
    pub range: Range,
    pub anchor: Coordinates,
    /// Never empty while the menu is open.
    pub candidates: Vec<Rc<CommandDescriptor>>,
    pub selected_index: usize,
}

impl OpenMenu {
    pub fn selected(&self) -> Option<&Rc<CommandDescriptor>> {
        self.candidates.get(self.selected_index)
    }
}

#[derive(Clone, Debug, Default)]
pub enum MenuState {
    #[default]
    Closed,
    Open(OpenMenu),
}

impl MenuState {
    pub fn is_open(&self) -> bool {
        matches!(self, MenuState::Open(_))
    }

    pub fn as_open(&self) -> Option<&OpenMenu> {
        match self {
            MenuState::Open(menu) => Some(menu),
            MenuState::Closed => None,
        }
    }
}

/// Why the menu closed; only used for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum CloseReason {
    Dismissed,
    NoMatches,
    TriggerGone,
    StaleRange,
    Executed,
}

/// One row of the rendered candidate list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
}

/// Read-only copy of the menu state handed to the UI layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MenuSnapshot {
    pub is_open: bool,
    pub query: String,
    pub candidates: Vec<CandidateView>,
    pub selected_index: usize,
    pub anchor: Option<Coordinates>,
}

pub struct MenuController {
    registry: Vec<Rc<CommandDescriptor>>,
    state: MenuState,
    /// Start of a trigger the user dismissed; it must not reopen until it disappears.
    dismissed_at: Option<Position>,
}

fn same_candidates(a: &[Rc<CommandDescriptor>], b: &[Rc<CommandDescriptor>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id == y.id)
}

impl MenuController {
    pub fn new(registry: Vec<Rc<CommandDescriptor>>) -> Self {
        Self {
            registry,
            state: MenuState::Closed,
            dismissed_at: None,
        }
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn activate(&mut self, m: &TriggerMatch) {
        let candidates = filter(&self.registry, &m.query);
        if candidates.is_empty() {
            self.close(CloseReason::NoMatches);
            return;
        }

        tracing::debug!(query = %m.query, from = m.range.from, to = m.range.to, "slash menu opened");
        self.state = MenuState::Open(OpenMenu {
            query: m.query.clone(),
            range: m.range,
            anchor: m.anchor,
            candidates,
            selected_index: 0,
        });
    }

    /// Refresh the query of an open menu. Closes when the new query matches nothing.
    pub fn update_query(&mut self, query: &str, range: Range) {
        let MenuState::Open(menu) = &mut self.state else {
            return;
        };

        let candidates = filter(&self.registry, query);
        if candidates.is_empty() {
            // The open state guarantees the previous candidate list was non-empty.
            self.close(CloseReason::NoMatches);
            return;
        }

        if !same_candidates(&menu.candidates, &candidates) {
            menu.selected_index = 0;
        }
        menu.candidates = candidates;
        menu.query = query.to_string();
        menu.range = range;
    }

    /// Handle a fresh detector result. `None` means the trigger is gone.
    pub fn on_trigger(&mut self, m: Option<&TriggerMatch>) {
        let Some(m) = m else {
            self.dismissed_at = None;
            self.close(CloseReason::TriggerGone);
            return;
        };

        if self.dismissed_at == Some(m.range.from) {
            return;
        }
        self.dismissed_at = None;

        match &mut self.state {
            MenuState::Open(menu) if menu.range.from == m.range.from => {
                menu.anchor = m.anchor;
                self.update_query(&m.query, m.range);
            }
            _ => self.activate(m),
        }
    }

    /// Close and keep the current trigger from reopening on the next keystroke.
    pub fn dismiss(&mut self) {
        if let MenuState::Open(menu) = &self.state {
            self.dismissed_at = Some(menu.range.from);
        }
        self.close(CloseReason::Dismissed);
    }

    /// Reset to closed defaults. Idempotent.
    pub fn close(&mut self, reason: CloseReason) {
        if self.state.is_open() {
            tracing::debug!(%reason, "slash menu closed");
        }
        self.state = MenuState::Closed;
    }

    pub fn move_selection(&mut self, delta: i32) {
        let MenuState::Open(menu) = &mut self.state else {
            return;
        };
        let len = menu.candidates.len() as i64;
        if len == 0 {
            return;
        }
        let next = (menu.selected_index as i64 + delta as i64).rem_euclid(len);
        menu.selected_index = next as usize;
    }

    /// Point the selection at `index` (mouse hover). Out-of-range indices are ignored.
    pub fn hover(&mut self, index: usize) {
        if let MenuState::Open(menu) = &mut self.state {
            if index < menu.candidates.len() {
                menu.selected_index = index;
            }
        }
    }

    pub fn snapshot(&self) -> MenuSnapshot {
        match &self.state {
            MenuState::Closed => MenuSnapshot::default(),
            MenuState::Open(menu) => MenuSnapshot {
                is_open: true,
                query: menu.query.clone(),
                candidates: menu
                    .candidates
                    .iter()
                    .map(|d| CandidateView {
                        id: d.id.clone(),
                        title: d.title.clone(),
                        description: d.description.clone(),
                    })
                    .collect(),
                selected_index: menu.selected_index,
                anchor: Some(menu.anchor),
            },
        }
    }
}
