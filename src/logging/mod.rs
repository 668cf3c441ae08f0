//! Forwards `tracing` events to the browser console.
//!
//! Events from this crate are shown from DEBUG up; anything else only from WARN up.

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

const CRATE_TARGET: &str = "slash_palette";

type Sink = Box<dyn Fn(Level, &str) + Send + Sync>;

fn write_console(level: Level, line: &str) {
    match level {
        Level::ERROR => leptos::logging::error!("{line}"),
        Level::WARN => leptos::logging::warn!("{line}"),
        _ => leptos::logging::log!("{line}"),
    }
}

/// Whether an event at `level` from `target` should be written.
fn enabled(target: &str, level: Level) -> bool {
    if target.split("::").next() == Some(CRATE_TARGET) {
        level <= Level::DEBUG
    } else {
        level <= Level::WARN
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name().to_string(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }
}

/// `LEVEL target: message {k=v k=v}`
fn render(level: Level, target: &str, message: &str, fields: &[(String, String)]) -> String {
    let mut line = format!("{level} {target}: {message}");
    if !fields.is_empty() {
        let fields = fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        line.push_str(&format!(" {{{fields}}}"));
    }
    line
}

pub struct ConsoleLayer {
    sink: Sink,
}

impl ConsoleLayer {
    pub fn new() -> Self {
        Self {
            sink: Box::new(write_console),
        }
    }

    #[cfg(test)]
    fn with_sink(sink: impl Fn(Level, &str) + Send + Sync + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }
}

impl Default for ConsoleLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Subscriber> tracing_subscriber::Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = *meta.level();
        if !enabled(meta.target(), level) {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        (self.sink)(level, &render(level, meta.target(), &visitor.message, &visitor.fields));
    }
}

/// Install the console layer as the global subscriber. Later calls are no-ops.
pub fn init() {
    if tracing_subscriber::registry()
        .with(ConsoleLayer::new())
        .try_init()
        .is_err()
    {
        leptos::logging::warn!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{CloseReason, MenuController};
    use crate::models::{Coordinates, Range, TriggerMatch};
    use crate::registry::build_registry;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_render_appends_fields() {
        let fields = vec![
            ("command".to_string(), "heading1".to_string()),
            ("at".to_string(), "5".to_string()),
        ];
        assert_eq!(
            render(Level::WARN, "slash_palette::execute", "slash command failed", &fields),
            "WARN slash_palette::execute: slash command failed {command=heading1 at=5}"
        );
        assert_eq!(render(Level::DEBUG, "x", "hi", &[]), "DEBUG x: hi");
    }

    #[test]
    fn test_enabled_filters_foreign_targets_below_warn() {
        assert!(enabled("slash_palette::menu", Level::DEBUG));
        assert!(!enabled("slash_palette::keyboard", Level::TRACE));
        assert!(!enabled("leptos", Level::DEBUG));
        assert!(enabled("leptos", Level::WARN));
    }

    #[test]
    fn test_menu_transitions_reach_the_sink() {
        let lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(vec![]));
        let lines2 = lines.clone();
        let subscriber = tracing_subscriber::registry().with(ConsoleLayer::with_sink(
            move |_level, line| {
                lines2.lock().expect("lock").push(line.to_string());
            },
        ));

        tracing::subscriber::with_default(subscriber, || {
            let mut c = MenuController::new(build_registry(&[]));
            c.activate(&TriggerMatch {
                query: "h".to_string(),
                range: Range::new(0, 2),
                matched_text: "/h".to_string(),
                anchor: Coordinates::default(),
            });
            c.close(CloseReason::StaleRange);
        });

        let lines = lines.lock().expect("lock");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("slash menu opened"));
        assert!(lines[0].contains("query=h"));
        assert!(lines[1].contains("slash menu closed"));
        assert!(lines[1].contains("reason=stale-range"));
    }
}
