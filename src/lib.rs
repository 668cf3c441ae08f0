mod app;
mod components;
mod editor;
mod logging;
mod pages;

pub mod engine;
pub mod execute;
pub mod keyboard;
pub mod menu;
pub mod models;
pub mod registry;
pub mod session;
mod trigger;

use crate::models::BlockType;
use crate::registry::CommandDescriptor;
use serde::{Deserialize, Deserializer};

pub use crate::session::SlashSession;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

fn default_trigger() -> char {
    '/'
}

/// The trigger must be able to sit right before a word without becoming part of it.
fn deserialize_trigger<'de, D: Deserializer<'de>>(deserializer: D) -> Result<char, D::Error> {
    let ch = char::deserialize(deserializer)?;
    if trigger::is_word_char(ch) || ch.is_whitespace() {
        return Err(serde::de::Error::custom(format!(
            "trigger {ch:?} must not be a word character or whitespace"
        )));
    }
    Ok(ch)
}

fn default_text_window() -> usize {
    64
}

fn default_suppressed_blocks() -> Vec<BlockType> {
    vec![BlockType::CodeBlock]
}

/// Slash palette settings.
///
/// Read from `window.ENV.SLASH` in the browser, e.g.
/// `{"trigger": "/", "suppressed_blocks": ["codeBlock"], "extra_commands": [...]}`.
#[derive(Deserialize, Clone, Debug)]
pub struct SlashConfig {
    #[serde(
        default = "default_trigger",
        deserialize_with = "deserialize_trigger"
    )]
    pub trigger: char,

    /// How many chars before the caret the trigger detector looks at.
    #[serde(default = "default_text_window")]
    pub text_window: usize,

    /// Block types in which typing the trigger never opens the menu.
    #[serde(default = "default_suppressed_blocks")]
    pub suppressed_blocks: Vec<BlockType>,

    /// Appended after the built-in commands.
    #[serde(default)]
    pub extra_commands: Vec<CommandDescriptor>,
}

impl Default for SlashConfig {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            text_window: default_text_window(),
            suppressed_blocks: default_suppressed_blocks(),
            extra_commands: vec![],
        }
    }
}

impl SlashConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load from `window.ENV.SLASH` (or `window.ENV.slash`), falling back to defaults.
    pub fn new() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let Some(env) = window.get("ENV") else {
            return Self::default();
        };
        if env.is_undefined() || !env.is_object() {
            return Self::default();
        }

        for key in ["SLASH", "slash"] {
            let Ok(value) = js_sys::Reflect::get(&env, &key.into()) else {
                continue;
            };
            if value.is_undefined() || value.is_null() {
                continue;
            }
            let Some(json) = js_sys::JSON::stringify(&value)
                .ok()
                .and_then(|s| s.as_string())
            else {
                continue;
            };
            match Self::from_json(&json) {
                Ok(config) => return config,
                Err(e) => {
                    leptos::logging::warn!("ignoring invalid window.ENV.{key}: {e}");
                }
            }
        }

        Self::default()
    }
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn set_env(json: &str) {
        let window = web_sys::window().expect("browser window");
        let env = js_sys::JSON::parse(json).expect("valid json");
        js_sys::Reflect::set(&window, &"ENV".into(), &env).expect("should set window.ENV");
    }

    #[wasm_bindgen_test]
    fn test_config_reads_window_env() {
        set_env(r#"{"SLASH": {"trigger": ";", "text_window": 16}}"#);
        let config = SlashConfig::new();
        assert_eq!(config.trigger, ';');
        assert_eq!(config.text_window, 16);
    }

    #[wasm_bindgen_test]
    fn test_config_falls_back_on_invalid_env() {
        set_env(r#"{"SLASH": {"trigger": 42}}"#);
        let config = SlashConfig::new();
        assert_eq!(config.trigger, '/');
    }

    #[wasm_bindgen_test]
    fn test_config_falls_back_on_word_char_trigger() {
        set_env(r#"{"SLASH": {"trigger": "_"}}"#);
        let config = SlashConfig::new();
        assert_eq!(config.trigger, '/');
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init();
    leptos::mount::mount_to_body(app::App);
}
