pub mod block_preview;
pub mod slash_menu;

// Re-export component symbols so callers can `use crate::components::ui::SlashMenu` etc.
pub use block_preview::*;
pub use slash_menu::*;
