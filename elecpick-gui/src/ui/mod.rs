//! UI rendering modules.
//!
//! - `main_view`: Central 2x2 grid of panels
//! - `side_panel`: Legend sidebar, top bar and status bar
//! - `prompt`: Device-name prompt
//! - `theme`: Colors and styling

mod main_view;
mod prompt;
mod side_panel;
pub mod theme;
