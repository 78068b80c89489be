//! Visualization modules for panel display.

mod colormap;
mod texture;

pub use texture::compose_panel;
