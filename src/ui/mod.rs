//! Terminal UI: layout, tab rendering, styles, and input handling.

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
