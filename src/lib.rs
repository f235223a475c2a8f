#![warn(clippy::all, rust_2018_idioms)]
mod app;
pub mod color;
pub mod config;
pub mod draw_command;
pub mod error;
pub mod frame_source;
pub mod frame_store;
pub mod geometry;
pub mod loader;
pub mod object_types;
pub mod panel;
pub mod playback;
pub mod renderer;
pub use app::ReplayViewerApp;
pub const APP_NAME: &str = "Detection Replay";
pub(crate) use egui_phosphor::regular as icons;

/// Concatenate an icon const with a string literal at compile time (zero allocation).
/// Usage: `icon_str!(icons::WARNING, "SYS_MSG")` => `&'static str`
macro_rules! icon_str {
    ($icon:expr, $text:expr) => {
        const_format::concatcp!($icon, " ", $text)
    };
}
pub(crate) use icon_str;
