#![deny(missing_docs)]
//! Node.js bindings that surface Waypoint's rendering and export helpers.

use napi_derive::napi;
use waypoint_core::RenderOptions;

/// Returns the version string reported by the core crate.
#[napi]
pub fn version() -> String {
    waypoint_core::version().to_string()
}

/// Renders a chat answer, or an itinerary when `wrap_paragraphs` is set.
#[napi]
pub fn render_markdown(source: String, wrap_paragraphs: Option<bool>) -> String {
    let options = if wrap_paragraphs.unwrap_or(false) {
        RenderOptions::itinerary()
    } else {
        RenderOptions::chat()
    };
    waypoint_core::render(&source, &options)
}

/// Strips markdown markers for a `.txt` download.
#[napi]
pub fn plain_text(source: String) -> String {
    waypoint_core::plain_text(&source)
}
