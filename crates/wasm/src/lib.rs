use js_sys::Function;
use std::io::{self, Write};
use waypoint_core::{RenderOptions, RevealState, RewriteOptions, StreamingRewriter};
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

/// Renders markdown into an HTML `String`.
///
/// `wrap_paragraphs` selects the itinerary flavour (paragraphs plus `-`/`+`
/// bullets); leave it unset for chat bubbles.
#[wasm_bindgen(js_name = render_html)]
pub fn render_html(input: &str, wrap_paragraphs: Option<bool>) -> String {
    waypoint_core::render(input, &render_options(wrap_paragraphs))
}

/// Streams rendered HTML chunks into the provided JavaScript callback.
///
/// The callback is invoked with each UTF-8 chunk produced by the streaming
/// renderer, so callers can forward output to a `WritableStream`, append to the
/// DOM incrementally, or buffer it manually.
#[wasm_bindgen(js_name = stream_html)]
pub fn stream_html(
    input: &str,
    chunk_callback: &Function,
    wrap_paragraphs: Option<bool>,
    harden_links: Option<bool>,
) -> Result<(), JsError> {
    let options = RewriteOptions {
        harden_links: harden_links.unwrap_or(true),
        strip_scripts: false,
    };

    let writer = JsChunkWriter::new(chunk_callback.clone());
    let mut rewriter = StreamingRewriter::new(writer, options);

    waypoint_core::render_to_writer(input, &render_options(wrap_paragraphs), &mut rewriter)
        .map_err(to_js_error)?;

    rewriter.into_inner().map_err(to_js_error)?;
    Ok(())
}

/// Plain-text version of an answer, ready for a `.txt` download.
#[wasm_bindgen(js_name = plain_text)]
pub fn plain_text(input: &str) -> String {
    waypoint_core::plain_text(input)
}

/// Line-by-line reveal driven by the page's own timer.
///
/// Call [`Reveal::tick`] from `setInterval` and clear the interval once it
/// returns `undefined`; dropping the object is the teardown.
#[wasm_bindgen]
pub struct Reveal {
    state: RevealState,
    options: RenderOptions,
}

#[wasm_bindgen]
impl Reveal {
    #[wasm_bindgen(constructor)]
    pub fn new(content: &str, wrap_paragraphs: Option<bool>) -> Reveal {
        Reveal {
            state: RevealState::new(content),
            options: render_options(wrap_paragraphs),
        }
    }

    /// Reveals one more line and returns the HTML to display, or `undefined`
    /// when the reveal has nothing left to show.
    pub fn tick(&mut self) -> Option<String> {
        if self.state.advance() {
            Some(self.state.frame(&self.options).html)
        } else {
            None
        }
    }

    /// HTML of the currently visible prefix.
    pub fn html(&self) -> String {
        self.state.frame(&self.options).html
    }

    pub fn cancel(&mut self) {
        self.state.halt();
    }

    #[wasm_bindgen(getter)]
    pub fn complete(&self) -> bool {
        self.state.is_complete()
    }

    #[wasm_bindgen(getter, js_name = linesRevealed)]
    pub fn lines_revealed(&self) -> usize {
        self.state.lines_revealed()
    }

    #[wasm_bindgen(getter, js_name = totalLines)]
    pub fn total_lines(&self) -> usize {
        self.state.total_lines()
    }
}

fn render_options(wrap_paragraphs: Option<bool>) -> RenderOptions {
    if wrap_paragraphs.unwrap_or(false) {
        RenderOptions::itinerary()
    } else {
        RenderOptions::chat()
    }
}

fn to_js_error<E: ToString>(err: E) -> JsError {
    JsError::new(&err.to_string())
}

struct JsChunkWriter {
    callback: Function,
}

impl JsChunkWriter {
    fn new(callback: Function) -> Self {
        Self { callback }
    }
}

impl Write for JsChunkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let chunk = std::str::from_utf8(buf)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        self.callback
            .call1(&JsValue::UNDEFINED, &JsValue::from_str(chunk))
            .map_err(js_callback_error)?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn js_callback_error(err: JsValue) -> io::Error {
    let message = err
        .as_string()
        .or_else(|| {
            js_sys::JSON::stringify(&err)
                .ok()
                .and_then(|s| s.as_string())
        })
        .unwrap_or_else(|| "callback threw".to_string());
    io::Error::other(message)
}
