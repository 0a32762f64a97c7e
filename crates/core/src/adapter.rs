use std::io::{self, Write};

use crate::event::Event;
use crate::html_renderer::HtmlRenderer;

/// A bridge that accepts an Iterator of rendering events and streams
/// the resulting HTML directly to an io::Write, avoiding intermediate String allocation.
pub struct PipeAdapter<W> {
    writer: W,
    escape_html: bool,
}

impl<W: Write> PipeAdapter<W> {
    /// Create a new adapter wrapping an IO writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            escape_html: false,
        }
    }

    /// Escape text and link targets instead of writing them verbatim.
    pub fn escape_html(mut self, escape: bool) -> Self {
        self.escape_html = escape;
        self
    }

    /// Consumes the event iterator and drives the data into the writer.
    ///
    /// # Arguments
    /// * `events` - The iterator yielding rendering events.
    pub fn drive<'a, I>(self, events: I) -> io::Result<()>
    where
        I: Iterator<Item = Event<'a>>,
    {
        let mut writer = HtmlRenderer::new(self.writer)
            .escaping(self.escape_html)
            .render(events)?;

        // Flush the underlying writer to ensure all bytes are sent
        writer.flush()
    }
}
