//! Streaming HTML rewriter glue that feeds rendered markdown into lol_html without buffering.

use lol_html::errors::RewritingError;
use lol_html::{HtmlRewriter, OutputSink, Selector, Settings, element};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Configuration flags that control how the streaming rewriter manipulates HTML.
///
/// Both flags are off by default, in which case the rewriter is a pass-through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteOptions {
    /// Adds `rel="noopener noreferrer"` to `target="_blank"` anchors that carry no `rel`.
    #[serde(default)]
    pub harden_links: bool,
    /// Drops `<script>` elements that raw markdown let through.
    #[serde(default)]
    pub strip_scripts: bool,
}

/// Implements [`Write`] so the `PipeAdapter` can push rendered HTML directly into lol_html.
///
/// Internally we share the destination writer through a single `Rc<RefCell<Option<W>>>`, which is
/// the only heap allocation required to satisfy lol_html's `OutputSink` trait without buffering
/// large chunks of rewritten output.
pub struct StreamingRewriter<W: Write> {
    rewriter: Option<HtmlRewriter<'static, OutputProxy<W>>>,
    target: Rc<RefCell<Option<W>>>,
    sink_error: Rc<RefCell<Option<io::Error>>>,
}

impl<W: Write> StreamingRewriter<W> {
    /// Creates a new streaming rewriter that forwards lol_html output into `writer` while applying
    /// the supplied rewrite options.
    pub fn new(writer: W, options: RewriteOptions) -> Self {
        let target = Rc::new(RefCell::new(Some(writer)));
        let sink_error = Rc::new(RefCell::new(None));
        let output_sink = OutputProxy::new(Rc::clone(&target), Rc::clone(&sink_error));
        let settings = options.into_settings();
        let rewriter = HtmlRewriter::new(settings, output_sink);

        Self {
            rewriter: Some(rewriter),
            target,
            sink_error,
        }
    }

    /// Consumes the rewriter, ensures lol_html has flushed, and returns the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.finalize_if_needed()?;

        let cell = Rc::try_unwrap(self.target)
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "rewriter still borrowed"))?;

        cell.into_inner()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "writer missing"))
    }

    fn finalize_if_needed(&mut self) -> io::Result<()> {
        if let Some(rewriter) = self.rewriter.take() {
            rewriter.end().map_err(rewriting_error_to_io)?;
        }

        Self::take_sink_error(&self.sink_error)
    }

    fn take_sink_error(cell: &Rc<RefCell<Option<io::Error>>>) -> io::Result<()> {
        if let Some(err) = cell.borrow_mut().take() {
            Err(err)
        } else {
            Ok(())
        }
    }
}

impl<W: Write> Write for StreamingRewriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let rewriter = self
            .rewriter
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "rewriter finalized"))?;

        rewriter.write(buf).map_err(rewriting_error_to_io)?;
        Self::take_sink_error(&self.sink_error)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.finalize_if_needed()
    }
}

impl RewriteOptions {
    fn into_settings(&self) -> Settings<'static, 'static> {
        let mut settings = Settings::default();
        let mut handlers = Vec::new();

        if self.harden_links {
            handlers.push(noopener_link_handler());
        }

        if self.strip_scripts {
            handlers.push(script_removal_handler());
        }

        settings.element_content_handlers = handlers;
        settings
    }
}

fn noopener_link_handler() -> (
    Cow<'static, Selector>,
    lol_html::ElementContentHandlers<'static>,
) {
    element!("a[target=\"_blank\"]", |el| {
        if el.get_attribute("rel").is_none() {
            el.set_attribute("rel", "noopener noreferrer")?;
        }

        Ok(())
    })
}

fn script_removal_handler() -> (
    Cow<'static, Selector>,
    lol_html::ElementContentHandlers<'static>,
) {
    element!("script", |el| {
        el.remove();
        Ok(())
    })
}

fn rewriting_error_to_io(err: RewritingError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

struct OutputProxy<W: Write> {
    target: Rc<RefCell<Option<W>>>,
    sink_error: Rc<RefCell<Option<io::Error>>>,
}

impl<W: Write> OutputProxy<W> {
    fn new(target: Rc<RefCell<Option<W>>>, sink_error: Rc<RefCell<Option<io::Error>>>) -> Self {
        OutputProxy { target, sink_error }
    }
}

impl<W: Write> OutputSink for OutputProxy<W> {
    fn handle_chunk(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }

        if self.sink_error.borrow().is_some() {
            return;
        }

        let mut borrow = self.target.borrow_mut();

        if let Some(writer) = borrow.as_mut() {
            if let Err(err) = writer.write_all(chunk) {
                tracing::warn!(error = %err, "rewriter sink rejected a chunk");
                *self.sink_error.borrow_mut() = Some(err);
            }
        }
    }
}
