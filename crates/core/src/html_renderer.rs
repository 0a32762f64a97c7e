use std::io::{self, Write};

use crate::event::{Event, HeadingLevel, Tag, TagEnd};

/// Writes an [`Event`] stream as an HTML fragment.
///
/// Text is written verbatim by default, so raw HTML in the markdown source
/// reaches the output untouched. [`HtmlRenderer::escaping`] switches text and
/// link targets to entity-escaped output.
pub struct HtmlRenderer<W: Write> {
    writer: W,
    escape: bool,
}

impl<W: Write> HtmlRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            escape: false,
        }
    }

    pub fn escaping(mut self, escape: bool) -> Self {
        self.escape = escape;
        self
    }

    pub fn render<'a, I>(mut self, iter: I) -> io::Result<W>
    where
        I: IntoIterator<Item = Event<'a>>,
    {
        for event in iter {
            match event {
                Event::Start(tag) => self.write_start_tag(tag)?,
                Event::End(end) => self.write_end_tag(end)?,
                Event::Text(text) => self.write_text(text.as_ref())?,
                Event::SoftBreak => self.writer.write_all(b"\n")?,
            }
        }

        Ok(self.writer)
    }

    fn write_start_tag(&mut self, tag: Tag<'_>) -> io::Result<()> {
        match tag {
            Tag::Paragraph => self.writer.write_all(b"<p>"),
            Tag::Heading(level) => write!(self.writer, "<h{}>", heading_depth(level)),
            Tag::List(kind) => write!(self.writer, "<{}>", kind.tag_name()),
            Tag::Item => self.writer.write_all(b"<li>"),
            Tag::Emphasis => self.writer.write_all(b"<em>"),
            Tag::Strong => self.writer.write_all(b"<strong>"),
            Tag::Code => self.writer.write_all(b"<code>"),
            Tag::Link { dest_url } => {
                self.writer.write_all(b"<a href=\"")?;
                self.write_text(dest_url.as_ref())?;
                self.writer.write_all(b"\" target=\"_blank\">")
            }
        }
    }

    fn write_end_tag(&mut self, end: TagEnd) -> io::Result<()> {
        match end {
            TagEnd::Paragraph => self.writer.write_all(b"</p>"),
            TagEnd::Heading(level) => write!(self.writer, "</h{}>", heading_depth(level)),
            TagEnd::List(kind) => write!(self.writer, "</{}>", kind.tag_name()),
            TagEnd::Item => self.writer.write_all(b"</li>"),
            TagEnd::Emphasis => self.writer.write_all(b"</em>"),
            TagEnd::Strong => self.writer.write_all(b"</strong>"),
            TagEnd::Code => self.writer.write_all(b"</code>"),
            TagEnd::Link => self.writer.write_all(b"</a>"),
        }
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        if self.escape {
            self.escape_html(text)
        } else {
            self.writer.write_all(text.as_bytes())
        }
    }

    fn escape_html(&mut self, text: &str) -> io::Result<()> {
        let mut start = 0;
        for (index, byte) in text.bytes().enumerate() {
            let replacement: &[u8] = match byte {
                b'&' => b"&amp;",
                b'<' => b"&lt;",
                b'>' => b"&gt;",
                b'"' => b"&quot;",
                b'\'' => b"&#39;",
                _ => continue,
            };
            self.writer.write_all(&text.as_bytes()[start..index])?;
            self.writer.write_all(replacement)?;
            start = index + 1;
        }
        self.writer.write_all(&text.as_bytes()[start..])
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    level as u8
}
