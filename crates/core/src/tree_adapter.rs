//! Flattens the parsed node tree into the [`Event`] stream consumed by the renderer.

use std::borrow::Cow;

use crate::ast::{Block, Document, Inline};
use crate::event::{Event, Tag};

/// Walks `document` and returns its events in document order.
///
/// Blocks, list items and paragraph lines are separated by
/// [`Event::SoftBreak`], so the rendered HTML keeps one output line per
/// source line outside of lists.
pub fn events(document: &Document) -> std::vec::IntoIter<Event<'_>> {
    let mut builder = EventBuilder::default();
    builder.visit_document(document);
    builder.events.into_iter()
}

#[derive(Default)]
struct EventBuilder<'a> {
    events: Vec<Event<'a>>,
}

impl<'a> EventBuilder<'a> {
    fn visit_document(&mut self, document: &'a Document) {
        for (index, block) in document.blocks.iter().enumerate() {
            if index > 0 {
                self.events.push(Event::SoftBreak);
            }
            self.visit_block(block);
        }
    }

    fn visit_block(&mut self, block: &'a Block) {
        match block {
            Block::Heading { level, content } => self.with_tag(Tag::Heading(*level), content),
            Block::List { kind, items } => {
                let tag = Tag::List(*kind);
                let end = tag.to_end();
                self.events.push(Event::Start(tag));
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        self.events.push(Event::SoftBreak);
                    }
                    self.with_tag(Tag::Item, &item.content);
                }
                self.events.push(Event::End(end));
            }
            Block::Paragraph(lines) => {
                let tag = Tag::Paragraph;
                let end = tag.to_end();
                self.events.push(Event::Start(tag));
                for (index, line) in lines.iter().enumerate() {
                    if index > 0 {
                        self.events.push(Event::SoftBreak);
                    }
                    self.visit_children(line);
                }
                self.events.push(Event::End(end));
            }
            Block::Line(content) => self.visit_children(content),
        }
    }

    fn visit(&mut self, node: &'a Inline) {
        match node {
            Inline::Text(text) => self.events.push(Event::Text(Cow::Borrowed(text.as_str()))),
            Inline::Bold(children) => self.with_tag(Tag::Strong, children),
            Inline::Italic(children) => self.with_tag(Tag::Emphasis, children),
            Inline::Code(children) => self.with_tag(Tag::Code, children),
            Inline::Link { url, children } => {
                let tag = Tag::Link {
                    dest_url: Cow::Borrowed(url.as_str()),
                };
                self.with_tag(tag, children)
            }
        }
    }

    fn visit_children(&mut self, children: &'a [Inline]) {
        for child in children {
            self.visit(child);
        }
    }

    fn with_tag(&mut self, tag: Tag<'a>, children: &'a [Inline]) {
        let end = tag.to_end();
        self.events.push(Event::Start(tag));
        self.visit_children(children);
        self.events.push(Event::End(end));
    }
}
