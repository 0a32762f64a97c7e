//! Node tree produced by the parser and consumed by the event adapter.

use crate::event::{HeadingLevel, ListKind};

/// A parsed markdown document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// Line-level structure.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: HeadingLevel,
        content: Vec<Inline>,
    },
    List {
        kind: ListKind,
        items: Vec<ListItem>,
    },
    /// Consecutive text lines; only produced when paragraph wrapping is on.
    Paragraph(Vec<Vec<Inline>>),
    /// A single text line emitted as-is (chat rendering).
    Line(Vec<Inline>),
}

/// Content of one `<li>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListItem {
    pub content: Vec<Inline>,
}

/// Inline content of a line.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    Code(Vec<Inline>),
    Link { url: String, children: Vec<Inline> },
}

impl Inline {
    /// Rebuilds container nodes with `f` applied to their children; text is left alone.
    pub(crate) fn map_children<F>(self, f: F) -> Inline
    where
        F: FnOnce(Vec<Inline>) -> Vec<Inline>,
    {
        match self {
            Inline::Text(text) => Inline::Text(text),
            Inline::Bold(children) => Inline::Bold(f(children)),
            Inline::Italic(children) => Inline::Italic(f(children)),
            Inline::Code(children) => Inline::Code(f(children)),
            Inline::Link { url, children } => Inline::Link {
                url,
                children: f(children),
            },
        }
    }
}
