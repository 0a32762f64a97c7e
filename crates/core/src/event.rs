use std::borrow::Cow;
use std::convert::TryFrom;

/// A rendering event emitted while walking a parsed [`Document`](crate::ast::Document).
#[derive(Debug, Clone, PartialEq)]
pub enum Event<'a> {
    /// Start of a tagged element.
    Start(Tag<'a>),
    /// End of a tagged element.
    End(TagEnd),
    /// Text node. Written verbatim unless escaping is enabled.
    Text(Cow<'a, str>),
    /// Line separator between blocks, list items and paragraph lines.
    SoftBreak,
}

/// Tags for container elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag<'a> {
    Paragraph,
    Heading(HeadingLevel),
    List(ListKind),
    Item,
    Emphasis,
    Strong,
    Code,
    Link { dest_url: Cow<'a, str> },
}

/// Tag terminators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagEnd {
    Paragraph,
    Heading(HeadingLevel),
    List(ListKind),
    Item,
    Emphasis,
    Strong,
    Code,
    Link,
}

/// Heading depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadingLevel {
    H1 = 1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

/// Bullet (`<ul>`) or numbered (`<ol>`) list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    pub(crate) fn tag_name(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

impl<'a> Tag<'a> {
    /// Converts a tag into its closing counterpart.
    pub fn to_end(&self) -> TagEnd {
        match self {
            Tag::Paragraph => TagEnd::Paragraph,
            Tag::Heading(level) => TagEnd::Heading(*level),
            Tag::List(kind) => TagEnd::List(*kind),
            Tag::Item => TagEnd::Item,
            Tag::Emphasis => TagEnd::Emphasis,
            Tag::Strong => TagEnd::Strong,
            Tag::Code => TagEnd::Code,
            Tag::Link { .. } => TagEnd::Link,
        }
    }
}

impl TryFrom<usize> for HeadingLevel {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(HeadingLevel::H1),
            2 => Ok(HeadingLevel::H2),
            3 => Ok(HeadingLevel::H3),
            4 => Ok(HeadingLevel::H4),
            5 => Ok(HeadingLevel::H5),
            6 => Ok(HeadingLevel::H6),
            _ => Err(()),
        }
    }
}
