//! Line-oriented block parser with rule-ordered inline passes.
//!
//! Blocks are recognised per line (headings before list items), then each
//! line's text goes through the inline passes in a fixed order: bold, italic,
//! code, links. A pass only splits `Text` nodes at its own nesting level and
//! recurses into containers built by earlier passes, so a later rule can wrap
//! an earlier span but never cut through one.

use std::collections::VecDeque;

use crate::ast::{Block, Document, Inline, ListItem};
use crate::event::{HeadingLevel, ListKind};
use crate::options::RenderOptions;

/// Parses `source` into a node tree. Never fails; unmatched syntax stays text.
///
/// With `wrap_paragraphs`, a paragraph is a run of consecutive text lines.
/// Headings and lists end it as well as blank lines, and a whitespace-only
/// line counts as blank, so `<p>` never wraps block markup.
pub fn parse(source: &str, options: &RenderOptions) -> Document {
    if source.is_empty() {
        return Document::default();
    }

    let lines: Vec<Line<'_>> = source
        .split('\n')
        .map(|raw| classify(raw.strip_suffix('\r').unwrap_or(raw), options))
        .collect();

    let mut blocks = Vec::new();
    let mut cursor = 0;
    while let Some(line) = lines.get(cursor).copied() {
        match line {
            Line::Heading(level, text) => {
                blocks.push(Block::Heading {
                    level,
                    content: parse_inlines(text),
                });
                cursor += 1;
            }
            Line::Item(kind, _) => {
                let (items, next) = take_list(&lines, cursor, kind);
                blocks.push(Block::List { kind, items });
                cursor = next;
            }
            Line::Blank(raw) => {
                if !options.wrap_paragraphs {
                    blocks.push(Block::Line(parse_inlines(raw)));
                }
                cursor += 1;
            }
            Line::Text(raw) if options.wrap_paragraphs => {
                let mut paragraph = vec![parse_inlines(raw)];
                cursor += 1;
                while let Some(Line::Text(raw)) = lines.get(cursor).copied() {
                    paragraph.push(parse_inlines(raw));
                    cursor += 1;
                }
                blocks.push(Block::Paragraph(paragraph));
            }
            Line::Text(raw) => {
                blocks.push(Block::Line(parse_inlines(raw)));
                cursor += 1;
            }
        }
    }

    Document { blocks }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Blank(&'a str),
    Heading(HeadingLevel, &'a str),
    Item(ListKind, &'a str),
    Text(&'a str),
}

fn classify<'a>(raw: &'a str, options: &RenderOptions) -> Line<'a> {
    if raw.trim().is_empty() {
        return Line::Blank(raw);
    }
    if let Some((level, text)) = heading(raw) {
        return Line::Heading(level, text);
    }

    let indented = raw.trim_start();
    if let Some(text) = bullet(indented, options.extended_bullets) {
        return Line::Item(ListKind::Unordered, text);
    }
    if let Some(text) = numbered(indented) {
        return Line::Item(ListKind::Ordered, text);
    }

    Line::Text(raw)
}

/// `#`×1..=6 at the very start of the line, then at least one whitespace.
fn heading(line: &str) -> Option<(HeadingLevel, &str)> {
    let hashes = line.bytes().take_while(|&byte| byte == b'#').count();
    let level = HeadingLevel::try_from(hashes).ok()?;
    let rest = &line[hashes..];
    rest.starts_with(char::is_whitespace)
        .then(|| (level, rest.trim_start()))
}

fn bullet(line: &str, extended: bool) -> Option<&str> {
    let mut chars = line.chars();
    let marker = chars.next()?;
    let accepted = marker == '*' || (extended && matches!(marker, '-' | '+'));
    if !accepted {
        return None;
    }
    let rest = chars.as_str();
    rest.starts_with(char::is_whitespace)
        .then(|| rest.trim_start())
}

fn numbered(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    rest.starts_with(char::is_whitespace)
        .then(|| rest.trim_start())
}

/// Collects a run of same-kind items. Blank lines between two items are
/// absorbed; blank lines after the last item are left for the caller.
fn take_list(lines: &[Line<'_>], start: usize, kind: ListKind) -> (Vec<ListItem>, usize) {
    let mut items = Vec::new();
    let mut end = start;
    let mut cursor = start;
    while let Some(line) = lines.get(cursor).copied() {
        match line {
            Line::Item(item_kind, text) if item_kind == kind => {
                items.push(ListItem {
                    content: parse_inlines(text),
                });
                cursor += 1;
                end = cursor;
            }
            Line::Blank(_) => cursor += 1,
            _ => break,
        }
    }
    (items, end)
}

/// Runs the inline rules over one line of text.
pub fn parse_inlines(text: &str) -> Vec<Inline> {
    let mut nodes = Vec::new();
    push_text(&mut nodes, text);

    let nodes = wrap_delimited(nodes, Delimiter::DoubleStar, Inline::Bold);
    let nodes = wrap_delimited(nodes, Delimiter::Star, Inline::Italic);
    let nodes = wrap_delimited(nodes, Delimiter::Backtick, Inline::Code);
    wrap_links(nodes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    DoubleStar,
    Star,
    Backtick,
}

impl Delimiter {
    fn as_str(self) -> &'static str {
        match self {
            Delimiter::DoubleStar => "**",
            Delimiter::Star => "*",
            Delimiter::Backtick => "`",
        }
    }

    /// Byte offset of the next usable delimiter in `text`.
    fn find(self, text: &str) -> Option<usize> {
        match self {
            Delimiter::DoubleStar => text.find("**"),
            Delimiter::Backtick => text.find('`'),
            // A lone `*`; longer runs are leftovers of unterminated bold.
            Delimiter::Star => {
                let bytes = text.as_bytes();
                let mut index = 0;
                while index < bytes.len() {
                    if bytes[index] != b'*' {
                        index += 1;
                        continue;
                    }
                    let run = bytes[index..]
                        .iter()
                        .take_while(|&&byte| byte == b'*')
                        .count();
                    if run == 1 {
                        return Some(index);
                    }
                    index += run;
                }
                None
            }
        }
    }
}

/// Pairs delimiters left to right (nearest closer wins) and wraps what lies
/// between them. An opener without a closer is put back as literal text.
fn wrap_delimited(
    nodes: Vec<Inline>,
    delimiter: Delimiter,
    wrap: fn(Vec<Inline>) -> Inline,
) -> Vec<Inline> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut open: Option<Vec<Inline>> = None;

    for node in nodes {
        match node.map_children(|children| wrap_delimited(children, delimiter, wrap)) {
            Inline::Text(text) => {
                let mut rest = text.as_str();
                while let Some(at) = delimiter.find(rest) {
                    let before = &rest[..at];
                    match open.take() {
                        None => {
                            push_text(&mut out, before);
                            open = Some(Vec::new());
                        }
                        Some(mut span) => {
                            push_text(&mut span, before);
                            out.push(wrap(span));
                        }
                    }
                    rest = &rest[at + delimiter.as_str().len()..];
                }
                match open.as_mut() {
                    Some(span) => push_text(span, rest),
                    None => push_text(&mut out, rest),
                }
            }
            other => match open.as_mut() {
                Some(span) => span.push(other),
                None => out.push(other),
            },
        }
    }

    if let Some(span) = open {
        push_text(&mut out, delimiter.as_str());
        for node in span {
            push_node(&mut out, node);
        }
    }

    out
}

/// `[label](url)`: the label may span earlier containers, the url must sit
/// in a single text run.
fn wrap_links(nodes: Vec<Inline>) -> Vec<Inline> {
    let mut pending: VecDeque<Inline> = nodes
        .into_iter()
        .map(|node| node.map_children(wrap_links))
        .collect();
    let mut out = Vec::with_capacity(pending.len());

    while let Some(node) = pending.pop_front() {
        let text = match node {
            Inline::Text(text) => text,
            other => {
                out.push(other);
                continue;
            }
        };
        let Some(open) = text.find('[') else {
            push_text(&mut out, &text);
            continue;
        };

        push_text(&mut out, &text[..open]);
        let head = &text[open + 1..];
        match take_link(head, &mut pending) {
            Some(link) => out.push(link),
            None => {
                push_text(&mut out, "[");
                requeue(&mut pending, head);
            }
        }
    }

    out
}

/// Closes a link whose `[` sat right before `head`, consuming label nodes
/// from `pending` and requeueing whatever follows the `)`.
fn take_link(head: &str, pending: &mut VecDeque<Inline>) -> Option<Inline> {
    if head.contains("](") {
        let (label, url, tail) = split_link_tail(head)?;
        let mut children = Vec::new();
        push_text(&mut children, label);
        requeue(pending, tail);
        return Some(Inline::Link {
            url: url.to_owned(),
            children,
        });
    }

    let index = pending
        .iter()
        .position(|node| matches!(node, Inline::Text(text) if text.contains("](")))?;
    let (label_tail, url, tail) = match &pending[index] {
        Inline::Text(closing) => {
            let (label_tail, url, tail) = split_link_tail(closing)?;
            (label_tail.to_owned(), url.to_owned(), tail.to_owned())
        }
        _ => return None,
    };

    let mut children = Vec::new();
    push_text(&mut children, head);
    for node in pending.drain(..index) {
        push_node(&mut children, node);
    }
    pending.pop_front();
    push_text(&mut children, &label_tail);
    requeue(pending, &tail);

    Some(Inline::Link { url, children })
}

fn split_link_tail(text: &str) -> Option<(&str, &str, &str)> {
    let close = text.find("](")?;
    let after = &text[close + 2..];
    let end = after.find(')')?;
    Some((&text[..close], &after[..end], &after[end + 1..]))
}

fn requeue(pending: &mut VecDeque<Inline>, tail: &str) {
    if !tail.is_empty() {
        pending.push_front(Inline::Text(tail.to_owned()));
    }
}

fn push_text(nodes: &mut Vec<Inline>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(Inline::Text(text.to_owned()));
    }
}

fn push_node(nodes: &mut Vec<Inline>, node: Inline) {
    match node {
        Inline::Text(text) => push_text(nodes, &text),
        other => nodes.push(other),
    }
}
