//! Waypoint core: markdown rendering and progressive reveal for the travel
//! planner's chat and itinerary views.
//!
//! The transformer is a pure function ([`render`]); the reveal is either
//! driven by hand ([`RevealState`]) or on Tokio ([`RevealController`]).

use std::io::{self, Write};

pub mod adapter;
pub mod api;
pub mod ast;
pub mod controller;
pub mod conversation;
pub mod error;
pub mod event;
pub mod export;
pub mod html_renderer;
pub mod options;
pub mod parser;
pub mod reveal;
pub mod streaming_rewriter;
pub mod tree_adapter;

pub use adapter::PipeAdapter;
pub use controller::RevealController;
pub use conversation::{Author, ConversationLog, Message, clean_question};
pub use error::{Error, Result};
pub use export::{TextExport, plain_text};
pub use options::{RenderOptions, RevealOptions};
pub use parser::parse;
pub use reveal::{RevealFrame, RevealPhase, RevealState};
pub use streaming_rewriter::{RewriteOptions, StreamingRewriter};

/// Version string of this crate.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Transforms a markdown-subset string into an HTML fragment.
///
/// Never fails: anything no rule matches is passed through as text.
pub fn render(source: &str, options: &RenderOptions) -> String {
    let mut buffer = Vec::with_capacity(source.len() + source.len() / 2);
    // A Vec<u8> sink cannot fail.
    let _ = render_to_writer(source, options, &mut buffer);
    String::from_utf8(buffer)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Streams the rendered HTML of `source` into `writer`.
pub fn render_to_writer<W: Write>(
    source: &str,
    options: &RenderOptions,
    writer: W,
) -> io::Result<()> {
    let document = parser::parse(source, options);
    PipeAdapter::new(writer)
        .escape_html(options.escape_html)
        .drive(tree_adapter::events(&document))
}

/// Renders `source` through the lol_html post-processing pass.
pub fn render_rewritten(
    source: &str,
    options: &RenderOptions,
    rewrite: RewriteOptions,
) -> Result<String> {
    let mut rewriter = StreamingRewriter::new(Vec::new(), rewrite);
    render_to_writer(source, options, &mut rewriter)?;
    let bytes = rewriter.into_inner()?;
    String::from_utf8(bytes).map_err(|err| Error::Rewrite(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chat(source: &str) -> String {
        render(source, &RenderOptions::chat())
    }

    fn itinerary(source: &str) -> String {
        render(source, &RenderOptions::itinerary())
    }

    #[test]
    fn six_hashes_make_an_h6() {
        assert_eq!(chat("###### Six"), "<h6>Six</h6>");
        assert_eq!(chat("# One"), "<h1>One</h1>");
    }

    #[test]
    fn link_opens_in_new_tab() {
        assert_eq!(
            chat("[go](http://x.test)"),
            r#"<a href="http://x.test" target="_blank">go</a>"#
        );
    }

    #[test]
    fn bullet_run_is_one_list() {
        let html = chat("* a\n* b\n* c");
        assert_eq!(html, "<ul><li>a</li>\n<li>b</li>\n<li>c</li></ul>");
        assert_eq!(html.matches("<ul>").count(), 1);
        assert_eq!(html.matches("</ul>").count(), 1);
        assert_eq!(html.matches("<li>").count(), 3);
    }

    #[test]
    fn ordered_and_unordered_runs_stay_apart() {
        assert_eq!(
            chat("1. fly\n2. land\n* relax"),
            "<ol><li>fly</li>\n<li>land</li></ol>\n<ul><li>relax</li></ul>"
        );
    }

    #[test]
    fn chat_keeps_lines_and_blank_lines() {
        assert_eq!(
            chat("## Day 1\n\nVisit **Sagrada Família**, then `tapas`.\n  * near *Born*"),
            "<h2>Day 1</h2>\n\nVisit <strong>Sagrada Família</strong>, then <code>tapas</code>.\n<ul><li>near <em>Born</em></li></ul>"
        );
    }

    #[test]
    fn itinerary_wraps_paragraphs() {
        assert_eq!(
            itinerary("# Kyoto\nArrive early.\nCheck in.\n\n\n- Fushimi Inari\n+ Gion\n\nDinner."),
            "<h1>Kyoto</h1>\n<p>Arrive early.\nCheck in.</p>\n<ul><li>Fushimi Inari</li>\n<li>Gion</li></ul>\n<p>Dinner.</p>"
        );
    }

    #[test]
    fn itinerary_never_emits_empty_paragraphs() {
        assert_eq!(itinerary("\n\n\n"), "");
        assert!(!itinerary("a\n\n\n\nb").contains("<p></p>"));
    }

    #[test]
    fn unterminated_markers_stay_literal() {
        assert_eq!(chat("**bold"), "**bold");
        assert_eq!(chat("a *b"), "a *b");
        assert_eq!(chat("`code"), "`code");
    }

    #[test]
    fn raw_html_is_passed_through() {
        assert_eq!(chat("<b>hi</b>"), "<b>hi</b>");
        let escaped = RenderOptions {
            escape_html: true,
            ..RenderOptions::chat()
        };
        assert_eq!(render("<b>hi</b>", &escaped), "&lt;b&gt;hi&lt;/b&gt;");
    }

    #[test]
    fn transform_is_stable_across_calls() {
        let source = "# Plan\n* **Day 1**: *Louvre*\n1. [map](http://x.test)";
        let first = chat(source);
        for _ in 0..3 {
            assert_eq!(chat(source), first);
        }
    }

    #[test]
    fn every_prefix_renders_balanced_tags() {
        let source = "# Trip\n* **Day 1** at *Orsay\n* `tip` [site](http://x.test)\n1. go\n\nend";
        for cut in source.char_indices().map(|(index, _)| index) {
            let html = chat(&source[..cut]);
            for tag in ["ul", "ol", "li", "strong", "em", "code", "a", "h1"] {
                let opens = html.matches(&format!("<{tag}>")).count()
                    + html.matches(&format!("<{tag} ")).count();
                let closes = html.matches(&format!("</{tag}>")).count();
                assert_eq!(opens, closes, "<{tag}> unbalanced for {:?}", &source[..cut]);
            }
        }
    }

    #[test]
    fn rewritten_render_hardens_links() {
        let rewrite = RewriteOptions {
            harden_links: true,
            strip_scripts: true,
        };
        let html = render_rewritten(
            "[go](http://x.test)\n<script>x()</script>",
            &RenderOptions::chat(),
            rewrite,
        )
        .unwrap();
        assert!(html.starts_with("<a href=\"http://x.test\""), "{html}");
        assert!(html.contains("rel=\"noopener noreferrer\""), "{html}");
        assert!(html.ends_with(">go</a>\n"), "{html}");
        assert!(!html.contains("script"), "{html}");
    }

    #[test]
    fn version_matches_manifest() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
