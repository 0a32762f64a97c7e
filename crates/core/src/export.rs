//! Plain-text download of an agent answer.

use std::io::{self, Write};
use std::sync::LazyLock;

use regex::Regex;

static HEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#{1,6}\s+").expect("valid heading regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold regex"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid italic regex"));
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.*?)`").expect("valid code regex"));

/// Strips heading, bold, italic and code markers from a markdown source.
///
/// Links and list markers are kept; the result is meant for a `.txt` file.
pub fn plain_text(source: &str) -> String {
    let text = HEADING_MARKER.replace_all(source, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    CODE.replace_all(&text, "$1").into_owned()
}

/// A plain-text export paired with its download name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextExport {
    pub file_name: &'static str,
    pub body: String,
}

impl TextExport {
    /// Export of a single chat answer.
    pub fn message(content: &str) -> Self {
        Self {
            file_name: "message.txt",
            body: plain_text(content),
        }
    }

    /// Export of a generated itinerary.
    pub fn itinerary(content: &str) -> Self {
        Self {
            file_name: "itinerary.txt",
            body: plain_text(content),
        }
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.body.as_bytes())?;
        writer.flush()
    }
}
