//! Configuration shared by the transformer, the reveal controller and the rewriter.

use std::num::NonZeroU64;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Per-line pace used by the chat view.
pub const CHAT_INTERVAL_MS: NonZeroU64 = NonZeroU64::new(20).unwrap();

/// Per-line pace used by the itinerary view.
pub const ITINERARY_INTERVAL_MS: NonZeroU64 = NonZeroU64::new(7).unwrap();

/// Knobs for the markdown transformer (all off by default).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Wrap runs of text lines in `<p>` and treat blank lines as separators.
    #[serde(default)]
    pub wrap_paragraphs: bool,
    /// Accept `-` and `+` as bullet markers in addition to `*`.
    #[serde(default)]
    pub extended_bullets: bool,
    /// Escape text and link targets instead of passing raw HTML through.
    #[serde(default)]
    pub escape_html: bool,
}

impl RenderOptions {
    /// Chat bubbles: no paragraph wrapping, `*` bullets only.
    pub const fn chat() -> Self {
        Self {
            wrap_paragraphs: false,
            extended_bullets: false,
            escape_html: false,
        }
    }

    /// Itinerary panel: paragraphs plus `-`/`+` bullets.
    pub const fn itinerary() -> Self {
        Self {
            wrap_paragraphs: true,
            extended_bullets: true,
            escape_html: false,
        }
    }
}

/// Pace and rendering settings for a progressive reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealOptions {
    /// Delay between two reveal ticks, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: NonZeroU64,
    /// How each revealed prefix is transformed.
    #[serde(default)]
    pub render: RenderOptions,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self::chat()
    }
}

fn default_interval_ms() -> NonZeroU64 {
    CHAT_INTERVAL_MS
}

impl RevealOptions {
    /// Builds options from a raw millisecond count, rejecting zero.
    pub fn new(interval_ms: u64, render: RenderOptions) -> Result<Self> {
        let interval_ms = NonZeroU64::new(interval_ms).ok_or(Error::InvalidInterval)?;
        Ok(Self {
            interval_ms,
            render,
        })
    }

    pub const fn chat() -> Self {
        Self {
            interval_ms: CHAT_INTERVAL_MS,
            render: RenderOptions::chat(),
        }
    }

    pub const fn itinerary() -> Self {
        Self {
            interval_ms: ITINERARY_INTERVAL_MS,
            render: RenderOptions::itinerary(),
        }
    }

    /// The tick period as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.get())
    }
}
