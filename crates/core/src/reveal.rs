//! Timer-free progressive reveal state machine.
//!
//! [`RevealState`] discloses a markdown source one line at a time. It knows
//! nothing about clocks: whoever owns it calls [`RevealState::advance`] once per
//! tick. The Tokio-driven [`RevealController`](crate::controller::RevealController)
//! is one such owner; the wasm surface lets the JS event loop be another.

use serde::Serialize;

use crate::options::RenderOptions;

/// Where a reveal stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPhase {
    /// No content assigned yet.
    Idle,
    /// Lines remain and ticks are expected.
    Streaming,
    /// Every line is visible.
    Complete,
    /// Halted before the last line.
    Cancelled,
}

/// What a host displays after a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevealFrame {
    pub html: String,
    pub lines_revealed: usize,
    pub total_lines: usize,
    pub phase: RevealPhase,
}

impl RevealFrame {
    pub fn idle() -> Self {
        Self {
            html: String::new(),
            lines_revealed: 0,
            total_lines: 0,
            phase: RevealPhase::Idle,
        }
    }
}

/// Line-by-line disclosure of one message.
///
/// Invariants: `lines_revealed <= total_lines`, and `running` only while
/// lines remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealState {
    source: String,
    /// Byte offset one past the end of each line, excluding its `\n`.
    line_ends: Vec<usize>,
    lines_revealed: usize,
    running: bool,
    assigned: bool,
}

impl RevealState {
    /// State before any content was assigned.
    pub fn idle() -> Self {
        Self {
            source: String::new(),
            line_ends: Vec::new(),
            lines_revealed: 0,
            running: false,
            assigned: false,
        }
    }

    /// Fresh reveal of `content`. Empty content is complete straight away.
    pub fn new(content: impl Into<String>) -> Self {
        let source = content.into();
        let line_ends = line_ends(&source);
        let running = !line_ends.is_empty();
        Self {
            source,
            line_ends,
            lines_revealed: 0,
            running,
            assigned: true,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn total_lines(&self) -> usize {
        self.line_ends.len()
    }

    pub fn lines_revealed(&self) -> usize {
        self.lines_revealed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> RevealPhase {
        if !self.assigned {
            RevealPhase::Idle
        } else if self.lines_revealed == self.total_lines() {
            RevealPhase::Complete
        } else if self.running {
            RevealPhase::Streaming
        } else {
            RevealPhase::Cancelled
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == RevealPhase::Complete
    }

    /// Reveals one more line. Returns `false` when nothing changed, i.e. the
    /// reveal is not streaming.
    pub fn advance(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.lines_revealed += 1;
        if self.lines_revealed >= self.total_lines() {
            self.lines_revealed = self.total_lines();
            self.running = false;
        }
        true
    }

    /// Stops a reveal in place; the revealed prefix stays visible.
    pub fn halt(&mut self) {
        self.running = false;
    }

    /// The first `lines_revealed` lines, joined by their original newlines.
    pub fn visible_source(&self) -> &str {
        match self.lines_revealed.checked_sub(1) {
            Some(last) => &self.source[..self.line_ends[last]],
            None => "",
        }
    }

    /// Transforms the visible prefix.
    pub fn frame(&self, options: &RenderOptions) -> RevealFrame {
        RevealFrame {
            html: crate::render(self.visible_source(), options),
            lines_revealed: self.lines_revealed,
            total_lines: self.total_lines(),
            phase: self.phase(),
        }
    }
}

impl Default for RevealState {
    fn default() -> Self {
        Self::idle()
    }
}

fn line_ends(source: &str) -> Vec<usize> {
    if source.is_empty() {
        return Vec::new();
    }
    source
        .match_indices('\n')
        .map(|(index, _)| index)
        .chain(std::iter::once(source.len()))
        .collect()
}
