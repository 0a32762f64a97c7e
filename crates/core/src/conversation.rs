//! Append-only message log for one chat view.
//!
//! Every agent message gets its own [`RevealController`]; user messages are
//! shown in full and get none. Controllers are never shared, and dropping the
//! log (navigating away) cancels every running reveal.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tokio::sync::watch;
use tracing::debug;

use crate::controller::RevealController;
use crate::error::{Error, Result};
use crate::options::RevealOptions;
use crate::reveal::RevealFrame;

/// Shown in place of an answer when the agent could not be reached.
pub const CONNECTION_APOLOGY: &str =
    "Sorry, there was an error connecting to the AI agent. Please try reloading...";

static TRAILING_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[\d+\]\s*$").expect("valid citation regex"));

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Author {
    User,
    Agent,
}

/// One entry of the log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    content: String,
    author: Author,
    position: usize,
}

impl Message {
    /// Raw markdown as received or typed.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn author(&self) -> Author {
        self.author
    }

    /// Zero-based display order.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_user(&self) -> bool {
        self.author == Author::User
    }
}

/// Ordered messages plus one reveal per agent message.
pub struct ConversationLog {
    messages: Vec<Message>,
    reveals: HashMap<usize, RevealController>,
    reveal_options: RevealOptions,
}

impl ConversationLog {
    pub fn new(reveal_options: RevealOptions) -> Self {
        Self {
            messages: Vec::new(),
            reveals: HashMap::new(),
            reveal_options,
        }
    }

    /// A log that opens with an agent greeting.
    pub fn with_greeting(greeting: impl Into<String>, reveal_options: RevealOptions) -> Result<Self> {
        let mut log = Self::new(reveal_options);
        log.push_agent(greeting)?;
        Ok(log)
    }

    /// Appends a message and returns its position. Agent messages start
    /// revealing immediately, which needs a Tokio runtime.
    pub fn append(&mut self, author: Author, content: impl Into<String>) -> Result<usize> {
        let content = content.into();
        let position = self.messages.len();

        if author == Author::Agent {
            let controller = RevealController::start(content.clone(), self.reveal_options)?;
            self.reveals.insert(position, controller);
        }

        debug!(position, ?author, bytes = content.len(), "message appended");
        self.messages.push(Message {
            content,
            author,
            position,
        });
        Ok(position)
    }

    /// Appends user input, rejecting blank text.
    pub fn push_user(&mut self, text: impl Into<String>) -> Result<usize> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        self.append(Author::User, text)
    }

    pub fn push_agent(&mut self, markdown: impl Into<String>) -> Result<usize> {
        self.append(Author::Agent, markdown)
    }

    /// Appends the fixed apology shown when the agent request failed.
    pub fn push_failure(&mut self) -> Result<usize> {
        self.append(Author::Agent, CONNECTION_APOLOGY)
    }

    /// Messages in display order. Each call starts a new pass.
    pub fn all_messages(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The reveal bound to the agent message at `position`.
    pub fn reveal(&self, position: usize) -> Option<&RevealController> {
        self.reveals.get(&position)
    }

    pub fn subscribe(&self, position: usize) -> Option<watch::Receiver<RevealFrame>> {
        self.reveal(position).map(RevealController::subscribe)
    }
}

/// Drops a trailing citation marker such as `" [3]"` from a suggested question.
pub fn clean_question(question: &str) -> String {
    TRAILING_CITATION.replace(question, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RenderOptions;
    use crate::reveal::RevealPhase;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::time;

    fn options() -> RevealOptions {
        RevealOptions::new(10, RenderOptions::chat()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn only_agent_messages_get_a_reveal() {
        let mut log = ConversationLog::new(options());
        let question = log.push_user("Where should I eat in Lisbon?").unwrap();
        let answer = log.push_agent("## Lisbon\n* **Time Out Market**").unwrap();

        assert_eq!((question, answer), (0, 1));
        assert!(log.reveal(question).is_none());
        assert!(log.reveal(answer).is_some());

        let order: Vec<_> = log.all_messages().map(Message::author).collect();
        assert_eq!(order, vec![Author::User, Author::Agent]);
        // restartable
        assert_eq!(log.all_messages().count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reveals_run_independently() {
        let mut log = ConversationLog::with_greeting("Hi!\nAsk me anything.", options()).unwrap();
        time::sleep(Duration::from_millis(15)).await;

        let second = log.push_agent("a\nb\nc").unwrap();
        let first = log.subscribe(0).unwrap();
        let second = log.subscribe(second).unwrap();
        assert_eq!(first.borrow().lines_revealed, 1);
        assert_eq!(second.borrow().lines_revealed, 0);

        time::sleep(Duration::from_millis(40)).await;
        assert_eq!(first.borrow().phase, RevealPhase::Complete);
        assert_eq!(second.borrow().phase, RevealPhase::Complete);
        assert_eq!(second.borrow().html, "a\nb\nc");
    }

    #[tokio::test(start_paused = true)]
    async fn failure_renders_like_any_answer() {
        let mut log = ConversationLog::new(options());
        let position = log.push_failure().unwrap();
        time::sleep(Duration::from_millis(15)).await;

        let frame = log.reveal(position).unwrap().frame();
        assert_eq!(frame.html, CONNECTION_APOLOGY);
        assert_eq!(frame.phase, RevealPhase::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_log_cancels_reveals() {
        let mut log = ConversationLog::new(options());
        let position = log.push_agent("a\nb\nc").unwrap();
        let frames = log.subscribe(position).unwrap();
        time::sleep(Duration::from_millis(15)).await;

        drop(log);
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(frames.borrow().lines_revealed, 1);
        assert_eq!(frames.borrow().phase, RevealPhase::Cancelled);
    }

    #[test]
    fn blank_user_input_is_rejected() {
        let mut log = ConversationLog::new(options());
        assert!(matches!(log.push_user("   "), Err(Error::EmptyMessage)));
        assert!(log.is_empty());
        assert_eq!(log.push_user("Tokyo in May?").unwrap(), 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn clean_question_drops_trailing_citation() {
        assert_eq!(clean_question("Best ramen in Osaka? [2]"), "Best ramen in Osaka?");
        assert_eq!(clean_question("Is [1] a citation?"), "Is [1] a citation?");
    }
}
