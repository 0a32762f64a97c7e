//! Tokio-driven progressive reveal.
//!
//! Each content assignment starts a new generation: a fresh [`RevealState`],
//! a fresh [`CancellationToken`] and one ticking task. The state, the
//! generation counter and the frame sender live behind one lock, and a tick
//! only mutates the state after checking its generation under that lock, so a
//! task from a replaced or cancelled generation can never touch newer state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::options::{RenderOptions, RevealOptions};
use crate::reveal::{RevealFrame, RevealPhase, RevealState};

struct Shared {
    generation: u64,
    state: RevealState,
    frames: watch::Sender<RevealFrame>,
}

/// Paces one message's reveal on the Tokio runtime.
///
/// Hosts observe progress through [`RevealController::subscribe`]. Dropping
/// the controller cancels its timer.
pub struct RevealController {
    shared: Arc<Mutex<Shared>>,
    options: RevealOptions,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RevealController {
    /// An idle controller with no content.
    pub fn new(options: RevealOptions) -> Self {
        let (frames, _) = watch::channel(RevealFrame::idle());
        Self {
            shared: Arc::new(Mutex::new(Shared {
                generation: 0,
                state: RevealState::idle(),
                frames,
            })),
            options,
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Creates a controller and immediately starts revealing `content`.
    pub fn start(content: impl Into<String>, options: RevealOptions) -> Result<Self> {
        let mut controller = Self::new(options);
        controller.set_content(content)?;
        Ok(controller)
    }

    pub fn options(&self) -> &RevealOptions {
        &self.options
    }

    /// Assigns new content and restarts the reveal from line zero.
    ///
    /// Reassigning the content already streaming or complete is a no-op; a
    /// cancelled reveal restarts. The previous timer is stopped before the new
    /// one is spawned.
    pub fn set_content(&mut self, content: impl Into<String>) -> Result<()> {
        let content = content.into();
        let cell = Arc::clone(&self.shared);
        let mut shared = lock(&cell);
        let settled = matches!(
            shared.state.phase(),
            RevealPhase::Streaming | RevealPhase::Complete
        );
        if settled && shared.state.source() == content {
            return Ok(());
        }
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;

        self.stop_timer();
        shared.generation += 1;
        shared.state = RevealState::new(content);
        let generation = shared.generation;
        let frame = shared.state.frame(&self.options.render);
        let streaming = shared.state.is_running();
        debug!(
            generation,
            total_lines = frame.total_lines,
            interval_ms = self.options.interval_ms.get(),
            "reveal started"
        );
        shared.frames.send_replace(frame);
        drop(shared);

        if !streaming {
            return Ok(());
        }

        let token = CancellationToken::new();
        self.cancel = token.clone();
        self.task = Some(handle.spawn(run_ticks(
            Arc::clone(&self.shared),
            token,
            generation,
            self.options.interval(),
            self.options.render,
        )));
        Ok(())
    }

    /// Stops the reveal in place. No tick from the stopped timer can run after
    /// this returns.
    pub fn cancel(&mut self) {
        let cell = Arc::clone(&self.shared);
        let mut shared = lock(&cell);
        self.stop_timer();
        if !shared.state.is_running() {
            return;
        }
        shared.generation += 1;
        shared.state.halt();
        let frame = shared.state.frame(&self.options.render);
        debug!(
            lines_revealed = frame.lines_revealed,
            total_lines = frame.total_lines,
            "reveal cancelled"
        );
        shared.frames.send_replace(frame);
    }

    /// Receiver for every frame this controller publishes, across restarts.
    pub fn subscribe(&self) -> watch::Receiver<RevealFrame> {
        lock(&self.shared).frames.subscribe()
    }

    /// The most recently published frame.
    pub fn frame(&self) -> RevealFrame {
        lock(&self.shared).frames.borrow().clone()
    }

    pub fn phase(&self) -> RevealPhase {
        lock(&self.shared).state.phase()
    }

    /// Whether a timer task is still alive.
    pub fn is_ticking(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn stop_timer(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for RevealController {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_ticks(
    shared: Arc<Mutex<Shared>>,
    cancel: CancellationToken,
    generation: u64,
    period: Duration,
    render: RenderOptions,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let mut guard = lock(&shared);
        if guard.generation != generation || cancel.is_cancelled() {
            return;
        }
        if !guard.state.advance() {
            return;
        }

        let frame = guard.state.frame(&render);
        trace!(
            generation,
            lines_revealed = frame.lines_revealed,
            total_lines = frame.total_lines,
            "reveal tick"
        );
        let complete = frame.phase == RevealPhase::Complete;
        guard.frames.send_replace(frame);
        if complete {
            debug!(generation, "reveal complete");
            return;
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options(interval_ms: u64) -> RevealOptions {
        RevealOptions::new(interval_ms, RenderOptions::chat()).expect("positive interval")
    }

    async fn advance_to(ms: u64, started: Instant) {
        time::sleep_until(started + Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn hello_world_scenario() {
        let started = Instant::now();
        let controller = RevealController::start("Hello\nWorld", options(20)).unwrap();
        let frames = controller.subscribe();
        assert_eq!(frames.borrow().lines_revealed, 0);
        assert_eq!(frames.borrow().phase, RevealPhase::Streaming);

        advance_to(10, started).await;
        assert_eq!(frames.borrow().html, "");

        advance_to(25, started).await;
        assert_eq!(frames.borrow().html, "Hello");
        assert_eq!(frames.borrow().phase, RevealPhase::Streaming);

        advance_to(45, started).await;
        let frame = frames.borrow().clone();
        assert_eq!(frame.html, "Hello\nWorld");
        assert_eq!(frame.lines_revealed, 2);
        assert_eq!(frame.total_lines, 2);
        assert_eq!(frame.phase, RevealPhase::Complete);

        tokio::task::yield_now().await;
        assert!(!controller.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_content_never_starts_a_timer() {
        let controller = RevealController::start("", options(20)).unwrap();
        assert!(!controller.is_ticking());

        let frame = controller.frame();
        assert_eq!(frame.phase, RevealPhase::Complete);
        assert_eq!(frame.total_lines, 0);
        assert_eq!(frame.html, "");
    }

    #[tokio::test(start_paused = true)]
    async fn restart_leaves_no_residual_tick() {
        let started = Instant::now();
        let mut controller = RevealController::start("a\nb\nc", options(20)).unwrap();
        let frames = controller.subscribe();

        advance_to(25, started).await;
        assert_eq!(frames.borrow().lines_revealed, 1);

        controller.set_content("x\ny").unwrap();
        assert_eq!(frames.borrow().lines_revealed, 0);

        // The replaced timer would have fired at 40 ms.
        advance_to(42, started).await;
        assert_eq!(frames.borrow().lines_revealed, 0);
        assert_eq!(frames.borrow().total_lines, 2);

        advance_to(47, started).await;
        assert_eq!(frames.borrow().html, "x");

        advance_to(67, started).await;
        assert_eq!(frames.borrow().html, "x\ny");
        assert_eq!(controller.phase(), RevealPhase::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_freezes_the_reveal() {
        let started = Instant::now();
        let mut controller = RevealController::start("a\nb\nc", options(20)).unwrap();
        let frames = controller.subscribe();

        advance_to(25, started).await;
        controller.cancel();
        assert!(!controller.is_ticking());
        assert_eq!(frames.borrow().phase, RevealPhase::Cancelled);

        advance_to(200, started).await;
        assert_eq!(frames.borrow().lines_revealed, 1);
        assert_eq!(frames.borrow().html, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn same_content_does_not_restart() {
        let started = Instant::now();
        let mut controller = RevealController::start("a\nb", options(20)).unwrap();

        advance_to(25, started).await;
        controller.set_content("a\nb").unwrap();
        assert_eq!(controller.frame().lines_revealed, 1);

        advance_to(45, started).await;
        assert_eq!(controller.phase(), RevealPhase::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn same_content_after_cancel_restarts() {
        let started = Instant::now();
        let mut controller = RevealController::start("a\nb\nc", options(20)).unwrap();

        advance_to(25, started).await;
        controller.cancel();
        controller.set_content("a\nb\nc").unwrap();
        assert_eq!(controller.frame().lines_revealed, 0);
        assert_eq!(controller.phase(), RevealPhase::Streaming);
        assert!(controller.is_ticking());

        advance_to(200, started).await;
        let frame = controller.frame();
        assert_eq!(frame.phase, RevealPhase::Complete);
        assert_eq!(frame.html, "a\nb\nc");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_then_new_content_ignores_the_old_timer() {
        let started = Instant::now();
        let mut controller = RevealController::start("a\nb\nc", options(20)).unwrap();
        let frames = controller.subscribe();

        advance_to(25, started).await;
        controller.cancel();
        advance_to(30, started).await;
        controller.set_content("x\ny").unwrap();
        assert_eq!(frames.borrow().lines_revealed, 0);

        // The cancelled timer would have fired at 40 ms, the new one fires at 50.
        advance_to(45, started).await;
        assert_eq!(frames.borrow().lines_revealed, 0);
        assert_eq!(frames.borrow().total_lines, 2);
        assert_eq!(frames.borrow().phase, RevealPhase::Streaming);

        advance_to(75, started).await;
        assert_eq!(frames.borrow().html, "x\ny");
        assert_eq!(controller.phase(), RevealPhase::Complete);
    }

    #[test]
    fn unchanged_content_needs_no_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let mut controller = {
            let _guard = runtime.enter();
            RevealController::start("a\nb", RevealOptions::chat()).unwrap()
        };
        assert!(controller.set_content("a\nb").is_ok());
        assert!(matches!(controller.set_content("other"), Err(Error::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_controller_stops_its_timer() {
        let started = Instant::now();
        let controller = RevealController::start("a\nb\nc", options(20)).unwrap();
        let frames = controller.subscribe();

        advance_to(25, started).await;
        drop(controller);
        advance_to(200, started).await;

        assert_eq!(frames.borrow().lines_revealed, 1);
        assert_eq!(frames.borrow().phase, RevealPhase::Cancelled);
    }

    #[test]
    fn starting_outside_a_runtime_is_an_error() {
        assert!(matches!(
            RevealController::start("a", RevealOptions::chat()),
            Err(Error::NoRuntime)
        ));
    }
}
