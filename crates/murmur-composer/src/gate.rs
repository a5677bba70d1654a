//! Typing indicator and submit throttle.
//!
//! Both gates read the serialized content stream, where `""` means the
//! composer is empty.

use std::time::Duration;

use crate::scheduler::{Scheduler, TimerId};

/// Timers owned by the gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTimer {
    TypingIdle,
    SubmitWindow,
}

/// Emits typing started/stopped, each state change once.
///
/// Non-empty content starts typing and restarts the idle race; the race
/// ends at the idle timeout or at the first empty content.
#[derive(Debug, Default)]
pub struct TypingGate {
    typing: bool,
    idle: Option<TimerId>,
}

impl TypingGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Returns the new typing state when it changed.
    pub fn on_content<T: From<GateTimer>>(
        &mut self,
        content: &str,
        scheduler: &mut Scheduler<T>,
        idle_after: Duration,
    ) -> Option<bool> {
        if let Some(id) = self.idle.take() {
            scheduler.cancel(id);
        }
        if content.is_empty() {
            return self.set(false);
        }
        self.idle = Some(scheduler.schedule(idle_after, GateTimer::TypingIdle.into()));
        self.set(true)
    }

    pub fn on_idle(&mut self) -> Option<bool> {
        self.idle = None;
        self.set(false)
    }

    fn set(&mut self, typing: bool) -> Option<bool> {
        if self.typing == typing {
            return None;
        }
        self.typing = typing;
        Some(typing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Ready,
    /// A submit went out; waiting out the settle window.
    Window(TimerId),
    /// Waiting for the composer to be cleared.
    AwaitEmpty,
}

/// Lets one submit through, then holds further submits until the window
/// has passed and the content has been cleared.
///
/// Assumes the host clears the composer in response to a submit. Content
/// that becomes empty while the window is still running counts as that
/// clear, so the gate is ready as soon as the window ends without waiting
/// for another empty emission. Emptying for any other reason inside the
/// window is treated the same way.
#[derive(Debug)]
pub struct SubmitGate {
    state: SubmitState,
    content_empty: bool,
}

impl Default for SubmitGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitGate {
    pub fn new() -> Self {
        Self {
            state: SubmitState::Ready,
            content_empty: true,
        }
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    /// A candidate submit. Returns true when the submit goes through.
    pub fn request<T: From<GateTimer>>(
        &mut self,
        scheduler: &mut Scheduler<T>,
        window: Duration,
    ) -> bool {
        if self.state != SubmitState::Ready {
            tracing::debug!(state = ?self.state, "submit throttled");
            return false;
        }
        let timer = scheduler.schedule(window, GateTimer::SubmitWindow.into());
        self.state = SubmitState::Window(timer);
        true
    }

    pub fn on_window_elapsed(&mut self) {
        // A composer already cleared during the window counts as cleared.
        self.state = if self.content_empty {
            SubmitState::Ready
        } else {
            SubmitState::AwaitEmpty
        };
    }

    pub fn on_content(&mut self, content: &str) {
        self.content_empty = content.is_empty();
        if self.content_empty && self.state == SubmitState::AwaitEmpty {
            self.state = SubmitState::Ready;
        }
    }
}
