//! Debounce state machine for port notification bursts
//!
//! A single physical device usually raises two port events (input and
//! output) almost at once. Each event class gets its own [`Debouncer`]:
//! every trigger pushes the deadline back, and the reconcile pass only runs
//! once the deadline passes quietly.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending(Instant),
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    state: DebounceState,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceState::Idle,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Register an event, replacing any pending deadline
    pub fn trigger(&mut self, now: Instant) {
        self.state = DebounceState::Pending(now + self.window);
    }

    /// Deadline of the pending pass, if any
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Idle => None,
            DebounceState::Pending(deadline) => Some(deadline),
        }
    }

    /// Returns `true` exactly once when the deadline has passed
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Pending(deadline) if now >= deadline => {
                self.state = DebounceState::Idle;
                true
            }
            _ => false,
        }
    }
}

/// Sleep until `deadline`, or forever when there is none
pub(crate) async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
