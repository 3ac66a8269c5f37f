//! Countdown timer and the wall-clock ticker that drives it.
//!
//! [`Countdown`] is pure bookkeeping: it only moves when [`Countdown::tick`]
//! is called. [`Ticker`] is the scheduling side, a tokio task posting one
//! [`SessionEvent::Tick`] per period into a session's event queue.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::session::SessionEvent;

/// Default tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

type ExpireCallback = Box<dyn FnMut() + Send>;

/// Result of a single [`Countdown::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Seconds left after this tick.
    pub remaining: u32,
    /// `true` only for the tick that brought the countdown to zero.
    pub expired_now: bool,
}

/// Single logical countdown clock.
pub struct Countdown {
    remaining: u32,
    running: bool,
    expired: bool,
    on_expire: Option<ExpireCallback>,
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            remaining: 0,
            running: false,
            expired: false,
            on_expire: None,
        }
    }

    /// Register the callback invoked when the countdown reaches zero.
    ///
    /// Replaces any previous callback. It fires at most once per `start`.
    pub fn on_expire<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.on_expire = Some(Box::new(callback));
    }

    /// (Re)start the countdown from `total_seconds`.
    ///
    /// Starting from zero expires immediately.
    pub fn start(&mut self, total_seconds: u32) {
        self.remaining = total_seconds;
        self.expired = false;
        self.running = true;
        if total_seconds == 0 {
            self.expire();
        }
    }

    /// Advance by one second.
    ///
    /// Ticks delivered while stopped or after expiry leave the countdown
    /// unchanged and never re-fire the callback.
    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick {
                remaining: self.remaining,
                expired_now: false,
            };
        }

        self.remaining = self.remaining.saturating_sub(1);
        let expired_now = self.remaining == 0;
        if expired_now {
            self.expire();
        }
        Tick {
            remaining: self.remaining,
            expired_now,
        }
    }

    /// Stop ticking. Idempotent.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    fn expire(&mut self) {
        self.running = false;
        if self.expired {
            return;
        }
        self.expired = true;
        if let Some(callback) = self.on_expire.as_mut() {
            callback();
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Countdown")
            .field("remaining", &self.remaining)
            .field("running", &self.running)
            .field("expired", &self.expired)
            .field("on_expire", &self.on_expire.is_some())
            .finish()
    }
}

/// Format seconds as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Repeating, cancellable tick source for one session epoch.
///
/// The task is aborted on [`Ticker::cancel`] or drop, so a discarded session
/// never receives another tick from it.
#[derive(Debug)]
pub struct Ticker {
    epoch: u64,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawn a task that sends `Tick { epoch }` every `period`, starting one
    /// period from now. Must be called within a tokio runtime.
    pub fn spawn(epoch: u64, period: Duration, events: UnboundedSender<SessionEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if events.send(SessionEvent::Tick { epoch }).is_err() {
                    break;
                }
            }
        });
        Self {
            epoch,
            handle: Some(handle),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Abort the tick task. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(epoch = self.epoch, "ticker cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
