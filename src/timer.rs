// Cancellable countdown timer driven by an explicit clock

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    fn next() -> Self {
        TimerId(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Something a timer reports when polled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One interval elapsed
    Tick(TimerId),
    /// The full duration elapsed; no further events follow
    Expired(TimerId),
}

/// A repeating interval and a one-shot expiry behind a single handle
///
/// Both share one lifetime: cancelling the handle silences the interval and
/// the expiry together. Times are epoch milliseconds supplied by the caller.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    id: TimerId,
    started_at: i64,
    interval_ms: i64,
    duration_ms: i64,
    ticks_fired: i64,
    done: bool,
}

impl CountdownTimer {
    /// Start a timer at `now`
    ///
    /// `interval_ms` is clamped to at least 1.
    pub fn start(now: i64, interval_ms: i64, duration_ms: i64) -> Self {
        Self {
            id: TimerId::next(),
            started_at: now,
            interval_ms: interval_ms.max(1),
            duration_ms: duration_ms.max(0),
            ticks_fired: 0,
            done: false,
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    /// Whether the timer can still produce events
    pub fn is_active(&self) -> bool {
        !self.done
    }

    /// Epoch millisecond at which the expiry fires
    pub fn expires_at(&self) -> i64 {
        self.started_at + self.duration_ms
    }

    /// Stop the timer; later polls yield nothing
    pub fn cancel(&mut self) {
        self.done = true;
    }

    /// Collect every event due at `now`, in deadline order
    ///
    /// Ticks whose deadline falls on or before the expiry are delivered
    /// ahead of the expiry itself.
    pub fn poll(&mut self, now: i64) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }

        let expires_at = self.expires_at();
        let horizon = now.min(expires_at);

        loop {
            let deadline = self.started_at + (self.ticks_fired + 1) * self.interval_ms;
            if deadline > horizon {
                break;
            }
            self.ticks_fired += 1;
            events.push(TimerEvent::Tick(self.id));
        }

        if now >= expires_at {
            self.done = true;
            events.push(TimerEvent::Expired(self.id));
        }

        events
    }
}
