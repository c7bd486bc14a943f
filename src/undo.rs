// Time-boxed undo for deleted todos

use crate::error::{TodoError, TodoResult};
use crate::models::Todo;
use crate::timer::{CountdownTimer, TimerEvent, TimerId};
use tracing::{debug, info};

/// Default length of the undo window, in seconds
pub const DEFAULT_UNDO_SECONDS: u32 = 5;

const TICK_MS: i64 = 1_000;

/// A removed todo waiting to become permanent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    pub todo: Todo,
    pub seconds_remaining: u32,
    /// Epoch milliseconds at which the deletion was armed
    pub armed_at: i64,
}

/// What the undo banner shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoView {
    pub title: String,
    pub seconds_remaining: u32,
}

/// Single-slot holder for the most recent deletion
///
/// Arming while a deletion is already pending replaces it: the earlier todo
/// is neither restored nor reported as finalized, it is simply dropped.
#[derive(Debug)]
pub struct DeleteUndoController {
    window_secs: u32,
    pending: Option<PendingDeletion>,
    timer: Option<CountdownTimer>,
}

impl Default for DeleteUndoController {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_SECONDS)
    }
}

impl DeleteUndoController {
    pub fn new(window_secs: u32) -> Self {
        Self {
            window_secs,
            pending: None,
            timer: None,
        }
    }

    pub fn window_secs(&self) -> u32 {
        self.window_secs
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingDeletion> {
        self.pending.as_ref()
    }

    /// Start the undo window for a freshly removed todo
    pub fn arm(&mut self, todo: Todo, now: i64) {
        self.cancel_timer();

        if let Some(previous) = self.pending.take() {
            debug!(id = %previous.todo.id, "Discarding previous pending deletion");
        }

        debug!(id = %todo.id, window_secs = self.window_secs, "Armed pending deletion");
        self.pending = Some(PendingDeletion {
            todo,
            seconds_remaining: self.window_secs,
            armed_at: now,
        });
        self.timer = Some(CountdownTimer::start(now, TICK_MS, i64::from(self.window_secs) * TICK_MS));
    }

    /// Take back the pending todo so it can be reinserted
    pub fn undo(&mut self) -> TodoResult<Todo> {
        let pending = self.pending.take().ok_or(TodoError::InvalidState)?;
        self.cancel_timer();

        debug!(id = %pending.todo.id, "Undid pending deletion");
        Ok(pending.todo)
    }

    /// Count the banner down by one second, stopping at zero
    pub fn tick(&mut self) {
        if let Some(pending) = self.pending.as_mut() {
            pending.seconds_remaining = pending.seconds_remaining.saturating_sub(1);
        }
    }

    /// Deliver every timer event due at `now`
    ///
    /// Returns the todo whose deletion became permanent, if the window
    /// closed during this call.
    pub fn advance(&mut self, now: i64) -> Option<Todo> {
        let events = match self.timer.as_mut() {
            Some(timer) => timer.poll(now),
            None => return None,
        };

        let mut finalized = None;
        for event in events {
            match event {
                TimerEvent::Tick(id) if self.is_current(id) => self.tick(),
                TimerEvent::Expired(id) if self.is_current(id) => {
                    self.timer = None;
                    if let Some(pending) = self.pending.take() {
                        info!(id = %pending.todo.id, "Deletion is now permanent");
                        finalized = Some(pending.todo);
                    }
                }
                _ => {}
            }
        }

        finalized
    }

    /// Read-only projection for the undo banner
    pub fn current_view(&self) -> Option<UndoView> {
        self.pending.as_ref().map(|p| UndoView {
            title: p.todo.title.clone(),
            seconds_remaining: p.seconds_remaining,
        })
    }

    fn is_current(&self, id: TimerId) -> bool {
        self.timer.as_ref().is_some_and(|t| t.id() == id)
    }

    fn cancel_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
    }
}
