//! Single-flight gate for token refreshes.
//!
//! The gate is either `Idle` or `Refreshing`. The first caller to enter an
//! idle gate becomes the leader and performs the refresh; everyone entering
//! while it runs is queued as a follower and told the outcome when the leader
//! finishes. The state lives behind a plain mutex that is never held across
//! an await, so "check the flag, then set it or enqueue" cannot interleave
//! with another caller.
//!
//! ```text
//! Idle ──enter──▶ Refreshing ──finish(outcome)──▶ Idle
//!                   │   ▲
//!                   └───┘ enter (queued as follower)
//! ```
//!
//! A leader dropped before calling [`LeaderGuard::finish`] (its future was
//! cancelled) resets the gate and closes every follower's channel; followers
//! see [`Waiter::wait`] return `None` and may enter again.

use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, trace};

/// How a refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New tokens are installed; replay against them.
    Refreshed,
    /// The refresh failed and tokens were cleared.
    Failed,
}

#[derive(Debug, Default)]
enum GateState {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

/// Coordinates at most one in-flight refresh.
#[derive(Debug, Default)]
pub struct RefreshGate {
    state: Mutex<GateState>,
}

/// What a caller entering the gate must do.
#[derive(Debug)]
pub enum Ticket<'a> {
    /// The gate was idle but the caller's credentials are already stale;
    /// replay without refreshing.
    Replay,
    /// The caller owns the refresh.
    Leader(LeaderGuard<'a>),
    /// A refresh is in flight; wait for its outcome.
    Follower(Waiter),
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the gate.
    ///
    /// `already_refreshed` is evaluated under the gate lock, only when the
    /// gate is idle. Returning `true` means a refresh has completed since the
    /// caller's request was sent, and yields [`Ticket::Replay`].
    pub fn enter(&self, already_refreshed: impl FnOnce() -> bool) -> Ticket<'_> {
        let mut state = self.lock();
        if let GateState::Refreshing { waiters } = &mut *state {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            debug!(queued = waiters.len(), "refresh in flight, queued caller");
            return Ticket::Follower(Waiter { rx });
        }

        if already_refreshed() {
            trace!("gate idle, credentials already replaced");
            return Ticket::Replay;
        }

        *state = GateState::Refreshing {
            waiters: Vec::new(),
        };
        trace!("gate idle, caller leads refresh");
        Ticket::Leader(LeaderGuard {
            gate: self,
            finished: false,
        })
    }

    /// Returns true while a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock(), GateState::Refreshing { .. })
    }

    /// Number of callers queued behind the current refresh.
    pub fn waiting(&self) -> usize {
        match &*self.lock() {
            GateState::Idle => 0,
            GateState::Refreshing { waiters } => waiters.len(),
        }
    }

    /// Reset to idle and hand `outcome` to every queued caller, in FIFO order.
    /// With `None` the channels are closed instead.
    fn release(&self, outcome: Option<RefreshOutcome>) -> usize {
        let waiters = match mem::take(&mut *self.lock()) {
            GateState::Idle => Vec::new(),
            GateState::Refreshing { waiters } => waiters,
        };

        let count = waiters.len();
        if let Some(outcome) = outcome {
            for waiter in waiters {
                // A follower whose future was dropped no longer listens.
                let _ = waiter.send(outcome);
            }
        }
        count
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of leadership over the current refresh.
#[derive(Debug)]
pub struct LeaderGuard<'a> {
    gate: &'a RefreshGate,
    finished: bool,
}

impl LeaderGuard<'_> {
    /// Number of callers queued behind this refresh so far.
    pub fn waiting(&self) -> usize {
        self.gate.waiting()
    }

    /// Drain the queue with `outcome` and return the gate to idle.
    ///
    /// Returns how many followers were released.
    pub fn finish(mut self, outcome: RefreshOutcome) -> usize {
        self.finished = true;
        let released = self.gate.release(Some(outcome));
        debug!(released, ?outcome, "refresh finished");
        released
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let abandoned = self.gate.release(None);
            debug!(abandoned, "refresh leader dropped before finishing");
        }
    }
}

/// A follower's handle on the in-flight refresh.
#[derive(Debug)]
pub struct Waiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl Waiter {
    /// Wait for the leader. `None` means the leader went away without an
    /// outcome.
    pub async fn wait(self) -> Option<RefreshOutcome> {
        self.rx.await.ok()
    }
}
