//! Run supersession for image solves: CancellationToken + generation guard.
//! Starting a new run cancels the previous one, and a superseded run can
//! check its guard before publishing a result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

/// Generation counter shared by all runs of one solver.
pub struct RunGeneration {
    current_token: RwLock<CancellationToken>,
    generation: Arc<AtomicU64>,
}

impl Default for RunGeneration {
    fn default() -> Self {
        Self::new()
    }
}

impl RunGeneration {
    pub fn new() -> Self {
        Self {
            current_token: RwLock::new(CancellationToken::new()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cancel the running run (if any) and start a new generation.
    pub fn begin(&self) -> RunGuard {
        let mut token_guard = self.current_token.write();
        token_guard.cancel();
        let token = CancellationToken::new();
        *token_guard = token.clone();
        let gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        RunGuard {
            generation: Arc::clone(&self.generation),
            my_generation: gen,
            token,
        }
    }

    /// Cancel the current run without starting a new one.
    pub fn cancel_current(&self) {
        self.current_token.read().cancel();
    }

    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Held by one run. Stale once a newer run begins or it is cancelled.
#[derive(Clone)]
pub struct RunGuard {
    generation: Arc<AtomicU64>,
    my_generation: u64,
    token: CancellationToken,
}

impl RunGuard {
    #[inline]
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.my_generation
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    #[inline]
    pub fn should_continue(&self) -> bool {
        !self.is_cancelled() && self.is_current()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn generation(&self) -> u64 {
        self.my_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_run_supersedes_old() {
        let runs = RunGeneration::new();
        let first = runs.begin();
        assert!(first.should_continue());

        let second = runs.begin();
        assert!(first.is_cancelled());
        assert!(!first.is_current());
        assert!(!first.should_continue());
        assert!(second.should_continue());
        assert_eq!(second.generation(), 2);
        assert_eq!(runs.current(), 2);
    }

    #[test]
    fn cancel_current_keeps_generation() {
        let runs = RunGeneration::new();
        let guard = runs.begin();
        runs.cancel_current();
        assert!(guard.is_cancelled());
        assert!(guard.is_current());
        assert!(!guard.should_continue());
    }
}
