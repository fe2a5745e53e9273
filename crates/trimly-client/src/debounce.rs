// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sender-side typing debounce.
//!
//! Compose screens call [`TypingDebouncer::on_input`] on every keystroke.
//! The first keystroke emits `typing`; further keystrokes only restart the
//! idle timer. After the idle window with no input the debouncer emits
//! `stop_typing`, as does an explicit [`TypingDebouncer::stop`] (send
//! button, screen teardown).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Receives `true` for `typing` and `false` for `stop_typing`.
///
/// Invoked outside the debouncer's lock, so the callback may call back
/// into the debouncer if it needs to.
pub type TypingSignal = Arc<dyn Fn(bool) + Send + Sync>;

struct DebounceState {
    active: bool,
    timer: Option<JoinHandle<()>>,
}

/// Collapses a stream of keystrokes into typing/stop-typing edges.
pub struct TypingDebouncer {
    idle: Duration,
    signal: TypingSignal,
    state: Arc<Mutex<DebounceState>>,
}

impl TypingDebouncer {
    pub fn new(idle: Duration, signal: TypingSignal) -> Self {
        Self {
            idle,
            signal,
            state: Arc::new(Mutex::new(DebounceState {
                active: false,
                timer: None,
            })),
        }
    }

    fn lock(state: &Mutex<DebounceState>) -> std::sync::MutexGuard<'_, DebounceState> {
        state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record one keystroke. Emits `typing` only on the idle-to-active
    /// edge; every call restarts the idle timer.
    pub fn on_input(&self) {
        let became_active = {
            let mut state = Self::lock(&self.state);
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            let edge = !state.active;
            state.active = true;
            state.timer = Some(self.spawn_idle_timer());
            edge
        };
        if became_active {
            (self.signal)(true);
        }
    }

    /// Emit `stop_typing` immediately if active; cancel the idle timer.
    pub fn stop(&self) {
        let was_active = {
            let mut state = Self::lock(&self.state);
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            let was = state.active;
            state.active = false;
            was
        };
        if was_active {
            (self.signal)(false);
        }
    }

    fn spawn_idle_timer(&self) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let signal = Arc::clone(&self.signal);
        let idle = self.idle;

        tokio::spawn(async move {
            tokio::time::sleep(idle).await;
            let fired = {
                let mut state = Self::lock(&state);
                if state.active {
                    state.active = false;
                    state.timer = None;
                    true
                } else {
                    false
                }
            };
            if fired {
                signal(false);
            }
        })
    }
}

impl Drop for TypingDebouncer {
    fn drop(&mut self) {
        let mut state = Self::lock(&self.state);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.active = false;
    }
}
