//! Timer and repetition counter for the set in progress.
//!
//! `ScoringState` is plain data with transition methods. It does no I/O and
//! never fails; the board actor owns the only instance and turns the values
//! returned here into notifications.

use serde::Serialize;
use std::time::Duration;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TimerState {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, Default)]
pub struct ScoringState {
    repetition_count: u32,
    last_committed_count: u32,
    timer_elapsed: Duration,
    timer: TimerState,
}

/// Consistent copy of the scoring state handed out of the actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoringSnapshot {
    pub repetition_count: u32,
    pub last_committed_count: u32,
    pub timer_elapsed: Duration,
    pub timer: TimerState,
}

impl ScoringState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repetition_count(&self) -> u32 {
        self.repetition_count
    }

    pub fn last_committed_count(&self) -> u32 {
        self.last_committed_count
    }

    pub fn timer_elapsed(&self) -> Duration {
        self.timer_elapsed
    }

    pub fn is_running(&self) -> bool {
        self.timer == TimerState::Running
    }

    pub fn set_absolute(&mut self, value: u32) -> u32 {
        self.repetition_count = value;
        self.repetition_count
    }

    pub fn increment_by(&mut self, delta: u32) -> u32 {
        self.repetition_count = self.repetition_count.saturating_add(delta);
        self.repetition_count
    }

    /// Returns `true` when the timer actually started.
    pub fn start_timer(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.timer = TimerState::Running;
        true
    }

    /// Stops the timer without touching the elapsed time.
    pub fn pause(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.timer = TimerState::Idle;
        true
    }

    /// Advance the timer by one period. Ignored unless running.
    pub fn tick(&mut self) -> Option<Duration> {
        if !self.is_running() {
            return None;
        }
        self.timer_elapsed += TICK_PERIOD;
        Some(self.timer_elapsed)
    }

    /// Abandon the set: zero count and timer, stop ticking.
    pub fn reset(&mut self) {
        self.repetition_count = 0;
        self.timer_elapsed = Duration::ZERO;
        self.timer = TimerState::Idle;
    }

    /// Finish the set and return the count to submit.
    pub fn commit(&mut self) -> u32 {
        self.last_committed_count = self.repetition_count;
        self.reset();
        self.last_committed_count
    }

    pub fn timer_text(&self) -> String {
        format_elapsed(self.timer_elapsed)
    }

    pub fn snapshot(&self) -> ScoringSnapshot {
        ScoringSnapshot {
            repetition_count: self.repetition_count,
            last_committed_count: self.last_committed_count,
            timer_elapsed: self.timer_elapsed,
            timer: self.timer,
        }
    }
}

/// `mm:ss`, minutes wrapping at the hour like a wall clock display.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", (secs / 60) % 60, secs % 60)
}
