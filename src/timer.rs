//! Per-question countdown
//!
//! The timer never sleeps on its own. Every tick is requested through the
//! caller's `schedule_message` function and delivered back through
//! [`Timer::receive_alarm`]. Each start bumps a generation counter carried
//! by the tick, so ticks belonging to a stopped or restarted countdown are
//! recognised as stale and dropped.

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::constants::timer::{DEFAULT_DURATION, TICK_INTERVAL};

/// Scheduled timer events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One second has passed for the countdown started as `generation`
    Tick {
        /// Generation of the countdown this tick belongs to
        generation: u64,
    },
}

/// What a delivered tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The tick belonged to a stopped or replaced countdown
    Stale,
    /// The countdown is paused; the next tick was scheduled anyway
    Paused,
    /// One second was taken off the countdown
    Counted,
    /// The countdown reached zero and stopped
    Expired,
}

/// A cancellable countdown with one second resolution
#[derive(Debug, Clone)]
pub struct Timer {
    duration: Duration,
    remaining: u64,
    paused: bool,
    running: bool,
    generation: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_DURATION))
    }
}

/// Formats seconds as zero padded `MM:SS`
pub fn format_seconds(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

impl Timer {
    /// Creates a stopped timer counting down from `duration`
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            remaining: 0,
            paused: false,
            running: false,
            generation: 0,
        }
    }

    fn tick_interval() -> Duration {
        Duration::from_secs(TICK_INTERVAL)
    }

    /// Starts a fresh countdown from the full duration
    ///
    /// Any countdown already in progress is abandoned; its pending tick
    /// becomes stale.
    ///
    /// # Arguments
    ///
    /// * `schedule_message` - Asked to deliver the first tick back through
    ///   [`Timer::receive_alarm`] after the given delay
    pub fn start<S: FnMut(AlarmMessage, Duration)>(&mut self, mut schedule_message: S) {
        self.generation += 1;
        self.remaining = self.duration.as_secs();
        self.paused = false;
        self.running = true;

        schedule_message(
            AlarmMessage::Tick {
                generation: self.generation,
            },
            Self::tick_interval(),
        );
    }

    /// Handles a previously scheduled tick
    pub fn receive_alarm<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        message: AlarmMessage,
        mut schedule_message: S,
    ) -> Tick {
        let AlarmMessage::Tick { generation } = message;

        if !self.running || generation != self.generation {
            return Tick::Stale;
        }

        let tick = if self.paused {
            Tick::Paused
        } else {
            self.remaining = self.remaining.saturating_sub(TICK_INTERVAL);
            if self.remaining == 0 {
                self.stop();
                return Tick::Expired;
            }
            Tick::Counted
        };

        schedule_message(message, Self::tick_interval());

        tick
    }

    /// Suspends counting, returns whether anything changed
    pub fn pause(&mut self) -> bool {
        let changed = self.running && !self.paused;
        if changed {
            self.paused = true;
        }
        changed
    }

    /// Resumes counting, returns whether anything changed
    pub fn resume(&mut self) -> bool {
        let changed = self.running && self.paused;
        if changed {
            self.paused = false;
        }
        changed
    }

    /// Resumes a paused countdown, pauses a running one, or starts a fresh
    /// one when stopped
    pub fn toggle<S: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: S) {
        if self.paused {
            self.resume();
        } else if self.running {
            self.pause();
        } else {
            self.start(schedule_message);
        }
    }

    /// Cancels the countdown, safe to call when already stopped
    pub fn stop(&mut self) {
        self.running = false;
        self.paused = false;
    }

    /// Stops the countdown and clears the remaining time
    pub fn reset(&mut self) {
        self.stop();
        self.remaining = 0;
    }

    /// Whether a countdown is in progress (paused or not)
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether counting is suspended
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Seconds left on the countdown
    pub fn time_remaining(&self) -> u64 {
        self.remaining
    }

    /// Remaining time as `MM:SS`
    pub fn formatted(&self) -> String {
        format_seconds(self.remaining)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn started() -> (Timer, Vec<AlarmMessage>) {
        let mut timer = Timer::default();
        let mut scheduled = Vec::new();
        timer.start(|message, duration| {
            assert_eq!(duration, Duration::from_secs(1));
            scheduled.push(message);
        });
        (timer, scheduled)
    }

    fn deliver(timer: &mut Timer, pending: &mut Vec<AlarmMessage>) -> Tick {
        let message = pending.remove(0);
        timer.receive_alarm(message, |next, _| pending.push(next))
    }

    #[test]
    fn test_start_schedules_first_tick() {
        let (timer, scheduled) = started();
        assert!(timer.is_running());
        assert_eq!(timer.time_remaining(), 60);
        assert_eq!(timer.formatted(), "01:00");
        assert_eq!(scheduled.len(), 1);
    }

    #[test]
    fn test_three_ticks() {
        let (mut timer, mut pending) = started();
        for _ in 0..3 {
            assert_eq!(deliver(&mut timer, &mut pending), Tick::Counted);
        }
        assert_eq!(timer.time_remaining(), 57);
        assert_eq!(timer.formatted(), "00:57");
    }

    #[test]
    fn test_pause_suspends_counting() {
        let (mut timer, mut pending) = started();
        for _ in 0..3 {
            deliver(&mut timer, &mut pending);
        }

        assert!(timer.pause());
        assert!(!timer.pause());
        assert_eq!(deliver(&mut timer, &mut pending), Tick::Paused);
        assert_eq!(deliver(&mut timer, &mut pending), Tick::Paused);
        assert_eq!(timer.time_remaining(), 57);
        assert_eq!(pending.len(), 1);

        assert!(timer.resume());
        assert_eq!(deliver(&mut timer, &mut pending), Tick::Counted);
        assert_eq!(timer.time_remaining(), 56);
    }

    #[test]
    fn test_expires_at_zero() {
        let mut timer = Timer::new(Duration::from_secs(2));
        let mut pending = Vec::new();
        timer.start(|message, _| pending.push(message));

        assert_eq!(deliver(&mut timer, &mut pending), Tick::Counted);
        assert_eq!(deliver(&mut timer, &mut pending), Tick::Expired);
        assert!(!timer.is_running());
        assert_eq!(timer.time_remaining(), 0);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut timer = Timer::default();
        let mut pending = Vec::new();

        timer.toggle(|message, _| pending.push(message));
        assert!(timer.is_running());
        assert_eq!(pending.len(), 1);

        timer.toggle(|message, _| pending.push(message));
        assert!(timer.is_paused());
        timer.toggle(|message, _| pending.push(message));
        assert!(!timer.is_paused());
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_stop_is_idempotent_and_cancels() {
        let (mut timer, mut pending) = started();
        timer.stop();
        timer.stop();
        assert!(!timer.is_running());
        assert_eq!(deliver(&mut timer, &mut pending), Tick::Stale);
        assert!(pending.is_empty());

        let mut idle = Timer::default();
        idle.stop();
        assert!(!idle.is_running());
    }

    #[test]
    fn test_restart_makes_old_ticks_stale() {
        let (mut timer, mut pending) = started();
        timer.start(|message, _| pending.push(message));

        assert_eq!(deliver(&mut timer, &mut pending), Tick::Stale);
        assert_eq!(deliver(&mut timer, &mut pending), Tick::Counted);
        assert_eq!(timer.time_remaining(), 59);
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_pause_requires_running() {
        let mut timer = Timer::default();
        assert!(!timer.pause());
        assert!(!timer.resume());
    }

    #[test]
    fn test_reset() {
        let (mut timer, _) = started();
        timer.pause();
        timer.reset();
        assert!(!timer.is_running());
        assert!(!timer.is_paused());
        assert_eq!(timer.formatted(), "00:00");
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0), "00:00");
        assert_eq!(format_seconds(9), "00:09");
        assert_eq!(format_seconds(125), "02:05");
    }
}
