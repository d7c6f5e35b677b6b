use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;

use crate::model::date;

/// Source of monotonic time for timers and wall-clock time for "today".
pub trait Clock {
    fn now(&self) -> Instant;
    fn today(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn today(&self) -> NaiveDateTime {
        date::local_now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    instant: Rc<Cell<Instant>>,
    wall: Rc<Cell<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(today: NaiveDateTime) -> Self {
        Self {
            instant: Rc::new(Cell::new(Instant::now())),
            wall: Rc::new(Cell::new(today)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.instant.set(self.instant.get() + by);
        if let Ok(delta) = chrono::Duration::from_std(by) {
            self.wall.set(self.wall.get() + delta);
        }
    }

    pub fn set_today(&self, today: NaiveDateTime) {
        self.wall.set(today);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.instant.get()
    }

    fn today(&self) -> NaiveDateTime {
        self.wall.get()
    }
}

/// Fire-once deadline. Re-arming replaces the previous deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once, on the first poll at or after the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left before the deadline, for hosts that schedule repaints.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date::parse;

    #[test]
    fn timer_fires_once() {
        let clock = ManualClock::new(parse("2024-03-01").unwrap());
        let mut timer = Timer::default();
        timer.arm(clock.now(), Duration::from_millis(250));
        assert!(!timer.poll(clock.now()));
        clock.advance(Duration::from_millis(250));
        assert!(timer.poll(clock.now()));
        assert!(!timer.poll(clock.now()));
        assert!(!timer.is_armed());
    }

    #[test]
    fn cancel_and_rearm() {
        let clock = ManualClock::new(parse("2024-03-01").unwrap());
        let mut timer = Timer::default();
        timer.arm(clock.now(), Duration::from_millis(100));
        timer.cancel();
        clock.advance(Duration::from_millis(200));
        assert!(!timer.poll(clock.now()));

        timer.arm(clock.now(), Duration::from_millis(100));
        clock.advance(Duration::from_millis(50));
        timer.arm(clock.now(), Duration::from_millis(100));
        clock.advance(Duration::from_millis(60));
        assert!(!timer.poll(clock.now()));
        assert_eq!(timer.remaining(clock.now()), Some(Duration::from_millis(40)));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(parse("2024-03-01").unwrap());
        let other = clock.clone();
        clock.advance(Duration::from_secs(3600));
        assert_eq!(other.today(), parse("2024-03-01 01:00").unwrap());
    }
}
