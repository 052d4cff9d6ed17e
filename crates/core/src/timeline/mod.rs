//! Virtual time. Nothing in the crate sleeps: owners call `advance` with the
//! elapsed wall time and every deferred action is expressed as a timer in a
//! [`TimerQueue`]. Dropping or clearing a queue cancels everything it holds.

use std::time::Duration;

use crate::{ArcadeError, Result};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackClock {
    elapsed: Duration,
}

impl PlaybackClock {
    pub fn start() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.elapsed
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    pub fn advance(&mut self, delta: Duration) {
        self.elapsed += delta;
    }

    /// Moves the clock forward to `at`. Earlier instants are ignored.
    pub fn advance_to(&mut self, at: Duration) {
        self.elapsed = self.elapsed.max(at);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer that came due during [`TimerQueue::pop_due`].
#[derive(Debug, Clone, PartialEq)]
pub struct FiredTimer<E> {
    pub id: TimerId,
    pub due: Duration,
    pub event: E,
}

#[derive(Debug, Clone)]
struct Timer<E> {
    id: TimerId,
    due: Duration,
    period: Option<Duration>,
    event: E,
}

/// One-shot and repeating timers ordered by due time, ties broken by the
/// order they were scheduled in.
#[derive(Debug, Clone)]
pub struct TimerQueue<E> {
    timers: Vec<Timer<E>>,
    next_id: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E: Clone> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(&mut self, now: Duration, delay: Duration, event: E) -> TimerId {
        self.insert(now + delay, None, event)
    }

    /// Schedules `event` every `period`, first firing one period from `now`.
    pub fn schedule_repeating(
        &mut self,
        now: Duration,
        period: Duration,
        event: E,
    ) -> Result<TimerId> {
        if period.is_zero() {
            return Err(ArcadeError::InvalidInput(
                "repeating timers need a non-zero period",
            ));
        }
        Ok(self.insert(now + period, Some(period), event))
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        before != self.timers.len()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.earliest().map(|index| self.timers[index].due)
    }

    /// Removes and returns the earliest timer due at or before `until`.
    /// Repeating timers stay queued, re-armed one period later.
    pub fn pop_due(&mut self, until: Duration) -> Option<FiredTimer<E>> {
        let index = self.earliest()?;
        if self.timers[index].due > until {
            return None;
        }

        match self.timers[index].period {
            Some(period) => {
                let timer = &mut self.timers[index];
                let fired = FiredTimer {
                    id: timer.id,
                    due: timer.due,
                    event: timer.event.clone(),
                };
                timer.due += period;
                Some(fired)
            }
            None => {
                let timer = self.timers.remove(index);
                Some(FiredTimer {
                    id: timer.id,
                    due: timer.due,
                    event: timer.event,
                })
            }
        }
    }

    fn insert(&mut self, due: Duration, period: Option<Duration>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            due,
            period,
            event,
        });
        id
    }

    fn earliest(&self) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .min_by_key(|(_, timer)| (timer.due, timer.id))
            .map(|(index, _)| index)
    }
}
