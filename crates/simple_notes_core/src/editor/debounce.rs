//! Cancellable idle timer.
//!
//! The host loop owns real time; this type only records deadlines and answers
//! whether the current one has elapsed. Scheduling replaces the pending timer,
//! so only the last trigger of a burst ever fires.

/// Identity of one scheduled timer; later schedules get larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    token: TimerToken,
    deadline_ms: i64,
}

/// Debounce timer with a fixed idle delay.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay_ms: i64,
    pending: Option<PendingTimer>,
    next_token: u64,
}

impl Debouncer {
    pub fn new(delay_ms: i64) -> Self {
        Self {
            delay_ms,
            pending: None,
            next_token: 0,
        }
    }

    pub fn delay_ms(&self) -> i64 {
        self.delay_ms
    }

    /// Starts a timer expiring `delay_ms` after `now_ms`, cancelling any
    /// pending one.
    pub fn schedule(&mut self, now_ms: i64) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.pending = Some(PendingTimer {
            token,
            deadline_ms: now_ms.saturating_add(self.delay_ms),
        });
        token
    }

    /// Cancels the pending timer, returning its token.
    pub fn cancel(&mut self) -> Option<TimerToken> {
        self.pending.take().map(|timer| timer.token)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline_ms(&self) -> Option<i64> {
        self.pending.map(|timer| timer.deadline_ms)
    }

    /// Consumes the pending timer when its deadline has been reached.
    pub fn fire_if_due(&mut self, now_ms: i64) -> Option<TimerToken> {
        match self.pending {
            Some(timer) if now_ms >= timer.deadline_ms => {
                self.pending = None;
                Some(timer.token)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;

    #[test]
    fn fires_once_after_the_delay() {
        let mut timer = Debouncer::new(350);
        assert_eq!(timer.delay_ms(), 350);
        let token = timer.schedule(1_000);
        assert_eq!(timer.deadline_ms(), Some(1_350));
        assert_eq!(timer.fire_if_due(1_349), None);
        assert_eq!(timer.fire_if_due(1_350), Some(token));
        assert_eq!(timer.fire_if_due(2_000), None);
    }

    #[test]
    fn rescheduling_supersedes_the_previous_timer() {
        let mut timer = Debouncer::new(350);
        let first = timer.schedule(0);
        let second = timer.schedule(200);
        assert!(second > first);
        assert_eq!(timer.fire_if_due(350), None);
        assert_eq!(timer.fire_if_due(550), Some(second));
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut timer = Debouncer::new(10);
        let token = timer.schedule(0);
        assert_eq!(timer.cancel(), Some(token));
        assert!(!timer.is_pending());
        assert_eq!(timer.fire_if_due(100), None);
    }
}
