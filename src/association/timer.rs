use std::time::{Duration, Instant};

const TIMER_COUNT: usize = 3;
const NO_MAX_RETRANS: usize = usize::MAX;

#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub(crate) enum Timer {
    T1Init = 0,
    T1Cookie = 1,
    Ack = 2,
}

impl Timer {
    pub(crate) const VALUES: [Self; TIMER_COUNT] = [Timer::T1Init, Timer::T1Cookie, Timer::Ack];
}

/// A table of deadlines and retransmission counts, one slot per `Timer` kind.
///
/// Deadlines are absolute `Instant`s computed from the `now` passed in by the
/// embedder; the table never reads the clock itself.
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct TimerTable {
    data: [Option<Instant>; TIMER_COUNT],
    retrans: [usize; TIMER_COUNT],
    max_retrans: [usize; TIMER_COUNT],
}

impl TimerTable {
    pub fn new(max_init_retrans: usize) -> Self {
        TimerTable {
            max_retrans: [
                max_init_retrans, //T1Init
                max_init_retrans, //T1Cookie
                NO_MAX_RETRANS,   //Ack
            ],
            ..Default::default()
        }
    }

    pub fn set(&mut self, timer: Timer, time: Option<Instant>) {
        self.data[timer as usize] = time;
    }

    pub fn get(&self, timer: Timer) -> Option<Instant> {
        self.data[timer as usize]
    }

    pub fn next_timeout(&self) -> Option<Instant> {
        self.data.iter().filter_map(|&x| x).min()
    }

    /// Arms `timer` at a fixed `interval` from `now`. Handshake timers keep a
    /// constant interval across retries rather than backing off.
    pub fn start(&mut self, timer: Timer, now: Instant, interval: Duration) {
        self.data[timer as usize] = Some(now + interval);
    }

    pub fn stop(&mut self, timer: Timer) {
        self.data[timer as usize] = None;
        self.retrans[timer as usize] = 0;
    }

    /// Checks whether `timer` has a deadline at or before `after`. On expiry
    /// the retransmission count is bumped; `failure` reports whether the count
    /// now exceeds the timer's ceiling.
    pub fn is_expired(&mut self, timer: Timer, after: Instant) -> (bool, bool, usize) {
        let expired = self.data[timer as usize].map_or(false, |x| x <= after);
        let mut failure = false;
        if expired {
            self.retrans[timer as usize] += 1;
            if self.retrans[timer as usize] > self.max_retrans[timer as usize] {
                failure = true;
            }
        }

        (expired, failure, self.retrans[timer as usize])
    }
}
