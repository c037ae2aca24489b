//! Tick based time keeping shared by the interrupt handlers and the main loop.

/// Rate of the free running tick counter (25 µs per tick).
pub const TICK_HZ: u32 = 40_000;

pub type Instant = fugit::Instant<u32, 1, TICK_HZ>;
pub type Duration = fugit::Duration<u32, 1, TICK_HZ>;

/// A free running, wrapping tick counter.
pub trait Monotonic {
    fn now(&self) -> Instant;
}

/// Ticks from `earlier` to `later`, correct across one counter wrap.
#[inline]
pub fn elapsed(earlier: Instant, later: Instant) -> Duration {
    Duration::from_ticks(later.ticks().wrapping_sub(earlier.ticks()))
}

/// Bounds a busy wait.
pub struct Deadline<'a, C> {
    clock: &'a C,
    start: Instant,
    timeout: Duration,
}

impl<'a, C: Monotonic> Deadline<'a, C> {
    pub fn start(clock: &'a C, timeout: Duration) -> Self {
        Self {
            clock,
            start: clock.now(),
            timeout,
        }
    }

    pub fn expired(&self) -> bool {
        elapsed(self.start, self.clock.now()) > self.timeout
    }
}
