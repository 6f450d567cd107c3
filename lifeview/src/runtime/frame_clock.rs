use std::time::{Duration, Instant};

/// Stand-in for the display's refresh signal.
///
/// Fires at most once per refresh interval. When the event loop falls
/// behind, missed refreshes are dropped rather than replayed, so a stalled
/// loop never produces a burst of frame callbacks.
#[derive(Debug)]
pub struct RefreshClock {
    hz: f32,
    last_tick: Instant,
    accumulator: Duration,
    refresh_count: u64,
}

impl RefreshClock {
    pub fn new(hz: f32) -> Self {
        Self::with_start(hz, Instant::now())
    }

    pub fn with_start(hz: f32, now: Instant) -> Self {
        Self {
            hz: hz.max(1.0),
            last_tick: now,
            accumulator: Duration::ZERO,
            refresh_count: 0,
        }
    }

    pub fn hz(&self) -> f32 {
        self.hz
    }

    pub fn set_hz(&mut self, hz: f32) {
        self.hz = hz.max(1.0);
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.hz)
    }

    pub fn next_deadline(&self) -> Instant {
        let remaining = self
            .interval()
            .checked_sub(self.accumulator)
            .unwrap_or_default();
        self.last_tick + remaining
    }

    /// Returns whether a refresh is due at `now`.
    pub fn tick(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.accumulator += elapsed;

        let interval = self.interval();
        if self.accumulator < interval {
            return false;
        }

        // Keep the phase, drop the backlog.
        self.accumulator = Duration::from_nanos(
            (self.accumulator.as_nanos() % interval.as_nanos().max(1)) as u64,
        );
        self.refresh_count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_fires_on_full_interval() {
        let start = Instant::now();
        let mut clock = RefreshClock::with_start(60.0, start);

        let half = start + clock.interval() / 2;
        assert!(!clock.tick(half));

        let full = start + clock.interval();
        assert!(clock.tick(full));
        assert_eq!(clock.refresh_count(), 1);
    }

    #[test]
    fn lagging_loop_fires_once_and_drops_backlog() {
        let start = Instant::now();
        let mut clock = RefreshClock::with_start(30.0, start);
        let now = start + clock.interval() * 3;

        assert!(clock.tick(now));
        assert_eq!(clock.refresh_count(), 1);
        assert!(!clock.tick(now));
    }

    #[test]
    fn refresh_rate_changes_apply_immediately() {
        let start = Instant::now();
        let mut clock = RefreshClock::with_start(60.0, start);

        let at_60hz = start + clock.interval();
        assert!(clock.tick(at_60hz));

        clock.set_hz(30.0);
        assert_eq!(clock.hz(), 30.0);

        let partial = at_60hz + clock.interval() / 3;
        assert!(!clock.tick(partial));

        let full = at_60hz + clock.interval();
        assert!(clock.tick(full));
        assert_eq!(clock.refresh_count(), 2);
    }

    #[test]
    fn hz_is_floored_at_one() {
        let clock = RefreshClock::with_start(0.0, Instant::now());
        assert_eq!(clock.hz(), 1.0);
    }
}
