//! Bounded tick deltas with catch-up banking.
//!
//! [`TimeSource::advance`] turns a wall-clock reading into the delta a tick
//! may simulate. Deltas never exceed `max_delta_ms`. When the gap since the
//! previous reading passes the catch-up threshold, the excess is banked
//! (up to `max_catch_up_ms`) and drained later in fixed-size chunks by the
//! runner's catch-up loop. A clock that moves backwards yields a zero delta
//! and resynchronizes.

use tracing::{info, warn};

use crate::config::TimeSourceConfig;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis().max(0)).unwrap_or(0)
}

/// Delta clamping and catch-up bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSource {
    config: TimeSourceConfig,
    last_time: u64,
    pending_catch_up: u64,
    last_gap_ms: u64,
}

impl TimeSource {
    /// A time source whose reference time is `now`.
    pub const fn new(config: TimeSourceConfig, now: u64) -> Self {
        Self {
            config,
            last_time: now,
            pending_catch_up: 0,
            last_gap_ms: 0,
        }
    }

    /// The bounds in use.
    pub const fn config(&self) -> &TimeSourceConfig {
        &self.config
    }

    /// Reference time of the last reading.
    pub const fn last_time(&self) -> u64 {
        self.last_time
    }

    /// Bounded delta since the previous call.
    ///
    /// - backwards clock: zero, reference resynced
    /// - gap above the threshold (catch-up enabled): `max_delta_ms`, with
    ///   `gap - max_delta_ms` banked up to the cap
    /// - otherwise: `min(gap, max_delta_ms)`
    pub fn advance(&mut self, now: u64) -> u64 {
        let Some(raw) = now.checked_sub(self.last_time) else {
            warn!(
                now,
                last_time = self.last_time,
                "Clock moved backwards, treating as zero elapsed"
            );
            self.last_time = now;
            return 0;
        };
        self.last_time = now;

        let max_delta = self.config.max_delta_ms;
        if self.config.catch_up_enabled && raw > self.config.catch_up_threshold_ms {
            let room = self
                .config
                .max_catch_up_ms
                .saturating_sub(self.pending_catch_up);
            let banked = raw.saturating_sub(max_delta).min(room);
            self.pending_catch_up = self.pending_catch_up.saturating_add(banked);
            self.last_gap_ms = raw;
            info!(
                gap_ms = raw,
                banked_ms = banked,
                pending_ms = self.pending_catch_up,
                "Banked offline time for catch-up"
            );
            return max_delta;
        }
        raw.min(max_delta)
    }

    /// Banked time not yet drained.
    pub const fn pending_catch_up(&self) -> u64 {
        self.pending_catch_up
    }

    /// Raw length of the most recent gap that banked time.
    pub const fn last_gap_ms(&self) -> u64 {
        self.last_gap_ms
    }

    /// Remove up to `amount` from the bank. Returns what was removed.
    pub const fn consume_catch_up(&mut self, amount: u64) -> u64 {
        let taken = if amount < self.pending_catch_up {
            amount
        } else {
            self.pending_catch_up
        };
        self.pending_catch_up = self.pending_catch_up.saturating_sub(taken);
        taken
    }

    /// Take the next catch-up chunk, if anything is banked.
    pub fn next_chunk(&mut self) -> Option<u64> {
        let chunk = self.consume_catch_up(self.config.catch_up_chunk_ms.max(1));
        (chunk > 0).then_some(chunk)
    }

    /// Drop everything banked.
    pub const fn reset_catch_up(&mut self) {
        self.pending_catch_up = 0;
    }

    /// Whether catch-up work exists or `now` is far enough past the last
    /// reading to create some.
    pub const fn needs_catch_up(&self, now: u64) -> bool {
        self.pending_catch_up > 0
            || now.saturating_sub(self.last_time) > self.config.catch_up_threshold_ms
    }

    /// Move the reference time to `now` without producing a delta.
    pub const fn reset(&mut self, now: u64) {
        self.last_time = now;
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    const MINUTE: u64 = 60_000;

    fn source() -> TimeSource {
        TimeSource::new(TimeSourceConfig::default(), 1_000_000)
    }

    #[test]
    fn small_deltas_pass_through() {
        let mut ts = source();
        for d in [0, 1, 999, MINUTE] {
            let start = ts.last_time();
            assert_eq!(ts.advance(start + d), d);
            assert_eq!(ts.pending_catch_up(), 0);
        }
    }

    #[test]
    fn deltas_between_max_and_threshold_are_clamped_without_banking() {
        let mut ts = source();
        assert_eq!(ts.advance(1_000_000 + 4 * MINUTE), MINUTE);
        assert_eq!(ts.pending_catch_up(), 0);
    }

    #[test]
    fn long_gap_banks_the_excess() {
        let mut ts = source();
        let gap = 10 * MINUTE;
        assert_eq!(ts.advance(1_000_000 + gap), MINUTE);
        assert_eq!(ts.pending_catch_up(), gap - MINUTE);
        assert_eq!(ts.last_gap_ms(), gap);

        let second = 20 * MINUTE;
        let now = ts.last_time() + second;
        assert_eq!(ts.advance(now), MINUTE);
        assert_eq!(ts.pending_catch_up(), (gap - MINUTE) + (second - MINUTE));
    }

    #[test]
    fn bank_is_capped() {
        let mut ts = source();
        let day = 86_400_000;
        ts.advance(1_000_000 + 2 * day);
        assert_eq!(ts.pending_catch_up(), day);
        let now = ts.last_time() + 10 * MINUTE;
        ts.advance(now);
        assert_eq!(ts.pending_catch_up(), day);
    }

    #[test]
    fn disabled_catch_up_only_clamps() {
        let config = TimeSourceConfig {
            catch_up_enabled: false,
            ..TimeSourceConfig::default()
        };
        let mut ts = TimeSource::new(config, 0);
        assert_eq!(ts.advance(60 * MINUTE), MINUTE);
        assert_eq!(ts.pending_catch_up(), 0);
    }

    #[test]
    fn backwards_clock_is_zero_and_resyncs() {
        let mut ts = source();
        assert_eq!(ts.advance(500_000), 0);
        assert_eq!(ts.last_time(), 500_000);
        assert_eq!(ts.advance(501_000), 1_000);
    }

    #[test]
    fn chunks_drain_the_bank() {
        let mut ts = source();
        ts.advance(1_000_000 + 3 * MINUTE + 330_000);
        let banked = ts.pending_catch_up();
        assert_eq!(banked, 2 * MINUTE + 330_000);

        let mut drained = Vec::new();
        while let Some(chunk) = ts.next_chunk() {
            drained.push(chunk);
        }
        assert_eq!(drained, vec![MINUTE; 7].into_iter().chain([30_000]).collect::<Vec<_>>());
        assert_eq!(ts.pending_catch_up(), 0);
    }

    #[test]
    fn consume_is_floored_at_zero() {
        let mut ts = source();
        ts.advance(1_000_000 + 10 * MINUTE);
        assert_eq!(ts.consume_catch_up(u64::MAX), 9 * MINUTE);
        assert_eq!(ts.consume_catch_up(5), 0);
        assert_eq!(ts.pending_catch_up(), 0);
    }

    #[test]
    fn needs_catch_up_detects_gap_and_bank() {
        let mut ts = source();
        assert!(!ts.needs_catch_up(1_000_000 + MINUTE));
        assert!(ts.needs_catch_up(1_000_000 + 6 * MINUTE));
        ts.advance(1_000_000 + 6 * MINUTE);
        assert!(ts.needs_catch_up(ts.last_time()));
        ts.reset_catch_up();
        assert!(!ts.needs_catch_up(ts.last_time()));
    }
}
