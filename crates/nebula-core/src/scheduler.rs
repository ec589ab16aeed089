//! Low-frequency recurring jobs.
//!
//! A job registered with [`Scheduler::every`] has never run, so it fires on
//! the first [`Scheduler::tick`] regardless of its interval. After that it
//! fires whenever `now - last_run >= interval`. Jobs do not share timing:
//! a slow or failing job never shifts another job's schedule.
//!
//! The scheduler does not catch or retry. A failing job's error is handed
//! back to the caller; the job is still considered to have run.

use std::fmt;

/// A recurring job over state `S` that can fail with `E`.
pub type Job<S, E> = Box<dyn FnMut(&mut S, u64) -> Result<(), E> + Send>;

/// One job's failure during [`Scheduler::tick`].
#[derive(Debug, thiserror::Error)]
#[error("scheduled job '{job}' failed: {source}")]
pub struct SchedulerError<E: std::error::Error + 'static> {
    /// Name of the job.
    pub job: &'static str,
    /// The job's own error.
    #[source]
    pub source: E,
}

struct Entry<S, E> {
    name: &'static str,
    interval_ms: u64,
    last_run: Option<u64>,
    job: Job<S, E>,
}

/// Interval-based job runner.
pub struct Scheduler<S, E> {
    jobs: Vec<Entry<S, E>>,
}

impl<S, E> fmt::Debug for Scheduler<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.jobs.iter().map(|e| (e.name, e.interval_ms, e.last_run)))
            .finish()
    }
}

impl<S, E> Default for Scheduler<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E> Scheduler<S, E> {
    /// An empty scheduler.
    pub const fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Register `job` to run every `interval_ms`.
    pub fn every<F>(&mut self, name: &'static str, interval_ms: u64, job: F)
    where
        F: FnMut(&mut S, u64) -> Result<(), E> + Send + 'static,
    {
        self.jobs.push(Entry {
            name,
            interval_ms,
            last_run: None,
            job: Box::new(job),
        });
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no job is registered.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Remove every job.
    pub fn clear(&mut self) {
        self.jobs.clear();
    }
}

impl<S, E: std::error::Error + 'static> Scheduler<S, E> {
    /// Run every due job in registration order.
    ///
    /// Returns how many jobs ran and the failures among them.
    pub fn tick(&mut self, state: &mut S, now: u64) -> (usize, Vec<SchedulerError<E>>) {
        let mut ran = 0_usize;
        let mut failures = Vec::new();
        for entry in &mut self.jobs {
            let due = entry
                .last_run
                .is_none_or(|last| now.saturating_sub(last) >= entry.interval_ms);
            if !due {
                continue;
            }
            entry.last_run = Some(now);
            ran = ran.saturating_add(1);
            if let Err(source) = (entry.job)(state, now) {
                failures.push(SchedulerError {
                    job: entry.name,
                    source,
                });
            }
        }
        (ran, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[derive(Default)]
    struct Counters {
        fast: u32,
        slow: u32,
    }

    fn scheduler() -> Scheduler<Counters, Boom> {
        let mut s = Scheduler::new();
        s.every("fast", 1_000, |c: &mut Counters, _| {
            c.fast = c.fast.saturating_add(1);
            Ok(())
        });
        s.every("slow", 5_000, |c: &mut Counters, _| {
            c.slow = c.slow.saturating_add(1);
            Ok(())
        });
        s
    }

    #[test]
    fn first_tick_fires_everything() {
        let mut s = scheduler();
        let mut c = Counters::default();
        let (ran, failures) = s.tick(&mut c, 10);
        assert_eq!(ran, 2);
        assert!(failures.is_empty());
        assert_eq!((c.fast, c.slow), (1, 1));
    }

    #[test]
    fn jobs_keep_independent_intervals() {
        let mut s = scheduler();
        let mut c = Counters::default();
        for now in (0..=10_000).step_by(500) {
            s.tick(&mut c, now);
        }
        assert_eq!(c.fast, 11);
        assert_eq!(c.slow, 3);
    }

    #[test]
    fn failures_are_returned_and_others_still_run() {
        let mut s: Scheduler<Counters, Boom> = Scheduler::new();
        s.every("broken", 1_000, |_, _| Err(Boom));
        s.every("counter", 1_000, |c: &mut Counters, _| {
            c.fast = c.fast.saturating_add(1);
            Ok(())
        });
        let mut c = Counters::default();
        let (ran, failures) = s.tick(&mut c, 0);
        assert_eq!(ran, 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures.first().map(|f| f.job), Some("broken"));
        assert_eq!(c.fast, 1);

        let (ran, _) = s.tick(&mut c, 500);
        assert_eq!(ran, 0);
    }
}
