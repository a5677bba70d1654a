//! Virtual-time timer queue.
//!
//! Delays, debounces and races are modeled as tasks scheduled at a deadline.
//! Time only moves when the owner calls [`Scheduler::advance`] or
//! [`Scheduler::poll`], so tests drive it deterministically and a host maps
//! it onto its own clock.

use std::time::Duration;

use web_time::Instant;

/// Handle for cancelling a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<T> {
    id: TimerId,
    deadline: Duration,
    task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    pending: Vec<Entry<T>>,
    origin: Instant,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: Vec::new(),
            origin: Instant::now(),
        }
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Entry {
            id,
            deadline: self.now + delay,
            task,
        });
        id
    }

    /// Drop a pending task. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|e| e.id != id);
        self.pending.len() != before
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|e| e.id == id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Earliest deadline, as virtual time since creation.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|e| e.deadline).min()
    }

    /// Remove the next task due at or before `until` and move the clock to
    /// its deadline. Ties go to the task scheduled first.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= until)
            .min_by_key(|(_, e)| (e.deadline, e.id.0))
            .map(|(i, _)| i)?;
        let entry = self.pending.remove(idx);
        self.now = self.now.max(entry.deadline);
        Some(entry.task)
    }

    /// Move the clock forward without running anything. Callers drain
    /// [`pop_due`](Self::pop_due) first.
    pub fn settle_at(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Virtual target time for a wall-clock instant.
    pub fn target_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>, until: Duration) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some(t) = s.pop_due(until) {
            fired.push(t);
        }
        s.settle_at(until);
        fired
    }

    #[test]
    fn test_deadline_order_and_fifo() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_millis(10), "b");
        s.schedule(Duration::from_millis(5), "a");
        s.schedule(Duration::from_millis(10), "c");
        assert_eq!(drain(&mut s, Duration::from_millis(9)), vec!["a"]);
        assert_eq!(s.now(), Duration::from_millis(9));
        assert_eq!(drain(&mut s, Duration::from_millis(10)), vec!["b", "c"]);
    }

    #[test]
    fn test_cancel() {
        let mut s = Scheduler::new();
        let id = s.schedule(Duration::from_millis(1), "x");
        assert!(s.is_pending(id));
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(drain(&mut s, Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_delay_is_relative_to_now() {
        let mut s = Scheduler::new();
        drain(&mut s, Duration::from_millis(100));
        s.schedule(Duration::from_millis(10), "late");
        assert_eq!(s.next_deadline(), Some(Duration::from_millis(110)));
    }
}
