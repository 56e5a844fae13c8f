//! Time-ordered queue of pending process wake-ups.
//!
//! Wake-ups are ordered by `(wake_time, process)`, where the process id is
//! its registration index. Wake-ups for the same instant therefore pop in
//! registration order no matter when each was enqueued. A process has at most
//! one pending wake-up, so the pair is unique.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;

/// Index of a registered process. Assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(usize);

impl ProcessId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Registration index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "process-{}", self.0)
    }
}

/// A scheduled resumption of one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeEvent {
    /// When the process resumes (nanoseconds).
    pub wake_ns: u64,
    /// Process to resume. Its registration index breaks ties.
    pub process: ProcessId,
}

impl PartialOrd for WakeEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WakeEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Normal order - used with Reverse wrapper for min-heap
        self.wake_ns
            .cmp(&other.wake_ns)
            .then(self.process.cmp(&other.process))
    }
}

/// Min-heap of wake-ups.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<WakeEvent>>,
}

impl EventQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `process` to wake at `wake_ns`.
    pub fn schedule(&mut self, wake_ns: u64, process: ProcessId) -> WakeEvent {
        let event = WakeEvent { wake_ns, process };
        self.heap.push(Reverse(event));
        event
    }

    /// Removes and returns the earliest wake-up.
    pub fn pop(&mut self) -> Option<WakeEvent> {
        self.heap.pop().map(|Reverse(event)| event)
    }

    /// Earliest wake-up without removing it.
    pub fn peek(&self) -> Option<&WakeEvent> {
        self.heap.peek().map(|Reverse(event)| event)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.schedule(1_000, ProcessId::new(0));
        queue.schedule(500, ProcessId::new(1));
        queue.schedule(1_500, ProcessId::new(2));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek().map(|e| e.wake_ns), Some(500));

        let order: Vec<u64> = std::iter::from_fn(|| queue.pop()).map(|e| e.wake_ns).collect();
        assert_eq!(order, vec![500, 1_000, 1_500]);
        assert!(queue.is_empty());
    }

    #[test]
    fn same_instant_follows_registration_order() {
        let mut queue = EventQueue::new();
        // Enqueued out of registration order on purpose.
        queue.schedule(1_000, ProcessId::new(2));
        queue.schedule(1_000, ProcessId::new(0));
        queue.schedule(1_000, ProcessId::new(1));

        let order: Vec<usize> = std::iter::from_fn(|| queue.pop())
            .map(|e| e.process.index())
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn time_dominates_registration_order() {
        let mut queue = EventQueue::new();
        let late = queue.schedule(10, ProcessId::new(0));
        let early = queue.schedule(5, ProcessId::new(2));
        assert!(early < late);
        assert_eq!(queue.pop(), Some(early));
    }

    #[test]
    fn empty_queue() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.peek().map(|e| e.wake_ns), None);
        assert!(queue.pop().is_none());
    }
}
