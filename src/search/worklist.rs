//! Priority worklist of pending tasks

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::derivation::{Priority, TaskId};

/// Min-priority queue with FIFO tie-break
///
/// Entries are never removed early: stale entries (tasks solved after they
/// were pushed) are filtered by the engine when popped.
#[derive(Debug, Default)]
pub struct Worklist {
    heap: BinaryHeap<Reverse<(Priority, u64, TaskId)>>,
    next_seq: u64,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: TaskId, priority: Priority) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse((priority, seq, task)));
    }

    /// Lowest-priority task; among equals, the earliest pushed
    pub fn pop(&mut self) -> Option<TaskId> {
        self.heap.pop().map(|Reverse((_, _, task))| task)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every remaining entry
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
