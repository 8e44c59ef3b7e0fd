// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pending-task storage ordered by expiration.
//!
//! Keys live in a binary min-heap ordered by `(sort_index, id)`; task bodies
//! live in a side table so a callback can be taken out while it runs and put
//! back as a continuation without disturbing the heap.

use alloc::collections::{BTreeMap, BinaryHeap};
use core::cmp::Reverse;
use core::fmt;

use super::{Callback, PriorityLevel};
use crate::time::HostTime;

/// Identifier of a scheduled task.
///
/// Ids increase in scheduling order and break ties between tasks that expire
/// at the same instant.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

/// Heap ordering key. Field order gives the derived `Ord` its meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TaskKey {
    pub(crate) sort_index: HostTime,
    pub(crate) id: TaskId,
}

pub(crate) struct Task {
    pub(crate) priority: PriorityLevel,
    pub(crate) start_time: HostTime,
    pub(crate) callback: Option<Callback>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("priority", &self.priority)
            .field("start_time", &self.start_time)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
pub(crate) struct TaskQueue {
    heap: BinaryHeap<Reverse<TaskKey>>,
    tasks: BTreeMap<TaskId, Task>,
}

impl TaskQueue {
    pub(crate) fn push(&mut self, key: TaskKey, task: Task) {
        self.tasks.insert(key.id, task);
        self.heap.push(Reverse(key));
    }

    /// Returns the key of the most urgent task without removing it.
    pub(crate) fn peek(&self) -> Option<TaskKey> {
        self.heap.peek().map(|Reverse(key)| *key)
    }

    pub(crate) fn pop(&mut self) -> Option<(TaskKey, Task)> {
        let Reverse(key) = self.heap.pop()?;
        let task = self.tasks.remove(&key.id)?;
        Some((key, task))
    }

    /// Takes the callback out of a task, leaving an empty slot in the heap.
    pub(crate) fn take_callback(&mut self, id: TaskId) -> Option<(Callback, PriorityLevel)> {
        let task = self.tasks.get_mut(&id)?;
        task.callback.take().map(|cb| (cb, task.priority))
    }

    /// Stores a continuation back into a task that is still queued.
    pub(crate) fn set_callback(&mut self, id: TaskId, callback: Callback) {
        if let Some(task) = self.tasks.get_mut(&id) {
            task.callback = Some(callback);
        }
    }

    /// Number of queued tasks that still have a callback to run.
    pub(crate) fn live_len(&self) -> usize {
        self.tasks.values().filter(|t| t.callback.is_some()).count()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn key(sort_index: u64, id: u64) -> TaskKey {
        TaskKey {
            sort_index: HostTime(sort_index),
            id: TaskId(id),
        }
    }

    fn task() -> Task {
        Task {
            priority: PriorityLevel::Normal,
            start_time: HostTime(0),
            callback: Some(Callback::once(|| {})),
        }
    }

    #[test]
    fn pops_in_sort_index_then_id_order() {
        let mut queue = TaskQueue::default();
        queue.push(key(30, 0), task());
        queue.push(key(10, 1), task());
        queue.push(key(10, 2), task());
        queue.push(key(5, 3), task());

        let mut order = Vec::new();
        while let Some((k, _)) = queue.pop() {
            order.push(k.id.get());
        }
        assert_eq!(order, [3, 1, 2, 0], "ties resolve by id");
        assert!(queue.is_empty());
    }

    #[test]
    fn taken_callback_leaves_slot() {
        let mut queue = TaskQueue::default();
        queue.push(key(1, 7), task());
        assert_eq!(queue.live_len(), 1);
        let taken = queue.take_callback(TaskId(7));
        assert!(taken.is_some(), "callback present");
        assert!(queue.take_callback(TaskId(7)).is_none(), "taken once");
        assert_eq!(queue.live_len(), 0);
        assert_eq!(queue.peek(), Some(key(1, 7)), "slot stays in the heap");
    }
}
