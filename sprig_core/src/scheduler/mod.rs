// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative, priority-ordered task scheduling.
//!
//! The [`Scheduler`] keeps a min-heap of tasks keyed by expiration time and
//! drains it in short slices. Each slice starts when the host services a
//! callback request (see [`SchedulerHost::request_host_callback`]) and calls
//! [`Scheduler::perform_work_until_deadline`]. Between tasks the loop checks
//! [`Scheduler::should_yield_to_host`]; unexpired work is left for the next
//! slice once [`SchedulerConfig::frame_interval`] has elapsed.
//!
//! # Priorities
//!
//! A task's expiration is its start time plus the timeout for its
//! [`PriorityLevel`]. [`PriorityLevel::Immediate`] has no timeout: its
//! expiration is one tick before it was scheduled, so it sorts ahead of
//! everything scheduled at the same time and never yields.
//!
//! # Continuations
//!
//! A [`Callback`] may return another callback. The scheduler stores it back
//! into the same task (keeping its id and expiration) and ends the slice, so
//! long work can be split into resumable chunks.

mod queue;

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::time::{Duration, HostTime};

pub use queue::TaskId;
use queue::{Task, TaskKey, TaskQueue};

/// Urgency class of a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriorityLevel {
    /// Already expired when scheduled; runs before anything else.
    Immediate,
    /// Direct responses to user input.
    UserBlocking,
    /// Default priority for renders.
    Normal,
    /// Work that may wait for a while.
    Low,
    /// Work that only needs to happen eventually.
    Idle,
}

/// Configuration for the [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Length of one work slice before the loop yields to the host.
    pub frame_interval: Duration,
    /// Timeout for [`PriorityLevel::UserBlocking`].
    pub user_blocking_timeout: Duration,
    /// Timeout for [`PriorityLevel::Normal`].
    pub normal_timeout: Duration,
    /// Timeout for [`PriorityLevel::Low`].
    pub low_timeout: Duration,
    /// Timeout for [`PriorityLevel::Idle`].
    pub idle_timeout: Duration,
}

impl SchedulerConfig {
    /// Timeouts tuned for interactive hosts: 5 ms slices, 250 ms for user
    /// input, 5 s for normal work, 10 s for low priority and effectively
    /// never for idle work.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            frame_interval: Duration::from_millis(5),
            user_blocking_timeout: Duration::from_millis(250),
            normal_timeout: Duration::from_millis(5000),
            low_timeout: Duration::from_millis(10_000),
            // Largest signed 31-bit millisecond value.
            idle_timeout: Duration::from_millis(1_073_741_823),
        }
    }

    /// Returns a copy with a different slice length.
    #[must_use]
    pub const fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    /// Returns the timeout for `priority`, or `None` if tasks at that
    /// priority are expired on arrival.
    #[must_use]
    pub const fn timeout_for(&self, priority: PriorityLevel) -> Option<Duration> {
        match priority {
            PriorityLevel::Immediate => None,
            PriorityLevel::UserBlocking => Some(self.user_blocking_timeout),
            PriorityLevel::Normal => Some(self.normal_timeout),
            PriorityLevel::Low => Some(self.low_timeout),
            PriorityLevel::Idle => Some(self.idle_timeout),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// The two primitives a host environment provides to the scheduler.
pub trait SchedulerHost {
    /// Reads the monotonic clock.
    fn now(&self) -> HostTime;

    /// Asks the host to call [`Scheduler::perform_work_until_deadline`] soon,
    /// from a fresh macrotask. Repeated requests before the host responds may
    /// be coalesced.
    fn request_host_callback(&self);
}

/// A deterministic [`SchedulerHost`] with a virtual clock.
///
/// Callback requests only raise a flag; [`run_until_idle`](Self::run_until_idle)
/// services them. With an auto-advance step set, every clock read moves time
/// forward, which is how tests exercise time slicing.
#[derive(Debug, Default)]
pub struct ManualHost {
    now: Cell<HostTime>,
    step: Cell<Duration>,
    pending: Cell<bool>,
    requests: Cell<u32>,
}

impl ManualHost {
    /// Creates a host whose clock starts at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the clock.
    pub fn set_now(&self, now: HostTime) {
        self.now.set(now);
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(by));
    }

    /// Makes every [`now`](SchedulerHost::now) call advance the clock by
    /// `step` after reading it.
    pub fn set_auto_advance(&self, step: Duration) {
        self.step.set(step);
    }

    /// Returns whether a callback request is outstanding.
    #[must_use]
    pub fn has_pending_callback(&self) -> bool {
        self.pending.get()
    }

    /// Clears and returns the outstanding-request flag.
    pub fn take_pending_callback(&self) -> bool {
        self.pending.replace(false)
    }

    /// Total number of callback requests received.
    #[must_use]
    pub fn request_count(&self) -> u32 {
        self.requests.get()
    }

    /// Services callback requests until none are outstanding and returns the
    /// number of slices run.
    pub fn run_until_idle(&self, scheduler: &Scheduler) -> u32 {
        let mut slices = 0;
        while self.take_pending_callback() {
            scheduler.perform_work_until_deadline();
            slices += 1;
        }
        slices
    }
}

impl SchedulerHost for ManualHost {
    fn now(&self) -> HostTime {
        let now = self.now.get();
        self.now.set(now.saturating_add(self.step.get()));
        now
    }

    fn request_host_callback(&self) {
        self.pending.set(true);
        self.requests.set(self.requests.get() + 1);
    }
}

/// A unit of scheduled work.
///
/// The closure receives `did_timeout` (whether the task's expiration had
/// passed when it started) and may return a continuation.
pub struct Callback(Box<dyn FnOnce(bool) -> Option<Callback>>);

impl Callback {
    /// Wraps a closure that may return a continuation.
    pub fn new(f: impl FnOnce(bool) -> Option<Self> + 'static) -> Self {
        Self(Box::new(f))
    }

    /// Wraps a closure that always runs to completion.
    pub fn once(f: impl FnOnce() + 'static) -> Self {
        Self::new(move |_| {
            f();
            None
        })
    }

    fn invoke(self, did_timeout: bool) -> Option<Self> {
        (self.0)(did_timeout)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").finish_non_exhaustive()
    }
}

/// Counters describing what the scheduler has done so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Callbacks that returned without a continuation.
    pub tasks_completed: u64,
    /// Callbacks that returned a continuation.
    pub continuations: u64,
    /// Host callbacks serviced.
    pub slices: u64,
    /// Slices that ended because the frame interval ran out.
    pub yields: u64,
}

/// Priority task scheduler.
///
/// This is a cheap-to-clone handle; clones share one queue. The scheduler is
/// single-threaded and re-entrant: callbacks may schedule further tasks.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<Inner>,
}

struct Inner {
    config: SchedulerConfig,
    host: Rc<dyn SchedulerHost>,
    queue: RefCell<TaskQueue>,
    next_id: Cell<u64>,
    current_priority: Cell<Option<PriorityLevel>>,
    slice_start: Cell<HostTime>,
    host_callback_scheduled: Cell<bool>,
    performing_work: Cell<bool>,
    message_loop_running: Cell<bool>,
    stats: Cell<SchedulerStats>,
}

impl Inner {
    fn bump(&self, f: impl FnOnce(&mut SchedulerStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.inner.config)
            .field("pending_tasks", &self.pending_tasks())
            .field("stats", &self.inner.stats.get())
            .finish_non_exhaustive()
    }
}

/// Restores per-slice state even if a callback panics.
struct WorkGuard<'a> {
    inner: &'a Inner,
    previous: Option<PriorityLevel>,
}

impl Drop for WorkGuard<'_> {
    fn drop(&mut self) {
        self.inner.current_priority.set(self.previous);
        self.inner.performing_work.set(false);
    }
}

impl Scheduler {
    /// Creates a scheduler driven by `host`.
    #[must_use]
    pub fn new(config: SchedulerConfig, host: Rc<dyn SchedulerHost>) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                host,
                queue: RefCell::new(TaskQueue::default()),
                next_id: Cell::new(0),
                current_priority: Cell::new(None),
                slice_start: Cell::new(HostTime(0)),
                host_callback_scheduled: Cell::new(false),
                performing_work: Cell::new(false),
                message_loop_running: Cell::new(false),
                stats: Cell::new(SchedulerStats::default()),
            }),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Reads the host clock.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.inner.host.now()
    }

    /// Queues `callback` at `priority` and returns its id.
    ///
    /// Requests a host callback unless one is already outstanding or the
    /// scheduler is inside a slice (which will pick the task up itself).
    pub fn schedule_callback(&self, priority: PriorityLevel, callback: Callback) -> TaskId {
        let inner = &self.inner;
        let start_time = self.now();
        let expiration_time = match inner.config.timeout_for(priority) {
            Some(timeout) => start_time.saturating_add(timeout),
            None => start_time.saturating_sub(Duration::TICK),
        };

        let id = TaskId(inner.next_id.get());
        inner.next_id.set(id.0 + 1);
        inner.queue.borrow_mut().push(
            TaskKey {
                sort_index: expiration_time,
                id,
            },
            Task {
                priority,
                start_time,
                callback: Some(callback),
            },
        );

        if !inner.host_callback_scheduled.get() && !inner.performing_work.get() {
            inner.host_callback_scheduled.set(true);
            self.request_host_callback();
        }
        id
    }

    /// Cancels a queued task. Returns `false` if it already ran or was
    /// cancelled.
    ///
    /// The emptied slot stays in the heap until it reaches the top.
    pub fn cancel_callback(&self, id: TaskId) -> bool {
        self.inner.queue.borrow_mut().take_callback(id).is_some()
    }

    /// Returns whether the current slice has used up its frame interval.
    #[must_use]
    pub fn should_yield_to_host(&self) -> bool {
        let elapsed = self
            .now()
            .saturating_duration_since(self.inner.slice_start.get());
        elapsed >= self.inner.config.frame_interval
    }

    /// Runs one slice of work. Hosts call this when a requested callback
    /// fires.
    ///
    /// Returns whether work remains; in that case another host callback has
    /// already been requested.
    pub fn perform_work_until_deadline(&self) -> bool {
        let inner = &self.inner;
        if !inner.message_loop_running.get() {
            return false;
        }
        let start = self.now();
        inner.slice_start.set(start);
        inner.bump(|s| s.slices += 1);

        let has_more = self.flush_work(start);
        if has_more {
            inner.host.request_host_callback();
        } else {
            inner.message_loop_running.set(false);
        }
        has_more
    }

    /// Runs slices until the queue is empty and returns how many ran.
    ///
    /// Intended for tests and synchronous hosts. A task that keeps returning
    /// continuations keeps this loop running.
    pub fn flush_all(&self) -> u32 {
        let mut slices = 0;
        while !self.inner.queue.borrow().is_empty() {
            self.inner.message_loop_running.set(true);
            self.perform_work_until_deadline();
            slices += 1;
        }
        slices
    }

    /// Number of queued tasks that still have work to do.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.inner.queue.borrow().live_len()
    }

    /// Returns whether a host callback has been requested and not yet
    /// serviced.
    #[must_use]
    pub fn is_host_callback_scheduled(&self) -> bool {
        self.inner.host_callback_scheduled.get()
    }

    /// Priority of the task currently running, if any.
    #[must_use]
    pub fn current_priority_level(&self) -> Option<PriorityLevel> {
        self.inner.current_priority.get()
    }

    /// Returns the scheduler's counters.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.inner.stats.get()
    }

    fn request_host_callback(&self) {
        let inner = &self.inner;
        if !inner.message_loop_running.get() {
            inner.message_loop_running.set(true);
            inner.host.request_host_callback();
        }
    }

    fn flush_work(&self, initial_time: HostTime) -> bool {
        let inner = &self.inner;
        inner.host_callback_scheduled.set(false);
        inner.performing_work.set(true);
        let _guard = WorkGuard {
            inner,
            previous: inner.current_priority.get(),
        };
        self.work_loop(initial_time)
    }

    fn work_loop(&self, initial_time: HostTime) -> bool {
        let inner = &self.inner;
        let mut current_time = initial_time;
        loop {
            let Some(key) = inner.queue.borrow().peek() else {
                return false;
            };
            if key.sort_index > current_time && self.should_yield_to_host() {
                inner.bump(|s| s.yields += 1);
                return true;
            }

            let taken = inner.queue.borrow_mut().take_callback(key.id);
            let Some((callback, priority)) = taken else {
                // Cancelled, or finished while another task sat on top.
                inner.queue.borrow_mut().pop();
                continue;
            };

            inner.current_priority.set(Some(priority));
            let did_timeout = key.sort_index <= current_time;
            let continuation = callback.invoke(did_timeout);
            current_time = self.now();

            if let Some(next) = continuation {
                inner.queue.borrow_mut().set_callback(key.id, next);
                inner.bump(|s| s.continuations += 1);
                return true;
            }
            inner.bump(|s| s.tasks_completed += 1);

            let mut queue = inner.queue.borrow_mut();
            if queue.peek() == Some(key) {
                queue.pop();
            }
        }
    }
}
