// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sink combinators.
//!
//! A root owns its sink as a `Box<dyn TraceSink>`. [`SharedSink`] keeps a
//! second handle so the caller can read a recorder between renders, and
//! [`Tee`] forwards every event to two sinks.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use sprig_core::trace::{
    CommitSummary, FiberMutation, PhaseBeginEvent, PhaseEndEvent, RenderFailedEvent, TaskEvent,
    TraceSink, UpdateScheduledEvent,
};

/// A cloneable handle to a sink.
///
/// Events are dropped while the caller holds a [`borrow_mut`](Self::borrow_mut)
/// guard.
#[derive(Debug, Default)]
pub struct SharedSink<S> {
    inner: Rc<RefCell<S>>,
}

impl<S> Clone for SharedSink<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> SharedSink<S> {
    /// Wraps `sink`.
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self {
            inner: Rc::new(RefCell::new(sink)),
        }
    }

    /// Borrows the sink.
    ///
    /// # Panics
    ///
    /// Panics if the sink is mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, S> {
        self.inner.borrow()
    }

    /// Mutably borrows the sink.
    ///
    /// # Panics
    ///
    /// Panics if the sink is already borrowed.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, S> {
        self.inner.borrow_mut()
    }

    fn with(&self, f: impl FnOnce(&mut S)) {
        if let Ok(mut sink) = self.inner.try_borrow_mut() {
            f(&mut sink);
        }
    }
}

impl<S: TraceSink> TraceSink for SharedSink<S> {
    fn on_update_scheduled(&mut self, e: &UpdateScheduledEvent) {
        self.with(|s| s.on_update_scheduled(e));
    }

    fn on_task_scheduled(&mut self, e: &TaskEvent) {
        self.with(|s| s.on_task_scheduled(e));
    }

    fn on_task_run(&mut self, e: &TaskEvent) {
        self.with(|s| s.on_task_run(e));
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.with(|s| s.on_phase_begin(e));
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.with(|s| s.on_phase_end(e));
    }

    fn on_render_failed(&mut self, e: &RenderFailedEvent<'_>) {
        self.with(|s| s.on_render_failed(e));
    }

    fn on_commit_summary(&mut self, summary: &CommitSummary) {
        self.with(|s| s.on_commit_summary(summary));
    }

    fn on_fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        self.with(|s| s.on_fiber_mutations(commit_index, mutations));
    }
}

/// Forwards every event to `A`, then to `B`.
#[derive(Debug, Default)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_update_scheduled(&mut self, e: &UpdateScheduledEvent) {
        self.0.on_update_scheduled(e);
        self.1.on_update_scheduled(e);
    }

    fn on_task_scheduled(&mut self, e: &TaskEvent) {
        self.0.on_task_scheduled(e);
        self.1.on_task_scheduled(e);
    }

    fn on_task_run(&mut self, e: &TaskEvent) {
        self.0.on_task_run(e);
        self.1.on_task_run(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.0.on_phase_begin(e);
        self.1.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.0.on_phase_end(e);
        self.1.on_phase_end(e);
    }

    fn on_render_failed(&mut self, e: &RenderFailedEvent<'_>) {
        self.0.on_render_failed(e);
        self.1.on_render_failed(e);
    }

    fn on_commit_summary(&mut self, s: &CommitSummary) {
        self.0.on_commit_summary(s);
        self.1.on_commit_summary(s);
    }

    fn on_fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        self.0.on_fiber_mutations(commit_index, mutations);
        self.1.on_fiber_mutations(commit_index, mutations);
    }
}

#[cfg(test)]
mod tests {
    use sprig_core::time::HostTime;
    use sprig_core::trace::PhaseKind;

    use super::*;
    use crate::recorder::{RecorderSink, decode};

    fn begin(commit_index: u64) -> PhaseBeginEvent {
        PhaseBeginEvent {
            commit_index,
            phase: PhaseKind::Render,
            timestamp: HostTime(0),
        }
    }

    #[test]
    fn handle_sees_events_sent_through_a_clone() {
        let shared = SharedSink::new(RecorderSink::new());
        let mut boxed: Box<dyn TraceSink> = Box::new(shared.clone());
        boxed.on_phase_begin(&begin(1));
        assert_eq!(decode(shared.borrow().as_bytes()).count(), 1);
    }

    #[test]
    fn events_are_dropped_while_borrowed() {
        let shared = SharedSink::new(RecorderSink::new());
        let mut sending = shared.clone();
        {
            let _guard = shared.borrow_mut();
            sending.on_phase_begin(&begin(1));
        }
        sending.on_phase_begin(&begin(2));
        assert_eq!(decode(shared.borrow().as_bytes()).count(), 1);
    }

    #[test]
    fn tee_feeds_both_sinks() {
        let left = SharedSink::new(RecorderSink::new());
        let right = SharedSink::new(RecorderSink::new());
        let mut tee = Tee(left.clone(), right.clone());
        tee.on_phase_begin(&begin(1));
        tee.on_phase_begin(&begin(2));
        assert_eq!(decode(left.borrow().as_bytes()).count(), 2);
        assert_eq!(decode(right.borrow().as_bytes()).count(), 2);
    }
}
