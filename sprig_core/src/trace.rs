// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for renders and commits.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that a
//! [`Root`](crate::root::Root) calls as it schedules, renders and commits.
//! All method bodies default to no-ops, so implementing only the events you
//! care about is fine. Install a sink with
//! [`Root::set_trace_sink`](crate::root::Root::set_trace_sink).
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`CommitSummaryBuilder`] collects phase timestamps during one render and
//! commit and produces a [`CommitSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`FiberMutation`] events and the
//!   corresponding `TraceSink` method.

use crate::error::RenderError;
use crate::fiber::FiberId;
use crate::scheduler::{PriorityLevel, TaskId};
use crate::time::HostTime;
use crate::work::CommitChanges;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a render/commit cycle is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Building the work-in-progress tree.
    Render,
    /// Applying deletions, placements and updates to the host tree.
    Mutation,
    /// Running layout effects.
    Layout,
    /// Running passive effects, in a later task.
    Passive,
}

/// What a root task does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Render and commit.
    Render,
    /// Flush passive effects.
    Passive,
}

/// Which host mutation a fiber received.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Inserted or moved.
    Placement,
    /// Props or text updated.
    Update,
    /// Removed with its subtree.
    Deletion,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a state dispatch asks its root to render.
#[derive(Clone, Copy, Debug)]
pub struct UpdateScheduledEvent {
    /// The fiber whose state changed.
    pub fiber: FiberId,
    /// Whether a new render task was scheduled (`false` when one was already
    /// pending and absorbs this update).
    pub new_task: bool,
    /// Host time of the dispatch.
    pub timestamp: HostTime,
}

/// Emitted when a root schedules a task and again when the task runs.
#[derive(Clone, Copy, Debug)]
pub struct TaskEvent {
    /// What the task does.
    pub kind: TaskKind,
    /// Scheduler id of the task.
    pub task: TaskId,
    /// Priority it was scheduled at.
    pub priority: PriorityLevel,
    /// Host time of the event.
    pub timestamp: HostTime,
}

/// Marks the beginning of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Number of the commit this phase belongs to.
    pub commit_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Number of the commit this phase belongs to.
    pub commit_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted when a render or commit fails. The root stops rendering.
#[derive(Clone, Copy, Debug)]
pub struct RenderFailedEvent<'a> {
    /// Number of the commit that was being produced.
    pub commit_index: u64,
    /// What went wrong.
    pub error: &'a RenderError,
    /// Host time of the failure.
    pub timestamp: HostTime,
}

/// Per-commit summary produced by [`CommitSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct CommitSummary {
    /// Number of the commit, starting at 1.
    pub commit_index: u64,
    /// Host time the render started.
    pub started: HostTime,
    /// Render phase duration in ticks (0 if not measured).
    pub render_ticks: u64,
    /// Mutation phase duration in ticks (0 if not measured).
    pub mutation_ticks: u64,
    /// Layout phase duration in ticks (0 if not measured).
    pub layout_ticks: u64,
    /// Fibers inserted or moved.
    pub placements: u32,
    /// Host nodes updated.
    pub updates: u32,
    /// Subtrees removed.
    pub deletions: u32,
    /// Layout effect creators run.
    pub layout_effects: u32,
    /// Passive effect creators queued.
    pub passive_effects: u32,
}

/// A per-commit fiber mutation record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct FiberMutation {
    /// Raw slot index of the fiber.
    pub fiber_index: u32,
    /// What happened to it.
    pub kind: MutationKind,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a root.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a dispatch schedules (or joins) a render.
    fn on_update_scheduled(&mut self, e: &UpdateScheduledEvent) {
        _ = e;
    }

    /// Called when the root hands a task to the scheduler.
    fn on_task_scheduled(&mut self, e: &TaskEvent) {
        _ = e;
    }

    /// Called when a root task starts running.
    fn on_task_run(&mut self, e: &TaskEvent) {
        _ = e;
    }

    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a render or commit fails.
    fn on_render_failed(&mut self, e: &RenderFailedEvent<'_>) {
        _ = e;
    }

    /// Called with a per-commit summary.
    fn on_commit_summary(&mut self, s: &CommitSummary) {
        _ = s;
    }

    /// Called with per-commit fiber mutations (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        _ = (commit_index, mutations);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits an [`UpdateScheduledEvent`].
    #[inline]
    pub fn update_scheduled(&mut self, e: &UpdateScheduledEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_update_scheduled(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a scheduled [`TaskEvent`].
    #[inline]
    pub fn task_scheduled(&mut self, e: &TaskEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_task_scheduled(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a running [`TaskEvent`].
    #[inline]
    pub fn task_run(&mut self, e: &TaskEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_task_run(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderFailedEvent`].
    #[inline]
    pub fn render_failed(&mut self, e: &RenderFailedEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_failed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitSummary`].
    #[inline]
    pub fn commit_summary(&mut self, s: &CommitSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_commit_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits fiber mutations (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        if let Some(s) = &mut self.sink {
            s.on_fiber_mutations(commit_index, mutations);
        }
    }
}

// ---------------------------------------------------------------------------
// CommitSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during one render and commit and produces a
/// [`CommitSummary`].
#[derive(Debug)]
pub struct CommitSummaryBuilder {
    commit_index: u64,
    started: HostTime,
    phase_starts: [Option<HostTime>; 4],
    phase_ends: [Option<HostTime>; 4],
    placements: u32,
    updates: u32,
    deletions: u32,
    layout_effects: u32,
    passive_effects: u32,
}

impl CommitSummaryBuilder {
    /// Starts building a summary for the given commit.
    #[must_use]
    pub fn new(commit_index: u64, started: HostTime) -> Self {
        Self {
            commit_index,
            started,
            phase_starts: [None; 4],
            phase_ends: [None; 4],
            placements: 0,
            updates: 0,
            deletions: 0,
            layout_effects: 0,
            passive_effects: 0,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Copies the mutation and effect counts of a commit.
    pub fn set_changes(&mut self, changes: &CommitChanges) {
        self.placements = count(changes.placements.len());
        self.updates = count(changes.updates.len());
        self.deletions = count(changes.deletions.len());
        self.layout_effects = changes.layout_effects;
        self.passive_effects = changes.passive_effects;
    }

    /// Consumes the builder and produces the final [`CommitSummary`].
    #[must_use]
    pub fn finish(self) -> CommitSummary {
        CommitSummary {
            commit_index: self.commit_index,
            started: self.started,
            render_ticks: self.phase_duration(PhaseKind::Render),
            mutation_ticks: self.phase_duration(PhaseKind::Mutation),
            layout_ticks: self.phase_duration(PhaseKind::Layout),
            placements: self.placements,
            updates: self.updates,
            deletions: self.deletions,
            layout_effects: self.layout_effects,
            passive_effects: self.passive_effects,
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).ticks(),
            _ => 0,
        }
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Render => 0,
        PhaseKind::Mutation => 1,
        PhaseKind::Layout => 2,
        PhaseKind::Passive => 3,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
