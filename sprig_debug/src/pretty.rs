// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Host time
//! counts nanoseconds; lines show microseconds.

use std::io::Write;

use sprig_core::time::HostTime;
use sprig_core::trace::{
    CommitSummary, FiberMutation, MutationKind, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    RenderFailedEvent, TaskEvent, TaskKind, TraceSink, UpdateScheduledEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn us(ticks: u64) -> f64 {
    ticks as f64 / 1000.0
}

fn host_us(t: HostTime) -> f64 {
    us(t.ticks())
}

pub(crate) fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Render => "render",
        PhaseKind::Mutation => "mutation",
        PhaseKind::Layout => "layout",
        PhaseKind::Passive => "passive",
    }
}

fn task_name(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Render => "render",
        TaskKind::Passive => "passive",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_update_scheduled(&mut self, e: &UpdateScheduledEvent) {
        let joined = if e.new_task { "new task" } else { "joined" };
        let _ = writeln!(
            self.writer,
            "[update] fiber={}v{} {joined} at {:.1}µs",
            e.fiber.index(),
            e.fiber.generation(),
            host_us(e.timestamp),
        );
    }

    fn on_task_scheduled(&mut self, e: &TaskEvent) {
        let _ = writeln!(
            self.writer,
            "[task:scheduled] #{} {} priority={:?} at {:.1}µs",
            e.task.get(),
            task_name(e.kind),
            e.priority,
            host_us(e.timestamp),
        );
    }

    fn on_task_run(&mut self, e: &TaskEvent) {
        let _ = writeln!(
            self.writer,
            "[task:run] #{} {} at {:.1}µs",
            e.task.get(),
            task_name(e.kind),
            host_us(e.timestamp),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] commit={} {} at {:.1}µs",
            e.commit_index,
            phase_name(e.phase),
            host_us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] commit={} {} at {:.1}µs",
            e.commit_index,
            phase_name(e.phase),
            host_us(e.timestamp),
        );
    }

    fn on_render_failed(&mut self, e: &RenderFailedEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[failed] commit={} at {:.1}µs: {}",
            e.commit_index,
            host_us(e.timestamp),
            e.error,
        );
    }

    fn on_commit_summary(&mut self, s: &CommitSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] commit={} render={:.1}µs mutation={:.1}µs layout={:.1}µs \
             placed={} updated={} deleted={} layout_fx={} passive_fx={}",
            s.commit_index,
            us(s.render_ticks),
            us(s.mutation_ticks),
            us(s.layout_ticks),
            s.placements,
            s.updates,
            s.deletions,
            s.layout_effects,
            s.passive_effects,
        );
    }

    fn on_fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        let mut placed = 0;
        let mut updated = 0;
        let mut deleted = 0;
        for m in mutations {
            match m.kind {
                MutationKind::Placement => placed += 1,
                MutationKind::Update => updated += 1,
                MutationKind::Deletion => deleted += 1,
            }
        }
        let _ = writeln!(
            self.writer,
            "[mutations] commit={commit_index} total={} placement={placed} update={updated} deletion={deleted}",
            mutations.len(),
        );
    }
}
