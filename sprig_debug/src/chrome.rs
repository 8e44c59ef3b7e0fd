// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Phases become duration events on thread 0, scheduler activity becomes
//! instant events on thread 1.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use sprig_core::trace::{
    CommitSummary, FiberMutation, PhaseBeginEvent, PhaseEndEvent, RenderFailedEvent, TaskEvent,
    TraceSink, UpdateScheduledEvent,
};

use crate::pretty::phase_name;
use crate::recorder::{RecordedEvent, RecordedTask, RecorderSink, decode};

const COMMIT_THREAD: u32 = 0;
const SCHEDULER_THREAD: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(to_trace_event).collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_trace_event(recorded: RecordedEvent) -> Value {
    match recorded {
        RecordedEvent::UpdateScheduled {
            fiber_index,
            generation,
            new_task,
            timestamp,
        } => json!({
            "ph": "i",
            "name": "UpdateScheduled",
            "cat": "Scheduler",
            "ts": ticks_to_us(timestamp.ticks()),
            "pid": 0,
            "tid": SCHEDULER_THREAD,
            "s": "t",
            "args": {
                "fiber": format!("{fiber_index}v{generation}"),
                "new_task": new_task,
            }
        }),
        RecordedEvent::TaskScheduled(t) => task_event("TaskScheduled", &t),
        RecordedEvent::TaskRun(t) => task_event("TaskRun", &t),
        RecordedEvent::PhaseBegin(e) => json!({
            "ph": "B",
            "name": phase_name(e.phase),
            "cat": "Commit",
            "ts": ticks_to_us(e.timestamp.ticks()),
            "pid": 0,
            "tid": COMMIT_THREAD,
            "args": {
                "commit_index": e.commit_index,
            }
        }),
        RecordedEvent::PhaseEnd(e) => json!({
            "ph": "E",
            "name": phase_name(e.phase),
            "cat": "Commit",
            "ts": ticks_to_us(e.timestamp.ticks()),
            "pid": 0,
            "tid": COMMIT_THREAD,
            "args": {
                "commit_index": e.commit_index,
            }
        }),
        RecordedEvent::RenderFailed {
            commit_index,
            failure,
            timestamp,
        } => json!({
            "ph": "i",
            "name": "RenderFailed",
            "cat": "Commit",
            "ts": ticks_to_us(timestamp.ticks()),
            "pid": 0,
            "tid": COMMIT_THREAD,
            "s": "g",
            "args": {
                "commit_index": commit_index,
                "failure": format!("{failure:?}"),
            }
        }),
        RecordedEvent::CommitSummary(s) => json!({
            "ph": "i",
            "name": "CommitSummary",
            "cat": "Summary",
            "ts": ticks_to_us(s.started.ticks()),
            "pid": 0,
            "tid": COMMIT_THREAD,
            "s": "t",
            "args": {
                "commit_index": s.commit_index,
                "render_us": ticks_to_us(s.render_ticks),
                "mutation_us": ticks_to_us(s.mutation_ticks),
                "layout_us": ticks_to_us(s.layout_ticks),
                "placements": s.placements,
                "updates": s.updates,
                "deletions": s.deletions,
                "layout_effects": s.layout_effects,
                "passive_effects": s.passive_effects,
            }
        }),
        RecordedEvent::FiberMutationsCount {
            commit_index,
            count,
        } => json!({
            "ph": "i",
            "name": "FiberMutations",
            "cat": "Rich",
            "ts": 0,
            "pid": 0,
            "tid": COMMIT_THREAD,
            "s": "p",
            "args": {
                "commit_index": commit_index,
                "count": count,
            }
        }),
    }
}

fn task_event(name: &str, t: &RecordedTask) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": "Scheduler",
        "ts": ticks_to_us(t.timestamp.ticks()),
        "pid": 0,
        "tid": SCHEDULER_THREAD,
        "s": "t",
        "args": {
            "task": t.task,
            "kind": format!("{:?}", t.kind),
            "priority": format!("{:?}", t.priority),
        }
    })
}

fn ticks_to_us(ticks: u64) -> f64 {
    ticks as f64 / 1000.0
}

/// A [`TraceSink`] that records events and writes them as a Chrome trace on
/// demand.
#[derive(Debug, Default)]
pub struct ChromeTraceSink {
    recorder: RecorderSink,
}

impl ChromeTraceSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes everything recorded so far as Chrome Trace Event Format JSON.
    pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
        export(self.recorder.as_bytes(), writer)
    }

    /// Returns the underlying recording.
    #[must_use]
    pub fn recorder(&self) -> &RecorderSink {
        &self.recorder
    }
}

impl TraceSink for ChromeTraceSink {
    fn on_update_scheduled(&mut self, e: &UpdateScheduledEvent) {
        self.recorder.on_update_scheduled(e);
    }

    fn on_task_scheduled(&mut self, e: &TaskEvent) {
        self.recorder.on_task_scheduled(e);
    }

    fn on_task_run(&mut self, e: &TaskEvent) {
        self.recorder.on_task_run(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.recorder.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.recorder.on_phase_end(e);
    }

    fn on_render_failed(&mut self, e: &RenderFailedEvent<'_>) {
        self.recorder.on_render_failed(e);
    }

    fn on_commit_summary(&mut self, s: &CommitSummary) {
        self.recorder.on_commit_summary(s);
    }

    fn on_fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        self.recorder.on_fiber_mutations(commit_index, mutations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::time::HostTime;
    use sprig_core::trace::PhaseKind;

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            commit_index: 1,
            phase: PhaseKind::Render,
            timestamp: HostTime(1_000_000),
        });
        rec.on_phase_end(&PhaseEndEvent {
            commit_index: 1,
            phase: PhaseKind::Render,
            timestamp: HostTime(1_002_500),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 2);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "render");
        assert_eq!(parsed[0]["ts"], 1000.0);

        assert_eq!(parsed[1]["ph"], "E");
        assert_eq!(parsed[1]["ts"], 1002.5);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn sink_writes_what_it_recorded() {
        let mut sink = ChromeTraceSink::new();
        sink.on_phase_begin(&PhaseBeginEvent {
            commit_index: 1,
            phase: PhaseKind::Passive,
            timestamp: HostTime(0),
        });
        let mut out = Vec::new();
        sink.write_to(&mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["name"], "passive");
    }
}
