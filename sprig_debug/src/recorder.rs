// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Fiber and task ids are stored as raw numbers. Render failures keep only
//! the error kind, and [`on_fiber_mutations`](TraceSink::on_fiber_mutations)
//! stores only the count.

use sprig_core::error::RenderError;
use sprig_core::scheduler::PriorityLevel;
use sprig_core::time::HostTime;
use sprig_core::trace::{
    CommitSummary, FiberMutation, PhaseBeginEvent, PhaseEndEvent, PhaseKind, RenderFailedEvent,
    TaskEvent, TaskKind, TraceSink, UpdateScheduledEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_UPDATE_SCHEDULED: u8 = 1;
const TAG_TASK_SCHEDULED: u8 = 2;
const TAG_TASK_RUN: u8 = 3;
const TAG_PHASE_BEGIN: u8 = 4;
const TAG_PHASE_END: u8 = 5;
const TAG_RENDER_FAILED: u8 = 6;
const TAG_COMMIT_SUMMARY: u8 = 7;
const TAG_FIBER_MUTATIONS_COUNT: u8 = 8;

/// Kind of a recorded render failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// [`RenderError::UnknownWorkTag`].
    UnknownWorkTag,
    /// [`RenderError::MissingHostParent`].
    MissingHostParent,
    /// [`RenderError::HookMismatch`].
    HookMismatch,
    /// [`RenderError::DuplicateKey`].
    DuplicateKey,
}

impl From<&RenderError> for FailureKind {
    fn from(error: &RenderError) -> Self {
        match error {
            RenderError::UnknownWorkTag { .. } => Self::UnknownWorkTag,
            RenderError::MissingHostParent { .. } => Self::MissingHostParent,
            RenderError::HookMismatch { .. } => Self::HookMismatch,
            RenderError::DuplicateKey { .. } => Self::DuplicateKey,
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Render => 0,
            PhaseKind::Mutation => 1,
            PhaseKind::Layout => 2,
            PhaseKind::Passive => 3,
        });
    }

    fn write_priority(&mut self, p: PriorityLevel) {
        self.write_u8(match p {
            PriorityLevel::Immediate => 0,
            PriorityLevel::UserBlocking => 1,
            PriorityLevel::Normal => 2,
            PriorityLevel::Low => 3,
            PriorityLevel::Idle => 4,
        });
    }

    fn write_task(&mut self, tag: u8, e: &TaskEvent) {
        self.write_u8(tag);
        self.write_u8(match e.kind {
            TaskKind::Render => 0,
            TaskKind::Passive => 1,
        });
        self.write_u64(e.task.get());
        self.write_priority(e.priority);
        self.write_u64(e.timestamp.ticks());
    }
}

impl TraceSink for RecorderSink {
    fn on_update_scheduled(&mut self, e: &UpdateScheduledEvent) {
        self.write_u8(TAG_UPDATE_SCHEDULED);
        self.write_u32(e.fiber.index());
        self.write_u32(e.fiber.generation());
        self.write_u8(u8::from(e.new_task));
        self.write_u64(e.timestamp.ticks());
    }

    fn on_task_scheduled(&mut self, e: &TaskEvent) {
        self.write_task(TAG_TASK_SCHEDULED, e);
    }

    fn on_task_run(&mut self, e: &TaskEvent) {
        self.write_task(TAG_TASK_RUN, e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.commit_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.commit_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_render_failed(&mut self, e: &RenderFailedEvent<'_>) {
        self.write_u8(TAG_RENDER_FAILED);
        self.write_u64(e.commit_index);
        self.write_u8(match FailureKind::from(e.error) {
            FailureKind::UnknownWorkTag => 0,
            FailureKind::MissingHostParent => 1,
            FailureKind::HookMismatch => 2,
            FailureKind::DuplicateKey => 3,
        });
        self.write_u64(e.timestamp.ticks());
    }

    fn on_commit_summary(&mut self, s: &CommitSummary) {
        self.write_u8(TAG_COMMIT_SUMMARY);
        self.write_u64(s.commit_index);
        self.write_u64(s.started.ticks());
        self.write_u64(s.render_ticks);
        self.write_u64(s.mutation_ticks);
        self.write_u64(s.layout_ticks);
        self.write_u32(s.placements);
        self.write_u32(s.updates);
        self.write_u32(s.deletions);
        self.write_u32(s.layout_effects);
        self.write_u32(s.passive_effects);
    }

    fn on_fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        self.write_u8(TAG_FIBER_MUTATIONS_COUNT);
        self.write_u64(commit_index);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "mutation count capped at u32::MAX for recording"
        )]
        self.write_u32(mutations.len().min(u32::MAX as usize) as u32);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A recorded [`TaskEvent`] with its id as a raw number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedTask {
    /// What the task does.
    pub kind: TaskKind,
    /// Raw scheduler id.
    pub task: u64,
    /// Priority it was scheduled at.
    pub priority: PriorityLevel,
    /// Host time of the event.
    pub timestamp: HostTime,
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// An [`UpdateScheduledEvent`].
    UpdateScheduled {
        /// Slot index of the fiber whose state changed.
        fiber_index: u32,
        /// Slot generation of that fiber.
        generation: u32,
        /// Whether a new render task was scheduled.
        new_task: bool,
        /// Host time of the dispatch.
        timestamp: HostTime,
    },
    /// A task was scheduled.
    TaskScheduled(RecordedTask),
    /// A task started running.
    TaskRun(RecordedTask),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`RenderFailedEvent`], reduced to its kind.
    RenderFailed {
        /// Number of the commit that was being produced.
        commit_index: u64,
        /// What went wrong.
        failure: FailureKind,
        /// Host time of the failure.
        timestamp: HostTime,
    },
    /// A [`CommitSummary`].
    CommitSummary(CommitSummary),
    /// Fiber mutation count for a commit.
    FiberMutationsCount {
        /// Commit number.
        commit_index: u64,
        /// Number of fiber mutations.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Render,
            1 => PhaseKind::Mutation,
            2 => PhaseKind::Layout,
            3 => PhaseKind::Passive,
            _ => return None,
        })
    }

    fn read_priority(&mut self) -> Option<PriorityLevel> {
        Some(match self.read_u8()? {
            0 => PriorityLevel::Immediate,
            1 => PriorityLevel::UserBlocking,
            2 => PriorityLevel::Normal,
            3 => PriorityLevel::Low,
            4 => PriorityLevel::Idle,
            _ => return None,
        })
    }

    fn read_failure(&mut self) -> Option<FailureKind> {
        Some(match self.read_u8()? {
            0 => FailureKind::UnknownWorkTag,
            1 => FailureKind::MissingHostParent,
            2 => FailureKind::HookMismatch,
            3 => FailureKind::DuplicateKey,
            _ => return None,
        })
    }

    fn read_task(&mut self) -> Option<RecordedTask> {
        let kind = match self.read_u8()? {
            0 => TaskKind::Render,
            1 => TaskKind::Passive,
            _ => return None,
        };
        Some(RecordedTask {
            kind,
            task: self.read_u64()?,
            priority: self.read_priority()?,
            timestamp: self.read_time()?,
        })
    }

    fn decode_update_scheduled(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::UpdateScheduled {
            fiber_index: self.read_u32()?,
            generation: self.read_u32()?,
            new_task: self.read_u8()? != 0,
            timestamp: self.read_time()?,
        })
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            commit_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            commit_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_render_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RenderFailed {
            commit_index: self.read_u64()?,
            failure: self.read_failure()?,
            timestamp: self.read_time()?,
        })
    }

    fn decode_commit_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CommitSummary(CommitSummary {
            commit_index: self.read_u64()?,
            started: self.read_time()?,
            render_ticks: self.read_u64()?,
            mutation_ticks: self.read_u64()?,
            layout_ticks: self.read_u64()?,
            placements: self.read_u32()?,
            updates: self.read_u32()?,
            deletions: self.read_u32()?,
            layout_effects: self.read_u32()?,
            passive_effects: self.read_u32()?,
        }))
    }

    fn decode_fiber_mutations_count(&mut self) -> Option<RecordedEvent> {
        let commit_index = self.read_u64()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::FiberMutationsCount {
            commit_index,
            count,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_UPDATE_SCHEDULED => self.decode_update_scheduled(),
            TAG_TASK_SCHEDULED => self.read_task().map(RecordedEvent::TaskScheduled),
            TAG_TASK_RUN => self.read_task().map(RecordedEvent::TaskRun),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_RENDER_FAILED => self.decode_render_failed(),
            TAG_COMMIT_SUMMARY => self.decode_commit_summary(),
            TAG_FIBER_MUTATIONS_COUNT => self.decode_fiber_mutations_count(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use sprig_core::trace::MutationKind;

    use super::*;

    fn sample_summary() -> CommitSummary {
        CommitSummary {
            commit_index: 7,
            started: HostTime(1_000_000),
            render_ticks: 1_500,
            mutation_ticks: 200,
            layout_ticks: 50,
            placements: 3,
            updates: 1,
            deletions: 2,
            layout_effects: 1,
            passive_effects: 4,
        }
    }

    #[test]
    fn phases_and_summary_decode_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            commit_index: 7,
            phase: PhaseKind::Layout,
            timestamp: HostTime(100),
        });
        rec.on_phase_end(&PhaseEndEvent {
            commit_index: 7,
            phase: PhaseKind::Layout,
            timestamp: HostTime(150),
        });
        rec.on_commit_summary(&sample_summary());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 3);
        match &events[0] {
            RecordedEvent::PhaseBegin(e) => {
                assert_eq!(e.commit_index, 7);
                assert_eq!(e.phase, PhaseKind::Layout);
                assert_eq!(e.timestamp, HostTime(100));
            }
            other => panic!("expected PhaseBegin, got {other:?}"),
        }
        assert!(matches!(
            &events[1],
            RecordedEvent::PhaseEnd(e) if e.timestamp == HostTime(150)
        ));
        match &events[2] {
            RecordedEvent::CommitSummary(s) => {
                assert_eq!(s.render_ticks, 1_500);
                assert_eq!(s.deletions, 2);
                assert_eq!(s.passive_effects, 4);
            }
            other => panic!("expected CommitSummary, got {other:?}"),
        }
    }

    #[test]
    fn mutations_store_only_the_count() {
        let mut rec = RecorderSink::new();
        let mutations = [
            FiberMutation {
                fiber_index: 1,
                kind: MutationKind::Placement,
            },
            FiberMutation {
                fiber_index: 2,
                kind: MutationKind::Deletion,
            },
        ];
        rec.on_fiber_mutations(3, &mutations);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert!(matches!(
            events[..],
            [RecordedEvent::FiberMutationsCount {
                commit_index: 3,
                count: 2
            }]
        ));
    }

    #[test]
    fn truncated_recording_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_commit_summary(&sample_summary());
        rec.on_commit_summary(&sample_summary());
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];
        assert_eq!(decode(cut).count(), 1);
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        let bytes = [0xFF, 0, 0, 0];
        assert_eq!(decode(&bytes).count(), 0);
    }
}
