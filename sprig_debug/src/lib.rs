// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for sprig
//! diagnostics.
//!
//! This crate provides [`TraceSink`](sprig_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from
//!   recorded bytes; [`chrome::ChromeTraceSink`] records and exports in one.
//! - [`shared::SharedSink`] and [`shared::Tee`]: keep a handle on a sink
//!   after installing it on a root, or feed two sinks at once.

pub mod chrome;
pub mod pretty;
pub mod recorder;
pub mod shared;
