// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber reconciler, hooks engine and cooperative scheduler.
//!
//! `sprig_core` keeps a declarative description of a UI tree in sync with a
//! host presentation tree. Components describe what they want as [`Node`]
//! trees; the reconciler diffs each new description against the committed
//! one and applies the smallest set of host mutations. It is `no_std`
//! compatible (with `alloc`) and stores fibers in struct-of-arrays form with
//! generational handles.
//!
//! # Architecture
//!
//! ```text
//!   Root::render / Dispatch::dispatch
//!       │
//!       ▼
//!   Scheduler (priority queue, time slices)
//!       │ render task
//!       ▼
//!   WorkLoop: begin ──► ChildReconciler ──► complete     (render phase)
//!       │ finished work-in-progress tree
//!       ▼
//!   commit: deletions ──► placements ──► updates ──► HostTree
//!       │
//!       ▼
//!   layout effects (sync) ──► passive effects (next task)
//! ```
//!
//! **[`element`]**: Nodes, elements, props, and component definitions.
//!
//! **[`fiber`]**: Struct-of-arrays fiber arena with generational
//! [`FiberId`](fiber::FiberId) handles and double-buffered alternates.
//!
//! **[`hooks`]**: The per-render [`Hooks`](hooks::Hooks) context with state,
//! reducer, memo, ref, context and effect hooks.
//!
//! **[`context`]**: Context objects and the value stack the render phase
//! pushes and pops at providers.
//!
//! **[`scheduler`]**: Cooperative priority scheduler driven by a
//! [`SchedulerHost`](scheduler::SchedulerHost), plus a deterministic
//! [`ManualHost`](scheduler::ManualHost) for tests.
//!
//! **[`host`]**: The [`HostTree`](host::HostTree) contract renderers implement.
//!
//! **[`root`]**: [`Root`](root::Root), which ties a tree, a host and a
//! scheduler together.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! render and commit instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-fiber
//!   mutation events.
//!
//! [`Node`]: element::Node

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod context;
pub mod element;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod host;
pub mod root;
pub mod scheduler;
pub mod time;
pub mod trace;

mod reconcile;
mod work;

#[cfg(test)]
mod testing;
