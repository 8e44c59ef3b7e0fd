// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fiber arena.
//!
//! Every position in a rendered tree is a *fiber*. Fibers live in a
//! struct-of-arrays [`FiberTree`] and are addressed by generational
//! [`FiberId`] handles; links between them (`parent`, `child`, `sibling`,
//! `alternate`) are raw slot indices with [`INVALID`] for "none".
//!
//! # Double buffering
//!
//! A committed ("current") fiber and the fiber being rendered for the same
//! position ("work in progress") point at each other through `alternate`.
//! [`FiberTree::create_work_in_progress`] reuses the alternate slot when one
//! exists, so a stable subtree flips between two slots instead of allocating
//! on every render. The root fiber pair is swapped as a whole at commit.

mod flags;
mod id;
mod store;
mod traverse;

pub use flags::{FiberTag, Flags};
pub use id::{FiberId, INVALID};
pub use store::FiberTree;
pub use traverse::Children;

pub(crate) use store::{MemoizedState, StateNode};
pub(crate) use traverse::for_each_in_subtree;
