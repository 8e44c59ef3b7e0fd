// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render and commit phases.
//!
//! A render pass clones the current root into its work-in-progress twin and
//! walks the new tree depth first. `begin_work` computes a fiber's children
//! (running components and the child reconciler) and returns the first one to
//! descend into. When a fiber has no children left to visit, `complete_work`
//! finalizes it (materializing detached host nodes, diffing host props,
//! popping contexts) and the walk moves on to its sibling or back up to its
//! parent. The pass ends when it completes the root. Nothing reaches the host
//! tree's live nodes during render.
//!
//! [`commit_root`] then applies the staged flags to the host tree. The caller
//! swaps the root pointer and runs the returned effect lists.

mod begin;
mod commit;
mod complete;

pub use commit::CommitChanges;
pub(crate) use commit::{Committed, PendingPassive, commit_root};

use crate::context::ContextStack;
use crate::element::{Node, Props};
use crate::error::RenderError;
use crate::fiber::{FiberTree, INVALID, MemoizedState};
use crate::hooks::Updater;
use crate::host::HostTree;

/// One render pass over one root.
///
/// Owns the context stack for the pass and borrows the arena and host.
pub(crate) struct WorkLoop<'a> {
    tree: &'a mut FiberTree,
    host: &'a mut dyn HostTree,
    contexts: ContextStack,
    updater: &'a Updater,
}

impl core::fmt::Debug for WorkLoop<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkLoop")
            .field("tree", &self.tree)
            .field("contexts", &self.contexts)
            .finish_non_exhaustive()
    }
}

impl<'a> WorkLoop<'a> {
    pub(crate) fn new(
        tree: &'a mut FiberTree,
        host: &'a mut dyn HostTree,
        updater: &'a Updater,
    ) -> Self {
        Self {
            tree,
            host,
            contexts: ContextStack::new(),
            updater,
        }
    }

    /// Builds the work-in-progress tree for `current_root` and returns its
    /// root slot.
    ///
    /// `element`, when given, replaces what the root renders.
    pub(crate) fn render_root(
        &mut self,
        current_root: u32,
        element: Option<Node>,
    ) -> Result<u32, RenderError> {
        let root = self.tree.work_in_progress_at(current_root, Props::new());
        if let Some(element) = element {
            self.tree.memoized_state[root as usize] = MemoizedState::Root(element);
        }
        let mut next = root;
        while next != INVALID {
            next = self.perform_unit_of_work(root, next)?;
        }
        debug_assert_eq!(self.contexts.depth(), 0, "providers left pushed");
        Ok(root)
    }

    fn perform_unit_of_work(&mut self, root: u32, unit: u32) -> Result<u32, RenderError> {
        let next = self.begin_work(unit)?;
        let u = unit as usize;
        self.tree.memoized_props[u] = Some(self.tree.pending_props[u].clone());
        if next != INVALID {
            return Ok(next);
        }
        self.complete_unit_of_work(root, unit)
    }

    /// Completes `unit` and every ancestor whose children are all done, and
    /// returns the next fiber to begin.
    fn complete_unit_of_work(&mut self, root: u32, unit: u32) -> Result<u32, RenderError> {
        let mut node = unit;
        loop {
            self.complete_work(node)?;
            if node == root {
                return Ok(INVALID);
            }
            let sibling = self.tree.sibling[node as usize];
            if sibling != INVALID {
                return Ok(sibling);
            }
            node = self.tree.parent[node as usize];
        }
    }
}
