// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applying a finished work-in-progress tree to the host.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::mem;

use crate::error::RenderError;
use crate::fiber::{FiberTag, FiberTree, Flags, INVALID, for_each_in_subtree};
use crate::hooks::{Effect, EffectList, EffectTag, run_effects};
use crate::host::{HostHandle, HostTree};

/// What one commit did to the host tree, by raw fiber slot.
///
/// Slots in [`deletions`](Self::deletions) are already released when this is
/// returned; use the other lists with the `*_at` accessors of
/// [`FiberTree`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitChanges {
    /// Fibers whose host nodes were inserted or moved, in commit order.
    pub placements: Vec<u32>,
    /// Host fibers whose props or text were updated.
    pub updates: Vec<u32>,
    /// Roots of removed subtrees.
    pub deletions: Vec<u32>,
    /// Layout effect creators that ran.
    pub layout_effects: u32,
    /// Passive effect creators queued.
    pub passive_effects: u32,
}

impl CommitChanges {
    /// Returns whether the commit left the host tree untouched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty() && self.updates.is_empty() && self.deletions.is_empty()
    }
}

/// Passive effect work produced by one commit.
#[derive(Debug, Default)]
pub(crate) struct PendingPassive {
    /// Effects of removed fibers; only their cleanups run.
    pub(crate) unmount: Vec<Rc<Effect>>,
    /// Effects that fire.
    pub(crate) mount: EffectList,
}

impl PendingPassive {
    pub(crate) fn is_empty(&self) -> bool {
        self.unmount.is_empty() && self.mount.is_empty()
    }

    /// Runs all unmount cleanups, then the cleanups and creators of firing
    /// effects.
    pub(crate) fn flush(self) {
        for effect in &self.unmount {
            effect.run_destroy();
        }
        run_effects(&self.mount);
    }
}

/// The result of [`commit_root`].
#[derive(Debug, Default)]
pub(crate) struct Committed {
    pub(crate) changes: CommitChanges,
    /// Layout effects of removed fibers; only their cleanups run.
    pub(crate) layout_unmount: Vec<Rc<Effect>>,
    /// Layout effects that fire, in commit order.
    pub(crate) layout: EffectList,
    pub(crate) passive: PendingPassive,
}

/// Runs the mutation phase for the finished tree rooted at `root`.
///
/// Deletions, placements and updates reach the host; every flag in the tree
/// is cleared; removed subtrees are released. No user code runs here: the
/// effects to run are returned.
pub(crate) fn commit_root(
    tree: &mut FiberTree,
    host: &mut dyn HostTree,
    root: u32,
) -> Result<Committed, RenderError> {
    let mut committer = Committer {
        tree,
        host,
        out: Committed::default(),
    };
    committer.commit_mutations(root)?;
    Ok(committer.out)
}

struct Committer<'a> {
    tree: &'a mut FiberTree,
    host: &'a mut dyn HostTree,
    out: Committed,
}

impl Committer<'_> {
    /// Children first, then the fiber's own placement and update.
    fn commit_mutations(&mut self, fiber: u32) -> Result<(), RenderError> {
        let f = fiber as usize;
        let deletions = mem::take(&mut self.tree.deletions[f]);
        for deleted in deletions {
            self.commit_deletion(fiber, deleted)?;
        }

        let mut child = self.tree.child[f];
        while child != INVALID {
            self.commit_mutations(child)?;
            child = self.tree.sibling[child as usize];
        }

        let flags = self.tree.flags[f];
        if flags.contains(Flags::PLACEMENT) {
            self.commit_placement(fiber)?;
            self.out.changes.placements.push(fiber);
        }
        if flags.contains(Flags::UPDATE) {
            self.commit_update(fiber);
            self.out.changes.updates.push(fiber);
        }
        if flags.intersects(Flags::LAYOUT | Flags::PASSIVE) {
            self.collect_effects(fiber);
        }
        self.tree.flags[f] = Flags::NONE;
        Ok(())
    }

    // -- Deletion --

    fn commit_deletion(&mut self, parent: u32, deleted: u32) -> Result<(), RenderError> {
        let host_parent = self.host_parent(parent, deleted)?;
        self.remove_host_nodes(host_parent, deleted);

        let mut doomed = Vec::new();
        for_each_in_subtree(self.tree, deleted, |idx| doomed.push(idx));
        for idx in doomed {
            for effect in &self.tree.update_queue[idx as usize] {
                match effect.tag {
                    EffectTag::Layout => self.out.layout_unmount.push(effect.clone()),
                    EffectTag::Passive => self.out.passive.unmount.push(effect.clone()),
                }
            }
        }

        self.tree.release_subtree(deleted);
        self.out.changes.deletions.push(deleted);
        Ok(())
    }

    /// Removes the top-level host nodes of the subtree at `fiber`.
    fn remove_host_nodes(&mut self, host_parent: HostHandle, fiber: u32) {
        let f = fiber as usize;
        if self.tree.tag[f].is_host() {
            if let Some(handle) = self.tree.state_node[f].host_handle() {
                self.host.remove_child(host_parent, handle);
            }
            return;
        }
        let mut child = self.tree.child[f];
        while child != INVALID {
            self.remove_host_nodes(host_parent, child);
            child = self.tree.sibling[child as usize];
        }
    }

    // -- Placement --

    fn commit_placement(&mut self, fiber: u32) -> Result<(), RenderError> {
        let parent = self.tree.parent[fiber as usize];
        let host_parent = self.host_parent(parent, fiber)?;
        let before = self.host_sibling(fiber);
        self.insert_or_append(fiber, before, host_parent);
        Ok(())
    }

    /// Host node of the nearest host-parent fiber at or above `from`.
    fn host_parent(&self, from: u32, placing: u32) -> Result<HostHandle, RenderError> {
        let mut node = from;
        while node != INVALID {
            let n = node as usize;
            if self.tree.tag[n].is_host_parent() {
                return self.tree.state_node[n]
                    .host_handle()
                    .ok_or_else(|| self.missing(placing));
            }
            node = self.tree.parent[n];
        }
        Err(self.missing(placing))
    }

    fn missing(&self, fiber: u32) -> RenderError {
        RenderError::MissingHostParent {
            fiber: self.tree.id_at(fiber),
        }
    }

    /// The host node of the first following fiber that is already in place,
    /// searching siblings and their descendants without crossing the host
    /// parent.
    fn host_sibling(&self, fiber: u32) -> Option<HostHandle> {
        let tree = &*self.tree;
        let mut node = fiber;
        'siblings: loop {
            while tree.sibling[node as usize] == INVALID {
                let parent = tree.parent[node as usize];
                if parent == INVALID || tree.tag[parent as usize].is_host_parent() {
                    return None;
                }
                node = parent;
            }
            node = tree.sibling[node as usize];
            while !tree.tag[node as usize].is_host() {
                // A placed subtree is not in the host tree yet.
                if tree.flags[node as usize].contains(Flags::PLACEMENT) {
                    continue 'siblings;
                }
                let child = tree.child[node as usize];
                if child == INVALID {
                    continue 'siblings;
                }
                node = child;
            }
            if !tree.flags[node as usize].contains(Flags::PLACEMENT) {
                return tree.state_node[node as usize].host_handle();
            }
        }
    }

    fn insert_or_append(&mut self, fiber: u32, before: Option<HostHandle>, parent: HostHandle) {
        let f = fiber as usize;
        if self.tree.tag[f].is_host() {
            if let Some(handle) = self.tree.state_node[f].host_handle() {
                match before {
                    Some(before) => self.host.insert_before(parent, handle, before),
                    None => self.host.append_child(parent, handle),
                }
            }
            return;
        }
        let mut child = self.tree.child[f];
        while child != INVALID {
            self.insert_or_append(child, before, parent);
            child = self.tree.sibling[child as usize];
        }
    }

    // -- Update --

    fn commit_update(&mut self, fiber: u32) {
        let f = fiber as usize;
        let Some(handle) = self.tree.state_node[f].host_handle() else {
            return;
        };
        let current = self.tree.alternate[f];
        let prev = (current != INVALID)
            .then(|| self.tree.memoized_props[current as usize].as_ref())
            .flatten();
        let Some(next) = self.tree.memoized_props[f].as_ref() else {
            return;
        };
        match self.tree.tag[f] {
            FiberTag::HostText => {
                let old = prev.and_then(|p| p.text_content()).unwrap_or_default();
                let new = next.text_content().unwrap_or_default();
                self.host.commit_text_update(handle, old, new);
            }
            _ => self.host.commit_props_update(handle, prev, next),
        }
    }

    // -- Effects --

    fn collect_effects(&mut self, fiber: u32) {
        for effect in &self.tree.update_queue[fiber as usize] {
            if !effect.fire {
                continue;
            }
            match effect.tag {
                EffectTag::Layout => {
                    self.out.changes.layout_effects += 1;
                    self.out.layout.push(effect.clone());
                }
                EffectTag::Passive => {
                    self.out.changes.passive_effects += 1;
                    self.out.passive.mount.push(effect.clone());
                }
            }
        }
    }
}
