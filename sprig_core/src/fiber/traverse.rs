// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{FiberId, INVALID};
use super::store::FiberTree;

/// An iterator over the direct children of a fiber, in sibling order.
///
/// Created by [`FiberTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a FiberTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a FiberTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.sibling[idx as usize];
        Some(FiberId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }
}

/// Depth-first pre-order walk of the subtree rooted at `root`, including
/// `root`, without following `root`'s siblings.
pub(crate) fn for_each_in_subtree(tree: &FiberTree, root: u32, mut f: impl FnMut(u32)) {
    let mut node = root;
    loop {
        f(node);
        let child = tree.child[node as usize];
        if child != INVALID {
            node = child;
            continue;
        }
        loop {
            if node == root {
                return;
            }
            let sibling = tree.sibling[node as usize];
            if sibling != INVALID {
                node = sibling;
                break;
            }
            node = tree.parent[node as usize];
        }
    }
}
