// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child reconciliation.
//!
//! Given a parent fiber in the work-in-progress tree, the first child of its
//! current twin and a new child descriptor, produce the new child chain.
//! Fibers are reused (cloned into their alternate slot) when key and type
//! match; otherwise fresh fibers are created. With side-effect tracking on,
//! new or moved fibers get [`Flags::PLACEMENT`] and abandoned ones are staged
//! in the parent's deletion list.
//!
//! Lists are diffed in three steps:
//!
//! 1. a lock-step pass pairing old and new children by position while keys
//!    agree;
//! 2. when either side runs out, deleting or creating the rest;
//! 3. otherwise, a map pass matching the remaining new children against the
//!    remaining old ones by key (or by index when unkeyed).
//!
//! Moves are detected with a running `last_placed_index`: a reused fiber
//! whose old index is lower than the highest old index already kept in place
//! must move, everything else stays.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::rc::Rc;

use crate::element::{Element, ElementType, Key, Node, Props};
use crate::error::RenderError;
use crate::fiber::{FiberTag, FiberTree, Flags, INVALID};

/// Where an unmatched old child is filed during the map pass.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum ChildSlot {
    Keyed(Key),
    Indexed(u32),
}

impl ChildSlot {
    fn of(key: Option<&Key>, index: u32) -> Self {
        key.map_or(Self::Indexed(index), |k| Self::Keyed(k.clone()))
    }
}

/// Returns the text of a descriptor that renders as a text node.
fn as_text(node: &Node) -> Option<&Rc<str>> {
    match node {
        Node::Text(text) if !text.is_empty() => Some(text),
        _ => None,
    }
}

/// The new child chain, built left to right.
struct Chain {
    first: u32,
    last: u32,
}

impl Default for Chain {
    fn default() -> Self {
        Self {
            first: INVALID,
            last: INVALID,
        }
    }
}

impl Chain {
    fn push(&mut self, tree: &mut FiberTree, fiber: u32) {
        if self.last == INVALID {
            self.first = fiber;
        } else {
            tree.sibling[self.last as usize] = fiber;
        }
        self.last = fiber;
    }
}

fn slot_index(i: usize) -> u32 {
    u32::try_from(i).unwrap_or(INVALID - 1)
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ChildReconciler {
    track_side_effects: bool,
}

impl ChildReconciler {
    /// For parents with no current twin: no comparisons, no flags.
    pub(crate) const MOUNT: Self = Self {
        track_side_effects: false,
    };

    /// For parents with a current twin.
    pub(crate) const UPDATE: Self = Self {
        track_side_effects: true,
    };

    /// Reconciles `children` under `parent` and returns the new first child
    /// (or [`INVALID`]). The caller stores it as the parent's child link.
    pub(crate) fn reconcile(
        self,
        tree: &mut FiberTree,
        parent: u32,
        current_first: u32,
        children: &Node,
    ) -> Result<u32, RenderError> {
        // An unkeyed fragment at the top is the same as its children.
        let children = match children {
            Node::Element(el) if el.key.is_none() && matches!(el.ty, ElementType::Fragment) => {
                el.props.children()
            }
            other => other,
        };

        if let Some(text) = as_text(children) {
            let fiber = self.reconcile_single_text(tree, parent, current_first, text);
            return Ok(self.place_single_child(tree, fiber));
        }
        match children {
            Node::Element(el) => {
                let fiber = self.reconcile_single_element(tree, parent, current_first, el);
                Ok(self.place_single_child(tree, fiber))
            }
            Node::List(items) => self.reconcile_children_array(tree, parent, current_first, items),
            Node::Empty | Node::Text(_) => {
                self.delete_remaining_children(tree, parent, current_first);
                Ok(INVALID)
            }
        }
    }

    // -- Deletion --

    fn delete_child(self, tree: &mut FiberTree, parent: u32, child: u32) {
        if !self.track_side_effects {
            return;
        }
        tree.deletions[parent as usize].push(child);
        tree.flags[parent as usize].insert(Flags::CHILD_DELETION);
    }

    fn delete_remaining_children(self, tree: &mut FiberTree, parent: u32, first: u32) {
        if !self.track_side_effects {
            return;
        }
        let mut child = first;
        while child != INVALID {
            self.delete_child(tree, parent, child);
            child = tree.sibling[child as usize];
        }
    }

    // -- Placement --

    fn place_single_child(self, tree: &mut FiberTree, fiber: u32) -> u32 {
        if self.track_side_effects && tree.alternate[fiber as usize] == INVALID {
            tree.flags[fiber as usize].insert(Flags::PLACEMENT);
        }
        fiber
    }

    fn place_child(self, tree: &mut FiberTree, fiber: u32, last_placed_index: u32, new_index: u32) -> u32 {
        let f = fiber as usize;
        tree.index[f] = new_index;
        if !self.track_side_effects {
            return last_placed_index;
        }
        let current = tree.alternate[f];
        if current == INVALID {
            tree.flags[f].insert(Flags::PLACEMENT);
            return last_placed_index;
        }
        let old_index = tree.index[current as usize];
        if old_index < last_placed_index {
            // Moved backwards relative to what stays in place.
            tree.flags[f].insert(Flags::PLACEMENT);
            last_placed_index
        } else {
            old_index
        }
    }

    // -- Single child --

    fn reconcile_single_text(
        self,
        tree: &mut FiberTree,
        parent: u32,
        current_first: u32,
        text: &Rc<str>,
    ) -> u32 {
        let mut child = current_first;
        while child != INVALID {
            let c = child as usize;
            if tree.key[c].is_none() && tree.tag[c] == FiberTag::HostText {
                let rest = tree.sibling[c];
                self.delete_remaining_children(tree, parent, rest);
                return use_fiber(tree, parent, child, Props::text(text.clone()));
            }
            self.delete_child(tree, parent, child);
            child = tree.sibling[c];
        }
        let fiber = tree.create_fiber_from_text(text.clone()).idx;
        tree.parent[fiber as usize] = parent;
        fiber
    }

    fn reconcile_single_element(
        self,
        tree: &mut FiberTree,
        parent: u32,
        current_first: u32,
        element: &Element,
    ) -> u32 {
        let mut child = current_first;
        while child != INVALID {
            let c = child as usize;
            if tree.key[c] == element.key {
                if same_type(tree, child, &element.ty) {
                    let rest = tree.sibling[c];
                    self.delete_remaining_children(tree, parent, rest);
                    return use_fiber(tree, parent, child, element.props.clone());
                }
                self.delete_remaining_children(tree, parent, child);
                break;
            }
            self.delete_child(tree, parent, child);
            child = tree.sibling[c];
        }
        let fiber = tree.create_fiber_from_element(element).idx;
        tree.parent[fiber as usize] = parent;
        fiber
    }

    // -- Lists --

    fn reconcile_children_array(
        self,
        tree: &mut FiberTree,
        parent: u32,
        current_first: u32,
        children: &[Node],
    ) -> Result<u32, RenderError> {
        check_unique_keys(tree, parent, children)?;

        let mut chain = Chain::default();

        let mut old = current_first;
        let mut last_placed_index = 0;
        let mut new_idx = 0;

        // Lock-step pass.
        while old != INVALID && new_idx < children.len() {
            let new_index = slot_index(new_idx);
            let next_old;
            if tree.index[old as usize] > new_index {
                // The old child sits further right: there was a hole here.
                next_old = old;
                old = INVALID;
            } else {
                next_old = tree.sibling[old as usize];
            }
            let Some(fiber) = self.update_slot(tree, parent, old, &children[new_idx]) else {
                if old == INVALID {
                    old = next_old;
                }
                break;
            };
            if self.track_side_effects && old != INVALID && tree.alternate[fiber as usize] == INVALID {
                // Same slot, different type: the old fiber goes away.
                self.delete_child(tree, parent, old);
            }
            last_placed_index = self.place_child(tree, fiber, last_placed_index, new_index);
            chain.push(tree, fiber);
            old = next_old;
            new_idx += 1;
        }

        if new_idx == children.len() {
            self.delete_remaining_children(tree, parent, old);
            return Ok(chain.first);
        }

        if old == INVALID {
            for (i, node) in children.iter().enumerate().skip(new_idx) {
                if let Some(fiber) = self.create_child(tree, parent, node) {
                    last_placed_index = self.place_child(tree, fiber, last_placed_index, slot_index(i));
                    chain.push(tree, fiber);
                }
            }
            return Ok(chain.first);
        }

        // Map pass over what is left on both sides.
        let mut existing = BTreeMap::new();
        let mut child = old;
        while child != INVALID {
            let c = child as usize;
            existing.insert(ChildSlot::of(tree.key[c].as_ref(), tree.index[c]), child);
            child = tree.sibling[c];
        }

        for (i, node) in children.iter().enumerate().skip(new_idx) {
            let new_index = slot_index(i);
            let Some(fiber) = update_from_map(tree, &existing, parent, new_index, node) else {
                continue;
            };
            if self.track_side_effects && tree.alternate[fiber as usize] != INVALID {
                existing.remove(&ChildSlot::of(tree.key[fiber as usize].as_ref(), new_index));
            }
            last_placed_index = self.place_child(tree, fiber, last_placed_index, new_index);
            chain.push(tree, fiber);
        }

        if self.track_side_effects {
            for leftover in existing.into_values() {
                self.delete_child(tree, parent, leftover);
            }
        }
        Ok(chain.first)
    }

    /// Reuses `old` for `node` if their keys agree, `None` otherwise.
    ///
    /// `old` may be [`INVALID`], meaning an empty slot.
    fn update_slot(self, tree: &mut FiberTree, parent: u32, old: u32, node: &Node) -> Option<u32> {
        let old_key = if old == INVALID {
            None
        } else {
            tree.key[old as usize].clone()
        };
        if let Some(text) = as_text(node) {
            // Text has no key; it only pairs with an unkeyed slot.
            return old_key
                .is_none()
                .then(|| update_text_node(tree, parent, old, text));
        }
        match node {
            Node::Element(el) => (el.key == old_key).then(|| update_element(tree, parent, old, el)),
            Node::List(_) => old_key
                .is_none()
                .then(|| update_fragment(tree, parent, old, node, None)),
            Node::Empty | Node::Text(_) => None,
        }
    }

    fn create_child(self, tree: &mut FiberTree, parent: u32, node: &Node) -> Option<u32> {
        let fiber = if let Some(text) = as_text(node) {
            tree.create_fiber_from_text(text.clone())
        } else {
            match node {
                Node::Element(el) => tree.create_fiber_from_element(el),
                Node::List(_) => tree.create_fiber_from_fragment(node.clone(), None),
                Node::Empty | Node::Text(_) => return None,
            }
        };
        tree.parent[fiber.idx as usize] = parent;
        Some(fiber.idx)
    }
}

fn update_from_map(
    tree: &mut FiberTree,
    existing: &BTreeMap<ChildSlot, u32>,
    parent: u32,
    new_index: u32,
    node: &Node,
) -> Option<u32> {
    let by_index = || existing.get(&ChildSlot::Indexed(new_index)).copied().unwrap_or(INVALID);
    if let Some(text) = as_text(node) {
        let old = by_index();
        return Some(update_text_node(tree, parent, old, text));
    }
    match node {
        Node::Element(el) => {
            let old = existing
                .get(&ChildSlot::of(el.key.as_ref(), new_index))
                .copied()
                .unwrap_or(INVALID);
            Some(update_element(tree, parent, old, el))
        }
        Node::List(_) => {
            let old = by_index();
            Some(update_fragment(tree, parent, old, node, None))
        }
        Node::Empty | Node::Text(_) => None,
    }
}

fn check_unique_keys(tree: &FiberTree, parent: u32, children: &[Node]) -> Result<(), RenderError> {
    let mut seen = BTreeSet::new();
    for child in children {
        if let Node::Element(Element { key: Some(key), .. }) = child
            && !seen.insert(key)
        {
            return Err(RenderError::DuplicateKey {
                parent: tree.id_at(parent),
                key: key.clone(),
            });
        }
    }
    Ok(())
}

fn same_type(tree: &FiberTree, fiber: u32, ty: &ElementType) -> bool {
    tree.element_type[fiber as usize]
        .as_ref()
        .is_some_and(|existing| existing.same_type(ty))
}

/// Clones `fiber` into its work-in-progress twin as an only child.
fn use_fiber(tree: &mut FiberTree, parent: u32, fiber: u32, props: Props) -> u32 {
    let wip = tree.work_in_progress_at(fiber, props);
    let w = wip as usize;
    tree.index[w] = 0;
    tree.sibling[w] = INVALID;
    tree.parent[w] = parent;
    wip
}

fn update_text_node(tree: &mut FiberTree, parent: u32, current: u32, text: &Rc<str>) -> u32 {
    if current == INVALID || tree.tag[current as usize] != FiberTag::HostText {
        let fiber = tree.create_fiber_from_text(text.clone()).idx;
        tree.parent[fiber as usize] = parent;
        return fiber;
    }
    use_fiber(tree, parent, current, Props::text(text.clone()))
}

fn update_element(tree: &mut FiberTree, parent: u32, current: u32, element: &Element) -> u32 {
    if current != INVALID && same_type(tree, current, &element.ty) {
        return use_fiber(tree, parent, current, element.props.clone());
    }
    let fiber = tree.create_fiber_from_element(element).idx;
    tree.parent[fiber as usize] = parent;
    fiber
}

fn update_fragment(
    tree: &mut FiberTree,
    parent: u32,
    current: u32,
    children: &Node,
    key: Option<Key>,
) -> u32 {
    if current == INVALID || tree.tag[current as usize] != FiberTag::Fragment {
        let fiber = tree.create_fiber_from_fragment(children.clone(), key).idx;
        tree.parent[fiber as usize] = parent;
        return fiber;
    }
    use_fiber(tree, parent, current, Props::new().with_children(children.clone()))
}
