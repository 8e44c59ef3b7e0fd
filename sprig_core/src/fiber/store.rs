// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays fiber storage with allocation, cloning and release.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use super::flags::{FiberTag, Flags};
use super::id::{FiberId, INVALID};
use super::traverse::{Children, for_each_in_subtree};
use crate::element::{Component, Element, ElementType, Key, Node, Props};
use crate::hooks::{EffectList, Hook};
use crate::host::HostHandle;

/// What a fiber owns outside the arena.
#[derive(Clone, Default)]
pub(crate) enum StateNode {
    #[default]
    None,
    /// Host node of a host component or text fiber.
    Host(HostHandle),
    /// Container of a root fiber.
    Container(HostHandle),
    /// Instance of a class component, from its latest render.
    Instance(Rc<dyn Component>),
}

impl StateNode {
    pub(crate) fn host_handle(&self) -> Option<HostHandle> {
        match self {
            Self::Host(handle) | Self::Container(handle) => Some(*handle),
            Self::None | Self::Instance(_) => None,
        }
    }
}

/// Render payload carried between generations.
#[derive(Clone, Debug, Default)]
pub(crate) enum MemoizedState {
    #[default]
    None,
    /// What a root renders.
    Root(Node),
    /// A function component's hook list.
    Hooks(Vec<Hook>),
}

/// Struct-of-arrays storage for all fibers of one root.
///
/// Fibers are addressed by [`FiberId`] handles. Released fibers are recycled
/// through a free list, and generation counters make stale handles fail
/// validation.
pub struct FiberTree {
    // -- Identity --
    pub(crate) tag: Vec<FiberTag>,
    pub(crate) key: Vec<Option<Key>>,
    pub(crate) element_type: Vec<Option<ElementType>>,
    pub(crate) state_node: Vec<StateNode>,

    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) child: Vec<u32>,
    pub(crate) sibling: Vec<u32>,
    pub(crate) index: Vec<u32>,

    // -- Render state --
    pub(crate) pending_props: Vec<Props>,
    pub(crate) memoized_props: Vec<Option<Props>>,
    pub(crate) memoized_state: Vec<MemoizedState>,
    pub(crate) update_queue: Vec<EffectList>,

    // -- Side effects --
    pub(crate) flags: Vec<Flags>,
    pub(crate) deletions: Vec<Vec<u32>>,

    // -- Double buffering --
    pub(crate) alternate: Vec<u32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

impl fmt::Debug for FiberTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiberTree")
            .field("slots", &self.len)
            .field("free", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl Default for FiberTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FiberTree {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tag: Vec::new(),
            key: Vec::new(),
            element_type: Vec::new(),
            state_node: Vec::new(),
            parent: Vec::new(),
            child: Vec::new(),
            sibling: Vec::new(),
            index: Vec::new(),
            pending_props: Vec::new(),
            memoized_props: Vec::new(),
            memoized_state: Vec::new(),
            update_queue: Vec::new(),
            flags: Vec::new(),
            deletions: Vec::new(),
            alternate: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    // -- Allocation API --

    fn alloc(&mut self, tag: FiberTag, key: Option<Key>, pending_props: Props) -> u32 {
        if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot; `release` already cleared it.
            let i = idx as usize;
            self.generation[i] += 1;
            self.tag[i] = tag;
            self.key[i] = key;
            self.pending_props[i] = pending_props;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.tag.push(tag);
            self.key.push(key);
            self.element_type.push(None);
            self.state_node.push(StateNode::None);
            self.parent.push(INVALID);
            self.child.push(INVALID);
            self.sibling.push(INVALID);
            self.index.push(0);
            self.pending_props.push(pending_props);
            self.memoized_props.push(None);
            self.memoized_state.push(MemoizedState::None);
            self.update_queue.push(Vec::new());
            self.flags.push(Flags::NONE);
            self.deletions.push(Vec::new());
            self.alternate.push(INVALID);
            self.generation.push(0);
            idx
        }
    }

    fn release(&mut self, idx: u32) {
        let i = idx as usize;
        self.key[i] = None;
        self.element_type[i] = None;
        self.state_node[i] = StateNode::None;
        self.parent[i] = INVALID;
        self.child[i] = INVALID;
        self.sibling[i] = INVALID;
        self.index[i] = 0;
        self.pending_props[i] = Props::default();
        self.memoized_props[i] = None;
        self.memoized_state[i] = MemoizedState::None;
        self.update_queue[i] = Vec::new();
        self.flags[i] = Flags::NONE;
        self.deletions[i] = Vec::new();
        self.alternate[i] = INVALID;
        // Bump generation so old handles immediately fail validation.
        self.generation[i] += 1;
        self.free_list.push(idx);
    }

    /// Creates a detached fiber with no element type.
    pub fn create_fiber(&mut self, tag: FiberTag, key: Option<Key>, pending_props: Props) -> FiberId {
        let idx = self.alloc(tag, key, pending_props);
        self.id_at(idx)
    }

    /// Creates a detached fiber for an element.
    pub fn create_fiber_from_element(&mut self, element: &Element) -> FiberId {
        let idx = self.alloc(
            element.ty.fiber_tag(),
            element.key.clone(),
            element.props.clone(),
        );
        self.element_type[idx as usize] = Some(element.ty.clone());
        self.id_at(idx)
    }

    /// Creates a detached text fiber.
    pub fn create_fiber_from_text(&mut self, text: Rc<str>) -> FiberId {
        let idx = self.alloc(FiberTag::HostText, None, Props::text(text));
        self.id_at(idx)
    }

    /// Creates a detached fragment fiber holding `children`.
    pub fn create_fiber_from_fragment(&mut self, children: Node, key: Option<Key>) -> FiberId {
        let idx = self.alloc(
            FiberTag::Fragment,
            key,
            Props::new().with_children(children),
        );
        self.element_type[idx as usize] = Some(ElementType::Fragment);
        self.id_at(idx)
    }

    /// Creates the committed root fiber for a host container.
    pub fn create_host_root(&mut self, container: HostHandle) -> FiberId {
        let idx = self.alloc(FiberTag::HostRoot, None, Props::new());
        self.state_node[idx as usize] = StateNode::Container(container);
        self.memoized_state[idx as usize] = MemoizedState::Root(Node::Empty);
        self.id_at(idx)
    }

    /// Returns the work-in-progress twin of `current`, reusing its alternate
    /// slot when there is one.
    ///
    /// The twin gets `pending_props`, the current fiber's flags, and copies of
    /// its child link, sibling link, index, memoized fields and effect list.
    /// Deletions staged on a reused slot by an earlier render are cleared.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn create_work_in_progress(&mut self, current: FiberId, pending_props: Props) -> FiberId {
        self.validate(current);
        let wip = self.work_in_progress_at(current.idx, pending_props);
        self.id_at(wip)
    }

    pub(crate) fn work_in_progress_at(&mut self, current: u32, pending_props: Props) -> u32 {
        let c = current as usize;
        let mut wip = self.alternate[c];
        if wip == INVALID {
            wip = self.alloc(self.tag[c], self.key[c].clone(), pending_props);
            let w = wip as usize;
            self.element_type[w] = self.element_type[c].clone();
            self.state_node[w] = self.state_node[c].clone();
            self.alternate[w] = current;
            self.alternate[c] = wip;
        } else {
            let w = wip as usize;
            self.pending_props[w] = pending_props;
            self.deletions[w].clear();
        }
        let w = wip as usize;
        self.flags[w] = self.flags[c];
        self.child[w] = self.child[c];
        self.sibling[w] = self.sibling[c];
        self.index[w] = self.index[c];
        self.memoized_props[w] = self.memoized_props[c].clone();
        self.memoized_state[w] = self.memoized_state[c].clone();
        self.update_queue[w] = self.update_queue[c].clone();
        wip
    }

    /// Frees the subtree rooted at raw slot `root` together with the
    /// alternate of every fiber in it.
    ///
    /// Hook state, effect lists and component instances held by the freed
    /// fibers are dropped.
    pub(crate) fn release_subtree(&mut self, root: u32) {
        let mut doomed = Vec::new();
        for_each_in_subtree(self, root, |idx| doomed.push(idx));
        for idx in doomed {
            let alternate = self.alternate[idx as usize];
            self.release(idx);
            if alternate != INVALID && self.alternate[alternate as usize] == idx {
                self.release(alternate);
            }
        }
    }

    /// Returns whether the given handle refers to a live fiber.
    #[must_use]
    pub fn is_alive(&self, id: FiberId) -> bool {
        id.idx < self.len && self.generation[id.idx as usize] == id.generation
    }

    // -- Topology API --

    /// Returns the root fiber above `id`, following parent links.
    ///
    /// Returns `None` for a detached fiber. The result is either generation
    /// of the root.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn find_host_root(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        let mut node = id.idx;
        loop {
            if self.tag[node as usize] == FiberTag::HostRoot {
                return Some(self.id_at(node));
            }
            let parent = self.parent[node as usize];
            if parent == INVALID {
                return None;
            }
            node = parent;
        }
    }

    /// Returns the parent of a fiber, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn parent(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a fiber.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn children(&self, id: FiberId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.child[id.idx as usize])
    }

    /// Returns the child of `parent` with key `key`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn find_by_key(&self, parent: FiberId, key: &Key) -> Option<FiberId> {
        self.children(parent)
            .find(|c| self.key[c.idx as usize].as_ref() == Some(key))
    }

    /// Returns the other generation of a fiber, if it has one.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn alternate(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.alternate[id.idx as usize])
    }

    // -- Property getters --

    /// Returns the kind of a fiber.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn tag(&self, id: FiberId) -> FiberTag {
        self.validate(id);
        self.tag[id.idx as usize]
    }

    /// Returns the key of a fiber.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn key(&self, id: FiberId) -> Option<&Key> {
        self.validate(id);
        self.key[id.idx as usize].as_ref()
    }

    /// Returns the position of a fiber among its siblings.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn index(&self, id: FiberId) -> u32 {
        self.validate(id);
        self.index[id.idx as usize]
    }

    /// Returns the pending side-effect flags of a fiber.
    ///
    /// Flags are cleared at commit, so on a committed tree this is empty.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn flags(&self, id: FiberId) -> Flags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the host node owned by a host fiber, or the container of a
    /// root fiber.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn host_handle(&self, id: FiberId) -> Option<HostHandle> {
        self.validate(id);
        self.state_node[id.idx as usize].host_handle()
    }

    /// Returns the instance a class component fiber built on its latest
    /// render.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn instance(&self, id: FiberId) -> Option<Rc<dyn Component>> {
        self.validate(id);
        match &self.state_node[id.idx as usize] {
            StateNode::Instance(instance) => Some(instance.clone()),
            _ => None,
        }
    }

    /// Returns the name of the fiber's element type (`"#text"` for text and
    /// `"#root"` for roots).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn type_name(&self, id: FiberId) -> &str {
        self.validate(id);
        self.type_name_at(id.idx)
    }

    /// Number of hook records on a function component fiber.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn hook_count(&self, id: FiberId) -> usize {
        self.validate(id);
        match &self.memoized_state[id.idx as usize] {
            MemoizedState::Hooks(hooks) => hooks.len(),
            MemoizedState::None | MemoizedState::Root(_) => 0,
        }
    }

    /// Number of live fibers.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Raw-index accessors --
    //
    // These accept raw slot indices (as found in `CommitChanges`) rather than
    // `FiberId` handles, skipping generation validation.

    /// Returns the handle for raw slot `idx` at its current generation.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn id_at(&self, idx: u32) -> FiberId {
        self.check_range(idx);
        FiberId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns the kind at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn tag_at(&self, idx: u32) -> FiberTag {
        self.check_range(idx);
        self.tag[idx as usize]
    }

    /// Returns the key at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn key_at(&self, idx: u32) -> Option<&Key> {
        self.check_range(idx);
        self.key[idx as usize].as_ref()
    }

    /// Returns the host node at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn host_handle_at(&self, idx: u32) -> Option<HostHandle> {
        self.check_range(idx);
        self.state_node[idx as usize].host_handle()
    }

    /// Returns the element type name at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn type_name_at(&self, idx: u32) -> &str {
        self.check_range(idx);
        match (&self.element_type[idx as usize], self.tag[idx as usize]) {
            (Some(ty), _) => ty.name(),
            (None, FiberTag::HostText) => "#text",
            (None, FiberTag::HostRoot) => "#root",
            (None, _) => "?",
        }
    }

    // -- Internal --

    fn link(&self, idx: u32) -> Option<FiberId> {
        (idx != INVALID).then(|| FiberId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    fn check_range(&self, idx: u32) {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: FiberId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale FiberId: {id:?}"
        );
    }
}
