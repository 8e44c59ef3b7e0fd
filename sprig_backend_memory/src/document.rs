// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

use sprig_core::element::EventHandler;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::dirty;

/// Sentinel for "no parent".
pub(crate) const INVALID: u32 = u32::MAX;

/// What a document node is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A root that rendered trees attach to. Always connected.
    Container,
    /// An element with a tag, attributes and listeners.
    Element,
    /// A text node.
    Text,
}

/// One mutation applied to the document, in application order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostOp {
    /// A detached element was created.
    Create {
        /// The new node.
        node: u32,
        /// Its tag.
        tag: Rc<str>,
    },
    /// A detached text node was created.
    CreateText {
        /// The new node.
        node: u32,
        /// Its text.
        text: String,
    },
    /// `child` became the last child of `parent`.
    Append {
        /// The parent.
        parent: u32,
        /// The appended node.
        child: u32,
    },
    /// `child` was inserted before `before`.
    InsertBefore {
        /// The parent.
        parent: u32,
        /// The inserted node.
        child: u32,
        /// The reference sibling.
        before: u32,
    },
    /// `child` was detached from `parent`.
    Remove {
        /// The former parent.
        parent: u32,
        /// The detached node.
        child: u32,
    },
    /// An attribute was added or changed.
    SetAttribute {
        /// The element.
        node: u32,
        /// Attribute name.
        name: String,
        /// New value.
        value: String,
    },
    /// An attribute was removed.
    RemoveAttribute {
        /// The element.
        node: u32,
        /// Attribute name.
        name: String,
    },
    /// A listener was added or replaced.
    SetListener {
        /// The element.
        node: u32,
        /// Event name without the `on` prefix.
        event: String,
    },
    /// A listener was removed.
    RemoveListener {
        /// The element.
        node: u32,
        /// Event name without the `on` prefix.
        event: String,
    },
    /// Text content was replaced.
    SetText {
        /// The element or text node.
        node: u32,
        /// New text.
        text: String,
    },
}

impl HostOp {
    /// Returns whether this op moved, attached or detached a node.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Append { .. } | Self::InsertBefore { .. } | Self::Remove { .. }
        )
    }
}

impl fmt::Display for HostOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { node, tag } => write!(f, "create #{node} <{tag}>"),
            Self::CreateText { node, text } => write!(f, "create #{node} {text:?}"),
            Self::Append { parent, child } => write!(f, "append #{child} to #{parent}"),
            Self::InsertBefore {
                parent,
                child,
                before,
            } => write!(f, "insert #{child} into #{parent} before #{before}"),
            Self::Remove { parent, child } => write!(f, "remove #{child} from #{parent}"),
            Self::SetAttribute { node, name, value } => write!(f, "#{node}.{name} = {value:?}"),
            Self::RemoveAttribute { node, name } => write!(f, "#{node}.{name} removed"),
            Self::SetListener { node, event } => write!(f, "#{node} listens to {event}"),
            Self::RemoveListener { node, event } => write!(f, "#{node} stops listening to {event}"),
            Self::SetText { node, text } => write!(f, "#{node} text = {text:?}"),
        }
    }
}

/// The set of changes produced by a single
/// [`MemoryHost::evaluate`](crate::MemoryHost::evaluate) call, as raw node
/// indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostChanges {
    /// Nodes created since the last evaluate.
    pub created: Vec<u32>,
    /// Elements whose attributes or listeners changed.
    pub attributes: Vec<u32>,
    /// Nodes whose text changed.
    pub text: Vec<u32>,
    /// Nodes whose child list changed.
    pub children: Vec<u32>,
    /// Nodes that became reachable from a container.
    pub connected: Vec<u32>,
    /// Nodes that stopped being reachable from a container.
    pub disconnected: Vec<u32>,
}

impl HostChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.created.clear();
        self.attributes.clear();
        self.text.clear();
        self.children.clear();
        self.connected.clear();
        self.disconnected.clear();
    }

    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.attributes.is_empty()
            && self.text.is_empty()
            && self.children.is_empty()
            && self.connected.is_empty()
            && self.disconnected.is_empty()
    }
}

pub(crate) struct Document {
    // -- Per-node storage --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) tag: Vec<Rc<str>>,
    pub(crate) text: Vec<String>,
    pub(crate) attrs: Vec<BTreeMap<String, String>>,
    pub(crate) listeners: Vec<BTreeMap<String, EventHandler>>,
    pub(crate) parent: Vec<u32>,
    pub(crate) children: Vec<Vec<u32>>,
    /// Connectedness as of the last evaluate.
    pub(crate) connected: Vec<bool>,

    // -- Change tracking --
    dirty: DirtyTracker<u32>,
    pending_created: Vec<u32>,
    pub(crate) ops: Vec<HostOp>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.kind.len())
            .field("ops", &self.ops.len())
            .finish_non_exhaustive()
    }
}

impl Document {
    pub(crate) fn new() -> Self {
        Self {
            kind: Vec::new(),
            tag: Vec::new(),
            text: Vec::new(),
            attrs: Vec::new(),
            listeners: Vec::new(),
            parent: Vec::new(),
            children: Vec::new(),
            connected: Vec::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_created: Vec::new(),
            ops: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> u32 {
        u32::try_from(self.kind.len()).unwrap_or(INVALID)
    }

    /// Panics with a readable message on a handle this document never issued.
    pub(crate) fn check(&self, idx: u32) -> usize {
        assert!(
            idx < self.len(),
            "node #{idx} does not exist (document has {} nodes)",
            self.len()
        );
        idx as usize
    }

    // -- Creation --

    pub(crate) fn push(&mut self, kind: NodeKind, tag: Rc<str>, text: String) -> u32 {
        let idx = self.len();
        self.kind.push(kind);
        self.tag.push(tag);
        self.text.push(text);
        self.attrs.push(BTreeMap::new());
        self.listeners.push(BTreeMap::new());
        self.parent.push(INVALID);
        self.children.push(Vec::new());
        self.connected.push(kind == NodeKind::Container);
        if kind != NodeKind::Container {
            self.pending_created.push(idx);
        }
        idx
    }

    // -- Topology --

    /// Removes `child` from its parent's child list, if it has one.
    fn detach(&mut self, child: u32) {
        let c = child as usize;
        let parent = mem::replace(&mut self.parent[c], INVALID);
        if parent == INVALID {
            return;
        }
        self.children[parent as usize].retain(|&n| n != child);
        self.dirty.remove_dependency(child, parent, dirty::CONNECTED);
        self.dirty.mark(parent, dirty::CHILDREN);
    }

    /// Inserts `child` under `parent` at position `at` (appends when `None`).
    pub(crate) fn attach(&mut self, parent: u32, child: u32, at: Option<u32>) {
        let p = self.check(parent);
        let c = self.check(child);
        assert!(
            self.kind[p] != NodeKind::Text,
            "text node #{parent} cannot have children"
        );
        assert!(
            self.kind[c] != NodeKind::Container,
            "container #{child} cannot be attached"
        );
        assert!(
            !self.is_ancestor_or_self(child, parent),
            "attaching #{child} under #{parent} would create a cycle"
        );
        self.detach(child);
        let siblings = &mut self.children[p];
        match at.and_then(|before| siblings.iter().position(|&n| n == before)) {
            Some(pos) => siblings.insert(pos, child),
            None => siblings.push(child),
        }
        self.parent[c] = parent;
        let _ = self.dirty.add_dependency(child, parent, dirty::CONNECTED);
        self.dirty.mark(parent, dirty::CHILDREN);
        self.dirty.mark_with(child, dirty::CONNECTED, &EagerPolicy);
    }

    pub(crate) fn remove(&mut self, parent: u32, child: u32) {
        let c = self.check(child);
        assert_eq!(
            self.parent[c], parent,
            "#{child} is not a child of #{parent}"
        );
        self.detach(child);
        self.dirty.mark_with(child, dirty::CONNECTED, &EagerPolicy);
    }

    fn is_ancestor_or_self(&self, ancestor: u32, mut node: u32) -> bool {
        while node != INVALID {
            if node == ancestor {
                return true;
            }
            node = self.parent[node as usize];
        }
        false
    }

    /// Walks up to a container.
    fn reaches_container(&self, mut node: u32) -> bool {
        while node != INVALID {
            if self.kind[node as usize] == NodeKind::Container {
                return true;
            }
            node = self.parent[node as usize];
        }
        false
    }

    // -- Properties --

    pub(crate) fn set_attribute(&mut self, node: u32, name: &str, value: String) {
        let n = node as usize;
        if self.attrs[n].get(name) == Some(&value) {
            return;
        }
        self.attrs[n].insert(name.into(), value.clone());
        self.dirty.mark(node, dirty::ATTRIBUTES);
        self.ops.push(HostOp::SetAttribute {
            node,
            name: name.into(),
            value,
        });
    }

    pub(crate) fn remove_attribute(&mut self, node: u32, name: &str) {
        if self.attrs[node as usize].remove(name).is_some() {
            self.dirty.mark(node, dirty::ATTRIBUTES);
            self.ops.push(HostOp::RemoveAttribute {
                node,
                name: name.into(),
            });
        }
    }

    pub(crate) fn set_listener(&mut self, node: u32, event: &str, handler: EventHandler) {
        let n = node as usize;
        if self.listeners[n].get(event).is_some_and(|h| h.ptr_eq(&handler)) {
            return;
        }
        self.listeners[n].insert(event.into(), handler);
        self.dirty.mark(node, dirty::ATTRIBUTES);
        self.ops.push(HostOp::SetListener {
            node,
            event: event.into(),
        });
    }

    pub(crate) fn remove_listener(&mut self, node: u32, event: &str) {
        if self.listeners[node as usize].remove(event).is_some() {
            self.dirty.mark(node, dirty::ATTRIBUTES);
            self.ops.push(HostOp::RemoveListener {
                node,
                event: event.into(),
            });
        }
    }

    pub(crate) fn set_text(&mut self, node: u32, text: &str) {
        let n = node as usize;
        if self.text[n] == text {
            return;
        }
        self.text[n] = text.into();
        self.dirty.mark(node, dirty::TEXT);
        self.ops.push(HostOp::SetText {
            node,
            text: text.into(),
        });
    }

    // -- Evaluation --

    pub(crate) fn evaluate_into(&mut self, changes: &mut HostChanges) {
        changes.clear();

        let affected: Vec<u32> = self
            .dirty
            .drain(dirty::CONNECTED)
            .affected()
            .deterministic()
            .run()
            .collect();
        for idx in affected {
            let now = self.reaches_container(idx);
            let was = mem::replace(&mut self.connected[idx as usize], now);
            match (was, now) {
                (false, true) => changes.connected.push(idx),
                (true, false) => changes.disconnected.push(idx),
                _ => {}
            }
        }

        changes.attributes = self
            .dirty
            .drain(dirty::ATTRIBUTES)
            .deterministic()
            .run()
            .collect();
        changes.text = self.dirty.drain(dirty::TEXT).deterministic().run().collect();
        changes.children = self
            .dirty
            .drain(dirty::CHILDREN)
            .deterministic()
            .run()
            .collect();

        mem::swap(&mut self.pending_created, &mut changes.created);
    }
}
