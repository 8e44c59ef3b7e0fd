// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host tree contract.
//!
//! The reconciler never touches a real presentation tree. Each renderer
//! implements [`HostTree`] for its own node type (DOM elements, native views,
//! an in-memory document) and hands it to [`create_root`](crate::root::create_root).
//! Nodes are addressed by opaque [`HostHandle`]s that the host assigns.
//!
//! # Call order
//!
//! During the render phase the reconciler only creates *detached* instances:
//! `create_instance`, an initial `commit_props_update(handle, None, props)`,
//! `create_text_instance`, and `append_child` to assemble freshly mounted
//! subtrees bottom-up. Attaching to live parents (`append_child` /
//! `insert_before` on an existing parent), `remove_child` and property or text
//! updates only happen during commit.

use alloc::rc::Rc;
use core::fmt;

use crate::element::Props;

/// Opaque handle to a node owned by a [`HostTree`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostHandle(pub u32);

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostHandle({})", self.0)
    }
}

/// An event delivered by a host to a listener registered through props.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostEvent {
    /// Event name without the `on` prefix, e.g. `"click"`.
    pub name: Rc<str>,
    /// Node the event was dispatched to.
    pub target: HostHandle,
}

/// Mutations the reconciler performs on a host presentation tree.
pub trait HostTree {
    /// Creates a detached element node of the given type.
    fn create_instance(&mut self, ty: &str) -> HostHandle;

    /// Creates a detached text node.
    fn create_text_instance(&mut self, text: &str) -> HostHandle;

    /// Appends `child` as the last child of `parent`, moving it if it is
    /// already attached elsewhere.
    fn append_child(&mut self, parent: HostHandle, child: HostHandle);

    /// Inserts `child` into `parent` immediately before `before`, moving it if
    /// it is already attached.
    fn insert_before(&mut self, parent: HostHandle, child: HostHandle, before: HostHandle);

    /// Detaches `child` from `parent`.
    fn remove_child(&mut self, parent: HostHandle, child: HostHandle);

    /// Applies element properties.
    ///
    /// `prev` is `None` for the initial application on a fresh instance.
    /// Implementations remove attributes and listeners absent from `next`,
    /// set the ones that are new or changed, and use the direct text content
    /// (see [`Props::text_content`]) as the node's text.
    fn commit_props_update(&mut self, handle: HostHandle, prev: Option<&Props>, next: &Props);

    /// Replaces the contents of a text node.
    fn commit_text_update(&mut self, handle: HostHandle, old_text: &str, new_text: &str);

    /// Returns whether an element of type `ty` renders `props` as its own text
    /// content rather than as child nodes.
    ///
    /// The default treats direct text children as text content.
    fn should_set_text_content(&self, ty: &str, props: &Props) -> bool {
        _ = ty;
        props.text_content().is_some()
    }
}
