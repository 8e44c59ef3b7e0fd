// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use sprig_core::element::{PropValue, Props};
use sprig_core::host::{HostEvent, HostHandle, HostTree};

use crate::document::{Document, HostChanges, HostOp, INVALID, NodeKind};

/// Prefix of props that register listeners.
const LISTENER_PREFIX: &str = "on";

/// An in-memory host tree.
///
/// Cloning produces another handle to the same document, so a test can give
/// one handle to a [`Root`](sprig_core::root::Root) and keep another to
/// inspect the result.
#[derive(Clone)]
pub struct MemoryHost {
    doc: Rc<RefCell<Document>>,
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("doc", &*self.doc.borrow())
            .finish()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            doc: Rc::new(RefCell::new(Document::new())),
        }
    }

    /// Creates a container node for a root to render into.
    pub fn create_container(&self) -> HostHandle {
        HostHandle(
            self.doc
                .borrow_mut()
                .push(NodeKind::Container, "#container".into(), String::new()),
        )
    }

    // -- Inspection --

    /// Total number of nodes ever created, including containers.
    #[must_use]
    pub fn node_count(&self) -> u32 {
        self.doc.borrow().len()
    }

    /// Returns the node's kind.
    ///
    /// # Panics
    ///
    /// Panics if `node` was not issued by this host.
    #[must_use]
    pub fn kind(&self, node: HostHandle) -> NodeKind {
        let doc = self.doc.borrow();
        doc.kind[doc.check(node.0)]
    }

    /// Returns an element's tag.
    ///
    /// # Panics
    ///
    /// Panics if `node` was not issued by this host.
    #[must_use]
    pub fn tag(&self, node: HostHandle) -> Option<String> {
        let doc = self.doc.borrow();
        let n = doc.check(node.0);
        (doc.kind[n] == NodeKind::Element).then(|| String::from(&*doc.tag[n]))
    }

    /// Returns the parent, if attached.
    ///
    /// # Panics
    ///
    /// Panics if `node` was not issued by this host.
    #[must_use]
    pub fn parent(&self, node: HostHandle) -> Option<HostHandle> {
        let doc = self.doc.borrow();
        let parent = doc.parent[doc.check(node.0)];
        (parent != INVALID).then_some(HostHandle(parent))
    }

    /// Returns the children in order.
    ///
    /// # Panics
    ///
    /// Panics if `node` was not issued by this host.
    #[must_use]
    pub fn children(&self, node: HostHandle) -> Vec<HostHandle> {
        let doc = self.doc.borrow();
        doc.children[doc.check(node.0)]
            .iter()
            .map(|&c| HostHandle(c))
            .collect()
    }

    /// Returns an attribute value.
    ///
    /// # Panics
    ///
    /// Panics if `node` was not issued by this host.
    #[must_use]
    pub fn attribute(&self, node: HostHandle, name: &str) -> Option<String> {
        let doc = self.doc.borrow();
        doc.attrs[doc.check(node.0)].get(name).cloned()
    }

    /// Returns whether the element has a listener for `event`.
    ///
    /// # Panics
    ///
    /// Panics if `node` was not issued by this host.
    #[must_use]
    pub fn has_listener(&self, node: HostHandle, event: &str) -> bool {
        let doc = self.doc.borrow();
        doc.listeners[doc.check(node.0)].contains_key(event)
    }

    /// Concatenated text of the node and its descendants, in document order.
    ///
    /// # Panics
    ///
    /// Panics if `node` was not issued by this host.
    #[must_use]
    pub fn text_content(&self, node: HostHandle) -> String {
        let doc = self.doc.borrow();
        doc.check(node.0);
        let mut out = String::new();
        collect_text(&doc, node.0, &mut out);
        out
    }

    /// Serializes the children of `node` as markup.
    ///
    /// Elements render as `<tag name="value">...</tag>` with attributes in
    /// name order; text renders verbatim.
    ///
    /// # Panics
    ///
    /// Panics if `node` was not issued by this host.
    #[must_use]
    pub fn inner_markup(&self, node: HostHandle) -> String {
        let doc = self.doc.borrow();
        let n = doc.check(node.0);
        let mut out = String::new();
        out.push_str(&doc.text[n]);
        for &child in &doc.children[n] {
            write_markup(&doc, child, &mut out);
        }
        out
    }

    /// Serializes `node` itself and its subtree as markup.
    ///
    /// # Panics
    ///
    /// Panics if `node` was not issued by this host.
    #[must_use]
    pub fn to_markup(&self, node: HostHandle) -> String {
        let doc = self.doc.borrow();
        doc.check(node.0);
        let mut out = String::new();
        write_markup(&doc, node.0, &mut out);
        out
    }

    /// Finds elements with the given tag in the subtree at `root`, in
    /// document order.
    ///
    /// # Panics
    ///
    /// Panics if `root` was not issued by this host.
    #[must_use]
    pub fn query_all(&self, root: HostHandle, tag: &str) -> Vec<HostHandle> {
        let doc = self.doc.borrow();
        doc.check(root.0);
        let mut out = Vec::new();
        let mut stack = Vec::from([root.0]);
        while let Some(idx) = stack.pop() {
            let n = idx as usize;
            if doc.kind[n] == NodeKind::Element && &*doc.tag[n] == tag {
                out.push(HostHandle(idx));
            }
            stack.extend(doc.children[n].iter().rev());
        }
        out
    }

    /// The first element with the given tag under `root`.
    ///
    /// # Panics
    ///
    /// Panics if `root` was not issued by this host.
    #[must_use]
    pub fn query(&self, root: HostHandle, tag: &str) -> Option<HostHandle> {
        self.query_all(root, tag).into_iter().next()
    }

    // -- Change tracking --

    /// Returns the mutations applied so far.
    #[must_use]
    pub fn ops(&self) -> Vec<HostOp> {
        self.doc.borrow().ops.clone()
    }

    /// Returns and clears the mutation log.
    pub fn take_ops(&self) -> Vec<HostOp> {
        core::mem::take(&mut self.doc.borrow_mut().ops)
    }

    /// Drains dirty state accumulated since the last call.
    pub fn evaluate(&self) -> HostChanges {
        let mut changes = HostChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&self, changes: &mut HostChanges) {
        self.doc.borrow_mut().evaluate_into(changes);
    }

    // -- Events --

    /// Dispatches `event` at `target`, bubbling to its ancestors.
    ///
    /// Returns the number of listeners invoked. Listeners run with the
    /// document unborrowed, so they may dispatch state updates freely.
    ///
    /// # Panics
    ///
    /// Panics if `target` was not issued by this host.
    pub fn dispatch_event(&self, target: HostHandle, event: &str) -> usize {
        let handlers: Vec<_> = {
            let doc = self.doc.borrow();
            doc.check(target.0);
            let mut handlers = Vec::new();
            let mut node = target.0;
            while node != INVALID {
                if let Some(handler) = doc.listeners[node as usize].get(event) {
                    handlers.push(handler.clone());
                }
                node = doc.parent[node as usize];
            }
            handlers
        };
        let host_event = HostEvent {
            name: event.into(),
            target,
        };
        for handler in &handlers {
            handler.call(&host_event);
        }
        handlers.len()
    }
}

impl HostTree for MemoryHost {
    fn create_instance(&mut self, ty: &str) -> HostHandle {
        let mut doc = self.doc.borrow_mut();
        let tag: Rc<str> = ty.into();
        let node = doc.push(NodeKind::Element, tag.clone(), String::new());
        doc.ops.push(HostOp::Create { node, tag });
        HostHandle(node)
    }

    fn create_text_instance(&mut self, text: &str) -> HostHandle {
        let mut doc = self.doc.borrow_mut();
        let node = doc.push(NodeKind::Text, "#text".into(), text.into());
        doc.ops.push(HostOp::CreateText {
            node,
            text: text.into(),
        });
        HostHandle(node)
    }

    fn append_child(&mut self, parent: HostHandle, child: HostHandle) {
        let mut doc = self.doc.borrow_mut();
        doc.attach(parent.0, child.0, None);
        doc.ops.push(HostOp::Append {
            parent: parent.0,
            child: child.0,
        });
    }

    fn insert_before(&mut self, parent: HostHandle, child: HostHandle, before: HostHandle) {
        let mut doc = self.doc.borrow_mut();
        let b = doc.check(before.0);
        assert_eq!(
            doc.parent[b], parent.0,
            "reference node #{} is not a child of #{}",
            before.0, parent.0
        );
        doc.attach(parent.0, child.0, Some(before.0));
        doc.ops.push(HostOp::InsertBefore {
            parent: parent.0,
            child: child.0,
            before: before.0,
        });
    }

    fn remove_child(&mut self, parent: HostHandle, child: HostHandle) {
        let mut doc = self.doc.borrow_mut();
        doc.remove(parent.0, child.0);
        doc.ops.push(HostOp::Remove {
            parent: parent.0,
            child: child.0,
        });
    }

    fn commit_props_update(&mut self, handle: HostHandle, prev: Option<&Props>, next: &Props) {
        let mut doc = self.doc.borrow_mut();
        let node = handle.0;
        doc.check(node);

        if let Some(prev) = prev {
            for (name, _) in prev.attributes() {
                if next.get(name).is_some() {
                    continue;
                }
                match name.strip_prefix(LISTENER_PREFIX) {
                    Some(event) if doc.listeners[node as usize].contains_key(event) => {
                        doc.remove_listener(node, event);
                    }
                    _ => doc.remove_attribute(node, name),
                }
            }
        }

        for (name, value) in next.attributes() {
            if let PropValue::Handler(handler) = value {
                let event = name.strip_prefix(LISTENER_PREFIX).unwrap_or(name);
                doc.set_listener(node, event, handler.clone());
            } else if let Some(text) = value.to_attribute() {
                doc.set_attribute(node, name, text);
            }
        }

        match next.text_content() {
            Some(text) => doc.set_text(node, text),
            None if prev.is_some_and(|p| p.text_content().is_some()) => doc.set_text(node, ""),
            None => {}
        }
    }

    fn commit_text_update(&mut self, handle: HostHandle, old_text: &str, new_text: &str) {
        let mut doc = self.doc.borrow_mut();
        let n = doc.check(handle.0);
        debug_assert_eq!(doc.text[n], old_text, "text node #{} out of sync", handle.0);
        doc.set_text(handle.0, new_text);
    }
}

fn collect_text(doc: &Document, node: u32, out: &mut String) {
    let n = node as usize;
    out.push_str(&doc.text[n]);
    for &child in &doc.children[n] {
        collect_text(doc, child, out);
    }
}

fn write_markup(doc: &Document, node: u32, out: &mut String) {
    let n = node as usize;
    if doc.kind[n] == NodeKind::Text {
        out.push_str(&doc.text[n]);
        return;
    }
    out.push('<');
    out.push_str(&doc.tag[n]);
    for (name, value) in &doc.attrs[n] {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(value);
        out.push('"');
    }
    out.push('>');
    out.push_str(&doc.text[n]);
    for &child in &doc.children[n] {
        write_markup(doc, child, out);
    }
    out.push_str("</");
    out.push_str(&doc.tag[n]);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;

    fn props() -> Props {
        Props::new()
    }

    #[test]
    fn markup_reflects_structure_and_attributes() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let ul = host.create_instance("ul");
        host.commit_props_update(ul, None, &props().with("class", "list").with("id", 3));
        let li = host.create_instance("li");
        host.commit_props_update(li, None, &props().with_children("one"));
        let text = host.create_text_instance("tail");
        host.append_child(ul, li);
        host.append_child(ul, text);
        host.append_child(root, ul);

        assert_eq!(
            host.inner_markup(root),
            "<ul class=\"list\" id=\"3\"><li>one</li>tail</ul>"
        );
        assert_eq!(host.text_content(root), "onetail");
        assert_eq!(host.query(root, "li"), Some(li));
        assert_eq!(host.tag(ul).as_deref(), Some("ul"));
        assert_eq!(host.tag(text), None);
    }

    #[test]
    fn insert_before_moves_existing_child() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let a = host.create_text_instance("a");
        let b = host.create_text_instance("b");
        let c = host.create_text_instance("c");
        for n in [a, b, c] {
            host.append_child(root, n);
        }
        host.insert_before(root, c, b);
        assert_eq!(host.children(root), vec![a, c, b]);
        assert_eq!(host.inner_markup(root), "acb");
    }

    #[test]
    fn props_update_removes_stale_attributes_and_listeners() {
        let mut host = MemoryHost::new();
        let button = host.create_instance("button");
        let first = props()
            .with("title", "old")
            .with("onclick", sprig_core::element::EventHandler::new(|_| {}));
        host.commit_props_update(button, None, &first);
        assert!(host.has_listener(button, "click"));

        let second = props().with("disabled", true);
        host.commit_props_update(button, Some(&first), &second);
        assert!(!host.has_listener(button, "click"));
        assert_eq!(host.attribute(button, "title"), None);
        assert_eq!(host.attribute(button, "disabled").as_deref(), Some("true"));
    }

    #[test]
    fn unchanged_props_log_nothing() {
        let mut host = MemoryHost::new();
        let div = host.create_instance("div");
        let p = props().with("id", "x").with_children("hi");
        host.commit_props_update(div, None, &p);
        let _ = host.take_ops();
        host.commit_props_update(div, Some(&p), &p.clone().with("id", "x"));
        assert!(host.ops().is_empty());
    }

    #[test]
    fn evaluate_drains_channels() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let div = host.create_instance("div");
        let span = host.create_instance("span");
        host.append_child(div, span);
        let changes = host.evaluate();
        assert_eq!(changes.created, vec![div.0, span.0]);
        assert!(changes.connected.is_empty(), "detached subtree");

        host.append_child(root, div);
        let changes = host.evaluate();
        assert!(changes.created.is_empty());
        assert!(changes.connected.contains(&div.0));
        assert!(changes.connected.contains(&span.0), "descendants connect too");
        assert!(changes.children.contains(&root.0));

        host.commit_text_update(span, "", "x");
        host.remove_child(root, div);
        let changes = host.evaluate();
        assert_eq!(changes.text, vec![span.0]);
        assert!(changes.disconnected.contains(&span.0));
        assert!(host.evaluate().is_empty());
    }

    #[test]
    fn dispatch_bubbles_to_ancestors() {
        let mut host = MemoryHost::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let outer = host.create_instance("div");
        let inner = host.create_instance("button");
        for (node, name) in [(outer, "outer"), (inner, "inner")] {
            let log = log.clone();
            let handler = sprig_core::element::EventHandler::new(move |e: &HostEvent| {
                log.borrow_mut().push((name, e.target));
            });
            host.commit_props_update(node, None, &props().with("onclick", handler));
        }
        host.append_child(outer, inner);

        assert_eq!(host.dispatch_event(inner, "click"), 2);
        assert_eq!(*log.borrow(), vec![("inner", inner), ("outer", inner)]);
        assert_eq!(host.dispatch_event(inner, "keydown"), 0);
    }

    #[test]
    fn op_display_is_readable() {
        let op = HostOp::InsertBefore {
            parent: 0,
            child: 2,
            before: 1,
        };
        assert_eq!(op.to_string(), "insert #2 into #0 before #1");
        assert!(op.is_structural());
    }

    #[test]
    #[should_panic(expected = "is not a child of")]
    fn removing_from_wrong_parent_panics() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let a = host.create_instance("a");
        host.remove_child(root, a);
    }
}
