// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A host tree that records every call, for unit tests.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::element::Props;
use crate::host::{HostHandle, HostTree};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum HostOp {
    Create { handle: HostHandle, ty: String },
    CreateText { handle: HostHandle, text: String },
    Append { parent: HostHandle, child: HostHandle },
    InsertBefore { parent: HostHandle, child: HostHandle, before: HostHandle },
    Remove { parent: HostHandle, child: HostHandle },
    Props { handle: HostHandle },
    Text { handle: HostHandle, text: String },
}

#[derive(Debug, Default)]
struct Node {
    /// `None` for text nodes.
    ty: Option<String>,
    text: String,
    attrs: BTreeMap<String, String>,
    children: Vec<HostHandle>,
    parent: Option<HostHandle>,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingHost {
    nodes: Vec<Node>,
    ops: Vec<HostOp>,
}

impl RecordingHost {
    pub(crate) fn create_container(&mut self) -> HostHandle {
        self.push(Node {
            ty: Some("#container".into()),
            ..Node::default()
        })
    }

    pub(crate) fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub(crate) fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Inner markup of `handle`.
    pub(crate) fn markup(&self, handle: HostHandle) -> String {
        let mut out = String::new();
        let node = &self.nodes[handle.0 as usize];
        out.push_str(&node.text);
        for child in &node.children {
            self.write(*child, &mut out);
        }
        out
    }

    fn write(&self, handle: HostHandle, out: &mut String) {
        let node = &self.nodes[handle.0 as usize];
        let Some(ty) = &node.ty else {
            out.push_str(&node.text);
            return;
        };
        out.push('<');
        out.push_str(ty);
        for (name, value) in &node.attrs {
            out.push_str(&alloc::format!(" {name}=\"{value}\""));
        }
        out.push('>');
        out.push_str(&self.markup(handle));
        out.push_str("</");
        out.push_str(ty);
        out.push('>');
    }

    fn push(&mut self, node: Node) -> HostHandle {
        let handle = HostHandle(u32::try_from(self.nodes.len()).expect("handle space"));
        self.nodes.push(node);
        handle
    }

    fn detach(&mut self, child: HostHandle) {
        if let Some(parent) = self.nodes[child.0 as usize].parent.take() {
            self.nodes[parent.0 as usize].children.retain(|c| *c != child);
        }
    }
}

impl HostTree for RecordingHost {
    fn create_instance(&mut self, ty: &str) -> HostHandle {
        let handle = self.push(Node {
            ty: Some(ty.into()),
            ..Node::default()
        });
        self.ops.push(HostOp::Create {
            handle,
            ty: ty.into(),
        });
        handle
    }

    fn create_text_instance(&mut self, text: &str) -> HostHandle {
        let handle = self.push(Node {
            text: text.into(),
            ..Node::default()
        });
        self.ops.push(HostOp::CreateText {
            handle,
            text: text.into(),
        });
        handle
    }

    fn append_child(&mut self, parent: HostHandle, child: HostHandle) {
        self.detach(child);
        self.nodes[parent.0 as usize].children.push(child);
        self.nodes[child.0 as usize].parent = Some(parent);
        self.ops.push(HostOp::Append { parent, child });
    }

    fn insert_before(&mut self, parent: HostHandle, child: HostHandle, before: HostHandle) {
        self.detach(child);
        let children = &mut self.nodes[parent.0 as usize].children;
        let at = children
            .iter()
            .position(|c| *c == before)
            .expect("reference node is a child of parent");
        children.insert(at, child);
        self.nodes[child.0 as usize].parent = Some(parent);
        self.ops.push(HostOp::InsertBefore {
            parent,
            child,
            before,
        });
    }

    fn remove_child(&mut self, parent: HostHandle, child: HostHandle) {
        assert_eq!(
            self.nodes[child.0 as usize].parent,
            Some(parent),
            "removing from the wrong parent"
        );
        self.detach(child);
        self.ops.push(HostOp::Remove { parent, child });
    }

    fn commit_props_update(&mut self, handle: HostHandle, prev: Option<&Props>, next: &Props) {
        let node = &mut self.nodes[handle.0 as usize];
        node.attrs = next
            .attributes()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_attribute()?)))
            .collect();
        match next.text_content() {
            Some(text) => node.text = text.to_string(),
            None if prev.is_some_and(|p| p.text_content().is_some()) => node.text.clear(),
            None => {}
        }
        self.ops.push(HostOp::Props { handle });
    }

    fn commit_text_update(&mut self, handle: HostHandle, old_text: &str, new_text: &str) {
        let node = &mut self.nodes[handle.0 as usize];
        assert_eq!(node.text, old_text, "stale text");
        node.text = new_text.to_string();
        self.ops.push(HostOp::Text {
            handle,
            text: new_text.into(),
        });
    }
}
