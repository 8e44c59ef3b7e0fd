// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::element::ElementType;
use crate::error::RenderError;
use crate::fiber::{FiberTag, Flags, INVALID, StateNode};
use crate::host::HostHandle;

use super::WorkLoop;

impl WorkLoop<'_> {
    pub(super) fn complete_work(&mut self, wip: u32) -> Result<(), RenderError> {
        let w = wip as usize;
        match self.tree.tag[w] {
            FiberTag::HostComponent => {
                let current = self.tree.alternate[w];
                if current != INVALID && self.tree.state_node[w].host_handle().is_some() {
                    let changed = match &self.tree.memoized_props[current as usize] {
                        Some(old) => old.host_differs(&self.tree.pending_props[w]),
                        None => true,
                    };
                    if changed {
                        self.tree.flags[w].insert(Flags::UPDATE);
                    }
                } else {
                    let props = self.tree.pending_props[w].clone();
                    let handle = self.host.create_instance(self.tree.type_name_at(wip));
                    self.host.commit_props_update(handle, None, &props);
                    self.append_all_children(handle, wip);
                    self.tree.state_node[w] = StateNode::Host(handle);
                }
            }
            FiberTag::HostText => {
                let current = self.tree.alternate[w];
                let text = self.tree.pending_props[w].text_content().unwrap_or_default();
                if current != INVALID && self.tree.state_node[w].host_handle().is_some() {
                    let old = self.tree.memoized_props[current as usize]
                        .as_ref()
                        .and_then(|p| p.text_content());
                    if old != Some(text) {
                        self.tree.flags[w].insert(Flags::UPDATE);
                    }
                } else {
                    let handle = self.host.create_text_instance(text);
                    self.tree.state_node[w] = StateNode::Host(handle);
                }
            }
            FiberTag::ContextProvider => {
                if let Some(ElementType::Provider(key)) = &self.tree.element_type[w] {
                    self.contexts.pop(key.id());
                }
            }
            FiberTag::HostRoot
            | FiberTag::Fragment
            | FiberTag::FunctionComponent
            | FiberTag::ClassComponent
            | FiberTag::ContextConsumer => {}
            FiberTag::Indeterminate => return Err(self.unknown(wip)),
        }
        Ok(())
    }

    /// Appends the top-level host nodes of `wip`'s subtree to `parent`,
    /// looking through fibers that have no host node of their own.
    fn append_all_children(&mut self, parent: HostHandle, wip: u32) {
        let mut node = self.tree.child[wip as usize];
        while node != INVALID {
            let n = node as usize;
            if self.tree.tag[n].is_host() {
                if let Some(child) = self.tree.state_node[n].host_handle() {
                    self.host.append_child(parent, child);
                }
            } else if self.tree.child[n] != INVALID {
                node = self.tree.child[n];
                continue;
            }
            while self.tree.sibling[node as usize] == INVALID {
                let up = self.tree.parent[node as usize];
                if up == wip || up == INVALID {
                    return;
                }
                node = up;
            }
            node = self.tree.sibling[node as usize];
        }
    }
}
