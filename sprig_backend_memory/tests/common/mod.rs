// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared setup for the end-to-end tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::rc::Rc;

use sprig_backend_memory::{HostOp, MemoryHost};
use sprig_core::element::{Element, Node};
use sprig_core::host::HostHandle;
use sprig_core::root::{CommitChanges, Root, create_root};
use sprig_core::scheduler::{ManualHost, Scheduler, SchedulerConfig};

/// A root rendering into a fresh [`MemoryHost`] on a manual clock.
pub struct App {
    pub clock: Rc<ManualHost>,
    pub scheduler: Scheduler,
    pub host: MemoryHost,
    pub container: HostHandle,
    pub root: Root,
}

impl App {
    pub fn new() -> Self {
        let clock = Rc::new(ManualHost::new());
        let scheduler = Scheduler::new(SchedulerConfig::standard(), clock.clone());
        let host = MemoryHost::new();
        let container = host.create_container();
        let root = create_root(container, Box::new(host.clone()), &scheduler);
        Self {
            clock,
            scheduler,
            host,
            container,
            root,
        }
    }

    /// Renders `node` and runs the scheduler until idle.
    pub fn render(&self, node: impl Into<Node>) -> CommitChanges {
        self.root.render(node);
        self.flush();
        self.changes()
    }

    pub fn flush(&self) {
        self.clock.run_until_idle(&self.scheduler);
    }

    pub fn markup(&self) -> String {
        self.host.inner_markup(self.container)
    }

    pub fn changes(&self) -> CommitChanges {
        self.root.last_commit().expect("at least one commit")
    }

    /// Keys of the fibers placed by the last commit, in commit order.
    pub fn placed_keys(&self) -> Vec<String> {
        let tree = self.root.tree();
        self.changes()
            .placements
            .iter()
            .filter_map(|&idx| tree.key_at(idx).map(|k| k.as_str().to_owned()))
            .collect()
    }

    /// Drains the host op log.
    pub fn take_ops(&self) -> Vec<HostOp> {
        self.host.take_ops()
    }
}

/// `<li key=k>k</li>` for each key.
pub fn keyed_items(keys: &[&str]) -> Node {
    Node::list(
        keys.iter()
            .map(|&k| Element::host("li").with_key(k).with_children(k)),
    )
}

/// `<ul>` around [`keyed_items`].
pub fn keyed_list(keys: &[&str]) -> Element {
    Element::host("ul").with_children(keyed_items(keys))
}
