// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host tree for sprig.
//!
//! [`MemoryHost`] implements [`HostTree`](sprig_core::host::HostTree) over a
//! struct-of-arrays document. Besides applying mutations it keeps:
//!
//! - an operation log ([`HostOp`]) in application order,
//! - multi-channel dirty state (see [`dirty`]) drained by
//!   [`MemoryHost::evaluate`] into [`HostChanges`],
//! - markup serialization for assertions and demos,
//! - event dispatch to listeners registered through `on*` props.
//!
//! ```
//! use std::rc::Rc;
//!
//! use sprig_backend_memory::MemoryHost;
//! use sprig_core::element::Element;
//! use sprig_core::root::create_root;
//! use sprig_core::scheduler::{ManualHost, Scheduler, SchedulerConfig};
//!
//! let clock = Rc::new(ManualHost::new());
//! let scheduler = Scheduler::new(SchedulerConfig::standard(), clock.clone());
//! let host = MemoryHost::new();
//! let container = host.create_container();
//! let root = create_root(container, Box::new(host.clone()), &scheduler);
//!
//! root.render(Element::host("h1").with_attr("class", "title").with_children("Hello"));
//! clock.run_until_idle(&scheduler);
//! assert_eq!(host.inner_markup(container), r#"<h1 class="title">Hello</h1>"#);
//! ```

#![no_std]

extern crate alloc;

pub mod dirty;

mod document;
mod host;

pub use document::{HostChanges, HostOp, NodeKind};
pub use host::MemoryHost;
