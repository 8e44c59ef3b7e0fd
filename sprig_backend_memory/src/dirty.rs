// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Every host mutation marks one or more channels in the document's
//! [`DirtyTracker`](understory_dirty::DirtyTracker).
//! [`MemoryHost::evaluate`](crate::MemoryHost::evaluate) drains them and
//! reports the result as [`HostChanges`](crate::HostChanges).
//!
//! [`CONNECTED`] is the only propagating channel: nodes have a dependency
//! edge to their parent on it, and attaching or detaching a node marks it
//! with [`EagerPolicy`](understory_dirty::EagerPolicy) so its whole subtree
//! is re-checked. The other channels are local to the marked node.

use understory_dirty::Channel;

/// Attributes or listeners changed.
pub const ATTRIBUTES: Channel = Channel::new(0);

/// Text content changed.
pub const TEXT: Channel = Channel::new(1);

/// The child list changed.
pub const CHILDREN: Channel = Channel::new(2);

/// The node may have been attached to or detached from its container.
pub const CONNECTED: Channel = Channel::new(3);
