// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber kinds and side-effect flags.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// The kind of a fiber, fixed when it is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FiberTag {
    /// The root of a tree; its state node is the host container.
    HostRoot,
    /// A host element.
    HostComponent,
    /// A host text node.
    HostText,
    /// A grouping of children with no host node of its own.
    Fragment,
    /// A function component.
    FunctionComponent,
    /// A class component.
    ClassComponent,
    /// A context provider.
    ContextProvider,
    /// A context consumer.
    ContextConsumer,
    /// A component whose kind was never resolved.
    Indeterminate,
}

impl FiberTag {
    /// Returns whether fibers of this kind own a host node.
    #[must_use]
    pub const fn is_host(self) -> bool {
        matches!(self, Self::HostComponent | Self::HostText)
    }

    /// Returns whether fibers of this kind can parent host nodes.
    #[must_use]
    pub const fn is_host_parent(self) -> bool {
        matches!(self, Self::HostComponent | Self::HostRoot)
    }
}

/// Pending side effects on a fiber, set during render and cleared at commit.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    /// No effects.
    pub const NONE: Self = Self(0);
    /// The fiber's host nodes must be inserted into the host parent.
    pub const PLACEMENT: Self = Self(1 << 0);
    /// The fiber's host node needs its props or text updated.
    pub const UPDATE: Self = Self(1 << 1);
    /// Some previous children of this fiber must be deleted.
    pub const CHILD_DELETION: Self = Self(1 << 2);
    /// The fiber has passive effects to fire.
    pub const PASSIVE: Self = Self(1 << 3);
    /// The fiber has layout effects to fire.
    pub const LAYOUT: Self = Self(1 << 4);

    /// Returns whether every flag in `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns whether any flag in `other` is set.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns whether no flag is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sets the flags in `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the flags in `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for Flags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Flags, &str); 5] = [
            (Flags::PLACEMENT, "PLACEMENT"),
            (Flags::UPDATE, "UPDATE"),
            (Flags::CHILD_DELETION, "CHILD_DELETION"),
            (Flags::PASSIVE, "PASSIVE"),
            (Flags::LAYOUT, "LAYOUT"),
        ];
        if self.is_empty() {
            return f.write_str("Flags(NONE)");
        }
        f.write_str("Flags(")?;
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;

    #[test]
    fn insert_and_remove() {
        let mut flags = Flags::NONE;
        flags.insert(Flags::PLACEMENT | Flags::UPDATE);
        assert!(flags.contains(Flags::PLACEMENT));
        assert!(flags.intersects(Flags::UPDATE | Flags::PASSIVE));
        assert!(!flags.contains(Flags::UPDATE | Flags::PASSIVE));
        flags.remove(Flags::PLACEMENT);
        assert_eq!(flags, Flags::UPDATE);
    }

    #[test]
    fn debug_lists_names() {
        assert_eq!(format!("{:?}", Flags::NONE), "Flags(NONE)");
        assert_eq!(
            format!("{:?}", Flags::PLACEMENT | Flags::LAYOUT),
            "Flags(PLACEMENT | LAYOUT)"
        );
    }

    #[test]
    fn host_parent_kinds() {
        assert!(FiberTag::HostRoot.is_host_parent());
        assert!(FiberTag::HostComponent.is_host_parent());
        assert!(!FiberTag::HostText.is_host_parent());
        assert!(FiberTag::HostText.is_host());
        assert!(!FiberTag::Fragment.is_host());
    }
}
