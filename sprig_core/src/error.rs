// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render failures.
//!
//! None of these are retried. A root that hits one records it, keeps its
//! last committed tree, and stops rendering (see [`Root::error`](crate::root::Root::error)).

use alloc::string::String;
use core::fmt;

use crate::element::Key;
use crate::fiber::{FiberId, FiberTag};

/// Hook kind as seen by the call-order check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// `use_state` / `use_reducer`.
    State,
    /// `use_memo` / `use_callback`.
    Memo,
    /// `use_ref`.
    Ref,
    /// `use_effect`.
    Effect,
    /// `use_layout_effect`.
    LayoutEffect,
}

/// A fatal error raised while rendering or committing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// The work loop met a node whose kind it cannot process.
    UnknownWorkTag {
        /// Offending node.
        fiber: FiberId,
        /// Its tag.
        tag: FiberTag,
    },
    /// A node to be placed has no host component or root above it.
    MissingHostParent {
        /// The node being placed.
        fiber: FiberId,
    },
    /// A component called its hooks in a different order or number than on
    /// its previous render.
    HookMismatch {
        /// The component's node.
        fiber: FiberId,
        /// Component name.
        component: String,
        /// Hook position where the mismatch was detected.
        index: usize,
        /// Hook recorded at that position last time, if any.
        expected: Option<HookKind>,
        /// Hook called this time, if any.
        found: Option<HookKind>,
    },
    /// Two siblings in one child list share a key.
    DuplicateKey {
        /// The parent whose children were being reconciled.
        parent: FiberId,
        /// The repeated key.
        key: Key,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownWorkTag { fiber, tag } => {
                write!(f, "unknown unit of work tag {tag:?} on {fiber:?}")
            }
            Self::MissingHostParent { fiber } => {
                write!(f, "expected to find a host parent for {fiber:?}")
            }
            Self::HookMismatch {
                fiber,
                component,
                index,
                expected,
                found,
            } => write!(
                f,
                "hook order changed in `{component}` ({fiber:?}) at position {index}: \
                 expected {expected:?}, found {found:?}"
            ),
            Self::DuplicateKey { parent, key } => {
                write!(f, "duplicate key {key:?} among children of {parent:?}")
            }
        }
    }
}

impl core::error::Error for RenderError {}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_names_the_problem() {
        let fiber = FiberId {
            idx: 3,
            generation: 1,
        };
        let err = RenderError::MissingHostParent { fiber };
        assert_eq!(
            err.to_string(),
            "expected to find a host parent for FiberId(3@gen1)"
        );

        let err = RenderError::HookMismatch {
            fiber,
            component: "Counter".into(),
            index: 2,
            expected: Some(HookKind::Effect),
            found: None,
        };
        let text = err.to_string();
        assert!(text.contains("`Counter`"), "got: {text}");
        assert!(text.contains("position 2"), "got: {text}");
    }
}
