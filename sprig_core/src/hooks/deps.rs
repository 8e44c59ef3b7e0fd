// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dependency lists for memoization and effects.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

/// One comparable dependency value.
///
/// Implemented for every `PartialEq + 'static` type; values of different
/// types never compare equal.
pub trait DepSlot: Any {
    /// Compares with another slot.
    fn same(&self, other: &dyn DepSlot) -> bool;

    /// Upcasts for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: PartialEq + 'static> DepSlot for T {
    fn same(&self, other: &dyn DepSlot) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|o| o == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A dependency list, or its absence.
///
/// Build lists with the [`deps!`](crate::deps) macro. [`Deps::always`] means
/// "no list": the memoized value or effect is redone on every render. An
/// empty list (`deps![]`) never changes, so the work happens once on mount.
#[derive(Clone)]
pub struct Deps {
    slots: Option<Vec<Rc<dyn DepSlot>>>,
}

impl Deps {
    /// No dependency list.
    #[must_use]
    pub fn always() -> Self {
        Self { slots: None }
    }

    /// An empty dependency list.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            slots: Some(Vec::new()),
        }
    }

    /// Appends a dependency value.
    #[must_use]
    pub fn with<T: PartialEq + 'static>(mut self, value: T) -> Self {
        self.slots
            .get_or_insert_with(Vec::new)
            .push(Rc::new(value));
        self
    }

    /// Number of slots, or `None` without a list.
    #[must_use]
    pub fn slot_count(&self) -> Option<usize> {
        self.slots.as_ref().map(Vec::len)
    }

    /// Returns whether nothing changed since `prev`: both are lists and every
    /// slot in their common prefix compares equal.
    #[must_use]
    pub fn unchanged_since(&self, prev: &Self) -> bool {
        let (Some(next), Some(prev)) = (&self.slots, &prev.slots) else {
            return false;
        };
        next.iter().zip(prev.iter()).all(|(a, b)| (**a).same(&**b))
    }
}

impl fmt::Debug for Deps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot_count() {
            Some(n) => write!(f, "Deps({n} slots)"),
            None => f.write_str("Deps(always)"),
        }
    }
}

/// Builds a [`Deps`] list from comparable values.
///
/// ```
/// use sprig_core::deps;
///
/// let count = 3;
/// let label = "clicks";
/// let deps = deps![count, label];
/// assert_eq!(deps.slot_count(), Some(2));
/// ```
#[macro_export]
macro_rules! deps {
    ($($dep:expr),* $(,)?) => {
        $crate::hooks::Deps::empty()$(.with($dep))*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_lists_are_unchanged() {
        assert!(deps![1, "a"].unchanged_since(&deps![1, "a"]));
        assert!(!deps![1, "a"].unchanged_since(&deps![2, "a"]));
        assert!(deps![].unchanged_since(&deps![]), "empty lists never change");
    }

    #[test]
    fn absent_list_always_changes() {
        assert!(!Deps::always().unchanged_since(&Deps::always()));
        assert!(!deps![1].unchanged_since(&Deps::always()));
        assert!(!Deps::always().unchanged_since(&deps![1]));
    }

    #[test]
    fn different_types_differ() {
        assert!(!deps![1_i32].unchanged_since(&deps![1_i64]));
    }

    #[test]
    fn compares_common_prefix() {
        assert!(deps![1, 2].unchanged_since(&deps![1]));
        assert!(!deps![1, 2].unchanged_since(&deps![3]));
    }
}
