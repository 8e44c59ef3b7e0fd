// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Context values scoped to subtrees.
//!
//! A [`Context`] is created once with a default value. A provider element
//! makes a value visible to every descendant rendered beneath it; readers get
//! the innermost provider's value or, with no provider above them, the
//! default.
//!
//! The work loop keeps the visible values in a [`ContextStack`]: begin-work
//! on a provider pushes, complete-work on the same provider pops. Because a
//! render pass is a depth-first walk, pushes and pops always nest.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::element::{Element, ElementType, Node, PropValue, Props, RenderFn};

/// Prop under which a provider element carries its value.
pub(crate) const VALUE_PROP: &str = "value";

/// Prop under which a consumer element carries its children function.
pub(crate) const RENDER_PROP: &str = "render";

static NEXT_CONTEXT_ID: AtomicU32 = AtomicU32::new(0);

/// Process-unique identity of a [`Context`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(u32);

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", self.0)
    }
}

/// Type-erased context identity plus its default value, as carried by
/// provider and consumer element types.
#[derive(Clone)]
pub struct ContextKey {
    id: ContextId,
    default: Rc<dyn Any>,
}

impl ContextKey {
    /// Returns the context's id.
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub(crate) fn default_value(&self) -> &Rc<dyn Any> {
        &self.default
    }
}

impl fmt::Debug for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextKey")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// A typed context handle.
pub struct Context<T> {
    key: ContextKey,
    default: Rc<T>,
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            default: self.default.clone(),
        }
    }
}

impl<T> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context({:?})", self.key.id)
    }
}

/// Creates a context whose readers see `default` when no provider is above
/// them.
pub fn create_context<T: 'static>(default: T) -> Context<T> {
    let id = ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
    let default = Rc::new(default);
    Context {
        key: ContextKey {
            id,
            default: default.clone(),
        },
        default,
    }
}

impl<T: 'static> Context<T> {
    /// Returns the context's id.
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.key.id
    }

    /// Returns the value readers see without a provider.
    #[must_use]
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Returns the type-erased key.
    #[must_use]
    pub fn key(&self) -> &ContextKey {
        &self.key
    }

    /// Builds a provider element making `value` visible to `children`.
    #[must_use]
    pub fn provider(&self, value: T, children: impl Into<Node>) -> Element {
        let props = Props::new()
            .with(VALUE_PROP, PropValue::Value(Rc::new(value)))
            .with_children(children);
        Element::new(ElementType::Provider(self.key.clone()), props)
    }

    /// Builds a consumer element whose children are `render` applied to the
    /// current value.
    #[must_use]
    pub fn consumer(&self, render: impl Fn(&T) -> Node + 'static) -> Element {
        let render = RenderFn::new(move |value: &dyn Any| {
            value.downcast_ref::<T>().map_or(Node::Empty, &render)
        });
        let props = Props::new().with(RENDER_PROP, PropValue::Render(render));
        Element::new(ElementType::Consumer(self.key.clone()), props)
    }
}

/// Values visible at the current point of a render pass.
#[derive(Default)]
pub struct ContextStack {
    current: BTreeMap<ContextId, Rc<dyn Any>>,
    saved: Vec<(ContextId, Option<Rc<dyn Any>>)>,
}

impl fmt::Debug for ContextStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextStack")
            .field("depth", &self.saved.len())
            .finish_non_exhaustive()
    }
}

impl ContextStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `value` the current value of `id`, saving the previous one.
    pub fn push(&mut self, id: ContextId, value: Rc<dyn Any>) {
        let previous = self.current.insert(id, value);
        self.saved.push((id, previous));
    }

    /// Restores the value `id` had before the matching [`push`](Self::push).
    ///
    /// # Panics
    ///
    /// Panics if the most recent push was for a different context, or if
    /// nothing was pushed.
    pub fn pop(&mut self, id: ContextId) {
        let (top, previous) = self
            .saved
            .pop()
            .unwrap_or_else(|| panic!("context stack underflow popping {id:?}"));
        assert_eq!(top, id, "unbalanced context pop");
        match previous {
            Some(value) => {
                self.current.insert(id, value);
            }
            None => {
                self.current.remove(&id);
            }
        }
    }

    /// Current value of `key`'s context, falling back to its default.
    #[must_use]
    pub fn read(&self, key: &ContextKey) -> Rc<dyn Any> {
        self.current
            .get(&key.id)
            .unwrap_or(&key.default)
            .clone()
    }

    /// Number of providers currently pushed.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(stack: &ContextStack, ctx: &Context<&'static str>) -> &'static str {
        *stack
            .read(ctx.key())
            .downcast_ref::<&'static str>()
            .expect("string context")
    }

    #[test]
    fn default_without_provider() {
        let theme = create_context("light");
        let stack = ContextStack::new();
        assert_eq!(value_of(&stack, &theme), "light");
    }

    #[test]
    fn nested_providers_restore_on_pop() {
        let theme = create_context("light");
        let mut stack = ContextStack::new();
        stack.push(theme.id(), Rc::new("dark"));
        stack.push(theme.id(), Rc::new("sepia"));
        assert_eq!(value_of(&stack, &theme), "sepia");
        assert_eq!(stack.depth(), 2);

        stack.pop(theme.id());
        assert_eq!(value_of(&stack, &theme), "dark");
        stack.pop(theme.id());
        assert_eq!(value_of(&stack, &theme), "light", "back to default");
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn contexts_are_independent() {
        let a = create_context("a");
        let b = create_context("b");
        assert_ne!(a.id(), b.id());
        let mut stack = ContextStack::new();
        stack.push(a.id(), Rc::new("a2"));
        assert_eq!(value_of(&stack, &a), "a2");
        assert_eq!(value_of(&stack, &b), "b");
    }

    #[test]
    #[should_panic(expected = "unbalanced context pop")]
    fn mismatched_pop_panics() {
        let a = create_context(0_u8);
        let b = create_context(0_u8);
        let mut stack = ContextStack::new();
        stack.push(a.id(), Rc::new(1_u8));
        stack.pop(b.id());
    }

    #[test]
    fn consumer_render_fn_downcasts() {
        let count = create_context(0_i64);
        let el = count.consumer(|n| Node::from(*n * 2));
        let Some(PropValue::Render(render)) = el.props().get(RENDER_PROP) else {
            panic!("consumer carries a render prop");
        };
        assert_eq!(render.call(&21_i64).as_text(), Some("42"));
        assert!(render.call(&"wrong type").is_empty(), "type mismatch renders nothing");
    }
}
