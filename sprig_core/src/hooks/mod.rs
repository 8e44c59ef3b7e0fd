// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-component state addressed by call order.
//!
//! A function component receives a [`Hooks`] render context. Every `use_*`
//! call claims the next position in the component's hook list: on mount the
//! position is created, on later renders the record at the same position in
//! the previous list is reused. The order and number of calls must therefore
//! be identical on every render of a component. A render that breaks this
//! fails with [`RenderError::HookMismatch`].
//!
//! Hook records are reference-counted and shared between the two generations
//! of a fiber, so a dispatcher created on mount keeps addressing the same
//! state slot for as long as the component stays mounted.
//!
//! ```
//! use sprig_core::deps;
//! use sprig_core::element::{Element, FunctionComponent, Node};
//!
//! let counter = FunctionComponent::new("Counter", |_props, hooks| {
//!     let (count, set_count) = hooks.use_state(0_i64);
//!     let label = hooks.use_memo(deps![count], || format!("clicked {count} times"));
//!     Element::host("button")
//!         .on("click", move |_| set_count.dispatch(count + 1))
//!         .with_children(label)
//!         .into()
//! });
//! # let _: Node = counter.element(Default::default()).into();
//! ```

mod deps;
mod effect;
mod state;

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::RefCell;
use core::fmt;

pub use deps::{DepSlot, Deps};
pub use effect::{Cleanup, IntoCleanup};
pub use state::{Dispatch, RefBox};

pub(crate) use effect::{Effect, EffectList, EffectTag, run_effects};
pub(crate) use state::{ScheduleUpdate, Updater};

use effect::{Create, EffectInstance};
use state::{Reducer, StateHook};

use crate::context::{Context, ContextStack};
use crate::error::{HookKind, RenderError};
use crate::fiber::{FiberId, Flags};

/// One record in a component's hook list.
#[derive(Clone)]
pub(crate) enum Hook {
    State(Rc<dyn Any>),
    Memo { value: Rc<dyn Any>, deps: Deps },
    Ref(Rc<dyn Any>),
    Effect(Rc<Effect>),
}

impl Hook {
    fn kind(&self) -> HookKind {
        match self {
            Self::State(_) => HookKind::State,
            Self::Memo { .. } => HookKind::Memo,
            Self::Ref(_) => HookKind::Ref,
            Self::Effect(effect) => match effect.tag {
                EffectTag::Layout => HookKind::LayoutEffect,
                EffectTag::Passive => HookKind::Effect,
            },
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({:?})", self.kind())
    }
}

/// What a component render leaves behind on its fiber.
#[derive(Debug)]
pub(crate) struct RenderedHooks {
    pub(crate) hooks: Vec<Hook>,
    pub(crate) effects: EffectList,
    pub(crate) flags: Flags,
}

#[derive(Clone, Copy, Debug)]
struct Violation {
    index: usize,
    expected: Option<HookKind>,
    found: Option<HookKind>,
}

/// Render context handed to a function component.
///
/// Holds the component's hook cursor and the context values visible at its
/// position in the tree. It only lives for the duration of one render call.
pub struct Hooks<'a> {
    fiber: FiberId,
    component: &'a str,
    previous: Option<Vec<Hook>>,
    hooks: Vec<Hook>,
    effects: EffectList,
    flags: Flags,
    contexts: &'a ContextStack,
    updater: &'a Updater,
    violation: Option<Violation>,
}

impl fmt::Debug for Hooks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("fiber", &self.fiber)
            .field("component", &self.component)
            .field("mounting", &self.previous.is_none())
            .field("cursor", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl<'a> Hooks<'a> {
    /// `previous` is the hook list from the fiber's last render, or `None`
    /// on mount.
    pub(crate) fn new(
        fiber: FiberId,
        component: &'a str,
        previous: Option<Vec<Hook>>,
        contexts: &'a ContextStack,
        updater: &'a Updater,
    ) -> Self {
        Self {
            fiber,
            component,
            previous,
            hooks: Vec::new(),
            effects: Vec::new(),
            flags: Flags::NONE,
            contexts,
            updater,
            violation: None,
        }
    }

    /// The fiber being rendered.
    #[must_use]
    pub fn fiber(&self) -> FiberId {
        self.fiber
    }

    /// Name of the component being rendered.
    #[must_use]
    pub fn component_name(&self) -> &str {
        self.component
    }

    /// Returns whether this is the component's first render.
    #[must_use]
    pub fn is_mounting(&self) -> bool {
        self.previous.is_none()
    }

    // -- State --

    /// State with a reducer.
    ///
    /// Returns the current state and a stable dispatcher. Dispatching folds
    /// the action into the state right away, using the reducer passed on the
    /// most recent render, and schedules a render of the root.
    pub fn use_reducer<S, A>(
        &mut self,
        reducer: impl Fn(&S, A) -> S + 'static,
        initial: S,
    ) -> (S, Dispatch<A>)
    where
        S: Clone + 'static,
        A: 'static,
    {
        self.state_hook(Reducer::Apply(Rc::new(reducer)), move || initial)
    }

    /// Like [`use_reducer`](Self::use_reducer), with the initial state
    /// computed as `init(arg)` on mount only.
    pub fn use_reducer_with_init<S, A, I>(
        &mut self,
        reducer: impl Fn(&S, A) -> S + 'static,
        arg: I,
        init: impl FnOnce(I) -> S,
    ) -> (S, Dispatch<A>)
    where
        S: Clone + 'static,
        A: 'static,
    {
        self.state_hook(Reducer::Apply(Rc::new(reducer)), move || init(arg))
    }

    /// Plain state: dispatching a value replaces the state with it.
    pub fn use_state<S: Clone + 'static>(&mut self, initial: S) -> (S, Dispatch<S>) {
        self.state_hook(Reducer::Replace(core::convert::identity), move || initial)
    }

    /// Plain state with a lazily computed initial value.
    pub fn use_state_with<S: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> S,
    ) -> (S, Dispatch<S>) {
        self.state_hook(Reducer::Replace(core::convert::identity), init)
    }

    fn state_hook<S, A>(&mut self, reducer: Reducer<S, A>, init: impl FnOnce() -> S) -> (S, Dispatch<A>)
    where
        S: Clone + 'static,
        A: 'static,
    {
        let existing = match self.next_previous(HookKind::State) {
            Some(Hook::State(rc)) => match rc.downcast::<StateHook<S, A>>() {
                Ok(hook) => Some(hook),
                Err(_) => {
                    self.record_type_change(HookKind::State);
                    None
                }
            },
            _ => None,
        };
        let hook = match existing {
            Some(hook) => {
                hook.set_reducer(reducer);
                hook
            }
            None => StateHook::new(init(), reducer, self.fiber, self.updater.clone()),
        };
        let out = (hook.value(), hook.dispatcher());
        self.hooks.push(Hook::State(hook));
        out
    }

    // -- Memoization --

    /// Returns the value computed by `compute`, recomputing only when `deps`
    /// changed since the last render.
    pub fn use_memo<T: Clone + 'static>(&mut self, deps: Deps, compute: impl FnOnce() -> T) -> T {
        if let Some(Hook::Memo {
            value,
            deps: prev_deps,
        }) = self.next_previous(HookKind::Memo)
            && deps.unchanged_since(&prev_deps)
            && let Some(cached) = value.downcast_ref::<T>()
        {
            let out = cached.clone();
            self.hooks.push(Hook::Memo {
                value,
                deps: prev_deps,
            });
            return out;
        }
        let value = compute();
        self.hooks.push(Hook::Memo {
            value: Rc::new(value.clone()),
            deps,
        });
        value
    }

    /// Returns a shared handle to `callback`, or to the callback cached on a
    /// previous render if `deps` did not change.
    pub fn use_callback<F: 'static>(&mut self, deps: Deps, callback: F) -> Rc<F> {
        self.use_memo(deps, move || Rc::new(callback))
    }

    /// A mutable box created on mount and returned unchanged afterwards.
    pub fn use_ref<T: 'static>(&mut self, initial: T) -> RefBox<T> {
        if let Some(Hook::Ref(rc)) = self.next_previous(HookKind::Ref) {
            match rc.downcast::<RefCell<T>>() {
                Ok(cell) => {
                    self.hooks.push(Hook::Ref(cell.clone()));
                    return RefBox(cell);
                }
                Err(_) => self.record_type_change(HookKind::Ref),
            }
        }
        let cell = Rc::new(RefCell::new(initial));
        self.hooks.push(Hook::Ref(cell.clone()));
        RefBox(cell)
    }

    // -- Effects --

    /// Registers a passive effect.
    ///
    /// `create` runs after the commit that follows this render, in a later
    /// scheduler task, unless `deps` are unchanged since the last render.
    /// Before it runs again, and when the component unmounts, the cleanup
    /// it returned last time runs.
    pub fn use_effect<R: IntoCleanup>(&mut self, deps: Deps, create: impl FnOnce() -> R + 'static) {
        self.push_effect(EffectTag::Passive, deps, create);
    }

    /// Registers a layout effect: like [`use_effect`](Self::use_effect), but
    /// runs synchronously right after the host tree was mutated, before any
    /// passive effect of the same commit.
    pub fn use_layout_effect<R: IntoCleanup>(
        &mut self,
        deps: Deps,
        create: impl FnOnce() -> R + 'static,
    ) {
        self.push_effect(EffectTag::Layout, deps, create);
    }

    fn push_effect<R: IntoCleanup>(
        &mut self,
        tag: EffectTag,
        deps: Deps,
        create: impl FnOnce() -> R + 'static,
    ) {
        let kind = match tag {
            EffectTag::Layout => HookKind::LayoutEffect,
            EffectTag::Passive => HookKind::Effect,
        };
        let previous = match self.next_previous(kind) {
            Some(Hook::Effect(effect)) => Some(effect),
            _ => None,
        };
        let (instance, fire) = match &previous {
            Some(prev) => (prev.instance.clone(), !deps.unchanged_since(&prev.deps)),
            None => (Rc::new(EffectInstance::default()), true),
        };
        let create = fire.then(|| Box::new(move || create().into_cleanup()) as Create);
        if fire {
            self.flags.insert(tag.flag());
        }
        let effect = Rc::new(Effect::new(tag, deps, instance, create));
        self.effects.push(effect.clone());
        self.hooks.push(Hook::Effect(effect));
    }

    // -- Context --

    /// Reads the nearest provided value of `context`, or its default.
    ///
    /// This is not a hook record and may be called conditionally.
    #[must_use]
    pub fn use_context<T: Clone + 'static>(&self, context: &Context<T>) -> T {
        self.contexts
            .read(context.key())
            .downcast_ref::<T>()
            .cloned()
            .unwrap_or_else(|| context.default_value().clone())
    }

    // -- Order checking --

    /// Advances the cursor, returning the previous record at this position
    /// if it has the expected kind.
    fn next_previous(&mut self, kind: HookKind) -> Option<Hook> {
        let index = self.hooks.len();
        let found = self.previous.as_ref()?.get(index).cloned();
        match found {
            Some(hook) if hook.kind() == kind => Some(hook),
            other => {
                self.record(Violation {
                    index,
                    expected: other.map(|h| h.kind()),
                    found: Some(kind),
                });
                None
            }
        }
    }

    fn record_type_change(&mut self, kind: HookKind) {
        self.record(Violation {
            index: self.hooks.len(),
            expected: Some(kind),
            found: Some(kind),
        });
    }

    fn record(&mut self, violation: Violation) {
        if self.violation.is_none() {
            self.violation = Some(violation);
        }
    }

    /// Ends the render, checking the hook count against the previous render.
    pub(crate) fn finish(mut self) -> Result<RenderedHooks, RenderError> {
        let index = self.hooks.len();
        if let Some(previous) = &self.previous
            && let Some(missing) = previous.get(index)
        {
            let expected = Some(missing.kind());
            self.record(Violation {
                index,
                expected,
                found: None,
            });
        }
        if let Some(v) = self.violation {
            return Err(RenderError::HookMismatch {
                fiber: self.fiber,
                component: self.component.to_string(),
                index: v.index,
                expected: v.expected,
                found: v.found,
            });
        }
        Ok(RenderedHooks {
            hooks: self.hooks,
            effects: self.effects,
            flags: self.flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::context::create_context;
    use crate::deps;

    const FIBER: FiberId = FiberId {
        idx: 1,
        generation: 0,
    };

    /// Renders `body` against the previous hook list and returns the new one.
    fn render_once<R>(
        previous: Option<Vec<Hook>>,
        body: impl FnOnce(&mut Hooks<'_>) -> R,
    ) -> (R, Result<RenderedHooks, RenderError>) {
        let contexts = ContextStack::new();
        let updater = Updater::detached();
        let mut hooks = Hooks::new(FIBER, "Test", previous, &contexts, &updater);
        let out = body(&mut hooks);
        (out, hooks.finish())
    }

    fn ok(result: Result<RenderedHooks, RenderError>) -> RenderedHooks {
        result.expect("hook order is stable")
    }

    #[test]
    fn state_survives_rerender_and_dispatch() {
        let ((count, set), first) = render_once(None, |h| h.use_state(1_i32));
        assert_eq!(count, 1);
        set.dispatch(7);

        let first = ok(first);
        let ((count, set_again), _) = render_once(Some(first.hooks), |h| h.use_state(1_i32));
        assert_eq!(count, 7, "dispatched value is visible on the next render");
        assert!(set.ptr_eq(&set_again), "dispatcher is stable");
    }

    #[test]
    fn reducer_uses_latest_reducer() {
        let ((_, dispatch), first) =
            render_once(None, |h| h.use_reducer(|s: &i32, a: i32| s + a, 2));
        let first = ok(first);
        // Re-render with a different reducer; later dispatches use it.
        let (_, second) = render_once(Some(first.hooks), |h| {
            h.use_reducer(|s: &i32, a: i32| s * a, 2)
        });
        let second = ok(second);
        dispatch.dispatch(3);
        let ((value, _), _) = render_once(Some(second.hooks), |h| {
            h.use_reducer(|s: &i32, a: i32| s * a, 2)
        });
        assert_eq!(value, 6, "2 * 3 with the latest reducer");
    }

    #[test]
    fn reducer_with_init_runs_init_once() {
        let calls = Rc::new(RefCell::new(0));
        let c = calls.clone();
        let ((value, _), first) = render_once(None, |h| {
            h.use_reducer_with_init(|s: &i32, a: i32| s + a, 20, move |n| {
                *c.borrow_mut() += 1;
                n * 2
            })
        });
        assert_eq!(value, 40);
        let c = calls.clone();
        let _ = render_once(Some(ok(first).hooks), |h| {
            h.use_reducer_with_init(|s: &i32, a: i32| s + a, 20, move |n| {
                *c.borrow_mut() += 1;
                n * 2
            })
        });
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn memo_recomputes_only_when_deps_change() {
        let calls = Rc::new(RefCell::new(0));
        let compute = |calls: &Rc<RefCell<i32>>, n: i32| {
            let calls = calls.clone();
            move || {
                *calls.borrow_mut() += 1;
                n * 10
            }
        };

        let (v, first) = render_once(None, |h| h.use_memo(deps![1], compute(&calls, 1)));
        assert_eq!(v, 10);
        let (v, second) = render_once(Some(ok(first).hooks), |h| {
            h.use_memo(deps![1], compute(&calls, 99))
        });
        assert_eq!(v, 10, "cached");
        let (v, _) = render_once(Some(ok(second).hooks), |h| {
            h.use_memo(deps![2], compute(&calls, 2))
        });
        assert_eq!(v, 20);
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn memo_without_deps_always_recomputes() {
        let (_, first) = render_once(None, |h| h.use_memo(Deps::always(), || 1));
        let (v, _) = render_once(Some(ok(first).hooks), |h| h.use_memo(Deps::always(), || 2));
        assert_eq!(v, 2);
    }

    #[test]
    fn callback_identity_follows_deps() {
        fn one() -> i32 {
            1
        }
        let callback = one as fn() -> i32;
        let (a, first) = render_once(None, |h| h.use_callback(deps!["x"], callback));
        let (b, second) = render_once(Some(ok(first).hooks), |h| h.use_callback(deps!["x"], callback));
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(b(), 1);
        let (c, _) = render_once(Some(ok(second).hooks), |h| h.use_callback(deps!["y"], callback));
        assert!(!Rc::ptr_eq(&a, &c));
    }

    #[test]
    fn ref_is_stable() {
        let (r, first) = render_once(None, |h| h.use_ref(0_u32));
        r.set(5);
        let (again, _) = render_once(Some(ok(first).hooks), |h| h.use_ref(0_u32));
        assert!(r.ptr_eq(&again));
        assert_eq!(again.get(), 5);
    }

    #[test]
    fn effects_fire_on_mount_and_when_deps_change() {
        let (_, first) = render_once(None, |h| {
            h.use_layout_effect(deps![1], || {});
            h.use_effect(deps![1], || {});
        });
        let first = ok(first);
        assert!(first.flags.contains(Flags::LAYOUT | Flags::PASSIVE));
        assert!(first.effects.iter().all(|e| e.fire));

        let (_, second) = render_once(Some(first.hooks), |h| {
            h.use_layout_effect(deps![1], || {});
            h.use_effect(deps![2], || {});
        });
        let second = ok(second);
        assert_eq!(second.flags, Flags::PASSIVE, "only the passive deps changed");
        assert_eq!(second.effects.len(), 2, "unchanged effects keep their record");
        assert!(!second.effects[0].fire);
        assert!(second.effects[1].fire);
    }

    #[test]
    fn effect_records_share_instance_across_renders() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let effect = |log: &Rc<RefCell<Vec<&'static str>>>| {
            let log = log.clone();
            move || {
                log.borrow_mut().push("create");
                let log = log.clone();
                Cleanup::new(move || log.borrow_mut().push("destroy"))
            }
        };
        let (_, first) = render_once(None, |h| h.use_effect(Deps::always(), effect(&log)));
        let first = ok(first);
        run_effects(&first.effects);
        let (_, second) = render_once(Some(first.hooks), |h| h.use_effect(Deps::always(), effect(&log)));
        run_effects(&ok(second).effects);
        assert_eq!(*log.borrow(), vec!["create", "destroy", "create"]);
    }

    #[test]
    fn fewer_hooks_is_a_mismatch() {
        let (_, first) = render_once(None, |h| {
            h.use_state(0_u8);
            h.use_ref(());
        });
        let (_, second) = render_once(Some(ok(first).hooks), |h| {
            h.use_state(0_u8);
        });
        match second {
            Err(RenderError::HookMismatch {
                index,
                expected,
                found,
                ..
            }) => {
                assert_eq!(index, 1);
                assert_eq!(expected, Some(HookKind::Ref));
                assert_eq!(found, None);
            }
            other => panic!("expected a mismatch, got {other:?}"),
        }
    }

    #[test]
    fn extra_hook_is_a_mismatch() {
        let (_, first) = render_once(None, |h| {
            h.use_state(0_u8);
        });
        let (_, second) = render_once(Some(ok(first).hooks), |h| {
            h.use_state(0_u8);
            h.use_memo(deps![], || 1);
        });
        assert!(matches!(
            second,
            Err(RenderError::HookMismatch {
                index: 1,
                expected: None,
                found: Some(HookKind::Memo),
                ..
            })
        ));
    }

    #[test]
    fn swapped_kinds_are_a_mismatch() {
        let (_, first) = render_once(None, |h| h.use_effect(deps![], || {}));
        let (_, second) = render_once(Some(ok(first).hooks), |h| {
            h.use_layout_effect(deps![], || {});
        });
        assert!(matches!(
            second,
            Err(RenderError::HookMismatch {
                index: 0,
                expected: Some(HookKind::Effect),
                found: Some(HookKind::LayoutEffect),
                ..
            })
        ));
    }

    #[test]
    fn context_reads_stack_or_default() {
        let theme = create_context("light");
        let mut contexts = ContextStack::new();
        let updater = Updater::detached();
        {
            let hooks = Hooks::new(FIBER, "Themed", None, &contexts, &updater);
            assert_eq!(hooks.use_context(&theme), "light");
        }
        contexts.push(theme.id(), Rc::new("dark"));
        let hooks = Hooks::new(FIBER, "Themed", None, &contexts, &updater);
        assert_eq!(hooks.use_context(&theme), "dark");
        assert!(hooks.finish().is_ok(), "context reads are not hook records");
    }
}
