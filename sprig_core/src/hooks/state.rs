// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State slots, dispatchers and the update path back to the root.

use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::fmt;

use crate::fiber::FiberId;

/// Receives "this fiber has new state" notifications from dispatchers.
pub(crate) trait ScheduleUpdate {
    fn schedule_update_on_fiber(&self, fiber: FiberId);
}

struct Detached;

impl ScheduleUpdate for Detached {
    fn schedule_update_on_fiber(&self, fiber: FiberId) {
        _ = fiber;
    }
}

/// Weak link from hook state to the root that owns it.
#[derive(Clone)]
pub(crate) struct Updater(Weak<dyn ScheduleUpdate>);

impl Updater {
    pub(crate) fn new(target: Weak<dyn ScheduleUpdate>) -> Self {
        Self(target)
    }

    /// An updater that drops every notification.
    pub(crate) fn detached() -> Self {
        Self(Weak::<Detached>::new())
    }

    pub(crate) fn schedule(&self, fiber: FiberId) {
        if let Some(target) = self.0.upgrade() {
            target.schedule_update_on_fiber(fiber);
        }
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("attached", &(self.0.strong_count() > 0))
            .finish()
    }
}

/// How a dispatched action becomes the next state.
pub(crate) enum Reducer<S, A> {
    /// The action converted is the next state.
    Replace(fn(A) -> S),
    /// A reducer folds the action into the current state.
    Apply(Rc<dyn Fn(&S, A) -> S>),
}

/// Sends actions to a state hook.
///
/// A dispatcher is stable for the lifetime of its hook: every render returns
/// a handle to the same closure, so it can be stored, compared with
/// [`ptr_eq`](Self::ptr_eq), or listed as a dependency. Dispatching after the
/// component unmounted does nothing.
pub struct Dispatch<A>(Rc<dyn Fn(A)>);

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A> Dispatch<A> {
    /// Applies `action` to the state immediately and schedules a re-render of
    /// the owning root.
    pub fn dispatch(&self, action: A) {
        (self.0)(action);
    }

    /// Returns whether both handles belong to the same hook.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<A> PartialEq for Dispatch<A> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<A> fmt::Debug for Dispatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch").finish_non_exhaustive()
    }
}

/// One state slot, shared by both generations of its fiber.
pub(crate) struct StateHook<S, A> {
    value: RefCell<S>,
    reducer: RefCell<Reducer<S, A>>,
    dispatch: Dispatch<A>,
}

impl<S: 'static, A: 'static> StateHook<S, A> {
    pub(crate) fn new(
        initial: S,
        reducer: Reducer<S, A>,
        fiber: FiberId,
        updater: Updater,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let dispatch = Dispatch(Rc::new(move |action: A| {
                let Some(hook) = weak.upgrade() else {
                    return;
                };
                hook.apply(action);
                updater.schedule(fiber);
            }));
            Self {
                value: RefCell::new(initial),
                reducer: RefCell::new(reducer),
                dispatch,
            }
        })
    }

    fn apply(&self, action: A) {
        let next = match &*self.reducer.borrow() {
            Reducer::Replace(convert) => convert(action),
            Reducer::Apply(reduce) => reduce(&self.value.borrow(), action),
        };
        *self.value.borrow_mut() = next;
    }

    /// Installs the reducer passed on the latest render.
    pub(crate) fn set_reducer(&self, reducer: Reducer<S, A>) {
        *self.reducer.borrow_mut() = reducer;
    }

    pub(crate) fn dispatcher(&self) -> Dispatch<A> {
        self.dispatch.clone()
    }
}

impl<S: Clone, A> StateHook<S, A> {
    pub(crate) fn value(&self) -> S {
        self.value.borrow().clone()
    }
}

/// A mutable box that survives re-renders, returned by
/// [`Hooks::use_ref`](super::Hooks::use_ref).
pub struct RefBox<T>(pub(crate) Rc<RefCell<T>>);

impl<T> Clone for RefBox<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> RefBox<T> {
    /// Borrows the current value.
    ///
    /// # Panics
    ///
    /// Panics if the value is currently mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> core::cell::Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrows the current value.
    ///
    /// # Panics
    ///
    /// Panics if the value is currently borrowed.
    #[must_use]
    pub fn borrow_mut(&self) -> core::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Replaces the value, returning the old one.
    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    /// Sets the value.
    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    /// Returns whether both handles share storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> RefBox<T> {
    /// Returns a copy of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for RefBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefBox").field(&self.0.borrow()).finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;

    struct Recorder(RefCell<Vec<FiberId>>);

    impl ScheduleUpdate for Recorder {
        fn schedule_update_on_fiber(&self, fiber: FiberId) {
            self.0.borrow_mut().push(fiber);
        }
    }

    const FIBER: FiberId = FiberId {
        idx: 4,
        generation: 0,
    };

    #[test]
    fn dispatch_folds_actions_in_order() {
        let recorder = Rc::new(Recorder(RefCell::new(Vec::new())));
        let weak: Weak<dyn ScheduleUpdate> = Rc::downgrade(&recorder) as Weak<Recorder>;
        let hook = StateHook::new(
            10_i64,
            Reducer::Apply(Rc::new(|s: &i64, a: i64| s + a)),
            FIBER,
            Updater::new(weak),
        );
        let dispatch = hook.dispatcher();
        dispatch.dispatch(1);
        dispatch.dispatch(5);
        assert_eq!(hook.value(), 16);
        assert_eq!(recorder.0.borrow().len(), 2, "one notification per dispatch");
        assert!(dispatch.ptr_eq(&hook.dispatcher()), "stable dispatcher");
    }

    #[test]
    fn replace_sets_state_verbatim() {
        let hook = StateHook::new(
            "a",
            Reducer::Replace(core::convert::identity),
            FIBER,
            Updater::detached(),
        );
        hook.dispatcher().dispatch("b");
        assert_eq!(hook.value(), "b");
    }

    #[test]
    fn dispatch_after_drop_is_ignored() {
        let hook = StateHook::new(0_u8, Reducer::Replace(core::convert::identity), FIBER, Updater::detached());
        let dispatch = hook.dispatcher();
        drop(hook);
        dispatch.dispatch(9);
    }

    #[test]
    fn ref_box_shares_storage() {
        let a = RefBox(Rc::new(RefCell::new(1)));
        let b = a.clone();
        b.set(2);
        assert_eq!(a.get(), 2);
        assert_eq!(a.replace(3), 2);
        assert!(a.ptr_eq(&b));
    }
}
