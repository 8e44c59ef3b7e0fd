// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effect records.
//!
//! Each `use_effect` / `use_layout_effect` call produces an [`Effect`]
//! appended to the fiber's effect list. Records that share a hook position
//! across renders share one [`EffectInstance`], which holds the cleanup left
//! by the last creator that ran.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use super::Deps;
use crate::fiber::Flags;

/// Teardown returned by an effect creator.
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    /// Wraps a closure.
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Box::new(f))
    }

    fn run(self) {
        (self.0)();
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup").finish_non_exhaustive()
    }
}

/// Values an effect creator may return.
pub trait IntoCleanup {
    /// Converts into an optional cleanup.
    fn into_cleanup(self) -> Option<Cleanup>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Cleanup> {
        None
    }
}

impl IntoCleanup for Cleanup {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(self)
    }
}

impl IntoCleanup for Option<Cleanup> {
    fn into_cleanup(self) -> Option<Cleanup> {
        self
    }
}

/// When an effect fires relative to commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum EffectTag {
    /// Synchronously after mutation.
    Layout,
    /// Deferred to a later scheduler task.
    Passive,
}

impl EffectTag {
    pub(crate) const fn flag(self) -> Flags {
        match self {
            Self::Layout => Flags::LAYOUT,
            Self::Passive => Flags::PASSIVE,
        }
    }
}

/// Storage shared by an effect's records across renders.
#[derive(Default)]
pub(crate) struct EffectInstance {
    destroy: RefCell<Option<Cleanup>>,
}

pub(crate) type Create = Box<dyn FnOnce() -> Option<Cleanup>>;

pub(crate) struct Effect {
    pub(crate) tag: EffectTag,
    /// Whether this record's creator runs at the next commit.
    pub(crate) fire: bool,
    create: RefCell<Option<Create>>,
    pub(crate) deps: Deps,
    pub(crate) instance: Rc<EffectInstance>,
}

impl Effect {
    pub(crate) fn new(
        tag: EffectTag,
        deps: Deps,
        instance: Rc<EffectInstance>,
        create: Option<Create>,
    ) -> Self {
        Self {
            tag,
            fire: create.is_some(),
            create: RefCell::new(create),
            deps,
            instance,
        }
    }

    /// Runs and clears the cleanup left by the previous creator.
    pub(crate) fn run_destroy(&self) {
        let cleanup = self.instance.destroy.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup.run();
        }
    }

    /// Runs the creator, at most once, and stores its cleanup.
    pub(crate) fn run_create(&self) {
        let create = self.create.borrow_mut().take();
        if let Some(create) = create {
            let destroy = create();
            *self.instance.destroy.borrow_mut() = destroy;
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("tag", &self.tag)
            .field("fire", &self.fire)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

/// A fiber's effects, in hook call order.
///
/// Kept as a flat `Vec` and walked whole at commit.
pub(crate) type EffectList = Vec<Rc<Effect>>;

/// Runs every pending cleanup, then every pending creator.
pub(crate) fn run_effects(effects: &[Rc<Effect>]) {
    for effect in effects {
        effect.run_destroy();
    }
    for effect in effects {
        effect.run_create();
    }
}
