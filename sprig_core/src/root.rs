// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Roots: where a tree meets a host container and a scheduler.
//!
//! A [`Root`] owns one fiber arena and one host tree. [`Root::render`] stores
//! the new descriptor and schedules a render task; state dispatches from
//! components schedule the same task. A root never has more than one render
//! task pending, so any number of updates before it runs collapse into one
//! render and one commit.
//!
//! Each task renders the whole tree, commits it, and runs layout effects
//! before returning. Passive effects are queued as a separate task and are
//! also flushed before the next render starts.
//!
//! ```
//! use std::rc::Rc;
//!
//! use sprig_core::element::{Element, Node};
//! use sprig_core::host::{HostHandle, HostTree};
//! use sprig_core::element::Props;
//! use sprig_core::root::create_root;
//! use sprig_core::scheduler::{ManualHost, Scheduler, SchedulerConfig};
//!
//! #[derive(Default)]
//! struct CountingHost {
//!     next: u32,
//! }
//!
//! impl HostTree for CountingHost {
//!     fn create_instance(&mut self, _: &str) -> HostHandle {
//!         self.next += 1;
//!         HostHandle(self.next)
//!     }
//!     fn create_text_instance(&mut self, _: &str) -> HostHandle {
//!         self.next += 1;
//!         HostHandle(self.next)
//!     }
//!     fn append_child(&mut self, _: HostHandle, _: HostHandle) {}
//!     fn insert_before(&mut self, _: HostHandle, _: HostHandle, _: HostHandle) {}
//!     fn remove_child(&mut self, _: HostHandle, _: HostHandle) {}
//!     fn commit_props_update(&mut self, _: HostHandle, _: Option<&Props>, _: &Props) {}
//!     fn commit_text_update(&mut self, _: HostHandle, _: &str, _: &str) {}
//! }
//!
//! let clock = Rc::new(ManualHost::new());
//! let scheduler = Scheduler::new(SchedulerConfig::standard(), clock.clone());
//! let root = create_root(HostHandle(0), Box::new(CountingHost::default()), &scheduler);
//!
//! root.render(Element::host("p").with_children("hello"));
//! assert_eq!(root.commit_count(), 0, "nothing happens until the scheduler runs");
//! clock.run_until_idle(&scheduler);
//! assert_eq!(root.commit_count(), 1);
//! assert_eq!(root.last_commit().map(|c| c.placements.len()), Some(1));
//! # let _ = Node::Empty;
//! ```

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell};
use core::fmt;
use core::mem;

use crate::element::Node;
use crate::error::RenderError;
use crate::fiber::{FiberId, FiberTree};
use crate::hooks::{ScheduleUpdate, Updater, run_effects};
use crate::host::{HostHandle, HostTree};
use crate::scheduler::{Callback, PriorityLevel, Scheduler, TaskId};
use crate::time::HostTime;
use crate::trace::{
    CommitSummaryBuilder, PhaseBeginEvent, PhaseEndEvent, PhaseKind, RenderFailedEvent, TaskEvent,
    TaskKind, TraceSink, Tracer, UpdateScheduledEvent,
};
use crate::work::{Committed, PendingPassive, WorkLoop, commit_root};

pub use crate::work::CommitChanges;

/// Scheduling options for a [`Root`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootConfig {
    /// Priority of render-and-commit tasks.
    pub render_priority: PriorityLevel,
    /// Priority of passive effect flushes.
    pub passive_priority: PriorityLevel,
}

impl RootConfig {
    /// Both tasks at [`PriorityLevel::Normal`].
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            render_priority: PriorityLevel::Normal,
            passive_priority: PriorityLevel::Normal,
        }
    }

    /// Returns a copy with a different render priority.
    #[must_use]
    pub const fn with_render_priority(mut self, priority: PriorityLevel) -> Self {
        self.render_priority = priority;
        self
    }

    /// Returns a copy with a different passive effect priority.
    #[must_use]
    pub const fn with_passive_priority(mut self, priority: PriorityLevel) -> Self {
        self.passive_priority = priority;
        self
    }
}

impl Default for RootConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Passive effects waiting for their flush, tagged with their commit.
struct QueuedPassive {
    commit_index: u64,
    effects: PendingPassive,
}

struct RootInner {
    this: Weak<Self>,
    container: HostHandle,
    config: RootConfig,
    scheduler: Scheduler,

    tree: RefCell<FiberTree>,
    host: RefCell<Box<dyn HostTree>>,
    /// Slot of the committed root fiber.
    current: Cell<u32>,

    pending_element: RefCell<Option<Node>>,
    render_task: Cell<Option<TaskId>>,
    passive_task: Cell<Option<TaskId>>,
    pending_passive: RefCell<Vec<QueuedPassive>>,

    last_commit: RefCell<Option<CommitChanges>>,
    commit_count: Cell<u64>,
    error: RefCell<Option<RenderError>>,
    sink: RefCell<Option<Box<dyn TraceSink>>>,
}

/// A rendered tree attached to a host container.
///
/// Cheap to clone; clones share the same tree.
#[derive(Clone)]
pub struct Root {
    inner: Rc<RootInner>,
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("Root")
            .field("container", &inner.container)
            .field("commit_count", &inner.commit_count.get())
            .field("render_pending", &inner.render_task.get().is_some())
            .field("failed", &inner.error.borrow().is_some())
            .finish_non_exhaustive()
    }
}

/// Creates a root rendering into `container` with the default
/// [`RootConfig`].
pub fn create_root(container: HostHandle, host: Box<dyn HostTree>, scheduler: &Scheduler) -> Root {
    create_root_with_config(container, host, scheduler, RootConfig::standard())
}

/// Creates a root rendering into `container`.
pub fn create_root_with_config(
    container: HostHandle,
    host: Box<dyn HostTree>,
    scheduler: &Scheduler,
    config: RootConfig,
) -> Root {
    let mut tree = FiberTree::new();
    let current = tree.create_host_root(container).idx;
    let inner = Rc::new_cyclic(|this| RootInner {
        this: this.clone(),
        container,
        config,
        scheduler: scheduler.clone(),
        tree: RefCell::new(tree),
        host: RefCell::new(host),
        current: Cell::new(current),
        pending_element: RefCell::new(None),
        render_task: Cell::new(None),
        passive_task: Cell::new(None),
        pending_passive: RefCell::new(Vec::new()),
        last_commit: RefCell::new(None),
        commit_count: Cell::new(0),
        error: RefCell::new(None),
        sink: RefCell::new(None),
    });
    Root { inner }
}

impl Root {
    /// Replaces what the root renders and schedules a render.
    pub fn render(&self, node: impl Into<Node>) {
        *self.inner.pending_element.borrow_mut() = Some(node.into());
        self.inner.ensure_render_scheduled();
    }

    /// Renders nothing: every node is removed and every cleanup runs.
    pub fn unmount(&self) {
        self.render(Node::Empty);
    }

    /// The host container.
    #[must_use]
    pub fn container(&self) -> HostHandle {
        self.inner.container
    }

    /// What the most recent commit changed.
    #[must_use]
    pub fn last_commit(&self) -> Option<CommitChanges> {
        self.inner.last_commit.borrow().clone()
    }

    /// Number of commits so far.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.inner.commit_count.get()
    }

    /// The error that stopped this root, if any.
    ///
    /// A failed root keeps its last committed tree and ignores further
    /// renders and dispatches.
    #[must_use]
    pub fn error(&self) -> Option<RenderError> {
        self.inner.error.borrow().clone()
    }

    /// Returns whether a render task is scheduled.
    #[must_use]
    pub fn is_render_pending(&self) -> bool {
        self.inner.render_task.get().is_some()
    }

    /// Borrows the fiber arena.
    ///
    /// # Panics
    ///
    /// Panics if called while this root is rendering.
    #[must_use]
    pub fn tree(&self) -> Ref<'_, FiberTree> {
        self.inner.tree.borrow()
    }

    /// Handle of the committed root fiber.
    ///
    /// # Panics
    ///
    /// Panics if called while this root is rendering.
    #[must_use]
    pub fn current(&self) -> FiberId {
        self.inner.tree.borrow().id_at(self.inner.current.get())
    }

    /// Returns whether passive effects of a commit are still waiting.
    #[must_use]
    pub fn has_pending_passive_effects(&self) -> bool {
        !self.inner.pending_passive.borrow().is_empty()
    }

    /// Runs pending passive effects now. Returns whether there were any.
    pub fn flush_passive_effects(&self) -> bool {
        self.inner.flush_passive_effects()
    }

    /// Installs a trace sink and returns the previous one.
    pub fn set_trace_sink(&self, sink: Box<dyn TraceSink>) -> Option<Box<dyn TraceSink>> {
        self.inner.sink.borrow_mut().replace(sink)
    }

    /// Removes and returns the trace sink.
    pub fn take_trace_sink(&self) -> Option<Box<dyn TraceSink>> {
        self.inner.sink.borrow_mut().take()
    }
}

impl ScheduleUpdate for RootInner {
    fn schedule_update_on_fiber(&self, fiber: FiberId) {
        if self.error.borrow().is_some() {
            return;
        }
        // While a render or commit holds the arena the fiber cannot be
        // checked; the update is in this root either way.
        if let Ok(tree) = self.tree.try_borrow() {
            if !tree.is_alive(fiber) {
                return;
            }
            let current = self.current.get();
            let alternate = tree.alternate[current as usize];
            let owned = tree
                .find_host_root(fiber)
                .is_some_and(|root| root.idx == current || root.idx == alternate);
            if !owned {
                return;
            }
        }
        let new_task = self.ensure_render_scheduled();
        self.emit(|tracer, timestamp| {
            tracer.update_scheduled(&UpdateScheduledEvent {
                fiber,
                new_task,
                timestamp,
            });
        });
    }
}

impl RootInner {
    // -- Tracing --

    /// Calls `f` with a tracer and the current time if a sink is installed.
    fn emit(&self, f: impl FnOnce(&mut Tracer<'_>, HostTime)) {
        if !cfg!(feature = "trace") {
            return;
        }
        let Ok(mut guard) = self.sink.try_borrow_mut() else {
            return;
        };
        let Some(sink) = guard.as_deref_mut() else {
            return;
        };
        let now = self.scheduler.now();
        f(&mut Tracer::new(sink), now);
    }

    fn phase_begin(
        &self,
        commit_index: u64,
        phase: PhaseKind,
        summary: &mut Option<CommitSummaryBuilder>,
    ) {
        self.emit(|tracer, timestamp| {
            tracer.phase_begin(&PhaseBeginEvent {
                commit_index,
                phase,
                timestamp,
            });
            if let Some(summary) = summary {
                summary.phase_begin(phase, timestamp);
            }
        });
    }

    fn phase_end(&self, commit_index: u64, phase: PhaseKind, summary: &mut Option<CommitSummaryBuilder>) {
        self.emit(|tracer, timestamp| {
            tracer.phase_end(&PhaseEndEvent {
                commit_index,
                phase,
                timestamp,
            });
            if let Some(summary) = summary {
                summary.phase_end(phase, timestamp);
            }
        });
    }

    // -- Scheduling --

    /// Schedules a render task unless one is pending or the root failed.
    /// Returns whether a task was scheduled.
    fn ensure_render_scheduled(&self) -> bool {
        if self.render_task.get().is_some() || self.error.borrow().is_some() {
            return false;
        }
        let this = self.this.clone();
        let priority = self.config.render_priority;
        let task = self.scheduler.schedule_callback(
            priority,
            Callback::once(move || {
                if let Some(root) = this.upgrade() {
                    root.perform_render_task();
                }
            }),
        );
        self.render_task.set(Some(task));
        self.emit(|tracer, timestamp| {
            tracer.task_scheduled(&TaskEvent {
                kind: TaskKind::Render,
                task,
                priority,
                timestamp,
            });
        });
        true
    }

    fn ensure_passive_scheduled(&self) {
        if self.passive_task.get().is_some() {
            return;
        }
        let this = self.this.clone();
        let priority = self.config.passive_priority;
        let task = self.scheduler.schedule_callback(
            priority,
            Callback::once(move || {
                if let Some(root) = this.upgrade() {
                    root.perform_passive_task();
                }
            }),
        );
        self.passive_task.set(Some(task));
        self.emit(|tracer, timestamp| {
            tracer.task_scheduled(&TaskEvent {
                kind: TaskKind::Passive,
                task,
                priority,
                timestamp,
            });
        });
    }

    // -- Tasks --

    fn perform_render_task(&self) {
        let Some(task) = self.render_task.take() else {
            return;
        };
        self.emit(|tracer, timestamp| {
            tracer.task_run(&TaskEvent {
                kind: TaskKind::Render,
                task,
                priority: self.config.render_priority,
                timestamp,
            });
        });
        if self.error.borrow().is_some() {
            return;
        }
        self.flush_passive_effects();

        let commit_index = self.commit_count.get() + 1;
        if let Err(error) = self.render_and_commit(commit_index) {
            self.emit(|tracer, timestamp| {
                tracer.render_failed(&RenderFailedEvent {
                    commit_index,
                    error: &error,
                    timestamp,
                });
            });
            *self.error.borrow_mut() = Some(error);
        }
    }

    fn perform_passive_task(&self) {
        let Some(task) = self.passive_task.take() else {
            return;
        };
        self.emit(|tracer, timestamp| {
            tracer.task_run(&TaskEvent {
                kind: TaskKind::Passive,
                task,
                priority: self.config.passive_priority,
                timestamp,
            });
        });
        self.flush_passive_effects();
    }

    fn render_and_commit(&self, commit_index: u64) -> Result<(), RenderError> {
        let mut summary = None;
        self.emit(|_, now| summary = Some(CommitSummaryBuilder::new(commit_index, now)));

        let element = self.pending_element.borrow_mut().take();
        let committed = {
            let mut tree = self.tree.borrow_mut();
            let mut host = self.host.borrow_mut();
            let updater = Updater::new(self.this.clone());

            self.phase_begin(commit_index, PhaseKind::Render, &mut summary);
            let wip = WorkLoop::new(&mut tree, &mut **host, &updater)
                .render_root(self.current.get(), element)?;
            self.phase_end(commit_index, PhaseKind::Render, &mut summary);

            self.phase_begin(commit_index, PhaseKind::Mutation, &mut summary);
            let committed = commit_root(&mut tree, &mut **host, wip)?;
            self.current.set(wip);
            self.phase_end(commit_index, PhaseKind::Mutation, &mut summary);
            committed
        };
        self.commit_count.set(commit_index);

        let Committed {
            changes,
            layout_unmount,
            layout,
            passive,
        } = committed;

        self.phase_begin(commit_index, PhaseKind::Layout, &mut summary);
        for effect in &layout_unmount {
            effect.run_destroy();
        }
        run_effects(&layout);
        self.phase_end(commit_index, PhaseKind::Layout, &mut summary);

        #[cfg(feature = "trace-rich")]
        self.emit(|tracer, _| tracer.fiber_mutations(commit_index, &mutations(&changes)));
        if let Some(mut summary) = summary {
            summary.set_changes(&changes);
            let summary = summary.finish();
            self.emit(|tracer, _| tracer.commit_summary(&summary));
        }
        *self.last_commit.borrow_mut() = Some(changes);

        if !passive.is_empty() {
            self.pending_passive.borrow_mut().push(QueuedPassive {
                commit_index,
                effects: passive,
            });
            self.ensure_passive_scheduled();
        }
        Ok(())
    }

    fn flush_passive_effects(&self) -> bool {
        let queued = mem::take(&mut *self.pending_passive.borrow_mut());
        if queued.is_empty() {
            return false;
        }
        for batch in queued {
            let mut no_summary = None;
            self.phase_begin(batch.commit_index, PhaseKind::Passive, &mut no_summary);
            batch.effects.flush();
            self.phase_end(batch.commit_index, PhaseKind::Passive, &mut no_summary);
        }
        true
    }
}

#[cfg(feature = "trace-rich")]
fn mutations(changes: &CommitChanges) -> Vec<crate::trace::FiberMutation> {
    use crate::trace::{FiberMutation, MutationKind};

    let tagged = |slots: &[u32], kind: MutationKind| {
        slots
            .iter()
            .map(move |&fiber_index| FiberMutation { fiber_index, kind })
            .collect::<Vec<_>>()
    };
    let mut out = tagged(&changes.deletions, MutationKind::Deletion);
    out.extend(tagged(&changes.placements, MutationKind::Placement));
    out.extend(tagged(&changes.updates, MutationKind::Update));
    out
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;
    use crate::deps;
    use crate::element::{Element, FunctionComponent, Props};
    use crate::hooks::{Cleanup, Dispatch};
    use crate::scheduler::{ManualHost, SchedulerConfig};
    use crate::testing::RecordingHost;

    /// A root over a [`RecordingHost`] whose markup is readable after it
    /// moved into the root.
    struct SharedHost(Rc<RefCell<RecordingHost>>);

    impl HostTree for SharedHost {
        fn create_instance(&mut self, ty: &str) -> HostHandle {
            self.0.borrow_mut().create_instance(ty)
        }
        fn create_text_instance(&mut self, text: &str) -> HostHandle {
            self.0.borrow_mut().create_text_instance(text)
        }
        fn append_child(&mut self, parent: HostHandle, child: HostHandle) {
            self.0.borrow_mut().append_child(parent, child);
        }
        fn insert_before(&mut self, parent: HostHandle, child: HostHandle, before: HostHandle) {
            self.0.borrow_mut().insert_before(parent, child, before);
        }
        fn remove_child(&mut self, parent: HostHandle, child: HostHandle) {
            self.0.borrow_mut().remove_child(parent, child);
        }
        fn commit_props_update(&mut self, handle: HostHandle, prev: Option<&Props>, next: &Props) {
            self.0.borrow_mut().commit_props_update(handle, prev, next);
        }
        fn commit_text_update(&mut self, handle: HostHandle, old_text: &str, new_text: &str) {
            self.0.borrow_mut().commit_text_update(handle, old_text, new_text);
        }
    }

    struct Setup {
        clock: Rc<ManualHost>,
        scheduler: Scheduler,
        host: Rc<RefCell<RecordingHost>>,
        root: Root,
    }

    impl Setup {
        fn new() -> Self {
            let clock = Rc::new(ManualHost::new());
            let scheduler = Scheduler::new(SchedulerConfig::standard(), clock.clone());
            let host = Rc::new(RefCell::new(RecordingHost::default()));
            let container = host.borrow_mut().create_container();
            let root = create_root(container, Box::new(SharedHost(host.clone())), &scheduler);
            Self {
                clock,
                scheduler,
                host,
                root,
            }
        }

        fn run(&self) {
            self.clock.run_until_idle(&self.scheduler);
        }

        fn markup(&self) -> String {
            self.host.borrow().markup(self.root.container())
        }
    }

    type Slot<T> = Rc<RefCell<Option<T>>>;

    fn counter(setter: &Slot<Dispatch<i64>>) -> FunctionComponent {
        let setter = setter.clone();
        FunctionComponent::new("Counter", move |_, hooks| {
            let (count, set) = hooks.use_state(0_i64);
            *setter.borrow_mut() = Some(set);
            Element::host("span").with_children(count).into()
        })
    }

    #[test]
    fn render_waits_for_the_scheduler() {
        let s = Setup::new();
        s.root.render(Element::host("p").with_children("hi"));
        assert!(s.root.is_render_pending());
        assert_eq!(s.markup(), "");
        s.run();
        assert_eq!(s.markup(), "<p>hi</p>");
        assert_eq!(s.root.commit_count(), 1);
        assert!(!s.root.is_render_pending());
    }

    #[test]
    fn renders_before_the_task_runs_collapse() {
        let s = Setup::new();
        s.root.render(Element::host("a"));
        s.root.render(Element::host("b"));
        assert_eq!(s.scheduler.pending_tasks(), 1);
        s.run();
        assert_eq!(s.markup(), "<b></b>");
        assert_eq!(s.root.commit_count(), 1);
    }

    #[test]
    fn dispatch_schedules_one_task_and_commits_new_text() {
        let s = Setup::new();
        let setter = Rc::new(RefCell::new(None));
        s.root.render(counter(&setter).element(Props::new()));
        s.run();
        assert_eq!(s.markup(), "<span>0</span>");

        let set = setter.borrow().clone().expect("rendered");
        set.dispatch(1);
        set.dispatch(5);
        assert_eq!(s.scheduler.pending_tasks(), 1, "one task for both dispatches");
        s.run();
        assert_eq!(s.markup(), "<span>5</span>");
        assert_eq!(s.root.commit_count(), 2);
        assert_eq!(s.root.last_commit().map(|c| c.updates.len()), Some(1));
    }

    #[test]
    fn dispatch_after_unmount_is_dropped() {
        let s = Setup::new();
        let setter = Rc::new(RefCell::new(None));
        s.root.render(counter(&setter).element(Props::new()));
        s.run();
        s.root.unmount();
        s.run();
        assert_eq!(s.markup(), "");

        let set = setter.borrow().clone().expect("rendered");
        set.dispatch(3);
        assert!(!s.root.is_render_pending());
        assert_eq!(s.scheduler.pending_tasks(), 0);
    }

    #[test]
    fn layout_effects_run_before_passive_effects() {
        let s = Setup::new();
        let log: Rc<RefCell<Vec<&str>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let comp = FunctionComponent::new("Effects", move |_, hooks| {
            let passive = sink.clone();
            hooks.use_effect(deps![], move || passive.borrow_mut().push("passive"));
            let layout = sink.clone();
            hooks.use_layout_effect(deps![], move || layout.borrow_mut().push("layout"));
            Node::Empty
        });
        s.root.render(comp.element(Props::new()));
        s.run();
        assert_eq!(*log.borrow(), ["layout", "passive"]);
        assert!(!s.root.has_pending_passive_effects());
    }

    #[test]
    fn passive_effects_flush_before_next_render() {
        let clock = Rc::new(ManualHost::new());
        let scheduler = Scheduler::new(SchedulerConfig::standard(), clock.clone());
        let mut host = RecordingHost::default();
        let container = host.create_container();
        let config = RootConfig::standard()
            .with_render_priority(PriorityLevel::UserBlocking)
            .with_passive_priority(PriorityLevel::Idle);
        let root = create_root_with_config(container, Box::new(host), &scheduler, config);

        let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let comp = FunctionComponent::new("Settle", move |_, hooks| {
            let (pass, set_pass) = hooks.use_state(0_i64);
            sink.borrow_mut().push(alloc::format!("render {pass}"));
            hooks.use_layout_effect(deps![], move || set_pass.dispatch(1));
            let passive = sink.clone();
            hooks.use_effect(deps![pass], move || {
                passive.borrow_mut().push(alloc::format!("passive {pass}"));
            });
            Node::Empty
        });
        root.render(comp.element(Props::new()));
        clock.run_until_idle(&scheduler);

        // The second render outranks the idle passive task, so the first
        // commit's passive effects are flushed at its start.
        assert_eq!(
            *log.borrow(),
            ["render 0", "passive 0", "render 1", "passive 1"]
        );
        assert!(!root.has_pending_passive_effects());
        assert!(!root.flush_passive_effects());
    }

    #[test]
    fn cleanups_run_on_unmount() {
        let s = Setup::new();
        let log: Rc<RefCell<Vec<&str>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let comp = FunctionComponent::new("Subscriber", move |_, hooks| {
            let sink = sink.clone();
            hooks.use_effect(deps![], move || {
                let sink = sink.clone();
                Cleanup::new(move || sink.borrow_mut().push("unsubscribe"))
            });
            Node::Empty
        });
        s.root.render(comp.element(Props::new()));
        s.run();
        s.root.unmount();
        s.run();
        assert_eq!(*log.borrow(), ["unsubscribe"]);
    }

    #[test]
    fn failed_root_keeps_last_tree_and_stops() {
        let s = Setup::new();
        s.root.render(Element::host("p").with_children("ok"));
        s.run();

        s.root.render(Node::list(vec![
            Element::host("i").with_key("x"),
            Element::host("b").with_key("x"),
        ]));
        s.run();
        assert!(matches!(s.root.error(), Some(RenderError::DuplicateKey { .. })));
        assert_eq!(s.markup(), "<p>ok</p>", "last committed tree stays");

        s.root.render(Element::host("p").with_children("again"));
        assert!(!s.root.is_render_pending(), "failed roots ignore renders");
        assert_eq!(s.root.commit_count(), 1);
    }

    #[test]
    fn state_set_in_layout_effect_renders_again() {
        let s = Setup::new();
        let comp = FunctionComponent::new("Measure", |_, hooks| {
            let (width, set_width) = hooks.use_state(0_i64);
            hooks.use_layout_effect(deps![], move || set_width.dispatch(120));
            Element::host("div").with_attr("width", width).into()
        });
        s.root.render(comp.element(Props::new()));
        s.run();
        assert_eq!(s.markup(), "<div width=\"120\"></div>");
        assert_eq!(s.root.commit_count(), 2);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn trace_sink_sees_phases_in_order() {
        use crate::trace::{CommitSummary, PhaseKind};

        #[derive(Default)]
        struct Phases {
            log: Rc<RefCell<Vec<(PhaseKind, bool)>>>,
            summaries: Rc<RefCell<Vec<CommitSummary>>>,
        }
        impl TraceSink for Phases {
            fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
                self.log.borrow_mut().push((e.phase, true));
            }
            fn on_phase_end(&mut self, e: &PhaseEndEvent) {
                self.log.borrow_mut().push((e.phase, false));
            }
            fn on_commit_summary(&mut self, s: &CommitSummary) {
                self.summaries.borrow_mut().push(*s);
            }
        }

        let s = Setup::new();
        let sink = Phases::default();
        let log = sink.log.clone();
        let summaries = sink.summaries.clone();
        assert!(s.root.set_trace_sink(Box::new(sink)).is_none());

        s.root.render(Element::host("p"));
        s.run();
        assert_eq!(
            *log.borrow(),
            [
                (PhaseKind::Render, true),
                (PhaseKind::Render, false),
                (PhaseKind::Mutation, true),
                (PhaseKind::Mutation, false),
                (PhaseKind::Layout, true),
                (PhaseKind::Layout, false),
            ]
        );
        let summaries = summaries.borrow();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].commit_index, 1);
        assert_eq!(summaries[0].placements, 1);
        assert!(s.root.take_trace_sink().is_some());
    }
}
