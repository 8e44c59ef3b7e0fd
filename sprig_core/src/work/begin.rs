// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::context::{RENDER_PROP, VALUE_PROP};
use crate::element::{ElementType, Node, PropValue};
use crate::error::RenderError;
use crate::fiber::{FiberTag, Flags, INVALID, MemoizedState, StateNode};
use crate::hooks::Hooks;
use crate::reconcile::ChildReconciler;

use super::WorkLoop;

impl WorkLoop<'_> {
    /// Computes the children of `wip` and returns the first one, or
    /// [`INVALID`] when there is nothing to descend into.
    pub(super) fn begin_work(&mut self, wip: u32) -> Result<u32, RenderError> {
        let w = wip as usize;
        let tag = self.tree.tag[w];
        match tag {
            FiberTag::HostRoot => {
                let children = match &self.tree.memoized_state[w] {
                    MemoizedState::Root(node) => node.clone(),
                    MemoizedState::None | MemoizedState::Hooks(_) => Node::Empty,
                };
                self.reconcile_children(wip, &children)
            }
            FiberTag::HostComponent => {
                let props = self.tree.pending_props[w].clone();
                let ty = self.tree.type_name_at(wip);
                if self.host.should_set_text_content(ty, &props) {
                    // The text is applied as a prop; no child fibers.
                    self.reconcile_children(wip, &Node::Empty)
                } else {
                    self.reconcile_children(wip, props.children())
                }
            }
            FiberTag::HostText => Ok(INVALID),
            FiberTag::Fragment => {
                let props = self.tree.pending_props[w].clone();
                self.reconcile_children(wip, props.children())
            }
            FiberTag::FunctionComponent => self.update_function_component(wip),
            FiberTag::ClassComponent => {
                let Some(ElementType::Class(class)) = self.tree.element_type[w].clone() else {
                    return Err(self.unknown(wip));
                };
                let props = self.tree.pending_props[w].clone();
                let instance = class.construct(&props);
                self.tree.state_node[w] = StateNode::Instance(instance.clone());
                let children = instance.render();
                self.reconcile_children(wip, &children)
            }
            FiberTag::ContextProvider => {
                let Some(ElementType::Provider(key)) = self.tree.element_type[w].clone() else {
                    return Err(self.unknown(wip));
                };
                let props = self.tree.pending_props[w].clone();
                let value = match props.get(VALUE_PROP) {
                    Some(PropValue::Value(value)) => value.clone(),
                    _ => key.default_value().clone(),
                };
                self.contexts.push(key.id(), value);
                self.reconcile_children(wip, props.children())
            }
            FiberTag::ContextConsumer => {
                let Some(ElementType::Consumer(key)) = self.tree.element_type[w].clone() else {
                    return Err(self.unknown(wip));
                };
                let props = self.tree.pending_props[w].clone();
                let value = self.contexts.read(&key);
                let children = match props.get(RENDER_PROP) {
                    Some(PropValue::Render(render)) => render.call(&*value),
                    _ => Node::Empty,
                };
                self.reconcile_children(wip, &children)
            }
            FiberTag::Indeterminate => Err(self.unknown(wip)),
        }
    }

    fn update_function_component(&mut self, wip: u32) -> Result<u32, RenderError> {
        let w = wip as usize;
        let Some(ElementType::Function(component)) = self.tree.element_type[w].clone() else {
            return Err(self.unknown(wip));
        };
        let props = self.tree.pending_props[w].clone();
        let previous = match &self.tree.memoized_state[w] {
            MemoizedState::Hooks(hooks) => Some(hooks.clone()),
            MemoizedState::None | MemoizedState::Root(_) => None,
        };
        let fiber = self.tree.id_at(wip);

        let mut hooks = Hooks::new(fiber, component.name(), previous, &self.contexts, self.updater);
        let children = component.render(&props, &mut hooks);
        let rendered = hooks.finish()?;

        self.tree.memoized_state[w] = MemoizedState::Hooks(rendered.hooks);
        self.tree.update_queue[w] = rendered.effects;
        self.tree.flags[w].remove(Flags::LAYOUT | Flags::PASSIVE);
        self.tree.flags[w].insert(rendered.flags);
        self.reconcile_children(wip, &children)
    }

    /// Reconciles `children` against the current twin's children and links
    /// the result under `wip`.
    fn reconcile_children(&mut self, wip: u32, children: &Node) -> Result<u32, RenderError> {
        let current = self.tree.alternate[wip as usize];
        let first = if current == INVALID {
            ChildReconciler::MOUNT.reconcile(self.tree, wip, INVALID, children)?
        } else {
            let current_first = self.tree.child[current as usize];
            ChildReconciler::UPDATE.reconcile(self.tree, wip, current_first, children)?
        };
        self.tree.child[wip as usize] = first;
        Ok(first)
    }

    pub(super) fn unknown(&self, fiber: u32) -> RenderError {
        RenderError::UnknownWorkTag {
            fiber: self.tree.id_at(fiber),
            tag: self.tree.tag[fiber as usize],
        }
    }
}
