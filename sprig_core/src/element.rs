// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element descriptors.
//!
//! A [`Node`] describes what a component wants on screen. Descriptors are
//! immutable values produced fresh on every render; the reconciler compares
//! them against the previous fiber tree and never keeps them beyond the
//! props it memoizes.
//!
//! An [`Element`] pairs an [`ElementType`] with an optional [`Key`] and
//! [`Props`]. Component kinds are resolved when the element is built, so the
//! work loop dispatches on a closed set of fiber tags.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::context::ContextKey;
use crate::fiber::FiberTag;
use crate::hooks::Hooks;
use crate::host::HostEvent;

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A child descriptor.
#[derive(Clone, Default)]
pub enum Node {
    /// Renders nothing.
    #[default]
    Empty,
    /// A text node. An empty string renders nothing.
    Text(Rc<str>),
    /// An element.
    Element(Element),
    /// An ordered list of siblings.
    List(Rc<[Node]>),
}

impl Node {
    /// Creates a text node.
    #[must_use]
    pub fn text(text: impl Into<Rc<str>>) -> Self {
        Self::Text(text.into())
    }

    /// Creates a sibling list.
    #[must_use]
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Returns the text if this is a text node.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns whether this renders nothing on its own.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            Self::Element(_) | Self::List(_) => false,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(text) => write!(f, "Text({text:?})"),
            Self::Element(el) => el.fmt(f),
            Self::List(items) => f.debug_list().entries(items.iter()).finish(),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(text.into())
    }
}

impl From<Rc<str>> for Node {
    fn from(text: Rc<str>) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<Self>> for Node {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items.into())
    }
}

impl<T: Into<Self>> From<Option<T>> for Node {
    fn from(item: Option<T>) -> Self {
        item.map_or(Self::Empty, Into::into)
    }
}

macro_rules! node_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Node {
                fn from(n: $ty) -> Self {
                    Self::Text(n.to_string().into())
                }
            }
        )*
    };
}

node_from_number!(i32, i64, u32, u64, usize, f64);

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Sibling identity used to match children across renders.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(Rc<str>);

impl Key {
    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", &*self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.into())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key.into())
    }
}

macro_rules! key_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(n: $ty) -> Self {
                    Self(n.to_string().into())
                }
            }
        )*
    };
}

key_from_number!(i32, i64, u32, u64, usize);

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

type RenderFunction = dyn Fn(&Props, &mut Hooks<'_>) -> Node;

/// A function component: a named render function that may call hooks.
///
/// Identity is the render function's allocation, so build a component once and
/// clone the handle; two separately constructed components never match.
#[derive(Clone)]
pub struct FunctionComponent {
    name: Rc<str>,
    render: Rc<RenderFunction>,
}

impl FunctionComponent {
    /// Creates a component.
    pub fn new(name: &str, render: impl Fn(&Props, &mut Hooks<'_>) -> Node + 'static) -> Self {
        Self {
            name: name.into(),
            render: Rc::new(render),
        }
    }

    /// Returns the component's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds an element rendering this component with `props`.
    #[must_use]
    pub fn element(&self, props: Props) -> Element {
        Element::new(ElementType::Function(self.clone()), props)
    }

    /// Returns whether both handles refer to the same component.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }

    pub(crate) fn render(&self, props: &Props, hooks: &mut Hooks<'_>) -> Node {
        (self.render)(props, hooks)
    }
}

impl fmt::Debug for FunctionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionComponent({})", self.name)
    }
}

/// An instance produced by a [`ClassComponent`].
pub trait Component {
    /// Produces this instance's children.
    fn render(&self) -> Node;
}

type Construct = dyn Fn(&Props) -> Rc<dyn Component>;

/// A class component: a constructor that builds a fresh [`Component`]
/// instance from props on every render.
#[derive(Clone)]
pub struct ClassComponent {
    name: Rc<str>,
    construct: Rc<Construct>,
}

impl ClassComponent {
    /// Creates a class component from a constructor.
    pub fn new<C: Component + 'static>(
        name: &str,
        construct: impl Fn(&Props) -> C + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            construct: Rc::new(move |props: &Props| -> Rc<dyn Component> {
                Rc::new(construct(props))
            }),
        }
    }

    /// Returns the component's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds an element rendering this component with `props`.
    #[must_use]
    pub fn element(&self, props: Props) -> Element {
        Element::new(ElementType::Class(self.clone()), props)
    }

    /// Returns whether both handles refer to the same component.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.construct, &other.construct)
    }

    pub(crate) fn construct(&self, props: &Props) -> Rc<dyn Component> {
        (self.construct)(props)
    }
}

impl fmt::Debug for ClassComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassComponent({})", self.name)
    }
}

// ---------------------------------------------------------------------------
// ElementType
// ---------------------------------------------------------------------------

/// What an element renders.
#[derive(Clone)]
pub enum ElementType {
    /// A host node, e.g. `"div"`.
    Host(Rc<str>),
    /// A grouping of children without a host node.
    Fragment,
    /// A function component.
    Function(FunctionComponent),
    /// A class component.
    Class(ClassComponent),
    /// Supplies a context value to its subtree.
    Provider(ContextKey),
    /// Renders a function of the nearest context value.
    Consumer(ContextKey),
}

impl ElementType {
    /// Type identity: equal host tags, the same component, or the same
    /// context.
    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Host(a), Self::Host(b)) => a == b,
            (Self::Fragment, Self::Fragment) => true,
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::Class(a), Self::Class(b)) => a.ptr_eq(b),
            (Self::Provider(a), Self::Provider(b)) | (Self::Consumer(a), Self::Consumer(b)) => {
                a.id() == b.id()
            }
            _ => false,
        }
    }

    /// The fiber tag a node of this type gets.
    #[must_use]
    pub fn fiber_tag(&self) -> FiberTag {
        match self {
            Self::Host(_) => FiberTag::HostComponent,
            Self::Fragment => FiberTag::Fragment,
            Self::Function(_) => FiberTag::FunctionComponent,
            Self::Class(_) => FiberTag::ClassComponent,
            Self::Provider(_) => FiberTag::ContextProvider,
            Self::Consumer(_) => FiberTag::ContextConsumer,
        }
    }

    /// A short human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Host(tag) => tag,
            Self::Fragment => "Fragment",
            Self::Function(c) => c.name(),
            Self::Class(c) => c.name(),
            Self::Provider(_) => "Provider",
            Self::Consumer(_) => "Consumer",
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(tag) => write!(f, "Host({tag})"),
            Self::Fragment => f.write_str("Fragment"),
            Self::Function(c) => c.fmt(f),
            Self::Class(c) => c.fmt(f),
            Self::Provider(key) => write!(f, "Provider({:?})", key.id()),
            Self::Consumer(key) => write!(f, "Consumer({:?})", key.id()),
        }
    }
}

// ---------------------------------------------------------------------------
// Prop values
// ---------------------------------------------------------------------------

/// A listener registered through a prop.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&HostEvent)>);

impl EventHandler {
    /// Wraps a closure.
    pub fn new(f: impl Fn(&HostEvent) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the listener.
    pub fn call(&self, event: &HostEvent) {
        (self.0)(event);
    }

    /// Returns whether both handles wrap the same closure.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler").finish_non_exhaustive()
    }
}

/// Children function of a context consumer, type-erased over the value.
#[derive(Clone)]
pub struct RenderFn(Rc<dyn Fn(&dyn Any) -> Node>);

impl RenderFn {
    /// Wraps a closure.
    pub fn new(f: impl Fn(&dyn Any) -> Node + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Calls the function with a context value.
    #[must_use]
    pub fn call(&self, value: &dyn Any) -> Node {
        (self.0)(value)
    }

    /// Returns whether both handles wrap the same closure.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RenderFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderFn").finish_non_exhaustive()
    }
}

/// A single prop value.
///
/// Scalars compare by value; handlers, opaque values and render functions
/// compare by identity.
#[derive(Clone)]
pub enum PropValue {
    /// A string.
    Str(Rc<str>),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// An event listener.
    Handler(EventHandler),
    /// An arbitrary shared value.
    Value(Rc<dyn Any>),
    /// A context consumer's children function.
    Render(RenderFn),
}

impl PropValue {
    /// Returns the string if this is [`PropValue::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is [`PropValue::Int`].
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean if this is [`PropValue::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the listener if this is [`PropValue::Handler`].
    #[must_use]
    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Self::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Renders a scalar as attribute text. Non-scalars have no attribute form.
    #[must_use]
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.to_string()),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(x) => Some(x.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Handler(_) | Self::Value(_) | Self::Render(_) => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => a.ptr_eq(b),
            (Self::Value(a), Self::Value(b)) => Rc::ptr_eq(a, b),
            (Self::Render(a), Self::Render(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Handler(_) => f.write_str("<handler>"),
            Self::Value(_) => f.write_str("<value>"),
            Self::Render(_) => f.write_str("<render>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        Self::Str(s.into())
    }
}

impl From<i64> for PropValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for PropValue {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<u32> for PropValue {
    fn from(n: u32) -> Self {
        Self::Int(n.into())
    }
}

impl From<f64> for PropValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<EventHandler> for PropValue {
    fn from(h: EventHandler) -> Self {
        Self::Handler(h)
    }
}

// ---------------------------------------------------------------------------
// Props
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct PropsData {
    attrs: BTreeMap<Rc<str>, PropValue>,
    children: Node,
}

/// Immutable, cheaply cloned element properties plus children.
#[derive(Clone, Default)]
pub struct Props(Rc<PropsData>);

impl Props {
    /// Creates empty props.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Props of a text node: just the text as children.
    #[must_use]
    pub fn text(text: Rc<str>) -> Self {
        Self(Rc::new(PropsData {
            attrs: BTreeMap::new(),
            children: Node::Text(text),
        }))
    }

    /// Returns a copy with `name` set to `value`.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.0)
            .attrs
            .insert(name.into(), value.into());
        self
    }

    /// Returns a copy with an opaque shared value under `name`.
    #[must_use]
    pub fn with_value<T: 'static>(self, name: &str, value: T) -> Self {
        self.with(name, PropValue::Value(Rc::new(value)))
    }

    /// Returns a copy with the given children.
    #[must_use]
    pub fn with_children(mut self, children: impl Into<Node>) -> Self {
        Rc::make_mut(&mut self.0).children = children.into();
        self
    }

    /// Looks up a prop.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.0.attrs.get(name)
    }

    /// Looks up a string prop.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    /// Looks up an integer prop.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropValue::as_int)
    }

    /// Looks up a boolean prop.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(PropValue::as_bool)
    }

    /// Looks up an opaque value of type `T`.
    #[must_use]
    pub fn get_value<T: 'static>(&self, name: &str) -> Option<&T> {
        match self.get(name)? {
            PropValue::Value(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Iterates props in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> + '_ {
        self.0.attrs.iter().map(|(k, v)| (&**k, v))
    }

    /// Number of props, not counting children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.attrs.len()
    }

    /// Returns whether there are no props besides children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.attrs.is_empty()
    }

    /// Returns the children.
    #[must_use]
    pub fn children(&self) -> &Node {
        &self.0.children
    }

    /// Returns the children as text when they are a single text node.
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        self.0.children.as_text()
    }

    /// Returns whether both handles share storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns whether a host node rendering `self` needs an update to render
    /// `other`: any prop differs, or the direct text content does.
    #[must_use]
    pub fn host_differs(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return false;
        }
        self.0.attrs != other.0.attrs || self.text_content() != other.text_content()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attrs", &self.0.attrs)
            .field("children", &self.0.children)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// A typed, optionally keyed descriptor with props.
#[derive(Clone)]
pub struct Element {
    pub(crate) ty: ElementType,
    pub(crate) key: Option<Key>,
    pub(crate) props: Props,
}

impl Element {
    /// Creates an element.
    #[must_use]
    pub fn new(ty: ElementType, props: Props) -> Self {
        Self {
            ty,
            key: None,
            props,
        }
    }

    /// Creates a host element such as `"div"`.
    #[must_use]
    pub fn host(tag: &str) -> Self {
        Self::new(ElementType::Host(tag.into()), Props::new())
    }

    /// Creates a fragment around `children`.
    #[must_use]
    pub fn fragment(children: impl Into<Node>) -> Self {
        Self::new(ElementType::Fragment, Props::new().with_children(children))
    }

    /// Sets the key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets a prop.
    #[must_use]
    pub fn with_attr(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.props = self.props.with(name, value);
        self
    }

    /// Registers a listener for `event` under the `on{event}` prop.
    #[must_use]
    pub fn on(self, event: &str, handler: impl Fn(&HostEvent) + 'static) -> Self {
        let name = alloc::format!("on{event}");
        self.with_attr(&name, EventHandler::new(handler))
    }

    /// Sets the children.
    #[must_use]
    pub fn with_children(mut self, children: impl Into<Node>) -> Self {
        self.props = self.props.with_children(children);
        self
    }

    /// Returns the element type.
    #[must_use]
    pub fn element_type(&self) -> &ElementType {
        &self.ty
    }

    /// Returns the key.
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Returns the props.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("ty", &self.ty)
            .field("key", &self.key)
            .field("props", &self.props)
            .finish()
    }
}
