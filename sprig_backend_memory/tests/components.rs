// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Class components, context providers and consumers.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::App;
use sprig_core::context::create_context;
use sprig_core::element::{ClassComponent, Component, Element, FunctionComponent, Node, Props};
use sprig_core::hooks::Dispatch;

struct Greeting {
    name: String,
}

impl Component for Greeting {
    fn render(&self) -> Node {
        Element::host("h2")
            .with_children(format!("Hello, {}", self.name))
            .into()
    }
}

fn greeting() -> ClassComponent {
    ClassComponent::new("Greeting", |props: &Props| Greeting {
        name: props.get_str("name").unwrap_or("stranger").to_owned(),
    })
}

#[test]
fn class_component_renders_from_props() {
    let app = App::new();
    let greeting = greeting();
    app.render(greeting.element(Props::new().with("name", "Ada")));
    assert_eq!(app.markup(), "<h2>Hello, Ada</h2>");

    let changes = app.render(greeting.element(Props::new().with("name", "Grace")));
    assert!(changes.placements.is_empty(), "same class, same position");
    assert_eq!(app.markup(), "<h2>Hello, Grace</h2>");
}

#[test]
fn different_class_at_same_position_remounts() {
    struct Farewell;
    impl Component for Farewell {
        fn render(&self) -> Node {
            Element::host("h2").with_children("Bye").into()
        }
    }

    let app = App::new();
    app.render(greeting().element(Props::new()));
    let farewell = ClassComponent::new("Farewell", |_: &Props| Farewell);
    let changes = app.render(farewell.element(Props::new()));
    assert_eq!(changes.deletions.len(), 1);
    assert_eq!(changes.placements.len(), 1);
    assert_eq!(app.markup(), "<h2>Bye</h2>");
}

#[test]
fn nearest_provider_wins_and_default_applies_outside() {
    let app = App::new();
    let theme = create_context("light");
    let badge = {
        let theme = theme.clone();
        FunctionComponent::new("Badge", move |_, hooks| {
            Element::host("em").with_children(hooks.use_context(&theme)).into()
        })
    };

    app.render(Element::host("div").with_children(Node::list([
        Node::from(theme.provider(
            "dark",
            Node::list([
                Node::from(badge.element(Props::new())),
                Node::from(theme.provider("blue", badge.element(Props::new()))),
                Node::from(theme.consumer(|t| Node::from(*t))),
            ]),
        )),
        Node::from(badge.element(Props::new())),
    ])));
    assert_eq!(
        app.markup(),
        "<div><em>dark</em><em>blue</em>dark<em>light</em></div>"
    );
}

#[test]
fn provider_value_change_reaches_consumers() {
    let app = App::new();
    let locale = create_context(String::from("en"));
    let label = {
        let locale = locale.clone();
        FunctionComponent::new("Label", move |_, hooks| {
            let lang = hooks.use_context(&locale);
            Element::host("span").with_attr("lang", lang).into()
        })
    };
    let setter: Rc<RefCell<Option<Dispatch<String>>>> = Rc::default();
    let app_component = {
        let (locale, label, slot) = (locale.clone(), label.clone(), setter.clone());
        FunctionComponent::new("App", move |_, hooks| {
            let (lang, set_lang) = hooks.use_state(String::from("fr"));
            *slot.borrow_mut() = Some(set_lang);
            locale.provider(lang, label.element(Props::new())).into()
        })
    };

    app.render(app_component.element(Props::new()));
    assert_eq!(app.markup(), "<span lang=\"fr\"></span>");

    setter.borrow().clone().expect("mounted").dispatch(String::from("de"));
    app.flush();
    assert_eq!(app.markup(), "<span lang=\"de\"></span>");
}
