// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-visible results of child reconciliation.

mod common;

use common::{App, keyed_list};
use sprig_backend_memory::HostOp;
use sprig_core::element::{Element, Node};
use sprig_core::fiber::FiberTag;

#[test]
fn text_prop_change_is_one_update_and_no_placement() {
    let app = App::new();
    app.render(Element::host("div").with_children("A"));
    assert_eq!(app.markup(), "<div>A</div>");
    let _ = app.take_ops();

    let changes = app.render(Element::host("div").with_children("B"));
    assert!(changes.placements.is_empty());
    assert!(changes.deletions.is_empty());
    assert_eq!(changes.updates.len(), 1);
    assert_eq!(
        app.root.tree().tag_at(changes.updates[0]),
        FiberTag::HostComponent
    );
    assert_eq!(app.markup(), "<div>B</div>");
    let ops = app.take_ops();
    assert!(
        matches!(ops.as_slice(), [HostOp::SetText { text, .. }] if text == "B"),
        "{ops:?}"
    );
}

#[test]
fn swapping_two_keyed_items_places_only_the_one_that_moved_back() {
    let app = App::new();
    app.render(keyed_list(&["1", "2", "3"]));
    let _ = app.take_ops();

    let changes = app.render(keyed_list(&["1", "3", "2"]));
    assert_eq!(app.placed_keys(), ["2"]);
    assert!(changes.updates.is_empty());
    assert!(changes.deletions.is_empty());
    assert_eq!(
        app.markup(),
        "<ul><li>1</li><li>3</li><li>2</li></ul>"
    );

    let ops = app.take_ops();
    assert_eq!(ops.len(), 1, "one host move: {ops:?}");
    assert!(ops[0].is_structural());
}

#[test]
fn identical_rerender_changes_nothing() {
    let app = App::new();
    let tree = Element::host("section")
        .with_attr("id", "main")
        .with_children(Node::list([
            Node::from(Element::host("h1").with_children("Title")),
            Node::from("body text"),
            Node::from(keyed_list(&["a", "b"])),
        ]));
    app.render(tree.clone());
    let _ = app.take_ops();
    let _ = app.host.evaluate();

    let changes = app.render(tree.clone());
    assert!(changes.is_empty(), "{changes:?}");
    assert!(app.take_ops().is_empty());

    // A structurally equal but freshly built descriptor is just as quiet.
    let rebuilt = Element::host("section")
        .with_attr("id", "main")
        .with_children(Node::list([
            Node::from(Element::host("h1").with_children("Title")),
            Node::from("body text"),
            Node::from(keyed_list(&["a", "b"])),
        ]));
    assert!(app.render(rebuilt).is_empty());
    assert!(app.host.evaluate().is_empty());
}

#[test]
fn rotation_moves_existing_nodes_without_recreating_them() {
    let app = App::new();
    app.render(keyed_list(&["a", "b", "c", "d"]));
    let _ = app.take_ops();

    app.render(keyed_list(&["d", "a", "b", "c"]));
    assert_eq!(app.placed_keys(), ["a", "b", "c"]);
    assert_eq!(
        app.markup(),
        "<ul><li>d</li><li>a</li><li>b</li><li>c</li></ul>"
    );
    let ops = app.take_ops();
    assert!(ops.iter().all(HostOp::is_structural), "{ops:?}");
    assert!(!ops.iter().any(|op| matches!(op, HostOp::Remove { .. })));
}

#[test]
fn keyed_insert_delete_and_move_in_one_pass() {
    let app = App::new();
    app.render(keyed_list(&["a", "b", "c"]));
    let before = app.host.node_count();

    let changes = app.render(keyed_list(&["c", "x", "a"]));
    assert_eq!(changes.deletions.len(), 1);
    assert_eq!(
        app.markup(),
        "<ul><li>c</li><li>x</li><li>a</li></ul>"
    );
    // Only the new item gets host nodes.
    assert_eq!(app.host.node_count(), before + 1);
}

#[test]
fn unkeyed_children_match_by_position() {
    let app = App::new();
    app.render(Element::host("p").with_children(Node::list([
        Node::from("hello "),
        Node::from(Element::host("b").with_children("world")),
    ])));
    assert_eq!(app.markup(), "<p>hello <b>world</b></p>");
    let _ = app.take_ops();

    let changes = app.render(Element::host("p").with_children(Node::list([
        Node::from("goodbye "),
        Node::from(Element::host("b").with_children("world")),
    ])));
    assert!(changes.placements.is_empty());
    assert_eq!(changes.updates.len(), 1);
    assert_eq!(app.markup(), "<p>goodbye <b>world</b></p>");
    assert!(matches!(
        app.take_ops().as_slice(),
        [HostOp::SetText { text, .. }] if text == "goodbye "
    ));
}

#[test]
fn changing_element_type_replaces_the_node() {
    let app = App::new();
    app.render(Element::host("div").with_children("x"));
    let _ = app.take_ops();

    let changes = app.render(Element::host("span").with_children("x"));
    assert_eq!(changes.deletions.len(), 1);
    assert_eq!(changes.placements.len(), 1);
    assert_eq!(app.markup(), "<span>x</span>");
    let ops = app.take_ops();
    assert!(ops.iter().any(|op| matches!(op, HostOp::Remove { .. })));
    assert!(ops.iter().any(|op| matches!(op, HostOp::Create { tag, .. } if &**tag == "span")));
}

#[test]
fn fragments_flatten_into_the_host_parent() {
    let app = App::new();
    app.render(Element::host("ul").with_children(Node::list([
        Node::from(Element::host("li").with_key("first").with_children("1")),
        Node::from(Element::fragment(Node::list([
            Element::host("li").with_children("2"),
            Element::host("li").with_children("3"),
        ]))),
    ])));
    assert_eq!(app.markup(), "<ul><li>1</li><li>2</li><li>3</li></ul>");

    // Insert before the fragment: its host nodes stay after the new one.
    app.render(Element::host("ul").with_children(Node::list([
        Node::from(Element::host("li").with_key("first").with_children("1")),
        Node::from(Element::host("li").with_key("new").with_children("1.5")),
        Node::from(Element::fragment(Node::list([
            Element::host("li").with_children("2"),
            Element::host("li").with_children("3"),
        ]))),
    ])));
    assert_eq!(
        app.markup(),
        "<ul><li>1</li><li>1.5</li><li>2</li><li>3</li></ul>"
    );
}

#[test]
fn attributes_follow_props() {
    let app = App::new();
    app.render(Element::host("input").with_attr("value", "a").with_attr("disabled", true));
    let input = app.host.query(app.container, "input").expect("rendered");
    assert_eq!(app.host.attribute(input, "disabled").as_deref(), Some("true"));

    let changes = app.render(Element::host("input").with_attr("value", "b"));
    assert_eq!(changes.updates.len(), 1);
    assert_eq!(app.host.attribute(input, "value").as_deref(), Some("b"));
    assert_eq!(app.host.attribute(input, "disabled"), None);
    assert_eq!(app.host.evaluate().attributes, [input.0]);
}

#[test]
fn unmount_disconnects_everything() {
    let app = App::new();
    app.render(keyed_list(&["a", "b"]));
    let _ = app.host.evaluate();
    let live = app.root.tree().live_count();

    let changes = app.render(Node::Empty);
    assert_eq!(changes.deletions.len(), 1);
    assert_eq!(app.markup(), "");
    let host_changes = app.host.evaluate();
    // ul, two li and their text is carried as element text.
    assert_eq!(host_changes.disconnected.len(), 3);
    assert!(app.root.tree().live_count() < live);
}
