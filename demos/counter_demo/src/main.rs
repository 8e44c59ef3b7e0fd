// Copyright 2026 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Counter and keyed list rendered into the in-memory host.
//!
//! Clicks are dispatched through the host's listeners, every commit is
//! traced to stdout with a [`PrettyPrintSink`] and recorded with a
//! [`RecorderSink`], and the recording is exported as a Chrome trace at the
//! end.

use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use sprig_backend_memory::MemoryHost;
use sprig_core::deps;
use sprig_core::element::{Element, FunctionComponent, Node, Props};
use sprig_core::host::HostHandle;
use sprig_core::root::create_root;
use sprig_core::scheduler::{ManualHost, Scheduler, SchedulerConfig};
use sprig_core::time::Duration;

use sprig_debug::pretty::PrettyPrintSink;
use sprig_debug::recorder::RecorderSink;
use sprig_debug::shared::{SharedSink, Tee};

/// Every clock read advances the virtual clock by 2µs.
const CLOCK_STEP_NS: u64 = 2_000;

fn main() {
    // -- sinks -------------------------------------------------------------
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let recorder = SharedSink::new(RecorderSink::new());

    // -- root --------------------------------------------------------------
    let clock = Rc::new(ManualHost::new());
    clock.set_auto_advance(Duration(CLOCK_STEP_NS));
    let scheduler = Scheduler::new(SchedulerConfig::standard(), clock.clone());
    let host = MemoryHost::new();
    let container = host.create_container();
    let root = create_root(container, Box::new(host.clone()), &scheduler);
    root.set_trace_sink(Box::new(Tee(pretty, recorder.clone())));

    root.render(app());
    clock.run_until_idle(&scheduler);
    show(&host, container, "mounted");

    // -- interaction -------------------------------------------------------
    for label in ["increment", "increment", "rotate", "increment", "rotate"] {
        let button = find_button(&host, container, label);
        host.dispatch_event(button, "click");
        clock.run_until_idle(&scheduler);
        show(&host, container, label);
    }

    let changes = host.evaluate();
    println!(
        "dirty: {} attribute, {} text, {} children",
        changes.attributes.len(),
        changes.text.len(),
        changes.children.len(),
    );

    root.unmount();
    clock.run_until_idle(&scheduler);
    show(&host, container, "unmounted");

    // -- export Chrome trace -----------------------------------------------
    let path = "sprig_trace.json";
    let file = File::create(path).expect("failed to create sprig_trace.json");
    let mut writer = BufWriter::new(file);
    sprig_debug::chrome::export(recorder.borrow().as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({} commits)", root.commit_count());
}

fn app() -> Element {
    let counter = FunctionComponent::new("Counter", |_, hooks| {
        let (count, set_count) = hooks.use_state(0_i64);
        let (order, set_order) = hooks.use_state(vec!["apple", "banana", "cherry"]);

        hooks.use_effect(deps![count], move || {
            println!("  effect: count is {count}");
        });

        let rotated = {
            let mut next = order.clone();
            next.rotate_left(1);
            next
        };
        Element::host("main")
            .with_children(vec![
                Node::from(
                    Element::host("button")
                        .with_attr("data-label", "increment")
                        .on("click", move |_| set_count.dispatch(count + 1))
                        .with_children("+1"),
                ),
                Node::from(
                    Element::host("button")
                        .with_attr("data-label", "rotate")
                        .on("click", move |_| set_order.dispatch(rotated.clone()))
                        .with_children("rotate"),
                ),
                Node::from(Element::host("p").with_children(format!("count: {count}"))),
                Node::from(Element::host("ul").with_children(Node::list(order.iter().map(
                    |&fruit| Element::host("li").with_key(fruit).with_children(fruit),
                )))),
            ])
            .into()
    });
    counter.element(Props::new())
}

fn find_button(host: &MemoryHost, container: HostHandle, label: &str) -> HostHandle {
    host.query_all(container, "button")
        .into_iter()
        .find(|&b| host.attribute(b, "data-label").as_deref() == Some(label))
        .expect("button is rendered")
}

fn show(host: &MemoryHost, container: HostHandle, step: &str) {
    println!("== {step}: {}", host.inner_markup(container));
    for op in host.take_ops() {
        println!("   {op}");
    }
}
