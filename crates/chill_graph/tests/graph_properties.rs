// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end behavior of the connection algebra and grouping.

use chill_graph::persistence;
use chill_graph::{
    generate, Input, IoType, NodeDefinition, Output, OutputId, InputId, ProcessingGraph, Processor,
    ProcessorId, Selectable,
};
use std::collections::HashSet;

fn add(graph: &mut ProcessingGraph, name: &str, inputs: &[(&str, IoType)], outputs: &[(&str, IoType)]) -> ProcessorId {
    let mut p = Processor::script(name, format!("-- {name}"));
    for (n, ty) in inputs {
        p.add_input(Input::new(*n, *ty));
    }
    for (n, ty) in outputs {
        p.add_output(Output::new(*n, *ty));
    }
    graph.add_processor(p)
}

fn passthrough(graph: &mut ProcessingGraph, name: &str) -> ProcessorId {
    add(graph, name, &[("i", IoType::Undef)], &[("o", IoType::Undef)])
}

fn link_set(graph: &ProcessingGraph) -> HashSet<(OutputId, InputId)> {
    graph.connections().into_iter().collect()
}

fn socket_count(graph: &ProcessingGraph) -> usize {
    graph.processors().map(|p| p.inputs().len() + p.outputs().len()).sum()
}

#[test]
fn test_basic_wiring() {
    let mut g = ProcessingGraph::new();
    let source = add(&mut g, "Sphere", &[], &[("shape", IoType::Shape)]);
    let sink = add(&mut g, "Union", &[("a", IoType::Shape), ("b", IoType::Shape)], &[]);

    assert!(g.connect(source, "shape", sink, "a"));
    assert!(g.connect(source, "shape", sink, "b"));

    let out = g.processor(source).and_then(|p| p.output("shape")).unwrap();
    assert_eq!(out.links().len(), 2);
    assert_eq!(g.connection_count(), 2);
    assert!(g.processor(sink).unwrap().has_linked_inputs());
}

#[test]
fn test_three_processor_wiring() {
    let mut g = ProcessingGraph::new();
    let p1 = add(&mut g, "P1", &[], &[("o", IoType::Undef)]);
    let p2 = passthrough(&mut g, "P2");
    let p3 = add(&mut g, "P3", &[("i1", IoType::Undef), ("i2", IoType::Undef)], &[("o", IoType::Undef)]);

    assert!(g.connect(p1, "o", p2, "i"));
    assert!(g.connect(p2, "o", p3, "i1"));
    assert!(g.connect(p1, "o", p3, "i2"));
    assert!(!g.connect(p3, "o", p1, "i"));

    assert_eq!(g.connection_count(), 3);
    assert!(g.are_connected(p3, p1));
    assert!(!g.are_connected(p1, p3));
}

#[test]
fn test_no_self_loop() {
    let mut g = ProcessingGraph::new();
    let p = passthrough(&mut g, "P");
    assert!(!g.connect(p, "o", p, "i"));
    assert_eq!(g.connection_count(), 0);
}

#[test]
fn test_cycle_rejected() {
    let mut g = ProcessingGraph::new();
    let a = passthrough(&mut g, "A");
    let b = passthrough(&mut g, "B");
    let c = add(&mut g, "C", &[("i", IoType::Undef), ("j", IoType::Undef)], &[("o", IoType::Undef)]);
    assert!(g.connect(a, "o", b, "i"));
    assert!(g.connect(b, "o", c, "i"));

    assert!(!g.connect(c, "o", a, "i"));
    assert_eq!(g.connection_count(), 2);
    assert!(generate(&g).is_ok());

    assert!(g.connect(a, "o", c, "j"));
    assert_eq!(g.connection_count(), 3);
    assert!(generate(&g).is_ok());
}

#[test]
fn test_disconnect_is_idempotent() {
    let mut g = ProcessingGraph::new();
    let a = passthrough(&mut g, "A");
    let b = passthrough(&mut g, "B");
    assert!(g.connect(a, "o", b, "i"));

    let input = g.processor(b).and_then(|p| p.input("i")).map(|i| i.id).unwrap();
    g.disconnect_input(input);
    let after_first = link_set(&g);
    g.disconnect_input(input);
    assert_eq!(link_set(&g), after_first);
    assert!(after_first.is_empty());
}

#[test]
fn test_new_link_replaces_old() {
    let mut g = ProcessingGraph::new();
    let a = passthrough(&mut g, "A");
    let b = passthrough(&mut g, "B");
    let c = passthrough(&mut g, "C");
    assert!(g.connect(a, "o", c, "i"));
    assert!(g.connect(b, "o", c, "i"));

    let a_out = g.processor(a).and_then(|p| p.output("o")).unwrap();
    let b_out = g.processor(b).and_then(|p| p.output("o")).unwrap();
    assert!(a_out.links().is_empty());
    assert_eq!(b_out.links().len(), 1);
    assert_eq!(g.connection_count(), 1);
}

#[test]
fn test_type_compatibility() {
    let mut g = ProcessingGraph::new();
    let color = add(&mut g, "Color", &[], &[("rgba", IoType::Vec4), ("name", IoType::String)]);
    let sink = add(&mut g, "Sink", &[("x", IoType::Scalar), ("n", IoType::Integer)], &[]);

    assert!(g.connect(color, "rgba", sink, "x"));
    assert!(!g.connect(color, "name", sink, "n"));
    assert_eq!(g.connection_count(), 1);
}

#[test]
fn test_removal_cascade() {
    let mut g = ProcessingGraph::new();
    let p1 = passthrough(&mut g, "P1");
    let p2 = passthrough(&mut g, "P2");
    let p3 = passthrough(&mut g, "P3");
    let p4 = add(&mut g, "P4", &[("i", IoType::Undef), ("j", IoType::Undef)], &[]);
    assert!(g.connect(p1, "o", p2, "i"));
    assert!(g.connect(p2, "o", p3, "i"));
    assert!(g.connect(p3, "o", p4, "i"));
    assert!(g.connect(p1, "o", p4, "j"));

    assert!(g.remove_processor(p2).is_some());
    assert_eq!(g.processor_count(), 3);
    assert_eq!(g.connection_count(), 2);
    assert!(!g.processor(p3).unwrap().has_linked_inputs());

    let p1_out = g.processor(p1).and_then(|p| p.output("o")).unwrap();
    assert_eq!(p1_out.links().len(), 1);
    assert!(g.are_connected(p4, p3));
    assert!(g.are_connected(p4, p1));
}

#[test]
fn test_socket_names_deduplicated() {
    let mut p = Processor::new("P");
    p.add_input(Input::new("value", IoType::Scalar));
    p.add_input(Input::new("value", IoType::Scalar));
    p.add_input(Input::new("value", IoType::Scalar));
    let names: Vec<&str> = p.inputs().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["value", "value_1", "value_2"]);
}

#[test]
fn test_collapse_then_expand_restores_links() {
    let mut g = ProcessingGraph::new();
    let a = passthrough(&mut g, "A");
    let b = passthrough(&mut g, "B");
    let c = passthrough(&mut g, "C");
    let d = passthrough(&mut g, "D");
    assert!(g.connect(a, "o", b, "i"));
    assert!(g.connect(b, "o", c, "i"));
    assert!(g.connect(c, "o", d, "i"));
    let before = link_set(&g);
    let sockets = socket_count(&g);

    let group = g
        .collapse_subset(&[Selectable::Processor(b), Selectable::Processor(c)])
        .unwrap();
    assert_eq!(g.processor_count(), 3);
    assert_eq!(g.connection_count(), 2);
    assert!(!g.contains(b));

    let moved = g.expand_graph(group, [0.0, 0.0]).unwrap();
    assert_eq!(moved.len(), 2);
    assert_eq!(g.processor_count(), 4);
    assert_eq!(socket_count(&g), sockets);
    assert_eq!(link_set(&g), before);
}

#[test]
fn test_collapse_then_expand_with_fan_in_and_fan_out() {
    let mut g = ProcessingGraph::new();
    let a = passthrough(&mut g, "A");
    let b = passthrough(&mut g, "B");
    let c = add(&mut g, "C", &[("i1", IoType::Undef), ("i2", IoType::Undef)], &[("o", IoType::Undef)]);
    let d = passthrough(&mut g, "D");
    let e = passthrough(&mut g, "E");
    assert!(g.connect(a, "o", b, "i"));
    assert!(g.connect(a, "o", c, "i2"));
    assert!(g.connect(b, "o", c, "i1"));
    assert!(g.connect(c, "o", d, "i"));
    assert!(g.connect(c, "o", e, "i"));
    let before = link_set(&g);
    let sockets = socket_count(&g);

    let group = g
        .collapse_subset(&[Selectable::Processor(b), Selectable::Processor(c)])
        .unwrap();
    // A feeds the group once, the group feeds D and E from one output
    let boundary = g.processor(group).unwrap();
    assert_eq!(boundary.inputs().len(), 1);
    assert_eq!(boundary.outputs().len(), 1);
    assert_eq!(g.connection_count(), 3);

    g.expand_graph(group, [0.0, 0.0]).unwrap();
    assert_eq!(g.processor_count(), 5);
    assert_eq!(socket_count(&g), sockets);
    assert_eq!(link_set(&g), before);
}

#[test]
fn test_copy_subset_is_detached() {
    let mut g = ProcessingGraph::new();
    let a = passthrough(&mut g, "A");
    let b = passthrough(&mut g, "B");
    let c = passthrough(&mut g, "C");
    assert!(g.connect(a, "o", b, "i"));
    assert!(g.connect(b, "o", c, "i"));
    let before = link_set(&g);

    let copy = g.copy_subset(&[Selectable::Processor(b), Selectable::Processor(c)]);
    assert_eq!(copy.processor_count(), 2);
    assert_eq!(copy.connection_count(), 1);
    assert!(copy.processors().all(|p| !g.contains(p.id)));
    assert!(link_set(&copy).is_disjoint(&before));
    assert_eq!(link_set(&g), before);

    let pasted = g.merge(copy, [40.0, 40.0]);
    assert_eq!(pasted.len(), 2);
    assert_eq!(g.processor_count(), 5);
    assert_eq!(g.connection_count(), 3);
}

#[test]
fn test_document_round_trip_keeps_program() {
    let def = NodeDefinition::parse(
        "offset",
        "amount = input(\"amount\", \"scalar\", 0.5, 0.0, 1.0)\noutput(\"out\", \"scalar\", true)\nemit(amount)\n",
    );
    let mut g = ProcessingGraph::new();
    let first = g.add_processor(def.instantiate());
    let second = g.add_processor(def.instantiate());
    let third = add(&mut g, "Sink", &[("x", IoType::Scalar)], &[]);
    assert!(!g.connect(first, "out", second, "missing"));
    assert!(g.connect(first, "out", third, "x"));

    let loaded = persistence::load(&persistence::save(&g).unwrap()).unwrap();
    assert_eq!(generate(&loaded).unwrap(), generate(&g).unwrap());
    assert_eq!(persistence::to_script(&loaded), persistence::to_script(&g));
}
