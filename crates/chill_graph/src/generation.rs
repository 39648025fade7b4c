// SPDX-License-Identifier: MIT OR Apache-2.0
//! Program generation for the slicer.
//!
//! Processors are emitted in dependency order (Kahn's algorithm): a
//! fragment is written only once every processor feeding one of its inputs
//! has been written. Nested graphs are emitted in place, between group
//! markers, with their hubs forwarding boundary values.
//!
//! A processor gets a recompute marker when it is dirty, when anything
//! upstream of it is dirty, or when it is an emitter. The slicer skips the
//! subtrees without one.

use crate::graph::ProcessingGraph;
use crate::processor::{Processor, ProcessorId, ProcessorKind};
use crate::socket::{quote, Input, OutputId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Write;

/// Error during generation
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Some processors never became ready
    #[error("Graph contains a cycle through {0:?}")]
    CycleDetected(Vec<String>),

    /// The sink refused a write
    #[error("Failed to write program text")]
    Format(#[from] std::fmt::Error),
}

/// Processor IDs in an order where every processor follows its sources.
///
/// Ties are broken by graph insertion order.
pub fn topological_order(graph: &ProcessingGraph) -> Result<Vec<ProcessorId>, GenerationError> {
    let owners: HashMap<OutputId, ProcessorId> = graph
        .processors()
        .flat_map(|p| p.outputs().iter().map(move |o| (o.id, p.id)))
        .collect();
    let input_owners: HashMap<_, _> = graph
        .processors()
        .flat_map(|p| p.inputs().iter().map(move |i| (i.id, p.id)))
        .collect();

    let mut ready: VecDeque<ProcessorId> = graph
        .processors()
        .filter(|p| !p.has_linked_inputs())
        .map(|p| p.id)
        .collect();
    let mut queued: HashSet<ProcessorId> = ready.iter().copied().collect();
    let mut done: HashSet<ProcessorId> = HashSet::new();
    let mut order = Vec::with_capacity(graph.processor_count());

    while let Some(id) = ready.pop_front() {
        done.insert(id);
        order.push(id);

        let Some(p) = graph.processor(id) else {
            continue;
        };
        for consumer in p
            .outputs()
            .iter()
            .flat_map(|o| o.links().iter().filter_map(|i| input_owners.get(i).copied()))
        {
            if queued.contains(&consumer) {
                continue;
            }
            let resolved = graph.processor(consumer).is_some_and(|c| {
                c.inputs()
                    .iter()
                    .filter_map(Input::link)
                    .all(|o| owners.get(&o).is_some_and(|src| done.contains(src)))
            });
            if resolved {
                queued.insert(consumer);
                ready.push_back(consumer);
            }
        }
    }

    if order.len() != graph.processor_count() {
        let stuck = graph
            .processors()
            .filter(|p| !done.contains(&p.id))
            .map(|p| p.name.clone())
            .collect();
        return Err(GenerationError::CycleDetected(stuck));
    }
    Ok(order)
}

/// Generate the program for a graph
pub fn generate(graph: &ProcessingGraph) -> Result<String, GenerationError> {
    let mut out = String::new();
    generate_into(graph, &mut out)?;
    Ok(out)
}

/// Generate the program for a graph into a sink
pub fn generate_into<W: Write>(graph: &ProcessingGraph, out: &mut W) -> Result<(), GenerationError> {
    writeln!(out, "-- generated by chill")?;
    let mut writer = ProgramWriter {
        out,
        depth: 0,
        dirty_outputs: HashSet::new(),
    };
    writer.emit_graph(graph, None)?;
    Ok(())
}

struct ProgramWriter<'w, W> {
    out: &'w mut W,
    depth: usize,
    /// Outputs whose value must be recomputed
    dirty_outputs: HashSet<OutputId>,
}

impl<W: Write> ProgramWriter<'_, W> {
    fn line(&mut self, text: &str) -> Result<(), GenerationError> {
        writeln!(self.out, "{:width$}{text}", "", width = self.depth * 2)?;
        Ok(())
    }

    /// Value expression of an input: the linked output, else the literal
    fn expression(input: &Input) -> String {
        match input.link() {
            Some(output) => format!("__value({})", quote(&output.to_string())),
            None => input.literal(),
        }
    }

    fn upstream_dirty(&self, p: &Processor) -> bool {
        p.inputs()
            .iter()
            .filter_map(Input::link)
            .any(|o| self.dirty_outputs.contains(&o))
    }

    /// `group` is the processor owning `graph` when it is nested
    fn emit_graph(&mut self, graph: &ProcessingGraph, group: Option<&Processor>) -> Result<(), GenerationError> {
        for id in topological_order(graph)? {
            let Some(p) = graph.processor(id) else {
                continue;
            };
            match &p.kind {
                ProcessorKind::Script { code } => self.emit_script(p, code)?,
                ProcessorKind::Graph(inner) => {
                    let upstream = p.is_dirty() || self.upstream_dirty(p);
                    self.line(&format!("-- group {}", p.name))?;
                    self.line(&format!("__begin_group({})", quote(&p.id.to_string())))?;
                    self.depth += 1;
                    let before = self.dirty_outputs.len();
                    // boundary inputs carry upstream dirtiness into the group
                    if upstream {
                        self.dirty_outputs.extend(inner.group_inputs().iter().map(|b| b.proxy));
                    }
                    self.emit_graph(inner, Some(p))?;
                    self.depth -= 1;
                    self.line("__end_group()")?;
                    if upstream || self.dirty_outputs.len() > before {
                        self.dirty_outputs.extend(p.outputs().iter().map(|o| o.id));
                    }
                }
                ProcessorKind::GroupInput => {
                    let Some(group) = group else {
                        continue;
                    };
                    for pair in graph.group_inputs() {
                        if let Some(boundary) = group.input_by_id(pair.boundary) {
                            self.line(&format!(
                                "__forward({}, {})",
                                quote(&pair.proxy.to_string()),
                                Self::expression(boundary)
                            ))?;
                        }
                    }
                }
                ProcessorKind::GroupOutput => {
                    for pair in graph.group_outputs() {
                        let Some(proxy) = p.input_by_id(pair.proxy) else {
                            continue;
                        };
                        if proxy.link().is_some_and(|o| self.dirty_outputs.contains(&o)) {
                            self.dirty_outputs.insert(pair.boundary);
                        }
                        self.line(&format!(
                            "__forward({}, {})",
                            quote(&pair.boundary.to_string()),
                            Self::expression(proxy)
                        ))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn emit_script(&mut self, p: &Processor, code: &str) -> Result<(), GenerationError> {
        let dirty = p.is_dirty() || p.is_emitter() || self.upstream_dirty(p);
        if dirty {
            self.dirty_outputs.extend(p.outputs().iter().map(|o| o.id));
        }

        self.line(&format!("-- {}", p.name))?;
        self.line(&format!("__begin_node({})", quote(&p.id.to_string())))?;
        if dirty {
            self.line("__set_dirty()")?;
        }
        if p.is_emitter() {
            self.line("__set_emitting()")?;
        }
        for input in p.inputs() {
            self.line(&format!("__input({}, {})", quote(&input.name), Self::expression(input)))?;
        }
        for output in p.outputs() {
            self.line(&format!(
                "__bind_output({}, {})",
                quote(&output.name),
                quote(&output.id.to_string())
            ))?;
        }
        for code_line in code.lines() {
            self.line(code_line)?;
        }
        self.line("__end_node()")
    }
}
