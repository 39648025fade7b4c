// SPDX-License-Identifier: MIT OR Apache-2.0
//! Processing graph: processors, comments and the connection algebra.
//!
//! Every link lives between two processors of the same graph. Links that
//! cross a nesting level go through a boundary socket on the nested graph's
//! processor and a proxy socket on one of its two hub processors.

use crate::comment::{CommentId, VisualComment};
use crate::processor::{IdMap, Processor, ProcessorId, ProcessorKind};
use crate::socket::{Input, InputId, Output, OutputId, SocketValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Horizontal gap between a collapsed selection and its hubs
const HUB_MARGIN: f32 = 250.0;

/// Something the user can select on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selectable {
    /// A processor
    Processor(ProcessorId),
    /// A comment
    Comment(CommentId),
}

/// Boundary input on the graph's processor and the hub output mirroring it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryInput {
    /// Input on the nested graph's processor (outer scope)
    pub boundary: InputId,
    /// Output on the input hub (inner scope)
    pub proxy: OutputId,
}

/// Boundary output on the graph's processor and the hub input feeding it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryOutput {
    /// Output on the nested graph's processor (outer scope)
    pub boundary: OutputId,
    /// Input on the output hub (inner scope)
    pub proxy: InputId,
}

/// A graph of processors; nests through [`ProcessorKind::Graph`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingGraph {
    processors: IndexMap<ProcessorId, Processor>,
    comments: IndexMap<CommentId, VisualComment>,
    group_inputs: Vec<BoundaryInput>,
    group_outputs: Vec<BoundaryOutput>,
    input_hub: Option<ProcessorId>,
    output_hub: Option<ProcessorId>,
}

impl ProcessingGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Add a processor; it must not be linked anywhere.
    ///
    /// A processor whose id is already taken is added as a fresh copy, so
    /// the returned id may differ from `processor.id`.
    pub fn add_processor(&mut self, processor: Processor) -> ProcessorId {
        let processor = if self.processors.contains_key(&processor.id) {
            processor.duplicate().0
        } else {
            processor
        };
        let id = processor.id;
        tracing::debug!(processor = %id, name = %processor.name, "add processor");
        self.processors.insert(id, processor);
        id
    }

    /// Add a comment
    pub fn add_comment(&mut self, comment: VisualComment) -> CommentId {
        let id = comment.id;
        self.comments.insert(id, comment);
        id
    }

    /// Remove a processor or comment
    pub fn remove(&mut self, item: Selectable) -> bool {
        match item {
            Selectable::Processor(id) => self.remove_processor(id).is_some(),
            Selectable::Comment(id) => self.remove_comment(id).is_some(),
        }
    }

    /// Remove a processor after tearing down every link touching it
    pub fn remove_processor(&mut self, id: ProcessorId) -> Option<Processor> {
        if !self.processors.contains_key(&id) {
            return None;
        }
        self.disconnect_processor(id);
        tracing::debug!(processor = %id, "remove processor");
        self.processors.shift_remove(&id)
    }

    /// Remove a comment
    pub fn remove_comment(&mut self, id: CommentId) -> Option<VisualComment> {
        self.comments.shift_remove(&id)
    }

    /// Remove an input from a processor, disconnecting it first
    pub fn remove_input(&mut self, processor: ProcessorId, input: InputId) -> bool {
        let present = self
            .processors
            .get(&processor)
            .is_some_and(|p| p.input_by_id(input).is_some());
        if !present {
            return false;
        }
        self.disconnect_input(input);
        self.processors
            .get_mut(&processor)
            .and_then(|p| p.take_input(input))
            .is_some()
    }

    /// Remove an output from a processor, disconnecting it first
    pub fn remove_output(&mut self, processor: ProcessorId, output: OutputId) -> bool {
        let present = self
            .processors
            .get(&processor)
            .is_some_and(|p| p.output_by_id(output).is_some());
        if !present {
            return false;
        }
        self.disconnect_output(output);
        self.processors
            .get_mut(&processor)
            .and_then(|p| p.take_output(output))
            .is_some()
    }

    /// Get a processor by ID
    pub fn processor(&self, id: ProcessorId) -> Option<&Processor> {
        self.processors.get(&id)
    }

    /// Get a mutable processor by ID
    pub fn processor_mut(&mut self, id: ProcessorId) -> Option<&mut Processor> {
        self.processors.get_mut(&id)
    }

    /// All processors, in insertion order
    pub fn processors(&self) -> impl Iterator<Item = &Processor> {
        self.processors.values()
    }

    /// All processor IDs, in insertion order
    pub fn processor_ids(&self) -> impl Iterator<Item = ProcessorId> + '_ {
        self.processors.keys().copied()
    }

    /// Number of processors, hubs included
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Whether the graph has a processor with this ID
    pub fn contains(&self, id: ProcessorId) -> bool {
        self.processors.contains_key(&id)
    }

    /// Get a comment by ID
    pub fn comment(&self, id: CommentId) -> Option<&VisualComment> {
        self.comments.get(&id)
    }

    /// Get a mutable comment by ID
    pub fn comment_mut(&mut self, id: CommentId) -> Option<&mut VisualComment> {
        self.comments.get_mut(&id)
    }

    /// All comments
    pub fn comments(&self) -> impl Iterator<Item = &VisualComment> {
        self.comments.values()
    }

    /// Boundary input pairs (non-empty only inside a nested graph)
    pub fn group_inputs(&self) -> &[BoundaryInput] {
        &self.group_inputs
    }

    /// Boundary output pairs (non-empty only inside a nested graph)
    pub fn group_outputs(&self) -> &[BoundaryOutput] {
        &self.group_outputs
    }

    /// Input hub processor, if this graph is nested
    pub fn input_hub(&self) -> Option<ProcessorId> {
        self.input_hub
    }

    /// Output hub processor, if this graph is nested
    pub fn output_hub(&self) -> Option<ProcessorId> {
        self.output_hub
    }

    // ------------------------------------------------------------------
    // Socket lookup
    // ------------------------------------------------------------------

    /// Find an input of any member processor
    pub fn find_input(&self, id: InputId) -> Option<&Input> {
        self.processors.values().find_map(|p| p.input_by_id(id))
    }

    /// Find an output of any member processor
    pub fn find_output(&self, id: OutputId) -> Option<&Output> {
        self.processors.values().find_map(|p| p.output_by_id(id))
    }

    fn input_mut(&mut self, id: InputId) -> Option<&mut Input> {
        self.processors.values_mut().find_map(|p| p.input_mut(id))
    }

    fn output_mut(&mut self, id: OutputId) -> Option<&mut Output> {
        self.processors.values_mut().find_map(|p| p.output_mut(id))
    }

    fn output_owners(&self) -> HashMap<OutputId, ProcessorId> {
        self.processors
            .values()
            .flat_map(|p| p.outputs().iter().map(move |o| (o.id, p.id)))
            .collect()
    }

    fn input_owners(&self) -> HashMap<InputId, ProcessorId> {
        self.processors
            .values()
            .flat_map(|p| p.inputs().iter().map(move |i| (i.id, p.id)))
            .collect()
    }

    /// Set the literal of an input and mark its processor dirty
    pub fn set_input_value(&mut self, input: InputId, value: SocketValue) -> bool {
        let Some(owner) = self.find_input(input).and_then(Input::owner) else {
            return false;
        };
        let changed = self.input_mut(input).is_some_and(|i| i.set_value(value));
        if changed {
            if let Some(p) = self.processors.get_mut(&owner) {
                p.set_dirty(true);
            }
        }
        changed
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Connect two sockets by processor and socket name
    pub fn connect(
        &mut self,
        from: ProcessorId,
        output: &str,
        to: ProcessorId,
        input: &str,
    ) -> bool {
        let output = self
            .processors
            .get(&from)
            .and_then(|p| p.output(output))
            .map(|o| o.id);
        let input = self
            .processors
            .get(&to)
            .and_then(|p| p.input(input))
            .map(|i| i.id);
        match (output, input) {
            (Some(output), Some(input)) => self.connect_sockets(output, input),
            _ => false,
        }
    }

    /// Link an output to an input.
    ///
    /// Fails without side effects when either socket is not on a member of
    /// this graph, when the types are incompatible, or when the link would
    /// close a cycle. An existing link on the input is replaced.
    pub fn connect_sockets(&mut self, output: OutputId, input: InputId) -> bool {
        let Some(out) = self.find_output(output) else {
            return false;
        };
        let Some(inp) = self.find_input(input) else {
            return false;
        };
        let (Some(from), Some(to)) = (out.owner(), inp.owner()) else {
            return false;
        };

        if inp.link() == Some(output) {
            return true;
        }

        if !out.io_type.can_connect_to(inp.io_type()) {
            tracing::debug!(from = %out.io_type, to = %inp.io_type(), "incompatible socket types");
            return false;
        }

        if self.are_connected(from, to) {
            tracing::debug!(%from, %to, "connection rejected: would create a cycle");
            return false;
        }

        self.disconnect_input(input);
        self.link(output, input);
        if let Some(p) = self.processors.get_mut(&to) {
            p.set_dirty(true);
        }
        tracing::debug!(%from, %to, "connected");
        true
    }

    /// Record both halves of a link. Callers have validated it.
    fn link(&mut self, output: OutputId, input: InputId) {
        if let Some(o) = self.output_mut(output) {
            if !o.links.contains(&input) {
                o.links.push(input);
            }
        }
        if let Some(i) = self.input_mut(input) {
            i.link = Some(output);
        }
    }

    /// Unlink an input; no-op when it is not linked
    pub fn disconnect_input(&mut self, input: InputId) {
        let Some(output) = self.find_input(input).and_then(Input::link) else {
            return;
        };
        if let Some(o) = self.output_mut(output) {
            o.links.retain(|i| *i != input);
        }
        let owner = self.input_mut(input).and_then(|i| {
            i.link = None;
            i.owner
        });
        if let Some(p) = owner.and_then(|id| self.processors.get_mut(&id)) {
            p.set_dirty(true);
        }
    }

    /// Unlink every input fed by an output
    pub fn disconnect_output(&mut self, output: OutputId) {
        let links = match self.find_output(output) {
            Some(o) => o.links.clone(),
            None => return,
        };
        for input in links {
            self.disconnect_input(input);
        }
    }

    /// Tear down every link touching a processor
    pub fn disconnect_processor(&mut self, id: ProcessorId) {
        let Some(p) = self.processors.get(&id) else {
            return;
        };
        let inputs: Vec<InputId> = p.inputs().iter().map(|i| i.id).collect();
        let outputs: Vec<OutputId> = p.outputs().iter().map(|o| o.id).collect();
        for input in inputs {
            self.disconnect_input(input);
        }
        for output in outputs {
            self.disconnect_output(output);
        }
    }

    /// Whether linking an output of `from` into an input of `to` would close
    /// a cycle: true when `from == to` or `from` already depends on `to`.
    ///
    /// Breadth-first over processors, walking upstream from `from`; each
    /// processor is visited once so the walk terminates on any graph.
    pub fn are_connected(&self, from: ProcessorId, to: ProcessorId) -> bool {
        if from == to {
            return true;
        }
        let owners = self.output_owners();
        let mut visited = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            let Some(p) = self.processors.get(&current) else {
                continue;
            };
            for upstream in p.inputs().iter().filter_map(|i| i.link().and_then(|o| owners.get(&o))) {
                if *upstream == to {
                    return true;
                }
                if visited.insert(*upstream) {
                    queue.push_back(*upstream);
                }
            }
        }
        false
    }

    /// Every link between members of this graph as `(output, input)`
    pub fn connections(&self) -> Vec<(OutputId, InputId)> {
        self.processors
            .values()
            .flat_map(|p| p.inputs().iter().filter_map(|i| i.link().map(|o| (o, i.id))))
            .collect()
    }

    /// Number of links between members of this graph
    pub fn connection_count(&self) -> usize {
        self.processors
            .values()
            .flat_map(Processor::inputs)
            .filter(|i| i.is_linked())
            .count()
    }

    // ------------------------------------------------------------------
    // Dirty state
    // ------------------------------------------------------------------

    /// Whether any member processor is dirty
    pub fn is_dirty(&self) -> bool {
        self.processors.values().any(Processor::is_dirty)
    }

    /// Mark every member processor, recursively, as up to date
    pub fn clear_dirty(&mut self) {
        for p in self.processors.values_mut() {
            p.set_dirty(false);
            if let Some(graph) = p.graph_mut() {
                graph.clear_dirty();
            }
        }
    }

    // ------------------------------------------------------------------
    // Copy / paste
    // ------------------------------------------------------------------

    /// Deep copy of everything, remapping internal links and boundary pairs
    pub(crate) fn duplicate_into(&self, map: &mut IdMap) -> Self {
        let mut copy = Self::new();
        for p in self.processors.values() {
            let duplicate = p.duplicate_into(map);
            copy.processors.insert(duplicate.id, duplicate);
        }
        copy.relink_from(self, map);
        copy.comments = self
            .comments
            .values()
            .map(|c| {
                let c = c.duplicate();
                (c.id, c)
            })
            .collect();
        copy.group_inputs = self
            .group_inputs
            .iter()
            .filter_map(|b| {
                Some(BoundaryInput {
                    boundary: *map.inputs.get(&b.boundary)?,
                    proxy: *map.outputs.get(&b.proxy)?,
                })
            })
            .collect();
        copy.group_outputs = self
            .group_outputs
            .iter()
            .filter_map(|b| {
                Some(BoundaryOutput {
                    boundary: *map.outputs.get(&b.boundary)?,
                    proxy: *map.inputs.get(&b.proxy)?,
                })
            })
            .collect();
        copy.input_hub = self.input_hub.and_then(|id| map.processors.get(&id).copied());
        copy.output_hub = self.output_hub.and_then(|id| map.processors.get(&id).copied());
        copy
    }

    /// Recreate the links of `source` whose both ends were copied
    fn relink_from(&mut self, source: &Self, map: &IdMap) {
        for (output, input) in source.connections() {
            if let (Some(o), Some(i)) = (map.outputs.get(&output), map.inputs.get(&input)) {
                self.link(*o, *i);
            }
        }
    }

    /// Detached copy of the selected processors and comments.
    ///
    /// Links between selected processors are kept, links leaving the
    /// selection are dropped. Hubs are never copied.
    pub fn copy_subset(&self, selection: &[Selectable]) -> Self {
        let (selected, comments) = self.split_selection(selection);
        let mut copy = Self::new();
        let mut map = IdMap::default();

        for id in &selected {
            if let Some(p) = self.processors.get(id) {
                let duplicate = p.duplicate_into(&mut map);
                copy.processors.insert(duplicate.id, duplicate);
            }
        }
        copy.relink_from(self, &map);

        for id in &comments {
            if let Some(c) = self.comments.get(id) {
                let c = c.duplicate();
                copy.comments.insert(c.id, c);
            }
        }
        tracing::debug!(
            processors = copy.processor_count(),
            links = copy.connection_count(),
            "copied subset"
        );
        copy
    }

    /// Move the contents of a detached graph into this one, shifted by `offset`.
    /// Returns the IDs of the inserted processors.
    ///
    /// If any processor or comment id is already present (the same clipboard
    /// pasted twice), the whole graph is re-identified first.
    pub fn merge(&mut self, other: Self, offset: [f32; 2]) -> Vec<ProcessorId> {
        let collides = other.processors.keys().any(|id| self.processors.contains_key(id))
            || other.comments.keys().any(|id| self.comments.contains_key(id));
        let other = if collides {
            tracing::debug!("pasted ids already present, re-identifying");
            other.duplicate_into(&mut IdMap::default())
        } else {
            other
        };
        let mut inserted = Vec::with_capacity(other.processors.len());
        for (id, mut p) in other.processors {
            p.position[0] += offset[0];
            p.position[1] += offset[1];
            self.processors.insert(id, p);
            inserted.push(id);
        }
        for (id, mut c) in other.comments {
            c.translate(offset);
            self.comments.insert(id, c);
        }
        inserted
    }

    /// Selected member processors (hubs excluded) and comments, in graph order
    fn split_selection(&self, selection: &[Selectable]) -> (Vec<ProcessorId>, Vec<CommentId>) {
        let wanted: HashSet<Selectable> = selection.iter().copied().collect();
        let processors = self
            .processors
            .values()
            .filter(|p| !p.is_hub() && wanted.contains(&Selectable::Processor(p.id)))
            .map(|p| p.id)
            .collect();
        let comments = self
            .comments
            .keys()
            .filter(|id| wanted.contains(&Selectable::Comment(**id)))
            .copied()
            .collect();
        (processors, comments)
    }

    // ------------------------------------------------------------------
    // Grouping
    // ------------------------------------------------------------------

    /// Whether no path leaves the selection and comes back into it
    fn is_convex(&self, selected: &HashSet<ProcessorId>) -> bool {
        let owners = self.input_owners();
        let consumers = |p: &Processor| -> Vec<ProcessorId> {
            p.outputs()
                .iter()
                .flat_map(|o| o.links().iter().filter_map(|i| owners.get(i).copied()))
                .collect()
        };

        let mut visited = HashSet::new();
        let mut queue: VecDeque<ProcessorId> = selected
            .iter()
            .filter_map(|id| self.processors.get(id))
            .flat_map(consumers)
            .filter(|id| !selected.contains(id))
            .collect();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let Some(p) = self.processors.get(&current) else {
                continue;
            };
            for next in consumers(p) {
                if selected.contains(&next) {
                    return false;
                }
                queue.push_back(next);
            }
        }
        true
    }

    /// Collapse the selection into a new nested graph processor.
    ///
    /// Links entering the selection are routed through boundary inputs (one
    /// per distinct external source), links leaving it through boundary
    /// outputs (one per internal source). Returns `None`, leaving the graph
    /// untouched, when the selection is not convex.
    pub fn collapse_subset(&mut self, selection: &[Selectable]) -> Option<ProcessorId> {
        let (selected_ids, comment_ids) = self.split_selection(selection);
        let selected: HashSet<ProcessorId> = selected_ids.iter().copied().collect();
        if !self.is_convex(&selected) {
            tracing::warn!("selection cannot be grouped: a path leaves and re-enters it");
            return None;
        }

        let positions: Vec<[f32; 2]> = selected_ids
            .iter()
            .filter_map(|id| self.processors.get(id))
            .map(|p| p.position)
            .collect();
        let center = barycenter(&positions);
        let (min_x, max_x) = positions.iter().fold((center[0], center[0]), |(lo, hi), p| {
            (lo.min(p[0]), hi.max(p[0]))
        });

        // Boundary links, recorded before anything moves
        let output_owners = self.output_owners();
        let input_owners = self.input_owners();
        let mut incoming: Vec<(InputId, OutputId)> = Vec::new();
        let mut outgoing: Vec<(OutputId, Vec<InputId>)> = Vec::new();
        for id in &selected_ids {
            let Some(p) = self.processors.get(id) else {
                continue;
            };
            for input in p.inputs() {
                if let Some(source) = input.link() {
                    if output_owners.get(&source).is_some_and(|o| !selected.contains(o)) {
                        incoming.push((input.id, source));
                    }
                }
            }
            for output in p.outputs() {
                let external: Vec<InputId> = output
                    .links()
                    .iter()
                    .filter(|i| input_owners.get(i).is_some_and(|o| !selected.contains(o)))
                    .copied()
                    .collect();
                if !external.is_empty() {
                    outgoing.push((output.id, external));
                }
            }
        }

        for (input, _) in &incoming {
            self.disconnect_input(*input);
        }
        for (_, inputs) in &outgoing {
            for input in inputs {
                self.disconnect_input(*input);
            }
        }

        // Inner graph with its two hubs
        let mut inner = Self::new();
        let input_hub = inner.add_processor(
            Processor::with_kind("Inputs", ProcessorKind::GroupInput)
                .with_position(min_x - HUB_MARGIN, center[1]),
        );
        let output_hub = inner.add_processor(
            Processor::with_kind("Outputs", ProcessorKind::GroupOutput)
                .with_position(max_x + HUB_MARGIN, center[1]),
        );
        inner.input_hub = Some(input_hub);
        inner.output_hub = Some(output_hub);

        for id in &selected_ids {
            if let Some(p) = self.processors.shift_remove(id) {
                inner.processors.insert(*id, p);
            }
        }
        for id in &comment_ids {
            if let Some(c) = self.comments.shift_remove(id) {
                inner.comments.insert(*id, c);
            }
        }

        let mut group = Processor::with_kind("Group", ProcessorKind::Graph(Box::default()))
            .with_position(center[0], center[1]);
        let mut external_links: Vec<(OutputId, InputId)> = Vec::new();

        // One boundary input per external source
        let mut by_source: HashMap<OutputId, OutputId> = HashMap::new();
        for (internal, source) in incoming {
            let proxy = match by_source.get(&source) {
                Some(proxy) => *proxy,
                None => {
                    let Some(template) = inner.find_input(internal) else {
                        continue;
                    };
                    let source_type = self.find_output(source).map_or(template.io_type(), |o| o.io_type);
                    let mut boundary = if template.io_type() == source_type {
                        template.duplicate()
                    } else {
                        Input::new(template.name.clone(), source_type)
                    };
                    boundary.data_only = false;
                    let boundary = group.add_input(boundary);
                    let name = group.input_by_id(boundary).map(|i| i.name.clone()).unwrap_or_default();
                    let Some(proxy) = inner
                        .processors
                        .get_mut(&input_hub)
                        .map(|hub| hub.add_output(Output::new(name, source_type)))
                    else {
                        continue;
                    };
                    inner.group_inputs.push(BoundaryInput { boundary, proxy });
                    external_links.push((source, boundary));
                    by_source.insert(source, proxy);
                    proxy
                }
            };
            if !inner.connect_sockets(proxy, internal) {
                tracing::warn!("failed to route a grouped input through its hub");
            }
        }

        // One boundary output per internal source
        for (internal, consumers) in outgoing {
            let Some(template) = inner.find_output(internal) else {
                continue;
            };
            let mut boundary = Output::new(template.name.clone(), template.io_type);
            boundary.emitable = template.emitable;
            let io_type = template.io_type;
            let boundary = group.add_output(boundary);
            let name = group.output_by_id(boundary).map(|o| o.name.clone()).unwrap_or_default();
            let Some(proxy) = inner
                .processors
                .get_mut(&output_hub)
                .map(|hub| hub.add_input(Input::new(name, io_type)))
            else {
                continue;
            };
            inner.group_outputs.push(BoundaryOutput { boundary, proxy });
            if !inner.connect_sockets(internal, proxy) {
                tracing::warn!("failed to route a grouped output through its hub");
            }
            external_links.extend(consumers.into_iter().map(|c| (boundary, c)));
        }

        group.kind = ProcessorKind::Graph(Box::new(inner));
        let group_id = self.add_processor(group);
        for (output, input) in external_links {
            if !self.connect_sockets(output, input) {
                tracing::warn!("failed to reconnect a grouped boundary link");
            }
        }

        tracing::debug!(group = %group_id, members = selected_ids.len(), "collapsed selection");
        Some(group_id)
    }

    /// Inline a nested graph processor back into this graph.
    ///
    /// Its members are shifted so their barycenter lands on `position`, and
    /// every boundary route is replaced by a direct link. Returns the IDs of
    /// the re-parented processors. Returns `None`, leaving the graph
    /// untouched, if `id` is not a nested graph or if some route cannot
    /// become a direct link because the types on its two ends are
    /// incompatible.
    pub fn expand_graph(&mut self, id: ProcessorId, position: [f32; 2]) -> Option<Vec<ProcessorId>> {
        let group = self.processors.get(&id)?;
        let inner = group.graph()?;
        if let Some(route) = self.blocked_route(group, inner) {
            tracing::warn!(group = %id, route = %route, "cannot expand group: a boundary route would change type");
            return None;
        }

        let sources: HashMap<InputId, (Option<OutputId>, SocketValue)> = group
            .inputs()
            .iter()
            .map(|i| (i.id, (i.link(), i.value().clone())))
            .collect();
        let consumers: HashMap<OutputId, Vec<InputId>> = group
            .outputs()
            .iter()
            .map(|o| (o.id, o.links().to_vec()))
            .collect();

        self.disconnect_processor(id);
        let ProcessorKind::Graph(inner) = self.processors.shift_remove(&id)?.kind else {
            return None;
        };
        let mut inner = *inner;

        let routed_in: Vec<(InputId, Vec<InputId>)> = inner
            .group_inputs
            .iter()
            .map(|b| {
                let fed = inner.find_output(b.proxy).map(|o| o.links().to_vec()).unwrap_or_default();
                (b.boundary, fed)
            })
            .collect();
        let routed_out: Vec<(OutputId, Option<OutputId>)> = inner
            .group_outputs
            .iter()
            .map(|b| (b.boundary, inner.find_input(b.proxy).and_then(Input::link)))
            .collect();

        for hub in [inner.input_hub, inner.output_hub].into_iter().flatten() {
            inner.remove_processor(hub);
        }

        let positions: Vec<[f32; 2]> = inner.processors.values().map(|p| p.position).collect();
        let center = barycenter(&positions);
        let delta = [position[0] - center[0], position[1] - center[1]];
        let moved = self.merge(
            Self {
                processors: inner.processors,
                comments: inner.comments,
                ..Self::default()
            },
            delta,
        );

        let mut dropped = 0;
        for (boundary, fed) in routed_in {
            let Some((source, value)) = sources.get(&boundary) else {
                continue;
            };
            for internal in fed {
                match source {
                    Some(source) => {
                        if !self.connect_sockets(*source, internal) {
                            dropped += 1;
                        }
                    }
                    None => {
                        if let Some(input) = self.input_mut(internal) {
                            input.set_value(value.clone());
                        }
                    }
                }
            }
        }
        for (boundary, source) in routed_out {
            let Some(source) = source else {
                continue;
            };
            for consumer in consumers.get(&boundary).into_iter().flatten() {
                if !self.connect_sockets(source, *consumer) {
                    dropped += 1;
                }
            }
        }
        if dropped > 0 {
            tracing::warn!(group = %id, dropped, "failed to restore links of an expanded group");
        }

        tracing::debug!(group = %id, members = moved.len(), "expanded group");
        Some(moved)
    }

    /// Name of the first boundary route of `group` whose outer and inner
    /// ends cannot be linked directly
    fn blocked_route(&self, group: &Processor, inner: &Self) -> Option<String> {
        for pair in &inner.group_inputs {
            let Some(boundary) = group.input_by_id(pair.boundary) else {
                continue;
            };
            let Some(source) = boundary.link().and_then(|o| self.find_output(o)) else {
                continue;
            };
            let fed = inner.find_output(pair.proxy).map(Output::links).unwrap_or_default();
            let blocked = fed
                .iter()
                .filter_map(|i| inner.find_input(*i))
                .any(|i| !source.io_type.can_connect_to(i.io_type()));
            if blocked {
                return Some(boundary.name.clone());
            }
        }
        for pair in &inner.group_outputs {
            let Some(boundary) = group.output_by_id(pair.boundary) else {
                continue;
            };
            let Some(source) = inner
                .find_input(pair.proxy)
                .and_then(Input::link)
                .and_then(|o| inner.find_output(o))
            else {
                continue;
            };
            let blocked = boundary
                .links()
                .iter()
                .filter_map(|i| self.find_input(*i))
                .any(|i| !source.io_type.can_connect_to(i.io_type()));
            if blocked {
                return Some(boundary.name.clone());
            }
        }
        None
    }
}

/// Mean of the positions; origin when empty
fn barycenter(positions: &[[f32; 2]]) -> [f32; 2] {
    if positions.is_empty() {
        return [0.0, 0.0];
    }
    let count = positions.len() as f32;
    let (x, y) = positions
        .iter()
        .fold((0.0, 0.0), |(x, y), p| (x + p[0], y + p[1]));
    [x / count, y / count]
}
