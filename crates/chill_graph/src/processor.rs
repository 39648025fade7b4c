// SPDX-License-Identifier: MIT OR Apache-2.0
//! Processor (node) definitions for the graph.

use crate::graph::ProcessingGraph;
use crate::socket::{quote, Input, InputId, Output, OutputId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessorId(pub Uuid);

impl ProcessorId {
    /// Create a new random processor ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProcessorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Display/emission state, cycled by the user on emitting processors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessorState {
    /// Emits when its emit flag is set
    #[default]
    Default,
    /// Never emits
    Disabled,
    /// Always emits
    Emitting,
}

impl ProcessorState {
    /// Next state in the user-facing cycle
    pub fn next(self) -> Self {
        match self {
            Self::Default => Self::Emitting,
            Self::Emitting => Self::Disabled,
            Self::Disabled => Self::Default,
        }
    }
}

/// What a processor is
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProcessorKind {
    /// Script-backed node
    Script {
        /// Node body handed to the slicer
        code: String,
    },
    /// Nested graph; the processor's sockets are the graph boundary
    Graph(Box<ProcessingGraph>),
    /// Boundary-input hub inside a nested graph
    GroupInput,
    /// Boundary-output hub inside a nested graph
    GroupOutput,
}

/// Old → new id correspondence produced by deep copies
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    /// Processor ids
    pub processors: HashMap<ProcessorId, ProcessorId>,
    /// Input ids
    pub inputs: HashMap<InputId, InputId>,
    /// Output ids
    pub outputs: HashMap<OutputId, OutputId>,
}

/// A node in the processing graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Processor {
    /// Unique instance ID
    pub id: ProcessorId,
    /// Display name (not required to be unique)
    pub name: String,
    /// Header color
    pub color: [u8; 3],
    /// Position in the graph UI
    pub position: [f32; 2],
    /// Declares an effect on the final output
    pub emit: bool,
    /// Node payload
    pub kind: ProcessorKind,
    #[serde(skip, default = "stale")]
    dirty: bool,
    state: ProcessorState,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl Processor {
    /// Create an empty script processor
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, ProcessorKind::Script { code: String::new() })
    }

    /// Create a script processor with a body
    pub fn script(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self::with_kind(name, ProcessorKind::Script { code: code.into() })
    }

    /// Create a processor of the given kind
    pub fn with_kind(name: impl Into<String>, kind: ProcessorKind) -> Self {
        Self {
            id: ProcessorId::new(),
            name: name.into(),
            color: [60, 60, 60],
            position: [0.0, 0.0],
            emit: false,
            kind,
            dirty: true,
            state: ProcessorState::Default,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Add an input, renaming it `name_N` on collision
    pub fn add_input(&mut self, mut input: Input) -> InputId {
        input.name = unique_name(self.inputs.iter().map(|i| i.name.as_str()), &input.name);
        input.owner = Some(self.id);
        let id = input.id;
        self.inputs.push(input);
        id
    }

    /// Add an output, renaming it `name_N` on collision
    pub fn add_output(&mut self, mut output: Output) -> OutputId {
        output.name = unique_name(self.outputs.iter().map(|o| o.name.as_str()), &output.name);
        output.owner = Some(self.id);
        let id = output.id;
        self.outputs.push(output);
        id
    }

    /// Detach an input from the list. Links must already be torn down.
    pub(crate) fn take_input(&mut self, id: InputId) -> Option<Input> {
        let index = self.inputs.iter().position(|i| i.id == id)?;
        Some(self.inputs.remove(index))
    }

    /// Detach an output from the list. Links must already be torn down.
    pub(crate) fn take_output(&mut self, id: OutputId) -> Option<Output> {
        let index = self.outputs.iter().position(|o| o.id == id)?;
        Some(self.outputs.remove(index))
    }

    /// Input ports, in order
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Output ports, in order
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Get an input by name
    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|i| i.name == name)
    }

    /// Get an output by name
    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// Get an input by ID
    pub fn input_by_id(&self, id: InputId) -> Option<&Input> {
        self.inputs.iter().find(|i| i.id == id)
    }

    /// Get an output by ID
    pub fn output_by_id(&self, id: OutputId) -> Option<&Output> {
        self.outputs.iter().find(|o| o.id == id)
    }

    /// Get a mutable input by ID (for editing literals)
    pub fn input_mut(&mut self, id: InputId) -> Option<&mut Input> {
        self.inputs.iter_mut().find(|i| i.id == id)
    }

    pub(crate) fn output_mut(&mut self, id: OutputId) -> Option<&mut Output> {
        self.outputs.iter_mut().find(|o| o.id == id)
    }

    /// Whether any input is fed by an output
    pub fn has_linked_inputs(&self) -> bool {
        self.inputs.iter().any(Input::is_linked)
    }

    /// Whether the result is stale; graphs are dirty when any member is
    pub fn is_dirty(&self) -> bool {
        match &self.kind {
            ProcessorKind::Graph(graph) => self.dirty || graph.is_dirty(),
            _ => self.dirty,
        }
    }

    /// Mark the result stale (or fresh)
    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Current state
    pub fn state(&self) -> ProcessorState {
        self.state
    }

    /// Set the state; ignored when nothing can be emitted
    pub fn set_state(&mut self, state: ProcessorState) {
        if self.has_emitable_output() {
            self.state = state;
        }
    }

    /// Advance to the next state (user action)
    pub fn cycle_state(&mut self) -> ProcessorState {
        self.set_state(self.state.next());
        self.state
    }

    /// Whether any output is marked emitable
    pub fn has_emitable_output(&self) -> bool {
        self.outputs.iter().any(|o| o.emitable)
    }

    /// Whether the result has an externally visible effect
    pub fn is_emitter(&self) -> bool {
        match self.state {
            ProcessorState::Disabled => false,
            ProcessorState::Emitting => true,
            ProcessorState::Default => self.emit,
        }
    }

    /// Whether this is a boundary hub inside a nested graph
    pub fn is_hub(&self) -> bool {
        matches!(self.kind, ProcessorKind::GroupInput | ProcessorKind::GroupOutput)
    }

    /// Nested graph, if this processor is one
    pub fn graph(&self) -> Option<&ProcessingGraph> {
        match &self.kind {
            ProcessorKind::Graph(graph) => Some(graph),
            _ => None,
        }
    }

    /// Mutable nested graph, if this processor is one
    pub fn graph_mut(&mut self) -> Option<&mut ProcessingGraph> {
        match &mut self.kind {
            ProcessorKind::Graph(graph) => Some(graph),
            _ => None,
        }
    }

    /// Deep copy with fresh ids for the processor, its sockets and, for
    /// nested graphs, everything inside. Links leaving the copy are dropped.
    pub fn duplicate(&self) -> (Self, IdMap) {
        let mut map = IdMap::default();
        let copy = self.duplicate_into(&mut map);
        (copy, map)
    }

    pub(crate) fn duplicate_into(&self, map: &mut IdMap) -> Self {
        let id = ProcessorId::new();
        map.processors.insert(self.id, id);

        let inputs = self
            .inputs
            .iter()
            .map(|input| {
                let mut copy = input.duplicate();
                copy.owner = Some(id);
                map.inputs.insert(input.id, copy.id);
                copy
            })
            .collect();
        let outputs = self
            .outputs
            .iter()
            .map(|output| {
                let mut copy = output.duplicate();
                copy.owner = Some(id);
                map.outputs.insert(output.id, copy.id);
                copy
            })
            .collect();

        let kind = match &self.kind {
            ProcessorKind::Graph(graph) => ProcessorKind::Graph(Box::new(graph.duplicate_into(map))),
            other => other.clone(),
        };

        Self {
            id,
            name: self.name.clone(),
            color: self.color,
            position: self.position,
            emit: self.emit,
            kind,
            dirty: self.dirty,
            state: self.state,
            inputs,
            outputs,
        }
    }

    /// Declarative fragment: the node statement followed by its sockets
    pub fn to_script(&self) -> String {
        let kind = match &self.kind {
            ProcessorKind::Script { .. } => "script",
            ProcessorKind::Graph(_) => "graph",
            ProcessorKind::GroupInput => "group_input",
            ProcessorKind::GroupOutput => "group_output",
        };
        let mut out = format!(
            "node({}, {}, {}, {{{:?}, {:?}}})\n",
            quote(&self.id.to_string()),
            quote(kind),
            quote(&self.name),
            self.position[0],
            self.position[1],
        );
        for input in &self.inputs {
            out.push_str("  ");
            out.push_str(&input.to_script());
            out.push('\n');
        }
        for output in &self.outputs {
            out.push_str("  ");
            out.push_str(&output.to_script());
            out.push('\n');
        }
        if self.emit {
            out.push_str("  emit()\n");
        }
        if let ProcessorKind::Script { code } = &self.kind {
            if !code.is_empty() {
                out.push_str(&format!("  code({})\n", quote(code)));
            }
        }
        out
    }
}

/// Processors read back from disk have no cached results
fn stale() -> bool {
    true
}

/// `name` if unused, else the first free `name_N` with N counting from 1
pub(crate) fn unique_name<'a>(existing: impl Iterator<Item = &'a str> + Clone, name: &str) -> String {
    if !existing.clone().any(|n| n == name) {
        return name.to_string();
    }
    (1..)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| !existing.clone().any(|n| n == candidate))
        .unwrap_or_else(|| name.to_string())
}
