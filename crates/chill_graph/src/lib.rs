// SPDX-License-Identifier: MIT OR Apache-2.0
//! Processing graph core for the Chill editor.
//!
//! A [`ProcessingGraph`] owns [`Processor`]s, each exposing typed input and
//! output sockets. Links go from one output to any number of inputs and
//! never form a cycle. Selections can be collapsed into nested graphs and
//! expanded again.
//!
//! ## Architecture
//!
//! - Sockets and processors are addressed by IDs; the graph owns them all
//! - Every connection change goes through the owning graph
//! - Nested graphs are processors whose kind holds another graph
//! - [`generation`] turns a graph into a program for the slicer
//! - [`definition`] reads node scripts into reusable templates
//! - [`persistence`] saves and loads documents

pub mod comment;
pub mod definition;
pub mod generation;
pub mod graph;
pub mod io_type;
pub mod persistence;
pub mod processor;
pub mod socket;

pub use comment::{CommentId, VisualComment};
pub use definition::{DefinitionError, NodeDefinition, NodeLibrary};
pub use generation::{generate, GenerationError};
pub use graph::{ProcessingGraph, Selectable};
pub use io_type::IoType;
pub use persistence::PersistenceError;
pub use processor::{IdMap, Processor, ProcessorId, ProcessorKind, ProcessorState};
pub use socket::{ArgValue, Input, InputId, Output, OutputId, SocketValue};
