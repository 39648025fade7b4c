// SPDX-License-Identifier: MIT OR Apache-2.0
//! Saving and loading graphs.
//!
//! Documents are RON with a format version header. Loaded processors start
//! dirty, and links are checked for consistency before the graph is handed
//! back. [`to_script`] renders the declarative form of a graph.

use crate::graph::ProcessingGraph;
use crate::processor::{Processor, ProcessorId, ProcessorKind};
use crate::socket::quote;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current document format version
pub const FORMAT_VERSION: u32 = 1;

/// Error saving or loading a document
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] ron::Error),

    /// Malformed document
    #[error("Failed to parse document: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Written by a newer version
    #[error("Unsupported document version {found} (expected at most {FORMAT_VERSION})")]
    UnsupportedVersion {
        /// Version in the document
        found: u32,
    },

    /// Links that do not agree on both ends
    #[error("Inconsistent link in processor '{0}'")]
    Inconsistent(String),
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    graph: &'a ProcessingGraph,
}

#[derive(Deserialize)]
struct Document {
    version: u32,
    graph: ProcessingGraph,
}

/// Serialize a graph to document text
pub fn save(graph: &ProcessingGraph) -> Result<String, PersistenceError> {
    let config = ron::ser::PrettyConfig::default();
    let doc = DocumentRef {
        version: FORMAT_VERSION,
        graph,
    };
    Ok(ron::ser::to_string_pretty(&doc, config)?)
}

/// Read a graph from document text
pub fn load(text: &str) -> Result<ProcessingGraph, PersistenceError> {
    let doc: Document = ron::from_str(text)?;
    if doc.version > FORMAT_VERSION {
        return Err(PersistenceError::UnsupportedVersion { found: doc.version });
    }
    check_links(&doc.graph)?;
    Ok(doc.graph)
}

/// Save a graph to a file
pub fn save_to_file(graph: &ProcessingGraph, path: &Path) -> Result<(), PersistenceError> {
    let text = save(graph)?;
    std::fs::write(path, text)?;
    tracing::debug!(path = %path.display(), "saved graph");
    Ok(())
}

/// Load a graph from a file
pub fn load_from_file(path: &Path) -> Result<ProcessingGraph, PersistenceError> {
    let text = std::fs::read_to_string(path)?;
    let graph = load(&text)?;
    tracing::debug!(
        path = %path.display(),
        processors = graph.processor_count(),
        "loaded graph"
    );
    Ok(graph)
}

/// Every input link must be mirrored by its output, and the other way round
fn check_links(graph: &ProcessingGraph) -> Result<(), PersistenceError> {
    for p in graph.processors() {
        let inputs_agree = p.inputs().iter().all(|input| match input.link() {
            Some(o) => graph.find_output(o).is_some_and(|out| out.links().contains(&input.id)),
            None => true,
        });
        let outputs_agree = p.outputs().iter().all(|output| {
            output
                .links()
                .iter()
                .all(|i| graph.find_input(*i).is_some_and(|input| input.link() == Some(output.id)))
        });
        if !inputs_agree || !outputs_agree {
            return Err(PersistenceError::Inconsistent(p.name.clone()));
        }
        if let Some(inner) = p.graph() {
            check_links(inner)?;
        }
    }
    Ok(())
}

/// Declarative script for a graph: node statements, then links
pub fn to_script(graph: &ProcessingGraph) -> String {
    let mut out = String::new();
    write_script(graph, &mut out, 0);
    out
}

fn write_script(graph: &ProcessingGraph, out: &mut String, depth: usize) {
    let indent = "  ".repeat(depth);
    for p in graph.processors() {
        for line in p.to_script().lines() {
            out.push_str(&indent);
            out.push_str(line);
            out.push('\n');
        }
        if let ProcessorKind::Graph(inner) = &p.kind {
            out.push_str(&format!("{indent}begin_graph({})\n", quote(&p.id.to_string())));
            write_script(inner, out, depth + 1);
            write_bindings(p, inner, out, depth + 1);
            out.push_str(&format!("{indent}end_graph()\n"));
        }
    }
    for comment in graph.comments() {
        out.push_str(&indent);
        out.push_str(&comment.to_script());
        out.push('\n');
    }

    for p in graph.processors() {
        for input in p.inputs() {
            let Some(source) = input.link().and_then(|o| graph.find_output(o)) else {
                continue;
            };
            let Some(source_owner) = source.owner() else {
                continue;
            };
            out.push_str(&format!(
                "{indent}connect({}, {}, {}, {})\n",
                quote(&source_owner.to_string()),
                quote(&source.name),
                quote(&p.id.to_string()),
                quote(&input.name),
            ));
        }
    }
}

/// Boundary socket of `group` paired with the hub socket mirroring it
fn write_bindings(group: &Processor, inner: &ProcessingGraph, out: &mut String, depth: usize) {
    let indent = "  ".repeat(depth);
    let hub = |id: Option<ProcessorId>| quote(&id.map(|id| id.to_string()).unwrap_or_default());
    for pair in inner.group_inputs() {
        let boundary = group.input_by_id(pair.boundary).map(|i| i.name.as_str());
        let proxy = inner.find_output(pair.proxy).map(|o| o.name.as_str());
        if let (Some(boundary), Some(proxy)) = (boundary, proxy) {
            out.push_str(&format!(
                "{indent}bind_input({}, {}, {})\n",
                quote(boundary),
                hub(inner.input_hub()),
                quote(proxy),
            ));
        }
    }
    for pair in inner.group_outputs() {
        let boundary = group.output_by_id(pair.boundary).map(|o| o.name.as_str());
        let proxy = inner.find_input(pair.proxy).map(|i| i.name.as_str());
        if let (Some(boundary), Some(proxy)) = (boundary, proxy) {
            out.push_str(&format!(
                "{indent}bind_output({}, {}, {})\n",
                quote(boundary),
                hub(inner.output_hub()),
                quote(proxy),
            ));
        }
    }
}
