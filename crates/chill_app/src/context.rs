// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application context.
//!
//! Owns the settings, the node library, the open document and its undo
//! history, and the slicer process. Every document edit goes through
//! [`AppContext::edit`] so it lands in the history.

use crate::history::{History, HistoryError, Snapshot};
use crate::settings::Settings;
use chill_graph::persistence::{self, PersistenceError};
use chill_graph::{GenerationError, NodeLibrary, ProcessingGraph, ProcessorId, Selectable};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

/// Errors from application-level operations
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Save or load failed
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Program generation failed
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Undo or redo failed
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No definition with that name
    #[error("Unknown node '{0}'")]
    UnknownNode(String),

    /// Save requested for a document that was never given a path
    #[error("Document has no file path")]
    NoDocumentPath,

    /// Slicer executable not configured
    #[error("No slicer configured")]
    NoSlicer,
}

/// Result type for context operations
pub type Result<T> = std::result::Result<T, ContextError>;

/// Editor application context
#[derive(Debug)]
pub struct AppContext {
    settings: Settings,
    library: NodeLibrary,
    graph: ProcessingGraph,
    path: Option<PathBuf>,
    modified: bool,
    history: History,
    slicer: Option<Child>,
}

impl AppContext {
    /// Create a context with an empty document
    pub fn new(settings: Settings, library: NodeLibrary) -> Self {
        let history = History::with_max_depth(settings.history_depth);
        Self {
            settings,
            library,
            graph: ProcessingGraph::new(),
            path: None,
            modified: false,
            history,
            slicer: None,
        }
    }

    /// Settings in use
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Node library
    pub fn library(&self) -> &NodeLibrary {
        &self.library
    }

    /// Current document
    pub fn graph(&self) -> &ProcessingGraph {
        &self.graph
    }

    /// Path of the current document
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the document changed since it was opened or saved
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Undo history
    pub fn history(&self) -> &History {
        &self.history
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Replace the document with an empty one
    pub fn new_document(&mut self, path: Option<PathBuf>) {
        self.graph = ProcessingGraph::new();
        self.path = path;
        self.modified = false;
        self.history.clear();
        tracing::info!("new document");
    }

    /// Open a document
    pub fn open(&mut self, path: &Path) -> Result<()> {
        self.graph = persistence::load_from_file(path)?;
        self.path = Some(path.to_path_buf());
        self.modified = false;
        self.history.clear();
        tracing::info!(path = %path.display(), processors = self.graph.processor_count(), "opened document");
        Ok(())
    }

    /// Save the document to its path
    pub fn save(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or(ContextError::NoDocumentPath)?;
        self.save_as(&path)
    }

    /// Save the document to a new path, which becomes its path
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        persistence::save_to_file(&self.graph, path)?;
        self.path = Some(path.to_path_buf());
        self.modified = false;
        tracing::info!(path = %path.display(), "saved document");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Apply an edit to the document, recording it when `f` reports a change
    pub fn edit<T>(
        &mut self,
        description: &str,
        f: impl FnOnce(&mut ProcessingGraph) -> Option<T>,
    ) -> Result<Option<T>> {
        let before = Snapshot::capture(&self.graph)?;
        let Some(result) = f(&mut self.graph) else {
            return Ok(None);
        };
        let after = Snapshot::capture(&self.graph)?;
        self.history.record(description, before, after);
        self.modified = true;
        Ok(Some(result))
    }

    /// Instantiate a library node at a position
    pub fn add_node(&mut self, name: &str, position: [f32; 2]) -> Result<ProcessorId> {
        let mut processor = self
            .library
            .instantiate(name)
            .ok_or_else(|| ContextError::UnknownNode(name.to_string()))?;
        processor.position = position;
        let id = self.edit(&format!("add {name}"), |g| Some(g.add_processor(processor)))?;
        id.ok_or_else(|| ContextError::UnknownNode(name.to_string()))
    }

    /// Remove a processor
    pub fn remove(&mut self, id: ProcessorId) -> Result<bool> {
        let removed = self.edit("remove node", |g| g.remove_processor(id).map(|_| ()))?;
        Ok(removed.is_some())
    }

    /// Connect two sockets by name; `false` when the link is refused
    pub fn connect(&mut self, from: ProcessorId, output: &str, to: ProcessorId, input: &str) -> Result<bool> {
        let linked = self.edit("connect", |g| g.connect(from, output, to, input).then_some(()))?;
        if linked.is_none() {
            tracing::warn!(%from, output, %to, input, "connection refused");
        }
        Ok(linked.is_some())
    }

    /// Collapse a selection into a group
    pub fn collapse(&mut self, selection: &[Selectable]) -> Result<Option<ProcessorId>> {
        self.edit("group", |g| g.collapse_subset(selection))
    }

    /// Expand a group in place
    pub fn expand(&mut self, id: ProcessorId) -> Result<Option<Vec<ProcessorId>>> {
        let Some(position) = self.graph.processor(id).map(|p| p.position) else {
            return Ok(None);
        };
        self.edit("ungroup", |g| g.expand_graph(id, position))
    }

    /// Step back one edit
    pub fn undo(&mut self) -> Result<()> {
        self.graph = self.history.undo()?;
        self.modified = true;
        Ok(())
    }

    /// Step forward one edit
    pub fn redo(&mut self) -> Result<()> {
        self.graph = self.history.redo()?;
        self.modified = true;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Export and slicing
    // ------------------------------------------------------------------

    /// Where the program is exported to
    pub fn export_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => self.settings.export_path(path),
            None => PathBuf::from(&self.settings.export_file),
        }
    }

    /// Write the generated program and mark the document up to date
    pub fn export(&mut self) -> Result<PathBuf> {
        let path = self.export_path();
        self.export_to(&path)?;
        Ok(path)
    }

    /// Write the generated program to a given file
    pub fn export_to(&mut self, path: &Path) -> Result<()> {
        let program = chill_graph::generate(&self.graph)?;
        std::fs::write(path, program)?;
        self.graph.clear_dirty();
        tracing::info!(path = %path.display(), "exported program");
        Ok(())
    }

    /// Export, then start the slicer on the program unless it is running
    pub fn launch_slicer(&mut self) -> Result<()> {
        let slicer = self.settings.slicer_path.clone().ok_or(ContextError::NoSlicer)?;
        let program = self.export()?;
        if self.slicer_running() {
            tracing::info!("slicer already running");
            return Ok(());
        }
        let child = Command::new(&slicer)
            .args(&self.settings.slicer_args)
            .arg(&program)
            .spawn()?;
        tracing::info!(slicer = %slicer.display(), pid = child.id(), "launched slicer");
        self.slicer = Some(child);
        Ok(())
    }

    /// Whether the slicer started by this context is still alive
    pub fn slicer_running(&mut self) -> bool {
        let Some(child) = self.slicer.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::debug!(%status, "slicer exited");
                self.slicer = None;
                false
            }
            Err(e) => {
                tracing::warn!("failed to query slicer: {e}");
                self.slicer = None;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chill_graph::NodeDefinition;

    fn context() -> AppContext {
        let mut library = NodeLibrary::new();
        library.register(NodeDefinition::parse(
            "source",
            "output(\"value\", \"scalar\")\n",
        ));
        library.register(NodeDefinition::parse(
            "sink",
            "x = input(\"x\", \"scalar\", 1.0)\noutput(\"shape\", \"shape\", true)\nemit(x)\n",
        ));
        AppContext::new(Settings::default(), library)
    }

    #[test]
    fn test_add_and_connect_nodes() {
        let mut ctx = context();
        let a = ctx.add_node("source", [0.0, 0.0]).unwrap();
        let b = ctx.add_node("sink", [200.0, 0.0]).unwrap();
        assert!(ctx.connect(a, "value", b, "x").unwrap());
        assert!(!ctx.connect(b, "shape", a, "value").unwrap());
        assert_eq!(ctx.graph().connection_count(), 1);
        assert_eq!(ctx.history().stats().undo_count, 3);
        assert!(ctx.is_modified());
    }

    #[test]
    fn test_unknown_node_rejected() {
        let mut ctx = context();
        assert!(matches!(ctx.add_node("teapot", [0.0, 0.0]), Err(ContextError::UnknownNode(_))));
        assert!(!ctx.history().can_undo());
    }

    #[test]
    fn test_undo_redo_document() {
        let mut ctx = context();
        let a = ctx.add_node("source", [0.0, 0.0]).unwrap();
        let b = ctx.add_node("sink", [0.0, 0.0]).unwrap();
        ctx.connect(a, "value", b, "x").unwrap();

        ctx.undo().unwrap();
        assert_eq!(ctx.graph().connection_count(), 0);
        assert_eq!(ctx.graph().processor_count(), 2);
        ctx.redo().unwrap();
        assert_eq!(ctx.graph().connection_count(), 1);
    }

    #[test]
    fn test_collapse_and_expand() {
        let mut ctx = context();
        let a = ctx.add_node("source", [0.0, 0.0]).unwrap();
        let b = ctx.add_node("sink", [100.0, 0.0]).unwrap();
        ctx.connect(a, "value", b, "x").unwrap();

        let group = ctx.collapse(&[Selectable::Processor(b)]).unwrap().unwrap();
        assert_eq!(ctx.graph().processor_count(), 2);
        let moved = ctx.expand(group).unwrap().unwrap();
        assert_eq!(moved, vec![b]);
        assert_eq!(ctx.graph().connection_count(), 1);
    }

    #[test]
    fn test_export_clears_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context();
        ctx.new_document(Some(dir.path().join("part.chill")));
        ctx.add_node("sink", [0.0, 0.0]).unwrap();
        assert!(ctx.graph().is_dirty());

        let program = ctx.export().unwrap();
        assert_eq!(program, dir.path().join("chill_program.lua"));
        let text = std::fs::read_to_string(&program).unwrap();
        assert!(text.contains("__set_emitting()"));
        assert!(!ctx.graph().is_dirty());
    }

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.chill");
        let mut ctx = context();
        assert!(matches!(ctx.save(), Err(ContextError::NoDocumentPath)));

        ctx.add_node("source", [0.0, 0.0]).unwrap();
        ctx.save_as(&path).unwrap();
        assert!(!ctx.is_modified());

        let mut other = context();
        other.open(&path).unwrap();
        assert_eq!(other.graph().processor_count(), 1);
        assert_eq!(other.path(), Some(path.as_path()));
    }

    #[test]
    fn test_slicer_requires_configuration() {
        let mut ctx = context();
        assert!(matches!(ctx.launch_slicer(), Err(ContextError::NoSlicer)));
        assert!(!ctx.slicer_running());
    }
}
