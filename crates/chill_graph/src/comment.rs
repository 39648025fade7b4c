// SPDX-License-Identifier: MIT OR Apache-2.0
//! Free-floating annotations on the graph canvas.

use crate::socket::quote;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub Uuid);

impl CommentId {
    /// Create a new random comment ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CommentId {
    fn default() -> Self {
        Self::new()
    }
}

/// A titled note with a box on the canvas. Carries no graph semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualComment {
    /// Unique comment ID
    pub id: CommentId,
    /// Title
    pub name: String,
    /// Body text
    pub text: String,
    /// Top-left corner
    pub position: [f32; 2],
    /// Box size
    pub size: [f32; 2],
}

impl VisualComment {
    /// Create a comment with the default box size
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: CommentId::new(),
            name: name.into(),
            text: text.into(),
            position: [0.0, 0.0],
            size: [200.0, 100.0],
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Copy with a fresh id
    pub fn duplicate(&self) -> Self {
        Self {
            id: CommentId::new(),
            ..self.clone()
        }
    }

    /// Move by an offset
    pub fn translate(&mut self, offset: [f32; 2]) {
        self.position[0] += offset[0];
        self.position[1] += offset[1];
    }

    /// Declarative statement that rebuilds this comment
    pub fn to_script(&self) -> String {
        format!(
            "comment({}, {}, {}, {{{:?}, {:?}}}, {{{:?}, {:?}}})",
            quote(&self.id.0.to_string()),
            quote(&self.name),
            quote(&self.text),
            self.position[0],
            self.position[1],
            self.size[0],
            self.size[1],
        )
    }
}
