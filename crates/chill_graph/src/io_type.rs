// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket data types and the output → input compatibility relation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Data type that can flow through a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IoType {
    /// Untyped wildcard, compatible with everything
    #[default]
    Undef,
    /// Boolean value
    Boolean,
    /// Implicit surface
    Implicit,
    /// Integer value
    Integer,
    /// Enumerated list (selected index)
    List,
    /// File system path
    Path,
    /// Floating point value
    Scalar,
    /// String value
    String,
    /// Solid shape
    Shape,
    /// Scalar or vector field
    Field,
    /// 3D vector
    Vec3,
    /// 4D vector
    Vec4,
}

impl IoType {
    /// Every socket type, in declaration order
    pub const ALL: [IoType; 12] = [
        Self::Undef,
        Self::Boolean,
        Self::Implicit,
        Self::Integer,
        Self::List,
        Self::Path,
        Self::Scalar,
        Self::String,
        Self::Shape,
        Self::Field,
        Self::Vec3,
        Self::Vec4,
    ];

    /// Get the color for this type (for UI)
    pub fn color(self) -> [u8; 3] {
        match self {
            Self::Undef => [150, 150, 150],
            Self::Boolean => [200, 80, 80],
            Self::Implicit => [120, 90, 200],
            Self::Integer => [80, 200, 200],
            Self::List => [200, 180, 80],
            Self::Path => [220, 140, 60],
            Self::Scalar => [80, 200, 80],
            Self::String => [200, 180, 150],
            Self::Shape => [90, 140, 220],
            Self::Field => [200, 100, 200],
            Self::Vec3 => [200, 150, 80],
            Self::Vec4 => [200, 100, 150],
        }
    }

    /// Check if an output of this type can feed an input of type `input`
    pub fn can_connect_to(self, input: IoType) -> bool {
        if self == input {
            return true;
        }

        // Undef is a wildcard on either side
        if self == Self::Undef || input == Self::Undef {
            return true;
        }

        matches!(
            (self, input),
            (Self::Vec4, Self::Vec3 | Self::Scalar)
                | (Self::Vec3, Self::Scalar)
                | (Self::String, Self::Path)
        )
    }

    /// Name used in node definitions and saved scripts
    pub fn name(self) -> &'static str {
        match self {
            Self::Undef => "undef",
            Self::Boolean => "boolean",
            Self::Implicit => "implicit",
            Self::Integer => "int",
            Self::List => "list",
            Self::Path => "path",
            Self::Scalar => "scalar",
            Self::String => "string",
            Self::Shape => "shape",
            Self::Field => "field",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
        }
    }

    /// Parse a type name, accepting the common aliases
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name.trim().to_ascii_lowercase().as_str() {
            "undef" | "undefined" | "any" => Self::Undef,
            "bool" | "boolean" => Self::Boolean,
            "implicit" => Self::Implicit,
            "int" | "integer" => Self::Integer,
            "list" | "enum" => Self::List,
            "path" => Self::Path,
            "scalar" | "real" | "float" | "number" => Self::Scalar,
            "string" => Self::String,
            "shape" => Self::Shape,
            "field" => Self::Field,
            "vec3" | "vector3" => Self::Vec3,
            "vec4" | "vector4" => Self::Vec4,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_types_connect() {
        for ty in IoType::ALL {
            assert!(ty.can_connect_to(ty));
        }
    }

    #[test]
    fn test_undef_is_wildcard() {
        for ty in IoType::ALL {
            assert!(IoType::Undef.can_connect_to(ty));
            assert!(ty.can_connect_to(IoType::Undef));
        }
    }

    #[test]
    fn test_narrowing_is_one_way() {
        assert!(IoType::Vec4.can_connect_to(IoType::Vec3));
        assert!(IoType::Vec4.can_connect_to(IoType::Scalar));
        assert!(IoType::Vec3.can_connect_to(IoType::Scalar));
        assert!(IoType::String.can_connect_to(IoType::Path));

        assert!(!IoType::Vec3.can_connect_to(IoType::Vec4));
        assert!(!IoType::Scalar.can_connect_to(IoType::Vec3));
        assert!(!IoType::Path.can_connect_to(IoType::String));
    }

    #[test]
    fn test_unrelated_types_rejected() {
        assert!(!IoType::String.can_connect_to(IoType::Integer));
        assert!(!IoType::Integer.can_connect_to(IoType::Scalar));
        assert!(!IoType::Shape.can_connect_to(IoType::Field));
    }

    #[test]
    fn test_name_round_trip() {
        for ty in IoType::ALL {
            assert_eq!(IoType::from_name(ty.name()), Some(ty));
        }
        assert_eq!(IoType::from_name("REAL"), Some(IoType::Scalar));
        assert_eq!(IoType::from_name("teapot"), None);
    }
}
