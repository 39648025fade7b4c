// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node library scanning.

use chill_graph::{NodeDefinition, NodeLibrary};
use std::path::Path;

/// Extension of node definition files
pub const NODE_EXTENSION: &str = "lua";

/// Load every node definition found under the given directories.
///
/// A definition is named after its file stem and categorized by the folder
/// it sits in, relative to the scanned root. Unreadable files are skipped.
pub fn scan<P: AsRef<Path>>(dirs: &[P]) -> NodeLibrary {
    let mut library = NodeLibrary::new();
    for root in dirs {
        let root = root.as_ref();
        if !root.is_dir() {
            tracing::warn!(path = %root.display(), "node directory not found");
            continue;
        }

        let mut files: Vec<walkdir::DirEntry> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e: Result<walkdir::DirEntry, walkdir::Error>| e.ok())
            .filter(|e: &walkdir::DirEntry| {
                e.file_type().is_file()
                    && e.path().extension().is_some_and(|ext| ext == NODE_EXTENSION)
            })
            .collect();
        files.sort_by(|a, b| a.path().cmp(b.path()));

        for entry in files {
            let path = entry.path();
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let source = match std::fs::read_to_string(path) {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "failed to read node definition: {e}");
                    continue;
                }
            };
            let category = path
                .parent()
                .and_then(|dir| dir.strip_prefix(root).ok())
                .map(|dir| dir.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            library.register(NodeDefinition::parse(name, &source).with_category(category));
        }
    }
    tracing::info!(nodes = library.len(), "node library loaded");
    library
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_finds_nested_definitions() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("shapes/basic")).unwrap();
        fs::write(
            dir.path().join("shapes/basic/sphere.lua"),
            "r = input(\"radius\", \"scalar\", 1.0)\noutput(\"shape\", \"shape\", true)\n",
        )
        .unwrap();
        fs::write(dir.path().join("union.lua"), "output(\"shape\", \"shape\")\n").unwrap();
        fs::write(dir.path().join("README.md"), "not a node").unwrap();

        let library = scan(&[dir.path()]);
        assert_eq!(library.len(), 2);
        let sphere = library.get("sphere").unwrap();
        assert_eq!(sphere.category, "shapes/basic");
        assert_eq!(sphere.inputs.len(), 1);
        assert_eq!(library.get("union").unwrap().category, "");
    }

    #[test]
    fn test_missing_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let library = scan(&[dir.path().join("nowhere")]);
        assert!(library.is_empty());
    }
}
