//! Workspace-relative path policy for tool arguments.

use std::path::{Component, Path};

/// Return `raw` as a path if it stays inside the workspace root.
///
/// Rejects absolute paths (including `/`-prefixed and drive-prefixed forms)
/// and any `..` segment. No filesystem access happens here.
pub fn workspace_relative(raw: &str) -> Option<&Path> {
    if raw.starts_with('/') || raw.starts_with('\\') {
        return None;
    }
    let path = Path::new(raw);
    let escapes = path.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    // `Path` on unix does not split on `\`, so catch `..\` segments by hand.
    if escapes || raw.split(['/', '\\']).any(|segment| segment == "..") {
        return None;
    }
    Some(path)
}
