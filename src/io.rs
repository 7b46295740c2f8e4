//! Writing sweep reports to disk.
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serializes `value` as indented JSON into `path`.
///
/// Missing parent directories are created. Non-finite numbers (the undefined
/// sentinel) come out as `null`.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    create_parent_dirs(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to encode report for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write report {}: {e}", path.display()))
}

fn create_parent_dirs(path: &Path) -> Result<(), String> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create report directory {}: {e}", dir.display())),
        _ => Ok(()),
    }
}
