//! Flight manifests: a JSON array whose first element may carry the upload
//! prefix and whose remaining elements are image names
//! `<cell>_<flight>_<image>.jpg`.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde_json::Value;

static IMAGE_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9a-f]{15})_").expect("static regex"));
static PREFIX_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([0-9a-f]{15})/").expect("static regex"));

/// Sorted unique cell ids referenced by the manifest at `path`.
pub fn cells_from_manifest(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse manifest as JSON: {}", path.display()))?;
    let cells = cells_from_value(&value)?;
    tracing::info!(manifest = %path.display(), cells = cells.len(), "Parsed manifest");
    Ok(cells)
}

pub fn cells_from_value(value: &Value) -> Result<Vec<String>> {
    let Some(items) = value.as_array().filter(|a| !a.is_empty()) else {
        bail!("Manifest must be a non-empty JSON array");
    };

    let mut cells = BTreeSet::new();

    if let Some(prefix) = items[0].get("prefix").and_then(Value::as_str) {
        if let Some(m) = PREFIX_CELL.captures(prefix) {
            cells.insert(m[1].to_string());
        }
    }

    for name in items[1..].iter().filter_map(Value::as_str) {
        if let Some(m) = IMAGE_CELL.captures(name) {
            cells.insert(m[1].to_string());
        }
    }

    if cells.is_empty() {
        bail!("No H3 cells found in manifest");
    }
    Ok(cells.into_iter().collect())
}
