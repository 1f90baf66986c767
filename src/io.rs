//! Document load/dump and content hashing
//!
//! YAML and JSON are both accepted; the format is picked from the file
//! extension (`.json` is JSON, anything else YAML).

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Value};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{CwlError, Result};
use crate::platform::HASH_KEY;
use crate::process::Process;

/// Serialization format of a document file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

impl FromStr for Format {
    type Err = CwlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" | "cwl" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            other => Err(CwlError::Config {
                reason: format!("unknown document format '{other}' (expected yaml or json)"),
            }),
        }
    }
}

pub fn from_yaml_str(text: &str) -> Result<Process> {
    let value: Value = serde_yaml::from_str(text)?;
    Process::from_value(value)
}

pub fn from_json_str(text: &str) -> Result<Process> {
    let value: Value = serde_json::from_str(text)?;
    Process::from_value(value)
}

/// Read a process document from disk.
pub fn load(path: &Path) -> Result<Process> {
    let text = fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), "loading document");
    match Format::from_path(path) {
        Format::Json => from_json_str(&text),
        Format::Yaml => from_yaml_str(&text),
    }
}

pub fn to_yaml_string(process: &Process) -> Result<String> {
    Ok(serde_yaml::to_string(&process.to_value()?)?)
}

pub fn to_json_string(process: &Process) -> Result<String> {
    Ok(serde_json::to_string_pretty(&process.to_value()?)?)
}

/// Write `process` to `path`; `format` defaults to the extension's.
pub fn dump(process: &Process, path: &Path, format: Option<Format>) -> Result<()> {
    let text = match format.unwrap_or_else(|| Format::from_path(path)) {
        Format::Json => to_json_string(process)?,
        Format::Yaml => to_yaml_string(process)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    tracing::info!(path = %path.display(), "wrote document");
    Ok(())
}

/// Stable digest of a process: xxh3 over its sorted-key JSON form, without
/// the `sbg:hash` stamp. Sixteen lowercase hex characters.
pub fn content_hash(process: &Process) -> Result<String> {
    let mut value = process.to_value()?;
    if let Value::Object(map) = &mut value {
        map.remove(HASH_KEY);
    }
    let canonical = serde_json::to_string(&canonicalize(value))?;
    Ok(format!("{:016x}", xxh3_64(canonical.as_bytes())))
}

/// Sort object keys recursively.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, canonicalize(value)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
