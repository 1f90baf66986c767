//! Input and output parameters of a process
//!
//! Port lists accept both document forms:
//! - list form: `inputs: [{id: reads, type: File}]`
//! - mapping form: `inputs: {reads: File}` or `inputs: {reads: {type: File}}`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::binding::{InputBinding, OutputBinding, SecondaryFiles};
use crate::types::CwlType;
use crate::util::SourceSet;
use crate::workflow::LinkMerge;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputPort {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(rename = "type", with = "crate::types::input_type")]
    pub port_type: CwlType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_files: Option<SecondaryFiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streamable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_binding: Option<InputBinding>,
}

impl InputPort {
    pub fn new(id: impl Into<String>, port_type: CwlType) -> Self {
        Self {
            id: id.into(),
            label: None,
            doc: None,
            port_type,
            secondary_files: None,
            streamable: None,
            format: None,
            default: None,
            input_binding: None,
        }
    }

    /// Required type and no default: a value must be supplied.
    pub fn needs_value(&self) -> bool {
        self.port_type.is_required() && self.default.is_none()
    }
}

/// Output parameter of a tool (`outputBinding`) or workflow
/// (`outputSource`, `linkMerge`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputPort {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(rename = "type", with = "crate::types::output_type")]
    pub port_type: CwlType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_files: Option<SecondaryFiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streamable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_binding: Option<OutputBinding>,
    #[serde(default, skip_serializing_if = "SourceSet::is_empty")]
    pub output_source: SourceSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_merge: Option<LinkMerge>,
}

impl OutputPort {
    pub fn new(id: impl Into<String>, port_type: CwlType) -> Self {
        Self {
            id: id.into(),
            label: None,
            doc: None,
            port_type,
            secondary_files: None,
            streamable: None,
            format: None,
            output_binding: None,
            output_source: SourceSet::new(),
            link_merge: None,
        }
    }
}

/// Extra settings for `add_input`; label/doc/secondaryFiles override the hint's.
#[derive(Debug, Clone, Default)]
pub struct InputOptions {
    pub label: Option<String>,
    pub doc: Option<String>,
    pub secondary_files: Option<SecondaryFiles>,
    pub streamable: Option<bool>,
    pub format: Option<String>,
    pub binding: Option<InputBinding>,
    /// Stage the input into the working directory.
    pub stage: bool,
}

impl InputOptions {
    pub fn binding(binding: InputBinding) -> Self {
        Self {
            binding: Some(binding),
            ..Default::default()
        }
    }

    pub fn staged() -> Self {
        Self {
            stage: true,
            ..Default::default()
        }
    }
}

/// Extra settings for `add_output`.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub label: Option<String>,
    pub doc: Option<String>,
    pub secondary_files: Option<SecondaryFiles>,
    pub streamable: Option<bool>,
    pub format: Option<String>,
    pub binding: Option<OutputBinding>,
}

impl OutputOptions {
    pub fn binding(binding: OutputBinding) -> Self {
        Self {
            binding: Some(binding),
            ..Default::default()
        }
    }
}

/// Deserialize a port list from list or mapping form.
pub(crate) fn list_or_map<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    entries_from_value(value.unwrap_or(Value::Null), "id", Some("type")).map_err(serde::de::Error::custom)
}

/// Shared list/mapping dispatch for keyed entries.
///
/// In mapping form the key is stored under `key_field`; a non-mapping value
/// is shorthand for `{<shorthand>: value}`.
pub(crate) fn entries_from_value<T: DeserializeOwned>(
    value: Value,
    key_field: &str,
    shorthand: Option<&str>,
) -> crate::error::Result<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(Into::into))
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, entry)| {
                let mut object = match (entry, shorthand) {
                    (Value::Object(object), Some(field)) if is_bare_schema(&object, field) => {
                        let mut wrapped = Map::new();
                        wrapped.insert(field.to_string(), Value::Object(object));
                        wrapped
                    }
                    (Value::Object(object), _) => object,
                    (Value::Null, _) => Map::new(),
                    (other, Some(field)) => {
                        let mut wrapped = Map::new();
                        wrapped.insert(field.to_string(), other);
                        wrapped
                    }
                    (other, None) => {
                        return Err(crate::error::CwlError::mismatch(
                            format!("mapping for '{key}'"),
                            crate::types::kind_of_value(&other),
                        ))
                    }
                };
                object.insert(key_field.to_string(), Value::String(key));
                serde_json::from_value(Value::Object(object)).map_err(Into::into)
            })
            .collect(),
        other => Err(crate::error::CwlError::mismatch(
            "list or mapping",
            crate::types::kind_of_value(&other),
        )),
    }
}

/// `reads: {type: array, items: File}` is a schema given as shorthand,
/// not a port mapping.
fn is_bare_schema(object: &Map<String, Value>, shorthand: &str) -> bool {
    shorthand == "type"
        && matches!(
            object.get("type").and_then(Value::as_str),
            Some("array" | "enum" | "record")
        )
}
