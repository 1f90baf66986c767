//! Requirement payloads with field-wise merge

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::port::entries_from_value;
use crate::types::CwlType;

/// Overwrite `slot` when `value` is defined.
pub(crate) fn overwrite<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Overwrite `slot` when `value` is non-empty.
pub(crate) fn overwrite_list<T>(slot: &mut Vec<T>, value: Vec<T>) {
    if !value.is_empty() {
        *slot = value;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerRequirement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_pull: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_load: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_import: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_output_directory: Option<String>,
}

impl DockerRequirement {
    pub fn pull(image: impl Into<String>) -> Self {
        Self {
            docker_pull: Some(image.into()),
            ..Default::default()
        }
    }

    pub fn merge_from(&mut self, other: Self) {
        overwrite(&mut self.docker_pull, other.docker_pull);
        overwrite(&mut self.docker_load, other.docker_load);
        overwrite(&mut self.docker_file, other.docker_file);
        overwrite(&mut self.docker_import, other.docker_import);
        overwrite(&mut self.docker_image_id, other.docker_image_id);
        overwrite(&mut self.docker_output_directory, other.docker_output_directory);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineJavascriptRequirement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression_lib: Option<Vec<String>>,
}

impl InlineJavascriptRequirement {
    pub fn merge_from(&mut self, other: Self) {
        overwrite(&mut self.expression_lib, other.expression_lib);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDef {
    pub env_name: String,
    pub env_value: String,
}

impl EnvironmentDef {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            env_name: name.into(),
            env_value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarRequirement {
    #[serde(default, deserialize_with = "env_defs")]
    pub env_def: Vec<EnvironmentDef>,
}

impl EnvVarRequirement {
    pub fn merge_from(&mut self, other: Self) {
        overwrite_list(&mut self.env_def, other.env_def);
    }

    /// Add a definition, replacing one with the same name.
    pub fn set(&mut self, def: EnvironmentDef) {
        match self.env_def.iter_mut().find(|d| d.env_name == def.env_name) {
            Some(existing) => *existing = def,
            None => self.env_def.push(def),
        }
    }
}

/// `envDef: [{envName, envValue}]` or `envDef: {NAME: value}`
fn env_defs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<EnvironmentDef>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    entries_from_value(value.unwrap_or(Value::Null), "envName", Some("envValue"))
        .map_err(serde::de::Error::custom)
}

/// Integer amount or expression string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceValue {
    Count(i64),
    Expression(String),
}

impl From<i64> for ResourceValue {
    fn from(value: i64) -> Self {
        ResourceValue::Count(value)
    }
}

impl From<&str> for ResourceValue {
    fn from(value: &str) -> Self {
        ResourceValue::Expression(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores_min: Option<ResourceValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores_max: Option<ResourceValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_min: Option<ResourceValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_max: Option<ResourceValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmpdir_min: Option<ResourceValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmpdir_max: Option<ResourceValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdir_min: Option<ResourceValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdir_max: Option<ResourceValue>,
}

impl ResourceRequirement {
    pub fn merge_from(&mut self, other: Self) {
        overwrite(&mut self.cores_min, other.cores_min);
        overwrite(&mut self.cores_max, other.cores_max);
        overwrite(&mut self.ram_min, other.ram_min);
        overwrite(&mut self.ram_max, other.ram_max);
        overwrite(&mut self.tmpdir_min, other.tmpdir_min);
        overwrite(&mut self.tmpdir_max, other.tmpdir_max);
        overwrite(&mut self.outdir_min, other.outdir_min);
        overwrite(&mut self.outdir_max, other.outdir_max);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefRequirement {
    #[serde(default, with = "crate::types::input_types")]
    pub types: Vec<CwlType>,
}

impl SchemaDefRequirement {
    pub fn merge_from(&mut self, other: Self) {
        overwrite_list(&mut self.types, other.types);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwarePackage {
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specs: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftwareRequirement {
    #[serde(default, deserialize_with = "software_packages")]
    pub packages: Vec<SoftwarePackage>,
}

impl SoftwareRequirement {
    pub fn merge_from(&mut self, other: Self) {
        overwrite_list(&mut self.packages, other.packages);
    }
}

/// `packages: [{package, version}]` or `packages: {samtools: {version: [...]}}`
fn software_packages<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<SoftwarePackage>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    entries_from_value(value.unwrap_or(Value::Null), "package", Some("specs"))
        .map_err(serde::de::Error::custom)
}
