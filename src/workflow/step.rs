//! Workflow steps: an embedded or referenced process plus its wiring

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::{LinkMerge, ScatterMethod};
use crate::error::{CwlError, Result};
use crate::platform::ProcessHint;
use crate::port::entries_from_value;
use crate::process::{Process, ProcessLike};
use crate::requirement::Requirements;
use crate::types::kind_of_value;
use crate::util::{OneOrMany, SourceSet};

/// What a step runs.
///
/// Embedded processes are shared by reference and never mutated once
/// embedded.
#[derive(Debug, Clone, PartialEq)]
pub enum StepRun {
    Inline(Arc<Process>),
    /// Path or URL of a process document
    Reference(String),
}

impl StepRun {
    pub fn process(&self) -> Option<&Process> {
        match self {
            StepRun::Inline(process) => Some(process.as_ref()),
            StepRun::Reference(_) => None,
        }
    }
}

impl Serialize for StepRun {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            StepRun::Inline(process) => process.serialize(serializer),
            StepRun::Reference(path) => path.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for StepRun {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(path) => Ok(StepRun::Reference(path)),
            value @ Value::Object(_) => Process::from_value(value)
                .map(|process| StepRun::Inline(Arc::new(process)))
                .map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(CwlError::mismatch(
                "process or document path",
                kind_of_value(&other),
            ))),
        }
    }
}

/// A step input port and the sources feeding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    pub id: String,
    #[serde(default, skip_serializing_if = "SourceSet::is_empty")]
    pub source: SourceSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_merge: Option<LinkMerge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<String>,
}

impl StepInput {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: SourceSet::new(),
            link_merge: None,
            default: None,
            value_from: None,
        }
    }

    /// A source, a default or a `valueFrom` supplies a value.
    pub fn is_bound(&self) -> bool {
        !self.source.is_empty() || self.default.is_some() || self.value_from.is_some()
    }
}

/// Step output port; written as a bare id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutput {
    pub id: String,
}

impl StepOutput {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Serialize for StepOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.id.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StepOutput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(String),
            Object { id: String },
        }

        match Raw::deserialize(deserializer)? {
            Raw::Id(id) | Raw::Object { id } => Ok(StepOutput { id }),
        }
    }
}

/// Readiness of a step.
///
/// `Executed` belongs to execution engines and is never produced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Ready,
    Executed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub run: StepRun,
    #[serde(rename = "in", default, deserialize_with = "inputs_list_or_map")]
    pub inputs: Vec<StepInput>,
    #[serde(rename = "out", default)]
    pub outputs: Vec<StepOutput>,
    #[serde(default, skip_serializing_if = "Requirements::is_empty")]
    pub requirements: Requirements,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<ProcessHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scatter: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scatter_method: Option<ScatterMethod>,
}

impl Step {
    pub fn new(id: impl Into<String>, run: StepRun) -> Self {
        Self {
            id: id.into(),
            label: None,
            doc: None,
            run,
            inputs: Vec::new(),
            outputs: Vec::new(),
            requirements: Requirements::new(),
            hints: Vec::new(),
            scatter: None,
            scatter_method: None,
        }
    }

    pub fn get_input(&self, id: &str) -> Option<&StepInput> {
        self.inputs.iter().find(|i| i.id == id)
    }

    pub fn get_input_mut(&mut self, id: &str) -> Option<&mut StepInput> {
        self.inputs.iter_mut().find(|i| i.id == id)
    }

    pub fn get_output(&self, id: &str) -> Option<&StepOutput> {
        self.outputs.iter().find(|o| o.id == id)
    }

    /// Return the step input `id`, appending an unwired one if absent.
    pub fn ensure_input(&mut self, id: &str) -> &mut StepInput {
        let index = match self.inputs.iter().position(|i| i.id == id) {
            Some(index) => index,
            None => {
                self.inputs.push(StepInput::new(id));
                self.inputs.len() - 1
            }
        };
        &mut self.inputs[index]
    }

    /// Declare step output `id`; returns false when it already existed.
    pub fn ensure_output(&mut self, id: &str) -> bool {
        if self.get_output(id).is_some() {
            return false;
        }
        self.outputs.push(StepOutput::new(id));
        true
    }

    pub fn scattered_ports(&self) -> &[String] {
        self.scatter.as_ref().map_or(&[], OneOrMany::as_slice)
    }

    pub fn is_scattered(&self, port: &str) -> bool {
        self.scattered_ports().iter().any(|p| p == port)
    }

    /// Set how the sources of input `port` are merged.
    pub fn link_merge(&mut self, port: &str, method: LinkMerge) -> Result<()> {
        let input = self
            .get_input_mut(port)
            .ok_or_else(|| CwlError::not_found("step input", port))?;
        input.link_merge = Some(method);
        Ok(())
    }

    /// Required inputs of the embedded run that nothing supplies.
    ///
    /// Referenced runs are opaque and report nothing.
    pub fn unbound_inputs(&self) -> Vec<&str> {
        let Some(process) = self.run.process() else {
            return Vec::new();
        };
        process
            .base()
            .inputs
            .iter()
            .filter(|port| port.needs_value())
            .filter(|port| !self.get_input(&port.id).is_some_and(StepInput::is_bound))
            .map(|port| port.id.as_str())
            .collect()
    }

    pub fn readiness(&self) -> StepState {
        if self.unbound_inputs().is_empty() {
            StepState::Ready
        } else {
            StepState::Pending
        }
    }

    /// Step ids this step reads from.
    pub fn upstream_steps(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .flat_map(|input| input.source.iter())
            .filter_map(|source| source.split_once('/').map(|(step, _)| step))
    }
}

/// `in` in list form, or mapping form where a bare value is the source.
fn inputs_list_or_map<'de, D>(deserializer: D) -> std::result::Result<Vec<StepInput>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    entries_from_value(value.unwrap_or(Value::Null), "id", Some("source")).map_err(serde::de::Error::custom)
}
