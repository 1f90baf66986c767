//! # Workflow Module
//!
//! Composition of processes into a step graph.
//!
//! ## Overview
//!
//! - [`Workflow`] - a process whose body is a list of [`Step`]s
//! - `connect` - `add_connection` wiring between workflow ports and steps
//! - `compose` - `add_step` with port exposure at the workflow boundary
//! - `scatter` - array rewrapping of the ports a scattered step touches
//! - [`StepGraph`] - step dependency graph (cycles, topological order)
//! - [`ValidationReport`] - structural checks over a finished workflow
//!
//! ## Example
//!
//! ```rust
//! use cwlforge::process::{CommandLineTool, ProcessLike};
//! use cwlforge::types::TypeHint;
//! use cwlforge::workflow::{StepOptions, Workflow};
//!
//! let mut tool = CommandLineTool::new("sort");
//! tool.add_input(&TypeHint::file().required(), "unsorted").unwrap();
//! tool.add_output(&TypeHint::file().required().glob("*.sorted"), "sorted").unwrap();
//!
//! let mut wf = Workflow::new("pipeline");
//! wf.add_step(tool, StepOptions::default()).unwrap();
//! assert!(wf.get_input("unsorted").is_some());
//! assert!(wf.validate().is_valid());
//! ```

mod compose;
mod connect;
mod graph;
mod scatter;
mod step;
mod validate;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::port::entries_from_value;
use crate::process::{ProcessBase, ProcessLike};
use crate::requirement::RequirementKind;

pub use compose::{Exposure, StepOptions};
pub use graph::StepGraph;
pub use step::{Step, StepInput, StepOutput, StepRun, StepState};
pub use validate::{Severity, ValidationIssue, ValidationReport};

/// How multiple sources feeding one port are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMerge {
    MergeNested,
    MergeFlattened,
}

/// How scattered ports are combined into job instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScatterMethod {
    Dotproduct,
    FlatCrossproduct,
    NestedCrossproduct,
}

/// A process composed of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(flatten)]
    pub base: ProcessBase,
    #[serde(default, deserialize_with = "steps_list_or_map")]
    pub steps: Vec<Step>,
}

impl Workflow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            base: ProcessBase::with_id(id),
            steps: Vec::new(),
        }
    }

    pub fn get_step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn get_step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    pub fn step_ids(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.id.as_str())
    }

    /// Build the step dependency graph.
    pub fn graph(&self) -> StepGraph {
        StepGraph::from_workflow(self)
    }

    /// Step ids ordered so every step follows the steps it reads from.
    /// `None` when the steps form a cycle.
    pub fn topological_order(&self) -> Option<Vec<String>> {
        self.graph()
            .topological_order()
            .map(|order| order.iter().map(|id| id.to_string()).collect())
    }
}

impl ProcessLike for Workflow {
    fn base(&self) -> &ProcessBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProcessBase {
        &mut self.base
    }

    fn class(&self) -> &'static str {
        "Workflow"
    }

    fn allows_requirement(&self, _kind: RequirementKind) -> bool {
        true
    }
}

/// `steps` in list form, or mapping form keyed by step id.
fn steps_list_or_map<'de, D>(deserializer: D) -> Result<Vec<Step>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    entries_from_value(value.unwrap_or(Value::Null), "id", None).map_err(serde::de::Error::custom)
}
