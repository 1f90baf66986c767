//! Requirements Module - process requirements keyed by kind
//!
//! A process holds at most one requirement per kind. Adding a second one of
//! the same kind merges field by field: every field the new requirement
//! defines overwrites the old value.
//!
//! Document forms accepted on input:
//! - list form: `requirements: [{class: DockerRequirement, dockerPull: x}]`
//! - mapping form: `requirements: {DockerRequirement: {dockerPull: x}}`

mod kinds;
mod workdir;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::port::entries_from_value;

pub use kinds::{
    DockerRequirement, EnvVarRequirement, EnvironmentDef, InlineJavascriptRequirement, ResourceRequirement,
    ResourceValue, SchemaDefRequirement, SoftwarePackage, SoftwareRequirement,
};
pub use workdir::{Dirent, InitialWorkDirRequirement, ListingEntry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum Requirement {
    #[serde(rename = "DockerRequirement")]
    Docker(DockerRequirement),
    #[serde(rename = "InlineJavascriptRequirement")]
    InlineJavascript(InlineJavascriptRequirement),
    #[serde(rename = "InitialWorkDirRequirement")]
    InitialWorkDir(InitialWorkDirRequirement),
    #[serde(rename = "EnvVarRequirement")]
    EnvVar(EnvVarRequirement),
    #[serde(rename = "ShellCommandRequirement")]
    ShellCommand,
    #[serde(rename = "ResourceRequirement")]
    Resource(ResourceRequirement),
    #[serde(rename = "SchemaDefRequirement")]
    SchemaDef(SchemaDefRequirement),
    #[serde(rename = "SoftwareRequirement")]
    Software(SoftwareRequirement),
    #[serde(rename = "SubworkflowFeatureRequirement")]
    SubworkflowFeature,
    #[serde(rename = "ScatterFeatureRequirement")]
    ScatterFeature,
    #[serde(rename = "MultipleInputFeatureRequirement")]
    MultipleInputFeature,
    #[serde(rename = "StepInputExpressionRequirement")]
    StepInputExpression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequirementKind {
    Docker,
    InlineJavascript,
    InitialWorkDir,
    EnvVar,
    ShellCommand,
    Resource,
    SchemaDef,
    Software,
    SubworkflowFeature,
    ScatterFeature,
    MultipleInputFeature,
    StepInputExpression,
}

impl RequirementKind {
    /// Document `class` value
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementKind::Docker => "DockerRequirement",
            RequirementKind::InlineJavascript => "InlineJavascriptRequirement",
            RequirementKind::InitialWorkDir => "InitialWorkDirRequirement",
            RequirementKind::EnvVar => "EnvVarRequirement",
            RequirementKind::ShellCommand => "ShellCommandRequirement",
            RequirementKind::Resource => "ResourceRequirement",
            RequirementKind::SchemaDef => "SchemaDefRequirement",
            RequirementKind::Software => "SoftwareRequirement",
            RequirementKind::SubworkflowFeature => "SubworkflowFeatureRequirement",
            RequirementKind::ScatterFeature => "ScatterFeatureRequirement",
            RequirementKind::MultipleInputFeature => "MultipleInputFeatureRequirement",
            RequirementKind::StepInputExpression => "StepInputExpressionRequirement",
        }
    }

    /// Kinds that only make sense on a Workflow.
    pub fn is_workflow_only(&self) -> bool {
        matches!(
            self,
            RequirementKind::SubworkflowFeature
                | RequirementKind::ScatterFeature
                | RequirementKind::MultipleInputFeature
                | RequirementKind::StepInputExpression
        )
    }
}

impl fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Requirement {
    pub fn kind(&self) -> RequirementKind {
        match self {
            Requirement::Docker(_) => RequirementKind::Docker,
            Requirement::InlineJavascript(_) => RequirementKind::InlineJavascript,
            Requirement::InitialWorkDir(_) => RequirementKind::InitialWorkDir,
            Requirement::EnvVar(_) => RequirementKind::EnvVar,
            Requirement::ShellCommand => RequirementKind::ShellCommand,
            Requirement::Resource(_) => RequirementKind::Resource,
            Requirement::SchemaDef(_) => RequirementKind::SchemaDef,
            Requirement::Software(_) => RequirementKind::Software,
            Requirement::SubworkflowFeature => RequirementKind::SubworkflowFeature,
            Requirement::ScatterFeature => RequirementKind::ScatterFeature,
            Requirement::MultipleInputFeature => RequirementKind::MultipleInputFeature,
            Requirement::StepInputExpression => RequirementKind::StepInputExpression,
        }
    }

    /// Empty requirement of `kind`; merging it into an existing one is a no-op.
    pub fn empty(kind: RequirementKind) -> Self {
        match kind {
            RequirementKind::Docker => Requirement::Docker(Default::default()),
            RequirementKind::InlineJavascript => Requirement::InlineJavascript(Default::default()),
            RequirementKind::InitialWorkDir => Requirement::InitialWorkDir(Default::default()),
            RequirementKind::EnvVar => Requirement::EnvVar(Default::default()),
            RequirementKind::ShellCommand => Requirement::ShellCommand,
            RequirementKind::Resource => Requirement::Resource(Default::default()),
            RequirementKind::SchemaDef => Requirement::SchemaDef(Default::default()),
            RequirementKind::Software => Requirement::Software(Default::default()),
            RequirementKind::SubworkflowFeature => Requirement::SubworkflowFeature,
            RequirementKind::ScatterFeature => Requirement::ScatterFeature,
            RequirementKind::MultipleInputFeature => Requirement::MultipleInputFeature,
            RequirementKind::StepInputExpression => Requirement::StepInputExpression,
        }
    }

    fn merge_from(&mut self, other: Requirement) {
        match (self, other) {
            (Requirement::Docker(old), Requirement::Docker(new)) => old.merge_from(new),
            (Requirement::InlineJavascript(old), Requirement::InlineJavascript(new)) => old.merge_from(new),
            (Requirement::InitialWorkDir(old), Requirement::InitialWorkDir(new)) => old.merge_from(new),
            (Requirement::EnvVar(old), Requirement::EnvVar(new)) => old.merge_from(new),
            (Requirement::Resource(old), Requirement::Resource(new)) => old.merge_from(new),
            (Requirement::SchemaDef(old), Requirement::SchemaDef(new)) => old.merge_from(new),
            (Requirement::Software(old), Requirement::Software(new)) => old.merge_from(new),
            (slot, other) => *slot = other,
        }
    }
}

/// Merge `new` into a copy of `old`; every field `new` defines wins.
pub fn merge(old: &Requirement, new: Requirement) -> Requirement {
    let mut merged = old.clone();
    merged.merge_from(new);
    merged
}

macro_rules! requirement_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Requirement {
                fn from(inner: $ty) -> Self {
                    Requirement::$variant(inner)
                }
            }
        )*
    };
}

requirement_from! {
    DockerRequirement => Docker,
    InlineJavascriptRequirement => InlineJavascript,
    InitialWorkDirRequirement => InitialWorkDir,
    EnvVarRequirement => EnvVar,
    ResourceRequirement => Resource,
    SchemaDefRequirement => SchemaDef,
    SoftwareRequirement => Software,
}

/// Requirement set keyed by kind, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Requirements(IndexMap<RequirementKind, Requirement>);

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, or merge into the existing requirement of the same kind.
    pub fn add(&mut self, requirement: Requirement) {
        let kind = requirement.kind();
        match self.0.get_mut(&kind) {
            Some(existing) => {
                tracing::debug!(kind = %kind, "merging requirement");
                existing.merge_from(requirement);
            }
            None => {
                self.0.insert(kind, requirement);
            }
        }
    }

    /// Return the requirement of `empty`'s kind, inserting `empty` if absent.
    pub fn ensure(&mut self, empty: Requirement) -> &mut Requirement {
        self.0.entry(empty.kind()).or_insert(empty)
    }

    pub fn get(&self, kind: RequirementKind) -> Option<&Requirement> {
        self.0.get(&kind)
    }

    pub fn get_mut(&mut self, kind: RequirementKind) -> Option<&mut Requirement> {
        self.0.get_mut(&kind)
    }

    pub fn contains(&self, kind: RequirementKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn remove(&mut self, kind: RequirementKind) -> Option<Requirement> {
        self.0.shift_remove(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.0.values()
    }

    pub fn kinds(&self) -> impl Iterator<Item = RequirementKind> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Requirement> for Requirements {
    fn from_iter<I: IntoIterator<Item = Requirement>>(iter: I) -> Self {
        let mut requirements = Requirements::new();
        for requirement in iter {
            requirements.add(requirement);
        }
        requirements
    }
}

impl Serialize for Requirements {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.values())
    }
}

impl<'de> Deserialize<'de> for Requirements {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        let entries: Vec<Requirement> =
            entries_from_value(value.unwrap_or(Value::Null), "class", None).map_err(serde::de::Error::custom)?;
        Ok(entries.into_iter().collect())
    }
}
