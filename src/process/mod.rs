//! # Process Module
//!
//! Runnable units of a document and the operations they share.
//!
//! ## Overview
//!
//! - [`Process`] - `CommandLineTool`, `Workflow` or `ExpressionTool`,
//!   discriminated by `class`
//! - [`ProcessBase`] - fields common to every process
//! - [`ProcessLike`] - port, requirement, hint and staging operations
//!
//! ## Example
//!
//! ```rust
//! use cwlforge::process::{CommandLineTool, ProcessLike};
//! use cwlforge::requirement::DockerRequirement;
//! use cwlforge::types::TypeHint;
//!
//! let mut tool = CommandLineTool::new("samtools_index");
//! tool.add_input(&TypeHint::file().required(), "bam").unwrap();
//! tool.add_output(&TypeHint::file().glob("*.bai"), "index").unwrap();
//! tool.add_requirement(DockerRequirement::pull("biocontainers/samtools")).unwrap();
//! assert!(tool.get_port("bam").is_some());
//! ```

mod expression;
pub mod metadata;
mod tool;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::binding::{OutputBinding, SecondaryFiles};
use crate::error::{CwlError, Result};
use crate::platform::ProcessHint;
use crate::port::{list_or_map, InputOptions, InputPort, OutputOptions, OutputPort};
use crate::requirement::{Dirent, EnvironmentDef, ListingEntry, Requirement, RequirementKind, Requirements};
use crate::types::{kind_of_value, CwlType, Direction, TypeFactory, TypeHint};
use crate::util::validate_id;
use crate::workflow::Workflow;

pub use expression::ExpressionTool;
pub use tool::{Argument, BashOptions, CommandLineTool, EnvInput, ExitClass};

/// Document version written on new processes.
pub const CWL_VERSION: &str = "v1.0";

fn default_cwl_version() -> String {
    CWL_VERSION.to_string()
}

// ============================================================================
// PROCESS BASE
// ============================================================================

/// Fields shared by every process class.
///
/// Unknown keys (`sbg:hash`, `sbg:revision`, ...) land in `extensions` and
/// are written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessBase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default = "default_cwl_version")]
    pub cwl_version: String,
    #[serde(default, deserialize_with = "list_or_map")]
    pub inputs: Vec<InputPort>,
    #[serde(default, deserialize_with = "list_or_map")]
    pub outputs: Vec<OutputPort>,
    #[serde(default, skip_serializing_if = "Requirements::is_empty")]
    pub requirements: Requirements,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<ProcessHint>,
    #[serde(rename = "$namespaces", default, skip_serializing_if = "IndexMap::is_empty")]
    pub namespaces: IndexMap<String, String>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Default for ProcessBase {
    fn default() -> Self {
        Self {
            id: None,
            label: None,
            doc: None,
            cwl_version: default_cwl_version(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            requirements: Requirements::new(),
            hints: Vec::new(),
            namespaces: IndexMap::new(),
            extensions: IndexMap::new(),
        }
    }
}

impl ProcessBase {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

/// Borrowed view of a port found by [`ProcessLike::get_port`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PortRef<'a> {
    Input(&'a InputPort),
    Output(&'a OutputPort),
}

impl<'a> PortRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            PortRef::Input(p) => &p.id,
            PortRef::Output(p) => &p.id,
        }
    }

    pub fn port_type(&self) -> &'a CwlType {
        match self {
            PortRef::Input(p) => &p.port_type,
            PortRef::Output(p) => &p.port_type,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            PortRef::Input(_) => Direction::Input,
            PortRef::Output(_) => Direction::Output,
        }
    }
}

// ============================================================================
// SHARED OPERATIONS
// ============================================================================

/// Operations common to all runnable units.
///
/// Implementors provide access to their [`ProcessBase`]; everything else is
/// built on top of it.
pub trait ProcessLike {
    fn base(&self) -> &ProcessBase;

    fn base_mut(&mut self) -> &mut ProcessBase;

    /// Document `class` value
    fn class(&self) -> &'static str;

    fn allows_requirement(&self, kind: RequirementKind) -> bool {
        !kind.is_workflow_only()
    }

    fn id(&self) -> Option<&str> {
        self.base().id.as_deref()
    }

    fn label(&self) -> Option<&str> {
        self.base().label.as_deref()
    }

    // ------------------------------------------------------------------------
    // Ports
    // ------------------------------------------------------------------------

    fn add_input(&mut self, hint: &TypeHint, id: &str) -> Result<&mut InputPort> {
        self.add_input_with(hint, id, InputOptions::default())
    }

    /// Add an input port built from `hint`.
    ///
    /// Options win over the hint's label, doc and secondary files. A default
    /// must be admitted by the resulting type.
    fn add_input_with(&mut self, hint: &TypeHint, id: &str, options: InputOptions) -> Result<&mut InputPort> {
        validate_id(id)?;
        if self.get_input(id).is_some() {
            return Err(CwlError::duplicate("input", id));
        }

        let port_type = TypeFactory::create(hint, Direction::Input)?;
        let default = hint.default_value().cloned();
        if let Some(value) = &default {
            if !port_type.admits(value) {
                return Err(CwlError::mismatch(
                    format!("default admitted by {port_type}"),
                    kind_of_value(value),
                ));
            }
        }
        if self.get_output(id).is_some() {
            tracing::warn!(id, "input shares its id with an existing output");
        }

        let port = InputPort {
            id: id.to_string(),
            label: options.label.or_else(|| hint.label.clone()),
            doc: options.doc.or_else(|| hint.doc.clone()),
            port_type,
            secondary_files: options.secondary_files.or_else(|| hint.secondary_files.clone()),
            streamable: options.streamable,
            format: options.format,
            default,
            input_binding: options.binding,
        };

        let index = self.base().inputs.len();
        self.base_mut().inputs.push(port);
        if options.stage {
            self.stage_input(id)?;
        }
        Ok(&mut self.base_mut().inputs[index])
    }

    fn add_output(&mut self, hint: &TypeHint, id: &str) -> Result<&mut OutputPort> {
        self.add_output_with(hint, id, OutputOptions::default())
    }

    /// Add an output port built from `hint`; a hint glob without an explicit
    /// binding becomes `outputBinding.glob`.
    fn add_output_with(&mut self, hint: &TypeHint, id: &str, options: OutputOptions) -> Result<&mut OutputPort> {
        validate_id(id)?;
        if self.get_output(id).is_some() {
            return Err(CwlError::duplicate("output", id));
        }

        let port_type = TypeFactory::create(hint, Direction::Output)?;
        if self.get_input(id).is_some() {
            tracing::warn!(id, "output shares its id with an existing input");
        }

        let output_binding = options
            .binding
            .or_else(|| hint.glob.as_ref().map(OutputBinding::glob));

        let mut port = OutputPort::new(id, port_type);
        port.label = options.label.or_else(|| hint.label.clone());
        port.doc = options.doc.or_else(|| hint.doc.clone());
        port.secondary_files = options.secondary_files.or_else(|| hint.secondary_files.clone());
        port.streamable = options.streamable;
        port.format = options.format;
        port.output_binding = output_binding;

        self.base_mut().outputs.push(port);
        let index = self.base().outputs.len() - 1;
        Ok(&mut self.base_mut().outputs[index])
    }

    /// Inputs are searched before outputs.
    fn get_port(&self, id: &str) -> Option<PortRef<'_>> {
        self.get_input(id)
            .map(PortRef::Input)
            .or_else(|| self.get_output(id).map(PortRef::Output))
    }

    fn get_input(&self, id: &str) -> Option<&InputPort> {
        self.base().inputs.iter().find(|p| p.id == id)
    }

    fn get_output(&self, id: &str) -> Option<&OutputPort> {
        self.base().outputs.iter().find(|p| p.id == id)
    }

    fn get_input_mut(&mut self, id: &str) -> Option<&mut InputPort> {
        self.base_mut().inputs.iter_mut().find(|p| p.id == id)
    }

    fn get_output_mut(&mut self, id: &str) -> Option<&mut OutputPort> {
        self.base_mut().outputs.iter_mut().find(|p| p.id == id)
    }

    fn set_secondary_files(&mut self, id: &str, files: SecondaryFiles) -> Result<()> {
        if let Some(port) = self.get_input_mut(id) {
            port.secondary_files = Some(files);
            return Ok(());
        }
        match self.get_output_mut(id) {
            Some(port) => {
                port.secondary_files = Some(files);
                Ok(())
            }
            None => Err(CwlError::not_found("port", id)),
        }
    }

    /// Stage input `id` into the working directory as `$(inputs.<id>)`.
    fn stage_input(&mut self, id: &str) -> Result<()> {
        if self.get_input(id).is_none() {
            return Err(CwlError::not_found("input", id));
        }
        let entry = ListingEntry::Expression(format!("$(inputs.{id})"));
        let requirements = &mut self.base_mut().requirements;
        if let Requirement::InitialWorkDir(workdir) = requirements.ensure(Requirement::empty(RequirementKind::InitialWorkDir)) {
            workdir.push(entry);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Requirements and hints
    // ------------------------------------------------------------------------

    /// Insert `requirement`, merging into an existing one of the same kind.
    fn add_requirement(&mut self, requirement: impl Into<Requirement>) -> Result<()> {
        let requirement = requirement.into();
        let kind = requirement.kind();
        if !self.allows_requirement(kind) {
            return Err(CwlError::mismatch(
                format!("requirement allowed on {}", self.class()),
                kind.as_str(),
            ));
        }
        self.base_mut().requirements.add(requirement);
        Ok(())
    }

    fn find_requirement(&self, kind: RequirementKind) -> Option<&Requirement> {
        self.base().requirements.get(kind)
    }

    fn add_hint(&mut self, hint: impl Into<ProcessHint>) {
        self.base_mut().hints.push(hint.into());
    }

    /// Copy metadata of input `src` onto the files produced by output `dst`.
    fn inherit_metadata(&mut self, src: &str, dst: &str) -> Result<()> {
        if self.get_input(src).is_none() {
            return Err(CwlError::not_found("input", src));
        }
        let output = self.get_output(dst).ok_or_else(|| CwlError::not_found("output", dst))?;
        let single = !output.port_type.is_file_array();

        let existing = output.output_binding.as_ref().and_then(|b| b.output_eval.as_deref());
        let preprocess = match existing {
            None => String::new(),
            Some(expr) if metadata::is_generated(expr) => {
                metadata::preprocess_of(expr).unwrap_or_default().to_string()
            }
            Some(expr) => metadata::fold_inline(expr).ok_or_else(|| CwlError::Conflict {
                id: dst.to_string(),
                details: "outputEval already set; apply metadata inheritance manually".into(),
            })?,
        };

        let expression = metadata::inherit_expression(single, src, &preprocess);
        self.add_expression_lib(metadata::EXPRESSION_LIB);
        if let Some(port) = self.get_output_mut(dst) {
            port.output_binding.get_or_insert_with(OutputBinding::default).output_eval = Some(expression);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Working directory and environment
    // ------------------------------------------------------------------------

    fn create_file(&self, entry: &str, entryname: Option<&str>, writable: bool, encode: bool) -> Dirent {
        Dirent::new(entry, entryname, writable, encode)
    }

    fn add_file(&mut self, entry: &str, entryname: Option<&str>, writable: bool, encode: bool) {
        let dirent = self.create_file(entry, entryname, writable, encode);
        self.add_in_workdir(dirent.into());
    }

    fn add_in_workdir(&mut self, entry: ListingEntry) {
        let requirements = &mut self.base_mut().requirements;
        if let Requirement::InitialWorkDir(workdir) = requirements.ensure(Requirement::empty(RequirementKind::InitialWorkDir)) {
            workdir.listing.push(entry);
        }
    }

    /// Stage `input.json` holding every input value at runtime.
    fn add_input_json(&mut self) {
        self.add_file("$(JSON.stringify(inputs, null, 2))", Some("input.json"), false, false);
    }

    fn add_env_var(&mut self, name: &str, value: &str) {
        self.add_env_defs([EnvironmentDef::new(name, value)]);
    }

    fn add_env_defs<I>(&mut self, defs: I)
    where
        I: IntoIterator<Item = EnvironmentDef>,
    {
        let requirements = &mut self.base_mut().requirements;
        if let Requirement::EnvVar(env) = requirements.ensure(Requirement::empty(RequirementKind::EnvVar)) {
            for def in defs {
                env.set(def);
            }
        }
    }

    fn add_expression_lib(&mut self, lib: &str) {
        if let Requirement::InlineJavascript(js) =
            self.base_mut().requirements.ensure(Requirement::empty(RequirementKind::InlineJavascript))
        {
            let libs = js.expression_lib.get_or_insert_with(Vec::new);
            if !libs.iter().any(|l| l == lib) {
                libs.push(lib.to_string());
            }
        }
    }
}

// ============================================================================
// PROCESS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "class")]
pub enum Process {
    CommandLineTool(CommandLineTool),
    Workflow(Workflow),
    ExpressionTool(ExpressionTool),
}

impl Process {
    /// Lower raw document data into a process, dispatching on `class`.
    pub fn from_value(value: Value) -> Result<Process> {
        let Value::Object(mut map) = value else {
            return Err(CwlError::mismatch("process mapping", kind_of_value(&value)));
        };
        let class = match map.remove("class") {
            Some(Value::String(class)) => class,
            Some(other) => return Err(CwlError::mismatch("class string", kind_of_value(&other))),
            None => {
                return Err(CwlError::MissingDiscriminator {
                    context: map
                        .get("id")
                        .and_then(Value::as_str)
                        .map_or_else(|| "process".to_string(), |id| format!("process '{id}'")),
                })
            }
        };
        let value = Value::Object(map);
        let process = match class.as_str() {
            "CommandLineTool" => Process::CommandLineTool(serde_json::from_value(value)?),
            "Workflow" => Process::Workflow(serde_json::from_value(value)?),
            "ExpressionTool" => Process::ExpressionTool(serde_json::from_value(value)?),
            _ => return Err(CwlError::UnknownClass { class }),
        };
        Ok(process)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn as_tool(&self) -> Option<&CommandLineTool> {
        match self {
            Process::CommandLineTool(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_workflow(&self) -> Option<&Workflow> {
        match self {
            Process::Workflow(workflow) => Some(workflow),
            _ => None,
        }
    }

    pub fn as_workflow_mut(&mut self) -> Option<&mut Workflow> {
        match self {
            Process::Workflow(workflow) => Some(workflow),
            _ => None,
        }
    }

    pub fn is_workflow(&self) -> bool {
        matches!(self, Process::Workflow(_))
    }
}

impl ProcessLike for Process {
    fn base(&self) -> &ProcessBase {
        match self {
            Process::CommandLineTool(p) => p.base(),
            Process::Workflow(p) => p.base(),
            Process::ExpressionTool(p) => p.base(),
        }
    }

    fn base_mut(&mut self) -> &mut ProcessBase {
        match self {
            Process::CommandLineTool(p) => p.base_mut(),
            Process::Workflow(p) => p.base_mut(),
            Process::ExpressionTool(p) => p.base_mut(),
        }
    }

    fn class(&self) -> &'static str {
        match self {
            Process::CommandLineTool(p) => p.class(),
            Process::Workflow(p) => p.class(),
            Process::ExpressionTool(p) => p.class(),
        }
    }

    fn allows_requirement(&self, kind: RequirementKind) -> bool {
        match self {
            Process::CommandLineTool(p) => p.allows_requirement(kind),
            Process::Workflow(p) => p.allows_requirement(kind),
            Process::ExpressionTool(p) => p.allows_requirement(kind),
        }
    }
}

impl<'de> Deserialize<'de> for Process {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Process::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl From<CommandLineTool> for Process {
    fn from(tool: CommandLineTool) -> Self {
        Process::CommandLineTool(tool)
    }
}

impl From<Workflow> for Process {
    fn from(workflow: Workflow) -> Self {
        Process::Workflow(workflow)
    }
}

impl From<ExpressionTool> for Process {
    fn from(tool: ExpressionTool) -> Self {
        Process::ExpressionTool(tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::InputBinding;
    use crate::requirement::{DockerRequirement, InlineJavascriptRequirement};
    use crate::types::PrimitiveKind;
    use serde_json::json;

    fn tool() -> CommandLineTool {
        let mut tool = CommandLineTool::new("bwa_mem");
        tool.add_input(&TypeHint::file().required(), "reads").unwrap();
        tool.add_input(&TypeHint::array(TypeHint::file()).required(), "refs").unwrap();
        tool.add_output(&TypeHint::file().required().glob("*.bam"), "bam").unwrap();
        tool.add_output(&TypeHint::array(TypeHint::file()).required().glob("*.bai"), "indices").unwrap();
        tool
    }

    #[test]
    fn test_add_input_rejects_duplicate() {
        let mut tool = tool();
        let err = tool.add_input(&TypeHint::string(), "reads").unwrap_err();
        assert_eq!(err.code(), "CWL-004");
        assert_eq!(tool.base.inputs.len(), 2);
    }

    #[test]
    fn test_cross_direction_id_is_allowed() {
        let mut tool = tool();
        tool.add_output(&TypeHint::file(), "reads").unwrap();
        assert!(matches!(tool.get_port("reads"), Some(PortRef::Input(_))));
        assert!(tool.get_output("reads").is_some());
    }

    #[test]
    fn test_add_input_default_and_options() {
        let mut tool = tool();
        let hint = TypeHint::int().default(4).label("threads");
        let port = tool
            .add_input_with(&hint, "threads", InputOptions::binding(InputBinding::at(1).with_prefix("-t")))
            .unwrap();
        assert_eq!(port.default, Some(json!(4)));
        assert_eq!(port.label.as_deref(), Some("threads"));
        assert!(!port.port_type.is_required());
    }

    #[test]
    fn test_default_must_be_admitted() {
        let mut tool = tool();
        let err = tool.add_input(&TypeHint::int().default("four"), "threads").unwrap_err();
        assert_eq!(err.code(), "CWL-001");
        assert!(tool.get_input("threads").is_none());
    }

    #[test]
    fn test_glob_hint_synthesizes_binding() {
        let tool = tool();
        let glob = tool.get_output("bam").and_then(|p| p.output_binding.as_ref()).and_then(|b| b.glob.clone());
        assert_eq!(glob.map(|g| g.into_vec()), Some(vec!["*.bam".to_string()]));
    }

    #[test]
    fn test_stage_input() {
        let mut tool = tool();
        tool.add_input_with(&TypeHint::file(), "fasta", InputOptions::staged()).unwrap();
        tool.stage_input("fasta").unwrap();
        let Some(Requirement::InitialWorkDir(wd)) = tool.find_requirement(RequirementKind::InitialWorkDir) else {
            panic!("expected workdir requirement");
        };
        assert_eq!(wd.listing, vec![ListingEntry::Expression("$(inputs.fasta)".into())]);
        assert_eq!(tool.stage_input("missing").unwrap_err().code(), "CWL-003");
    }

    #[test]
    fn test_workflow_only_requirement_rejected_on_tool() {
        let mut tool = tool();
        let err = tool.add_requirement(Requirement::ScatterFeature).unwrap_err();
        assert_eq!(err.code(), "CWL-001");
        tool.add_requirement(DockerRequirement::pull("alpine")).unwrap();
        assert!(tool.find_requirement(RequirementKind::Docker).is_some());
    }

    #[test]
    fn test_set_secondary_files_searches_both_directions() {
        let mut tool = tool();
        tool.set_secondary_files("bam", ".bai".to_string().into()).unwrap();
        assert!(tool.get_output("bam").and_then(|p| p.secondary_files.as_ref()).is_some());
        assert_eq!(tool.set_secondary_files("nope", ".bai".to_string().into()).unwrap_err().code(), "CWL-003");
    }

    #[test]
    fn test_inherit_metadata_single_and_array() {
        let mut tool = tool();
        tool.inherit_metadata("reads", "bam").unwrap();
        tool.inherit_metadata("reads", "indices").unwrap();

        let eval = |id: &str| {
            tool.get_output(id)
                .and_then(|p| p.output_binding.as_ref())
                .and_then(|b| b.output_eval.clone())
                .unwrap()
        };
        assert!(eval("bam").contains("inheritMetadata(self[0], inputs.reads)"));
        assert!(eval("indices").contains("self.map("));

        let Some(Requirement::InlineJavascript(InlineJavascriptRequirement { expression_lib: Some(libs) })) =
            tool.find_requirement(RequirementKind::InlineJavascript)
        else {
            panic!("expected expression lib");
        };
        assert_eq!(libs.len(), 1);
    }

    #[test]
    fn test_inherit_metadata_folds_inline_expression() {
        let mut tool = tool();
        if let Some(port) = tool.get_output_mut("bam") {
            port.output_binding.get_or_insert_with(OutputBinding::default).output_eval = Some("$(self[1])".into());
        }
        tool.inherit_metadata("reads", "bam").unwrap();
        tool.inherit_metadata("refs", "bam").unwrap();
        let eval = tool.get_output("bam").and_then(|p| p.output_binding.clone()).and_then(|b| b.output_eval).unwrap();
        assert!(eval.contains("self = self[1]"));
        assert!(eval.contains("inputs.refs"));
    }

    #[test]
    fn test_inherit_metadata_conflict_and_missing() {
        let mut tool = tool();
        if let Some(port) = tool.get_output_mut("bam") {
            port.output_binding.get_or_insert_with(OutputBinding::default).output_eval = Some("${ return self }".into());
        }
        assert_eq!(tool.inherit_metadata("reads", "bam").unwrap_err().code(), "CWL-007");
        assert_eq!(tool.inherit_metadata("nope", "bam").unwrap_err().code(), "CWL-003");
        assert_eq!(tool.inherit_metadata("reads", "nope").unwrap_err().code(), "CWL-003");
        assert!(tool.find_requirement(RequirementKind::InlineJavascript).is_none());
    }

    #[test]
    fn test_inherit_metadata_keeps_handwritten_helper_call() {
        let mut tool = tool();
        let custom = "${ var f = self[1]; f.metadata = {custom: 1}; return inheritMetadata(f, inputs.ref) }";
        if let Some(port) = tool.get_output_mut("bam") {
            port.output_binding.get_or_insert_with(OutputBinding::default).output_eval = Some(custom.into());
        }
        assert_eq!(tool.inherit_metadata("reads", "bam").unwrap_err().code(), "CWL-007");
        let eval = tool.get_output("bam").and_then(|p| p.output_binding.clone()).and_then(|b| b.output_eval);
        assert_eq!(eval.as_deref(), Some(custom));
    }

    #[test]
    fn test_hints_keep_duplicates_in_order() {
        let mut tool = tool();
        tool.add_hint(Requirement::from(DockerRequirement::pull("samtools:1.9")));
        tool.add_hint(Requirement::from(DockerRequirement::pull("samtools:1.10")));

        let images: Vec<&str> = tool
            .base
            .hints
            .iter()
            .filter_map(|h| match h {
                ProcessHint::Requirement(Requirement::Docker(d)) => d.docker_pull.as_deref(),
                _ => None,
            })
            .collect();
        assert_eq!(tool.base.hints.len(), 2);
        assert_eq!(images, vec!["samtools:1.9", "samtools:1.10"]);
        assert!(tool.find_requirement(RequirementKind::Docker).is_none());
    }

    #[test]
    fn test_env_vars_replace_by_name() {
        let mut tool = tool();
        tool.add_env_var("LANG", "C");
        tool.add_env_var("LANG", "en_US.UTF-8");
        tool.add_env_var("TMPDIR", "/tmp");
        let Some(Requirement::EnvVar(env)) = tool.find_requirement(RequirementKind::EnvVar) else {
            panic!("expected env requirement");
        };
        assert_eq!(env.env_def.len(), 2);
        assert_eq!(env.env_def[0].env_value, "en_US.UTF-8");
    }

    #[test]
    fn test_add_input_json_stages_dirent() {
        let mut tool = tool();
        tool.add_input_json();
        let value = serde_json::to_value(&tool.base.requirements).unwrap();
        assert_eq!(
            value,
            json!([{
                "class": "InitialWorkDirRequirement",
                "listing": [{"entry": "$(JSON.stringify(inputs, null, 2))", "entryname": "input.json"}]
            }])
        );
    }

    #[test]
    fn test_from_value_dispatch() {
        let process = Process::from_value(json!({
            "class": "CommandLineTool",
            "id": "echo",
            "baseCommand": "echo",
            "inputs": {"message": "string"},
            "outputs": [],
            "sbg:hash": "abc"
        }))
        .unwrap();
        let tool = process.as_tool().unwrap();
        assert_eq!(tool.base.extensions.get("sbg:hash"), Some(&json!("abc")));
        assert_eq!(
            tool.get_input("message").map(|p| p.port_type.clone()),
            Some(CwlType::primitive(PrimitiveKind::String))
        );

        let missing = Process::from_value(json!({"id": "x"})).unwrap_err();
        assert_eq!(missing.code(), "CWL-011");
        let unknown = Process::from_value(json!({"class": "Operation"})).unwrap_err();
        assert_eq!(unknown.code(), "CWL-010");
    }

    #[test]
    fn test_class_written_first() {
        let value = Process::from(CommandLineTool::new("t")).to_value().unwrap();
        let first = value.as_object().and_then(|m| m.keys().next().cloned());
        assert_eq!(first.as_deref(), Some("class"));
        assert_eq!(value["cwlVersion"], json!("v1.0"));
    }
}
