//! CommandLineTool and its construction helpers

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{ProcessBase, ProcessLike};
use crate::binding::{InputBinding, SecondaryFiles};
use crate::bundle::{Artifact, Bundler};
use crate::error::{CwlError, Result};
use crate::platform::{add_sbg_namespace, SbgHint};
use crate::port::{InputOptions, OutputOptions};
use crate::requirement::{Dirent, DockerRequirement, Requirement, RequirementKind};
use crate::types::{HintKind, TypeHint};
use crate::util::OneOrMany;

/// Command line argument not tied to an input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Literal(String),
    Binding(InputBinding),
}

impl Argument {
    /// Position on the command line; literals sort at 0.
    pub fn position(&self) -> i64 {
        match self {
            Argument::Literal(_) => 0,
            Argument::Binding(binding) => binding.position.unwrap_or(0),
        }
    }
}

/// Outcome of a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    Success,
    TemporaryFailure,
    PermanentFailure,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLineTool {
    #[serde(flatten)]
    pub base: ProcessBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_command: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub success_codes: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub temporary_fail_codes: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permanent_fail_codes: Vec<i32>,
}

impl ProcessLike for CommandLineTool {
    fn base(&self) -> &ProcessBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProcessBase {
        &mut self.base
    }

    fn class(&self) -> &'static str {
        "CommandLineTool"
    }
}

/// Value of an environment variable in [`CommandLineTool::from_bash`].
#[derive(Debug, Clone, PartialEq)]
pub enum EnvInput {
    /// Fixed value
    Literal(String),
    /// Creates an input of this type and exports its value
    Input(TypeHint),
}

/// Settings for [`CommandLineTool::from_bash`].
#[derive(Debug, Clone)]
pub struct BashOptions {
    /// Script file name at runtime
    pub name: String,
    pub id: Option<String>,
    pub label: Option<String>,
    pub doc: Option<String>,
    /// Environment variables, exported in order
    pub env: Vec<(String, EnvInput)>,
    pub outputs: Vec<(String, TypeHint)>,
    /// Bundle of shell files sourced before the script runs
    pub sources: Option<Artifact>,
    pub docker: Option<String>,
    pub secondary_files: Vec<(String, SecondaryFiles)>,
    pub stdout: Option<String>,
}

impl Default for BashOptions {
    fn default() -> Self {
        Self {
            name: "script.sh".to_string(),
            id: None,
            label: None,
            doc: None,
            env: Vec::new(),
            outputs: Vec::new(),
            sources: None,
            docker: None,
            secondary_files: Vec::new(),
            stdout: None,
        }
    }
}

impl CommandLineTool {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            base: ProcessBase::with_id(id),
            ..Default::default()
        }
    }

    pub fn with_base_command<S: Into<String>>(mut self, command: impl IntoIterator<Item = S>) -> Self {
        let mut parts: Vec<String> = command.into_iter().map(Into::into).collect();
        self.base_command = Some(if parts.len() == 1 {
            OneOrMany::One(parts.remove(0))
        } else {
            OneOrMany::Many(parts)
        });
        self
    }

    /// Prepend an argument unpacking the bz2 tarball `name`.
    ///
    /// The argument takes the smallest position among existing arguments so
    /// the bundle is unpacked before anything else runs.
    pub fn unarchive_bundle(&mut self, name: &str, encoded: bool, postprocess: Option<&str>) {
        let position = self.arguments.iter().map(Argument::position).min().unwrap_or(0);
        let decode = if encoded { "| base64 --decode " } else { "" };
        let post = postprocess
            .map(|p| format!("{} ;", p.trim_end_matches(';')))
            .unwrap_or_default();

        let mut binding = InputBinding::shell(format!("cat {name} {decode}| tar xjf - ; {post}"));
        if position != 0 {
            binding.position = Some(position);
        }
        self.arguments.insert(0, Argument::Binding(binding));
    }

    /// Stage `artifact` base64-encoded under its name and unpack it at runtime.
    pub fn embed_artifact(&mut self, artifact: &Artifact, postprocess: Option<&str>) {
        let encoded = STANDARD.encode(&artifact.payload);
        self.add_in_workdir(
            Dirent {
                entry: encoded,
                entryname: Some(artifact.name.clone()),
                writable: None,
            }
            .into(),
        );
        self.unarchive_bundle(&artifact.name, true, postprocess);

        self.add_hint(SbgHint::save_logs(basename(&artifact.name)));
        for resource in &artifact.resources {
            self.add_hint(SbgHint::save_logs(basename(&resource.to_string_lossy())));
        }
        tracing::debug!(name = %artifact.name, bytes = artifact.payload.len(), "embedded artifact");
    }

    /// Bundle `source` with `bundler` and embed the result.
    pub fn add_bundled<B: Bundler>(&mut self, bundler: &B, source: &B::Source, postprocess: Option<&str>) -> Result<()> {
        let artifact = bundler.bundle(source)?;
        self.embed_artifact(&artifact, postprocess);
        Ok(())
    }

    /// Tool running an embedded bash script.
    ///
    /// The script is staged base64-encoded as `<name>.b64` and decoded at
    /// runtime. Typed environment entries become inputs exported through an
    /// EnvVarRequirement expression.
    pub fn from_bash(script: &str, options: BashOptions) -> Result<Self> {
        let BashOptions {
            name,
            id,
            label,
            doc,
            env,
            outputs,
            sources,
            docker,
            secondary_files,
            stdout,
        } = options;

        let id = match (id, &label) {
            (Some(id), _) => id,
            (None, Some(label)) => id_from_label(label),
            (None, None) => {
                return Err(CwlError::InvalidId {
                    id: String::new(),
                    reason: "bash tool needs an id or a label".into(),
                })
            }
        };
        crate::util::validate_id(&id)?;

        let mut tool = CommandLineTool::new(id);
        tool.base.label = label;
        tool.base.doc = doc;

        let entry_name = format!("{name}.b64");
        tool.add_file(script, Some(&entry_name), false, true);

        let source_names: Vec<String> = sources
            .as_ref()
            .map(|a| a.resources.iter().map(|r| basename(&r.to_string_lossy())).collect())
            .unwrap_or_default();
        if let Some(artifact) = &sources {
            tool.embed_artifact(artifact, None);
        }
        let sourced: String = source_names.iter().map(|s| format!("source {s} && ")).collect();
        let inline = format!("{sourced}cat {entry_name}|base64 --decode > {name} && /bin/bash ./{name}");
        tool.arguments.push(Argument::Binding(InputBinding::shell(format!("/bin/bash -c \"{inline}\""))));

        if let Some(image) = docker {
            tool.add_requirement(DockerRequirement::pull(image))?;
        }
        tool.add_requirement(Requirement::ShellCommand)?;
        tool.add_requirement(Requirement::empty(RequirementKind::InlineJavascript))?;

        for (var, value) in env {
            match value {
                EnvInput::Literal(literal) => tool.add_env_var(&var, &literal),
                EnvInput::Input(hint) => {
                    let expression = env_expression(&var, &hint.kind)?;
                    tool.add_env_var(&var, &expression);
                    let options = InputOptions {
                        label: Some(var.clone()),
                        ..Default::default()
                    };
                    tool.add_input_with(&hint, &var, options)?;
                }
            }
        }

        for (output, hint) in outputs {
            let options = OutputOptions {
                label: Some(output.clone()),
                ..Default::default()
            };
            tool.add_output_with(&hint, &output, options)?;
        }
        tool.stdout = stdout.clone();

        for (port, files) in secondary_files {
            tool.set_secondary_files(&port, files)?;
        }

        tool.add_input_json();

        tool.base.hints.clear();
        tool.add_hint(SbgHint::save_logs(basename(&name)));
        for source in &source_names {
            tool.add_hint(SbgHint::save_logs(source.as_str()));
        }
        if let Some(stdout) = stdout {
            tool.add_hint(SbgHint::save_logs(stdout));
        }

        add_sbg_namespace(&mut tool);
        Ok(tool)
    }

    /// Classify an exit code; without explicit success codes only 0 succeeds.
    pub fn classify_exit_code(&self, code: i32) -> ExitClass {
        if self.success_codes.contains(&code) {
            ExitClass::Success
        } else if self.temporary_fail_codes.contains(&code) {
            ExitClass::TemporaryFailure
        } else if self.permanent_fail_codes.contains(&code) {
            ExitClass::PermanentFailure
        } else if code == 0 && self.success_codes.is_empty() {
            ExitClass::Success
        } else {
            ExitClass::PermanentFailure
        }
    }
}

/// Expression exporting input `var` as a shell string.
fn env_expression(var: &str, kind: &HintKind) -> Result<String> {
    let expression = match kind {
        HintKind::File | HintKind::Dir => format!("$((inputs.{var})?inputs.{var}.path:'')"),
        HintKind::Array(items) if matches!(items.kind, HintKind::File | HintKind::Dir) => format!(
            "$((inputs.{var})?inputs.{var}.map(function(x){{return x['path']}}).join(' '):'')"
        ),
        HintKind::Array(_) => format!("$((inputs.{var})?inputs.{var}.join(' '):'')"),
        HintKind::Record(_) => {
            return Err(CwlError::UnsupportedType {
                details: format!("record input '{var}' cannot be exported as an environment variable"),
            })
        }
        _ => format!("$((inputs.{var})?inputs.{var}:'')"),
    };
    Ok(expression)
}

/// `"BWA Mem (v0.7)"` becomes `bwa_mem_v0_7`.
fn id_from_label(label: &str) -> String {
    label
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
