//! Adding steps and exposing their ports at the workflow boundary

use std::sync::Arc;

use indexmap::IndexMap;

use super::{ScatterMethod, Step, StepRun, Workflow};
use crate::error::{CwlError, Result};
use crate::port::{InputPort, OutputPort};
use crate::process::{Process, ProcessLike};
use crate::requirement::Requirement;
use crate::types::Direction;
use crate::util::validate_id;

/// Which ports of the step's process become workflow ports.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Exposure {
    /// Every input, then every output
    #[default]
    All,
    /// Only the listed port ids; repeats are exposed once
    Only(Vec<String>),
    /// Listed port ids, each under a new workflow port id
    Rename(IndexMap<String, String>),
}

impl Exposure {
    pub fn only<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        Exposure::Only(ids.into_iter().map(Into::into).collect())
    }

    pub fn rename<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Exposure::Rename(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn none() -> Self {
        Exposure::Only(Vec::new())
    }
}

/// Options for [`Workflow::add_step`].
#[derive(Debug, Clone, Default)]
pub struct StepOptions {
    /// Step id; defaults to the process id
    pub id: Option<String>,
    pub expose: Exposure,
    pub expose_except: Vec<String>,
    pub scatter: Vec<String>,
    pub scatter_method: Option<ScatterMethod>,
}

impl StepOptions {
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn expose(mut self, expose: Exposure) -> Self {
        self.expose = expose;
        self
    }

    pub fn except<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.expose_except = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn scatter<S: Into<String>>(mut self, ports: impl IntoIterator<Item = S>, method: Option<ScatterMethod>) -> Self {
        self.scatter = ports.into_iter().map(Into::into).collect();
        self.scatter_method = method;
        self
    }
}

impl Workflow {
    /// Embed `process` as a new step.
    ///
    /// Exposed ports get a workflow port of the same id (suffixed `_1`,
    /// `_2`, ... on collision) wired to the step. Ids, exposure keys and
    /// scatter ports are checked before anything changes.
    pub fn add_step(&mut self, process: impl Into<Process>, options: StepOptions) -> Result<&Step> {
        self.add_step_shared(Arc::new(process.into()), options)
    }

    /// Like [`Workflow::add_step`], for a process already shared elsewhere.
    pub fn add_step_shared(&mut self, run: Arc<Process>, options: StepOptions) -> Result<&Step> {
        let step_id = match options.id.as_deref().or_else(|| run.id()) {
            Some(id) => id.to_string(),
            None => {
                return Err(CwlError::InvalidId {
                    id: String::new(),
                    reason: "a step needs an explicit id or a process id".into(),
                })
            }
        };
        validate_id(&step_id)?;
        if self.get_step(&step_id).is_some() {
            return Err(CwlError::duplicate("step", step_id));
        }

        let exposed = exposed_ports(&run, &options)?;
        for port in &options.scatter {
            if run.get_input(port).is_none() {
                return Err(CwlError::not_found("input", port.clone()));
            }
        }

        self.steps.push(Step::new(step_id.clone(), StepRun::Inline(Arc::clone(&run))));
        tracing::debug!(step = %step_id, class = run.class(), "added step");

        if run.is_workflow() {
            self.base.requirements.add(Requirement::SubworkflowFeature);
        }

        for exposed in exposed {
            let wf_id = self.free_port_id(&exposed.wf_id);
            let port_id = &exposed.port;
            match exposed.direction {
                Direction::Input => {
                    if let Some(port) = run.get_input(port_id) {
                        self.base.inputs.push(boundary_input(port, &wf_id));
                        self.add_connection(&wf_id, &format!("{step_id}.{port_id}"))?;
                    }
                }
                Direction::Output => {
                    if let Some(port) = run.get_output(port_id) {
                        self.base.outputs.push(boundary_output(port, &wf_id));
                        self.add_connection(&format!("{step_id}.{port_id}"), &wf_id)?;
                    }
                }
            }
        }

        if !options.scatter.is_empty() {
            self.base.requirements.add(Requirement::ScatterFeature);
            self.scatter(&step_id, &options.scatter, options.scatter_method)?;
        }

        let index = self.steps.len() - 1;
        Ok(&self.steps[index])
    }

    /// Set `valueFrom` on a step input, adding
    /// `StepInputExpressionRequirement`.
    pub fn add_step_value_expression(&mut self, step_id: &str, port: &str, expression: &str) -> Result<()> {
        let step = self
            .get_step_mut(step_id)
            .ok_or_else(|| CwlError::not_found("step", step_id))?;
        if let Some(run) = step.run.process() {
            if run.get_input(port).is_none() {
                return Err(CwlError::not_found("input", port));
            }
        }
        step.ensure_input(port).value_from = Some(expression.to_string());
        self.base.requirements.add(Requirement::StepInputExpression);
        Ok(())
    }

    /// `base`, then `base_1`, `base_2`, ... until no workflow port uses it.
    fn free_port_id(&self, base: &str) -> String {
        let taken = |id: &str| self.get_input(id).is_some() || self.get_output(id).is_some();
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

/// A process port that gets a workflow port.
struct Exposed {
    port: String,
    wf_id: String,
    direction: Direction,
}

/// Ports selected by the options, inputs first.
fn exposed_ports(run: &Process, options: &StepOptions) -> Result<Vec<Exposed>> {
    let lookup = |id: &str| match run.get_port(id) {
        Some(port) => Ok(port.direction()),
        None => Err(CwlError::not_found("port", id)),
    };

    let mut exposed = Vec::new();
    match &options.expose {
        Exposure::All => {
            let inputs = run.base().inputs.iter().map(|p| (&p.id, Direction::Input));
            let outputs = run.base().outputs.iter().map(|p| (&p.id, Direction::Output));
            for (id, direction) in inputs.chain(outputs) {
                exposed.push(Exposed {
                    port: id.clone(),
                    wf_id: id.clone(),
                    direction,
                });
            }
        }
        Exposure::Only(ids) => {
            for (i, id) in ids.iter().enumerate() {
                if ids[..i].contains(id) {
                    continue;
                }
                exposed.push(Exposed {
                    port: id.clone(),
                    wf_id: id.clone(),
                    direction: lookup(id)?,
                });
            }
        }
        Exposure::Rename(mapping) => {
            for (id, renamed) in mapping {
                let direction = lookup(id)?;
                validate_id(renamed)?;
                exposed.push(Exposed {
                    port: id.clone(),
                    wf_id: renamed.clone(),
                    direction,
                });
            }
        }
    }

    exposed.retain(|e| !options.expose_except.contains(&e.port));
    Ok(exposed)
}

fn boundary_input(port: &InputPort, id: &str) -> InputPort {
    let mut input = InputPort::new(id, port.port_type.clone());
    input.label = Some(id.to_string());
    input.doc = port.doc.clone();
    input.secondary_files = port.secondary_files.clone();
    input.streamable = port.streamable;
    input.format = port.format.clone();
    input
}

fn boundary_output(port: &OutputPort, id: &str) -> OutputPort {
    let mut output = OutputPort::new(id, port.port_type.clone());
    output.label = Some(id.to_string());
    output.doc = port.doc.clone();
    output.secondary_files = port.secondary_files.clone();
    output.streamable = port.streamable;
    output.format = port.format.clone();
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandLineTool;
    use crate::requirement::RequirementKind;
    use crate::types::TypeHint;

    fn tool(id: &str) -> CommandLineTool {
        let mut tool = CommandLineTool::new(id);
        tool.add_input(&TypeHint::file().required().doc("input reads"), "reads").unwrap();
        tool.add_input(&TypeHint::int(), "threads").unwrap();
        tool.add_output(&TypeHint::file().required().glob("*.bam"), "bam").unwrap();
        tool
    }

    #[test]
    fn test_add_step_exposes_everything() {
        let mut wf = Workflow::new("wf");
        let step = wf.add_step(tool("align"), StepOptions::default()).unwrap();
        assert_eq!(step.id, "align");

        let ids: Vec<&str> = wf.base.inputs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["reads", "threads"]);
        assert_eq!(wf.get_input("reads").unwrap().doc.as_deref(), Some("input reads"));
        assert_eq!(wf.get_input("reads").unwrap().label.as_deref(), Some("reads"));
        assert_eq!(wf.get_output("bam").unwrap().output_source.single(), Some("align/bam"));
        let step = wf.get_step("align").unwrap();
        assert_eq!(step.get_input("reads").unwrap().source.single(), Some("reads"));
    }

    #[test]
    fn test_second_step_gets_suffixed_ports() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool("align"), StepOptions::default()).unwrap();
        wf.add_step(tool("align"), StepOptions::id("align2")).unwrap();
        assert!(wf.get_input("reads_1").is_some());
        assert!(wf.get_output("bam_1").is_some());
        assert_eq!(
            wf.get_step("align2").unwrap().get_input("reads").unwrap().source.single(),
            Some("reads_1")
        );
    }

    #[test]
    fn test_duplicate_step_rejected_without_changes() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool("align"), StepOptions::default()).unwrap();
        let before = wf.clone();
        let err = wf.add_step(tool("align"), StepOptions::default()).unwrap_err();
        assert_eq!(err.code(), "CWL-004");
        assert_eq!(wf, before);
    }

    #[test]
    fn test_step_needs_an_id() {
        let mut wf = Workflow::new("wf");
        let anonymous = CommandLineTool::default();
        let err = wf.add_step(anonymous, StepOptions::default()).unwrap_err();
        assert_eq!(err.code(), "CWL-005");
        assert!(wf.steps.is_empty());
    }

    #[test]
    fn test_expose_only_and_except() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool("align"), StepOptions::default().expose(Exposure::only(["reads", "bam"])).except(["bam"]))
            .unwrap();
        assert_eq!(wf.base.inputs.len(), 1);
        assert!(wf.base.outputs.is_empty());
    }

    #[test]
    fn test_expose_only_repeated_id_exposed_once() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool("align"), StepOptions::default().expose(Exposure::only(["threads", "threads"])))
            .unwrap();

        let ids: Vec<&str> = wf.base.inputs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["threads"]);
        let step = wf.get_step("align").unwrap();
        assert_eq!(step.get_input("threads").unwrap().source.single(), Some("threads"));
        assert!(!wf.base.requirements.contains(RequirementKind::MultipleInputFeature));
    }

    #[test]
    fn test_expose_rename() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool("align"), StepOptions::default().expose(Exposure::rename([("reads", "fastq")])))
            .unwrap();
        assert!(wf.get_input("fastq").is_some());
        assert_eq!(
            wf.get_step("align").unwrap().get_input("reads").unwrap().source.single(),
            Some("fastq")
        );
    }

    #[test]
    fn test_unknown_expose_key_rejected_before_mutation() {
        let mut wf = Workflow::new("wf");
        let err = wf
            .add_step(tool("align"), StepOptions::default().expose(Exposure::only(["nope"])))
            .unwrap_err();
        assert_eq!(err.code(), "CWL-003");
        assert!(wf.steps.is_empty());
        assert!(wf.base.inputs.is_empty());

        let err = wf
            .add_step(tool("align"), StepOptions::default().scatter(["bam"], None))
            .unwrap_err();
        assert_eq!(err.code(), "CWL-003");
        assert!(wf.steps.is_empty());
    }

    #[test]
    fn test_subworkflow_step_adds_feature() {
        let mut inner = Workflow::new("inner");
        inner.add_step(tool("align"), StepOptions::default()).unwrap();

        let mut outer = Workflow::new("outer");
        outer.add_step(inner, StepOptions::default()).unwrap();
        assert!(outer.base.requirements.contains(RequirementKind::SubworkflowFeature));
        assert!(outer.get_input("reads").is_some());
    }

    #[test]
    fn test_add_step_value_expression() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool("align"), StepOptions::default()).unwrap();
        wf.add_step_value_expression("align", "threads", "$(self + 1)").unwrap();
        let step = wf.get_step("align").unwrap();
        assert_eq!(step.get_input("threads").unwrap().value_from.as_deref(), Some("$(self + 1)"));
        assert!(wf.base.requirements.contains(RequirementKind::StepInputExpression));

        assert!(wf.add_step_value_expression("missing", "threads", "x").is_err());
        assert!(wf.add_step_value_expression("align", "missing", "x").is_err());
    }
}
