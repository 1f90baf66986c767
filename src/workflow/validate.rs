//! Workflow validation
//!
//! Structural checks over a composed workflow, collected into a
//! [`ValidationReport`] instead of failing on the first problem.

use std::collections::HashSet;

use thiserror::Error;

use super::{StepGraph, Workflow};
use crate::process::ProcessLike;
use crate::requirement::RequirementKind;

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single validation issue with context
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("Duplicate step id: '{id}'")]
    DuplicateStep { id: String },

    #[error("Step '{step}' input '{port}' reads unknown source '{reference}'")]
    UnresolvedSource {
        step: String,
        port: String,
        reference: String,
        available: Vec<String>,
    },

    #[error("Workflow output '{output}' reads unknown source '{reference}'")]
    UnresolvedOutputSource {
        output: String,
        reference: String,
        available: Vec<String>,
    },

    #[error("Missing {kind}: {context}")]
    MissingRequirement { kind: RequirementKind, context: String },

    #[error("Step '{step}' scatters '{port}', which is not one of its inputs")]
    ScatterPortNotInput { step: String, port: String },

    #[error("Step '{step}' leaves required input '{port}' unbound")]
    UnboundInput { step: String, port: String },

    #[error("Cycle detected: {cycle_path}")]
    CycleDetected { cycle_path: String },

    #[error("Step '{id}' has no connections")]
    OrphanStep { id: String },
}

impl ValidationIssue {
    pub fn severity(&self) -> Severity {
        match self {
            ValidationIssue::OrphanStep { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Get suggestion for fixing this issue
    pub fn suggestion(&self) -> Option<String> {
        match self {
            ValidationIssue::DuplicateStep { .. } => Some("Give each step a unique id".to_string()),
            ValidationIssue::UnresolvedSource { available, .. }
            | ValidationIssue::UnresolvedOutputSource { available, .. } => {
                if available.is_empty() {
                    Some("No sources available in workflow".to_string())
                } else if available.len() <= 5 {
                    Some(format!("Available sources: {}", available.join(", ")))
                } else {
                    Some(format!(
                        "Available sources: {} (and {} more)",
                        available[..3].join(", "),
                        available.len() - 3
                    ))
                }
            }
            ValidationIssue::MissingRequirement { kind, .. } => {
                Some(format!("Add {kind} to the workflow requirements"))
            }
            ValidationIssue::ScatterPortNotInput { .. } => {
                Some("Connect the port before scattering it".to_string())
            }
            ValidationIssue::UnboundInput { .. } => {
                Some("Connect a source, set a default or add a valueFrom expression".to_string())
            }
            ValidationIssue::CycleDetected { .. } => {
                Some("Remove one of the connections along the cycle".to_string())
            }
            ValidationIssue::OrphanStep { .. } => None,
        }
    }
}

/// Result of validating a workflow
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add(&mut self, issue: ValidationIssue) {
        if issue.severity() == Severity::Warning {
            self.warnings.push(issue);
        } else {
            self.errors.push(issue);
        }
    }

    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

impl Workflow {
    /// Run every structural check.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        self.check_step_ids(&mut report);
        self.check_sources(&mut report);
        self.check_features(&mut report);
        self.check_steps(&mut report);
        self.check_graph(&mut report);

        tracing::debug!(
            workflow = self.id().unwrap_or("<anonymous>"),
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "validated workflow"
        );
        report
    }

    fn check_step_ids(&self, report: &mut ValidationReport) {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                report.add(ValidationIssue::DuplicateStep { id: step.id.clone() });
            }
        }
    }

    /// Workflow input ids and `step/port` for every known step output.
    fn available_sources(&self) -> Vec<String> {
        let mut available: Vec<String> = self.base.inputs.iter().map(|p| p.id.clone()).collect();
        for step in &self.steps {
            let declared = step.outputs.iter().map(|o| o.id.as_str());
            let embedded = step
                .run
                .process()
                .into_iter()
                .flat_map(|run| run.base().outputs.iter().map(|o| o.id.as_str()));
            for port in declared.chain(embedded) {
                let source = format!("{}/{port}", step.id);
                if !available.contains(&source) {
                    available.push(source);
                }
            }
        }
        available
    }

    fn check_sources(&self, report: &mut ValidationReport) {
        let available = self.available_sources();
        let known = |source: &str| available.iter().any(|a| a == source);

        for step in &self.steps {
            for input in &step.inputs {
                for source in input.source.iter().filter(|s| !known(*s)) {
                    report.add(ValidationIssue::UnresolvedSource {
                        step: step.id.clone(),
                        port: input.id.clone(),
                        reference: source.to_string(),
                        available: available.clone(),
                    });
                }
            }
        }
        for output in &self.base.outputs {
            for source in output.output_source.iter().filter(|s| !known(*s)) {
                report.add(ValidationIssue::UnresolvedOutputSource {
                    output: output.id.clone(),
                    reference: source.to_string(),
                    available: available.clone(),
                });
            }
        }
    }

    fn check_features(&self, report: &mut ValidationReport) {
        let mut require = |kind: RequirementKind, context: String| {
            if !self.base.requirements.contains(kind) {
                report.add(ValidationIssue::MissingRequirement { kind, context });
            }
        };

        if let Some(step) = self.steps.iter().find(|s| s.run.process().is_some_and(|p| p.is_workflow())) {
            require(
                RequirementKind::SubworkflowFeature,
                format!("step '{}' runs a workflow", step.id),
            );
        }
        if let Some(step) = self.steps.iter().find(|s| !s.scattered_ports().is_empty()) {
            require(RequirementKind::ScatterFeature, format!("step '{}' is scattered", step.id));
        }
        let multi_step = self
            .steps
            .iter()
            .find(|s| s.inputs.iter().any(|i| i.source.len() > 1))
            .map(|s| format!("step '{}' merges several sources", s.id));
        let multi_output = self
            .base
            .outputs
            .iter()
            .find(|o| o.output_source.len() > 1)
            .map(|o| format!("output '{}' merges several sources", o.id));
        if let Some(context) = multi_step.or(multi_output) {
            require(RequirementKind::MultipleInputFeature, context);
        }
        if let Some(step) = self
            .steps
            .iter()
            .find(|s| s.inputs.iter().any(|i| i.value_from.is_some()))
        {
            require(
                RequirementKind::StepInputExpression,
                format!("step '{}' uses valueFrom", step.id),
            );
        }
    }

    fn check_steps(&self, report: &mut ValidationReport) {
        for step in &self.steps {
            for port in step.scattered_ports() {
                if step.get_input(port).is_none() {
                    report.add(ValidationIssue::ScatterPortNotInput {
                        step: step.id.clone(),
                        port: port.clone(),
                    });
                }
            }
            for port in step.unbound_inputs() {
                report.add(ValidationIssue::UnboundInput {
                    step: step.id.clone(),
                    port: port.to_string(),
                });
            }
        }
    }

    fn check_graph(&self, report: &mut ValidationReport) {
        let graph = StepGraph::from_workflow(self);
        if let Some(cycle_path) = graph.detect_cycle() {
            report.add(ValidationIssue::CycleDetected { cycle_path });
        }

        if self.steps.len() < 2 {
            return;
        }
        for step in &self.steps {
            let prefix = format!("{}/", step.id);
            let incoming = step.inputs.iter().any(|i| !i.source.is_empty());
            let outgoing = self
                .steps
                .iter()
                .flat_map(|s| s.inputs.iter().flat_map(|i| i.source.iter()))
                .chain(self.base.outputs.iter().flat_map(|o| o.output_source.iter()))
                .any(|source| source.starts_with(&prefix));
            if !incoming && !outgoing {
                report.add(ValidationIssue::OrphanStep { id: step.id.clone() });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandLineTool;
    use crate::requirement::Requirement;
    use crate::types::TypeHint;
    use crate::workflow::{Exposure, StepOptions, StepRun, Step};

    fn tool(id: &str) -> CommandLineTool {
        let mut tool = CommandLineTool::new(id);
        tool.add_input(&TypeHint::file().required(), "input").unwrap();
        tool.add_output(&TypeHint::file().required(), "output").unwrap();
        tool
    }

    #[test]
    fn test_composed_workflow_is_valid() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool("first"), StepOptions::default()).unwrap();
        wf.add_step(tool("second"), StepOptions::default().expose(Exposure::only(["output"])))
            .unwrap();
        wf.add_connection("first.output", "second.input").unwrap();

        let report = wf.validate();
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(!report.has_warnings());
        assert_eq!(wf.topological_order().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_unbound_input_reported() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool("first"), StepOptions::default().expose(Exposure::none()))
            .unwrap();
        let report = wf.validate();
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationIssue::UnboundInput { port, .. } if port == "input")));
    }

    #[test]
    fn test_unresolved_source_and_missing_feature() {
        let mut wf = Workflow::new("wf");
        let mut step = Step::new("s", StepRun::Reference("s.cwl".into()));
        let input = step.ensure_input("x");
        input.source.insert("ghost");
        input.source.insert("other/out");
        wf.steps.push(step);

        let report = wf.validate();
        let unresolved = report
            .errors
            .iter()
            .filter(|e| matches!(e, ValidationIssue::UnresolvedSource { .. }))
            .count();
        assert_eq!(unresolved, 2);
        assert!(report.errors.iter().any(|e| matches!(
            e,
            ValidationIssue::MissingRequirement {
                kind: RequirementKind::MultipleInputFeature,
                ..
            }
        )));

        wf.base.requirements.add(Requirement::MultipleInputFeature);
        assert!(!wf
            .validate()
            .errors
            .iter()
            .any(|e| matches!(e, ValidationIssue::MissingRequirement { .. })));
    }

    #[test]
    fn test_cycle_and_duplicates() {
        let mut wf = Workflow::new("wf");
        for (id, upstream) in [("a", "b"), ("b", "a")] {
            let mut step = Step::new(id, StepRun::Reference("t.cwl".into()));
            step.ensure_input("in").source.insert(format!("{upstream}/out"));
            step.ensure_output("out");
            wf.steps.push(step);
        }
        wf.steps.push(Step::new("a", StepRun::Reference("t.cwl".into())));

        let report = wf.validate();
        assert!(report.errors.iter().any(|e| matches!(e, ValidationIssue::CycleDetected { .. })));
        assert!(report.errors.iter().any(|e| matches!(e, ValidationIssue::DuplicateStep { id } if id == "a")));
        assert!(wf.topological_order().is_none());
    }

    #[test]
    fn test_orphan_step_is_warning() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool("first"), StepOptions::default()).unwrap();
        wf.steps.push(Step::new("loose", StepRun::Reference("loose.cwl".into())));

        let report = wf.validate();
        assert!(report.is_valid());
        assert_eq!(report.warnings, vec![ValidationIssue::OrphanStep { id: "loose".into() }]);
        assert!(report.warnings[0].suggestion().is_none());
    }

    #[test]
    fn test_scatter_port_must_be_step_input() {
        let mut wf = Workflow::new("wf");
        let mut step = Step::new("s", StepRun::Reference("s.cwl".into()));
        step.scatter = Some("missing".into());
        wf.steps.push(step);
        wf.base.requirements.add(Requirement::ScatterFeature);

        let report = wf.validate();
        assert_eq!(
            report.errors,
            vec![ValidationIssue::ScatterPortNotInput {
                step: "s".into(),
                port: "missing".into()
            }]
        );
    }

    #[test]
    fn test_suggestion_lists_sources() {
        let issue = ValidationIssue::UnresolvedSource {
            step: "s".into(),
            port: "p".into(),
            reference: "x".into(),
            available: vec!["a".into(), "b".into()],
        };
        assert_eq!(issue.suggestion().as_deref(), Some("Available sources: a, b"));
        assert!(issue.to_string().contains("'x'"));
    }
}
