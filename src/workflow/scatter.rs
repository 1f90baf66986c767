//! Scatter expansion
//!
//! Scattering a step turns each scattered value into an array of values.
//! Workflow ports wired to the step change type accordingly:
//! - workflow outputs reading a step output gain one array layer per
//!   scattered port (`nested_crossproduct`) or a single layer otherwise
//! - workflow inputs feeding a scattered port gain exactly one layer

use std::iter;

use super::{ScatterMethod, Workflow};
use crate::error::{CwlError, Result};
use crate::process::ProcessLike;
use crate::requirement::Requirement;
use crate::types::{CwlType, Direction};
use crate::util::OneOrMany;

impl Workflow {
    /// Scatter `ports` of step `step_id`.
    ///
    /// Without a method, several ports are combined with `dotproduct`.
    pub fn scatter(&mut self, step_id: &str, ports: &[String], method: Option<ScatterMethod>) -> Result<()> {
        let step = self
            .get_step(step_id)
            .ok_or_else(|| CwlError::not_found("step", step_id))?;
        if let Some(run) = step.run.process() {
            if let Some(port) = ports.iter().find(|p| run.get_input(p).is_none()) {
                return Err(CwlError::not_found("input", port.clone()));
            }
        }
        if ports.is_empty() {
            return Ok(());
        }

        let method = match method {
            None if ports.len() > 1 => {
                tracing::warn!(step = step_id, "no scatter method for several ports, using dotproduct");
                Some(ScatterMethod::Dotproduct)
            }
            other => other,
        };
        let layers = match method {
            Some(ScatterMethod::NestedCrossproduct) => ports.len(),
            _ => 1,
        };

        let step_outputs: Vec<String> = step.outputs.iter().map(|o| format!("{step_id}/{}", o.id)).collect();
        let mut fed_inputs: Vec<String> = Vec::new();
        for input in step.inputs.iter().filter(|i| ports.contains(&i.id)) {
            for source in input.source.iter() {
                if self.get_input(source).is_some() && !fed_inputs.iter().any(|s| s == source) {
                    fed_inputs.push(source.to_string());
                }
            }
        }

        let mut wrapped_outputs = Vec::new();
        for output in &self.base.outputs {
            let reads_step = output
                .output_source
                .single()
                .is_some_and(|source| step_outputs.iter().any(|s| s == source));
            if reads_step {
                wrapped_outputs.push((output.id.clone(), wrap_output(&output.port_type, layers)?));
            }
        }
        let mut wrapped_inputs = Vec::new();
        for id in &fed_inputs {
            if let Some(input) = self.get_input(id) {
                wrapped_inputs.push((id.clone(), wrap_input(&input.port_type)?));
            }
        }

        for (id, port_type) in wrapped_outputs {
            if let Some(output) = self.get_output_mut(&id) {
                output.port_type = port_type;
            }
        }
        for (id, port_type) in wrapped_inputs {
            if let Some(input) = self.get_input_mut(&id) {
                input.port_type = port_type;
            }
        }

        if let Some(step) = self.get_step_mut(step_id) {
            for port in ports {
                step.ensure_input(port);
            }
            step.scatter = Some(match ports {
                [single] => OneOrMany::One(single.clone()),
                many => OneOrMany::Many(many.to_vec()),
            });
            step.scatter_method = method;
        }
        self.base.requirements.add(Requirement::ScatterFeature);
        tracing::debug!(step = step_id, ports = ?ports, layers, "scattered step");
        Ok(())
    }
}

/// Wrap `t` in `layers` arrays, keeping its optionality on the outside.
fn wrap_output(t: &CwlType, layers: usize) -> Result<CwlType> {
    let required = t.is_required();
    let mut wrapped = t.set_required(true)?;
    for _ in 0..layers {
        wrapped = CwlType::array(wrapped, Direction::Output);
    }
    wrapped.set_required(required)
}

/// `T` becomes `T[]`; an optional `T` becomes an array of `[null, T...]`.
fn wrap_input(t: &CwlType) -> Result<CwlType> {
    if t.is_required() {
        return Ok(CwlType::array(t.clone(), Direction::Input));
    }
    let alternatives = match t.set_required(true)? {
        CwlType::Union(alternatives) => alternatives,
        single => vec![single],
    };
    let items = CwlType::union(iter::once(CwlType::null()).chain(alternatives));
    Ok(CwlType::array(items, Direction::Input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandLineTool;
    use crate::requirement::RequirementKind;
    use crate::types::{PrimitiveKind, TypeHint};
    use crate::workflow::StepOptions;

    fn file() -> CwlType {
        CwlType::primitive(PrimitiveKind::File)
    }

    fn tool() -> CommandLineTool {
        let mut tool = CommandLineTool::new("pair");
        tool.add_input(&TypeHint::file().required(), "left").unwrap();
        tool.add_input(&TypeHint::file(), "right").unwrap();
        tool.add_output(&TypeHint::file().required(), "merged").unwrap();
        tool
    }

    fn array_depth(t: &CwlType) -> usize {
        match t {
            CwlType::Array(array) => 1 + array_depth(&array.items),
            _ => 0,
        }
    }

    #[test]
    fn test_single_port_dotproduct() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool(), StepOptions::default().scatter(["left"], None)).unwrap();

        assert_eq!(array_depth(&wf.get_output("merged").unwrap().port_type), 1);
        assert_eq!(array_depth(&wf.get_input("left").unwrap().port_type), 1);
        assert_eq!(wf.get_input("right").unwrap().port_type.to_string(), "File?");
        assert!(wf.base.requirements.contains(RequirementKind::ScatterFeature));
        let step = wf.get_step("pair").unwrap();
        assert!(step.is_scattered("left"));
        assert_eq!(step.scatter_method, None);
    }

    #[test]
    fn test_nested_crossproduct_wraps_per_port() {
        let mut wf = Workflow::new("wf");
        wf.add_step(
            tool(),
            StepOptions::default().scatter(["left", "right"], Some(ScatterMethod::NestedCrossproduct)),
        )
        .unwrap();
        assert_eq!(array_depth(&wf.get_output("merged").unwrap().port_type), 2);
        assert_eq!(array_depth(&wf.get_input("left").unwrap().port_type), 1);
    }

    #[test]
    fn test_flat_crossproduct_wraps_once() {
        let mut wf = Workflow::new("wf");
        wf.add_step(
            tool(),
            StepOptions::default().scatter(["left", "right"], Some(ScatterMethod::FlatCrossproduct)),
        )
        .unwrap();
        assert_eq!(array_depth(&wf.get_output("merged").unwrap().port_type), 1);
    }

    #[test]
    fn test_missing_method_defaults_to_dotproduct() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool(), StepOptions::default().scatter(["left", "right"], None)).unwrap();
        assert_eq!(wf.get_step("pair").unwrap().scatter_method, Some(ScatterMethod::Dotproduct));
    }

    #[test]
    fn test_optional_input_becomes_array_of_optional() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool(), StepOptions::default().scatter(["right"], None)).unwrap();

        let t = &wf.get_input("right").unwrap().port_type;
        assert!(t.is_required());
        let CwlType::Array(array) = t else {
            panic!("expected array, got {t}");
        };
        assert_eq!(*array.items, CwlType::Union(vec![CwlType::null(), file()]));
    }

    #[test]
    fn test_wrap_output_keeps_optionality() {
        let optional = file().set_required(false).unwrap();
        let wrapped = wrap_output(&optional, 1).unwrap();
        assert!(!wrapped.is_required());
        let required = wrapped.set_required(true).unwrap();
        assert_eq!(array_depth(&required), 1);
    }

    #[test]
    fn test_shared_source_wrapped_once() {
        let mut t = CommandLineTool::new("both");
        t.add_input(&TypeHint::file().required(), "a").unwrap();
        t.add_input(&TypeHint::file().required(), "b").unwrap();

        let mut wf = Workflow::new("wf");
        wf.add_step(t, StepOptions::default().expose(crate::workflow::Exposure::only(["a"])))
            .unwrap();
        wf.add_connection("a", "both.b").unwrap();
        wf.scatter("both", &["a".to_string(), "b".to_string()], Some(ScatterMethod::Dotproduct))
            .unwrap();
        assert_eq!(array_depth(&wf.get_input("a").unwrap().port_type), 1);
    }

    #[test]
    fn test_unknown_scatter_port() {
        let mut wf = Workflow::new("wf");
        wf.add_step(tool(), StepOptions::default()).unwrap();
        let err = wf.scatter("pair", &["merged".to_string()], None).unwrap_err();
        assert_eq!(err.code(), "CWL-003");
        assert!(wf.scatter("nope", &["left".to_string()], None).is_err());
    }
}
