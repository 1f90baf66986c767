//! Connection resolution
//!
//! Identifiers use `.` between step and port (`align.bam`); sources are
//! recorded in document form with `/` (`align/bam`).

use super::Workflow;
use crate::error::{CwlError, Result};
use crate::process::ProcessLike;
use crate::requirement::Requirement;

/// One side of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint<'a> {
    /// Workflow input or output
    Port(&'a str),
    StepPort { step: &'a str, port: &'a str },
}

impl<'a> Endpoint<'a> {
    fn parse(id: &'a str) -> Option<Self> {
        let mut segments = id.split('.');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(port), None, None) => Some(Endpoint::Port(port)),
            (Some(step), Some(port), None) => Some(Endpoint::StepPort { step, port }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    In,
    Out,
}

impl Workflow {
    /// Wire `src` to `dst`.
    ///
    /// | src         | dst         | effect                                   |
    /// |-------------|-------------|------------------------------------------|
    /// | `input`     | `step.port` | `input` joins the step input's sources   |
    /// | `step.port` | `output`    | `step/port` joins the output's sources   |
    /// | `step.port` | `step.port` | `step/port` joins the step input's sources |
    ///
    /// Every endpoint must resolve; nothing changes on error. A source set
    /// growing past one element adds `MultipleInputFeatureRequirement`.
    pub fn add_connection(&mut self, src: &str, dst: &str) -> Result<()> {
        let invalid = |reason: String| CwlError::InvalidConnection {
            src: src.to_string(),
            dst: dst.to_string(),
            reason,
        };

        let (Some(from), Some(to)) = (Endpoint::parse(src), Endpoint::parse(dst)) else {
            return Err(invalid("identifiers are 'port' or 'step.port'".into()));
        };

        let multiple = match (from, to) {
            (Endpoint::Port(input), Endpoint::StepPort { step, port }) => {
                if self.get_input(input).is_none() {
                    return Err(invalid(format!("workflow input '{input}' not found")));
                }
                self.check_step_port(step, port, Side::In).map_err(invalid)?;
                self.wire_step_input(step, port, input)
            }
            (Endpoint::StepPort { step, port }, Endpoint::Port(output)) => {
                self.check_step_port(step, port, Side::Out).map_err(invalid)?;
                if self.get_output(output).is_none() {
                    return Err(invalid(format!("workflow output '{output}' not found")));
                }
                self.ensure_step_output(step, port);
                let sources = match self.get_output_mut(output) {
                    Some(out) => {
                        out.output_source.insert(format!("{step}/{port}"));
                        out.output_source.len()
                    }
                    None => 0,
                };
                sources > 1
            }
            (
                Endpoint::StepPort {
                    step: src_step,
                    port: src_port,
                },
                Endpoint::StepPort {
                    step: dst_step,
                    port: dst_port,
                },
            ) => {
                if src_step == dst_step {
                    return Err(invalid(format!("step '{src_step}' cannot feed itself")));
                }
                self.check_step_port(src_step, src_port, Side::Out).map_err(invalid)?;
                self.check_step_port(dst_step, dst_port, Side::In).map_err(invalid)?;
                self.ensure_step_output(src_step, src_port);
                self.wire_step_input(dst_step, dst_port, &format!("{src_step}/{src_port}"))
            }
            (Endpoint::Port(_), Endpoint::Port(_)) => {
                return Err(invalid("a connection needs at least one step".into()));
            }
        };

        if multiple {
            self.base.requirements.add(Requirement::MultipleInputFeature);
        }
        tracing::debug!(src, dst, "connected");
        Ok(())
    }

    /// The step must exist; an embedded run must declare the port.
    fn check_step_port(&self, step_id: &str, port: &str, side: Side) -> std::result::Result<(), String> {
        let step = self
            .get_step(step_id)
            .ok_or_else(|| format!("step '{step_id}' not found"))?;
        let Some(run) = step.run.process() else {
            return Ok(());
        };
        let declared = match side {
            Side::In => run.get_input(port).is_some(),
            Side::Out => run.get_output(port).is_some(),
        };
        if declared {
            Ok(())
        } else {
            let kind = if side == Side::In { "input" } else { "output" };
            Err(format!("step '{step_id}' has no {kind} '{port}'"))
        }
    }

    /// Add `source` to step input `port`; true when it now has several sources.
    fn wire_step_input(&mut self, step_id: &str, port: &str, source: &str) -> bool {
        match self.get_step_mut(step_id) {
            Some(step) => {
                let input = step.ensure_input(port);
                input.source.insert(source);
                input.source.len() > 1
            }
            None => false,
        }
    }

    fn ensure_step_output(&mut self, step_id: &str, port: &str) {
        if let Some(step) = self.get_step_mut(step_id) {
            step.ensure_output(port);
        }
    }
}
