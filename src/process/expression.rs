//! ExpressionTool: a process evaluated by the workflow engine itself

use serde::{Deserialize, Serialize};

use super::{ProcessBase, ProcessLike};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpressionTool {
    #[serde(flatten)]
    pub base: ProcessBase,
    /// `${ ... }` body returning the output object
    #[serde(default)]
    pub expression: String,
}

impl ExpressionTool {
    pub fn new(id: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            base: ProcessBase::with_id(id),
            expression: expression.into(),
        }
    }
}

impl ProcessLike for ExpressionTool {
    fn base(&self) -> &ProcessBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProcessBase {
        &mut self.base
    }

    fn class(&self) -> &'static str {
        "ExpressionTool"
    }
}
