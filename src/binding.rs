//! Execution bindings for ports and schema types

use serde::{Deserialize, Serialize};

use crate::util::OneOrMany;

/// Pattern, expression, or list of either (`.bai`, `^.dict`, `$(...)`).
pub type SecondaryFiles = OneOrMany<String>;

/// How an input value becomes part of the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputBinding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_contents: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_separator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_quote: Option<bool>,
}

impl InputBinding {
    pub fn at(position: i64) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Raw shell fragment evaluated from `value_from`, not quoted.
    pub fn shell(value_from: impl Into<String>) -> Self {
        Self {
            value_from: Some(value_from.into()),
            shell_quote: Some(false),
            ..Default::default()
        }
    }
}

/// How output values are collected after execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputBinding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glob: Option<OneOrMany<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_contents: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_eval: Option<String>,
}

impl OutputBinding {
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self {
            glob: Some(OneOrMany::One(pattern.into())),
            ..Default::default()
        }
    }
}
