// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Error types with error codes and fix suggestions
//!
//! Error code ranges:
//! - CWL-000-009: Type algebra and document construction errors
//! - CWL-010-019: Deserialization errors
//! - CWL-020-029: IO and configuration errors
//! - CWL-030-039: Remote registry errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CwlError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
#[derive(Error, Debug)]
pub enum CwlError {
    // ═══════════════════════════════════════════
    // CONSTRUCTION ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[CWL-001] Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("[CWL-002] Unsupported type for optionality toggle: {details}")]
    UnsupportedType { details: String },

    #[error("[CWL-003] {kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("[CWL-004] Duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("[CWL-005] Invalid id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    #[error("[CWL-006] Invalid connection '{src}' -> '{dst}': {reason}")]
    InvalidConnection {
        src: String,
        dst: String,
        reason: String,
    },

    #[error("[CWL-007] Conflict on '{id}': {details}")]
    Conflict { id: String, details: String },

    // ═══════════════════════════════════════════
    // DESERIALIZATION ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[CWL-010] Unknown process class '{class}'")]
    UnknownClass { class: String },

    #[error("[CWL-011] Missing 'class' discriminator on {context}")]
    MissingDiscriminator { context: String },

    #[error("[CWL-012] Failed to parse document: {details}")]
    Parse { details: String },

    // ═══════════════════════════════════════════
    // IO / CONFIG ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[CWL-020] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[CWL-021] Config error: {reason}")]
    Config { reason: String },

    // ═══════════════════════════════════════════
    // REGISTRY ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[CWL-030] Registry error for '{app_id}': {reason}")]
    Registry { app_id: String, reason: String },
}

impl CwlError {
    /// Get the error code (e.g., "CWL-006")
    pub fn code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "CWL-001",
            Self::UnsupportedType { .. } => "CWL-002",
            Self::NotFound { .. } => "CWL-003",
            Self::DuplicateId { .. } => "CWL-004",
            Self::InvalidId { .. } => "CWL-005",
            Self::InvalidConnection { .. } => "CWL-006",
            Self::Conflict { .. } => "CWL-007",
            Self::UnknownClass { .. } => "CWL-010",
            Self::MissingDiscriminator { .. } => "CWL-011",
            Self::Parse { .. } => "CWL-012",
            Self::Io(_) => "CWL-020",
            Self::Config { .. } => "CWL-021",
            Self::Registry { .. } => "CWL-030",
        }
    }

    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn duplicate(kind: &'static str, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl From<serde_json::Error> for CwlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            details: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CwlError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse {
            details: err.to_string(),
        }
    }
}

impl FixSuggestion for CwlError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            CwlError::TypeMismatch { .. } => {
                Some("Check the value against the declared port type")
            }
            CwlError::UnsupportedType { .. } => {
                Some("A union must keep at least one non-null alternative")
            }
            CwlError::NotFound { .. } => Some("Check the id spelling against the declared ports and steps"),
            CwlError::DuplicateId { .. } => Some("Use a unique id or pass an explicit step id"),
            CwlError::InvalidId { .. } => {
                Some("Ids start with a letter or '_' and contain only letters, digits, '_' or '-'")
            }
            CwlError::InvalidConnection { .. } => {
                Some("Use 'input' -> 'step.port', 'step.port' -> 'output' or 'step.port' -> 'step.port'")
            }
            CwlError::Conflict { .. } => {
                Some("Remove the existing outputEval or compose the expression manually")
            }
            CwlError::UnknownClass { .. } => {
                Some("Use class: CommandLineTool, Workflow or ExpressionTool")
            }
            CwlError::MissingDiscriminator { .. } => Some("Add a 'class' field to the document"),
            CwlError::Parse { .. } => Some("Check YAML/JSON syntax: indentation and quoting"),
            CwlError::Io(_) => Some("Check file path and permissions"),
            CwlError::Config { .. } => Some("Check ~/.config/cwlforge/config.toml syntax"),
            CwlError::Registry { .. } => Some("Check the project id and platform credentials"),
        }
    }
}
