//! cwlforge - typed builder, composer and validator for CWL v1.0 documents

pub mod binding;
pub mod bundle;
pub mod config;
pub mod error;
pub mod io;
pub mod platform;
pub mod port;
pub mod process;
pub mod requirement;
pub mod types;
pub mod util;
pub mod workflow;

pub use bundle::{Artifact, Bundler};
pub use config::CwlForgeConfig;
pub use error::{CwlError, FixSuggestion, Result};
pub use port::{InputOptions, InputPort, OutputOptions, OutputPort};
pub use process::{CommandLineTool, ExpressionTool, Process, ProcessBase, ProcessLike};
pub use requirement::{Requirement, RequirementKind, Requirements};
pub use types::{CwlType, Direction, TypeFactory, TypeHint};
pub use workflow::{Exposure, ScatterMethod, Step, StepOptions, ValidationReport, Workflow};
