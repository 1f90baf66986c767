//! Function bundling collaborator
//!
//! A [`Bundler`] turns some source (a function, a directory, a script set)
//! into an opaque [`Artifact`]. Tools embed the artifact without looking
//! inside the payload; see [`CommandLineTool::add_bundled`].
//!
//! [`CommandLineTool::add_bundled`]: crate::process::CommandLineTool::add_bundled

use std::path::PathBuf;

use crate::error::Result;

/// Embeddable bundle: a file name, its bytes, and the local files packed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub payload: Vec<u8>,
    pub resources: Vec<PathBuf>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload,
            resources: Vec::new(),
        }
    }

    pub fn with_resources(mut self, resources: impl IntoIterator<Item = PathBuf>) -> Self {
        self.resources.extend(resources);
        self
    }
}

/// Produces an [`Artifact`] from a source.
pub trait Bundler {
    type Source: ?Sized;

    fn bundle(&self, source: &Self::Source) -> Result<Artifact>;
}
