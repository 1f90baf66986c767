//! Platform hints (`sbg:` classes) and the process hint list entry

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CwlError, Result};
use crate::requirement::Requirement;

/// Minimum EBS volume size in GB.
const MIN_STORAGE_GB: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum SbgHint {
    /// `<instance>` or `<instance>;ebs-gp2;<storage GB>`
    #[serde(rename = "sbg:AWSInstanceType")]
    AwsInstanceType { value: String },
    /// File name kept in the task logs
    #[serde(rename = "sbg:SaveLogs")]
    SaveLogs { value: String },
    /// `"true"` or `"false"`
    #[serde(rename = "sbg:useSbgFS")]
    UseSbgFs { value: String },
    #[serde(rename = "sbg:maxNumberOfParallelInstances")]
    MaxParallelInstances { value: i64 },
}

impl SbgHint {
    /// Instance type, optionally with an attached EBS volume of `storage` GB.
    pub fn aws(instance: &str, storage: Option<u32>) -> Result<Self> {
        let name = instance.split(';').next().unwrap_or(instance);
        let value = match storage {
            None => name.to_string(),
            Some(gb) if gb >= MIN_STORAGE_GB => format!("{name};ebs-gp2;{gb}"),
            Some(gb) => {
                return Err(CwlError::mismatch(
                    format!("storage of at least {MIN_STORAGE_GB} GB"),
                    format!("{gb} GB"),
                ))
            }
        };
        Ok(SbgHint::AwsInstanceType { value })
    }

    pub fn save_logs(file: impl Into<String>) -> Self {
        SbgHint::SaveLogs { value: file.into() }
    }

    pub fn sbg_fs(enabled: bool) -> Self {
        SbgHint::UseSbgFs {
            value: enabled.to_string(),
        }
    }

    pub fn max_parallel_instances(count: i64) -> Self {
        SbgHint::MaxParallelInstances { value: count }
    }
}

/// Entry of a process `hints` list.
///
/// Known requirement classes are parsed as requirements, `sbg:` classes as
/// platform hints; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessHint {
    Requirement(Requirement),
    Platform(SbgHint),
    Other(Value),
}

impl From<Requirement> for ProcessHint {
    fn from(requirement: Requirement) -> Self {
        ProcessHint::Requirement(requirement)
    }
}

impl From<SbgHint> for ProcessHint {
    fn from(hint: SbgHint) -> Self {
        ProcessHint::Platform(hint)
    }
}
