//! Cloud credentials and remote state verification
//!
//! Only two provider calls are made: refreshing credentials and asking where
//! the state bucket lives. Both sit behind [`CloudProvider`] so the bootstrap
//! flow can run against a fake.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aws;
pub mod bootstrap;
pub mod state;

pub use aws::AwsProvider;
pub use bootstrap::{bootstrap, BootstrapError, Prompt, TerminalPrompt};
pub use state::{load_program_state, state_dir, ProgramState};

/// Remote bucket holding provisioned deployment state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBucket {
    pub name: String,
    pub region: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    #[error("The specified bucket does not exist: {0}")]
    NoSuchBucket(String),

    #[error("Cloud credentials unavailable: {0}")]
    Credentials(String),

    #[error("Cloud request failed: {0}")]
    Request(String),
}

impl CloudError {
    /// Stable error code, matching the provider's vocabulary.
    pub fn code(&self) -> &'static str {
        match self {
            CloudError::NoSuchBucket(_) => "NoSuchBucket",
            CloudError::Credentials(_) => "CredentialsError",
            CloudError::Request(_) => "RequestError",
        }
    }
}

pub trait CloudProvider {
    /// Resolve credentials, failing when none can be obtained.
    fn refresh_credentials(&self) -> Result<(), CloudError>;

    /// Region the bucket actually lives in, already normalised.
    fn bucket_region(&self, bucket: &StateBucket) -> Result<String, CloudError>;
}

/// Map a bucket location constraint onto a region name.
///
/// Buckets in `us-east-1` report no constraint; `EU` is the legacy name for
/// `eu-west-1`.
pub fn normalize_region(constraint: Option<&str>) -> String {
    match constraint.map(str::trim) {
        None | Some("") => "us-east-1".to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}
