//! Run context handed to commands.

use serde_yaml::Value;

use super::args::ProgramOptions;
use crate::cloud::{CloudProvider, ProgramState, StateBucket};
use crate::error::DomainError;

/// Built once after params are loaded; read-only for the rest of the run.
pub struct RunContext {
    pub options: ProgramOptions,
    pub params: Value,
    /// Present only for commands that went through cloud bootstrap.
    pub cloud: Option<Box<dyn CloudProvider>>,
    pub state: Option<ProgramState>,
}

impl RunContext {
    pub fn new(options: ProgramOptions, params: Value) -> Self {
        Self { options, params, cloud: None, state: None }
    }

    pub fn with_cloud(mut self, cloud: Box<dyn CloudProvider>, state: Option<ProgramState>) -> Self {
        self.cloud = Some(cloud);
        self.state = state;
        self
    }

    pub fn cloud(&self) -> anyhow::Result<&dyn CloudProvider> {
        self.cloud
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Cloud access was not initialized for this command"))
    }

    pub fn state_bucket(&self) -> Result<&StateBucket, DomainError> {
        self.state
            .as_ref()
            .and_then(ProgramState::state_bucket)
            .ok_or_else(|| DomainError::new("No state bucket recorded yet - nothing to check"))
    }
}
