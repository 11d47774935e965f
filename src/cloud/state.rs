//! Persisted program state

use super::StateBucket;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const STATE_FILE: &str = "config.json";

/// Program-level record written when the deployment is provisioned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<StateBucket>,
}

pub fn state_dir() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("CUMULUS_HOME") {
        return Some(PathBuf::from(home));
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|dir| PathBuf::from(dir).join("cumulus"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join("cumulus"));
        }
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join("cumulus"))
    }
}

/// Read the persisted state, `None` when the program has not been provisioned.
pub fn load_program_state() -> Result<Option<ProgramState>> {
    let Some(dir) = state_dir() else {
        return Ok(None);
    };
    let path = dir.join(STATE_FILE);
    if !path.exists() {
        tracing::debug!("No program state at {}", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed reading program state: {}", path.display()))?;
    let state: ProgramState = serde_json::from_str(&content)
        .with_context(|| format!("Invalid program state: {}", path.display()))?;

    Ok(Some(state))
}

impl ProgramState {
    pub fn state_bucket(&self) -> Option<&StateBucket> {
        self.bucket.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_state_parses_bucket() {
        let state: ProgramState =
            serde_json::from_str(r#"{"bucket":{"name":"deploy-state","region":"eu-west-1"}}"#)
                .expect("state");
        assert_eq!(
            state.state_bucket(),
            Some(&StateBucket { name: "deploy-state".into(), region: "eu-west-1".into() })
        );
    }

    #[test]
    fn test_program_state_without_bucket() {
        let state: ProgramState = serde_json::from_str("{}").expect("state");
        assert!(state.state_bucket().is_none());
    }

    #[test]
    fn test_program_state_rejects_partial_bucket() {
        assert!(serde_json::from_str::<ProgramState>(r#"{"bucket":{"name":"x"}}"#).is_err());
    }
}
