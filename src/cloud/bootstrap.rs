//! Credential bootstrap and state bucket verification.

use super::{CloudError, CloudProvider, ProgramState};
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    #[error(
        "Failed to initialize cloud credentials - make sure you provide --profile or set AWS_ACCESS_KEY_ID env var"
    )]
    Credentials(#[source] CloudError),

    #[error("Failed to look up state bucket '{bucket}': {source}")]
    BucketLookup {
        bucket: String,
        #[source]
        source: CloudError,
    },

    #[error("State bucket inconsistency acknowledged by the operator: {0}")]
    OperatorConfirmed(String),

    #[error("State bucket inconsistency may be a bug; next steps are up to you: {0}")]
    PossibleDefect(String),
}

/// Yes/no question asked to the operator.
pub trait Prompt {
    fn yes_or_no(&self, question: &str) -> Result<bool>;
}

/// Asks on the controlling terminal.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn yes_or_no(&self, question: &str) -> Result<bool> {
        let answer = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(question)
            .default(false)
            .interact()?;
        Ok(answer)
    }
}

/// Establish credentials, then locate and check the recorded state bucket.
///
/// `locate` is only consulted once credentials are in place. With no recorded
/// bucket the run has not been provisioned yet and verification is skipped. A
/// region mismatch or a vanished bucket is put to the operator; either answer
/// ends the run. Returns the located program state.
pub fn bootstrap<F>(cloud: &dyn CloudProvider, prompt: &dyn Prompt, locate: F) -> Result<Option<ProgramState>>
where
    F: FnOnce() -> Result<Option<ProgramState>>,
{
    if let Err(err) = cloud.refresh_credentials() {
        return match err {
            CloudError::NoSuchBucket(_) => disambiguate(prompt, &missing_bucket_question()),
            other => Err(BootstrapError::Credentials(other).into()),
        };
    }

    let state = locate()?;
    let Some(bucket) = state.as_ref().and_then(ProgramState::state_bucket) else {
        tracing::debug!("No state bucket recorded; skipping verification");
        return Ok(state);
    };

    match cloud.bucket_region(bucket) {
        Ok(region) if region == bucket.region => {
            tracing::debug!("State bucket {} verified in {}", bucket.name, region);
            Ok(state)
        }
        Ok(region) => {
            let question = format!(
                "Expected state bucket '{}' in '{}', but found it in '{}'. Did you recreate the bucket in another region?",
                bucket.name, bucket.region, region
            );
            disambiguate(prompt, &question)
        }
        Err(CloudError::NoSuchBucket(_)) => disambiguate(prompt, &missing_bucket_question()),
        Err(source @ CloudError::Credentials(_)) => Err(BootstrapError::Credentials(source).into()),
        Err(source) => {
            Err(BootstrapError::BucketLookup { bucket: bucket.name.clone(), source }.into())
        }
    }
}

fn missing_bucket_question() -> String {
    "Expected a state bucket, but none exists. Did you delete it manually?".to_string()
}

fn disambiguate<T>(prompt: &dyn Prompt, question: &str) -> Result<T> {
    if prompt.yes_or_no(question)? {
        Err(BootstrapError::OperatorConfirmed(question.to_string()).into())
    } else {
        Err(BootstrapError::PossibleDefect(question.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::StateBucket;
    use std::cell::{Cell, RefCell};

    struct FakeCloud {
        refresh: Result<(), CloudError>,
        region: Result<String, CloudError>,
        region_calls: RefCell<usize>,
    }

    impl FakeCloud {
        fn new(refresh: Result<(), CloudError>, region: Result<String, CloudError>) -> Self {
            Self { refresh, region, region_calls: RefCell::new(0) }
        }
    }

    impl CloudProvider for FakeCloud {
        fn refresh_credentials(&self) -> Result<(), CloudError> {
            self.refresh.clone()
        }

        fn bucket_region(&self, _bucket: &StateBucket) -> Result<String, CloudError> {
            *self.region_calls.borrow_mut() += 1;
            self.region.clone()
        }
    }

    struct ScriptedPrompt {
        answer: bool,
        asked: RefCell<Vec<String>>,
    }

    impl ScriptedPrompt {
        fn answering(answer: bool) -> Self {
            Self { answer, asked: RefCell::new(Vec::new()) }
        }
    }

    impl Prompt for ScriptedPrompt {
        fn yes_or_no(&self, question: &str) -> Result<bool> {
            self.asked.borrow_mut().push(question.to_string());
            Ok(self.answer)
        }
    }

    fn bucket() -> StateBucket {
        StateBucket { name: "deploy-state".into(), region: "eu-west-1".into() }
    }

    fn recorded() -> Result<Option<ProgramState>> {
        Ok(Some(ProgramState { bucket: Some(bucket()) }))
    }

    fn unprovisioned() -> Result<Option<ProgramState>> {
        Ok(None)
    }

    fn bootstrap_error(err: anyhow::Error) -> BootstrapError {
        err.downcast::<BootstrapError>().expect("bootstrap error")
    }

    #[test]
    fn test_credentials_failure_is_fatal() {
        let cloud = FakeCloud::new(Err(CloudError::Credentials("no env".into())), Ok("x".into()));
        let prompt = ScriptedPrompt::answering(true);

        let err = bootstrap_error(bootstrap(&cloud, &prompt, recorded).unwrap_err());

        assert!(matches!(err, BootstrapError::Credentials(_)));
        assert!(err.to_string().contains("--profile"));
        assert!(prompt.asked.borrow().is_empty());
        assert_eq!(*cloud.region_calls.borrow(), 0);
    }

    #[test]
    fn test_unprovisioned_skips_verification() {
        let cloud = FakeCloud::new(Ok(()), Ok("us-east-1".into()));
        let prompt = ScriptedPrompt::answering(true);

        let state = bootstrap(&cloud, &prompt, unprovisioned).expect("bootstrap");
        assert!(state.is_none());
        assert_eq!(*cloud.region_calls.borrow(), 0);
    }

    #[test]
    fn test_state_without_bucket_skips_verification() {
        let cloud = FakeCloud::new(Ok(()), Ok("us-east-1".into()));
        let prompt = ScriptedPrompt::answering(true);

        let state = bootstrap(&cloud, &prompt, || Ok(Some(ProgramState::default())))
            .expect("bootstrap");
        assert_eq!(state, Some(ProgramState::default()));
        assert_eq!(*cloud.region_calls.borrow(), 0);
    }

    #[test]
    fn test_credentials_checked_before_state_is_read() {
        let cloud = FakeCloud::new(Err(CloudError::Credentials("no env".into())), Ok("x".into()));
        let prompt = ScriptedPrompt::answering(true);
        let located = Cell::new(false);

        let err = bootstrap_error(
            bootstrap(&cloud, &prompt, || {
                located.set(true);
                Err(anyhow::anyhow!("Invalid program state: config.json"))
            })
            .unwrap_err(),
        );

        assert!(matches!(err, BootstrapError::Credentials(_)));
        assert!(!located.get());
    }

    #[test]
    fn test_state_error_after_credentials_propagates() {
        let cloud = FakeCloud::new(Ok(()), Ok("eu-west-1".into()));
        let prompt = ScriptedPrompt::answering(true);

        let err = bootstrap(&cloud, &prompt, || Err(anyhow::anyhow!("Invalid program state")))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid program state"));
    }

    #[test]
    fn test_matching_region_succeeds() {
        let cloud = FakeCloud::new(Ok(()), Ok("eu-west-1".into()));
        let prompt = ScriptedPrompt::answering(false);

        let state = bootstrap(&cloud, &prompt, recorded).expect("bootstrap");
        assert_eq!(state.and_then(|s| s.bucket), Some(bucket()));
        assert!(prompt.asked.borrow().is_empty());
    }

    #[test]
    fn test_region_mismatch_asks_operator() {
        let cloud = FakeCloud::new(Ok(()), Ok("us-east-1".into()));
        let prompt = ScriptedPrompt::answering(true);

        let err = bootstrap_error(bootstrap(&cloud, &prompt, recorded).unwrap_err());

        assert!(matches!(err, BootstrapError::OperatorConfirmed(_)));
        let asked = prompt.asked.borrow();
        assert_eq!(asked.len(), 1);
        assert!(asked[0].contains("'eu-west-1'"));
        assert!(asked[0].contains("'us-east-1'"));
    }

    #[test]
    fn test_region_mismatch_denied_reports_possible_defect() {
        let cloud = FakeCloud::new(Ok(()), Ok("us-east-1".into()));
        let prompt = ScriptedPrompt::answering(false);

        let err = bootstrap_error(bootstrap(&cloud, &prompt, recorded).unwrap_err());
        assert!(matches!(err, BootstrapError::PossibleDefect(_)));
    }

    #[test]
    fn test_missing_bucket_asks_operator() {
        let cloud =
            FakeCloud::new(Ok(()), Err(CloudError::NoSuchBucket("deploy-state".into())));
        let prompt = ScriptedPrompt::answering(false);

        let err = bootstrap_error(bootstrap(&cloud, &prompt, recorded).unwrap_err());

        assert!(matches!(err, BootstrapError::PossibleDefect(_)));
        assert!(prompt.asked.borrow()[0].contains("delete it manually"));
    }

    #[test]
    fn test_no_such_bucket_during_refresh_asks_operator() {
        let cloud =
            FakeCloud::new(Err(CloudError::NoSuchBucket("deploy-state".into())), Ok("x".into()));
        let prompt = ScriptedPrompt::answering(true);

        let err = bootstrap_error(bootstrap(&cloud, &prompt, unprovisioned).unwrap_err());
        assert!(matches!(err, BootstrapError::OperatorConfirmed(_)));
    }

    #[test]
    fn test_other_lookup_failure_names_bucket() {
        let cloud = FakeCloud::new(Ok(()), Err(CloudError::Request("timeout".into())));
        let prompt = ScriptedPrompt::answering(true);

        let err = bootstrap_error(bootstrap(&cloud, &prompt, recorded).unwrap_err());

        assert!(err.to_string().contains("deploy-state"));
        assert!(prompt.asked.borrow().is_empty());
    }
}
