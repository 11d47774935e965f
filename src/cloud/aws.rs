//! AWS-backed cloud provider

use super::{normalize_region, CloudError, CloudProvider, StateBucket};
use anyhow::{Context, Result};
use aws_config::environment::credentials::EnvironmentVariableCredentialsProvider;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use tokio::runtime::Runtime;

const LOCATION_QUERY_REGION: &str = "us-east-1";
const BUCKET_REGION_HEADER: &str = "x-amz-bucket-region";

pub struct AwsProvider {
    runtime: Runtime,
    credentials: SharedCredentialsProvider,
}

impl AwsProvider {
    /// Credentials come from the named profile, or from `AWS_ACCESS_KEY_ID`
    /// and friends when no profile is given.
    pub fn new(profile: Option<&str>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start the cloud client runtime")?;

        let credentials = match profile {
            Some(name) => {
                tracing::debug!("Using credentials from profile '{}'", name);
                SharedCredentialsProvider::new(
                    ProfileFileCredentialsProvider::builder().profile_name(name).build(),
                )
            }
            None => {
                tracing::debug!("Using credentials from the environment");
                SharedCredentialsProvider::new(EnvironmentVariableCredentialsProvider::new())
            }
        };

        Ok(Self { runtime, credentials })
    }

    fn s3_client(&self, region: &str) -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(self.credentials.clone())
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }
}

impl CloudProvider for AwsProvider {
    fn refresh_credentials(&self) -> Result<(), CloudError> {
        self.runtime
            .block_on(self.credentials.provide_credentials())
            .map(|_| ())
            .map_err(|e| CloudError::Credentials(DisplayErrorContext(&e).to_string()))
    }

    fn bucket_region(&self, bucket: &StateBucket) -> Result<String, CloudError> {
        // The us-east-1 endpoint answers GetBucketLocation for buckets in any
        // region; a client pinned to the recorded region would get a redirect.
        let client = self.s3_client(LOCATION_QUERY_REGION);
        let response = self
            .runtime
            .block_on(client.get_bucket_location().bucket(&bucket.name).send());

        match response {
            Ok(output) => {
                let region =
                    normalize_region(output.location_constraint().map(|c| c.as_str()));
                tracing::debug!("Bucket {} reports region {}", bucket.name, region);
                Ok(region)
            }
            Err(err) => {
                let code = err.as_service_error().and_then(|e| e.code()).map(str::to_string);
                let region_header = err
                    .raw_response()
                    .and_then(|raw| raw.headers().get(BUCKET_REGION_HEADER))
                    .map(str::to_string);
                let construction = matches!(err, SdkError::ConstructionFailure(_));
                interpret_location_failure(
                    &bucket.name,
                    code.as_deref(),
                    region_header.as_deref(),
                    construction,
                    DisplayErrorContext(&err).to_string(),
                )
            }
        }
    }
}

/// Map a failed GetBucketLocation onto a region or a [`CloudError`].
///
/// Redirect-style answers still name the bucket's region in
/// `x-amz-bucket-region`; that region is the answer.
fn interpret_location_failure(
    bucket: &str,
    code: Option<&str>,
    region_header: Option<&str>,
    construction_failure: bool,
    report: String,
) -> Result<String, CloudError> {
    match code {
        Some("NoSuchBucket") => Err(CloudError::NoSuchBucket(bucket.to_string())),
        Some("PermanentRedirect") | Some("AuthorizationHeaderMalformed") | Some("IllegalLocationConstraintException") => {
            match region_header {
                Some(region) if !region.trim().is_empty() => Ok(normalize_region(Some(region))),
                _ => Err(CloudError::Request(report)),
            }
        }
        Some("InvalidAccessKeyId") | Some("SignatureDoesNotMatch") | Some("ExpiredToken") => {
            Err(CloudError::Credentials(report))
        }
        _ if construction_failure => Err(CloudError::Credentials(report)),
        _ => Err(CloudError::Request(report)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret(code: Option<&str>, header: Option<&str>) -> Result<String, CloudError> {
        interpret_location_failure("deploy-state", code, header, false, "report".to_string())
    }

    #[test]
    fn redirect_yields_region_from_header() {
        assert_eq!(interpret(Some("PermanentRedirect"), Some("us-east-1")), Ok("us-east-1".to_string()));
        assert_eq!(
            interpret(Some("AuthorizationHeaderMalformed"), Some("ap-south-1")),
            Ok("ap-south-1".to_string())
        );
    }

    #[test]
    fn redirect_without_header_is_request_failure() {
        assert_eq!(
            interpret(Some("PermanentRedirect"), None),
            Err(CloudError::Request("report".to_string()))
        );
    }

    #[test]
    fn missing_bucket_and_credentials_codes() {
        assert_eq!(
            interpret(Some("NoSuchBucket"), None),
            Err(CloudError::NoSuchBucket("deploy-state".to_string()))
        );
        assert_eq!(
            interpret(Some("ExpiredToken"), None),
            Err(CloudError::Credentials("report".to_string()))
        );
        assert_eq!(
            interpret_location_failure("b", None, None, true, "unsigned".to_string()),
            Err(CloudError::Credentials("unsigned".to_string()))
        );
        assert_eq!(interpret(Some("InternalError"), None), Err(CloudError::Request("report".to_string())));
    }
}
