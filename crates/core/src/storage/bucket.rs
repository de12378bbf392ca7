//! Startup bucket bootstrap.
//!
//! OpenDAL operates inside an existing bucket, so creating one goes through
//! the AWS S3 SDK with the same endpoint, credentials and timeouts.

use aws_sdk_s3::Client;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

use super::config::{StorageConfig, StorageProvider};
use super::error::StoreError;

/// Region S3 treats as the default location; it must not be sent as a
/// location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// What startup has to do about the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BucketSetup {
    /// Bucket is reachable.
    Ready,
    /// Bucket is missing and can be created.
    Create,
}

/// Decide the bucket setup from the outcome of the reachability check.
pub(super) fn plan_setup(
    provider: &StorageProvider,
    checked: Result<(), StoreError>,
) -> Result<BucketSetup, StoreError> {
    match (checked, provider) {
        (Ok(()), _) => Ok(BucketSetup::Ready),
        (Err(StoreError::NotFound { .. }), StorageProvider::S3 { .. }) => Ok(BucketSetup::Create),
        (Err(e), _) => Err(e),
    }
}

/// Create the configured S3 bucket. A bucket we already own counts as created.
pub(super) async fn create_s3_bucket(config: &StorageConfig) -> Result<(), StoreError> {
    let StorageProvider::S3 {
        endpoint,
        bucket,
        access_key_id,
        secret_access_key,
        region,
    } = &config.provider
    else {
        return Err(StoreError::configuration(format!(
            "{} provider has no bucket to create",
            config.provider.name()
        )));
    };

    let credentials = Credentials::new(
        access_key_id,
        secret_access_key,
        None, // session token
        None, // expiration
        "photostore",
    );
    let timeouts = TimeoutConfig::builder()
        .connect_timeout(config.timeouts.connect)
        .operation_timeout(config.timeouts.operation())
        .build();

    let s3_config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.clone()))
        .endpoint_url(endpoint)
        .credentials_provider(credentials)
        .force_path_style(true)
        .timeout_config(timeouts)
        .build();
    let client = Client::from_conf(s3_config);

    let mut request = client.create_bucket().bucket(bucket);
    if let Some(location) = location_constraint(region) {
        request = request.create_bucket_configuration(
            CreateBucketConfiguration::builder()
                .location_constraint(location)
                .build(),
        );
    }

    match request.send().await {
        Ok(_) => Ok(()),
        Err(e)
            if e.as_service_error()
                .is_some_and(|se| se.is_bucket_already_owned_by_you()) =>
        {
            Ok(())
        }
        Err(e) => Err(StoreError::operation(format!(
            "create bucket {bucket}: {}",
            DisplayErrorContext(&e)
        ))),
    }
}

fn location_constraint(region: &str) -> Option<BucketLocationConstraint> {
    let region = region.trim();
    (!region.is_empty() && region != DEFAULT_REGION).then(|| BucketLocationConstraint::from(region))
}
