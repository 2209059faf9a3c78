//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! S3 object store client

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Error;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use framebridge_core::{BridgeError, BridgeResult, Credential};
use tracing::{debug, info};

use super::factory::ConnectionTarget;
use super::records::{ObjectEntry, ObjectListing};
use super::ObjectStoreClient;

/// Host used when a data source names no endpoint; resolves to the SDK's
/// regional default
pub const DEFAULT_OBJECT_STORE_HOST: &str = "s3.amazonaws.com";

/// Region used when the settings carry none
pub const DEFAULT_REGION: &str = "us-east-1";

const CREDENTIAL_PROVIDER_NAME: &str = "framebridge";

/// Object listing over the S3 API
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    /// Build a client from a connection target.
    ///
    /// A host with an `http://` or `https://` scheme is used as a custom
    /// endpoint with path-style addressing. A username/password credential is
    /// used as a static access key pair; otherwise the default provider chain
    /// applies.
    pub async fn connect(target: &ConnectionTarget) -> BridgeResult<Self> {
        let region = target
            .region
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region));
        match &target.credential {
            Some(Credential::UsernamePassword { username, password }) => {
                loader = loader.credentials_provider(Credentials::new(
                    username.clone(),
                    password.clone(),
                    None,
                    None,
                    CREDENTIAL_PROVIDER_NAME,
                ));
            }
            Some(Credential::Token(_)) => {
                return Err(BridgeError::authentication(
                    "object store needs an access key pair, not a token",
                ))
            }
            None => debug!("No static credential, using default AWS provider chain"),
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = custom_endpoint(&target.host) {
            info!("Using object store endpoint {}", endpoint);
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self {
            client: S3Client::from_conf(builder.build()),
        })
    }
}

#[async_trait]
impl ObjectStoreClient for S3ObjectStore {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> BridgeResult<ObjectListing> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .delimiter(delimiter)
            .send()
            .await
            .map_err(|e| list_error(bucket, e))?;

        let common_prefixes = output
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();
        let objects = output
            .contents()
            .iter()
            .filter_map(|object| {
                object.key().map(|key| ObjectEntry {
                    key: key.to_string(),
                    last_modified: object.last_modified().and_then(|t| {
                        DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())
                    }),
                    size: object.size(),
                })
            })
            .collect();

        Ok(ObjectListing {
            common_prefixes,
            objects,
            is_truncated: output.is_truncated().unwrap_or(false),
        })
    }
}

fn custom_endpoint(host: &str) -> Option<&str> {
    let host = host.trim();
    (host.starts_with("http://") || host.starts_with("https://")).then_some(host)
}

fn list_error(bucket: &str, err: SdkError<ListObjectsV2Error, HttpResponse>) -> BridgeError {
    let message = format!("failed to list bucket {}", bucket);
    if matches!(err, SdkError::DispatchFailure(_)) {
        return BridgeError::connection_with_source(message, err);
    }
    if matches!(err, SdkError::TimeoutError(_)) {
        return BridgeError::timeout_with_source(message, err);
    }
    let denied = matches!(
        err.code(),
        Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "ExpiredToken")
    );
    if denied {
        BridgeError::authentication_with_source(message, err)
    } else {
        BridgeError::query_with_source(message, err)
    }
}
