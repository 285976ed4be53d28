//! `aws-sdk-s3` backed object store
//!
//! One SDK client per store, configured with static credentials, the
//! configured endpoint and region, and path-style addressing for
//! S3-compatible servers. Timeouts and retries are left at SDK defaults.

use super::{ObjectStore, PutObjectResponse, S3ClientError};
use crate::config::StoreConfig;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Region, RequestChecksumCalculation};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::client::result::SdkError;

/// Error codes a HeadObject failure may carry when the object is absent
const NOT_FOUND_CODES: [&str; 3] = ["404", "NoSuchKey", "NotFound"];

const PROVIDER_NAME: &str = "s3-safe-upload";

/// S3 object store
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    /// Create a store from configuration.
    ///
    /// An empty endpoint is accepted so that a store can be built before the
    /// configuration is validated; the SDK then resolves the AWS endpoint for
    /// the region. A non-empty endpoint must be an http(s) URL.
    pub fn new(config: &StoreConfig) -> Result<Self, S3ClientError> {
        let endpoint = config.endpoint.trim();
        if !endpoint.is_empty() && !is_valid_http_url(endpoint) {
            return Err(S3ClientError::ConfigError(format!(
                "Invalid endpoint '{}': must start with http:// or https://",
                endpoint
            )));
        }

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            PROVIDER_NAME,
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.effective_region().to_string()))
            .credentials_provider(credentials)
            .force_path_style(config.force_path_style)
            // Send streamed bodies plain, not aws-chunked with a trailer
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired);

        if !endpoint.is_empty() {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
        })
    }

    /// Get the underlying SDK client
    pub fn client(&self) -> &aws_sdk_s3::Client {
        &self.client
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    #[tracing::instrument(
        name = "s3.head_object",
        skip(self),
        fields(s3.bucket = %bucket, s3.key = %key, s3.found = tracing::field::Empty)
    )]
    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, S3ClientError> {
        let result = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await;

        let found = match result {
            Ok(_) => true,
            Err(ref err) if is_not_found(err) => false,
            Err(err) => return Err(classify(&err)),
        };

        tracing::Span::current().record("s3.found", found);
        Ok(found)
    }

    #[tracing::instrument(
        name = "s3.put_object",
        skip(self, body),
        fields(
            s3.bucket = %bucket,
            s3.key = %key,
            upload.bytes = tracing::field::Empty,
            s3.etag = tracing::field::Empty
        ),
        err
    )]
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
    ) -> Result<PutObjectResponse, S3ClientError> {
        let (lower, upper) = body.size_hint();
        let bytes_written = upper.unwrap_or(lower);
        tracing::Span::current().record("upload.bytes", bytes_written);

        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .acl(ObjectCannedAcl::Private)
            .body(body)
            .send()
            .await
            .map_err(|e| classify(&e))?;

        let etag = output.e_tag().map(str::to_string);
        if let Some(ref etag) = etag {
            tracing::Span::current().record("s3.etag", etag.as_str());
        }

        tracing::debug!(bytes_written, etag = ?etag, "PutObject completed");

        Ok(PutObjectResponse {
            etag,
            bytes_written,
        })
    }
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn is_not_found(err: &SdkError<HeadObjectError, HttpResponse>) -> bool {
    if err
        .as_service_error()
        .is_some_and(HeadObjectError::is_not_found)
    {
        return true;
    }

    if err.code().is_some_and(|code| NOT_FOUND_CODES.contains(&code)) {
        return true;
    }

    // HEAD responses carry no body, so some servers give us nothing but the status
    err.raw_response()
        .is_some_and(|response| response.status().as_u16() == 404)
}

/// Map an SDK failure onto [`S3ClientError`], keeping the service error code
/// and HTTP status when the store answered
fn classify<E>(err: &SdkError<E, HttpResponse>) -> S3ClientError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match err.raw_response() {
        Some(response) => S3ClientError::ServiceError {
            code: err.code().unwrap_or("Unknown").to_string(),
            message: err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(err).to_string()),
            status: Some(response.status().as_u16()),
        },
        None => S3ClientError::RequestError(DisplayErrorContext(err).to_string()),
    }
}
