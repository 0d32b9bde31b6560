//! Content-addressed file pinning.
//!
//! Signature images and company logos are pinned to IPFS through Pinata and
//! referenced by gateway URL. The uploader is a seam: the mock variant keeps
//! tests and keyless development environments off the network.

use albar_types::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Pinata pinning endpoint
const PINATA_PIN_URL: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";

/// A pinned file: content hash plus the public gateway URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpfsFile {
    pub hash: String,
    pub url: String,
}

/// File uploader abstraction
#[async_trait]
pub trait IpfsUploader: Send + Sync {
    /// Pin a file and return its content address
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<IpfsFile>;
}

#[derive(Debug, Deserialize)]
struct PinataResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Pinata-backed uploader
pub struct PinataUploader {
    api_key: String,
    api_secret: String,
    gateway: String,
    client: reqwest::Client,
}

impl PinataUploader {
    /// Create a new uploader
    ///
    /// # Arguments
    ///
    /// * `api_key` / `api_secret` - Pinata API credentials
    /// * `gateway` - gateway host used to build public URLs
    pub fn new(api_key: String, api_secret: String, gateway: String) -> Self {
        Self { api_key, api_secret, gateway, client: reqwest::Client::new() }
    }
}

#[async_trait]
impl IpfsUploader for PinataUploader {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<IpfsFile> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(PINATA_PIN_URL)
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.api_secret)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::external(format!("IPFS upload failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::external(format!(
                "IPFS upload failed with status {}",
                response.status()
            )));
        }

        let body: PinataResponse = response
            .json()
            .await
            .map_err(|e| Error::external(format!("Invalid IPFS upload response: {e}")))?;

        let url = format!("https://{}/ipfs/{}", self.gateway, body.ipfs_hash);
        tracing::info!(hash = %body.ipfs_hash, "File pinned to IPFS");
        Ok(IpfsFile { hash: body.ipfs_hash, url })
    }
}

/// Mock uploader for testing and keyless development
///
/// Derives a stable pseudo-hash from the file contents so repeated uploads
/// of the same bytes yield the same URL. Optionally fails on demand.
pub struct MockIpfsUploader {
    gateway: String,
    should_fail: bool,
}

impl MockIpfsUploader {
    /// Create a mock uploader that always succeeds
    pub fn new() -> Self {
        Self { gateway: "gateway.test".to_string(), should_fail: false }
    }

    /// Create a mock uploader that always fails
    pub fn new_failing() -> Self {
        Self { gateway: "gateway.test".to_string(), should_fail: true }
    }
}

impl Default for MockIpfsUploader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IpfsUploader for MockIpfsUploader {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<IpfsFile> {
        if self.should_fail {
            tracing::warn!(filename, "MockIpfsUploader: Simulating upload failure");
            return Err(Error::external("Mock IPFS upload failure".to_string()));
        }

        // Cheap stable digest: length plus a running sum of the bytes
        let sum: u64 = bytes.iter().map(|&b| u64::from(b)).sum();
        let hash = format!("Qm{:016x}{:016x}", bytes.len() as u64, sum);
        let url = format!("https://{}/ipfs/{}", self.gateway, hash);

        tracing::info!(filename, hash = %hash, "MockIpfsUploader: File logged (not pinned)");
        Ok(IpfsFile { hash, url })
    }
}
