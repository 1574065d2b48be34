//! HTTP client for the remote image store.
//!
//! Wire protocol:
//! - `POST <upload_endpoint>` — multipart upload, returns `{url, fileId, name}`
//! - `GET <api_url>?name=<name>` — list of `{fileId, ...}` matching the name
//! - `DELETE <api_url>/<fileId>`
//!
//! Auth is a static credential encoded into a Basic header
//! (`base64(private_key + ":")`). Upload and delete carry separately
//! configured timeouts; a timeout is a normal failure, never retried here.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

use livraria_core::config::CdnConfig;

#[derive(Debug, Error)]
pub enum CdnError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CdnError {
    fn from(err: reqwest::Error) -> Self {
        CdnError::Request(err.to_string())
    }
}

/// A stored object as reported by the remote store.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFile {
    #[serde(rename = "fileId")]
    pub file_id: String,
    pub name: String,
    pub url: String,
}

/// The operations the pipeline needs from the remote store. `CdnClient` is
/// the production implementation; tests substitute a recording mock.
#[async_trait]
pub trait RemoteImageStore: Send + Sync {
    /// Multipart upload under `folder`; returns the stored object.
    async fn upload(
        &self,
        filename: &str,
        folder: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<RemoteFile, CdnError>;

    /// Resolve a stored object's id by its exact name. `Ok(None)` when the
    /// store has no object with that name.
    async fn find_file_id(&self, name: &str) -> Result<Option<String>, CdnError>;

    async fn delete(&self, file_id: &str) -> Result<(), CdnError>;
}

pub struct CdnClient {
    http: reqwest::Client,
    upload_endpoint: String,
    api_url: String,
    auth_header: String,
    upload_timeout: Duration,
    delete_timeout: Duration,
}

impl CdnClient {
    /// Construct from configuration. Fails fast when the endpoint or the
    /// credential is missing; no lazy initialization at first use.
    pub fn new(config: &CdnConfig) -> Result<Self, anyhow::Error> {
        if config.upload_endpoint.is_empty()
            || config.api_url.is_empty()
            || config.private_key.is_empty()
        {
            return Err(anyhow::anyhow!(
                "CDN upload endpoint, API URL and private key must all be configured"
            ));
        }

        let credential =
            base64::engine::general_purpose::STANDARD.encode(format!("{}:", config.private_key));

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build CDN HTTP client: {}", e))?;

        Ok(Self {
            http,
            upload_endpoint: config.upload_endpoint.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {}", credential),
            upload_timeout: config.upload_timeout,
            delete_timeout: config.delete_timeout,
        })
    }
}

#[async_trait]
impl RemoteImageStore for CdnClient {
    async fn upload(
        &self,
        filename: &str,
        folder: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<RemoteFile, CdnError> {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| CdnError::Request(format!("invalid content type: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("fileName", filename.to_string())
            .text("folder", folder.to_string())
            .text("useUniqueFileName", "false");

        let response = self
            .http
            .post(&self.upload_endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CdnError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<RemoteFile>()
            .await
            .map_err(|e| CdnError::InvalidResponse(e.to_string()))
    }

    async fn find_file_id(&self, name: &str) -> Result<Option<String>, CdnError> {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[("name", name)])
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .timeout(self.delete_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CdnError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let files = response
            .json::<Vec<RemoteFile>>()
            .await
            .map_err(|e| CdnError::InvalidResponse(e.to_string()))?;

        Ok(files.into_iter().next().map(|f| f.file_id))
    }

    async fn delete(&self, file_id: &str) -> Result<(), CdnError> {
        let url = format!("{}/{}", self.api_url, file_id);
        let response = self
            .http
            .delete(&url)
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .timeout(self.delete_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CdnError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CdnConfig {
        CdnConfig {
            upload_endpoint: "https://upload.example.com/api/v1/files/upload".to_string(),
            api_url: "https://api.example.com/v1/files/".to_string(),
            private_key: "private_abc123".to_string(),
            upload_timeout: Duration::from_secs(30),
            delete_timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_new_requires_all_fields() {
        assert!(CdnClient::new(&config()).is_ok());

        let mut missing = config();
        missing.private_key = String::new();
        assert!(CdnClient::new(&missing).is_err());

        let mut missing = config();
        missing.upload_endpoint = String::new();
        assert!(CdnClient::new(&missing).is_err());
    }

    #[test]
    fn test_basic_auth_header_encoding() {
        let client = CdnClient::new(&config()).unwrap();
        let expected =
            base64::engine::general_purpose::STANDARD.encode("private_abc123:".as_bytes());
        assert_eq!(client.auth_header, format!("Basic {}", expected));
    }

    #[test]
    fn test_api_url_trailing_slash_trimmed() {
        let client = CdnClient::new(&config()).unwrap();
        assert_eq!(client.api_url, "https://api.example.com/v1/files");
    }

    #[test]
    fn test_remote_file_deserialization() {
        let file: RemoteFile = serde_json::from_str(
            r#"{"fileId": "abc", "name": "author_1.jpg", "url": "https://cdn.example.com/author_1.jpg", "size": 123}"#,
        )
        .unwrap();
        assert_eq!(file.file_id, "abc");
        assert_eq!(file.name, "author_1.jpg");
    }
}
