//! Remote mirror client
//!
//! The remote mirror is a hosted spreadsheet-like resource with a single
//! data table. The `Mirror` trait is the seam between the sync engine and
//! the wire: production uses `HttpMirror` over the sheet service's REST
//! API, tests use an in-memory fake.
//!
//! All operations are single attempts; the engine performs no retries.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::error::SyncError;
use super::target::MirrorTarget;
use crate::config::Config;

/// An opened remote mirror resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorHandle {
    /// The stable resource key
    pub key: String,
    /// Display title of the resource
    pub title: String,
}

/// Access to the remote mirror
#[async_trait]
pub trait Mirror: Send + Sync {
    /// Verify the stored credential artifact is usable
    ///
    /// Must fail with `MissingCredential` before any network call when
    /// the key file is absent.
    fn check_credentials(&self) -> Result<(), SyncError>;

    /// Open an existing resource by resolved target
    async fn open(&self, target: &MirrorTarget) -> Result<MirrorHandle, SyncError>;

    /// Create a new resource under the given name with public read access
    async fn create(&self, name: &str) -> Result<MirrorHandle, SyncError>;

    /// Read the full first table, header row included
    async fn fetch_rows(&self, handle: &MirrorHandle) -> Result<Vec<Vec<String>>, SyncError>;

    /// Fully overwrite the first table with the given rows
    async fn replace_rows(
        &self,
        handle: &MirrorHandle,
        rows: Vec<Vec<String>>,
    ) -> Result<(), SyncError>;
}

#[derive(Deserialize)]
struct SheetInfo {
    key: String,
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
struct SheetValues {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// HTTP client for the hosted sheet service
pub struct HttpMirror {
    base_url: String,
    credential_file: PathBuf,
    http: reqwest::Client,
}

impl HttpMirror {
    /// Build a client from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.mirror_base_url.trim_end_matches('/').to_string(),
            credential_file: config.credential_file.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Read the bearer token from the credential artifact
    ///
    /// The file holds either a JSON object with a `token` field or the
    /// bare token itself.
    fn load_token(&self) -> Result<String, SyncError> {
        if !self.credential_file.exists() {
            return Err(SyncError::MissingCredential {
                path: self.credential_file.clone(),
            });
        }

        let content = std::fs::read_to_string(&self.credential_file).map_err(|_| {
            SyncError::MissingCredential {
                path: self.credential_file.clone(),
            }
        })?;

        #[derive(Deserialize)]
        struct Key {
            token: String,
        }

        match serde_json::from_str::<Key>(&content) {
            Ok(key) => Ok(key.token),
            Err(_) => Ok(content.trim().to_string()),
        }
    }

    /// Build an authenticated GET; query pairs are percent-encoded by
    /// reqwest, so names with `&`, `#` or `%` survive intact
    fn get_request(&self, token: &str, path: &str, query: &[(&str, &str)]) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        request
    }

    async fn get_info(
        &self,
        path: &str,
        query: &[(&str, &str)],
        target: &str,
    ) -> Result<MirrorHandle, SyncError> {
        let token = self.load_token()?;
        let response = self.get_request(&token, path, query).send().await?;
        Self::handle_info(response, target).await
    }

    async fn handle_info(
        response: reqwest::Response,
        target: &str,
    ) -> Result<MirrorHandle, SyncError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_response(status.as_u16(), &body, target));
        }
        let info: SheetInfo = response.json().await?;
        Ok(MirrorHandle {
            key: info.key,
            title: info.title,
        })
    }
}

#[async_trait]
impl Mirror for HttpMirror {
    fn check_credentials(&self) -> Result<(), SyncError> {
        self.load_token().map(|_| ())
    }

    async fn open(&self, target: &MirrorTarget) -> Result<MirrorHandle, SyncError> {
        match target {
            MirrorTarget::Key(key) => {
                self.get_info(&format!("/v1/sheets/{}", key), &[], key).await
            }
            MirrorTarget::Url(link) => {
                self.get_info("/v1/sheets/lookup", &[("url", link.as_str())], link)
                    .await
            }
            MirrorTarget::Name(name) => {
                self.get_info("/v1/sheets/lookup", &[("name", name.as_str())], name)
                    .await
            }
        }
    }

    async fn create(&self, name: &str) -> Result<MirrorHandle, SyncError> {
        let token = self.load_token()?;

        let response = self
            .http
            .post(format!("{}/v1/sheets", self.base_url))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "title": name }))
            .send()
            .await?;
        let handle = Self::handle_info(response, name).await?;
        debug!("Created mirror '{}' with key {}", name, handle.key);

        // Anyone with the link can read
        let response = self
            .http
            .post(format!(
                "{}/v1/sheets/{}/permissions",
                self.base_url, handle.key
            ))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "role": "reader", "scope": "anyone" }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_response(status.as_u16(), &body, name));
        }

        Ok(handle)
    }

    async fn fetch_rows(&self, handle: &MirrorHandle) -> Result<Vec<Vec<String>>, SyncError> {
        let token = self.load_token()?;
        let response = self
            .http
            .get(format!("{}/v1/sheets/{}/values", self.base_url, handle.key))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_response(status.as_u16(), &body, &handle.key));
        }

        let values: SheetValues = response.json().await?;
        Ok(values.values)
    }

    async fn replace_rows(
        &self,
        handle: &MirrorHandle,
        rows: Vec<Vec<String>>,
    ) -> Result<(), SyncError> {
        let token = self.load_token()?;
        let response = self
            .http
            .put(format!("{}/v1/sheets/{}/values", self.base_url, handle.key))
            .bearer_auth(token)
            .json(&serde_json::json!({ "values": rows }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_response(status.as_u16(), &body, &handle.key));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mirror_with_credential(dir: &TempDir, content: Option<&str>) -> HttpMirror {
        let path = dir.path().join("service_account.json");
        if let Some(content) = content {
            std::fs::write(&path, content).unwrap();
        }
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            credential_file: path,
            ..Config::default()
        };
        HttpMirror::new(&config)
    }

    #[test]
    fn test_missing_credential_fails_before_network() {
        let dir = TempDir::new().unwrap();
        let mirror = mirror_with_credential(&dir, None);

        let err = mirror.check_credentials().unwrap_err();
        assert!(err.is_missing_credential());
    }

    #[test]
    fn test_json_credential_token() {
        let dir = TempDir::new().unwrap();
        let mirror = mirror_with_credential(&dir, Some(r#"{"token": "secret-token"}"#));

        assert_eq!(mirror.load_token().unwrap(), "secret-token");
    }

    #[test]
    fn test_bare_credential_token() {
        let dir = TempDir::new().unwrap();
        let mirror = mirror_with_credential(&dir, Some("raw-token\n"));

        assert_eq!(mirror.load_token().unwrap(), "raw-token");
    }

    #[test]
    fn test_lookup_query_is_percent_encoded() {
        let dir = TempDir::new().unwrap();
        let mirror = mirror_with_credential(&dir, Some("tok"));

        let request = mirror
            .get_request("tok", "/v1/sheets/lookup", &[("name", "Q2 & #3 plans")])
            .build()
            .unwrap();

        let url = request.url().to_string();
        assert!(url.starts_with("https://api.gridmirror.io/v1/sheets/lookup?"));
        assert!(url.contains("%26"));
        assert!(url.contains("%23"));
        assert!(!url.contains('#'));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            mirror_base_url: "https://api.gridmirror.io/".to_string(),
            ..Config::default()
        };
        let mirror = HttpMirror::new(&config);
        assert_eq!(mirror.base_url, "https://api.gridmirror.io");
    }
}
