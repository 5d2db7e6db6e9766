use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::FailureKind;
use crate::models::{
    AssetNamesPayload, AssetPage, AssetRecord, CreatedAssetPayload, UploadFile, UsagePathsPayload,
};
use crate::table::sort_filter::AssetQuery;

pub type ClientResult<T> = Result<T, ClientError>;

/// The remote asset-storage surface the orchestrator depends on.
#[async_trait]
pub trait AssetApi: Send + Sync {
    async fn list_assets(&self, course_id: &str, query: &AssetQuery) -> ClientResult<AssetPage>;

    /// Probes which of `filenames` already exist in the course.
    async fn get_asset_names_for_files(
        &self,
        course_id: &str,
        filenames: &[String],
    ) -> ClientResult<AssetNamesPayload>;

    async fn create_asset(
        &self,
        course_id: &str,
        file: &UploadFile,
    ) -> ClientResult<CreatedAssetPayload>;

    async fn delete_asset(&self, course_id: &str, asset_id: &str) -> ClientResult<()>;

    async fn set_lock_status(
        &self,
        course_id: &str,
        asset_id: &str,
        locked: bool,
    ) -> ClientResult<()>;

    async fn get_usage_paths(
        &self,
        course_id: &str,
        asset_id: &str,
    ) -> ClientResult<UsagePathsPayload>;

    /// Downloads every row and returns one message per row that failed.
    async fn download_rows(&self, rows: &[AssetRecord], course_id: &str) -> Vec<String>;
}

#[derive(Clone)]
pub struct StudioClient {
    inner: reqwest::Client,
    config: Arc<AppConfig>,
    base_url: String,
}

impl StudioClient {
    pub fn new(config: AppConfig) -> ClientResult<Self> {
        let timeout = config.request_timeout;
        let base_url = normalize_base_url(&config.api_base_url);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            inner: client,
            config: Arc::new(config),
            base_url,
        })
    }

    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = self.join_path(path);
        self.authorized(self.inner.request(method, url))
    }

    fn authorized(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = self.config.bearer_token() {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        builder.header("X-Request-Id", Uuid::new_v4().to_string())
    }

    fn join_path(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T>(&self, builder: reqwest::RequestBuilder) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let bytes = self.send_raw(builder).await?;
        if bytes.is_empty() {
            return Err(ClientError::EmptyResponse(StatusCode::NO_CONTENT));
        }
        serde_json::from_slice(&bytes).map_err(ClientError::from)
    }

    async fn send_empty(&self, builder: reqwest::RequestBuilder) -> ClientResult<()> {
        self.send_raw(builder).await.map(|_| ())
    }

    async fn send_raw(&self, builder: reqwest::RequestBuilder) -> ClientResult<Vec<u8>> {
        let response = builder.send().await.map_err(ClientError::from)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(ClientError::from)?;

        if status.is_success() {
            return Ok(bytes.to_vec());
        }

        match serde_json::from_slice::<ApiErrorBody>(&bytes) {
            Ok(body) => Err(ClientError::Api(body.with_status(status))),
            Err(_) if bytes.is_empty() => Err(ClientError::EmptyResponse(status)),
            Err(_) => Err(ClientError::UnexpectedStatus {
                status,
                body: bytes.to_vec(),
            }),
        }
    }

    async fn download_one(&self, row: &AssetRecord) -> anyhow::Result<()> {
        let response = self
            .authorized(self.inner.get(&row.external_url))
            .send()
            .await
            .with_context(|| format!("request for {} failed", row.display_name))?
            .error_for_status()
            .with_context(|| format!("server refused {}", row.display_name))?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read body of {}", row.display_name))?;

        let dir = self.config.download_dir.as_path();
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let target = dir.join(safe_file_name(&row.display_name));
        tokio::fs::write(&target, &bytes)
            .await
            .with_context(|| format!("failed to write {}", target.display()))?;
        Ok(())
    }
}

#[async_trait]
impl AssetApi for StudioClient {
    async fn list_assets(&self, course_id: &str, query: &AssetQuery) -> ClientResult<AssetPage> {
        let path = format!("assets/{course_id}/");
        let builder = self.request(Method::GET, &path).query(query);
        self.send(builder).await
    }

    async fn get_asset_names_for_files(
        &self,
        course_id: &str,
        filenames: &[String],
    ) -> ClientResult<AssetNamesPayload> {
        let path = format!("assets/{course_id}/");
        let mut params: Vec<(&str, String)> = filenames
            .iter()
            .map(|name| ("display_name", name.clone()))
            .collect();
        params.push(("page_size", filenames.len().max(1).to_string()));
        let builder = self.request(Method::GET, &path).query(&params);
        self.send(builder).await
    }

    async fn create_asset(
        &self,
        course_id: &str,
        file: &UploadFile,
    ) -> ClientResult<CreatedAssetPayload> {
        let path = format!("assets/{course_id}/");
        let mut part =
            reqwest::multipart::Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = reqwest::multipart::Form::new().part("file", part);
        let builder = self.request(Method::POST, &path).multipart(form);
        self.send(builder).await
    }

    async fn delete_asset(&self, course_id: &str, asset_id: &str) -> ClientResult<()> {
        let path = format!("assets/{course_id}/{asset_id}");
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    async fn set_lock_status(
        &self,
        course_id: &str,
        asset_id: &str,
        locked: bool,
    ) -> ClientResult<()> {
        let path = format!("assets/{course_id}/{asset_id}");
        let builder = self
            .request(Method::PUT, &path)
            .json(&json!({ "locked": locked }));
        self.send_empty(builder).await
    }

    async fn get_usage_paths(
        &self,
        course_id: &str,
        asset_id: &str,
    ) -> ClientResult<UsagePathsPayload> {
        let path = format!("assets/{course_id}/{asset_id}/usage");
        self.send(self.request(Method::GET, &path)).await
    }

    async fn download_rows(&self, rows: &[AssetRecord], _course_id: &str) -> Vec<String> {
        let mut errors = Vec::new();
        for row in rows {
            if let Err(err) = self.download_one(row).await {
                tracing::warn!("download of {} failed: {err:#}", row.display_name);
                errors.push(format!("Failed to download {}.", row.display_name));
            }
        }
        errors
    }
}

fn normalize_base_url(input: &str) -> String {
    input.trim_end_matches('/').to_string()
}

fn safe_file_name(name: &str) -> String {
    let file_name = Path::new(name)
        .file_name()
        .map(|value| value.to_string_lossy().into_owned())
        .unwrap_or_default();
    if file_name.is_empty() {
        "download".to_string()
    } else {
        file_name
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(alias = "error", alias = "developer_message")]
    pub message: String,
    #[serde(skip)]
    pub status: Option<StatusCode>,
}

impl ApiErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            status: Some(status),
        }
    }

    fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}

impl std::fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{status}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("api error: {0}")]
    Api(ApiErrorBody),
    #[error("empty response body: {0}")]
    EmptyResponse(StatusCode),
    #[error("unexpected status {status}: {body:?}")]
    UnexpectedStatus { status: StatusCode, body: Vec<u8> },
    #[error("client setup failed: {0:#}")]
    Setup(#[from] anyhow::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(err) => err.status(),
            Self::Api(body) => body.status,
            Self::EmptyResponse(status) => Some(*status),
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message the server attached to the failure, if any.
    pub fn server_message(&self) -> Option<String> {
        match self {
            Self::Api(body) => Some(body.message.clone()),
            Self::UnexpectedStatus { body, .. } if !body.is_empty() => {
                Some(String::from_utf8_lossy(body).trim().to_string())
            }
            _ => None,
        }
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self.status() {
            Some(StatusCode::FORBIDDEN) => FailureKind::PermissionDenied,
            Some(StatusCode::PAYLOAD_TOO_LARGE) => FailureKind::PayloadTooLarge {
                message: self
                    .server_message()
                    .unwrap_or_else(|| "File exceeds the maximum upload size.".to_string()),
            },
            _ => FailureKind::Transport,
        }
    }
}
