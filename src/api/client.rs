//! HTTP client for the emotion-analysis service.
//!
//! Wraps every endpoint the service exposes (communications, custom models,
//! emotion categories and word associations) behind typed async methods.

use crate::analysis::{records_from_value, AggregationError};
use crate::models::{
    CommunicationRecord, CustomModel, EmotionCategory, NewCommunication, WordAssociation,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors returned by [`ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to the analysis service at {0}. Is it running?")]
    Connect(String),

    #[error("service error {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to parse service response: {0}")]
    Decode(String),

    #[error("failed to send request: {0}")]
    Request(reqwest::Error),

    #[error(transparent)]
    InvalidInputShape(#[from] AggregationError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Connection settings for the client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Access token attached as a bearer token when present.
    pub token: Option<String>,
}

/// Typed client over the service's REST API.
pub struct ApiClient {
    config: ApiConfig,
    http_client: reqwest::Client,
}

impl ApiClient {
    /// Build a client. Fails only if the TLS backend cannot be set up.
    pub fn new(mut config: ApiConfig) -> Result<Self, ApiError> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        info!("Using analysis service at {}", config.base_url);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("{} {}", method, url);

        let builder = self.http_client.request(method, url);
        match self.config.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn classify(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.config.timeout_seconds)
        } else if e.is_connect() {
            ApiError::Connect(self.config.base_url.clone())
        } else {
            ApiError::Request(e)
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(builder).await?;
        let body = response.text().await.map_err(|e| self.classify(e))?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send(builder).await.map(|_| ())
    }

    // === Communications ===

    /// Fetch every stored communication record.
    pub async fn list_communications(&self) -> Result<Vec<CommunicationRecord>, ApiError> {
        let value: Value = self
            .send_json(self.request(Method::GET, "/communication"))
            .await?;
        let records = records_from_value(value)?;
        info!("Fetched {} communications", records.len());
        Ok(records)
    }

    /// Submit text for analysis and store the result.
    pub async fn save_communication(
        &self,
        body: &NewCommunication,
    ) -> Result<CommunicationRecord, ApiError> {
        self.send_json(self.request(Method::POST, "/communication").json(body))
            .await
    }

    pub async fn update_communication(
        &self,
        id: &str,
        body: &NewCommunication,
    ) -> Result<CommunicationRecord, ApiError> {
        let path = format!("/communication/{}", id);
        self.send_json(self.request(Method::PUT, &path).json(body))
            .await
    }

    pub async fn delete_communication(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/communication/{}", id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    /// Upload a file for analysis as `multipart/form-data`.
    pub async fn upload_file(
        &self,
        file: &Path,
        model_name: &str,
    ) -> Result<CommunicationRecord, ApiError> {
        let bytes = tokio::fs::read(file).await.map_err(|source| ApiError::Io {
            path: file.display().to_string(),
            source,
        })?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.txt".to_string());
        debug!("Uploading {} ({} bytes)", file_name, bytes.len());

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("modelName", model_name.to_string());

        self.send_json(
            self.request(Method::POST, "/communication/upload")
                .multipart(form),
        )
        .await
    }

    // === Custom models ===

    pub async fn list_models(&self) -> Result<Vec<CustomModel>, ApiError> {
        self.send_json(self.request(Method::GET, "/models")).await
    }

    pub async fn create_model(&self, name: &str) -> Result<CustomModel, ApiError> {
        self.send_json(self.request(Method::POST, "/models").query(&[("name", name)]))
            .await
    }

    pub async fn delete_model(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/models/{}", id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    // === Emotion categories ===

    pub async fn list_categories(&self, model_id: &str) -> Result<Vec<EmotionCategory>, ApiError> {
        self.send_json(
            self.request(Method::GET, "/emotion/category")
                .query(&[("modelId", model_id)]),
        )
        .await
    }

    /// Categories across every model.
    pub async fn list_all_categories(&self) -> Result<Vec<EmotionCategory>, ApiError> {
        self.send_json(self.request(Method::GET, "/emotion/emotion-categories"))
            .await
    }

    pub async fn create_category(
        &self,
        model_id: &str,
        name: &str,
    ) -> Result<EmotionCategory, ApiError> {
        self.send_json(
            self.request(Method::POST, "/emotion/category")
                .query(&[("modelId", model_id), ("name", name)]),
        )
        .await
    }

    pub async fn rename_category(&self, id: &str, name: &str) -> Result<EmotionCategory, ApiError> {
        let path = format!("/emotion/category/{}", id);
        self.send_json(self.request(Method::PUT, &path).query(&[("name", name)]))
            .await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/emotion/category/{}", id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    // === Word associations ===

    pub async fn list_associations(&self, model_id: &str) -> Result<Vec<WordAssociation>, ApiError> {
        let path = format!("/emotion/word-associations/{}", model_id);
        self.send_json(self.request(Method::GET, &path)).await
    }

    pub async fn create_association(
        &self,
        word: &str,
        category_id: &str,
    ) -> Result<WordAssociation, ApiError> {
        self.send_json(
            self.request(Method::POST, "/emotion/word-association")
                .query(&[("word", word), ("emotionCategoryId", category_id)]),
        )
        .await
    }

    pub async fn delete_association(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/emotion/word-association/{}", id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    /// Categories and word associations of one model, fetched together.
    pub async fn model_vocabulary(
        &self,
        model_id: &str,
    ) -> Result<(Vec<EmotionCategory>, Vec<WordAssociation>), ApiError> {
        futures::try_join!(
            self.list_categories(model_id),
            self.list_associations(model_id)
        )
    }
}
