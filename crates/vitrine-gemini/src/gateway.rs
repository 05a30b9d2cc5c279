//! [`EditGateway`] over the Generative Language REST API.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use vitrine_geometry::{AspectRatio, ImageBuffer};
use vitrine_workflow::{EditGateway, GatewayError};

use crate::config::GeminiConfig;
use crate::error::{GeminiError, classify_status, classify_transport};
use crate::wire::{
    GenerateContentRequest, GenerateContentResponse, PredictRequest, PredictResponse,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client for edit, analysis, and generation models.
#[derive(Clone)]
pub struct GeminiGateway {
    client: reqwest::Client,
    config: GeminiConfig,
    api_key: String,
}

impl std::fmt::Debug for GeminiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GeminiGateway {
    /// Build a gateway from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::InvalidConfig`], [`GeminiError::MissingApiKey`],
    /// or [`GeminiError::Client`] if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, GeminiError> {
        config.validate()?;
        let api_key = config.resolve_api_key()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, GatewayError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!(%url, "gateway request");
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| classify_transport(&e))?;
        if !status.is_success() {
            let err = classify_status(status.as_u16(), &String::from_utf8_lossy(&bytes));
            warn!(%url, status = status.as_u16(), kind = ?err.kind, "gateway request failed");
            return Err(err);
        }
        debug!(%url, bytes = bytes.len(), "gateway response");
        serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::unknown(format!("malformed response body: {e}")))
    }
}

#[async_trait]
impl EditGateway for GeminiGateway {
    async fn edit(
        &self,
        image: &ImageBuffer,
        instruction: &str,
    ) -> Result<ImageBuffer, GatewayError> {
        let url = self.config.endpoint(&self.config.edit_model, "generateContent");
        let body = GenerateContentRequest::with_image(image, instruction, true);
        let response: GenerateContentResponse = self.post(&url, &body).await?;
        response.into_image()
    }

    async fn analyze(&self, image: &ImageBuffer, instruction: &str) -> Result<String, GatewayError> {
        let url = self
            .config
            .endpoint(&self.config.analysis_model, "generateContent");
        let body = GenerateContentRequest::with_image(image, instruction, false);
        let response: GenerateContentResponse = self.post(&url, &body).await?;
        response.into_text()
    }

    async fn generate(
        &self,
        instruction: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<ImageBuffer, GatewayError> {
        let url = self.config.endpoint(&self.config.generate_model, "predict");
        let body = PredictRequest::single(instruction, aspect_ratio);
        let response: PredictResponse = self.post(&url, &body).await?;
        response.into_image()
    }
}
