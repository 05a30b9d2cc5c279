//! JSON request and response bodies.
//!
//! Only the fields the gateway reads or writes are modelled; unknown
//! response fields are ignored.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use vitrine_geometry::{AspectRatio, ImageBuffer, PNG_MIME};
use vitrine_workflow::GatewayError;

// ───────────────────────── generateContent ───────────────────────────

/// Body of a `generateContent` call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// A single user turn.
    pub contents: Vec<Content>,
    /// Present only when an image is expected back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// One conversation turn.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Content {
    /// Text and inline-data parts in order.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Either text or inline data.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Plain text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Base64 image data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

/// Encoded bytes with their MIME type.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// Declared type, e.g. `image/png`.
    pub mime_type: String,
    /// Standard base64.
    pub data: String,
}

/// Output settings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Requested output kinds.
    pub response_modalities: Vec<&'static str>,
}

/// Reply to a `generateContent` call.
#[derive(Debug, Deserialize, Default)]
pub struct GenerateContentResponse {
    /// Candidate replies; only their parts are read.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One candidate reply.
#[derive(Debug, Deserialize, Default)]
pub struct Candidate {
    /// Reply content.
    #[serde(default)]
    pub content: Content,
}

impl GenerateContentRequest {
    /// An image followed by an instruction.
    pub fn with_image(image: &ImageBuffer, instruction: &str, image_output: bool) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: image.mime_type().to_owned(),
                            data: STANDARD.encode(image.bytes()),
                        }),
                    },
                    Part {
                        text: Some(instruction.to_owned()),
                        inline_data: None,
                    },
                ],
            }],
            generation_config: image_output.then(|| GenerationConfig {
                response_modalities: vec!["IMAGE"],
            }),
        }
    }
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates.iter().flat_map(|c| c.content.parts.iter())
    }

    /// The first inline image of the response.
    pub fn into_image(self) -> Result<ImageBuffer, GatewayError> {
        let inline = self
            .parts()
            .find_map(|p| p.inline_data.as_ref())
            .ok_or_else(|| GatewayError::no_result("response contained no image"))?;
        decode_base64(&inline.data, &inline.mime_type)
    }

    /// All text parts joined.
    pub fn into_text(self) -> Result<String, GatewayError> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            Err(GatewayError::no_result("response contained no text"))
        } else {
            Ok(text)
        }
    }
}

// ──────────────────────────── predict ────────────────────────────────

/// Body of a `predict` call.
#[derive(Debug, Serialize)]
pub struct PredictRequest {
    /// Prompts to render; always one.
    pub instances: Vec<PredictInstance>,
    /// Sampling and output settings.
    pub parameters: PredictParameters,
}

/// One generation prompt.
#[derive(Debug, Serialize)]
pub struct PredictInstance {
    /// Prompt text.
    pub prompt: String,
}

/// Generation settings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictParameters {
    /// Number of images.
    pub sample_count: u32,
    /// `"w:h"`.
    pub aspect_ratio: String,
    /// Requested encoding.
    pub output_mime_type: &'static str,
}

/// Reply to a `predict` call.
#[derive(Debug, Deserialize, Default)]
pub struct PredictResponse {
    /// Generated images.
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

/// One generated image.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Standard base64 image bytes.
    pub bytes_base64_encoded: Option<String>,
    /// Declared type, if given.
    pub mime_type: Option<String>,
}

impl PredictRequest {
    /// A single PNG sample at `aspect_ratio`.
    pub fn single(prompt: &str, aspect_ratio: AspectRatio) -> Self {
        Self {
            instances: vec![PredictInstance {
                prompt: prompt.to_owned(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: aspect_ratio.to_string(),
                output_mime_type: PNG_MIME,
            },
        }
    }
}

impl PredictResponse {
    /// The first generated image.
    pub fn into_image(self) -> Result<ImageBuffer, GatewayError> {
        self.predictions
            .into_iter()
            .find_map(|p| p.bytes_base64_encoded.map(|data| (data, p.mime_type)))
            .ok_or_else(|| GatewayError::no_result("image generation returned no image"))
            .and_then(|(data, mime)| decode_base64(&data, mime.as_deref().unwrap_or(PNG_MIME)))
    }
}

fn decode_base64(data: &str, mime_type: &str) -> Result<ImageBuffer, GatewayError> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| GatewayError::unknown(format!("invalid base64 image data: {e}")))?;
    if bytes.is_empty() {
        return Err(GatewayError::no_result("image data was empty"));
    }
    Ok(ImageBuffer::new(bytes, mime_type))
}
