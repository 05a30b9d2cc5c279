//! Contract for the external generative model.
//!
//! The workflow treats the model as an opaque asynchronous collaborator.
//! Implementations own transport, authentication, and timeouts.

use async_trait::async_trait;
use vitrine_geometry::{AspectRatio, ImageBuffer};

/// Coarse failure classes the presentation layer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayErrorKind {
    /// Quota or rate limit exceeded.
    RateLimited,
    /// The call succeeded but produced no usable result.
    NoResult,
    /// Any other failure.
    Unknown,
}

/// A failed gateway call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {detail}")]
pub struct GatewayError {
    /// Failure class.
    pub kind: GatewayErrorKind,
    /// Free-form diagnostic text, never shown verbatim to the user.
    pub detail: String,
}

impl GatewayError {
    /// Build an error of `kind` with `detail`.
    pub fn new(kind: GatewayErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Shorthand for a [`GatewayErrorKind::RateLimited`] error.
    pub fn rate_limited(detail: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::RateLimited, detail)
    }

    /// Shorthand for a [`GatewayErrorKind::NoResult`] error.
    pub fn no_result(detail: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::NoResult, detail)
    }

    /// Shorthand for a [`GatewayErrorKind::Unknown`] error.
    pub fn unknown(detail: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Unknown, detail)
    }
}

/// An instruction-driven image model.
#[async_trait]
pub trait EditGateway: Send + Sync {
    /// Apply `instruction` to `image` and return the edited image.
    async fn edit(&self, image: &ImageBuffer, instruction: &str)
    -> Result<ImageBuffer, GatewayError>;

    /// Answer `instruction` about `image` in free text.
    async fn analyze(&self, image: &ImageBuffer, instruction: &str) -> Result<String, GatewayError>;

    /// Create a new image from `instruction` at `aspect_ratio`.
    async fn generate(
        &self,
        instruction: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<ImageBuffer, GatewayError>;
}
