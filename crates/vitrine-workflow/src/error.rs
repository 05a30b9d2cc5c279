//! Workflow errors and the user-facing error record.

use std::fmt;

use serde::Serialize;
use vitrine_geometry::GeometryError;

use crate::gateway::{GatewayError, GatewayErrorKind};
use crate::params::ParamKey;
use crate::stage::StageId;

/// Errors returned by workflow operations.
///
/// Geometry and gateway failures of a running job never escape the
/// controller; they are recorded as a [`LastError`]. The remaining
/// variants are precondition violations returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// A raster transform failed.
    #[error("image processing failed: {0}")]
    Geometry(#[from] GeometryError),

    /// The external model failed.
    #[error("edit service failed: {0}")]
    Gateway(#[from] GatewayError),

    /// Navigation to a stage that is not adjacent to the active one.
    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        /// Active stage.
        from: StageId,
        /// Requested stage.
        to: StageId,
    },

    /// A parameter update for a stage other than the active one.
    #[error("parameter {key} belongs to {owner}, active stage is {active}")]
    ParameterNotOwned {
        /// Parameter updated.
        key: ParamKey,
        /// Stage that owns it.
        owner: StageId,
        /// Active stage.
        active: StageId,
    },

    /// A parameter value that cannot be applied.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An action needs input that has not been provided.
    #[error("missing input: {0}")]
    MissingInput(&'static str),

    /// An action was requested on a stage that does not offer it.
    #[error("{action} is not available on {stage}")]
    ActionUnavailable {
        /// Requested action.
        action: &'static str,
        /// Active stage.
        stage: StageId,
    },

    /// The uploaded buffer is not an image.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// No session is open.
    #[error("no session is open")]
    NoSession,

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse class of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The model quota is exhausted.
    RateLimited,
    /// Any other model failure, including an empty result.
    Gateway,
    /// A local raster transform failed.
    Render,
    /// The request itself was unusable.
    Input,
}

const RATE_LIMITED_MESSAGE: &str = "You have exceeded the API usage quota. Check your plan and \
     billing details. More: ai.google.dev/gemini-api/docs/rate-limits";

const GATEWAY_MESSAGE: &str = "The AI service returned an error. Please try again.";

/// The failure the presentation layer shows next to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastError {
    /// Failure class.
    pub class: ErrorClass,
    /// Human-readable message.
    pub message: String,
}

impl LastError {
    /// Whether the failure was a quota rejection.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.class == ErrorClass::RateLimited
    }

    /// Classify a gateway failure.
    #[must_use]
    pub fn from_gateway(err: &GatewayError) -> Self {
        match err.kind {
            GatewayErrorKind::RateLimited => Self {
                class: ErrorClass::RateLimited,
                message: RATE_LIMITED_MESSAGE.to_owned(),
            },
            GatewayErrorKind::NoResult | GatewayErrorKind::Unknown => Self {
                class: ErrorClass::Gateway,
                message: GATEWAY_MESSAGE.to_owned(),
            },
        }
    }

    /// Classify a raster failure.
    #[must_use]
    pub fn from_geometry(err: &GeometryError) -> Self {
        let class = match err {
            GeometryError::EmptyInput | GeometryError::Decode(_) => ErrorClass::Input,
            _ => ErrorClass::Render,
        };
        Self {
            class,
            message: format!("Image processing failed: {err}"),
        }
    }
}

impl From<&WorkflowError> for LastError {
    fn from(err: &WorkflowError) -> Self {
        match err {
            WorkflowError::Gateway(e) => Self::from_gateway(e),
            WorkflowError::Geometry(e) => Self::from_geometry(e),
            other => Self {
                class: ErrorClass::Input,
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for LastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_are_flagged_with_quota_message() {
        let err = LastError::from_gateway(&GatewayError::rate_limited("429"));
        assert!(err.is_rate_limited());
        assert!(err.message.contains("quota"));
        assert!(err.message.contains("ai.google.dev/gemini-api/docs/rate-limits"));
    }

    #[test]
    fn no_result_and_unknown_share_the_generic_message() {
        let a = LastError::from_gateway(&GatewayError::no_result("empty"));
        let b = LastError::from_gateway(&GatewayError::unknown("boom"));
        assert_eq!(a, b);
        assert_eq!(a.class, ErrorClass::Gateway);
        assert!(!a.is_rate_limited());
    }

    #[test]
    fn geometry_failures_map_to_render_or_input() {
        let render = LastError::from_geometry(&GeometryError::RenderTargetUnavailable {
            width: 0,
            height: 0,
        });
        assert_eq!(render.class, ErrorClass::Render);
        assert_eq!(
            LastError::from_geometry(&GeometryError::EmptyInput).class,
            ErrorClass::Input
        );
    }

    #[test]
    fn workflow_errors_convert() {
        let err = WorkflowError::from(GatewayError::rate_limited("quota"));
        assert!(LastError::from(&err).is_rate_limited());
        let err = WorkflowError::MissingInput("background prompt");
        assert_eq!(LastError::from(&err).class, ErrorClass::Input);
    }
}
