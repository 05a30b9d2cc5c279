//! Workflow configuration.

use serde::{Deserialize, Serialize};
use vitrine_geometry::OUTPUT_WIDTH;

use crate::error::WorkflowError;

/// Tunables for a [`Workflow`](crate::Workflow).
///
/// All fields have defaults, so a partial JSON object is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Width in pixels of every framed output.
    pub output_width: u32,

    /// Language the infographic text is written in; named in the overlay
    /// instruction so the model picks a font that can render it.
    pub overlay_language: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            output_width: OUTPUT_WIDTH,
            overlay_language: "Russian".to_owned(),
        }
    }
}

impl WorkflowConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidConfig`] if `output_width` is zero
    /// or `overlay_language` is blank.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.output_width == 0 {
            return Err(WorkflowError::InvalidConfig(
                "output_width must be at least 1".into(),
            ));
        }
        if self.overlay_language.trim().is_empty() {
            return Err(WorkflowError::InvalidConfig(
                "overlay_language must not be blank".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidConfig`] if the JSON is malformed
    /// or fails [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, WorkflowError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| WorkflowError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
