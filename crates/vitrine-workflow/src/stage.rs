//! Stage registry: the fixed, ordered list of edit stages.
//!
//! Each [`StageId`] is one phase of the edit pipeline with its own
//! parameter set. Stages are addressed by a 1-based position, matching
//! the step numbers shown to the user.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::ParamKey;

/// Identifier for an edit stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Step 1: aspect-ratio crop with zoom and pan.
    Frame,
    /// Step 2: background removal and replacement.
    Background,
    /// Step 3: shadow, auto-enhance, recolor, and advice.
    Enhance,
    /// Step 4: infographic overlay.
    Overlay,
}

impl StageId {
    /// All stages in pipeline order.
    pub const ALL: [Self; 4] = [Self::Frame, Self::Background, Self::Enhance, Self::Overlay];

    /// The first stage of every session.
    pub const FIRST: Self = Self::Frame;

    /// The terminal stage.
    pub const LAST: Self = Self::Overlay;

    /// 1-based position in the pipeline.
    #[must_use]
    pub const fn position(self) -> usize {
        match self {
            Self::Frame => 1,
            Self::Background => 2,
            Self::Enhance => 3,
            Self::Overlay => 4,
        }
    }

    /// Look up a stage by its 1-based position.
    ///
    /// Returns `None` for out-of-range positions.
    #[must_use]
    pub const fn from_position(position: usize) -> Option<Self> {
        match position {
            1 => Some(Self::Frame),
            2 => Some(Self::Background),
            3 => Some(Self::Enhance),
            4 => Some(Self::Overlay),
            _ => None,
        }
    }

    /// The following stage, or `None` at the last stage.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::from_position(self.position() + 1)
    }

    /// The preceding stage, or `None` at the first stage.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        Self::from_position(self.position() - 1)
    }

    /// Full display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Frame => "Size & crop",
            Self::Background => "Background",
            Self::Enhance => "Enhancements",
            Self::Overlay => "Infographic",
        }
    }

    /// Short label for compact step indicators.
    #[must_use]
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Frame => "Crop",
            Self::Background => "Bg",
            Self::Enhance => "Enh",
            Self::Overlay => "Info",
        }
    }

    /// Whether parameter edits recompute the preview immediately.
    ///
    /// Only framing is cheap enough (a local raster transform) to run on
    /// every slider tick; every other stage changes the preview only on an
    /// explicit action.
    #[must_use]
    pub const fn preview_eligible(self) -> bool {
        matches!(self, Self::Frame)
    }

    /// Parameters owned by this stage.
    #[must_use]
    pub const fn parameter_keys(self) -> &'static [ParamKey] {
        match self {
            Self::Frame => &[
                ParamKey::AspectRatio,
                ParamKey::Zoom,
                ParamKey::PanX,
                ParamKey::PanY,
            ],
            Self::Background => &[
                ParamKey::BackgroundPrompt,
                ParamKey::Integration,
                ParamKey::ProductScale,
            ],
            Self::Enhance => &[ParamKey::ColorPrompt],
            Self::Overlay => &[
                ParamKey::FeatureText,
                ParamKey::FeaturePlacement,
                ParamKey::Font,
                ParamKey::FontSize,
                ParamKey::OverlayStyle,
            ],
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
