//! Per-stage transient parameters.
//!
//! Parameters live in a tagged union selected by the active stage and are
//! rebuilt from [`StageParams::defaults_for`] on every stage transition.
//! Individual edits arrive as typed [`ParamUpdate`]s.

use std::fmt;

use serde::{Deserialize, Serialize};
use vitrine_geometry::AspectRatio;

use crate::error::WorkflowError;
use crate::stage::StageId;

/// Zoom slider range for framing.
pub const ZOOM_RANGE: (f64, f64) = (1.0, 2.0);

/// Pan slider range for framing, per axis.
pub const PAN_RANGE: (f64, f64) = (-1.0, 1.0);

/// Product scale slider range for an armed cutout.
pub const PRODUCT_SCALE_RANGE: (f64, f64) = (0.5, 1.5);

/// Number of infographic feature slots.
pub const FEATURE_SLOTS: usize = 3;

// ───────────────────────────── Frame ─────────────────────────────────

/// Parameters of the framing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameParams {
    /// Selected target ratio; no preview is computed until one is chosen.
    pub aspect_ratio: Option<AspectRatio>,
    /// User zoom on top of the cover scale, in [`ZOOM_RANGE`].
    pub zoom: f64,
    /// Horizontal pan in [`PAN_RANGE`].
    pub pan_x: f64,
    /// Vertical pan in [`PAN_RANGE`].
    pub pan_y: f64,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            aspect_ratio: None,
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

// ─────────────────────────── Background ──────────────────────────────

/// How freely the model may adjust the product when compositing it onto
/// a new background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integration {
    /// Slight scaling and rotation allowed.
    #[default]
    Flexible,
    /// Scaling allowed, no rotation or appearance changes.
    ScaleOnly,
    /// Product placed exactly as is.
    Strict,
}

/// Parameters of the background stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundParams {
    /// Description of the replacement background.
    pub prompt: String,
    /// Integration mode for background replacement.
    pub integration: Integration,
    /// Scale of an armed cutout, in [`PRODUCT_SCALE_RANGE`].
    pub product_scale: f64,
}

impl Default for BackgroundParams {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            integration: Integration::default(),
            product_scale: 1.0,
        }
    }
}

// ──────────────────────────── Enhance ────────────────────────────────

/// Parameters of the enhancement stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhanceParams {
    /// Target product color for a recolor, e.g. "bright red".
    pub color_prompt: String,
}

// ──────────────────────────── Overlay ────────────────────────────────

/// Requested placement of an infographic feature block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Let the model choose a balanced spot.
    #[default]
    Auto,
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Placement {
    /// All placements in menu order.
    pub const ALL: [Self; 9] = [
        Self::Auto,
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::CenterLeft,
        Self::CenterRight,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    /// Label used in instructions and menus.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::TopLeft => "top-left",
            Self::TopCenter => "top-center",
            Self::TopRight => "top-right",
            Self::CenterLeft => "center-left",
            Self::CenterRight => "center-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
        }
    }
}

/// Font family hint for infographic text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Font {
    #[default]
    Arial,
    Verdana,
    Georgia,
    TimesNewRoman,
    CourierNew,
}

impl Font {
    /// Family name as written in instructions.
    #[must_use]
    pub const fn family(self) -> &'static str {
        match self {
            Self::Arial => "Arial",
            Self::Verdana => "Verdana",
            Self::Georgia => "Georgia",
            Self::TimesNewRoman => "Times New Roman",
            Self::CourierNew => "Courier New",
        }
    }
}

/// Relative text size for infographic blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    /// Lowercase name as written in instructions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// Overall visual style of the infographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayStyle {
    #[default]
    Minimalist,
    Modern,
    Creative,
    Stylish,
}

impl OverlayStyle {
    /// Lowercase name as written in instructions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Minimalist => "minimalist",
            Self::Modern => "modern",
            Self::Creative => "creative",
            Self::Stylish => "stylish",
        }
    }
}

/// One key feature to render as an infographic block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Text exactly as it should appear.
    pub text: String,
    /// Requested placement.
    pub placement: Placement,
}

impl Feature {
    /// A feature with only whitespace text is ignored.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Parameters of the overlay stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayParams {
    /// Feature slots; blank slots are skipped.
    pub features: [Feature; FEATURE_SLOTS],
    /// Font family hint.
    pub font: Font,
    /// Relative text size.
    pub font_size: FontSize,
    /// Overall style.
    pub style: OverlayStyle,
}

impl OverlayParams {
    /// Non-blank features in slot order.
    pub fn filled_features(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(|f| !f.is_blank())
    }
}

// ─────────────────────────── StageParams ─────────────────────────────

/// The active stage's parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageParams {
    Frame(FrameParams),
    Background(BackgroundParams),
    Enhance(EnhanceParams),
    Overlay(OverlayParams),
}

impl StageParams {
    /// Fresh defaults for `stage`.
    #[must_use]
    pub fn defaults_for(stage: StageId) -> Self {
        match stage {
            StageId::Frame => Self::Frame(FrameParams::default()),
            StageId::Background => Self::Background(BackgroundParams::default()),
            StageId::Enhance => Self::Enhance(EnhanceParams::default()),
            StageId::Overlay => Self::Overlay(OverlayParams::default()),
        }
    }

    /// The stage these parameters belong to.
    #[must_use]
    pub const fn stage(&self) -> StageId {
        match self {
            Self::Frame(_) => StageId::Frame,
            Self::Background(_) => StageId::Background,
            Self::Enhance(_) => StageId::Enhance,
            Self::Overlay(_) => StageId::Overlay,
        }
    }

    /// Framing parameters, if this is the framing stage.
    #[must_use]
    pub const fn as_frame(&self) -> Option<&FrameParams> {
        match self {
            Self::Frame(p) => Some(p),
            _ => None,
        }
    }

    /// Background parameters, if this is the background stage.
    #[must_use]
    pub const fn as_background(&self) -> Option<&BackgroundParams> {
        match self {
            Self::Background(p) => Some(p),
            _ => None,
        }
    }

    /// Enhancement parameters, if this is the enhancement stage.
    #[must_use]
    pub const fn as_enhance(&self) -> Option<&EnhanceParams> {
        match self {
            Self::Enhance(p) => Some(p),
            _ => None,
        }
    }

    /// Overlay parameters, if this is the overlay stage.
    #[must_use]
    pub const fn as_overlay(&self) -> Option<&OverlayParams> {
        match self {
            Self::Overlay(p) => Some(p),
            _ => None,
        }
    }

    /// Apply a single update.
    ///
    /// Numeric values are clamped to their slider ranges. Choosing an
    /// aspect ratio resets zoom and pan, so every ratio starts centered.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ParameterNotOwned`] if the key belongs to
    /// another stage, and [`WorkflowError::InvalidParameter`] for
    /// non-finite numbers or an out-of-range feature slot. The parameters
    /// are unchanged on error.
    pub fn apply(&mut self, update: ParamUpdate) -> Result<(), WorkflowError> {
        let key = update.key();
        let active = self.stage();
        if key.owner() != active {
            return Err(WorkflowError::ParameterNotOwned {
                key,
                owner: key.owner(),
                active,
            });
        }

        match (self, update) {
            (Self::Frame(p), ParamUpdate::AspectRatio(ratio)) => {
                *p = FrameParams {
                    aspect_ratio: Some(ratio),
                    ..FrameParams::default()
                };
            }
            (Self::Frame(p), ParamUpdate::Zoom(v)) => p.zoom = clamp(key, v, ZOOM_RANGE)?,
            (Self::Frame(p), ParamUpdate::PanX(v)) => p.pan_x = clamp(key, v, PAN_RANGE)?,
            (Self::Frame(p), ParamUpdate::PanY(v)) => p.pan_y = clamp(key, v, PAN_RANGE)?,
            (Self::Background(p), ParamUpdate::BackgroundPrompt(s)) => p.prompt = s,
            (Self::Background(p), ParamUpdate::Integration(i)) => p.integration = i,
            (Self::Background(p), ParamUpdate::ProductScale(v)) => {
                p.product_scale = clamp(key, v, PRODUCT_SCALE_RANGE)?;
            }
            (Self::Enhance(p), ParamUpdate::ColorPrompt(s)) => p.color_prompt = s,
            (Self::Overlay(p), ParamUpdate::FeatureText { slot, text }) => {
                feature_slot(&mut p.features, slot)?.text = text;
            }
            (Self::Overlay(p), ParamUpdate::FeaturePlacement { slot, placement }) => {
                feature_slot(&mut p.features, slot)?.placement = placement;
            }
            (Self::Overlay(p), ParamUpdate::Font(f)) => p.font = f,
            (Self::Overlay(p), ParamUpdate::FontSize(s)) => p.font_size = s,
            (Self::Overlay(p), ParamUpdate::OverlayStyle(s)) => p.style = s,
            // Ownership was checked above, so every remaining pairing is
            // a key of another stage.
            (_, update) => {
                return Err(WorkflowError::ParameterNotOwned {
                    key: update.key(),
                    owner: update.key().owner(),
                    active,
                });
            }
        }
        Ok(())
    }
}

fn clamp(key: ParamKey, value: f64, (lo, hi): (f64, f64)) -> Result<f64, WorkflowError> {
    if value.is_finite() {
        Ok(value.clamp(lo, hi))
    } else {
        Err(WorkflowError::InvalidParameter(format!(
            "{key} must be finite, got {value}"
        )))
    }
}

fn feature_slot(
    features: &mut [Feature; FEATURE_SLOTS],
    slot: usize,
) -> Result<&mut Feature, WorkflowError> {
    features.get_mut(slot).ok_or_else(|| {
        WorkflowError::InvalidParameter(format!(
            "feature slot {slot} out of range (0..{FEATURE_SLOTS})"
        ))
    })
}

// ──────────────────────────── Updates ────────────────────────────────

/// Name of a stage parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKey {
    AspectRatio,
    Zoom,
    PanX,
    PanY,
    BackgroundPrompt,
    Integration,
    ProductScale,
    ColorPrompt,
    FeatureText,
    FeaturePlacement,
    Font,
    FontSize,
    OverlayStyle,
}

impl ParamKey {
    /// The stage that owns this parameter.
    #[must_use]
    pub const fn owner(self) -> StageId {
        match self {
            Self::AspectRatio | Self::Zoom | Self::PanX | Self::PanY => StageId::Frame,
            Self::BackgroundPrompt | Self::Integration | Self::ProductScale => StageId::Background,
            Self::ColorPrompt => StageId::Enhance,
            Self::FeatureText
            | Self::FeaturePlacement
            | Self::Font
            | Self::FontSize
            | Self::OverlayStyle => StageId::Overlay,
        }
    }

    /// Snake-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AspectRatio => "aspect_ratio",
            Self::Zoom => "zoom",
            Self::PanX => "pan_x",
            Self::PanY => "pan_y",
            Self::BackgroundPrompt => "background_prompt",
            Self::Integration => "integration",
            Self::ProductScale => "product_scale",
            Self::ColorPrompt => "color_prompt",
            Self::FeatureText => "feature_text",
            Self::FeaturePlacement => "feature_placement",
            Self::Font => "font",
            Self::FontSize => "font_size",
            Self::OverlayStyle => "overlay_style",
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single key/value change to the active stage's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum ParamUpdate {
    AspectRatio(AspectRatio),
    Zoom(f64),
    PanX(f64),
    PanY(f64),
    BackgroundPrompt(String),
    Integration(Integration),
    ProductScale(f64),
    ColorPrompt(String),
    FeatureText { slot: usize, text: String },
    FeaturePlacement { slot: usize, placement: Placement },
    Font(Font),
    FontSize(FontSize),
    OverlayStyle(OverlayStyle),
}

impl ParamUpdate {
    /// The parameter this update targets.
    #[must_use]
    pub const fn key(&self) -> ParamKey {
        match self {
            Self::AspectRatio(_) => ParamKey::AspectRatio,
            Self::Zoom(_) => ParamKey::Zoom,
            Self::PanX(_) => ParamKey::PanX,
            Self::PanY(_) => ParamKey::PanY,
            Self::BackgroundPrompt(_) => ParamKey::BackgroundPrompt,
            Self::Integration(_) => ParamKey::Integration,
            Self::ProductScale(_) => ParamKey::ProductScale,
            Self::ColorPrompt(_) => ParamKey::ColorPrompt,
            Self::FeatureText { .. } => ParamKey::FeatureText,
            Self::FeaturePlacement { .. } => ParamKey::FeaturePlacement,
            Self::Font(_) => ParamKey::Font,
            Self::FontSize(_) => ParamKey::FontSize,
            Self::OverlayStyle(_) => ParamKey::OverlayStyle,
        }
    }
}
