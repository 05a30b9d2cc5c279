//! The staged edit state machine (sans-IO).
//!
//! [`Workflow`] owns all session state and never performs I/O. Operations
//! that need computation return a job describing the work; the caller
//! runs it (locally for [`PreviewJob`], against an
//! [`EditGateway`](crate::EditGateway) for [`EditJob`] and
//! [`AdvisoryJob`]) and hands the result back to the matching `resolve_*`
//! method. Results are applied only if their ticket is still the latest
//! for its slot, so late results after a newer request or a stage change
//! are dropped.

use tracing::{debug, info, warn};
use vitrine_geometry::{
    AspectRatio, GeometryError, ImageBuffer, cover_fit_crop_to_width, scale_and_recenter, to_png,
};

use crate::config::WorkflowConfig;
use crate::error::{LastError, WorkflowError};
use crate::gateway::GatewayError;
use crate::history::History;
use crate::instruction;
use crate::params::{ParamKey, ParamUpdate, StageParams};
use crate::request::{Freshness, RequestSlot, SlotKind, Ticket};
use crate::stage::StageId;

/// Whether a background-removed image is available for rescaling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cutout {
    /// No cutout on this stage.
    #[default]
    Unarmed,
    /// The product on a transparent background, as returned by the model.
    Armed(ImageBuffer),
}

impl Cutout {
    /// Whether a cutout is armed.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(self, Self::Armed(_))
    }

    /// The armed cutout, if any.
    #[must_use]
    pub const fn image(&self) -> Option<&ImageBuffer> {
        match self {
            Self::Armed(image) => Some(image),
            Self::Unarmed => None,
        }
    }
}

/// What happened to a job's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The result was written to its slot.
    Applied,
    /// A newer request or a stage change superseded the job.
    Stale,
    /// The job failed; the failure is in [`Workflow::last_error`].
    Failed,
}

// ─────────────────────────────── Jobs ────────────────────────────────

/// A local raster transform that replaces the preview.
#[derive(Debug, Clone)]
pub enum PreviewJob {
    /// Cover-fit crop of the stage's committed input.
    Frame {
        ticket: Ticket,
        image: ImageBuffer,
        output_width: u32,
        aspect_ratio: AspectRatio,
        zoom: f64,
        pan_x: f64,
        pan_y: f64,
    },
    /// Scale-and-recenter of the armed cutout.
    Recenter {
        ticket: Ticket,
        cutout: ImageBuffer,
        scale: f64,
    },
}

impl PreviewJob {
    /// Supersession tag.
    #[must_use]
    pub const fn ticket(&self) -> Ticket {
        match self {
            Self::Frame { ticket, .. } | Self::Recenter { ticket, .. } => *ticket,
        }
    }

    /// Run the transform.
    ///
    /// # Errors
    ///
    /// Propagates the [`GeometryError`] of the transform.
    pub fn run(&self) -> Result<ImageBuffer, GeometryError> {
        match self {
            Self::Frame {
                image,
                output_width,
                aspect_ratio,
                zoom,
                pan_x,
                pan_y,
                ..
            } => cover_fit_crop_to_width(image, *output_width, *aspect_ratio, *zoom, *pan_x, *pan_y),
            Self::Recenter { cutout, scale, .. } => scale_and_recenter(cutout, *scale),
        }
    }
}

/// What a successful edit does besides replacing the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPurpose {
    /// Preview replacement only.
    Generic,
    /// Arms the result as the stage cutout.
    RemoveBackground,
    /// Disarms the cutout.
    ReplaceBackground,
    /// Marks the overlay as applied.
    Overlay,
}

/// An instruction-driven edit for the gateway.
#[derive(Debug, Clone)]
pub struct EditJob {
    /// Supersession tag.
    pub ticket: Ticket,
    /// Image to edit.
    pub source: ImageBuffer,
    /// Instruction text.
    pub instruction: String,
    /// Side effects on success.
    pub purpose: EditPurpose,
}

/// A free-text analysis request for the gateway.
#[derive(Debug, Clone)]
pub struct AdvisoryJob {
    /// Supersession tag.
    pub ticket: Ticket,
    /// Image to analyze.
    pub source: ImageBuffer,
    /// Instruction text.
    pub instruction: String,
}

// ───────────────────────────── Workflow ──────────────────────────────

/// State of one editing session.
#[derive(Debug, Clone)]
pub struct Workflow {
    config: WorkflowConfig,
    active: StageId,
    history: History,
    preview: ImageBuffer,
    params: StageParams,
    cutout: Cutout,
    overlay_applied: bool,
    last_error: Option<LastError>,
    advisory: Option<String>,
    preview_slot: RequestSlot,
    advisory_slot: RequestSlot,
    preview_status: Option<&'static str>,
    advisory_status: Option<&'static str>,
}

impl Workflow {
    /// Start a session on `source` at the first stage.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidConfig`] if `config` is invalid,
    /// [`WorkflowError::UnsupportedMediaType`] if the buffer is not
    /// declared as an image, and [`WorkflowError::MissingInput`] if it is
    /// empty.
    pub fn new(source: ImageBuffer, config: WorkflowConfig) -> Result<Self, WorkflowError> {
        config.validate()?;
        if !source.mime_type().starts_with("image/") {
            return Err(WorkflowError::UnsupportedMediaType(
                source.mime_type().to_owned(),
            ));
        }
        if source.is_empty() {
            return Err(WorkflowError::MissingInput("source image"));
        }
        info!(bytes = source.len(), mime = source.mime_type(), "session started");

        Ok(Self {
            config,
            active: StageId::FIRST,
            preview: source.clone(),
            history: History::new(source),
            params: StageParams::defaults_for(StageId::FIRST),
            cutout: Cutout::Unarmed,
            overlay_applied: false,
            last_error: None,
            advisory: None,
            preview_slot: RequestSlot::new(SlotKind::Preview),
            advisory_slot: RequestSlot::new(SlotKind::Advisory),
            preview_status: None,
            advisory_status: None,
        })
    }

    // ── Observation ──────────────────────────────────────────────────

    /// The active stage.
    #[must_use]
    pub const fn active_stage(&self) -> StageId {
        self.active
    }

    /// Committed stage outputs.
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// The image currently shown for the active stage.
    #[must_use]
    pub const fn preview(&self) -> &ImageBuffer {
        &self.preview
    }

    /// The active stage's parameters.
    #[must_use]
    pub const fn params(&self) -> &StageParams {
        &self.params
    }

    /// Cutout state of the background stage.
    #[must_use]
    pub const fn cutout(&self) -> &Cutout {
        &self.cutout
    }

    /// Whether an overlay has been applied on this visit to the overlay
    /// stage.
    #[must_use]
    pub const fn is_overlay_applied(&self) -> bool {
        self.overlay_applied
    }

    /// Whether a regenerate request would be accepted.
    #[must_use]
    pub const fn can_regenerate_overlay(&self) -> bool {
        matches!(self.active, StageId::Overlay) && self.overlay_applied
    }

    /// The most recent failure, cleared by the next request or navigation.
    #[must_use]
    pub const fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    /// The latest advisory text for this stage visit.
    #[must_use]
    pub fn advisory(&self) -> Option<&str> {
        self.advisory.as_deref()
    }

    /// Whether any request is outstanding.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.preview_slot.is_busy() || self.advisory_slot.is_busy()
    }

    /// Status line for the outstanding request, if any.
    #[must_use]
    pub const fn status_message(&self) -> Option<&'static str> {
        if self.preview_slot.is_busy() {
            self.preview_status
        } else if self.advisory_slot.is_busy() {
            self.advisory_status
        } else {
            None
        }
    }

    /// Whether the active stage is the last one, so the preview is the
    /// final artifact.
    #[must_use]
    pub const fn is_final_stage(&self) -> bool {
        matches!(self.active, StageId::LAST)
    }

    /// The configuration this session runs with.
    #[must_use]
    pub const fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// The committed input of the active stage.
    #[must_use]
    pub fn committed_input(&self) -> &ImageBuffer {
        self.history
            .input_of(self.active)
            .unwrap_or_else(|| self.history.source())
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Commit the preview and move to `next`, which must directly follow
    /// the active stage.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] without changing any
    /// state if `next` is not the following stage.
    pub fn advance_to_stage(&mut self, next: StageId) -> Result<(), WorkflowError> {
        if self.active.next() != Some(next) {
            return Err(WorkflowError::InvalidTransition {
                from: self.active,
                to: next,
            });
        }
        self.history.commit(self.active, self.preview.clone());
        info!(
            stage = %self.active,
            bytes = self.preview.len(),
            mime = self.preview.mime_type(),
            "committed stage output"
        );
        self.enter(next);
        Ok(())
    }

    /// Return to `previous`, which must directly precede the active
    /// stage. History is not changed.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] without changing any
    /// state if `previous` is not the preceding stage.
    pub fn retreat_to_stage(&mut self, previous: StageId) -> Result<(), WorkflowError> {
        if self.active.previous() != Some(previous) {
            return Err(WorkflowError::InvalidTransition {
                from: self.active,
                to: previous,
            });
        }
        self.enter(previous);
        Ok(())
    }

    fn enter(&mut self, stage: StageId) {
        info!(from = %self.active, to = %stage, "entering stage");
        self.active = stage;
        self.params = StageParams::defaults_for(stage);
        self.cutout = Cutout::Unarmed;
        self.overlay_applied = false;
        self.advisory = None;
        self.last_error = None;
        self.preview_slot.invalidate();
        self.advisory_slot.invalidate();
        self.preview_status = None;
        self.advisory_status = None;
        self.preview = self.committed_input().clone();
    }

    // ── Parameters ───────────────────────────────────────────────────

    /// Apply `update` to the active stage's parameters.
    ///
    /// Returns a [`PreviewJob`] when the change should recompute the
    /// preview: any framing change once an aspect ratio is selected, and
    /// a product scale change while a cutout is armed.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ParameterNotOwned`] or
    /// [`WorkflowError::InvalidParameter`] and records it as the last
    /// error; parameters are unchanged.
    pub fn update_stage_parameter(
        &mut self,
        update: ParamUpdate,
    ) -> Result<Option<PreviewJob>, WorkflowError> {
        let key = update.key();
        if let Err(err) = self.params.apply(update) {
            warn!(%key, stage = %self.active, error = %err, "parameter rejected");
            self.last_error = Some(LastError::from(&err));
            return Err(err);
        }

        let job = match self.params.clone() {
            StageParams::Frame(p) => p.aspect_ratio.map(|aspect_ratio| {
                let ticket = self.issue_preview("Updating preview...");
                PreviewJob::Frame {
                    ticket,
                    image: self.committed_input().clone(),
                    output_width: self.config.output_width,
                    aspect_ratio,
                    zoom: p.zoom,
                    pan_x: p.pan_x,
                    pan_y: p.pan_y,
                }
            }),
            StageParams::Background(p) if key == ParamKey::ProductScale => {
                self.cutout.image().cloned().map(|cutout| {
                    let ticket = self.issue_preview("Scaling product...");
                    PreviewJob::Recenter {
                        ticket,
                        cutout,
                        scale: p.product_scale,
                    }
                })
            }
            _ => None,
        };
        if let Some(job) = &job {
            self.last_error = None;
            debug!(%key, generation = job.ticket().generation, "preview job issued");
        }
        Ok(job)
    }

    /// Apply the result of a [`PreviewJob`].
    pub fn resolve_preview(
        &mut self,
        job: &PreviewJob,
        result: Result<ImageBuffer, GeometryError>,
    ) -> Outcome {
        let ticket = job.ticket();
        if self.preview_slot.resolve(ticket) == Freshness::Stale {
            warn!(generation = ticket.generation, "dropping stale preview");
            return Outcome::Stale;
        }
        match result {
            Ok(image) => {
                debug!(
                    generation = ticket.generation,
                    bytes = image.len(),
                    "preview updated"
                );
                self.preview = image;
                Outcome::Applied
            }
            Err(err) => {
                warn!(generation = ticket.generation, error = %err, "preview transform failed");
                self.last_error = Some(LastError::from_geometry(&err));
                Outcome::Failed
            }
        }
    }

    // ── External edits ───────────────────────────────────────────────

    /// Begin an instruction-driven edit of `source_override`, or of the
    /// preview when `None`. A successful result replaces the preview
    /// without committing it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::MissingInput`] for a blank instruction.
    pub fn request_external_edit(
        &mut self,
        instruction: &str,
        source_override: Option<ImageBuffer>,
    ) -> Result<EditJob, WorkflowError> {
        self.begin_edit(
            instruction.to_owned(),
            source_override,
            EditPurpose::Generic,
            "Editing image...",
        )
    }

    fn begin_edit(
        &mut self,
        instruction: String,
        source_override: Option<ImageBuffer>,
        purpose: EditPurpose,
        status: &'static str,
    ) -> Result<EditJob, WorkflowError> {
        if instruction.trim().is_empty() {
            return Err(WorkflowError::MissingInput("instruction"));
        }
        self.last_error = None;
        let source = source_override.unwrap_or_else(|| self.preview.clone());
        let ticket = self.issue_preview(status);
        debug!(
            ?purpose,
            generation = ticket.generation,
            bytes = source.len(),
            mime = source.mime_type(),
            "edit job issued"
        );
        Ok(EditJob {
            ticket,
            source,
            instruction,
            purpose,
        })
    }

    /// Apply the result of an [`EditJob`].
    pub fn resolve_edit(
        &mut self,
        job: &EditJob,
        result: Result<ImageBuffer, GatewayError>,
    ) -> Outcome {
        if self.preview_slot.resolve(job.ticket) == Freshness::Stale {
            warn!(generation = job.ticket.generation, "dropping stale edit");
            return Outcome::Stale;
        }
        let image = match result {
            Ok(image) => image,
            Err(err) => {
                warn!(
                    generation = job.ticket.generation,
                    kind = ?err.kind,
                    detail = %err.detail,
                    "edit failed"
                );
                self.last_error = Some(LastError::from_gateway(&err));
                return Outcome::Failed;
            }
        };

        match job.purpose {
            EditPurpose::Generic => {}
            EditPurpose::RemoveBackground => {
                self.cutout = Cutout::Armed(image.clone());
                if let StageParams::Background(p) = &mut self.params {
                    p.product_scale = 1.0;
                }
            }
            EditPurpose::ReplaceBackground => self.cutout = Cutout::Unarmed,
            EditPurpose::Overlay => self.overlay_applied = true,
        }
        debug!(
            purpose = ?job.purpose,
            generation = job.ticket.generation,
            bytes = image.len(),
            "edit applied"
        );
        self.preview = image;
        Outcome::Applied
    }

    /// Begin a free-text analysis of the preview.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::MissingInput`] for a blank instruction.
    pub fn request_advisory(&mut self, instruction: &str) -> Result<AdvisoryJob, WorkflowError> {
        if instruction.trim().is_empty() {
            return Err(WorkflowError::MissingInput("instruction"));
        }
        self.last_error = None;
        let ticket = self.advisory_slot.issue();
        self.advisory_status = Some("Analyzing image...");
        debug!(generation = ticket.generation, "advisory job issued");
        Ok(AdvisoryJob {
            ticket,
            source: self.preview.clone(),
            instruction: instruction.to_owned(),
        })
    }

    /// Apply the result of an [`AdvisoryJob`].
    pub fn resolve_advisory(
        &mut self,
        job: &AdvisoryJob,
        result: Result<String, GatewayError>,
    ) -> Outcome {
        if self.advisory_slot.resolve(job.ticket) == Freshness::Stale {
            warn!(generation = job.ticket.generation, "dropping stale advisory");
            return Outcome::Stale;
        }
        match result {
            Ok(text) => {
                self.advisory = Some(text);
                Outcome::Applied
            }
            Err(err) => {
                warn!(kind = ?err.kind, detail = %err.detail, "advisory failed");
                self.last_error = Some(LastError::from_gateway(&err));
                Outcome::Failed
            }
        }
    }

    fn issue_preview(&mut self, status: &'static str) -> Ticket {
        self.preview_status = Some(status);
        self.preview_slot.issue()
    }

    // ── Stage actions ────────────────────────────────────────────────

    fn require_stage(&self, stage: StageId, action: &'static str) -> Result<(), WorkflowError> {
        if self.active == stage {
            Ok(())
        } else {
            Err(WorkflowError::ActionUnavailable {
                action,
                stage: self.active,
            })
        }
    }

    /// Remove the background of the committed input. On success the
    /// result is armed as the cutout and the product scale resets.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ActionUnavailable`] outside the
    /// background stage.
    pub fn remove_background(&mut self) -> Result<EditJob, WorkflowError> {
        self.require_stage(StageId::Background, "remove background")?;
        let source = self.committed_input().clone();
        self.begin_edit(
            instruction::REMOVE_BACKGROUND.to_owned(),
            Some(source),
            EditPurpose::RemoveBackground,
            "Removing background...",
        )
    }

    /// Place the product on the described background.
    ///
    /// With a cutout armed the current (possibly rescaled) preview is
    /// sent; otherwise the committed input. On success the cutout is
    /// disarmed.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ActionUnavailable`] outside the
    /// background stage and [`WorkflowError::MissingInput`] when the
    /// background prompt is blank.
    pub fn replace_background(&mut self) -> Result<EditJob, WorkflowError> {
        self.require_stage(StageId::Background, "replace background")?;
        let Some(p) = self.params.as_background() else {
            return Err(WorkflowError::MissingInput("background prompt"));
        };
        if p.prompt.trim().is_empty() {
            return Err(WorkflowError::MissingInput("background prompt"));
        }
        let armed = self.cutout.is_armed();
        let text = instruction::replace_background(&p.prompt, p.integration, armed);
        let source = if armed {
            self.preview.clone()
        } else {
            self.committed_input().clone()
        };
        self.begin_edit(
            text,
            Some(source),
            EditPurpose::ReplaceBackground,
            "Replacing background...",
        )
    }

    /// Add a soft shadow under the product.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ActionUnavailable`] outside the
    /// enhancement stage.
    pub fn add_shadow(&mut self) -> Result<EditJob, WorkflowError> {
        self.require_stage(StageId::Enhance, "add shadow")?;
        self.begin_edit(
            instruction::ADD_SHADOW.to_owned(),
            None,
            EditPurpose::Generic,
            "Adding shadow...",
        )
    }

    /// Improve brightness, contrast, and saturation.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ActionUnavailable`] outside the
    /// enhancement stage.
    pub fn auto_enhance(&mut self) -> Result<EditJob, WorkflowError> {
        self.require_stage(StageId::Enhance, "auto-enhance")?;
        self.begin_edit(
            instruction::AUTO_ENHANCE.to_owned(),
            None,
            EditPurpose::Generic,
            "Applying auto-enhance...",
        )
    }

    /// Recolor the product to the configured color.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ActionUnavailable`] outside the
    /// enhancement stage and [`WorkflowError::MissingInput`] when the
    /// color prompt is blank.
    pub fn recolor(&mut self) -> Result<EditJob, WorkflowError> {
        self.require_stage(StageId::Enhance, "recolor")?;
        let color = self
            .params
            .as_enhance()
            .map(|p| p.color_prompt.trim())
            .filter(|c| !c.is_empty())
            .ok_or(WorkflowError::MissingInput("color prompt"))?;
        let text = instruction::recolor(color);
        self.begin_edit(text, None, EditPurpose::Generic, "Changing color...")
    }

    /// Ask for product-photo advice on the preview.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ActionUnavailable`] outside the
    /// enhancement stage.
    pub fn advise(&mut self) -> Result<AdvisoryJob, WorkflowError> {
        self.require_stage(StageId::Enhance, "advice")?;
        self.request_advisory(instruction::ADVISE)
    }

    /// Overlay the filled features onto the preview.
    ///
    /// `regenerate` asks for a different design than the last one and is
    /// accepted only after an overlay has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ActionUnavailable`] outside the overlay
    /// stage or for a premature regenerate, and
    /// [`WorkflowError::MissingInput`] when every feature is blank.
    pub fn apply_overlay(&mut self, regenerate: bool) -> Result<EditJob, WorkflowError> {
        self.require_stage(StageId::Overlay, "infographic")?;
        if regenerate && !self.overlay_applied {
            return Err(WorkflowError::ActionUnavailable {
                action: "regenerate infographic",
                stage: self.active,
            });
        }
        let text = self
            .params
            .as_overlay()
            .filter(|p| p.filled_features().next().is_some())
            .map(|p| instruction::overlay(p, &self.config.overlay_language, regenerate))
            .ok_or(WorkflowError::MissingInput("infographic feature"))?;
        let status = if regenerate {
            "Creating a new design..."
        } else {
            "Adding infographic..."
        };
        self.begin_edit(text, None, EditPurpose::Overlay, status)
    }

    // ── Export ───────────────────────────────────────────────────────

    /// The terminal artifact: the current preview, losslessly encoded.
    ///
    /// Does not change any state, so it also yields intermediate
    /// artifacts on earlier stages.
    ///
    /// # Errors
    ///
    /// See [`export_png`](Self::export_png).
    pub fn finalize_and_export(&self) -> Result<ImageBuffer, WorkflowError> {
        self.export_png()
    }

    /// The current preview as PNG, re-encoding if needed.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Geometry`] if a non-PNG preview cannot be
    /// re-encoded.
    pub fn export_png(&self) -> Result<ImageBuffer, WorkflowError> {
        Ok(to_png(&self.preview)?)
    }
}
