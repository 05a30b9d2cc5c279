//! Async driver that runs workflow jobs against a gateway.

use tracing::info;
use vitrine_geometry::{AspectRatio, ImageBuffer};

use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::gateway::EditGateway;
use crate::params::ParamUpdate;
use crate::stage::StageId;
use crate::workflow::{AdvisoryJob, EditJob, Outcome, Workflow};

/// An editor front end: at most one open [`Workflow`] plus the gateway
/// its edits run against.
///
/// Each async method awaits its own job to completion, so results always
/// apply in call order here. Callers that interleave requests drive the
/// [`Workflow`] directly and rely on its supersession rules.
#[derive(Debug)]
pub struct Studio<G> {
    gateway: G,
    config: WorkflowConfig,
    session: Option<Workflow>,
}

impl<G: EditGateway> Studio<G> {
    /// A studio with no open session.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidConfig`] if `config` is invalid.
    pub fn new(gateway: G, config: WorkflowConfig) -> Result<Self, WorkflowError> {
        config.validate()?;
        Ok(Self {
            gateway,
            config,
            session: None,
        })
    }

    /// The gateway edits run against.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The open session, if any.
    pub const fn workflow(&self) -> Option<&Workflow> {
        self.session.as_ref()
    }

    /// Mutable access for callers that drive jobs themselves.
    pub const fn workflow_mut(&mut self) -> Option<&mut Workflow> {
        self.session.as_mut()
    }

    fn session_mut(&mut self) -> Result<&mut Workflow, WorkflowError> {
        self.session.as_mut().ok_or(WorkflowError::NoSession)
    }

    fn session(&self) -> Result<&Workflow, WorkflowError> {
        self.session.as_ref().ok_or(WorkflowError::NoSession)
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Start a session on an uploaded image, replacing any open one.
    ///
    /// # Errors
    ///
    /// See [`Workflow::new`].
    pub fn open(&mut self, image: ImageBuffer) -> Result<&Workflow, WorkflowError> {
        let workflow = Workflow::new(image, self.config.clone())?;
        Ok(self.session.insert(workflow))
    }

    /// Start a session on a freshly generated image.
    ///
    /// No session is started if generation fails.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::MissingInput`] for a blank prompt,
    /// [`WorkflowError::Gateway`] if generation fails, and anything
    /// [`Workflow::new`] returns.
    pub async fn generate(
        &mut self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<&Workflow, WorkflowError> {
        if prompt.trim().is_empty() {
            return Err(WorkflowError::MissingInput("generation prompt"));
        }
        info!(%aspect_ratio, "generating source image");
        let image = self.gateway.generate(prompt, aspect_ratio).await?;
        self.open(image)
    }

    /// Close the open session.
    pub fn reset_session(&mut self) {
        if self.session.take().is_some() {
            info!("session reset");
        }
    }

    // ── Navigation and parameters ────────────────────────────────────

    /// See [`Workflow::advance_to_stage`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or the workflow's error.
    pub fn advance_to_stage(&mut self, next: StageId) -> Result<(), WorkflowError> {
        self.session_mut()?.advance_to_stage(next)
    }

    /// See [`Workflow::retreat_to_stage`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or the workflow's error.
    pub fn retreat_to_stage(&mut self, previous: StageId) -> Result<(), WorkflowError> {
        self.session_mut()?.retreat_to_stage(previous)
    }

    /// Apply a parameter update and run any resulting preview transform.
    ///
    /// Returns `None` when the update does not touch the preview.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or the workflow's error.
    pub fn update_stage_parameter(
        &mut self,
        update: ParamUpdate,
    ) -> Result<Option<Outcome>, WorkflowError> {
        let workflow = self.session_mut()?;
        let Some(job) = workflow.update_stage_parameter(update)? else {
            return Ok(None);
        };
        let result = job.run();
        Ok(Some(workflow.resolve_preview(&job, result)))
    }

    // ── Gateway actions ──────────────────────────────────────────────

    async fn run_edit(&mut self, job: EditJob) -> Result<Outcome, WorkflowError> {
        let result = self.gateway.edit(&job.source, &job.instruction).await;
        Ok(self.session_mut()?.resolve_edit(&job, result))
    }

    async fn run_advisory(&mut self, job: AdvisoryJob) -> Result<Outcome, WorkflowError> {
        let result = self.gateway.analyze(&job.source, &job.instruction).await;
        Ok(self.session_mut()?.resolve_advisory(&job, result))
    }

    /// See [`Workflow::request_external_edit`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or a precondition error.
    /// Gateway failures are recorded in the workflow's last error.
    pub async fn request_external_edit(
        &mut self,
        instruction: &str,
        source_override: Option<ImageBuffer>,
    ) -> Result<Outcome, WorkflowError> {
        let job = self
            .session_mut()?
            .request_external_edit(instruction, source_override)?;
        self.run_edit(job).await
    }

    /// See [`Workflow::request_advisory`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or a precondition error.
    pub async fn request_advisory(&mut self, instruction: &str) -> Result<Outcome, WorkflowError> {
        let job = self.session_mut()?.request_advisory(instruction)?;
        self.run_advisory(job).await
    }

    /// See [`Workflow::remove_background`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or a precondition error.
    pub async fn remove_background(&mut self) -> Result<Outcome, WorkflowError> {
        let job = self.session_mut()?.remove_background()?;
        self.run_edit(job).await
    }

    /// See [`Workflow::replace_background`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or a precondition error.
    pub async fn replace_background(&mut self) -> Result<Outcome, WorkflowError> {
        let job = self.session_mut()?.replace_background()?;
        self.run_edit(job).await
    }

    /// See [`Workflow::add_shadow`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or a precondition error.
    pub async fn add_shadow(&mut self) -> Result<Outcome, WorkflowError> {
        let job = self.session_mut()?.add_shadow()?;
        self.run_edit(job).await
    }

    /// See [`Workflow::auto_enhance`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or a precondition error.
    pub async fn auto_enhance(&mut self) -> Result<Outcome, WorkflowError> {
        let job = self.session_mut()?.auto_enhance()?;
        self.run_edit(job).await
    }

    /// See [`Workflow::recolor`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or a precondition error.
    pub async fn recolor(&mut self) -> Result<Outcome, WorkflowError> {
        let job = self.session_mut()?.recolor()?;
        self.run_edit(job).await
    }

    /// See [`Workflow::advise`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or a precondition error.
    pub async fn advise(&mut self) -> Result<Outcome, WorkflowError> {
        let job = self.session_mut()?.advise()?;
        self.run_advisory(job).await
    }

    /// See [`Workflow::apply_overlay`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or a precondition error.
    pub async fn apply_overlay(&mut self, regenerate: bool) -> Result<Outcome, WorkflowError> {
        let job = self.session_mut()?.apply_overlay(regenerate)?;
        self.run_edit(job).await
    }

    // ── Export ───────────────────────────────────────────────────────

    /// The current preview as the terminal PNG artifact.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or a re-encoding failure.
    pub fn finalize_and_export(&self) -> Result<ImageBuffer, WorkflowError> {
        self.session()?.finalize_and_export()
    }

    /// The current preview as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] or a re-encoding failure.
    pub fn export_png(&self) -> Result<ImageBuffer, WorkflowError> {
        self.session()?.export_png()
    }
}
