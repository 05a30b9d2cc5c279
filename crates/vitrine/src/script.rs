//! Scripted editing sessions.
//!
//! A script is a JSON array of steps run in order against a [`Studio`]:
//!
//! ```json
//! [
//!   {"action": "set", "param": {"key": "aspect_ratio", "value": "1:1"}},
//!   {"action": "next"},
//!   {"action": "remove_background"},
//!   {"action": "set", "param": {"key": "product_scale", "value": 0.8}},
//!   {"action": "export"}
//! ]
//! ```

use serde::Deserialize;
use tracing::{info, warn};
use vitrine_workflow::{EditGateway, Outcome, ParamUpdate, Studio, WorkflowError};

use crate::error::CliError;
use crate::files::{ExportTarget, write_image};

/// One scripted user action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Change a parameter of the active stage.
    Set { param: ParamUpdate },
    RemoveBackground,
    ReplaceBackground,
    AddShadow,
    AutoEnhance,
    Recolor,
    Advise,
    Overlay {
        #[serde(default)]
        regenerate: bool,
    },
    /// Commit the preview and move to the following stage.
    Next,
    /// Return to the preceding stage.
    Back,
    /// Write the current preview as an intermediate PNG.
    Export,
}

impl Step {
    /// Action name as written in scripts.
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::RemoveBackground => "remove_background",
            Self::ReplaceBackground => "replace_background",
            Self::AddShadow => "add_shadow",
            Self::AutoEnhance => "auto_enhance",
            Self::Recolor => "recolor",
            Self::Advise => "advise",
            Self::Overlay { .. } => "overlay",
            Self::Next => "next",
            Self::Back => "back",
            Self::Export => "export",
        }
    }
}

/// What a finished script produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Advisory texts in the order received.
    pub advisories: Vec<String>,
    /// `(step index, message)` for every failed step.
    pub failures: Vec<(usize, String)>,
    /// Number of intermediate exports written.
    pub exports: usize,
}

/// Run `steps` against the open session in `studio`.
///
/// Precondition violations (navigating past either end, an action on the
/// wrong stage, a missing prompt) stop the script. Model and render
/// failures are reported and the script continues, as a user would.
pub async fn run<G: EditGateway>(
    studio: &mut Studio<G>,
    steps: &[Step],
    target: &ExportTarget,
) -> Result<Report, CliError> {
    let mut report = Report::default();
    for (index, step) in steps.iter().enumerate() {
        let index = index + 1;
        let step_error = |source| CliError::Step {
            index,
            action: step.action(),
            source,
        };
        info!(index, action = step.action(), "running step");

        if matches!(step, Step::Export) {
            let png = studio.export_png().map_err(step_error)?;
            report.exports += 1;
            write_image(&target.intermediate_path(report.exports), &png)?;
            continue;
        }

        let outcome = run_step(studio, step).await.map_err(step_error)?;
        let workflow = studio.workflow().ok_or(WorkflowError::NoSession)?;
        match outcome {
            Some(Outcome::Failed) => {
                let message = workflow
                    .last_error()
                    .map_or_else(|| "unknown failure".to_owned(), ToString::to_string);
                warn!(index, action = step.action(), %message, "step failed");
                report.failures.push((index, message));
            }
            Some(Outcome::Applied) if matches!(step, Step::Advise) => {
                if let Some(text) = workflow.advisory() {
                    report.advisories.push(text.to_owned());
                }
            }
            _ => {}
        }
    }
    Ok(report)
}

async fn run_step<G: EditGateway>(
    studio: &mut Studio<G>,
    step: &Step,
) -> Result<Option<Outcome>, WorkflowError> {
    let outcome = match step {
        Step::Set { param } => return studio.update_stage_parameter(param.clone()),
        Step::RemoveBackground => studio.remove_background().await?,
        Step::ReplaceBackground => studio.replace_background().await?,
        Step::AddShadow => studio.add_shadow().await?,
        Step::AutoEnhance => studio.auto_enhance().await?,
        Step::Recolor => studio.recolor().await?,
        Step::Advise => studio.advise().await?,
        Step::Overlay { regenerate } => studio.apply_overlay(*regenerate).await?,
        Step::Next | Step::Back | Step::Export => {
            navigate(studio, step)?;
            return Ok(None);
        }
    };
    Ok(Some(outcome))
}

fn navigate<G: EditGateway>(studio: &mut Studio<G>, step: &Step) -> Result<(), WorkflowError> {
    let active = studio
        .workflow()
        .ok_or(WorkflowError::NoSession)?
        .active_stage();
    let unavailable = WorkflowError::ActionUnavailable {
        action: step.action(),
        stage: active,
    };
    match step {
        Step::Next => studio.advance_to_stage(active.next().ok_or(unavailable)?),
        Step::Back => studio.retreat_to_stage(active.previous().ok_or(unavailable)?),
        _ => Err(unavailable),
    }
}
