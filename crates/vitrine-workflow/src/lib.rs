//! vitrine-workflow: staged product-photo edit workflow.
//!
//! A session takes one source image through four fixed stages (frame,
//! background, enhance, overlay). [`Workflow`] is the sans-IO state
//! machine: it holds the committed history, the live preview, and the
//! active stage's parameters, and issues jobs whose results it applies
//! under last-issued-wins supersession. [`Studio`] drives those jobs
//! against an [`EditGateway`] and the raster transforms in
//! `vitrine-geometry`.

pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod instruction;
pub mod params;
pub mod request;
pub mod session;
pub mod stage;
pub mod workflow;

pub use config::WorkflowConfig;
pub use error::{ErrorClass, LastError, WorkflowError};
pub use gateway::{EditGateway, GatewayError, GatewayErrorKind};
pub use history::History;
pub use params::{
    BackgroundParams, EnhanceParams, Feature, Font, FontSize, FrameParams, Integration,
    OverlayParams, OverlayStyle, ParamKey, ParamUpdate, Placement, StageParams,
};
pub use request::{Freshness, RequestSlot, SlotKind, Ticket};
pub use session::Studio;
pub use stage::StageId;
pub use workflow::{AdvisoryJob, Cutout, EditJob, EditPurpose, Outcome, PreviewJob, Workflow};

pub use vitrine_geometry::{AspectRatio, ImageBuffer};
