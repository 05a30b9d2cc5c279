#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use image::{ImageEncoder, Rgba, RgbaImage};
use vitrine_geometry::{Dimensions, decode, encode_png, scale_and_recenter};
use vitrine_workflow::{
    AspectRatio, Cutout, EditGateway, ErrorClass, GatewayError, ImageBuffer, Outcome, ParamUpdate,
    StageId, Studio, WorkflowConfig, WorkflowError,
};

/// A gateway that replays scripted responses and records every call.
#[derive(Default)]
struct ScriptedGateway {
    edits: Mutex<VecDeque<Result<ImageBuffer, GatewayError>>>,
    analyses: Mutex<VecDeque<Result<String, GatewayError>>>,
    generations: Mutex<VecDeque<Result<ImageBuffer, GatewayError>>>,
    calls: Mutex<Vec<(ImageBuffer, String)>>,
}

impl ScriptedGateway {
    fn with_edits(edits: impl IntoIterator<Item = Result<ImageBuffer, GatewayError>>) -> Self {
        Self {
            edits: Mutex::new(edits.into_iter().collect()),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(ImageBuffer, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EditGateway for ScriptedGateway {
    async fn edit(
        &self,
        image: &ImageBuffer,
        instruction: &str,
    ) -> Result<ImageBuffer, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((image.clone(), instruction.to_owned()));
        self.edits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::unknown("no scripted edit")))
    }

    async fn analyze(&self, image: &ImageBuffer, instruction: &str) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((image.clone(), instruction.to_owned()));
        self.analyses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::no_result("no scripted analysis")))
    }

    async fn generate(
        &self,
        _instruction: &str,
        _aspect_ratio: AspectRatio,
    ) -> Result<ImageBuffer, GatewayError> {
        self.generations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::no_result("no scripted image")))
    }
}

fn gradient(width: u32, height: u32) -> ImageBuffer {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    encode_png(&img).unwrap()
}

/// An opaque subject filling the middle half of a transparent square.
fn cutout(size: u32) -> ImageBuffer {
    let lo = size / 4;
    let hi = size - size / 4;
    let img = RgbaImage::from_fn(size, size, |x, y| {
        if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
            Rgba([200, 30, 30, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    encode_png(&img).unwrap()
}

fn alpha_at(image: &ImageBuffer, x: u32, y: u32) -> u8 {
    decode(image).unwrap().get_pixel(x, y).0[3]
}

#[tokio::test]
async fn framing_cutout_and_replacement_flow() {
    let source = gradient(800, 600);
    let square_cutout = cutout(1024);
    let replaced = gradient(1024, 1024);
    let gateway =
        ScriptedGateway::with_edits([Ok(square_cutout.clone()), Ok(replaced.clone())]);
    let mut studio = Studio::new(gateway, WorkflowConfig::default()).unwrap();
    studio.open(source.clone()).unwrap();

    // Stage 1: 1:1 at zoom 1.2, centered.
    for update in [
        ParamUpdate::AspectRatio(AspectRatio::SQUARE),
        ParamUpdate::Zoom(1.2),
        ParamUpdate::PanX(0.0),
        ParamUpdate::PanY(0.0),
    ] {
        assert_eq!(
            studio.update_stage_parameter(update).unwrap(),
            Some(Outcome::Applied)
        );
    }
    studio.advance_to_stage(StageId::Background).unwrap();

    let workflow = studio.workflow().unwrap();
    let committed = workflow.history().entries()[1].clone();
    assert_eq!(committed.dimensions().unwrap(), Dimensions::new(1024, 1024));
    assert_eq!(workflow.preview(), &committed);

    // Stage 2: cutout arms the scale control.
    assert_eq!(studio.remove_background().await.unwrap(), Outcome::Applied);
    let workflow = studio.workflow().unwrap();
    assert_eq!(workflow.cutout(), &Cutout::Armed(square_cutout.clone()));

    // Rescale shrinks the subject by 20% about the center.
    assert_eq!(
        studio
            .update_stage_parameter(ParamUpdate::ProductScale(0.8))
            .unwrap(),
        Some(Outcome::Applied)
    );
    let rescaled = studio.workflow().unwrap().preview().clone();
    assert_eq!(rescaled, scale_and_recenter(&square_cutout, 0.8).unwrap());
    assert_eq!(rescaled.dimensions().unwrap(), Dimensions::new(1024, 1024));
    // Subject edge moved from 256 to about 307.
    assert!(alpha_at(&square_cutout, 280, 512) >= 254);
    assert_eq!(alpha_at(&rescaled, 280, 512), 0);
    assert!(alpha_at(&rescaled, 320, 512) >= 254);

    // Replacement sources from the rescaled cutout.
    studio
        .update_stage_parameter(ParamUpdate::BackgroundPrompt("white marble".into()))
        .unwrap();
    assert_eq!(studio.replace_background().await.unwrap(), Outcome::Applied);

    let calls = studio.gateway().calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, committed, "cutout sources from the committed input");
    assert_eq!(calls[1].0, rescaled, "replacement sources from the rescaled cutout");
    assert_ne!(calls[1].0, source);
    assert!(calls[1].1.contains("'white marble'"));

    let workflow = studio.workflow().unwrap();
    assert!(!workflow.cutout().is_armed());
    assert_eq!(workflow.preview(), &replaced);

    studio.advance_to_stage(StageId::Enhance).unwrap();
    let history = studio.workflow().unwrap().history();
    assert_eq!(history.len(), 3);
    assert_eq!(history.entries()[2], replaced);
}

#[tokio::test]
async fn failed_edit_is_isolated_and_cleared_by_next_request() {
    let gateway = ScriptedGateway::with_edits([
        Err(GatewayError::rate_limited("429 RESOURCE_EXHAUSTED")),
        Err(GatewayError::no_result("no inline data")),
    ]);
    let mut studio = Studio::new(gateway, WorkflowConfig::default()).unwrap();
    studio.open(gradient(64, 48)).unwrap();
    let before = studio.workflow().unwrap().clone();

    let outcome = studio.request_external_edit("brighten", None).await.unwrap();
    assert_eq!(outcome, Outcome::Failed);
    let workflow = studio.workflow().unwrap();
    assert_eq!(workflow.preview(), before.preview());
    assert_eq!(workflow.history(), before.history());
    assert!(workflow.last_error().unwrap().is_rate_limited());
    assert!(!workflow.is_busy());

    studio.request_external_edit("brighten", None).await.unwrap();
    let last = studio.workflow().unwrap().last_error().unwrap().clone();
    assert_eq!(last.class, ErrorClass::Gateway);
    assert!(!last.is_rate_limited());
}

#[tokio::test]
async fn advisory_text_lands_on_the_enhance_stage() {
    let gateway = ScriptedGateway {
        analyses: Mutex::new(VecDeque::from([Ok("- softer light".to_owned())])),
        ..ScriptedGateway::default()
    };
    let mut studio = Studio::new(gateway, WorkflowConfig::default()).unwrap();
    studio.open(gradient(32, 32)).unwrap();
    studio.advance_to_stage(StageId::Background).unwrap();
    studio.advance_to_stage(StageId::Enhance).unwrap();

    assert_eq!(studio.advise().await.unwrap(), Outcome::Applied);
    assert_eq!(studio.workflow().unwrap().advisory(), Some("- softer light"));
}

#[tokio::test]
async fn generation_failure_starts_no_session() {
    let gateway = ScriptedGateway::default();
    let mut studio = Studio::new(gateway, WorkflowConfig::default()).unwrap();

    assert!(matches!(
        studio.generate("   ", AspectRatio::SQUARE).await,
        Err(WorkflowError::MissingInput(_))
    ));
    assert!(matches!(
        studio.generate("a red kettle", AspectRatio::SQUARE).await,
        Err(WorkflowError::Gateway(_))
    ));
    assert!(studio.workflow().is_none());
    assert!(matches!(
        studio.finalize_and_export(),
        Err(WorkflowError::NoSession)
    ));
}

#[tokio::test]
async fn generated_image_opens_a_session_and_reset_closes_it() {
    let generated = gradient(40, 40);
    let gateway = ScriptedGateway {
        generations: Mutex::new(VecDeque::from([Ok(generated.clone())])),
        ..ScriptedGateway::default()
    };
    let mut studio = Studio::new(gateway, WorkflowConfig::default()).unwrap();
    let workflow = studio
        .generate("a red kettle", "16:9".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(workflow.preview(), &generated);
    assert_eq!(studio.export_png().unwrap(), generated);

    studio.reset_session();
    assert!(studio.workflow().is_none());
    assert!(matches!(
        studio.advance_to_stage(StageId::Background),
        Err(WorkflowError::NoSession)
    ));
}

#[test]
fn interleaved_frame_previews_keep_only_the_latest() {
    let mut studio = Studio::new(ScriptedGateway::default(), WorkflowConfig::default()).unwrap();
    studio.open(gradient(120, 80)).unwrap();
    let workflow = studio.workflow_mut().unwrap();

    let first = workflow
        .update_stage_parameter(ParamUpdate::AspectRatio("3:4".parse().unwrap()))
        .unwrap()
        .unwrap();
    let second = workflow
        .update_stage_parameter(ParamUpdate::PanX(1.0))
        .unwrap()
        .unwrap();

    // Later job completes first; the earlier result arrives late.
    let second_result = second.run();
    let expected = second_result.as_ref().unwrap().clone();
    assert_eq!(workflow.resolve_preview(&second, second_result), Outcome::Applied);
    assert_eq!(workflow.resolve_preview(&first, first.run()), Outcome::Stale);
    assert_eq!(workflow.preview(), &expected);
    assert_eq!(
        workflow.preview().dimensions().unwrap(),
        Dimensions::new(1024, 1365)
    );
}

#[test]
fn undecodable_source_fails_framing_without_losing_state() {
    let garbage = ImageBuffer::new(vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3], "image/png");
    let mut studio = Studio::new(ScriptedGateway::default(), WorkflowConfig::default()).unwrap();
    studio.open(garbage.clone()).unwrap();

    let outcome = studio
        .update_stage_parameter(ParamUpdate::AspectRatio(AspectRatio::SQUARE))
        .unwrap();
    assert_eq!(outcome, Some(Outcome::Failed));

    let workflow = studio.workflow().unwrap();
    assert_eq!(workflow.preview(), &garbage);
    assert_eq!(workflow.history().entries(), &[garbage]);
    assert_eq!(workflow.active_stage(), StageId::Frame);
    let error = workflow.last_error().unwrap();
    assert_eq!(error.class, ErrorClass::Input);
    assert!(!error.message.is_empty());
    assert!(!workflow.is_busy());
}

#[test]
fn export_reencodes_non_png_previews() {
    let mut jpeg = Vec::new();
    let rgb = image::RgbImage::from_pixel(16, 16, image::Rgb([10, 120, 200]));
    image::codecs::jpeg::JpegEncoder::new(&mut jpeg)
        .write_image(rgb.as_raw(), 16, 16, image::ExtendedColorType::Rgb8)
        .unwrap();

    let mut studio = Studio::new(ScriptedGateway::default(), WorkflowConfig::default()).unwrap();
    studio
        .open(ImageBuffer::new(jpeg, "image/jpeg"))
        .unwrap();
    let png = studio.export_png().unwrap();
    assert!(png.is_png());
    assert_eq!(png.dimensions().unwrap(), Dimensions::new(16, 16));
    assert_eq!(studio.finalize_and_export().unwrap(), png);
}
