//! Cover-fit framing: crop an image to a target aspect ratio with
//! user zoom and pan.
//!
//! The source is scaled by the smallest factor that covers the output
//! canvas, multiplied by the user zoom, centered, then shifted by the pan
//! offsets. Pan values in `[-1, 1]` map linearly onto half of the
//! overflowing extent on each axis, so `pan = 1` puts the trailing edge
//! of the image flush with the trailing edge of the canvas and `pan = -1`
//! does the same for the leading edges. An axis that does not overflow
//! stays centered.
//!
//! Rendering fills the entire canvas from a bilinear, edge-padded pattern,
//! so every output pixel is sourced from the image and no letterboxing can
//! appear even when float rounding leaves the drawn edge a hair short of
//! the canvas edge.

use tiny_skia::{FilterQuality, Paint, Pattern, Rect, SpreadMode, Transform};

use crate::codec;
use crate::surface;
use crate::types::{AspectRatio, Dimensions, GeometryError, ImageBuffer};

/// Output canvas width in pixels for framed images.
pub const OUTPUT_WIDTH: u32 = 1024;

/// Smallest permitted user zoom: exactly covering.
pub const MIN_ZOOM: f64 = 1.0;

/// Placement of the scaled source on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    /// Output canvas size.
    pub canvas: Dimensions,
    /// Final scale factor applied to the source (`scale_to_cover * zoom`).
    pub scale: f64,
    /// Left edge of the drawn image in canvas coordinates.
    pub draw_x: f64,
    /// Top edge of the drawn image in canvas coordinates.
    pub draw_y: f64,
    /// Width of the drawn image.
    pub draw_width: f64,
    /// Height of the drawn image.
    pub draw_height: f64,
}

/// Canvas size for a given output width and aspect ratio.
///
/// The height is truncated to whole pixels, like a canvas sized from a
/// fractional value, and is never less than one.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn canvas_size(output_width: u32, aspect_ratio: AspectRatio) -> Dimensions {
    let height = (f64::from(output_width) / aspect_ratio.ratio()).floor().max(1.0);
    Dimensions::new(output_width, height as u32)
}

/// Compute where the source lands on the canvas.
///
/// `zoom` below [`MIN_ZOOM`] is raised to it and pan values are clamped to
/// `[-1, 1]`, so the returned placement always covers the canvas.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidParameter`] if any numeric input is
/// not finite, if `output_width` is zero, or if the source has a zero
/// dimension.
pub fn frame_geometry(
    source: Dimensions,
    output_width: u32,
    aspect_ratio: AspectRatio,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Result<FrameGeometry, GeometryError> {
    for (name, value) in [("zoom", zoom), ("pan_x", pan_x), ("pan_y", pan_y)] {
        if !value.is_finite() {
            return Err(GeometryError::InvalidParameter(format!(
                "{name} must be finite, got {value}"
            )));
        }
    }
    if output_width == 0 {
        return Err(GeometryError::InvalidParameter(
            "output width must be at least 1".into(),
        ));
    }
    if source.width == 0 || source.height == 0 {
        return Err(GeometryError::InvalidParameter(format!(
            "source image has no area ({source})"
        )));
    }

    let canvas = canvas_size(output_width, aspect_ratio);
    let out_w = f64::from(canvas.width);
    let out_h = f64::from(canvas.height);
    let img_w = f64::from(source.width);
    let img_h = f64::from(source.height);

    let scale_to_cover = (out_w / img_w).max(out_h / img_h);
    let scale = scale_to_cover * zoom.max(MIN_ZOOM);

    let draw_width = img_w * scale;
    let draw_height = img_h * scale;

    // Centered placement, then shift by the pan offset within the
    // overflowing range.
    let initial_x = (out_w - draw_width) / 2.0;
    let initial_y = (out_h - draw_height) / 2.0;
    let pan_range_x = (draw_width - out_w).max(0.0);
    let pan_range_y = (draw_height - out_h).max(0.0);
    let offset_x = pan_x.clamp(-1.0, 1.0) * (pan_range_x / 2.0);
    let offset_y = pan_y.clamp(-1.0, 1.0) * (pan_range_y / 2.0);

    Ok(FrameGeometry {
        canvas,
        scale,
        draw_x: initial_x - offset_x,
        draw_y: initial_y - offset_y,
        draw_width,
        draw_height,
    })
}

/// Crop `image` to `aspect_ratio` at [`OUTPUT_WIDTH`] with cover
/// semantics, user `zoom` (≥ 1) and pan (`[-1, 1]` per axis).
///
/// The output is a PNG of exactly the canvas size, reproducible
/// byte-for-byte for the same inputs.
///
/// # Errors
///
/// Returns [`GeometryError::EmptyInput`] or [`GeometryError::Decode`] if
/// the input cannot be decoded, [`GeometryError::InvalidParameter`] for
/// non-finite numbers, [`GeometryError::RenderTargetUnavailable`] if the
/// canvas cannot be allocated, and [`GeometryError::Encode`] if the
/// result cannot be encoded.
pub fn cover_fit_crop(
    image: &ImageBuffer,
    aspect_ratio: AspectRatio,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Result<ImageBuffer, GeometryError> {
    cover_fit_crop_to_width(image, OUTPUT_WIDTH, aspect_ratio, zoom, pan_x, pan_y)
}

/// [`cover_fit_crop`] with an explicit output width.
///
/// # Errors
///
/// See [`cover_fit_crop`].
#[allow(clippy::cast_possible_truncation)]
pub fn cover_fit_crop_to_width(
    image: &ImageBuffer,
    output_width: u32,
    aspect_ratio: AspectRatio,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Result<ImageBuffer, GeometryError> {
    let source = codec::decode(image)?;
    let geometry = frame_geometry(
        Dimensions::new(source.width(), source.height()),
        output_width,
        aspect_ratio,
        zoom,
        pan_x,
        pan_y,
    )?;

    let src = surface::from_rgba(&source)?;
    let mut canvas = surface::blank(geometry.canvas)?;

    let scale = geometry.scale as f32;
    let pattern = Pattern::new(
        src.as_ref(),
        SpreadMode::Pad,
        FilterQuality::Bilinear,
        1.0,
        Transform::from_row(
            scale,
            0.0,
            0.0,
            scale,
            geometry.draw_x as f32,
            geometry.draw_y as f32,
        ),
    );
    let mut paint = Paint::default();
    paint.shader = pattern;
    paint.anti_alias = false;

    let unavailable = GeometryError::RenderTargetUnavailable {
        width: geometry.canvas.width,
        height: geometry.canvas.height,
    };
    let rect = Rect::from_xywh(
        0.0,
        0.0,
        geometry.canvas.width as f32,
        geometry.canvas.height as f32,
    )
    .ok_or(unavailable)?;
    canvas.fill_rect(rect, &paint, Transform::identity(), None);

    codec::encode_png(&surface::to_rgba(&canvas))
}
