//! Scale-with-recenter compositing for cutouts.
//!
//! The canvas keeps the input's native size. The content is scaled
//! about the canvas center onto a cleared canvas, so shrinking leaves
//! transparent margins rather than stale pixels. The operation is pure
//! in `(image, scale)`: callers apply it to the same cutout every time
//! rather than to the previous result.

use tiny_skia::{FilterQuality, PixmapPaint, Transform};

use crate::codec;
use crate::surface;
use crate::types::{Dimensions, GeometryError, ImageBuffer};

/// Where scaled content lands on a canvas of `canvas` size.
///
/// Returns `(x, y, scaled_width, scaled_height)`.
#[must_use]
pub fn recenter_placement(canvas: Dimensions, scale: f64) -> (f64, f64, f64, f64) {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let scaled_w = w * scale;
    let scaled_h = h * scale;
    ((w - scaled_w) / 2.0, (h - scaled_h) / 2.0, scaled_w, scaled_h)
}

/// Scale `image` by `scale` about its center on a transparent canvas of
/// the same dimensions.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidParameter`] unless `scale` is finite
/// and positive, [`GeometryError::EmptyInput`] or
/// [`GeometryError::Decode`] if the input cannot be decoded,
/// [`GeometryError::RenderTargetUnavailable`] if the canvas cannot be
/// allocated, and [`GeometryError::Encode`] if the result cannot be
/// encoded.
#[allow(clippy::cast_possible_truncation)]
pub fn scale_and_recenter(image: &ImageBuffer, scale: f64) -> Result<ImageBuffer, GeometryError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(GeometryError::InvalidParameter(format!(
            "scale must be a positive number, got {scale}"
        )));
    }

    let source = codec::decode(image)?;
    let size = Dimensions::new(source.width(), source.height());
    let src = surface::from_rgba(&source)?;
    let mut canvas = surface::blank(size)?;

    let (x, y, _, _) = recenter_placement(size, scale);
    let s = scale as f32;
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    canvas.draw_pixmap(
        0,
        0,
        src.as_ref(),
        &paint,
        Transform::from_row(s, 0.0, 0.0, s, x as f32, y as f32),
        None,
    );

    codec::encode_png(&surface::to_rgba(&canvas))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    const GREEN: Rgba<u8> = Rgba([20, 200, 40, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    /// A fully opaque green square.
    fn solid_cutout(size: u32) -> ImageBuffer {
        codec::encode_png(&RgbaImage::from_pixel(size, size, GREEN)).unwrap()
    }

    /// An opaque subject in the middle half of a transparent canvas.
    fn subject_cutout(size: u32) -> ImageBuffer {
        let lo = size / 4;
        let hi = size - size / 4;
        let img = RgbaImage::from_fn(size, size, |x, y| {
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                GREEN
            } else {
                CLEAR
            }
        });
        codec::encode_png(&img).unwrap()
    }

    fn alpha(img: &RgbaImage, x: u32, y: u32) -> u8 {
        img.get_pixel(x, y).0[3]
    }

    #[test]
    fn placement_is_centered() {
        let (x, y, w, h) = recenter_placement(Dimensions::new(100, 50), 0.8);
        assert!((x - 10.0).abs() < 1e-9);
        assert!((y - 5.0).abs() < 1e-9);
        assert!((w - 80.0).abs() < 1e-9);
        assert!((h - 40.0).abs() < 1e-9);
    }

    #[test]
    fn output_keeps_native_dimensions() {
        let input = solid_cutout(64);
        for scale in [0.5, 0.8, 1.0, 1.5] {
            let out = scale_and_recenter(&input, scale).unwrap();
            assert_eq!(out.dimensions().unwrap(), Dimensions::new(64, 64));
        }
    }

    #[test]
    fn unit_scale_reproduces_the_cutout() {
        let input = subject_cutout(40);
        let out = codec::decode(&scale_and_recenter(&input, 1.0).unwrap()).unwrap();
        let original = codec::decode(&input).unwrap();
        assert_eq!(out.dimensions(), original.dimensions());
        for (got, want) in out.pixels().zip(original.pixels()) {
            for (g, w) in got.0.iter().zip(want.0) {
                assert!(g.abs_diff(w) <= 1, "pixel drifted: {got:?} vs {want:?}");
            }
        }
    }

    #[test]
    fn shrinking_clears_the_margins() {
        // 100x100 opaque at 0.8 occupies [10, 90) on both axes.
        let out = codec::decode(&scale_and_recenter(&solid_cutout(100), 0.8).unwrap()).unwrap();
        assert_eq!(alpha(&out, 0, 0), 0);
        assert_eq!(alpha(&out, 5, 50), 0);
        assert_eq!(alpha(&out, 95, 50), 0);
        assert_eq!(alpha(&out, 50, 8), 0);
        assert!(alpha(&out, 12, 50) >= 254);
        assert!(alpha(&out, 87, 50) >= 254);
        let center = out.get_pixel(50, 50).0;
        for (got, want) in center.iter().zip(GREEN.0) {
            assert!(got.abs_diff(want) <= 1, "center pixel {center:?}");
        }
    }

    #[test]
    fn enlarging_overflows_the_canvas() {
        let out = codec::decode(&scale_and_recenter(&solid_cutout(50), 1.5).unwrap()).unwrap();
        assert!(out.pixels().all(|p| p.0[3] >= 254));
    }

    #[test]
    fn repeated_calls_on_the_same_source_are_idempotent() {
        let cutout = subject_cutout(48);
        let direct = scale_and_recenter(&cutout, 1.0).unwrap();
        let _shrunk = scale_and_recenter(&cutout, 0.5).unwrap();
        let restored = scale_and_recenter(&cutout, 1.0).unwrap();
        assert_eq!(direct, restored);

        let a = scale_and_recenter(&cutout, 0.8).unwrap();
        let b = scale_and_recenter(&cutout, 0.8).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_scale_is_rejected() {
        let input = solid_cutout(8);
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                scale_and_recenter(&input, scale),
                Err(GeometryError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn corrupt_input_is_a_decode_error() {
        let result = scale_and_recenter(&ImageBuffer::png(vec![0xAB; 16]), 1.0);
        assert!(matches!(result, Err(GeometryError::Decode(_))));
    }
}
