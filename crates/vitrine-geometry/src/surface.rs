//! Drawing surfaces backed by `tiny-skia`.
//!
//! `tiny-skia` stores premultiplied RGBA while `image` stores straight
//! RGBA, so every transform converts on the way in and on the way out.

use image::{Rgba, RgbaImage};
use tiny_skia::{ColorU8, Pixmap};

use crate::types::{Dimensions, GeometryError};

/// Allocate a cleared (fully transparent) surface.
///
/// # Errors
///
/// Returns [`GeometryError::RenderTargetUnavailable`] if either dimension
/// is zero or the surface is too large to allocate.
pub fn blank(size: Dimensions) -> Result<Pixmap, GeometryError> {
    Pixmap::new(size.width, size.height).ok_or(GeometryError::RenderTargetUnavailable {
        width: size.width,
        height: size.height,
    })
}

/// Upload a straight-alpha image onto a new premultiplied surface.
///
/// # Errors
///
/// Returns [`GeometryError::RenderTargetUnavailable`] if the surface
/// cannot be allocated.
pub fn from_rgba(image: &RgbaImage) -> Result<Pixmap, GeometryError> {
    let mut pixmap = blank(Dimensions::new(image.width(), image.height()))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Read a premultiplied surface back into a straight-alpha image.
#[must_use]
pub fn to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}
