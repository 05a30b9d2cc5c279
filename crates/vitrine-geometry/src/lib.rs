//! vitrine-geometry: deterministic raster transforms (sans-IO).
//!
//! Two pure operations back the framing and cutout stages of the editor:
//!
//! - [`cover_fit_crop`]: crop to an aspect ratio with cover semantics,
//!   user zoom, and pan.
//! - [`scale_and_recenter`]: scale content about the canvas center on a
//!   transparent canvas of unchanged size.
//!
//! Both take an encoded [`ImageBuffer`] and return a new PNG-encoded
//! buffer. Output is reproducible byte-for-byte for identical inputs.
//!
//! This crate has **no I/O dependencies**: buffers are in-memory bytes,
//! and rasterisation happens on `tiny-skia` pixmaps.

pub mod codec;
pub mod frame;
pub mod recenter;
pub mod surface;
pub mod types;

pub use codec::{decode, encode_png, to_png};
pub use frame::{
    FrameGeometry, OUTPUT_WIDTH, canvas_size, cover_fit_crop, cover_fit_crop_to_width,
    frame_geometry,
};
pub use recenter::scale_and_recenter;
pub use types::{AspectRatio, Dimensions, GeometryError, ImageBuffer, PNG_MIME, RgbaImage};
