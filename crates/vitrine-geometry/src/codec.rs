//! Decoding and lossless encoding of [`ImageBuffer`]s.
//!
//! Every transform starts by decoding its input into straight-alpha RGBA
//! and finishes by encoding the canvas as PNG, so all engine output
//! round-trips losslessly.

use image::{ImageEncoder, RgbaImage};

use crate::types::{GeometryError, ImageBuffer};

/// Decode an encoded buffer into straight-alpha RGBA.
///
/// The declared MIME type is advisory only: the format is sniffed from
/// the bytes, so a mislabelled buffer still decodes.
///
/// # Errors
///
/// Returns [`GeometryError::EmptyInput`] if the buffer is empty.
/// Returns [`GeometryError::Decode`] if the image format is unrecognized
/// or the data is corrupt.
pub fn decode(buffer: &ImageBuffer) -> Result<RgbaImage, GeometryError> {
    if buffer.is_empty() {
        return Err(GeometryError::EmptyInput);
    }
    let img = image::load_from_memory(buffer.bytes()).map_err(GeometryError::Decode)?;
    Ok(img.to_rgba8())
}

/// Encode an RGBA image as a PNG [`ImageBuffer`].
///
/// # Errors
///
/// Returns [`GeometryError::Encode`] if PNG encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<ImageBuffer, GeometryError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(GeometryError::Encode)?;
    Ok(ImageBuffer::png(buf))
}

/// Return `buffer` as PNG, re-encoding only when it is not PNG already.
///
/// # Errors
///
/// Returns the decode or encode error of the underlying conversion.
pub fn to_png(buffer: &ImageBuffer) -> Result<ImageBuffer, GeometryError> {
    if buffer.is_png() {
        return Ok(buffer.clone());
    }
    encode_png(&decode(buffer)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn jpeg_fixture(width: u32, height: u32) -> ImageBuffer {
        let img = image::RgbImage::from_fn(width, height, |_, _| image::Rgb([200, 40, 40]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        encoder
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        ImageBuffer::new(buf, "image/jpeg")
    }

    #[test]
    fn empty_input_returns_error() {
        let result = decode(&ImageBuffer::png(Vec::<u8>::new()));
        assert!(matches!(result, Err(GeometryError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_return_decode_error() {
        let result = decode(&ImageBuffer::png(vec![0xFF, 0xFE, 0x00, 0x01]));
        assert!(matches!(result, Err(GeometryError::Decode(_))));
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let img = RgbaImage::from_fn(7, 5, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            image::Rgba([(x * 30) as u8, (y * 50) as u8, 7, (x * y * 6) as u8])
        });
        let encoded = encode_png(&img).unwrap();
        assert_eq!(encoded.mime_type(), "image/png");
        assert_eq!(decode(&encoded).unwrap(), img);
    }

    #[test]
    fn to_png_keeps_png_untouched() {
        let img = RgbaImage::from_pixel(3, 3, image::Rgba([1, 2, 3, 255]));
        let encoded = encode_png(&img).unwrap();
        assert_eq!(to_png(&encoded).unwrap(), encoded);
    }

    #[test]
    fn to_png_converts_jpeg() {
        let jpeg = jpeg_fixture(12, 8);
        let png = to_png(&jpeg).unwrap();
        assert!(png.is_png());
        let dims = png.dimensions().unwrap();
        assert_eq!((dims.width, dims.height), (12, 8));
    }

    #[test]
    fn mislabelled_buffer_still_decodes() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255]));
        let png = encode_png(&img).unwrap();
        let mislabelled = ImageBuffer::new(png.bytes().to_vec(), "image/webp");
        assert_eq!(decode(&mislabelled).unwrap(), img);
    }
}
