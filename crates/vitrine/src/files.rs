//! Reading inputs and naming outputs.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::info;
use vitrine_geometry::ImageBuffer;

use crate::error::CliError;

/// Declared type for bytes that are not a recognizable image.
const UNKNOWN_MIME: &str = "application/octet-stream";

/// Read an image file, declaring its MIME type from the content, falling
/// back to the extension.
pub fn read_image(path: &Path) -> Result<ImageBuffer, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_owned(),
        source,
    })?;
    let mime = image::guess_format(&bytes)
        .or_else(|_| image::ImageFormat::from_path(path))
        .map_or(UNKNOWN_MIME, |format| format.to_mime_type());
    info!(path = %path.display(), bytes = bytes.len(), mime, "read image");
    Ok(ImageBuffer::new(bytes, mime))
}

/// Write encoded image bytes to `path`.
pub fn write_image(path: &Path, image: &ImageBuffer) -> Result<(), CliError> {
    std::fs::write(path, image.bytes()).map_err(|source| CliError::Write {
        path: path.to_owned(),
        source,
    })?;
    info!(path = %path.display(), bytes = image.len(), "wrote image");
    Ok(())
}

/// Parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_owned(),
        source,
    })
}

/// Where session exports land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    dir: PathBuf,
    final_name: Option<PathBuf>,
}

impl ExportTarget {
    /// Interpret `output`: an existing directory (or a path ending in a
    /// separator) receives default names; anything else names the final
    /// file and its parent receives intermediates.
    pub fn new(output: &Path) -> Self {
        let as_dir = output.is_dir()
            || output
                .as_os_str()
                .to_string_lossy()
                .ends_with(std::path::MAIN_SEPARATOR);
        if as_dir {
            Self {
                dir: output.to_owned(),
                final_name: None,
            }
        } else {
            Self {
                dir: output
                    .parent()
                    .map_or_else(PathBuf::new, Path::to_path_buf),
                final_name: Some(output.to_owned()),
            }
        }
    }

    /// Path of the final export.
    pub fn final_path(&self) -> PathBuf {
        self.final_name
            .clone()
            .unwrap_or_else(|| self.dir.join("edited-image-final.png"))
    }

    /// Path of the `n`th intermediate export (1-based).
    pub fn intermediate_path(&self, n: usize) -> PathBuf {
        self.dir.join(format!("edited-image-intermediate-{n}.png"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_target_names_final_and_uses_parent_for_intermediates() {
        let target = ExportTarget::new(Path::new("out/result.png"));
        assert_eq!(target.final_path(), PathBuf::from("out/result.png"));
        assert_eq!(
            target.intermediate_path(2),
            PathBuf::from("out/edited-image-intermediate-2.png")
        );
    }

    #[test]
    fn directory_target_uses_default_names() {
        let dir = std::env::temp_dir();
        let target = ExportTarget::new(&dir);
        assert_eq!(target.final_path(), dir.join("edited-image-final.png"));
        assert_eq!(
            target.intermediate_path(1),
            dir.join("edited-image-intermediate-1.png")
        );
    }

    #[test]
    fn bare_file_name_writes_to_current_directory() {
        let target = ExportTarget::new(Path::new("final.png"));
        assert_eq!(target.intermediate_path(1), PathBuf::from("edited-image-intermediate-1.png"));
    }

    #[test]
    fn image_mime_is_detected_from_content() {
        let png = vitrine_geometry::encode_png(&image::RgbaImage::new(2, 2)).unwrap();
        let path = std::env::temp_dir().join(format!("vitrine-read-{}.bin", std::process::id()));
        std::fs::write(&path, png.bytes()).unwrap();
        let read = read_image(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(read.mime_type(), "image/png");
        assert_eq!(read, png);
    }

    #[test]
    fn unrecognized_bytes_are_not_declared_as_images() {
        let path = std::env::temp_dir().join(format!("vitrine-read-{}.txt", std::process::id()));
        std::fs::write(&path, b"hello").unwrap();
        let read = read_image(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(read.mime_type(), UNKNOWN_MIME);
    }
}
