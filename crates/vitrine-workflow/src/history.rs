//! Committed stage outputs.

use vitrine_geometry::ImageBuffer;

use crate::stage::StageId;

/// Ordered list of committed images.
///
/// Entry 0 is the session source. Entry `k` is the committed output of
/// stage `k` and therefore the input of stage `k + 1`. The list is never
/// empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<ImageBuffer>,
}

impl History {
    /// Start a history from the session source image.
    #[must_use]
    pub fn new(source: ImageBuffer) -> Self {
        Self {
            entries: vec![source],
        }
    }

    /// Number of committed entries, including the source.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The session source image.
    #[must_use]
    pub fn source(&self) -> &ImageBuffer {
        &self.entries[0]
    }

    /// The committed input of `stage`, if the history reaches it.
    #[must_use]
    pub fn input_of(&self, stage: StageId) -> Option<&ImageBuffer> {
        self.entries.get(stage.position() - 1)
    }

    /// Record `output` as the committed result of `stage`.
    ///
    /// Everything after the stage's input is discarded first, so
    /// re-committing an earlier stage drops the downstream results.
    pub fn commit(&mut self, stage: StageId, output: ImageBuffer) {
        self.entries.truncate(stage.position());
        self.entries.push(output);
    }

    /// All entries in order.
    #[must_use]
    pub fn entries(&self) -> &[ImageBuffer] {
        &self.entries
    }
}
