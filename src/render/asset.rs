//! Image assets: embedded or on-disk raw RGBA pixel data.
//!
//! Decoding image formats is the asset pipeline's job; by the time pixels
//! reach the toolkit they are tightly packed RGBA8 rows with known
//! dimensions. A failed load is reported as an [`AssetError`] and the caller
//! degrades (draws without the image) instead of failing the tree.

use std::borrow::Cow;
use std::path::PathBuf;

/// Errors from loading an [`Asset`].
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read asset: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("asset has zero width or height")]
    Empty,
}

/// Where an asset's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// Bytes compiled into the binary.
    Embedded(&'static [u8]),
    /// A file read on first use.
    File(PathBuf),
}

/// A raw RGBA8 image asset with known dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub source: AssetSource,
    pub width: u32,
    pub height: u32,
}

/// Decoded, validated pixel data ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Cow<'static, [u8]>,
}

impl Asset {
    /// An asset embedded in the binary.
    pub const fn embedded(bytes: &'static [u8], width: u32, height: u32) -> Self {
        Self { source: AssetSource::Embedded(bytes), width, height }
    }

    /// An asset loaded from `path`.
    pub fn file(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self { source: AssetSource::File(path.into()), width, height }
    }

    /// Load and validate the pixel data.
    pub fn load(&self) -> Result<ImageData, AssetError> {
        if self.width == 0 || self.height == 0 {
            return Err(AssetError::Empty);
        }

        let pixels: Cow<'static, [u8]> = match &self.source {
            AssetSource::Embedded(bytes) => Cow::Borrowed(*bytes),
            AssetSource::File(path) => Cow::Owned(std::fs::read(path)?),
        };

        let expected = self.width as usize * self.height as usize * 4;
        if pixels.len() != expected {
            return Err(AssetError::SizeMismatch { expected, actual: pixels.len() });
        }

        Ok(ImageData { width: self.width, height: self.height, pixels })
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    static TWO_BY_ONE: [u8; 8] = [255, 0, 0, 255, 0, 0, 255, 255];

    #[test]
    fn embedded_loads() {
        let asset = Asset::embedded(&TWO_BY_ONE, 2, 1);
        let image = asset.load().unwrap();
        assert_eq!(image.width, 2);
        assert_eq!(image.height, 1);
        assert_eq!(&image.pixels[..], &TWO_BY_ONE[..]);
    }

    #[test]
    fn size_mismatch_is_reported() {
        let asset = Asset::embedded(&TWO_BY_ONE, 2, 2);
        match asset.load() {
            Err(AssetError::SizeMismatch { expected, actual }) => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 8);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn zero_dimensions_are_empty() {
        let asset = Asset::embedded(&TWO_BY_ONE, 0, 1);
        assert!(matches!(asset.load(), Err(AssetError::Empty)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let asset = Asset::file("/nonexistent/gilt-surface/tile.rgba", 1, 1);
        let err = asset.load().unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
        assert!(err.to_string().starts_with("failed to read asset"));
    }
}
