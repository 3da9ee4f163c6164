//! Web font conversion.
//!
//! TrueType and OpenType fonts are wrapped, not subset or re-hinted: WOFF
//! compresses every table with zlib, WOFF2 compresses all tables as one
//! Brotli stream. Outputs replace the extension (`a.ttf` → `a.woff`).

mod sfnt;
mod woff;
mod woff2;

use std::io;

use thiserror::Error;

use crate::pipeline::{FileTransform, StageError, VirtualFile};

#[derive(Debug, Error)]
pub enum FontError {
    #[error("font collections (ttcf) are not supported")]
    Collection,
    #[error("not a TrueType or OpenType font")]
    NotSfnt,
    #[error("truncated font ({0})")]
    Truncated(&'static str),
    #[error("compression failed: {0}")]
    Compress(#[from] io::Error),
}

impl From<FontError> for StageError {
    fn from(err: FontError) -> Self {
        StageError::new(err.to_string())
    }
}

/// `woff` stage.
pub struct ToWoff;

impl FileTransform for ToWoff {
    fn name(&self) -> &'static str {
        "woff"
    }

    fn transform(&self, file: VirtualFile) -> Result<VirtualFile, StageError> {
        let woff = woff::encode(&file.contents)?;
        Ok(file.with_contents(woff).with_extension("woff"))
    }
}

/// `woff2` stage.
pub struct ToWoff2;

impl FileTransform for ToWoff2 {
    fn name(&self) -> &'static str {
        "woff2"
    }

    fn transform(&self, file: VirtualFile) -> Result<VirtualFile, StageError> {
        let woff2 = woff2::encode(&file.contents)?;
        Ok(file.with_contents(woff2).with_extension("woff2"))
    }
}

/// Minimal valid sfnt for tests in other modules.
#[cfg(test)]
pub fn sample_font() -> Vec<u8> {
    sfnt::build(
        sfnt::TRUETYPE,
        &[
            (b"head", &[0u8; 54]),
            (b"glyf", &[0x11; 128]),
            (b"loca", &[0, 0, 0, 128]),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_stages_rename() {
        let file = VirtualFile::generated("mono/Fira.otf", sample_font());
        let woff = ToWoff.transform(file.clone()).unwrap();
        let woff2 = ToWoff2.transform(file).unwrap();

        assert_eq!(woff.rel, Path::new("mono/Fira.woff"));
        assert_eq!(woff2.rel, Path::new("mono/Fira.woff2"));
        assert_eq!(&woff.contents[..4], b"wOFF");
        assert_eq!(&woff2.contents[..4], b"wOF2");
    }

    #[test]
    fn test_invalid_font_is_stage_error() {
        let err = ToWoff2
            .transform(VirtualFile::generated("bad.ttf", b"nope".to_vec()))
            .unwrap_err();
        assert!(err.message.contains("truncated") || err.message.contains("not a"));
    }
}
