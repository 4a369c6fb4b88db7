use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::error::{CreditmarkError, CreditmarkResult};

/// The single bundled caption font, resolved once at startup.
///
/// The font path is not overridable per image; it participates in the
/// settings digest so a swapped font invalidates cached variants.
#[derive(Clone, Debug)]
pub struct FontAsset {
    path: PathBuf,
    bytes: Arc<Vec<u8>>,
}

impl FontAsset {
    /// Load the font file from disk.
    ///
    /// A missing or unreadable font is a fatal configuration error: without
    /// it no caption can ever be rendered, so this must fail fast at startup
    /// rather than per request.
    pub fn load(path: impl AsRef<Path>) -> CreditmarkResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            CreditmarkError::config(format!("read caption font '{}': {e}", path.display()))
        })?;
        if bytes.is_empty() {
            return Err(CreditmarkError::config(format!(
                "caption font '{}' is empty",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            bytes: Arc::new(bytes),
        })
    }

    /// Build a font asset from in-memory bytes (e.g. an embedded font).
    pub fn from_bytes(label: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: label.into(),
            bytes: Arc::new(bytes),
        }
    }

    pub fn path_str(&self) -> std::borrow::Cow<'_, str> {
        self.path.to_string_lossy()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
