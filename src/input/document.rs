//! Documents as handed to the pipeline

use crate::error::{Result, ScreenerError};
use crate::input::media_type::MediaType;
use log::info;
use std::path::Path;
use tokio::fs;

/// Declared for files whose extension is not recognized
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Raw bytes plus the media type the caller declares for them
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Read a file, declaring its media type from the extension
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ScreenerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let media_type = Self::declared_type(path);
        let bytes = fs::read(path).await?;
        info!("Loaded {} ({} bytes, {})", path.display(), bytes.len(), media_type);

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, bytes, media_type))
    }

    /// Media type implied by the file extension
    pub fn declared_type(path: &Path) -> &'static str {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(MediaType::from_extension)
            .map_or(UNKNOWN_MEDIA_TYPE, |media| media.as_str())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
