use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SlidegenError;

/// Video containers accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Mp4,
    Mov,
    Mkv,
    Webm,
    Avi,
}

impl MediaFormat {
    pub const ALL: [MediaFormat; 5] = [
        MediaFormat::Mp4,
        MediaFormat::Mov,
        MediaFormat::Mkv,
        MediaFormat::Webm,
        MediaFormat::Avi,
    ];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp4" | "m4v" => Some(Self::Mp4),
            "mov" => Some(Self::Mov),
            "mkv" => Some(Self::Mkv),
            "webm" => Some(Self::Webm),
            "avi" => Some(Self::Avi),
            _ => None,
        }
    }

    /// Detects the format from an upload filename, rejecting anything that is
    /// not one of the `accepted` containers.
    pub fn from_filename(filename: &str, accepted: &[MediaFormat]) -> Result<Self, SlidegenError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match Self::from_extension(ext) {
            Some(format) if accepted.contains(&format) => Ok(format),
            _ => {
                let allowed: Vec<&str> = accepted.iter().map(|f| f.extension()).collect();
                Err(SlidegenError::UnsupportedMedia(format!(
                    "'{}' is not a supported video file (accepted: {})",
                    filename,
                    allowed.join(", ")
                )))
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::Mkv => "mkv",
            Self::Webm => "webm",
            Self::Avi => "avi",
        }
    }

    pub fn mime_type(&self) -> String {
        mime_guess::from_ext(self.extension())
            .first_or_octet_stream()
            .to_string()
    }
}
