//! Transcript export options and errors for Rollcall.

use serde::{Deserialize, Serialize};

/// Presentation options for the exported document.
///
/// Pure presentation metadata: none of these fields affect the text that
/// round-trips out of the document. Sizes are in points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_title_size_pt")]
    pub title_size_pt: u32,

    #[serde(default = "default_heading_size_pt")]
    pub heading_size_pt: u32,

    #[serde(default = "default_body_size_pt")]
    pub body_size_pt: u32,
}

fn default_font_family() -> String {
    "Malgun Gothic".to_string()
}

fn default_title_size_pt() -> u32 {
    20
}

fn default_heading_size_pt() -> u32 {
    16
}

fn default_body_size_pt() -> u32 {
    12
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            title_size_pt: default_title_size_pt(),
            heading_size_pt: default_heading_size_pt(),
            body_size_pt: default_body_size_pt(),
        }
    }
}

/// Errors from transcript export and read-back.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("malformed document container: {0}")]
    MalformedContainer(String),

    #[error("missing document part: {0}")]
    MissingPart(String),

    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    #[error("malformed document xml: {0}")]
    MalformedDocument(String),
}
