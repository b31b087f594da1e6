//! Transcript assembly and the exporter abstraction.

pub mod transcript;

pub use transcript::Transcript;

use rollcall_types::export::{ExportError, ExportOptions};

/// Trait for document exporter backends.
///
/// Implementations live in rollcall-infra (e.g., `DocxExporter`). The
/// exporter is pure: it turns an assembled transcript into bytes and
/// never touches session or store state.
pub trait TranscriptExporter: Send + Sync {
    /// File extension without the dot (e.g., "docx").
    fn file_extension(&self) -> &str;

    /// MIME type for download responses.
    fn content_type(&self) -> &str;

    /// Render the transcript into a document byte buffer.
    fn export(&self, transcript: &Transcript, options: &ExportOptions)
    -> Result<Vec<u8>, ExportError>;
}
