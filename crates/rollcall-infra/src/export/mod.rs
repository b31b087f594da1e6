//! Transcript document rendering.

pub mod docx;

pub use docx::DocxExporter;
