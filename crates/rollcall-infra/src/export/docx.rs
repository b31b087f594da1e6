//! DocxExporter -- concrete [`TranscriptExporter`] implementation producing
//! OOXML word-processor documents.
//!
//! A `.docx` file is a ZIP archive holding XML parts. The transcript needs
//! three parts: `[Content_Types].xml`, `_rels/.rels`, and
//! `word/document.xml`. Entries are written with the STORE method (no
//! compression), which keeps the container writer self-contained: a local
//! file header per entry, a central directory, and the end-of-central-
//! directory record.
//!
//! The module also provides [`read_document_text`], which walks the
//! container back to `word/document.xml` and extracts paragraph text. It
//! understands exactly the markup this writer produces and is the
//! verification half of the round-trip property.

use chrono::{DateTime, Datelike, Local, Timelike};

use rollcall_core::export::{Transcript, TranscriptExporter};
use rollcall_types::export::{ExportError, ExportOptions};

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELATIONSHIPS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

const DOCUMENT_FOOTER: &str = "</w:body></w:document>";

const LOCAL_FILE_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_FILE_HEADER_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIR_SIG: u32 = 0x0605_4b50;

/// Version needed to extract: 2.0, the minimum for STORE entries.
const ZIP_VERSION: u16 = 20;

/// DOCX transcript exporter.
pub struct DocxExporter;

impl DocxExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptExporter for DocxExporter {
    fn file_extension(&self) -> &str {
        "docx"
    }

    fn content_type(&self) -> &str {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    }

    fn export(
        &self,
        transcript: &Transcript,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, ExportError> {
        let document = render_document_xml(transcript, options);

        let mut zip = ZipWriter::new();
        zip.add_entry("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes());
        zip.add_entry("_rels/.rels", RELATIONSHIPS_XML.as_bytes());
        zip.add_entry("word/document.xml", document.as_bytes());
        Ok(zip.finish())
    }
}

// ---------------------------------------------------------------------------
// OOXML rendering
// ---------------------------------------------------------------------------

/// Render `word/document.xml`: title paragraph, section heading paragraph,
/// then one paragraph per body line. Blank lines become empty paragraphs.
fn render_document_xml(transcript: &Transcript, options: &ExportOptions) -> String {
    let mut body = String::new();
    body.push_str(&styled_paragraph(
        &transcript.title,
        options,
        options.title_size_pt,
        true,
    ));
    body.push_str(&styled_paragraph(
        &transcript.heading,
        options,
        options.heading_size_pt,
        true,
    ));
    for line in transcript.body.lines() {
        if line.is_empty() {
            body.push_str("<w:p></w:p>");
        } else {
            body.push_str(&styled_paragraph(line, options, options.body_size_pt, false));
        }
    }

    format!("{DOCUMENT_HEADER}{body}{DOCUMENT_FOOTER}")
}

/// A single-run paragraph with explicit font, size, and optional bold.
///
/// The font is set for both `w:ascii` and `w:eastAsia` so CJK text renders
/// in the configured face. `w:sz` takes half-points.
fn styled_paragraph(text: &str, options: &ExportOptions, size_pt: u32, bold: bool) -> String {
    let font = escape_xml(&options.font_family);
    let half_points = size_pt * 2;
    let bold_tag = if bold { "<w:b/>" } else { "" };
    format!(
        "<w:p><w:r><w:rPr><w:rFonts w:ascii=\"{font}\" w:eastAsia=\"{font}\"/>{bold_tag}<w:sz w:val=\"{half_points}\"/><w:szCs w:val=\"{half_points}\"/></w:rPr><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// ZIP container writer (STORE method)
// ---------------------------------------------------------------------------

struct ZipEntry {
    name: String,
    crc: u32,
    size: u32,
    offset: u32,
}

struct ZipWriter {
    buf: Vec<u8>,
    entries: Vec<ZipEntry>,
    dos_time: u16,
    dos_date: u16,
}

impl ZipWriter {
    fn new() -> Self {
        let (dos_time, dos_date) = dos_datetime(&Local::now());
        Self {
            buf: Vec::new(),
            entries: Vec::new(),
            dos_time,
            dos_date,
        }
    }

    fn add_entry(&mut self, name: &str, data: &[u8]) {
        let crc = crc32(data);
        let size = data.len() as u32;
        let offset = self.buf.len() as u32;

        self.put_u32(LOCAL_FILE_HEADER_SIG);
        self.put_u16(ZIP_VERSION); // version needed to extract
        self.put_u16(0); // general purpose flags
        self.put_u16(0); // method: STORE
        self.put_u16(self.dos_time);
        self.put_u16(self.dos_date);
        self.put_u32(crc);
        self.put_u32(size); // compressed size (STORE: equal to uncompressed)
        self.put_u32(size); // uncompressed size
        self.put_u16(name.len() as u16);
        self.put_u16(0); // extra field length
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.extend_from_slice(data);

        self.entries.push(ZipEntry {
            name: name.to_string(),
            crc,
            size,
            offset,
        });
    }

    fn finish(mut self) -> Vec<u8> {
        let central_offset = self.buf.len() as u32;
        let entries = std::mem::take(&mut self.entries);

        for entry in &entries {
            self.put_u32(CENTRAL_FILE_HEADER_SIG);
            self.put_u16(ZIP_VERSION); // version made by
            self.put_u16(ZIP_VERSION); // version needed to extract
            self.put_u16(0); // general purpose flags
            self.put_u16(0); // method: STORE
            self.put_u16(self.dos_time);
            self.put_u16(self.dos_date);
            self.put_u32(entry.crc);
            self.put_u32(entry.size);
            self.put_u32(entry.size);
            self.put_u16(entry.name.len() as u16);
            self.put_u16(0); // extra field length
            self.put_u16(0); // comment length
            self.put_u16(0); // disk number start
            self.put_u16(0); // internal file attributes
            self.put_u32(0); // external file attributes
            self.put_u32(entry.offset);
            self.buf.extend_from_slice(entry.name.as_bytes());
        }

        let central_size = self.buf.len() as u32 - central_offset;
        let count = entries.len() as u16;

        self.put_u32(END_OF_CENTRAL_DIR_SIG);
        self.put_u16(0); // disk number
        self.put_u16(0); // disk with central directory
        self.put_u16(count); // entries on this disk
        self.put_u16(count); // entries total
        self.put_u32(central_size);
        self.put_u32(central_offset);
        self.put_u16(0); // comment length

        self.buf
    }

    fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }
}

/// Pack a timestamp into the MS-DOS fields ZIP headers carry.
///
/// Seconds are halved; years before 1980 clamp to the epoch of the format.
fn dos_datetime(now: &DateTime<Local>) -> (u16, u16) {
    let time = ((now.hour() as u16) << 11) | ((now.minute() as u16) << 5) | (now.second() as u16 / 2);
    let year = now.year().clamp(1980, 2107) as u16;
    let date = ((year - 1980) << 9) | ((now.month() as u16) << 5) | (now.day() as u16);
    (time, date)
}

// ---------------------------------------------------------------------------
// CRC-32 (IEEE polynomial, as required by the ZIP format)
// ---------------------------------------------------------------------------

const CRC32_TABLE: [u32; 256] = build_crc32_table();

const fn build_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                0xEDB8_8320 ^ (crc >> 1)
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = CRC32_TABLE[index] ^ (crc >> 8);
    }
    !crc
}

// ---------------------------------------------------------------------------
// Package reader
// ---------------------------------------------------------------------------

/// Extract the paragraph text of `word/document.xml` from a produced
/// package, one line per paragraph.
pub fn read_document_text(bytes: &[u8]) -> Result<String, ExportError> {
    let part = read_part(bytes, "word/document.xml")?
        .ok_or_else(|| ExportError::MissingPart("word/document.xml".to_string()))?;
    let xml = String::from_utf8(part)
        .map_err(|e| ExportError::MalformedDocument(format!("invalid utf-8: {e}")))?;
    Ok(paragraph_texts(&xml).join("\n"))
}

/// Locate an entry by name via the central directory and return its bytes.
fn read_part(bytes: &[u8], name: &str) -> Result<Option<Vec<u8>>, ExportError> {
    let eocd = find_end_of_central_dir(bytes)?;
    let entry_count = read_u16(bytes, eocd + 10)? as usize;
    let mut cursor = read_u32(bytes, eocd + 16)? as usize;

    for _ in 0..entry_count {
        if read_u32(bytes, cursor)? != CENTRAL_FILE_HEADER_SIG {
            return Err(ExportError::MalformedContainer(
                "central directory entry signature mismatch".to_string(),
            ));
        }
        let method = read_u16(bytes, cursor + 10)?;
        let size = read_u32(bytes, cursor + 20)? as usize;
        let name_len = read_u16(bytes, cursor + 28)? as usize;
        let extra_len = read_u16(bytes, cursor + 30)? as usize;
        let comment_len = read_u16(bytes, cursor + 32)? as usize;
        let local_offset = read_u32(bytes, cursor + 42)? as usize;

        if slice(bytes, cursor + 46, name_len)? == name.as_bytes() {
            if method != 0 {
                return Err(ExportError::UnsupportedCompression(method));
            }
            if read_u32(bytes, local_offset)? != LOCAL_FILE_HEADER_SIG {
                return Err(ExportError::MalformedContainer(
                    "local file header signature mismatch".to_string(),
                ));
            }
            // Name/extra lengths in the local header may differ from the
            // central record; the data offset follows the local ones.
            let local_name_len = read_u16(bytes, local_offset + 26)? as usize;
            let local_extra_len = read_u16(bytes, local_offset + 28)? as usize;
            let data_start = local_offset + 30 + local_name_len + local_extra_len;
            return Ok(Some(slice(bytes, data_start, size)?.to_vec()));
        }

        cursor += 46 + name_len + extra_len + comment_len;
    }

    Ok(None)
}

fn find_end_of_central_dir(bytes: &[u8]) -> Result<usize, ExportError> {
    if bytes.len() < 22 {
        return Err(ExportError::MalformedContainer(
            "too short for a zip archive".to_string(),
        ));
    }
    // The record sits at the very end unless a comment follows; scan
    // backward to cover both.
    let mut pos = bytes.len() - 22;
    loop {
        if read_u32(bytes, pos)? == END_OF_CENTRAL_DIR_SIG {
            return Ok(pos);
        }
        if pos == 0 {
            return Err(ExportError::MalformedContainer(
                "end of central directory not found".to_string(),
            ));
        }
        pos -= 1;
    }
}

fn slice(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], ExportError> {
    offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| ExportError::MalformedContainer("truncated archive".to_string()))
}

fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, ExportError> {
    let b = slice(bytes, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, ExportError> {
    let b = slice(bytes, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Collect the text of each `<w:p>...</w:p>` block in document order.
fn paragraph_texts(xml: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find("<w:p>") {
        let after = &rest[start + 5..];
        let Some(end) = after.find("</w:p>") else {
            break;
        };
        paragraphs.push(collect_text_runs(&after[..end]));
        rest = &after[end + 6..];
    }
    paragraphs
}

/// Concatenate every `<w:t>` text node inside one paragraph.
fn collect_text_runs(paragraph: &str) -> String {
    let mut text = String::new();
    let mut rest = paragraph;
    while let Some(start) = rest.find("<w:t") {
        let after = &rest[start..];
        let Some(open_end) = after.find('>') else {
            break;
        };
        let after_open = &after[open_end + 1..];
        let Some(close) = after_open.find("</w:t>") else {
            break;
        };
        text.push_str(&unescape_xml(&after_open[..close]));
        rest = &after_open[close + 6..];
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_transcript(body: &str) -> Transcript {
        Transcript {
            title: "Chat Transcript".to_string(),
            heading: "Answers".to_string(),
            body: body.to_string(),
        }
    }

    fn export(body: &str) -> Vec<u8> {
        DocxExporter::new()
            .export(&make_transcript(body), &ExportOptions::default())
            .unwrap()
    }

    #[test]
    fn test_export_produces_zip_container() {
        let bytes = export("hello");
        assert_eq!(&bytes[..4], b"PK\x03\x04");
    }

    #[test]
    fn test_round_trip_paragraph_text() {
        let bytes = export("first\n\nsecond");
        let text = read_document_text(&bytes).unwrap();
        assert_eq!(text, "Chat Transcript\nAnswers\nfirst\n\nsecond");
    }

    #[test]
    fn test_round_trip_korean_text() {
        let bytes = export("재귀는 자기 자신을 호출하는 함수입니다.");
        let text = read_document_text(&bytes).unwrap();
        assert_eq!(
            text,
            "Chat Transcript\nAnswers\n재귀는 자기 자신을 호출하는 함수입니다."
        );
    }

    #[test]
    fn test_round_trip_escapes_markup() {
        let body = r#"a < b && c > d, "quoted" and 'single'"#;
        let bytes = export(body);
        let text = read_document_text(&bytes).unwrap();
        assert!(text.ends_with(body));
    }

    #[test]
    fn test_empty_body_keeps_title_and_heading() {
        let bytes = export("");
        let text = read_document_text(&bytes).unwrap();
        assert_eq!(text, "Chat Transcript\nAnswers");
    }

    #[test]
    fn test_font_and_sizes_rendered() {
        let options = ExportOptions {
            font_family: "Batang".to_string(),
            title_size_pt: 24,
            heading_size_pt: 16,
            body_size_pt: 11,
        };
        let bytes = DocxExporter::new()
            .export(&make_transcript("content"), &options)
            .unwrap();

        let part = read_part(&bytes, "word/document.xml").unwrap().unwrap();
        let xml = String::from_utf8(part).unwrap();
        assert!(xml.contains(r#"w:ascii="Batang""#));
        assert!(xml.contains(r#"w:eastAsia="Batang""#));
        // Half-point sizes: 24pt title, 11pt body.
        assert!(xml.contains(r#"<w:sz w:val="48"/>"#));
        assert!(xml.contains(r#"<w:sz w:val="22"/>"#));
    }

    #[test]
    fn test_content_types_and_rels_present() {
        let bytes = export("x");
        assert!(read_part(&bytes, "[Content_Types].xml").unwrap().is_some());
        assert!(read_part(&bytes, "_rels/.rels").unwrap().is_some());
        assert!(read_part(&bytes, "word/nonexistent.xml").unwrap().is_none());
    }

    #[test]
    fn test_missing_document_part() {
        let mut zip = ZipWriter::new();
        zip.add_entry("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes());
        let bytes = zip.finish();

        let err = read_document_text(&bytes).unwrap_err();
        assert!(matches!(err, ExportError::MissingPart(_)));
    }

    #[test]
    fn test_unsupported_compression_method() {
        let mut bytes = export("hello");

        // Rewrite the method field of the document's central directory
        // entry to DEFLATE.
        let mut pos = 0;
        while pos + 4 <= bytes.len() {
            if read_u32(&bytes, pos).unwrap() == CENTRAL_FILE_HEADER_SIG {
                let name_len = read_u16(&bytes, pos + 28).unwrap() as usize;
                if slice(&bytes, pos + 46, name_len).unwrap() == b"word/document.xml" {
                    bytes[pos + 10..pos + 12].copy_from_slice(&8u16.to_le_bytes());
                    break;
                }
            }
            pos += 1;
        }

        let err = read_document_text(&bytes).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedCompression(8)));
    }

    #[test]
    fn test_not_a_zip_is_malformed() {
        let err = read_document_text(b"definitely not an archive, far too plain").unwrap_err();
        assert!(matches!(err, ExportError::MalformedContainer(_)));
    }

    #[test]
    fn test_truncated_archive_is_malformed() {
        let bytes = export("hello");
        let err = read_document_text(&bytes[..bytes.len() - 10]).unwrap_err();
        assert!(matches!(err, ExportError::MalformedContainer(_)));
    }

    #[test]
    fn test_crc32_check_value() {
        // Standard CRC-32 check value.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn test_dos_datetime_fields() {
        let dt = Local.with_ymd_and_hms(2025, 8, 10, 14, 2, 33).unwrap();
        let (time, date) = dos_datetime(&dt);
        assert_eq!(time, (14 << 11) | (2 << 5) | 16);
        assert_eq!(date, ((2025 - 1980) << 9) | (8 << 5) | 10);
    }

    #[test]
    fn test_paragraph_texts_merges_split_runs() {
        let xml = "<w:p><w:r><w:t>He</w:t></w:r><w:r><w:t>llo</w:t></w:r></w:p>";
        assert_eq!(paragraph_texts(xml), vec!["Hello".to_string()]);
    }
}
