//! Format-specific document loaders
//!
//! Each loader extracts plain text from one file format and returns it
//! as sections. PDF output is split per page so chunks keep a page
//! number; DOCX and HTML produce a single section without one.

use crate::error::{Error, Result};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Extracted text with its source position, before splitting
#[derive(Debug, Clone)]
pub struct RawSection {
    pub text: String,
    pub page: Option<i64>,
}

/// File extensions accepted for upload
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx", "html"];

/// Load a document, dispatching on the file extension
pub fn load_document(path: &Path) -> Result<Vec<RawSection>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    debug!("Loading {:?} as .{}", path, extension);

    match extension.as_str() {
        "pdf" => load_pdf(path),
        "docx" => load_docx(path),
        "html" => load_html(path),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported file type '.{}' (supported: {})",
            extension,
            SUPPORTED_EXTENSIONS.join(", ")
        ))),
    }
}

/// Extract PDF text, one section per page
///
/// pdf-extract separates pages with form feeds; empty pages are dropped
/// but page numbering still counts them.
fn load_pdf(path: &Path) -> Result<Vec<RawSection>> {
    let text = pdf_extract::extract_text(path)
        .map_err(|e| Error::Parse(format!("Failed to extract PDF text: {}", e)))?;

    let sections = text
        .split('\u{c}')
        .enumerate()
        .filter(|(_, page_text)| !page_text.trim().is_empty())
        .map(|(index, page_text)| RawSection {
            text: page_text.trim().to_string(),
            page: Some(index as i64 + 1),
        })
        .collect();

    Ok(sections)
}

/// Extract DOCX text from the word/document.xml part
///
/// A .docx file is a zip archive; the body text lives in `w:t` runs
/// inside `word/document.xml`. Paragraph ends become newlines.
fn load_docx(path: &Path) -> Result<Vec<RawSection>> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| Error::Parse(format!("Not a valid DOCX archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| Error::Parse(format!("DOCX is missing word/document.xml: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| Error::Parse(format!("Failed to read DOCX body: {}", e)))?;

    let text = extract_docx_text(&xml)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![RawSection { text, page: None }])
}

fn extract_docx_text(xml: &str) -> Result<String> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader
            .read_event()
            .map_err(|e| Error::Parse(format!("Malformed DOCX XML: {}", e)))?
        {
            Event::Start(ref e) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Event::End(ref e) if e.local_name().as_ref() == b"t" => in_text_run = false,
            Event::End(ref e) if e.local_name().as_ref() == b"p" => {
                if !text.ends_with('\n') && !text.is_empty() {
                    text.push('\n');
                }
            }
            Event::Text(t) if in_text_run => {
                let run = t
                    .unescape()
                    .map_err(|e| Error::Parse(format!("Malformed DOCX XML: {}", e)))?;
                text.push_str(&run);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

/// Extract readable text from an HTML file
fn load_html(path: &Path) -> Result<Vec<RawSection>> {
    let content = std::fs::read_to_string(path)?;
    let document = scraper::Html::parse_document(&content);

    // Render the body when there is one, otherwise the whole document
    let fragment = scraper::Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next().map(|body| body.html()))
        .unwrap_or_else(|| document.html());

    let text = html2text::from_read(fragment.as_bytes(), 80)
        .map_err(|e| Error::Parse(format!("Failed to render HTML text: {}", e)))?;

    let text = text.trim().to_string();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![RawSection { text, page: None }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_unsupported_extension_rejected() {
        let err = load_document(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref msg) if msg.contains(".txt")));

        let err = load_document(Path::new("no_extension")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        // Dispatch accepts .HTML; the load itself fails on the missing file
        let err = load_document(Path::new("/nonexistent/page.HTML")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_load_html_extracts_body_text() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("page.html");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            "<html><head><title>skip</title></head>\
             <body><h1>Heading</h1><p>Body paragraph.</p></body></html>"
        )
        .unwrap();

        let sections = load_document(&path).unwrap();
        assert_eq!(sections.len(), 1);
        assert!(sections[0].text.contains("Heading"));
        assert!(sections[0].text.contains("Body paragraph."));
        assert_eq!(sections[0].page, None);
    }

    #[test]
    fn test_load_html_empty_body_yields_no_sections() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.html");
        std::fs::write(&path, "<html><body>   </body></html>").unwrap();

        let sections = load_document(&path).unwrap();
        assert!(sections.is_empty());
    }

    #[test]
    fn test_corrupt_docx_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.docx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_extract_docx_text_reads_runs_and_paragraphs() {
        let xml = r#"<?xml version="1.0"?>
            <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
              <w:body>
                <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
                <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>
              </w:body>
            </w:document>"#;

        let text = extract_docx_text(xml).unwrap();
        assert_eq!(text, "First paragraph.\nSecond paragraph.\n");
    }
}
