//! PDF text extraction using lopdf, with pdf-extract as a whole-document fallback.

use lopdf::Document;
use tracing::{debug, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF text extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    page_separator: String,
    max_pages: usize,
}

/// Extracted content from a PDF.
#[derive(Debug, Clone)]
pub struct PdfContent {
    /// Page texts joined with the page separator.
    pub text: String,
    /// Pages with their content.
    pub pages: Vec<PdfPage>,
    /// Whether the text came from the whole-document fallback.
    pub used_fallback: bool,
}

/// Content from a single PDF page.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text from this page.
    pub text: String,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            page_separator: "\n".to_string(),
            max_pages: 0,
        }
    }

    /// Set the string placed between page texts.
    pub fn with_page_separator(mut self, separator: impl Into<String>) -> Self {
        self.page_separator = separator.into();
        self
    }

    /// Limit the number of pages read (0 = unlimited).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Extract every page and the joined document text.
    pub fn extract_all(&self) -> Result<PdfContent> {
        let texts = self.page_texts()?;

        if texts.iter().all(|t| t.trim().is_empty()) {
            warn!("No text found on any page, falling back to whole-document extraction");
            let text = self.fallback_text()?;
            return Ok(PdfContent {
                text,
                pages: Vec::new(),
                used_fallback: true,
            });
        }

        let text = texts.join(&self.page_separator);
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PdfPage {
                number: i as u32 + 1,
                text,
            })
            .collect::<Vec<_>>();

        debug!("Extracted {} chars from {} pages", text.len(), pages.len());

        Ok(PdfContent {
            text,
            pages,
            used_fallback: false,
        })
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    fn pages_to_read(&self) -> u32 {
        let count = self.page_count();
        if self.max_pages > 0 {
            count.min(self.max_pages as u32)
        } else {
            count
        }
    }

    fn fallback_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // Keep a decrypted copy for the pdf-extract fallback
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted_data
        } else {
            data.to_vec()
        };

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.raw_data = raw_data;
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }

        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn page_texts(&self) -> Result<Vec<String>> {
        self.document()?;

        let mut texts = Vec::new();
        for page in 1..=self.pages_to_read() {
            match self.extract_page_text(page) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    warn!("Failed to extract text from page {}: {}", page, e);
                    texts.push(String::new());
                }
            }
        }
        Ok(texts)
    }

    fn extract_text(&self) -> Result<String> {
        Ok(self.extract_all()?.text)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, StringFormat, dictionary};
    use md5::{Digest, Md5};

    /// Build an in-memory PDF with one page per entry in `pages`.
    pub(crate) fn build_pdf(pages: &[&str]) -> Vec<u8> {
        save(build_document(pages))
    }

    fn save(mut doc: Document) -> Vec<u8> {
        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();
        data
    }

    /// One page per entry; an empty entry gives a page without text operators.
    fn build_document(pages: &[&str]) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids = Vec::new();
        for text in pages {
            let operations = if text.is_empty() {
                Vec::new()
            } else {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ]
            };
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    /// Password padding from the standard security handler.
    const PAD: [u8; 32] = [
        0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01,
        0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53,
        0x69, 0x7A,
    ];

    fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
        let mut state: Vec<u8> = (0..=255).collect();
        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
            state.swap(i, j as usize);
        }

        let (mut i, mut j) = (0u8, 0u8);
        data.iter()
            .map(|byte| {
                i = i.wrapping_add(1);
                j = j.wrapping_add(state[i as usize]);
                state.swap(i as usize, j as usize);
                byte ^ state[state[i as usize].wrapping_add(state[j as usize]) as usize]
            })
            .collect()
    }

    /// Single-page PDF encrypted with 40-bit RC4 (revision 2).
    fn build_encrypted_pdf(text: &str, user_password: &[u8]) -> Vec<u8> {
        let mut doc = build_document(&[text]);
        let owner = [0x11u8; 32];
        let permissions: i32 = -4;
        let file_id = b"invex-fixture-01".to_vec();

        let mut padded = user_password[..user_password.len().min(32)].to_vec();
        padded.extend_from_slice(&PAD[..32 - padded.len()]);

        let mut hasher = Md5::new();
        hasher.update(&padded);
        hasher.update(owner);
        hasher.update((permissions as u32).to_le_bytes());
        hasher.update(&file_id);
        let key = hasher.finalize()[..5].to_vec();

        for (&(number, generation), object) in doc.objects.iter_mut() {
            if let Object::Stream(stream) = object {
                let mut object_key = key.clone();
                object_key.extend_from_slice(&number.to_le_bytes()[..3]);
                object_key.extend_from_slice(&generation.to_le_bytes());
                let digest = Md5::digest(&object_key);
                let encrypted = rc4(&digest[..10], &stream.content);
                stream.set_content(encrypted);
            }
        }

        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
            "Length" => 40,
            "P" => i64::from(permissions),
            "O" => Object::String(owner.to_vec(), StringFormat::Hexadecimal),
            "U" => Object::String(rc4(&key, &PAD), StringFormat::Hexadecimal),
            "CF" => dictionary! {
                "StdCF" => dictionary! { "CFM" => "V2" },
            },
        });
        doc.trailer.set("Encrypt", encrypt_id);
        doc.trailer.set(
            "ID",
            vec![
                Object::String(file_id.clone(), StringFormat::Hexadecimal),
                Object::String(file_id, StringFormat::Hexadecimal),
            ],
        );
        save(doc)
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.page_texts().is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        let err = extractor.load(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_load_rejects_empty_document() {
        let mut extractor = PdfExtractor::new();
        let err = extractor.load(&build_pdf(&[])).unwrap_err();
        assert!(matches!(err, PdfError::NoPages | PdfError::Parse(_)));
        assert!(extractor.document.is_none());
    }

    #[test]
    fn test_page_texts_in_order() {
        let mut extractor = PdfExtractor::new();
        extractor
            .load(&build_pdf(&["Invoice INV-001", "Total 150.00"]))
            .unwrap();

        assert_eq!(extractor.page_count(), 2);
        let pages = extractor.page_texts().unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("INV-001"));
        assert!(pages[1].contains("150.00"));

        let content = extractor.extract_all().unwrap();
        assert!(!content.used_fallback);
        let first = content.text.find("INV-001").unwrap();
        let second = content.text.find("150.00").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_max_pages_limits_reading() {
        let mut extractor = PdfExtractor::new().with_max_pages(1);
        extractor.load(&build_pdf(&["first", "second"])).unwrap();

        let pages = extractor.page_texts().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(extractor.page_count(), 2);
    }

    #[test]
    fn test_invalid_page() {
        let mut extractor = PdfExtractor::new();
        extractor.load(&build_pdf(&["only page"])).unwrap();

        assert!(matches!(
            extractor.extract_page_text(0),
            Err(PdfError::InvalidPage(0))
        ));
        assert!(matches!(
            extractor.extract_page_text(2),
            Err(PdfError::InvalidPage(2))
        ));
    }

    #[test]
    fn test_fallback_when_pages_have_no_text() {
        let mut extractor = PdfExtractor::new();
        extractor.load(&build_pdf(&["", ""])).unwrap();
        assert_eq!(extractor.page_count(), 2);

        let content = extractor.extract_all().unwrap();
        assert!(content.used_fallback);
        assert!(content.pages.is_empty());
        assert!(content.text.trim().is_empty());
    }

    #[test]
    fn test_decrypts_empty_user_password() {
        let mut extractor = PdfExtractor::new();
        extractor
            .load(&build_encrypted_pdf("Invoice INV-042", b""))
            .unwrap();

        let content = extractor.extract_all().unwrap();
        assert!(!content.used_fallback);
        assert!(content.text.contains("INV-042"));
        assert!(!Document::load_mem(&extractor.raw_data).unwrap().is_encrypted());
    }

    #[test]
    fn test_rejects_password_protected() {
        let mut extractor = PdfExtractor::new();
        let err = extractor
            .load(&build_encrypted_pdf("Invoice INV-042", b"s3cret"))
            .unwrap_err();
        assert!(matches!(err, PdfError::Encrypted));
        assert!(extractor.document.is_none());
    }

    #[test]
    fn test_failed_reload_keeps_previous_document() {
        let original = build_pdf(&["Invoice INV-001"]);
        let mut extractor = PdfExtractor::new();
        extractor.load(&original).unwrap();

        assert!(extractor.load(&build_pdf(&[])).is_err());
        assert!(extractor.load(&build_encrypted_pdf("x", b"pw")).is_err());
        assert_eq!(extractor.raw_data, original);
        assert_eq!(extractor.page_count(), 1);
        assert!(extractor.extract_text().unwrap().contains("INV-001"));
    }
}
