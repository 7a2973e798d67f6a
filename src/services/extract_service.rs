use crate::error::{Error, Result};
use std::path::PathBuf;
use tokio::fs;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Decides the document kind from the declared content type, falling back
    /// to the file extension.
    pub fn detect(content_type: Option<&str>, filename: Option<&str>) -> Option<Self> {
        match content_type.map(|ct| ct.split(';').next().unwrap_or(ct).trim()) {
            Some("application/pdf") => return Some(DocumentKind::Pdf),
            Some("text/plain") => return Some(DocumentKind::PlainText),
            _ => {}
        }

        let ext = filename
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("pdf") => Some(DocumentKind::Pdf),
            Some("txt") => Some(DocumentKind::PlainText),
            _ => None,
        }
    }
}

/// Turns an uploaded document into plain text. PDFs go through `pdftotext`.
#[derive(Clone)]
pub struct ExtractService {
    pdftotext: String,
}

impl Default for ExtractService {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

impl ExtractService {
    pub fn new(pdftotext: impl Into<String>) -> Self {
        Self {
            pdftotext: pdftotext.into(),
        }
    }

    pub async fn extract_text(&self, kind: DocumentKind, data: &[u8]) -> Result<String> {
        let text = match kind {
            DocumentKind::PlainText => String::from_utf8(data.to_vec())
                .map_err(|_| Error::Extraction("Text file is not valid UTF-8".to_string()))?,
            DocumentKind::Pdf => {
                if !data.starts_with(b"%PDF") {
                    return Err(Error::BadRequest("Invalid PDF file content".into()));
                }
                self.pdf_to_text(data).await?
            }
        };

        if text.trim().is_empty() {
            return Err(Error::Extraction(
                "No text could be extracted from the document".to_string(),
            ));
        }
        tracing::info!(chars = text.chars().count(), "Extracted text from document");
        Ok(text)
    }

    async fn pdf_to_text(&self, data: &[u8]) -> Result<String> {
        let path: PathBuf =
            std::env::temp_dir().join(format!("mcq_upload_{}.pdf", uuid::Uuid::new_v4()));
        fs::write(&path, data).await?;

        let output = Command::new(&self.pdftotext)
            .arg("-layout")
            .arg(&path)
            .arg("-")
            .output()
            .await;
        let _ = fs::remove_file(&path).await;

        match output {
            Ok(out) if out.status.success() => Ok(String::from_utf8_lossy(&out.stdout).to_string()),
            Ok(out) => {
                tracing::error!("pdftotext failed: {}", String::from_utf8_lossy(&out.stderr));
                Err(Error::Extraction("Failed to extract text from PDF".to_string()))
            }
            Err(e) => {
                tracing::error!("Failed to run pdftotext: {}", e);
                Err(Error::Extraction("Failed to extract text from PDF".to_string()))
            }
        }
    }
}
