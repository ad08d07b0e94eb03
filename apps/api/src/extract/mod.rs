//! Document text extraction for uploaded course and exam files.
//!
//! Dispatch is by lowercased file extension. Failures are reported per file as
//! an `ExtractionFailure`; one bad file never aborts the rest of an upload.

mod office;
mod pdf;
mod sheet;

use std::path::Path;

use bytes::Bytes;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Format non supporté : '{extension}'")]
    Unsupported { extension: String },

    #[error("Erreur lors de la lecture du fichier texte : {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Erreur lors de la lecture du PDF : {0}")]
    Pdf(String),

    #[error("Erreur lors de la lecture de l'archive Office : {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Document Office incomplet : partie '{0}' absente")]
    MissingPart(String),

    #[error("Erreur lors de l'analyse XML : {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Erreur lors de la lecture du tableur : {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Le classeur ne contient aucune feuille")]
    EmptyWorkbook,

    #[error("L'extraction a été interrompue : {0}")]
    Aborted(String),

    #[error("Aucun texte n'a pu être extrait du fichier")]
    NoText,
}

impl ExtractError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            ExtractError::Unsupported { .. } => "unsupported_format",
            ExtractError::Utf8(_) => "invalid_text_encoding",
            ExtractError::Pdf(_) => "pdf_error",
            ExtractError::Archive(_) | ExtractError::MissingPart(_) => "office_archive_error",
            ExtractError::Xml(_) => "office_xml_error",
            ExtractError::Spreadsheet(_) | ExtractError::EmptyWorkbook => "spreadsheet_error",
            ExtractError::Aborted(_) => "extraction_aborted",
            ExtractError::NoText => "no_text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Pdf,
    Docx,
    Pptx,
    Spreadsheet,
}

impl DocumentFormat {
    /// Sniffs the format from the file name's extension, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => Ok(DocumentFormat::Text),
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "pptx" => Ok(DocumentFormat::Pptx),
            "xls" | "xlsx" => Ok(DocumentFormat::Spreadsheet),
            _ => Err(ExtractError::Unsupported { extension }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Prefix each PDF page with `Page {n} of '{file_name}'`.
    pub annotate_pdf_pages: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            annotate_pdf_pages: true,
        }
    }
}

/// Extracts plain text from one file.
pub fn extract(
    file_name: &str,
    content: &[u8],
    options: &ExtractOptions,
) -> Result<String, ExtractError> {
    let format = DocumentFormat::from_file_name(file_name)?;
    debug!("Extracting {file_name} as {format:?} ({} bytes)", content.len());

    match format {
        DocumentFormat::Text => Ok(String::from_utf8(content.to_vec())?),
        DocumentFormat::Pdf => pdf::pdf_text(file_name, content, options.annotate_pdf_pages),
        DocumentFormat::Docx => office::docx_text(content),
        DocumentFormat::Pptx => office::pptx_text(content),
        DocumentFormat::Spreadsheet => sheet::first_sheet_table(content),
    }
}

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content: Bytes,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedDocument {
    pub file_name: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractionFailure {
    pub file_name: String,
    pub code: &'static str,
    #[serde(serialize_with = "serialize_display")]
    pub reason: ExtractError,
}

impl ExtractionFailure {
    pub fn new(file_name: String, reason: ExtractError) -> Self {
        Self {
            file_name,
            code: reason.code(),
            reason,
        }
    }
}

fn serialize_display<S: Serializer>(
    error: &ExtractError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Extracted(ExtractedDocument),
    Failed(ExtractionFailure),
}

/// Extracts one upload on the blocking pool. A decoder panic is reported as
/// an `Aborted` failure for this file only; a file with no text at all is a
/// `NoText` failure.
pub async fn extract_upload(
    upload: Upload,
    options: ExtractOptions,
) -> Result<ExtractedDocument, ExtractionFailure> {
    let file_name = upload.file_name.clone();

    let joined = tokio::task::spawn_blocking(move || {
        extract(&upload.file_name, &upload.content, &options)
    })
    .await;

    let result = joined
        .unwrap_or_else(|e| Err(ExtractError::Aborted(e.to_string())))
        .and_then(|text| {
            if text.trim().is_empty() {
                Err(ExtractError::NoText)
            } else {
                Ok(text)
            }
        });

    match result {
        Ok(text) => Ok(ExtractedDocument { file_name, text }),
        Err(reason) => {
            warn!("Extraction failed for {file_name}: {reason}");
            Err(ExtractionFailure::new(file_name, reason))
        }
    }
}

/// Extracts every upload in order, one outcome per file.
pub async fn extract_all(uploads: Vec<Upload>, options: ExtractOptions) -> Vec<ExtractionOutcome> {
    let mut outcomes = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let outcome = match extract_upload(upload, options).await {
            Ok(doc) => ExtractionOutcome::Extracted(doc),
            Err(failure) => ExtractionOutcome::Failed(failure),
        };
        outcomes.push(outcome);
    }
    outcomes
}
