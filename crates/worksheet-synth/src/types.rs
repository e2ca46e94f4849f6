use image::DynamicImage;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Image decode failure: {0}")]
    ImageDecodeFailure(String),
    #[error("Export failure: {0}")]
    ExportFailure(String),
    #[error("Network acquisition failure: {0}")]
    NetworkAcquisitionFailure(String),
    #[error("Generation failed: {0}")]
    Generation(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, SynthError>;

/// Which kind of document a synthesis input describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Worksheet,
    Exam,
    /// A full-page worksheet produced as a single generated image
    WorksheetImage,
}

/// Read-only display parameters supplied by the branding form.
///
/// Passed explicitly into both the view and the document pipeline so the two
/// targets always see the same header text and logo.
#[derive(Debug, Clone, Default)]
pub struct BrandingOptions {
    /// Replaces the institution name (exams) or sits above the title (worksheets)
    pub header_text_override: Option<String>,
    /// Decoded logo raster
    pub logo: Option<Arc<DynamicImage>>,
}

impl BrandingOptions {
    pub fn with_header(mut self, text: impl Into<String>) -> Self {
        self.header_text_override = Some(text.into());
        self
    }

    pub fn with_logo(mut self, logo: DynamicImage) -> Self {
        self.logo = Some(Arc::new(logo));
        self
    }

    /// The override text, if one is set and not blank
    pub fn header_override(&self) -> Option<&str> {
        self.header_text_override
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub fn has_logo(&self) -> bool {
        self.logo.is_some()
    }
}
