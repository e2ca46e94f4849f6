use std::future::Future;
use std::sync::Arc;

use image::DynamicImage;
use serde_json::Value;
use worksheet_synth::{DocumentKind, SynthError};

/// What the worker asks the content generator for
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    /// A whole document of `kind`, optionally grounded on a reference image
    Document {
        kind: DocumentKind,
        prompt: String,
        reference: Option<Arc<DynamicImage>>,
    },
    /// A replacement illustration for one image section
    SectionImage { section_id: String, prompt: String },
}

/// Raw generator output. JSON is validated by the worker; image URLs are used
/// as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorOutput {
    Json(Value),
    ImageUrl(String),
}

/// The AI content service. Only its output contract matters here.
pub trait ContentGenerator: Send + Sync + 'static {
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = Result<GeneratorOutput, SynthError>> + Send;
}
