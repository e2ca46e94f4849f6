//! Portable document export
//!
//! Builds a [`DocumentOutline`] straight from the data model through the shared
//! layout derivation, then typesets it to PDF. Nothing is read back from a
//! rendered view.

mod composer;
mod exam;
mod fonts;
mod outline;
mod worksheet;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;

use crate::layout::LayoutContext;
use crate::model::{GeneratedWorksheetImage, SynthesisInput};
use crate::options::SynthesisOptions;
use crate::raster::{decode_data_url, decode_image, encode_png};
use crate::types::{BrandingOptions, Result, SynthError};

pub use composer::compose_pdf;
pub use exam::exam_outline;
pub use outline::*;
pub use worksheet::{worksheet_image_outline, worksheet_outline};

/// Outline for any synthesis input
pub fn document_outline(
    input: &SynthesisInput,
    branding: &BrandingOptions,
    reference: Option<&DynamicImage>,
    options: &SynthesisOptions,
) -> Result<DocumentOutline> {
    match input {
        SynthesisInput::Exam(data) => Ok(exam_outline(data, branding)),
        SynthesisInput::Worksheet(data) => {
            let mut ctx = LayoutContext::new();
            ctx.reference = reference;
            Ok(worksheet_outline(data, branding, &ctx, &options.footer_text))
        }
        SynthesisInput::WorksheetImage(image) => {
            worksheet_image_outline(image, branding, &options.footer_text)
        }
    }
}

/// Produce the portable document for `input`.
///
/// Typesetting runs on a blocking task. Any fault along the way comes back as
/// `ExportFailure`; callers keep whatever they were displaying.
pub async fn synthesize_document(
    input: &SynthesisInput,
    branding: &BrandingOptions,
    reference: Option<Arc<DynamicImage>>,
    options: &SynthesisOptions,
) -> Result<Vec<u8>> {
    let input = input.clone();
    let branding = branding.clone();
    let options = options.clone();

    let result = tokio::task::spawn_blocking(move || {
        let outline = document_outline(&input, &branding, reference.as_deref(), &options)?;
        compose_pdf(&outline, &options)
    })
    .await;

    match result {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e @ SynthError::ExportFailure(_))) => Err(e),
        Ok(Err(e)) => Err(SynthError::ExportFailure(e.to_string())),
        Err(e) => Err(SynthError::ExportFailure(format!("Export task failed: {}", e))),
    }
}

/// Synthesize the document and write it into `output_dir` under
/// [`document_file_name`]. Returns the written path.
pub async fn export_document(
    input: &SynthesisInput,
    branding: &BrandingOptions,
    reference: Option<Arc<DynamicImage>>,
    options: &SynthesisOptions,
    output_dir: impl AsRef<Path>,
    timestamp_millis: i64,
) -> Result<PathBuf> {
    let bytes = synthesize_document(input, branding, reference, options).await?;
    let path = output_dir
        .as_ref()
        .join(document_file_name(input, timestamp_millis));
    tokio::fs::write(&path, bytes).await?;
    log::info!("Exported {}", path.display());
    Ok(path)
}

/// PNG bytes of a full-page generated worksheet
pub async fn synthesize_raster(image: &GeneratedWorksheetImage) -> Result<Vec<u8>> {
    let url = image.url.clone();
    let result = tokio::task::spawn_blocking(move || {
        let bytes = decode_data_url(&url)?;
        encode_png(&decode_image(&bytes)?)
    })
    .await;

    match result {
        Ok(Ok(png)) => Ok(png),
        Ok(Err(e @ SynthError::ExportFailure(_))) => Err(e),
        Ok(Err(e)) => Err(SynthError::ExportFailure(e.to_string())),
        Err(e) => Err(SynthError::ExportFailure(format!("Export task failed: {}", e))),
    }
}

/// `<subject>-Exam-<millis>.pdf` for exams, `<subject>-Worksheet-<millis>.pdf`
/// for worksheets
pub fn document_file_name(input: &SynthesisInput, timestamp_millis: i64) -> String {
    let subject = input
        .subject()
        .map(sanitize_file_stem)
        .filter(|s| !s.is_empty());

    match (input, subject) {
        (SynthesisInput::Exam(_), Some(subject)) => export_file_name(&subject, timestamp_millis),
        (SynthesisInput::Exam(_), None) => format!("Exam-{}.pdf", timestamp_millis),
        (_, subject) => format!(
            "{}-Worksheet-{}.pdf",
            subject.as_deref().unwrap_or("worksheet"),
            timestamp_millis
        ),
    }
}

/// `<subject>-Exam-<millis>.pdf`
pub fn export_file_name(subject: &str, timestamp_millis: i64) -> String {
    format!("{}-Exam-{}.pdf", sanitize_file_stem(subject), timestamp_millis)
}

/// `worksheet-<millis>.png`
pub fn raster_file_name(timestamp_millis: i64) -> String {
    format!("worksheet-{}.png", timestamp_millis)
}

fn sanitize_file_stem(stem: &str) -> String {
    stem.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(export_file_name("Physics", 1700000000000), "Physics-Exam-1700000000000.pdf");
        assert_eq!(export_file_name("A/B", 1), "A_B-Exam-1.pdf");
        assert_eq!(raster_file_name(42), "worksheet-42.png");
    }
}
