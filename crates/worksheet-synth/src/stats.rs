use std::collections::BTreeMap;

use image::DynamicImage;

use crate::layout::{LayoutContext, answer_line_count, total_marks};
use crate::model::SynthesisInput;
use crate::options::SynthesisOptions;
use crate::render::{RenderTarget, synthesize_view};
use crate::types::{BrandingOptions, DocumentKind};

/// Summary of a synthesis input
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStatistics {
    pub kind: DocumentKind,
    /// Section count per type tag (worksheets only)
    pub sections_by_kind: BTreeMap<&'static str, usize>,
    /// Image sections with a bounding box into the reference image
    pub cropped_sections: usize,
    pub questions: usize,
    pub total_marks: u32,
    /// Answer lines reserved across all questions
    pub answer_lines: usize,
    /// Pages in the print layout
    pub pages: usize,
}

/// Calculate statistics for `input`.
///
/// `reference` is the image bounding boxes crop from, so the page count
/// matches the print view the user sees.
pub fn calculate_statistics(
    input: &SynthesisInput,
    branding: &BrandingOptions,
    reference: Option<&DynamicImage>,
    options: &SynthesisOptions,
) -> DocumentStatistics {
    let mut sections_by_kind = BTreeMap::new();
    let mut cropped_sections = 0;
    let mut questions = 0;
    let mut marks = 0;
    let mut answer_lines = 0;

    match input {
        SynthesisInput::Worksheet(data) => {
            for section in &data.sections {
                *sections_by_kind.entry(section.kind().tag()).or_insert(0) += 1;
                if section.is_image_section() && section.bounding_box.is_some() {
                    cropped_sections += 1;
                }
            }
        }
        SynthesisInput::Exam(data) => {
            questions = data.questions.len();
            marks = total_marks(&data.questions);
            answer_lines = data
                .questions
                .iter()
                .map(|question| answer_line_count(question.marks))
                .sum();
        }
        SynthesisInput::WorksheetImage(_) => {}
    }

    let mut ctx = LayoutContext::new();
    if let Some(reference) = reference {
        ctx = ctx.with_reference(reference);
    }
    let view = synthesize_view(input, branding, &ctx, options, RenderTarget::Print);

    DocumentStatistics {
        kind: input.kind(),
        sections_by_kind,
        cropped_sections,
        questions,
        total_marks: marks,
        answer_lines,
        pages: view.page_count(),
    }
}
