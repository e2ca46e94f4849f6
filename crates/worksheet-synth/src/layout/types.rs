//! Layout data types
//!
//! These are the descriptors produced from the data model and consumed by the
//! view renderer and the document exporter. They hold no presentation state.

use std::sync::Arc;
use std::time::Instant;

use image::{DynamicImage, RgbaImage};

use super::PendingRegenerations;

/// Inputs to section layout that live outside the data model
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    /// Decoded reference image the bounding boxes point into
    pub reference: Option<&'a DynamicImage>,
    /// Present when the orchestrator wires up per-section regeneration
    pub regeneration: Option<&'a PendingRegenerations>,
    /// Clock reading used to expire pending regenerations
    pub now: Instant,
}

impl<'a> LayoutContext<'a> {
    pub fn new() -> Self {
        Self {
            reference: None,
            regeneration: None,
            now: Instant::now(),
        }
    }

    pub fn with_reference(mut self, reference: &'a DynamicImage) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_regeneration(mut self, pending: &'a PendingRegenerations, now: Instant) -> Self {
        self.regeneration = Some(pending);
        self.now = now;
        self
    }
}

impl Default for LayoutContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Layout of one worksheet section
#[derive(Debug, Clone, PartialEq)]
pub struct SectionLayout {
    pub id: String,
    pub title: Option<String>,
    pub body: SectionBody,
}

/// Per-variant layout
#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Image(ImageLayout),
    /// Two columns of equal length, both in input order
    Matching { left: Vec<String>, right: Vec<String> },
    /// Text fragments; a blank goes between each consecutive pair
    FillBlank { fragments: Vec<String> },
    Drawing {
        prompt: Option<String>,
        canvas_height_pt: f32,
    },
    /// One cell per problem, each followed by an empty answer box
    Math { cells: Vec<String> },
    Text { text: String },
}

impl SectionBody {
    /// Number of blanks in a fill-blank body, zero for every other variant
    pub fn blank_count(&self) -> usize {
        match self {
            SectionBody::FillBlank { fragments } => fragments.len().saturating_sub(1),
            _ => 0,
        }
    }

    /// Fill-blank body as alternating text and blank segments
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let SectionBody::FillBlank { fragments } = self else {
            return Vec::new();
        };

        let mut segments = Vec::with_capacity(fragments.len() * 2);
        for (i, fragment) in fragments.iter().enumerate() {
            if i > 0 {
                segments.push(Segment::Blank);
            }
            if !fragment.is_empty() {
                segments.push(Segment::Text(fragment));
            }
        }
        segments
    }
}

/// Piece of a fill-blank sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayout {
    /// Bold caption above the picture
    pub caption: Option<String>,
    /// Italic prompt below the picture
    pub note: Option<String>,
    pub visual: ImageVisual,
    pub regenerate: Option<RegenerateAffordance>,
}

/// What fills an image section, in priority order
#[derive(Debug, Clone, PartialEq)]
pub enum ImageVisual {
    /// A regenerated illustration, used as-is
    Generated { url: String },
    /// Region cut from the reference image
    Cropped { image: Arc<RgbaImage> },
    Placeholder,
}

/// Control for regenerating one section's illustration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenerateAffordance {
    pub section_id: String,
    pub prompt: String,
    /// True while a request is in flight, up to the regeneration timeout
    pub pending: bool,
}

// =============================================================================
// Document-level layouts
// =============================================================================

/// Header block of an exam
#[derive(Debug, Clone, PartialEq)]
pub struct ExamHeader {
    /// Institution, or the branding override
    pub title: String,
    /// `"<SUBJECT> EXAMINATION"`
    pub subject_line: String,
    pub grade: String,
    pub duration: String,
    /// The date, or a blank placeholder
    pub date: String,
    pub date_provided: bool,
    pub total_marks: u32,
    pub has_logo: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionLayout {
    pub id: String,
    /// `"<number>."`
    pub label: String,
    /// Question text split on its literal line breaks
    pub text_lines: Vec<String>,
    pub marks: u32,
    pub answer_lines: usize,
}

/// Everything both targets need to present an exam
#[derive(Debug, Clone, PartialEq)]
pub struct ExamLayout {
    pub header: ExamHeader,
    pub instructions: Vec<String>,
    pub questions: Vec<QuestionLayout>,
}

impl ExamLayout {
    /// Answer-line counts in question order
    pub fn answer_line_counts(&self) -> Vec<usize> {
        self.questions.iter().map(|q| q.answer_lines).collect()
    }
}

/// Header block of a worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct WorksheetHeader {
    /// Branding override shown above the title
    pub header_text: Option<String>,
    pub title: String,
    /// Subject and grade level chips, when present
    pub chips: Vec<String>,
    pub has_logo: bool,
}

/// Everything both targets need to present a structured worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct WorksheetLayout {
    pub header: WorksheetHeader,
    pub instructions: Option<String>,
    pub sections: Vec<SectionLayout>,
    pub footer_text: String,
}
