//! Typed worksheet and exam content
//!
//! Values here are produced by the validator from the raw generation output and
//! are treated as immutable snapshots afterwards. The only sanctioned change, a
//! regenerated section image, goes through [`WorksheetData::with_section_image`]
//! which returns a new snapshot.

use serde::ser::{Serialize, Serializer};

use crate::layout::total_marks;
use crate::types::DocumentKind;

// =============================================================================
// Worksheets
// =============================================================================

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetData {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub sections: Vec<WorksheetSection>,
}

impl WorksheetData {
    pub fn section(&self, id: &str) -> Option<&WorksheetSection> {
        self.sections.iter().find(|section| section.id == id)
    }

    /// Return a new snapshot where only the section `id` carries `url` as its
    /// generated image. `None` when no such section exists.
    pub fn with_section_image(&self, id: &str, url: impl Into<String>) -> Option<WorksheetData> {
        let index = self.sections.iter().position(|section| section.id == id)?;

        let mut sections = self.sections.clone();
        sections[index] = WorksheetSection {
            generated_image_url: Some(url.into()),
            ..self.sections[index].clone()
        };

        Some(WorksheetData {
            sections,
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetSection {
    /// Unique within a worksheet
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub content: SectionContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_image_url: Option<String>,
}

impl WorksheetSection {
    pub fn kind(&self) -> SectionKind {
        self.content.kind()
    }

    pub fn is_image_section(&self) -> bool {
        self.kind() == SectionKind::Image
    }
}

/// Section type tags as they appear in generated content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Text,
    Matching,
    FillBlank,
    Drawing,
    Math,
    Image,
}

impl SectionKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "text" => Some(SectionKind::Text),
            "matching" => Some(SectionKind::Matching),
            "fill-blank" | "fill_blank" | "fillblank" => Some(SectionKind::FillBlank),
            "drawing" => Some(SectionKind::Drawing),
            "math" => Some(SectionKind::Math),
            "image" => Some(SectionKind::Image),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            SectionKind::Text => "text",
            SectionKind::Matching => "matching",
            SectionKind::FillBlank => "fill-blank",
            SectionKind::Drawing => "drawing",
            SectionKind::Math => "math",
            SectionKind::Image => "image",
        }
    }
}

/// Variant payload of a section, one shape per section type
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", content = "content", rename_all = "kebab-case")]
pub enum SectionContent {
    Image(ImageContent),
    Matching(MatchingContent),
    FillBlank(FillBlankContent),
    Drawing(DrawingContent),
    Math(MathContent),
    Text(TextContent),
}

impl SectionContent {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionContent::Image(_) => SectionKind::Image,
            SectionContent::Matching(_) => SectionKind::Matching,
            SectionContent::FillBlank(_) => SectionKind::FillBlank,
            SectionContent::Drawing(_) => SectionKind::Drawing,
            SectionContent::Math(_) => SectionKind::Math,
            SectionContent::Text(_) => SectionKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct ImageContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MatchingPair {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct MatchingContent {
    pub pairs: Vec<MatchingPair>,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct FillBlankContent {
    pub sentence: String,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct DrawingContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MathProblem {
    #[serde(rename = "q")]
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct MathContent {
    pub problems: Vec<MathProblem>,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct TextContent {
    pub text: String,
}

// =============================================================================
// Bounding boxes
// =============================================================================

/// Region of the reference image as `[ymin, xmin, ymax, xmax]`, normalized to
/// `0..=1000`. A component is `None` when the generator left it undefined.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub ymin: Option<f64>,
    pub xmin: Option<f64>,
    pub ymax: Option<f64>,
    pub xmax: Option<f64>,
}

impl BoundingBox {
    pub fn new(ymin: f64, xmin: f64, ymax: f64, xmax: f64) -> Self {
        Self {
            ymin: Some(ymin),
            xmin: Some(xmin),
            ymax: Some(ymax),
            xmax: Some(xmax),
        }
    }

    /// Build a box from raw array components. Only a 4-element array is a box.
    pub fn from_components(values: &[Option<f64>]) -> Option<Self> {
        match values {
            [ymin, xmin, ymax, xmax] => Some(Self {
                ymin: *ymin,
                xmin: *xmin,
                ymax: *ymax,
                xmax: *xmax,
            }),
            _ => None,
        }
    }

    /// All four components as `[ymin, xmin, ymax, xmax]`, or `None` if any is
    /// undefined or not finite.
    pub fn components(&self) -> Option<[f64; 4]> {
        let values = [self.ymin?, self.xmin?, self.ymax?, self.xmax?];
        values
            .iter()
            .all(|value| value.is_finite())
            .then_some(values)
    }
}

impl Serialize for BoundingBox {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [self.ymin, self.xmin, self.ymax, self.xmax].serialize(serializer)
    }
}

// =============================================================================
// Exams
// =============================================================================

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ExamData {
    pub institution: String,
    pub subject: String,
    pub grade: String,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub instructions: Vec<String>,
    pub questions: Vec<ExamQuestion>,
}

impl ExamData {
    /// Sum of all question marks; never stored
    pub fn total_marks(&self) -> u32 {
        total_marks(&self.questions)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ExamQuestion {
    pub id: String,
    /// Display label ("1", "1a", "II"); sequence order is authoritative
    pub number: String,
    pub text: String,
    pub marks: u32,
}

// =============================================================================
// Synthesis input
// =============================================================================

/// A full-page worksheet delivered as one generated image
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GeneratedWorksheetImage {
    /// Data URL (or bare base64 PNG) of the generated page
    pub url: String,
}

/// One generation result, as owned by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisInput {
    Worksheet(WorksheetData),
    Exam(ExamData),
    WorksheetImage(GeneratedWorksheetImage),
}

impl SynthesisInput {
    pub fn kind(&self) -> DocumentKind {
        match self {
            SynthesisInput::Worksheet(_) => DocumentKind::Worksheet,
            SynthesisInput::Exam(_) => DocumentKind::Exam,
            SynthesisInput::WorksheetImage(_) => DocumentKind::WorksheetImage,
        }
    }

    /// Subject used when naming exported files
    pub fn subject(&self) -> Option<&str> {
        match self {
            SynthesisInput::Worksheet(data) => data.subject.as_deref(),
            SynthesisInput::Exam(data) => Some(data.subject.as_str()),
            SynthesisInput::WorksheetImage(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str) -> WorksheetSection {
        WorksheetSection {
            id: id.to_string(),
            title: None,
            content: SectionContent::Image(ImageContent::default()),
            bounding_box: None,
            image_prompt: Some("a red apple".to_string()),
            generated_image_url: None,
        }
    }

    #[test]
    fn test_with_section_image_replaces_one_section() {
        let data = WorksheetData {
            title: "Fruit".to_string(),
            subject: None,
            grade_level: None,
            instructions: None,
            sections: vec![section("a"), section("b")],
        };

        let updated = data.with_section_image("b", "data:image/png;base64,AAAA").unwrap();

        assert_eq!(data.sections[1].generated_image_url, None);
        assert_eq!(updated.sections[0], data.sections[0]);
        assert_eq!(
            updated.sections[1].generated_image_url.as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert!(data.with_section_image("missing", "x").is_none());
    }

    #[test]
    fn test_bounding_box_requires_four_components() {
        assert!(BoundingBox::from_components(&[Some(1.0), Some(2.0), Some(3.0)]).is_none());
        let bbox = BoundingBox::from_components(&[Some(1.0), None, Some(3.0), Some(4.0)]).unwrap();
        assert_eq!(bbox.components(), None);
        assert_eq!(
            BoundingBox::new(1.0, 2.0, 3.0, 4.0).components(),
            Some([1.0, 2.0, 3.0, 4.0])
        );
        assert_eq!(BoundingBox::new(f64::NAN, 2.0, 3.0, 4.0).components(), None);
    }

    #[test]
    fn test_section_serializes_type_tag() {
        let json = serde_json::to_value(section("a")).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["imagePrompt"], "a red apple");
    }
}
