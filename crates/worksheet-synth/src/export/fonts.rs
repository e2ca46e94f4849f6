//! Serif family embedded into exported documents
//!
//! The faces are DejaVu Serif, which covers Latin accents as well as the
//! mathematical symbols generated questions tend to use.

use printpdf::{FontId, ParsedFont, PdfDocument};

use crate::text::TextMeasure;
use crate::types::{Result, SynthError};

use super::outline::TextStyle;

const REGULAR: &[u8] = include_bytes!("../../fonts/DejaVuSerif.ttf");
const BOLD: &[u8] = include_bytes!("../../fonts/DejaVuSerif-Bold.ttf");
const ITALIC: &[u8] = include_bytes!("../../fonts/DejaVuSerif-Italic.ttf");
const BOLD_ITALIC: &[u8] = include_bytes!("../../fonts/DejaVuSerif-BoldItalic.ttf");

/// One parsed face plus the id it was registered under
pub struct Typeface {
    font: ParsedFont,
    id: FontId,
    units_per_em: f32,
    /// Advance used for characters the face has no glyph for
    missing_advance: u16,
}

impl Typeface {
    fn embed(doc: &mut PdfDocument, bytes: &[u8], name: &str) -> Result<Self> {
        let mut warnings = Vec::new();
        let font = ParsedFont::from_bytes(bytes, 0, &mut warnings)
            .ok_or_else(|| SynthError::ExportFailure(format!("Failed to parse font {name}")))?;
        let id = doc.add_font(&font);

        let units_per_em = match font.font_metrics.units_per_em {
            0 => 1000.0,
            units => units as f32,
        };
        let missing_advance = font.get_horizontal_advance(0);

        Ok(Self {
            font,
            id,
            units_per_em,
            missing_advance,
        })
    }

    pub fn id(&self) -> &FontId {
        &self.id
    }

    /// Whether the face has a glyph for `ch`
    pub fn covers(&self, ch: char) -> bool {
        self.font.lookup_glyph_index(ch as u32).is_some()
    }
}

impl TextMeasure for Typeface {
    fn width_pt(&self, text: &str, font_size_pt: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|ch| match self.font.lookup_glyph_index(ch as u32) {
                Some(glyph) => self.font.get_horizontal_advance(glyph) as u32,
                None => self.missing_advance as u32,
            })
            .sum();
        units as f32 / self.units_per_em * font_size_pt
    }
}

/// The four styles, each registered with the document
pub struct FontFamily {
    regular: Typeface,
    bold: Typeface,
    italic: Typeface,
    bold_italic: Typeface,
}

impl FontFamily {
    pub fn embed(doc: &mut PdfDocument) -> Result<Self> {
        Ok(Self {
            regular: Typeface::embed(doc, REGULAR, "DejaVu Serif")?,
            bold: Typeface::embed(doc, BOLD, "DejaVu Serif Bold")?,
            italic: Typeface::embed(doc, ITALIC, "DejaVu Serif Italic")?,
            bold_italic: Typeface::embed(doc, BOLD_ITALIC, "DejaVu Serif Bold Italic")?,
        })
    }

    pub fn face(&self, style: TextStyle) -> &Typeface {
        match style {
            TextStyle::Regular => &self.regular,
            TextStyle::Bold => &self.bold,
            TextStyle::Italic => &self.italic,
            TextStyle::BoldItalic => &self.bold_italic,
        }
    }
}
