use crate::constants::{
    A4_HEIGHT_MM, A4_WIDTH_MM, DEFAULT_FOOTER_TEXT, DEFAULT_IMAGE_DPI, DEFAULT_MARGIN_MM, mm_to_pt,
};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Output paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Portrait dimensions in millimeters
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A4 => (A4_WIDTH_MM, A4_HEIGHT_MM),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }
}

/// Page margins shared by the print view and the exported document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    pub top_mm: f32,
    pub bottom_mm: f32,
    pub left_mm: f32,
    pub right_mm: f32,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self::uniform(DEFAULT_MARGIN_MM)
    }
}

impl PageMargins {
    /// Create uniform margins on all sides
    pub fn uniform(margin_mm: f32) -> Self {
        Self {
            top_mm: margin_mm,
            bottom_mm: margin_mm,
            left_mm: margin_mm,
            right_mm: margin_mm,
        }
    }
}

/// Page geometry and typography for both output targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisOptions {
    pub paper_size: PaperSize,
    pub margins: PageMargins,

    // Typography
    pub body_font_size_pt: f32,
    pub title_font_size_pt: f32,
    pub subtitle_font_size_pt: f32,
    /// Line height as a multiple of the font size
    pub line_spacing: f32,

    /// Footer credit when no header override is set
    pub footer_text: String,

    /// Resolution used to size embedded images
    pub image_dpi: f32,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            margins: PageMargins::default(),
            body_font_size_pt: 12.0,
            title_font_size_pt: 16.0,
            subtitle_font_size_pt: 14.0,
            line_spacing: 1.15,
            footer_text: DEFAULT_FOOTER_TEXT.to_string(),
            image_dpi: DEFAULT_IMAGE_DPI,
        }
    }
}

impl SynthesisOptions {
    /// Load options from JSON file
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| SynthError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SynthError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        let (width_mm, height_mm) = self.paper_size.dimensions_mm();
        if !(width_mm > 0.0 && height_mm > 0.0) {
            return Err(SynthError::Config("Paper dimensions must be positive".to_string()));
        }

        let margins = [
            self.margins.top_mm,
            self.margins.bottom_mm,
            self.margins.left_mm,
            self.margins.right_mm,
        ];
        if margins.iter().any(|m| *m < 0.0 || !m.is_finite()) {
            return Err(SynthError::Config("Margins must be non-negative".to_string()));
        }
        if self.margins.left_mm + self.margins.right_mm >= width_mm
            || self.margins.top_mm + self.margins.bottom_mm >= height_mm
        {
            return Err(SynthError::Config("Margins leave no printable area".to_string()));
        }

        let sizes = [
            self.body_font_size_pt,
            self.title_font_size_pt,
            self.subtitle_font_size_pt,
        ];
        if sizes.iter().any(|s| !(*s > 0.0)) {
            return Err(SynthError::Config("Font sizes must be positive".to_string()));
        }

        if !(self.line_spacing >= 1.0) {
            return Err(SynthError::Config(format!(
                "Line spacing must be at least 1.0, got {}",
                self.line_spacing
            )));
        }

        if !(self.image_dpi > 0.0) {
            return Err(SynthError::Config("Image DPI must be positive".to_string()));
        }

        Ok(())
    }

    /// Page size in points (width, height)
    pub fn page_size_pt(&self) -> (f32, f32) {
        let (w, h) = self.paper_size.dimensions_mm();
        (mm_to_pt(w), mm_to_pt(h))
    }

    /// Width of the area inside the margins, in points
    pub fn content_width_pt(&self) -> f32 {
        let (w, _) = self.page_size_pt();
        w - mm_to_pt(self.margins.left_mm + self.margins.right_mm)
    }

    /// Height of the area inside the margins, in points
    pub fn content_height_pt(&self) -> f32 {
        let (_, h) = self.page_size_pt();
        h - mm_to_pt(self.margins.top_mm + self.margins.bottom_mm)
    }

    /// Line height for body text, in points
    pub fn body_line_height_pt(&self) -> f32 {
        self.body_font_size_pt * self.line_spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_a4_with_inch_margins() {
        let options = SynthesisOptions::default();
        assert_eq!(options.paper_size.dimensions_mm(), (210.0, 297.0));
        assert_eq!(options.margins.left_mm, 25.4);

        // 1 inch on each side leaves 595.28 - 144 points
        let (w, _) = options.page_size_pt();
        assert!((options.content_width_pt() - (w - 144.0)).abs() < 0.01);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_oversized_margins() {
        let options = SynthesisOptions {
            margins: PageMargins::uniform(120.0),
            ..Default::default()
        };
        match options.validate() {
            Err(SynthError::Config(msg)) => assert!(msg.contains("printable area")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_rejects_tight_line_spacing() {
        let options = SynthesisOptions {
            line_spacing: 0.5,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
