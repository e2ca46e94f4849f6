//! Block height estimation for pagination

use crate::constants::{
    ANSWER_LINE_HEIGHT_PT, BLANK_TOKEN, FULL_PAGE_IMAGE_FRACTION, GENERATED_IMAGE_HEIGHT_PT,
    HANGING_INDENT_PT, IMAGE_PLACEHOLDER_HEIGHT_PT, LOGO_HEIGHT_PT, MATCHING_ROW_HEIGHT_PT,
    MATH_CELLS_PER_ROW, MATH_ROW_HEIGHT_PT,
};
use crate::layout::{ImageLayout, ImageVisual, SectionBody, SectionLayout};
use crate::options::SynthesisOptions;
use crate::text::{AverageWidth, TextMeasure, wrap_text};

use super::ViewBlock;

/// Width kept free on the right of a question for its marks annotation
const MARKS_COLUMN_PT: f32 = 48.0;

/// Estimated height of `block` in points
pub fn block_height(block: &ViewBlock, options: &SynthesisOptions) -> f32 {
    let body = options.body_line_height_pt();
    let title = options.title_font_size_pt * options.line_spacing;
    let subtitle = options.subtitle_font_size_pt * options.line_spacing;
    let width = options.content_width_pt();

    match block {
        ViewBlock::WorksheetHeader(header) => {
            let mut height = 0.0;
            if header.has_logo {
                height += LOGO_HEIGHT_PT;
            }
            if header.header_text.is_some() {
                height += subtitle;
            }
            if !header.title.is_empty() {
                height += title * wrapped_lines(&header.title, width, options.title_font_size_pt);
            }
            if !header.chips.is_empty() {
                height += body;
            }
            // "Name" line
            height + body
        }
        ViewBlock::Instructions(text) => {
            body * wrapped_lines(text, width, options.body_font_size_pt)
        }
        ViewBlock::Section(section) => section_height(section, options),
        ViewBlock::GeneratedImage { .. } => options.content_height_pt() * FULL_PAGE_IMAGE_FRACTION,
        ViewBlock::ExamHeader(header) => {
            let logo = if header.has_logo { LOGO_HEIGHT_PT } else { 0.0 };
            // Title, subject line, then two rows of metadata
            logo + title + subtitle + 2.0 * body
        }
        ViewBlock::ExamInstructions(lines) => {
            let bullets: f32 = lines
                .iter()
                .map(|line| {
                    wrapped_lines(line, width - HANGING_INDENT_PT, options.body_font_size_pt)
                })
                .sum();
            body * (1.0 + bullets)
        }
        ViewBlock::Question(question) => {
            let text_width = width - HANGING_INDENT_PT - MARKS_COLUMN_PT;
            let text_lines: f32 = question
                .text_lines
                .iter()
                .map(|line| wrapped_lines(line, text_width, options.body_font_size_pt))
                .sum();
            body * text_lines + ANSWER_LINE_HEIGHT_PT * question.answer_lines as f32
        }
    }
}

fn section_height(section: &SectionLayout, options: &SynthesisOptions) -> f32 {
    let body = options.body_line_height_pt();
    let width = options.content_width_pt();
    let font = options.body_font_size_pt;

    let heading = if section.title.is_some() {
        options.subtitle_font_size_pt * options.line_spacing
    } else {
        0.0
    };

    let content = match &section.body {
        SectionBody::Image(image) => image_height(image, options),
        SectionBody::Matching { left, .. } => MATCHING_ROW_HEIGHT_PT * left.len() as f32,
        SectionBody::FillBlank { fragments } => {
            // Blanks print as a run of underscores
            let sentence = fragments.join(BLANK_TOKEN.repeat(4).as_str());
            body * wrapped_lines(&sentence, width, font)
        }
        SectionBody::Drawing {
            prompt,
            canvas_height_pt,
        } => {
            let prompt_lines = prompt
                .as_deref()
                .map(|p| wrapped_lines(p, width, font))
                .unwrap_or(0.0);
            *canvas_height_pt + body * prompt_lines
        }
        SectionBody::Math { cells } => {
            let rows = cells.len().div_ceil(MATH_CELLS_PER_ROW);
            MATH_ROW_HEIGHT_PT * rows as f32
        }
        SectionBody::Text { text } => body * wrapped_lines(text, width, font),
    };

    heading + content
}

fn image_height(image: &ImageLayout, options: &SynthesisOptions) -> f32 {
    let body = options.body_line_height_pt();
    let width = options.content_width_pt();
    let font = options.body_font_size_pt;

    let visual = match &image.visual {
        ImageVisual::Generated { .. } => GENERATED_IMAGE_HEIGHT_PT,
        ImageVisual::Cropped { image } => {
            fitted_size_pt(image.width(), image.height(), width, options.image_dpi).1
        }
        ImageVisual::Placeholder => IMAGE_PLACEHOLDER_HEIGHT_PT,
    };

    let caption = image
        .caption
        .as_deref()
        .map(|text| wrapped_lines(text, width, font))
        .unwrap_or(0.0);
    let note = image
        .note
        .as_deref()
        .map(|text| wrapped_lines(text, width, font))
        .unwrap_or(0.0);

    visual + body * (caption + note)
}

/// Size of a `px_width` x `px_height` raster at `dpi`, scaled down to fit
/// `max_width_pt`
pub fn fitted_size_pt(px_width: u32, px_height: u32, max_width_pt: f32, dpi: f32) -> (f32, f32) {
    let width = px_width as f32 * 72.0 / dpi;
    let height = px_height as f32 * 72.0 / dpi;
    if width > max_width_pt && width > 0.0 {
        let scale = max_width_pt / width;
        (max_width_pt, height * scale)
    } else {
        (width, height)
    }
}

fn wrapped_lines(text: &str, width_pt: f32, font_size_pt: f32) -> f32 {
    if AverageWidth.width_pt(text, font_size_pt) <= width_pt && !text.contains('\n') {
        return 1.0;
    }
    wrap_text(text, width_pt, font_size_pt, &AverageWidth).len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::QuestionLayout;

    #[test]
    fn test_question_height_grows_with_answer_lines() {
        let options = SynthesisOptions::default();
        let question = |answer_lines| {
            ViewBlock::Question(QuestionLayout {
                id: "q1".into(),
                label: "1.".into(),
                text_lines: vec!["Short question".into()],
                marks: 1,
                answer_lines,
            })
        };

        let two = block_height(&question(2), &options);
        let three = block_height(&question(3), &options);
        assert!((three - two - ANSWER_LINE_HEIGHT_PT).abs() < 0.001);
    }

    #[test]
    fn test_fitted_size_scales_down_wide_images() {
        // 150 dpi: 300px is two inches
        assert_eq!(fitted_size_pt(300, 150, 500.0, 150.0), (144.0, 72.0));
        let (w, h) = fitted_size_pt(3000, 1500, 450.0, 150.0);
        assert_eq!(w, 450.0);
        assert!((h - 225.0).abs() < 0.001);
    }
}
