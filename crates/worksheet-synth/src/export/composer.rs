//! Typesetting an outline onto PDF pages
//!
//! A top-down cursor flows blocks through the printable area with the embedded
//! serif family. The last body line of every page is kept free for the footer,
//! which is written once the page count is known.

use ::image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage, RawImageData,
    RawImageFormat, TextItem, XObjectTransform,
};

use crate::constants::{HANGING_INDENT_PT, LOGO_HEIGHT_PT, mm_to_pt};
use crate::options::SynthesisOptions;
use crate::render::fitted_size_pt;
use crate::text::{TextMeasure, wrap_text};
use crate::types::{Result, SynthError};

use super::fonts::FontFamily;
use super::outline::{Align, DocBlock, DocumentOutline, TextSize, TextStyle};

/// Typeset `outline` and serialize it to PDF bytes
pub fn compose_pdf(outline: &DocumentOutline, options: &SynthesisOptions) -> Result<Vec<u8>> {
    options.validate()?;
    let mut composer = PdfComposer::new(&outline.title, options)?;

    for block in &outline.blocks {
        match block {
            DocBlock::Logo => {
                if let Some(logo) = &outline.logo {
                    composer.raster(logo, Some(LOGO_HEIGHT_PT));
                }
            }
            DocBlock::Text {
                text,
                size,
                style,
                align,
            } => composer.text(text, *size, *style, *align),
            DocBlock::Columns(cells) => composer.columns(cells),
            DocBlock::Rule => composer.rule(),
            DocBlock::Bullet(text) => composer.bullet(text),
            DocBlock::Question {
                label,
                lines,
                annotation,
            } => composer.question(label, lines, annotation),
            DocBlock::AnswerLine => composer.rule(),
            DocBlock::Raster(image) => composer.raster(image, None),
            DocBlock::Frame { height_pt, label } => composer.frame(*height_pt, label.as_deref()),
            DocBlock::Spacer(height_pt) => composer.spacer(*height_pt),
        }
    }

    composer.finish(|number, total| outline.footer.for_page(number, total))
}

struct PdfComposer {
    doc: PdfDocument,
    fonts: FontFamily,
    options: SynthesisOptions,
    page_width_pt: f32,
    page_height_pt: f32,
    finished_pages: Vec<Vec<Op>>,
    ops: Vec<Op>,
    /// Distance from the top of the printable area
    cursor_pt: f32,
}

impl PdfComposer {
    fn new(title: &str, options: &SynthesisOptions) -> Result<Self> {
        let (page_width_pt, page_height_pt) = options.page_size_pt();
        let mut doc = PdfDocument::new(title);
        let fonts = FontFamily::embed(&mut doc)?;
        Ok(Self {
            doc,
            fonts,
            options: options.clone(),
            page_width_pt,
            page_height_pt,
            finished_pages: Vec::new(),
            ops: Vec::new(),
            cursor_pt: 0.0,
        })
    }

    fn left_pt(&self) -> f32 {
        mm_to_pt(self.options.margins.left_mm)
    }

    fn width_pt(&self) -> f32 {
        self.options.content_width_pt()
    }

    fn top_pt(&self) -> f32 {
        self.page_height_pt - mm_to_pt(self.options.margins.top_mm)
    }

    /// Printable height minus the footer line
    fn available_pt(&self) -> f32 {
        self.options.content_height_pt() - self.options.body_line_height_pt()
    }

    fn font_size(&self, size: TextSize) -> f32 {
        match size {
            TextSize::Title => self.options.title_font_size_pt,
            TextSize::Subtitle => self.options.subtitle_font_size_pt,
            TextSize::Body => self.options.body_font_size_pt,
        }
    }

    fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.options.line_spacing
    }

    fn break_page(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.finished_pages.push(ops);
        self.cursor_pt = 0.0;
    }

    /// Start a new page unless `height_pt` still fits on this one
    fn ensure_space(&mut self, height_pt: f32) {
        if self.cursor_pt > 0.0 && self.cursor_pt + height_pt > self.available_pt() {
            self.break_page();
        }
    }

    /// Baseline of the line occupying `[cursor, cursor + line_height]`
    fn baseline(&self, line_height: f32) -> f32 {
        self.top_pt() - self.cursor_pt - line_height * 0.75
    }

    fn measure(&self, text: &str, font_size: f32, style: TextStyle) -> f32 {
        self.fonts.face(style).width_pt(text, font_size)
    }

    fn wrap(&self, text: &str, width_pt: f32, font_size: f32, style: TextStyle) -> Vec<String> {
        wrap_text(text, width_pt, font_size, self.fonts.face(style))
    }

    fn write_at(&mut self, text: &str, x_pt: f32, y_pt: f32, size: f32, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        let face = self.fonts.face(style);
        if let Some(ch) = text.chars().find(|ch| !ch.is_whitespace() && !face.covers(*ch)) {
            log::warn!("No glyph for {:?} in {:?}", ch, style);
        }
        let font = face.id().clone();
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(x_pt),
                y: Pt(y_pt),
            },
        });
        self.ops.push(Op::SetFontSize {
            size: Pt(size),
            font: font.clone(),
        });
        self.ops.push(Op::WriteText {
            items: vec![TextItem::Text(text.to_string())],
            font,
        });
        self.ops.push(Op::EndTextSection);
    }

    fn text(&mut self, text: &str, size: TextSize, style: TextStyle, align: Align) {
        let font_size = self.font_size(size);
        let line_height = self.line_height(font_size);

        for line in self.wrap(text, self.width_pt(), font_size, style) {
            self.ensure_space(line_height);
            let slack = self.width_pt() - self.measure(&line, font_size, style);
            let x = match align {
                Align::Left => self.left_pt(),
                Align::Center => self.left_pt() + slack / 2.0,
                Align::Right => self.left_pt() + slack,
            };
            let y = self.baseline(line_height);
            self.write_at(&line, x.max(self.left_pt()), y, font_size, style);
            self.cursor_pt += line_height;
        }
    }

    fn columns(&mut self, cells: &[String]) {
        if cells.is_empty() {
            return;
        }
        let font_size = self.options.body_font_size_pt;
        let line_height = self.line_height(font_size);
        let column_width = self.width_pt() / cells.len() as f32;
        let cell_width = column_width - HANGING_INDENT_PT / 2.0;

        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .map(|cell| self.wrap(cell, cell_width, font_size, TextStyle::Bold))
            .collect();
        let rows = wrapped.iter().map(Vec::len).max().unwrap_or(1);

        self.ensure_space(line_height * rows as f32);
        for row in 0..rows {
            let y = self.baseline(line_height);
            for (i, lines) in wrapped.iter().enumerate() {
                if let Some(line) = lines.get(row) {
                    let x = self.left_pt() + column_width * i as f32;
                    self.write_at(line, x, y, font_size, TextStyle::Bold);
                }
            }
            self.cursor_pt += line_height;
        }
    }

    fn bullet(&mut self, text: &str) {
        let font_size = self.options.body_font_size_pt;
        let line_height = self.line_height(font_size);
        let text_width = self.width_pt() - HANGING_INDENT_PT;

        let lines = self.wrap(text, text_width, font_size, TextStyle::Regular);
        for (i, line) in lines.into_iter().enumerate() {
            self.ensure_space(line_height);
            let y = self.baseline(line_height);
            if i == 0 {
                self.write_at("•", self.left_pt() + 4.0, y, font_size, TextStyle::Regular);
            }
            let x = self.left_pt() + HANGING_INDENT_PT;
            self.write_at(&line, x, y, font_size, TextStyle::Regular);
            self.cursor_pt += line_height;
        }
    }

    fn question(&mut self, label: &str, lines: &[String], annotation: &str) {
        let font_size = self.options.body_font_size_pt;
        let line_height = self.line_height(font_size);
        let text_x = self.left_pt() + HANGING_INDENT_PT;
        let text_width = self.width_pt() - HANGING_INDENT_PT;
        let mut wrapped: Vec<String> = lines
            .iter()
            .flat_map(|line| self.wrap(line, text_width, font_size, TextStyle::Regular))
            .collect();
        if wrapped.is_empty() {
            wrapped.push(String::new());
        }

        // Annotation trails the last line, or wraps onto its own
        let annotation_width = self.measure(annotation, font_size, TextStyle::BoldItalic);
        let last_width = wrapped
            .last()
            .map(|line| self.measure(line, font_size, TextStyle::Regular))
            .unwrap_or(0.0);
        let gap = font_size;
        let annotation_inline = last_width + gap + annotation_width <= text_width;
        let line_count = wrapped.len() + usize::from(!annotation_inline);

        // Keep at least the label line and the first text line together
        self.ensure_space(line_height * line_count.min(2) as f32);

        let last = wrapped.len() - 1;
        for (i, line) in wrapped.iter().enumerate() {
            self.ensure_space(line_height);
            let y = self.baseline(line_height);
            if i == 0 {
                self.write_at(label, self.left_pt(), y, font_size, TextStyle::Bold);
            }
            self.write_at(line, text_x, y, font_size, TextStyle::Regular);
            if i == last && annotation_inline {
                let x = text_x + last_width + gap;
                self.write_at(annotation, x, y, font_size, TextStyle::BoldItalic);
            }
            self.cursor_pt += line_height;
        }

        if !annotation_inline {
            self.ensure_space(line_height);
            let y = self.baseline(line_height);
            let x = self.left_pt() + self.width_pt() - annotation_width;
            self.write_at(annotation, x, y, font_size, TextStyle::BoldItalic);
            self.cursor_pt += line_height;
        }
    }

    /// A full-width line of underscores
    fn rule(&mut self) {
        let font_size = self.options.body_font_size_pt;
        let line_height = self.line_height(font_size);
        let underscore = self.measure("_", font_size, TextStyle::Regular).max(1.0);
        let count = (self.width_pt() / underscore).floor() as usize;

        self.ensure_space(line_height);
        let y = self.baseline(line_height);
        self.write_at(&"_".repeat(count), self.left_pt(), y, font_size, TextStyle::Regular);
        self.cursor_pt += line_height;
    }

    fn frame(&mut self, height_pt: f32, label: Option<&str>) {
        let font_size = self.options.body_font_size_pt;
        let line_height = self.line_height(font_size);
        let height_pt = height_pt.max(line_height * 2.0);

        self.ensure_space(height_pt);
        let start = self.cursor_pt;
        self.rule();
        if let Some(label) = label {
            let y = self.baseline(line_height);
            self.write_at(label, self.left_pt(), y, font_size, TextStyle::Italic);
        }
        self.cursor_pt = start + height_pt - line_height;
        self.rule();
    }

    fn spacer(&mut self, height_pt: f32) {
        // Space at the top of a page is dropped
        if self.cursor_pt > 0.0 {
            self.cursor_pt = (self.cursor_pt + height_pt).min(self.available_pt());
        }
    }

    /// Place `image` centered, scaled to the printable width and to
    /// `max_height_pt` (or the printable height)
    fn raster(&mut self, image: &DynamicImage, max_height_pt: Option<f32>) {
        let (px_width, px_height) = image.dimensions();
        if px_width == 0 || px_height == 0 {
            return;
        }

        let dpi = self.options.image_dpi;
        let natural_width = px_width as f32 * 72.0 / dpi;
        let (mut width, mut height) = fitted_size_pt(px_width, px_height, self.width_pt(), dpi);
        let max_height = max_height_pt
            .unwrap_or(f32::INFINITY)
            .min(self.available_pt());
        if height > max_height {
            width *= max_height / height;
            height = max_height;
        }

        self.ensure_space(height);

        let rgb = flatten_on_white(image);
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: px_width as usize,
            height: px_height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let id = self.doc.add_image(&raw);

        let scale = width / natural_width;
        let x = self.left_pt() + (self.width_pt() - width) / 2.0;
        let y = self.top_pt() - self.cursor_pt - height;
        self.ops.push(Op::UseXobject {
            id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x)),
                translate_y: Some(Pt(y)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(dpi),
                rotate: None,
            },
        });
        self.cursor_pt += height;
    }

    fn finish(mut self, footer: impl Fn(usize, usize) -> String) -> Result<Vec<u8>> {
        if !self.ops.is_empty() || self.finished_pages.is_empty() {
            self.break_page();
        }

        let total = self.finished_pages.len();
        let footer_size = (self.options.body_font_size_pt - 3.0).max(6.0);
        let footer_y = mm_to_pt(self.options.margins.bottom_mm) + footer_size * 0.25;
        let page_width_mm = crate::constants::pt_to_mm(self.page_width_pt);
        let page_height_mm = crate::constants::pt_to_mm(self.page_height_pt);

        let mut pages = Vec::with_capacity(total);
        for (i, ops) in std::mem::take(&mut self.finished_pages).into_iter().enumerate() {
            self.ops = ops;
            let text = footer(i + 1, total);
            let width = self.measure(&text, footer_size, TextStyle::Italic);
            let x = (self.page_width_pt - width) / 2.0;
            self.write_at(&text, x.max(0.0), footer_y, footer_size, TextStyle::Italic);
            pages.push(PdfPage::new(
                Mm(page_width_mm),
                Mm(page_height_mm),
                std::mem::take(&mut self.ops),
            ));
        }

        self.doc.pages = pages;

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            log::debug!("PDF serialization produced {} warning(s)", warnings.len());
        }
        if bytes.is_empty() {
            return Err(SynthError::ExportFailure(
                "PDF serialization produced no output".to_string(),
            ));
        }

        log::debug!("Composed {} page(s), {} bytes", total, bytes.len());
        Ok(bytes)
    }
}

/// Drop alpha by compositing over white paper
fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
