//! Self-contained HTML serialization of a laid-out view

use std::fmt::Write as _;

use image::DynamicImage;

use crate::constants::{ANSWER_LINE_HEIGHT_PT, INSTRUCTIONS_HEADING, pt_to_mm};
use crate::layout::{
    ExamHeader, ImageLayout, ImageVisual, QuestionLayout, SectionBody, SectionLayout, Segment,
    WorksheetHeader,
};
use crate::raster::{encode_png, png_data_url};
use crate::types::Result;

use super::{FooterPlacement, ViewBlock, ViewDocument};

const STYLE: &str = r#"
body { margin: 0; background: #e5e7eb; font-family: Georgia, serif; color: #111827; }
.page { position: relative; box-sizing: border-box; margin: 12px auto; background: #fff; overflow: hidden; page-break-after: always; }
.block { break-inside: avoid; margin-bottom: 18pt; }
.center { text-align: center; }
.logo { max-height: 72pt; object-fit: contain; }
.chip { display: inline-block; padding: 2pt 8pt; margin: 0 4pt; border-radius: 9999px; background: #f3f4f6; }
.name { text-align: right; } .name span { display: inline-block; width: 144pt; border-bottom: 1.5pt solid #9ca3af; color: #9ca3af; }
.placeholder { height: 192pt; border: 2pt dashed #d1d5db; display: flex; align-items: center; justify-content: center; color: #9ca3af; }
.matching { display: grid; grid-template-columns: 1fr 1fr; gap: 24pt; }
.matching div { min-height: 56pt; border: 3pt dashed #d1d5db; display: flex; align-items: center; justify-content: center; margin-bottom: 12pt; }
.blank { display: inline-block; width: 96pt; border-bottom: 2.5pt solid #1f2937; }
.canvas { border: 4pt solid #e5e7eb; border-radius: 18pt; }
.math { display: grid; grid-template-columns: 1fr 1fr; gap: 18pt; }
.math .box { display: inline-block; width: 54pt; height: 36pt; border: 3pt solid #d1d5db; vertical-align: middle; }
.meta { display: flex; justify-content: space-between; border-top: 1pt solid #000; padding-top: 8pt; }
.question { display: flex; gap: 12pt; } .question .text { flex-grow: 1; white-space: pre-line; }
.answer { border-bottom: 1pt dotted #9ca3af; }
.regenerate { float: right; }
.regenerate[disabled] { opacity: 0.5; }
.footer { text-align: center; font-size: 9pt; color: #9ca3af; }
.footer.pinned { position: absolute; left: 0; right: 0; }
@media print { body { background: #fff; } .page { margin: 0; } .no-print { display: none; } }
"#;

/// Serialize `view` into a print-ready HTML page. Cropped images and the logo
/// are inlined as PNG data URLs.
pub fn render_html(view: &ViewDocument) -> Result<String> {
    let (width_pt, height_pt) = view.options.page_size_pt();
    let margins = &view.options.margins;

    let logo = view.logo.as_deref().map(image_data_url).transpose()?;

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<style>{}</style>", STYLE);
    html.push_str("</head>\n<body>\n");

    for page in &view.pages {
        let _ = writeln!(
            html,
            "<div class=\"page\" style=\"width: {:.1}mm; height: {:.1}mm; padding: {}mm {}mm {}mm {}mm; font-size: {}pt; line-height: {};\">",
            pt_to_mm(width_pt),
            pt_to_mm(height_pt),
            margins.top_mm,
            margins.right_mm,
            margins.bottom_mm,
            margins.left_mm,
            view.options.body_font_size_pt,
            view.options.line_spacing,
        );

        for placed in &page.blocks {
            html.push_str("<div class=\"block\">\n");
            write_block(&mut html, &placed.block, logo.as_deref())?;
            html.push_str("</div>\n");
        }

        match view.footer_placement {
            FooterPlacement::Flowed => {
                let _ = writeln!(html, "<div class=\"footer\">{}</div>", escape(&page.footer));
            }
            FooterPlacement::PinnedToPageBottom => {
                let _ = writeln!(
                    html,
                    "<div class=\"footer pinned\" style=\"bottom: {}mm;\">{}</div>",
                    margins.bottom_mm / 2.0,
                    escape(&page.footer)
                );
            }
        }
        html.push_str("</div>\n");
    }

    html.push_str("</body>\n</html>\n");
    Ok(html)
}

fn write_block(html: &mut String, block: &ViewBlock, logo: Option<&str>) -> Result<()> {
    match block {
        ViewBlock::WorksheetHeader(header) => write_worksheet_header(html, header, logo),
        ViewBlock::Instructions(text) => {
            let _ = writeln!(html, "<p class=\"center\">{}</p>", escape(text));
        }
        ViewBlock::Section(section) => write_section(html, section)?,
        ViewBlock::GeneratedImage { url } => {
            let _ = writeln!(
                html,
                "<div class=\"center\"><img src=\"{}\" alt=\"Generated worksheet\" style=\"max-width: 100%;\"></div>",
                escape(url)
            );
        }
        ViewBlock::ExamHeader(header) => write_exam_header(html, header, logo),
        ViewBlock::ExamInstructions(lines) => {
            let _ = writeln!(html, "<strong>{}</strong>\n<ul>", escape(INSTRUCTIONS_HEADING));
            for line in lines {
                let _ = writeln!(html, "<li>{}</li>", escape(line));
            }
            html.push_str("</ul>\n");
        }
        ViewBlock::Question(question) => write_question(html, question),
    }
    Ok(())
}

fn write_worksheet_header(html: &mut String, header: &WorksheetHeader, logo: Option<&str>) {
    html.push_str("<div class=\"center\">\n");
    if let (true, Some(logo)) = (header.has_logo, logo) {
        let _ = writeln!(html, "<img class=\"logo\" src=\"{}\" alt=\"Logo\"><br>", logo);
    }
    if let Some(text) = &header.header_text {
        let _ = writeln!(html, "<h2>{}</h2>", escape(&text.to_uppercase()));
    }
    if !header.title.is_empty() {
        let _ = writeln!(html, "<h1>{}</h1>", escape(&header.title));
    }
    for chip in &header.chips {
        let _ = writeln!(html, "<span class=\"chip\">{}</span>", escape(chip));
    }
    html.push_str("</div>\n<div class=\"name\"><span>Name</span></div>\n");
}

fn write_exam_header(html: &mut String, header: &ExamHeader, logo: Option<&str>) {
    html.push_str("<div class=\"center\">\n");
    if let (true, Some(logo)) = (header.has_logo, logo) {
        let _ = writeln!(html, "<img class=\"logo\" src=\"{}\" alt=\"Logo\"><br>", logo);
    }
    let _ = writeln!(html, "<h1>{}</h1>", escape(&header.title.to_uppercase()));
    let _ = writeln!(html, "<h2>{}</h2>", escape(&header.subject_line));
    html.push_str("</div>\n");
    let _ = writeln!(
        html,
        "<div class=\"meta\"><div><p>Grade: {}</p><p>Date: {}</p></div><div style=\"text-align: right;\"><p>Duration: {}</p><p>Total Marks: {}</p></div></div>",
        escape(&header.grade),
        escape(&header.date),
        escape(&header.duration),
        header.total_marks
    );
}

fn write_question(html: &mut String, question: &QuestionLayout) {
    let _ = writeln!(
        html,
        "<div class=\"question\"><strong>{}</strong><div class=\"text\">{}",
        escape(&question.label),
        escape(&question.text_lines.join("\n"))
    );
    for _ in 0..question.answer_lines {
        let _ = writeln!(
            html,
            "<div class=\"answer\" style=\"height: {}pt;\"></div>",
            ANSWER_LINE_HEIGHT_PT
        );
    }
    let _ = writeln!(html, "</div><strong>[{}]</strong></div>", question.marks);
}

fn write_section(html: &mut String, section: &SectionLayout) -> Result<()> {
    if let Some(title) = &section.title {
        let _ = writeln!(html, "<h3 class=\"center\">{}</h3>", escape(title));
    }

    match &section.body {
        SectionBody::Image(image) => write_image(html, image)?,
        SectionBody::Matching { left, right } => {
            html.push_str("<div class=\"matching\">\n<div>\n");
            for term in left {
                let _ = writeln!(html, "<div>{}</div>", escape(term));
            }
            html.push_str("</div>\n<div>\n");
            for term in right {
                let _ = writeln!(html, "<div>{}</div>", escape(term));
            }
            html.push_str("</div>\n</div>\n");
        }
        body @ SectionBody::FillBlank { .. } => {
            html.push_str("<p>");
            for segment in body.segments() {
                match segment {
                    Segment::Text(text) => html.push_str(&escape(text)),
                    Segment::Blank => html.push_str("<span class=\"blank\"></span>"),
                }
            }
            html.push_str("</p>\n");
        }
        SectionBody::Drawing {
            prompt,
            canvas_height_pt,
        } => {
            let _ = writeln!(
                html,
                "<div class=\"canvas\" style=\"height: {}pt;\"><p>Draw here:</p><p class=\"center\"><em>{}</em></p></div>",
                canvas_height_pt,
                escape(prompt.as_deref().unwrap_or_default())
            );
        }
        SectionBody::Math { cells } => {
            html.push_str("<div class=\"math\">\n");
            for cell in cells {
                let _ = writeln!(
                    html,
                    "<div class=\"center\"><strong>{} =</strong> <span class=\"box\"></span></div>",
                    escape(cell)
                );
            }
            html.push_str("</div>\n");
        }
        SectionBody::Text { text } => {
            let _ = writeln!(html, "<p class=\"center\">{}</p>", escape(text));
        }
    }
    Ok(())
}

fn write_image(html: &mut String, image: &ImageLayout) -> Result<()> {
    if let Some(caption) = &image.caption {
        let _ = writeln!(html, "<p class=\"center\"><strong>{}</strong></p>", escape(caption));
    }

    if let Some(regenerate) = &image.regenerate {
        let _ = writeln!(
            html,
            "<button class=\"regenerate no-print\" data-section=\"{}\" title=\"{}\"{}>{}</button>",
            escape(&regenerate.section_id),
            escape(&regenerate.prompt),
            if regenerate.pending { " disabled" } else { "" },
            if regenerate.pending { "Regenerating..." } else { "Regenerate" },
        );
    }

    match &image.visual {
        ImageVisual::Generated { url } => {
            let _ = writeln!(
                html,
                "<div class=\"center\"><img src=\"{}\" alt=\"Generated illustration\" style=\"max-width: 80%;\"></div>",
                escape(url)
            );
        }
        ImageVisual::Cropped { image } => {
            let url = image_data_url(&DynamicImage::ImageRgba8(image.as_ref().clone()))?;
            let _ = writeln!(
                html,
                "<div class=\"center\"><img src=\"{}\" alt=\"Cropped illustration\" style=\"max-width: 100%;\"></div>",
                url
            );
        }
        ImageVisual::Placeholder => {
            html.push_str("<div class=\"placeholder\">Image Placeholder</div>\n");
        }
    }

    if let Some(note) = &image.note {
        let _ = writeln!(html, "<p class=\"center\"><em>{}</em></p>", escape(note));
    }
    Ok(())
}

fn image_data_url(image: &DynamicImage) -> Result<String> {
    Ok(png_data_url(&encode_png(image)?))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
