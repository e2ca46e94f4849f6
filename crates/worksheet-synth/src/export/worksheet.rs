//! Worksheet document outlines

use std::sync::Arc;

use image::DynamicImage;

use crate::constants::{IMAGE_PLACEHOLDER_HEIGHT_PT, MATH_CELLS_PER_ROW};
use crate::layout::{
    ImageLayout, ImageVisual, LayoutContext, SectionBody, SectionLayout, Segment, WorksheetHeader,
    layout_worksheet,
};
use crate::model::{GeneratedWorksheetImage, WorksheetData};
use crate::raster::{decode_data_url, decode_image};
use crate::types::{BrandingOptions, Result, SynthError};

use super::outline::{Align, DocBlock, DocumentOutline, FooterText, TextSize, TextStyle};

/// Blank printed in place of `___` in fill-blank sentences
const PRINTED_BLANK: &str = "__________";

/// Outline of a structured worksheet
pub fn worksheet_outline(
    data: &WorksheetData,
    branding: &BrandingOptions,
    ctx: &LayoutContext<'_>,
    default_footer: &str,
) -> DocumentOutline {
    let layout = layout_worksheet(data, branding, ctx, default_footer);

    let mut blocks = header_blocks(&layout.header);
    if let Some(instructions) = &layout.instructions {
        blocks.push(DocBlock::text(
            instructions.clone(),
            TextSize::Body,
            TextStyle::Italic,
            Align::Center,
        ));
        blocks.push(DocBlock::Spacer(12.0));
    }

    for section in &layout.sections {
        section_blocks(section, &mut blocks);
        blocks.push(DocBlock::Spacer(18.0));
    }

    DocumentOutline {
        title: data.title.clone(),
        logo: branding.logo.clone(),
        blocks,
        footer: FooterText::Fixed(layout.footer_text),
    }
}

/// Outline of a full-page generated worksheet. The page image is the content,
/// so failing to decode it fails the export.
pub fn worksheet_image_outline(
    image: &GeneratedWorksheetImage,
    branding: &BrandingOptions,
    default_footer: &str,
) -> Result<DocumentOutline> {
    let page = decode_data_url(&image.url)
        .and_then(|bytes| decode_image(&bytes))
        .map_err(|e| SynthError::ExportFailure(format!("Generated worksheet is unusable: {}", e)))?;

    let mut blocks = header_blocks(&WorksheetHeader {
        header_text: branding.header_override().map(str::to_string),
        title: String::new(),
        chips: Vec::new(),
        has_logo: branding.has_logo(),
    });
    blocks.push(DocBlock::Raster(Arc::new(page)));

    Ok(DocumentOutline {
        title: "Worksheet".to_string(),
        logo: branding.logo.clone(),
        blocks,
        footer: FooterText::Fixed(
            crate::layout::derived::footer_text(branding, default_footer).to_string(),
        ),
    })
}

fn header_blocks(header: &WorksheetHeader) -> Vec<DocBlock> {
    let mut blocks = Vec::new();
    if header.has_logo {
        blocks.push(DocBlock::Logo);
    }
    if let Some(text) = &header.header_text {
        blocks.push(DocBlock::text(
            text.to_uppercase(),
            TextSize::Subtitle,
            TextStyle::Bold,
            Align::Center,
        ));
    }
    if !header.title.is_empty() {
        blocks.push(DocBlock::text(
            header.title.clone(),
            TextSize::Title,
            TextStyle::Bold,
            Align::Center,
        ));
    }
    if !header.chips.is_empty() {
        blocks.push(DocBlock::text(
            header.chips.join("   |   "),
            TextSize::Body,
            TextStyle::Bold,
            Align::Center,
        ));
    }
    blocks.push(DocBlock::text(
        "Name: ____________________",
        TextSize::Body,
        TextStyle::Regular,
        Align::Right,
    ));
    blocks.push(DocBlock::Rule);
    blocks.push(DocBlock::Spacer(12.0));
    blocks
}

fn section_blocks(section: &SectionLayout, blocks: &mut Vec<DocBlock>) {
    if let Some(title) = &section.title {
        blocks.push(DocBlock::text(
            title.clone(),
            TextSize::Subtitle,
            TextStyle::Bold,
            Align::Center,
        ));
    }

    match &section.body {
        SectionBody::Image(image) => image_blocks(&section.id, image, blocks),
        SectionBody::Matching { left, right } => {
            for (left, right) in left.iter().zip(right) {
                blocks.push(DocBlock::Columns(vec![left.clone(), right.clone()]));
                blocks.push(DocBlock::Spacer(12.0));
            }
        }
        body @ SectionBody::FillBlank { .. } => {
            let sentence: String = body
                .segments()
                .into_iter()
                .map(|segment| match segment {
                    Segment::Text(text) => text,
                    Segment::Blank => PRINTED_BLANK,
                })
                .collect();
            blocks.push(DocBlock::body(sentence));
        }
        SectionBody::Drawing {
            prompt,
            canvas_height_pt,
        } => {
            blocks.push(DocBlock::Frame {
                height_pt: *canvas_height_pt,
                label: Some("Draw here:".to_string()),
            });
            if let Some(prompt) = prompt {
                blocks.push(DocBlock::text(
                    prompt.clone(),
                    TextSize::Body,
                    TextStyle::Italic,
                    Align::Center,
                ));
            }
        }
        SectionBody::Math { cells } => {
            for row in cells.chunks(MATH_CELLS_PER_ROW) {
                blocks.push(DocBlock::Columns(
                    row.iter().map(|cell| format!("{} = ______", cell)).collect(),
                ));
                blocks.push(DocBlock::Spacer(12.0));
            }
        }
        SectionBody::Text { text } => blocks.push(DocBlock::body(text.clone())),
    }
}

fn image_blocks(section_id: &str, image: &ImageLayout, blocks: &mut Vec<DocBlock>) {
    if let Some(caption) = &image.caption {
        blocks.push(DocBlock::text(
            caption.clone(),
            TextSize::Body,
            TextStyle::Bold,
            Align::Center,
        ));
    }

    let placeholder = || DocBlock::Frame {
        height_pt: IMAGE_PLACEHOLDER_HEIGHT_PT,
        label: Some("Image Placeholder".to_string()),
    };

    let visual = match &image.visual {
        ImageVisual::Generated { url } => {
            match decode_data_url(url).and_then(|bytes| decode_image(&bytes)) {
                Ok(decoded) => DocBlock::Raster(Arc::new(decoded)),
                Err(e) => {
                    // Remote URLs and broken payloads print as a placeholder
                    log::warn!("Section {} image not embedded: {}", section_id, e);
                    placeholder()
                }
            }
        }
        ImageVisual::Cropped { image } => {
            DocBlock::Raster(Arc::new(DynamicImage::ImageRgba8(image.as_ref().clone())))
        }
        ImageVisual::Placeholder => placeholder(),
    };
    blocks.push(visual);

    if let Some(note) = &image.note {
        blocks.push(DocBlock::text(
            note.clone(),
            TextSize::Body,
            TextStyle::Italic,
            Align::Center,
        ));
    }
}
