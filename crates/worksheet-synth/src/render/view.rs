use std::sync::Arc;

use image::DynamicImage;

use crate::layout::{
    ExamHeader, ExamLayout, LayoutContext, QuestionLayout, SectionBody, SectionLayout,
    WorksheetHeader, layout_exam, layout_worksheet,
};
use crate::model::SynthesisInput;
use crate::options::SynthesisOptions;
use crate::types::{BrandingOptions, DocumentKind};

use super::measure::block_height;
use super::paginate::paginate;

/// Where a view is going to be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderTarget {
    /// Interactive on-screen view
    #[default]
    Screen,
    /// Paginated print output
    Print,
}

/// How the footer is presented. Footer text is the same for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterPlacement {
    /// Follows the content of each page
    Flowed,
    /// Pinned to the bottom edge of every printed page
    PinnedToPageBottom,
}

impl RenderTarget {
    pub fn footer_placement(self) -> FooterPlacement {
        match self {
            RenderTarget::Screen => FooterPlacement::Flowed,
            RenderTarget::Print => FooterPlacement::PinnedToPageBottom,
        }
    }

    /// Interactive controls never reach paper
    pub fn shows_controls(self) -> bool {
        self == RenderTarget::Screen
    }
}

/// One unit of flowed content. Blocks are never split across pages.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewBlock {
    WorksheetHeader(WorksheetHeader),
    Instructions(String),
    Section(SectionLayout),
    /// Full-page generated worksheet
    GeneratedImage {
        url: String,
    },
    ExamHeader(ExamHeader),
    ExamInstructions(Vec<String>),
    Question(QuestionLayout),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    /// Offset from the top of the printable area
    pub top_pt: f32,
    pub height_pt: f32,
    pub block: ViewBlock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewPage {
    /// 1-based page number
    pub number: usize,
    pub blocks: Vec<PlacedBlock>,
    pub footer: String,
}

/// A laid-out document ready for display
#[derive(Debug, Clone)]
pub struct ViewDocument {
    pub kind: DocumentKind,
    pub target: RenderTarget,
    pub footer_placement: FooterPlacement,
    pub options: SynthesisOptions,
    pub logo: Option<Arc<DynamicImage>>,
    pub pages: Vec<ViewPage>,
}

impl ViewDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &ViewBlock> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter().map(|placed| &placed.block))
    }

    /// Total marks shown in the exam header, if this is an exam
    pub fn total_marks(&self) -> Option<u32> {
        self.blocks().find_map(|block| match block {
            ViewBlock::ExamHeader(header) => Some(header.total_marks),
            _ => None,
        })
    }

    /// Answer-line counts of every question, in order
    pub fn answer_line_counts(&self) -> Vec<usize> {
        self.blocks()
            .filter_map(|block| match block {
                ViewBlock::Question(question) => Some(question.answer_lines),
                _ => None,
            })
            .collect()
    }

    /// Sections in order
    pub fn sections(&self) -> impl Iterator<Item = &SectionLayout> {
        self.blocks().filter_map(|block| match block {
            ViewBlock::Section(section) => Some(section),
            _ => None,
        })
    }
}

/// Lay out `input` for `target`.
///
/// Every value shown comes from the shared layout derivation; `target` only
/// changes footer placement and whether interactive controls are kept.
pub fn synthesize_view(
    input: &SynthesisInput,
    branding: &BrandingOptions,
    ctx: &LayoutContext<'_>,
    options: &SynthesisOptions,
    target: RenderTarget,
) -> ViewDocument {
    let blocks = match input {
        SynthesisInput::Exam(data) => exam_blocks(layout_exam(data, branding)),
        SynthesisInput::Worksheet(data) => {
            let layout = layout_worksheet(data, branding, ctx, &options.footer_text);
            let mut blocks = vec![ViewBlock::WorksheetHeader(layout.header)];
            if let Some(instructions) = layout.instructions {
                blocks.push(ViewBlock::Instructions(instructions));
            }
            blocks.extend(layout.sections.into_iter().map(|mut section| {
                if !target.shows_controls() {
                    strip_controls(&mut section);
                }
                ViewBlock::Section(section)
            }));
            blocks
        }
        SynthesisInput::WorksheetImage(image) => vec![
            ViewBlock::WorksheetHeader(WorksheetHeader {
                header_text: branding.header_override().map(str::to_string),
                title: String::new(),
                chips: Vec::new(),
                has_logo: branding.has_logo(),
            }),
            ViewBlock::GeneratedImage {
                url: image.url.clone(),
            },
        ],
    };

    let measured = blocks
        .into_iter()
        .map(|block| (block_height(&block, options), block))
        .collect();
    let page_blocks = paginate(measured, options);

    let page_count = page_blocks.len();
    let footer = |number: usize| match input {
        SynthesisInput::Exam(_) => branding
            .header_override()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Page {} of {}", number, page_count)),
        _ => crate::layout::derived::footer_text(branding, &options.footer_text).to_string(),
    };

    let pages = page_blocks
        .into_iter()
        .enumerate()
        .map(|(i, blocks)| ViewPage {
            number: i + 1,
            blocks,
            footer: footer(i + 1),
        })
        .collect();

    log::debug!(
        "Laid out {:?} view for {:?} on {} page(s)",
        input.kind(),
        target,
        page_count
    );

    ViewDocument {
        kind: input.kind(),
        target,
        footer_placement: target.footer_placement(),
        options: options.clone(),
        logo: branding.logo.clone(),
        pages,
    }
}

fn exam_blocks(layout: ExamLayout) -> Vec<ViewBlock> {
    let mut blocks = vec![ViewBlock::ExamHeader(layout.header)];
    if !layout.instructions.is_empty() {
        blocks.push(ViewBlock::ExamInstructions(layout.instructions));
    }
    blocks.extend(layout.questions.into_iter().map(ViewBlock::Question));
    blocks
}

fn strip_controls(section: &mut SectionLayout) {
    if let SectionBody::Image(image) = &mut section.body {
        image.regenerate = None;
    }
}
