//! Paragraph-level description of an exported document
//!
//! Exporters build an outline from the shared layout derivation, and the
//! composer typesets it. The outline is what the reader ends up seeing, so it
//! is also what the tests inspect.

use std::sync::Arc;

use image::DynamicImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Title,
    Subtitle,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone)]
pub enum DocBlock {
    /// The branding logo, centered
    Logo,
    Text {
        text: String,
        size: TextSize,
        style: TextStyle,
        align: Align,
    },
    /// Bold cells spread evenly across one line
    Columns(Vec<String>),
    /// Horizontal rule across the printable width
    Rule,
    Bullet(String),
    /// Numbered question with a hanging label. Each entry of `lines` starts on
    /// a new line.
    Question {
        label: String,
        lines: Vec<String>,
        annotation: String,
    },
    /// One ruled line to write an answer on
    AnswerLine,
    /// A raster scaled to fit the printable width
    Raster(Arc<DynamicImage>),
    /// An empty framed region (placeholder or drawing canvas)
    Frame {
        height_pt: f32,
        label: Option<String>,
    },
    Spacer(f32),
}

impl DocBlock {
    pub fn text(text: impl Into<String>, size: TextSize, style: TextStyle, align: Align) -> Self {
        DocBlock::Text {
            text: text.into(),
            size,
            style,
            align,
        }
    }

    pub fn body(text: impl Into<String>) -> Self {
        Self::text(text, TextSize::Body, TextStyle::Regular, Align::Center)
    }
}

/// How each page's footer is worded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FooterText {
    /// The same text on every page
    Fixed(String),
    /// `"Page N of M"`
    PageNumbers,
}

impl FooterText {
    pub fn for_page(&self, number: usize, total: usize) -> String {
        match self {
            FooterText::Fixed(text) => text.clone(),
            FooterText::PageNumbers => format!("Page {} of {}", number, total),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentOutline {
    /// Document title metadata
    pub title: String,
    pub logo: Option<Arc<DynamicImage>>,
    pub blocks: Vec<DocBlock>,
    pub footer: FooterText,
}

impl DocumentOutline {
    /// Number of answer lines following each question, in order
    pub fn answer_line_counts(&self) -> Vec<usize> {
        let mut counts = Vec::new();
        for block in &self.blocks {
            match block {
                DocBlock::Question { .. } => counts.push(0),
                DocBlock::AnswerLine => {
                    if let Some(last) = counts.last_mut() {
                        *last += 1;
                    }
                }
                _ => {}
            }
        }
        counts
    }

    /// All plain text in reading order, one entry per block or cell
    pub fn texts(&self) -> Vec<&str> {
        let mut texts = Vec::new();
        for block in &self.blocks {
            match block {
                DocBlock::Text { text, .. } | DocBlock::Bullet(text) => texts.push(text.as_str()),
                DocBlock::Columns(cells) => texts.extend(cells.iter().map(String::as_str)),
                DocBlock::Question {
                    label,
                    lines,
                    annotation,
                } => {
                    texts.push(label.as_str());
                    texts.extend(lines.iter().map(String::as_str));
                    texts.push(annotation.as_str());
                }
                DocBlock::Frame {
                    label: Some(label), ..
                } => texts.push(label.as_str()),
                _ => {}
            }
        }
        texts
    }
}
