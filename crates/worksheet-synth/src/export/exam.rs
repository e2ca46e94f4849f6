//! Exam document outline

use crate::constants::{END_OF_EXAM_MARKER, INSTRUCTIONS_HEADING};
use crate::layout::derived::marks_annotation;
use crate::layout::layout_exam;
use crate::model::ExamData;
use crate::types::BrandingOptions;

use super::outline::{Align, DocBlock, DocumentOutline, FooterText, TextSize, TextStyle};

/// Outline of an exported exam.
///
/// Title block, metadata line, optional instructions, then each question with
/// its answer lines, closed by the end marker. All values come from
/// [`layout_exam`], the same derivation the view uses.
pub fn exam_outline(data: &ExamData, branding: &BrandingOptions) -> DocumentOutline {
    let layout = layout_exam(data, branding);
    let header = &layout.header;
    let mut blocks = Vec::new();

    if header.has_logo {
        blocks.push(DocBlock::Logo);
    }
    blocks.push(DocBlock::text(
        header.title.to_uppercase(),
        TextSize::Title,
        TextStyle::Bold,
        Align::Center,
    ));
    blocks.push(DocBlock::text(
        header.subject_line.clone(),
        TextSize::Subtitle,
        TextStyle::Bold,
        Align::Center,
    ));
    blocks.push(DocBlock::Spacer(12.0));
    blocks.push(DocBlock::Columns(vec![
        format!("Grade: {}", header.grade),
        format!("Time: {}", header.duration),
        format!("Date: {}", header.date),
    ]));
    blocks.push(DocBlock::text(
        format!("Total Marks: {}", header.total_marks),
        TextSize::Body,
        TextStyle::Bold,
        Align::Right,
    ));
    blocks.push(DocBlock::Rule);
    blocks.push(DocBlock::Spacer(12.0));

    if !layout.instructions.is_empty() {
        blocks.push(DocBlock::text(
            INSTRUCTIONS_HEADING,
            TextSize::Body,
            TextStyle::Bold,
            Align::Left,
        ));
        blocks.extend(layout.instructions.iter().cloned().map(DocBlock::Bullet));
        blocks.push(DocBlock::Spacer(12.0));
    }

    for question in &layout.questions {
        blocks.push(DocBlock::Spacer(6.0));
        blocks.push(DocBlock::Question {
            label: question.label.clone(),
            lines: question.text_lines.clone(),
            annotation: marks_annotation(question.marks),
        });
        blocks.extend(std::iter::repeat_n(DocBlock::AnswerLine, question.answer_lines));
    }

    blocks.push(DocBlock::Spacer(30.0));
    blocks.push(DocBlock::text(
        END_OF_EXAM_MARKER,
        TextSize::Body,
        TextStyle::Italic,
        Align::Center,
    ));

    DocumentOutline {
        title: format!("{} Examination", data.subject.trim()),
        logo: branding.logo.clone(),
        blocks,
        footer: match branding.header_override() {
            Some(text) => FooterText::Fixed(text.to_string()),
            None => FooterText::PageNumbers,
        },
    }
}
