//! Exam layout derivation

use crate::model::ExamData;
use crate::types::BrandingOptions;

use super::derived::{
    answer_line_count, date_or_blank, exam_subject_line, header_text, question_label,
    question_lines, total_marks,
};
use super::{ExamHeader, ExamLayout, QuestionLayout};

/// Derive everything needed to present `data`.
///
/// This is the only place exam values are computed; the screen view and the
/// exported document both consume the result.
pub fn layout_exam(data: &ExamData, branding: &BrandingOptions) -> ExamLayout {
    let header = ExamHeader {
        title: header_text(branding, &data.institution).to_string(),
        subject_line: exam_subject_line(&data.subject),
        grade: data.grade.clone(),
        duration: data.duration.clone(),
        date: date_or_blank(data.date.as_deref()).to_string(),
        date_provided: data.date.as_deref().is_some_and(|d| !d.trim().is_empty()),
        total_marks: total_marks(&data.questions),
        has_logo: branding.has_logo(),
    };

    let questions = data
        .questions
        .iter()
        .map(|question| QuestionLayout {
            id: question.id.clone(),
            label: question_label(&question.number),
            text_lines: question_lines(&question.text),
            marks: question.marks,
            answer_lines: answer_line_count(question.marks),
        })
        .collect();

    ExamLayout {
        header,
        instructions: data.instructions.clone(),
        questions,
    }
}
