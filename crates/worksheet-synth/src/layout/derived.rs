//! Derived values shared by the view renderer and the document exporter
//!
//! Both targets call these functions and nothing else to obtain totals, line
//! counts and header text. Keeping one copy here is what keeps the two outputs
//! in agreement.

use crate::constants::{BLANK_TOKEN, DATE_PLACEHOLDER};
use crate::model::ExamQuestion;
use crate::types::BrandingOptions;

/// Total marks of an exam: the sum of every question's marks
pub fn total_marks(questions: &[ExamQuestion]) -> u32 {
    questions
        .iter()
        .fold(0u32, |total, question| total.saturating_add(question.marks))
}

/// Number of blank answer lines reserved below a question.
///
/// Questions worth more than two marks get one extra line.
pub fn answer_line_count(marks: u32) -> usize {
    if marks > 2 { 3 } else { 2 }
}

/// Exam title line: the branding override if set, else the institution
pub fn header_text<'a>(branding: &'a BrandingOptions, institution: &'a str) -> &'a str {
    branding.header_override().unwrap_or(institution)
}

/// Worksheet footer: the branding override if set, else the configured credit
pub fn footer_text<'a>(branding: &'a BrandingOptions, default_credit: &'a str) -> &'a str {
    branding.header_override().unwrap_or(default_credit)
}

/// The exam date, or a blank line to fill in by hand
pub fn date_or_blank(date: Option<&str>) -> &str {
    match date.map(str::trim) {
        Some(date) if !date.is_empty() => date,
        _ => DATE_PLACEHOLDER,
    }
}

/// `"<SUBJECT> EXAMINATION"`
pub fn exam_subject_line(subject: &str) -> String {
    let subject = subject.trim();
    if subject.is_empty() {
        "EXAMINATION".to_string()
    } else {
        format!("{} EXAMINATION", subject.to_uppercase())
    }
}

/// `"[n Marks]"` annotation shown after each question
pub fn marks_annotation(marks: u32) -> String {
    format!("[{} Marks]", marks)
}

/// Question label as printed before the text
pub fn question_label(number: &str) -> String {
    format!("{}.", number.trim())
}

/// Question text split on its literal line breaks. Line breaks are content and
/// must survive into both outputs.
pub fn question_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Split a fill-blank sentence on the blank token.
///
/// `n` tokens always give `n + 1` fragments; fragments may be empty when a
/// blank sits at either end or two blanks are adjacent.
pub fn split_blanks(sentence: &str) -> Vec<String> {
    sentence.split(BLANK_TOKEN).map(str::to_string).collect()
}
