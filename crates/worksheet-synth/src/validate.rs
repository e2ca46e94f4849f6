//! Validation of raw generation output into the typed model
//!
//! The generator's JSON is trusted for shape only. Anything missing is
//! defaulted rather than rejected so that partial worksheets still display;
//! the only hard failure is a payload that is not a JSON object at all.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::model::*;
use crate::types::{Result, SynthError};

/// Parse and validate a worksheet from raw JSON text
pub fn parse_worksheet(raw: &str) -> Result<WorksheetData> {
    validate_worksheet(&parse_json(raw)?)
}

/// Parse and validate an exam from raw JSON text
pub fn parse_exam(raw: &str) -> Result<ExamData> {
    validate_exam(&parse_json(raw)?)
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw)
        .map_err(|e| SynthError::MalformedResponse(format!("Response is not valid JSON: {}", e)))
}

/// Validate a decoded worksheet response
pub fn validate_worksheet(value: &Value) -> Result<WorksheetData> {
    let object = expect_object(value, "worksheet")?;

    let title = string_field(object, "title").unwrap_or_else(|| {
        log::warn!("Worksheet response has no title, using an empty one");
        String::new()
    });

    let raw_sections: &[Value] = match object.get("sections") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(other) => {
            log::warn!("Worksheet sections is not an array ({}), ignoring", type_name(other));
            &[]
        }
        None => {
            log::warn!("Worksheet response has no sections");
            &[]
        }
    };

    let mut ids = UniqueIds::new("section");
    let sections = raw_sections
        .iter()
        .enumerate()
        .map(|(index, raw)| validate_section(raw, index, &mut ids))
        .collect();

    Ok(WorksheetData {
        title,
        subject: string_field(object, "subject"),
        grade_level: string_field(object, "gradeLevel"),
        instructions: string_field(object, "instructions"),
        sections,
    })
}

fn validate_section(raw: &Value, index: usize, ids: &mut UniqueIds) -> WorksheetSection {
    let empty = Map::new();
    let object = raw.as_object().unwrap_or_else(|| {
        log::warn!("Section {} is not an object, treating it as empty text", index + 1);
        &empty
    });

    let id = ids.assign(string_field(object, "id"), index);

    let declared = object.get("type").and_then(Value::as_str);
    let kind = declared.and_then(SectionKind::from_tag);
    if let (Some(tag), None) = (declared, kind) {
        log::debug!("Section {} has unknown type {:?}, rendering as text", id, tag);
    }

    let bounding_box = object.get("boundingBox").and_then(parse_bounding_box);
    let content = object.get("content").unwrap_or(&Value::Null);

    WorksheetSection {
        content: classify_content(kind, content, bounding_box.is_some()),
        id,
        title: string_field(object, "title"),
        bounding_box,
        image_prompt: string_field(object, "imagePrompt"),
        generated_image_url: string_field(object, "generatedImageUrl"),
    }
}

/// Pick the section variant. A declared image type or a 4-element bounding box
/// makes an image section regardless of anything else; unknown or missing types
/// fall back to text.
fn classify_content(kind: Option<SectionKind>, content: &Value, has_box: bool) -> SectionContent {
    if kind == Some(SectionKind::Image) || has_box {
        return SectionContent::Image(ImageContent {
            text: content_string(content, "text"),
            prompt: content_string(content, "prompt"),
        });
    }

    match kind {
        Some(SectionKind::Matching) => SectionContent::Matching(MatchingContent {
            pairs: content_array(content, "pairs")
                .iter()
                .map(|pair| MatchingPair {
                    left: content_string(pair, "left").unwrap_or_default(),
                    right: content_string(pair, "right").unwrap_or_default(),
                })
                .collect(),
        }),
        Some(SectionKind::FillBlank) => SectionContent::FillBlank(FillBlankContent {
            sentence: content_string(content, "sentence").unwrap_or_default(),
        }),
        Some(SectionKind::Drawing) => SectionContent::Drawing(DrawingContent {
            prompt: content_string(content, "prompt"),
        }),
        Some(SectionKind::Math) => SectionContent::Math(MathContent {
            problems: content_array(content, "problems")
                .iter()
                .filter_map(|problem| match problem {
                    Value::String(text) => Some(text.clone()),
                    other => content_string(other, "q"),
                })
                .map(|question| MathProblem { question })
                .collect(),
        }),
        Some(SectionKind::Text) | Some(SectionKind::Image) | None => {
            SectionContent::Text(TextContent {
                text: match content {
                    Value::String(text) => text.clone(),
                    other => content_string(other, "text").unwrap_or_default(),
                },
            })
        }
    }
}

fn parse_bounding_box(value: &Value) -> Option<BoundingBox> {
    let items = value.as_array()?;
    let components: Vec<Option<f64>> = items.iter().map(Value::as_f64).collect();
    BoundingBox::from_components(&components)
}

/// Validate a decoded exam response
pub fn validate_exam(value: &Value) -> Result<ExamData> {
    let object = expect_object(value, "exam")?;

    let instructions = match object.get("instructions") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => {
            vec![single.trim().to_string()]
        }
        _ => Vec::new(),
    };

    let raw_questions: &[Value] = match object.get("questions") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => {
            log::warn!("Exam response has no question list");
            &[]
        }
    };

    let mut ids = UniqueIds::new("question");
    let questions = raw_questions
        .iter()
        .enumerate()
        .map(|(index, raw)| validate_question(raw, index, &mut ids))
        .collect();

    Ok(ExamData {
        institution: string_field(object, "institution").unwrap_or_default(),
        subject: string_field(object, "subject").unwrap_or_default(),
        grade: string_field(object, "grade").unwrap_or_default(),
        duration: string_field(object, "duration").unwrap_or_default(),
        date: string_field(object, "date"),
        instructions,
        questions,
    })
}

fn validate_question(raw: &Value, index: usize, ids: &mut UniqueIds) -> ExamQuestion {
    let empty = Map::new();
    let object = raw.as_object().unwrap_or(&empty);

    let marks = parse_marks(object.get("marks"));
    if !matches!(object.get("marks"), Some(Value::Number(_))) {
        log::debug!("Question {} marks defaulted to {}", index + 1, marks);
    }

    ExamQuestion {
        id: ids.assign(string_field(object, "id"), index),
        number: string_field(object, "number").unwrap_or_else(|| (index + 1).to_string()),
        text: string_field(object, "text").unwrap_or_default(),
        marks,
    }
}

/// Marks are a non-negative integer; anything else counts as zero.
/// Numeric strings ("3") are accepted.
fn parse_marks(value: Option<&Value>) -> u32 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() && n > 0.0 => n.floor().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn expect_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        SynthError::MalformedResponse(format!(
            "Expected a JSON object for the {}, got {}",
            what,
            type_name(value)
        ))
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A non-empty string field; numbers are stringified
fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn content_string(content: &Value, key: &str) -> Option<String> {
    content.as_object().and_then(|object| string_field(object, key))
}

fn content_array<'a>(content: &'a Value, key: &str) -> &'a [Value] {
    content
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Hands out ids that are non-empty and unique within one document
struct UniqueIds {
    prefix: &'static str,
    seen: HashSet<String>,
}

impl UniqueIds {
    fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            seen: HashSet::new(),
        }
    }

    fn assign(&mut self, candidate: Option<String>, index: usize) -> String {
        if let Some(id) = candidate {
            let id = id.trim().to_string();
            if !id.is_empty() {
                if self.seen.insert(id.clone()) {
                    return id;
                }
                log::warn!("Duplicate id {:?} at position {}, assigning a new one", id, index + 1);
            }
        }

        let mut n = index + 1;
        loop {
            let fallback = format!("{}-{}", self.prefix, n);
            if self.seen.insert(fallback.clone()) {
                return fallback;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_marks_parsing() {
        assert_eq!(parse_marks(Some(&json!(3))), 3);
        assert_eq!(parse_marks(Some(&json!(2.7))), 2);
        assert_eq!(parse_marks(Some(&json!(-4))), 0);
        assert_eq!(parse_marks(Some(&json!("5"))), 5);
        assert_eq!(parse_marks(Some(&json!("five"))), 0);
        assert_eq!(parse_marks(Some(&json!(null))), 0);
        assert_eq!(parse_marks(None), 0);
    }

    #[test]
    fn test_unique_ids_fill_gaps_and_duplicates() {
        let mut ids = UniqueIds::new("section");
        assert_eq!(ids.assign(Some("intro".into()), 0), "intro");
        assert_eq!(ids.assign(None, 1), "section-2");
        assert_eq!(ids.assign(Some("intro".into()), 2), "section-3");
        assert_eq!(ids.assign(Some("  ".into()), 3), "section-4");
        assert_eq!(ids.assign(Some("section-5".into()), 4), "section-5");
        assert_eq!(ids.assign(None, 4), "section-6");
    }
}
