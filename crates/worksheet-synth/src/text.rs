//! Text measurement and line wrapping
//!
//! Wrapping is driven by a [`TextMeasure`]. The exporter measures with the
//! glyph advances of its embedded faces; the view, whose fonts belong to the
//! browser, falls back to [`AverageWidth`].

use crate::constants::CHAR_WIDTH_RATIO;

/// Rendered width of a run of text
pub trait TextMeasure {
    fn width_pt(&self, text: &str, font_size_pt: f32) -> f32;
}

/// Width estimate from an average character width
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageWidth;

impl TextMeasure for AverageWidth {
    fn width_pt(&self, text: &str, font_size_pt: f32) -> f32 {
        text.chars().count() as f32 * font_size_pt * CHAR_WIDTH_RATIO
    }
}

/// Greedy word wrap to lines no wider than `max_width_pt`.
///
/// Existing line breaks are kept as hard breaks, and an empty input line stays
/// an empty output line. Words wider than a line are split between characters,
/// but every line holds at least one character.
pub fn wrap_text(
    text: &str,
    max_width_pt: f32,
    font_size_pt: f32,
    measure: &impl TextMeasure,
) -> Vec<String> {
    let fits = |candidate: &str| measure.width_pt(candidate, font_size_pt) <= max_width_pt;
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        let mut current = String::new();

        for word in raw_line.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fits(word) {
                current = word.to_string();
                continue;
            }

            // Hard-split a word that can never fit
            for ch in word.chars() {
                current.push(ch);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
        }

        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
