//! Worksheet layout derivation

use crate::model::WorksheetData;
use crate::types::BrandingOptions;

use super::derived::footer_text;
use super::{LayoutContext, WorksheetHeader, WorksheetLayout, layout_section};

/// Lay out the header, instructions and every section of a worksheet
pub fn layout_worksheet(
    data: &WorksheetData,
    branding: &BrandingOptions,
    ctx: &LayoutContext<'_>,
    default_footer: &str,
) -> WorksheetLayout {
    let chips = [&data.subject, &data.grade_level]
        .into_iter()
        .flatten()
        .cloned()
        .collect();

    WorksheetLayout {
        header: WorksheetHeader {
            header_text: branding.header_override().map(str::to_string),
            title: data.title.clone(),
            chips,
            has_logo: branding.has_logo(),
        },
        instructions: data.instructions.clone(),
        sections: data
            .sections
            .iter()
            .map(|section| layout_section(section, ctx))
            .collect(),
        footer_text: footer_text(branding, default_footer).to_string(),
    }
}
