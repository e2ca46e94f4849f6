//! Flowing measured blocks onto pages

use crate::constants::BLOCK_GAP_PT;
use crate::options::SynthesisOptions;

use super::{PlacedBlock, ViewBlock};

/// Place blocks top to bottom, starting a new page whenever the next block
/// would cross the footer line. Blocks are kept whole; one taller than a page
/// gets a page to itself. Always returns at least one page.
pub fn paginate(
    blocks: Vec<(f32, ViewBlock)>,
    options: &SynthesisOptions,
) -> Vec<Vec<PlacedBlock>> {
    // Last body line is reserved for the footer
    let available = options.content_height_pt() - options.body_line_height_pt();

    let mut pages: Vec<Vec<PlacedBlock>> = vec![Vec::new()];
    let mut cursor = 0.0;

    for (height_pt, block) in blocks {
        let top = if cursor > 0.0 { cursor + BLOCK_GAP_PT } else { 0.0 };

        let page_has_content = pages.last().is_some_and(|page| !page.is_empty());
        let (top_pt, new_page) = if page_has_content && top + height_pt > available {
            (0.0, true)
        } else {
            (top, false)
        };

        if new_page {
            pages.push(Vec::new());
        }
        if let Some(page) = pages.last_mut() {
            page.push(PlacedBlock {
                top_pt,
                height_pt,
                block,
            });
        }
        cursor = top_pt + height_pt;
    }

    pages
}
