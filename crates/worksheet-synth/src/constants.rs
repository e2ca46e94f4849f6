//! Shared constants for document synthesis
//!
//! This module centralizes magic numbers used by both the view renderer and the
//! document exporter.

use std::time::Duration;

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Convert points to millimeters
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / POINTS_PER_MM
}

// =============================================================================
// Page Setup
// =============================================================================

/// A4 page width in millimeters
pub const A4_WIDTH_MM: f32 = 210.0;

/// A4 page height in millimeters
pub const A4_HEIGHT_MM: f32 = 297.0;

/// One inch (1440 twips) page margin
pub const DEFAULT_MARGIN_MM: f32 = 25.4;

// =============================================================================
// Bounding Boxes
// =============================================================================

/// Bounding box components are normalized to this scale
pub const BOX_SCALE: f64 = 1000.0;

/// Largest crop surface edge we are willing to allocate (pixels)
pub const MAX_CROP_DIMENSION: f64 = 16_384.0;

/// Largest reference image download accepted (bytes)
pub const MAX_REFERENCE_BYTES: u64 = 32 * 1024 * 1024;

// =============================================================================
// Text Content
// =============================================================================

/// Literal token marking a blank in fill-blank sentences
pub const BLANK_TOKEN: &str = "___";

/// Shown in place of a missing exam date
pub const DATE_PLACEHOLDER: &str = "________";

/// One ruled answer line in the exported document
pub const ANSWER_LINE: &str =
    "__________________________________________________________________________";

/// Closing marker of an exported exam
pub const END_OF_EXAM_MARKER: &str = "*** End of Examination ***";

/// Heading above the exported exam instructions
pub const INSTRUCTIONS_HEADING: &str = "INSTRUCTIONS TO CANDIDATES:";

/// Footer credit used when no header override is set
pub const DEFAULT_FOOTER_TEXT: &str = "Created with Worksheet Tools";

/// Average character width, as a fraction of the font size, for view estimates
pub const CHAR_WIDTH_RATIO: f32 = 0.5;

// =============================================================================
// Section Geometry (points)
// =============================================================================

/// Height of the blank drawing canvas
pub const DRAWING_CANVAS_HEIGHT_PT: f32 = 240.0;

/// Height of the image placeholder box
pub const IMAGE_PLACEHOLDER_HEIGHT_PT: f32 = 192.0;

/// Height reserved for a generated illustration whose size is unknown
pub const GENERATED_IMAGE_HEIGHT_PT: f32 = 240.0;

/// Height of one matching row
pub const MATCHING_ROW_HEIGHT_PT: f32 = 80.0;

/// Height of one row of math cells (two cells per row)
pub const MATH_ROW_HEIGHT_PT: f32 = 56.0;

/// Math cells per row
pub const MATH_CELLS_PER_ROW: usize = 2;

/// Height of a logo above the title
pub const LOGO_HEIGHT_PT: f32 = 72.0;

/// Share of the printable height given to a full-page generated worksheet
pub const FULL_PAGE_IMAGE_FRACTION: f32 = 0.8;

/// Height of one dotted answer line in the exam view
pub const ANSWER_LINE_HEIGHT_PT: f32 = 24.0;

/// Vertical gap between flowed blocks
pub const BLOCK_GAP_PT: f32 = 18.0;

/// Hanging indent for question numbers (360 twips)
pub const HANGING_INDENT_PT: f32 = 18.0;

/// Resolution used to size embedded rasters
pub const DEFAULT_IMAGE_DPI: f32 = 150.0;

// =============================================================================
// Regeneration
// =============================================================================

/// A regeneration's "in progress" state clears after this long, completion or not
pub const REGENERATION_TIMEOUT: Duration = Duration::from_secs(8);
