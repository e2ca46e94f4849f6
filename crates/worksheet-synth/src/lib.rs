pub mod constants;
pub mod crop;
pub mod export;
pub mod layout;
mod model;
mod options;
pub mod raster;
pub mod render;
mod stats;
pub mod text;
mod types;
mod validate;

pub use crop::{CropRegion, crop_image, crop_region, decode_and_crop};
pub use export::{
    document_file_name, export_document, export_file_name, raster_file_name, synthesize_document,
    synthesize_raster,
};
pub use layout::{
    LayoutContext, PendingRegenerations, answer_line_count, layout_exam, layout_section,
    layout_worksheet, total_marks,
};
pub use model::*;
pub use options::*;
pub use raster::decode_reference;
pub use render::{RenderTarget, ViewDocument, render_html, synthesize_view};
pub use stats::{DocumentStatistics, calculate_statistics};
pub use types::*;
pub use validate::{parse_exam, parse_worksheet, validate_exam, validate_worksheet};
