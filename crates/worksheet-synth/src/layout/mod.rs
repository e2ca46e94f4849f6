//! Layout derivation shared by every output target
//!
//! This module turns the validated data model into descriptors:
//! - Per-section layout (variant dispatch, image cropping, regeneration state)
//! - Exam and worksheet document layouts
//! - The derived values both targets must agree on (totals, answer lines)

pub mod derived;
mod exam;
mod regenerate;
mod section;
mod types;
mod worksheet;

pub use derived::{answer_line_count, total_marks};
pub use exam::*;
pub use regenerate::*;
pub use section::*;
pub use types::*;
pub use worksheet::*;
