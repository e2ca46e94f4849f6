//! Screen and print rendering
//!
//! Flows layout descriptors onto pages for display. The HTML serializer is one
//! consumer of the resulting [`ViewDocument`]; the pagination itself is the
//! same for every target.

mod html;
mod measure;
mod paginate;
mod view;

pub use html::render_html;
pub use measure::{block_height, fitted_size_pt};
pub use view::*;
