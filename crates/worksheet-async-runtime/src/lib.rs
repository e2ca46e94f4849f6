//! Export orchestration for worksheet synthesis
//!
//! A single worker task owns the [`Session`] and talks to the front end over
//! two unbounded channels: [`SynthCommand`] in, [`SynthUpdate`] out.

mod acquire;
mod generator;
mod session;
mod worker;

use std::path::PathBuf;

// Re-export types from the library crate
pub use worksheet_synth::{
    BrandingOptions, DocumentKind, DocumentStatistics, RenderTarget, SynthError, SynthesisInput,
    SynthesisOptions,
};

pub use acquire::{ReferenceSource, acquire_reference};
pub use generator::{ContentGenerator, GenerationRequest, GeneratorOutput};
pub use session::{Banner, Session};
pub use worker::worker_task;

/// Commands sent from the front end to the worker
#[derive(Debug)]
pub enum SynthCommand {
    /// Ask the generator for a new document, replacing the current one
    Generate { kind: DocumentKind, prompt: String },
    /// Regenerate the illustration of one image section
    RegenerateImage { section_id: String },
    /// Load the reference image that image sections are cropped from
    AcquireReference { source: ReferenceSource },
    /// Write the portable document into `output_dir`
    ExportDocument { output_dir: PathBuf },
    /// Write the full-page worksheet image into `output_dir`
    ExportImage { output_dir: PathBuf },
    /// Produce the HTML view of the current document
    RenderView { target: RenderTarget },
    CalculateStats,
    DismissBanner,
    /// Drop the current document; late results for it are ignored
    Reset,
}

/// Updates sent from the worker to the front end
#[derive(Debug, Clone)]
pub enum SynthUpdate {
    Progress {
        operation: String,
    },
    Generated {
        generation: u64,
        kind: DocumentKind,
    },
    RegenerationStarted {
        section_id: String,
    },
    SectionImageUpdated {
        section_id: String,
    },
    /// Pending regenerations whose wait elapsed
    RegenerationExpired {
        section_ids: Vec<String>,
    },
    ReferenceLoaded {
        width: u32,
        height: u32,
    },
    ViewRendered {
        target: RenderTarget,
        page_count: usize,
        html: String,
    },
    DocumentExported {
        path: PathBuf,
    },
    ImageExported {
        path: PathBuf,
    },
    StatsCalculated {
        stats: DocumentStatistics,
    },
    BannerDismissed,
    SessionReset,
    Error {
        message: String,
        banner: Banner,
    },
}
