//! State owned by the worker: the current snapshot and everything tied to it

use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use worksheet_synth::{
    BrandingOptions, LayoutContext, PendingRegenerations, RenderTarget, SynthError,
    SynthesisInput, SynthesisOptions, ViewDocument, synthesize_view,
};

/// A failure as the user sees it. At most one is shown at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    pub guidance: Option<String>,
}

impl From<&SynthError> for Banner {
    fn from(error: &SynthError) -> Self {
        let guidance = match error {
            SynthError::MalformedResponse(_) | SynthError::Generation(_) => {
                Some("Try generating again.")
            }
            SynthError::ImageDecodeFailure(_) => Some("Use a PNG, JPEG, GIF or WebP image."),
            SynthError::ExportFailure(_) => {
                Some("The document on screen is unchanged. Try exporting again.")
            }
            SynthError::NetworkAcquisitionFailure(_) => {
                Some("Save the image to your computer and upload it as a local file.")
            }
            _ => None,
        };

        Banner {
            message: error.to_string(),
            guidance: guidance.map(str::to_string),
        }
    }
}

/// One user's working state.
///
/// Every generation request bumps the generation counter; results carry the
/// counter value they were requested under and are only applied while it is
/// still current. Image regenerations are tagged with the generation of the
/// snapshot on screen instead, so they never land on a newer document.
/// Reference loads and exports are tagged with the reset epoch.
/// Snapshots are replaced, never edited in place.
pub struct Session {
    generation: u64,
    /// Generation of the snapshot in `document`, 0 when there is none
    displayed: u64,
    epoch: u64,
    document: Option<SynthesisInput>,
    reference: Option<Arc<DynamicImage>>,
    branding: BrandingOptions,
    options: SynthesisOptions,
    pending: PendingRegenerations,
    banner: Option<Banner>,
}

impl Session {
    pub fn new(branding: BrandingOptions, options: SynthesisOptions) -> Self {
        Self {
            generation: 0,
            displayed: 0,
            epoch: 0,
            document: None,
            reference: None,
            branding,
            options,
            pending: PendingRegenerations::new(),
            banner: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new generation; anything still in flight becomes stale
    pub fn begin_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn displayed_generation(&self) -> u64 {
        self.displayed
    }

    /// Whether `generation` produced the snapshot on screen
    pub fn is_displayed(&self, generation: u64) -> bool {
        self.document.is_some() && generation == self.displayed
    }

    /// Bumped by every reset
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_current_epoch(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }

    /// Install a freshly generated document. Returns false for a stale result.
    pub fn apply_generated(&mut self, generation: u64, document: SynthesisInput) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.document = Some(document);
        self.displayed = generation;
        true
    }

    /// Swap in a new snapshot where `section_id` shows `url`. `generation` is
    /// the snapshot the regeneration was requested on. Returns false when
    /// that snapshot has been replaced or the section is no longer there.
    pub fn apply_section_image(&mut self, generation: u64, section_id: &str, url: String) -> bool {
        if !self.is_displayed(generation) {
            return false;
        }
        let Some(SynthesisInput::Worksheet(data)) = &self.document else {
            return false;
        };
        match data.with_section_image(section_id, url) {
            Some(updated) => {
                self.document = Some(SynthesisInput::Worksheet(updated));
                true
            }
            None => false,
        }
    }

    /// Mark `section_id` as regenerating and return its image prompt.
    /// `Ok(None)` means a regeneration for it is already pending.
    pub fn begin_regeneration(
        &mut self,
        section_id: &str,
        now: Instant,
    ) -> Result<Option<String>, SynthError> {
        let Some(SynthesisInput::Worksheet(data)) = &self.document else {
            return Err(SynthError::Generation(
                "Only worksheet illustrations can be regenerated".to_string(),
            ));
        };
        let prompt = data
            .section(section_id)
            .and_then(|section| section.image_prompt.clone())
            .ok_or_else(|| {
                SynthError::Generation(format!("Section {} has no image prompt", section_id))
            })?;

        if !self.pending.begin(section_id, now) {
            return Ok(None);
        }
        Ok(Some(prompt))
    }

    pub fn is_regenerating(&self, section_id: &str, now: Instant) -> bool {
        self.pending.is_pending(section_id, now)
    }

    /// Clear regenerations whose wait elapsed, returning their section ids
    pub fn prune_regenerations(&mut self, now: Instant) -> Vec<String> {
        self.pending.prune(now)
    }

    pub fn set_reference(&mut self, reference: Arc<DynamicImage>) {
        self.reference = Some(reference);
    }

    pub fn reference(&self) -> Option<&Arc<DynamicImage>> {
        self.reference.as_ref()
    }

    pub fn document(&self) -> Option<&SynthesisInput> {
        self.document.as_ref()
    }

    pub fn branding(&self) -> &BrandingOptions {
        &self.branding
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    /// Lay out the current document for `target`
    pub fn view(&self, target: RenderTarget, now: Instant) -> Option<ViewDocument> {
        let document = self.document.as_ref()?;
        let mut ctx = LayoutContext::new().with_regeneration(&self.pending, now);
        if let Some(reference) = &self.reference {
            ctx = ctx.with_reference(reference);
        }
        Some(synthesize_view(
            document,
            &self.branding,
            &ctx,
            &self.options,
            target,
        ))
    }

    /// Record a failure as the current banner
    pub fn fail(&mut self, error: &SynthError) -> Banner {
        let banner = Banner::from(error);
        self.banner = Some(banner.clone());
        banner
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// Returns false if there was nothing to dismiss
    pub fn dismiss_banner(&mut self) -> bool {
        self.banner.take().is_some()
    }

    /// Forget the document and reference. In-flight results become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.epoch += 1;
        self.displayed = 0;
        self.document = None;
        self.reference = None;
        self.pending.clear();
        self.banner = None;
    }
}
