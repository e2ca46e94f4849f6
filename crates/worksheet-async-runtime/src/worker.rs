use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use worksheet_synth::{
    DocumentKind, GeneratedWorksheetImage, SynthError, SynthesisInput, calculate_statistics,
    decode_reference, export_document, raster_file_name, render_html, synthesize_raster,
    validate_exam, validate_worksheet,
};

use crate::acquire::acquire_reference;
use crate::generator::{ContentGenerator, GenerationRequest, GeneratorOutput};
use crate::session::Session;
use crate::{ReferenceSource, SynthCommand, SynthUpdate};

/// How often expired regenerations are looked for
const PRUNE_INTERVAL: Duration = Duration::from_millis(250);

/// What a background task produced
enum Outcome {
    Generated {
        request: GenerationRequest,
        result: Result<GeneratorOutput, SynthError>,
    },
    Reference(Result<DynamicImage, SynthError>),
    DocumentExported(Result<PathBuf, SynthError>),
    ImageExported(Result<PathBuf, SynthError>),
}

/// A background result, tagged with the session state it was started under.
///
/// Document generations carry their generation, image regenerations the
/// generation of the snapshot they were clicked on, everything else the
/// reset epoch.
struct Completion {
    tag: u64,
    outcome: Outcome,
}

/// Async worker task that owns the session, processes commands and sends
/// updates. Generator calls, reference loads and exports run as separate
/// tasks so the worker stays responsive while they are in flight.
pub async fn worker_task<G: ContentGenerator>(
    generator: Arc<G>,
    mut session: Session,
    mut command_rx: mpsc::UnboundedReceiver<SynthCommand>,
    update_tx: mpsc::UnboundedSender<SynthUpdate>,
) {
    let (completion_tx, mut completion_rx) = mpsc::unbounded_channel();
    let mut prune = tokio::time::interval(PRUNE_INTERVAL);
    prune.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            cmd = command_rx.recv() => {
                let Some(cmd) = cmd else { break };
                process_command(cmd, &generator, &mut session, &completion_tx, &update_tx);
            }
            Some(completion) = completion_rx.recv() => {
                apply_completion(completion, &mut session, &update_tx);
            }
            _ = prune.tick() => {
                let expired = session.prune_regenerations(now());
                if !expired.is_empty() {
                    log::debug!("Regeneration wait elapsed for {:?}", expired);
                    let _ = update_tx.send(SynthUpdate::RegenerationExpired {
                        section_ids: expired,
                    });
                }
            }
        }
    }

    log::debug!("Command channel closed, worker exiting");
}

fn process_command<G: ContentGenerator>(
    cmd: SynthCommand,
    generator: &Arc<G>,
    session: &mut Session,
    completion_tx: &mpsc::UnboundedSender<Completion>,
    update_tx: &mpsc::UnboundedSender<SynthUpdate>,
) {
    match cmd {
        SynthCommand::Generate { kind, prompt } => {
            let generation = session.begin_generation();
            log::info!("Generating {:?} (generation {})", kind, generation);
            let _ = update_tx.send(SynthUpdate::Progress {
                operation: format!("Generating {:?}", kind),
            });
            let request = GenerationRequest::Document {
                kind,
                prompt,
                reference: session.reference().cloned(),
            };
            spawn_generation(generator, request, generation, completion_tx);
        }
        SynthCommand::RegenerateImage { section_id } => {
            match session.begin_regeneration(&section_id, now()) {
                Ok(Some(prompt)) => {
                    log::info!("Regenerating image for section {}", section_id);
                    let _ = update_tx.send(SynthUpdate::RegenerationStarted {
                        section_id: section_id.clone(),
                    });
                    let request = GenerationRequest::SectionImage { section_id, prompt };
                    let displayed = session.displayed_generation();
                    spawn_generation(generator, request, displayed, completion_tx);
                }
                Ok(None) => {
                    log::debug!("Section {} is already regenerating", section_id);
                }
                Err(e) => report(e, session, update_tx),
            }
        }
        SynthCommand::AcquireReference { source } => {
            start_acquire_reference(source, session, completion_tx, update_tx);
        }
        SynthCommand::ExportDocument { output_dir } => {
            start_export_document(output_dir, session, completion_tx, update_tx);
        }
        SynthCommand::ExportImage { output_dir } => {
            start_export_image(output_dir, session, completion_tx, update_tx);
        }
        SynthCommand::RenderView { target } => {
            let Some(view) = session.view(target, now()) else {
                report(nothing_generated(), session, update_tx);
                return;
            };
            match render_html(&view) {
                Ok(html) => {
                    let _ = update_tx.send(SynthUpdate::ViewRendered {
                        target,
                        page_count: view.page_count(),
                        html,
                    });
                }
                Err(e) => report(e, session, update_tx),
            }
        }
        SynthCommand::CalculateStats => {
            let Some(document) = session.document() else {
                report(nothing_generated(), session, update_tx);
                return;
            };
            let reference = session.reference().map(|reference| reference.as_ref());
            let stats =
                calculate_statistics(document, session.branding(), reference, session.options());
            let _ = update_tx.send(SynthUpdate::StatsCalculated { stats });
        }
        SynthCommand::DismissBanner => {
            if session.dismiss_banner() {
                let _ = update_tx.send(SynthUpdate::BannerDismissed);
            }
        }
        SynthCommand::Reset => {
            session.reset();
            log::info!("Session reset");
            let _ = update_tx.send(SynthUpdate::SessionReset);
        }
    }
}

/// Run `work` on its own task and hand its outcome back to the worker
fn spawn_tagged(
    tag: u64,
    completion_tx: &mpsc::UnboundedSender<Completion>,
    work: impl Future<Output = Outcome> + Send + 'static,
) {
    let completion_tx = completion_tx.clone();
    tokio::spawn(async move {
        let outcome = work.await;
        let _ = completion_tx.send(Completion { tag, outcome });
    });
}

fn spawn_generation<G: ContentGenerator>(
    generator: &Arc<G>,
    request: GenerationRequest,
    tag: u64,
    completion_tx: &mpsc::UnboundedSender<Completion>,
) {
    let generator = Arc::clone(generator);
    spawn_tagged(tag, completion_tx, async move {
        let result = generator.generate(request.clone()).await;
        Outcome::Generated { request, result }
    });
}

fn apply_completion(
    completion: Completion,
    session: &mut Session,
    update_tx: &mpsc::UnboundedSender<SynthUpdate>,
) {
    let Completion { tag, outcome } = completion;

    let current = match &outcome {
        Outcome::Generated {
            request: GenerationRequest::Document { .. },
            ..
        } => session.is_current(tag),
        Outcome::Generated {
            request: GenerationRequest::SectionImage { .. },
            ..
        } => session.is_displayed(tag),
        _ => session.is_current_epoch(tag),
    };
    if !current {
        log::debug!(
            "Dropping stale result tagged {} (generation {}, epoch {})",
            tag,
            session.generation(),
            session.epoch()
        );
        return;
    }

    match outcome {
        Outcome::Generated { request, result } => {
            apply_generated(tag, request, result, session, update_tx)
        }
        Outcome::Reference(Ok(image)) => {
            let (width, height) = (image.width(), image.height());
            session.set_reference(Arc::new(image));
            log::info!("Reference image loaded ({}x{})", width, height);
            let _ = update_tx.send(SynthUpdate::ReferenceLoaded { width, height });
        }
        Outcome::DocumentExported(Ok(path)) => {
            let _ = update_tx.send(SynthUpdate::DocumentExported { path });
        }
        Outcome::ImageExported(Ok(path)) => {
            log::info!("Saved {}", path.display());
            let _ = update_tx.send(SynthUpdate::ImageExported { path });
        }
        Outcome::Reference(Err(e)) => report(e, session, update_tx),
        Outcome::DocumentExported(Err(e)) | Outcome::ImageExported(Err(e)) => {
            report(as_export_failure(e), session, update_tx)
        }
    }
}

fn apply_generated(
    generation: u64,
    request: GenerationRequest,
    result: Result<GeneratorOutput, SynthError>,
    session: &mut Session,
    update_tx: &mpsc::UnboundedSender<SynthUpdate>,
) {
    match request {
        GenerationRequest::Document { kind, .. } => {
            match result.and_then(|output| into_document(kind, output)) {
                Ok(document) => {
                    if session.apply_generated(generation, document) {
                        log::info!("Generated {:?} (generation {})", kind, generation);
                        let _ = update_tx.send(SynthUpdate::Generated { generation, kind });
                    }
                }
                Err(e) => report(e, session, update_tx),
            }
        }
        GenerationRequest::SectionImage { section_id, .. } => match result {
            Ok(GeneratorOutput::ImageUrl(url)) => {
                // The pending flag is left to its timer
                if session.apply_section_image(generation, &section_id, url) {
                    let _ = update_tx.send(SynthUpdate::SectionImageUpdated { section_id });
                } else {
                    log::warn!("Section {} disappeared before its image arrived", section_id);
                }
            }
            Ok(GeneratorOutput::Json(_)) => report(
                SynthError::MalformedResponse(format!(
                    "Expected an image for section {}, got JSON",
                    section_id
                )),
                session,
                update_tx,
            ),
            Err(e) => report(e, session, update_tx),
        },
    }
}

fn into_document(
    kind: DocumentKind,
    output: GeneratorOutput,
) -> Result<SynthesisInput, SynthError> {
    match (kind, output) {
        (DocumentKind::Worksheet, GeneratorOutput::Json(value)) => {
            Ok(SynthesisInput::Worksheet(validate_worksheet(&value)?))
        }
        (DocumentKind::Exam, GeneratorOutput::Json(value)) => {
            Ok(SynthesisInput::Exam(validate_exam(&value)?))
        }
        (DocumentKind::WorksheetImage, GeneratorOutput::ImageUrl(url)) => {
            Ok(SynthesisInput::WorksheetImage(GeneratedWorksheetImage { url }))
        }
        (kind, GeneratorOutput::Json(_)) => Err(SynthError::MalformedResponse(format!(
            "Expected an image for {:?}, got JSON",
            kind
        ))),
        (kind, GeneratorOutput::ImageUrl(_)) => Err(SynthError::MalformedResponse(format!(
            "Expected JSON for {:?}, got an image",
            kind
        ))),
    }
}

fn start_acquire_reference(
    source: ReferenceSource,
    session: &Session,
    completion_tx: &mpsc::UnboundedSender<Completion>,
    update_tx: &mpsc::UnboundedSender<SynthUpdate>,
) {
    let _ = update_tx.send(SynthUpdate::Progress {
        operation: "Loading reference image".to_string(),
    });

    spawn_tagged(session.epoch(), completion_tx, async move {
        let result = match acquire_reference(source).await {
            Ok(bytes) => decode_reference(bytes).await,
            Err(e) => Err(e),
        };
        Outcome::Reference(result)
    });
}

/// Export works on a copy of the snapshot; the session is never touched
/// until the outcome comes back
fn start_export_document(
    output_dir: PathBuf,
    session: &mut Session,
    completion_tx: &mpsc::UnboundedSender<Completion>,
    update_tx: &mpsc::UnboundedSender<SynthUpdate>,
) {
    let Some(document) = session.document().cloned() else {
        report(nothing_to_export(), session, update_tx);
        return;
    };

    let _ = update_tx.send(SynthUpdate::Progress {
        operation: "Exporting document".to_string(),
    });

    let branding = session.branding().clone();
    let reference = session.reference().cloned();
    let options = session.options().clone();
    spawn_tagged(session.epoch(), completion_tx, async move {
        let result = export_document(
            &document,
            &branding,
            reference,
            &options,
            &output_dir,
            timestamp_millis(),
        )
        .await;
        Outcome::DocumentExported(result)
    });
}

fn start_export_image(
    output_dir: PathBuf,
    session: &mut Session,
    completion_tx: &mpsc::UnboundedSender<Completion>,
    update_tx: &mpsc::UnboundedSender<SynthUpdate>,
) {
    let Some(SynthesisInput::WorksheetImage(image)) = session.document().cloned() else {
        report(
            SynthError::ExportFailure("There is no generated worksheet image to save".to_string()),
            session,
            update_tx,
        );
        return;
    };

    let _ = update_tx.send(SynthUpdate::Progress {
        operation: "Saving worksheet image".to_string(),
    });

    spawn_tagged(session.epoch(), completion_tx, async move {
        let result = async {
            let png = synthesize_raster(&image).await?;
            let path = output_dir.join(raster_file_name(timestamp_millis()));
            tokio::fs::write(&path, png).await?;
            Ok::<_, SynthError>(path)
        }
        .await;
        Outcome::ImageExported(result)
    });
}

/// Log a failure, raise it as the banner and tell the front end
fn report(
    error: SynthError,
    session: &mut Session,
    update_tx: &mpsc::UnboundedSender<SynthUpdate>,
) {
    log::error!("{}", error);
    let banner = session.fail(&error);
    let _ = update_tx.send(SynthUpdate::Error {
        message: error.to_string(),
        banner,
    });
}

fn as_export_failure(error: SynthError) -> SynthError {
    match error {
        SynthError::ExportFailure(_) => error,
        other => SynthError::ExportFailure(other.to_string()),
    }
}

fn nothing_generated() -> SynthError {
    SynthError::Generation("Nothing has been generated yet".to_string())
}

fn nothing_to_export() -> SynthError {
    SynthError::ExportFailure("Nothing has been generated yet".to_string())
}

/// Current time on the runtime clock, so paused test time is honored
fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

fn timestamp_millis() -> i64 {
    chrono::Local::now().timestamp_millis()
}
