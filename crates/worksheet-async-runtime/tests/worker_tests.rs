use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, Rgb, RgbImage};
use serde_json::json;
use tokio::sync::mpsc;
use worksheet_async_runtime::*;
use worksheet_synth::raster::{encode_png, png_data_url};

/// Answers by prompt: "slow" takes five seconds, "garbage" is not an object,
/// "fail" is a service error, "bees" is a second worksheet reusing the same
/// section ids
struct MockGenerator;

impl ContentGenerator for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratorOutput, SynthError> {
        match request {
            GenerationRequest::Document { kind, prompt, .. } => {
                if prompt == "slow" {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                match (prompt.as_str(), kind) {
                    ("garbage", _) => Ok(GeneratorOutput::Json(json!("not a worksheet"))),
                    ("fail", _) => Err(SynthError::Generation("quota exceeded".to_string())),
                    ("bees", DocumentKind::Worksheet) => Ok(GeneratorOutput::Json(bees_json())),
                    (_, DocumentKind::Worksheet) => Ok(GeneratorOutput::Json(worksheet_json())),
                    (_, DocumentKind::Exam) => Ok(GeneratorOutput::Json(exam_json())),
                    (_, DocumentKind::WorksheetImage) => {
                        Ok(GeneratorOutput::ImageUrl(png_data_url(&png(60, 80))))
                    }
                }
            }
            GenerationRequest::SectionImage { section_id, .. } => {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(GeneratorOutput::ImageUrl(format!(
                    "https://img.example/{}-new.png",
                    section_id
                )))
            }
        }
    }
}

fn worksheet_json() -> serde_json::Value {
    json!({
        "title": "Bugs",
        "subject": "Science",
        "sections": [
            { "id": "pic", "type": "image", "content": { "text": "Beetle" },
              "boundingBox": [0, 0, 500, 500], "imagePrompt": "a beetle" },
            { "id": "fill", "type": "fill-blank", "content": { "sentence": "A ___ has six legs" } }
        ]
    })
}

fn bees_json() -> serde_json::Value {
    json!({
        "title": "Bees",
        "sections": [
            { "id": "pic", "type": "image", "content": { "text": "Honeybee" },
              "imagePrompt": "a honeybee" }
        ]
    })
}

fn exam_json() -> serde_json::Value {
    json!({
        "institution": "Ridge School",
        "subject": "Chemistry",
        "questions": [
            { "text": "Define an atom.", "marks": 2 },
            { "text": "Balance the equation.", "marks": 5 }
        ]
    })
}

fn png(width: u32, height: u32) -> Vec<u8> {
    encode_png(&DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        Rgb([30, 60, 90]),
    )))
    .unwrap()
}

fn start() -> (
    mpsc::UnboundedSender<SynthCommand>,
    mpsc::UnboundedReceiver<SynthUpdate>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let session = Session::new(BrandingOptions::default(), SynthesisOptions::default());
    tokio::spawn(worker_task(
        Arc::new(MockGenerator),
        session,
        command_rx,
        update_tx,
    ));
    (command_tx, update_rx)
}

/// Next update that is not a progress report
async fn next(rx: &mut mpsc::UnboundedReceiver<SynthUpdate>) -> SynthUpdate {
    loop {
        match rx.recv().await {
            Some(SynthUpdate::Progress { .. }) => continue,
            Some(update) => return update,
            None => panic!("Worker stopped"),
        }
    }
}

async fn render(
    tx: &mpsc::UnboundedSender<SynthCommand>,
    rx: &mut mpsc::UnboundedReceiver<SynthUpdate>,
    target: RenderTarget,
) -> String {
    tx.send(SynthCommand::RenderView { target }).unwrap();
    match next(rx).await {
        SynthUpdate::ViewRendered { html, .. } => html,
        other => panic!("Expected ViewRendered, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_render_and_stats() {
    let (tx, mut rx) = start();

    tx.send(SynthCommand::Generate {
        kind: DocumentKind::Exam,
        prompt: "chemistry".into(),
    })
    .unwrap();
    match next(&mut rx).await {
        SynthUpdate::Generated { generation, kind } => {
            assert_eq!(generation, 1);
            assert_eq!(kind, DocumentKind::Exam);
        }
        other => panic!("Expected Generated, got {:?}", other),
    }

    let html = render(&tx, &mut rx, RenderTarget::Print).await;
    assert!(html.contains("Total Marks: 7"));
    assert!(html.contains("CHEMISTRY EXAMINATION"));

    tx.send(SynthCommand::CalculateStats).unwrap();
    match next(&mut rx).await {
        SynthUpdate::StatsCalculated { stats } => {
            assert_eq!(stats.total_marks, 7);
            assert_eq!(stats.answer_lines, 5);
        }
        other => panic!("Expected StatsCalculated, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_response_raises_dismissible_banner() {
    let (tx, mut rx) = start();

    tx.send(SynthCommand::Generate {
        kind: DocumentKind::Worksheet,
        prompt: "garbage".into(),
    })
    .unwrap();
    match next(&mut rx).await {
        SynthUpdate::Error { banner, .. } => {
            assert!(banner.message.starts_with("Malformed response"));
            assert!(banner.guidance.is_some());
        }
        other => panic!("Expected Error, got {:?}", other),
    }

    tx.send(SynthCommand::DismissBanner).unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::BannerDismissed));

    // The worker is still alive and nothing was installed
    tx.send(SynthCommand::RenderView {
        target: RenderTarget::Screen,
    })
    .unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::Error { .. }));
}

#[tokio::test]
async fn test_generator_error_is_reported() {
    let (tx, mut rx) = start();
    tx.send(SynthCommand::Generate {
        kind: DocumentKind::Exam,
        prompt: "fail".into(),
    })
    .unwrap();
    match next(&mut rx).await {
        SynthUpdate::Error { message, .. } => assert!(message.contains("quota exceeded")),
        other => panic!("Expected Error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_late_result_after_reset_is_dropped() {
    let (tx, mut rx) = start();

    tx.send(SynthCommand::Generate {
        kind: DocumentKind::Worksheet,
        prompt: "slow".into(),
    })
    .unwrap();
    tx.send(SynthCommand::Reset).unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::SessionReset));

    // The slow result lands at five seconds and must not show up
    let late = tokio::time::timeout(Duration::from_secs(10), next(&mut rx)).await;
    assert!(late.is_err(), "Unexpected update: {:?}", late);

    tx.send(SynthCommand::CalculateStats).unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::Error { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_newer_generation_wins() {
    let (tx, mut rx) = start();

    tx.send(SynthCommand::Generate {
        kind: DocumentKind::Worksheet,
        prompt: "slow".into(),
    })
    .unwrap();
    tx.send(SynthCommand::Generate {
        kind: DocumentKind::Exam,
        prompt: "quick".into(),
    })
    .unwrap();

    match next(&mut rx).await {
        SynthUpdate::Generated { generation, kind } => {
            assert_eq!(generation, 2);
            assert_eq!(kind, DocumentKind::Exam);
        }
        other => panic!("Expected Generated, got {:?}", other),
    }

    tokio::time::sleep(Duration::from_secs(6)).await;
    let html = render(&tx, &mut rx, RenderTarget::Screen).await;
    assert!(html.contains("CHEMISTRY EXAMINATION"));
    assert!(!html.contains("Bugs"));
}

#[tokio::test(start_paused = true)]
async fn test_regeneration_replaces_image_and_auto_clears() {
    let (tx, mut rx) = start();

    tx.send(SynthCommand::Generate {
        kind: DocumentKind::Worksheet,
        prompt: "insects".into(),
    })
    .unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::Generated { .. }));

    tx.send(SynthCommand::RegenerateImage {
        section_id: "pic".into(),
    })
    .unwrap();
    assert!(matches!(
        next(&mut rx).await,
        SynthUpdate::RegenerationStarted { section_id } if section_id == "pic"
    ));

    // A second click while pending is ignored
    tx.send(SynthCommand::RegenerateImage {
        section_id: "pic".into(),
    })
    .unwrap();
    let html = render(&tx, &mut rx, RenderTarget::Screen).await;
    assert!(html.contains("Regenerating..."));

    assert!(matches!(
        next(&mut rx).await,
        SynthUpdate::SectionImageUpdated { section_id } if section_id == "pic"
    ));
    let html = render(&tx, &mut rx, RenderTarget::Screen).await;
    assert!(html.contains("https://img.example/pic-new.png"));
    assert!(html.contains("<span class=\"blank\"></span>"));
    // Still inside the wait even though the image arrived
    assert!(html.contains("Regenerating..."));

    match next(&mut rx).await {
        SynthUpdate::RegenerationExpired { section_ids } => assert_eq!(section_ids, vec!["pic"]),
        other => panic!("Expected RegenerationExpired, got {:?}", other),
    }
    let html = render(&tx, &mut rx, RenderTarget::Screen).await;
    assert!(html.contains(">Regenerate</button>"));

    let print = render(&tx, &mut rx, RenderTarget::Print).await;
    assert!(!print.contains("<button"));
}

#[tokio::test(start_paused = true)]
async fn test_regeneration_is_dropped_when_document_is_replaced() {
    let (tx, mut rx) = start();

    tx.send(SynthCommand::Generate {
        kind: DocumentKind::Worksheet,
        prompt: "insects".into(),
    })
    .unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::Generated { .. }));

    // Clicked on the first worksheet while the second is on its way
    tx.send(SynthCommand::Generate {
        kind: DocumentKind::Worksheet,
        prompt: "bees".into(),
    })
    .unwrap();
    tx.send(SynthCommand::RegenerateImage {
        section_id: "pic".into(),
    })
    .unwrap();
    assert!(matches!(
        next(&mut rx).await,
        SynthUpdate::RegenerationStarted { section_id } if section_id == "pic"
    ));
    match next(&mut rx).await {
        SynthUpdate::Generated { generation, .. } => assert_eq!(generation, 2),
        other => panic!("Expected Generated, got {:?}", other),
    }

    tokio::time::sleep(Duration::from_secs(2)).await;
    let html = render(&tx, &mut rx, RenderTarget::Screen).await;
    assert!(html.contains("Bees"));
    assert!(!html.contains("pic-new.png"));
}

#[tokio::test]
async fn test_regenerate_without_prompt_is_reported() {
    let (tx, mut rx) = start();
    tx.send(SynthCommand::Generate {
        kind: DocumentKind::Worksheet,
        prompt: "insects".into(),
    })
    .unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::Generated { .. }));

    tx.send(SynthCommand::RegenerateImage {
        section_id: "fill".into(),
    })
    .unwrap();
    match next(&mut rx).await {
        SynthUpdate::Error { message, .. } => assert!(message.contains("no image prompt")),
        other => panic!("Expected Error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reference_image_is_cropped_into_view() {
    let (tx, mut rx) = start();

    tx.send(SynthCommand::AcquireReference {
        source: ReferenceSource::Bytes(png(100, 40)),
    })
    .unwrap();
    match next(&mut rx).await {
        SynthUpdate::ReferenceLoaded { width, height } => assert_eq!((width, height), (100, 40)),
        other => panic!("Expected ReferenceLoaded, got {:?}", other),
    }

    tx.send(SynthCommand::Generate {
        kind: DocumentKind::Worksheet,
        prompt: "insects".into(),
    })
    .unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::Generated { .. }));

    let html = render(&tx, &mut rx, RenderTarget::Screen).await;
    assert!(html.contains("alt=\"Cropped illustration\""));
}

#[tokio::test]
async fn test_bad_reference_is_reported() {
    let (tx, mut rx) = start();

    tx.send(SynthCommand::AcquireReference {
        source: ReferenceSource::Bytes(b"definitely not an image".to_vec()),
    })
    .unwrap();
    match next(&mut rx).await {
        SynthUpdate::Error { banner, .. } => {
            assert!(banner.message.starts_with("Image decode failure"));
        }
        other => panic!("Expected Error, got {:?}", other),
    }

    let dir = tempfile::tempdir().unwrap();
    tx.send(SynthCommand::AcquireReference {
        source: ReferenceSource::File(dir.path().join("missing.png")),
    })
    .unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::Error { .. }));
}

#[tokio::test]
async fn test_hung_reference_download_does_not_block_reset() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let server = std::thread::spawn(move || {
        // Accept and never answer until released
        let (stream, _) = listener.accept().unwrap();
        let _ = release_rx.recv();
        drop(stream);
    });

    let (tx, mut rx) = start();
    tx.send(SynthCommand::AcquireReference {
        source: ReferenceSource::Url(format!("http://{}/reference.png", addr)),
    })
    .unwrap();
    tx.send(SynthCommand::Reset).unwrap();

    let update = tokio::time::timeout(Duration::from_secs(5), next(&mut rx))
        .await
        .expect("worker stalled behind the download");
    assert!(matches!(update, SynthUpdate::SessionReset));

    // The failed download belongs to the old session and is dropped
    release_tx.send(()).unwrap();
    server.join().unwrap();
    let late = tokio::time::timeout(Duration::from_millis(500), next(&mut rx)).await;
    assert!(late.is_err(), "Unexpected update: {:?}", late);
}

#[tokio::test]
async fn test_failed_export_leaves_document_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, b"occupied").unwrap();
    let (tx, mut rx) = start();

    tx.send(SynthCommand::Generate {
        kind: DocumentKind::WorksheetImage,
        prompt: "farm animals".into(),
    })
    .unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::Generated { .. }));
    let before = render(&tx, &mut rx, RenderTarget::Screen).await;

    for command in [
        SynthCommand::ExportImage {
            output_dir: blocker.join("out"),
        },
        SynthCommand::ExportDocument {
            output_dir: blocker.join("out"),
        },
    ] {
        tx.send(command).unwrap();
        match next(&mut rx).await {
            SynthUpdate::Error { message, banner } => {
                assert!(message.starts_with("Export failure"));
                assert!(banner.guidance.unwrap().contains("unchanged"));
            }
            other => panic!("Expected Error, got {:?}", other),
        }
    }

    let after = render(&tx, &mut rx, RenderTarget::Screen).await;
    assert_eq!(before, after);

    tx.send(SynthCommand::CalculateStats).unwrap();
    match next(&mut rx).await {
        SynthUpdate::StatsCalculated { stats } => {
            assert_eq!(stats.kind, DocumentKind::WorksheetImage);
        }
        other => panic!("Expected StatsCalculated, got {:?}", other),
    }
}

#[tokio::test]
async fn test_exports_write_files() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, mut rx) = start();

    tx.send(SynthCommand::ExportDocument {
        output_dir: dir.path().to_path_buf(),
    })
    .unwrap();
    match next(&mut rx).await {
        SynthUpdate::Error { message, banner } => {
            assert!(message.starts_with("Export failure"));
            assert!(banner.guidance.is_some());
        }
        other => panic!("Expected Error, got {:?}", other),
    }

    tx.send(SynthCommand::Generate {
        kind: DocumentKind::WorksheetImage,
        prompt: "farm animals".into(),
    })
    .unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::Generated { .. }));

    tx.send(SynthCommand::ExportImage {
        output_dir: dir.path().to_path_buf(),
    })
    .unwrap();
    let png_path = match next(&mut rx).await {
        SynthUpdate::ImageExported { path } => path,
        other => panic!("Expected ImageExported, got {:?}", other),
    };
    let name = png_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("worksheet-") && name.ends_with(".png"));
    let saved = image::load_from_memory(&std::fs::read(&png_path).unwrap()).unwrap();
    assert_eq!((saved.width(), saved.height()), (60, 80));

    tx.send(SynthCommand::ExportDocument {
        output_dir: dir.path().to_path_buf(),
    })
    .unwrap();
    match next(&mut rx).await {
        SynthUpdate::DocumentExported { path } => {
            assert!(path.extension().is_some_and(|ext| ext == "pdf"));
            assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
        }
        other => panic!("Expected DocumentExported, got {:?}", other),
    }
}

#[tokio::test]
async fn test_export_image_requires_image_document() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, mut rx) = start();

    tx.send(SynthCommand::Generate {
        kind: DocumentKind::Exam,
        prompt: "chemistry".into(),
    })
    .unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::Generated { .. }));

    tx.send(SynthCommand::ExportImage {
        output_dir: dir.path().to_path_buf(),
    })
    .unwrap();
    assert!(matches!(next(&mut rx).await, SynthUpdate::Error { .. }));
}
