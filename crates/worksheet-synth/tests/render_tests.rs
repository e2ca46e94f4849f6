use image::{DynamicImage, Rgba, RgbaImage};
use serde_json::json;
use worksheet_synth::layout::{ImageVisual, SectionBody};
use worksheet_synth::render::FooterPlacement;
use worksheet_synth::*;

fn worksheet_json() -> serde_json::Value {
    json!({
        "title": "Insects",
        "subject": "Science",
        "gradeLevel": "Grade 3",
        "instructions": "Look closely & answer.",
        "sections": [
            { "id": "pic", "type": "image", "content": { "text": "A beetle", "prompt": "Label the legs" },
              "boundingBox": [0, 0, 500, 500], "imagePrompt": "a beetle on a leaf" },
            { "id": "fill", "type": "fill-blank", "content": { "sentence": "An insect has ___ legs" } },
            { "id": "pairs", "type": "matching", "content": { "pairs": [
                { "left": "Ant", "right": "Colony" },
                { "left": "Bee", "right": "Hive" }
            ] } }
        ]
    })
}

fn reference() -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 100, Rgba([10, 200, 30, 255])))
}

#[test]
fn test_reference_crop_appears_in_view() {
    let input = SynthesisInput::Worksheet(validate_worksheet(&worksheet_json()).unwrap());
    let source = reference();
    let ctx = LayoutContext::new().with_reference(&source);

    let view = synthesize_view(
        &input,
        &BrandingOptions::default(),
        &ctx,
        &SynthesisOptions::default(),
        RenderTarget::Screen,
    );

    let image = view
        .sections()
        .find_map(|section| match &section.body {
            SectionBody::Image(image) => Some(image),
            _ => None,
        })
        .unwrap();
    match &image.visual {
        ImageVisual::Cropped { image } => assert_eq!(image.dimensions(), (100, 50)),
        other => panic!("Expected cropped visual, got {:?}", other),
    }
    assert_eq!(image.caption.as_deref(), Some("A beetle"));
}

#[test]
fn test_html_escapes_and_embeds_crop() {
    let input = SynthesisInput::Worksheet(validate_worksheet(&worksheet_json()).unwrap());
    let source = reference();
    let ctx = LayoutContext::new().with_reference(&source);
    let view = synthesize_view(
        &input,
        &BrandingOptions::default(),
        &ctx,
        &SynthesisOptions::default(),
        RenderTarget::Screen,
    );

    let html = render_html(&view).unwrap();
    assert!(html.contains("Look closely &amp; answer."));
    assert!(html.contains("data:image/png;base64,"));
    assert!(html.contains("<span class=\"blank\"></span>"));
    assert!(html.contains("Colony"));
}

#[test]
fn test_print_hides_regenerate_control() {
    let input = SynthesisInput::Worksheet(validate_worksheet(&worksheet_json()).unwrap());
    let pending = PendingRegenerations::new();
    let now = std::time::Instant::now();
    let ctx = LayoutContext::new().with_regeneration(&pending, now);
    let options = SynthesisOptions::default();
    let branding = BrandingOptions::default();

    let screen = synthesize_view(&input, &branding, &ctx, &options, RenderTarget::Screen);
    let print = synthesize_view(&input, &branding, &ctx, &options, RenderTarget::Print);

    assert!(render_html(&screen).unwrap().contains("class=\"regenerate no-print\""));
    assert!(!render_html(&print).unwrap().contains("class=\"regenerate"));
    assert_eq!(print.footer_placement, FooterPlacement::PinnedToPageBottom);
    assert_eq!(screen.footer_placement, FooterPlacement::Flowed);
}

#[test]
fn test_pending_regeneration_disables_control() {
    let input = SynthesisInput::Worksheet(validate_worksheet(&worksheet_json()).unwrap());
    let mut pending = PendingRegenerations::new();
    let now = std::time::Instant::now();
    assert!(pending.begin("pic", now));

    let ctx = LayoutContext::new().with_regeneration(&pending, now);
    let view = synthesize_view(
        &input,
        &BrandingOptions::default(),
        &ctx,
        &SynthesisOptions::default(),
        RenderTarget::Screen,
    );
    let html = render_html(&view).unwrap();
    assert!(html.contains("Regenerating..."));
    assert!(html.contains(" disabled"));
}

#[test]
fn test_exam_html_shows_total_and_answer_lines() {
    let data = validate_exam(&json!({
        "institution": "Hill School",
        "subject": "Biology",
        "grade": "10",
        "duration": "1 hour",
        "questions": [
            { "text": "Name a cell organelle.", "marks": 1 },
            { "text": "Describe osmosis.", "marks": 4 }
        ]
    }))
    .unwrap();
    let view = synthesize_view(
        &SynthesisInput::Exam(data),
        &BrandingOptions::default(),
        &LayoutContext::new(),
        &SynthesisOptions::default(),
        RenderTarget::Print,
    );

    let html = render_html(&view).unwrap();
    assert!(html.contains("Total Marks: 5"));
    assert!(html.contains("BIOLOGY EXAMINATION"));
    assert_eq!(html.matches("class=\"answer\"").count(), 2 + 3);
    assert_eq!(view.pages[0].footer, "Page 1 of 1");
}

#[test]
fn test_long_exam_paginates() {
    let questions: Vec<_> = (0..60)
        .map(|i| json!({ "text": format!("Question {} text", i), "marks": 5 }))
        .collect();
    let data = validate_exam(&json!({
        "institution": "Hill School",
        "subject": "History",
        "questions": questions
    }))
    .unwrap();
    let view = synthesize_view(
        &SynthesisInput::Exam(data),
        &BrandingOptions::default(),
        &LayoutContext::new(),
        &SynthesisOptions::default(),
        RenderTarget::Print,
    );

    assert!(view.page_count() > 1);
    let last = view.page_count();
    assert_eq!(
        view.pages[last - 1].footer,
        format!("Page {} of {}", last, last)
    );
    assert_eq!(view.answer_line_counts().len(), 60);
}
