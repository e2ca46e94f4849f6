//! Per-section layout dispatch

use std::sync::Arc;

use crate::constants::DRAWING_CANVAS_HEIGHT_PT;
use crate::crop::crop_image;
use crate::model::{ImageContent, SectionContent, WorksheetSection};

use super::derived::split_blanks;
use super::{
    ImageLayout, ImageVisual, LayoutContext, RegenerateAffordance, SectionBody, SectionLayout,
};

/// Lay out one section.
///
/// Image sections were already classified when the section was validated (an
/// explicit `image` type or a four-element bounding box), so dispatch is a
/// plain match over the content variant.
pub fn layout_section(section: &WorksheetSection, ctx: &LayoutContext<'_>) -> SectionLayout {
    let body = match &section.content {
        SectionContent::Image(content) => SectionBody::Image(layout_image(section, content, ctx)),
        SectionContent::Matching(content) => {
            let (left, right) = content
                .pairs
                .iter()
                .map(|pair| (pair.left.clone(), pair.right.clone()))
                .unzip();
            SectionBody::Matching { left, right }
        }
        SectionContent::FillBlank(content) => SectionBody::FillBlank {
            fragments: split_blanks(&content.sentence),
        },
        SectionContent::Drawing(content) => SectionBody::Drawing {
            prompt: content.prompt.clone(),
            canvas_height_pt: DRAWING_CANVAS_HEIGHT_PT,
        },
        SectionContent::Math(content) => SectionBody::Math {
            cells: content
                .problems
                .iter()
                .map(|problem| problem.question.clone())
                .collect(),
        },
        SectionContent::Text(content) => SectionBody::Text {
            text: content.text.clone(),
        },
    };

    SectionLayout {
        id: section.id.clone(),
        title: section.title.clone(),
        body,
    }
}

fn layout_image(
    section: &WorksheetSection,
    content: &ImageContent,
    ctx: &LayoutContext<'_>,
) -> ImageLayout {
    let visual = if let Some(url) = &section.generated_image_url {
        ImageVisual::Generated { url: url.clone() }
    } else {
        ctx.reference
            .zip(section.bounding_box.as_ref())
            .and_then(|(reference, bbox)| crop_image(reference, bbox))
            .map(|cropped| ImageVisual::Cropped {
                image: Arc::new(cropped),
            })
            .unwrap_or(ImageVisual::Placeholder)
    };

    let regenerate = match (ctx.regeneration, &section.image_prompt) {
        (Some(pending), Some(prompt)) => Some(RegenerateAffordance {
            section_id: section.id.clone(),
            prompt: prompt.clone(),
            pending: pending.is_pending(&section.id, ctx.now),
        }),
        _ => None,
    };

    ImageLayout {
        caption: content.text.clone(),
        note: content.prompt.clone(),
        visual,
        regenerate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PendingRegenerations;
    use crate::model::{BoundingBox, FillBlankContent, MatchingContent, MatchingPair};
    use image::{DynamicImage, RgbaImage};
    use std::time::Duration;

    fn section(content: SectionContent) -> WorksheetSection {
        WorksheetSection {
            id: "s1".to_string(),
            title: Some("Section".to_string()),
            content,
            bounding_box: None,
            image_prompt: None,
            generated_image_url: None,
        }
    }

    #[test]
    fn test_matching_keeps_input_order() {
        let layout = layout_section(
            &section(SectionContent::Matching(MatchingContent {
                pairs: vec![
                    MatchingPair {
                        left: "Cat".into(),
                        right: "Meow".into(),
                    },
                    MatchingPair {
                        left: "Dog".into(),
                        right: "Woof".into(),
                    },
                ],
            })),
            &LayoutContext::new(),
        );

        assert_eq!(
            layout.body,
            SectionBody::Matching {
                left: vec!["Cat".into(), "Dog".into()],
                right: vec!["Meow".into(), "Woof".into()],
            }
        );
    }

    #[test]
    fn test_fill_blank_fragments() {
        let layout = layout_section(
            &section(SectionContent::FillBlank(FillBlankContent {
                sentence: "The ___ has ___ legs".into(),
            })),
            &LayoutContext::new(),
        );
        assert_eq!(layout.body.blank_count(), 2);
        assert_eq!(layout.body.segments().len(), 5);
    }

    #[test]
    fn test_image_visual_priority() {
        let reference = DynamicImage::ImageRgba8(RgbaImage::new(100, 100));
        let ctx = LayoutContext::new().with_reference(&reference);

        let mut image = section(SectionContent::Image(ImageContent::default()));
        assert_eq!(
            match layout_section(&image, &ctx).body {
                SectionBody::Image(layout) => layout.visual,
                other => panic!("Expected image body, got {:?}", other),
            },
            ImageVisual::Placeholder
        );

        image.bounding_box = Some(BoundingBox::new(0.0, 0.0, 500.0, 500.0));
        match layout_section(&image, &ctx).body {
            SectionBody::Image(ImageLayout {
                visual: ImageVisual::Cropped { image },
                ..
            }) => assert_eq!(image.dimensions(), (50, 50)),
            other => panic!("Expected cropped image, got {:?}", other),
        }

        image.generated_image_url = Some("https://img.example/cat.png".into());
        match layout_section(&image, &ctx).body {
            SectionBody::Image(layout) => assert_eq!(
                layout.visual,
                ImageVisual::Generated {
                    url: "https://img.example/cat.png".into()
                }
            ),
            other => panic!("Expected image body, got {:?}", other),
        }
    }

    #[test]
    fn test_regenerate_affordance_requires_prompt_and_wiring() {
        fn regenerate(
            image: &WorksheetSection,
            ctx: &LayoutContext<'_>,
        ) -> Option<RegenerateAffordance> {
            match layout_section(image, ctx).body {
                SectionBody::Image(layout) => layout.regenerate,
                _ => None,
            }
        }

        let mut image = section(SectionContent::Image(ImageContent::default()));

        let start = std::time::Instant::now();
        let mut pending = PendingRegenerations::new();
        pending.begin("s1", start);

        // No prompt, nothing to regenerate from
        let wired = LayoutContext::new().with_regeneration(&pending, start);
        assert!(regenerate(&image, &wired).is_none());

        image.image_prompt = Some("a cat".into());
        assert!(regenerate(&image, &LayoutContext::new()).is_none());

        let affordance = regenerate(&image, &wired).unwrap();
        assert!(affordance.pending);
        assert_eq!(affordance.prompt, "a cat");

        let later =
            LayoutContext::new().with_regeneration(&pending, start + Duration::from_secs(8));
        assert!(!regenerate(&image, &later).unwrap().pending);
    }
}
