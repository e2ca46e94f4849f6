use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use worksheet_synth::*;

fn checkerboard(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        if (x / 7 + y / 5) % 2 == 0 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    }))
}

#[test]
fn test_repeated_crops_are_pixel_identical() {
    let source = checkerboard(640, 480);
    let boxes = [
        BoundingBox::new(0.0, 0.0, 1000.0, 1000.0),
        BoundingBox::new(125.0, 250.0, 875.0, 750.0),
        BoundingBox::new(333.3, 666.6, 999.9, 1000.0),
        BoundingBox::new(0.0, 990.0, 1000.0, 1000.0),
    ];

    for bbox in boxes {
        let first = crop_image(&source, &bbox).unwrap();
        let second = crop_image(&source, &bbox).unwrap();
        assert_eq!(first, second, "crop of {:?} is not deterministic", bbox);
    }
}

#[test]
fn test_full_box_reproduces_source() {
    let source = checkerboard(64, 32);
    let cropped = crop_image(&source, &BoundingBox::new(0.0, 0.0, 1000.0, 1000.0)).unwrap();
    assert_eq!(cropped, source.to_rgba8());
}

#[test]
fn test_any_undefined_component_means_no_crop() {
    let source = checkerboard(100, 100);
    for missing in 0..4 {
        let mut components = [Some(100.0), Some(100.0), Some(900.0), Some(900.0)];
        components[missing] = None;
        let bbox = BoundingBox::from_components(&components).unwrap();
        assert!(crop_region(&bbox, 100, 100).is_none());
        assert!(crop_image(&source, &bbox).is_none());
    }
}

#[test]
fn test_nan_component_means_no_crop() {
    let bbox = BoundingBox::new(0.0, f64::NAN, 500.0, 500.0);
    assert!(crop_image(&checkerboard(10, 10), &bbox).is_none());
}

#[test]
fn test_crop_size_follows_box() {
    let source = checkerboard(1000, 500);
    let cropped = crop_image(&source, &BoundingBox::new(100.0, 200.0, 500.0, 700.0)).unwrap();
    assert_eq!(cropped.dimensions(), (500, 200));
    assert_eq!(cropped.get_pixel(0, 0), &source.get_pixel(200, 50));
}

#[tokio::test]
async fn test_decode_then_crop() {
    let png = raster::encode_png(&checkerboard(50, 50)).unwrap();
    let cropped = decode_and_crop(png, BoundingBox::new(0.0, 0.0, 200.0, 200.0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cropped.dimensions(), (10, 10));
}

#[tokio::test]
async fn test_undecodable_reference_is_reported() {
    let result = decode_and_crop(vec![1, 2, 3, 4], BoundingBox::new(0.0, 0.0, 500.0, 500.0)).await;
    assert!(matches!(result, Err(SynthError::ImageDecodeFailure(_))));
}
