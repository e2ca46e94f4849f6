//! Normalized bounding-box cropping
//!
//! Maps a `[ymin, xmin, ymax, xmax]` box in `0..=1000` space onto the pixel
//! grid of a decoded reference image and copies that region onto a fresh
//! surface sized to the box.

use image::{DynamicImage, GenericImageView, RgbaImage, imageops};

use crate::constants::{BOX_SCALE, MAX_CROP_DIMENSION};
use crate::model::BoundingBox;
use crate::raster::decode_reference;
use crate::types::Result;

/// Source region and output surface size of one crop, in pixels.
///
/// `x`/`y` may be negative or past the image edge when the box lies partly
/// outside `0..=1000`; only the overlapping pixels get copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Compute the crop region for an image of `image_width` x `image_height`.
///
/// Returns `None` (no crop) when any box component is undefined, or when the
/// resulting surface would be empty or absurdly large.
pub fn crop_region(bbox: &BoundingBox, image_width: u32, image_height: u32) -> Option<CropRegion> {
    let [ymin, xmin, ymax, xmax] = bbox.components()?;
    let w = image_width as f64;
    let h = image_height as f64;

    let sx = xmin / BOX_SCALE * w;
    let sy = ymin / BOX_SCALE * h;
    let s_width = (xmax - xmin) / BOX_SCALE * w;
    let s_height = (ymax - ymin) / BOX_SCALE * h;

    // A canvas truncates fractional sizes; below one pixel there is nothing to draw
    if !(s_width >= 1.0 && s_height >= 1.0) {
        log::debug!(
            "Bounding box {:?} yields a {}x{} surface, skipping crop",
            bbox,
            s_width,
            s_height
        );
        return None;
    }
    if s_width > MAX_CROP_DIMENSION || s_height > MAX_CROP_DIMENSION {
        log::warn!(
            "Bounding box {:?} yields an oversized {}x{} surface, skipping crop",
            bbox,
            s_width,
            s_height
        );
        return None;
    }

    Some(CropRegion {
        x: sx.floor() as i64,
        y: sy.floor() as i64,
        width: s_width.trunc() as u32,
        height: s_height.trunc() as u32,
    })
}

/// Crop `source` to `bbox`. Pure: the same image and box always give the same
/// pixels.
pub fn crop_image(source: &DynamicImage, bbox: &BoundingBox) -> Option<RgbaImage> {
    let (image_width, image_height) = source.dimensions();
    let region = crop_region(bbox, image_width, image_height)?;

    let mut surface = RgbaImage::new(region.width, region.height);

    // Clip the source rectangle to the image; the rest of the surface stays transparent
    let x0 = region.x.clamp(0, image_width as i64);
    let y0 = region.y.clamp(0, image_height as i64);
    let x1 = (region.x + region.width as i64).clamp(0, image_width as i64);
    let y1 = (region.y + region.height as i64).clamp(0, image_height as i64);

    if x1 > x0 && y1 > y0 {
        let visible = source
            .crop_imm(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
            .to_rgba8();
        imageops::replace(&mut surface, &visible, x0 - region.x, y0 - region.y);
    }

    Some(surface)
}

/// Decode raw reference bytes, then crop. The crop only runs once decoding has
/// finished; decode errors surface as `ImageDecodeFailure`.
pub async fn decode_and_crop(bytes: Vec<u8>, bbox: BoundingBox) -> Result<Option<RgbaImage>> {
    let source = decode_reference(bytes).await?;
    Ok(tokio::task::spawn_blocking(move || crop_image(&source, &bbox)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_region_scales_to_image() {
        let bbox = BoundingBox::new(100.0, 250.0, 600.0, 750.0);
        let region = crop_region(&bbox, 400, 200).unwrap();
        assert_eq!(
            region,
            CropRegion {
                x: 100,
                y: 20,
                width: 200,
                height: 100,
            }
        );
    }

    #[test]
    fn test_undefined_component_skips_crop() {
        let bbox = BoundingBox {
            ymin: Some(0.0),
            xmin: None,
            ymax: Some(500.0),
            xmax: Some(500.0),
        };
        assert_eq!(crop_region(&bbox, 100, 100), None);
        assert!(crop_image(&gradient(100, 100), &bbox).is_none());
    }

    #[test]
    fn test_inverted_or_empty_box_skips_crop() {
        assert!(crop_region(&BoundingBox::new(500.0, 500.0, 100.0, 900.0), 100, 100).is_none());
        assert!(crop_region(&BoundingBox::new(0.0, 0.0, 0.0, 0.0), 100, 100).is_none());
        // 1/1000 of a 100px image is a tenth of a pixel
        assert!(crop_region(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), 100, 100).is_none());
    }

    #[test]
    fn test_crop_copies_source_pixels() {
        let source = gradient(100, 50);
        let bbox = BoundingBox::new(200.0, 100.0, 600.0, 500.0);
        let cropped = crop_image(&source, &bbox).unwrap();

        assert_eq!(cropped.dimensions(), (40, 20));
        // Surface origin is source pixel (10, 10)
        assert_eq!(*cropped.get_pixel(0, 0), Rgba([10, 10, 20, 255]));
        assert_eq!(*cropped.get_pixel(39, 19), Rgba([49, 29, 78, 255]));
    }

    #[test]
    fn test_out_of_range_box_keeps_box_size() {
        let source = gradient(100, 100);
        let bbox = BoundingBox::new(900.0, -100.0, 1100.0, 100.0);
        let cropped = crop_image(&source, &bbox).unwrap();

        assert_eq!(cropped.dimensions(), (20, 20));
        // Left half and bottom half fall outside the image
        assert_eq!(cropped.get_pixel(0, 0)[3], 0);
        assert_eq!(*cropped.get_pixel(10, 0), Rgba([0, 90, 90, 255]));
        assert_eq!(cropped.get_pixel(10, 10)[3], 0);
    }

    #[test]
    fn test_crop_is_idempotent() {
        let source = gradient(321, 123);
        let bbox = BoundingBox::new(12.5, 33.3, 870.1, 999.9);
        let first = crop_image(&source, &bbox).unwrap();
        let second = crop_image(&source, &bbox).unwrap();
        assert_eq!(first, second);
    }
}
