//! Image preparation for OCR.
//!
//! Uploads are decoded, downscaled to fit the configured bounding box and
//! re-encoded as PNG so the vision model always receives one predictable
//! format at a bounded size.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, ImageFormat, ImageReader, imageops::FilterType};

use super::IngestError;

/// Decode `bytes`, fit within `max_dimension`, and return a PNG data URI.
pub fn prepare_for_ocr(bytes: &[u8], max_dimension: u32) -> Result<String, IngestError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| IngestError::Image(format!("cannot read image: {e}")))?
        .decode()
        .map_err(|e| IngestError::Image(format!("cannot decode image: {e}")))?;

    let img = resize_to_fit(img, max_dimension);
    let png = encode_as_png(&img)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(png)))
}

/// Resize when either side exceeds `max_pixels`, keeping the aspect ratio.
fn resize_to_fit(img: DynamicImage, max_pixels: u32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if max_pixels == 0 || (w <= max_pixels && h <= max_pixels) {
        return img;
    }

    let ratio = f64::from(max_pixels) / f64::from(w.max(h));
    let new_w = ((f64::from(w) * ratio).round() as u32).max(1);
    let new_h = ((f64::from(h) * ratio).round() as u32).max(1);
    img.resize(new_w, new_h, FilterType::Lanczos3)
}

fn encode_as_png(img: &DynamicImage) -> Result<Vec<u8>, IngestError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| IngestError::Image(format!("cannot encode PNG: {e}")))?;
    Ok(buffer)
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::new_rgb8(width, height);
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png).unwrap();
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded_size(data_uri: &str) -> (u32, u32) {
        let b64 = data_uri.strip_prefix("data:image/png;base64,").unwrap();
        let bytes = BASE64.decode(b64).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn small_image_kept_as_is() {
        let uri = prepare_for_ocr(&sample_png(40, 20), 100).unwrap();
        assert_eq!(decoded_size(&uri), (40, 20));
    }

    #[test]
    fn large_image_downscaled_keeping_ratio() {
        let uri = prepare_for_ocr(&sample_png(400, 100), 200).unwrap();
        assert_eq!(decoded_size(&uri), (200, 50));
    }

    #[test]
    fn garbage_rejected() {
        assert!(matches!(prepare_for_ocr(b"not an image", 100), Err(IngestError::Image(_))));
    }
}
