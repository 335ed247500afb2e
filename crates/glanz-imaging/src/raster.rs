// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster buffers — decoding uploaded JPEG/PNG bytes into RGBA8 and encoding
// finished buffers back to JPEG.

use std::io::Cursor;

use glanz_core::MediaType;
use glanz_core::error::{GlanzError, Result};
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageReader, RgbImage, RgbaImage};
use tracing::{debug, instrument, warn};

/// Row-major RGBA8 pixels with a top-left origin.
///
/// `image::RgbaImage` guarantees `len == width * height * 4`. Stages take the
/// buffer by value and hand it on, so no two stages hold it at once.
pub type RasterBuffer = RgbaImage;

/// Decode raw upload bytes into a raster buffer.
///
/// The declared `mime` decides whether the file is editable at all: PDFs and
/// unknown types are refused with `UnsupportedMedia`. The pixel format itself
/// is sniffed from the bytes, so a PNG that arrived labelled `image/jpeg`
/// still opens. Content that is neither JPEG nor PNG, or that fails to decode,
/// is a `Decode` error.
#[instrument(skip(bytes), fields(data_len = bytes.len()))]
pub fn decode(bytes: &[u8], mime: &str) -> Result<RasterBuffer> {
    let media = MediaType::from_mime(mime)
        .ok_or_else(|| GlanzError::UnsupportedMedia(mime.to_string()))?;
    if !media.is_raster() {
        warn!(mime = media.mime_type(), "refusing to edit non-raster media");
        return Err(GlanzError::UnsupportedMedia(media.mime_type().to_string()));
    }
    if bytes.is_empty() {
        return Err(GlanzError::Decode("no image data".into()));
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| GlanzError::Decode(format!("failed to read image header: {err}")))?;

    match reader.format() {
        Some(ImageFormat::Jpeg | ImageFormat::Png) => {}
        Some(other) => {
            return Err(GlanzError::Decode(format!(
                "{other:?} data is not a JPEG or PNG image"
            )));
        }
        None => return Err(GlanzError::Decode("unrecognised image data".into())),
    }

    let image = reader
        .decode()
        .map_err(|err| GlanzError::Decode(format!("failed to decode image: {err}")))?;
    debug!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Image decoded from bytes"
    );
    Ok(image.into_rgba8())
}

/// Encode a raster buffer as baseline JPEG at `quality` (1-100).
///
/// JPEG has no alpha channel; alpha is dropped and the colour channels are
/// written as they are.
pub fn encode_jpeg(buffer: &RasterBuffer, quality: u8) -> Result<Vec<u8>> {
    let rgb: RgbImage = buffer.convert();
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|err| GlanzError::Render(format!("JPEG encoding failed: {err}")))?;
    debug!(
        width = buffer.width(),
        height = buffer.height(),
        encoded_len = bytes.len(),
        "JPEG encoded"
    );
    Ok(bytes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, Rgba};

    /// Encode `image` as PNG bytes.
    pub(crate) fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image.clone())
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decode_png_preserves_pixels() {
        let mut image = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        image.put_pixel(2, 1, Rgba([200, 100, 50, 128]));
        let decoded = decode(&png_bytes(&image), "image/png").unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn decode_sniffs_mislabelled_content() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        let decoded = decode(&png_bytes(&image), "image/jpeg").unwrap();
        assert_eq!(decoded.dimensions(), (4, 4));
    }

    #[test]
    fn decode_jpeg_round_trips_dimensions() {
        let image = RgbaImage::from_pixel(17, 9, Rgba([120, 130, 140, 255]));
        let jpeg = encode_jpeg(&image, 90).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let decoded = decode(&jpeg, "image/jpg").unwrap();
        assert_eq!(decoded.dimensions(), (17, 9));
    }

    #[test]
    fn pdf_is_unsupported_media() {
        let err = decode(b"%PDF-1.7\n", "application/pdf").unwrap_err();
        assert!(matches!(err, GlanzError::UnsupportedMedia(_)));
    }

    #[test]
    fn unknown_mime_is_unsupported_media() {
        let err = decode(b"GIF89a", "image/gif").unwrap_err();
        assert!(matches!(err, GlanzError::UnsupportedMedia(_)));
    }

    #[test]
    fn truncated_png_is_decode_error() {
        let image = RgbaImage::from_pixel(32, 32, Rgba([9, 9, 9, 255]));
        let bytes = png_bytes(&image);
        let err = decode(&bytes[..bytes.len() / 2], "image/png").unwrap_err();
        assert!(matches!(err, GlanzError::Decode(_)));
    }

    #[test]
    fn garbage_and_empty_input_are_decode_errors() {
        assert!(matches!(
            decode(b"definitely not an image", "image/png"),
            Err(GlanzError::Decode(_))
        ));
        assert!(matches!(decode(&[], "image/jpeg"), Err(GlanzError::Decode(_))));
    }
}
