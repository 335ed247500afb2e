// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry — uniform scale followed by rotation about the canvas centre.
// The canvas keeps the scaled size; rotated content outside it is clipped,
// which is what the editor preview shows.

use std::borrow::Cow;

use glanz_core::error::{GlanzError, Result};
use glanz_core::{EnhanceConfig, TransformParams};
use image::imageops::{self, FilterType};
use image::Rgba;
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use tracing::{debug, info, instrument};

use crate::raster::RasterBuffer;

/// Largest canvas edge the transformer will allocate.
pub const MAX_CANVAS_EDGE: u32 = u16::MAX as u32;

/// Applies scale and rotation to raster buffers.
#[derive(Debug, Clone, Copy)]
pub struct GeometryTransformer {
    /// Fill for canvas pixels that no source pixel maps onto.
    background: Rgba<u8>,
    /// Upper bound on `width * height * 4` of the scaled canvas.
    max_canvas_bytes: u64,
}

impl Default for GeometryTransformer {
    fn default() -> Self {
        Self::from_config(&EnhanceConfig::default())
    }
}

impl GeometryTransformer {
    pub fn new(background: [u8; 4], max_canvas_bytes: u64) -> Self {
        Self {
            background: Rgba(background),
            max_canvas_bytes,
        }
    }

    pub fn from_config(config: &EnhanceConfig) -> Self {
        Self::new(config.background, config.max_canvas_bytes)
    }

    /// Scale `buffer` by `params.scale_factor`, then rotate it clockwise by
    /// `params.rotation_degrees` about the centre of the scaled canvas.
    ///
    /// A borrowed buffer is only copied when neither step produces a new
    /// one. The identity transform returns the buffer untouched. Rotations by
    /// 180° (and 90°/270° on square canvases) are exact pixel moves; other
    /// angles and all scaling use bilinear sampling.
    #[instrument(skip(self, buffer), fields(width = buffer.width(), height = buffer.height()))]
    pub fn transform(
        &self,
        buffer: Cow<'_, RasterBuffer>,
        params: &TransformParams,
    ) -> Result<RasterBuffer> {
        params.validate()?;
        if params.is_identity_geometry() {
            return Ok(buffer.into_owned());
        }
        let (width, height) = scaled_dimensions(
            buffer.width(),
            buffer.height(),
            params.scale_factor,
            self.max_canvas_bytes,
        )?;

        let scaled = if (width, height) == buffer.dimensions() {
            buffer
        } else {
            info!(
                from_w = buffer.width(),
                from_h = buffer.height(),
                width,
                height,
                "Scaling image"
            );
            Cow::Owned(imageops::resize(&*buffer, width, height, FilterType::Triangle))
        };

        Ok(self.rotate(scaled, params.normalized_rotation()))
    }

    /// Rotate by `normalised` degrees in `[0, 360)` on the same canvas size.
    fn rotate(&self, buffer: Cow<'_, RasterBuffer>, normalised: f64) -> RasterBuffer {
        if normalised == 0.0 {
            return buffer.into_owned();
        }
        info!(degrees = normalised, "Rotating image");

        let square = buffer.width() == buffer.height();
        if normalised == 180.0 {
            return imageops::rotate180(&*buffer);
        }
        if square && normalised == 90.0 {
            return imageops::rotate90(&*buffer);
        }
        if square && normalised == 270.0 {
            return imageops::rotate270(&*buffer);
        }

        let rotated = rotate_about_center(
            &*buffer,
            normalised.to_radians() as f32,
            Interpolation::Bilinear,
            self.background,
        );
        debug!("General rotation applied");
        rotated
    }
}

/// Canvas size after scaling: each edge rounded to the nearest integer, at
/// least one pixel. Edges over `MAX_CANVAS_EDGE` or an RGBA canvas over
/// `max_canvas_bytes` are rejected before anything is allocated.
pub fn scaled_dimensions(
    width: u32,
    height: u32,
    scale_factor: f64,
    max_canvas_bytes: u64,
) -> Result<(u32, u32)> {
    let edge = |len: u32| -> Result<u32> {
        let scaled = (f64::from(len) * scale_factor).round().max(1.0);
        if scaled > f64::from(MAX_CANVAS_EDGE) {
            return Err(GlanzError::InvalidParameter(format!(
                "scaled edge of {scaled} px exceeds {MAX_CANVAS_EDGE} px"
            )));
        }
        Ok(scaled as u32)
    };
    let (width, height) = (edge(width)?, edge(height)?);

    let bytes = u64::from(width) * u64::from(height) * 4;
    if bytes > max_canvas_bytes {
        return Err(GlanzError::InvalidParameter(format!(
            "scaled canvas {width}x{height} needs {bytes} bytes, the limit is {max_canvas_bytes} bytes"
        )));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    const NO_LIMIT: u64 = u64::MAX;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    fn params(rotation_degrees: f64, scale_factor: f64) -> TransformParams {
        TransformParams::default()
            .with_rotation(rotation_degrees)
            .with_scale(scale_factor)
    }

    fn turn(image: RgbaImage, rotation_degrees: f64, scale_factor: f64) -> Result<RgbaImage> {
        GeometryTransformer::default()
            .transform(Cow::Owned(image), &params(rotation_degrees, scale_factor))
    }

    #[test]
    fn identity_is_byte_identical() {
        let image = gradient(13, 7);
        let out = turn(image.clone(), 0.0, 1.0).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn borrowed_and_owned_inputs_agree() {
        let image = gradient(30, 20);
        let transformer = GeometryTransformer::default();
        for (rotation, scale) in [(0.0, 1.0), (0.0, 0.5), (33.0, 1.0), (180.0, 1.5)] {
            let borrowed = transformer
                .transform(Cow::Borrowed(&image), &params(rotation, scale))
                .unwrap();
            let owned = turn(image.clone(), rotation, scale).unwrap();
            assert_eq!(borrowed, owned, "rotation {rotation}, scale {scale}");
        }
    }

    #[test]
    fn scale_two_doubles_canvas() {
        let out = turn(gradient(50, 50), 0.0, 2.0).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
    }

    #[test]
    fn tiny_scale_keeps_one_pixel() {
        let out = turn(gradient(5, 3), 0.0, 0.01).unwrap();
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn scaled_edges_round_to_nearest() {
        assert_eq!(scaled_dimensions(3, 5, 0.5, NO_LIMIT).unwrap(), (2, 3));
        assert_eq!(scaled_dimensions(10, 10, 1.04, NO_LIMIT).unwrap(), (10, 10));
        assert!(scaled_dimensions(60_000, 10, 2.0, NO_LIMIT).is_err());
    }

    #[test]
    fn canvas_area_is_capped() {
        let limit = EnhanceConfig::default().max_canvas_bytes;
        // Both edges stay under MAX_CANVAS_EDGE, but the canvas would need
        // about 4.4 GB.
        let err = scaled_dimensions(11_000, 11_000, 3.0, limit).unwrap_err();
        assert!(matches!(err, GlanzError::InvalidParameter(_)));
        assert!(scaled_dimensions(4_000, 3_000, 3.0, limit).is_ok());

        // Exactly at the limit is allowed; one pixel over is not.
        assert_eq!(scaled_dimensions(10, 10, 1.0, 400).unwrap(), (10, 10));
        assert!(scaled_dimensions(10, 10, 1.1, 400).is_err());
    }

    #[test]
    fn transformer_applies_its_canvas_limit() {
        let transformer = GeometryTransformer::new([255, 255, 255, 0], 64 * 64 * 4);
        let image = gradient(32, 32);
        assert!(transformer.transform(Cow::Borrowed(&image), &params(0.0, 2.0)).is_ok());
        let err = transformer
            .transform(Cow::Borrowed(&image), &params(0.0, 2.5))
            .unwrap_err();
        assert!(matches!(err, GlanzError::InvalidParameter(_)));
    }

    #[test]
    fn full_turn_keeps_dimensions_and_pixels() {
        let image = gradient(20, 12);
        let zero = turn(image.clone(), 0.0, 1.0).unwrap();
        let full = turn(image, 360.0, 1.0).unwrap();
        assert_eq!(full.dimensions(), zero.dimensions());
        assert_eq!(full, zero);
    }

    #[test]
    fn rotation_keeps_canvas_size() {
        let out = turn(gradient(40, 20), 33.0, 1.0).unwrap();
        assert_eq!(out.dimensions(), (40, 20));
    }

    #[test]
    fn quarter_turn_on_wide_canvas_clips_and_fills_background() {
        let image = RgbaImage::from_pixel(40, 10, Rgba([0, 0, 0, 255]));
        let out = GeometryTransformer::new([255, 255, 255, 0], NO_LIMIT)
            .transform(Cow::Owned(image), &params(90.0, 1.0))
            .unwrap();
        assert_eq!(out.dimensions(), (40, 10));
        // The rotated strip is 10 wide and centred; the left edge is uncovered.
        assert_eq!(*out.get_pixel(0, 5), Rgba([255, 255, 255, 0]));
        assert_eq!(out.get_pixel(20, 5).0[3], 255);
    }

    #[test]
    fn half_turn_is_exact() {
        let image = gradient(6, 4);
        let out = turn(image.clone(), -180.0, 1.0).unwrap();
        assert_eq!(out.get_pixel(0, 0), image.get_pixel(5, 3));
        assert_eq!(out.get_pixel(5, 3), image.get_pixel(0, 0));
    }

    #[test]
    fn quarter_turn_on_square_is_clockwise() {
        let mut image = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 255]));
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let out = turn(image, 90.0, 1.0).unwrap();
        // Top-left moves to top-right under a clockwise quarter turn.
        assert_eq!(*out.get_pixel(2, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        for scale in [0.0, -2.0, f64::NAN] {
            let err = turn(gradient(4, 4), 0.0, scale).unwrap_err();
            assert!(matches!(err, GlanzError::InvalidParameter(_)));
        }
        let err = turn(gradient(4, 4), f64::INFINITY, 1.0).unwrap_err();
        assert!(matches!(err, GlanzError::InvalidParameter(_)));
    }
}
