// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compositing — decode, transform, filter and encode in one pass, either at
// full resolution for a commit or bounded to a display size for previews.

use std::borrow::Cow;

use glanz_core::error::{GlanzError, Result};
use glanz_core::{EncodedImage, EnhanceConfig, MediaType, SourceImage, TransformParams};
use tracing::{debug, info, instrument};

use crate::filter::apply_filter;
use crate::geometry::GeometryTransformer;
use crate::raster::{RasterBuffer, decode, encode_jpeg};

/// Full-resolution render producing the bytes that replace an upload.
///
/// Output is always JPEG, whatever the input format.
#[derive(Debug, Clone)]
pub struct Compositor {
    quality: u8,
    geometry: GeometryTransformer,
}

impl Compositor {
    pub fn new(config: &EnhanceConfig) -> Self {
        Self {
            quality: config.jpeg_quality,
            geometry: GeometryTransformer::from_config(config),
        }
    }

    /// Decode `source` and render it with `params`.
    ///
    /// Invalid `params` are rejected up front with `InvalidParameter`; any
    /// failure after that, decoding included, is a `Render` error.
    #[instrument(skip(self, source), fields(filename = source.filename(), data_len = source.len()))]
    pub fn render(&self, source: &SourceImage, params: &TransformParams) -> Result<EncodedImage> {
        params.validate()?;
        let buffer = decode(source.bytes(), source.mime()).map_err(GlanzError::into_render)?;
        self.render_buffer(Cow::Owned(buffer), params, source.filename())
    }

    /// Render an already decoded buffer, skipping the decode step. The
    /// buffer is only read; the output is built in fresh memory.
    pub fn render_decoded(
        &self,
        buffer: &RasterBuffer,
        params: &TransformParams,
        filename: &str,
    ) -> Result<EncodedImage> {
        self.render_buffer(Cow::Borrowed(buffer), params, filename)
    }

    #[instrument(skip(self, buffer), fields(width = buffer.width(), height = buffer.height()))]
    fn render_buffer(
        &self,
        buffer: Cow<'_, RasterBuffer>,
        params: &TransformParams,
        filename: &str,
    ) -> Result<EncodedImage> {
        params.validate()?;
        let out = transform_and_filter(&self.geometry, buffer, params)
            .map_err(GlanzError::into_render)?;
        let bytes = encode_jpeg(&out, self.quality).map_err(GlanzError::into_render)?;

        info!(
            width = out.width(),
            height = out.height(),
            encoded_len = bytes.len(),
            filter = %params.filter,
            "Render complete"
        );
        Ok(EncodedImage {
            bytes,
            media_type: MediaType::Jpeg,
            filename: filename.to_string(),
            width: out.width(),
            height: out.height(),
        })
    }
}

/// A rendered preview: the display raster plus its JPEG encoding.
#[derive(Debug, Clone)]
pub struct Preview {
    /// Parameters this preview was rendered for.
    pub params: TransformParams,
    pub buffer: RasterBuffer,
    pub jpeg: Vec<u8>,
}

impl Preview {
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }
}

/// Cheap render for interactive feedback.
///
/// Scaling to the display bound happens in the same resample as the user's
/// scale, so the filter only ever runs on a small buffer. Images already
/// within the bound are not enlarged.
#[derive(Debug, Clone)]
pub struct PreviewRenderer {
    max_dimension: u32,
    quality: u8,
    geometry: GeometryTransformer,
}

impl PreviewRenderer {
    pub fn new(config: &EnhanceConfig) -> Self {
        Self {
            max_dimension: config.preview_max_dimension.max(1),
            quality: config.jpeg_quality,
            geometry: GeometryTransformer::from_config(config),
        }
    }

    /// Render a preview of `buffer` with `params`.
    pub fn render(&self, buffer: &RasterBuffer, params: &TransformParams) -> Result<Preview> {
        self.render_until(buffer, params, || false)?
            .ok_or_else(|| GlanzError::Render("preview cancelled".into()))
    }

    /// Render a preview, checking `cancelled` between stages.
    ///
    /// `buffer` is only read: the display-sized copy comes out of the
    /// resample, so a full-resolution source is never duplicated. Returns
    /// `Ok(None)` as soon as `cancelled` reports true, without finishing the
    /// remaining stages.
    #[instrument(skip(self, buffer, cancelled), fields(width = buffer.width(), height = buffer.height()))]
    pub fn render_until(
        &self,
        buffer: &RasterBuffer,
        params: &TransformParams,
        cancelled: impl Fn() -> bool,
    ) -> Result<Option<Preview>> {
        params.validate()?;
        let scale = self.display_scale(buffer.width(), buffer.height(), params.scale_factor);
        debug!(requested = params.scale_factor, effective = scale, "Preview scale");

        let display = params.with_scale(scale);
        let out = transform_and_filter(&self.geometry, Cow::Borrowed(buffer), &display)
            .map_err(GlanzError::into_render)?;
        if cancelled() {
            debug!("Preview superseded before encoding");
            return Ok(None);
        }
        let jpeg = encode_jpeg(&out, self.quality).map_err(GlanzError::into_render)?;
        if cancelled() {
            return Ok(None);
        }

        Ok(Some(Preview {
            params: *params,
            buffer: out,
            jpeg,
        }))
    }

    /// Scale factor that applies `scale_factor` and then shrinks the long
    /// edge to `max_dimension` if it would exceed it.
    fn display_scale(&self, width: u32, height: u32, scale_factor: f64) -> f64 {
        let long_edge = f64::from(width.max(height)) * scale_factor;
        let bound = f64::from(self.max_dimension);
        if long_edge > bound {
            scale_factor * bound / long_edge
        } else {
            scale_factor
        }
    }
}

/// Geometry then filter. An owned input flows straight through; a borrowed
/// one is copied at most once.
fn transform_and_filter(
    geometry: &GeometryTransformer,
    buffer: Cow<'_, RasterBuffer>,
    params: &TransformParams,
) -> Result<RasterBuffer> {
    let mut out = geometry.transform(buffer, params)?;
    apply_filter(&mut out, params.filter);
    Ok(out)
}
