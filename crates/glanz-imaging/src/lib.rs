// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// glanz-imaging — Pixel work for the Glanz document editor.
//
// Decodes uploaded photos into RGBA rasters, applies rotation and scale,
// runs one of the seven enhancement filters, and re-encodes the result as
// JPEG, either at full size (commit) or bounded for an interactive preview.

pub mod compose;
pub mod filter;
pub mod geometry;
pub mod raster;

// Re-export the primary entry points so callers can use `glanz_imaging::Compositor` etc.
pub use compose::{Compositor, Preview, PreviewRenderer};
pub use filter::apply_filter;
pub use geometry::GeometryTransformer;
pub use raster::{RasterBuffer, decode, encode_jpeg};
