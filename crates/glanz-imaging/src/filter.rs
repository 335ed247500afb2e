// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement filters — auto contrast, brightness/contrast, sharpening,
// thresholding, grayscale, whitening and vintage toning for photographed
// documents. Every filter mutates the colour channels of an RGBA buffer in
// place and leaves alpha alone.

use glanz_core::FilterKind;
use tracing::{debug, instrument};

use crate::raster::RasterBuffer;

/// Rec. 601 luma weights.
const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Centre 5, orthogonal neighbours -1, corners 0.
const SHARPEN_KERNEL: [[i32; 3]; 3] = [[0, -1, 0], [-1, 5, -1], [0, -1, 0]];

/// Luma above this becomes white in the black/white filter.
const BW_THRESHOLD: f64 = 128.0;

/// Additive lift used by the whitening filter.
const WHITENING_LIFT: i32 = 30;

/// Brightness offset and contrast factor for one boost step.
#[derive(Debug, Clone, Copy)]
struct Tone {
    brightness: f64,
    contrast: f64,
}

const AUTO_TONE: Tone = Tone { brightness: 10.0, contrast: 1.2 };
const GRAYSCALE_TONE: Tone = Tone { brightness: 15.0, contrast: 1.3 };
const WHITENING_TONE: Tone = Tone { brightness: 20.0, contrast: 1.1 };
const SHARPEN_TONE: Tone = Tone { brightness: 5.0, contrast: 1.1 };

/// Apply `kind` to `buffer` in place.
#[instrument(skip(buffer), fields(width = buffer.width(), height = buffer.height()))]
pub fn apply_filter(buffer: &mut RasterBuffer, kind: FilterKind) {
    match kind {
        FilterKind::Original => {}
        FilterKind::Auto => {
            auto_contrast(buffer);
            brightness_contrast(buffer, AUTO_TONE);
            sharpen(buffer);
        }
        FilterKind::BlackWhite => {
            threshold_black_white(buffer);
            auto_contrast(buffer);
        }
        FilterKind::Grayscale => {
            grayscale(buffer);
            brightness_contrast(buffer, GRAYSCALE_TONE);
        }
        FilterKind::Whitening => {
            whiten(buffer);
            brightness_contrast(buffer, WHITENING_TONE);
        }
        FilterKind::Sharpen => {
            sharpen(buffer);
            brightness_contrast(buffer, SHARPEN_TONE);
        }
        FilterKind::Vintage => vintage(buffer),
    }
    debug!(filter = %kind, "Filter applied");
}

// -- Channel helpers ----------------------------------------------------------

/// Round to nearest (ties to even) and clamp into a channel value.
fn to_channel(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

fn luma(pixel: &[u8; 4]) -> f64 {
    f64::from(pixel[0]) * LUMA_WEIGHTS[0]
        + f64::from(pixel[1]) * LUMA_WEIGHTS[1]
        + f64::from(pixel[2]) * LUMA_WEIGHTS[2]
}

/// Map R, G and B through `f`; alpha is untouched.
fn map_colour(buffer: &mut RasterBuffer, f: impl Fn(u8) -> u8) {
    for pixel in buffer.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = f(*channel);
        }
    }
}

// -- Primitives ---------------------------------------------------------------

/// Stretch the global luma range to 0..=255.
///
/// R, G and B are each remapped with `(v - min) * 255 / (max - min)` where
/// `min`/`max` are the darkest and brightest luma in the buffer. A flat
/// buffer (single luma value) is left unchanged.
fn auto_contrast(buffer: &mut RasterBuffer) {
    let (min, max) = buffer
        .pixels()
        .map(|pixel| luma(&pixel.0))
        .fold((255.0_f64, 0.0_f64), |(lo, hi), l| (lo.min(l), hi.max(l)));

    let range = max - min;
    if range <= 0.0 {
        debug!(min, max, "Flat image; auto contrast skipped");
        return;
    }
    map_colour(buffer, |v| to_channel((f64::from(v) - min) * 255.0 / range));
}

/// Standard brightness/contrast curve:
/// `factor = 259 (100c + 255) / (255 (259 - 100c))`,
/// `v' = factor (v - 128) + 128 + brightness`.
fn brightness_contrast(buffer: &mut RasterBuffer, tone: Tone) {
    let c = tone.contrast * 100.0;
    let factor = (259.0 * (c + 255.0)) / (255.0 * (259.0 - c));
    map_colour(buffer, |v| {
        to_channel(factor * (f64::from(v) - 128.0) + 128.0 + tone.brightness)
    });
}

/// 3x3 sharpen over interior pixels.
///
/// Reads from a snapshot of the input so every output pixel sees the original
/// neighbourhood. The one-pixel border ring keeps its input values.
fn sharpen(buffer: &mut RasterBuffer) {
    let (width, height) = buffer.dimensions();
    if width < 3 || height < 3 {
        return;
    }
    let source = buffer.clone();

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sums = [0i32; 3];
            for (ky, row) in SHARPEN_KERNEL.iter().enumerate() {
                for (kx, &weight) in row.iter().enumerate() {
                    if weight == 0 {
                        continue;
                    }
                    let neighbour = source.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1);
                    for (sum, &value) in sums.iter_mut().zip(&neighbour.0[..3]) {
                        *sum += i32::from(value) * weight;
                    }
                }
            }
            let out = buffer.get_pixel_mut(x, y);
            for (channel, sum) in out.0[..3].iter_mut().zip(sums) {
                *channel = sum.clamp(0, 255) as u8;
            }
        }
    }
}

fn threshold_black_white(buffer: &mut RasterBuffer) {
    for pixel in buffer.pixels_mut() {
        let bw = if luma(&pixel.0) > BW_THRESHOLD { 255 } else { 0 };
        pixel.0[..3].fill(bw);
    }
}

fn grayscale(buffer: &mut RasterBuffer) {
    for pixel in buffer.pixels_mut() {
        let gray = to_channel(luma(&pixel.0));
        pixel.0[..3].fill(gray);
    }
}

fn whiten(buffer: &mut RasterBuffer) {
    map_colour(buffer, |v| (i32::from(v) + WHITENING_LIFT).min(255) as u8);
}

fn vintage(buffer: &mut RasterBuffer) {
    for pixel in buffer.pixels_mut() {
        let [r, g, b, _] = pixel.0.map(f64::from);
        pixel.0[0] = to_channel(r * 0.9 + g * 0.5 + b * 0.1);
        pixel.0[1] = to_channel(r * 0.3 + g * 0.8 + b * 0.1);
        pixel.0[2] = to_channel(r * 0.2 + g * 0.3 + b * 0.5);
    }
}

// -- Tests --------------------------------------------------------------------
