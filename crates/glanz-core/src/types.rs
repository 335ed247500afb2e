// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Glanz enhancement pipeline.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{GlanzError, Result};

/// Rotation slider range offered by the editor UI, in degrees.
pub const ROTATION_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// Scale slider range offered by the editor UI.
pub const SCALE_RANGE: RangeInclusive<f64> = 0.1..=3.0;

/// Quick scale buttons offered next to the scale slider.
pub const SCALE_PRESETS: [f64; 3] = [0.5, 1.0, 1.5];

/// Unique identifier for an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Created, source not decoded yet.
    Closed,
    /// Decoding the source image.
    Opening,
    /// Accepting parameter changes; previews are live.
    Editing,
    /// Full-resolution render in progress after a commit.
    Rendering,
    /// Committed; the queue entry was replaced.
    Applied,
    /// Closed without committing.
    Cancelled,
    /// The source could not be opened for editing.
    Failed,
}

impl SessionState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Applied | Self::Cancelled | Self::Failed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Editing => "editing",
            Self::Rendering => "rendering",
            Self::Applied => "applied",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Media types accepted by the upload intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Jpeg,
    Png,
    Pdf,
}

impl MediaType {
    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    /// Parse a declared MIME type. `image/jpg` is accepted as an alias some
    /// browsers report for JPEG files.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Whether pixel enhancement can be applied to this media type.
    pub fn is_raster(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }
}

/// Enhancement filters offered by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// No pixel filter; geometry still applies.
    #[default]
    Original,
    /// Auto contrast, brightness/contrast boost and sharpening.
    Auto,
    /// High contrast black and white.
    BlackWhite,
    /// Grayscale with enhanced contrast.
    Grayscale,
    /// Paper whitening.
    Whitening,
    /// Stronger sharpening.
    Sharpen,
    /// Warm vintage tone.
    Vintage,
}

impl FilterKind {
    /// Every filter, in the order the editor lists them.
    pub const ALL: [FilterKind; 7] = [
        Self::Original,
        Self::Auto,
        Self::BlackWhite,
        Self::Grayscale,
        Self::Whitening,
        Self::Sharpen,
        Self::Vintage,
    ];

    /// Wire tag, e.g. `"blackwhite"`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Auto => "auto",
            Self::BlackWhite => "blackwhite",
            Self::Grayscale => "grayscale",
            Self::Whitening => "whitening",
            Self::Sharpen => "sharpen",
            Self::Vintage => "vintage",
        }
    }

    /// Short button label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Original => "Original",
            Self::Auto => "Auto",
            Self::BlackWhite => "B&W",
            Self::Grayscale => "Gray",
            Self::Whitening => "White",
            Self::Sharpen => "Sharp",
            Self::Vintage => "Vintage",
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FilterKind {
    type Err = GlanzError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| GlanzError::InvalidParameter(format!("unknown filter: {s}")))
    }
}

/// Geometry and filter settings for one edit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformParams {
    /// Clockwise rotation in degrees. Any finite value is valid.
    pub rotation_degrees: f64,
    /// Uniform scale factor; must be finite and positive.
    pub scale_factor: f64,
    /// Pixel filter applied after the geometry.
    pub filter: FilterKind,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            rotation_degrees: 0.0,
            scale_factor: 1.0,
            filter: FilterKind::Original,
        }
    }
}

impl TransformParams {
    pub fn with_rotation(self, rotation_degrees: f64) -> Self {
        Self {
            rotation_degrees,
            ..self
        }
    }

    pub fn with_scale(self, scale_factor: f64) -> Self {
        Self {
            scale_factor,
            ..self
        }
    }

    pub fn with_filter(self, filter: FilterKind) -> Self {
        Self { filter, ..self }
    }

    /// Add `delta` degrees to the current rotation (the ±90° buttons).
    /// The result is not wrapped back into the slider range.
    pub fn rotated_by(self, delta: f64) -> Self {
        self.with_rotation(self.rotation_degrees + delta)
    }

    /// Clamp rotation and scale to the ranges the editor sliders allow.
    pub fn ui_clamped(self) -> Self {
        Self {
            rotation_degrees: self
                .rotation_degrees
                .clamp(*ROTATION_RANGE.start(), *ROTATION_RANGE.end()),
            scale_factor: self
                .scale_factor
                .clamp(*SCALE_RANGE.start(), *SCALE_RANGE.end()),
            filter: self.filter,
        }
    }

    /// Reject values no component can act on.
    pub fn validate(&self) -> Result<()> {
        if !self.rotation_degrees.is_finite() {
            return Err(GlanzError::InvalidParameter(format!(
                "rotation must be finite, got {}",
                self.rotation_degrees
            )));
        }
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(GlanzError::InvalidParameter(format!(
                "scale must be a positive number, got {}",
                self.scale_factor
            )));
        }
        Ok(())
    }

    /// Rotation folded into `[0, 360)`.
    pub fn normalized_rotation(&self) -> f64 {
        self.rotation_degrees.rem_euclid(360.0)
    }

    /// Whether the geometry step leaves the canvas untouched.
    pub fn is_identity_geometry(&self) -> bool {
        self.scale_factor == 1.0 && self.normalized_rotation() == 0.0
    }
}

/// A raw image offered to the editor by the upload intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    bytes: Vec<u8>,
    mime: String,
    filename: String,
}

impl SourceImage {
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        mime: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
            filename: filename.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The MIME type declared by the intake, verbatim.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The declared MIME type, if it is one the intake accepts.
    pub fn media_type(&self) -> Option<MediaType> {
        MediaType::from_mime(&self.mime)
    }
}

/// An encoded image produced by the pipeline, ready to replace a queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
    /// Carried over from the source so the upload keeps its name.
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn mime_type(&self) -> &'static str {
        self.media_type.mime_type()
    }
}
