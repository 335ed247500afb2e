// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::{GlanzError, Result};

/// Settings for the enhancement pipeline, supplied by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// JPEG quality (1-100) for committed and preview output.
    pub jpeg_quality: u8,
    /// Longest preview edge in pixels.
    pub preview_max_dimension: u32,
    /// Largest source the editor will open, in bytes.
    pub max_source_bytes: u64,
    /// RGBA fill for canvas pixels with no source content after rotation.
    ///
    /// Defaults to transparent white rather than transparent black, so
    /// rotated corners come out as paper white once JPEG drops alpha. These
    /// pixels take part in auto contrast, so white corners raise the luma
    /// maximum instead of pinning the minimum at 0.
    pub background: [u8; 4],
    /// Largest RGBA canvas (`width * height * 4`) a render may allocate.
    pub max_canvas_bytes: u64,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            preview_max_dimension: 400,
            max_source_bytes: 10 * 1024 * 1024,
            background: [255, 255, 255, 0],
            max_canvas_bytes: 512 * 1024 * 1024,
        }
    }
}

impl EnhanceConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(GlanzError::InvalidParameter(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.preview_max_dimension == 0 {
            return Err(GlanzError::InvalidParameter(
                "preview_max_dimension must be at least 1".into(),
            ));
        }
        if self.max_canvas_bytes < 4 {
            return Err(GlanzError::InvalidParameter(format!(
                "max_canvas_bytes must hold at least one pixel, got {}",
                self.max_canvas_bytes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EnhanceConfig::from_json(r#"{ "preview_max_dimension": 256 }"#).unwrap();
        assert_eq!(config.preview_max_dimension, 256);
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.max_source_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_canvas_bytes, 512 * 1024 * 1024);
    }

    #[test]
    fn canvas_limit_below_one_pixel_is_rejected() {
        let err = EnhanceConfig::from_json(r#"{ "max_canvas_bytes": 3 }"#).unwrap_err();
        assert!(matches!(err, GlanzError::InvalidParameter(_)));
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let err = EnhanceConfig::from_json(r#"{ "jpeg_quality": 0 }"#).unwrap_err();
        assert!(matches!(err, GlanzError::InvalidParameter(_)));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = EnhanceConfig::from_json("{ jpeg_quality: ").unwrap_err();
        assert!(matches!(err, GlanzError::Serialization(_)));
    }
}
