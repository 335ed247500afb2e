// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Glanz.

use thiserror::Error;

use crate::types::SessionState;

/// Top-level error type for all Glanz operations.
#[derive(Debug, Error)]
pub enum GlanzError {
    // -- Input errors --
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("image decoding failed: {0}")]
    Decode(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    // -- Pipeline errors --
    #[error("rendering failed: {0}")]
    Render(String),

    // -- Session errors --
    #[error("{operation} is not allowed while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("upload queue entry unavailable: {0}")]
    QueueEntry(String),

    // -- Configuration --
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GlanzError {
    /// Collapse any pipeline failure into a `Render` error, keeping the
    /// message of the underlying cause.
    pub fn into_render(self) -> Self {
        match self {
            Self::Render(_) => self,
            other => Self::Render(other.to_string()),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GlanzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_render_wraps_other_kinds() {
        let err = GlanzError::Decode("truncated JPEG".into()).into_render();
        match err {
            GlanzError::Render(msg) => assert!(msg.contains("truncated JPEG")),
            other => panic!("expected Render, got {other:?}"),
        }
    }

    #[test]
    fn into_render_keeps_render() {
        let err = GlanzError::Render("encoder gave up".into()).into_render();
        assert_eq!(err.to_string(), "rendering failed: encoder gave up");
    }

    #[test]
    fn invalid_state_names_operation_and_state() {
        let err = GlanzError::InvalidState {
            operation: "commit",
            state: SessionState::Failed,
        };
        assert_eq!(
            err.to_string(),
            "commit is not allowed while the session is failed"
        );
    }
}
