// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the enhancement editor.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the editor presents it.

use crate::error::GlanzError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user can fix it by changing something and trying again.
    ActionRequired,
    /// This file cannot be enhanced; it can still be uploaded as-is.
    Permanent,
    /// Something went wrong inside the editor; trying again may work.
    Transient,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether pressing Apply again can succeed without other changes.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `GlanzError` into a `HumanError` for the editor UI.
pub fn humanize_error(err: &GlanzError) -> HumanError {
    match err {
        GlanzError::UnsupportedMedia(detail) => HumanError {
            message: "This file can't be enhanced.".into(),
            suggestion: format!(
                "Only JPEG and PNG photos can be enhanced. PDFs are uploaded as they are. (File type: {detail})"
            ),
            retriable: false,
            severity: Severity::Permanent,
        },

        GlanzError::Decode(_) => HumanError {
            message: "We couldn't read this image.".into(),
            suggestion: "The file may be damaged or only partly downloaded. Try choosing it again, or take a new photo.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        GlanzError::InvalidParameter(detail) => {
            if detail.starts_with("source is") {
                HumanError {
                    message: "This file is too large.".into(),
                    suggestion: "Only JPEG, PNG, and PDF files under 10MB are allowed.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "That setting can't be used.".into(),
                    suggestion: format!("Move the slider back into range and try again. ({detail})"),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            }
        }

        GlanzError::Render(_) => HumanError {
            message: "We couldn't apply your changes.".into(),
            suggestion: "Your original photo is unchanged. Try again, or pick a smaller scale.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        GlanzError::InvalidState { .. } => HumanError {
            message: "The editor is busy or already closed.".into(),
            suggestion: "Close the editor and open the photo again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        GlanzError::QueueEntry(_) => HumanError {
            message: "This photo is no longer in your upload list.".into(),
            suggestion: "Add the photo again, then enhance it.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        GlanzError::Serialization(_) => HumanError {
            message: "The editor settings could not be loaded.".into(),
            suggestion: "Restart the app. Default settings will be used.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionState;

    #[test]
    fn pdf_is_permanent() {
        let human = humanize_error(&GlanzError::UnsupportedMedia("application/pdf".into()));
        assert_eq!(human.severity, Severity::Permanent);
        assert!(human.suggestion.contains("application/pdf"));
    }

    #[test]
    fn render_failure_is_retriable() {
        let human = humanize_error(&GlanzError::Render("JPEG encoding failed".into()));
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn oversized_source_mentions_cap() {
        let err = GlanzError::InvalidParameter("source is 12000000 bytes".into());
        let human = humanize_error(&err);
        assert!(human.suggestion.contains("10MB"));
    }

    #[test]
    fn oversized_canvas_points_at_the_slider() {
        let err = GlanzError::InvalidParameter(
            "scaled canvas 33000x33000 needs 4356000000 bytes, the limit is 536870912 bytes".into(),
        );
        let human = humanize_error(&err);
        assert_eq!(human.message, "That setting can't be used.");
    }

    #[test]
    fn invalid_state_is_not_retriable() {
        let err = GlanzError::InvalidState {
            operation: "commit",
            state: SessionState::Applied,
        };
        assert!(!humanize_error(&err).retriable);
    }
}
