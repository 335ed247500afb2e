// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glanz Session — the interactive side of the enhancement editor. An
// `EditSession` holds one queued photo while the user tweaks rotation, scale
// and filter, keeps a live preview current, and on commit swaps the rendered
// JPEG into the upload queue.

pub mod queue;
pub mod session;

pub use queue::{FileQueueEntry, UploadQueue};
pub use session::{EditSession, PreviewSlot};
