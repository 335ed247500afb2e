// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edit session — the state machine behind the "Enhance" dialog.
//
//   Closed → Opening → Editing → Rendering → Applied
//                 ↘ Failed     ↘ Cancelled
//
// Decoding, previews and the final render run on the blocking pool of the
// runtime that opened the session, so parameter changes may come from any
// thread. Each parameter change starts a new preview tagged with a generation
// number; only the latest generation may publish, so a slow preview that
// finishes after a newer request is discarded.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use glanz_core::error::{GlanzError, Result};
use glanz_core::{
    EnhanceConfig, FilterKind, SessionId, SessionState, SourceImage, TransformParams,
};
use glanz_imaging::{Compositor, Preview, PreviewRenderer, RasterBuffer, decode};

use crate::queue::UploadQueue;

/// The latest preview as seen by UI subscribers.
#[derive(Debug, Clone, Default)]
pub struct PreviewSlot {
    /// Generation of the most recent preview request.
    pub requested: u64,
    /// Generation that produced `preview` / `error`.
    pub completed: u64,
    pub preview: Option<Arc<Preview>>,
    /// Failure message of the latest completed request, if it failed.
    pub error: Option<String>,
}

/// Transient editing state for one queued image.
pub struct EditSession {
    id: SessionId,
    source: Arc<SourceImage>,
    target_index: usize,
    max_source_bytes: u64,
    compositor: Compositor,
    renderer: PreviewRenderer,
    state: SessionState,
    params: TransformParams,
    /// Decoded source, shared read-only with in-flight passes.
    decoded: Option<Arc<RasterBuffer>>,
    slot: Arc<watch::Sender<PreviewSlot>>,
    pending: Option<JoinHandle<()>>,
    generation: u64,
    last_error: Option<String>,
    /// Runtime captured by `open`; blocking work is spawned through it.
    runtime: Option<Handle>,
}

impl EditSession {
    // -- Construction ---------------------------------------------------------

    /// Create a closed session for the file at `target_index`.
    pub fn new(source: SourceImage, target_index: usize, config: &EnhanceConfig) -> Self {
        let (slot, _) = watch::channel(PreviewSlot::default());
        Self {
            id: SessionId::new(),
            source: Arc::new(source),
            target_index,
            max_source_bytes: config.max_source_bytes,
            compositor: Compositor::new(config),
            renderer: PreviewRenderer::new(config),
            state: SessionState::Closed,
            params: TransformParams::default(),
            decoded: None,
            slot: Arc::new(slot),
            pending: None,
            generation: 0,
            last_error: None,
            runtime: None,
        }
    }

    /// Create a closed session for whatever `queue` holds at `index`.
    pub fn from_queue<Q: UploadQueue + ?Sized>(
        queue: &Q,
        index: usize,
        config: &EnhanceConfig,
    ) -> Result<Self> {
        let source = queue
            .source_at(index)
            .ok_or_else(|| GlanzError::QueueEntry(format!("no queued file at index {index}")))?;
        Ok(Self::new(source, index, config))
    }

    // -- Accessors ------------------------------------------------------------

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn params(&self) -> TransformParams {
        self.params
    }

    pub fn target_index(&self) -> usize {
        self.target_index
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    /// Message of the most recent failure, cleared by the next successful
    /// commit or open.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The most recently published preview.
    pub fn preview(&self) -> Option<Arc<Preview>> {
        self.slot.borrow().preview.clone()
    }

    /// Watch preview updates, e.g. to redraw the dialog.
    pub fn subscribe_previews(&self) -> watch::Receiver<PreviewSlot> {
        self.slot.subscribe()
    }

    // -- Lifecycle ------------------------------------------------------------

    /// Decode the source and enter `Editing` with default parameters.
    ///
    /// Non-raster, oversized or undecodable sources move the session to
    /// `Failed`; the queued file stays uploadable as it is.
    #[instrument(skip(self), fields(session_id = %self.id, filename = self.source.filename()))]
    pub async fn open(&mut self) -> Result<()> {
        self.expect_state(SessionState::Closed, "open")?;
        self.state = SessionState::Opening;
        debug!(data_len = self.source.len(), "opening source");

        match self.decode_source().await {
            Ok(buffer) => {
                info!(
                    width = buffer.width(),
                    height = buffer.height(),
                    "session editing"
                );
                self.decoded = Some(Arc::new(buffer));
                self.params = TransformParams::default();
                self.last_error = None;
                self.state = SessionState::Editing;
                self.request_preview();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "source cannot be edited");
                self.state = SessionState::Failed;
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn decode_source(&mut self) -> Result<RasterBuffer> {
        let runtime = Handle::try_current()
            .map_err(|err| GlanzError::Decode(format!("no async runtime to decode on: {err}")))?;
        self.runtime = Some(runtime.clone());

        let len = self.source.len() as u64;
        if len > self.max_source_bytes {
            return Err(GlanzError::InvalidParameter(format!(
                "source is {len} bytes, the limit is {} bytes",
                self.max_source_bytes
            )));
        }
        let source = Arc::clone(&self.source);
        runtime
            .spawn_blocking(move || decode(source.bytes(), source.mime()))
            .await
            .map_err(|err| GlanzError::Decode(format!("decode task failed: {err}")))?
    }

    /// Apply new parameters and start a preview for them.
    ///
    /// Invalid parameters are rejected and leave the session as it was. Any
    /// preview still running for older parameters is superseded.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn on_parameter_changed(&mut self, params: TransformParams) -> Result<()> {
        self.expect_state(SessionState::Editing, "parameter change")?;
        params.validate()?;
        self.params = params;
        self.request_preview();
        Ok(())
    }

    pub fn set_filter(&mut self, filter: FilterKind) -> Result<()> {
        self.on_parameter_changed(self.params.with_filter(filter))
    }

    pub fn set_rotation(&mut self, rotation_degrees: f64) -> Result<()> {
        self.on_parameter_changed(self.params.with_rotation(rotation_degrees))
    }

    pub fn set_scale(&mut self, scale_factor: f64) -> Result<()> {
        self.on_parameter_changed(self.params.with_scale(scale_factor))
    }

    /// Rotate by a further `delta` degrees (the ±90° buttons).
    pub fn rotate_by(&mut self, delta: f64) -> Result<()> {
        self.on_parameter_changed(self.params.rotated_by(delta))
    }

    /// Wait for the latest preview request to finish and return the current
    /// preview. A failed preview is reported as a `Render` error and recorded
    /// in `last_error`; the session stays in `Editing`.
    pub async fn preview_settled(&mut self) -> Result<Option<Arc<Preview>>> {
        if let Some(handle) = self.pending.take() {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    let msg = format!("preview task failed: {err}");
                    self.last_error = Some(msg.clone());
                    return Err(GlanzError::Render(msg));
                }
            }
        }

        let (preview, error) = {
            let slot = self.slot.borrow();
            let error = (slot.completed == self.generation)
                .then(|| slot.error.clone())
                .flatten();
            (slot.preview.clone(), error)
        };
        match error {
            Some(msg) => {
                self.last_error = Some(msg.clone());
                Err(GlanzError::Render(msg))
            }
            None => Ok(preview),
        }
    }

    /// Render at full resolution and replace the queued file.
    ///
    /// Only allowed from `Editing`. On failure the session returns to
    /// `Editing` with `last_error` set and the queue is left untouched, so
    /// the user can adjust and try again.
    #[instrument(skip(self, queue), fields(session_id = %self.id, index = self.target_index))]
    pub async fn commit<Q: UploadQueue + ?Sized>(&mut self, queue: &mut Q) -> Result<()> {
        self.expect_state(SessionState::Editing, "commit")?;
        let (Some(decoded), Some(runtime)) = (self.decoded.clone(), self.runtime.clone()) else {
            return Err(GlanzError::Render("session has no decoded source".into()));
        };

        self.state = SessionState::Rendering;
        self.supersede_previews();
        info!(params = ?self.params, "rendering for commit");

        let compositor = self.compositor.clone();
        let params = self.params;
        let filename = self.source.filename().to_string();
        let rendered = runtime
            .spawn_blocking(move || compositor.render_decoded(&decoded, &params, &filename))
            .await
            .map_err(|err| GlanzError::Render(format!("render task failed: {err}")))
            .and_then(|result| result);

        let target_index = self.target_index;
        let outcome = rendered.and_then(|image| queue.replace(target_index, image));
        match outcome {
            Ok(()) => {
                info!("edit applied to upload queue");
                self.state = SessionState::Applied;
                self.last_error = None;
                self.release();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "commit failed; back to editing");
                self.state = SessionState::Editing;
                self.last_error = Some(err.to_string());
                self.request_preview();
                Err(err)
            }
        }
    }

    /// Close without committing. The queued file is left as it was.
    ///
    /// A session left in `Rendering` by a commit future that was dropped
    /// before finishing can still be cancelled; that commit never reaches the
    /// queue.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn cancel(&mut self) -> Result<()> {
        match self.state {
            SessionState::Closed
            | SessionState::Opening
            | SessionState::Editing
            | SessionState::Rendering => {
                self.state = SessionState::Cancelled;
                self.release();
                info!("session cancelled");
                Ok(())
            }
            state => Err(GlanzError::InvalidState {
                operation: "cancel",
                state,
            }),
        }
    }

    // -- Internals ------------------------------------------------------------

    fn expect_state(&self, expected: SessionState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(GlanzError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Bump the generation so every in-flight preview becomes stale.
    fn supersede_previews(&mut self) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        self.slot.send_modify(|slot| slot.requested = generation);
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        generation
    }

    /// Start a preview for the current parameters.
    fn request_preview(&mut self) {
        let generation = self.supersede_previews();
        let (Some(decoded), Some(runtime)) = (self.decoded.clone(), self.runtime.as_ref()) else {
            return;
        };
        let renderer = self.renderer.clone();
        let params = self.params;
        let slot = Arc::clone(&self.slot);
        debug!(generation, filter = %params.filter, "preview requested");

        self.pending = Some(runtime.spawn_blocking(move || {
            let superseded = || slot.borrow().requested != generation;
            if superseded() {
                return;
            }
            let outcome = renderer.render_until(&decoded, &params, superseded);
            if !publish(&slot, generation, outcome) {
                debug!(generation, "stale preview discarded");
            }
        }));
    }

    /// Drop the decoded source and preview; nothing is rendered after this.
    fn release(&mut self) {
        self.supersede_previews();
        self.decoded = None;
        self.slot.send_modify(|slot| {
            slot.preview = None;
            slot.error = None;
        });
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

/// Store the outcome of preview `generation` unless a newer request exists.
/// Returns whether anything was published.
fn publish(
    slot: &watch::Sender<PreviewSlot>,
    generation: u64,
    outcome: Result<Option<Preview>>,
) -> bool {
    slot.send_if_modified(|current| {
        if current.requested != generation {
            return false;
        }
        match outcome {
            Ok(Some(preview)) => {
                current.preview = Some(Arc::new(preview));
                current.error = None;
            }
            Ok(None) => return false,
            Err(err) => current.error = Some(err.to_string()),
        }
        current.completed = generation;
        true
    })
}

// -- Tests --------------------------------------------------------------------
