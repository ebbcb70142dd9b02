//! The viewer bridge: request lifecycle from the UI's perspective.
//!
//! Owns the 3D viewer behind a narrow trait and applies build/load results
//! to it. Two UI-facing policies live here: the previous render is kept
//! (never blanked) when a build fails, and responses to superseded requests
//! are discarded. Correctness rides on correlation ids, not arrival order,
//! so the bridge tracks the latest submitted id and ignores the rest.

use std::path::Path;

use crate::client::{PendingReply, WorkerClient, WorkerError};
use crate::geometry::{rebuild_geometry, Geometry};
use crate::messages::WorkerResponse;
use step_io::sanitize_step_filename;

/// The 3D viewer the bridge drives. Implementations own GPU resources and
/// dispose the previous geometry when a new one is set.
pub trait Viewer {
    fn set_geometry(&mut self, geometry: Geometry);
    fn fit_view(&mut self);
    fn reset(&mut self);
}

/// Connects a worker client to a viewer.
pub struct ViewerBridge<V: Viewer> {
    client: WorkerClient,
    viewer: V,
    pending: Vec<PendingReply>,
    /// Most recent build/load request id; responses to older ids are stale.
    latest: Option<u64>,
    last_error: Option<String>,
}

impl<V: Viewer> ViewerBridge<V> {
    pub fn new(client: WorkerClient, viewer: V) -> Self {
        Self {
            client,
            viewer,
            pending: Vec::new(),
            latest: None,
            last_error: None,
        }
    }

    /// Queue a rebuild from model source. Supersedes earlier pending
    /// builds/imports.
    pub fn submit_rebuild(&mut self, source: &str) -> u64 {
        let reply = self.client.submit_build(source);
        let id = reply.id();
        self.latest = Some(id);
        self.pending.push(reply);
        id
    }

    /// Queue a STEP import from fetched bytes. Same reconstruction path as
    /// a build result.
    pub fn submit_import(&mut self, filename: Option<&str>, data: Vec<u8>) -> u64 {
        let reply = self.client.submit_load_step(filename, data);
        let id = reply.id();
        self.latest = Some(id);
        self.pending.push(reply);
        id
    }

    /// Drain completed replies without blocking. Returns how many were
    /// consumed (applied or discarded as stale).
    pub fn pump(&mut self) -> usize {
        let mut consumed = 0;
        let mut remaining = Vec::with_capacity(self.pending.len());
        let drained: Vec<_> = self.pending.drain(..).collect();
        for reply in drained {
            let id = reply.id();
            match reply.poll() {
                None => remaining.push(reply),
                Some(Ok(response)) => {
                    consumed += 1;
                    self.apply(id, response);
                }
                Some(Err(e)) => {
                    consumed += 1;
                    self.last_error = Some(e.to_string());
                }
            }
        }
        self.pending = remaining;
        consumed
    }

    /// Block until the latest submitted build/import resolves; stale
    /// replies that completed meanwhile are drained along the way. Returns
    /// true if new geometry was applied.
    pub fn sync(&mut self) -> bool {
        let Some(latest) = self.latest else {
            return false;
        };
        let Some(index) = self.pending.iter().position(|p| p.id() == latest) else {
            return false;
        };
        let reply = self.pending.remove(index);
        let applied = match reply.wait() {
            Ok(response) => self.apply(latest, response),
            Err(e) => {
                self.last_error = Some(e.to_string());
                false
            }
        };
        self.pump();
        applied
    }

    /// Build model source and apply the result. Returns true on success;
    /// on failure the previous render stays and `last_error` is set.
    pub fn rebuild(&mut self, source: &str) -> bool {
        self.submit_rebuild(source);
        self.sync()
    }

    /// Import fetched STEP bytes and apply the result.
    pub fn import_step(&mut self, filename: Option<&str>, data: Vec<u8>) -> bool {
        self.submit_import(filename, data);
        self.sync()
    }

    /// Convenience fetch-and-import for a local STEP path.
    pub fn import_step_path(&mut self, path: &Path) -> bool {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                self.last_error = Some(format!("failed to read {}: {e}", path.display()));
                return false;
            }
        };
        let filename = path.file_name().and_then(|n| n.to_str()).map(str::to_string);
        self.import_step(filename.as_deref(), data)
    }

    /// Export the last built/loaded solid to STEP and hand the bytes to a
    /// save sink. The filename passed to the sink is sanitized but keeps a
    /// valid STEP extension; collision policy belongs to the sink.
    pub fn export_step<F>(&mut self, filename: Option<&str>, sink: F) -> Result<String, WorkerError>
    where
        F: FnOnce(&str, &[u8]) -> std::io::Result<()>,
    {
        let exported = self.client.export_step(filename, None)?;
        let safe_name = sanitize_step_filename(&exported.filename);
        sink(&safe_name, &exported.data).map_err(|e| WorkerError::Save(e.to_string()))?;
        Ok(safe_name)
    }

    /// The last error message, verbatim from the worker, for the status
    /// indicator. Cleared by the next successful build.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut V {
        &mut self.viewer
    }

    pub fn client(&self) -> &WorkerClient {
        &self.client
    }

    /// Apply one resolved response. Stale ids are discarded outright.
    fn apply(&mut self, id: u64, response: WorkerResponse) -> bool {
        if self.latest != Some(id) {
            tracing::debug!(id, "discarding superseded response");
            return false;
        }
        match response {
            WorkerResponse::BuildResult { buffers, .. } => {
                let geometry = rebuild_geometry(buffers);
                self.viewer.set_geometry(geometry);
                self.viewer.fit_view();
                self.last_error = None;
                true
            }
            WorkerResponse::Error { message, .. } => {
                // Keep the previous render visible; only record the message.
                self.last_error = Some(message);
                false
            }
            other => {
                self.last_error =
                    Some(format!("unexpected response type `{}`", other.type_name()));
                false
            }
        }
    }
}
