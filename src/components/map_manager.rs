//! Asynchronous map upload/download sessions.
//!
//! Completion callbacks fire exactly once, from the transport's background
//! reader thread when a `MapStorageUpdate` push frame carries a terminal
//! status — the component itself never spawns a thread.

use std::time::{Duration, Instant};

use byteorder::{LittleEndian as LE, WriteBytesExt};

use crate::error::{Error, Result};
use crate::protocol::CommandId;
use crate::session::Session;
use crate::types::{MapStorageKind, MapStorageStatus};

/// Polling cadence for [`MapManager::wait_for_completion`].
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Non-owning handle onto a [`Session`]'s single active map-storage session.
pub struct MapManager<'a> {
    session: &'a Session,
}

impl<'a> MapManager<'a> {
    pub fn new(session: &'a Session) -> MapManager<'a> {
        MapManager { session }
    }

    /// Asynchronous; returns `true` once the device has accepted the start
    /// request. `on_complete` fires exactly once with the final outcome.
    pub fn start_download_session(
        &self,
        path: impl Into<String>,
        on_complete: impl FnOnce(bool) + Send + 'static,
    ) -> Result<bool> {
        self.start_session(MapStorageKind::Download, CommandId::StartMapDownloadSession, path, on_complete)
    }

    pub fn start_upload_session(
        &self,
        path: impl Into<String>,
        on_complete: impl FnOnce(bool) + Send + 'static,
    ) -> Result<bool> {
        self.start_session(MapStorageKind::Upload, CommandId::StartMapUploadSession, path, on_complete)
    }

    fn start_session(
        &self,
        kind: MapStorageKind,
        cmd: CommandId,
        path: impl Into<String>,
        on_complete: impl FnOnce(bool) + Send + 'static,
    ) -> Result<bool> {
        let path = path.into();
        if !self
            .session
            .stream_state()
            .start_map_storage(kind, path.clone(), Box::new(on_complete))
        {
            return Err(Error::AlreadyInSession);
        }

        let mut payload = Vec::with_capacity(4 + path.len());
        payload.write_u32::<LE>(path.len() as u32)?;
        payload.extend_from_slice(path.as_bytes());

        match self.session.with_transport(|t| t.request(cmd, &payload, None)) {
            Ok(resp) => Ok(resp.payload.first().map(|b| *b != 0).unwrap_or(true)),
            Err(e) => {
                self.session.stream_state().abort_map_storage();
                Err(e)
            }
        }
    }

    pub fn is_session_active(&self) -> bool {
        self.session.stream_state().is_map_storage_active()
    }

    /// `(progress_0_100, status)` for the current or most recent session.
    pub fn query_session_status(&self) -> Result<(u8, MapStorageStatus)> {
        let snapshot = self
            .session
            .stream_state()
            .map_storage_snapshot()
            .ok_or(Error::NotReady)?;
        let progress = match snapshot.status {
            MapStorageStatus::Working(p) => p,
            MapStorageStatus::Finished => 100,
            _ => 0,
        };
        Ok((progress, snapshot.status))
    }

    /// Idempotent.
    pub fn abort_session(&self) -> Result<()> {
        if self.is_session_active() {
            self.session
                .with_transport(|t| t.request(CommandId::AbortMapStorageSession, &[], None))?;
        }
        self.session.stream_state().abort_map_storage();
        Ok(())
    }

    /// Polls at ~2 Hz until the session reaches a terminal state or
    /// `timeout_s` elapses. Once inactive, if the completion callback hasn't
    /// already set the result latch, the outcome is derived from the last
    /// observed status.
    pub fn wait_for_completion(
        &self,
        timeout_s: f64,
        mut progress_cb: impl FnMut(u8),
    ) -> Result<bool> {
        let deadline = Instant::now() + Duration::from_secs_f64(timeout_s);
        loop {
            if let Some(ok) = self.session.stream_state().take_map_storage_latch() {
                return Ok(ok);
            }
            if !self.is_session_active() {
                let ok = self
                    .session
                    .stream_state()
                    .map_storage_snapshot()
                    .map(|s| s.status.is_finished())
                    .unwrap_or(false);
                return Ok(ok);
            }
            if let Ok((progress, _)) = self.query_session_status() {
                progress_cb(progress);
            }
            if Instant::now() >= deadline {
                return Err(Error::TimeoutError(-5));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Blocking convenience wrapper: `start_download_session` + `wait_for_completion`.
    pub fn download_map(&self, path: impl Into<String>, timeout_s: f64) -> Result<bool> {
        self.start_download_session(path, |_| {})?;
        self.wait_for_completion(timeout_s, |_| {})
    }

    pub fn upload_map(&self, path: impl Into<String>, timeout_s: f64) -> Result<bool> {
        self.start_upload_session(path, |_| {})?;
        self.wait_for_completion(timeout_s, |_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_status_before_any_session_is_not_ready() {
        let session = Session::new();
        let manager = MapManager::new(&session);
        assert!(matches!(manager.query_session_status(), Err(Error::NotReady)));
    }

    #[test]
    fn abort_without_active_session_is_a_harmless_no_op() {
        let session = Session::new();
        let manager = MapManager::new(&session);
        assert!(manager.abort_session().is_ok());
    }
}
