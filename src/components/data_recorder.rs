//! On-device dataset recording: raw frame dumps and COLMAP-format capture.

use byteorder::{LittleEndian as LE, WriteBytesExt};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::Result;
use crate::protocol::CommandId;
use crate::session::Session;
use crate::types::{RecorderKind, RecorderOptionValue, RecorderOptions};

/// Non-owning handle onto a [`Session`]'s on-device recorders. Each
/// [`RecorderKind`] is tracked independently — recording raw data does not
/// preclude recording a COLMAP dataset at the same time.
pub struct DataRecorder<'a> {
    session: &'a Session,
    active: &'a RecorderActivity,
}

/// Per-kind recording flags, owned alongside the Session so repeated
/// `DataRecorder::new` calls share the same state.
pub(crate) struct RecorderActivity {
    raw: AtomicBool,
    colmap: AtomicBool,
    options: Mutex<HashMap<RecorderKind, RecorderOptions>>,
}

impl RecorderActivity {
    pub(crate) fn new() -> Self {
        RecorderActivity {
            raw: AtomicBool::new(false),
            colmap: AtomicBool::new(false),
            options: Mutex::new(HashMap::new()),
        }
    }

    fn flag(&self, kind: RecorderKind) -> &AtomicBool {
        match kind {
            RecorderKind::RawDataset => &self.raw,
            RecorderKind::ColmapDataset => &self.colmap,
        }
    }
}

impl<'a> DataRecorder<'a> {
    pub fn new(session: &'a Session, active: &'a RecorderActivity) -> DataRecorder<'a> {
        DataRecorder { session, active }
    }

    /// For `ColmapDataset`, requires `Controller::enable_map_data_syncing(true)`
    /// to have been called first.
    pub fn start_recording(&self, kind: RecorderKind, folder_path: &str) -> Result<()> {
        if kind == RecorderKind::ColmapDataset && !self.session.is_map_data_syncing() {
            return Err(crate::error::Error::InvalidArgument(-2));
        }
        let options = self.active.options.lock().get(&kind).cloned().unwrap_or_default();
        let payload = encode_start_recording(kind, folder_path, &options);
        self.session
            .with_transport(|t| t.request(CommandId::StartRecording, &payload, None))?;
        self.active.flag(kind).store(true, Ordering::Release);
        Ok(())
    }

    pub fn stop_recording(&self, kind: RecorderKind) -> Result<()> {
        let payload = vec![recorder_kind_tag(kind)];
        self.session
            .with_transport(|t| t.request(CommandId::StopRecording, &payload, None))?;
        self.active.flag(kind).store(false, Ordering::Release);
        Ok(())
    }

    pub fn is_recording(&self, kind: RecorderKind) -> bool {
        self.active.flag(kind).load(Ordering::Acquire)
    }

    pub fn set_option_string(&self, kind: RecorderKind, key: &str, value: &str) {
        self.set_option(kind, key, RecorderOptionValue::String(value.to_string()));
    }

    pub fn set_option_int(&self, kind: RecorderKind, key: &str, value: i64) {
        self.set_option(kind, key, RecorderOptionValue::Int(value));
    }

    pub fn set_option_float(&self, kind: RecorderKind, key: &str, value: f64) {
        self.set_option(kind, key, RecorderOptionValue::Float(value));
    }

    pub fn set_option_bool(&self, kind: RecorderKind, key: &str, value: bool) {
        self.set_option(kind, key, RecorderOptionValue::Bool(value));
    }

    fn set_option(&self, kind: RecorderKind, key: &str, value: RecorderOptionValue) {
        self.active
            .options
            .lock()
            .entry(kind)
            .or_default()
            .set(key, value);
    }

    pub fn reset_options(&self, kind: RecorderKind) {
        if let Some(options) = self.active.options.lock().get_mut(&kind) {
            options.reset();
        }
    }

    /// `use_cached=true` reads the last value observed from a push/response
    /// without round-tripping the device; `false` always queries fresh.
    pub fn query_status_int(&self, kind: RecorderKind, key: &str, use_cached: bool) -> Result<i64> {
        let resp = self.query_status(kind, key, use_cached)?;
        let mut r = Cursor::new(&resp);
        Ok(byteorder::ReadBytesExt::read_i64::<LE>(&mut r)?)
    }

    pub fn query_status_float(&self, kind: RecorderKind, key: &str, use_cached: bool) -> Result<f64> {
        let resp = self.query_status(kind, key, use_cached)?;
        let mut r = Cursor::new(&resp);
        Ok(byteorder::ReadBytesExt::read_f64::<LE>(&mut r)?)
    }

    fn query_status(&self, kind: RecorderKind, key: &str, use_cached: bool) -> Result<Vec<u8>> {
        let mut payload = Vec::with_capacity(6 + key.len());
        payload.push(recorder_kind_tag(kind));
        payload.push(use_cached as u8);
        payload.write_u32::<LE>(key.len() as u32)?;
        payload.extend_from_slice(key.as_bytes());
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::QueryRecorderStatus, &payload, None))?;
        Ok(resp.payload)
    }
}

fn recorder_kind_tag(kind: RecorderKind) -> u8 {
    match kind {
        RecorderKind::RawDataset => 0,
        RecorderKind::ColmapDataset => 1,
    }
}

fn encode_start_recording(kind: RecorderKind, folder_path: &str, options: &RecorderOptions) -> Vec<u8> {
    let mut payload = Vec::with_capacity(16 + folder_path.len());
    payload.push(recorder_kind_tag(kind));
    payload
        .write_u32::<LE>(folder_path.len() as u32)
        .expect("writing to Vec never fails");
    payload.extend_from_slice(folder_path.as_bytes());
    options.encode_into(&mut payload).expect("writing to Vec never fails");
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colmap_recording_requires_map_data_syncing() {
        let session = Session::new();
        let active = RecorderActivity::new();
        let recorder = DataRecorder::new(&session, &active);
        assert!(recorder.start_recording(RecorderKind::ColmapDataset, "/tmp/x").is_err());
    }

    #[test]
    fn recording_kinds_track_independently() {
        let active = RecorderActivity::new();
        assert!(!active.flag(RecorderKind::RawDataset).load(Ordering::Acquire));
        active.flag(RecorderKind::RawDataset).store(true, Ordering::Release);
        assert!(!active.flag(RecorderKind::ColmapDataset).load(Ordering::Acquire));
    }
}
