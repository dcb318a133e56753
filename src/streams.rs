//! Session-owned caches fed by the transport's background reader thread.
//!
//! Every [`crate::components::DataProvider`] accessor is a non-blocking
//! snapshot read against one of these caches; nothing here blocks except the
//! bounded `recv_timeout` used by the explicit `wait_*_next_frame` calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};

use crate::protocol::StreamTag;
use crate::types::{
    ImuSample, LidarScan, MapStorageKind, MapStorageSession, MapStorageStatus, PoseSE3,
    StereoImagePair, TrackingFrame,
};

const IMU_BURST_CAP: usize = 4096;

/// One-shot completion callback for an async map-storage session. Boxed
/// because `start_download_session`/`start_upload_session` each take their
/// own closure, and the reader thread that eventually fires it doesn't know
/// the concrete type.
type MapStorageCallback = Box<dyn FnOnce(bool) + Send>;

/// Shared, thread-safe live-stream state for one Session.
pub struct StreamState {
    pub(crate) latest_pose: RwLock<Option<(PoseSE3, u64)>>,
    pub(crate) latest_tracking: RwLock<Option<TrackingFrame>>,
    pub(crate) latest_camera_preview: RwLock<Option<StereoImagePair>>,
    pub(crate) latest_lidar: RwLock<Option<LidarScan>>,
    imu_burst: Mutex<VecDeque<ImuSample>>,
    depth_ready_tx: Sender<u64>,
    depth_ready_rx: Receiver<u64>,
    seg_ready_tx: Sender<u64>,
    seg_ready_rx: Receiver<u64>,
    pub(crate) map_snapshot_generation: AtomicU64,
    raw_data_subscribed: AtomicBool,
    map_storage: Mutex<Option<MapStorageSession>>,
    map_storage_callback: Mutex<Option<MapStorageCallback>>,
    map_storage_latch: Mutex<Option<bool>>,
}

impl StreamState {
    pub fn new() -> Arc<StreamState> {
        let (depth_ready_tx, depth_ready_rx) = bounded(1);
        let (seg_ready_tx, seg_ready_rx) = bounded(1);
        Arc::new(StreamState {
            latest_pose: RwLock::new(None),
            latest_tracking: RwLock::new(None),
            latest_camera_preview: RwLock::new(None),
            latest_lidar: RwLock::new(None),
            imu_burst: Mutex::new(VecDeque::with_capacity(IMU_BURST_CAP)),
            depth_ready_tx,
            depth_ready_rx,
            seg_ready_tx,
            seg_ready_rx,
            map_snapshot_generation: AtomicU64::new(0),
            raw_data_subscribed: AtomicBool::new(false),
            map_storage: Mutex::new(None),
            map_storage_callback: Mutex::new(None),
            map_storage_latch: Mutex::new(None),
        })
    }

    pub fn set_raw_data_subscribed(&self, on: bool) {
        self.raw_data_subscribed.store(on, Ordering::Release);
    }

    pub fn is_raw_data_subscribed(&self) -> bool {
        self.raw_data_subscribed.load(Ordering::Acquire)
    }

    pub fn push_imu(&self, sample: ImuSample) {
        let mut burst = self.imu_burst.lock();
        if burst.len() == IMU_BURST_CAP {
            burst.pop_front();
        }
        burst.push_back(sample);
    }

    /// Drains up to `max_count` cached IMU samples, oldest first. Returns an
    /// empty vec (never `NotReady`) when the burst is empty.
    pub fn peek_imu(&self, max_count: usize) -> Vec<ImuSample> {
        let burst = self.imu_burst.lock();
        burst.iter().rev().take(max_count).rev().copied().collect()
    }

    pub fn notify_depth_frame(&self, timestamp_ns: u64) {
        let _ = self.depth_ready_tx.try_send(timestamp_ns);
    }

    pub fn notify_segmentation_frame(&self, timestamp_ns: u64) {
        let _ = self.seg_ready_tx.try_send(timestamp_ns);
    }

    /// Blocks up to `timeout` for the next depth-camera frame-ready push.
    pub fn wait_depth_frame(&self, timeout: Duration) -> bool {
        self.depth_ready_rx.recv_timeout(timeout).is_ok()
    }

    /// Blocks up to `timeout` for the next segmentation frame-ready push.
    pub fn wait_segmentation_frame(&self, timeout: Duration) -> bool {
        self.seg_ready_rx.recv_timeout(timeout).is_ok()
    }

    /// Installs a new active map-storage session and its completion callback.
    /// Fails (returns `false`) if one is already active — enforces "at most
    /// one active MapStorageSession per Session".
    pub fn start_map_storage(
        &self,
        kind: MapStorageKind,
        file_path: String,
        callback: MapStorageCallback,
    ) -> bool {
        let mut slot = self.map_storage.lock();
        if slot.as_ref().is_some_and(|s| s.status.is_active()) {
            return false;
        }
        *slot = Some(MapStorageSession {
            kind,
            file_path,
            status: MapStorageStatus::Working(0),
        });
        *self.map_storage_callback.lock() = Some(callback);
        *self.map_storage_latch.lock() = None;
        true
    }

    pub fn is_map_storage_active(&self) -> bool {
        self.map_storage
            .lock()
            .as_ref()
            .is_some_and(|s| s.status.is_active())
    }

    pub fn map_storage_snapshot(&self) -> Option<MapStorageSession> {
        self.map_storage.lock().clone()
    }

    /// Idempotent: marks the session `Aborted` without waiting for the
    /// device's acknowledgement push (that ack, when it arrives, finds
    /// nothing active and is dropped harmlessly).
    pub fn abort_map_storage(&self) {
        let mut slot = self.map_storage.lock();
        if let Some(session) = slot.as_mut() {
            if session.status.is_active() {
                session.status = MapStorageStatus::Aborted;
                drop(slot);
                self.fire_map_storage_callback(false);
            }
        }
    }

    /// Consumes the latch the reader thread set when the callback fired, so
    /// a second poll doesn't see a stale result from a previous session.
    pub fn take_map_storage_latch(&self) -> Option<bool> {
        self.map_storage_latch.lock().take()
    }

    /// Applies a `MapStorageUpdate` push frame. `status_tag` follows the
    /// device's terminal-state encoding: 0=working, 1=finished, 2=failed,
    /// 3=aborted, 4=rejected, 5=timeout.
    pub fn handle_map_storage_update(&self, progress: u8, status_tag: u8) {
        let status = match status_tag {
            1 => MapStorageStatus::Finished,
            2 => MapStorageStatus::Failed,
            3 => MapStorageStatus::Aborted,
            4 => MapStorageStatus::Rejected,
            5 => MapStorageStatus::Timeout,
            _ => MapStorageStatus::Working(progress),
        };
        let was_active = {
            let mut slot = self.map_storage.lock();
            match slot.as_mut() {
                Some(session) => {
                    session.status = status;
                    true
                }
                None => false,
            }
        };
        if was_active && status.is_terminal() {
            self.fire_map_storage_callback(status.is_finished());
        }
    }

    fn fire_map_storage_callback(&self, ok: bool) {
        *self.map_storage_latch.lock() = Some(ok);
        if let Some(callback) = self.map_storage_callback.lock().take() {
            callback(ok);
        }
    }
}

/// Cheap-to-clone handle the transport's reader thread uses to demultiplex
/// push frames into a [`StreamState`], without needing to know about
/// `Session` or any component.
#[derive(Clone)]
pub struct StreamSink {
    state: Arc<StreamState>,
}

impl StreamSink {
    pub fn new(state: Arc<StreamState>) -> StreamSink {
        StreamSink { state }
    }

    pub fn dispatch(&self, tag: u16, body: Vec<u8>) {
        let Some(tag) = StreamTag::from_u16(tag) else {
            log::debug!("unrecognized push tag {tag:#06x}, dropping {} bytes", body.len());
            return;
        };

        match tag {
            StreamTag::Pose => self.handle_pose(&body),
            StreamTag::Tracking => self.handle_tracking(&body),
            StreamTag::CameraPreview => self.handle_camera_preview(&body),
            StreamTag::Lidar => self.handle_lidar(&body),
            StreamTag::Imu => self.handle_imu(&body),
            StreamTag::DepthFrameReady => self.handle_depth_ready(&body),
            StreamTag::SegmentationFrameReady => self.handle_segmentation_ready(&body),
            StreamTag::MapSnapshotDelta => {
                self.state.map_snapshot_generation.fetch_add(1, Ordering::AcqRel);
            }
            StreamTag::MapStorageUpdate => self.handle_map_storage_update(&body),
        }
    }

    fn handle_pose(&self, body: &[u8]) {
        use byteorder::{LittleEndian as LE, ReadBytesExt};
        use std::io::Cursor;
        let mut r = Cursor::new(body);
        let Ok(ts) = r.read_u64::<LE>() else { return };
        let Ok(wire) = crate::protocol::codec::read_pose_se3_wire(&mut r) else {
            return;
        };
        let pose = crate::protocol::codec::pose_se3_from_wire(&wire);
        *self.state.latest_pose.write() = Some((pose, ts));
    }

    fn handle_tracking(&self, body: &[u8]) {
        match crate::protocol::codec::decode_tracking_frame(body) {
            Ok(frame) => *self.state.latest_tracking.write() = Some(frame),
            Err(e) => log::debug!("malformed tracking push frame, dropping: {e}"),
        }
    }

    fn handle_camera_preview(&self, body: &[u8]) {
        match crate::protocol::codec::decode_stereo_image_pair(body) {
            Ok(pair) => *self.state.latest_camera_preview.write() = Some(pair),
            Err(e) => log::debug!("malformed camera preview push frame, dropping: {e}"),
        }
    }

    fn handle_lidar(&self, body: &[u8]) {
        match crate::protocol::codec::decode_lidar_scan(body) {
            Ok(scan) => *self.state.latest_lidar.write() = Some(scan),
            Err(e) => log::debug!("malformed lidar push frame, dropping: {e}"),
        }
    }

    fn handle_imu(&self, body: &[u8]) {
        let Ok(wire) = crate::protocol::codec::read_imu_data_wire(body) else {
            return;
        };
        self.state
            .push_imu(crate::protocol::codec::imu_sample_from_wire(&wire));
    }

    fn handle_depth_ready(&self, body: &[u8]) {
        use byteorder::{LittleEndian as LE, ReadBytesExt};
        use std::io::Cursor;
        let ts = Cursor::new(body).read_u64::<LE>().unwrap_or(0);
        self.state.notify_depth_frame(ts);
    }

    fn handle_segmentation_ready(&self, body: &[u8]) {
        use byteorder::{LittleEndian as LE, ReadBytesExt};
        use std::io::Cursor;
        let ts = Cursor::new(body).read_u64::<LE>().unwrap_or(0);
        self.state.notify_segmentation_frame(ts);
    }

    /// Body is `[progress:u8][status_tag:u8]`.
    fn handle_map_storage_update(&self, body: &[u8]) {
        let progress = body.first().copied().unwrap_or(0);
        let status_tag = body.get(1).copied().unwrap_or(0);
        self.state.handle_map_storage_update(progress, status_tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MapStorageKind;
    use std::sync::atomic::AtomicBool as StdAtomicBool;

    #[test]
    fn second_start_is_rejected_while_one_session_is_active() {
        let state = StreamState::new();
        assert!(state.start_map_storage(MapStorageKind::Download, "a.map".into(), Box::new(|_| {})));
        assert!(state.is_map_storage_active());
        assert!(!state.start_map_storage(MapStorageKind::Upload, "b.map".into(), Box::new(|_| {})));
    }

    #[test]
    fn terminal_push_fires_callback_once_and_sets_latch() {
        let state = StreamState::new();
        let fired = Arc::new(StdAtomicBool::new(false));
        let fired2 = fired.clone();
        state.start_map_storage(
            MapStorageKind::Download,
            "a.map".into(),
            Box::new(move |ok| {
                assert!(ok);
                fired2.store(true, Ordering::Release);
            }),
        );
        state.handle_map_storage_update(100, 1);
        assert!(fired.load(Ordering::Acquire));
        assert!(!state.is_map_storage_active());
        assert_eq!(state.take_map_storage_latch(), Some(true));
        assert_eq!(state.take_map_storage_latch(), None);
    }

    #[test]
    fn abort_marks_aborted_and_fires_callback_with_false() {
        let state = StreamState::new();
        let fired = Arc::new(StdAtomicBool::new(false));
        let fired2 = fired.clone();
        state.start_map_storage(
            MapStorageKind::Upload,
            "a.map".into(),
            Box::new(move |ok| {
                assert!(!ok);
                fired2.store(true, Ordering::Release);
            }),
        );
        state.abort_map_storage();
        assert!(fired.load(Ordering::Acquire));
        assert_eq!(
            state.map_storage_snapshot().map(|s| s.status),
            Some(MapStorageStatus::Aborted)
        );
    }
}
