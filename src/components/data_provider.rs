//! Read-only accessor for live streams and on-demand device queries.
//!
//! Every accessor here is a non-blocking snapshot read, except where noted.
//! Live-stream accessors (`current_pose`, `camera_preview`, `tracking_frame`,
//! `recent_lidar_scan`, `peek_imu_data`) read the Session-owned caches the
//! background transport reader fills; everything else round-trips a single
//! request to the device.

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::protocol::codec::*;
use crate::protocol::CommandId;
use crate::session::Session;
use crate::types::*;

/// Non-owning handle onto a [`Session`]'s live-stream caches and query surface.
pub struct DataProvider<'a> {
    session: &'a Session,
}

impl<'a> DataProvider<'a> {
    pub fn new(session: &'a Session) -> DataProvider<'a> {
        DataProvider { session }
    }

    /// Returns the freshest pose as SE3 or Euler, with its sensor timestamp.
    /// Fails `NotReady` if no pose has arrived since subscription.
    pub fn current_pose(&self, use_se3: bool) -> Result<(PoseSE3, PoseEuler, u64)> {
        let guard = self.session.stream_state().latest_pose.read();
        let (pose, ts) = guard.ok_or(Error::NotReady)?;
        let euler = pose.to_euler();
        let _ = use_se3;
        Ok((pose, euler, ts))
    }

    /// `timestamp_ns` must be a real sensor timestamp; `0` yields `NotReady`.
    /// `allow_interpolation=false` restricts matches to within `max_time_diff_ns`.
    pub fn peek_history_pose(
        &self,
        timestamp_ns: u64,
        allow_interpolation: bool,
        max_time_diff_ns: u64,
    ) -> Result<PoseSE3> {
        if timestamp_ns == 0 {
            return Err(Error::NotReady);
        }
        let mut payload = Vec::with_capacity(17);
        payload.write_u64::<LE>(timestamp_ns)?;
        payload.write_u8(allow_interpolation as u8)?;
        payload.write_u64::<LE>(max_time_diff_ns)?;
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchHistoryPose, &payload, None))?;
        let wire = read_pose_se3_wire(&mut Cursor::new(&resp.payload))?;
        Ok(pose_se3_from_wire(&wire))
    }

    /// `timestamp_ns == 0` means freshest. Returns `NotReady` when no image
    /// has arrived since subscription.
    pub fn camera_preview(&self, timestamp_ns: u64, allow_nearest: bool) -> Result<StereoImagePair> {
        if timestamp_ns == 0 {
            let guard = self.session.stream_state().latest_camera_preview.read();
            return guard.clone().ok_or(Error::NotReady);
        }
        let mut payload = Vec::with_capacity(9);
        payload.write_u64::<LE>(timestamp_ns)?;
        payload.write_u8(allow_nearest as u8)?;
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchCameraPreview, &payload, None))?;
        Ok(decode_stereo_image_pair(&resp.payload)?)
    }

    /// Freshest tracking snapshot: stereo images, per-eye keypoints, pose and status.
    pub fn tracking_frame(&self) -> Result<TrackingFrame> {
        let guard = self.session.stream_state().latest_tracking.read();
        guard.clone().ok_or(Error::NotReady)
    }

    /// `None` when not yet ready; keeps up to `max_points` points.
    pub fn recent_lidar_scan(&self, max_points: usize) -> Result<Option<LidarScan>> {
        let guard = self.session.stream_state().latest_lidar.read();
        Ok(guard.as_ref().map(|scan| {
            let mut scan = scan.clone();
            scan.points.truncate(max_points);
            scan
        }))
    }

    /// Cached burst; returns immediately even when empty (never `NotReady`).
    pub fn peek_imu_data(&self, max_count: usize) -> Vec<ImuSample> {
        self.session.stream_state().peek_imu(max_count)
    }

    pub fn global_mapping_info(&self) -> Result<GlobalMapDesc> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchGlobalMappingInfo, &[], None))?;
        let wire = read_global_map_desc_wire(&resp.payload)?;
        Ok(global_map_desc_from_wire(&wire))
    }

    /// `map_ids = None` means active map only, `Some(&[])` means all maps,
    /// `Some(ids)` means the specified set. Loop closures are extracted from
    /// each keyframe's null-terminated looped-ID array (capped at 100).
    ///
    /// The device drives this with a callback-style visitor internally; any
    /// malformed record is dropped and traversal continues rather than
    /// aborting the whole pull, matching the visitor's error-isolating
    /// contract at the wire-decode boundary.
    pub fn map_data(
        &self,
        map_ids: Option<&[u64]>,
        fetch_keyframes: bool,
        fetch_map_points: bool,
        fetch_map_info: bool,
    ) -> Result<MapData> {
        let mut payload = Vec::new();
        match map_ids {
            None => {
                payload.write_u8(0)?; // active-map-only
                payload.write_u32::<LE>(0)?;
            }
            Some(ids) => {
                payload.write_u8(if ids.is_empty() { 1 } else { 2 })?; // all-maps / specified
                payload.write_u32::<LE>(ids.len() as u32)?;
                for id in ids {
                    payload.write_u64::<LE>(*id)?;
                }
            }
        }
        payload.write_u8(fetch_keyframes as u8)?;
        payload.write_u8(fetch_map_points as u8)?;
        payload.write_u8(fetch_map_info as u8)?;

        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchMapData, &payload, None))?;
        decode_map_data(&resp.payload)
    }

    pub fn device_basic_info(&self) -> Result<DeviceBasicInfo> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchDeviceBasicInfo, &[], None))?;
        let wire = read_device_basic_info_wire(&resp.payload)?;
        Ok(device_basic_info_from_wire(&wire, current_timestamp_hint()))
    }

    pub fn device_status(&self) -> Result<(DeviceStatus, u64)> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchDeviceStatus, &[], None))?;
        let mut r = Cursor::new(&resp.payload);
        let ts = r.read_u64::<LE>()?;
        let wire = read_device_status_wire(&resp.payload[8..])?;
        Ok((device_status_from_wire(&wire), ts))
    }

    pub fn relocalization_status(&self) -> Result<RelocalizationStatus> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::GetRelocalizationStatus, &[], None))?;
        let wire = read_relocalization_status_wire(&resp.payload)?;
        Ok(relocalization_status_from_wire(&wire))
    }

    pub fn mapping_flags(&self) -> Result<u32> {
        Ok(self.global_mapping_info()?.mapping_flags)
    }

    pub fn imu_info(&self) -> Result<ImuCalibrationInfo> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchImuInfo, &[], None))?;
        let wire = read_imu_info_wire(&resp.payload)?;
        Ok(imu_calibration_from_wire(&wire))
    }

    pub fn all_map_info(&self, max: usize) -> Result<Vec<MapDescriptor>> {
        let mut payload = Vec::with_capacity(4);
        payload.write_u32::<LE>(max as u32)?;
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchAllMapInfo, &payload, None))?;
        let mut r = Cursor::new(&resp.payload);
        let count = r.read_u32::<LE>()? as usize;
        (0..count.min(max))
            .map(|_| {
                let mut header = [0u8; 64];
                r.read_exact(&mut header)?;
                let wire = read_map_desc_wire(&header)?;
                Ok(map_descriptor_from_wire(&wire))
            })
            .collect::<Result<Vec<_>>>()
    }

    pub fn camera_calibration(&self) -> Result<CameraCalibration> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchCameraCalibration, &[], None))?;
        let wire = read_camera_calibration_info_wire(&resp.payload)?;
        Ok(camera_calibration_from_wire(&wire))
    }

    pub fn transform_calibration(&self) -> Result<TransformCalibration> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchTransformCalibration, &[], None))?;
        let wire = read_transform_calibration_info_wire(&resp.payload)?;
        Ok(transform_calibration_from_wire(&wire))
    }
}

/// Decodes a `FetchMapData` response body: `map_point_count:u32`, that many
/// `MapPointDescWire`s, `keyframe_count:u32`, that many
/// `KeyframeDescWire`s (each immediately followed by its null-terminated
/// looped-ID and connected-ID arrays), then `map_info_count:u32` descriptors.
/// Loop closures are derived from each keyframe's looped IDs.
fn decode_map_data(bytes: &[u8]) -> Result<MapData> {
    const LOOPED_ID_CAP: usize = 100;
    let mut r = Cursor::new(bytes);
    let mut out = MapData::default();

    const MAP_POINT_DESC_LEN: usize = 44;
    const KEYFRAME_DESC_LEN: usize = 160;

    let mp_count = r.read_u32::<LE>()? as usize;
    for _ in 0..mp_count {
        let mut header = [0u8; MAP_POINT_DESC_LEN];
        r.read_exact(&mut header)?;
        let wire = read_map_point_desc_wire(&header)?;
        out.map_points.push(map_point_from_wire(&wire));
    }

    let kf_count = r.read_u32::<LE>()? as usize;
    for _ in 0..kf_count {
        let mut header = [0u8; KEYFRAME_DESC_LEN];
        r.read_exact(&mut header)?;
        let wire = read_keyframe_desc_wire(&header)?;
        let looped_ids = read_null_terminated_ids(&mut r, LOOPED_ID_CAP)?;
        let connected_ids = read_null_terminated_ids(&mut r, LOOPED_ID_CAP)?;
        for &looped in &looped_ids {
            out.loop_closures.push(LoopClosure {
                keyframe_id: wire.id,
                looped_keyframe_id: looped,
            });
        }
        out.keyframes
            .push(keyframe_from_wire(&wire, looped_ids, connected_ids));
    }

    let map_info_count = r.read_u32::<LE>()? as usize;
    for _ in 0..map_info_count {
        let mut header = [0u8; 64];
        r.read_exact(&mut header)?;
        let wire = read_map_desc_wire(&header)?;
        out.map_info.push(map_descriptor_from_wire(&wire));
    }

    Ok(out)
}

/// `DeviceBasicInfoWire` carries no capture timestamp of its own on the
/// wire; the SDK stamps the snapshot with the time it was received.
fn current_timestamp_hint() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_pose_before_any_sample_is_not_ready() {
        let session = Session::new();
        let provider = DataProvider::new(&session);
        assert!(matches!(provider.current_pose(true), Err(Error::NotReady)));
    }

    #[test]
    fn peek_history_pose_with_zero_timestamp_is_not_ready() {
        let session = Session::new();
        let provider = DataProvider::new(&session);
        let result = provider.peek_history_pose(0, true, 1_000_000);
        assert!(matches!(result, Err(Error::NotReady)));
    }

    #[test]
    fn camera_preview_before_any_frame_is_not_ready() {
        let session = Session::new();
        let provider = DataProvider::new(&session);
        assert!(matches!(provider.camera_preview(0, true), Err(Error::NotReady)));
    }

    #[test]
    fn peek_imu_data_with_no_samples_returns_empty_not_an_error() {
        let session = Session::new();
        let provider = DataProvider::new(&session);
        assert_eq!(provider.peek_imu_data(4096), Vec::new());
    }

    #[test]
    fn recent_lidar_scan_before_any_scan_is_none() {
        let session = Session::new();
        let provider = DataProvider::new(&session);
        assert!(provider.recent_lidar_scan(8192).unwrap().is_none());
    }

    #[test]
    fn tracking_frame_before_any_frame_is_not_ready() {
        let session = Session::new();
        let provider = DataProvider::new(&session);
        assert!(matches!(provider.tracking_frame(), Err(Error::NotReady)));
    }

    #[test]
    fn decode_map_data_of_an_empty_response_yields_empty_collections() {
        let bytes = [0u8; 12]; // mp_count=0, kf_count=0, map_info_count=0
        let data = decode_map_data(&bytes).unwrap();
        assert!(data.map_points.is_empty());
        assert!(data.keyframes.is_empty());
        assert!(data.loop_closures.is_empty());
        assert!(data.map_info.is_empty());
    }
}
