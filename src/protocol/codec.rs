//! Decoders from raw wire bytes into the fixed-layout records of
//! [`crate::protocol::wire`], and from those records into the owned
//! [`crate::types`] the public API returns.

use byteorder::{ReadBytesExt, LittleEndian as LE};
use std::io::{self, Cursor, Read};

use super::wire::*;
use crate::types::*;

pub type CodecResult<T> = io::Result<T>;

/// Extracts a null-terminated (or fully-populated) fixed-size ASCII/UTF-8 field.
pub fn extract_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

fn read_array<R: Read, const N: usize>(r: &mut R) -> CodecResult<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_f32_array<R: Read, const N: usize>(r: &mut R) -> CodecResult<[f32; N]> {
    let mut out = [0f32; N];
    for slot in out.iter_mut() {
        *slot = r.read_f32::<LE>()?;
    }
    Ok(out)
}

fn read_f64_array<R: Read, const N: usize>(r: &mut R) -> CodecResult<[f64; N]> {
    let mut out = [0f64; N];
    for slot in out.iter_mut() {
        *slot = r.read_f64::<LE>()?;
    }
    Ok(out)
}

pub fn read_pose_se3_wire<R: Read>(r: &mut R) -> CodecResult<PoseSE3Wire> {
    Ok(PoseSE3Wire {
        translation: read_f64_array(r)?,
        quaternion: read_f64_array(r)?,
    })
}

pub fn read_pose_euler_wire<R: Read>(r: &mut R) -> CodecResult<PoseEulerWire> {
    Ok(PoseEulerWire {
        translation: read_f64_array(r)?,
        rotation: read_f64_array(r)?,
    })
}

pub fn read_image_desc_wire<R: Read>(r: &mut R) -> CodecResult<ImageDescWire> {
    Ok(ImageDescWire {
        width: r.read_u32::<LE>()?,
        height: r.read_u32::<LE>()?,
        stride: r.read_u32::<LE>()?,
        format: r.read_u32::<LE>()?,
        data_size: r.read_u32::<LE>()?,
    })
}

pub fn read_device_basic_info_wire(bytes: &[u8]) -> CodecResult<DeviceBasicInfoWire> {
    let mut r = Cursor::new(bytes);
    Ok(DeviceBasicInfoWire {
        model_major: r.read_u16::<LE>()?,
        model_sub: r.read_u16::<LE>()?,
        model_revision: r.read_u16::<LE>()?,
        firmware_version_string: read_array::<_, 32>(&mut r)?,
        firmware_build_date: read_array::<_, 16>(&mut r)?,
        firmware_build_time: read_array::<_, 16>(&mut r)?,
        device_sn: read_array::<_, 16>(&mut r)?,
        device_name: read_array::<_, 16>(&mut r)?,
        hwfeature_bitmaps: r.read_u64::<LE>()?,
        sensing_feature_bitmaps: r.read_u64::<LE>()?,
        swfeature_bitmaps: r.read_u64::<LE>()?,
        device_uptime_us: r.read_u64::<LE>()?,
    })
}

pub fn device_basic_info_from_wire(w: &DeviceBasicInfoWire, captured_at_ns: u64) -> DeviceBasicInfo {
    DeviceBasicInfo {
        model_major: w.model_major,
        model_sub: w.model_sub,
        model_revision: w.model_revision,
        firmware_version_string: extract_string(&w.firmware_version_string),
        firmware_build_date: extract_string(&w.firmware_build_date),
        firmware_build_time: extract_string(&w.firmware_build_time),
        serial_number: w.device_sn,
        device_name: extract_string(&w.device_name),
        hw_features: HwFeatures::from_bits_truncate(w.hwfeature_bitmaps),
        sensing_features: SensingFeatures::from_bits_truncate(w.sensing_feature_bitmaps),
        sw_features: SwFeatures::from_bits_truncate(w.swfeature_bitmaps),
        device_uptime_us: w.device_uptime_us,
        captured_at_ns,
    }
}

pub fn read_tracking_info_wire(bytes: &[u8]) -> CodecResult<TrackingInfoWire> {
    let mut r = Cursor::new(bytes);
    Ok(TrackingInfoWire {
        timestamp_ns: r.read_u64::<LE>()?,
        left: read_image_desc_wire(&mut r)?,
        right: read_image_desc_wire(&mut r)?,
        is_stereo: r.read_u32::<LE>()?,
        tracking_status: r.read_u32::<LE>()?,
        pose: read_pose_se3_wire(&mut r)?,
        keypoints_left_count: r.read_u32::<LE>()?,
        keypoints_right_count: r.read_u32::<LE>()?,
    })
}

pub fn read_keypoint_wire<R: Read>(r: &mut R) -> CodecResult<KeypointWire> {
    Ok(KeypointWire {
        x: r.read_f32::<LE>()?,
        y: r.read_f32::<LE>()?,
        flags: r.read_u8()?,
    })
}

pub fn keypoint_from_wire(w: &KeypointWire) -> Keypoint {
    Keypoint {
        x: w.x,
        y: w.y,
        matched: w.flags & 0x1 != 0,
    }
}

pub fn read_lidar_scan_point_wire<R: Read>(r: &mut R) -> CodecResult<LidarScanPointWire> {
    Ok(LidarScanPointWire {
        dist: r.read_f32::<LE>()?,
        angle: r.read_f32::<LE>()?,
        quality: r.read_u8()?,
    })
}

pub fn lidar_point_from_wire(w: &LidarScanPointWire) -> LidarPoint {
    LidarPoint {
        distance_m: w.dist,
        angle_rad: w.angle,
        quality: w.quality,
    }
}

pub fn read_lidar_scan_header_wire(bytes: &[u8]) -> CodecResult<LidarSinglelayerScanDataInfoWire> {
    let mut r = Cursor::new(bytes);
    Ok(LidarSinglelayerScanDataInfoWire {
        timestamp_ns: r.read_u64::<LE>()?,
        layer_id: r.read_i32::<LE>()?,
        binded_kf_id: r.read_u64::<LE>()?,
        dyaw: r.read_f32::<LE>()?,
        scan_count: r.read_u32::<LE>()?,
    })
}

pub fn read_imu_data_wire(bytes: &[u8]) -> CodecResult<ImuDataWire> {
    let mut r = Cursor::new(bytes);
    Ok(ImuDataWire {
        timestamp_ns: r.read_u64::<LE>()?,
        imu_id: r.read_u32::<LE>()?,
        acc: read_f64_array(&mut r)?,
        gyro: read_f64_array(&mut r)?,
    })
}

pub fn imu_sample_from_wire(w: &ImuDataWire) -> ImuSample {
    ImuSample {
        timestamp_ns: w.timestamp_ns,
        imu_id: w.imu_id,
        acc: w.acc,
        gyro: w.gyro,
    }
}

pub fn read_imu_info_wire(bytes: &[u8]) -> CodecResult<ImuInfoWire> {
    let mut r = Cursor::new(bytes);
    Ok(ImuInfoWire {
        valid: r.read_i32::<LE>()?,
        tcb: read_pose_se3_wire(&mut r)?,
        tc_imu: read_pose_se3_wire(&mut r)?,
        cov_noise: read_f64_array(&mut r)?,
        cov_random_walk: read_f64_array(&mut r)?,
    })
}

pub fn imu_calibration_from_wire(w: &ImuInfoWire) -> ImuCalibrationInfo {
    ImuCalibrationInfo {
        valid: w.valid != 0,
        t_base_to_camera: pose_se3_from_wire(&w.tcb),
        t_camera_to_imu: pose_se3_from_wire(&w.tc_imu),
        cov_noise: w.cov_noise,
        cov_random_walk: w.cov_random_walk,
    }
}

pub fn pose_se3_from_wire(w: &PoseSE3Wire) -> PoseSE3 {
    PoseSE3 {
        translation: w.translation,
        quaternion: w.quaternion,
    }
}

pub fn pose_se3_to_wire(p: &PoseSE3) -> PoseSE3Wire {
    PoseSE3Wire {
        translation: p.translation,
        quaternion: p.quaternion,
    }
}

pub fn pose_euler_from_wire(w: &PoseEulerWire) -> PoseEuler {
    PoseEuler {
        translation: w.translation,
        rotation: w.rotation,
    }
}

pub fn read_map_point_desc_wire(bytes: &[u8]) -> CodecResult<MapPointDescWire> {
    let mut r = Cursor::new(bytes);
    Ok(MapPointDescWire {
        id: r.read_u64::<LE>()?,
        map_id: r.read_u32::<LE>()?,
        _padding1: r.read_u32::<LE>()?,
        timestamp: r.read_f64::<LE>()?,
        position: read_f32_array(&mut r)?,
        flags: r.read_u32::<LE>()?,
        _padding2: r.read_u32::<LE>()?,
    })
}

pub fn map_point_from_wire(w: &MapPointDescWire) -> MapPoint {
    MapPoint {
        id: w.id,
        map_id: w.map_id,
        timestamp: w.timestamp,
        position: w.position,
        flags: w.flags,
    }
}

pub fn read_keyframe_desc_wire(bytes: &[u8]) -> CodecResult<KeyframeDescWire> {
    let mut r = Cursor::new(bytes);
    Ok(KeyframeDescWire {
        id: r.read_u64::<LE>()?,
        parent_id: r.read_u64::<LE>()?,
        map_id: r.read_u32::<LE>()?,
        _padding1: r.read_u32::<LE>()?,
        timestamp: r.read_f64::<LE>()?,
        pose_se3: read_pose_se3_wire(&mut r)?,
        pose: read_pose_euler_wire(&mut r)?,
        looped_frame_count: r.read_u64::<LE>()?,
        connected_frame_count: r.read_u64::<LE>()?,
        flags: r.read_u32::<LE>()?,
        _padding2: r.read_u32::<LE>()?,
    })
}

/// Builds the owned [`Keyframe`] from a decoded header plus the two
/// null-terminated ID arrays that trail it on the wire (looped, then connected).
pub fn keyframe_from_wire(
    w: &KeyframeDescWire,
    looped_frame_ids: Vec<u64>,
    connected_frame_ids: Vec<u64>,
) -> Keyframe {
    Keyframe {
        id: w.id,
        parent_id: w.parent_id,
        map_id: w.map_id,
        timestamp: w.timestamp,
        pose_se3: pose_se3_from_wire(&w.pose_se3),
        pose_euler: pose_euler_from_wire(&w.pose),
        looped_frame_ids,
        connected_frame_ids,
        flags: KeyframeFlags::from_bits_truncate(w.flags),
    }
}

/// Reads a null-terminated (zero-ID-terminated) array of keyframe IDs,
/// capped at 100 entries per the device's safety limit.
pub fn read_null_terminated_ids<R: Read>(r: &mut R, max: usize) -> CodecResult<Vec<u64>> {
    let mut ids = Vec::new();
    for _ in 0..max {
        let id = r.read_u64::<LE>()?;
        if id == 0 {
            break;
        }
        ids.push(id);
    }
    Ok(ids)
}

pub fn read_map_desc_wire(bytes: &[u8]) -> CodecResult<MapDescWire> {
    let mut r = Cursor::new(bytes);
    Ok(MapDescWire {
        map_id: r.read_u64::<LE>()?,
        map_flags: r.read_u32::<LE>()?,
        _padding1: r.read_u32::<LE>()?,
        keyframe_count: r.read_u64::<LE>()?,
        map_point_count: r.read_u64::<LE>()?,
        keyframe_id_start: r.read_u64::<LE>()?,
        keyframe_id_end: r.read_u64::<LE>()?,
        map_point_id_start: r.read_u64::<LE>()?,
        map_point_id_end: r.read_u64::<LE>()?,
    })
}

pub fn map_descriptor_from_wire(w: &MapDescWire) -> MapDescriptor {
    MapDescriptor {
        map_id: w.map_id,
        map_flags: w.map_flags,
        keyframe_count: w.keyframe_count,
        map_point_count: w.map_point_count,
        keyframe_id_start: w.keyframe_id_start,
        keyframe_id_end: w.keyframe_id_end,
        map_point_id_start: w.map_point_id_start,
        map_point_id_end: w.map_point_id_end,
    }
}

pub fn read_global_map_desc_wire(bytes: &[u8]) -> CodecResult<GlobalMapDescWire> {
    let mut r = Cursor::new(bytes);
    Ok(GlobalMapDescWire {
        last_mp_count_to_fetch: r.read_u64::<LE>()?,
        last_kf_count_to_fetch: r.read_u64::<LE>()?,
        last_map_count_to_fetch: r.read_u64::<LE>()?,
        last_mp_retrieved: r.read_u64::<LE>()?,
        last_kf_retrieved: r.read_u64::<LE>()?,
        total_mp_count: r.read_u64::<LE>()?,
        total_kf_count: r.read_u64::<LE>()?,
        total_map_count: r.read_u64::<LE>()?,
        total_mp_count_fetched: r.read_u64::<LE>()?,
        total_kf_count_fetched: r.read_u64::<LE>()?,
        total_map_count_fetched: r.read_u64::<LE>()?,
        current_active_mp_count: r.read_u64::<LE>()?,
        current_active_kf_count: r.read_u64::<LE>()?,
        active_map_id: r.read_u32::<LE>()?,
        mapping_flags: r.read_u32::<LE>()?,
        sliding_window_start_kf_id: r.read_u64::<LE>()?,
    })
}

pub fn global_map_desc_from_wire(w: &GlobalMapDescWire) -> GlobalMapDesc {
    GlobalMapDesc {
        last_map_point_count_to_fetch: w.last_mp_count_to_fetch,
        last_keyframe_count_to_fetch: w.last_kf_count_to_fetch,
        last_map_count_to_fetch: w.last_map_count_to_fetch,
        last_map_point_retrieved: w.last_mp_retrieved,
        last_keyframe_retrieved: w.last_kf_retrieved,
        total_map_point_count: w.total_mp_count,
        total_keyframe_count: w.total_kf_count,
        total_map_count: w.total_map_count,
        total_map_point_count_fetched: w.total_mp_count_fetched,
        total_keyframe_count_fetched: w.total_kf_count_fetched,
        total_map_count_fetched: w.total_map_count_fetched,
        current_active_map_point_count: w.current_active_mp_count,
        current_active_keyframe_count: w.current_active_kf_count,
        active_map_id: w.active_map_id,
        mapping_flags: w.mapping_flags,
        sliding_window_start_keyframe_id: w.sliding_window_start_kf_id,
    }
}

pub fn read_device_status_wire(bytes: &[u8]) -> CodecResult<DeviceStatusWire> {
    let mut r = Cursor::new(bytes);
    Ok(DeviceStatusWire {
        device_state: r.read_u32::<LE>()?,
        battery_level: r.read_f32::<LE>()?,
        temperature: r.read_f32::<LE>()?,
        cpu_usage: r.read_f32::<LE>()?,
        memory_usage: r.read_f32::<LE>()?,
        tracking_quality: r.read_u32::<LE>()?,
        error_flags: r.read_u32::<LE>()?,
        reserved: read_array(&mut r)?,
    })
}

pub fn device_status_from_wire(w: &DeviceStatusWire) -> DeviceStatus {
    DeviceStatus {
        device_state: w.device_state,
        battery_level: w.battery_level,
        temperature: w.temperature,
        cpu_usage: w.cpu_usage,
        memory_usage: w.memory_usage,
        tracking_quality: w.tracking_quality,
        error_flags: w.error_flags,
    }
}

pub fn read_relocalization_status_wire(bytes: &[u8]) -> CodecResult<RelocalizationStatusWire> {
    let mut r = Cursor::new(bytes);
    Ok(RelocalizationStatusWire {
        is_relocalization_active: r.read_i32::<LE>()?,
        relocalization_progress: r.read_f32::<LE>()?,
        confidence_score: r.read_f32::<LE>()?,
        match_count: r.read_u32::<LE>()?,
        time_elapsed_ms: r.read_u64::<LE>()?,
        reserved: read_array(&mut r)?,
    })
}

pub fn relocalization_status_from_wire(w: &RelocalizationStatusWire) -> RelocalizationStatus {
    RelocalizationStatus {
        is_active: w.is_relocalization_active != 0,
        progress_pct: w.relocalization_progress,
        confidence: w.confidence_score,
        match_count: w.match_count,
        time_elapsed_ms: w.time_elapsed_ms,
    }
}

pub fn read_single_camera_calibration_wire<R: Read>(
    r: &mut R,
) -> CodecResult<SingleCameraCalibrationWire> {
    Ok(SingleCameraCalibrationWire {
        len_type: r.read_u32::<LE>()?,
        color_mode: r.read_u32::<LE>()?,
        width: r.read_i32::<LE>()?,
        height: r.read_i32::<LE>()?,
        fps: r.read_i32::<LE>()?,
        intrinsics: read_f32_array(r)?,
        distortion: read_f32_array(r)?,
    })
}

pub fn read_ext_camera_transform_wire<R: Read>(r: &mut R) -> CodecResult<ExtCameraTransformWire> {
    Ok(ExtCameraTransformWire {
        t_c2_c1: read_f32_array(r)?,
    })
}

pub fn read_camera_calibration_info_wire(bytes: &[u8]) -> CodecResult<CameraCalibrationInfoWire> {
    let mut r = Cursor::new(bytes);
    let camera_type = r.read_u32::<LE>()?;
    let mut camera_calibration = [read_single_camera_calibration_wire(&mut r)?; 4];
    for slot in camera_calibration.iter_mut().skip(1) {
        *slot = read_single_camera_calibration_wire(&mut r)?;
    }
    let mut ext_camera_transform = [read_ext_camera_transform_wire(&mut r)?; 4];
    for slot in ext_camera_transform.iter_mut().skip(1) {
        *slot = read_ext_camera_transform_wire(&mut r)?;
    }
    Ok(CameraCalibrationInfoWire {
        camera_type,
        camera_calibration,
        ext_camera_transform,
    })
}

pub fn camera_calibration_from_wire(w: &CameraCalibrationInfoWire) -> CameraCalibration {
    let camera_type = if w.camera_type == 0 {
        CameraType::Mono
    } else {
        CameraType::Stereo
    };
    let active_count = if camera_type == CameraType::Stereo { 2 } else { 1 };
    let cameras = w.camera_calibration[..active_count]
        .iter()
        .map(|c| SingleCameraCalibration {
            lens_type: match c.len_type {
                0 => LensType::Pinhole,
                1 => LensType::Rectified,
                _ => LensType::KannalaBrandt,
            },
            color_mode: if c.color_mode == 0 {
                ColorMode::Rgb
            } else {
                ColorMode::Mono
            },
            width: c.width,
            height: c.height,
            fps: c.fps,
            intrinsics: c.intrinsics,
            distortion: [
                c.distortion[0],
                c.distortion[1],
                c.distortion[2],
                c.distortion[3],
            ],
        })
        .collect();
    let ext_transforms = w.ext_camera_transform[..active_count]
        .iter()
        .map(|t| ExtCameraTransform { t_c2_c1: t.t_c2_c1 })
        .collect();
    CameraCalibration {
        camera_type,
        cameras,
        ext_transforms,
    }
}

pub fn read_transform_calibration_info_wire(bytes: &[u8]) -> CodecResult<TransformCalibrationInfoWire> {
    let mut r = Cursor::new(bytes);
    Ok(TransformCalibrationInfoWire {
        t_base_cam: read_pose_se3_wire(&mut r)?,
        t_camera_imu: read_pose_se3_wire(&mut r)?,
    })
}

pub fn transform_calibration_from_wire(w: &TransformCalibrationInfoWire) -> TransformCalibration {
    TransformCalibration {
        t_base_to_camera: pose_se3_from_wire(&w.t_base_cam),
        t_camera_to_imu: pose_se3_from_wire(&w.t_camera_imu),
    }
}

pub fn read_semantic_segmentation_config_wire(
    bytes: &[u8],
) -> CodecResult<SemanticSegmentationConfigWire> {
    let mut r = Cursor::new(bytes);
    Ok(SemanticSegmentationConfigWire {
        model_type: r.read_i32::<LE>()?,
        class_count: r.read_i32::<LE>()?,
        model_name: read_array(&mut r)?,
        version: read_array(&mut r)?,
        input_width: r.read_i32::<LE>()?,
        input_height: r.read_i32::<LE>()?,
        output_width: r.read_i32::<LE>()?,
        output_height: r.read_i32::<LE>()?,
    })
}

pub fn semantic_segmentation_config_from_wire(
    w: &SemanticSegmentationConfigWire,
) -> SemanticSegmentationConfig {
    SemanticSegmentationConfig {
        model_type: w.model_type,
        class_count: w.class_count,
        model_name: extract_string(&w.model_name),
        version: extract_string(&w.version),
        input_width: w.input_width,
        input_height: w.input_height,
        output_width: w.output_width,
        output_height: w.output_height,
    }
}

pub fn read_depthcam_config_wire(bytes: &[u8]) -> CodecResult<DepthcamConfigInfoWire> {
    let mut r = Cursor::new(bytes);
    Ok(DepthcamConfigInfoWire {
        fps: r.read_f32::<LE>()?,
        frame_skip: r.read_i32::<LE>()?,
        image_width: r.read_i32::<LE>()?,
        image_height: r.read_i32::<LE>()?,
        binded_cam_id: r.read_i32::<LE>()?,
    })
}

pub fn depth_camera_config_from_wire(w: &DepthcamConfigInfoWire) -> DepthCameraConfig {
    DepthCameraConfig {
        fps: w.fps,
        frame_skip: w.frame_skip,
        image_width: w.image_width,
        image_height: w.image_height,
        bound_camera_id: w.binded_cam_id,
    }
}

pub fn read_floor_detection_desc_wire(bytes: &[u8]) -> CodecResult<FloorDetectionDescWire> {
    let mut r = Cursor::new(bytes);
    Ok(FloorDetectionDescWire {
        floor_id: r.read_i32::<LE>()?,
        typical_height: r.read_f32::<LE>()?,
        confidence: r.read_f32::<LE>()?,
    })
}

pub fn floor_descriptor_from_wire(w: &FloorDetectionDescWire) -> FloorDescriptor {
    FloorDescriptor {
        floor_id: w.floor_id,
        typical_height_m: w.typical_height,
        confidence: w.confidence,
    }
}

pub fn read_floor_histogram_info_wire(bytes: &[u8]) -> CodecResult<FloorDetectionHistogramInfoWire> {
    let mut r = Cursor::new(bytes);
    Ok(FloorDetectionHistogramInfoWire {
        bin_width: r.read_f32::<LE>()?,
        bin_height_start: r.read_f32::<LE>()?,
        bin_total_count: r.read_i32::<LE>()?,
    })
}

pub fn floor_histogram_info_from_wire(w: &FloorDetectionHistogramInfoWire) -> FloorHistogramInfo {
    FloorHistogramInfo {
        bin_width_m: w.bin_width,
        bin_height_start_m: w.bin_height_start,
        bin_total_count: w.bin_total_count,
    }
}

/// Maps the device's `u32` pixel-format tag to [`PixelFormat`]. Unknown tags
/// fall back to `Grayscale8` rather than failing the whole frame decode.
pub fn pixel_format_from_u32(v: u32) -> PixelFormat {
    match v {
        1 => PixelFormat::Rgb8,
        2 => PixelFormat::Rgba8,
        3 => PixelFormat::DepthFloat32,
        4 => PixelFormat::Point3DFloat32,
        _ => PixelFormat::Grayscale8,
    }
}

/// Reads one [`ImageDescWire`] header followed by its `data_size` pixel bytes.
pub fn read_image_frame<R: Read>(r: &mut R, timestamp_ns: u64) -> CodecResult<ImageFrame> {
    let desc = read_image_desc_wire(r)?;
    let mut bytes = vec![0u8; desc.data_size as usize];
    r.read_exact(&mut bytes)?;
    Ok(ImageFrame {
        width: desc.width,
        height: desc.height,
        stride: desc.stride,
        format: pixel_format_from_u32(desc.format),
        timestamp_ns,
        bytes,
    })
}

/// Decodes a pushed or fetched stereo camera-preview frame: header plus the
/// left then right pixel buffers.
pub fn decode_stereo_image_pair(bytes: &[u8]) -> CodecResult<StereoImagePair> {
    let mut r = Cursor::new(bytes);
    let timestamp_ns = r.read_u64::<LE>()?;
    let is_stereo = r.read_u32::<LE>()? != 0;
    let left_desc = read_image_desc_wire(&mut r)?;
    let right_desc = read_image_desc_wire(&mut r)?;
    let mut left_bytes = vec![0u8; left_desc.data_size as usize];
    r.read_exact(&mut left_bytes)?;
    let mut right_bytes = vec![0u8; right_desc.data_size as usize];
    r.read_exact(&mut right_bytes)?;
    Ok(StereoImagePair {
        timestamp_ns,
        is_stereo,
        left: ImageFrame {
            width: left_desc.width,
            height: left_desc.height,
            stride: left_desc.stride,
            format: pixel_format_from_u32(left_desc.format),
            timestamp_ns,
            bytes: left_bytes,
        },
        right: ImageFrame {
            width: right_desc.width,
            height: right_desc.height,
            stride: right_desc.stride,
            format: pixel_format_from_u32(right_desc.format),
            timestamp_ns,
            bytes: right_bytes,
        },
    })
}

/// Decodes a pushed or fetched tracking frame: header, stereo pixel buffers,
/// then the per-eye keypoint arrays.
pub fn decode_tracking_frame(bytes: &[u8]) -> CodecResult<TrackingFrame> {
    let header = read_tracking_info_wire(bytes)?;
    let mut r = Cursor::new(bytes);
    r.set_position(tracking_info_header_len() as u64);

    let mut left_bytes = vec![0u8; header.left.data_size as usize];
    r.read_exact(&mut left_bytes)?;
    let mut right_bytes = vec![0u8; header.right.data_size as usize];
    r.read_exact(&mut right_bytes)?;

    let left_keypoints = (0..header.keypoints_left_count)
        .map(|_| read_keypoint_wire(&mut r).map(|k| keypoint_from_wire(&k)))
        .collect::<CodecResult<Vec<_>>>()?;
    let right_keypoints = (0..header.keypoints_right_count)
        .map(|_| read_keypoint_wire(&mut r).map(|k| keypoint_from_wire(&k)))
        .collect::<CodecResult<Vec<_>>>()?;

    Ok(TrackingFrame {
        timestamp_ns: header.timestamp_ns,
        left_image: ImageFrame {
            width: header.left.width,
            height: header.left.height,
            stride: header.left.stride,
            format: pixel_format_from_u32(header.left.format),
            timestamp_ns: header.timestamp_ns,
            bytes: left_bytes,
        },
        right_image: ImageFrame {
            width: header.right.width,
            height: header.right.height,
            stride: header.right.stride,
            format: pixel_format_from_u32(header.right.format),
            timestamp_ns: header.timestamp_ns,
            bytes: right_bytes,
        },
        left_keypoints,
        right_keypoints,
        pose: pose_se3_from_wire(&header.pose),
        tracking_status: TrackingStatus(header.tracking_status),
    })
}

/// Byte length of the fixed [`TrackingInfoWire`] header, used to seek past it
/// before reading the variable-size image/keypoint sections that trail it.
fn tracking_info_header_len() -> usize {
    8 + 2 * image_desc_wire_len() + 4 + 4 + pose_se3_wire_len() + 4 + 4
}

fn image_desc_wire_len() -> usize {
    4 * 5
}

fn pose_se3_wire_len() -> usize {
    8 * 7
}

/// Decodes a pushed or fetched single-layer LiDAR scan: header, capture
/// pose, then `scan_count` range points.
pub fn decode_lidar_scan(bytes: &[u8]) -> CodecResult<LidarScan> {
    const HEADER_LEN: usize = 8 + 4 + 8 + 4 + 4;
    let mut r = Cursor::new(bytes);
    let header = read_lidar_scan_header_wire(&bytes[..HEADER_LEN])?;
    r.set_position(HEADER_LEN as u64);
    let pose = read_pose_se3_wire(&mut r)?;
    let points = (0..header.scan_count)
        .map(|_| read_lidar_scan_point_wire(&mut r).map(|p| lidar_point_from_wire(&p)))
        .collect::<CodecResult<Vec<_>>>()?;
    Ok(LidarScan {
        timestamp_ns: header.timestamp_ns,
        layer_id: header.layer_id,
        bound_keyframe_id: header.binded_kf_id,
        delta_yaw: header.dyaw,
        points,
        capture_pose: pose_se3_from_wire(&pose),
    })
}

pub fn read_server_connection_info_wire(bytes: &[u8]) -> CodecResult<ServerConnectionInfoWire> {
    let mut r = Cursor::new(bytes);
    let mut connection_info = [ConnectionInfoWire {
        protocol_type: [0; 16],
        address: [0; 64],
        port: 0,
    }; 8];
    for slot in connection_info.iter_mut() {
        let protocol_type = read_array(&mut r)?;
        let address = read_array(&mut r)?;
        let port = r.read_u16::<LE>()?;
        *slot = ConnectionInfoWire {
            protocol_type,
            address,
            port,
        };
    }
    let count = r.read_u32::<LE>()?;
    Ok(ServerConnectionInfoWire {
        connection_info,
        count,
    })
}

pub fn endpoints_from_wire(w: &ServerConnectionInfoWire) -> Vec<DeviceEndpoint> {
    w.connection_info[..w.count as usize]
        .iter()
        .enumerate()
        .map(|(i, c)| DeviceEndpoint {
            name: format!("device-{i}"),
            options: vec![ConnectionOption {
                protocol: extract_string(&c.protocol_type),
                address: extract_string(&c.address),
                port: c.port,
            }],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_string_stops_at_nul() {
        let mut buf = [0u8; 8];
        buf[..5].copy_from_slice(b"abcde");
        assert_eq!(extract_string(&buf), "abcde");
    }

    #[test]
    fn extract_string_handles_fully_populated_field() {
        let buf = *b"abcdefgh";
        assert_eq!(extract_string(&buf), "abcdefgh");
    }

    #[test]
    fn device_basic_info_round_trip() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 32]);
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend_from_slice(&2u64.to_le_bytes());
        bytes.extend_from_slice(&2u64.to_le_bytes());
        bytes.extend_from_slice(&1000u64.to_le_bytes());

        let wire = read_device_basic_info_wire(&bytes).unwrap();
        let info = device_basic_info_from_wire(&wire, 42);
        assert!(info.supports_lidar());
        assert!(info.supports_comap());
        assert!(info.supports_enhanced_imaging());
        assert_eq!(info.device_uptime_us, 1000);
        assert_eq!(info.captured_at_ns, 42);
    }

    #[test]
    fn null_terminated_ids_stop_at_zero_and_respect_cap() {
        let mut bytes = Vec::new();
        for id in [10u64, 20, 30, 0, 999] {
            bytes.extend_from_slice(&id.to_le_bytes());
        }
        let mut r = Cursor::new(bytes.as_slice());
        let ids = read_null_terminated_ids(&mut r, 100).unwrap();
        assert_eq!(ids, vec![10, 20, 30]);
    }
}
