//! Fixed-layout records matching the device's wire protocol verbatim.
//!
//! Field order and explicit padding here mirror the device's native struct
//! layout; do not reorder fields even when it looks redundant in Rust.

/// `(protocol[16], address[64], port:u16)`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ConnectionInfoWire {
    pub protocol_type: [u8; 16],
    pub address: [u8; 64],
    pub port: u16,
}

/// Up to 8 [`ConnectionInfoWire`] entries plus a count, backing `discover()`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ServerConnectionInfoWire {
    pub connection_info: [ConnectionInfoWire; 8],
    pub count: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DeviceBasicInfoWire {
    pub model_major: u16,
    pub model_sub: u16,
    pub model_revision: u16,
    pub firmware_version_string: [u8; 32],
    pub firmware_build_date: [u8; 16],
    pub firmware_build_time: [u8; 16],
    pub device_sn: [u8; 16],
    pub device_name: [u8; 16],
    pub hwfeature_bitmaps: u64,
    pub sensing_feature_bitmaps: u64,
    pub swfeature_bitmaps: u64,
    pub device_uptime_us: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PoseSE3Wire {
    pub translation: [f64; 3],
    pub quaternion: [f64; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PoseEulerWire {
    pub translation: [f64; 3],
    pub rotation: [f64; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ImageDescWire {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: u32,
    pub data_size: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StereoImagePairDescWire {
    pub timestamp_ns: u64,
    pub is_stereo: u32,
    pub left: ImageDescWire,
    pub right: ImageDescWire,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeypointWire {
    pub x: f32,
    pub y: f32,
    pub flags: u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TrackingInfoWire {
    pub timestamp_ns: u64,
    pub left: ImageDescWire,
    pub right: ImageDescWire,
    pub is_stereo: u32,
    pub tracking_status: u32,
    pub pose: PoseSE3Wire,
    pub keypoints_left_count: u32,
    pub keypoints_right_count: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LidarScanPointWire {
    pub dist: f32,
    pub angle: f32,
    pub quality: u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LidarSinglelayerScanDataInfoWire {
    pub timestamp_ns: u64,
    pub layer_id: i32,
    pub binded_kf_id: u64,
    pub dyaw: f32,
    pub scan_count: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MapPointDescWire {
    pub id: u64,
    pub map_id: u32,
    pub _padding1: u32,
    pub timestamp: f64,
    pub position: [f32; 3],
    pub flags: u32,
    pub _padding2: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KeyframeDescWire {
    pub id: u64,
    pub parent_id: u64,
    pub map_id: u32,
    pub _padding1: u32,
    pub timestamp: f64,
    pub pose_se3: PoseSE3Wire,
    pub pose: PoseEulerWire,
    pub looped_frame_count: u64,
    pub connected_frame_count: u64,
    pub flags: u32,
    pub _padding2: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MapDescWire {
    pub map_id: u64,
    pub map_flags: u32,
    pub _padding1: u32,
    pub keyframe_count: u64,
    pub map_point_count: u64,
    pub keyframe_id_start: u64,
    pub keyframe_id_end: u64,
    pub map_point_id_start: u64,
    pub map_point_id_end: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GlobalMapDescWire {
    pub last_mp_count_to_fetch: u64,
    pub last_kf_count_to_fetch: u64,
    pub last_map_count_to_fetch: u64,
    pub last_mp_retrieved: u64,
    pub last_kf_retrieved: u64,
    pub total_mp_count: u64,
    pub total_kf_count: u64,
    pub total_map_count: u64,
    pub total_mp_count_fetched: u64,
    pub total_kf_count_fetched: u64,
    pub total_map_count_fetched: u64,
    pub current_active_mp_count: u64,
    pub current_active_kf_count: u64,
    pub active_map_id: u32,
    pub mapping_flags: u32,
    pub sliding_window_start_kf_id: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct GridMap2DDimensionWire {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RectWire {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GridMapGenerationOptionsWire {
    pub resolution: f32,
    pub map_canvas_width: f32,
    pub map_canvas_height: f32,
    pub active_map_only: i32,
    pub height_range_specified: i32,
    pub min_height: f32,
    pub max_height: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct GridMap2DFetchInfoWire {
    pub real_x: f32,
    pub real_y: f32,
    pub cell_width: i32,
    pub cell_height: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FloorDetectionDescWire {
    pub floor_id: i32,
    pub typical_height: f32,
    pub confidence: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FloorDetectionHistogramInfoWire {
    pub bin_width: f32,
    pub bin_height_start: f32,
    pub bin_total_count: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SingleCameraCalibrationWire {
    pub len_type: u32,
    pub color_mode: u32,
    pub width: i32,
    pub height: i32,
    pub fps: i32,
    pub intrinsics: [f32; 4],
    pub distortion: [f32; 5],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ExtCameraTransformWire {
    pub t_c2_c1: [f32; 16],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CameraCalibrationInfoWire {
    pub camera_type: u32,
    pub camera_calibration: [SingleCameraCalibrationWire; 4],
    pub ext_camera_transform: [ExtCameraTransformWire; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TransformCalibrationInfoWire {
    pub t_base_cam: PoseSE3Wire,
    pub t_camera_imu: PoseSE3Wire,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SemanticSegmentationConfigWire {
    pub model_type: i32,
    pub class_count: i32,
    pub model_name: [u8; 64],
    pub version: [u8; 32],
    pub input_width: i32,
    pub input_height: i32,
    pub output_width: i32,
    pub output_height: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct EnhancedImagingFrameDescWire {
    pub timestamp_ns: u64,
    pub image_desc: ImageDescWire,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DepthcamConfigInfoWire {
    pub fps: f32,
    pub frame_skip: i32,
    pub image_width: i32,
    pub image_height: i32,
    pub binded_cam_id: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ImuDataWire {
    pub timestamp_ns: u64,
    pub imu_id: u32,
    pub acc: [f64; 3],
    pub gyro: [f64; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ImuInfoWire {
    pub valid: i32,
    pub tcb: PoseSE3Wire,
    pub tc_imu: PoseSE3Wire,
    pub cov_noise: [f64; 6],
    pub cov_random_walk: [f64; 6],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DeviceStatusWire {
    pub device_state: u32,
    pub battery_level: f32,
    pub temperature: f32,
    pub cpu_usage: f32,
    pub memory_usage: f32,
    pub tracking_quality: u32,
    pub error_flags: u32,
    pub reserved: [u8; 32],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RelocalizationStatusWire {
    pub is_relocalization_active: i32,
    pub relocalization_progress: f32,
    pub confidence_score: f32,
    pub match_count: u32,
    pub time_elapsed_ms: u64,
    pub reserved: [u8; 16],
}
