use super::pose::PoseSE3;

/// A single LiDAR range reading. `quality == 0` marks an invalid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LidarPoint {
    pub distance_m: f32,
    pub angle_rad: f32,
    pub quality: u8,
}

impl LidarPoint {
    pub fn is_valid(&self) -> bool {
        self.quality != 0
    }
}

/// A single-layer LiDAR scan. `points.len()` always equals the scan header's
/// reported count (invariant 3).
#[derive(Debug, Clone)]
pub struct LidarScan {
    pub timestamp_ns: u64,
    pub layer_id: i32,
    pub bound_keyframe_id: u64,
    /// Unit unspecified by the device; preserved verbatim, uninterpreted.
    pub delta_yaw: f32,
    pub points: Vec<LidarPoint>,
    pub capture_pose: PoseSE3,
}

impl LidarScan {
    /// All points' `angle_rad` fall within `[-pi, pi]`, as guaranteed by the device.
    pub fn angles_in_range(&self) -> bool {
        self.points
            .iter()
            .all(|p| p.angle_rad >= -std::f32::consts::PI && p.angle_rad <= std::f32::consts::PI)
    }
}
