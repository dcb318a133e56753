use super::pose::{PoseEuler, PoseSE3};

bitflags::bitflags! {
    /// Keyframe status bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyframeFlags: u32 {
        const BAD = 1 << 0;
        const FIXED = 1 << 1;
    }
}

/// A 3D landmark observed across keyframes. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPoint {
    pub id: u64,
    pub map_id: u32,
    pub timestamp: f64,
    pub position: [f32; 3],
    pub flags: u32,
}

/// A selected pose+image sample used as a graph node in SLAM.
///
/// `looped_frame_ids` only ever references keyframe IDs that are, or have
/// been, present in the same map (invariant 5): a pruned partner in a loop
/// pair is dropped by the caller, not by this type.
#[derive(Debug, Clone)]
pub struct Keyframe {
    pub id: u64,
    pub parent_id: u64,
    pub map_id: u32,
    pub timestamp: f64,
    pub pose_se3: PoseSE3,
    pub pose_euler: PoseEuler,
    pub looped_frame_ids: Vec<u64>,
    pub connected_frame_ids: Vec<u64>,
    pub flags: KeyframeFlags,
}

/// A detected revisit of a prior place, connecting two keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopClosure {
    pub keyframe_id: u64,
    pub looped_keyframe_id: u64,
}

/// Per-map aggregate counts and ID ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapDescriptor {
    pub map_id: u64,
    pub map_flags: u32,
    pub keyframe_count: u64,
    pub map_point_count: u64,
    pub keyframe_id_start: u64,
    pub keyframe_id_end: u64,
    pub map_point_id_start: u64,
    pub map_point_id_end: u64,
}

/// Global sync-progress snapshot backing [`crate::components::DataProvider::global_mapping_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlobalMapDesc {
    pub last_map_point_count_to_fetch: u64,
    pub last_keyframe_count_to_fetch: u64,
    pub last_map_count_to_fetch: u64,
    pub last_map_point_retrieved: u64,
    pub last_keyframe_retrieved: u64,
    pub total_map_point_count: u64,
    pub total_keyframe_count: u64,
    pub total_map_count: u64,
    pub total_map_point_count_fetched: u64,
    pub total_keyframe_count_fetched: u64,
    pub total_map_count_fetched: u64,
    pub current_active_map_point_count: u64,
    pub current_active_keyframe_count: u64,
    pub active_map_id: u32,
    pub mapping_flags: u32,
    pub sliding_window_start_keyframe_id: u64,
}

impl GlobalMapDesc {
    /// `fetched / total`, with `total == 0` yielding `0.0` (invariant 6).
    pub fn sync_ratio(&self) -> f64 {
        if self.total_keyframe_count == 0 {
            0.0
        } else {
            self.total_keyframe_count_fetched as f64 / self.total_keyframe_count as f64
        }
    }
}

/// Result of a [`crate::components::DataProvider::map_data`] pull.
#[derive(Debug, Clone, Default)]
pub struct MapData {
    pub map_points: Vec<MapPoint>,
    pub keyframes: Vec<Keyframe>,
    pub loop_closures: Vec<LoopClosure>,
    pub map_info: Vec<MapDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_ratio_zero_total_is_zero() {
        let desc = GlobalMapDesc::default();
        assert_eq!(desc.sync_ratio(), 0.0);
    }

    #[test]
    fn sync_ratio_is_fetched_over_total() {
        let desc = GlobalMapDesc {
            total_keyframe_count: 200,
            total_keyframe_count_fetched: 50,
            ..Default::default()
        };
        assert_eq!(desc.sync_ratio(), 0.25);
    }
}
