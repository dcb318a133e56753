/// A detected floor level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorDescriptor {
    pub floor_id: i32,
    pub typical_height_m: f32,
    pub confidence: f32,
}

/// Histogram shape backing [`crate::components::FloorDetector::detection_histogram`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorHistogramInfo {
    pub bin_width_m: f32,
    pub bin_height_start_m: f32,
    pub bin_total_count: i32,
}

/// A histogram info header plus one count per height bin.
#[derive(Debug, Clone)]
pub struct FloorHistogram {
    pub info: FloorHistogramInfo,
    pub values: Vec<f32>,
}
