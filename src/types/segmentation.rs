/// Semantic-segmentation model metadata, as reported by the device.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticSegmentationConfig {
    pub model_type: i32,
    pub class_count: i32,
    pub model_name: String,
    pub version: String,
    pub input_width: i32,
    pub input_height: i32,
    pub output_width: i32,
    pub output_height: i32,
}

/// A label set name plus one human-readable name per class (up to 256 classes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticSegmentationLabels {
    pub label_set_name: String,
    pub label_names: Vec<String>,
}

/// Depth-camera stream configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthCameraConfig {
    pub fps: f32,
    pub frame_skip: i32,
    pub image_width: i32,
    pub image_height: i32,
    pub bound_camera_id: i32,
}

/// Which enhanced-imaging stream a subscription toggle or peek targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancedImageType {
    DepthMap,
    Point3D,
    Segmentation,
}
