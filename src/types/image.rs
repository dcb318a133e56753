use super::pose::PoseSE3;

/// Pixel layout of an [`ImageFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Grayscale8,
    Rgb8,
    Rgba8,
    DepthFloat32,
    Point3DFloat32,
}

/// A single image buffer as handed back to the host: owned bytes, never an
/// alias into a Session-internal buffer.
#[derive(Debug, Clone)]
pub struct ImageFrame {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: PixelFormat,
    pub timestamp_ns: u64,
    pub bytes: Vec<u8>,
}

impl ImageFrame {
    /// Interprets [`PixelFormat::DepthFloat32`] bytes as per-pixel meters.
    /// Invalid depth is represented by the device as `0.0` or a non-finite value.
    pub fn depth_meters(&self) -> Option<Vec<f32>> {
        if self.format != PixelFormat::DepthFloat32 {
            return None;
        }
        Some(
            self.bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }

    /// Interprets [`PixelFormat::Point3DFloat32`] bytes as an organized cloud:
    /// one `(x, y, z)` triple per pixel position, in the device's native frame.
    /// No coordinate-convention transform is applied here or anywhere else in
    /// this crate.
    pub fn points3d(&self) -> Option<Vec<[f32; 3]>> {
        if self.format != PixelFormat::Point3DFloat32 {
            return None;
        }
        Some(
            self.bytes
                .chunks_exact(12)
                .map(|c| {
                    [
                        f32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                        f32::from_le_bytes([c[4], c[5], c[6], c[7]]),
                        f32::from_le_bytes([c[8], c[9], c[10], c[11]]),
                    ]
                })
                .collect(),
        )
    }
}

/// A timestamped stereo pair. `left.timestamp_ns == right.timestamp_ns` always.
#[derive(Debug, Clone)]
pub struct StereoImagePair {
    pub timestamp_ns: u64,
    pub is_stereo: bool,
    pub left: ImageFrame,
    pub right: ImageFrame,
}

/// A single tracked keypoint within a [`TrackingFrame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub matched: bool,
}

/// Opaque device-defined tracking state. The device documents no enum for
/// this value; the SDK neither decodes nor interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackingStatus(pub u32);

/// The freshest tracking snapshot: stereo images, per-eye keypoints, pose and status.
#[derive(Debug, Clone)]
pub struct TrackingFrame {
    pub timestamp_ns: u64,
    pub left_image: ImageFrame,
    pub right_image: ImageFrame,
    pub left_keypoints: Vec<Keypoint>,
    pub right_keypoints: Vec<Keypoint>,
    pub pose: PoseSE3,
    pub tracking_status: TrackingStatus,
}
