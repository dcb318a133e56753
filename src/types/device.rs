bitflags::bitflags! {
    /// Hardware capability bits reported by [`DeviceBasicInfo::hw_features`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HwFeatures: u64 {
        const LIDAR = 1 << 0;
        const IMU = 1 << 1;
        const STEREO_CAMERA = 1 << 2;
    }
}

bitflags::bitflags! {
    /// Sensing-pipeline capability bits reported by [`DeviceBasicInfo::sensing_features`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SensingFeatures: u64 {
        const VSLAM = 1 << 0;
        const COMAP = 1 << 1;
        const STEREO_DENSE_DISPARITY = 1 << 2;
        const SEMANTIC_SEGMENTATION = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Software-layer capability bits reported by [`DeviceBasicInfo::sw_features`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SwFeatures: u64 {
        const CAMERA_PREVIEW_STREAM = 1 << 0;
        const ENHANCED_IMAGING = 1 << 1;
    }
}

/// A single `(protocol, address, port)` connection option for a discovered device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOption {
    pub protocol: String,
    pub address: String,
    pub port: u16,
}

/// A discovered device: a human name plus one or more connection options.
/// Immutable after discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    pub name: String,
    pub options: Vec<ConnectionOption>,
}

/// Model numbers, firmware strings, serial number, uptime, and the three
/// feature bitmaps, as refreshed from the device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceBasicInfo {
    pub model_major: u16,
    pub model_sub: u16,
    pub model_revision: u16,
    pub firmware_version_string: String,
    pub firmware_build_date: String,
    pub firmware_build_time: String,
    pub serial_number: [u8; 16],
    pub device_name: String,
    pub hw_features: HwFeatures,
    pub sensing_features: SensingFeatures,
    pub sw_features: SwFeatures,
    pub device_uptime_us: u64,
    pub captured_at_ns: u64,
}

impl DeviceBasicInfo {
    pub fn supports_lidar(&self) -> bool {
        self.hw_features.contains(HwFeatures::LIDAR)
    }

    pub fn supports_imu(&self) -> bool {
        self.hw_features.contains(HwFeatures::IMU)
    }

    pub fn supports_stereo_camera(&self) -> bool {
        self.hw_features.contains(HwFeatures::STEREO_CAMERA)
    }

    pub fn supports_vslam(&self) -> bool {
        self.sensing_features.contains(SensingFeatures::VSLAM)
    }

    pub fn supports_comap(&self) -> bool {
        self.sensing_features.contains(SensingFeatures::COMAP)
    }

    pub fn supports_depth_camera(&self) -> bool {
        self.sensing_features
            .contains(SensingFeatures::STEREO_DENSE_DISPARITY)
    }

    pub fn supports_semantic_segmentation(&self) -> bool {
        self.sensing_features
            .contains(SensingFeatures::SEMANTIC_SEGMENTATION)
    }

    pub fn supports_camera_preview_stream(&self) -> bool {
        self.sw_features.contains(SwFeatures::CAMERA_PREVIEW_STREAM)
    }

    pub fn supports_enhanced_imaging(&self) -> bool {
        self.sw_features.contains(SwFeatures::ENHANCED_IMAGING)
    }

    /// `"A{major}M{sub}"`, suffixed `"-r{revision}"` when nonzero; special-cased
    /// to `"A1M1"` when both model numbers are zero.
    pub fn device_model_string(&self) -> String {
        if self.model_major == 0 && self.model_sub == 0 {
            return "A1M1".to_string();
        }
        let base = format!("A{}M{}", self.model_major, self.model_sub);
        if self.model_revision != 0 {
            format!("{}-r{}", base, self.model_revision)
        } else {
            base
        }
    }

    /// Hex-encodes the raw serial number, trimming trailing zero bytes.
    pub fn serial_number_hex(&self) -> String {
        let mut end = self.serial_number.len();
        while end > 0 && self.serial_number[end - 1] == 0 {
            end -= 1;
        }
        self.serial_number[..end]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

/// Device health telemetry snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceStatus {
    pub device_state: u32,
    pub battery_level: f32,
    pub temperature: f32,
    pub cpu_usage: f32,
    pub memory_usage: f32,
    pub tracking_quality: u32,
    pub error_flags: u32,
}

/// Outcome of `Controller::get_last_relocalization_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocalizationOutcome {
    None,
    InProgress,
    Succeeded,
    Failed,
}

/// Richer relocalization progress snapshot backing
/// [`crate::components::DataProvider::relocalization_status`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelocalizationStatus {
    pub is_active: bool,
    pub progress_pct: f32,
    pub confidence: f32,
    pub match_count: u32,
    pub time_elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_with(hw: HwFeatures, sensing: SensingFeatures, sw: SwFeatures) -> DeviceBasicInfo {
        DeviceBasicInfo {
            model_major: 2,
            model_sub: 0,
            model_revision: 0,
            firmware_version_string: String::new(),
            firmware_build_date: String::new(),
            firmware_build_time: String::new(),
            serial_number: [0; 16],
            device_name: String::new(),
            hw_features: hw,
            sensing_features: sensing,
            sw_features: sw,
            device_uptime_us: 0,
            captured_at_ns: 0,
        }
    }

    #[test]
    fn capability_queries_are_pure_functions_of_bitmaps() {
        let info = info_with(
            HwFeatures::LIDAR | HwFeatures::IMU,
            SensingFeatures::VSLAM | SensingFeatures::STEREO_DENSE_DISPARITY,
            SwFeatures::ENHANCED_IMAGING,
        );
        assert!(info.supports_lidar());
        assert!(info.supports_imu());
        assert!(!info.supports_stereo_camera());
        assert!(info.supports_vslam());
        assert!(!info.supports_comap());
        assert!(info.supports_depth_camera());
        assert!(!info.supports_semantic_segmentation());
        assert!(!info.supports_camera_preview_stream());
        assert!(info.supports_enhanced_imaging());
    }

    #[test]
    fn device_model_string_zero_special_case() {
        let mut info = info_with(HwFeatures::empty(), SensingFeatures::empty(), SwFeatures::empty());
        info.model_major = 0;
        info.model_sub = 0;
        assert_eq!(info.device_model_string(), "A1M1");
    }

    #[test]
    fn device_model_string_with_revision() {
        let mut info = info_with(HwFeatures::empty(), SensingFeatures::empty(), SwFeatures::empty());
        info.model_major = 2;
        info.model_sub = 1;
        info.model_revision = 3;
        assert_eq!(info.device_model_string(), "A2M1-r3");
    }

    #[test]
    fn serial_number_hex_trims_trailing_zeros() {
        let mut info = info_with(HwFeatures::empty(), SensingFeatures::empty(), SwFeatures::empty());
        info.serial_number = [0xAB, 0xCD, 0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(info.serial_number_hex(), "abcd01");
    }
}
