use super::pose::PoseSE3;

/// A single IMU burst sample. Acceleration in g, angular rate in deg/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    pub timestamp_ns: u64,
    pub imu_id: u32,
    pub acc: [f64; 3],
    pub gyro: [f64; 3],
}

/// Static IMU calibration and noise model, as reported once per connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuCalibrationInfo {
    pub valid: bool,
    pub t_base_to_camera: PoseSE3,
    pub t_camera_to_imu: PoseSE3,
    pub cov_noise: [f64; 6],
    pub cov_random_walk: [f64; 6],
}
