/// A rigid-body pose as translation plus unit quaternion. The device's
/// canonical representation; all other pose shapes convert through this one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSE3 {
    pub translation: [f64; 3],
    /// `(qx, qy, qz, qw)`.
    pub quaternion: [f64; 4],
}

/// Translation plus roll/pitch/yaw in radians, derived from a [`PoseSE3`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseEuler {
    pub translation: [f64; 3],
    /// `(roll, pitch, yaw)` radians.
    pub rotation: [f64; 3],
}

impl PoseSE3 {
    pub const IDENTITY: PoseSE3 = PoseSE3 {
        translation: [0.0, 0.0, 0.0],
        quaternion: [0.0, 0.0, 0.0, 1.0],
    };

    pub fn to_euler(&self) -> PoseEuler {
        PoseEuler {
            translation: self.translation,
            rotation: quaternion_to_euler(self.quaternion),
        }
    }
}

impl PoseEuler {
    pub fn to_se3(&self) -> PoseSE3 {
        PoseSE3 {
            translation: self.translation,
            quaternion: euler_to_quaternion(self.rotation),
        }
    }
}

impl From<PoseSE3> for PoseEuler {
    fn from(pose: PoseSE3) -> Self {
        pose.to_euler()
    }
}

impl From<PoseEuler> for PoseSE3 {
    fn from(pose: PoseEuler) -> Self {
        pose.to_se3()
    }
}

/// Converts `(qx, qy, qz, qw)` to `(roll, pitch, yaw)` radians (ZYX convention).
pub fn quaternion_to_euler(q: [f64; 4]) -> [f64; 3] {
    let [x, y, z, w] = q;

    let sinr_cosp = 2.0 * (w * x + y * z);
    let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
    let roll = sinr_cosp.atan2(cosr_cosp);

    let sinp = 2.0 * (w * y - z * x);
    let pitch = if sinp.abs() >= 1.0 {
        std::f64::consts::FRAC_PI_2.copysign(sinp)
    } else {
        sinp.asin()
    };

    let siny_cosp = 2.0 * (w * z + x * y);
    let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
    let yaw = siny_cosp.atan2(cosy_cosp);

    [roll, pitch, yaw]
}

/// Converts `(roll, pitch, yaw)` radians back to a unit quaternion `(qx, qy, qz, qw)`.
pub fn euler_to_quaternion(rpy: [f64; 3]) -> [f64; 4] {
    let [roll, pitch, yaw] = rpy;

    let (sr, cr) = (roll * 0.5).sin_cos();
    let (sp, cp) = (pitch * 0.5).sin_cos();
    let (sy, cy) = (yaw * 0.5).sin_cos();

    let w = cr * cp * cy + sr * sp * sy;
    let x = sr * cp * cy - cr * sp * sy;
    let y = cr * sp * cy + sr * cp * sy;
    let z = cr * cp * sy - sr * sp * cy;

    [x, y, z, w]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_round_trips() {
        let euler = quaternion_to_euler(PoseSE3::IDENTITY.quaternion);
        assert_relative_eq!(euler[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(euler[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(euler[2], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn quaternion_euler_round_trip() {
        let q = [0.1825742, 0.3651484, 0.5477226, 0.7302967];
        let norm = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
        let q: Vec<f64> = q.iter().map(|v| v / norm).collect();
        let q = [q[0], q[1], q[2], q[3]];

        let rpy = quaternion_to_euler(q);
        let back = euler_to_quaternion(rpy);

        for i in 0..4 {
            assert_relative_eq!(q[i].abs(), back[i].abs(), epsilon = 1e-6);
        }
    }

    #[test]
    fn se3_euler_round_trip_preserves_translation() {
        let pose = PoseSE3 {
            translation: [1.0, -2.5, 3.25],
            quaternion: [0.0, 0.0, 0.0, 1.0],
        };
        let back = pose.to_euler().to_se3();
        assert_relative_eq!(back.translation[0], pose.translation[0]);
        assert_relative_eq!(back.translation[1], pose.translation[1]);
        assert_relative_eq!(back.translation[2], pose.translation[2]);
    }
}
