//! # aurora-sdk - client SDK for a remote visual-inertial SLAM device
//!
//! Connects to a device over TCP and exposes its sensor streams (pose,
//! stereo camera preview, tracking frames, LiDAR scans, IMU bursts, depth
//! and semantic-segmentation frames) and control surface (relocalization,
//! mode switches, map storage, dataset recording) through seven
//! non-owning, component-style façades onto a single [`Session`].
//!
//! ## Quick start
//! ```no_run
//! use aurora_sdk::Session;
//!
//! let session = Session::new();
//! session.controller().connect("192.168.1.50").unwrap();
//!
//! let (pose, _euler, ts) = session.data_provider().current_pose(true).unwrap();
//! println!("pose at {}: {:?}", ts, pose.translation);
//!
//! session.controller().disconnect();
//! ```

pub mod components;
pub mod config;
pub mod error;
pub mod ffi;
pub mod protocol;
pub mod session;
pub mod streams;
pub mod transport;
pub mod types;

pub use error::Error;
pub use session::Session;

/// Result type alias for aurora-sdk operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Session {
    /// Connection lifecycle, subscriptions, mode/command dispatch.
    pub fn controller(&self) -> components::Controller<'_> {
        components::Controller::new(self)
    }

    /// Read-only accessor for live streams and on-demand device queries.
    pub fn data_provider(&self) -> components::DataProvider<'_> {
        components::DataProvider::new(self)
    }

    /// Asynchronous map upload/download sessions.
    pub fn map_manager(&self) -> components::MapManager<'_> {
        components::MapManager::new(self)
    }

    /// 2D occupancy-grid preview and on-demand full-map synthesis.
    pub fn lidar_map_builder(&self) -> components::LidarMapBuilder<'_> {
        components::LidarMapBuilder::new(self)
    }

    /// Multi-floor histogram and descriptors.
    pub fn floor_detector(&self) -> components::FloorDetector<'_> {
        components::FloorDetector::new(self)
    }

    /// Depth and semantic-segmentation streams, calibration.
    pub fn enhanced_imaging(&self) -> components::EnhancedImaging<'_> {
        components::EnhancedImaging::new(self)
    }

    /// On-device dataset recording (raw, COLMAP).
    pub fn data_recorder(&self) -> components::DataRecorder<'_> {
        components::DataRecorder::new(self, &self.recorder_activity)
    }
}
