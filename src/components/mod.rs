//! The seven public-facing components. Each is a zero-size, non-owning
//! reference onto a [`crate::Session`] — no component implements a shared
//! base trait; they are plain structs, per the crate's flat façade design.

mod controller;
mod data_provider;
mod data_recorder;
mod enhanced_imaging;
mod floor_detector;
mod lidar_map_builder;
mod map_manager;

pub use controller::Controller;
pub use data_provider::DataProvider;
pub use data_recorder::DataRecorder;
pub use enhanced_imaging::EnhancedImaging;
pub use floor_detector::FloorDetector;
pub use lidar_map_builder::LidarMapBuilder;
pub use map_manager::MapManager;

pub(crate) use data_recorder::RecorderActivity;
