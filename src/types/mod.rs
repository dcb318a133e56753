//! Value types shared between the SDK and the device's wire protocol.
//!
//! Everything here is a plain owned value — no type in this module borrows
//! from Session-internal state. See `crate::protocol::wire` for the
//! fixed-layout records these are decoded from.

mod calibration;
mod device;
mod floor;
mod grid;
mod image;
mod imu;
mod lidar;
mod map;
mod pose;
mod recorder;
mod segmentation;

pub use calibration::*;
pub use device::*;
pub use floor::*;
pub use grid::*;
pub use image::*;
pub use imu::*;
pub use lidar::*;
pub use map::*;
pub use pose::*;
pub use recorder::*;
pub use segmentation::*;
