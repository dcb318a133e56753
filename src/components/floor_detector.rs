//! Multi-floor detection: height histogram and per-floor descriptors.

use byteorder::{LittleEndian as LE, WriteBytesExt};
use std::io::Cursor;

use crate::error::Result;
use crate::protocol::codec::*;
use crate::protocol::CommandId;
use crate::session::Session;
use crate::types::{FloorDescriptor, FloorHistogram};

/// Non-owning handle onto a [`Session`]'s floor-detection queries.
pub struct FloorDetector<'a> {
    session: &'a Session,
}

impl<'a> FloorDetector<'a> {
    pub fn new(session: &'a Session) -> FloorDetector<'a> {
        FloorDetector { session }
    }

    /// Per-height-bin sample counts.
    pub fn detection_histogram(&self) -> Result<FloorHistogram> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchFloorDetectionHistogram, &[], None))?;
        let mut r = Cursor::new(&resp.payload);
        const INFO_LEN: usize = 4 + 4 + 4;
        let mut header = [0u8; INFO_LEN];
        std::io::Read::read_exact(&mut r, &mut header)?;
        let info_wire = read_floor_histogram_info_wire(&header)?;
        let info = floor_histogram_info_from_wire(&info_wire);
        let bin_count = info.bin_total_count.max(0) as usize;
        let mut values = Vec::with_capacity(bin_count);
        for _ in 0..bin_count {
            values.push(byteorder::ReadBytesExt::read_f32::<LE>(&mut r)?);
        }
        Ok(FloorHistogram { info, values })
    }

    /// All detected floors (capped at `max_floors`) plus the current floor id.
    pub fn all_detection_info(&self, max_floors: usize) -> Result<(Vec<FloorDescriptor>, i32)> {
        let mut payload = Vec::with_capacity(4);
        payload.write_u32::<LE>(max_floors as u32)?;
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchAllFloorDetectionInfo, &payload, None))?;
        let mut r = Cursor::new(&resp.payload);
        let current_floor_id = byteorder::ReadBytesExt::read_i32::<LE>(&mut r)?;
        let count = (byteorder::ReadBytesExt::read_u32::<LE>(&mut r)? as usize).min(max_floors);
        const DESC_LEN: usize = 4 + 4 + 4;
        let mut floors = Vec::with_capacity(count);
        for _ in 0..count {
            let mut header = [0u8; DESC_LEN];
            std::io::Read::read_exact(&mut r, &mut header)?;
            floors.push(floor_descriptor_from_wire(&read_floor_detection_desc_wire(&header)?));
        }
        Ok((floors, current_floor_id))
    }

    /// Currently occupied floor's descriptor.
    pub fn current_detection_desc(&self) -> Result<FloorDescriptor> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchCurrentFloorDetectionDesc, &[], None))?;
        Ok(floor_descriptor_from_wire(&read_floor_detection_desc_wire(&resp.payload)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn detection_histogram_without_a_transport_is_not_connected() {
        let session = Session::new();
        let detector = FloorDetector::new(&session);
        assert!(matches!(
            detector.detection_histogram(),
            Err(Error::NotConnected)
        ));
    }

    #[test]
    fn all_detection_info_without_a_transport_is_not_connected() {
        let session = Session::new();
        let detector = FloorDetector::new(&session);
        assert!(matches!(
            detector.all_detection_info(8),
            Err(Error::NotConnected)
        ));
    }

    #[test]
    fn current_detection_desc_without_a_transport_is_not_connected() {
        let session = Session::new();
        let detector = FloorDetector::new(&session);
        assert!(matches!(
            detector.current_detection_desc(),
            Err(Error::NotConnected)
        ));
    }
}
