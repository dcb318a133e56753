//! Depth and semantic-segmentation streams, plus their calibration/config queries.
//!
//! `peek_*_frame` follows the device's two-step probe-then-fetch protocol:
//! an empty-buffer call learns `data_size`, then a second call with an
//! allocated buffer fills it. This mirrors the device firmware's own
//! zero-copy contract and avoids over-allocating for frames the caller never
//! reads.

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;
use std::time::Duration;

use crate::error::Result;
use crate::protocol::codec::*;
use crate::protocol::CommandId;
use crate::session::Session;
use crate::types::{
    DepthCameraConfig, EnhancedImageType, ImageFrame, SemanticSegmentationConfig,
    SemanticSegmentationLabels,
};

/// Non-owning handle onto a [`Session`]'s depth and segmentation streams.
pub struct EnhancedImaging<'a> {
    session: &'a Session,
}

impl<'a> EnhancedImaging<'a> {
    pub fn new(session: &'a Session) -> EnhancedImaging<'a> {
        EnhancedImaging { session }
    }

    pub fn is_depth_camera_supported(&self) -> Result<bool> {
        Ok(self.device_info()?.supports_depth_camera())
    }

    pub fn is_depth_camera_ready(&self) -> bool {
        self.session.is_enhanced_imaging_subscribed(EnhancedImageType::DepthMap)
    }

    /// Blocks up to `timeout_ms` for the next depth-frame-ready push.
    pub fn wait_depth_camera_next_frame(&self, timeout_ms: u64) -> bool {
        self.session
            .stream_state()
            .wait_depth_frame(Duration::from_millis(timeout_ms))
    }

    /// `kind` selects `DepthMap` or `Point3D`. `None` when no frame has
    /// landed yet (`data_size == 0`).
    pub fn peek_depth_camera_frame(&self, kind: EnhancedImageType) -> Result<Option<ImageFrame>> {
        self.peek_two_step(CommandId::PeekDepthCameraFrame, enhanced_image_type_tag(kind))
    }

    pub fn peek_depth_camera_related_rectified_image(
        &self,
        timestamp_ns: u64,
    ) -> Result<Option<ImageFrame>> {
        self.peek_two_step_timestamped(
            CommandId::PeekDepthCameraFrame,
            enhanced_image_type_tag(EnhancedImageType::DepthMap),
            timestamp_ns,
        )
    }

    pub fn depth_camera_config(&self) -> Result<DepthCameraConfig> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchDepthCameraConfig, &[], None))?;
        Ok(depth_camera_config_from_wire(&read_depthcam_config_wire(&resp.payload)?))
    }

    pub fn is_semantic_segmentation_supported(&self) -> Result<bool> {
        Ok(self.device_info()?.supports_semantic_segmentation())
    }

    pub fn is_semantic_segmentation_ready(&self) -> bool {
        self.session.is_enhanced_imaging_subscribed(EnhancedImageType::Segmentation)
    }

    pub fn wait_semantic_segmentation_next_frame(&self, timeout_ms: u64) -> bool {
        self.session
            .stream_state()
            .wait_segmentation_frame(Duration::from_millis(timeout_ms))
    }

    /// Pixel bytes are per-pixel class IDs, not a displayable color image.
    pub fn peek_semantic_segmentation_frame(&self) -> Result<Option<ImageFrame>> {
        self.peek_two_step(
            CommandId::PeekSemanticSegmentationFrame,
            enhanced_image_type_tag(EnhancedImageType::Segmentation),
        )
    }

    pub fn semantic_segmentation_config(&self) -> Result<SemanticSegmentationConfig> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchSemanticSegmentationConfig, &[], None))?;
        Ok(semantic_segmentation_config_from_wire(
            &read_semantic_segmentation_config_wire(&resp.payload)?,
        ))
    }

    pub fn semantic_segmentation_labels(&self) -> Result<SemanticSegmentationLabels> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchSemanticSegmentationLabels, &[], None))?;
        let mut r = Cursor::new(&resp.payload);
        let label_set_name = read_length_prefixed_string(&mut r)?;
        let count = r.read_u32::<LE>()? as usize;
        let label_names = (0..count.min(256))
            .map(|_| read_length_prefixed_string(&mut r))
            .collect::<Result<Vec<_>>>()?;
        Ok(SemanticSegmentationLabels { label_set_name, label_names })
    }

    pub fn semantic_segmentation_label_set_name(&self) -> Result<String> {
        Ok(self.semantic_segmentation_labels()?.label_set_name)
    }

    pub fn is_semantic_segmentation_alternative_model(&self) -> Result<bool> {
        Ok(self.semantic_segmentation_config()?.model_type != 0)
    }

    /// Projects the segmentation frame's class IDs into the depth camera's
    /// image plane. Returns `(aligned_bytes, aligned_w, aligned_h)`; the
    /// alignment itself is device-side, so this is a thin request/response
    /// wrapper, not a local reprojection.
    pub fn calc_depth_camera_aligned_segmentation_map(
        &self,
        seg_frame: &ImageFrame,
    ) -> Result<(Vec<u8>, u32, u32)> {
        let mut payload = Vec::with_capacity(12 + seg_frame.bytes.len());
        payload.write_u32::<LE>(seg_frame.width)?;
        payload.write_u32::<LE>(seg_frame.height)?;
        payload.write_u32::<LE>(seg_frame.bytes.len() as u32)?;
        payload.extend_from_slice(&seg_frame.bytes);
        let resp = self.session.with_transport(|t| {
            t.request(CommandId::CalcDepthCameraAlignedSegmentationMap, &payload, None)
        })?;
        let mut r = Cursor::new(&resp.payload);
        let w = r.read_u32::<LE>()?;
        let h = r.read_u32::<LE>()?;
        let mut bytes = vec![0u8; (w as usize) * (h as usize)];
        std::io::Read::read_exact(&mut r, &mut bytes)?;
        Ok((bytes, w, h))
    }

    fn device_info(&self) -> Result<crate::types::DeviceBasicInfo> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::FetchDeviceBasicInfo, &[], None))?;
        let wire = read_device_basic_info_wire(&resp.payload)?;
        Ok(device_basic_info_from_wire(&wire, 0))
    }

    /// Probe call with `buffer_size=0` learns `data_size`; if nonzero, a
    /// second call actually fetches the bytes.
    fn peek_two_step(&self, cmd: CommandId, type_tag: u8) -> Result<Option<ImageFrame>> {
        self.peek_two_step_timestamped(cmd, type_tag, 0)
    }

    fn peek_two_step_timestamped(
        &self,
        cmd: CommandId,
        type_tag: u8,
        timestamp_ns: u64,
    ) -> Result<Option<ImageFrame>> {
        let probe_payload = encode_peek_request(type_tag, timestamp_ns, 0);
        let probe = self
            .session
            .with_transport(|t| t.request(cmd, &probe_payload, None))?;
        let desc = read_image_desc_wire(&mut Cursor::new(&probe.payload))?;
        if desc.data_size == 0 {
            return Ok(None);
        }

        let fetch_payload = encode_peek_request(type_tag, timestamp_ns, desc.data_size);
        let resp = self
            .session
            .with_transport(|t| t.request(cmd, &fetch_payload, None))?;
        let mut r = Cursor::new(&resp.payload);
        Ok(Some(read_image_frame(&mut r, timestamp_ns)?))
    }
}

fn enhanced_image_type_tag(image_type: EnhancedImageType) -> u8 {
    match image_type {
        EnhancedImageType::DepthMap => 0,
        EnhancedImageType::Point3D => 1,
        EnhancedImageType::Segmentation => 2,
    }
}

fn encode_peek_request(type_tag: u8, timestamp_ns: u64, buffer_size: u32) -> Vec<u8> {
    let mut payload = Vec::with_capacity(13);
    payload.push(type_tag);
    payload.extend_from_slice(&timestamp_ns.to_le_bytes());
    payload.extend_from_slice(&buffer_size.to_le_bytes());
    payload
}

fn read_length_prefixed_string(r: &mut Cursor<&Vec<u8>>) -> Result<String> {
    let len = r.read_u32::<LE>()? as usize;
    let mut bytes = vec![0u8; len];
    std::io::Read::read_exact(r, &mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).trim_end_matches('\0').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn is_depth_camera_supported_without_a_transport_is_not_connected() {
        let session = Session::new();
        let imaging = EnhancedImaging::new(&session);
        assert!(matches!(
            imaging.is_depth_camera_supported(),
            Err(Error::NotConnected)
        ));
    }

    #[test]
    fn depth_camera_not_ready_until_subscribed() {
        let session = Session::new();
        let imaging = EnhancedImaging::new(&session);
        assert!(!imaging.is_depth_camera_ready());
        session.set_enhanced_imaging_subscription(EnhancedImageType::DepthMap, true);
        assert!(imaging.is_depth_camera_ready());
    }

    #[test]
    fn semantic_segmentation_not_ready_until_subscribed() {
        let session = Session::new();
        let imaging = EnhancedImaging::new(&session);
        assert!(!imaging.is_semantic_segmentation_ready());
        session.set_enhanced_imaging_subscription(EnhancedImageType::Segmentation, true);
        assert!(imaging.is_semantic_segmentation_ready());
    }

    #[test]
    fn enhanced_image_type_tags_match_the_controller_s_encoding() {
        assert_eq!(enhanced_image_type_tag(EnhancedImageType::DepthMap), 0);
        assert_eq!(enhanced_image_type_tag(EnhancedImageType::Point3D), 1);
        assert_eq!(enhanced_image_type_tag(EnhancedImageType::Segmentation), 2);
    }

    #[test]
    fn peek_request_encodes_tag_timestamp_and_buffer_size() {
        let payload = encode_peek_request(2, 0x0102030405060708, 64);
        assert_eq!(payload.len(), 13);
        assert_eq!(payload[0], 2);
        assert_eq!(&payload[1..9], &0x0102030405060708u64.to_le_bytes());
        assert_eq!(&payload[9..13], &64u32.to_le_bytes());
    }
}
