//! Connection lifecycle, subscriptions, mode/command dispatch.
//!
//! The only component that mutates connection state. All mutating calls
//! serialize through [`crate::session::Session::controller_lock`] — no two
//! `Controller` operations execute concurrently against one Session.

use std::io::Write;
use std::time::Duration;

use byteorder::{LittleEndian as LE, WriteBytesExt};

use crate::error::{Error, Result};
use crate::protocol::CommandId;
use crate::session::{ConnectTarget, Session};
use crate::transport;
use crate::types::{DeviceEndpoint, EnhancedImageType, PoseSE3, RelocalizationOutcome};

/// Non-owning handle onto a [`Session`]'s connection and control surface.
pub struct Controller<'a> {
    session: &'a Session,
}

impl<'a> Controller<'a> {
    pub fn new(session: &'a Session) -> Controller<'a> {
        Controller { session }
    }

    /// Passive network discovery. Never fails on zero discoveries.
    pub fn discover(&self, timeout: Duration) -> Result<Vec<DeviceEndpoint>> {
        transport::discover(timeout)
    }

    /// Fails with [`Error::AlreadyConnected`] if a transport already exists.
    pub fn connect(&self, target: impl Into<ConnectTarget>) -> Result<()> {
        let _guard = self.session.controller_lock.lock();
        self.session.connect(target)
    }

    /// Idempotent; always safe.
    pub fn disconnect(&self) {
        let _guard = self.session.controller_lock.lock();
        self.session.disconnect();
    }

    /// Reflects local connect intent, not device liveness.
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Probes the transport for liveness.
    pub fn is_device_connection_alive(&self) -> bool {
        self.session.is_device_connection_alive()
    }

    /// Toggles the device→client map snapshot stream. Must be enabled before
    /// `MapManager` or `LidarMapBuilder::generate_fullmap_on_demand` yields
    /// useful data.
    pub fn enable_map_data_syncing(&self, on: bool) -> Result<()> {
        let _guard = self.session.controller_lock.lock();
        self.send_bool_command(CommandId::EnableMapDataSyncing, on)?;
        self.session.set_map_data_syncing(on);
        Ok(())
    }

    pub fn is_map_data_syncing(&self) -> bool {
        self.session.is_map_data_syncing()
    }

    pub fn enable_raw_data_subscription(&self, on: bool) -> Result<()> {
        let _guard = self.session.controller_lock.lock();
        self.send_bool_command(CommandId::EnableRawDataSubscription, on)?;
        self.session.set_raw_data_subscription(on);
        Ok(())
    }

    pub fn is_raw_data_subscribed(&self) -> bool {
        self.session.is_raw_data_subscribed()
    }

    /// Per-type (depth / segmentation) enhanced-imaging subscription toggle.
    /// Must be called after `connect`.
    pub fn set_enhanced_imaging_subscription(
        &self,
        image_type: EnhancedImageType,
        on: bool,
    ) -> Result<()> {
        let _guard = self.session.controller_lock.lock();
        if !self.session.is_connected() {
            return Err(Error::NotConnected);
        }
        let mut payload = Vec::with_capacity(2);
        payload.write_u8(enhanced_image_type_tag(image_type))?;
        payload.write_u8(on as u8)?;
        self.session
            .with_transport(|t| t.request(CommandId::SetEnhancedImagingSubscription, &payload, None))?;
        self.session.set_enhanced_imaging_subscription(image_type, on);
        Ok(())
    }

    pub fn is_enhanced_imaging_subscribed(&self, image_type: EnhancedImageType) -> bool {
        self.session.is_enhanced_imaging_subscribed(image_type)
    }

    pub fn require_mapping_mode(&self, timeout_ms: u64) -> Result<()> {
        self.require_mode_command(CommandId::RequireMappingMode, timeout_ms)
    }

    pub fn require_pure_localization_mode(&self, timeout_ms: u64) -> Result<()> {
        self.require_mode_command(CommandId::RequirePureLocalizationMode, timeout_ms)
    }

    pub fn require_map_reset(&self, timeout_ms: u64) -> Result<()> {
        self.require_mode_command(CommandId::RequireMapReset, timeout_ms)
    }

    /// Unlike the other `require_*` commands, this returns a success/failure
    /// boolean instead of raising on failure.
    pub fn require_relocalization(&self, timeout_ms: u64) -> Result<bool> {
        let _guard = self.session.controller_lock.lock();
        let outcome = self.session.with_transport(|t| {
            t.request(
                CommandId::RequireRelocalization,
                &[],
                Some(Duration::from_millis(timeout_ms)),
            )
        });
        Ok(outcome.is_ok())
    }

    pub fn cancel_relocalization(&self) -> Result<()> {
        let _guard = self.session.controller_lock.lock();
        self.session
            .with_transport(|t| t.request(CommandId::CancelRelocalization, &[], None))?;
        Ok(())
    }

    pub fn require_local_relocalization(
        &self,
        center_pose: PoseSE3,
        radius_m: f32,
        timeout_ms: u64,
    ) -> Result<()> {
        let payload = encode_local_region_request(&center_pose, radius_m)?;
        self.send_timed_command(CommandId::RequireLocalRelocalization, &payload, timeout_ms)
    }

    pub fn require_local_map_merge(
        &self,
        center_pose: PoseSE3,
        radius_m: f32,
        timeout_ms: u64,
    ) -> Result<()> {
        let payload = encode_local_region_request(&center_pose, radius_m)?;
        self.send_timed_command(CommandId::RequireLocalMapMerge, &payload, timeout_ms)
    }

    /// Toggles the alternative semantic-segmentation model and blocks until
    /// the device's reported model matches, or times out.
    pub fn require_semantic_segmentation_alternative_model(
        &self,
        use_alt: bool,
        timeout_ms: u64,
    ) -> Result<()> {
        self.send_bool_timed_command(
            CommandId::RequireSemanticSegmentationAltModel,
            use_alt,
            timeout_ms,
        )
    }

    /// One of `{None, InProgress, Succeeded, Failed}`; never `InProgress`
    /// after `require_relocalization` has already returned.
    pub fn get_last_relocalization_status(&self, timeout_ms: u64) -> Result<RelocalizationOutcome> {
        let _guard = self.session.controller_lock.lock();
        let resp = self.session.with_transport(|t| {
            t.request(
                CommandId::GetRelocalizationStatus,
                &[],
                Some(Duration::from_millis(timeout_ms)),
            )
        })?;
        let tag = resp.payload.first().copied().unwrap_or(0);
        Ok(match tag {
            1 => RelocalizationOutcome::InProgress,
            2 => RelocalizationOutcome::Succeeded,
            3 => RelocalizationOutcome::Failed,
            _ => RelocalizationOutcome::None,
        })
    }

    /// Forces a fresh map-data snapshot pull.
    pub fn resync_map_data(&self, invalidate_cache: bool) -> Result<()> {
        let _guard = self.session.controller_lock.lock();
        self.send_bool_command(CommandId::ResyncMapData, invalidate_cache)
    }

    pub fn set_low_rate_mode(&self, on: bool) -> Result<()> {
        let _guard = self.session.controller_lock.lock();
        self.send_bool_command(CommandId::SetLowRateMode, on)
    }

    pub fn set_loop_closure(&self, on: bool, timeout_ms: u64) -> Result<()> {
        self.send_bool_timed_command(CommandId::SetLoopClosure, on, timeout_ms)
    }

    pub fn force_map_global_optimization(&self, timeout_ms: u64) -> Result<()> {
        self.require_mode_command(CommandId::ForceMapGlobalOptimization, timeout_ms)
    }

    /// `cmd_id` and `data` are device-defined; forwarded opaque, unchanged.
    pub fn send_custom_command(&self, cmd_id: u16, data: &[u8], timeout_ms: u64) -> Result<Vec<u8>> {
        let _guard = self.session.controller_lock.lock();
        let mut payload = Vec::with_capacity(2 + data.len());
        payload.write_u16::<LE>(cmd_id)?;
        payload.extend_from_slice(data);
        let resp = self.session.with_transport(|t| {
            t.request(
                CommandId::CustomCommand,
                &payload,
                Some(Duration::from_millis(timeout_ms)),
            )
        })?;
        Ok(resp.payload)
    }

    fn require_mode_command(&self, cmd: CommandId, timeout_ms: u64) -> Result<()> {
        let _guard = self.session.controller_lock.lock();
        self.session
            .with_transport(|t| t.request(cmd, &[], Some(Duration::from_millis(timeout_ms))))?;
        Ok(())
    }

    fn send_timed_command(&self, cmd: CommandId, payload: &[u8], timeout_ms: u64) -> Result<()> {
        let _guard = self.session.controller_lock.lock();
        self.session
            .with_transport(|t| t.request(cmd, payload, Some(Duration::from_millis(timeout_ms))))?;
        Ok(())
    }

    fn send_bool_timed_command(&self, cmd: CommandId, on: bool, timeout_ms: u64) -> Result<()> {
        self.send_timed_command(cmd, &[on as u8], timeout_ms)
    }

    /// Sends a one-byte bool-flag command. Caller must already hold
    /// `controller_lock`.
    fn send_bool_command(&self, cmd: CommandId, on: bool) -> Result<()> {
        self.session
            .with_transport(|t| t.request(cmd, &[on as u8], None))?;
        Ok(())
    }
}

fn enhanced_image_type_tag(image_type: EnhancedImageType) -> u8 {
    match image_type {
        EnhancedImageType::DepthMap => 0,
        EnhancedImageType::Point3D => 1,
        EnhancedImageType::Segmentation => 2,
    }
}

fn encode_local_region_request(center_pose: &PoseSE3, radius_m: f32) -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(7 * 8 + 4);
    for v in center_pose.translation {
        payload.write_f64::<LE>(v)?;
    }
    for v in center_pose.quaternion {
        payload.write_f64::<LE>(v)?;
    }
    payload.write_f32::<LE>(radius_m)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_without_a_transport_is_a_harmless_no_op() {
        let session = Session::new();
        let controller = Controller::new(&session);
        controller.disconnect();
        controller.disconnect();
        assert!(!controller.is_connected());
    }

    #[test]
    fn connect_rejects_an_empty_connection_string_without_touching_the_network() {
        let session = Session::new();
        let controller = Controller::new(&session);
        assert!(controller.connect("").is_err());
    }

    #[test]
    fn mutating_calls_fail_not_connected_before_any_connect() {
        let session = Session::new();
        let controller = Controller::new(&session);
        assert!(matches!(
            controller.enable_map_data_syncing(true),
            Err(Error::NotConnected)
        ));
    }

    #[test]
    fn enhanced_imaging_subscription_toggle_is_reflected_locally_even_without_a_device() {
        let session = Session::new();
        session.set_enhanced_imaging_subscription(EnhancedImageType::DepthMap, true);
        let controller = Controller::new(&session);
        assert!(controller.is_enhanced_imaging_subscribed(EnhancedImageType::DepthMap));
        session.set_enhanced_imaging_subscription(EnhancedImageType::DepthMap, false);
        assert!(!controller.is_enhanced_imaging_subscribed(EnhancedImageType::DepthMap));
    }

    #[test]
    fn enhanced_image_type_tags_are_stable_and_distinct() {
        assert_eq!(enhanced_image_type_tag(EnhancedImageType::DepthMap), 0);
        assert_eq!(enhanced_image_type_tag(EnhancedImageType::Point3D), 1);
        assert_eq!(enhanced_image_type_tag(EnhancedImageType::Segmentation), 2);
    }

    #[test]
    fn local_region_request_encodes_pose_and_radius() {
        let payload = encode_local_region_request(&PoseSE3::IDENTITY, 5.0).unwrap();
        assert_eq!(payload.len(), 7 * 8 + 4);
    }
}
