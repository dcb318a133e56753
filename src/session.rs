//! The Session: the single shared object owning the transport and the
//! process-wide state every component reads through a non-owning reference.

use std::net::ToSocketAddrs;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::components::RecorderActivity;
use crate::error::{Error, Result};
use crate::streams::{StreamSink, StreamState};
use crate::transport::Transport;
use crate::types::{ConnectionOption, DeviceEndpoint};

pub const DEFAULT_PORT: u16 = 7447;

/// Either a previously discovered endpoint or a raw connection string
/// (`"<ip>"` or `"<protocol>://<ip>:<port>"`). Replaces the source's
/// keyword-dispatched `connect` with a closed sum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    Endpoint(DeviceEndpoint),
    ConnectionString(String),
}

impl From<DeviceEndpoint> for ConnectTarget {
    fn from(ep: DeviceEndpoint) -> Self {
        ConnectTarget::Endpoint(ep)
    }
}

impl From<&str> for ConnectTarget {
    fn from(s: &str) -> Self {
        ConnectTarget::ConnectionString(s.to_string())
    }
}

impl From<String> for ConnectTarget {
    fn from(s: String) -> Self {
        ConnectTarget::ConnectionString(s)
    }
}

/// Parses `"<ip>"` or `"<protocol>://<ip>:<port>"` into a connection option,
/// defaulting the protocol to `tcp` and the port to [`DEFAULT_PORT`].
pub fn parse_connection_string(s: &str) -> Result<ConnectionOption> {
    if let Some((protocol, rest)) = s.split_once("://") {
        let (address, port) = match rest.rsplit_once(':') {
            Some((addr, port_str)) => {
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| Error::ConnectionString(s.to_string()))?;
                (addr.to_string(), port)
            }
            None => (rest.to_string(), DEFAULT_PORT),
        };
        Ok(ConnectionOption {
            protocol: protocol.to_string(),
            address,
            port,
        })
    } else if s.is_empty() {
        Err(Error::ConnectionString(s.to_string()))
    } else {
        Ok(ConnectionOption {
            protocol: "tcp".to_string(),
            address: s.to_string(),
            port: DEFAULT_PORT,
        })
    }
}

/// Preview-grid and dirty-rect bookkeeping owned by the Session on behalf of
/// `LidarMapBuilder`; lives here (not in the component) because the
/// component itself is just a non-owning reference.
pub(crate) struct PreviewState {
    pub(crate) active: AtomicBool,
    pub(crate) auto_floor_detection: AtomicBool,
    pub(crate) dirty_rect: Mutex<crate::types::Rect>,
    pub(crate) map_changed: AtomicBool,
    pub(crate) grid: RwLock<Option<crate::types::GridMap2D>>,
    pub(crate) options: Mutex<crate::types::GridMapGenerationOptions>,
}

impl PreviewState {
    fn new() -> Self {
        PreviewState {
            active: AtomicBool::new(false),
            auto_floor_detection: AtomicBool::new(false),
            dirty_rect: Mutex::new(crate::types::Rect::default()),
            map_changed: AtomicBool::new(false),
            grid: RwLock::new(None),
            options: Mutex::new(crate::types::GridMapGenerationOptions::default()),
        }
    }
}

/// The process-local object owning exactly one optional transport handle and
/// one optional active map-storage session. Components hold a non-owning
/// `&Session` and must not outlive it.
pub struct Session {
    transport: RwLock<Option<Transport>>,
    stream_state: Arc<StreamState>,
    map_data_syncing: AtomicBool,
    enhanced_imaging_depth: AtomicBool,
    enhanced_imaging_segmentation: AtomicBool,
    pub(crate) preview: PreviewState,
    /// Serializes Controller mutating calls: "no two Controller operations
    /// execute concurrently against one Session" (spec 4.1).
    pub(crate) controller_lock: Mutex<()>,
    next_custom_req_id: AtomicU16,
    pub(crate) recorder_activity: RecorderActivity,
}

impl Session {
    pub fn new() -> Session {
        Session {
            transport: RwLock::new(None),
            stream_state: StreamState::new(),
            map_data_syncing: AtomicBool::new(false),
            enhanced_imaging_depth: AtomicBool::new(false),
            enhanced_imaging_segmentation: AtomicBool::new(false),
            preview: PreviewState::new(),
            controller_lock: Mutex::new(()),
            next_custom_req_id: AtomicU16::new(1),
            recorder_activity: RecorderActivity::new(),
        }
    }

    pub(crate) fn stream_state(&self) -> &Arc<StreamState> {
        &self.stream_state
    }

    pub fn is_connected(&self) -> bool {
        self.transport.read().is_some()
    }

    pub fn is_device_connection_alive(&self) -> bool {
        match self.transport.read().as_ref() {
            Some(t) => t.is_alive(),
            None => false,
        }
    }

    pub(crate) fn with_transport<T>(&self, f: impl FnOnce(&Transport) -> Result<T>) -> Result<T> {
        match self.transport.read().as_ref() {
            Some(t) => f(t),
            None => Err(Error::NotConnected),
        }
    }

    pub(crate) fn connect_addr(&self, addr: impl ToSocketAddrs) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }
        let sink = StreamSink::new(self.stream_state.clone());
        let transport = Transport::connect(addr, sink)?;
        *self.transport.write() = Some(transport);
        Ok(())
    }

    pub fn connect(&self, target: impl Into<ConnectTarget>) -> Result<()> {
        let target = target.into();
        let option = match &target {
            ConnectTarget::Endpoint(ep) => ep
                .options
                .first()
                .cloned()
                .ok_or_else(|| Error::ConnectionString("endpoint has no connection options".into()))?,
            ConnectTarget::ConnectionString(s) => parse_connection_string(s)?,
        };
        self.connect_addr((option.address.as_str(), option.port))
    }

    /// Idempotent: disconnecting an already-disconnected Session is a no-op.
    pub fn disconnect(&self) {
        *self.transport.write() = None;
    }

    pub fn set_map_data_syncing(&self, on: bool) {
        self.map_data_syncing.store(on, Ordering::Release);
    }

    pub fn is_map_data_syncing(&self) -> bool {
        self.map_data_syncing.load(Ordering::Acquire)
    }

    pub fn set_enhanced_imaging_subscription(&self, kind: crate::types::EnhancedImageType, on: bool) {
        match kind {
            crate::types::EnhancedImageType::Segmentation => {
                self.enhanced_imaging_segmentation.store(on, Ordering::Release)
            }
            _ => self.enhanced_imaging_depth.store(on, Ordering::Release),
        }
    }

    pub fn is_enhanced_imaging_subscribed(&self, kind: crate::types::EnhancedImageType) -> bool {
        match kind {
            crate::types::EnhancedImageType::Segmentation => {
                self.enhanced_imaging_segmentation.load(Ordering::Acquire)
            }
            _ => self.enhanced_imaging_depth.load(Ordering::Acquire),
        }
    }

    pub fn set_raw_data_subscription(&self, on: bool) {
        self.stream_state.set_raw_data_subscribed(on);
    }

    pub fn is_raw_data_subscribed(&self) -> bool {
        self.stream_state.is_raw_data_subscribed()
    }

    pub(crate) fn next_request_id(&self) -> u16 {
        self.next_custom_req_id.fetch_add(1, Ordering::Relaxed).max(1)
    }

    pub(crate) fn default_timeout(&self) -> Duration {
        Duration::from_millis(5_000)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address_defaults_protocol_and_port() {
        let opt = parse_connection_string("192.168.1.10").unwrap();
        assert_eq!(opt.protocol, "tcp");
        assert_eq!(opt.address, "192.168.1.10");
        assert_eq!(opt.port, DEFAULT_PORT);
    }

    #[test]
    fn full_connection_string_parses_all_parts() {
        let opt = parse_connection_string("tcp://10.0.0.5:9000").unwrap();
        assert_eq!(opt.protocol, "tcp");
        assert_eq!(opt.address, "10.0.0.5");
        assert_eq!(opt.port, 9000);
    }

    #[test]
    fn empty_connection_string_is_rejected() {
        assert!(parse_connection_string("").is_err());
    }

    #[test]
    fn disconnect_twice_is_a_no_op() {
        let session = Session::new();
        session.disconnect();
        session.disconnect();
        assert!(!session.is_connected());
    }

    #[test]
    fn connect_without_address_on_discovered_endpoint_fails_cleanly() {
        let session = Session::new();
        let endpoint = DeviceEndpoint {
            name: "test".into(),
            options: vec![],
        };
        assert!(session.connect(endpoint).is_err());
    }
}
