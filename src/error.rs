use std::fmt;

/// Errors that can occur when interacting with a remote SLAM device.
///
/// Transport-originated variants carry the device's raw integer error code
/// for host-side log correlation; semantic variants are raised purely by the
/// SDK and never cross the wire.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("operation failed (code {0})")]
    Failed(i32),

    #[error("invalid argument (code {0})")]
    InvalidArgument(i32),

    #[error("capability not supported by this device (code {0})")]
    NotSupported(i32),

    #[error("operation not implemented by this device (code {0})")]
    NotImplemented(i32),

    #[error("operation timed out (code {0})")]
    TimeoutError(i32),

    #[error("transport I/O error (code {0})")]
    IoError(i32),

    #[error("stream not ready")]
    NotReady,

    #[error("not connected to a device")]
    NotConnected,

    #[error("a transport is already connected")]
    AlreadyConnected,

    #[error("no session has been created")]
    SessionNotCreated,

    #[error("a map-storage session is already active")]
    AlreadyInSession,

    #[error("capability not supported: {0}")]
    UnsupportedCapability(&'static str),

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid connection string: {0}")]
    ConnectionString(String),

    #[error("malformed wire record: {0}")]
    Protocol(String),
}

impl Error {
    /// Maps a raw transport error code to a typed [`Error`]. Returns `None`
    /// for the `Ok` code (0), matching the device's
    /// `Ok=0, Failed=-1, InvalidArgument=-2, NotSupported=-3, NotImplemented=-4,
    /// Timeout=-5, IoError=-6, NotReady=-7` convention.
    pub fn from_code(code: i32) -> Option<Error> {
        match code {
            0 => None,
            -1 => Some(Error::Failed(code)),
            -2 => Some(Error::InvalidArgument(code)),
            -3 => Some(Error::NotSupported(code)),
            -4 => Some(Error::NotImplemented(code)),
            -5 => Some(Error::TimeoutError(code)),
            -6 => Some(Error::IoError(code)),
            -7 => Some(Error::NotReady),
            _ => Some(Error::Failed(code)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Thread-safe last-error storage for the C FFI layer.
pub(crate) struct LastError {
    message: std::sync::Mutex<String>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: std::sync::Mutex::new(String::new()),
        }
    }

    pub fn set(&self, err: &Error) {
        if let Ok(mut msg) = self.message.lock() {
            *msg = fmt::format(format_args!("{}\0", err));
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        match self.message.lock() {
            Ok(msg) if !msg.is_empty() => msg.as_ptr() as *const std::ffi::c_char,
            _ => std::ptr::null(),
        }
    }
}
