//! C FFI layer for aurora-sdk.
//!
//! Exposes an opaque `Session` handle plus a representative slice of the
//! seven components' surface for C/C++ host applications — connection
//! lifecycle, pose retrieval, device identity, grid-map reads, and map
//! upload/download. Deeper component access (tracking frames, LiDAR scans,
//! enhanced imaging, recorder options) stays Rust-only; C callers that need
//! the full surface link against the native wire protocol directly.

use std::ffi::{c_char, c_double, c_int, CStr};

use crate::error::{Error, LastError};
use crate::session::Session;
use crate::types::Rect;

/// Thread-local-ish last error message for C consumers (process-wide, like
/// `errno`; overwritten by the next failing call on any thread).
static LAST_ERROR: LastError = LastError::new();

/// Opaque session handle for C consumers.
pub struct AuroraSession(Session);

/// Pose data in C-compatible layout: SE3 translation + quaternion, plus the
/// sensor timestamp the pose was captured at.
#[repr(C)]
pub struct AuroraPose {
    pub translation: [f64; 3],
    /// `(qx, qy, qz, qw)`.
    pub quaternion: [f64; 4],
    pub timestamp_ns: u64,
}

/// Device identity/capability snapshot in C-compatible layout.
#[repr(C)]
pub struct AuroraDeviceBasicInfo {
    pub model_major: u16,
    pub model_sub: u16,
    pub model_revision: u16,
    pub hw_features: u64,
    pub sensing_features: u64,
    pub sw_features: u64,
    pub device_uptime_us: u64,
    /// Null-terminated hex serial number (max 32 hex chars + NUL).
    pub serial_hex: [c_char; 33],
}

/// Actual dimensions of a grid-map cell fetch, mirroring
/// [`crate::types::GridCellFetchInfo`].
#[repr(C)]
pub struct AuroraGridFetchInfo {
    pub real_x: i32,
    pub real_y: i32,
    pub cell_w: u32,
    pub cell_h: u32,
}

/// An owned byte buffer handed to a C caller; release with
/// [`aurora_free_byte_buffer`].
#[repr(C)]
pub struct AuroraByteBuffer {
    pub data: *mut u8,
    pub len: usize,
    cap: usize,
}

impl AuroraByteBuffer {
    fn empty() -> Self {
        AuroraByteBuffer { data: std::ptr::null_mut(), len: 0, cap: 0 }
    }

    fn from_vec(mut v: Vec<u8>) -> Self {
        let buf = AuroraByteBuffer { data: v.as_mut_ptr(), len: v.len(), cap: v.capacity() };
        std::mem::forget(v);
        buf
    }
}

/// Releases a buffer previously returned by this module.
///
/// # Safety
/// `buf` must be a value previously returned by an `aurora_*` function in
/// this module and not already freed.
#[no_mangle]
pub unsafe extern "C" fn aurora_free_byte_buffer(buf: AuroraByteBuffer) {
    if !buf.data.is_null() {
        drop(Vec::from_raw_parts(buf.data, buf.len, buf.cap));
    }
}

fn str_to_fixed<const N: usize>(s: &str) -> [c_char; N] {
    let mut out = [0 as c_char; N];
    let bytes = s.as_bytes();
    let len = bytes.len().min(N - 1);
    for (i, &b) in bytes[..len].iter().enumerate() {
        out[i] = b as c_char;
    }
    out
}

/// # Safety
/// `ptr` must be null or a valid NUL-terminated C string.
unsafe fn c_str_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

fn set_last_error(err: &Error) {
    LAST_ERROR.set(err);
}

/// Creates a new, unconnected session. Never returns NULL.
#[no_mangle]
pub extern "C" fn aurora_session_new() -> *mut AuroraSession {
    Box::into_raw(Box::new(AuroraSession(Session::new())))
}

/// Disconnects (if connected) and frees the session.
///
/// # Safety
/// `session` must be a pointer returned by [`aurora_session_new`], or null.
#[no_mangle]
pub unsafe extern "C" fn aurora_session_free(session: *mut AuroraSession) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Connects to `addr`, a bare IP or a `"<protocol>://<ip>:<port>"` string.
/// Returns 0 on success, -1 on error (see [`aurora_last_error`]).
///
/// # Safety
/// `session` and `addr` must be valid, non-null pointers.
#[no_mangle]
pub unsafe extern "C" fn aurora_connect(session: *mut AuroraSession, addr: *const c_char) -> c_int {
    if session.is_null() {
        return -1;
    }
    let Some(addr) = c_str_to_string(addr) else { return -1 };
    let session = &*session;
    match session.0.controller().connect(addr) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e);
            -1
        }
    }
}

/// Idempotent; always safe.
///
/// # Safety
/// `session` must be a valid session pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn aurora_disconnect(session: *mut AuroraSession) {
    if !session.is_null() {
        (*session).0.controller().disconnect();
    }
}

/// Reflects local connect intent, not device liveness.
///
/// # Safety
/// `session` must be a valid session pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn aurora_is_connected(session: *const AuroraSession) -> bool {
    !session.is_null() && (*session).0.controller().is_connected()
}

/// Probes the transport for liveness.
///
/// # Safety
/// `session` must be a valid session pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn aurora_is_device_connection_alive(session: *const AuroraSession) -> bool {
    !session.is_null() && (*session).0.controller().is_device_connection_alive()
}

/// Writes the freshest pose into `out`. Returns 0 on success, -1 on
/// `NotReady`/error.
///
/// # Safety
/// `session` and `out` must be valid, non-null pointers.
#[no_mangle]
pub unsafe extern "C" fn aurora_current_pose(
    session: *const AuroraSession,
    use_se3: bool,
    out: *mut AuroraPose,
) -> c_int {
    if session.is_null() || out.is_null() {
        return -1;
    }
    match (*session).0.data_provider().current_pose(use_se3) {
        Ok((pose, _euler, ts)) => {
            out.write(AuroraPose {
                translation: pose.translation,
                quaternion: pose.quaternion,
                timestamp_ns: ts,
            });
            0
        }
        Err(e) => {
            set_last_error(&e);
            -1
        }
    }
}

/// Writes the device's identity/capability snapshot into `out`. Returns 0 on
/// success, -1 on error.
///
/// # Safety
/// `session` and `out` must be valid, non-null pointers.
#[no_mangle]
pub unsafe extern "C" fn aurora_device_basic_info(
    session: *const AuroraSession,
    out: *mut AuroraDeviceBasicInfo,
) -> c_int {
    if session.is_null() || out.is_null() {
        return -1;
    }
    match (*session).0.data_provider().device_basic_info() {
        Ok(info) => {
            out.write(AuroraDeviceBasicInfo {
                model_major: info.model_major,
                model_sub: info.model_sub,
                model_revision: info.model_revision,
                hw_features: info.hw_features.bits(),
                sensing_features: info.sensing_features.bits(),
                sw_features: info.sw_features.bits(),
                device_uptime_us: info.device_uptime_us,
                serial_hex: str_to_fixed(&info.serial_number_hex()),
            });
            0
        }
        Err(e) => {
            set_last_error(&e);
            -1
        }
    }
}

/// Fetches a grid-map cell window. `cells` in the returned buffer are sized
/// `fetch_info.cell_w * fetch_info.cell_h`; an empty-area rect yields an
/// empty buffer and `fetch_info` zeroed, without raising.
///
/// # Safety
/// `session` and `out_info` must be valid, non-null pointers.
#[no_mangle]
pub unsafe extern "C" fn aurora_lidar_read_cell_data(
    session: *const AuroraSession,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    resolution_m: f32,
    l2p_mapping: bool,
    out_info: *mut AuroraGridFetchInfo,
) -> AuroraByteBuffer {
    if session.is_null() || out_info.is_null() {
        return AuroraByteBuffer::empty();
    }
    let rect = Rect { x, y, w, h };
    match (*session)
        .0
        .lidar_map_builder()
        .read_cell_data(rect, resolution_m, l2p_mapping)
    {
        Ok((cells, info)) => {
            out_info.write(AuroraGridFetchInfo {
                real_x: info.real_x,
                real_y: info.real_y,
                cell_w: info.cell_w,
                cell_h: info.cell_h,
            });
            AuroraByteBuffer::from_vec(cells)
        }
        Err(e) => {
            set_last_error(&e);
            out_info.write(AuroraGridFetchInfo { real_x: 0, real_y: 0, cell_w: 0, cell_h: 0 });
            AuroraByteBuffer::empty()
        }
    }
}

/// Starts an asynchronous map upload. Returns 0 if the device accepted the
/// start request, -1 on error.
///
/// # Safety
/// `session` and `path` must be valid, non-null pointers.
#[no_mangle]
pub unsafe extern "C" fn aurora_map_start_upload(
    session: *const AuroraSession,
    path: *const c_char,
) -> c_int {
    start_map_session(session, path, true)
}

/// Starts an asynchronous map download. Returns 0 if the device accepted the
/// start request, -1 on error.
///
/// # Safety
/// `session` and `path` must be valid, non-null pointers.
#[no_mangle]
pub unsafe extern "C" fn aurora_map_start_download(
    session: *const AuroraSession,
    path: *const c_char,
) -> c_int {
    start_map_session(session, path, false)
}

unsafe fn start_map_session(session: *const AuroraSession, path: *const c_char, upload: bool) -> c_int {
    if session.is_null() {
        return -1;
    }
    let Some(path) = c_str_to_string(path) else { return -1 };
    let manager = (*session).0.map_manager();
    let result = if upload {
        manager.start_upload_session(path, |_| {})
    } else {
        manager.start_download_session(path, |_| {})
    };
    match result {
        Ok(true) => 0,
        Ok(false) => -1,
        Err(e) => {
            set_last_error(&e);
            -1
        }
    }
}

/// Blocks until the active map-storage session reaches a terminal state or
/// `timeout_s` elapses. Returns 1 on success, 0 on failure, -1 on timeout or
/// error.
///
/// # Safety
/// `session` must be a valid session pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn aurora_map_wait_for_completion(
    session: *const AuroraSession,
    timeout_s: c_double,
) -> c_int {
    if session.is_null() {
        return -1;
    }
    match (*session).0.map_manager().wait_for_completion(timeout_s, |_| {}) {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            set_last_error(&e);
            -1
        }
    }
}

/// Idempotent.
///
/// # Safety
/// `session` must be a valid session pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn aurora_map_abort(session: *const AuroraSession) {
    if !session.is_null() {
        let _ = (*session).0.map_manager().abort_session();
    }
}

/// Sends a `require_relocalization` command and blocks up to `timeout_ms`.
/// Returns 1 if the device reports success, 0 on failure, -1 on transport
/// error.
///
/// # Safety
/// `session` must be a valid session pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn aurora_require_relocalization(
    session: *const AuroraSession,
    timeout_ms: u64,
) -> c_int {
    if session.is_null() {
        return -1;
    }
    match (*session).0.controller().require_relocalization(timeout_ms) {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            set_last_error(&e);
            -1
        }
    }
}

/// Returns the last error message set by any `aurora_*` call on this
/// process, or NULL if none. Valid until the next failing call.
#[no_mangle]
pub extern "C" fn aurora_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_new_and_free_round_trip() {
        unsafe {
            let session = aurora_session_new();
            assert!(!session.is_null());
            assert!(!aurora_is_connected(session));
            aurora_session_free(session);
        }
    }

    #[test]
    fn connect_with_null_address_is_rejected() {
        unsafe {
            let session = aurora_session_new();
            assert_eq!(aurora_connect(session, std::ptr::null()), -1);
            aurora_session_free(session);
        }
    }

    #[test]
    fn pose_before_any_data_is_not_ready() {
        unsafe {
            let session = aurora_session_new();
            let mut out = AuroraPose { translation: [0.0; 3], quaternion: [0.0; 4], timestamp_ns: 0 };
            assert_eq!(aurora_current_pose(session, true, &mut out as *mut _), -1);
            aurora_session_free(session);
        }
    }

    #[test]
    fn grid_read_on_zero_area_rect_returns_empty_buffer() {
        unsafe {
            let session = aurora_session_new();
            let mut info = AuroraGridFetchInfo { real_x: -1, real_y: -1, cell_w: 9, cell_h: 9 };
            let buf = aurora_lidar_read_cell_data(session, 0.0, 0.0, 0.0, 0.0, 0.05, true, &mut info as *mut _);
            assert!(buf.data.is_null());
            assert_eq!(buf.len, 0);
            assert_eq!(info.cell_w, 0);
            assert_eq!(info.cell_h, 0);
            aurora_free_byte_buffer(buf);
            aurora_session_free(session);
        }
    }

    #[test]
    fn last_error_is_null_with_no_failures_recorded_yet_in_this_process() {
        // Best-effort: other tests in this binary may have already set an
        // error, so only assert the call itself doesn't panic.
        let _ = aurora_last_error();
    }
}
