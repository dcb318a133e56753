//! Request/response/push framing and command identifiers for the TCP transport.
//!
//! Every frame on the wire is `[len:u32][req_id:u32][tag:u16][body]`, where
//! `len` covers everything after itself. A request sets `req_id` to a
//! caller-assigned nonzero value and `tag` to a [`CommandId`]; the matching
//! response echoes the same `req_id` with `tag` set to `0xffff` and `body`
//! starting with an `i32` error code. An unsolicited push frame (a streamed
//! sample the device emits without being asked) always carries `req_id == 0`
//! and `tag` set to a [`StreamTag`].

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Device command identifiers, sent as the `tag` of a request frame. Values
/// are internal protocol constants, not meaningful outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CommandId {
    Discover = 0x0001,
    Connect = 0x0002,
    Disconnect = 0x0003,
    EnableMapDataSyncing = 0x0010,
    EnableRawDataSubscription = 0x0011,
    SetEnhancedImagingSubscription = 0x0012,
    RequireMappingMode = 0x0020,
    RequirePureLocalizationMode = 0x0021,
    RequireMapReset = 0x0022,
    RequireRelocalization = 0x0023,
    CancelRelocalization = 0x0024,
    RequireLocalRelocalization = 0x0025,
    RequireLocalMapMerge = 0x0026,
    RequireSemanticSegmentationAltModel = 0x0027,
    ResyncMapData = 0x0030,
    SetLowRateMode = 0x0031,
    SetLoopClosure = 0x0032,
    ForceMapGlobalOptimization = 0x0033,
    GetRelocalizationStatus = 0x0034,
    CustomCommand = 0x00ff,
    FetchDeviceBasicInfo = 0x0100,
    FetchDeviceStatus = 0x0101,
    FetchCurrentPose = 0x0102,
    FetchHistoryPose = 0x0103,
    FetchCameraPreview = 0x0104,
    FetchTrackingFrame = 0x0105,
    FetchLidarScan = 0x0106,
    FetchImuData = 0x0107,
    FetchGlobalMappingInfo = 0x0108,
    FetchMapData = 0x0109,
    FetchAllMapInfo = 0x010a,
    FetchCameraCalibration = 0x010b,
    FetchTransformCalibration = 0x010c,
    FetchImuInfo = 0x010d,
    StartMapUploadSession = 0x0200,
    StartMapDownloadSession = 0x0201,
    QueryMapStorageStatus = 0x0202,
    AbortMapStorageSession = 0x0203,
    StartPreviewBackgroundUpdate = 0x0300,
    StopPreviewBackgroundUpdate = 0x0301,
    RequirePreviewRedraw = 0x0302,
    GetAndResetPreviewDirtyRect = 0x0303,
    SetPreviewAutoFloorDetection = 0x0304,
    ReadGridCellData = 0x0305,
    GenerateFullmapOnDemand = 0x0306,
    FetchFloorDetectionHistogram = 0x0400,
    FetchAllFloorDetectionInfo = 0x0401,
    FetchCurrentFloorDetectionDesc = 0x0402,
    WaitDepthCameraNextFrame = 0x0500,
    PeekDepthCameraFrame = 0x0501,
    FetchSemanticSegmentationConfig = 0x0502,
    FetchSemanticSegmentationLabels = 0x0503,
    WaitSemanticSegmentationNextFrame = 0x0504,
    PeekSemanticSegmentationFrame = 0x0505,
    FetchDepthCameraConfig = 0x0506,
    CalcDepthCameraAlignedSegmentationMap = 0x0507,
    StartRecording = 0x0600,
    StopRecording = 0x0601,
    SetRecorderOption = 0x0602,
    QueryRecorderStatus = 0x0603,
}

/// Tag carried by unsolicited push frames (`req_id == 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum StreamTag {
    Pose = 0x1000,
    Tracking = 0x1001,
    CameraPreview = 0x1002,
    Lidar = 0x1003,
    Imu = 0x1004,
    DepthFrameReady = 0x1005,
    SegmentationFrameReady = 0x1006,
    MapSnapshotDelta = 0x1007,
    MapStorageUpdate = 0x1008,
}

impl StreamTag {
    pub fn from_u16(v: u16) -> Option<StreamTag> {
        match v {
            0x1000 => Some(StreamTag::Pose),
            0x1001 => Some(StreamTag::Tracking),
            0x1002 => Some(StreamTag::CameraPreview),
            0x1003 => Some(StreamTag::Lidar),
            0x1004 => Some(StreamTag::Imu),
            0x1005 => Some(StreamTag::DepthFrameReady),
            0x1006 => Some(StreamTag::SegmentationFrameReady),
            0x1007 => Some(StreamTag::MapSnapshotDelta),
            0x1008 => Some(StreamTag::MapStorageUpdate),
            _ => None,
        }
    }
}

/// Marks a response frame's `tag` field; never collides with a real [`CommandId`].
const RESPONSE_TAG: u16 = 0xffff;

/// One fully-framed message read off the wire, before request/push demuxing.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub req_id: u32,
    pub tag: u16,
    pub body: Vec<u8>,
}

/// Writes a request frame: `req_id` nonzero, `tag` a [`CommandId`].
pub fn write_request<W: Write>(
    w: &mut W,
    req_id: u32,
    cmd: CommandId,
    payload: &[u8],
) -> io::Result<usize> {
    write_frame(w, req_id, cmd as u16, payload)
}

fn write_frame<W: Write>(w: &mut W, req_id: u32, tag: u16, payload: &[u8]) -> io::Result<usize> {
    let len = 6 + payload.len() as u32;
    w.write_u32::<LE>(len)?;
    w.write_u32::<LE>(req_id)?;
    w.write_u16::<LE>(tag)?;
    w.write_all(payload)?;
    Ok(4 + len as usize)
}

/// Reads one full frame from `r`, blocking until the length-prefixed frame is
/// available. Does not distinguish request/response/push; callers dispatch
/// on `req_id`/`tag`.
pub fn read_frame<R: Read>(r: &mut R) -> io::Result<RawFrame> {
    let len = r.read_u32::<LE>()? as usize;
    if len < 6 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "frame too short"));
    }
    let req_id = r.read_u32::<LE>()?;
    let tag = r.read_u16::<LE>()?;
    let mut body = vec![0u8; len - 6];
    r.read_exact(&mut body)?;
    Ok(RawFrame { req_id, tag, body })
}

/// A decoded response frame: the transport error code plus the raw payload.
#[derive(Debug, Clone)]
pub struct ResponseFrame {
    pub error_code: i32,
    pub payload: Vec<u8>,
}

impl RawFrame {
    pub fn is_response(&self) -> bool {
        self.req_id != 0 && self.tag == RESPONSE_TAG
    }

    pub fn is_push(&self) -> bool {
        self.req_id == 0
    }

    /// Decodes this frame's body as a response: leading `i32` error code, rest payload.
    pub fn into_response(self) -> io::Result<ResponseFrame> {
        if self.body.len() < 4 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "response body too short"));
        }
        let error_code = i32::from_le_bytes([self.body[0], self.body[1], self.body[2], self.body[3]]);
        Ok(ResponseFrame {
            error_code,
            payload: self.body[4..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_frame_round_trips_through_raw_reader() {
        let mut buf = Vec::new();
        let written = write_request(&mut buf, 7, CommandId::FetchCurrentPose, &[1, 2, 3]).unwrap();
        assert_eq!(written, buf.len());

        let mut cursor = Cursor::new(buf);
        let frame = read_frame(&mut cursor).unwrap();
        assert_eq!(frame.req_id, 7);
        assert_eq!(frame.tag, CommandId::FetchCurrentPose as u16);
        assert_eq!(frame.body, vec![1, 2, 3]);
        assert!(!frame.is_response());
        assert!(!frame.is_push());
    }

    #[test]
    fn response_frame_decodes_error_code_and_payload() {
        let mut body = Vec::new();
        body.write_i32::<LE>(-7).unwrap();
        body.extend_from_slice(&[9, 8, 7]);

        let mut buf = Vec::new();
        write_frame(&mut buf, 7, RESPONSE_TAG, &body).unwrap();

        let mut cursor = Cursor::new(buf);
        let frame = read_frame(&mut cursor).unwrap();
        assert!(frame.is_response());
        let resp = frame.into_response().unwrap();
        assert_eq!(resp.error_code, -7);
        assert_eq!(resp.payload, vec![9, 8, 7]);
    }

    #[test]
    fn push_frame_has_zero_req_id() {
        let mut buf = Vec::new();
        write_frame(&mut buf, 0, StreamTag::Pose as u16, &[]).unwrap();
        let mut cursor = Cursor::new(buf);
        let frame = read_frame(&mut cursor).unwrap();
        assert!(frame.is_push());
        assert_eq!(StreamTag::from_u16(frame.tag), Some(StreamTag::Pose));
    }

    #[test]
    fn truncated_length_prefix_is_rejected() {
        let mut buf = Vec::new();
        buf.write_u32::<LE>(2).unwrap();
        let mut cursor = Cursor::new(buf);
        assert!(read_frame(&mut cursor).is_err());
    }
}
