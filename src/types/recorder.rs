use std::collections::HashMap;
use std::io::{self, Write};

/// Which on-device dataset recorder a [`crate::components::DataRecorder`] call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecorderKind {
    RawDataset,
    ColmapDataset,
}

/// A typed recorder option value. Replaces the source's duck-typed option
/// dicts with a closed sum type.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderOptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// The full set of options for one recorder, built up via
/// `DataRecorder::set_option_*` before `start_recording`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecorderOptions {
    values: HashMap<String, RecorderOptionValue>,
}

impl RecorderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: RecorderOptionValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&RecorderOptionValue> {
        self.values.get(key)
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Writes `[count:u32]` followed by `[key_len:u32][key][tag:u8][value]`
    /// per entry. Tags: `0=Bool(u8) 1=Int(i64) 2=Float(f64) 3=String(len+bytes)`.
    pub fn encode_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        use byteorder::{LittleEndian as LE, WriteBytesExt};
        w.write_u32::<LE>(self.values.len() as u32)?;
        for (key, value) in &self.values {
            w.write_u32::<LE>(key.len() as u32)?;
            w.write_all(key.as_bytes())?;
            match value {
                RecorderOptionValue::Bool(b) => {
                    w.write_u8(0)?;
                    w.write_u8(*b as u8)?;
                }
                RecorderOptionValue::Int(i) => {
                    w.write_u8(1)?;
                    w.write_i64::<LE>(*i)?;
                }
                RecorderOptionValue::Float(f) => {
                    w.write_u8(2)?;
                    w.write_f64::<LE>(*f)?;
                }
                RecorderOptionValue::String(s) => {
                    w.write_u8(3)?;
                    w.write_u32::<LE>(s.len() as u32)?;
                    w.write_all(s.as_bytes())?;
                }
            }
        }
        Ok(())
    }
}

/// Which side of an async map-storage transfer a [`MapStorageSession`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStorageKind {
    Upload,
    Download,
}

/// Map-storage session lifecycle state. See
/// [`crate::components::MapManager`] for the full transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStorageStatus {
    Idle,
    Working(u8),
    Finished,
    Failed,
    Aborted,
    Rejected,
    Timeout,
}

impl MapStorageStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, MapStorageStatus::Working(_))
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, MapStorageStatus::Finished)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

/// A single in-flight or completed map-storage transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct MapStorageSession {
    pub kind: MapStorageKind,
    pub file_path: String,
    pub status: MapStorageStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_status_is_active_others_are_not() {
        assert!(MapStorageStatus::Working(50).is_active());
        assert!(!MapStorageStatus::Idle.is_active());
        assert!(!MapStorageStatus::Finished.is_active());
        assert!(MapStorageStatus::Finished.is_terminal());
        assert!(!MapStorageStatus::Working(0).is_terminal());
    }

    #[test]
    fn recorder_options_round_trip() {
        let mut opts = RecorderOptions::new();
        opts.set("image_quality", RecorderOptionValue::String("raw".into()));
        opts.set("stereo_recording", RecorderOptionValue::Bool(true));
        assert_eq!(
            opts.get("image_quality"),
            Some(&RecorderOptionValue::String("raw".into()))
        );
        opts.reset();
        assert_eq!(opts.get("image_quality"), None);
    }
}
