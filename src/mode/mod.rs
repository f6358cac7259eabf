//! Open modes and seek origins
//!
//! Maps each `OpenMode` onto read/write capabilities, truncation, initial
//! position and the OS-level open request.

use crate::error::Error;
use std::str::FromStr;

/// Returned by size-returning operations on failure. Never a byte count.
pub const INVALID_SIZE: usize = usize::MAX;

/// How a stream is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadOnlyFromEnd,
    WriteKeepExisting,
    WriteKeepExistingFromEnd,
    /// Truncates the file, creating it if absent
    WriteDiscardExisting,
    ReadWriteKeepExisting,
    ReadWriteKeepExistingFromEnd,
}

/// Anchor for relative seeks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    Begin,
    Current,
    End,
}

/// OS-level open request handed to a `FileApi`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenSpec {
    pub read: bool,
    pub write: bool,
    pub create: bool,
    pub truncate: bool,
}

impl OpenMode {
    pub const ALL: [OpenMode; 7] = [
        OpenMode::ReadOnly,
        OpenMode::ReadOnlyFromEnd,
        OpenMode::WriteKeepExisting,
        OpenMode::WriteKeepExistingFromEnd,
        OpenMode::WriteDiscardExisting,
        OpenMode::ReadWriteKeepExisting,
        OpenMode::ReadWriteKeepExistingFromEnd,
    ];

    /// Whether the stream may read
    pub fn can_read(self) -> bool {
        matches!(
            self,
            OpenMode::ReadOnly
                | OpenMode::ReadOnlyFromEnd
                | OpenMode::ReadWriteKeepExisting
                | OpenMode::ReadWriteKeepExistingFromEnd
        )
    }

    /// Whether the stream may write
    pub fn can_write(self) -> bool {
        !matches!(self, OpenMode::ReadOnly | OpenMode::ReadOnlyFromEnd)
    }

    /// Whether existing contents are discarded on open
    pub fn truncates(self) -> bool {
        self == OpenMode::WriteDiscardExisting
    }

    /// Whether the stream starts positioned at the end of the file
    pub fn starts_at_end(self) -> bool {
        matches!(
            self,
            OpenMode::ReadOnlyFromEnd
                | OpenMode::WriteKeepExistingFromEnd
                | OpenMode::ReadWriteKeepExistingFromEnd
        )
    }

    /// The OS open request for this mode.
    ///
    /// Write modes always open the handle read+write; the stream itself
    /// enforces the direction. Only `WriteDiscardExisting` creates files,
    /// the keep modes require the file to exist.
    pub fn open_spec(self) -> OpenSpec {
        OpenSpec {
            read: true,
            write: self.can_write(),
            create: self.truncates(),
            truncate: self.truncates(),
        }
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s.to_ascii_lowercase().as_str() {
            "r" | "readonly" => OpenMode::ReadOnly,
            "r-end" | "readonlyfromend" => OpenMode::ReadOnlyFromEnd,
            "w" | "writekeepexisting" => OpenMode::WriteKeepExisting,
            "w-end" | "writekeepexistingfromend" => OpenMode::WriteKeepExistingFromEnd,
            "w-trunc" | "writediscardexisting" => OpenMode::WriteDiscardExisting,
            "rw" | "readwritekeepexisting" => OpenMode::ReadWriteKeepExisting,
            "rw-end" | "readwritekeepexistingfromend" => OpenMode::ReadWriteKeepExistingFromEnd,
            _ => return Err(Error::UnknownMode(s.to_string())),
        };
        Ok(mode)
    }
}

impl FromStr for SeekOrigin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "begin" | "set" => Ok(SeekOrigin::Begin),
            "current" | "cur" => Ok(SeekOrigin::Current),
            "end" => Ok(SeekOrigin::End),
            _ => Err(Error::UnknownOrigin(s.to_string())),
        }
    }
}
