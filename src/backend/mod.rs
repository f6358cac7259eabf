//! OS file access
//!
//! `FileApi` opens handles, `RawHandle` is the minimal set of unbuffered
//! primitives a `FileStream` drives. Handles keep sticky error and
//! end-of-file indicators the same way C stdio handles do: the error
//! indicator stays set until the handle is closed, the end-of-file indicator
//! is cleared by a successful seek.

use crate::durability::{Platform, SyncPrimitive};
use crate::mode::{OpenSpec, SeekOrigin};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Opens OS handles for a stream
pub trait FileApi {
    type Handle: RawHandle;

    /// Open `path` as described by `spec`. Always binary.
    fn open(&self, path: &Path, spec: OpenSpec) -> io::Result<Self::Handle>;

    /// Which durability table applies to handles from this API
    fn platform(&self) -> Platform {
        Platform::current()
    }
}

/// Unbuffered primitives on one open file
pub trait RawHandle {
    /// Read until `buf` is full, end of file, or an error. Returns the count
    /// transferred; a short count leaves `error()` and/or `eof()` set.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Write all of `buf` unless an error occurs. Returns the count written.
    fn write(&mut self, buf: &[u8]) -> usize;

    /// Reposition. Returns false on failure. Success clears `eof()`.
    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> bool;

    /// Current offset, `None` if the OS cannot report it
    fn tell(&mut self) -> Option<u64>;

    /// Push any OS-level buffering down. Returns false on failure.
    fn flush(&mut self) -> bool;

    /// Sticky error indicator
    fn error(&self) -> bool;

    /// End-of-file indicator
    fn eof(&self) -> bool;

    /// Whether the handle resolves to a valid OS descriptor
    fn has_descriptor(&self) -> bool;

    /// Issue one durability primitive against the descriptor
    fn sync(&mut self, primitive: SyncPrimitive) -> io::Result<()>;
}

/// The real OS file API
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileApi;

impl FileApi for OsFileApi {
    type Handle = OsHandle;

    fn open(&self, path: &Path, spec: OpenSpec) -> io::Result<OsHandle> {
        let file = OpenOptions::new()
            .read(spec.read)
            .write(spec.write)
            .create(spec.create)
            .truncate(spec.truncate)
            .open(path)?;
        Ok(OsHandle::new(file))
    }
}

/// An open OS file with stdio-style indicators
#[derive(Debug)]
pub struct OsHandle {
    file: File,
    error: bool,
    eof: bool,
}

impl OsHandle {
    pub fn new(file: File) -> Self {
        Self {
            file,
            error: false,
            eof: false,
        }
    }
}

impl RawHandle for OsHandle {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut done = 0;
        while done < buf.len() {
            match self.file.read(&mut buf[done..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => done += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!("read failed after {} bytes: {}", done, e);
                    self.error = true;
                    break;
                }
            }
        }
        done
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        let mut done = 0;
        while done < buf.len() {
            match self.file.write(&buf[done..]) {
                Ok(0) => {
                    self.error = true;
                    break;
                }
                Ok(n) => done += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!("write failed after {} bytes: {}", done, e);
                    self.error = true;
                    break;
                }
            }
        }
        done
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> bool {
        let target = match origin {
            SeekOrigin::Begin => match u64::try_from(offset) {
                Ok(pos) => SeekFrom::Start(pos),
                Err(_) => return false,
            },
            SeekOrigin::Current => SeekFrom::Current(offset),
            SeekOrigin::End => SeekFrom::End(offset),
        };

        match self.file.seek(target) {
            Ok(_) => {
                self.eof = false;
                true
            }
            // Seeking before the start is a bad argument, not a device error
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => false,
            Err(e) => {
                tracing::debug!("seek failed: {}", e);
                self.error = true;
                false
            }
        }
    }

    fn tell(&mut self) -> Option<u64> {
        self.file.stream_position().ok()
    }

    fn flush(&mut self) -> bool {
        match self.file.flush() {
            Ok(()) => true,
            Err(_) => {
                self.error = true;
                false
            }
        }
    }

    fn error(&self) -> bool {
        self.error
    }

    fn eof(&self) -> bool {
        self.eof
    }

    fn has_descriptor(&self) -> bool {
        descriptor_is_valid(&self.file)
    }

    fn sync(&mut self, primitive: SyncPrimitive) -> io::Result<()> {
        match primitive {
            SyncPrimitive::FullSync => full_sync(&self.file),
            SyncPrimitive::Sync => plain_sync(&self.file),
            SyncPrimitive::DataSync => self.file.sync_data(),
            // FlushFileBuffers on Windows, which is what _commit calls
            SyncPrimitive::Commit => self.file.sync_all(),
        }
    }
}

#[cfg(unix)]
fn descriptor_is_valid(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    // SAFETY: F_GETFD only queries descriptor flags.
    unsafe { libc::fcntl(file.as_raw_fd(), libc::F_GETFD) != -1 }
}

#[cfg(windows)]
fn descriptor_is_valid(file: &File) -> bool {
    use std::os::windows::io::AsRawHandle;
    !file.as_raw_handle().is_null()
}

#[cfg(not(any(unix, windows)))]
fn descriptor_is_valid(_file: &File) -> bool {
    true
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn full_sync(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    // SAFETY: F_FULLFSYNC takes no argument and only touches the descriptor.
    let status = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_FULLFSYNC) };
    if status == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
fn full_sync(_file: &File) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "F_FULLFSYNC is only available on Apple platforms",
    ))
}

// std's sync_all uses F_FULLFSYNC on Apple, so call fsync directly.
#[cfg(unix)]
fn plain_sync(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    // SAFETY: fsync only touches the descriptor.
    let status = unsafe { libc::fsync(file.as_raw_fd()) };
    if status == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(not(unix))]
fn plain_sync(file: &File) -> io::Result<()> {
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::OpenMode;
    use rand::Rng;
    use std::path::PathBuf;

    fn scratch_path(tag: &str) -> PathBuf {
        let id: u64 = rand::thread_rng().gen();
        std::env::temp_dir().join(format!("sds-backend-{}-{:016x}.bin", tag, id))
    }

    #[test]
    fn test_open_missing_file_for_reading_fails() {
        let path = scratch_path("missing");
        let result = OsFileApi.open(&path, OpenMode::ReadOnly.open_spec());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_keep_modes_do_not_create() {
        let path = scratch_path("keep");
        assert!(OsFileApi.open(&path, OpenMode::WriteKeepExisting.open_spec()).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_short_read_sets_eof_only() {
        let path = scratch_path("eof");
        let mut handle = OsFileApi
            .open(&path, OpenMode::WriteDiscardExisting.open_spec())
            .unwrap();
        assert_eq!(handle.write(b"abc"), 3);
        assert!(handle.seek(0, SeekOrigin::Begin));

        let mut buf = [0u8; 8];
        assert_eq!(handle.read(&mut buf), 3);
        assert!(handle.eof());
        assert!(!handle.error());
        assert_eq!(&buf[..3], b"abc");

        // A successful seek clears the indicator
        assert!(handle.seek(0, SeekOrigin::Begin));
        assert!(!handle.eof());

        drop(handle);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_negative_seek_is_not_a_device_error() {
        let path = scratch_path("neg");
        let mut handle = OsFileApi
            .open(&path, OpenMode::WriteDiscardExisting.open_spec())
            .unwrap();
        assert!(!handle.seek(-1, SeekOrigin::Begin));
        assert!(!handle.seek(-10, SeekOrigin::Current));
        assert!(!handle.error());
        assert_eq!(handle.tell(), Some(0));

        drop(handle);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_sync_primitives_on_current_platform() {
        let path = scratch_path("sync");
        let mut handle = OsFileApi
            .open(&path, OpenMode::WriteDiscardExisting.open_spec())
            .unwrap();
        assert_eq!(handle.write(b"durable"), 7);
        assert!(handle.flush());
        assert!(handle.has_descriptor());
        assert!(handle.sync(SyncPrimitive::Sync).is_ok());
        assert!(handle.sync(SyncPrimitive::DataSync).is_ok());
        #[cfg(not(any(target_os = "macos", target_os = "ios")))]
        assert!(handle.sync(SyncPrimitive::FullSync).is_err());

        drop(handle);
        std::fs::remove_file(&path).unwrap();
    }
}
