//! File stream with a sticky status register
//!
//! `FileStream` drives one OS handle through a `FileApi`. Operations never
//! panic or return `Err`; failures are reported by a sentinel return value
//! (`INVALID_SIZE`, `-1`) and by the bits left in the status register:
//!
//! - `BAD`: the OS reported an error on the handle
//! - `FAIL`: the operation was not allowed, or the stream was not good
//! - `EOF`: a read came up short at the end of the file
//!
//! `EOF` on its own does not make the stream "not good". A seek that lands
//! strictly before the end clears it again.

use crate::backend::{FileApi, OsFileApi, RawHandle};
use crate::durability::SyncPlan;
use crate::error::{Error, Result};
use crate::mode::{OpenMode, SeekOrigin, INVALID_SIZE};
use crate::scalar::{self, Scalar};
use crate::status::StatusRegister;
use std::fmt;
use std::io;
use std::path::Path;

/// A synchronous, unbuffered file stream
pub struct FileStream<A: FileApi = OsFileApi> {
    api: A,
    handle: Option<A::Handle>,
    status: StatusRegister,
    can_read: bool,
    can_write: bool,
    last_open_error: Option<io::ErrorKind>,
}

impl FileStream<OsFileApi> {
    /// Create a closed stream on the OS file API
    pub fn new() -> Self {
        Self::with_api(OsFileApi)
    }

    /// Create a stream and open `path`. Check `is_open()` afterwards.
    pub fn open_path(path: impl AsRef<Path>, mode: OpenMode) -> Self {
        let mut stream = Self::new();
        stream.open(path, mode);
        stream
    }

    /// Create a stream and open `path`, reporting open failure as an error
    pub fn create(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        Self::create_with(OsFileApi, path, mode)
    }
}

impl Default for FileStream<OsFileApi> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: FileApi> FileStream<A> {
    /// Create a closed stream on `api`
    pub fn with_api(api: A) -> Self {
        Self {
            api,
            handle: None,
            status: StatusRegister::empty(),
            can_read: false,
            can_write: false,
            last_open_error: None,
        }
    }

    /// Create a stream on `api` and open `path`, reporting open failure as an error
    pub fn create_with(api: A, path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let mut stream = Self::with_api(api);
        stream.open(path, mode);

        match stream.last_open_error {
            Some(kind) => Err(Error::OpenFailed {
                path: path.to_path_buf(),
                kind,
            }),
            None => Ok(stream),
        }
    }

    /// Open `path`, closing whatever was open before.
    ///
    /// Failure leaves the stream closed without touching the status
    /// register; see `is_open()` and `last_open_error()`.
    pub fn open(&mut self, path: impl AsRef<Path>, mode: OpenMode) {
        self.close();
        self.last_open_error = None;

        let path = path.as_ref();
        match self.api.open(path, mode.open_spec()) {
            Ok(handle) => {
                tracing::debug!("opened {} as {:?}", path.display(), mode);
                self.handle = Some(handle);
                self.can_read = mode.can_read();
                self.can_write = mode.can_write();
            }
            Err(err) => {
                tracing::debug!("cannot open {} as {:?}: {}", path.display(), mode, err);
                self.last_open_error = Some(err.kind());
                return;
            }
        }

        if mode.starts_at_end() {
            self.seek(0, SeekOrigin::End);
        }
    }

    /// Release the handle and reset all state. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.handle.take().is_some() {
            tracing::debug!("closed stream");
        }
        self.status = StatusRegister::empty();
        self.can_read = false;
        self.can_write = false;
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// True when the register is empty or holds only `EOF`.
    ///
    /// Also picks up an error the OS recorded on the handle since the last
    /// operation, raising `BAD`.
    pub fn good(&mut self) -> bool {
        let os_error = match &self.handle {
            Some(handle) => handle.error(),
            None => return false,
        };

        if !self.status.has_error() && os_error {
            self.set_bad("good");
        }
        self.status.is_good()
    }

    pub fn is_eof(&self) -> bool {
        self.status.contains(StatusRegister::EOF)
    }

    pub fn status(&self) -> StatusRegister {
        self.status
    }

    /// `Result` view of the status register
    pub fn check(&self) -> Result<()> {
        self.status.check()
    }

    /// Error kind of the most recent failed `open`, if the last open failed
    pub fn last_open_error(&self) -> Option<io::ErrorKind> {
        self.last_open_error
    }

    pub fn can_read(&self) -> bool {
        self.can_read
    }

    pub fn can_write(&self) -> bool {
        self.can_write
    }

    /// Read up to `buf.len()` bytes. Returns the count read, or
    /// `INVALID_SIZE` if the stream cannot read.
    ///
    /// A short count is not an error by itself; it leaves `EOF` and/or
    /// `BAD` set depending on what the OS reports.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let handle = match self.handle.as_mut() {
            Some(handle) if self.can_read => handle,
            _ => return self.refuse("read"),
        };

        let count = handle.read(buf);
        if count != buf.len() {
            let os_error = handle.error();
            let os_eof = handle.eof();
            if os_error {
                self.set_bad("read");
            }
            if os_eof {
                self.status |= StatusRegister::EOF;
            }
        }
        count
    }

    /// Write all of `buf`. Returns the count written, or `INVALID_SIZE` if
    /// the stream cannot write. Any shortfall sets `BAD`.
    pub fn write(&mut self, buf: &[u8]) -> usize {
        let handle = match self.handle.as_mut() {
            Some(handle) if self.can_write => handle,
            _ => return self.refuse("write"),
        };

        let count = handle.write(buf);
        if count != buf.len() {
            self.set_bad("write");
        }
        count
    }

    /// Flush OS-level buffering. Returns `0` on success, `-1` on failure.
    pub fn flush(&mut self) -> i32 {
        let handle = match self.handle.as_mut() {
            Some(handle) if self.can_write => handle,
            _ => {
                self.set_fail("flush");
                return -1;
            }
        };

        if handle.flush() {
            0
        } else {
            self.set_bad("flush");
            -1
        }
    }

    /// Reposition the stream.
    ///
    /// When the stream is at `EOF`, the size is captured before moving and
    /// `EOF` is only cleared if the new position is strictly before it.
    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) {
        if !self.good() {
            self.set_fail("seek");
            return;
        }

        // At EOF tell() is the file size
        let mut file_size = 0;
        if self.is_eof() {
            file_size = self.tell();
            if !self.good() {
                return;
            }
        }

        let Some(handle) = self.handle.as_mut() else {
            self.set_fail("seek");
            return;
        };

        if !handle.seek(offset, origin) {
            let os_error = handle.error();
            self.set_fail("seek");
            if os_error {
                self.set_bad("seek");
            }
        } else if self.status == StatusRegister::EOF {
            let position = self.tell();
            if position < file_size {
                tracing::trace!("seek to {} before end {}, clearing eof", position, file_size);
                self.status = StatusRegister::empty();
            }
        }
    }

    /// Current offset, or `INVALID_SIZE` on failure
    pub fn tell(&mut self) -> usize {
        if !self.good() {
            self.set_fail("tell");
            return INVALID_SIZE;
        }

        let position = self
            .handle
            .as_mut()
            .and_then(|handle| handle.tell())
            .and_then(|position| usize::try_from(position).ok());

        match position {
            Some(position) => position,
            None => {
                self.set_bad("tell");
                INVALID_SIZE
            }
        }
    }

    /// Size of the file, found by seeking to the end.
    ///
    /// With `restore_offset` the stream returns to where it was, otherwise
    /// it is left at the end.
    pub fn file_size(&mut self, restore_offset: bool) -> usize {
        if !self.good() {
            self.set_fail("file_size");
            return INVALID_SIZE;
        }

        let mut current = 0;
        if restore_offset {
            current = self.tell();
        }
        self.seek(0, SeekOrigin::End);
        let size = self.tell();
        if restore_offset {
            self.seek(i64::try_from(current).unwrap_or(i64::MAX), SeekOrigin::Begin);
        }
        size
    }

    /// Flush, then ask the OS to make written data durable.
    ///
    /// `prefer_data_sync` selects a content-only sync where the platform has
    /// one. Where the platform's strongest primitive is rejected by the file
    /// system, the plain sync is used instead.
    pub fn durable_sync(&mut self, prefer_data_sync: bool) {
        if !self.can_write || self.handle.is_none() {
            self.set_fail("durable_sync");
            return;
        }

        self.flush();

        let plan = SyncPlan::for_platform(self.api.platform(), prefer_data_sync);
        let Some(handle) = self.handle.as_mut() else {
            return;
        };

        if !handle.has_descriptor() {
            self.set_bad("durable_sync");
            return;
        }

        let result = match (handle.sync(plan.primary), plan.fallback) {
            (Err(err), Some(fallback)) => {
                tracing::debug!("{:?} rejected ({}), falling back to {:?}", plan.primary, err, fallback);
                handle.sync(fallback)
            }
            (result, _) => result,
        };

        if let Err(err) = result {
            tracing::warn!("durable sync failed: {}", err);
            self.set_bad("durable_sync");
        }
    }

    /// Read the native representation of a scalar into `out`.
    ///
    /// Returns the byte count like `read`; `out` is only updated when the
    /// whole value was read.
    pub fn read_value<T: Scalar>(&mut self, out: &mut T) -> usize {
        let (count, value) = self.read_raw::<T>();
        if let Some(value) = value {
            *out = value;
        }
        count
    }

    /// Write the native representation of a scalar. Returns the byte count like `write`.
    pub fn write_value<T: Scalar>(&mut self, value: T) -> usize {
        let mut raw = [0u8; scalar::MAX_SIZE];
        let bytes = &mut raw[..T::SIZE];
        value.encode(bytes);
        self.write(bytes)
    }

    /// Read a scalar, reporting refusal or a short read as an error
    pub fn read_scalar<T: Scalar>(&mut self) -> Result<T> {
        match self.read_raw::<T>() {
            (_, Some(value)) => Ok(value),
            (INVALID_SIZE, None) if !self.is_open() => Err(Error::NotOpen),
            (INVALID_SIZE, None) => Err(Error::Fail),
            (actual, None) => Err(Error::ShortRead {
                expected: T::SIZE,
                actual,
            }),
        }
    }

    fn read_raw<T: Scalar>(&mut self) -> (usize, Option<T>) {
        let mut raw = [0u8; scalar::MAX_SIZE];
        let bytes = &mut raw[..T::SIZE];
        let count = self.read(bytes);
        if count == T::SIZE {
            (count, Some(T::decode(bytes)))
        } else {
            (count, None)
        }
    }

    fn refuse(&mut self, op: &str) -> usize {
        self.set_fail(op);
        INVALID_SIZE
    }

    fn set_fail(&mut self, op: &str) {
        tracing::debug!("{} failed, status {:?}", op, self.status);
        self.status |= StatusRegister::FAIL;
    }

    fn set_bad(&mut self, op: &str) {
        if !self.status.contains(StatusRegister::BAD) {
            tracing::warn!("{}: I/O error on stream", op);
        }
        self.status |= StatusRegister::BAD;
    }
}

impl<A: FileApi> Drop for FileStream<A> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<A: FileApi> fmt::Debug for FileStream<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("open", &self.is_open())
            .field("status", &self.status)
            .field("can_read", &self.can_read)
            .field("can_write", &self.can_write)
            .finish()
    }
}
