//! In-memory file API
//!
//! A `FileApi` backed by byte vectors instead of the OS. Files are shared
//! between handles opened on the same path, so a stream can be reopened and
//! see what it wrote. Faults can be switched on to drive the stream's error
//! paths: a silent device error, failing reads, seeks or flushes, broken
//! `tell`, a full device, unsupported sync primitives, or an unresolvable
//! descriptor.

use crate::backend::{FileApi, RawHandle};
use crate::durability::{Platform, SyncPrimitive};
use crate::mode::{OpenSpec, SeekOrigin};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

type FileData = Rc<RefCell<Vec<u8>>>;

/// Switchable failure conditions, shared by every handle of a `MemoryFs`
#[derive(Debug, Default)]
struct Faults {
    device_error: bool,
    broken_tell: bool,
    invalid_descriptor: bool,
    capacity: Option<usize>,
    read_limit: Option<usize>,
    seek_error: bool,
    flush_error: bool,
    unsupported: Vec<SyncPrimitive>,
}

#[derive(Debug)]
struct Inner {
    files: RefCell<HashMap<PathBuf, FileData>>,
    faults: RefCell<Faults>,
    syncs: RefCell<Vec<SyncPrimitive>>,
    platform: Cell<Platform>,
}

/// In-memory file system
#[derive(Debug, Clone)]
pub struct MemoryFs {
    inner: Rc<Inner>,
}

impl MemoryFs {
    /// Create an empty file system using the current platform's sync table
    pub fn new() -> Self {
        Self::with_platform(Platform::current())
    }

    /// Create an empty file system that reports `platform` to streams
    pub fn with_platform(platform: Platform) -> Self {
        Self {
            inner: Rc::new(Inner {
                files: RefCell::new(HashMap::new()),
                faults: RefCell::new(Faults::default()),
                syncs: RefCell::new(Vec::new()),
                platform: Cell::new(platform),
            }),
        }
    }

    /// Create or replace a file
    pub fn insert(&self, path: impl AsRef<Path>, contents: &[u8]) {
        self.inner
            .files
            .borrow_mut()
            .insert(path.as_ref().to_path_buf(), Rc::new(RefCell::new(contents.to_vec())));
    }

    /// Snapshot of a file's contents
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.inner
            .files
            .borrow()
            .get(path.as_ref())
            .map(|data| data.borrow().clone())
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.inner.files.borrow().contains_key(path.as_ref())
    }

    /// Raise the error indicator on every handle without failing any call
    pub fn set_device_error(&self, on: bool) {
        self.inner.faults.borrow_mut().device_error = on;
    }

    /// Make `tell` unable to report a position
    pub fn set_broken_tell(&self, on: bool) {
        self.inner.faults.borrow_mut().broken_tell = on;
    }

    /// Make descriptor resolution fail
    pub fn set_invalid_descriptor(&self, on: bool) {
        self.inner.faults.borrow_mut().invalid_descriptor = on;
    }

    /// Limit file sizes; writes past the limit come up short
    pub fn set_capacity(&self, capacity: Option<usize>) {
        self.inner.faults.borrow_mut().capacity = capacity;
    }

    /// Make reads fail with an I/O error at byte offset `limit`
    pub fn set_read_error(&self, limit: Option<usize>) {
        self.inner.faults.borrow_mut().read_limit = limit;
    }

    /// Make every seek fail with an I/O error
    pub fn set_seek_error(&self, on: bool) {
        self.inner.faults.borrow_mut().seek_error = on;
    }

    /// Make every flush fail with an I/O error
    pub fn set_flush_error(&self, on: bool) {
        self.inner.faults.borrow_mut().flush_error = on;
    }

    /// Reject a sync primitive as unsupported by the file system
    pub fn set_unsupported(&self, primitive: SyncPrimitive) {
        self.inner.faults.borrow_mut().unsupported.push(primitive);
    }

    /// Every sync primitive attempted so far, in order
    pub fn sync_log(&self) -> Vec<SyncPrimitive> {
        self.inner.syncs.borrow().clone()
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileApi for MemoryFs {
    type Handle = MemoryHandle;

    fn open(&self, path: &Path, spec: OpenSpec) -> io::Result<MemoryHandle> {
        let mut files = self.inner.files.borrow_mut();
        let data = match files.get(path) {
            Some(data) => {
                if spec.truncate {
                    data.borrow_mut().clear();
                }
                Rc::clone(data)
            }
            None if spec.create => {
                let data: FileData = Rc::new(RefCell::new(Vec::new()));
                files.insert(path.to_path_buf(), Rc::clone(&data));
                data
            }
            None => return Err(io::Error::from(io::ErrorKind::NotFound)),
        };

        Ok(MemoryHandle {
            fs: Rc::clone(&self.inner),
            data,
            position: 0,
            readable: spec.read,
            writable: spec.write,
            error: false,
            eof: false,
        })
    }

    fn platform(&self) -> Platform {
        self.inner.platform.get()
    }
}

/// Handle onto a `MemoryFs` file
#[derive(Debug)]
pub struct MemoryHandle {
    fs: Rc<Inner>,
    data: FileData,
    position: u64,
    readable: bool,
    writable: bool,
    error: bool,
    eof: bool,
}

impl RawHandle for MemoryHandle {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        if !self.readable {
            self.error = true;
            return 0;
        }

        let data = self.data.borrow();
        let start = usize::try_from(self.position).unwrap_or(usize::MAX).min(data.len());
        let available = data.len() - start;
        let read_limit = self.fs.faults.borrow().read_limit;
        let readable = match read_limit {
            Some(limit) => available.min(limit.saturating_sub(start)),
            None => available,
        };
        let count = buf.len().min(readable);
        buf[..count].copy_from_slice(&data[start..start + count]);
        self.position += count as u64;

        if count < buf.len() {
            if read_limit.is_some_and(|limit| start + count >= limit) {
                self.error = true;
            }
            if count == available {
                self.eof = true;
            }
        }
        count
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        if !self.writable {
            self.error = true;
            return 0;
        }

        let start = match usize::try_from(self.position) {
            Ok(start) => start,
            Err(_) => {
                self.error = true;
                return 0;
            }
        };
        let limit = self.fs.faults.borrow().capacity.unwrap_or(usize::MAX);
        let count = buf.len().min(limit.saturating_sub(start));

        let mut data = self.data.borrow_mut();
        let end = start + count;
        if data.len() < end {
            // Writing past the end zero-fills the gap
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(&buf[..count]);
        self.position = end as u64;

        if count < buf.len() {
            self.error = true;
        }
        count
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> bool {
        if self.fs.faults.borrow().seek_error {
            self.error = true;
            return false;
        }

        let anchor = match origin {
            SeekOrigin::Begin => 0i128,
            SeekOrigin::Current => self.position as i128,
            SeekOrigin::End => self.data.borrow().len() as i128,
        };
        let target = anchor + offset as i128;
        if target < 0 || target > u64::MAX as i128 {
            return false;
        }

        self.position = target as u64;
        self.eof = false;
        true
    }

    fn tell(&mut self) -> Option<u64> {
        if self.fs.faults.borrow().broken_tell {
            None
        } else {
            Some(self.position)
        }
    }

    fn flush(&mut self) -> bool {
        if self.fs.faults.borrow().flush_error {
            self.error = true;
            false
        } else {
            true
        }
    }

    fn error(&self) -> bool {
        self.error || self.fs.faults.borrow().device_error
    }

    fn eof(&self) -> bool {
        self.eof
    }

    fn has_descriptor(&self) -> bool {
        !self.fs.faults.borrow().invalid_descriptor
    }

    fn sync(&mut self, primitive: SyncPrimitive) -> io::Result<()> {
        self.fs.syncs.borrow_mut().push(primitive);
        if self.fs.faults.borrow().unsupported.contains(&primitive) {
            Err(io::Error::from(io::ErrorKind::Unsupported))
        } else {
            Ok(())
        }
    }
}
