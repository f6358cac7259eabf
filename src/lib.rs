//! SDS file stream
//!
//! A synchronous, unbuffered file stream over the OS file primitives with a
//! sticky status register (`BAD`, `FAIL`, `EOF`) instead of panics, and a
//! single durable sync operation that hides the per-platform syscalls.
//! Reaching end of file alone never makes a stream "not good".

pub mod algorithm;
pub mod backend;
pub mod durability;
pub mod fstream;
pub mod memfs;
pub mod mode;
pub mod scalar;
pub mod static_vector;
pub mod status;

// Re-export core types for convenience
pub use crate::error::{Error, Result};
pub use backend::{FileApi, OsFileApi, RawHandle};
pub use durability::{Platform, SyncPlan, SyncPrimitive};
pub use fstream::FileStream;
pub use memfs::MemoryFs;
pub use mode::{OpenMode, OpenSpec, SeekOrigin, INVALID_SIZE};
pub use scalar::Scalar;
pub use static_vector::StaticVector;
pub use status::StatusRegister;

/// Error types for the convenience layer on top of the status register
pub mod error {
    use std::fmt;
    use std::io;
    use std::path::PathBuf;

    /// Result type for fallible stream helpers
    pub type Result<T> = std::result::Result<T, Error>;

    /// Errors reported by the `Result`-returning helpers
    #[derive(Debug, Clone, PartialEq)]
    pub enum Error {
        // Lifecycle errors
        OpenFailed { path: PathBuf, kind: io::ErrorKind },
        NotOpen,

        // Status register errors
        Bad,
        Fail,

        // Transfer errors
        ShortRead { expected: usize, actual: usize },

        // Parsing errors
        UnknownMode(String),
        UnknownOrigin(String),
    }

    impl fmt::Display for Error {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Error::OpenFailed { path, kind } => {
                    write!(f, "Cannot open {}: {}", path.display(), kind)
                }
                Error::NotOpen => write!(f, "Stream is not open"),
                Error::Bad => write!(f, "Unrecoverable I/O error on stream"),
                Error::Fail => write!(f, "Stream operation failed"),
                Error::ShortRead { expected, actual } => {
                    write!(f, "Short read: expected {} bytes, got {}", expected, actual)
                }
                Error::UnknownMode(name) => write!(f, "Unknown open mode: {}", name),
                Error::UnknownOrigin(name) => write!(f, "Unknown seek origin: {}", name),
            }
        }
    }

    impl std::error::Error for Error {}
}
