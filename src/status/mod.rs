//! Stream status register
//!
//! Sticky bit set describing the health of a stream. Bits are only ever added
//! by stream operations; they are removed by `open`/`close`, or by the EOF
//! reconciliation in `seek`.

use crate::error::{Error, Result};
use bitflags::bitflags;

bitflags! {
    /// Status bits held by a `FileStream`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatusRegister: u8 {
        /// Unrecoverable OS-level I/O error on the handle
        const BAD  = 0b001;
        /// Last requested operation was invalid or incomplete
        const FAIL = 0b010;
        /// Positioned at or past the end of readable data
        const EOF  = 0b100;
    }
}

impl StatusRegister {
    /// Healthy means empty, or exactly `EOF`.
    pub fn is_good(self) -> bool {
        self.is_empty() || self == StatusRegister::EOF
    }

    /// True when `BAD` or `FAIL` is set
    pub fn has_error(self) -> bool {
        self.intersects(StatusRegister::BAD | StatusRegister::FAIL)
    }

    /// `Result` view of the register. `BAD` wins over `FAIL`.
    pub fn check(self) -> Result<()> {
        if self.contains(StatusRegister::BAD) {
            Err(Error::Bad)
        } else if self.contains(StatusRegister::FAIL) {
            Err(Error::Fail)
        } else {
            Ok(())
        }
    }
}
