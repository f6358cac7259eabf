//! Durable sync capability table
//!
//! Chooses which OS primitive makes written data durable on each platform.
//! The stream only ever asks for a `SyncPlan`; the platform differences stay here.

/// Platform families with distinct durability primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Has `F_FULLFSYNC`, which also flushes the drive's write cache
    Apple,
    /// Distinguishes `fdatasync` from `fsync`
    Unix,
    /// Only a handle-level commit
    Windows,
}

/// A single durability request against an open handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPrimitive {
    /// `fcntl(fd, F_FULLFSYNC)`
    FullSync,
    /// `fsync(fd)`: content and metadata
    Sync,
    /// `fdatasync(fd)`: content only
    DataSync,
    /// `_commit` / `FlushFileBuffers`
    Commit,
}

/// Primitive to try first, and what to try if the filesystem rejects it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPlan {
    pub primary: SyncPrimitive,
    pub fallback: Option<SyncPrimitive>,
}

impl Platform {
    /// The platform this crate was compiled for
    pub const fn current() -> Self {
        if cfg!(any(target_os = "macos", target_os = "ios")) {
            Platform::Apple
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

impl SyncPlan {
    pub fn for_platform(platform: Platform, prefer_data_sync: bool) -> Self {
        match platform {
            Platform::Apple => SyncPlan {
                primary: SyncPrimitive::FullSync,
                fallback: Some(SyncPrimitive::Sync),
            },
            Platform::Unix if prefer_data_sync => SyncPlan {
                primary: SyncPrimitive::DataSync,
                fallback: None,
            },
            Platform::Unix => SyncPlan {
                primary: SyncPrimitive::Sync,
                fallback: None,
            },
            Platform::Windows => SyncPlan {
                primary: SyncPrimitive::Commit,
                fallback: None,
            },
        }
    }

    /// Plan for the platform this crate was compiled for
    pub fn current(prefer_data_sync: bool) -> Self {
        Self::for_platform(Platform::current(), prefer_data_sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apple_prefers_full_sync_with_fallback() {
        for prefer in [false, true] {
            let plan = SyncPlan::for_platform(Platform::Apple, prefer);
            assert_eq!(plan.primary, SyncPrimitive::FullSync);
            assert_eq!(plan.fallback, Some(SyncPrimitive::Sync));
        }
    }

    #[test]
    fn test_unix_honours_data_sync_preference() {
        assert_eq!(SyncPlan::for_platform(Platform::Unix, true).primary, SyncPrimitive::DataSync);
        assert_eq!(SyncPlan::for_platform(Platform::Unix, false).primary, SyncPrimitive::Sync);
        assert_eq!(SyncPlan::for_platform(Platform::Unix, true).fallback, None);
    }

    #[test]
    fn test_windows_always_commits() {
        for prefer in [false, true] {
            let plan = SyncPlan::for_platform(Platform::Windows, prefer);
            assert_eq!(plan.primary, SyncPrimitive::Commit);
            assert_eq!(plan.fallback, None);
        }
    }

    #[test]
    fn test_current_platform() {
        let platform = Platform::current();
        #[cfg(target_os = "linux")]
        assert_eq!(platform, Platform::Unix);
        #[cfg(target_os = "macos")]
        assert_eq!(platform, Platform::Apple);
        #[cfg(windows)]
        assert_eq!(platform, Platform::Windows);
        assert_eq!(SyncPlan::current(true), SyncPlan::for_platform(platform, true));
    }
}
