//! Location of the bundled bridge binary
//!
//! The bridge ships under `bin/alpha/<platform>/` in the package root, next
//! to (or above) the directory holding the advplcli executable.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// File name of the bridge executable, without platform suffix
pub const BRIDGE_NAME: &str = "AdvplDebugBridgeC";

/// Host platform families that ship a bridge build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    Mac,
}

impl Platform {
    /// Platform of the running host, if supported
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "windows") {
            Some(Platform::Windows)
        } else if cfg!(target_os = "linux") {
            Some(Platform::Linux)
        } else if cfg!(target_os = "macos") {
            Some(Platform::Mac)
        } else {
            None
        }
    }

    /// Directory name under `bin/alpha`
    pub fn dir_name(&self) -> &'static str {
        match self {
            Platform::Windows => "win",
            Platform::Linux => "linux",
            Platform::Mac => "mac",
        }
    }

    /// Bridge executable file name on this platform
    pub fn bridge_file_name(&self) -> String {
        match self {
            Platform::Windows => format!("{}.exe", BRIDGE_NAME),
            Platform::Linux | Platform::Mac => BRIDGE_NAME.to_string(),
        }
    }

    /// `bin/alpha/<platform>` relative to a package root
    pub fn relative_dir(&self) -> PathBuf {
        Path::new("bin").join("alpha").join(self.dir_name())
    }
}

/// Where the bridge and its archives live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeLayout {
    /// Directory scanned for archives; `None` on unsupported platforms
    pub platform_dir: Option<PathBuf>,
    /// Path of the bridge executable
    pub bridge: PathBuf,
}

impl BridgeLayout {
    /// Resolve the layout for a platform, searching upward from `start`
    pub fn resolve(platform: Option<Platform>, start: &Path) -> Self {
        let Some(platform) = platform else {
            return Self {
                platform_dir: None,
                bridge: PathBuf::from(BRIDGE_NAME),
            };
        };

        let root = find_package_root_from(start, platform).unwrap_or_else(|| start.to_path_buf());
        let platform_dir = root.join(platform.relative_dir());
        let bridge = platform_dir.join(platform.bridge_file_name());

        Self {
            platform_dir: Some(platform_dir),
            bridge,
        }
    }

    /// Resolve the layout for the running executable on this host
    pub fn discover() -> Result<Self> {
        let start = match std::env::current_exe() {
            Ok(exe) => match exe.parent() {
                Some(dir) => dir.to_path_buf(),
                None => current_dir()?,
            },
            Err(_) => current_dir()?,
        };
        Ok(Self::resolve(Platform::current(), &start))
    }
}

/// Get the current working directory
pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

/// Find the package root by looking for `bin/alpha/<platform>`
pub fn find_package_root_from(start: &Path, platform: Platform) -> Option<PathBuf> {
    let relative = platform.relative_dir();
    start
        .ancestors()
        .find(|dir| dir.join(&relative).is_dir())
        .map(Path::to_path_buf)
}
