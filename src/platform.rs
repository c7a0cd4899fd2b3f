// Platform detection and platform-dependent defaults

use serde::{Deserialize, Serialize};

use crate::geometry::WindowPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Macos,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Platform::Windows,
            "macos" => Platform::Macos,
            "linux" => Platform::Linux,
            _ => Platform::Other,
        }
    }

    /// Strategy used when the options name none. The Windows taskbar sits at
    /// the bottom of the screen, the macOS menu bar and most Linux panels at the top.
    pub fn default_window_position(self) -> WindowPosition {
        match self {
            Platform::Windows => WindowPosition::TrayBottomCenter,
            _ => WindowPosition::TrayCenter,
        }
    }

    /// Screen corner substituted for a tray-relative strategy when no tray
    /// bounds are known.
    pub fn no_bounds_position(self) -> WindowPosition {
        match self {
            Platform::Windows => WindowPosition::BottomRight,
            _ => WindowPosition::TopRight,
        }
    }

    pub fn has_dock(self) -> bool {
        self == Platform::Macos
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_os() {
        assert_eq!(Platform::from_os("windows"), Platform::Windows);
        assert_eq!(Platform::from_os("macos"), Platform::Macos);
        assert_eq!(Platform::from_os("linux"), Platform::Linux);
        assert_eq!(Platform::from_os("freebsd"), Platform::Other);
    }

    #[test]
    fn test_platform_defaults() {
        assert_eq!(Platform::Windows.default_window_position(), WindowPosition::TrayBottomCenter);
        assert_eq!(Platform::Macos.default_window_position(), WindowPosition::TrayCenter);
        assert_eq!(Platform::Linux.default_window_position(), WindowPosition::TrayCenter);

        assert_eq!(Platform::Windows.no_bounds_position(), WindowPosition::BottomRight);
        assert_eq!(Platform::Macos.no_bounds_position(), WindowPosition::TopRight);
    }

    #[test]
    fn test_current_platform_matches_target() {
        #[cfg(target_os = "macos")]
        assert_eq!(Platform::current(), Platform::Macos);

        #[cfg(target_os = "windows")]
        assert_eq!(Platform::current(), Platform::Windows);

        #[cfg(target_os = "linux")]
        assert_eq!(Platform::current(), Platform::Linux);
    }
}
