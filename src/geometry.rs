//! Screen geometry: anchor rectangles, position strategies and the
//! positioner seam that turns a strategy into window coordinates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Screen rectangle reported by the tray icon.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Bounds { x, y, width, height }
    }

    /// Whether these bounds count as an actual report from the tray.
    ///
    /// Some platforms report an all-zero rectangle (or one with a zero
    /// x-origin) when they have no real tray geometry, so an origin of
    /// exactly zero on the x axis is treated as "no bounds supplied".
    /// Kept for compatibility; a tray sitting at the very left screen edge
    /// is indistinguishable from a missing report.
    pub fn is_reported(&self) -> bool {
        self.x != 0.0
    }
}

/// Absolute top-left window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// Named placement policy for the popup window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    TopCenter,
    BottomCenter,
    LeftCenter,
    RightCenter,
    Center,
    TrayLeft,
    TrayBottomLeft,
    TrayRight,
    TrayBottomRight,
    TrayCenter,
    TrayBottomCenter,
}

impl WindowPosition {
    pub const ALL: [WindowPosition; 15] = [
        WindowPosition::TopLeft,
        WindowPosition::TopRight,
        WindowPosition::BottomLeft,
        WindowPosition::BottomRight,
        WindowPosition::TopCenter,
        WindowPosition::BottomCenter,
        WindowPosition::LeftCenter,
        WindowPosition::RightCenter,
        WindowPosition::Center,
        WindowPosition::TrayLeft,
        WindowPosition::TrayBottomLeft,
        WindowPosition::TrayRight,
        WindowPosition::TrayBottomRight,
        WindowPosition::TrayCenter,
        WindowPosition::TrayBottomCenter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WindowPosition::TopLeft => "topLeft",
            WindowPosition::TopRight => "topRight",
            WindowPosition::BottomLeft => "bottomLeft",
            WindowPosition::BottomRight => "bottomRight",
            WindowPosition::TopCenter => "topCenter",
            WindowPosition::BottomCenter => "bottomCenter",
            WindowPosition::LeftCenter => "leftCenter",
            WindowPosition::RightCenter => "rightCenter",
            WindowPosition::Center => "center",
            WindowPosition::TrayLeft => "trayLeft",
            WindowPosition::TrayBottomLeft => "trayBottomLeft",
            WindowPosition::TrayRight => "trayRight",
            WindowPosition::TrayBottomRight => "trayBottomRight",
            WindowPosition::TrayCenter => "trayCenter",
            WindowPosition::TrayBottomCenter => "trayBottomCenter",
        }
    }

    /// Strategies in the `tray` namespace need anchor bounds to be meaningful.
    pub fn is_tray_relative(self) -> bool {
        self.as_str().starts_with("tray")
    }
}

impl fmt::Display for WindowPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowPosition {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WindowPosition::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownPosition(s.to_string()))
    }
}

/// Geometry service bound to one popup window.
///
/// Returns the coordinates the strategy places the window at. An
/// implementation may already move the window there; the controller applies
/// its per-axis overrides on top with `PopupWindow::set_position`.
pub trait Positioner {
    fn calculate(&self, position: WindowPosition, anchor: Option<&Bounds>) -> Point;
}
