//! Seams between the controller and the host windowing toolkit.
//!
//! The controller never talks to a native API directly. A host supplies the
//! tray icon, the popup window and a geometry service bound to that window,
//! and feeds native tray/window events back into the controller.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ResolvedConfig;
use crate::geometry::{Bounds, Point, Positioner};
use crate::platform::Platform;

/// Image the tray icon is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    Path(PathBuf),
    /// The host's own default icon.
    Bundled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickKind {
    Single,
    Double,
}

/// Modifier keys held during a tray click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub alt: bool,
    pub shift: bool,
    pub ctrl: bool,
    /// Command on macOS, the Windows key elsewhere.
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.alt || self.shift || self.ctrl || self.meta
    }
}

/// A native click on the tray icon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrayClick {
    pub button: MouseButton,
    pub kind: ClickKind,
    pub bounds: Option<Bounds>,
    pub modifiers: Modifiers,
}

impl TrayClick {
    pub fn left(bounds: Option<Bounds>) -> Self {
        TrayClick {
            button: MouseButton::Left,
            kind: ClickKind::Single,
            bounds,
            modifiers: Modifiers::default(),
        }
    }

    pub fn right(bounds: Option<Bounds>) -> Self {
        TrayClick {
            button: MouseButton::Right,
            ..TrayClick::left(bounds)
        }
    }

    pub fn double(bounds: Option<Bounds>) -> Self {
        TrayClick {
            kind: ClickKind::Double,
            ..TrayClick::left(bounds)
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Properties the popup window is constructed with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowProps {
    pub show: bool,
    pub frame: bool,
    pub width: u32,
    pub height: u32,
    pub always_on_top: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WindowProps {
    /// Toolkit defaults (hidden, frameless) overlaid with the option record.
    /// Pass-through `show`/`frame` keys win over the defaults as well.
    pub fn merged(config: &ResolvedConfig) -> Self {
        let mut extra = config.extra.clone();
        let show = take_bool(&mut extra, "show").unwrap_or(false);
        let frame = take_bool(&mut extra, "frame").unwrap_or(false);

        WindowProps {
            show,
            frame,
            width: config.width,
            height: config.height,
            always_on_top: config.always_on_top.unwrap_or(false),
            x: config.x,
            y: config.y,
            extra,
        }
    }

    pub fn extra_bool(&self, key: &str) -> Option<bool> {
        self.extra.get(key).and_then(Value::as_bool)
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

fn take_bool(map: &mut Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key).and_then(Value::as_bool) {
        Some(flag) => {
            map.remove(key);
            Some(flag)
        }
        None => None,
    }
}

pub trait TrayHandle {
    fn set_tooltip(&mut self, tooltip: &str);
}

/// Native popup window. Calls are fire-and-forget; content loading in
/// particular completes on the host's schedule.
pub trait PopupWindow {
    /// Identifies the native window in close and blur notifications.
    fn label(&self) -> &str;
    fn show(&mut self);
    fn hide(&mut self);
    fn is_visible(&self) -> bool;
    fn set_position(&mut self, position: Point);
    fn set_visible_on_all_workspaces(&mut self, visible: bool);
    fn load_url(&mut self, url: &str);
    /// Tear down the native window. Its later close or blur notifications
    /// are ignored by the controller.
    fn close(&mut self);
}

/// The host application.
///
/// Native tray clicks must be delivered to `Menubar::on_tray_click`, window
/// blur to `Menubar::on_window_blur` and the window's close to
/// `Menubar::on_window_closed`, one at a time. Window notifications carry the
/// label of the window they came from.
pub trait Host {
    type Tray: TrayHandle;
    type Window: PopupWindow;
    type Positioner: Positioner;

    /// Root directory of the host application.
    fn app_path(&self) -> PathBuf;

    fn platform(&self) -> Platform {
        Platform::current()
    }

    fn create_tray(&mut self, icon: &IconSource) -> Result<Self::Tray>;

    fn create_window(&mut self, props: &WindowProps) -> Result<Self::Window>;

    fn bind_positioner(&mut self, window: &Self::Window) -> Self::Positioner;

    /// Hosts without a dock keep the default no-op.
    fn hide_dock_icon(&mut self) {}
}
