//! Attach a popup window to a system tray icon.
//!
//! [`Menubar`] owns one tray icon and at most one popup window. Tray clicks
//! toggle the window, modifier-clicks and focus loss hide it, and every show
//! places it next to the tray icon. The native toolkit sits behind the
//! [`host::Host`] trait; with the `tauri` feature, [`tauri_host`] provides an
//! implementation over Tauri 2.

pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod host;
pub mod logger;
pub mod menubar;
pub mod platform;
#[cfg(feature = "tauri")]
pub mod tauri_host;

pub use config::{LoggingConfig, MenubarInput, MenubarOptions, ResolveContext, ResolvedConfig};
pub use error::{ConfigError, MenubarError};
pub use events::{EventBus, ListenerId, MenubarEvent};
pub use geometry::{Bounds, Point, Positioner, WindowPosition};
pub use host::{ClickKind, Host, IconSource, Modifiers, MouseButton, PopupWindow, TrayClick, TrayHandle, WindowProps};
pub use menubar::{HideHook, Menubar, ShowHook};
pub use platform::Platform;
