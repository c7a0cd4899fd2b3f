//! Host adapter over Tauri 2.
//!
//! The controller lives in app state behind a mutex; tray and window event
//! callbacks lock it and forward the native event. Tauri tray events carry
//! no modifier keys, so clicks are always reported without modifiers.
//!
//! Window placement is done by `tauri-plugin-positioner`, which must be
//! registered on the builder (see [`positioner_plugin`]).

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, TryLockError};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tauri::image::Image;
use tauri::tray::{MouseButton as TauriMouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};
use tauri::plugin::TauriPlugin;
use tauri::{
    AppHandle, Manager, PhysicalPosition, Position, Rect, Runtime, Size, Url, WebviewUrl, WebviewWindow,
    WebviewWindowBuilder, WindowEvent,
};
use tauri_plugin_positioner::{Position as PluginPosition, WindowExt};

use crate::config::{LoggingConfig, MenubarInput};
use crate::logger::Logger;
use crate::geometry::{Bounds, Point, Positioner, WindowPosition};
use crate::host::{ClickKind, Host, IconSource, Modifiers, MouseButton, PopupWindow, TrayClick, TrayHandle, WindowProps};
use crate::menubar::Menubar;
use crate::platform::Platform;

const TRAY_ID: &str = "menubar";
const WINDOW_LABEL_PREFIX: &str = "menubar";

pub type ManagedMenubar<R> = Mutex<Menubar<TauriHost<R>>>;

/// The positioner plugin, which [`setup`] relies on.
pub fn positioner_plugin<R: Runtime>() -> TauriPlugin<R> {
    tauri_plugin_positioner::init()
}

pub struct TauriHost<R: Runtime> {
    app: AppHandle<R>,
    windows_created: u32,
    // Set once the positioner plugin has seen a tray event with a rect
    tray_located: Arc<AtomicBool>,
}

impl<R: Runtime> TauriHost<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        TauriHost {
            app,
            windows_created: 0,
            tray_located: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn handle(&self) -> &AppHandle<R> {
        &self.app
    }
}

pub struct TauriTray<R: Runtime>(TrayIcon<R>);

impl<R: Runtime> TauriTray<R> {
    pub fn inner(&self) -> &TrayIcon<R> {
        &self.0
    }
}

impl<R: Runtime> TrayHandle for TauriTray<R> {
    fn set_tooltip(&mut self, tooltip: &str) {
        if let Err(e) = self.0.set_tooltip(Some(tooltip)) {
            warn!("Failed to set tray tooltip: {}", e);
        }
    }
}

pub struct TauriWindow<R: Runtime>(WebviewWindow<R>);

impl<R: Runtime> TauriWindow<R> {
    pub fn inner(&self) -> &WebviewWindow<R> {
        &self.0
    }
}

impl<R: Runtime> PopupWindow for TauriWindow<R> {
    fn label(&self) -> &str {
        self.0.label()
    }

    fn show(&mut self) {
        if let Err(e) = self.0.show() {
            warn!("Failed to show popup window: {}", e);
        }
    }

    fn hide(&mut self) {
        if let Err(e) = self.0.hide() {
            warn!("Failed to hide popup window: {}", e);
        }
    }

    fn is_visible(&self) -> bool {
        self.0.is_visible().unwrap_or(false)
    }

    fn set_position(&mut self, position: Point) {
        let position = Position::Physical(PhysicalPosition::new(position.x, position.y));
        if let Err(e) = self.0.set_position(position) {
            warn!("Failed to move popup window: {}", e);
        }
    }

    fn set_visible_on_all_workspaces(&mut self, visible: bool) {
        if let Err(e) = self.0.set_visible_on_all_workspaces(visible) {
            warn!("Failed to set workspace visibility: {}", e);
        }
    }

    fn load_url(&mut self, url: &str) {
        match url.parse::<Url>() {
            Ok(url) => {
                if let Err(e) = self.0.navigate(url) {
                    warn!("Failed to load popup content: {}", e);
                }
            }
            Err(e) => warn!("Invalid popup content URL {}: {}", url, e),
        }
    }

    fn close(&mut self) {
        if let Err(e) = self.0.destroy() {
            warn!("Failed to destroy popup window '{}': {}", self.0.label(), e);
        }
    }
}

/// Moves the window with the positioner plugin and reports where it landed.
pub struct PluginPositioner<R: Runtime> {
    window: WebviewWindow<R>,
    tray_located: Arc<AtomicBool>,
    platform: Platform,
}

impl<R: Runtime> Positioner for PluginPositioner<R> {
    fn calculate(&self, position: WindowPosition, _anchor: Option<&Bounds>) -> Point {
        // The plugin tracks the tray rect itself and cannot place a window
        // against a tray it has not seen yet.
        let position = if position.is_tray_relative() && !self.tray_located.load(Ordering::Relaxed) {
            debug!("Tray not located yet, using a screen corner instead of {}", position);
            self.platform.no_bounds_position()
        } else {
            position
        };

        if let Err(e) = self.window.as_ref().window().move_window(plugin_position(position)) {
            warn!("Failed to move popup to {}: {}", position, e);
        }

        self.window
            .outer_position()
            .map(|p| Point::new(p.x, p.y))
            .unwrap_or_default()
    }
}

fn plugin_position(position: WindowPosition) -> PluginPosition {
    match position {
        WindowPosition::TopLeft => PluginPosition::TopLeft,
        WindowPosition::TopRight => PluginPosition::TopRight,
        WindowPosition::BottomLeft => PluginPosition::BottomLeft,
        WindowPosition::BottomRight => PluginPosition::BottomRight,
        WindowPosition::TopCenter => PluginPosition::TopCenter,
        WindowPosition::BottomCenter => PluginPosition::BottomCenter,
        WindowPosition::LeftCenter => PluginPosition::LeftCenter,
        WindowPosition::RightCenter => PluginPosition::RightCenter,
        WindowPosition::Center => PluginPosition::Center,
        WindowPosition::TrayLeft => PluginPosition::TrayLeft,
        WindowPosition::TrayBottomLeft => PluginPosition::TrayBottomLeft,
        WindowPosition::TrayRight => PluginPosition::TrayRight,
        WindowPosition::TrayBottomRight => PluginPosition::TrayBottomRight,
        WindowPosition::TrayCenter => PluginPosition::TrayCenter,
        WindowPosition::TrayBottomCenter => PluginPosition::TrayBottomCenter,
    }
}

impl<R: Runtime> Host for TauriHost<R> {
    type Tray = TauriTray<R>;
    type Window = TauriWindow<R>;
    type Positioner = PluginPositioner<R>;

    fn app_path(&self) -> PathBuf {
        self.app
            .path()
            .resource_dir()
            .or_else(|_| std::env::current_dir())
            .unwrap_or_default()
    }

    fn create_tray(&mut self, icon: &IconSource) -> Result<Self::Tray> {
        let image = match icon {
            IconSource::Path(path) => Image::from_path(path)
                .with_context(|| format!("Failed to load tray icon {:?}", path))?,
            IconSource::Bundled => self
                .app
                .default_window_icon()
                .map(|image| image.clone().to_owned())
                .context("No bundled application icon available")?,
        };

        let tray_located = Arc::clone(&self.tray_located);
        let tray = TrayIconBuilder::with_id(TRAY_ID)
            .icon(image)
            .icon_as_template(cfg!(target_os = "macos"))
            .on_tray_icon_event(move |tray, event| {
                // The plugin must learn the tray rect before the click moves the window
                tauri_plugin_positioner::on_tray_event(tray.app_handle(), &event);
                tray_located.store(true, Ordering::Relaxed);

                if let Some(click) = tray_click(event) {
                    with_menubar(tray.app_handle(), |menubar| {
                        if let Err(e) = menubar.on_tray_click(click) {
                            warn!("Tray click failed: {}", e);
                        }
                    });
                }
            })
            .build(&self.app)
            .context("Failed to build tray icon")?;

        Ok(TauriTray(tray))
    }

    fn create_window(&mut self, props: &WindowProps) -> Result<Self::Window> {
        self.windows_created += 1;
        let label = format!("{}-{}", WINDOW_LABEL_PREFIX, self.windows_created);
        let blank: Url = "about:blank".parse().context("Invalid placeholder URL")?;

        let mut builder = WebviewWindowBuilder::new(&self.app, label.as_str(), WebviewUrl::External(blank))
            .inner_size(f64::from(props.width), f64::from(props.height))
            .visible(props.show)
            .decorations(props.frame)
            .always_on_top(props.always_on_top);

        if let (Some(x), Some(y)) = (props.x, props.y) {
            builder = builder.position(f64::from(x), f64::from(y));
        }
        if let Some(title) = props.extra_str("title") {
            builder = builder.title(title);
        }
        if let Some(resizable) = props.extra_bool("resizable") {
            builder = builder.resizable(resizable);
        }
        if let Some(skip) = props.extra_bool("skipTaskbar") {
            builder = builder.skip_taskbar(skip);
        }

        let window = builder
            .build()
            .with_context(|| format!("Failed to build popup window '{}'", label))?;

        let app = self.app.clone();
        let window_label = label.clone();
        window.on_window_event(move |event| match event {
            WindowEvent::Focused(false) => with_menubar(&app, |menubar| menubar.on_window_blur(&window_label)),
            WindowEvent::Destroyed => with_menubar(&app, |menubar| menubar.on_window_closed(&window_label)),
            _ => {}
        });

        debug!("Created popup window '{}'", label);
        Ok(TauriWindow(window))
    }

    fn bind_positioner(&mut self, window: &Self::Window) -> Self::Positioner {
        PluginPositioner {
            window: window.0.clone(),
            tray_located: Arc::clone(&self.tray_located),
            platform: self.platform(),
        }
    }

    fn hide_dock_icon(&mut self) {
        #[cfg(target_os = "macos")]
        {
            if let Err(e) = self.app.set_dock_visibility(false) {
                warn!("Failed to hide dock icon: {}", e);
            }
        }
    }
}

fn tray_click(event: TrayIconEvent) -> Option<TrayClick> {
    let (button, kind, rect) = match event {
        TrayIconEvent::Click {
            button,
            button_state: MouseButtonState::Up,
            rect,
            ..
        } => (button, ClickKind::Single, rect),
        TrayIconEvent::DoubleClick { button, rect, .. } => (button, ClickKind::Double, rect),
        _ => return None,
    };

    let button = match button {
        TauriMouseButton::Left => MouseButton::Left,
        TauriMouseButton::Right => MouseButton::Right,
        TauriMouseButton::Middle => MouseButton::Middle,
    };

    Some(TrayClick {
        button,
        kind,
        bounds: Some(rect_bounds(&rect)),
        modifiers: Modifiers::default(),
    })
}

fn rect_bounds(rect: &Rect) -> Bounds {
    let (x, y) = match rect.position {
        Position::Physical(p) => (f64::from(p.x), f64::from(p.y)),
        Position::Logical(p) => (p.x, p.y),
    };
    let (width, height) = match rect.size {
        Size::Physical(s) => (f64::from(s.width), f64::from(s.height)),
        Size::Logical(s) => (s.width, s.height),
    };
    Bounds::new(x, y, width, height)
}

/// Run `f` against the managed controller. Events arriving while the
/// controller is busy (a native call re-entering from inside an operation)
/// are dropped.
pub fn with_menubar<R, F>(app: &AppHandle<R>, f: F)
where
    R: Runtime,
    F: FnOnce(&mut Menubar<TauriHost<R>>),
{
    let Some(state) = app.try_state::<ManagedMenubar<R>>() else {
        warn!("Menubar event before setup");
        return;
    };

    match state.try_lock() {
        Ok(mut menubar) => f(&mut menubar),
        Err(TryLockError::WouldBlock) => debug!("Menubar busy, dropping re-entrant event"),
        Err(TryLockError::Poisoned(e)) => warn!("Menubar state poisoned: {}", e),
    }
}

/// Manage a controller for `app` and attach it. Call from the builder's
/// `setup` hook, which is Tauri's ready signal.
///
/// The builder must register [`positioner_plugin`]. Logging is left to the
/// application: call [`crate::logger::Logger::init`] first, or use
/// [`setup_with_logging`].
pub fn setup<R: Runtime>(app: &AppHandle<R>, input: impl Into<MenubarInput>) -> Result<()> {
    setup_with(app, input, |_| {})
}

/// Like [`setup`], with a chance to subscribe to lifecycle events before the
/// controller attaches and emits `ready`.
pub fn setup_with<R, F>(app: &AppHandle<R>, input: impl Into<MenubarInput>, configure: F) -> Result<()>
where
    R: Runtime,
    F: FnOnce(&mut Menubar<TauriHost<R>>),
{
    let mut menubar = Menubar::new(TauriHost::new(app.clone()), input);
    configure(&mut menubar);
    app.manage(Mutex::new(menubar));

    let state = app.state::<ManagedMenubar<R>>();
    let mut menubar = state
        .lock()
        .map_err(|e| anyhow::anyhow!("Menubar state poisoned: {}", e))?;
    menubar.attach()?;

    info!("Menubar ready");
    Ok(())
}

/// [`setup`], after installing the fern logger described by `logging`.
pub fn setup_with_logging<R: Runtime>(
    app: &AppHandle<R>,
    input: impl Into<MenubarInput>,
    logging: &LoggingConfig,
) -> Result<()> {
    Logger::init(logging);
    setup(app, input)
}
