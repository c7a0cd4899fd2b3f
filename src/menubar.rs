//! Tray-window lifecycle controller.
//!
//! Owns the tray icon and at most one popup window, interprets tray clicks,
//! drives show/hide transitions and positions the window next to the tray.
//! All operations are synchronous and run on the host's event loop; missing
//! state (no window, no known tray bounds) degrades to a no-op or a default.

use std::future::Future;

use log::{debug, info, warn};
use serde_json::Value;

use crate::config::{MenubarInput, ResolveContext, ResolvedConfig};
use crate::error::{ConfigError, MenubarError, Result};
use crate::events::{EventBus, ListenerId, MenubarEvent};
use crate::geometry::{Bounds, Point, Positioner, WindowPosition};
use crate::host::{ClickKind, Host, MouseButton, PopupWindow, TrayClick, TrayHandle, WindowProps};
use crate::platform::Platform;

/// Replacement for the built-in show behavior used by tray clicks.
pub type ShowHook<H> = Box<dyn FnMut(&mut Menubar<H>, Option<Bounds>) -> Result<()> + Send>;
/// Replacement for the built-in hide behavior used by tray clicks and blur.
pub type HideHook<H> = Box<dyn FnMut(&mut Menubar<H>) + Send>;

/// What losing focus does to the window, fixed when the window is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlurPolicy {
    Hide,
    EmitFocusLost,
}

pub struct Menubar<H: Host> {
    host: H,
    config: ResolvedConfig,
    platform: Platform,
    ready: bool,
    tray: Option<H::Tray>,
    window: Option<H::Window>,
    positioner: Option<H::Positioner>,
    cached_bounds: Option<Bounds>,
    blur_policy: BlurPolicy,
    events: EventBus<H::Window>,
    show_hook: Option<ShowHook<H>>,
    hide_hook: Option<HideHook<H>>,
}

impl<H: Host> Menubar<H> {
    /// Resolve `input` against the host's application root. Nothing native
    /// is created until [`Menubar::attach`].
    pub fn new(host: H, input: impl Into<MenubarInput>) -> Self {
        let platform = host.platform();
        let ctx = ResolveContext::new(host.app_path(), platform);
        let config = ResolvedConfig::resolve(input, &ctx);
        Self::with_config(host, config)
    }

    pub fn with_config(host: H, config: ResolvedConfig) -> Self {
        let platform = host.platform();
        Menubar {
            host,
            config,
            platform,
            ready: false,
            tray: None,
            window: None,
            positioner: None,
            cached_bounds: None,
            blur_policy: BlurPolicy::Hide,
            events: EventBus::new(),
            show_hook: None,
            hide_hook: None,
        }
    }

    /// Use an existing tray icon instead of creating one on attach.
    pub fn with_tray(mut self, tray: H::Tray) -> Self {
        self.tray = Some(tray);
        self
    }

    /// Route tray clicks through `hook` instead of [`Menubar::show_window`].
    /// The hook may still call `show_window` itself.
    pub fn with_show_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Menubar<H>, Option<Bounds>) -> Result<()> + Send + 'static,
    {
        self.show_hook = Some(Box::new(hook));
        self
    }

    /// Route tray clicks and focus loss through `hook` instead of
    /// [`Menubar::hide_window`].
    pub fn with_hide_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Menubar<H>) + Send + 'static,
    {
        self.hide_hook = Some(Box::new(hook));
        self
    }

    /// Listeners also receive the popup window while one exists.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(MenubarEvent, Option<&mut H::Window>) + Send + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn app(&self) -> &H {
        &self.host
    }

    pub fn app_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn tray(&self) -> Option<&H::Tray> {
        self.tray.as_ref()
    }

    pub fn window(&self) -> Option<&H::Window> {
        self.window.as_ref()
    }

    pub fn window_mut(&mut self) -> Option<&mut H::Window> {
        self.window.as_mut()
    }

    pub fn positioner(&self) -> Option<&H::Positioner> {
        self.positioner.as_ref()
    }

    pub fn cached_bounds(&self) -> Option<Bounds> {
        self.cached_bounds
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ResolvedConfig {
        &mut self.config
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_window_visible(&self) -> bool {
        self.window.as_ref().map(|w| w.is_visible()).unwrap_or(false)
    }

    /// Takes effect for later operations only; a live window keeps the
    /// properties it was created with.
    pub fn set_option(&mut self, key: &str, value: Value) -> std::result::Result<(), ConfigError> {
        self.config.set_option(key, value)
    }

    pub fn get_option(&self, key: &str) -> Option<Value> {
        self.config.get_option(key)
    }

    /// Wait for the host's ready signal, then attach.
    pub async fn run_when_ready<F>(mut self, ready: F) -> Result<Self>
    where
        F: Future<Output = ()>,
    {
        ready.await;
        self.attach()?;
        Ok(self)
    }

    /// Attach to the tray. Call once, when the host application is ready.
    pub fn attach(&mut self) -> Result<()> {
        if self.ready {
            warn!("Menubar already attached, ignoring");
            return Ok(());
        }

        if !self.config.show_dock_icon && self.platform.has_dock() {
            self.host.hide_dock_icon();
        }

        let mut tray = match self.tray.take() {
            Some(tray) => tray,
            None => {
                let icon = self.config.icon_source();
                debug!("Creating tray icon from {:?}", icon);
                self.host.create_tray(&icon).map_err(MenubarError::TrayCreation)?
            }
        };
        tray.set_tooltip(&self.config.tooltip);
        self.tray = Some(tray);

        if self.config.preload_window {
            self.create_window()?;
        }

        self.ready = true;
        info!("Menubar attached (position: {})", self.config.window_position);
        self.emit(MenubarEvent::Ready);
        Ok(())
    }

    fn trigger_button(&self) -> MouseButton {
        if self.config.show_on_right_click == Some(true) {
            MouseButton::Right
        } else {
            MouseButton::Left
        }
    }

    /// Entry point for native tray clicks and double-clicks.
    ///
    /// A click with any modifier key held only ever hides. Otherwise the
    /// click toggles: a visible window is hidden, anything else is shown.
    pub fn on_tray_click(&mut self, click: TrayClick) -> Result<()> {
        if click.kind == ClickKind::Single && click.button != self.trigger_button() {
            debug!("Ignoring {:?} click on tray", click.button);
            return Ok(());
        }

        if click.modifiers.any() || self.is_window_visible() {
            self.request_hide();
            return Ok(());
        }

        self.cache_bounds(click.bounds);
        self.request_show(click.bounds)
    }

    fn request_show(&mut self, anchor: Option<Bounds>) -> Result<()> {
        let Some(mut hook) = self.show_hook.take() else {
            return self.show_window(anchor);
        };
        let result = hook(self, anchor);
        if self.show_hook.is_none() {
            self.show_hook = Some(hook);
        }
        result
    }

    fn request_hide(&mut self) {
        let Some(mut hook) = self.hide_hook.take() else {
            self.hide_window();
            return;
        };
        hook(self);
        if self.hide_hook.is_none() {
            self.hide_hook = Some(hook);
        }
    }

    fn emit(&mut self, event: MenubarEvent) {
        self.events.emit(event, self.window.as_mut());
    }

    fn is_current_window(&self, label: &str) -> bool {
        self.window.as_ref().is_some_and(|window| window.label() == label)
    }

    fn cache_bounds(&mut self, bounds: Option<Bounds>) {
        if let Some(bounds) = bounds.filter(Bounds::is_reported) {
            self.cached_bounds = Some(bounds);
        }
    }

    /// Create the popup window. A window that already exists is closed and
    /// replaced.
    pub fn create_window(&mut self) -> Result<()> {
        self.emit(MenubarEvent::CreateWindow);

        let props = WindowProps::merged(&self.config);
        let mut window = self
            .host
            .create_window(&props)
            .map_err(MenubarError::WindowCreation)?;
        let positioner = self.host.bind_positioner(&window);

        self.blur_policy = if self.config.always_on_top == Some(true) {
            BlurPolicy::EmitFocusLost
        } else {
            BlurPolicy::Hide
        };

        if self.config.show_on_all_workspaces != Some(false) {
            window.set_visible_on_all_workspaces(true);
        }

        window.load_url(&self.config.index);

        if let Some(mut old) = self.window.replace(window) {
            warn!("Replacing popup window '{}'", old.label());
            old.close();
        }
        self.positioner = Some(positioner);

        self.emit(MenubarEvent::AfterCreateWindow);
        Ok(())
    }

    /// Show the window, creating it first if needed. Repositions and
    /// re-emits when it is already visible.
    pub fn show_window(&mut self, anchor: Option<Bounds>) -> Result<()> {
        if self.window.is_none() {
            self.create_window()?;
        }

        self.emit(MenubarEvent::Show);
        self.position_window(anchor);
        if let Some(window) = self.window.as_mut() {
            window.show();
        }
        self.emit(MenubarEvent::AfterShow);
        Ok(())
    }

    pub fn hide_window(&mut self) {
        if self.window.is_none() {
            return;
        }

        self.emit(MenubarEvent::Hide);
        if let Some(window) = self.window.as_mut() {
            window.hide();
        }
        self.emit(MenubarEvent::AfterHide);
    }

    /// Move the window next to `anchor`, or the last known tray bounds.
    /// Visibility is left alone.
    pub fn position_window(&mut self, anchor: Option<Bounds>) {
        self.cache_bounds(anchor);

        let (Some(window), Some(positioner)) = (self.window.as_mut(), self.positioner.as_ref()) else {
            debug!("No popup window to position");
            return;
        };

        let anchor = self.cached_bounds;
        let position = effective_position(self.config.window_position, anchor.as_ref(), self.platform);
        let candidate = positioner.calculate(position, anchor.as_ref());
        let point = apply_overrides(candidate, self.config.x, self.config.y);

        debug!("Positioning popup at ({}, {}) using {}", point.x, point.y, position);
        window.set_position(point);
    }

    /// Native blur of the window labelled `label`.
    pub fn on_window_blur(&mut self, label: &str) {
        if !self.is_current_window(label) {
            debug!("Ignoring blur of stale window '{}'", label);
            return;
        }

        match self.blur_policy {
            BlurPolicy::Hide => self.request_hide(),
            BlurPolicy::EmitFocusLost => self.emit(MenubarEvent::FocusLost),
        }
    }

    /// Native close of the window labelled `label`. The only way back to
    /// "no window".
    pub fn on_window_closed(&mut self, label: &str) {
        if !self.is_current_window(label) {
            debug!("Ignoring close of stale window '{}'", label);
            return;
        }

        self.window = None;
        self.positioner = None;
        self.emit(MenubarEvent::AfterClose);
    }
}

/// Tray-relative strategies are meaningless without bounds; fall back to the
/// platform's screen corner for this one calculation.
fn effective_position(configured: WindowPosition, anchor: Option<&Bounds>, platform: Platform) -> WindowPosition {
    if anchor.is_none() && configured.is_tray_relative() {
        platform.no_bounds_position()
    } else {
        configured
    }
}

fn apply_overrides(candidate: Point, x: Option<i32>, y: Option<i32>) -> Point {
    Point::new(x.unwrap_or(candidate.x), y.unwrap_or(candidate.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_position_without_bounds() {
        assert_eq!(
            effective_position(WindowPosition::TrayCenter, None, Platform::Macos),
            WindowPosition::TopRight
        );
        assert_eq!(
            effective_position(WindowPosition::TrayBottomCenter, None, Platform::Windows),
            WindowPosition::BottomRight
        );
        assert_eq!(
            effective_position(WindowPosition::Center, None, Platform::Windows),
            WindowPosition::Center
        );
    }

    #[test]
    fn test_effective_position_with_bounds() {
        let anchor = Bounds::new(100.0, 20.0, 24.0, 24.0);
        assert_eq!(
            effective_position(WindowPosition::TrayCenter, Some(&anchor), Platform::Linux),
            WindowPosition::TrayCenter
        );
    }

    #[test]
    fn test_overrides_apply_per_axis() {
        let candidate = Point::new(10, 20);
        assert_eq!(apply_overrides(candidate, None, None), candidate);
        assert_eq!(apply_overrides(candidate, Some(0), None), Point::new(0, 20));
        assert_eq!(apply_overrides(candidate, None, Some(-5)), Point::new(10, -5));
        assert_eq!(apply_overrides(candidate, Some(1), Some(2)), Point::new(1, 2));
    }
}
