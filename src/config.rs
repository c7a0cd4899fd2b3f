use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use anyhow::{Result, Context};
use log::{info, warn, debug};

use crate::error::ConfigError;
use crate::geometry::WindowPosition;
use crate::host::IconSource;
use crate::platform::Platform;

pub const DEFAULT_WIDTH: u32 = 400;
pub const DEFAULT_HEIGHT: u32 = 400;
pub const DEFAULT_ICON_NAME: &str = "IconTemplate.png";
pub const DEFAULT_INDEX_NAME: &str = "index.html";

/// Loose, partially filled options as handed in by the application.
///
/// Every recognized key is optional. Keys the controller does not know are
/// kept in `extra` and forwarded verbatim to window creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenubarOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_position: Option<WindowPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_dock_icon: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_on_right_click: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preload_window: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_on_top: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_on_all_workspaces: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MenubarOptions {
    /// Read options from a JSON or TOML file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let value = Self::read_value(path)?;
        serde_json::from_value(value)
            .with_context(|| format!("Failed to deserialize options from {:?}", path))
    }

    /// Layer a user options file over a defaults file. Either file may be
    /// missing; nested tables in the user file are merged key by key.
    pub fn load_layered(default_path: &Path, user_path: &Path) -> Result<Self> {
        let mut merged = Value::Object(Map::new());

        for path in [default_path, user_path] {
            if path.exists() {
                let value = Self::read_value(path)?;
                merged = merge_json_values(merged, value);
                info!("Merged menubar options from {:?}", path);
            } else {
                info!("No options file found at {:?}", path);
            }
        }

        serde_json::from_value(merged)
            .with_context(|| "Failed to deserialize merged menubar options")
    }

    fn read_value(path: &Path) -> Result<Value> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {:?}", path))?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML options in {:?}", path))
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON options in {:?}", path))
        }
    }
}

fn merge_json_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => merge_json_values(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        // Arrays and scalars from the overlay replace the base outright
        (_, overlay_value) => overlay_value,
    }
}

/// The accepted shapes of configuration input.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MenubarInput {
    #[default]
    Default,
    Dir(PathBuf),
    Options(MenubarOptions),
}

impl From<()> for MenubarInput {
    fn from(_: ()) -> Self {
        MenubarInput::Default
    }
}

impl From<&str> for MenubarInput {
    fn from(dir: &str) -> Self {
        MenubarInput::Dir(PathBuf::from(dir))
    }
}

impl From<String> for MenubarInput {
    fn from(dir: String) -> Self {
        MenubarInput::Dir(PathBuf::from(dir))
    }
}

impl From<&Path> for MenubarInput {
    fn from(dir: &Path) -> Self {
        MenubarInput::Dir(dir.to_path_buf())
    }
}

impl From<PathBuf> for MenubarInput {
    fn from(dir: PathBuf) -> Self {
        MenubarInput::Dir(dir)
    }
}

impl From<MenubarOptions> for MenubarInput {
    fn from(options: MenubarOptions) -> Self {
        MenubarInput::Options(options)
    }
}

impl From<Option<MenubarOptions>> for MenubarInput {
    fn from(options: Option<MenubarOptions>) -> Self {
        options.map(MenubarInput::Options).unwrap_or_default()
    }
}

/// Environment the resolver reads defaults from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveContext {
    pub app_root: PathBuf,
    pub working_dir: PathBuf,
    pub platform: Platform,
}

impl ResolveContext {
    pub fn new(app_root: impl Into<PathBuf>, platform: Platform) -> Self {
        let app_root = app_root.into();
        let working_dir = std::env::current_dir().unwrap_or_else(|e| {
            warn!("Cannot read current directory ({}), resolving against {:?}", e, app_root);
            app_root.clone()
        });

        ResolveContext {
            app_root,
            working_dir,
            platform,
        }
    }
}

/// Fully populated option record held by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub dir: PathBuf,
    pub index: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<PathBuf>,
    pub window_position: WindowPosition,
    pub show_dock_icon: bool,
    pub width: u32,
    pub height: u32,
    pub tooltip: String,
    #[serde(default)]
    pub preload_window: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_on_right_click: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_on_top: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_on_all_workspaces: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolvedConfig {
    /// Fill every missing field. Input is coerced, never rejected; empty
    /// strings and zero sizes count as missing.
    pub fn resolve(input: impl Into<MenubarInput>, ctx: &ResolveContext) -> Self {
        let options = match input.into() {
            MenubarInput::Default => MenubarOptions::default(),
            MenubarInput::Dir(dir) => MenubarOptions {
                dir: Some(dir),
                ..MenubarOptions::default()
            },
            MenubarInput::Options(options) => options,
        };

        let dir = options
            .dir
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| ctx.app_root.clone());
        let dir = if dir.is_absolute() {
            dir
        } else {
            normalize_path(&ctx.working_dir.join(dir))
        };

        let index = options
            .index
            .filter(|index| !index.is_empty())
            .unwrap_or_else(|| file_url(&dir.join(DEFAULT_INDEX_NAME)));

        let config = ResolvedConfig {
            index,
            icon: options.icon.filter(|icon| !icon.as_os_str().is_empty()),
            window_position: options
                .window_position
                .unwrap_or_else(|| ctx.platform.default_window_position()),
            show_dock_icon: options.show_dock_icon.unwrap_or(false),
            width: options.width.filter(|w| *w > 0).unwrap_or(DEFAULT_WIDTH),
            height: options.height.filter(|h| *h > 0).unwrap_or(DEFAULT_HEIGHT),
            tooltip: options.tooltip.unwrap_or_default(),
            preload_window: options.preload_window.unwrap_or(false),
            show_on_right_click: options.show_on_right_click,
            always_on_top: options.always_on_top,
            show_on_all_workspaces: options.show_on_all_workspaces,
            x: options.x,
            y: options.y,
            extra: options.extra,
            dir,
        };

        debug!("Resolved menubar options: {:?}", config);
        config
    }

    /// Icon for the tray: the configured path or `<dir>/IconTemplate.png`,
    /// falling back to the host's bundled icon when the file is missing.
    pub fn icon_source(&self) -> IconSource {
        let path = self
            .icon
            .clone()
            .unwrap_or_else(|| self.dir.join(DEFAULT_ICON_NAME));

        if path.exists() {
            IconSource::Path(path)
        } else {
            debug!("Tray icon {:?} not found, using bundled icon", path);
            IconSource::Bundled
        }
    }

    pub fn get_option(&self, key: &str) -> Option<Value> {
        let record = serde_json::to_value(self).ok()?;
        record.get(key).filter(|value| !value.is_null()).cloned()
    }

    /// Replace a single option by its camelCase name. Unknown names are
    /// stored as pass-through properties; `null` clears an optional field.
    /// The record is left untouched when the value does not fit the field.
    pub fn set_option(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        let mut record = serde_json::to_value(&*self)?;
        if let Value::Object(map) = &mut record {
            map.insert(key.to_string(), value);
        }

        *self = serde_json::from_value(record).map_err(|source| ConfigError::InvalidOption {
            key: key.to_string(),
            source,
        })?;

        debug!("Option '{}' updated", key);
        Ok(())
    }
}

fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path)
        .map(String::from)
        .unwrap_or_else(|()| format!("file://{}", path.display()))
}

/// Lexically drop `.` and `..` components without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub console: bool,
    #[serde(default)]
    pub file_output: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_max_log_size_mb")]
    pub max_log_size_mb: u64,
}

fn default_log_dir() -> String {
    dirs::data_local_dir()
        .map(|dir| dir.join("menubar").join("logs").to_string_lossy().into_owned())
        .unwrap_or_else(|| "logs".to_string())
}

fn default_max_log_size_mb() -> u64 {
    10
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            console: true,
            file_output: false,
            log_dir: default_log_dir(),
            max_log_size_mb: default_max_log_size_mb(),
        }
    }
}
