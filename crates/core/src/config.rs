//! Configuration Types
//!
//! Defines the data structures of the deck document:
//! - AppSettings: grid geometry, window flags, theme, toggle hotkey
//! - ActionConfig: the action a button triggers (type + free-form params)
//! - ButtonConfig: one button placed at a grid position
//! - PageConfig: a named set of buttons, optionally bound to applications
//! - AppConfig: the whole document
//!
//! Every struct deserializes with per-field defaults so partial documents load,
//! and serializes the full shape.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Free-form action parameters, interpreted per action type
pub type ActionParams = Map<String, Value>;

/// Current document version written by this build
pub const CONFIG_VERSION: u32 = 1;

/// Default toggle hotkey for the panel
pub const DEFAULT_GLOBAL_HOTKEY: &str = "ctrl+`";

/// Read `[row, col, ...]`; extra elements are ignored, negative or fractional
/// coordinates are clamped, and anything unusable becomes `(0, 0)`
fn grid_position<'de, D>(deserializer: D) -> Result<(u32, u32), D::Error>
where
    D: Deserializer<'de>,
{
    let coord = |v: &Value| v.as_f64().map(|n| n.max(0.0) as u32).unwrap_or(0);
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) if items.len() >= 2 => (coord(&items[0]), coord(&items[1])),
        _ => (0, 0),
    })
}

/// The action a button triggers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Action type identifier ("" = no action)
    #[serde(rename = "type")]
    pub action_type: String,
    /// Parameters, semantics defined per action type
    pub params: ActionParams,
}

impl ActionConfig {
    pub fn new(action_type: impl Into<String>, params: ActionParams) -> Self {
        Self {
            action_type: action_type.into(),
            params,
        }
    }

    /// True when the button has no action bound
    pub fn is_empty(&self) -> bool {
        self.action_type.is_empty()
    }
}

/// A single button on a page grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    /// (row, col), unique within a page
    #[serde(deserialize_with = "grid_position")]
    pub position: (u32, u32),
    pub label: String,
    /// Icon file path ("" = none)
    pub icon: String,
    pub action: ActionConfig,
}

impl ButtonConfig {
    pub fn new(row: u32, col: u32, label: impl Into<String>, action: ActionConfig) -> Self {
        Self {
            position: (row, col),
            label: label.into(),
            icon: String::new(),
            action,
        }
    }
}

/// A named page of buttons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Stable, globally unique id
    pub id: String,
    pub name: String,
    /// Executable names that auto-select this page (matched case-insensitively)
    pub mapped_apps: Vec<String>,
    pub buttons: Vec<ButtonConfig>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: "New Page".to_string(),
            mapped_apps: Vec::new(),
            buttons: Vec::new(),
        }
    }
}

impl PageConfig {
    /// Create an empty page with a freshly generated id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_page_id(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Get the button at a grid position
    pub fn button_at(&self, row: u32, col: u32) -> Option<&ButtonConfig> {
        self.buttons.iter().find(|b| b.position == (row, col))
    }

    /// Insert or replace the button at `button.position`
    pub fn set_button(&mut self, button: ButtonConfig) {
        match self.buttons.iter_mut().find(|b| b.position == button.position) {
            Some(existing) => *existing = button,
            None => self.buttons.push(button),
        }
    }

    /// Remove the button at a grid position
    pub fn remove_button(&mut self, row: u32, col: u32) -> Option<ButtonConfig> {
        let index = self.buttons.iter().position(|b| b.position == (row, col))?;
        Some(self.buttons.remove(index))
    }

    /// Case-insensitive check against the mapped executable names
    pub fn is_mapped_to(&self, exe_name: &str) -> bool {
        let exe_lower = exe_name.to_lowercase();
        self.mapped_apps
            .iter()
            .any(|app| app.to_lowercase() == exe_lower)
    }
}

/// Generate a page id of the form `page_<8 hex chars>`
pub fn generate_page_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("page_{}", &hex[..8])
}

/// Application-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub grid_rows: u32,
    pub grid_cols: u32,
    /// Button edge length in pixels
    pub button_size: u32,
    /// Gap between buttons in pixels
    pub button_spacing: u32,
    /// Switch pages automatically when the foreground app changes
    pub auto_switch_enabled: bool,
    pub always_on_top: bool,
    pub theme: String,
    /// Chord that toggles panel visibility
    pub global_hotkey: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            grid_rows: 3,
            grid_cols: 5,
            button_size: 100,
            button_spacing: 8,
            auto_switch_enabled: true,
            always_on_top: true,
            theme: "dark".to_string(),
            global_hotkey: DEFAULT_GLOBAL_HOTKEY.to_string(),
        }
    }
}

impl AppSettings {
    /// Clamp the grid to at least one row and one column
    pub fn normalize(&mut self) {
        self.grid_rows = self.grid_rows.max(1);
        self.grid_cols = self.grid_cols.max(1);
    }

    /// Whether a position falls inside the configured grid
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row < self.grid_rows && col < self.grid_cols
    }
}

/// The whole configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Document version, reserved for migrations
    pub version: u32,
    pub settings: AppSettings,
    /// Display order; the first page is the default
    pub pages: Vec<PageConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            settings: AppSettings::default(),
            pages: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Built-in fallback used when no file can be loaded
    pub fn builtin() -> Self {
        Self {
            pages: vec![PageConfig {
                id: "page_main".to_string(),
                name: "Main".to_string(),
                ..PageConfig::default()
            }],
            ..Self::default()
        }
    }

    /// Parse a JSON value, applying defaults for missing or null fields
    pub fn from_value(mut value: Value) -> serde_json::Result<Self> {
        strip_document_nulls(&mut value);
        let mut config: AppConfig = serde_json::from_value(value)?;
        config.settings.normalize();
        Ok(config)
    }

    /// Serialize to a JSON value with every field present
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn page_by_id(&self, page_id: &str) -> Option<&PageConfig> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    pub fn page_index_by_id(&self, page_id: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.id == page_id)
    }

    /// First page whose mapped apps contain `exe_name` (case-insensitive)
    pub fn page_for_app(&self, exe_name: &str) -> Option<&PageConfig> {
        self.pages.iter().find(|p| p.is_mapped_to(exe_name))
    }

    pub fn page_index_for_app(&self, exe_name: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.is_mapped_to(exe_name))
    }
}

/// Drop `null` members of the document's own objects so they read as missing
/// and take the field default. Action params are free-form and left alone.
fn strip_document_nulls(document: &mut Value) {
    fn strip(value: &mut Value) -> Option<&mut Map<String, Value>> {
        let map = value.as_object_mut()?;
        map.retain(|_, v| !v.is_null());
        Some(map)
    }

    fn drop_null_items<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut [Value] {
        match map.get_mut(key).and_then(Value::as_array_mut) {
            Some(list) => {
                list.retain(|v| !v.is_null());
                list
            }
            None => &mut [],
        }
    }

    let Some(root) = strip(document) else {
        return;
    };
    if let Some(settings) = root.get_mut("settings") {
        strip(settings);
    }
    for page in drop_null_items(root, "pages") {
        let Some(page) = strip(page) else {
            continue;
        };
        drop_null_items(page, "mapped_apps");
        for button in drop_null_items(page, "buttons") {
            if let Some(action) = strip(button).and_then(|b| b.get_mut("action")) {
                strip(action);
            }
        }
    }
}
