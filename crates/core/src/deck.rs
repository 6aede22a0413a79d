//! Deck State
//!
//! The page-selection policy the panel runs on its UI thread: which page is
//! current, whether the panel is shown, automatic switching on foreground app
//! changes, and the numpad shortcuts that press buttons on the current page.

use crate::actions::format_stats;
use crate::config::{AppConfig, ButtonConfig};
use crate::config_manager::ConfigManager;
use tracing::{debug, info};

/// Numpad-style digits mapped onto the top-left 3x3 grid
const SHORTCUT_KEYS: [(char, (u32, u32)); 9] = [
    ('7', (0, 0)),
    ('8', (0, 1)),
    ('9', (0, 2)),
    ('4', (1, 0)),
    ('5', (1, 1)),
    ('6', (1, 2)),
    ('1', (2, 0)),
    ('2', (2, 1)),
    ('3', (2, 2)),
];

/// Grid position a shortcut digit presses
pub fn shortcut_position(key: char) -> Option<(u32, u32)> {
    SHORTCUT_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, pos)| *pos)
}

/// UI-side selection state
#[derive(Debug, Clone)]
pub struct DeckState {
    current_page: usize,
    visible: bool,
    latest_stats: Option<(f32, f32)>,
}

impl Default for DeckState {
    fn default() -> Self {
        Self {
            current_page: 0,
            visible: true,
            latest_stats: None,
        }
    }
}

impl DeckState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current page index, reset to the first page if it fell off the end
    pub fn resolve_current(&mut self, config: &AppConfig) -> Option<usize> {
        if config.pages.is_empty() {
            return None;
        }
        if self.current_page >= config.pages.len() {
            self.current_page = 0;
        }
        Some(self.current_page)
    }

    /// Show the page at `index`; out-of-range indexes are ignored
    pub fn switch_to_page_index(&mut self, config: &AppConfig, index: usize) -> bool {
        let Some(page) = config.pages.get(index) else {
            return false;
        };
        self.current_page = index;
        info!("Switched to page: {}", page.name);
        true
    }

    /// Show the page with `page_id`; unknown ids are ignored
    pub fn switch_to_page_id(&mut self, config: &AppConfig, page_id: &str) -> bool {
        match config.page_index_by_id(page_id) {
            Some(index) => self.switch_to_page_index(config, index),
            None => {
                debug!("Ignoring navigation to unknown page {}", page_id);
                false
            }
        }
    }

    /// React to a foreground app change; returns true if the page changed
    pub fn auto_switch_for_app(&mut self, config: &AppConfig, exe_name: &str) -> bool {
        if !config.settings.auto_switch_enabled {
            return false;
        }
        match config.page_index_for_app(exe_name) {
            Some(index) if index != self.current_page => {
                self.switch_to_page_index(config, index)
            }
            _ => false,
        }
    }

    /// Delete a page and keep the selection in range.
    ///
    /// Deleting the last remaining page is rejected.
    pub fn delete_page(&mut self, manager: &mut ConfigManager, index: usize) -> bool {
        if !manager.delete_page(index) {
            return false;
        }
        let page_count = manager.pages().len();
        if self.current_page >= page_count {
            self.current_page = page_count - 1;
        }
        true
    }

    /// Append a page and select it
    pub fn add_page(&mut self, manager: &mut ConfigManager, name: &str) -> String {
        let id = manager.add_page(name).id.clone();
        self.current_page = manager.pages().len() - 1;
        id
    }

    /// Flip panel visibility, returning the new state
    pub fn toggle_visibility(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    /// Button a physical shortcut key presses on the current page.
    ///
    /// Events synthesized by software (our own macros and hotkeys) never
    /// trigger buttons.
    pub fn button_for_shortcut<'a>(
        &self,
        config: &'a AppConfig,
        key: char,
        injected: bool,
    ) -> Option<&'a ButtonConfig> {
        if injected {
            return None;
        }
        let (row, col) = shortcut_position(key)?;
        if !config.settings.contains(row, col) {
            return None;
        }
        config.pages.get(self.current_page)?.button_at(row, col)
    }

    /// Record a stats sample pushed by the stats service
    pub fn update_stats(&mut self, cpu: f32, ram: f32) {
        self.latest_stats = Some((cpu, ram));
    }

    /// Label for system monitor buttons, if a sample has arrived
    pub fn monitor_label(&self) -> Option<String> {
        self.latest_stats.map(|(cpu, ram)| format_stats(cpu, ram))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActionConfig, PageConfig};
    use crate::config_manager::CONFIG_FILE_NAME;

    fn page(id: &str, apps: &[&str]) -> PageConfig {
        PageConfig {
            id: id.into(),
            name: id.into(),
            mapped_apps: apps.iter().map(|a| a.to_string()).collect(),
            buttons: vec![],
        }
    }

    fn config() -> AppConfig {
        AppConfig {
            pages: vec![page("main", &[]), page("game", &["Game.exe"]), page("code", &["Code.exe"])],
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_switch_by_id_ignores_unknown() {
        let config = config();
        let mut deck = DeckState::new();
        assert!(deck.switch_to_page_id(&config, "code"));
        assert_eq!(deck.current_page_index(), 2);
        assert!(!deck.switch_to_page_id(&config, "nope"));
        assert_eq!(deck.current_page_index(), 2);
        assert!(!deck.switch_to_page_index(&config, 9));
    }

    #[test]
    fn test_auto_switch_respects_setting() {
        let mut config = config();
        let mut deck = DeckState::new();
        assert!(deck.auto_switch_for_app(&config, "game.EXE"));
        assert_eq!(deck.current_page_index(), 1);
        assert!(!deck.auto_switch_for_app(&config, "explorer.exe"));
        assert_eq!(deck.current_page_index(), 1);

        config.settings.auto_switch_enabled = false;
        assert!(!deck.auto_switch_for_app(&config, "code.exe"));
        assert_eq!(deck.current_page_index(), 1);
    }

    #[test]
    fn test_delete_reindexes_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join(CONFIG_FILE_NAME), None);
        *manager.config_mut() = config();
        let mut deck = DeckState::new();
        deck.switch_to_page_index(manager.config(), 2);

        assert!(deck.delete_page(&mut manager, 2));
        assert_eq!(deck.current_page_index(), 1);
        assert!(deck.delete_page(&mut manager, 0));
        assert_eq!(deck.current_page_index(), 0);
        assert!(!deck.delete_page(&mut manager, 0));
        assert_eq!(manager.pages().len(), 1);
        assert_eq!(manager.pages()[0].id, "game");
    }

    #[test]
    fn test_add_page_selects_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join(CONFIG_FILE_NAME), None);
        manager.load();
        let mut deck = DeckState::new();
        let id = deck.add_page(&mut manager, "Extra");
        assert_eq!(deck.current_page_index(), 1);
        assert_eq!(manager.pages()[1].id, id);
    }

    #[test]
    fn test_shortcut_ignores_injected_keys() {
        let mut config = config();
        config.pages[0].set_button(ButtonConfig::new(0, 0, "seven", ActionConfig::default()));
        config.pages[0].set_button(ButtonConfig::new(2, 2, "three", ActionConfig::default()));
        let deck = DeckState::new();

        assert_eq!(deck.button_for_shortcut(&config, '7', false).unwrap().label, "seven");
        assert_eq!(deck.button_for_shortcut(&config, '3', false).unwrap().label, "three");
        assert!(deck.button_for_shortcut(&config, '7', true).is_none());
        assert!(deck.button_for_shortcut(&config, '5', false).is_none());
        assert!(deck.button_for_shortcut(&config, 'x', false).is_none());
    }

    #[test]
    fn test_shortcut_outside_grid() {
        let mut config = config();
        config.settings.grid_rows = 2;
        config.pages[0].set_button(ButtonConfig::new(2, 0, "one", ActionConfig::default()));
        let deck = DeckState::new();
        assert!(deck.button_for_shortcut(&config, '1', false).is_none());
    }

    #[test]
    fn test_visibility_and_stats() {
        let mut deck = DeckState::new();
        assert!(deck.is_visible());
        assert!(!deck.toggle_visibility());
        assert!(deck.toggle_visibility());

        assert_eq!(deck.monitor_label(), None);
        deck.update_stats(50.0, 25.0);
        assert_eq!(deck.monitor_label().unwrap(), "CPU 50%\nRAM 25%");
    }

    #[test]
    fn test_resolve_current_resets_out_of_range() {
        let mut config = config();
        let mut deck = DeckState::new();
        deck.switch_to_page_index(&config, 2);
        config.pages.truncate(1);
        assert_eq!(deck.resolve_current(&config), Some(0));
        config.pages.clear();
        assert_eq!(deck.resolve_current(&config), None);
    }
}
