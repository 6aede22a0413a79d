//! Plugins
//!
//! A plugin contributes one action type to the registry, plus a display name
//! for editors and an optional per-button icon. Plugins are registered from a
//! static list; a plugin whose `initialize` fails is skipped and the rest load
//! normally.

pub mod media_control;

pub use media_control::MediaControlPlugin;

use crate::actions::{Action, ActionRegistry};
use crate::config::ActionParams;
use crate::input_sender::InputSender;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct PluginError(pub String);

/// Collaborators handed to plugins when they build their action
#[derive(Clone)]
pub struct PluginContext {
    pub sender: Arc<dyn InputSender>,
}

pub trait Plugin: Send + Sync {
    /// Action type identifier, e.g. `media_control`
    fn action_type(&self) -> &str;

    /// Human-readable name, e.g. `Media Control`
    fn display_name(&self) -> &str;

    fn create_action(&self, ctx: &PluginContext) -> Arc<dyn Action>;

    /// Icon for a button with these params
    fn icon_path(&self, _params: &ActionParams) -> Option<PathBuf> {
        None
    }

    /// Called once before the action is registered
    fn initialize(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called on app exit
    fn shutdown(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Plugins shipped with the app
pub fn builtin_plugins() -> Vec<Box<dyn Plugin>> {
    vec![Box::new(MediaControlPlugin)]
}

/// Loaded plugins, in load order
#[derive(Default)]
pub struct PluginHost {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize each plugin and register its action
    pub fn load(&mut self, plugins: Vec<Box<dyn Plugin>>, registry: &ActionRegistry, ctx: &PluginContext) {
        for plugin in plugins {
            if let Err(e) = plugin.initialize() {
                error!("Failed to load plugin {}: {}", plugin.action_type(), e);
                continue;
            }
            registry.register(plugin.action_type(), plugin.create_action(ctx));
            info!("Loaded plugin: {} ({})", plugin.display_name(), plugin.action_type());
            self.plugins.push(plugin);
        }
    }

    /// `(action_type, display_name)` for every loaded plugin
    pub fn action_types(&self) -> Vec<(String, String)> {
        self.plugins
            .iter()
            .map(|p| (p.action_type().to_string(), p.display_name().to_string()))
            .collect()
    }

    pub fn icon_path(&self, action_type: &str, params: &ActionParams) -> Option<PathBuf> {
        self.plugins
            .iter()
            .find(|p| p.action_type() == action_type)?
            .icon_path(params)
    }

    /// Shut every plugin down; failures are logged and skipped
    pub fn shutdown_all(&self) {
        for plugin in &self.plugins {
            if let Err(e) = plugin.shutdown() {
                error!("Error shutting down plugin {}: {}", plugin.action_type(), e);
            }
        }
    }
}

/// `(action_type, display_name)` for every kind the registry knows, built-ins
/// first, named after the plugin where one provides the type
pub fn action_type_choices(registry: &ActionRegistry, host: &PluginHost) -> Vec<(String, String)> {
    let plugin_types = host.action_types();
    registry
        .action_types()
        .into_iter()
        .filter(|t| !plugin_types.iter().any(|(p, _)| p == t))
        .map(|t| {
            let name = builtin_display_name(&t);
            (t, name)
        })
        .chain(plugin_types.iter().cloned())
        .collect()
}

fn builtin_display_name(action_type: &str) -> String {
    action_type
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
