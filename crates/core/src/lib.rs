//! SoftDeck Core Library
//!
//! Everything behind the macro pad's button grid:
//! - Config document model and persistence (config, config_manager)
//! - Action registry and the built-in executors (actions, macro_runner)
//! - OS input synthesis behind a trait (input_sender, keys)
//! - Page selection and shortcut policy for the UI thread (deck)
//! - Statically registered plugins (plugins)
//! - Background monitors that report to the UI thread over a channel (services)

pub mod actions;
pub mod config;
pub mod config_manager;
pub mod deck;
pub mod input_sender;
pub mod keys;
pub mod macro_runner;
pub mod plugins;
pub mod services;

pub use actions::{ActionError, ActionRegistry};
pub use config::{AppConfig, AppSettings, ButtonConfig, PageConfig};
pub use config_manager::{ConfigError, ConfigManager};
pub use deck::DeckState;
pub use services::{ServiceError, ServiceEvent};
