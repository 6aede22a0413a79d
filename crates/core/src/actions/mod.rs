//! Action Registry
//!
//! Maps action type identifiers ("launch_app", "hotkey", ...) to executors.
//! The registry is the failure boundary between buttons and the UI: unknown
//! types are no-ops, and any error or panic raised by an executor is logged
//! and swallowed here so one broken button cannot take down dispatch.

mod hotkey;
mod launch_app;
mod macro_action;
mod navigate;
mod system_monitor;

pub use hotkey::HotkeyAction;
pub use launch_app::{split_args, LaunchAppAction};
pub use macro_action::MacroAction;
pub use navigate::{NavigatePageAction, PageNavigator};
pub use system_monitor::{format_stats, SystemMonitorAction, STATS_PLACEHOLDER};

use crate::config::ActionParams;
use crate::input_sender::{InputError, InputSender};
use crate::macro_runner::MacroRunner;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const LAUNCH_APP: &str = "launch_app";
pub const HOTKEY: &str = "hotkey";
pub const MACRO: &str = "macro";
pub const SYSTEM_MONITOR: &str = "system_monitor";
pub const NAVIGATE_PAGE: &str = "navigate_page";

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Failed to launch '{path}': {source}")]
    Launch {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to start macro thread: {0}")]
    Spawn(std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Behaviour behind one action type
pub trait Action: Send + Sync {
    /// Perform the action's side effect
    fn execute(&self, params: &ActionParams) -> Result<(), ActionError>;

    /// Dynamic button text, or `None` to use the static label
    fn display_text(&self, _params: &ActionParams) -> Result<Option<String>, ActionError> {
        Ok(None)
    }
}

/// Non-empty string parameter
pub(crate) fn param_str<'a>(params: &'a ActionParams, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Registry of action executors keyed by type identifier
#[derive(Default)]
pub struct ActionRegistry {
    actions: RwLock<HashMap<String, Arc<dyn Action>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `action_type` with an executor; the last registration wins
    pub fn register(&self, action_type: impl Into<String>, action: Arc<dyn Action>) {
        let action_type = action_type.into();
        debug!("Registered action: {}", action_type);
        self.actions.write().insert(action_type, action);
    }

    pub fn get_action(&self, action_type: &str) -> Option<Arc<dyn Action>> {
        self.actions.read().get(action_type).cloned()
    }

    /// Registered type identifiers, sorted
    pub fn action_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.actions.read().keys().cloned().collect();
        types.sort();
        types
    }

    /// Run an action; never fails and never panics past this call
    pub fn execute(&self, action_type: &str, params: &ActionParams) {
        if action_type.is_empty() {
            debug!("Button has no action");
            return;
        }
        let Some(action) = self.get_action(action_type) else {
            warn!("Unknown action type: {}", action_type);
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| action.execute(params))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(
                "Action {} failed with params {}: {}",
                action_type,
                serde_json::Value::Object(params.clone()),
                e
            ),
            Err(payload) => error!(
                "Action {} panicked with params {}: {}",
                action_type,
                serde_json::Value::Object(params.clone()),
                panic_message(payload.as_ref())
            ),
        }
    }

    /// Dynamic text for a button; any failure reads as "no dynamic text"
    pub fn get_display_text(&self, action_type: &str, params: &ActionParams) -> Option<String> {
        let action = self.get_action(action_type)?;
        match panic::catch_unwind(AssertUnwindSafe(|| action.display_text(params))) {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                debug!("display_text for {} failed: {}", action_type, e);
                None
            }
            Err(_) => None,
        }
    }
}

/// Register the built-in action kinds
pub fn register_builtin_actions(
    registry: &ActionRegistry,
    sender: Arc<dyn InputSender>,
    navigator: Arc<dyn PageNavigator>,
) {
    registry.register(LAUNCH_APP, Arc::new(LaunchAppAction::new()));
    registry.register(HOTKEY, Arc::new(HotkeyAction::new(sender.clone())));
    registry.register(MACRO, Arc::new(MacroAction::new(MacroRunner::new(sender))));
    registry.register(SYSTEM_MONITOR, Arc::new(SystemMonitorAction));
    registry.register(NAVIGATE_PAGE, Arc::new(NavigatePageAction::new(navigator)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_sender::testing::{RecordingSender, Sent};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAction {
        calls: AtomicUsize,
    }

    impl Action for CountingAction {
        fn execute(&self, _params: &ActionParams) -> Result<(), ActionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingAction;

    impl Action for FailingAction {
        fn execute(&self, _params: &ActionParams) -> Result<(), ActionError> {
            Err(ActionError::Other("os call failed".into()))
        }

        fn display_text(&self, _params: &ActionParams) -> Result<Option<String>, ActionError> {
            Err(ActionError::Other("no text".into()))
        }
    }

    struct PanickingAction;

    impl Action for PanickingAction {
        fn execute(&self, _params: &ActionParams) -> Result<(), ActionError> {
            panic!("executor blew up");
        }

        fn display_text(&self, _params: &ActionParams) -> Result<Option<String>, ActionError> {
            panic!("display blew up");
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        requests: Mutex<Vec<String>>,
    }

    impl PageNavigator for RecordingNavigator {
        fn switch_to_page_id(&self, page_id: &str) {
            self.requests.lock().push(page_id.to_string());
        }
    }

    fn params(value: serde_json::Value) -> ActionParams {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = ActionRegistry::new();
        let first = Arc::new(CountingAction { calls: AtomicUsize::new(0) });
        let second = Arc::new(CountingAction { calls: AtomicUsize::new(0) });
        registry.register("count", first.clone());
        registry.register("count", second.clone());

        registry.execute("count", &ActionParams::new());
        assert_eq!(first.calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_type_is_noop() {
        let registry = ActionRegistry::new();
        registry.execute("does_not_exist", &ActionParams::new());
        registry.execute("", &ActionParams::new());
        assert_eq!(registry.get_display_text("does_not_exist", &ActionParams::new()), None);
    }

    #[test]
    fn test_failures_are_contained() {
        let registry = ActionRegistry::new();
        registry.register("fail", Arc::new(FailingAction));
        registry.register("panic", Arc::new(PanickingAction));

        registry.execute("fail", &ActionParams::new());
        registry.execute("panic", &ActionParams::new());
        assert_eq!(registry.get_display_text("fail", &ActionParams::new()), None);
        assert_eq!(registry.get_display_text("panic", &ActionParams::new()), None);
    }

    #[test]
    fn test_builtin_actions_registered() {
        let registry = ActionRegistry::new();
        let sender = Arc::new(RecordingSender::default());
        register_builtin_actions(&registry, sender, Arc::new(RecordingNavigator::default()));
        assert_eq!(
            registry.action_types(),
            vec!["hotkey", "launch_app", "macro", "navigate_page", "system_monitor"]
        );
    }

    #[test]
    fn test_hotkey_through_registry() {
        let registry = ActionRegistry::new();
        let sender = Arc::new(RecordingSender::default());
        register_builtin_actions(&registry, sender.clone(), Arc::new(RecordingNavigator::default()));

        registry.execute(HOTKEY, &params(json!({"keys": "ctrl+shift+f"})));
        registry.execute(HOTKEY, &params(json!({})));
        assert_eq!(sender.sent(), vec![Sent::Chord("ctrl+shift+f".into())]);
    }

    #[test]
    fn test_failing_os_call_does_not_escape_registry() {
        let registry = ActionRegistry::new();
        let sender = Arc::new(RecordingSender::failing_on(&["ctrl+a"]));
        register_builtin_actions(&registry, sender.clone(), Arc::new(RecordingNavigator::default()));

        registry.execute(HOTKEY, &params(json!({"keys": "ctrl+a"})));
        assert!(sender.sent().is_empty());
    }

    #[test]
    fn test_failed_launch_does_not_escape_registry() {
        let registry = ActionRegistry::new();
        let sender = Arc::new(RecordingSender::default());
        register_builtin_actions(&registry, sender.clone(), Arc::new(RecordingNavigator::default()));

        let missing = tempfile::tempdir().unwrap().path().join("softdeck-missing-program");
        registry.execute(LAUNCH_APP, &params(json!({"path": missing.to_str().unwrap()})));

        registry.execute(HOTKEY, &params(json!({"keys": "ctrl+a"})));
        assert_eq!(sender.sent(), vec![Sent::Chord("ctrl+a".into())]);
    }

    #[test]
    fn test_navigate_through_registry() {
        let registry = ActionRegistry::new();
        let navigator = Arc::new(RecordingNavigator::default());
        register_builtin_actions(&registry, Arc::new(RecordingSender::default()), navigator.clone());

        registry.execute(NAVIGATE_PAGE, &params(json!({"page_id": "page_b"})));
        registry.execute(NAVIGATE_PAGE, &params(json!({})));
        assert_eq!(*navigator.requests.lock(), vec!["page_b".to_string()]);
    }

    #[test]
    fn test_display_text_through_registry() {
        let registry = ActionRegistry::new();
        register_builtin_actions(
            &registry,
            Arc::new(RecordingSender::default()),
            Arc::new(RecordingNavigator::default()),
        );

        let steps = params(json!({"steps": [{"type": "delay"}, {"type": "delay"}, {"type": "delay"}]}));
        assert_eq!(registry.get_display_text(MACRO, &steps), Some("Macro (3 steps)".into()));
        assert_eq!(registry.get_display_text(MACRO, &params(json!({"steps": []}))), None);
        assert_eq!(
            registry.get_display_text(SYSTEM_MONITOR, &ActionParams::new()),
            Some(STATS_PLACEHOLDER.into())
        );
        assert_eq!(registry.get_display_text(HOTKEY, &ActionParams::new()), None);
    }
}
