//! Macro action: `{"steps": [{"type": ..., "params": {...}}, ...]}`
//!
//! Fire-and-forget: the steps run on a background thread and `execute`
//! returns as soon as that thread is started.

use super::{Action, ActionError};
use crate::config::ActionParams;
use crate::macro_runner::{MacroRunner, MacroStep};
use serde_json::Value;
use tracing::warn;

pub struct MacroAction {
    runner: MacroRunner,
}

impl MacroAction {
    pub fn new(runner: MacroRunner) -> Self {
        Self { runner }
    }

    fn steps(params: &ActionParams) -> &[Value] {
        params
            .get("steps")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Action for MacroAction {
    fn execute(&self, params: &ActionParams) -> Result<(), ActionError> {
        let steps = Self::steps(params);
        if steps.is_empty() {
            warn!("macro: no steps defined");
            return Ok(());
        }

        self.runner
            .spawn(MacroStep::parse_all(steps))
            .map_err(ActionError::Spawn)?;
        Ok(())
    }

    fn display_text(&self, params: &ActionParams) -> Result<Option<String>, ActionError> {
        let count = Self::steps(params).len();
        if count == 0 {
            return Ok(None);
        }
        Ok(Some(format!("Macro ({} steps)", count)))
    }
}
