//! Hotkey action: sends one key chord, e.g. `{"keys": "ctrl+shift+f"}`

use super::{param_str, Action, ActionError};
use crate::config::ActionParams;
use crate::input_sender::InputSender;
use std::sync::Arc;
use tracing::{info, warn};

pub struct HotkeyAction {
    sender: Arc<dyn InputSender>,
}

impl HotkeyAction {
    pub fn new(sender: Arc<dyn InputSender>) -> Self {
        Self { sender }
    }
}

impl Action for HotkeyAction {
    fn execute(&self, params: &ActionParams) -> Result<(), ActionError> {
        let Some(keys) = param_str(params, "keys") else {
            warn!("hotkey: no keys specified");
            return Ok(());
        };

        self.sender.send_keys(keys)?;
        info!("Sent hotkey: {}", keys);
        Ok(())
    }
}
