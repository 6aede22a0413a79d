//! Media Control plugin: `{"command": "play_pause"}`
//!
//! Presses the matching media key, so whichever player owns the system media
//! session reacts.

use super::{Plugin, PluginContext};
use crate::actions::{Action, ActionError};
use crate::config::ActionParams;
use crate::input_sender::InputSender;
use crate::keys::{ChordKey, KeyChord};
use std::sync::Arc;
use tracing::{info, warn};

pub const MEDIA_CONTROL: &str = "media_control";

/// Supported commands and the key each one presses
const COMMANDS: [(&str, ChordKey); 7] = [
    ("play_pause", ChordKey::MediaPlayPause),
    ("next_track", ChordKey::MediaNextTrack),
    ("prev_track", ChordKey::MediaPrevTrack),
    ("stop", ChordKey::MediaStop),
    ("volume_up", ChordKey::VolumeUp),
    ("volume_down", ChordKey::VolumeDown),
    ("mute", ChordKey::VolumeMute),
];

pub fn media_key(command: &str) -> Option<ChordKey> {
    COMMANDS
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, key)| *key)
}

pub struct MediaControlAction {
    sender: Arc<dyn InputSender>,
}

impl MediaControlAction {
    pub fn new(sender: Arc<dyn InputSender>) -> Self {
        Self { sender }
    }
}

impl Action for MediaControlAction {
    fn execute(&self, params: &ActionParams) -> Result<(), ActionError> {
        let command = params.get("command").and_then(|v| v.as_str()).unwrap_or("");
        if command.is_empty() {
            warn!("media_control: no command specified");
            return Ok(());
        }
        let Some(key) = media_key(command) else {
            warn!("media_control: unknown command '{}'", command);
            return Ok(());
        };

        self.sender.send_chord(&KeyChord::new(vec![key]))?;
        info!("Media command: {}", command);
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MediaControlPlugin;

impl Plugin for MediaControlPlugin {
    fn action_type(&self) -> &str {
        MEDIA_CONTROL
    }

    fn display_name(&self) -> &str {
        "Media Control"
    }

    fn create_action(&self, ctx: &PluginContext) -> Arc<dyn Action> {
        Arc::new(MediaControlAction::new(Arc::clone(&ctx.sender)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_sender::testing::{RecordingSender, Sent};
    use serde_json::json;

    fn command(name: &str) -> ActionParams {
        json!({ "command": name }).as_object().cloned().unwrap()
    }

    #[test]
    fn test_commands_press_media_keys() {
        let sender = Arc::new(RecordingSender::default());
        let action = MediaControlAction::new(sender.clone());

        for name in ["play_pause", "next_track", "mute"] {
            action.execute(&command(name)).unwrap();
        }
        assert_eq!(
            sender.sent(),
            vec![
                Sent::Chord("play_pause".into()),
                Sent::Chord("next_track".into()),
                Sent::Chord("volume_mute".into()),
            ]
        );
    }

    #[test]
    fn test_unknown_or_missing_command_is_noop() {
        let sender = Arc::new(RecordingSender::default());
        let action = MediaControlAction::new(sender.clone());

        assert!(action.execute(&command("rewind")).is_ok());
        assert!(action.execute(&ActionParams::new()).is_ok());
        assert!(sender.sent().is_empty());
    }

    #[test]
    fn test_every_command_maps_to_a_key() {
        for (name, _) in COMMANDS {
            assert!(media_key(name).is_some(), "{}", name);
        }
        assert_eq!(media_key("stop"), Some(ChordKey::MediaStop));
    }

    #[test]
    fn test_send_failure_surfaces_to_registry() {
        let sender = Arc::new(RecordingSender::failing_on(&["volume_up"]));
        let action = MediaControlAction::new(sender);
        assert!(action.execute(&command("volume_up")).is_err());
    }
}
