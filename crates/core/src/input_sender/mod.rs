//! Input Sending Module
//!
//! OS-level input synthesis behind the `InputSender` trait. Actions and the
//! macro runner only talk to the trait, so tests can swap in a recorder.

#[cfg(windows)]
mod keyboard;

#[cfg(windows)]
pub use keyboard::EnigoSender;

use crate::keys::{ChordParseError, KeyChord};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error(transparent)]
    Chord(#[from] ChordParseError),

    #[error("Failed to send key input: {0}")]
    Send(String),

    #[error("Clipboard operation failed: {0}")]
    Clipboard(String),

    #[error("Input synthesis is not supported on this platform")]
    Unsupported,
}

/// Synthesizes keyboard input and writes the clipboard
pub trait InputSender: Send + Sync {
    /// Press every key of the chord in order, then release in reverse
    fn send_chord(&self, chord: &KeyChord) -> Result<(), InputError>;

    /// Type a single character as one keypress
    fn type_char(&self, ch: char) -> Result<(), InputError>;

    /// Replace the clipboard contents with `text`
    fn set_clipboard_text(&self, text: &str) -> Result<(), InputError>;

    /// Parse and send a chord string such as `ctrl+shift+f`
    fn send_keys(&self, keys: &str) -> Result<(), InputError> {
        let chord: KeyChord = keys.parse()?;
        self.send_chord(&chord)
    }
}

/// Sender used where the platform has no input synthesis
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSender;

impl InputSender for UnsupportedSender {
    fn send_chord(&self, _chord: &KeyChord) -> Result<(), InputError> {
        Err(InputError::Unsupported)
    }

    fn type_char(&self, _ch: char) -> Result<(), InputError> {
        Err(InputError::Unsupported)
    }

    fn set_clipboard_text(&self, _text: &str) -> Result<(), InputError> {
        Err(InputError::Unsupported)
    }
}

/// The platform's input sender
pub fn default_sender() -> Arc<dyn InputSender> {
    #[cfg(windows)]
    {
        Arc::new(EnigoSender::new())
    }
    #[cfg(not(windows))]
    {
        tracing::warn!("Input synthesis unavailable on this platform");
        Arc::new(UnsupportedSender)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording and failing senders shared by action and macro tests

    use super::*;
    use parking_lot::Mutex;
    use std::time::Instant;

    /// One synthesized event
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Sent {
        Chord(String),
        Char(char),
        Clipboard(String),
    }

    /// Records everything sent, with timestamps
    #[derive(Default)]
    pub struct RecordingSender {
        pub events: Mutex<Vec<(Sent, Instant)>>,
        /// Chords (by display string) that fail instead of being recorded
        pub failing_chords: Vec<String>,
    }

    impl RecordingSender {
        pub fn failing_on(chords: &[&str]) -> Self {
            Self {
                failing_chords: chords.iter().map(|c| c.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn sent(&self) -> Vec<Sent> {
            self.events.lock().iter().map(|(s, _)| s.clone()).collect()
        }
    }

    impl InputSender for RecordingSender {
        fn send_chord(&self, chord: &KeyChord) -> Result<(), InputError> {
            let name = chord.to_string();
            if self.failing_chords.contains(&name) {
                return Err(InputError::Send(format!("injected failure for {}", name)));
            }
            self.events.lock().push((Sent::Chord(name), Instant::now()));
            Ok(())
        }

        fn type_char(&self, ch: char) -> Result<(), InputError> {
            self.events.lock().push((Sent::Char(ch), Instant::now()));
            Ok(())
        }

        fn set_clipboard_text(&self, text: &str) -> Result<(), InputError> {
            self.events
                .lock()
                .push((Sent::Clipboard(text.to_string()), Instant::now()));
            Ok(())
        }
    }
}
