//! Keyboard Input Sending (Windows)
//!
//! Synthesizes chords and characters with enigo (SendInput under the hood)
//! and writes the clipboard with arboard.

use super::{InputError, InputSender};
use crate::keys::{ChordKey, KeyChord};
use enigo::{
    Direction::{Press, Release},
    Enigo, Key, Keyboard, Settings,
};
use tracing::debug;

/// Input sender backed by enigo
#[derive(Debug, Default)]
pub struct EnigoSender {
    // Enigo instance created per call so the sender stays Send + Sync
}

impl EnigoSender {
    pub fn new() -> Self {
        Self {}
    }

    fn enigo() -> Result<Enigo, InputError> {
        Enigo::new(&Settings::default()).map_err(|e| InputError::Send(e.to_string()))
    }
}

/// Convert a chord key to an enigo key
fn to_enigo_key(key: ChordKey) -> Key {
    match key {
        ChordKey::Ctrl => Key::Control,
        ChordKey::Shift => Key::Shift,
        ChordKey::Alt => Key::Alt,
        ChordKey::Win => Key::Meta,
        ChordKey::Char(c) => Key::Unicode(c),
        // VK_F1 = 0x70 .. VK_F24 = 0x87
        ChordKey::Function(n) => Key::Other(0x6F + n as u32),
        ChordKey::Space => Key::Space,
        ChordKey::Enter => Key::Return,
        ChordKey::Tab => Key::Tab,
        ChordKey::Escape => Key::Escape,
        ChordKey::Backspace => Key::Backspace,
        ChordKey::Delete => Key::Delete,
        ChordKey::Insert => Key::Other(0x2D),
        ChordKey::Home => Key::Home,
        ChordKey::End => Key::End,
        ChordKey::PageUp => Key::PageUp,
        ChordKey::PageDown => Key::PageDown,
        ChordKey::Up => Key::UpArrow,
        ChordKey::Down => Key::DownArrow,
        ChordKey::Left => Key::LeftArrow,
        ChordKey::Right => Key::RightArrow,
        ChordKey::CapsLock => Key::CapsLock,
        ChordKey::PrintScreen => Key::Other(0x2C),
        ChordKey::MediaPlayPause => Key::Other(0xB3),
        ChordKey::MediaNextTrack => Key::Other(0xB0),
        ChordKey::MediaPrevTrack => Key::Other(0xB1),
        ChordKey::MediaStop => Key::Other(0xB2),
        ChordKey::VolumeMute => Key::Other(0xAD),
        ChordKey::VolumeDown => Key::Other(0xAE),
        ChordKey::VolumeUp => Key::Other(0xAF),
    }
}

impl InputSender for EnigoSender {
    fn send_chord(&self, chord: &KeyChord) -> Result<(), InputError> {
        let mut enigo = Self::enigo()?;
        let keys: Vec<Key> = chord.keys().iter().copied().map(to_enigo_key).collect();

        let mut pressed = Vec::with_capacity(keys.len());
        let mut result = Ok(());
        for key in &keys {
            if let Err(e) = enigo.key(*key, Press) {
                result = Err(InputError::Send(e.to_string()));
                break;
            }
            pressed.push(*key);
        }

        // Release whatever went down, even after a failed press
        for key in pressed.iter().rev() {
            if let Err(e) = enigo.key(*key, Release) {
                result = result.and(Err(InputError::Send(e.to_string())));
            }
        }

        debug!("Chord sent: {}", chord);
        result
    }

    fn type_char(&self, ch: char) -> Result<(), InputError> {
        let mut enigo = Self::enigo()?;
        enigo
            .text(&ch.to_string())
            .map_err(|e| InputError::Send(e.to_string()))
    }

    fn set_clipboard_text(&self, text: &str) -> Result<(), InputError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| InputError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| InputError::Clipboard(e.to_string()))
    }
}
