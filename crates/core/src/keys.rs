//! Key chord parsing
//!
//! Chords are written as `+`-joined key names, e.g. `ctrl+shift+f`,
//! `alt+f4`, `ctrl+``. Names are case-insensitive. Modifiers are pressed in
//! the order given and released in reverse.

use std::fmt;
use std::str::FromStr;

/// One key of a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordKey {
    Ctrl,
    Shift,
    Alt,
    Win,
    /// Printable character key (letters are stored lowercase)
    Char(char),
    /// F1..F24
    Function(u8),
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    CapsLock,
    PrintScreen,
    MediaPlayPause,
    MediaNextTrack,
    MediaPrevTrack,
    MediaStop,
    VolumeUp,
    VolumeDown,
    VolumeMute,
}

impl ChordKey {
    /// Whether this key is a modifier
    pub fn is_modifier(&self) -> bool {
        matches!(self, ChordKey::Ctrl | ChordKey::Shift | ChordKey::Alt | ChordKey::Win)
    }

    /// Convert a key name to a key
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        let key = match lower.as_str() {
            "ctrl" | "control" | "left ctrl" | "right ctrl" => ChordKey::Ctrl,
            "shift" | "left shift" | "right shift" => ChordKey::Shift,
            "alt" | "left alt" | "right alt" | "altgr" => ChordKey::Alt,
            "win" | "windows" | "cmd" | "command" | "super" | "meta" => ChordKey::Win,
            "space" | "spacebar" => ChordKey::Space,
            "enter" | "return" => ChordKey::Enter,
            "tab" => ChordKey::Tab,
            "esc" | "escape" => ChordKey::Escape,
            "backspace" => ChordKey::Backspace,
            "delete" | "del" => ChordKey::Delete,
            "insert" | "ins" => ChordKey::Insert,
            "home" => ChordKey::Home,
            "end" => ChordKey::End,
            "pageup" | "page up" | "pgup" => ChordKey::PageUp,
            "pagedown" | "page down" | "pgdn" => ChordKey::PageDown,
            "up" | "up arrow" => ChordKey::Up,
            "down" | "down arrow" => ChordKey::Down,
            "left" | "left arrow" => ChordKey::Left,
            "right" | "right arrow" => ChordKey::Right,
            "capslock" | "caps lock" => ChordKey::CapsLock,
            "printscreen" | "print screen" | "prtsc" => ChordKey::PrintScreen,
            "play/pause media" | "play_pause" | "playpause" => ChordKey::MediaPlayPause,
            "next track" | "next_track" => ChordKey::MediaNextTrack,
            "previous track" | "prev_track" => ChordKey::MediaPrevTrack,
            "stop media" | "media_stop" => ChordKey::MediaStop,
            "volume up" | "volume_up" => ChordKey::VolumeUp,
            "volume down" | "volume_down" => ChordKey::VolumeDown,
            "volume mute" | "volume_mute" | "mute" => ChordKey::VolumeMute,
            "plus" => ChordKey::Char('+'),
            _ => {
                if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                    if (1..=24).contains(&n) {
                        return Some(ChordKey::Function(n));
                    }
                    return None;
                }
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() => ChordKey::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

impl fmt::Display for ChordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChordKey::Char(c) => return write!(f, "{}", c),
            ChordKey::Function(n) => return write!(f, "f{}", n),
            ChordKey::Ctrl => "ctrl",
            ChordKey::Shift => "shift",
            ChordKey::Alt => "alt",
            ChordKey::Win => "win",
            ChordKey::Space => "space",
            ChordKey::Enter => "enter",
            ChordKey::Tab => "tab",
            ChordKey::Escape => "esc",
            ChordKey::Backspace => "backspace",
            ChordKey::Delete => "delete",
            ChordKey::Insert => "insert",
            ChordKey::Home => "home",
            ChordKey::End => "end",
            ChordKey::PageUp => "pageup",
            ChordKey::PageDown => "pagedown",
            ChordKey::Up => "up",
            ChordKey::Down => "down",
            ChordKey::Left => "left",
            ChordKey::Right => "right",
            ChordKey::CapsLock => "capslock",
            ChordKey::PrintScreen => "printscreen",
            ChordKey::MediaPlayPause => "play_pause",
            ChordKey::MediaNextTrack => "next_track",
            ChordKey::MediaPrevTrack => "prev_track",
            ChordKey::MediaStop => "media_stop",
            ChordKey::VolumeUp => "volume_up",
            ChordKey::VolumeDown => "volume_down",
            ChordKey::VolumeMute => "volume_mute",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordParseError {
    #[error("empty key chord")]
    Empty,
    #[error("unknown key name '{0}'")]
    UnknownKey(String),
}

/// A parsed key combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    keys: Vec<ChordKey>,
}

impl KeyChord {
    pub fn new(keys: Vec<ChordKey>) -> Self {
        Self { keys }
    }

    /// Keys in press order
    pub fn keys(&self) -> &[ChordKey] {
        &self.keys
    }

    /// The standard paste chord
    pub fn paste() -> Self {
        Self::new(vec![ChordKey::Ctrl, ChordKey::Char('v')])
    }
}

impl FromStr for KeyChord {
    type Err = ChordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ChordParseError::Empty);
        }
        let mut keys = Vec::new();
        let mut parts: Vec<&str> = trimmed.split('+').map(str::trim).collect();
        // Two empty trailing parts ("ctrl++", "ctrl + +", "+", "++") name the
        // plus key itself
        let n = parts.len();
        if n >= 2 && parts[n - 1].is_empty() && parts[n - 2].is_empty() {
            parts.truncate(n - 2);
            if parts.len() == 1 && parts[0].is_empty() {
                parts.clear();
            }
            parts.push("plus");
        }
        for part in parts {
            let key = ChordKey::from_name(part)
                .ok_or_else(|| ChordParseError::UnknownKey(part.to_string()))?;
            keys.push(key);
        }
        Ok(Self::new(keys))
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.keys.iter().map(|k| k.to_string()).collect();
        write!(f, "{}", names.join("+"))
    }
}
