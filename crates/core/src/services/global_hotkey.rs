//! Global Hotkey Service
//!
//! Registers one system-wide chord that toggles panel visibility. The chord is
//! consumed by the OS registration, so other applications never see it.
//! Re-registering fully releases the previous chord first.
//!
//! On Windows the backend is the global-hotkey crate, which delivers presses
//! through the message queue of the thread that created the manager; that
//! thread must pump messages.

use super::ServiceEvent;
use crate::keys::{ChordParseError, KeyChord};
use crossbeam::channel::Sender;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("Invalid hotkey: {0}")]
    Parse(#[from] ChordParseError),

    #[error("Hotkey '{0}' cannot be registered globally")]
    Unsupported(String),

    #[error("Failed to register hotkey: {0}")]
    Register(String),

    #[error("Failed to unregister hotkey: {0}")]
    Unregister(String),

    #[error("Global hotkeys are not available on this platform")]
    Unavailable,
}

/// Callback receiving the id of each pressed hotkey
pub type PressListener = Box<dyn Fn(u32) + Send + Sync>;

/// OS hotkey registration
pub trait HotkeyBackend {
    /// Register `chord`, returning its id
    fn register(&mut self, chord: &KeyChord) -> Result<u32, HotkeyError>;

    fn unregister(&mut self, id: u32) -> Result<(), HotkeyError>;

    /// Route press notifications to `listener`
    fn set_listener(&mut self, listener: PressListener);
}

pub struct GlobalHotkeyService {
    backend: Box<dyn HotkeyBackend>,
    chord: String,
    registered: Option<u32>,
    // Read by the press listener, which may run on another thread
    active_id: Arc<AtomicU32>,
    // Replaced on every start so presses go to the latest channel
    events: Arc<Mutex<Option<Sender<ServiceEvent>>>>,
    listening: bool,
}

impl GlobalHotkeyService {
    pub fn new(backend: Box<dyn HotkeyBackend>, chord: &str) -> Self {
        Self {
            backend,
            chord: chord.to_string(),
            registered: None,
            active_id: Arc::new(AtomicU32::new(0)),
            events: Arc::new(Mutex::new(None)),
            listening: false,
        }
    }

    /// Service on the platform backend
    pub fn with_default_backend(chord: &str) -> Result<Self, HotkeyError> {
        Ok(Self::new(default_backend()?, chord))
    }

    pub fn is_running(&self) -> bool {
        self.registered.is_some()
    }

    pub fn chord(&self) -> &str {
        &self.chord
    }

    /// Register the chord and start emitting `ToggleVisibility`; a no-op if
    /// already running
    pub fn start(&mut self, events: Sender<ServiceEvent>) -> Result<(), HotkeyError> {
        if self.registered.is_some() {
            return Ok(());
        }

        *self.events.lock() = Some(events);
        if !self.listening {
            let active_id = Arc::clone(&self.active_id);
            let events = Arc::clone(&self.events);
            self.backend.set_listener(Box::new(move |id| {
                let active = active_id.load(Ordering::SeqCst);
                if active != 0 && id == active {
                    debug!("Global hotkey pressed");
                    if let Some(events) = events.lock().as_ref() {
                        let _ = events.send(ServiceEvent::ToggleVisibility);
                    }
                }
            }));
            self.listening = true;
        }

        self.register_current()
    }

    /// Release the chord; a no-op if not running
    pub fn stop(&mut self) {
        let Some(id) = self.registered.take() else {
            return;
        };
        self.active_id.store(0, Ordering::SeqCst);
        if let Err(e) = self.backend.unregister(id) {
            debug!("Ignoring unregister failure: {}", e);
        }
        info!("Global hotkey '{}' unregistered", self.chord);
    }

    /// Switch to a new chord, re-registering if the service is running
    pub fn update_hotkey(&mut self, chord: &str) -> Result<(), HotkeyError> {
        let was_running = self.registered.is_some();
        self.stop();
        self.chord = chord.to_string();
        if was_running {
            self.register_current()
        } else {
            Ok(())
        }
    }

    fn register_current(&mut self) -> Result<(), HotkeyError> {
        let chord: KeyChord = self.chord.parse()?;
        match self.backend.register(&chord) {
            Ok(id) => {
                self.registered = Some(id);
                self.active_id.store(id, Ordering::SeqCst);
                info!("Global hotkey '{}' registered", self.chord);
                Ok(())
            }
            Err(e) => {
                error!("Failed to register global hotkey '{}': {}", self.chord, e);
                Err(e)
            }
        }
    }
}

impl Drop for GlobalHotkeyService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The platform backend
pub fn default_backend() -> Result<Box<dyn HotkeyBackend>, HotkeyError> {
    #[cfg(windows)]
    {
        Ok(Box::new(win32::GlobalHotkeyBackend::new()?))
    }
    #[cfg(not(windows))]
    {
        Err(HotkeyError::Unavailable)
    }
}

#[cfg(windows)]
mod win32 {
    use super::{HotkeyBackend, HotkeyError, PressListener};
    use crate::keys::{ChordKey, KeyChord};
    use global_hotkey::{
        hotkey::{Code, HotKey, Modifiers},
        GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    };
    use std::collections::HashMap;

    const LETTERS: [Code; 26] = [
        Code::KeyA, Code::KeyB, Code::KeyC, Code::KeyD, Code::KeyE, Code::KeyF, Code::KeyG,
        Code::KeyH, Code::KeyI, Code::KeyJ, Code::KeyK, Code::KeyL, Code::KeyM, Code::KeyN,
        Code::KeyO, Code::KeyP, Code::KeyQ, Code::KeyR, Code::KeyS, Code::KeyT, Code::KeyU,
        Code::KeyV, Code::KeyW, Code::KeyX, Code::KeyY, Code::KeyZ,
    ];

    const DIGITS: [Code; 10] = [
        Code::Digit0, Code::Digit1, Code::Digit2, Code::Digit3, Code::Digit4,
        Code::Digit5, Code::Digit6, Code::Digit7, Code::Digit8, Code::Digit9,
    ];

    const FUNCTION_KEYS: [Code; 24] = [
        Code::F1, Code::F2, Code::F3, Code::F4, Code::F5, Code::F6, Code::F7, Code::F8,
        Code::F9, Code::F10, Code::F11, Code::F12, Code::F13, Code::F14, Code::F15, Code::F16,
        Code::F17, Code::F18, Code::F19, Code::F20, Code::F21, Code::F22, Code::F23, Code::F24,
    ];

    fn char_code(c: char) -> Option<Code> {
        match c {
            'a'..='z' => Some(LETTERS[(c as u8 - b'a') as usize]),
            '0'..='9' => Some(DIGITS[(c as u8 - b'0') as usize]),
            '`' => Some(Code::Backquote),
            '-' => Some(Code::Minus),
            '=' => Some(Code::Equal),
            '[' => Some(Code::BracketLeft),
            ']' => Some(Code::BracketRight),
            '\\' => Some(Code::Backslash),
            ';' => Some(Code::Semicolon),
            '\'' => Some(Code::Quote),
            ',' => Some(Code::Comma),
            '.' => Some(Code::Period),
            '/' => Some(Code::Slash),
            _ => None,
        }
    }

    fn key_code(key: ChordKey) -> Option<Code> {
        let code = match key {
            ChordKey::Char(c) => return char_code(c),
            ChordKey::Function(n) => {
                return (n as usize).checked_sub(1).and_then(|i| FUNCTION_KEYS.get(i)).copied()
            }
            ChordKey::Space => Code::Space,
            ChordKey::Enter => Code::Enter,
            ChordKey::Tab => Code::Tab,
            ChordKey::Escape => Code::Escape,
            ChordKey::Backspace => Code::Backspace,
            ChordKey::Delete => Code::Delete,
            ChordKey::Insert => Code::Insert,
            ChordKey::Home => Code::Home,
            ChordKey::End => Code::End,
            ChordKey::PageUp => Code::PageUp,
            ChordKey::PageDown => Code::PageDown,
            ChordKey::Up => Code::ArrowUp,
            ChordKey::Down => Code::ArrowDown,
            ChordKey::Left => Code::ArrowLeft,
            ChordKey::Right => Code::ArrowRight,
            ChordKey::CapsLock => Code::CapsLock,
            ChordKey::PrintScreen => Code::PrintScreen,
            ChordKey::MediaPlayPause => Code::MediaPlayPause,
            ChordKey::MediaNextTrack => Code::MediaTrackNext,
            ChordKey::MediaPrevTrack => Code::MediaTrackPrevious,
            ChordKey::MediaStop => Code::MediaStop,
            ChordKey::VolumeUp => Code::AudioVolumeUp,
            ChordKey::VolumeDown => Code::AudioVolumeDown,
            ChordKey::VolumeMute => Code::AudioVolumeMute,
            ChordKey::Ctrl | ChordKey::Shift | ChordKey::Alt | ChordKey::Win => return None,
        };
        Some(code)
    }

    /// Modifiers plus exactly one regular key
    fn to_hotkey(chord: &KeyChord) -> Result<HotKey, HotkeyError> {
        let unsupported = || HotkeyError::Unsupported(chord.to_string());
        let mut mods = Modifiers::empty();
        let mut code = None;
        for key in chord.keys() {
            match key {
                ChordKey::Ctrl => mods |= Modifiers::CONTROL,
                ChordKey::Shift => mods |= Modifiers::SHIFT,
                ChordKey::Alt => mods |= Modifiers::ALT,
                ChordKey::Win => mods |= Modifiers::META,
                other => {
                    if code.is_some() {
                        return Err(unsupported());
                    }
                    code = Some(key_code(*other).ok_or_else(unsupported)?);
                }
            }
        }
        let code = code.ok_or_else(unsupported)?;
        Ok(HotKey::new((!mods.is_empty()).then_some(mods), code))
    }

    pub struct GlobalHotkeyBackend {
        manager: GlobalHotKeyManager,
        hotkeys: HashMap<u32, HotKey>,
    }

    impl GlobalHotkeyBackend {
        pub fn new() -> Result<Self, HotkeyError> {
            let manager = GlobalHotKeyManager::new()
                .map_err(|e| HotkeyError::Register(format!("Failed to create hotkey manager: {:?}", e)))?;
            Ok(Self {
                manager,
                hotkeys: HashMap::new(),
            })
        }
    }

    impl HotkeyBackend for GlobalHotkeyBackend {
        fn register(&mut self, chord: &KeyChord) -> Result<u32, HotkeyError> {
            let hotkey = to_hotkey(chord)?;
            self.manager
                .register(hotkey)
                .map_err(|e| HotkeyError::Register(format!("{:?}", e)))?;
            self.hotkeys.insert(hotkey.id(), hotkey);
            Ok(hotkey.id())
        }

        fn unregister(&mut self, id: u32) -> Result<(), HotkeyError> {
            let Some(hotkey) = self.hotkeys.remove(&id) else {
                return Ok(());
            };
            self.manager
                .unregister(hotkey)
                .map_err(|e| HotkeyError::Unregister(format!("{:?}", e)))
        }

        fn set_listener(&mut self, listener: PressListener) {
            GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
                if event.state == HotKeyState::Pressed {
                    listener(event.id);
                }
            }));
        }
    }
}
