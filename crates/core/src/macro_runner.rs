//! Macro Runner - executes macro steps on a background thread
//!
//! Each invocation gets its own thread and step cursor. Steps run strictly in
//! order; a delay step blocks only the macro's thread. A failing step is logged
//! with its index and type and the macro moves on to the next step. Macros are
//! not cancellable once started.

use crate::input_sender::{InputError, InputSender};
use crate::keys::KeyChord;
use serde_json::Value;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Delay between characters typed one by one
pub const TYPING_DELAY: Duration = Duration::from_millis(20);

/// Delay used when a delay step has no usable `ms`
pub const DEFAULT_DELAY_MS: u64 = 100;

/// One step of a macro
#[derive(Debug, Clone, PartialEq)]
pub enum MacroStep {
    /// Send a key chord
    Hotkey { keys: String },
    /// Type text, either per character or by pasting through the clipboard
    TextInput { text: String, use_clipboard: bool },
    /// Pause the macro
    Delay { ms: u64 },
    /// Unrecognized step type; skipped at run time
    Unknown { step_type: String },
}

impl MacroStep {
    /// Parse a `{"type": ..., "params": {...}}` step, defaulting missing fields
    pub fn from_value(value: &Value) -> Self {
        let step_type = value.get("type").and_then(Value::as_str).unwrap_or("");
        let empty = Value::Null;
        let params = value.get("params").unwrap_or(&empty);
        let str_param = |key: &str| {
            params
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        };

        match step_type {
            "hotkey" => MacroStep::Hotkey {
                keys: str_param("keys"),
            },
            "text_input" => MacroStep::TextInput {
                text: str_param("text"),
                use_clipboard: params
                    .get("use_clipboard")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            "delay" => MacroStep::Delay {
                ms: params.get("ms").map_or(DEFAULT_DELAY_MS, parse_ms),
            },
            other => MacroStep::Unknown {
                step_type: other.to_string(),
            },
        }
    }

    /// Parse a list of step documents
    pub fn parse_all(values: &[Value]) -> Vec<MacroStep> {
        values.iter().map(MacroStep::from_value).collect()
    }

    /// The step's type identifier
    pub fn step_type(&self) -> &str {
        match self {
            MacroStep::Hotkey { .. } => "hotkey",
            MacroStep::TextInput { .. } => "text_input",
            MacroStep::Delay { .. } => "delay",
            MacroStep::Unknown { step_type } => step_type,
        }
    }
}

fn parse_ms(value: &Value) -> u64 {
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|f| f.max(0.0).round() as u64))
        .unwrap_or(DEFAULT_DELAY_MS)
}

/// Spawns macro executions
#[derive(Clone)]
pub struct MacroRunner {
    sender: Arc<dyn InputSender>,
    typing_delay: Duration,
}

impl MacroRunner {
    pub fn new(sender: Arc<dyn InputSender>) -> Self {
        Self {
            sender,
            typing_delay: TYPING_DELAY,
        }
    }

    /// Override the per-character typing delay
    pub fn with_typing_delay(mut self, delay: Duration) -> Self {
        self.typing_delay = delay;
        self
    }

    /// Start a macro on its own thread and return immediately
    pub fn spawn(&self, steps: Vec<MacroStep>) -> io::Result<JoinHandle<()>> {
        let sender = Arc::clone(&self.sender);
        let typing_delay = self.typing_delay;
        thread::Builder::new()
            .name("macro".to_string())
            .spawn(move || run_steps(sender.as_ref(), &steps, typing_delay))
    }
}

/// Execute steps in order on the current thread
pub fn run_steps(sender: &dyn InputSender, steps: &[MacroStep], typing_delay: Duration) {
    debug!("Macro started ({} steps)", steps.len());
    for (i, step) in steps.iter().enumerate() {
        if let Err(e) = run_step(sender, i, step, typing_delay) {
            error!("Macro step {} failed (type={}): {}", i, step.step_type(), e);
        }
    }
    debug!("Macro finished");
}

fn run_step(
    sender: &dyn InputSender,
    index: usize,
    step: &MacroStep,
    typing_delay: Duration,
) -> Result<(), InputError> {
    match step {
        MacroStep::Hotkey { keys } => {
            if !keys.is_empty() {
                sender.send_keys(keys)?;
                info!("Macro step {}: sent hotkey {}", index, keys);
            }
        }
        MacroStep::TextInput {
            text,
            use_clipboard,
        } => {
            if !text.is_empty() {
                if *use_clipboard {
                    sender.set_clipboard_text(text)?;
                    sender.send_chord(&KeyChord::paste())?;
                } else {
                    for ch in text.chars() {
                        sender.type_char(ch)?;
                        thread::sleep(typing_delay);
                    }
                }
                info!(
                    "Macro step {}: text input ({} chars)",
                    index,
                    text.chars().count()
                );
            }
        }
        MacroStep::Delay { ms } => {
            thread::sleep(Duration::from_millis(*ms));
            info!("Macro step {}: delay {}ms", index, ms);
        }
        MacroStep::Unknown { step_type } => {
            warn!("Macro step {}: unknown type '{}'", index, step_type);
        }
    }
    Ok(())
}
