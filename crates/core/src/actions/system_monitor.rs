//! System monitor button: display only.
//!
//! Live CPU/RAM values are pushed to the UI by the system stats service;
//! through the registry this action only ever reports the placeholder.

use super::{Action, ActionError};
use crate::config::ActionParams;

/// Label shown before the first stats sample arrives
pub const STATS_PLACEHOLDER: &str = "CPU ---%\nRAM ---%";

/// Format a CPU/RAM sample as a two-line button label
pub fn format_stats(cpu: f32, ram: f32) -> String {
    format!("CPU {:.0}%\nRAM {:.0}%", cpu, ram)
}

pub struct SystemMonitorAction;

impl Action for SystemMonitorAction {
    fn execute(&self, _params: &ActionParams) -> Result<(), ActionError> {
        Ok(())
    }

    fn display_text(&self, _params: &ActionParams) -> Result<Option<String>, ActionError> {
        Ok(Some(STATS_PLACEHOLDER.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_stats() {
        assert_eq!(format_stats(12.4, 40.6), "CPU 12%\nRAM 41%");
    }
}
