//! System Stats service - pushes CPU and RAM usage to the UI
//!
//! Emits `StatsUpdated` on every poll; system monitor buttons show the latest
//! sample.

use super::{spawn_poller, PollerHandle, ServiceError, ServiceEvent, STOP_TIMEOUT};
use crossbeam::channel::Sender;
use std::time::Duration;
use sysinfo::System;
use tracing::info;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// One CPU/RAM sample in percent
fn sample(system: &mut System) -> (f32, f32) {
    system.refresh_cpu();
    system.refresh_memory();

    let cpu = system.global_cpu_info().cpu_usage();
    let total = system.total_memory();
    let ram = if total > 0 {
        (system.used_memory() as f64 / total as f64 * 100.0) as f32
    } else {
        0.0
    };
    (percent(cpu), percent(ram))
}

fn percent(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub struct SystemStatsService {
    interval: Duration,
    handle: Option<PollerHandle>,
}

impl Default for SystemStatsService {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl SystemStatsService {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self, events: Sender<ServiceEvent>) -> Result<(), ServiceError> {
        if self.handle.is_some() {
            return Ok(());
        }

        let mut system = System::new();
        // CPU usage is a delta between refreshes; prime the first one
        system.refresh_cpu();

        let handle = spawn_poller("system-stats", self.interval, move || {
            let (cpu, ram) = sample(&mut system);
            let _ = events.send(ServiceEvent::StatsUpdated { cpu, ram });
        })?;

        self.handle = Some(handle);
        info!("System stats service started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop(STOP_TIMEOUT);
        }
    }
}

impl Drop for SystemStatsService {
    fn drop(&mut self) {
        self.stop();
    }
}
