//! Foreground App Monitor
//!
//! Polls the focused top-level window, resolves its owning process and emits
//! `ForegroundAppChanged` when the executable name differs from the last one
//! seen. Windows owned by this process are ignored.

use super::{spawn_poller, PollerHandle, ServiceError, ServiceEvent, STOP_TIMEOUT};
use crossbeam::channel::Sender;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// OS queries the monitor needs
pub trait ForegroundProbe: Send {
    /// Pid owning the focused top-level window
    fn foreground_pid(&mut self) -> Option<u32>;

    /// Executable name of `pid`; `None` if it exited or access was denied
    fn process_name(&mut self, pid: u32) -> Option<String>;
}

/// Transition detection, kept apart from the thread so it can be driven directly
#[derive(Debug)]
pub struct ForegroundTracker {
    own_pid: u32,
    last_exe: Option<String>,
}

impl ForegroundTracker {
    pub fn new(own_pid: u32) -> Self {
        Self {
            own_pid,
            last_exe: None,
        }
    }

    /// One poll; returns the new executable name on a change
    pub fn poll(&mut self, probe: &mut dyn ForegroundProbe) -> Option<String> {
        let pid = probe.foreground_pid()?;
        if pid == self.own_pid {
            return None;
        }
        let exe = probe.process_name(pid)?;
        if self.last_exe.as_deref() == Some(exe.as_str()) {
            return None;
        }
        self.last_exe = Some(exe.clone());
        Some(exe)
    }
}

pub struct ActiveWindowMonitor {
    interval: Duration,
    handle: Option<PollerHandle>,
}

impl Default for ActiveWindowMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl ActiveWindowMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Start polling with `probe`; a no-op if already running
    pub fn start(
        &mut self,
        mut probe: Box<dyn ForegroundProbe>,
        events: Sender<ServiceEvent>,
    ) -> Result<(), ServiceError> {
        if self.handle.is_some() {
            return Ok(());
        }

        let mut tracker = ForegroundTracker::new(std::process::id());
        let handle = spawn_poller("window-monitor", self.interval, move || {
            if let Some(exe) = tracker.poll(probe.as_mut()) {
                debug!("Foreground app: {}", exe);
                let _ = events.send(ServiceEvent::ForegroundAppChanged(exe));
            }
        })?;

        self.handle = Some(handle);
        info!("Window monitor started");
        Ok(())
    }

    /// Stop polling; a no-op if not running
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop(STOP_TIMEOUT);
        }
    }
}

impl Drop for ActiveWindowMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The platform probe, if this OS has one
pub fn default_probe() -> Option<Box<dyn ForegroundProbe>> {
    #[cfg(windows)]
    {
        Some(Box::new(win32::Win32ForegroundProbe::new()))
    }
    #[cfg(not(windows))]
    {
        None
    }
}

#[cfg(windows)]
mod win32 {
    use super::ForegroundProbe;
    use sysinfo::{Pid, System};
    use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};

    pub struct Win32ForegroundProbe {
        system: System,
    }

    impl Win32ForegroundProbe {
        pub fn new() -> Self {
            Self {
                system: System::new(),
            }
        }
    }

    impl ForegroundProbe for Win32ForegroundProbe {
        fn foreground_pid(&mut self) -> Option<u32> {
            let mut pid = 0u32;
            unsafe {
                let hwnd = GetForegroundWindow();
                if hwnd.0 == 0 {
                    return None;
                }
                GetWindowThreadProcessId(hwnd, Some(&mut pid));
            }
            (pid != 0).then_some(pid)
        }

        fn process_name(&mut self, pid: u32) -> Option<String> {
            let pid = Pid::from_u32(pid);
            if !self.system.refresh_process(pid) {
                return None;
            }
            self.system.process(pid).map(|p| p.name().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use std::collections::VecDeque;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Instant;

    /// Replays (pid, name) observations, repeating the last one
    struct ScriptedProbe {
        script: VecDeque<(u32, Option<&'static str>)>,
        current: (u32, Option<&'static str>),
    }

    impl ScriptedProbe {
        fn new(script: &[(u32, Option<&'static str>)]) -> Self {
            Self {
                script: script.iter().copied().collect(),
                current: (0, None),
            }
        }
    }

    impl ForegroundProbe for ScriptedProbe {
        fn foreground_pid(&mut self) -> Option<u32> {
            if let Some(next) = self.script.pop_front() {
                self.current = next;
            }
            Some(self.current.0)
        }

        fn process_name(&mut self, _pid: u32) -> Option<String> {
            self.current.1.map(str::to_string)
        }
    }

    #[test]
    fn test_one_event_per_transition() {
        let mut probe = ScriptedProbe::new(&[
            (10, Some("a.exe")),
            (10, Some("a.exe")),
            (20, Some("b.exe")),
            (20, Some("b.exe")),
            (20, Some("b.exe")),
            (20, Some("b.exe")),
        ]);
        let mut tracker = ForegroundTracker::new(1);

        let events: Vec<String> = (0..10).filter_map(|_| tracker.poll(&mut probe)).collect();
        assert_eq!(events, vec!["a.exe".to_string(), "b.exe".to_string()]);
    }

    #[test]
    fn test_own_process_and_lookup_failures_are_skipped() {
        let mut probe = ScriptedProbe::new(&[
            (10, Some("a.exe")),
            (1, Some("softdeck.exe")),
            (30, None),
            (10, Some("a.exe")),
        ]);
        let mut tracker = ForegroundTracker::new(1);

        assert_eq!(tracker.poll(&mut probe), Some("a.exe".into()));
        assert_eq!(tracker.poll(&mut probe), None);
        assert_eq!(tracker.poll(&mut probe), None);
        // Focus returned to the same app after our own window: no new event
        assert_eq!(tracker.poll(&mut probe), None);
    }

    /// Probe whose answer the test changes while the monitor runs
    struct SharedProbe(Arc<Mutex<&'static str>>);

    impl ForegroundProbe for SharedProbe {
        fn foreground_pid(&mut self) -> Option<u32> {
            Some(4242)
        }

        fn process_name(&mut self, _pid: u32) -> Option<String> {
            Some(self.0.lock().to_string())
        }
    }

    #[test]
    fn test_monitor_thread_emits_changes() {
        let current = Arc::new(Mutex::new("a.exe"));
        let (tx, rx) = unbounded();
        let mut monitor = ActiveWindowMonitor::new(Duration::from_millis(5));

        monitor.start(Box::new(SharedProbe(current.clone())), tx.clone()).unwrap();
        // Second start is a no-op
        monitor.start(Box::new(SharedProbe(current.clone())), tx).unwrap();
        assert!(monitor.is_running());

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(first, ServiceEvent::ForegroundAppChanged("a.exe".into()));

        *current.lock() = "b.exe";
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(second, ServiceEvent::ForegroundAppChanged("b.exe".into()));

        let start = Instant::now();
        monitor.stop();
        monitor.stop();
        assert!(!monitor.is_running());
        assert!(start.elapsed() < STOP_TIMEOUT);

        // Steady state after the switch produced nothing further
        assert!(rx.try_recv().is_err());
    }
}
