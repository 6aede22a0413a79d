//! Media Playback monitor
//!
//! Polls the system media session and emits `PlaybackChanged` when playback
//! starts or stops. Windows only (System Media Transport Controls).

use super::{spawn_poller, PollerHandle, ServiceError, ServiceEvent, STOP_TIMEOUT};
use crossbeam::channel::Sender;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Source of the current playback state
pub trait PlaybackProbe: Send {
    /// `None` when the state could not be read this time
    fn is_playing(&mut self) -> Option<bool>;
}

/// Emits only on transitions
#[derive(Debug, Default)]
pub struct PlaybackTracker {
    last: Option<bool>,
}

impl PlaybackTracker {
    pub fn poll(&mut self, probe: &mut dyn PlaybackProbe) -> Option<bool> {
        let playing = probe.is_playing()?;
        if self.last == Some(playing) {
            return None;
        }
        self.last = Some(playing);
        Some(playing)
    }
}

pub struct PlaybackMonitor {
    interval: Duration,
    handle: Option<PollerHandle>,
}

impl Default for PlaybackMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl PlaybackMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(
        &mut self,
        mut probe: Box<dyn PlaybackProbe>,
        events: Sender<ServiceEvent>,
    ) -> Result<(), ServiceError> {
        if self.handle.is_some() {
            return Ok(());
        }

        let mut tracker = PlaybackTracker::default();
        let handle = spawn_poller("playback-monitor", self.interval, move || {
            if let Some(playing) = tracker.poll(probe.as_mut()) {
                debug!("Playback {}", if playing { "started" } else { "stopped" });
                let _ = events.send(ServiceEvent::PlaybackChanged(playing));
            }
        })?;

        self.handle = Some(handle);
        info!("Playback monitor started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop(STOP_TIMEOUT);
        }
    }
}

impl Drop for PlaybackMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The platform probe
pub fn default_probe() -> Result<Box<dyn PlaybackProbe>, ServiceError> {
    #[cfg(windows)]
    {
        Ok(Box::new(smtc::SmtcProbe::new()?))
    }
    #[cfg(not(windows))]
    {
        Err(ServiceError::Unavailable("Media playback monitoring"))
    }
}

#[cfg(windows)]
mod smtc {
    use super::PlaybackProbe;
    use crate::services::ServiceError;
    use tracing::debug;
    use windows::Media::Control::{
        GlobalSystemMediaTransportControlsSessionManager as SessionManager,
        GlobalSystemMediaTransportControlsSessionPlaybackStatus as PlaybackStatus,
    };
    use windows::Win32::System::Com::{CoInitializeEx, COINIT_MULTITHREADED};

    /// Probe over the current SMTC session.
    ///
    /// The session manager is requested lazily on the polling thread, which
    /// joins the multithreaded apartment first.
    pub struct SmtcProbe {
        manager: Option<SessionManager>,
        com_ready: bool,
    }

    // WinRT agile objects may be used from any MTA thread
    unsafe impl Send for SmtcProbe {}

    impl SmtcProbe {
        pub fn new() -> Result<Self, ServiceError> {
            Ok(Self {
                manager: None,
                com_ready: false,
            })
        }

        fn manager(&mut self) -> Option<&SessionManager> {
            if !self.com_ready {
                unsafe {
                    // S_FALSE when already initialized is fine
                    let _ = CoInitializeEx(None, COINIT_MULTITHREADED);
                }
                self.com_ready = true;
            }
            if self.manager.is_none() {
                match SessionManager::RequestAsync().and_then(|op| op.get()) {
                    Ok(manager) => self.manager = Some(manager),
                    Err(e) => {
                        debug!("Media session manager unavailable: {}", e);
                        return None;
                    }
                }
            }
            self.manager.as_ref()
        }
    }

    impl PlaybackProbe for SmtcProbe {
        fn is_playing(&mut self) -> Option<bool> {
            let manager = self.manager()?;
            let Ok(session) = manager.GetCurrentSession() else {
                // No media session at all reads as "not playing"
                return Some(false);
            };
            let status = session
                .GetPlaybackInfo()
                .and_then(|info| info.PlaybackStatus())
                .ok()?;
            Some(status == PlaybackStatus::Playing)
        }
    }
}
