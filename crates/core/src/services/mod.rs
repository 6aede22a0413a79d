//! Background services
//!
//! Long-lived monitors that each own one thread and talk to the UI thread
//! only by sending `ServiceEvent`s down a channel. Polling services share
//! `spawn_poller`: the loop sleeps on a shutdown channel, so `stop` wakes it
//! immediately, and a loop that does not exit within the stop timeout is
//! abandoned to process exit.

pub mod global_hotkey;
pub mod input_detector;
pub mod playback_monitor;
pub mod system_stats;
pub mod window_monitor;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded wait used by every `stop`
pub const STOP_TIMEOUT: Duration = Duration::from_secs(3);

/// Notifications from services to the UI thread
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEvent {
    /// Executable name of the new foreground app
    ForegroundAppChanged(String),
    /// CPU and RAM usage in percent
    StatsUpdated { cpu: f32, ram: f32 },
    /// Media playback started (true) or stopped/paused (false)
    PlaybackChanged(bool),
    /// The global toggle hotkey was pressed
    ToggleVisibility,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to start {name} thread: {source}")]
    Spawn { name: String, source: io::Error },

    #[error("{0} is not available on this platform")]
    Unavailable(&'static str),

    #[error("{0}")]
    Os(String),
}

/// Handle to a running polling thread
pub(crate) struct PollerHandle {
    name: String,
    shutdown: Option<Sender<()>>,
    done: Receiver<()>,
    thread: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Signal the loop and wait up to `timeout` for it to exit
    pub(crate) fn stop(mut self, timeout: Duration) -> bool {
        drop(self.shutdown.take());
        wait_for_exit(&self.name, &self.done, self.thread.take(), timeout)
    }
}

/// Wait for a thread that holds the sending half of `done`; join it if it
/// finished in time, otherwise leave it running
pub(crate) fn wait_for_exit(
    name: &str,
    done: &Receiver<()>,
    thread: Option<JoinHandle<()>>,
    timeout: Duration,
) -> bool {
    match done.recv_timeout(timeout) {
        Err(RecvTimeoutError::Timeout) => {
            warn!("{} did not stop within {:?}, abandoning thread", name, timeout);
            false
        }
        _ => {
            if let Some(handle) = thread {
                let _ = handle.join();
            }
            debug!("{} stopped", name);
            true
        }
    }
}

/// Run `tick` every `interval` on a new thread until stopped
pub(crate) fn spawn_poller<F>(name: &str, interval: Duration, mut tick: F) -> Result<PollerHandle, ServiceError>
where
    F: FnMut() + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    let (done_tx, done_rx) = bounded::<()>(1);

    let thread = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            // Dropped on exit, which is what `stop` waits for
            let _done = done_tx;
            loop {
                tick();
                match shutdown_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            }
        })
        .map_err(|source| ServiceError::Spawn {
            name: name.to_string(),
            source,
        })?;

    Ok(PollerHandle {
        name: name.to_string(),
        shutdown: Some(shutdown_tx),
        done: done_rx,
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_poller_ticks_and_stops_promptly() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let handle = spawn_poller("test-poller", Duration::from_secs(60), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while ticks.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        // The long interval must not delay shutdown
        let start = Instant::now();
        assert!(handle.stop(STOP_TIMEOUT));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stuck_thread_is_abandoned() {
        let (_hold_tx, hold_rx) = bounded::<()>(0);
        let handle = spawn_poller("stuck-poller", Duration::from_millis(1), move || {
            let _ = hold_rx.recv_timeout(Duration::from_secs(2));
        })
        .unwrap();

        assert!(!handle.stop(Duration::from_millis(50)));
    }
}
