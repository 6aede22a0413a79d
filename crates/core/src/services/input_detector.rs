//! Injected-Input Detector
//!
//! Low-level keyboard hook that remembers whether the most recent key-down was
//! synthesized by software. The panel's numpad shortcuts consult it so our own
//! macros and hotkeys never press buttons. The hook only observes; every event
//! is passed on unmodified.
//!
//! The hook lives on a dedicated thread running a message loop. `stop` posts
//! `WM_QUIT` to that thread and waits for it with a bounded timeout.

use std::sync::atomic::{AtomicBool, Ordering};

/// `KBDLLHOOKSTRUCT::flags` bit set for synthesized events
pub const LLKHF_INJECTED: u32 = 0x10;

const WM_KEYDOWN: usize = 0x0100;
const WM_SYSKEYDOWN: usize = 0x0104;

/// Single most-recent injected flag
#[derive(Debug, Default)]
pub struct InjectionFlag(AtomicBool);

impl InjectionFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Record one hook event; only key-downs update the flag
    pub fn record(&self, message: usize, flags: u32) {
        if message == WM_KEYDOWN || message == WM_SYSKEYDOWN {
            self.0.store(flags & LLKHF_INJECTED != 0, Ordering::Relaxed);
        }
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Written by the hook thread, read by the UI thread
static LAST_INJECTED: InjectionFlag = InjectionFlag::new();

/// Whether the most recent key-down was synthesized.
///
/// Always false when the hook is not installed.
pub fn last_was_injected() -> bool {
    LAST_INJECTED.get()
}

pub use platform::InputDetector;

#[cfg(windows)]
mod platform {
    use super::LAST_INJECTED;
    use crate::services::{wait_for_exit, ServiceError, STOP_TIMEOUT};
    use crossbeam::channel::{bounded, Receiver};
    use std::thread::{self, JoinHandle};
    use tracing::{debug, error, info, warn};
    use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
        SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, KBDLLHOOKSTRUCT, MSG,
        PM_NOREMOVE, WH_KEYBOARD_LL, WM_QUIT,
    };

    struct Running {
        thread_id: u32,
        done: Receiver<()>,
        thread: Option<JoinHandle<()>>,
    }

    #[derive(Default)]
    pub struct InputDetector {
        running: Option<Running>,
    }

    impl InputDetector {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn is_running(&self) -> bool {
            self.running.is_some()
        }

        /// Install the hook on its own thread; a no-op if already running
        pub fn start(&mut self) -> Result<(), ServiceError> {
            if self.running.is_some() {
                return Ok(());
            }

            let (ready_tx, ready_rx) = bounded::<Result<u32, String>>(1);
            let (done_tx, done_rx) = bounded::<()>(1);

            let thread = thread::Builder::new()
                .name("input-detector".to_string())
                .spawn(move || {
                    let _done = done_tx;
                    unsafe {
                        let mut msg = MSG::default();
                        // Creates this thread's message queue before anyone posts to it
                        PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);

                        let hook = match SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_proc), None, 0) {
                            Ok(hook) => hook,
                            Err(e) => {
                                let _ = ready_tx.send(Err(e.to_string()));
                                return;
                            }
                        };
                        let _ = ready_tx.send(Ok(GetCurrentThreadId()));
                        debug!("Keyboard hook installed");

                        loop {
                            match GetMessageW(&mut msg, None, 0, 0).0 {
                                -1 => {
                                    error!("GetMessage error in input detector");
                                    break;
                                }
                                0 => break,
                                _ => {
                                    TranslateMessage(&msg);
                                    DispatchMessageW(&msg);
                                }
                            }
                        }

                        let _ = UnhookWindowsHookEx(hook);
                        debug!("Keyboard hook uninstalled");
                    }
                })
                .map_err(|source| ServiceError::Spawn {
                    name: "input-detector".to_string(),
                    source,
                })?;

            let thread_id = match ready_rx.recv() {
                Ok(Ok(id)) => id,
                Ok(Err(e)) => {
                    let _ = thread.join();
                    return Err(ServiceError::Os(format!("Failed to install keyboard hook: {}", e)));
                }
                Err(_) => {
                    let _ = thread.join();
                    return Err(ServiceError::Os("Input detector thread exited early".to_string()));
                }
            };

            self.running = Some(Running {
                thread_id,
                done: done_rx,
                thread: Some(thread),
            });
            info!("Input detector started");
            Ok(())
        }

        /// Wake the hook thread and wait for it; a no-op if not running
        pub fn stop(&mut self) {
            let Some(mut running) = self.running.take() else {
                return;
            };
            unsafe {
                if let Err(e) = PostThreadMessageW(running.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) {
                    warn!("Failed to post WM_QUIT to input detector: {}", e);
                }
            }
            wait_for_exit("input-detector", &running.done, running.thread.take(), STOP_TIMEOUT);
        }
    }

    impl Drop for InputDetector {
        fn drop(&mut self) {
            self.stop();
        }
    }

    unsafe extern "system" fn keyboard_proc(n_code: i32, w_param: WPARAM, l_param: LPARAM) -> LRESULT {
        if n_code >= 0 {
            let kb_struct = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
            LAST_INJECTED.record(w_param.0, kb_struct.flags.0);
        }
        // Observe only
        CallNextHookEx(None, n_code, w_param, l_param)
    }
}

#[cfg(not(windows))]
mod platform {
    use crate::services::ServiceError;

    /// No keyboard hook on this platform; the injected flag stays false
    #[derive(Default)]
    pub struct InputDetector;

    impl InputDetector {
        pub fn new() -> Self {
            Self
        }

        pub fn is_running(&self) -> bool {
            false
        }

        pub fn start(&mut self) -> Result<(), ServiceError> {
            Err(ServiceError::Unavailable("Injected-input detection"))
        }

        pub fn stop(&mut self) {}
    }
}
