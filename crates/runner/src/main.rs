//! SoftDeck Runner
//!
//! Hosts the deck core on a single UI thread:
//! - Loads the config and builds the action registry (built-ins + plugins)
//! - Starts the background services and reacts to their events
//! - Auto-switches pages on foreground app changes, toggles visibility on the
//!   global hotkey, follows navigate_page requests
//! - Reads numpad-style shortcut digits from the console and presses buttons
//! - Pumps the Win32 message queue the global hotkey manager depends on

use anyhow::{Context, Result};
use crossbeam::channel::{unbounded, Receiver, Sender};
use single_instance::SingleInstance;
use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use softdeck_core::{
    actions::{register_builtin_actions, PageNavigator, SYSTEM_MONITOR},
    config::AppSettings,
    deck::shortcut_position,
    input_sender,
    plugins::{action_type_choices, builtin_plugins, PluginContext, PluginHost},
    services::{
        global_hotkey::GlobalHotkeyService,
        input_detector::{self, InputDetector},
        playback_monitor::{self, PlaybackMonitor},
        system_stats::SystemStatsService,
        window_monitor::{self, ActiveWindowMonitor},
    },
    ActionRegistry, ConfigManager, DeckState, ServiceEvent,
};

const INSTANCE_NAME: &str = "SoftDeck.Runner.Instance";

/// Requests raised on the UI thread's behalf
#[derive(Debug)]
enum AppEvent {
    /// navigate_page action fired
    Navigate(String),
    /// Shortcut digit typed on the console
    Shortcut(char),
    Quit,
}

/// `PageNavigator` that defers the switch to the UI thread
struct ChannelNavigator(Sender<AppEvent>);

impl PageNavigator for ChannelNavigator {
    fn switch_to_page_id(&self, page_id: &str) {
        let _ = self.0.send(AppEvent::Navigate(page_id.to_string()));
    }
}

/// Background services owned by the UI thread
struct Services {
    window_monitor: ActiveWindowMonitor,
    input_detector: InputDetector,
    hotkey: Option<GlobalHotkeyService>,
    stats: SystemStatsService,
    playback: PlaybackMonitor,
}

impl Services {
    /// Start everything the platform supports; a failed service is logged and
    /// its feature stays off
    fn start(settings: &AppSettings, events: Sender<ServiceEvent>) -> Self {
        let mut services = Self {
            window_monitor: ActiveWindowMonitor::default(),
            input_detector: InputDetector::new(),
            hotkey: None,
            stats: SystemStatsService::default(),
            playback: PlaybackMonitor::default(),
        };

        match window_monitor::default_probe() {
            Some(probe) => {
                if let Err(e) = services.window_monitor.start(probe, events.clone()) {
                    error!("Window monitor failed to start: {}", e);
                }
            }
            None => warn!("Foreground app monitoring unavailable; auto-switch disabled"),
        }

        if let Err(e) = services.input_detector.start() {
            warn!("Injected-input detection disabled: {}", e);
        }

        match GlobalHotkeyService::with_default_backend(&settings.global_hotkey) {
            Ok(mut hotkey) => match hotkey.start(events.clone()) {
                Ok(()) => services.hotkey = Some(hotkey),
                Err(e) => warn!("Global hotkey disabled: {}", e),
            },
            Err(e) => warn!("Global hotkey disabled: {}", e),
        }

        if let Err(e) = services.stats.start(events.clone()) {
            error!("System stats service failed to start: {}", e);
        }

        match playback_monitor::default_probe() {
            Ok(probe) => {
                if let Err(e) = services.playback.start(probe, events) {
                    error!("Playback monitor failed to start: {}", e);
                }
            }
            Err(e) => debug!("{}", e),
        }

        services
    }

    fn stop_all(&mut self) {
        self.window_monitor.stop();
        self.input_detector.stop();
        if let Some(hotkey) = self.hotkey.as_mut() {
            hotkey.stop();
        }
        self.stats.stop();
        self.playback.stop();
    }
}

/// UI-thread state
struct App {
    manager: ConfigManager,
    deck: DeckState,
    registry: ActionRegistry,
    plugins: PluginHost,
    services: Services,
}

impl App {
    fn handle_service_event(&mut self, event: ServiceEvent) {
        match event {
            ServiceEvent::ForegroundAppChanged(exe) => {
                debug!("Foreground app changed: {}", exe);
                if self.deck.auto_switch_for_app(self.manager.config(), &exe) {
                    self.show_current_page();
                }
            }
            ServiceEvent::StatsUpdated { cpu, ram } => {
                self.deck.update_stats(cpu, ram);
                if self.current_page_has_monitor() {
                    if let Some(label) = self.deck.monitor_label() {
                        debug!("System monitor: {}", label.replace('\n', " | "));
                    }
                }
            }
            ServiceEvent::PlaybackChanged(playing) => {
                info!("Media playback {}", if playing { "started" } else { "stopped" });
            }
            ServiceEvent::ToggleVisibility => {
                let visible = self.deck.toggle_visibility();
                info!("Panel {}", if visible { "shown" } else { "hidden" });
                if visible {
                    self.show_current_page();
                }
            }
        }
    }

    /// Returns false once the app should quit
    fn handle_app_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Navigate(page_id) => {
                if self.deck.switch_to_page_id(self.manager.config(), &page_id) {
                    self.show_current_page();
                }
            }
            AppEvent::Shortcut(key) => self.press_shortcut(key),
            AppEvent::Quit => {
                info!("Quit requested");
                return false;
            }
        }
        true
    }

    fn press_shortcut(&mut self, key: char) {
        if !self.deck.is_visible() {
            debug!("Panel hidden, ignoring shortcut {}", key);
            return;
        }
        if self.deck.resolve_current(self.manager.config()).is_none() {
            return;
        }
        let injected = input_detector::last_was_injected();
        let Some(button) = self.deck.button_for_shortcut(self.manager.config(), key, injected) else {
            debug!("No button for shortcut {} (injected={})", key, injected);
            return;
        };

        let action = button.action.clone();
        info!("Pressed '{}' ({})", button.label, action.action_type);
        self.registry.execute(&action.action_type, &action.params);
    }

    fn current_page_has_monitor(&self) -> bool {
        self.manager
            .pages()
            .get(self.deck.current_page_index())
            .map(|page| page.buttons.iter().any(|b| b.action.action_type == SYSTEM_MONITOR))
            .unwrap_or(false)
    }

    /// Log the current page the way the panel would draw it
    fn show_current_page(&mut self) {
        let Some(index) = self.deck.resolve_current(self.manager.config()) else {
            return;
        };
        let page = &self.manager.pages()[index];
        info!("Page {}/{}: {}", index + 1, self.manager.pages().len(), page.name);

        for button in &page.buttons {
            let action = &button.action;
            let live = if action.action_type == SYSTEM_MONITOR {
                self.deck.monitor_label()
            } else {
                None
            };
            let text = live
                .or_else(|| self.registry.get_display_text(&action.action_type, &action.params))
                .unwrap_or_else(|| button.label.clone());
            let icon = self
                .plugins
                .icon_path(&action.action_type, &action.params)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| button.icon.clone());
            debug!(
                "  [{},{}] {} {}",
                button.position.0,
                button.position.1,
                text.replace('\n', " | "),
                icon
            );
        }
    }

    fn shutdown(mut self) {
        self.services.stop_all();
        self.plugins.shutdown_all();
        if let Err(e) = self.manager.save() {
            error!("Failed to save config on exit: {}", e);
        }
    }
}

/// Forward typed shortcut digits to the UI thread until stdin closes
fn spawn_console_reader(events: Sender<AppEvent>) {
    let spawned = thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                for key in line.chars().filter(|c| shortcut_position(*c).is_some()) {
                    if events.send(AppEvent::Shortcut(key)).is_err() {
                        return;
                    }
                }
            }
            debug!("Console input closed");
        });
    if let Err(e) = spawned {
        warn!("Console shortcuts unavailable: {}", e);
    }
}

/// Dispatch pending Win32 messages; returns true on WM_QUIT
#[cfg(windows)]
fn pump_messages() -> bool {
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE, WM_QUIT,
    };

    unsafe {
        let mut msg = MSG::default();
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            if msg.message == WM_QUIT {
                return true;
            }
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    false
}

#[cfg(not(windows))]
fn pump_messages() -> bool {
    false
}

fn run_event_loop(app: &mut App, service_rx: &Receiver<ServiceEvent>, app_rx: &Receiver<AppEvent>) {
    loop {
        // Global hotkey presses arrive through this thread's message queue
        if pump_messages() {
            info!("WM_QUIT received, exiting");
            return;
        }

        while let Ok(event) = service_rx.try_recv() {
            app.handle_service_event(event);
        }

        while let Ok(event) = app_rx.try_recv() {
            if !app.handle_app_event(event) {
                return;
            }
        }

        // Small sleep to avoid busy-waiting
        thread::sleep(Duration::from_millis(10));
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("SoftDeck starting...");

    let instance = SingleInstance::new(INSTANCE_NAME).context("Failed to create single-instance guard")?;
    if !instance.is_single() {
        warn!("SoftDeck is already running");
        std::process::exit(1);
    }

    let mut manager = ConfigManager::for_current_user().context("Failed to resolve config location")?;
    manager.load();
    info!(
        "Loaded {} pages from {}",
        manager.pages().len(),
        manager.path().display()
    );

    let (app_tx, app_rx) = unbounded::<AppEvent>();
    let (service_tx, service_rx) = unbounded::<ServiceEvent>();

    let sender = input_sender::default_sender();
    let registry = ActionRegistry::new();
    register_builtin_actions(
        &registry,
        Arc::clone(&sender),
        Arc::new(ChannelNavigator(app_tx.clone())),
    );
    let mut plugins = PluginHost::new();
    plugins.load(builtin_plugins(), &registry, &PluginContext { sender });
    for (action_type, name) in action_type_choices(&registry, &plugins) {
        debug!("Action available: {} ({})", name, action_type);
    }

    let services = Services::start(manager.settings(), service_tx);

    ctrlc::set_handler({
        let quit_tx = app_tx.clone();
        move || {
            let _ = quit_tx.send(AppEvent::Quit);
        }
    })
    .context("Failed to set Ctrl+C handler")?;

    spawn_console_reader(app_tx);

    let mut app = App {
        manager,
        deck: DeckState::new(),
        registry,
        plugins,
        services,
    };
    app.show_current_page();

    info!("Event loop running (Ctrl+C to quit)");
    run_event_loop(&mut app, &service_rx, &app_rx);

    app.shutdown();
    info!("SoftDeck exited");
    Ok(())
}
