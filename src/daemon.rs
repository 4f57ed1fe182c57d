/// Daemon mode implementation: system tray menu plus a SIGUSR1 hotkey
use anyhow::{Context, Result, anyhow};
use ksni::TrayMethods;
use log::{debug, error, info, warn};
use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGUSR1};
use signal_hook::iterator::Signals;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, mpsc};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use wayshare::Config;
use wayshare::action::{ActionDependencies, ActionManager, ActionTrigger};
use wayshare::capture::CaptureMode;
use wayshare::provider::{Provider, ProviderRegistry};

const TRAY_START_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

type SharedRegistry = Arc<RwLock<Arc<ProviderRegistry>>>;

/// Requests sent from tray menu callbacks to the daemon loop.
#[derive(Debug)]
pub(crate) enum DaemonCommand {
    Run {
        provider: Arc<Provider>,
        trigger: ActionTrigger,
    },
    CancelPending,
    ReloadProviders,
}

pub struct Daemon {
    config: Config,
    registry: SharedRegistry,
    should_quit: Arc<AtomicBool>,
    hotkey_requested: Arc<AtomicBool>,
    /// Set after a reload so the tray thread republishes its menu.
    menu_dirty: Arc<AtomicBool>,
    tray_thread: Option<JoinHandle<()>>,
}

pub(crate) struct WayshareTray {
    registry: SharedRegistry,
    commands: mpsc::Sender<DaemonCommand>,
    quit_flag: Arc<AtomicBool>,
}

impl WayshareTray {
    fn new(
        registry: SharedRegistry,
        commands: mpsc::Sender<DaemonCommand>,
        quit_flag: Arc<AtomicBool>,
    ) -> Self {
        Self {
            registry,
            commands,
            quit_flag,
        }
    }

    fn send(&self, command: DaemonCommand) {
        if let Err(err) = self.commands.send(command) {
            warn!("Daemon loop is gone, dropping tray command: {:?}", err.0);
        }
    }

    fn provider_item(provider: &Arc<Provider>, trigger: ActionTrigger) -> ksni::MenuItem<Self> {
        let provider = Arc::clone(provider);
        ksni::menu::StandardItem {
            label: provider.name.clone(),
            activate: Box::new(move |this: &mut Self| {
                this.send(DaemonCommand::Run {
                    provider: Arc::clone(&provider),
                    trigger,
                });
            }),
            ..Default::default()
        }
        .into()
    }

    fn placeholder_item(label: &str) -> ksni::MenuItem<Self> {
        ksni::menu::StandardItem {
            label: label.to_string(),
            enabled: false,
            ..Default::default()
        }
        .into()
    }
}

impl ksni::Tray for WayshareTray {
    fn id(&self) -> String {
        "wayshare".into()
    }

    fn title(&self) -> String {
        "Wayshare".into()
    }

    fn icon_name(&self) -> String {
        "camera-photo".into()
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        let registry = current_registry(&self.registry);
        ksni::ToolTip {
            icon_name: "camera-photo".into(),
            icon_pixmap: vec![],
            title: format!("Wayshare {}", env!("CARGO_PKG_VERSION")),
            description: format!("{} provider(s) loaded", registry.len()),
        }
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        let size = 22;
        let mut data = Vec::with_capacity(size * size * 4);

        for y in 0..size {
            for x in 0..size {
                let dx = x as i32 - 11;
                let dy = y as i32 - 12;
                let (a, r, g, b) = if dx * dx + dy * dy <= 9 {
                    (255, 90, 170, 255)
                } else if dx * dx + dy * dy <= 20 {
                    (255, 40, 40, 40)
                } else if (2..=19).contains(&x) && (6..=18).contains(&y) {
                    (255, 200, 200, 200)
                } else if (7..=14).contains(&x) && (3..=5).contains(&y) {
                    (255, 160, 160, 160)
                } else {
                    (0, 0, 0, 0)
                };

                data.push(a);
                data.push(r);
                data.push(g);
                data.push(b);
            }
        }

        vec![ksni::Icon {
            width: size as i32,
            height: size as i32,
            data,
        }]
    }

    fn category(&self) -> ksni::Category {
        ksni::Category::ApplicationStatus
    }

    fn status(&self) -> ksni::Status {
        ksni::Status::Active
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        use ksni::menu::*;

        let registry = current_registry(&self.registry);
        let mut items = Vec::new();

        for mode in CaptureMode::ALL {
            let mut submenu: Vec<MenuItem<Self>> = registry
                .uploads()
                .map(|provider| Self::provider_item(provider, ActionTrigger::Capture(mode)))
                .collect();
            if submenu.is_empty() {
                submenu.push(Self::placeholder_item("No upload providers"));
            }
            items.push(
                SubMenu {
                    label: mode.menu_label().to_string(),
                    submenu,
                    ..Default::default()
                }
                .into(),
            );
        }

        let mut tools: Vec<MenuItem<Self>> = registry
            .tools()
            .map(|provider| Self::provider_item(provider, ActionTrigger::Tool))
            .collect();
        if tools.is_empty() {
            tools.push(Self::placeholder_item("No tools"));
        }
        items.push(
            SubMenu {
                label: "Tools".to_string(),
                submenu: tools,
                ..Default::default()
            }
            .into(),
        );

        items.push(MenuItem::Separator);
        items.push(
            StandardItem {
                label: "Cancel Pending Request".to_string(),
                icon_name: "process-stop".into(),
                activate: Box::new(|this: &mut Self| {
                    this.send(DaemonCommand::CancelPending);
                }),
                ..Default::default()
            }
            .into(),
        );
        items.push(
            StandardItem {
                label: "Reload Providers".to_string(),
                icon_name: "view-refresh".into(),
                activate: Box::new(|this: &mut Self| {
                    this.send(DaemonCommand::ReloadProviders);
                }),
                ..Default::default()
            }
            .into(),
        );
        items.push(MenuItem::Separator);
        items.push(
            StandardItem {
                label: "Quit".to_string(),
                icon_name: "window-close".into(),
                activate: Box::new(|this: &mut Self| {
                    this.quit_flag.store(true, Ordering::Release);
                }),
                ..Default::default()
            }
            .into(),
        );

        items
    }
}

impl Daemon {
    pub fn new(config: Config) -> Self {
        let registry = load_registry(&config).unwrap_or_else(|err| {
            warn!("Starting without providers: {:#}", err);
            ProviderRegistry::default()
        });
        Self {
            config,
            registry: Arc::new(RwLock::new(Arc::new(registry))),
            should_quit: Arc::new(AtomicBool::new(false)),
            hotkey_requested: Arc::new(AtomicBool::new(false)),
            menu_dirty: Arc::new(AtomicBool::new(false)),
            tray_thread: None,
        }
    }

    /// Run daemon with signal handling
    pub fn run(&mut self) -> Result<()> {
        info!("Starting wayshare daemon");
        match &self.config.daemon.hotkey_provider {
            Some(name) => info!(
                "Send SIGUSR1 to run '{}' (e.g., pkill -SIGUSR1 wayshare)",
                name
            ),
            None => info!("No [daemon] hotkey_provider configured; SIGUSR1 will be ignored"),
        }

        let mut signals = Signals::new([SIGUSR1, SIGTERM, SIGINT])
            .context("Failed to register signal handler")?;

        let hotkey_flag = self.hotkey_requested.clone();
        let quit_flag = self.should_quit.clone();

        // Runs until process exit; signals.forever() has no shutdown hook.
        thread::spawn(move || {
            for sig in signals.forever() {
                match sig {
                    SIGUSR1 => {
                        info!("Received SIGUSR1 - running hotkey provider");
                        hotkey_flag.store(true, Ordering::Release);
                    }
                    SIGTERM | SIGINT => {
                        info!(
                            "Received {} - initiating graceful shutdown",
                            if sig == SIGTERM { "SIGTERM" } else { "SIGINT" }
                        );
                        quit_flag.store(true, Ordering::Release);
                    }
                    _ => {
                        warn!("Received unexpected signal: {}", sig);
                    }
                }
            }
        });

        let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
        let dependencies = ActionDependencies::from_config(&self.config)
            .context("Failed to set up request transport")?;
        let manager = ActionManager::new(runtime.handle(), dependencies);

        let (command_tx, command_rx) = mpsc::channel::<DaemonCommand>();
        let tray = WayshareTray::new(self.registry.clone(), command_tx, self.should_quit.clone());
        let tray_handle = start_system_tray(tray, self.should_quit.clone(), self.menu_dirty.clone())
            .context("Failed to start system tray")?;
        self.tray_thread = Some(tray_handle);

        info!("Daemon ready");

        loop {
            if self.should_quit.load(Ordering::Acquire) {
                info!("Quit signal received - exiting daemon");
                break;
            }

            if self.hotkey_requested.swap(false, Ordering::Acquire) {
                self.run_hotkey(&manager);
            }

            match command_rx.recv_timeout(POLL_INTERVAL) {
                Ok(command) => self.handle_command(command, &manager),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    warn!("System tray went away - exiting daemon");
                    break;
                }
            }
        }

        info!("Daemon shutting down");
        self.should_quit.store(true, Ordering::Release);
        manager.cancel_current();
        if let Some(handle) = self.tray_thread.take() {
            match handle.join() {
                Ok(()) => info!("System tray thread joined"),
                Err(err) => warn!("System tray thread panicked: {:?}", err),
            }
        }
        runtime.shutdown_timeout(Duration::from_secs(1));
        Ok(())
    }

    fn handle_command(&self, command: DaemonCommand, manager: &ActionManager) {
        match command {
            DaemonCommand::Run { provider, trigger } => {
                info!("Queueing '{}' ({:?})", provider.name, trigger);
                if let Err(err) = manager.request(provider, trigger) {
                    error!("Failed to queue action: {}", err);
                }
            }
            DaemonCommand::CancelPending => {
                if !manager.cancel_current() {
                    info!("No pending request to cancel");
                }
            }
            DaemonCommand::ReloadProviders => {
                self.reload_providers();
            }
        }
    }

    /// Replaces the shared registry with a fresh load of the providers directory.
    /// The previous registry is kept if the directory cannot be read.
    fn reload_providers(&self) -> bool {
        match load_registry(&self.config) {
            Ok(registry) => {
                *self.registry.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(registry);
                self.menu_dirty.store(true, Ordering::Release);
                true
            }
            Err(err) => {
                warn!("Keeping previous providers: {:#}", err);
                false
            }
        }
    }

    /// Resolves the configured hotkey provider into an action.
    fn hotkey_action(&self) -> Option<(Arc<Provider>, ActionTrigger)> {
        let Some(name) = self.config.daemon.hotkey_provider.as_deref() else {
            warn!("SIGUSR1 received but no [daemon] hotkey_provider is configured");
            return None;
        };
        let Some(provider) = current_registry(&self.registry).find(name) else {
            warn!("Hotkey provider '{}' is not loaded", name);
            return None;
        };

        let trigger = if provider.is_upload() {
            ActionTrigger::Capture(self.config.hotkey_capture_mode())
        } else {
            ActionTrigger::Tool
        };
        Some((provider, trigger))
    }

    fn run_hotkey(&self, manager: &ActionManager) {
        if let Some((provider, trigger)) = self.hotkey_action() {
            self.handle_command(DaemonCommand::Run { provider, trigger }, manager);
        }
    }
}

fn load_registry(config: &Config) -> Result<ProviderRegistry> {
    let directory = config.providers_dir();
    ProviderRegistry::load_dir(&directory)
        .with_context(|| format!("Failed to read providers from {}", directory.display()))
}

fn current_registry(shared: &SharedRegistry) -> Arc<ProviderRegistry> {
    shared.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// System tray implementation
fn start_system_tray(
    tray: WayshareTray,
    quit_flag: Arc<AtomicBool>,
    menu_dirty: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

    info!("Spawning system tray runtime thread...");

    let tray_quit_flag = quit_flag.clone();
    let ready_thread_tx = ready_tx.clone();
    let tray_thread = thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Failed to create Tokio runtime for system tray: {}", e);
                report_tray_readiness(
                    &ready_thread_tx,
                    Err(anyhow!(
                        "Failed to create Tokio runtime for system tray: {e}"
                    )),
                );
                return;
            }
        };

        rt.block_on(async {
            match tray.spawn().await {
                Ok(handle) => {
                    info!("System tray spawned successfully");
                    report_tray_readiness(&ready_thread_tx, Ok(()));

                    loop {
                        tokio::time::sleep(POLL_INTERVAL).await;
                        if tray_quit_flag.load(Ordering::Acquire) {
                            info!("Quit signal received - shutting down system tray");
                            let _ = handle.shutdown().await;
                            break;
                        }
                        if menu_dirty.swap(false, Ordering::Acquire) {
                            debug!("Provider list changed - refreshing tray menu");
                            handle.update(|_| {}).await;
                        }
                    }
                }
                Err(e) => {
                    warn!("System tray error: {}", e);
                    report_tray_readiness(&ready_thread_tx, Err(anyhow!("System tray error: {e}")));
                }
            }
        });
    });

    drop(ready_tx);

    info!("Waiting for system tray readiness signal...");
    match ready_rx.recv_timeout(TRAY_START_TIMEOUT) {
        Ok(result) => {
            result?;
            info!("System tray thread started");
            Ok(tray_thread)
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!("Timed out waiting for system tray to start");
            quit_flag.store(true, Ordering::Release);
            let _ = tray_thread.join();
            Err(anyhow!("Timed out waiting for system tray to start"))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            let _ = tray_thread.join();
            Err(anyhow!(
                "System tray thread exited before signaling readiness"
            ))
        }
    }
}

fn report_tray_readiness(tx: &mpsc::Sender<Result<()>>, result: Result<()>) {
    if let Err(err) = tx.send(result) {
        debug!(
            "System tray readiness receiver dropped before signal could be delivered: {}",
            err
        );
    }
}
