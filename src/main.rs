use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser};

use wayshare::Config;
use wayshare::action::{ActionDependencies, ActionError, ActionTrigger, perform_action};
use wayshare::capture::CaptureMode;
use wayshare::dispatch::CancelToken;
use wayshare::provider::ProviderRegistry;

mod daemon;

#[derive(Parser, Debug)]
#[command(name = "wayshare")]
#[command(
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("WAYSHARE_GIT_HASH"), ")"),
    about = "Screenshot and link sharing through configurable web providers"
)]
struct Cli {
    /// Run as daemon (system tray menu, SIGUSR1 runs the hotkey provider)
    #[arg(long, short = 'd', action = ArgAction::SetTrue)]
    daemon: bool,

    /// List loaded providers and exit
    #[arg(long, short = 'l', action = ArgAction::SetTrue)]
    list: bool,

    /// Run a single provider by name and print its result
    #[arg(long, short = 'r', value_name = "NAME")]
    run: Option<String>,

    /// Screenshot mode for upload providers run with --run
    #[arg(long, short = 'c', value_enum, value_name = "MODE", requires = "run")]
    capture: Option<CaptureMode>,

    /// Read provider definitions from this directory instead of the configured one
    #[arg(long, value_name = "DIR")]
    providers_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(dir) = &cli.providers_dir {
        config.providers.directory = dir.to_string_lossy().into_owned();
    }

    if cli.daemon {
        if std::env::var("WAYLAND_DISPLAY").is_err() {
            log::error!("WAYLAND_DISPLAY not set - this application requires Wayland.");
            return Err(anyhow::anyhow!("Wayland environment required"));
        }
        log::info!("Starting in daemon mode");
        let mut daemon = daemon::Daemon::new(config);
        daemon.run()?;
    } else if cli.list {
        let registry = ProviderRegistry::load_dir(&config.providers_dir())?;
        print_providers(&registry);
    } else if let Some(name) = &cli.run {
        let registry = ProviderRegistry::load_dir(&config.providers_dir())?;
        run_provider(&config, &registry, name, cli.capture)?;
    } else {
        // No flags: show usage
        println!("wayshare: Screenshot and link sharing through configurable web providers");
        println!();
        println!("Usage:");
        println!("  wayshare --daemon                 Run the tray menu in the background");
        println!("  wayshare --list                   List loaded providers");
        println!("  wayshare --run NAME [--capture M] Run one provider and print the result");
        println!("  wayshare --help                   Show help");
        println!();
        println!("Providers are JSON files read from:");
        println!("  {}", config.providers_dir().display());
        println!();
        println!("Hotkey (Hyprland):");
        println!("  1. Set [daemon] hotkey_provider in ~/.config/wayshare/config.toml");
        println!("  2. bind = SUPER SHIFT, S, exec, pkill -SIGUSR1 wayshare");
    }

    Ok(())
}

fn print_providers(registry: &ProviderRegistry) {
    println!("Uploads:");
    for provider in registry.uploads() {
        println!(
            "  {} ({} {})",
            provider.name,
            provider.request_type.as_str(),
            provider.request_url
        );
    }

    println!("Tools:");
    for provider in registry.tools() {
        println!(
            "  {} ({} {})",
            provider.name,
            provider.request_type.as_str(),
            provider.request_url
        );
    }

    if !registry.skipped().is_empty() {
        println!("Skipped:");
        for skipped in registry.skipped() {
            println!("  {}: {}", skipped.path.display(), skipped.error);
        }
    }
}

fn run_provider(
    config: &Config,
    registry: &ProviderRegistry,
    name: &str,
    capture: Option<CaptureMode>,
) -> anyhow::Result<()> {
    let provider = registry
        .find(name)
        .ok_or_else(|| ActionError::UnknownProvider(name.to_string()))?;

    let trigger = if provider.is_upload() {
        ActionTrigger::Capture(capture.unwrap_or(CaptureMode::Full))
    } else {
        if capture.is_some() {
            log::warn!("'{}' is not an upload provider; ignoring --capture", name);
        }
        ActionTrigger::Tool
    };

    let dependencies = Arc::new(ActionDependencies::from_config(config)?);
    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

    let outcome = runtime.block_on(async move {
        let cancel = CancelToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Interrupted - cancelling request");
                interrupt.cancel();
            }
        });
        perform_action(provider, trigger, dependencies, cancel).await
    })?;

    println!("{}", outcome.result);
    Ok(())
}
