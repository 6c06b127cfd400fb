//! Entry point for the **hyprws** command.
//!
//! ```text
//! hyprws [watch]            print the workspace list on every change
//! hyprws list               print the workspace list once
//! hyprws activate <id|name> switch to (or toggle) a workspace
//! ```

use hyprws::config::Config;
use hyprws::ipc::control::HyprlandControl;
use hyprws::ipc::SocketPaths;
use hyprws::service::{ServiceState, WorkspaceService};
use hyprws::workspace::Workspace;
use log::{error, info};
use std::time::Duration;

/// Resolve the config directory (`$XDG_CONFIG_HOME/hyprws`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("hyprws")
}

/// Try to load the config from `$XDG_CONFIG_HOME/hyprws/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config();

    match args.first().map(String::as_str) {
        None | Some("watch") => run_watch(&config),
        Some("list") => run_list(&config),
        Some("activate") => match args.get(1) {
            Some(target) => run_activate(&config, target),
            None => {
                error!("usage: hyprws activate <id|name>");
                std::process::exit(2);
            }
        },
        Some(other) => {
            error!("unknown command {:?} (expected watch, list or activate)", other);
            std::process::exit(2);
        }
    }
}

//  Commands

/// Build a service that performs only the initial refresh.
fn snapshot_service(config: &Config) -> WorkspaceService<HyprlandControl> {
    let Some(paths) = SocketPaths::resolve(&config.ipc) else {
        error!("not running under Hyprland");
        std::process::exit(1);
    };
    let control = HyprlandControl::new(&paths.control);
    let mut service = WorkspaceService::new(control, None, config.ipc.event_chunk_size);
    if let Err(e) = service.start() {
        error!("failed to start: {}", e);
        std::process::exit(1);
    }
    service
}

fn print_list(service: &WorkspaceService<HyprlandControl>) {
    for ws in service.collection().ordered() {
        println!("{}", ws);
    }
}

fn run_list(config: &Config) {
    let service = snapshot_service(config);
    print_list(&service);
}

fn run_activate(config: &Config, target: &str) {
    let service = snapshot_service(config);
    let found: Option<Workspace> = target
        .parse::<i64>()
        .ok()
        .and_then(|id| service.collection().get(id))
        .or_else(|| service.collection().find_by_name(target))
        .cloned();
    match found {
        Some(ws) => service.activate(&ws),
        None => {
            error!("no workspace {:?}", target);
            std::process::exit(1);
        }
    }
}

fn run_watch(config: &Config) {
    let mut service = WorkspaceService::from_config(&config.ipc);
    if let Err(e) = service.start() {
        error!("failed to connect to the event socket: {}", e);
        std::process::exit(1);
    }
    if service.state() == ServiceState::Disabled {
        return;
    }

    let changes = service.subscribe();
    print_list(&service);
    while service.wait_and_process(Duration::from_millis(250)) {
        if changes.try_iter().count() > 0 {
            println!("--");
            print_list(&service);
        }
    }
    info!("event stream ended");
    service.stop();
}
