mod config;
mod host;
mod io_thread;
mod surface;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use luna_core::{ControlServer, Dispatcher, SessionRegistry, ShellDefault};
use tokio::sync::mpsc;

use config::Config;
use host::Host;

#[derive(Parser, Debug)]
#[command(name = "luna", version, about = "Terminal host with a loopback control port")]
struct Cli {
    /// Shell for new windows (overrides the config file and $SHELL)
    #[arg(long)]
    shell: Option<String>,

    /// Number of windows to open at startup
    #[arg(long, default_value_t = 1)]
    windows: usize,

    /// Config file to use instead of ~/.config/luna/config.json
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(cli) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let shell = match cli.shell.clone().or_else(|| config.shell.clone()) {
        Some(shell) => ShellDefault::new(shell),
        None => ShellDefault::from_env(),
    };
    let registry = Arc::new(SessionRegistry::new());
    let fonts = Arc::new(config.font_selector()?);
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&registry),
        Arc::clone(&fonts),
        shell.clone(),
    ));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("luna-control")
        .enable_all()
        .build()
        .context("failed to start the control runtime")?;

    let server = runtime
        .block_on(ControlServer::bind(&config.control.server_config(), dispatcher))
        .context("failed to bind the control server")?;
    let control_port = server.local_addr()?.port();
    let (stop_tx, stop_rx) = mpsc::channel(1);
    let server_task = runtime.spawn(server.run(stop_rx));

    let (events_tx, mut events_rx) = mpsc::channel(256);
    let quit_tx = events_tx.clone();
    ctrlc::set_handler(move || {
        host::request_quit(&quit_tx);
    })
    .context("failed to install the Ctrl-C handler")?;

    let mut host = Host::new(config, registry, fonts, shell, control_port, events_tx);
    for _ in 0..cli.windows {
        if let Err(e) = host.open_window() {
            log::error!("{e:#}");
        }
    }

    if host.window_count() == 0 {
        log::error!("no window could be opened");
    } else {
        log::info!("sessions {:?} listening on port {control_port}", host.registry().ids());
        host.run(&mut events_rx);
    }

    let _ = stop_tx.try_send(());
    let _ = runtime.block_on(server_task);
    runtime.shutdown_background();
    log::info!("bye");
    Ok(())
}
