//! devcon demo host.
//!
//! Runs a small scene (a cube, a floor and a lamp) and exposes it through
//! the developer console, either on this terminal or over TCP.
//! Type `help` for commands. A line holding only a Tab toggles the local
//! console; `--net` serves it on the configured port instead.

mod commands;
mod input;
mod render;
mod world;

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

use devcon_net::NetworkTransport;
use devcon_terminal::{Console, LocalTransport, Transport};
use devcon_types::config::ConsoleConfig;
use devcon_types::input::{ConsoleKey, InputEvent};

use world::World;

/// Host tick interval (~60 Hz).
const FRAME: Duration = Duration::from_millis(16);

/// How long to wait for the last response before closing the server.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut use_network = None;
    let mut config_arg = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--net" => use_network = Some(true),
            "--local" => use_network = Some(false),
            _ => config_arg = Some(arg),
        }
    }

    // Resolve config from CLI arg, DEVCON_CONFIG env var, or defaults.
    let config_path = config_arg.or_else(|| std::env::var("DEVCON_CONFIG").ok());
    let mut config = match &config_path {
        Some(path) => ConsoleConfig::load(Path::new(path))
            .with_context(|| format!("failed to load config {path}"))?,
        None => ConsoleConfig::default(),
    };
    if let Some(enabled) = use_network {
        config.network.enabled = enabled;
    }

    let world = Rc::new(RefCell::new(World::demo()));
    if config.network.enabled {
        run_network(&config, &world)?;
    } else {
        run_local(&config, &world)?;
    }
    log::info!("devcon shut down cleanly");
    Ok(())
}

fn run_network(config: &ConsoleConfig, world: &Rc<RefCell<World>>) -> Result<()> {
    let transport = NetworkTransport::start(&config.network)?;
    let addr = transport.local_addr();
    let mut console = Console::new(transport, config);
    commands::install(&mut console, world)?;
    console.start();
    log::info!("Serving the console on {addr}; send 'exit' to end a session");

    while !console.should_quit() {
        if !console.tick() {
            thread::sleep(FRAME);
        }
    }
    if !console.transport().drain(DRAIN_TIMEOUT) {
        log::warn!("Client did not receive the final response");
    }
    console.transport_mut().shutdown();
    Ok(())
}

fn run_local(config: &ConsoleConfig, world: &Rc<RefCell<World>>) -> Result<()> {
    let mut console = Console::new(LocalTransport::new(), config);
    commands::install(&mut console, world)?;
    console.handle_event(InputEvent::KeyPress(ConsoleKey::ToggleVisibility));
    console.start();

    let lines = spawn_stdin_reader();
    let mut stdout = io::stdout();
    render::draw(console.transport_mut(), &mut stdout)?;

    while !console.should_quit() {
        match lines.recv_timeout(FRAME) {
            Ok(line) => {
                let was_visible = console.transport().is_visible();
                for event in input::events_for_line(&line) {
                    console.handle_event(event);
                }
                let visible = console.transport().is_visible();
                if visible && input::is_history_key(&line) {
                    write!(stdout, "\n\x1b[2m{}\x1b[22m", console.transport().input())?;
                }
                if was_visible && !visible {
                    log::info!("Console hidden; enter a line holding only a Tab to show it");
                }
            },
            Err(RecvTimeoutError::Timeout) => {},
            Err(RecvTimeoutError::Disconnected) => break,
        }
        console.tick();
        render::draw(console.transport_mut(), &mut stdout)?;
    }
    writeln!(stdout)?;
    Ok(())
}

/// Read stdin on a helper thread so the host loop keeps ticking.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
