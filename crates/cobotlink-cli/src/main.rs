//! `cobotlink-cli` – operator console for a JetCobot arm
//!
//! 1. Loads `~/.cobotlink/config.toml`; runs a short **First-Run Wizard**
//!    when the file is absent.
//! 2. Connects to the arm's `rosbridge_server` and blocks until the first
//!    camera frame and pose have arrived.
//! 3. Drops the user into an **interactive REPL** for reading state and
//!    sending control commands.

mod config;
mod repl;
mod telemetry;

use colored::Colorize;
use std::process::ExitCode;
use tracing::error;

use cobotlink_bridge::BridgeClient;

fn main() -> ExitCode {
    let _guard = telemetry::init_tracing("cobotlink");

    print_banner();

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => run_first_run_wizard(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    println!(
        "\n  Connecting to {} – waiting for {} and {} …",
        cfg.bridge.url().bold(),
        "SceneNode".cyan(),
        "PoseNode".cyan()
    );
    let client = match BridgeClient::with_config(cfg.bridge.clone()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, url = %cfg.bridge.url(), "bridge startup failed");
            println!("  {} {}", "✗".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    println!("  {} All nodes ready.", "✓".green().bold());

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    repl::run(&client, &cfg);
    ExitCode::SUCCESS
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║     cobotlink First-Run Wizard       ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Where is the arm?\n");

    let mut cfg = config::Config::default();

    cfg.bridge.host = prompt_line(
        &format!("  rosbridge host [{}]: ", cfg.bridge.host),
        &cfg.bridge.host,
    );

    let port_str = prompt_line(
        &format!("  rosbridge WebSocket port [{}]: ", cfg.bridge.port),
        &cfg.bridge.port.to_string(),
    );
    match port_str.trim().parse::<u16>() {
        Ok(p) => cfg.bridge.port = p,
        Err(_) => println!(
            "  {} '{}' is not a valid port number, keeping {}",
            "Warning:".yellow(),
            port_str,
            cfg.bridge.port
        ),
    }

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }

    config::apply_env_overrides(&mut cfg);
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!(
        "  {} {}",
        "cobotlink".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  rosbridge console for the JetCobot arm");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn prompt_line(msg: &str, default: &str) -> String {
    use std::io::{BufRead, Write};
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let t = line.trim().to_string();
            if t.is_empty() { default.to_string() } else { t }
        }
        Err(_) => default.to_string(),
    }
}
