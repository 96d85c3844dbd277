//! REPL – interactive shell driving a connected [`BridgeClient`].
//!
//! Supported slash-commands:
//!   /help                   – show this list
//!   /pose                   – print the latest joint angles and coordinates
//!   /scene                  – print size, age and frame rate of the latest frame
//!   /save <file>            – write the latest frame as PNG
//!   /angle <id> <deg>       – move one joint
//!   /coord <id> <v>[,v...]  – move one Cartesian axis (or send a vector)
//!   /angles <a1,...,a6>     – move every joint
//!   /coords <x,y,z,rx,ry,rz> – move the end effector
//!   /gripper <value>        – set the gripper opening
//!   /quit | /exit           – exit the CLI
//!
//! List arguments accept commas, spaces, or both between values.

use chrono::Utc;
use colored::Colorize;
use std::io::{self, BufRead, Write};

use cobotlink_bridge::BridgeClient;
use cobotlink_types::{ControlCommand, CoordTarget};
use tracing::warn;

use crate::config::Config;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Help,
    Pose,
    Scene,
    Save(String),
    Control(ControlCommand),
    Quit,
}

/// Entry point for the interactive REPL. Returns on `/quit` or EOF.
pub fn run(client: &BridgeClient, cfg: &Config) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", "cobotlink>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse(line) {
            Ok(ReplCommand::Help) => cmd_help(),
            Ok(ReplCommand::Pose) => cmd_pose(client),
            Ok(ReplCommand::Scene) => cmd_scene(client),
            Ok(ReplCommand::Save(name)) => cmd_save(client, cfg, &name),
            Ok(ReplCommand::Control(command)) => cmd_control(client, &command),
            Ok(ReplCommand::Quit) => {
                println!("{}", "Goodbye.".green());
                break;
            }
            Err(msg) => println!("{} {}", "Error:".red(), msg),
        }

        if !client.is_connected() {
            println!("{}", "Bridge connection lost – exiting.".red().bold());
            break;
        }
    }
}

/// Parse a REPL line into a [`ReplCommand`].
pub fn parse(line: &str) -> Result<ReplCommand, String> {
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let command = match head {
        "/help" => ReplCommand::Help,
        "/pose" => ReplCommand::Pose,
        "/scene" => ReplCommand::Scene,
        "/quit" | "/exit" => ReplCommand::Quit,
        "/save" => match args.as_slice() {
            [name] => ReplCommand::Save(name.to_string()),
            _ => return Err("usage: /save <file.png>".to_string()),
        },
        "/angle" => match args.as_slice() {
            [id, angle] => ReplCommand::Control(ControlCommand::Angle {
                id: parse_id(id)?,
                angle: parse_number(angle)?,
            }),
            _ => return Err("usage: /angle <id> <degrees>".to_string()),
        },
        "/coord" => match args.as_slice() {
            [id, values @ ..] if !values.is_empty() => {
                let values = parse_list(values)?;
                let coord = if values.len() == 1 {
                    CoordTarget::Scalar(values[0])
                } else {
                    CoordTarget::Vector(values)
                };
                ReplCommand::Control(ControlCommand::Coord {
                    id: parse_id(id)?,
                    coord,
                })
            }
            _ => return Err("usage: /coord <id> <value>[,value...]".to_string()),
        },
        "/angles" => ReplCommand::Control(ControlCommand::Angles {
            angle: parse_list(&args)?,
        }),
        "/coords" => ReplCommand::Control(ControlCommand::Coords {
            coord: parse_list(&args)?,
        }),
        "/gripper" => match args.as_slice() {
            [value] => ReplCommand::Control(ControlCommand::Gripper {
                gripper: parse_number(value)?,
            }),
            _ => return Err("usage: /gripper <value>".to_string()),
        },
        other => {
            return Err(format!(
                "unknown command '{}'. Type /help for available commands.",
                other
            ));
        }
    };
    Ok(command)
}

fn parse_id(raw: &str) -> Result<i64, String> {
    raw.parse::<i64>()
        .map_err(|_| format!("'{}' is not a valid id", raw))
}

fn parse_number(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("'{}' is not a number", raw)),
    }
}

/// Numbers separated by commas, whitespace, or both.
fn parse_list(args: &[&str]) -> Result<Vec<f64>, String> {
    let values = args
        .iter()
        .flat_map(|arg| arg.split(','))
        .filter(|s| !s.is_empty())
        .map(parse_number)
        .collect::<Result<Vec<_>, _>>()?;
    if values.is_empty() {
        return Err("expected a list of numbers".to_string());
    }
    Ok(values)
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "cobotlink Commands".bold().underline());
    println!("  {}                    – latest joint angles and coordinates", "/pose".bold().cyan());
    println!("  {}                   – latest camera frame info", "/scene".bold().cyan());
    println!("  {}            – write the latest frame as PNG", "/save <file>".bold().cyan());
    println!("  {}       – move one joint", "/angle <id> <deg>".bold().cyan());
    println!("  {}  – move one Cartesian axis", "/coord <id> <v>[,v...]".bold().cyan());
    println!("  {}     – move every joint", "/angles <a1,...,a6>".bold().cyan());
    println!("  {} – move the end effector", "/coords <x,y,z,rx,ry,rz>".bold().cyan());
    println!("  {}        – set the gripper opening", "/gripper <value>".bold().cyan());
    println!("  {}            – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_pose(client: &BridgeClient) {
    match client.get_angles() {
        Ok(angles) => println!("  angles : {}", format_list(&angles).yellow()),
        Err(e) => println!("  angles : {}", e.to_string().red()),
    }
    match client.get_coords() {
        Ok(coords) => println!("  coords : {}", format_list(&coords).yellow()),
        Err(e) => println!("  coords : {}", e.to_string().red()),
    }
}

fn cmd_scene(client: &BridgeClient) {
    let Some(scene) = client.get_scene() else {
        println!("  {}", "no frame received yet".yellow());
        return;
    };
    let age_ms = (Utc::now() - scene.received_at).num_milliseconds().max(0);
    println!(
        "  {}×{} {} · {} ms old · {:.1} fps",
        scene.width(),
        scene.height(),
        scene.format.as_deref().unwrap_or("?").dimmed(),
        age_ms,
        client.fps()
    );
}

fn cmd_save(client: &BridgeClient, cfg: &Config, name: &str) {
    let Some(scene) = client.get_scene() else {
        println!("  {}", "no frame received yet".yellow());
        return;
    };
    let path = cfg.snapshot_path(name);
    match scene.save_png(&path) {
        Ok(()) => println!("  {} {}", "✓ Saved".green(), path.display().to_string().bold()),
        Err(e) => println!("  {}: {}", "Save failed".red(), e),
    }
}

fn cmd_control(client: &BridgeClient, command: &ControlCommand) {
    match client.publish(command) {
        Ok(()) => println!("  {} {}", "→".green(), command.tag().bold()),
        Err(e) => {
            warn!(tag = command.tag(), error = %e, "control command not sent");
            println!("  {}: {}", "Publish failed".red(), e);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn format_list(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{v:.2}")).collect();
    format!("[{}]", items.join(", "))
}
