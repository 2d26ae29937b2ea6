//! Console output and the interactive mapping REPL

use anyhow::{bail, Result};
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use inputmap::host::HostMappingTable;
use inputmap::model::{Device, DeviceRegistry, ReconcileReport};
use inputmap::persistence::SaveStore;
use inputmap::{Key, MappingManager, Modifiers};

/// One parsed REPL line
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Help,
    List,
    Show(String),
    Bind {
        device: String,
        action: String,
        key: String,
        modifiers: Modifiers,
    },
    BindAxis {
        device: String,
        axis: String,
        key: String,
        scale: f32,
    },
    Unbind { device: String, action: String },
    UnbindAxis { device: String, axis: String },
    Reload,
    Save,
    Apply { force: bool },
    Persist,
    Export(String),
    Import(String),
    Presets,
    Reconcile,
    Exit,
}

/// Split a line on whitespace, keeping double-quoted runs together
pub fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            },
            c if c.is_whitespace() && !quoted => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            },
            c => {
                current.push(c);
                pending = true;
            },
        }
    }
    if pending {
        args.push(current);
    }
    args
}

/// Parse `ctrl+shift` style modifier lists
pub fn parse_modifiers(text: &str) -> Result<Modifiers> {
    let mut modifiers = Modifiers::NONE;
    for part in text.split('+').map(str::trim).filter(|p| !p.is_empty()) {
        match part.to_ascii_lowercase().as_str() {
            "shift" => modifiers.shift = true,
            "ctrl" | "control" => modifiers.ctrl = true,
            "alt" => modifiers.alt = true,
            "cmd" | "command" => modifiers.cmd = true,
            other => bail!("Unknown modifier '{}'", other),
        }
    }
    Ok(modifiers)
}

impl ReplCommand {
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let args = split_args(line);
        let Some((name, rest)) = args.split_first() else {
            return Ok(None);
        };

        let arg = |i: usize, what: &str| -> Result<String> {
            rest.get(i)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Missing {} for '{}'", what, name))
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "help" | "?" => ReplCommand::Help,
            "list" | "ls" => ReplCommand::List,
            "show" => ReplCommand::Show(arg(0, "device")?),
            "bind" => ReplCommand::Bind {
                device: arg(0, "device")?,
                action: arg(1, "action")?,
                key: arg(2, "key")?,
                modifiers: match rest.get(3) {
                    Some(text) => parse_modifiers(text)?,
                    None => Modifiers::NONE,
                },
            },
            "bindaxis" => ReplCommand::BindAxis {
                device: arg(0, "device")?,
                axis: arg(1, "axis")?,
                key: arg(2, "key")?,
                scale: match rest.get(3) {
                    Some(text) => text
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Invalid scale '{}'", text))?,
                    None => 1.0,
                },
            },
            "unbind" => ReplCommand::Unbind {
                device: arg(0, "device")?,
                action: arg(1, "action")?,
            },
            "unbindaxis" => ReplCommand::UnbindAxis {
                device: arg(0, "device")?,
                axis: arg(1, "axis")?,
            },
            "reload" => ReplCommand::Reload,
            "save" => ReplCommand::Save,
            "apply" => ReplCommand::Apply {
                force: rest.first().is_some_and(|a| a == "force"),
            },
            "persist" => ReplCommand::Persist,
            "export" => ReplCommand::Export(arg(0, "device")?),
            "import" => ReplCommand::Import(arg(0, "file")?),
            "presets" => ReplCommand::Presets,
            "reconcile" => ReplCommand::Reconcile,
            "exit" | "quit" => ReplCommand::Exit,
            other => bail!("Unknown command '{}' (try 'help')", other),
        };
        Ok(Some(command))
    }
}

const HELP: &str = "\
  list                                   devices and binding counts
  show <device>                          bindings of one device
  bind <device> <action> <key> [mods]    mods like ctrl+shift
  bindaxis <device> <axis> <key> [scale]
  unbind <device> <action>
  unbindaxis <device> <axis>
  reload                                 reload from the host table
  save                                   write the save slot
  apply [force]                          push bindings to the host
  persist                                apply and write the host table
  export <device>                        write a preset file
  import <file>                          import a preset file
  presets                                list preset files
  reconcile                              drop bindings the host no longer knows
  exit";

pub fn print_devices(registry: &DeviceRegistry) {
    println!("\n{}", "=== Devices ===".bold().cyan());
    if registry.is_empty() {
        println!("  {}", "(none)".dimmed());
        return;
    }
    for summary in registry.summary() {
        println!("  {}", summary);
    }
    println!(
        "\n  {} actions, {} axes known ({} / {} host entries)",
        registry.action_names().len().to_string().green(),
        registry.axis_names().len().to_string().green(),
        registry.ungrouped_actions().len(),
        registry.ungrouped_axes().len()
    );
}

pub fn print_device(device: &Device) {
    println!(
        "\n{} {}",
        device.display_name.bold().cyan(),
        format!("[{}]", device.kind).dimmed()
    );

    println!("{}", "Actions:".bold());
    for action in &device.actions {
        let key = match &action.key {
            Some(_) => action.key_label.green(),
            None => "-".dimmed(),
        };
        let mut mods = Vec::new();
        for (on, name) in [
            (action.modifiers.shift, "shift"),
            (action.modifiers.ctrl, "ctrl"),
            (action.modifiers.alt, "alt"),
            (action.modifiers.cmd, "cmd"),
        ] {
            if on {
                mods.push(name);
            }
        }
        if mods.is_empty() {
            println!("  {:<32} {}", action.action_name, key);
        } else {
            println!("  {:<32} {} {}", action.action_name, key, mods.join("+").yellow());
        }
    }

    println!("{}", "Axes:".bold());
    for axis in &device.axes {
        match &axis.key {
            Some(_) => println!(
                "  {:<32} {} x{}",
                axis.axis_name,
                axis.key_label.green(),
                axis.scale
            ),
            None => println!("  {:<32} {}", axis.axis_name, "-".dimmed()),
        }
    }

    if !device.physical_axes.is_empty() {
        println!("{}", "Calibration:".bold());
        for axis in &device.physical_axes {
            println!(
                "  axis {:<4} {:?}, {} point(s)",
                axis.axis,
                axis.input_range,
                axis.points.len()
            );
        }
    }
}

pub fn print_reconcile(report: &ReconcileReport) {
    if report.is_empty() {
        println!("{}", "Registry already matches the host".green());
        return;
    }
    for name in &report.added_actions {
        println!("  {} action {}", "+".green(), name);
    }
    for name in &report.removed_actions {
        println!("  {} action {}", "-".red(), name);
    }
    for name in &report.added_axes {
        println!("  {} axis {}", "+".green(), name);
    }
    for name in &report.removed_axes {
        println!("  {} axis {}", "-".red(), name);
    }
    if !report.pruned_devices.is_empty() {
        println!("  pruned: {}", report.pruned_devices.join(", ").yellow());
    }
}

pub fn print_presets(presets: &[String]) {
    println!("\n{}", "=== Presets ===".bold().cyan());
    if presets.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for preset in presets {
        println!("  {}", preset);
    }
}

/// Run one command. Returns `false` when the REPL should exit.
fn execute<H: HostMappingTable, S: SaveStore>(
    manager: &mut MappingManager<H, S>,
    command: ReplCommand,
) -> Result<bool> {
    match command {
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::List => print_devices(manager.registry()),
        ReplCommand::Show(name) => match manager.registry().lookup(&name) {
            Some(device) => print_device(device),
            None => println!("{} {}", "No such device:".red(), name),
        },
        ReplCommand::Bind {
            device,
            action,
            key,
            modifiers,
        } => {
            manager.rebind_action(&device, &action, Key::new(key), modifiers)?;
            println!("{}", "ok".green());
        },
        ReplCommand::BindAxis {
            device,
            axis,
            key,
            scale,
        } => {
            manager.rebind_axis(&device, &axis, Key::new(key), scale)?;
            println!("{}", "ok".green());
        },
        ReplCommand::Unbind { device, action } => {
            manager.unbind_action(&device, &action)?;
            println!("{}", "ok".green());
        },
        ReplCommand::UnbindAxis { device, axis } => {
            manager.unbind_axis(&device, &axis)?;
            println!("{}", "ok".green());
        },
        ReplCommand::Reload => {
            manager.load_from_host()?;
            print_devices(manager.registry());
        },
        ReplCommand::Save => {
            manager.save()?;
            println!("Saved to {}", manager.settings().slot);
        },
        ReplCommand::Apply { force } => {
            if manager.apply_to_host(force)? {
                println!("{}", "Applied".green());
            } else {
                println!("{}", "Nothing changed (use 'apply force')".yellow());
            }
        },
        ReplCommand::Persist => {
            manager.apply_and_persist(true)?;
            println!("{}", "Applied and written".green());
        },
        ReplCommand::Export(name) => {
            let path = manager.export_device(&name)?;
            println!("Exported to {}", path.display());
        },
        ReplCommand::Import(file) => {
            let path = std::path::Path::new(&file);
            let replaced = if path.exists() {
                manager.import_preset(path)?
            } else {
                manager.import_preset_named(&file)?
            };
            match replaced {
                Some(old) => println!("Replaced {}", old.display_name),
                None => println!("Added new device"),
            }
        },
        ReplCommand::Presets => print_presets(&manager.list_presets()?),
        ReplCommand::Reconcile => print_reconcile(&manager.reconcile_with_host()?),
        ReplCommand::Exit => return Ok(false),
    }
    Ok(true)
}

pub fn run_repl<H: HostMappingTable, S: SaveStore>(
    manager: &mut MappingManager<H, S>,
) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{}", "inputmap REPL, 'help' for commands".bold());

    loop {
        match rl.readline("inputmap> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                let command = match ReplCommand::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{} {}", "error:".red(), e);
                        continue;
                    },
                };
                match execute(manager, command) {
                    Ok(true) => {},
                    Ok(false) => break,
                    Err(e) => println!("{} {}", "error:".red(), e),
                }
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
