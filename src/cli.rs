//! Command-line interface and REPL

use anyhow::{Context, Result};
use colored::*;
use rustyline::DefaultEditor;

use lpadder::devices::{DeviceProfile, DeviceType, JsonProfileStore, LogicalDevice, MidiSession, ProfileStore};
use lpadder::projects::{ProjectStore, StoredProject};

/// REPL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Devices,
    Status,
    Profiles,
    Projects,
    /// Set the display name override of a device
    Rename { raw_name: String, name: String },
    /// Set the type override of a device
    Retype { raw_name: String, device_type: DeviceType },
    /// Import a cover archive under a new slug
    Import { path: String, slug: String },
    /// Write a stored project to a cover archive
    Export { slug: String, path: String },
    Help,
    Exit,
}

impl Command {
    /// Parse one REPL line. Raw names containing spaces must be quoted
    /// with double quotes: `name "Launchpad X" Left pad`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match verb {
            "devices" | "ls" => Command::Devices,
            "status" => Command::Status,
            "profiles" => Command::Profiles,
            "projects" => Command::Projects,
            "help" | "?" => Command::Help,
            "exit" | "quit" => Command::Exit,
            "name" => {
                let (raw_name, name) = split_raw_name(rest)?;
                if name.is_empty() {
                    return Err("usage: name <raw name> <display name>".to_string());
                }
                Command::Rename {
                    raw_name,
                    name: name.to_string(),
                }
            }
            "type" => {
                let (raw_name, device_type) = split_raw_name(rest)?;
                Command::Retype {
                    raw_name,
                    device_type: device_type.parse()?,
                }
            }
            "import" => match words(rest).as_slice() {
                [path, slug] => Command::Import {
                    path: path.to_string(),
                    slug: slug.to_string(),
                },
                _ => return Err("usage: import <file.zip> <slug>".to_string()),
            },
            "export" => match words(rest).as_slice() {
                [slug, path] => Command::Export {
                    slug: slug.to_string(),
                    path: path.to_string(),
                },
                _ => return Err("usage: export <slug> <file.zip>".to_string()),
            },
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };

        Ok(Some(command))
    }
}

fn words(input: &str) -> Vec<&str> {
    input.split_whitespace().collect()
}

/// Split `"quoted raw name" rest` or `word rest`
fn split_raw_name(input: &str) -> Result<(String, &str), String> {
    if let Some(quoted) = input.strip_prefix('"') {
        let end = quoted.find('"').ok_or("missing closing quote")?;
        return Ok((quoted[..end].to_string(), quoted[end + 1..].trim()));
    }

    match input.split_once(char::is_whitespace) {
        Some((raw_name, rest)) => Ok((raw_name.to_string(), rest.trim())),
        None if !input.is_empty() => Ok((input.to_string(), "")),
        None => Err("missing raw name".to_string()),
    }
}

/// One line per device
pub fn format_device(device: &LogicalDevice) -> String {
    let type_label = if device.device_type == device.guessed_type {
        device.device_type.to_string().cyan()
    } else {
        format!("{} (guessed {})", device.device_type, device.guessed_type).yellow()
    };

    format!(
        "  {} {} [{}] in={} out={}",
        device.name.bold(),
        format!("<{}>", device.raw_name).dimmed(),
        type_label,
        device.input.id,
        device.output.id
    )
}

pub fn print_devices(devices: &[LogicalDevice]) {
    if devices.is_empty() {
        println!("  {}", "No devices connected".dimmed());
        return;
    }
    for device in devices {
        println!("{}", format_device(device));
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  devices                    list connected devices");
    println!("  status                     MIDI session status");
    println!("  profiles                   list device profiles");
    println!("  projects                   list stored projects");
    println!("  name <raw> <display name>  set a device display name");
    println!("  type <raw> <type>          set a device type ({})", type_names());
    println!("  import <file.zip> <slug>   import a cover archive");
    println!("  export <slug> <file.zip>   export a project as a cover archive");
    println!("  exit                       quit");
}

fn type_names() -> String {
    DeviceType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
}

pub async fn run_repl(session: &MidiSession, profiles: &JsonProfileStore, projects: Option<&ProjectStore>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = tokio::task::block_in_place(|| rl.readline("lpadder> "));
        let line = match readline {
            Ok(line) => line,
            Err(_) => break,
        };
        let _ = rl.add_history_entry(line.as_str());

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e.red());
                continue;
            }
        };

        match command {
            Command::Exit => break,
            Command::Help => print_help(),
            Command::Devices => print_devices(&session.store().devices()),
            Command::Status => {
                let status = session.store().status();
                println!(
                    "  enabled: {}  requested: {}",
                    status.is_enabled, status.was_requested
                );
            }
            Command::Profiles => match profiles.load().await {
                Ok(list) if list.is_empty() => println!("  {}", "No profiles".dimmed()),
                Ok(list) => {
                    for profile in list {
                        println!(
                            "  {} name={} type={}",
                            profile.raw_name.bold(),
                            profile.name.as_deref().unwrap_or("-"),
                            profile.device_type.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
                        );
                    }
                }
                Err(e) => println!("{}", format!("Failed to load profiles: {:#}", e).red()),
            },
            Command::Projects => match projects.map(|store| store.get_projects()) {
                None => println!("  {}", "Project store unavailable".dimmed()),
                Some(Err(e)) => println!("{}", format!("Failed to list projects: {}", e).red()),
                Some(Ok(list)) if list.is_empty() => println!("  {}", "No projects".dimmed()),
                Some(Ok(list)) => {
                    for (slug, project) in list {
                        println!(
                            "  {} {} ({} launchpads, saved {})",
                            slug.bold(),
                            project.data.metadata.name,
                            project.data.launchpads.len(),
                            project.saved_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            },
            Command::Import { path, slug } => match projects {
                None => println!("  {}", "Project store unavailable".dimmed()),
                Some(store) => match import_cover(store, &path, &slug).await {
                    Ok(stored) => println!("{}", format!("Imported '{}' as {}", stored.data.metadata.name, stored.slug).green()),
                    Err(e) => println!("{}", format!("Import failed: {:#}", e).red()),
                },
            },
            Command::Export { slug, path } => match projects {
                None => println!("  {}", "Project store unavailable".dimmed()),
                Some(store) => match export_cover(store, &slug, &path).await {
                    Ok(()) => println!("{}", format!("Exported '{}' to {}", slug, path).green()),
                    Err(e) => println!("{}", format!("Export failed: {:#}", e).red()),
                },
            },
            Command::Rename { raw_name, name } => {
                let profile = DeviceProfile {
                    name: Some(name),
                    ..DeviceProfile::new(raw_name)
                };
                save_profile(profiles, profile).await;
            }
            Command::Retype { raw_name, device_type } => {
                let profile = DeviceProfile {
                    device_type: Some(device_type),
                    ..DeviceProfile::new(raw_name)
                };
                save_profile(profiles, profile).await;
            }
        }
    }

    Ok(())
}

async fn import_cover(store: &ProjectStore, path: &str, slug: &str) -> Result<StoredProject> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    Ok(store.import_zip(slug, &bytes)?)
}

async fn export_cover(store: &ProjectStore, slug: &str, path: &str) -> Result<()> {
    let bytes = store.export_zip(slug)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path))
}

async fn save_profile(profiles: &JsonProfileStore, profile: DeviceProfile) {
    let raw_name = profile.raw_name.clone();
    match profiles.upsert(profile).await {
        // Overrides apply when the device is paired again
        Ok(()) => println!(
            "{}",
            format!("Profile for '{}' saved, replug the device to apply it", raw_name).green()
        ),
        Err(e) => println!("{}", format!("Failed to save profile: {:#}", e).red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("devices").unwrap(), Some(Command::Devices));
        assert_eq!(Command::parse("  quit ").unwrap(), Some(Command::Exit));
        assert_eq!(Command::parse("").unwrap(), None);
        assert!(Command::parse("frobnicate").is_err());
    }

    #[test]
    fn test_parse_rename_with_quoted_raw_name() {
        assert_eq!(
            Command::parse(r#"name "Launchpad X" Left pad"#).unwrap(),
            Some(Command::Rename {
                raw_name: "Launchpad X".to_string(),
                name: "Left pad".to_string(),
            })
        );
        assert!(Command::parse("name Pad").is_err());
        assert!(Command::parse(r#"name "Pad Left"#).is_err());
    }

    #[test]
    fn test_parse_import_export() {
        assert_eq!(
            Command::parse("import cover.zip my-cover").unwrap(),
            Some(Command::Import {
                path: "cover.zip".to_string(),
                slug: "my-cover".to_string(),
            })
        );
        assert_eq!(
            Command::parse("export my-cover out.zip").unwrap(),
            Some(Command::Export {
                slug: "my-cover".to_string(),
                path: "out.zip".to_string(),
            })
        );
        assert!(Command::parse("import cover.zip").is_err());
    }

    #[test]
    fn test_parse_retype() {
        assert_eq!(
            Command::parse("type Pad launchpad_mini_mk3").unwrap(),
            Some(Command::Retype {
                raw_name: "Pad".to_string(),
                device_type: DeviceType::LaunchpadMiniMk3,
            })
        );
        assert!(Command::parse("type Pad launchpad_s").is_err());
    }
}
