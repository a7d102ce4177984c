use chrono::Utc;
use clap::Subcommand;
use lightsout_core::{Database, Event, NewPreset, PresetStore};

#[derive(Subcommand)]
pub enum PresetAction {
    /// List built-in and custom presets
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a custom preset
    Add {
        /// Preset title
        title: String,
        #[arg(long, default_value = "0")]
        hours: u32,
        /// Minutes past 59 carry into hours
        #[arg(long, default_value = "0")]
        minutes: u32,
        /// Icon name (defaults to "star-outline")
        #[arg(long)]
        icon: Option<String>,
    },
    /// Delete a custom preset
    Remove {
        /// Preset id
        id: String,
    },
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut store = PresetStore::open(&db);

    match action {
        PresetAction::List { json } => {
            let presets = store.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&presets)?);
            } else {
                for preset in presets {
                    let kind = if preset.is_custom { "custom" } else { "built-in" };
                    println!(
                        "{:<16} {:<20} {:>8}  {kind}",
                        preset.id,
                        preset.title,
                        preset.duration_label()
                    );
                }
            }
        }
        PresetAction::Add {
            title,
            hours,
            minutes,
            icon,
        } => {
            let preset = store.add(NewPreset {
                title,
                hours,
                minutes,
                icon,
            })?;
            let event = Event::PresetAdded {
                id: preset.id,
                title: preset.title,
                at: Utc::now(),
            };
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        PresetAction::Remove { id } => {
            if !store.remove(&id) {
                return Err(format!("no custom preset with id {id}").into());
            }
            let event = Event::PresetRemoved { id, at: Utc::now() };
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }
    Ok(())
}
