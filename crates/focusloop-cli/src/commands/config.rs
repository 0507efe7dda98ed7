use clap::Subcommand;

use focusloop_core::{CoreError, SettingsError, SettingsStore};

use super::print_json;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show all settings as JSON
    Show,
    /// Get a single settings value
    Get { key: String },
    /// Set a settings value; out-of-bound durations fall back to their
    /// defaults
    Set { key: String, value: String },
}

pub fn run(action: ConfigAction) -> Result<(), CoreError> {
    let store = super::open_store();
    let mut settings_store = SettingsStore::load(&store);

    match action {
        ConfigAction::Show => print_json(&settings_store.get())?,
        ConfigAction::Get { key } => match settings_store.get().get_field(&key) {
            Some(value) => println!("{value}"),
            None => return Err(SettingsError::UnknownKey(key).into()),
        },
        ConfigAction::Set { key, value } => {
            let mut settings = settings_store.get();
            settings.set_field(&key, &value)?;
            let applied = settings_store.update(&store, settings);
            print_json(&applied)?;
        }
    }
    Ok(())
}
