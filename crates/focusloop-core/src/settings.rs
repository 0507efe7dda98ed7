//! Validated, bounded timer configuration.
//!
//! Settings are persisted as JSON under a fixed key in the kv store.
//! Every duration is bounded; values outside their bound (or malformed
//! persisted values) are silently coerced back to the field default --
//! configuration problems never surface as errors.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::storage::Store;
use crate::timer::SessionType;

/// Fixed kv key the settings JSON lives under.
pub const SETTINGS_KEY: &str = "settings";

/// Inclusive bounds for each duration, in minutes.
pub const WORK_MINUTES_MAX: u32 = 120;
pub const SHORT_BREAK_MINUTES_MAX: u32 = 30;
pub const LONG_BREAK_MINUTES_MAX: u32 = 60;

/// Timer configuration. Durations are whole minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_work: bool,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            sound_enabled: true,
            notifications_enabled: true,
            auto_start_breaks: false,
            auto_start_work: false,
        }
    }
}

impl Settings {
    /// Nominal duration of a phase in seconds under these settings.
    pub fn duration_secs(&self, session_type: SessionType) -> u32 {
        let minutes = match session_type {
            SessionType::Work => self.work_minutes,
            SessionType::ShortBreak => self.short_break_minutes,
            SessionType::LongBreak => self.long_break_minutes,
        };
        minutes.saturating_mul(60)
    }

    /// Return a copy with every out-of-bound duration replaced by its
    /// default. Zero-minute phases are not representable.
    pub fn sanitized(&self) -> Settings {
        let mut settings = self.clone();
        if settings.work_minutes == 0 || settings.work_minutes > WORK_MINUTES_MAX {
            settings.work_minutes = default_work_minutes();
        }
        if settings.short_break_minutes == 0
            || settings.short_break_minutes > SHORT_BREAK_MINUTES_MAX
        {
            settings.short_break_minutes = default_short_break_minutes();
        }
        if settings.long_break_minutes == 0 || settings.long_break_minutes > LONG_BREAK_MINUTES_MAX
        {
            settings.long_break_minutes = default_long_break_minutes();
        }
        settings
    }

    /// Get a field as a string by name. Returns None for unknown keys.
    pub fn get_field(&self, key: &str) -> Option<String> {
        let value = match key {
            "work_minutes" => self.work_minutes.to_string(),
            "short_break_minutes" => self.short_break_minutes.to_string(),
            "long_break_minutes" => self.long_break_minutes.to_string(),
            "sound_enabled" => self.sound_enabled.to_string(),
            "notifications_enabled" => self.notifications_enabled.to_string(),
            "auto_start_breaks" => self.auto_start_breaks.to_string(),
            "auto_start_work" => self.auto_start_work.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Set a field from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown keys or strings that do not parse as
    /// the field's type. Out-of-bound numeric values do NOT error here;
    /// they are coerced on the next [`Settings::sanitized`] pass.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SettingsError>
        where
            T::Err: std::fmt::Display,
        {
            value.parse().map_err(|e| SettingsError::InvalidValue {
                key: key.to_string(),
                message: format!("{e}"),
            })
        }

        match key {
            "work_minutes" => self.work_minutes = parse(key, value)?,
            "short_break_minutes" => self.short_break_minutes = parse(key, value)?,
            "long_break_minutes" => self.long_break_minutes = parse(key, value)?,
            "sound_enabled" => self.sound_enabled = parse(key, value)?,
            "notifications_enabled" => self.notifications_enabled = parse(key, value)?,
            "auto_start_breaks" => self.auto_start_breaks = parse(key, value)?,
            "auto_start_work" => self.auto_start_work = parse(key, value)?,
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

/// Settings persistence wrapper over the kv store.
///
/// Holds the current sanitized value; `update` coerces and persists.
pub struct SettingsStore {
    current: Settings,
}

impl SettingsStore {
    /// Load from the store, default-if-absent. Malformed persisted JSON
    /// falls back to defaults via the store's parse-error path.
    pub fn load(store: &Store) -> Self {
        let current = store
            .get(SETTINGS_KEY, Settings::default())
            .sanitized();
        Self { current }
    }

    pub fn get(&self) -> Settings {
        self.current.clone()
    }

    /// Sanitize, persist, and adopt the new settings. Returns the value
    /// actually applied (after coercion). Persistence failures are
    /// reported on the store's error channel, not here.
    pub fn update(&mut self, store: &Store, settings: Settings) -> Settings {
        self.current = settings.sanitized();
        if !store.set(SETTINGS_KEY, &self.current) {
            tracing::warn!("settings could not be persisted; keeping in-memory value");
        }
        self.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let settings = Settings::default();
        assert_eq!(settings.work_minutes, 25);
        assert_eq!(settings.short_break_minutes, 5);
        assert_eq!(settings.long_break_minutes, 15);
        assert!(settings.sound_enabled);
        assert!(settings.notifications_enabled);
        assert!(!settings.auto_start_breaks);
        assert!(!settings.auto_start_work);
    }

    #[test]
    fn sanitized_coerces_out_of_bound_durations_to_defaults() {
        let settings = Settings {
            work_minutes: 0,
            short_break_minutes: 31,
            long_break_minutes: 999,
            ..Settings::default()
        };
        let clean = settings.sanitized();
        assert_eq!(clean.work_minutes, 25);
        assert_eq!(clean.short_break_minutes, 5);
        assert_eq!(clean.long_break_minutes, 15);
    }

    #[test]
    fn sanitized_keeps_in_bound_durations() {
        let settings = Settings {
            work_minutes: 120,
            short_break_minutes: 1,
            long_break_minutes: 60,
            ..Settings::default()
        };
        assert_eq!(settings.sanitized(), settings);
    }

    #[test]
    fn duration_secs_per_phase() {
        let settings = Settings::default();
        assert_eq!(settings.duration_secs(SessionType::Work), 25 * 60);
        assert_eq!(settings.duration_secs(SessionType::ShortBreak), 5 * 60);
        assert_eq!(settings.duration_secs(SessionType::LongBreak), 15 * 60);
    }

    #[test]
    fn partial_json_deserializes_with_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"work_minutes": 50}"#).unwrap();
        assert_eq!(settings.work_minutes, 50);
        assert_eq!(settings.short_break_minutes, 5);
        assert!(settings.notifications_enabled);
    }

    #[test]
    fn get_and_set_field_round_trip() {
        let mut settings = Settings::default();
        settings.set_field("work_minutes", "45").unwrap();
        assert_eq!(settings.get_field("work_minutes").as_deref(), Some("45"));
        settings.set_field("auto_start_breaks", "true").unwrap();
        assert!(settings.auto_start_breaks);
    }

    #[test]
    fn set_field_rejects_unknown_key_and_bad_value() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set_field("no_such_key", "1"),
            Err(SettingsError::UnknownKey(_))
        ));
        assert!(matches!(
            settings.set_field("work_minutes", "not-a-number"),
            Err(SettingsError::InvalidValue { .. })
        ));
    }

    #[test]
    fn settings_store_round_trip() {
        let store = Store::memory_only();
        let mut settings_store = SettingsStore::load(&store);
        assert_eq!(settings_store.get(), Settings::default());

        let applied = settings_store.update(
            &store,
            Settings {
                work_minutes: 500, // out of bounds, coerced
                short_break_minutes: 10,
                ..Settings::default()
            },
        );
        assert_eq!(applied.work_minutes, 25);
        assert_eq!(applied.short_break_minutes, 10);

        let reloaded = SettingsStore::load(&store);
        assert_eq!(reloaded.get(), applied);
    }
}
