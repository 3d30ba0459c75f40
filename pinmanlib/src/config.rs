//! INI settings file holding file locations, backup policy and update-check state

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use ini::Ini;
use log::{debug, error, info};

use crate::{store::StorePaths, Error, Result};

/// All settings live in this section
pub const SECTION: &str = "DEFAULT";

/// Keys and default values written to a fresh settings file
pub const DEFAULT_SETTINGS: [(&str, &str); 12] = [
    ("pin_file", "pins.json"),
    ("txt_file", "pins.txt"),
    ("log_file", "pin_log.txt"),
    ("auto_backup", "True"),
    ("backup_interval", "5"),
    ("theme", "light"),
    ("font_size", "9"),
    ("window_width", "800"),
    ("window_height", "600"),
    ("last_update_check", ""),
    ("auto_update_check", "True"),
    ("payments", "False"),
];

/// Prefix written by older releases in front of relative file settings
const LEGACY_DATA_PREFIX: &str = "data/";

/// Settings backed by an INI file. Every change is written back immediately.
#[derive(Debug)]
pub struct Settings {
    path: PathBuf,
    data_dir: PathBuf,
    ini: Ini,
}

impl Settings {
    /// Loads settings from `path`, creating the file with [DEFAULT_SETTINGS] when it does not
    /// exist. Relative file settings resolve against `data_dir`.
    pub fn load(path: &Path, data_dir: &Path) -> Result<Self> {
        let existed = path.exists();
        let ini = if existed {
            Ini::load_from_file(path)?
        } else {
            info!("Creating default settings at {}", path.display());
            default_ini()
        };
        let settings = Settings {
            path: path.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
            ini,
        };
        if !existed {
            settings.save()?;
        }
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        if let Err(e) = self.ini.write_to_file(&self.path) {
            error!("Unable to write settings to {}: {e}", self.path.display());
            return Err(Error::Io);
        }
        Ok(())
    }

    /// Returns the value for `key`, falling back to its default when absent from the file
    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.ini
            .get_from(Some(SECTION), key)
            .or_else(|| default_value(key))
    }

    /// Validates and stores a value, then saves the file. Boolean values are written as
    /// `True`/`False`.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let value = validate(key, value.trim())?;
        debug!("Setting {key} = {value}");
        self.ini.with_section(Some(SECTION)).set(key, value);
        self.save()
    }

    /// Returns every known setting with its effective value, in default order
    pub fn all_settings(&self) -> Vec<(String, String)> {
        DEFAULT_SETTINGS
            .iter()
            .map(|(k, _)| (k.to_string(), self.get_value(k).unwrap_or_default().to_string()))
            .collect()
    }

    /// Discards all values and writes the defaults
    pub fn reset_to_default(&mut self) -> Result<()> {
        self.ini = default_ini();
        self.save()
    }

    /// Resolves the PIN file, text listing and usage log locations
    pub fn store_paths(&self) -> StorePaths {
        StorePaths {
            pin_file: self.resolve("pin_file"),
            txt_file: self.resolve("txt_file"),
            log_file: self.resolve("log_file"),
        }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        let value = self.get_value(key).unwrap_or_default();
        let value = value.strip_prefix(LEGACY_DATA_PREFIX).unwrap_or(value);
        self.data_dir.join(value)
    }

    fn flag(&self, key: &str) -> bool {
        self.get_value(key).and_then(parse_bool).unwrap_or(false)
    }

    pub fn auto_backup(&self) -> bool {
        self.flag("auto_backup")
    }

    /// Minutes between automatic backups
    pub fn backup_interval(&self) -> u64 {
        self.get_value("backup_interval")
            .and_then(|v| v.parse().ok())
            .unwrap_or(5)
    }

    pub fn auto_update_check(&self) -> bool {
        self.flag("auto_update_check")
    }

    /// When false, automation fills in the payment form but leaves submission to the user
    pub fn payments(&self) -> bool {
        self.flag("payments")
    }

    pub fn last_update_check(&self) -> Option<DateTime<Local>> {
        let value = self.get_value("last_update_check")?;
        if value.is_empty() {
            return None;
        }
        parse_check_time(value)
    }

    pub fn set_last_update_check(&mut self, when: DateTime<Local>) -> Result<()> {
        self.set_value("last_update_check", &when.to_rfc3339())
    }
}

fn default_ini() -> Ini {
    let mut ini = Ini::new();
    for (key, value) in DEFAULT_SETTINGS {
        ini.with_section(Some(SECTION)).set(key, value);
    }
    ini
}

fn default_value(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// Reads an update check time. Older releases wrote local time without an offset, i.e.,
/// `2024-05-01T09:30:00.123456`.
fn parse_check_time(value: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Accepts `True`/`False` in any case
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Returns the value to store for `key` or [Error::Config] if the key is unknown or the value is
/// not acceptable.
fn validate(key: &str, value: &str) -> Result<String> {
    let ok = match key {
        "pin_file" | "txt_file" | "log_file" => !value.is_empty(),
        "auto_backup" | "auto_update_check" | "payments" => {
            return match parse_bool(value) {
                Some(true) => Ok("True".to_string()),
                Some(false) => Ok("False".to_string()),
                None => {
                    error!("{key} must be True or False");
                    Err(Error::Config)
                }
            };
        }
        "backup_interval" | "font_size" | "window_width" | "window_height" => {
            matches!(value.parse::<u64>(), Ok(n) if n > 0)
        }
        "theme" => value == "light" || value == "dark",
        "last_update_check" => value.is_empty() || parse_check_time(value).is_some(),
        _ => {
            error!("Unknown setting: {key}");
            false
        }
    };
    if ok {
        Ok(value.to_string())
    } else {
        error!("Rejected value {value:?} for {key}");
        Err(Error::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("config.ini");
        let settings = Settings::load(&cfg, &dir.path().join("data")).unwrap();
        assert!(cfg.exists());
        assert!(settings.auto_backup());
        assert!(!settings.payments());
        assert_eq!(settings.backup_interval(), 5);
        assert!(settings.last_update_check().is_none());
        assert_eq!(
            settings.store_paths().pin_file,
            dir.path().join("data").join("pins.json")
        );
    }

    #[test]
    fn legacy_prefix_and_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("config.ini");
        std::fs::write(&cfg, "[DEFAULT]\npin_file = data/mine.json\npayments = True\n").unwrap();
        let mut settings = Settings::load(&cfg, dir.path()).unwrap();
        assert_eq!(settings.store_paths().pin_file, dir.path().join("mine.json"));
        assert!(settings.payments());
        // keys absent from the file fall back to defaults
        assert_eq!(settings.get_value("theme"), Some("light"));

        settings.set_value("payments", "false").unwrap();
        settings.set_value("backup_interval", "30").unwrap();
        let reloaded = Settings::load(&cfg, dir.path()).unwrap();
        assert_eq!(reloaded.get_value("payments"), Some("False"));
        assert_eq!(reloaded.backup_interval(), 30);
    }

    #[test]
    fn rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::load(&dir.path().join("c.ini"), dir.path()).unwrap();
        assert_eq!(settings.set_value("theme", "purple"), Err(Error::Config));
        assert_eq!(settings.set_value("backup_interval", "0"), Err(Error::Config));
        assert_eq!(settings.set_value("auto_backup", "yes"), Err(Error::Config));
        assert_eq!(settings.set_value("no_such_key", "1"), Err(Error::Config));
        settings.set_value("theme", "dark").unwrap();
        settings.reset_to_default().unwrap();
        assert_eq!(settings.get_value("theme"), Some("light"));
    }

    #[test]
    fn update_check_time_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::load(&dir.path().join("c.ini"), dir.path()).unwrap();
        let now = Local::now();
        settings.set_last_update_check(now).unwrap();
        let read = settings.last_update_check().unwrap();
        assert!((read - now).num_seconds().abs() < 1);
    }

    #[test]
    fn reads_check_time_without_offset() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("config.ini");
        std::fs::write(&cfg, "[DEFAULT]\nlast_update_check = 2024-05-01T09:30:00.123456\n").unwrap();
        let mut settings = Settings::load(&cfg, dir.path()).unwrap();
        let read = settings.last_update_check().unwrap();
        assert_eq!(read.naive_local().to_string(), "2024-05-01 09:30:00.123456");

        settings
            .set_value("last_update_check", "2024-05-02T10:00:00")
            .unwrap();
        assert!(settings.last_update_check().is_some());
        assert_eq!(
            settings.set_value("last_update_check", "yesterday"),
            Err(Error::Config)
        );
    }
}
