use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

use home::home_dir;
use log::error;

use crate::Error;

/// Name of the folder created in the user's home directory
pub const APP_HOME_NAME: &str = ".pinman";

/// Create folder named .pinman in the user's home directory and return a PathBuf referencing that folder.
pub fn create_app_home() -> crate::Result<PathBuf> {
    if let Some(hd) = home_dir() {
        return ensure_dir(&hd.join(APP_HOME_NAME));
    }
    error!("Failed to determine the home directory");
    Err(Error::Unrecognized)
}

/// Creates the folder if it does not exist and returns it
pub fn ensure_dir(dir: &Path) -> crate::Result<PathBuf> {
    if !dir.exists() && create_dir_all(dir).is_err() {
        error!("Failed to create {} directory", dir.display());
        return Err(Error::Io);
    }
    Ok(dir.to_path_buf())
}

/// Files and folders kept under an application home
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppLayout {
    pub home: PathBuf,
    /// INI settings file
    pub config_file: PathBuf,
    /// log4rs configuration used when no logging option is given
    pub logging_config: PathBuf,
    /// Folder holding the PIN file, text listing and usage log
    pub data_dir: PathBuf,
    pub backup_dir: PathBuf,
}

impl AppLayout {
    /// Describes the layout rooted at `home`, creating the home, data and backup folders.
    pub fn create(home: &Path) -> crate::Result<Self> {
        let home = ensure_dir(home)?;
        let data_dir = ensure_dir(&home.join("data"))?;
        let backup_dir = ensure_dir(&home.join("backups"))?;
        Ok(AppLayout {
            config_file: home.join("config.ini"),
            logging_config: home.join("log.yaml"),
            data_dir,
            backup_dir,
            home,
        })
    }
}
