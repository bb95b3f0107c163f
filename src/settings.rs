//! Code for loading program settings.
use crate::input::{input_err_msg, read_toml};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Program settings from the optional `settings.toml` file in the model directory
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Settings {
    /// The program log level
    pub log_level: Option<String>,
}

impl Settings {
    /// Read the settings file from the model directory.
    ///
    /// If the file is not present, default values for settings will be used.
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Settings> {
        let file_path = model_dir.as_ref().join(SETTINGS_FILE_NAME);
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(&file_path).with_context(|| input_err_msg(&file_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_from_path_missing() {
        let dir = tempdir().unwrap();
        assert_eq!(Settings::from_path(dir.path()).unwrap(), Settings::default());
    }

    #[test]
    fn test_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SETTINGS_FILE_NAME)).unwrap();
            writeln!(file, "log_level = \"debug\"").unwrap();
        }

        let settings = Settings::from_path(dir.path()).unwrap();
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
    }
}
