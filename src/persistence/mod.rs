use std::{
    fs,
    path::PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};

const APP_NAME: &str = "duosync";
const SETTINGS_FILE: &str = "settings.json";

/// Persisted configuration. Credentials are deliberately not part of this;
/// they are prompted for on every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub anki_connect_url: String,
    pub deck_name: String,
    pub model_name: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            anki_connect_url: "http://localhost:8765".to_string(),
            deck_name: "Default".to_string(),
            model_name: "Duolingo Sync".to_string(),
        }
    }
}

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

pub fn save_json<T: Serialize>(data: &T, filename: &str) -> Result<(), Box<dyn std::error::Error>> {
    let file_path = get_data_file_path(filename);
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&file_path, json)?;
    Ok(())
}

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(
    filename: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    let file_path = get_data_file_path(filename);

    if !file_path.exists() {
        return Ok(T::default());
    }

    let json = fs::read_to_string(&file_path)?;
    let data: T = serde_json::from_str(&json)?;
    Ok(data)
}

pub fn load_settings() -> SyncSettings {
    match load_json::<SyncSettings>(SETTINGS_FILE) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load {}: {}. Using defaults.", SETTINGS_FILE, e);
            SyncSettings::default()
        }
    }
}

/// Writes the defaults on first run so users have a file to edit.
pub fn ensure_settings_file() {
    if !get_data_file_path(SETTINGS_FILE).exists() {
        if let Err(e) = save_json(&SyncSettings::default(), SETTINGS_FILE) {
            eprintln!("Failed to write default settings: {}", e);
        }
    }
}
