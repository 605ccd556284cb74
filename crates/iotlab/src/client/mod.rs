use std::path::PathBuf;

pub mod commands;
pub mod files;
pub mod globalsettings;
pub mod output;
pub mod transport;

pub fn default_config_path() -> PathBuf {
    let mut home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    home.push(".iotlab");
    home.push("config.toml");
    home
}
