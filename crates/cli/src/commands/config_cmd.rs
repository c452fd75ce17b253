//! `opencursor config`: show the effective configuration or write defaults.

use opencursor_config::AppConfig;

use super::{CliResult, Overrides};

pub fn run(overrides: &Overrides, init: bool) -> CliResult {
    if init {
        return init_file();
    }

    let config = super::load_config(overrides)?;
    println!("# {}", config_path().display());
    println!("{}", render(&config)?);
    Ok(())
}

fn config_path() -> std::path::PathBuf {
    AppConfig::config_dir().join("config.toml")
}

fn init_file() -> CliResult {
    let path = config_path();
    if path.exists() {
        return Err(format!("{} already exists; not overwriting", path.display()).into());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// TOML of the effective config with the API key masked.
fn render(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("[REDACTED]".into());
    }
    toml::to_string_pretty(&shown)
}
