//! Config command handlers.

use anyhow::{Context, Result};
use coderead_core::config::{self, Theme};

pub fn path() {
    println!("{}", config::paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

pub fn theme(theme: Theme) -> Result<()> {
    config::Config::save_theme(theme).context("save theme")?;
    println!("Theme set to {theme}");
    Ok(())
}
