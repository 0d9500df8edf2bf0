//! Config command handlers.

use aichat_core::config;
use aichat_core::providers::Provider;
use anyhow::{Context, Result};

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

pub fn generate() -> Result<()> {
    let toml = config::Config::generate()?;
    print!("{toml}");
    Ok(())
}

pub fn set_provider(provider: Provider) -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::save_provider_to(&config_path, provider)
        .with_context(|| format!("update config at {}", config_path.display()))?;
    println!("Default provider set to {provider}");
    Ok(())
}
