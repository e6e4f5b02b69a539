//! `providers` and `config` subcommands.

use mailhands_config::Config;

use crate::engine::Engine;

pub(crate) fn handle_providers(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::from_config(config)?;
    println!("{:<10} {:<14} {}", "NAME", "DISPLAY", "URL");
    println!("{}", "-".repeat(48));
    for provider in engine.coordinator.catalog().summaries() {
        println!(
            "{:<10} {:<14} {}",
            provider.name, provider.display_name, provider.url
        );
    }
    Ok(())
}

pub(crate) fn handle_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
