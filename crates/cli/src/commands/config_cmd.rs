//! `memclaw config`: Show the effective configuration.

use memclaw_config::AppConfig;

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let missing = config.missing_credentials();

    // Never print secrets
    config.completion.api_key = None;
    config.memory.api_key = None;

    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    println!("{}", toml::to_string_pretty(&config)?);

    if missing.is_empty() {
        println!("✅ Credentials present");
    } else {
        for key in missing {
            println!("⚠️  {key} is not set");
        }
    }
    Ok(())
}
