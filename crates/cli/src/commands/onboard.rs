//! `memclaw onboard`: First-time setup.

use memclaw_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🧠 memclaw — First-Time Setup");
    println!("=============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Export ANTHROPIC_API_KEY and ZEP_API_KEY (or add them to a .env file)");
        println!("   2. Adjust the [identity] section to describe yourself");
        println!("   3. Run: memclaw chat\n");
    }

    Ok(())
}
