//! `memclaw chat`: Interactive or single-message chat mode.

use memclaw_agent::{AgentLoop, ensure_ready};
use memclaw_channels::{ChannelError, CliChannel};
use memclaw_config::AppConfig;
use memclaw_core::identity::SessionId;
use memclaw_core::memory::MemoryService;
use memclaw_core::provider::Provider;
use memclaw_memory::{InMemoryService, ZepClient};
use memclaw_providers::AnthropicProvider;
use memclaw_tools::MemoryToolExecutor;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;

pub async fn run(message: Option<String>, offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(memclaw_core::Error::from)?;

    let missing: Vec<&str> = config
        .missing_credentials()
        .into_iter()
        .filter(|key| !(offline && *key == "ZEP_API_KEY"))
        .collect();
    if !missing.is_empty() {
        eprintln!();
        eprintln!("  ERROR: Missing credentials!");
        eprintln!();
        eprintln!("  Set these environment variables (or put them in a .env file):");
        for key in &missing {
            eprintln!("    {key}");
        }
        eprintln!();
        eprintln!("  Or add them to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err(format!("Missing credentials: {}", missing.join(", ")).into());
    }

    let provider: Arc<dyn Provider> = Arc::new(
        AnthropicProvider::new(config.completion.api_key.clone().unwrap_or_default())
            .with_base_url(config.completion.base_url.clone()),
    );

    let memory: Arc<dyn MemoryService> = if offline {
        Arc::new(InMemoryService::new())
    } else {
        Arc::new(
            ZepClient::new(config.memory.api_key.clone().unwrap_or_default())
                .with_base_url(config.memory.base_url.clone()),
        )
    };

    let identity = config.identity.to_identity();
    let session_id = SessionId::for_this_run();
    ensure_ready(memory.as_ref(), &identity, &session_id).await?;

    let tools = Arc::new(MemoryToolExecutor::new(memory.clone(), identity.user_id.clone()));
    let agent = AgentLoop::new(provider, tools, memory.clone(), session_id.clone(), &config.completion.model)
        .with_max_tokens(config.completion.max_tokens)
        .with_temperature(config.completion.temperature)
        .with_max_rounds(config.agent.max_rounds);

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let response = agent.run_turn(&msg).await;
        eprint!("\r              \r");
        println!("{}", response?);
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        memclaw — chat with long-term memory  ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", config.completion.model);
    println!("  Memory:    {}", memory.name());
    println!("  User:      {}", identity.display_name());
    println!("  Session:   {session_id}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let inbox = CliChannel::stdin().start();
    run_shell(&agent, inbox, &mut std::io::stdout()).await?;

    println!();
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}

/// Feed each message to the agent and print the answer. A failed turn is
/// reported and the shell keeps going.
pub async fn run_shell(
    agent: &AgentLoop,
    mut inbox: mpsc::Receiver<Result<String, ChannelError>>,
    out: &mut impl Write,
) -> std::io::Result<()> {
    write!(out, "  You > ")?;
    out.flush()?;

    while let Some(result) = inbox.recv().await {
        match result {
            Ok(message) => {
                match agent.run_turn(&message).await {
                    Ok(response) => {
                        writeln!(out)?;
                        for line in response.lines() {
                            writeln!(out, "  Assistant > {line}")?;
                        }
                        writeln!(out)?;
                    }
                    Err(e) => {
                        eprintln!("  [Error] {e}");
                        writeln!(out)?;
                    }
                }

                write!(out, "  You > ")?;
                out.flush()?;
            }
            Err(e) => {
                eprintln!("  [Channel Error] {e}");
                break;
            }
        }
    }
    Ok(())
}
