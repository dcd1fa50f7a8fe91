use anyhow::Context;
use clap::Parser;
use event_hub::config::cli::{parse_event_data, Command};
use event_hub::utils::{logger, validation::Validate};
use event_hub::{CliConfig, EventHub, EventHubConfig, EventHubError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting event-hub CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(&cli).await {
        tracing::error!("❌ {:#}", e);

        let exit_code = match e.downcast_ref::<EventHubError>() {
            Some(hub_error) => {
                tracing::error!("💡 Suggestion: {}", hub_error.recovery_suggestion());
                eprintln!("❌ {}", hub_error);
                eprintln!("💡 {}", hub_error.recovery_suggestion());
                if hub_error.is_remote() {
                    2
                } else {
                    1
                }
            }
            None => {
                eprintln!("❌ {:#}", e);
                1
            }
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(cli: &CliConfig) -> anyhow::Result<()> {
    cli.validate()?;

    tracing::info!("📁 Loading configuration from: {}", cli.config);
    let config = EventHubConfig::from_file(&cli.config)?;
    config.validate()?;

    if let Command::Check = cli.command {
        println!(
            "✅ Configuration OK: triggers {:?}, {} routed event(s)",
            config.configured_triggers(),
            config.events.len()
        );
        return Ok(());
    }

    let hub = EventHub::instance();
    hub.initialize(&config)?;

    match &cli.command {
        Command::Check => {}
        Command::Track { trigger, event, data } => {
            let data = parse_event_data(data)?;
            hub.track_by_name(trigger, event, &data)
                .await
                .with_context(|| format!("tracking '{}' on {}", event, trigger))?;
            println!("✅ Sent '{}' to {}", event, trigger);
        }
        Command::Dispatch { event, data } => {
            let data = parse_event_data(data)?;
            hub.dispatch(event, &data).await?;
            let targets = hub.routes_for(event).unwrap_or_default();
            println!("✅ Dispatched '{}' to {:?}", event, targets);
        }
        Command::Broadcast { event, data } => {
            let data = parse_event_data(data)?;
            hub.broadcast(event, &data).await?;
            println!("✅ Broadcast '{}' to {:?}", event, hub.configured_triggers());
        }
    }

    Ok(())
}
