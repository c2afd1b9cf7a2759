mod cli;
mod logging;

use std::path::Path;

use clap::Parser;

use marquee_core::{AppConfig, Engine, Mode};

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let mode = cli.command.mode();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.overrides.apply(&mut config, mode);

    let _guard = logging::init(&config.logging);

    match cli.command {
        cli::Command::Check => check(&config, cli.config.as_deref()),
        cli::Command::Poll | cli::Command::Listen => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(marquee_runtime::app::run(config, mode))?;
            Ok(())
        }
    }
}

fn check(config: &AppConfig, path: Option<&Path>) -> anyhow::Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(AppConfig::config_path);
    println!("config file:     {}", path.display());
    println!("base name:       {:?}", config.general.base_name);
    println!(
        "target user:     {}",
        config.general.target_user.as_deref().unwrap_or("(any)")
    );
    println!(
        "channel id:      {}",
        config
            .discord
            .channel_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "(unset)".into())
    );
    println!("poll interval:   {}s", config.general.poll_interval);
    println!(
        "cooldown:        {}s poll / {}s event",
        config.general.rename_cooldown, config.general.event_rename_cooldown
    );
    println!("presence:        {}", config.discord.presence_enabled);

    let engine = Engine::new(&config.engine_config(Mode::Poll));
    println!("idle name:       {:?}", engine.candidate_name(None));

    config.validate(Mode::Poll)?;
    println!("ok");
    Ok(())
}
