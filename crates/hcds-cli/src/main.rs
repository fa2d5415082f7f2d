mod cli;
mod commands;
mod output;

use anyhow::Result;
use cli::{Cli, Command};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    let config = commands::load_config(cli.config.as_deref(), cli.project.as_deref())?;
    let out = cli.output;

    match cli.command {
        Command::Resolve { id } => commands::resolve(&config, &id, out),
        Command::Render { name, location, time_zone, resource, manifest } => match manifest {
            Some(path) => commands::render_manifest(&path),
            None => {
                commands::render(
                    &resource,
                    name.unwrap_or_default(),
                    location.unwrap_or_default(),
                    time_zone,
                );
                Ok(())
            }
        },
        Command::Create { id, time_zone } => {
            let driver = commands::driver(&config, cli.local).await?;
            commands::create(&config, driver, &id, time_zone.as_deref(), out).await
        }
        Command::Get { id } => {
            let driver = commands::driver(&config, cli.local).await?;
            commands::get(&config, driver, &id, out).await
        }
        Command::Update { id, time_zone } => {
            let driver = commands::driver(&config, cli.local).await?;
            commands::update(&config, driver, &id, &time_zone, out).await
        }
        Command::Delete { id } => {
            let driver = commands::driver(&config, cli.local).await?;
            commands::delete(&config, driver, &id).await
        }
        Command::Lifecycle { location, time_zone } => {
            let driver = commands::driver(&config, cli.local).await?;
            commands::lifecycle(config, driver, location.as_deref(), &time_zone, out).await
        }
    }
}
