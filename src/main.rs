use anyhow::{Context, Result};
use clap::Parser;

use foodgram::cli::{Cli, Commands};
use foodgram::config::{get_config, init_config_from};
use foodgram::runtime::modes::run_server;
use foodgram::storage::StorageFactory;
use foodgram::system::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // generate-config 不需要加载配置和日志
    if let Some(Commands::GenerateConfig { output_path }) = &cli.command {
        return report(foodgram::cli::generate_config(output_path.as_deref()));
    }

    init_config_from(&cli.config);
    let config = get_config();
    let _guard = init_logging(&config).context("Failed to initialize logging")?;

    match cli.command {
        None | Some(Commands::Serve) => run_server().await,
        Some(Commands::LoadData { ingredients, tags }) => {
            let storage = StorageFactory::create()
                .await
                .context("Failed to create storage backend")?;
            report(foodgram::cli::load_data(&storage, &ingredients, tags.as_deref()).await)
        }
        Some(Commands::GenerateConfig { .. }) => Ok(()),
    }
}

fn report<T>(result: foodgram::errors::Result<T>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("{}", e.format_colored());
            Err(e.into())
        }
    }
}
