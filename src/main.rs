mod cli;
mod client;

use clap::Parser;
use cli::{Cli, Commands};
use client::ClientError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dataentry::observability::init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect(files) => client::inspect(&files).await,
        Commands::Upload(args) => {
            let config = client::load_config(cli.config)?;
            client::upload(&config, &args.page, &args.files).await
        }
        Commands::Action(args) => {
            let config = client::load_config(cli.config)?;
            client::action(&config, &args.page, &args.name).await
        }
        Commands::Cancel(page) => {
            let config = client::load_config(cli.config)?;
            client::cancel(&config, &page).await
        }
    };

    match result {
        Err(ClientError::Capability(e)) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
        other => other?,
    }

    Ok(())
}
