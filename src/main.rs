// ABOUTME: CLI entrypoint for notion2md command
// ABOUTME: Handles error exit codes and command dispatch

use clap::Parser;
use notion2md::{
    api::NotionClient,
    auth::resolve_token,
    cli::{Cli, Commands},
    convert::Converter,
    logging, Exporter, Result,
};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("notion2md: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let converter = Converter::new(cli.strip_meta_chars.clone(), cli.extension.clone());

    match &cli.command {
        Commands::Convert => {
            let written = converter.convert(&cli.json_dir, &cli.md_dir)?;
            tracing::info!(files = written.len(), "conversion finished");
        }
        Commands::Download {
            locator,
            no_metadata,
            skip_unchanged,
        } => {
            let exporter = Exporter::new(client(&cli)?, converter)
                .with_metadata(!no_metadata)
                .skip_unchanged(*skip_unchanged);
            let path = exporter.download_url(locator, &cli.json_dir)?;
            tracing::info!(path = %path.display(), "download finished");
        }
        Commands::Export {
            locator,
            skip_unchanged,
        } => {
            let exporter =
                Exporter::new(client(&cli)?, converter).skip_unchanged(*skip_unchanged);
            let written = exporter.export_url(locator, &cli.json_dir, &cli.md_dir)?;
            tracing::info!(files = written.len(), "export finished");
        }
    }

    Ok(())
}

fn client(cli: &Cli) -> Result<NotionClient> {
    let token = resolve_token(cli.token.clone())?;
    let mut client = NotionClient::new(token, Some(cli.api_base.clone()))?;

    if cli.no_throttle {
        client = client.disable_throttle();
    } else if let Some((min, max)) = cli.throttle_ms {
        client = client.with_throttle(min, max);
    }

    Ok(client)
}
