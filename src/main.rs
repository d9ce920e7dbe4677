mod cli;

use placeholdarr::{
    arr::RadarrClient,
    config, maintenance,
    placeholder::Provisioner,
    server,
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_from(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting placeholdarr");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

async fn run_maintenance(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_from(config_path)?;

    let radarr = RadarrClient::new(&config.radarr);
    let provisioner = Provisioner::from_config(&config.placeholder);
    let report = maintenance::run(&radarr, &provisioner, &config.movie_target()).await?;

    println!("Maintenance complete");
    println!("  Checked:     {}", report.checked);
    println!("  Provisioned: {}", report.provisioned);
    println!("  Cleaned up:  {}", report.cleaned);
    println!("  Failed:      {}", report.failed);

    if report.failed > 0 {
        anyhow::bail!("{} movies could not be reconciled", report.failed);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "placeholdarr=trace,placeholdarr_common=debug,tower_http=debug".to_string()
        } else {
            "placeholdarr=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Maintenance => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_maintenance(cli.config.as_deref()))
        }
        Commands::Version => {
            println!("placeholdarr {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = config::load_config_from(path)?;

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Radarr: {} (tag '{}')", config.radarr.url, config.radarr.tag);
    println!("  Sonarr: {} (tag '{}')", config.sonarr.url, config.sonarr.tag);
    println!("  Plex: {}", config.plex.url);
    println!("  Tautulli: {}", config.tautulli.url);
    println!(
        "  Secondary Radarr: {}",
        config
            .radarr_4k
            .as_ref()
            .map(|s| s.url.as_str())
            .unwrap_or("disabled")
    );
    println!("  Placeholder source: {:?}", config.placeholder.source);

    Ok(())
}
