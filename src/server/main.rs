use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use exif_copy::{config, web};

#[derive(Parser, Debug)]
#[command(
    name = "exif-copy-server",
    version,
    about = "Web upload service: copy EXIF and aspect ratio from source photos onto target photos"
)]
struct Cli {
    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory results are saved into (overrides config)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let mut config = config::Config::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(output) = cli.output {
        config.output.directory = output;
    }
    config.validate()?;

    std::fs::create_dir_all(&config.output.directory).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output.directory.display()
        )
    })?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    web::serve(listener, config).await
}
