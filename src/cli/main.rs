use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

use exif_copy::{config, exif, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "exif-copy",
    version,
    about = "Copy EXIF and aspect ratio from source photos onto target photos"
)]
struct Cli {
    /// Source images or directories (EXIF and aspect ratio come from these)
    #[arg(short, long, value_name = "PATH", num_args = 1..)]
    source: Vec<PathBuf>,

    /// Target images or directories (pixels come from these)
    #[arg(short, long, value_name = "PATH", num_args = 1..)]
    target: Vec<PathBuf>,

    /// Directory results are saved into (overrides config)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Display the EXIF metadata of the given images and exit
    #[arg(long = "show-exif", value_name = "PATH", num_args = 1..)]
    show_exif: Vec<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    // Handle --show-exif
    if !cli.show_exif.is_empty() {
        let images = pipeline::collect_images(&cli.show_exif);
        if images.is_empty() {
            anyhow::bail!("No supported image files found in the specified paths.");
        }
        for image_path in &images {
            print_exif(image_path)?;
        }
        return Ok(());
    }

    if cli.source.is_empty() || cli.target.is_empty() {
        anyhow::bail!("Both --source and --target are required. Use --help for usage.");
    }

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;
    if let Some(output) = cli.output {
        config.output.directory = output;
    }
    config.validate()?;

    // Collect and pair images
    let source_paths = pipeline::collect_images(&cli.source);
    let target_paths = pipeline::collect_images(&cli.target);
    if source_paths.is_empty() {
        anyhow::bail!("No supported source images found in the specified paths.");
    }
    if source_paths.len() != target_paths.len() {
        anyhow::bail!(
            "The number of source and target files must match ({} sources, {} targets)",
            source_paths.len(),
            target_paths.len()
        );
    }

    log::info!("Found {} pair(s) to process", source_paths.len());

    let report = pipeline::process_files(&source_paths, &target_paths, &config)?;

    // JSON output
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    // Summary
    log::info!(
        "Done: {} succeeded, {} failed out of {} pairs → {}",
        report.succeeded(),
        report.failed(),
        report.outcomes.len(),
        report.output_dir.display()
    );

    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Print the EXIF fields exif-copy reads from a file.
fn print_exif(path: &Path) -> Result<()> {
    let data = exif::read_exif_file(path)?;
    let rotation = exif_copy::transform::resolve_orientation(&data);

    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "─".repeat(72));

    if data.is_empty() {
        println!("  {DIM}(no EXIF metadata found){RESET}");
        println!();
        return Ok(());
    }

    let orientation = data
        .orientation
        .map(|o| format!("{o} (rotate target {}°)", rotation.degrees()));
    let blob_size = data.raw.as_ref().map(|raw| format!("{} bytes", raw.len()));

    let fields: [(&str, Option<&str>); 6] = [
        ("Make", data.make.as_deref()),
        ("Model", data.model.as_deref()),
        ("Software", data.software.as_deref()),
        ("DateTimeOriginal", data.date_time.as_deref()),
        ("Orientation", orientation.as_deref()),
        ("EXIF blob", blob_size.as_deref()),
    ];
    for (tag, val) in fields {
        if let Some(v) = val {
            println!("  {:<22} : {v}", tag);
        }
    }
    println!();

    Ok(())
}
