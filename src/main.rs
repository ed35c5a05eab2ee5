use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use citymap::report::write_report;
use citymap::{composite, load_table, Settings, SvgTemplate};

/// Exit status when the table yields no cities and nothing is written
const EXIT_NO_CITIES: i32 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Overlay city magnitude markers on a Robinson world map SVG", long_about = None)]
struct Cli {
    /// Tab-delimited city table: name, longitude, latitude, magnitude (first row is a header)
    #[arg(long, short = 't')]
    table: PathBuf,

    /// Where to write the resulting SVG
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Template SVG; defaults to the settings file entry, then to the built-in world frame
    #[arg(long)]
    template: Option<PathBuf>,

    /// Settings file (defaults to citymap.ini next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the pixel placement of every city as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save_config: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Settings::config_path);
    let settings = Settings::load_from(&config_path)
        .with_context(|| format!("Failed to load settings from {}", config_path.display()))?;
    if cli.save_config {
        settings
            .save_to(&config_path)
            .with_context(|| format!("Failed to save settings to {}", config_path.display()))?;
    }

    println!("🗺️  Reading city table: {}", cli.table.display());
    let table = load_table(&cli.table)
        .with_context(|| format!("Failed to read city table {}", cli.table.display()))?;

    if !table.skipped().is_empty() {
        println!("⚠️  Skipped {} malformed row(s)", table.skipped().len());
    }
    if table.is_empty() {
        println!("⚠️  No city data read, check the table format (name<TAB>longitude<TAB>latitude<TAB>value)");
        std::process::exit(EXIT_NO_CITIES);
    }
    println!("✅ Read {} cities (max value {})", table.len(), table.max_magnitude());

    let template_path = cli
        .template
        .clone()
        .or_else(|| settings.template.as_ref().map(PathBuf::from));
    let template = match &template_path {
        Some(path) => SvgTemplate::load(path)?,
        None => SvgTemplate::builtin()?,
    };

    let summary = composite(&template, &cli.output, &table, &settings.render_config())
        .context("Failed to generate map")?;

    if let Some(report_path) = &cli.report {
        write_report(report_path, &table, &summary)?;
        println!("📄 Placement report: {}", report_path.display());
    }

    println!("🎉 Map written: {}", summary.output.display());
    Ok(())
}
