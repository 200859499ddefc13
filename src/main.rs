use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::Parser;

use symex::cli::batch::{run_extract, run_scan, BatchResult};
use symex::cli::output::{format_batch, format_scan_summary};
use symex::cli::{Cli, Commands};
use symex::config::{load_project_config, SymexConfig};
use symex::discovery::DiscoveryConfig;
use symex::logging::init_logging;
use symex::{ExtractOptions, Variant};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let forced = parse_lang(&cli)?;
    let config_override = cli.config.as_deref().map(Path::new);

    let batch = match cli.command {
        Commands::Extract { ref files } => {
            let project_path = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let config = load_project_config(&project_path, config_override)?;
            let options = build_options(&cli, &config);

            let paths: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();
            let batch = run_extract(&paths, forced, config.extract.default_variant, &options)?;
            println!("{}", format_batch(&batch, &cli.format).trim_end());
            batch
        }

        Commands::Scan { ref path, summary } => {
            let root = PathBuf::from(path)
                .canonicalize()
                .unwrap_or_else(|_| PathBuf::from(path));
            let config = load_project_config(&root, config_override)?;
            let options = build_options(&cli, &config);
            let discovery = build_discovery_config(&cli, &config, forced);

            let batch = run_scan(&root, &discovery, &options)?;
            if !summary {
                println!("{}", format_batch(&batch, &cli.format).trim_end());
            }
            println!("{}", format_scan_summary(&batch, &cli.format));
            batch
        }
    };

    report_read_errors(&batch);

    if cli.strict && batch.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

fn parse_lang(cli: &Cli) -> Result<Option<Variant>> {
    cli.lang
        .as_deref()
        .map(|l| l.parse::<Variant>().map_err(|e| anyhow!(e)))
        .transpose()
}

/// Command-line flags add to what the config file enables.
fn build_options(cli: &Cli, config: &SymexConfig) -> ExtractOptions {
    let mut options = config.extract.options();
    options.report_unresolved |= cli.report_unresolved;
    options
}

fn build_discovery_config(cli: &Cli, config: &SymexConfig, forced: Option<Variant>) -> DiscoveryConfig {
    let mut include = config.discovery.include.clone();
    include.extend(cli.include.iter().cloned());
    let mut exclude = config.discovery.exclude.clone();
    exclude.extend(cli.exclude.iter().cloned());

    DiscoveryConfig {
        include,
        exclude,
        variants: forced.into_iter().collect(),
    }
}

fn report_read_errors(batch: &BatchResult) {
    if !batch.read_errors.is_empty() {
        eprintln!("\nUnreadable files:");
        for err in &batch.read_errors {
            eprintln!("  {}", err);
        }
    }
}
