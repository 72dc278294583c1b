//! Mobility Features - GPS ping cleaning and zone x time-bin aggregation

use mobility_features::app::cli::{Cli, Commands, ConfigAction};
use mobility_features::app::config::Config;
use mobility_features::features::{FeatureTable, ZoneTimeAggregator};
use mobility_features::spatial::{GridZoneAssigner, ZoneLabeler};
use mobility_features::trajectory::DenoiseChain;
use mobility_features::trajectory::DeviceCodes;
use mobility_features::workflow::{
    merge_parts, split_by_device, ColumnTable, DatasetStats, Pipeline, StatsComparison,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Denoise {
            input,
            output,
            no_deltas,
        } => {
            run_denoise(&input, &output, no_deltas, &config)?;
        }
        Commands::Label { input, output } => {
            run_label(&input, &output, &config)?;
        }
        Commands::Aggregate { input, output } => {
            run_aggregate(&input, &output, &config)?;
        }
        Commands::Run {
            input,
            output,
            denoised,
            labeled,
        } => {
            run_pipeline(&input, &output, denoised, labeled, &config)?;
        }
        Commands::Split { input, parts, output } => {
            run_split(&input, parts, output)?;
        }
        Commands::Merge { inputs, output } => {
            run_merge(&inputs, &output)?;
        }
        Commands::Stats { input, compare } => {
            run_stats(&input, compare.as_deref())?;
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

fn load_table(path: &Path) -> anyhow::Result<ColumnTable> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {:?}", path);
    }
    let table = ColumnTable::load(path)?;
    info!("Loaded {:?} ({} rows)", path, table.len());
    Ok(table)
}

fn run_denoise(input: &Path, output: &Path, no_deltas: bool, config: &Config) -> anyhow::Result<()> {
    let decoded = load_table(input)?.to_pings()?;
    let chain = DenoiseChain::from_config(&config.denoise);
    let outcome = chain.denoise(decoded.rows);

    let retain = config.denoise.retain_deltas && !no_deltas;
    ColumnTable::from_tracked(&outcome.rows, &decoded.devices, retain).save(output)?;
    info!("Saved denoised table to {:?}", output);

    let c = &outcome.counts;
    println!("\nDenoise Complete");
    println!("  Input rows:       {}", c.input_rows);
    println!("  After filter A:   {}", c.after_geometric);
    println!("  After filter B:   {}", c.after_median);
    println!("  Output rows:      {}", c.output_rows);
    println!("  Devices pruned:   {}", c.pruned_devices);
    println!("  Output devices:   {}", c.output_devices);
    Ok(())
}

fn run_label(input: &Path, output: &Path, config: &Config) -> anyhow::Result<()> {
    let decoded = load_table(input)?.to_pings()?;
    let grid = GridZoneAssigner::from_config(&config.grid)?;
    let (cols, rows) = grid.dimensions();
    info!("Grid of {}x{} cells at {} m", cols, rows, grid.cell_size_m());

    let labeled = ZoneLabeler::from_config(&config.binning).label(decoded.rows, &grid);
    ColumnTable::from_labeled(&labeled, &decoded.devices).save(output)?;
    info!("Saved labeled table to {:?}", output);
    Ok(())
}

fn run_aggregate(input: &Path, output: &Path, config: &Config) -> anyhow::Result<()> {
    let decoded = load_table(input)?.to_labeled()?;
    let table = ZoneTimeAggregator::from_config(config).aggregate(decoded.rows)?;
    save_features(&table, output)
}

fn run_pipeline(
    input: &Path,
    output: &Path,
    denoised: Option<PathBuf>,
    labeled: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<()> {
    let decoded = load_table(input)?.to_pings()?;
    let grid = GridZoneAssigner::from_config(&config.grid)?;
    let result = Pipeline::new(config).run(decoded.rows, &grid)?;

    if let Some(path) = denoised {
        ColumnTable::from_tracked(&result.denoised, &decoded.devices, config.denoise.retain_deltas).save(&path)?;
        info!("Saved denoised table to {:?}", path);
    }
    if let Some(path) = labeled {
        ColumnTable::from_labeled(&result.labeled, &decoded.devices).save(&path)?;
        info!("Saved labeled table to {:?}", path);
    }

    println!("\n{}", result.comparison);
    save_features(&result.features, output)
}

fn save_features(table: &FeatureTable, output: &Path) -> anyhow::Result<()> {
    if table.is_empty() {
        warn!("Feature table is empty");
    }
    table.save(output)?;

    println!("\nFeatures Generated Successfully!");
    println!("  Run: {}", table.run_id);
    println!("  Rows: {}", table.len());
    println!("  Bin width: {} min", table.time_bin_minutes);
    println!("  Output: {:?}", output);
    Ok(())
}

fn run_split(input: &Path, parts: usize, output: Option<PathBuf>) -> anyhow::Result<()> {
    let decoded = load_table(input)?.to_pings()?;
    let output_dir = output.unwrap_or_else(Cli::data_dir);
    std::fs::create_dir_all(&output_dir)?;

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "part".to_string());

    for (i, part) in split_by_device(decoded.rows, parts)?.into_iter().enumerate() {
        let path = output_dir.join(format!("{}_part{}.json", stem, i));
        ColumnTable::from_pings(&part, &decoded.devices).save(&path)?;
        println!("  {:?}: {} rows", path, part.len());
    }
    Ok(())
}

fn run_merge(inputs: &[PathBuf], output: &Path) -> anyhow::Result<()> {
    let mut devices = DeviceCodes::new();
    let mut parts = Vec::with_capacity(inputs.len());
    for input in inputs {
        let decoded = load_table(input)?.to_pings_with(devices)?;
        devices = decoded.devices;
        parts.push(decoded.rows);
    }

    let merged = merge_parts(parts);
    ColumnTable::from_pings(&merged, &devices).save(output)?;
    info!("Merged {} parts into {:?}", inputs.len(), output);
    println!("  {:?}: {} rows, {} devices", output, merged.len(), devices.len());
    Ok(())
}

fn run_stats(input: &Path, compare: Option<&Path>) -> anyhow::Result<()> {
    let before = DatasetStats::from_rows(&load_table(input)?.to_pings()?.rows);

    match compare {
        Some(cleaned) => {
            let after = DatasetStats::from_rows(&load_table(cleaned)?.to_pings()?.rows);
            println!("{}", StatsComparison::new(&before, &after));
        }
        None => {
            println!("Points:            {}", before.n_points);
            println!("Devices:           {}", before.n_devices);
            println!("Points per device: {:.2}", before.avg_points_per_device);
            println!("Hours covered:     {:.2}", before.hours_covered);
        }
    }
    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = config.to_toml()?;
            println!("Configuration ({:?}):\n", Config::default_path());
            println!("{}", toml_str);
        }
        ConfigAction::Get { key } => {
            let toml_str = config.to_toml()?;
            match find_toml_value(&toml_str, &key) {
                Some(v) => println!("{} = {}", key, v),
                None => {
                    anyhow::bail!("Configuration key '{}' not found", key);
                }
            }
        }
        ConfigAction::Reset { force } => {
            let config_path = Config::default_path();

            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }

            Config::default().save_default()?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}

/// TOML value lookup by dotted `section.key`
fn find_toml_value<'a>(toml_str: &'a str, key: &str) -> Option<&'a str> {
    let (section_name, leaf_key) = match key.split_once('.') {
        Some((section, leaf)) => (section, leaf),
        None => ("", key),
    };
    let mut in_section = section_name.is_empty();

    for line in toml_str.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            in_section = &trimmed[1..trimmed.len() - 1] == section_name;
            continue;
        }

        if in_section {
            if let Some((line_key, value)) = trimmed.split_once('=') {
                if line_key.trim() == leaf_key {
                    return Some(value.trim());
                }
            }
        }
    }

    None
}
