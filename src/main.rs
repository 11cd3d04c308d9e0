use anyhow::{bail, Result};
use clap::Parser;
use rollback_report::export;
use rollback_report::ingestion::{LoadCache, SourceOptions};
use rollback_report::report::{format_kpi, top_n, Kpis, RollbackReport};
use rollback_report::{BucketGranularity, RollbackPipeline, RunConfig, RunOutcome};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rollback-report")]
#[command(about = "Counts rollbacks by unique reference and summarizes them per brand")]
struct Args {
    /// Input table (.csv/.tsv/.txt or .xlsx/.xls/.xlsm/.ods)
    input: PathBuf,

    /// Sheet name for spreadsheets (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Field separator for delimited text (default: sniffed from the header)
    #[arg(long)]
    separator: Option<char>,

    /// Time bucket granularity
    #[arg(short, long, value_enum)]
    bucket: Option<BucketGranularity>,

    /// Keep only this canonical brand label (repeatable)
    #[arg(long = "brand")]
    brands: Vec<String>,

    /// Keep rows whose user_id contains this text (case-insensitive)
    #[arg(long)]
    user_contains: Option<String>,

    /// Keep rows whose game_name contains this text (case-insensitive)
    #[arg(long)]
    game_contains: Option<String>,

    /// Rows shown in the global game ranking
    #[arg(long)]
    top_global: Option<usize>,

    /// Rows shown in each brand's game ranking
    #[arg(long)]
    top_brand: Option<usize>,

    /// Directory for CSV exports
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// JSON run configuration; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    summary_json: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn build_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(bucket) = args.bucket {
        config.bucket_granularity = bucket;
    }
    if !args.brands.is_empty() {
        config.brand_filter = args.brands.clone();
    }
    if let Some(user) = &args.user_contains {
        config.user_contains = user.clone();
    }
    if let Some(game) = &args.game_contains {
        config.game_contains = game.clone();
    }
    if let Some(n) = args.top_global {
        config.top_n_global = n;
    }
    if let Some(n) = args.top_brand {
        config.top_n_per_brand = n;
    }

    config.validate()?;
    Ok(config)
}

fn source_options(args: &Args) -> Result<SourceOptions> {
    let separator = match args.separator {
        Some(c) if c.is_ascii() => Some(c as u8),
        Some(c) => bail!("separator must be a single ASCII character, got '{}'", c),
        None => None,
    };
    Ok(SourceOptions {
        sheet: args.sheet.clone(),
        separator,
    })
}

fn print_kpis(kpis: &Kpis, granularity: BucketGranularity) {
    println!("  Rollbacks:          {}", format_kpi(kpis.total_rollbacks));
    println!("  Users/Games:        {}", format_kpi(kpis.total_user_games));
    println!("  Time buckets ({}): {}", granularity, format_kpi(kpis.total_time_buckets));
    println!("  Games:              {}", format_kpi(kpis.total_games));
}

fn print_report(report: &RollbackReport, config: &RunConfig) {
    println!("\n=== Rollbacks by brand ===");
    print_kpis(&report.kpis, report.granularity);

    println!("\n--- Top games (all brands) ---");
    for row in top_n(&report.per_game_global, config.top_n_global) {
        println!("  {:>6}  {}", row.qtd_rollbacks, row.game_name);
    }

    for section in &report.brands {
        println!("\n=== {} ===", section.brand);
        print_kpis(&section.kpis, report.granularity);
        println!("  Top games:");
        for row in top_n(&section.per_game, config.top_n_per_brand) {
            println!("  {:>6}  {}", row.qtd_rollbacks, row.game_name);
        }
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(args.log_json);

    let config = build_config(&args)?;
    let options = source_options(&args)?;

    info!("Reading {}", args.input.display());
    let mut cache = LoadCache::default();
    let frame = cache.load(&args.input, &options)?;

    let pipeline = RollbackPipeline::new(&config)?;
    let report = match pipeline.run(&frame, &config)? {
        RunOutcome::Report(report) => report,
        RunOutcome::Empty(reason) => {
            warn!("Nothing to report: {}", reason);
            println!("Nothing to report: {}", reason);
            return Ok(());
        }
    };

    if args.summary_json {
        let summary = report.summary(config.top_n_global, config.top_n_per_brand);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_report(&report, &config);
    }

    if let Some(dir) = &args.out_dir {
        let written = export::export_report(&report, dir)?;
        for path in &written {
            info!("Wrote {}", path.display());
        }
    }

    Ok(())
}
