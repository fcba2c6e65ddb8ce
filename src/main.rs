use anyhow::{bail, Context, Result};
use asx_tips::config::AppCfg;
use asx_tips::prices::{OfflineFeed, PriceFeed, StooqFeed};
use asx_tips::reference::ReferenceData;
use asx_tips::{project_sell_value, TipEngine, TipOptions, TipReport};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "asx_tips", about = "Rank listed companies and project a notional sale value")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick one tip per market-cap bucket.
    Tips {
        /// TOML config file. Built-in defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Codes from an earlier run to avoid (comma separated).
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Seed for the in-bucket random pick.
        #[arg(long)]
        seed: Option<u64>,

        /// Successive runs, each avoiding the previous run's picks.
        #[arg(long, default_value_t = 1)]
        rounds: u32,

        /// Use fallback snapshots only.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Print the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Compound an investment at an annual return for a number of months.
    Project {
        #[arg(long, default_value_t = 500.0)]
        investment: f64,

        #[arg(long, allow_hyphen_values = true)]
        annual_return: f64,

        #[arg(long)]
        months: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Tips {
            config,
            exclude,
            seed,
            rounds,
            offline,
            json,
        } => {
            let mut cfg = match &config {
                Some(path) => AppCfg::load(path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => AppCfg::default(),
            };
            cfg.feed.offline |= offline;
            if seed.is_some() {
                cfg.tips.seed = seed;
            }

            let reference = match &cfg.reference.path {
                Some(path) => ReferenceData::load(path)
                    .with_context(|| format!("loading reference data {}", path.display()))?,
                None => ReferenceData::bundled().context("loading bundled reference data")?,
            };

            let feed: Arc<dyn PriceFeed> = if cfg.feed.offline {
                Arc::new(OfflineFeed)
            } else {
                Arc::new(StooqFeed::new(cfg.feed.clone()).context("building http client")?)
            };

            let mut rng = match cfg.tips.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            info!(
                candidates = reference.candidates.len(),
                offline = cfg.feed.offline,
                rounds,
                "Analysing market data, sentiment and report signals"
            );

            let engine = TipEngine::new(reference, feed, cfg.tips.clone());
            let mut options = TipOptions {
                exclude_codes: exclude.into_iter().map(|c| c.trim().to_uppercase()).collect(),
            };

            for round in 1..=rounds.max(1) {
                let report = engine.report(&options, &mut rng).await;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print_report(round, &report);
                }
                options.exclude_codes = report
                    .tips
                    .iter()
                    .map(|t| t.code().to_string())
                    .collect::<HashSet<_>>();
            }
        }
        Commands::Project {
            investment,
            annual_return,
            months,
        } => {
            check_projection_args(investment, annual_return)?;
            let value = project_sell_value(investment, annual_return, months);
            println!("{value:.2}");
        }
    }

    Ok(())
}

/// Annual returns at or below -100% have no real monthly compounding rate.
fn check_projection_args(investment: f64, annual_return: f64) -> Result<()> {
    if !investment.is_finite() || investment < 0.0 {
        bail!("--investment must be a non-negative number, got {investment}");
    }
    if !annual_return.is_finite() || annual_return <= -1.0 {
        bail!("--annual-return must be greater than -1.0 (a -100% loss), got {annual_return}");
    }
    Ok(())
}

fn print_report(round: u32, report: &TipReport) {
    println!(
        "Round {round} ({}) - {} strong-buy projection ideas",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.tips.len()
    );
    if !report.excluded_codes.is_empty() {
        println!("  avoiding: {}", report.excluded_codes.join(", "));
    }

    for tip in &report.tips {
        let s = &tip.scored;
        println!();
        println!(
            "{:<5} {:<28} {:>6} cap  price ${:>9.2}  score {:+.4}  annual {:>5.1}%",
            s.candidate.code,
            s.candidate.name,
            s.candidate.cap_bucket.to_string(),
            s.current_price,
            s.score,
            s.annual_return * 100.0
        );
        let horizons: Vec<String> = tip
            .projections
            .iter()
            .map(|p| format!("{}m ${:.2} ({:+.1}%)", p.months, p.projected_sell_value, p.growth_pct * 100.0))
            .collect();
        println!("      {}", horizons.join("  "));
        for line in &tip.rationale {
            println!("      - {line}");
        }
    }
    println!();
}
