use alloy::hex;
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use codeup_core::config::AppConfig;
use codeup_core::modes::ScenarioSelection;
use codeup_core::utils::format_eth;
use codeup_game::economy::{full_upgrade_cost, upgrade_price, upgrade_yield, MAX_LEVEL, TOWER_COUNT};
use codeup_game::known_errors;
use codeup_harness::{all_passed, Harness};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codeup", version, about = "Codeup reentrancy harness")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the reentrancy scenarios against a fresh deployment.
    Run {
        #[arg(short, long, default_value = "config/codeup.toml")]
        config: String,
        #[arg(short, long, default_value = "all")]
        scenario: String,
        /// Print the reports as JSON instead of one line per scenario.
        #[arg(long)]
        json: bool,
    },
    PrintConfig {
        #[arg(short, long, default_value = "config/codeup.toml")]
        config: String,
    },
    /// Upgrade price and yield table for the configured tier.
    Prices {
        #[arg(short, long, default_value = "config/codeup.toml")]
        config: String,
    },
    /// Selectors of every custom error the contracts can revert with.
    Errors,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            scenario,
            json,
        } => {
            let cfg = AppConfig::load(&config)?;
            init_tracing(&cfg.observability.log_level);
            let selection = ScenarioSelection::parse(&scenario)?;
            let harness = Harness::new(cfg)?;
            let reports = harness.run(selection)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    let status = if report.passed() { "PASS" } else { "FAIL" };
                    println!(
                        "{status} {:<8} outer={} nested_rejections={} payouts={} guard_unlocked={}",
                        report.kind.as_str(),
                        report.outer_revert.as_deref().unwrap_or("none"),
                        report.nested_rejections,
                        report.payouts,
                        report.guard_unlocked,
                    );
                    for reason in &report.failure_reasons {
                        println!("  reason: {reason}");
                    }
                    if !report.failure_reasons.is_empty() {
                        print!("{}", report.trace);
                    }
                }
            }
            if let Some(metrics) = harness.metrics() {
                print!("{}", metrics.gather());
            }
            if !all_passed(&reports) {
                let failed = reports.iter().filter(|report| !report.passed()).count();
                return Err(anyhow!("{failed} scenario(s) failed"));
            }
        }
        Commands::PrintConfig { config } => {
            let cfg = AppConfig::load(&config)?;
            init_tracing(&cfg.observability.log_level);
            let json = serde_json::to_string_pretty(&cfg)?;
            println!("{json}");
        }
        Commands::Prices { config } => {
            let cfg = AppConfig::load(&config)?;
            init_tracing(&cfg.observability.log_level);
            let params = cfg.game.deploy_params()?;
            println!("tier {} at {} per coin", params.tier, format_eth(params.coins_price));
            println!("{:>5} {:>5} {:>10} {:>6}", "tower", "level", "price", "yield");
            for tower in 0..TOWER_COUNT {
                for level in 1..=MAX_LEVEL {
                    let price = upgrade_price(tower, level, params.tier).unwrap_or_default();
                    let gained = upgrade_yield(tower, level).unwrap_or_default();
                    println!("{tower:>5} {level:>5} {price:>10} {gained:>6}");
                }
            }
            let total = full_upgrade_cost(params.tier);
            println!(
                "full upgrade: {total} coins ({})",
                format_eth(total * params.coins_price)
            );
        }
        Commands::Errors => {
            init_tracing("info");
            for (selector, signature) in known_errors() {
                println!("{} {signature}", hex::encode_prefixed(selector));
            }
        }
    }

    info!("done");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(value) => EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        Err(_) => EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
