use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fpl_monthly::api::{build_router, state::AppState};
use fpl_monthly::calculate::month_leaders;
use fpl_monthly::config::AppConfig;
use fpl_monthly::fetch::FplClient;
use fpl_monthly::models::{LeagueTable, MonthSpec, ScoreBasis};
use fpl_monthly::sync::compute_league_monthly;

#[derive(Parser)]
#[command(name = "fpl-monthly")]
#[command(about = "Fantasy Premier League league tables grouped into custom months")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Compute a league's month table once and print it
    Compute {
        /// Classic league id
        #[arg(long)]
        league_id: Option<u64>,

        /// JSON file holding `[{"name": ..., "gameweeks": [...]}, ...]`
        #[arg(long)]
        months: Option<PathBuf>,

        /// Subtract transfer hits from each gameweek's points
        #[arg(long)]
        net: bool,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // Initialize tracing
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting fpl-monthly v{}", env!("CARGO_PKG_VERSION"));

    let client = FplClient::new(config.upstream.fetcher_config())?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let state = AppState {
                upstream: Arc::new(client),
                cors_origin: config.server.cors_origin.clone(),
            };
            let app = build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Compute {
            league_id,
            months,
            net,
            json,
        } => {
            let Some(league_id) = league_id.or(config.league.league_id) else {
                bail!("no league id: pass --league-id or set league.league_id in the config");
            };

            let months = match months {
                Some(path) => {
                    let contents = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_json::from_str::<Vec<MonthSpec>>(&contents)
                        .with_context(|| format!("parsing {}", path.display()))?
                }
                None => config.league.month_specs()?,
            };
            if months.is_empty() {
                tracing::warn!("No months defined; every total will be zero");
            }

            let basis = if net { ScoreBasis::Net } else { config.league.basis };

            let table = compute_league_monthly(Arc::new(client), league_id, &months, basis).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                print_table(&table);
            }
        }
    }

    Ok(())
}

fn print_table(table: &LeagueTable) {
    let mut header = format!("{:>4}  {:<24} {:<24}", "#", "Manager", "Team");
    for month in &table.months {
        header.push_str(&format!(" {:>8}", truncate(month, 8)));
    }
    header.push_str(&format!(" {:>8}", "Total"));
    println!("{}", header);
    println!("{}", "-".repeat(header.len()));

    for row in &table.rows {
        let mut line = format!(
            "{:>4}  {:<24} {:<24}",
            row.rank,
            truncate(&row.name, 24),
            truncate(&row.team_name, 24)
        );
        for month in &table.months {
            line.push_str(&format!(" {:>8}", row.month_points(month)));
        }
        line.push_str(&format!(" {:>8}", row.total));
        println!("{}", line);
    }

    let leaders = month_leaders(table);
    if !leaders.is_empty() {
        println!();
        println!("Month leaders:");
        for leader in leaders {
            let names: Vec<String> = leader
                .leaders
                .iter()
                .map(|l| format!("{} ({})", l.name, l.team_name))
                .collect();
            println!("  {}: {} pts - {}", leader.month, leader.points, names.join(", "));
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
