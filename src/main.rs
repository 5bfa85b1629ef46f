use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cp_stats::{
    ApiClient, Config, Database, Pipeline, RunSummary,
    db::write_aggregates,
    report::{self, DEFAULT_SHARE_THRESHOLD},
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "cp-stats",
    version,
    about = "Collect and summarize competitive-programming stats"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, short, global = true, env = "CP_STATS_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database used by load, query and aggregate
    #[arg(long, global = true, env = "CP_STATS_DATABASE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch stats for a window of the username list and append them to the output tables
    Fetch(FetchArgs),
    /// Load CSV files into database tables, replacing them
    Load {
        /// TABLE=CSV pairs, e.g. users=users.csv
        #[arg(required = true, value_parser = parse_table_spec)]
        tables: Vec<(String, PathBuf)>,
    },
    /// Print rows of a loaded table as CSV
    Query {
        /// Table name
        table: String,
        /// Only rows for this username
        #[arg(long)]
        username: Option<String>,
        /// Comma-separated columns to print (default: all)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Run the aggregate queries and write their CSVs
    Aggregate {
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Compute chart series
    #[command(subcommand)]
    Report(ReportCommand),
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Language share from popular_languages.csv
    Languages {
        /// popular_languages.csv produced by `aggregate`
        input: PathBuf,
        /// Share in percent below which languages are grouped as "Other"
        #[arg(long, default_value_t = DEFAULT_SHARE_THRESHOLD)]
        threshold: f64,
        /// Output CSV
        #[arg(long, default_value = "language_share.csv")]
        out: PathBuf,
    },
    /// Per-difficulty summary and activity groups of one or more solved-stats tables
    Solved {
        /// Solved-stats CSVs, earlier files win on duplicate usernames
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Per-difficulty output CSV
        #[arg(long, default_value = "solved_summary.csv")]
        out: PathBuf,
        /// Activity group output CSV
        #[arg(long, default_value = "activity_groups.csv")]
        groups_out: PathBuf,
        /// Per-user totals and group output CSV
        #[arg(long, default_value = "user_activity.csv")]
        users_out: PathBuf,
    },
}

/// Overrides for every fetch setting; unset flags keep the configured value
#[derive(Args)]
struct FetchArgs {
    /// Base URL of the stats API
    #[arg(long, env = "CP_STATS_BASE_URL")]
    base_url: Option<String>,
    /// Per-attempt request timeout, in seconds
    #[arg(long, env = "CP_STATS_REQUEST_TIMEOUT", value_parser = parse_seconds)]
    request_timeout: Option<Duration>,
    /// Attempts per request, including the first
    #[arg(long, env = "CP_STATS_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,
    /// Delay before the first retry, in seconds
    #[arg(long, env = "CP_STATS_INITIAL_BACKOFF", value_parser = parse_seconds)]
    initial_backoff: Option<Duration>,
    /// Index of the first username to process
    #[arg(long, env = "CP_STATS_START_OFFSET")]
    start_offset: Option<usize>,
    /// Number of usernames to process
    #[arg(long, env = "CP_STATS_COUNT")]
    count: Option<usize>,
    /// Pause after each username, in seconds
    #[arg(long, env = "CP_STATS_THROTTLE", value_parser = parse_seconds)]
    throttle: Option<Duration>,
    /// Pause before processing starts, in seconds
    #[arg(long, env = "CP_STATS_START_DELAY", value_parser = parse_seconds)]
    start_delay: Option<Duration>,
    /// CSV with a `username` column
    #[arg(long, env = "CP_STATS_INPUT")]
    input: Option<PathBuf>,
    /// Language stats output table
    #[arg(long, env = "CP_STATS_LANGUAGE_STATS")]
    language_stats: Option<PathBuf>,
    /// Solved stats output table
    #[arg(long, env = "CP_STATS_SOLVED_STATS")]
    solved_stats: Option<PathBuf>,
}

impl FetchArgs {
    fn apply(self, config: &mut Config) {
        if let Some(v) = self.base_url {
            config.api.base_url = v;
        }
        if let Some(v) = self.request_timeout {
            config.api.request_timeout = v;
        }
        if let Some(v) = self.max_attempts {
            config.retry.max_attempts = v;
        }
        if let Some(v) = self.initial_backoff {
            config.retry.initial_backoff = v;
        }
        if let Some(v) = self.start_offset {
            config.batch.start_offset = v;
        }
        if self.count.is_some() {
            config.batch.count = self.count;
        }
        if let Some(v) = self.throttle {
            config.batch.throttle = v;
        }
        if let Some(v) = self.start_delay {
            config.batch.start_delay = v;
        }
        if let Some(v) = self.input {
            config.paths.input = v;
        }
        if let Some(v) = self.language_stats {
            config.paths.language_stats = v;
        }
        if let Some(v) = self.solved_stats {
            config.paths.solved_stats = v;
        }
    }
}

fn parse_seconds(s: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{s}: {e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("{s}: {e}"))
}

fn parse_table_spec(s: &str) -> std::result::Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((table, path)) if !table.is_empty() && !path.is_empty() => {
            Ok((table.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected TABLE=CSV, got {s:?}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cp_stats=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    match cli.command {
        Command::Fetch(args) => {
            args.apply(&mut config);
            config.validate()?;
            let client = ApiClient::new(config.api.clone(), config.retry.clone())?;
            let summary = Pipeline::new(config, client).run().await;
            print_summary(&summary);
        }
        Command::Load { tables } => {
            let db = Database::new(&config.database.path).await?;
            for (table, path) in &tables {
                let rows = db
                    .load_csv(path, table)
                    .await
                    .with_context(|| format!("loading {} into {}", path.display(), table))?;
                println!("{table}: {rows} rows from {}", path.display());
            }
            db.close().await;
        }
        Command::Query {
            table,
            username,
            columns,
        } => {
            let db = Database::new(&config.database.path).await?;
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            let rows = db.fetch_rows(&table, username.as_deref(), &columns).await?;
            db.close().await;

            let mut out = csv::Writer::from_writer(std::io::stdout().lock());
            out.write_record(&rows.columns)?;
            for row in &rows.rows {
                out.write_record(row.iter().map(|v| v.as_deref().unwrap_or_default()))?;
            }
            out.flush()?;
        }
        Command::Aggregate { out } => {
            let db = Database::new(&config.database.path).await?;
            let paths = write_aggregates(&db, &out).await?;
            db.close().await;
            for path in paths {
                println!("{}", path.display());
            }
        }
        Command::Report(ReportCommand::Languages {
            input,
            threshold,
            out,
        }) => {
            let rows = report::read_popular_languages(&input)?;
            let shares = report::language_share(&rows, threshold);
            report::write_language_share(&out, &shares)?;
            for share in &shares {
                println!(
                    "{:<20} {:>8} {:>6.1}%",
                    share.languagename, share.user_count, share.percentage
                );
            }
        }
        Command::Report(ReportCommand::Solved {
            inputs,
            out,
            groups_out,
            users_out,
        }) => {
            let records = report::read_solved_records(&inputs)?;
            let summary = report::summarize_solved(&records);
            report::write_solved_summary(&out, &summary)?;
            report::write_activity_groups(&groups_out, &summary.groups)?;
            report::write_user_activity(&users_out, &report::user_activity(&records))?;
            println!(
                "{} users, {} accepted, mean success rate {:.1}%",
                summary.users, summary.total_accepted, summary.mean_success_rate_pct
            );
            println!(
                "solved per user: median {:.1}, mean {:.1}",
                summary.median_solved, summary.mean_solved
            );
            for d in &summary.difficulties {
                println!(
                    "  {:<6} {:>8} accepted ({:.1}%), mean success rate {:.1}%",
                    d.difficulty.as_str(),
                    d.accepted,
                    d.accepted_share_pct,
                    d.mean_success_rate_pct
                );
            }
            for g in &summary.groups {
                println!(
                    "  {:<20} {:>6} users ({:.1}%), mean solved {:.1}, success rate {:.1}%",
                    g.group, g.users, g.share_pct, g.mean_solved, g.success_rate_pct
                );
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{}: {} of {} selected ({} total), {} processed, {} failed, {} blank, {:.1}s",
        summary.state,
        summary.processed + summary.failed,
        summary.selected,
        summary.total_items,
        summary.processed,
        summary.failed,
        summary.skipped_blank,
        summary.elapsed.as_secs_f64()
    );
}
