mod audit;
mod history;
mod monitor;
mod search;
mod services;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::history::KindArg;
use crate::services::Services;

#[derive(Debug, Parser)]
#[command(name = "seoscope")]
#[command(about = "SEO audits, SERP positions and keyword research from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Audit one or more pages and record a snapshot per URL
    Audit {
        /// Absolute http(s) URLs to audit
        #[arg(required = true)]
        urls: Vec<String>,
        /// Print the full audit as JSON instead of a summary
        #[arg(long)]
        json: bool,
        /// Skip the PageSpeed measurement
        #[arg(long)]
        skip_speed: bool,
        /// Do not record snapshots
        #[arg(long)]
        no_save: bool,
    },
    /// Show who ranks for a query and where a domain sits
    Serp {
        query: String,
        /// Domain whose rank should be resolved
        #[arg(long)]
        domain: Option<String>,
        /// Number of results to inspect
        #[arg(long, default_value = "10")]
        depth: usize,
    },
    /// Expand seed phrases into keyword ideas via autocomplete
    Keywords {
        #[arg(required = true)]
        seeds: Vec<String>,
        /// Also expand "<modifier> <seed>" for the built-in modifiers
        #[arg(long)]
        modifiers: bool,
    },
    /// Audit every configured site, track its keyword positions, and print
    /// what changed since the previous run
    Monitor {
        /// Restrict the run to one site (by name)
        #[arg(long)]
        site: Option<String>,
        /// Number of results to inspect per keyword
        #[arg(long, default_value = "20")]
        depth: usize,
        /// Skip the PageSpeed measurement
        #[arg(long)]
        skip_speed: bool,
    },
    /// Compare the two latest snapshots of a subject
    Diff {
        /// A page URL for audits, or `domain::query` for positions
        subject: String,
        #[arg(long, value_enum, default_value_t = KindArg::Audit)]
        kind: KindArg,
    },
    /// Summarize trends over a time window
    Report {
        /// Subjects to include; defaults to every configured site
        subjects: Vec<String>,
        #[arg(long, value_enum, default_value_t = KindArg::Audit)]
        kind: KindArg,
        /// Window length in days, ending now
        #[arg(long, default_value = "30")]
        days: u32,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = seoscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Audit {
            urls,
            json,
            skip_speed,
            no_save,
        } => {
            let services = Services::build(config, skip_speed)?;
            audit::run_audit(&services, &urls, json, !no_save).await
        }
        Commands::Serp {
            query,
            domain,
            depth,
        } => {
            let services = Services::build(config, true)?;
            search::run_serp(&services, &query, domain.as_deref(), depth).await
        }
        Commands::Keywords { seeds, modifiers } => {
            let services = Services::build(config, true)?;
            search::run_keywords(&services, &seeds, modifiers).await;
            Ok(())
        }
        Commands::Monitor {
            site,
            depth,
            skip_speed,
        } => {
            let services = Services::build(config, skip_speed)?;
            monitor::run_monitor(&services, site.as_deref(), depth).await
        }
        Commands::Diff { subject, kind } => history::run_diff(&config, &subject, kind.into()).await,
        Commands::Report {
            subjects,
            kind,
            days,
            json,
        } => history::run_report(&config, subjects, kind.into(), days, json).await,
    }
}
