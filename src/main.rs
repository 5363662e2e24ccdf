use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use roster_permuter::display::{print_outcome, write_outcome};
use roster_permuter::parser::load_availability;
use roster_permuter::{generate_schedules, web, RosterConfig};

#[derive(Parser)]
#[command(name = "roster-permuter", about = "Build desk rosters from an availability poll export")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate ranked schedules and write one CSV per schedule
    Generate {
        /// Availability CSV exported from the poll
        csv: PathBuf,
        /// Stop after this many schedules
        max_schedules: Option<usize>,
        /// Push this person to the back of every block (repeatable)
        #[arg(long = "deprioritize")]
        deprioritize: Vec<String>,
        /// Directory for the schedule CSVs
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Print the report without writing files
        #[arg(long)]
        no_write: bool,
    },
    /// Serve the upload and schedule API
    Web {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RosterConfig> {
    match path {
        Some(path) => RosterConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(RosterConfig::default()),
    }
}

fn run_generate(
    mut config: RosterConfig,
    csv: &Path,
    max_schedules: Option<usize>,
    deprioritize: Vec<String>,
    output_dir: &Path,
    no_write: bool,
) -> anyhow::Result<()> {
    if let Some(max) = max_schedules {
        config.max_schedules = max;
    }
    config.deprioritized_persons.extend(deprioritize);
    config.validate()?;

    let table = load_availability(csv, &config.input)
        .with_context(|| format!("failed to read {}", csv.display()))?;
    info!("Loaded {} rows from {}", table.rows.len(), csv.display());

    let outcome = generate_schedules(&table.slot_availability(), &config);
    print_outcome(&outcome, &table.active_people());

    if no_write {
        return Ok(());
    }

    let base = csv
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("availability");
    for path in write_outcome(&outcome, output_dir, base)? {
        println!("Saved {}", path.display());
    }

    Ok(())
}

/// Filter from RUST_LOG directives (e.g. `roster_permuter=debug`), info when unset or invalid
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(log_filter(env::var("RUST_LOG").ok().as_deref()))
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Generate {
            csv,
            max_schedules,
            deprioritize,
            output_dir,
            no_write,
        } => run_generate(config, &csv, max_schedules, deprioritize, &output_dir, no_write),
        Command::Web { port } => {
            let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
                warn!("ADMIN_PASSWORD not set, using the default password");
                "admin123".to_string()
            });
            web::start_server(port, config, password).await?;
            Ok(())
        }
    }
}
