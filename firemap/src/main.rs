//! Point d'entrée CLI pour firemap

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Suivre les feux de forêt du Nouveau-Brunswick
#[derive(Parser)]
#[command(name = "firemap")]
#[command(author, version)]
#[command(about = "Synthèse, tendance et export des feux de forêt du Nouveau-Brunswick")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Preset (new-brunswick) ou chemin vers une config JSON
    #[arg(long, default_value = firemap::config::DEFAULT_PRESET, global = true)]
    config: String,

    /// Répertoire des sources (défaut : env FIREMAP_DATA_DIR / config)
    #[arg(long, global = true)]
    data: Option<std::path::PathBuf>,

    /// Instant de référence RFC 3339 (défaut : maintenant)
    #[arg(long, global = true)]
    now: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let mut config = firemap::Config::resolve(&cli.config)?.with_env_overrides()?;
    if let Some(data) = cli.data {
        config.data_dir = Some(data);
    }
    let now = cli::parse_now(cli.now.as_deref())?;
    debug!(config = %cli.config, now = %now, "Configuration ready");

    cli::run(cli.command, &config, now)
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
