mod commands;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing::info;
use webform_core::config::{self, MigrateConfig};
use webform_core::Migrator;
use webform_db::{LegacyDb, TargetDb};

use crate::output::Output;

#[derive(Parser)]
#[command(name = "webform-migrate")]
#[command(about = "Migrate legacy webforms and their submissions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Legacy database path (overrides config)
    #[arg(long, global = true)]
    legacy: Option<PathBuf>,

    /// Target database path (overrides config)
    #[arg(long, global = true)]
    target: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate forms and submissions
    Run {
        /// Only migrate this legacy form (nid)
        #[arg(long)]
        form: Option<i64>,

        /// Assemble and report, but write nothing
        #[arg(long)]
        simulate: bool,

        /// Maximum submissions per form past the watermark (0 = none)
        #[arg(long)]
        max_submissions: Option<u64>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Test the legacy database connection
    Check,
    /// Delete migrated submissions of one form before reimporting it
    Purge {
        /// Legacy form (nid) whose submissions are deleted
        #[arg(long)]
        form: i64,

        /// Show what would be deleted without deleting
        #[arg(long)]
        simulate: bool,
    },
    /// Show or reset the last migrated submission id
    Watermark {
        /// Reset the watermark to 0
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    let _guard = init_tracing(cli.debug);

    let mut config = if let Some(config_path) = &cli.config {
        info!("Loading config from: {:?}", config_path);
        config::load_config(config_path).await?
    } else {
        info!("Loading config from standard locations");
        config::load_config_from_standard_locations().await?
    };
    if let Some(path) = &cli.legacy {
        config.legacy.path = path.clone();
    }
    if let Some(path) = &cli.target {
        config.target.path = path.clone();
    }

    let output = Output::new();

    match cli.command {
        Commands::Run {
            form,
            simulate,
            max_submissions,
            json,
        } => {
            config.apply_overrides(form, simulate, max_submissions);
            let migrator = open_migrator(&config).await?;
            commands::migrate::run(&migrator, &config, json, &output).await
        }
        Commands::Check => {
            let legacy = LegacyDb::open(&config.legacy.path).await?;
            commands::migrate::check(&legacy, &output).await
        }
        Commands::Purge { form, simulate } => {
            let target = TargetDb::open(&config.target.path).await?;
            commands::migrate::purge(&target, form, simulate, &output).await
        }
        Commands::Watermark { reset } => {
            let target = TargetDb::open(&config.target.path).await?;
            commands::state::watermark(&target, reset, &output).await
        }
    }
}

async fn open_migrator(config: &MigrateConfig) -> Result<Migrator> {
    let legacy = Arc::new(LegacyDb::open(&config.legacy.path).await?);
    let target = Arc::new(TargetDb::open(&config.target.path).await?);
    Ok(Migrator::new(legacy, target.clone(), target))
}

/// Terminal logging plus a daily rolling debug log file.
fn init_tracing(debug: bool) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_appender::rolling;
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    };

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("webform-migrate")
        .join("logs");
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = rolling::daily(&log_dir, "webform-migrate.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = if debug {
        EnvFilter::new("webform_core=debug,webform_db=debug,webform_migrate=debug,sqlx=info,info")
    } else {
        EnvFilter::new("webform_core=info,webform_db=info,webform_migrate=info,sqlx=warn,warn")
    };

    let terminal_layer = if debug {
        fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .pretty()
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .compact()
            .boxed()
    };

    let file_env_filter =
        EnvFilter::new("webform_core=debug,webform_db=debug,webform_migrate=debug,info");

    let file_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_ansi(false)
        .with_writer(non_blocking)
        .pretty();

    tracing_subscriber::registry()
        .with(terminal_layer.with_filter(env_filter))
        .with(file_layer.with_filter(file_env_filter))
        .init();

    info!(
        "Logging initialized. Logs are being written to: {:?}",
        log_dir.join("webform-migrate.log")
    );
    guard
}
