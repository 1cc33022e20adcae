//! Brigade operator console.
//!
//! Every invocation composes a fresh kernel (the store lives in memory only),
//! seeds the demonstration roster, and runs one subcommand against it.
//!
//! ```text
//! brigade status
//! brigade rush --count 10
//! brigade export --format csv --de-escalate
//! brigade selfcheck
//! ```

mod commands;
mod seed;

use std::path::PathBuf;

use anyhow::{Context, Result};
use brigade_core::export::ExportFormat;
use brigade_core::guard::SecurityLevel;
use brigade_core::{Kernel, KernelConfig};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "brigade")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Kitchen operations kernel console")]
struct Cli {
    /// YAML kernel configuration
    #[arg(short, long, env = "BRIGADE_CONFIG")]
    config: Option<PathBuf>,

    /// Seed for the jitter source (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}


#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ExportFormat::Text,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}


#[derive(Subcommand)]
enum Commands {
    /// Show score, guard summary, roster and open tasks
    Status {
        /// Evaluate under de-escalation
        #[arg(long)]
        de_escalate: bool,
    },

    /// Flood the board with synthetic tickets and show the score response
    Rush {
        #[arg(short, long, default_value = "10")]
        count: usize,
    },

    /// Seal the demo task and print a hashed archive export
    Export {
        #[arg(short, long, value_enum, default_value = "text")]
        format: FormatArg,

        /// Redact role-bearing fields
        #[arg(long)]
        de_escalate: bool,

        /// Administrative requests already on record
        #[arg(long, default_value = "0")]
        admin_requests: u64,
    },

    /// Run the kernel self-check
    Selfcheck,
}


fn load_config(cli: &Cli) -> Result<KernelConfig> {
    let mut config = match &cli.config {
        Some(path) => KernelConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => KernelConfig::default(),
    };
    if cli.seed.is_some() {
        config.rng_seed = cli.seed;
    }
    Ok(config)
}


fn level(de_escalate: bool) -> SecurityLevel {
    if de_escalate {
        SecurityLevel::DeEscalated
    } else {
        SecurityLevel::Standard
    }
}


fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let fallback = if cli.verbose {
        "debug".to_string()
    } else {
        config.log_filter.clone().unwrap_or_else(|| "info".to_string())
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let kernel = Kernel::new(config).context("building kernel")?;
    seed::seed_demo(&kernel).context("seeding demo brigade")?;
    tracing::debug!(members = kernel.members().len(), "demo brigade seeded");

    match cli.command {
        Commands::Status { de_escalate } => commands::status(&kernel, level(de_escalate)),
        Commands::Rush { count } => commands::rush(&kernel, count)?,
        Commands::Export {
            format,
            de_escalate,
            admin_requests,
        } => commands::export(&kernel, format.into(), level(de_escalate), admin_requests)?,
        Commands::Selfcheck => {
            if !commands::selfcheck(&kernel) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
