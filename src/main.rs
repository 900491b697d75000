mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "barrel_fold=debug"
    } else {
        "barrel_fold=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Consolidate {
            path,
            scope,
            source_root,
            public_root,
            config,
            dry_run,
            format,
        } => {
            cli::run_consolidate(
                &path,
                scope,
                source_root,
                public_root,
                config.as_deref(),
                dry_run,
                &format,
            )?;
        }
        Commands::Scan {
            path,
            scope,
            format,
        } => {
            cli::run_scan(&path, scope, &format)?;
        }
    }

    Ok(())
}
