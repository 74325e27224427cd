//! Quire CLI: operator commands for a quire data directory.
//!
//! `quire [--config FILE] [--data-dir DIR] COMMAND`
//!
//! - `reindex`: rebuild the search index from the published posts
//! - `search QUERY [--tag T | --category C] [--limit N]`: print `score slug`
//! - `publish-due`: run one publication tick now
//! - `run-publisher`: run the publication loop until Ctrl-C
//! - `stats`: index document and term counts

mod commands;
mod parse;

use std::process;

use anyhow::{Context, Result};
use chrono::Utc;
use quire::{telemetry, Quire, QuireConfig};
use tracing::info;

use commands::build_cli;
use parse::{global_args, matches_to_action, CliAction, GlobalArgs};

fn main() {
    let matches = build_cli().get_matches();
    let globals = global_args(&matches);
    telemetry::init(if globals.verbose { "debug" } else { "info" });

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    if let Err(e) = run(&globals, action) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn load_config(globals: &GlobalArgs) -> Result<QuireConfig> {
    let config = match &globals.config {
        Some(path) => QuireConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => QuireConfig::default(),
    };
    let mut config = config.with_env_overrides();
    if let Some(dir) = &globals.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn run(globals: &GlobalArgs, action: CliAction) -> Result<()> {
    let config = load_config(globals)?;
    let quire = Quire::from_config(config).context("opening data directory")?;

    match action {
        CliAction::Reindex => {
            let stats = quire.reindex()?;
            println!("indexed {} posts, {} terms", stats.documents, stats.terms);
        }
        CliAction::Search {
            query,
            filter,
            limit,
        } => {
            let hits = match limit {
                Some(n) => quire.index.search_limited(&query, filter.as_ref(), n),
                None => quire.search(&query, filter.as_ref()),
            };
            for hit in hits {
                println!("{:.4}\t{}", hit.score, hit.slug);
            }
        }
        CliAction::PublishDue => {
            let report = quire.publish_due(Utc::now());
            for slug in &report.published {
                println!("published {}", slug);
            }
            for (slug, reason) in &report.failed {
                eprintln!("failed {}: {}", slug, reason);
            }
            if !report.failed.is_empty() {
                anyhow::bail!("{} posts could not be published", report.failed.len());
            }
        }
        CliAction::RunPublisher => run_publisher(&quire)?,
        CliAction::Stats => {
            let stats = quire.index.stats();
            println!("documents: {}", stats.documents);
            println!("terms:     {}", stats.terms);
            match stats.built_at {
                Some(at) => println!("built at:  {}", at.to_rfc3339()),
                None => println!("built at:  never"),
            }
        }
    }
    Ok(())
}

fn run_publisher(quire: &Quire) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;

    runtime.block_on(async {
        let Some(handle) = quire.spawn_publisher() else {
            anyhow::bail!("publisher is disabled in the configuration");
        };
        tokio::signal::ctrl_c()
            .await
            .context("waiting for Ctrl-C")?;
        info!("interrupt received, stopping publisher");
        let ticks = handle.shutdown().await?;
        println!("publisher stopped after {} ticks", ticks);
        Ok(())
    })
}
