//! Command-line surface: argument definitions and the subcommand drivers used by `main`.

use crate::app::engine::{RtsEngine, open_module};
use crate::config::{RtsConfig, RunSettings};
use crate::domain::level::Granularity;
use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Incremental dependency graphs and regression test selection for Java modules.
#[derive(Parser, Debug)]
#[command(name = "rtstool", author, version, about)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Update the dependency graph and print the modification graph
    Graph(RunArgs),

    /// Update the dependency graph and print the affected tests
    Select {
        #[command(flatten)]
        run: RunArgs,

        /// Compute the selection without persisting the new snapshot
        #[arg(long)]
        no_overwrite: bool,
    },
}

/// Options shared by every subcommand. Flags override `rts.toml`.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Module root (directory holding rts.toml and the source model)
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Graph granularity: type, method or non_type
    #[arg(short, long)]
    pub level: Option<Granularity>,

    /// Collect Spring injection edges
    #[arg(long)]
    pub spring: bool,

    /// Collect Guice injection edges
    #[arg(long)]
    pub guice: bool,

    /// Collect CDI injection edges
    #[arg(long)]
    pub cdi: bool,

    /// Ignore injection edges when selecting tests
    #[arg(long)]
    pub standalone: bool,
}

impl RunArgs {
    /// Settings for this run: the module's configuration with the flags applied on top.
    pub fn settings(&self, config: &RtsConfig) -> RunSettings {
        let mut settings = config.settings();
        if let Some(level) = self.level {
            settings.level = level;
        }
        settings.di.spring |= self.spring;
        settings.di.guice |= self.guice;
        settings.di.cdi |= self.cdi;
        settings.standalone |= self.standalone;
        settings
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn load_config(root: &Path) -> RtsConfig {
    let config = RtsConfig::for_module(root);
    info!(root = %root.display(), level = %config.level, "configuration loaded");
    config
}

/// `rtstool graph`: runs the pipeline and prints the tagged union of both graphs.
pub fn run_graph(args: &RunArgs) -> Result<()> {
    let config = load_config(&args.root);
    let engine = RtsEngine::new(args.settings(&config));
    let (source, store) = open_module(&args.root, &config);
    let report = engine.graph(source, store)?;
    print_json(&report)
}

/// `rtstool select`: runs the pipeline and prints included and excluded tests.
pub fn run_select(args: &RunArgs, no_overwrite: bool) -> Result<()> {
    let config = load_config(&args.root);
    let mut settings = args.settings(&config);
    if no_overwrite {
        settings.overwrite = false;
    }
    let engine = RtsEngine::new(settings);
    let (source, store) = open_module(&args.root, &config);
    let report = engine.select(source, store)?;
    print_json(&report)
}
