mod cli;
mod commands;
mod config;
mod debug;
mod progress;
mod ui;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Settings;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match run(&ctx, cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&ctx, &err);
            ExitCode::FAILURE
        }
    }
}

fn run(ctx: &Context, cli: Cli) -> Result<()> {
    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "evpnctl", &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref(), &cli.intents)?;
    log::debug!("Loaded {settings:?}");

    match cli.command {
        Command::Apply { select, dry_run } => {
            commands::reconcile::apply(ctx, &settings, &select, dry_run)
        }
        Command::Update { select } => commands::reconcile::update(ctx, &settings, &select),
        Command::Destroy { select, yes } => {
            commands::reconcile::destroy(ctx, &settings, &select, yes)
        }
        Command::Read { select } => commands::reconcile::read(ctx, &settings, &select),
        Command::Render { select, role } => {
            commands::render::run(&settings, &select, role.as_deref())
        }
        Command::Hosts { role } => commands::hosts::run(&settings, role.as_deref()),
        Command::Request(args) => commands::request::run(ctx, &settings, &args),
        Command::Validate => commands::validate::run(ctx, &settings),
        Command::Completions { .. } => Ok(()),
    }
}

/// Print the error chain and, when known, what to do about it.
fn report(ctx: &Context, err: &anyhow::Error) {
    ui::error(&format!("{err:#}"));
    if let Some(advice) = advice(err) {
        ui::dim(advice);
    }
    if ctx.verbose > 1 {
        eprintln!("{err:?}");
    }
}

fn advice(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(e) = err.downcast_ref::<fabric::Error>() {
        return Some(match e {
            fabric::Error::Transport(inner) => inner.category().advice(),
            other => other.category().advice(),
        });
    }
    err.downcast_ref::<restconf::Error>()
        .map(|e| e.category().advice())
}
