use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod clock;
mod config;
mod daily;
mod paths;
mod record;
mod resolve;
mod row;
mod session;
mod survey;
mod sync;
mod table;

use crate::cli::RootArgs;
use crate::clock::SystemClock;
use crate::config::BagConfig;
use crate::daily::TargetMode;
use crate::paths::BagPaths;
use crate::record::{offer_sync, print_progress, run_record, tail_lines, RecordRequest};
use crate::row::DATE_COLUMN;
use crate::session::{LazyTerminalPrompter, SessionAborted};
use crate::sync::{CommandRemote, Direction, SyncEngine, SyncOutcome};

/// Exit status for a survey the user quit, matching an interrupted shell job.
const ABORTED_EXIT: u8 = 130;

fn main() -> ExitCode {
    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = RootArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.downcast_ref::<SessionAborted>().is_some() => {
            eprintln!("{err}");
            ExitCode::from(ABORTED_EXIT)
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: RootArgs) -> Result<()> {
    let Some(survey) = args.survey.as_deref() else {
        RootArgs::command().print_help()?;
        println!();
        return Ok(());
    };
    let paths = BagPaths::resolve(args.root.as_deref())?;
    let config = BagConfig::load(&paths)?;
    tracing::debug!(root = %paths.root().display(), survey, "data root resolved");

    if let Some(direction) = args.sync_direction() {
        return run_sync(&paths, &config, survey, direction);
    }
    if let Some(count) = args.tail {
        for line in tail_lines(&paths, survey, count)? {
            println!("{line}");
        }
        return Ok(());
    }

    let request = RecordRequest {
        survey,
        offset: args.offset,
        use_editor: args.editor,
        from_file: args.from_file.as_deref(),
    };
    let mut prompter = LazyTerminalPrompter::default();
    let recorded = run_record(&paths, &config, &request, &SystemClock, &mut prompter)?;
    let verb = match recorded.mode {
        TargetMode::Replace { .. } => "updated",
        TargetMode::Append => "wrote",
    };
    println!(
        "{verb} {} entry in {}",
        recorded.row.get(DATE_COLUMN).unwrap_or_default(),
        paths.data_path(survey).display()
    );

    if let Some(location) = config.remote() {
        offer_sync(&paths, survey, &mut prompter, || connect(&config, &location))?;
    }
    Ok(())
}

fn run_sync(paths: &BagPaths, config: &BagConfig, survey: &str, direction: Direction) -> Result<()> {
    let location = config
        .remote()
        .ok_or_else(|| anyhow!("no remote configured (set \"remote\" in config.json or BAG_REMOTE)"))?;
    let remote = connect(config, &location)?;
    print_progress(match direction {
        Direction::Both => "syncing ... ",
        Direction::Up => "syncing up ... ",
        Direction::Down => "syncing down ... ",
    });
    match SyncEngine::new(paths, &remote).sync(survey, direction) {
        Ok(SyncOutcome::Merged {
            local,
            remote: remote_rows,
            merged,
        }) => println!("done ({local} local + {remote_rows} remote -> {merged} rows)"),
        Ok(_) => println!("done"),
        Err(err) => {
            println!("failed");
            return Err(err);
        }
    }
    Ok(())
}

fn connect(config: &BagConfig, location: &str) -> Result<CommandRemote> {
    CommandRemote::new(&config.remote_command()?, location)
}
