//! Binary entry: argument parsing, config merge, run, and report output.
use std::ffi::OsString;
use std::sync::Arc;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::args::{BenchArgs, OutputFormat};
use crate::config::{apply_config, has_default_config, load_config};
use crate::driver::ProtocolDriverFactory;
use crate::engine::{RunOutcome, Scheduler};
use crate::error::{AppError, AppResult};
use crate::system::logger::init_logging;
use crate::system::shutdown::{setup_signal_shutdown_handler, shutdown_channel};

/// Runs the command-line application.
///
/// # Errors
///
/// Returns an error when arguments are invalid, the runtime cannot be built,
/// or the benchmark aborts on a fatal failure. An aborted run is reported
/// only through the returned [`AppError::Aborted`].
pub fn run() -> AppResult<()> {
    let Some((mut args, matches)) = parse_args()? else {
        return Ok(());
    };

    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }

    init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(&args))
}

fn parse_args() -> AppResult<Option<(BenchArgs, ArgMatches)>> {
    let mut cmd = BenchArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = BenchArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !has_default_config()
}

async fn run_async(args: &BenchArgs) -> AppResult<()> {
    let config = Arc::new(args.to_config()?);

    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let factory = ProtocolDriverFactory::new(Arc::clone(&config));
    let mut scheduler = Scheduler::new(Arc::clone(&config), factory);
    let outcome = scheduler.run(&shutdown_tx).await;
    signal_handle.abort();

    match outcome? {
        RunOutcome::Completed(report) => {
            let rendered = match args.output_format {
                OutputFormat::Text => report.render_text(),
                OutputFormat::Json => report.render_json()?,
            };
            println!("{}", rendered);
            Ok(())
        }
        RunOutcome::Aborted(report) => {
            if args.output_format == OutputFormat::Json {
                println!("{}", report.render_json()?);
            }
            Err(AppError::Aborted(report.error))
        }
    }
}
