use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{BenchArgs, PositiveU64, PositiveUsize};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments. Flags given on the
/// command line always win.
///
/// # Errors
///
/// Returns an error when a numeric config value is zero.
pub fn apply_config(args: &mut BenchArgs, matches: &ArgMatches, config: &ConfigFile) -> AppResult<()> {
    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = ensure_positive_usize(concurrency, "concurrency")?;
    }

    if !is_cli(matches, "requests")
        && let Some(requests) = config.requests
    {
        args.requests = ensure_positive_u64(requests, "requests")?;
    }

    if !is_cli(matches, "length")
        && let Some(length) = config.length
    {
        args.length = Some(ensure_positive_usize(length, "length")?);
    }

    if !is_cli(matches, "timeout")
        && let Some(timeout) = config.timeout
    {
        args.timeout = timeout;
    }

    if !is_cli(matches, "data")
        && let Some(data) = config.data.clone()
    {
        args.data = Some(data);
    }

    if !is_cli(matches, "framing")
        && let Some(framing) = config.framing
    {
        args.framing = framing;
    }

    if !is_cli(matches, "output_format")
        && let Some(format) = config.output_format
    {
        args.output_format = format;
    }

    apply_flag(matches, "keep_alive", config.keep_alive, &mut args.keep_alive);
    apply_flag(matches, "verbose", config.verbose, &mut args.verbose);
    apply_flag(matches, "insecure", config.insecure, &mut args.insecure);
    apply_flag(matches, "no_color", config.no_color, &mut args.no_color);

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn apply_flag(matches: &ArgMatches, name: &str, value: Option<bool>, target: &mut bool) {
    if !is_cli(matches, name)
        && let Some(value) = value
    {
        *target = value;
    }
}

fn ensure_positive_u64(value: u64, field: &str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value).map_err(|_err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
        })
    })
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|_err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
        })
    })
}
