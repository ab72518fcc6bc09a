//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::BenchArgs;
pub use parsers::{parse_target, parse_timeout};
pub use types::{FramingArg, OutputFormat, PositiveU64, PositiveUsize};

pub(crate) use defaults::DEFAULT_USER_AGENT;
