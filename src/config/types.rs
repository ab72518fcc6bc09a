use serde::Deserialize;

use crate::args::{FramingArg, OutputFormat};

/// Settings accepted in `wirebench.toml` / `wirebench.json`. Every field
/// mirrors a command-line flag.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub concurrency: Option<usize>,
    pub requests: Option<u64>,
    pub length: Option<usize>,
    pub timeout: Option<i64>,
    pub keep_alive: Option<bool>,
    pub data: Option<String>,
    pub verbose: Option<bool>,
    pub framing: Option<FramingArg>,
    pub insecure: Option<bool>,
    pub output_format: Option<OutputFormat>,
    pub no_color: Option<bool>,
}
