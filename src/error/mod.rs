mod app;
mod config;
mod fatal;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use fatal::FatalError;
pub use validation::ValidationError;
