pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::UnleashClient;
pub use config::ProviderConfig;
pub use core::{Provider, ProviderEngine, Request, Response};
pub use utils::error::{ProviderError, Result};
