pub mod batch;
#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{Cli, Command};
pub use batch::BatchFile;
pub use toml_config::{LogFormat, SessionConfig};
