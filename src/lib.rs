#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod prompt;
pub mod providers;
pub mod session;
#[doc(hidden)]
pub mod util;

pub use cli::{Cli, Commands, ConfigCommands};
pub use config::Config;
pub use error::ReplygateError;
